use xi_rope::Rope;
use xi_rope::delta::Builder;

use crate::editing::buffer::{RopeBuffer, TextBuffer};
use crate::editing::commands::{Cmd, EditError, compile_command, transform_caret};
use crate::editing::patch::Patch;
use crate::lists::ListEditWatcher;

/// An editable markdown buffer with a list watcher attached.
///
/// Plays the part of the host text widget: every command becomes one edit
/// batch, with the watcher's before/on/after phases called around the splice
/// in that order.
///
/// ```rust
/// # use markdown_lists_engine::editing::{Cmd, EditSession};
/// # use markdown_lists_engine::lists::ListEditWatcher;
/// let mut session = EditSession::new("- milk", ListEditWatcher::new(true));
///
/// session.apply(Cmd::SplitListItem { at: 6 }).unwrap();
/// assert_eq!(session.text(), "- milk\n- ");
///
/// // Enter on the empty item drops the marker instead of adding another
/// session.apply(Cmd::SplitListItem { at: 9 }).unwrap();
/// assert_eq!(session.text(), "- milk\n");
/// ```
#[derive(Debug)]
pub struct EditSession {
    buffer: RopeBuffer,
    watcher: ListEditWatcher,
    selection: std::ops::Range<usize>,
    version: u64,
}

impl EditSession {
    pub fn new(text: &str, watcher: ListEditWatcher) -> Self {
        Self::with_buffer(RopeBuffer::new(text), watcher)
    }

    /// Create a session from raw bytes, rejecting invalid UTF-8
    pub fn from_bytes(bytes: &[u8], watcher: ListEditWatcher) -> anyhow::Result<Self> {
        Ok(Self::with_buffer(RopeBuffer::from_bytes(bytes)?, watcher))
    }

    fn with_buffer(buffer: RopeBuffer, watcher: ListEditWatcher) -> Self {
        let len = buffer.len();
        Self {
            buffer,
            watcher,
            selection: len..len, // Start with cursor at end
            version: 0,
        }
    }

    /// Run one edit batch through the watcher
    pub fn apply(&mut self, cmd: Cmd) -> Result<Patch, EditError> {
        let replacement = compile_command(&self.buffer, &cmd)?;
        let start = replacement.range.start;
        let inserted = replacement.text.len();

        let mut builder = Builder::new(self.buffer.len());
        builder.replace(replacement.range.clone(), Rope::from(replacement.text.as_str()));
        let delta = builder.build();

        self.watcher
            .before_change(&self.buffer, start, replacement.range.len());
        self.buffer.apply_delta(&delta);
        self.watcher.on_change(&self.buffer, start, inserted);
        let list_changes = self.watcher.after_change(&mut self.buffer);

        let caret = transform_caret(
            start + inserted,
            &list_changes.deleted,
            &list_changes.rewritten,
        )
        .min(self.buffer.len());
        self.selection = caret..caret;
        self.version += 1;

        Ok(Patch {
            changed: vec![start..start + inserted],
            new_selection: self.selection.clone(),
            version: self.version,
            list_changes,
        })
    }

    pub fn text(&self) -> String {
        self.buffer.text()
    }

    /// Get the document's content as raw bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        self.buffer.text().into_bytes()
    }

    pub fn buffer(&self) -> &RopeBuffer {
        &self.buffer
    }

    pub fn watcher(&self) -> &ListEditWatcher {
        &self.watcher
    }

    pub fn selection(&self) -> std::ops::Range<usize> {
        self.selection.clone()
    }

    pub fn set_selection(&mut self, selection: std::ops::Range<usize>) {
        self.selection = selection;
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}
