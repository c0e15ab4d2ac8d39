use std::borrow::Cow;
use std::ops::Range;

use xi_rope::delta::Builder;
use xi_rope::{Delta, Rope, RopeInfo};

/// The editable text a list watcher is attached to.
///
/// The host widget owns the buffer; watchers only read it, and write to it
/// through [`TextBuffer::delete`] / [`TextBuffer::splice`] once an edit batch
/// has been committed. All offsets are UTF-8 byte offsets.
pub trait TextBuffer {
    /// Length of the buffer in bytes
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The character starting at `offset`, or `None` when `offset` is past the
    /// end or not on a char boundary.
    fn char_at(&self, offset: usize) -> Option<char>;

    /// Text in `range`, clamped to the buffer bounds.
    fn slice(&self, range: Range<usize>) -> Cow<'_, str>;

    /// Replace `range` with `text`.
    fn splice(&mut self, range: Range<usize>, text: &str);

    /// Remove `range` from the buffer.
    fn delete(&mut self, range: Range<usize>) {
        self.splice(range, "");
    }
}

/// Clamp a range to `[0, len]`, keeping `start <= end`.
pub(crate) fn clamp_range(range: Range<usize>, len: usize) -> Range<usize> {
    let start = range.start.min(len);
    let end = range.end.min(len).max(start);
    start..end
}

/// Rope-backed buffer used by [`crate::editing::EditSession`].
#[derive(Clone, Debug, Default)]
pub struct RopeBuffer {
    rope: Rope,
}

impl RopeBuffer {
    pub fn new(text: &str) -> Self {
        Self {
            rope: Rope::from(text),
        }
    }

    /// Create a buffer from raw bytes, rejecting invalid UTF-8
    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let text = std::str::from_utf8(bytes)?;
        Ok(Self::new(text))
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub fn is_char_boundary(&self, offset: usize) -> bool {
        offset == self.rope.len()
            || (offset < self.rope.len() && self.rope.is_codepoint_boundary(offset))
    }

    /// Apply a prebuilt delta (its base length must match the buffer)
    pub(crate) fn apply_delta(&mut self, delta: &Delta<RopeInfo>) {
        self.rope = delta.apply(&self.rope);
    }
}

impl From<&str> for RopeBuffer {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl TextBuffer for RopeBuffer {
    fn len(&self) -> usize {
        self.rope.len()
    }

    fn char_at(&self, offset: usize) -> Option<char> {
        if offset >= self.rope.len() || !self.rope.is_codepoint_boundary(offset) {
            return None;
        }
        let end = self.rope.next_codepoint_offset(offset)?;
        self.rope.slice_to_cow(offset..end).chars().next()
    }

    fn slice(&self, range: Range<usize>) -> Cow<'_, str> {
        self.rope.slice_to_cow(clamp_range(range, self.rope.len()))
    }

    fn splice(&mut self, range: Range<usize>, text: &str) {
        let range = clamp_range(range, self.rope.len());
        let mut builder = Builder::new(self.rope.len());
        builder.replace(range, Rope::from(text));
        let delta = builder.build();
        self.apply_delta(&delta);
    }
}

impl TextBuffer for String {
    fn len(&self) -> usize {
        str::len(self)
    }

    fn char_at(&self, offset: usize) -> Option<char> {
        self.get(offset..)?.chars().next()
    }

    fn slice(&self, range: Range<usize>) -> Cow<'_, str> {
        let range = clamp_range(range, str::len(self));
        Cow::Borrowed(self.get(range).unwrap_or_default())
    }

    fn splice(&mut self, range: Range<usize>, text: &str) {
        let range = clamp_range(range, str::len(self));
        self.replace_range(range, text);
    }
}

/// Offset of the first character of the line containing `offset`.
pub fn line_start(buffer: &dyn TextBuffer, offset: usize) -> usize {
    let mut i = offset.min(buffer.len());
    while i > 0 && buffer.char_at(i - 1) != Some('\n') {
        i -= 1;
    }
    i
}

/// Offset of the newline ending the line containing `offset`, or the buffer
/// length for the last line.
pub fn line_end(buffer: &dyn TextBuffer, offset: usize) -> usize {
    let len = buffer.len();
    let mut i = offset.min(len);
    while i < len && buffer.char_at(i) != Some('\n') {
        i += 1;
    }
    i
}

/// First offset in `[from, limit)` that is not a space or tab, or `limit`.
pub fn next_non_whitespace(buffer: &dyn TextBuffer, from: usize, limit: usize) -> usize {
    let limit = limit.min(buffer.len());
    let mut i = from;
    while i < limit && matches!(buffer.char_at(i), Some(' ' | '\t')) {
        i += 1;
    }
    i
}
