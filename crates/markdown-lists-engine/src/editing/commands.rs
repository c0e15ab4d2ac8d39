use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

use crate::editing::buffer::{RopeBuffer, TextBuffer, line_end, line_start};
use crate::lists::Rewrite;

/// Commands that can be applied to an [`crate::editing::EditSession`]
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    InsertText {
        at: usize,
        text: String,
    },
    DeleteRange {
        range: Range<usize>,
    },
    ReplaceRange {
        range: Range<usize>,
        text: String,
    },
    /// Enter key: continue the list item under the cursor with a fresh marker
    SplitListItem {
        at: usize,
    },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EditError {
    #[error("Range {start}..{end} is outside the buffer (length {len})")]
    OutOfBounds { start: usize, end: usize, len: usize },
    #[error("Offset {0} is not on a character boundary")]
    NotCharBoundary(usize),
}

/// A single replacement: `range` of the current buffer becomes `text`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Replacement {
    pub range: Range<usize>,
    pub text: String,
}

/// Compile a command into the replacement the host widget would perform
pub(crate) fn compile_command(buffer: &RopeBuffer, cmd: &Cmd) -> Result<Replacement, EditError> {
    let replacement = match cmd {
        Cmd::InsertText { at, text } => Replacement {
            range: *at..*at,
            text: text.clone(),
        },
        Cmd::DeleteRange { range } => Replacement {
            range: range.clone(),
            text: String::new(),
        },
        Cmd::ReplaceRange { range, text } => Replacement {
            range: range.clone(),
            text: text.clone(),
        },
        Cmd::SplitListItem { at } => {
            check_offset(buffer, *at)?;
            Replacement {
                range: *at..*at,
                text: split_text(buffer, *at),
            }
        }
    };

    check_range(buffer, &replacement.range)?;
    Ok(replacement)
}

fn check_offset(buffer: &RopeBuffer, offset: usize) -> Result<(), EditError> {
    check_range(buffer, &(offset..offset))
}

fn check_range(buffer: &RopeBuffer, range: &Range<usize>) -> Result<(), EditError> {
    let len = buffer.len();
    if range.start > range.end || range.end > len {
        return Err(EditError::OutOfBounds {
            start: range.start,
            end: range.end,
            len,
        });
    }
    for offset in [range.start, range.end] {
        if !buffer.is_char_boundary(offset) {
            return Err(EditError::NotCharBoundary(offset));
        }
    }
    Ok(())
}

/// Text inserted for Enter at `at`: a newline, plus the indent and next
/// marker when the current line is a list item with content after the cursor
/// has passed its marker.
fn split_text(buffer: &RopeBuffer, at: usize) -> String {
    static ITEM_REGEX: OnceLock<Regex> = OnceLock::new();
    let item_regex = ITEM_REGEX.get_or_init(|| {
        Regex::new(r"^([ \t]*)(?:(\d{1,9})\.|([*+-]))( \[[ xX]\])? ")
            .expect("Invalid list item regex")
    });

    let start = line_start(buffer, at);
    let end = line_end(buffer, at);
    let line = buffer.slice(start..end);

    let mut text = String::from("\n");
    let Some(caps) = item_regex.captures(&line) else {
        return text;
    };

    let prefix_len = caps.get(0).map_or(0, |m| m.end());
    let has_content = !line[prefix_len..].trim().is_empty();
    if !has_content || at < start + prefix_len {
        return text;
    }

    text.push_str(caps.get(1).map_or("", |m| m.as_str()));
    if let Some(number) = caps.get(2).and_then(|m| m.as_str().parse::<u64>().ok()) {
        text.push_str(&format!("{}.", number + 1));
    } else if let Some(bullet) = caps.get(3) {
        text.push_str(bullet.as_str());
    }
    if caps.get(4).is_some() {
        text.push_str(" [ ]");
    }
    text.push(' ');
    text
}

/// Transform a caret through the deletions and renumber splices made by the
/// list watcher, in the order it made them
pub(crate) fn transform_caret(
    caret: usize,
    deleted: &[Range<usize>],
    rewritten: &[Rewrite],
) -> usize {
    let deletions = deleted.iter().map(|range| (range, 0));
    let rewrites = rewritten.iter().map(|rewrite| (&rewrite.range, rewrite.len));

    deletions.chain(rewrites).fold(caret, |caret, (range, len)| {
        if caret >= range.end {
            caret - range.len() + len
        } else if caret > range.start {
            caret.min(range.start + len)
        } else {
            caret
        }
    })
}
