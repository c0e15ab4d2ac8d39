use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

use crate::editing::buffer::{TextBuffer, line_end, line_start};

/// Rewrites ordered-list numbers so they count up consecutively.
///
/// Called by the list watcher once an edit batch that may have broken the
/// numbering has been committed.
pub trait Renumberer {
    /// Renumber ordered items at and after the line containing `from`.
    fn renumber(&self, buffer: &mut dyn TextBuffer, from: usize);
}

impl<F> Renumberer for F
where
    F: Fn(&mut dyn TextBuffer, usize),
{
    fn renumber(&self, buffer: &mut dyn TextBuffer, from: usize) {
        self(buffer, from)
    }
}

/// Default renumberer for markdown ordered lists.
///
/// Works on the list block around `from`: consecutive list items and their
/// indented continuation lines, ended by a blank line or unindented text.
/// Each indent level counts up from its first item; a bullet item restarts
/// the count at its level and below. Only lines starting at or after the line
/// containing `from` are rewritten.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderedListRenumberer;

#[derive(Debug, Clone, PartialEq)]
enum ListLine {
    Ordered {
        indent: usize,
        number: u64,
        digits: Range<usize>,
    },
    Unordered {
        indent: usize,
    },
    Continuation,
    Blank,
    Text,
}

impl ListLine {
    fn in_block(&self) -> bool {
        !matches!(self, ListLine::Blank | ListLine::Text)
    }
}

fn indent_width(indent: &str) -> usize {
    indent
        .chars()
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

fn classify_line(line: &str) -> ListLine {
    static ITEM_REGEX: OnceLock<Regex> = OnceLock::new();
    let item_regex = ITEM_REGEX.get_or_init(|| {
        Regex::new(r"^([ \t]*)(?:(\d{1,9})\.|[*+-])(?:[ \t]|$)").expect("Invalid list item regex")
    });

    if line.trim().is_empty() {
        return ListLine::Blank;
    }

    let Some(caps) = item_regex.captures(line) else {
        return if line.starts_with([' ', '\t']) {
            ListLine::Continuation
        } else {
            ListLine::Text
        };
    };

    let indent = caps.get(1).map_or(0, |m| indent_width(m.as_str()));
    match caps.get(2) {
        Some(digits) => match digits.as_str().parse() {
            Ok(number) => ListLine::Ordered {
                indent,
                number,
                digits: digits.range(),
            },
            Err(_) => ListLine::Text,
        },
        None => ListLine::Unordered { indent },
    }
}

fn line_at(buffer: &dyn TextBuffer, start: usize) -> ListLine {
    let end = line_end(buffer, start);
    classify_line(&buffer.slice(start..end))
}

impl OrderedListRenumberer {
    fn block_start(buffer: &dyn TextBuffer, line: usize) -> usize {
        let mut start = line;
        while start > 0 {
            let previous = line_start(buffer, start - 1);
            if !line_at(buffer, previous).in_block() {
                break;
            }
            start = previous;
        }
        start
    }
}

impl Renumberer for OrderedListRenumberer {
    fn renumber(&self, buffer: &mut dyn TextBuffer, from: usize) {
        let first_rewrite = line_start(buffer, from);
        if !line_at(buffer, first_rewrite).in_block() {
            return;
        }

        // (indent, next expected number) per open nesting level
        let mut levels: Vec<(usize, u64)> = Vec::new();
        let mut pos = Self::block_start(buffer, first_rewrite);

        loop {
            match line_at(buffer, pos) {
                ListLine::Ordered {
                    indent,
                    number,
                    digits,
                } => {
                    while levels.last().is_some_and(|(w, _)| *w > indent) {
                        levels.pop();
                    }
                    let expected = match levels.last_mut() {
                        Some((w, next)) if *w == indent => {
                            let expected = *next;
                            *next += 1;
                            expected
                        }
                        _ => {
                            levels.push((indent, number + 1));
                            number
                        }
                    };
                    if expected != number && pos >= first_rewrite {
                        log::trace!("renumbering list item at {pos}: {number} -> {expected}");
                        buffer.splice(
                            pos + digits.start..pos + digits.end,
                            &expected.to_string(),
                        );
                    }
                }
                ListLine::Unordered { indent } => {
                    while levels.last().is_some_and(|(w, _)| *w >= indent) {
                        levels.pop();
                    }
                }
                ListLine::Continuation => {}
                ListLine::Blank | ListLine::Text => break,
            }

            let end = line_end(buffer, pos);
            if end >= buffer.len() {
                break;
            }
            pos = end + 1;
        }
    }
}
