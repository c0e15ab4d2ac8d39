use regex::Regex;
use std::sync::OnceLock;

/// Bullet marker, optionally followed by a task checkbox (`- [ ]`, `* [x]`).
pub const DEFAULT_UNORDERED_PATTERN: &str = r"^[*+-]( \[[ xX]\])?";

/// Ordered marker; capture group 1 holds the number.
pub const DEFAULT_ORDERED_PATTERN: &str = r"^(\d+)\.";

#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error("Invalid {kind} list pattern: {source}")]
    InvalidRegex {
        kind: &'static str,
        source: regex::Error,
    },
    #[error("Ordered list pattern must capture the item number in group 1: {pattern}")]
    MissingNumberGroup { pattern: String },
}

/// What the text before a freshly inserted newline looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviousLine {
    /// A list marker with nothing after it but a single space
    EmptyItem,
    /// An ordered item that has content
    OrderedItem,
    Other,
}

/// The two list-marker matchers the watcher consults.
#[derive(Debug, Clone)]
pub struct ListPatterns {
    unordered: Regex,
    ordered: Regex,
}

impl ListPatterns {
    /// Build matchers from regex sources.
    ///
    /// The ordered pattern needs a first capture group containing the number,
    /// since an empty ordered item is recognised by rebuilding `"<number>. "`.
    pub fn from_sources(unordered: &str, ordered: &str) -> Result<Self, PatternError> {
        let unordered = Regex::new(unordered).map_err(|source| PatternError::InvalidRegex {
            kind: "unordered",
            source,
        })?;
        let ordered_regex = Regex::new(ordered).map_err(|source| PatternError::InvalidRegex {
            kind: "ordered",
            source,
        })?;
        if ordered_regex.captures_len() < 2 {
            return Err(PatternError::MissingNumberGroup {
                pattern: ordered.to_string(),
            });
        }
        Ok(Self {
            unordered,
            ordered: ordered_regex,
        })
    }

    /// Classify the content of a line (leading whitespace already stripped).
    ///
    /// A marker only counts as an empty item when `marker + " "` is the whole
    /// line; a match that is merely a prefix is rejected.
    pub fn classify(&self, line: &str) -> PreviousLine {
        if let Some(m) = self.unordered.find(line)
            && line == format!("{} ", m.as_str())
        {
            return PreviousLine::EmptyItem;
        }

        match self.ordered.captures(line) {
            Some(caps) => {
                let number = caps.get(1).map_or("", |g| g.as_str());
                if line == format!("{number}. ") {
                    PreviousLine::EmptyItem
                } else {
                    PreviousLine::OrderedItem
                }
            }
            None => PreviousLine::Other,
        }
    }
}

impl Default for ListPatterns {
    fn default() -> Self {
        static DEFAULT_PATTERNS: OnceLock<ListPatterns> = OnceLock::new();
        DEFAULT_PATTERNS
            .get_or_init(|| ListPatterns {
                unordered: Regex::new(DEFAULT_UNORDERED_PATTERN).expect("Invalid unordered regex"),
                ordered: Regex::new(DEFAULT_ORDERED_PATTERN).expect("Invalid ordered regex"),
            })
            .clone()
    }
}
