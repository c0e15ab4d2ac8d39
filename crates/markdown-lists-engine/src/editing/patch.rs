use crate::lists::ChangeOutcome;

/// Result of applying a command
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    /// Ranges of inserted text, in the buffer before list cleanup ran
    pub changed: Vec<std::ops::Range<usize>>,
    pub new_selection: std::ops::Range<usize>,
    pub version: u64,
    /// What the list watcher did after the edit
    pub list_changes: ChangeOutcome,
}
