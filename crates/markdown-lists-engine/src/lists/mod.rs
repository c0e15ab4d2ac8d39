//! Markdown list handling: empty-item cleanup on Enter and ordered-list
//! renumbering, driven by the before/on/after phases of an edit batch.

pub mod patterns;
pub mod renumber;
pub mod watcher;

pub use patterns::{ListPatterns, PatternError, PreviousLine};
pub use renumber::{OrderedListRenumberer, Renumberer};
pub use watcher::{ChangeOutcome, ListEditWatcher, Rewrite};
