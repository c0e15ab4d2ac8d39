/*!
 * # Editing Core Module
 *
 * Hosts the buffer abstraction list watchers operate on, plus a small
 * command-driven session that stands in for a platform text widget.
 *
 * ## Architecture Overview
 *
 * ### 1. Buffer behind a trait
 * - Watchers only see a **`TextBuffer`**: read a char, read the length, slice a
 *   range, splice or delete a range
 * - **`RopeBuffer`** is the `xi_rope::Rope` implementation; `String` implements
 *   the trait too and serves as the in-memory fake in tests
 * - Offsets are UTF-8 byte offsets everywhere
 *
 * ### 2. Command-Based Editing
 * - Edits are **Commands** (`Cmd` enum) compiled to a single replacement
 * - `Cmd::SplitListItem` is the Enter key: it continues list items with the
 *   next marker and leaves empty items for the watcher to clean up
 *
 * ### 3. Edit batches
 * - `EditSession::apply` runs one batch: watcher `before_change`, splice,
 *   watcher `on_change`, watcher `after_change`
 * - The returned **`Patch`** carries the inserted range, the new caret and the
 *   watcher's `ChangeOutcome`
 *
 * ## Module Structure
 *
 * - **`buffer`**: `TextBuffer` trait, `RopeBuffer`, line helpers
 * - **`commands`**: `Cmd` enum, `EditError`, list continuation text
 * - **`session`**: `EditSession` edit loop
 * - **`patch`**: Edit result metadata
 */

pub mod buffer;
pub mod commands;
pub mod patch;
pub mod session;

pub use buffer::{RopeBuffer, TextBuffer};
pub use commands::{Cmd, EditError};
pub use patch::Patch;
pub use session::EditSession;
