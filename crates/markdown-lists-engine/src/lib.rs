pub mod editing;
pub mod io;
pub mod lists;


// Re-export key types for easier usage
pub use editing::{Cmd, EditError, EditSession, Patch, RopeBuffer, TextBuffer};
pub use io::*;
pub use lists::*;
