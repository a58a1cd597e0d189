//! Source location tracking shared by every pipeline stage.

mod source;
mod span;

pub use source::SourceFile;
pub use span::{Position, SourceRange};
