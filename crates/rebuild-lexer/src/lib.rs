// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Lexical analysis for the Rebuild language.
//!
//! Two layers:
//!
//! - `scanner` - logos-based raw tokenization over byte spans
//! - `filter` - positions raw tokens (line/column with tab expansion),
//!   computes separation flags, rewrites trailing colons and `end` lines
//!   into block start/end markers, and drops whitespace and comments
//!
//! The filter's output is the materialized filtered-token stream the block
//! grouper consumes; cursors over it clone in O(1).

pub mod filter;
pub mod scanner;

pub use filter::tokenize;
pub use scanner::RawToken;
