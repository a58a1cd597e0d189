// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! The Rebuild parsing pipeline core.
//!
//! Two stages over the filtered token stream:
//!
//! - `grouping` - indentation markers to a nested block/line tree
//! - `parser` - block tree to a typed AST, resolving names through the
//!   scope, selecting overloads and running compile-time calls
//!
//! Supporting pieces:
//!
//! - `cursor` - single-pass token cursor with one-token lookahead
//! - `view` - cheaply clonable cursor over one grouped line, so the
//!   overload resolver can speculate per candidate
//! - `context` - scope chain, intrinsic types and the compile-time
//!   dispatch seam
//! - `eval` - staticness test driving compile-time substitution

pub mod context;
pub mod cursor;
pub mod eval;
pub mod grouping;
pub mod parser;
pub mod view;

pub use context::{Context, IntrinsicRunner, NoIntrinsics};
pub use cursor::TokenCursor;
pub use parser::parse;
pub use view::LineView;
