// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! # Rebuild language front-end
//!
//! This crate is a facade over the pipeline sub-crates:
//!
//! - `rebuild-ast` - data model: tokens, block tree, AST, scope entries
//! - `rebuild-lexer` - scanner + indentation filter
//! - `rebuild-parser` - block grouper, semantic parser, overload resolver
//! - `rebuild-intrinsic` - the `Rebuild` module tree and host routines
//!
//! ## Pipeline
//!
//! ```text
//! source text
//!     | scan + filter        (rebuild-lexer)
//! filtered tokens
//!     | group                (rebuild-parser::grouping)
//! block tree
//!     | parse + resolve      (rebuild-parser::parser + rebuild-intrinsic)
//! AST + scope side effects + diagnostics
//! ```
//!
//! ## Usage
//!
//! ```
//! use rebuild::{Compiler, Config, Source};
//!
//! let compiler = Compiler::new(Config::default());
//! let output = compiler.compile(&Source::new("demo.rebuild", "42"));
//! assert_eq!(output.ast.nodes.len(), 1);
//! assert!(!output.diagnostics.has_errors());
//! ```

// Re-export the pipeline sub-crates
pub use rebuild_ast as ast;
pub use rebuild_intrinsic as intrinsic;
pub use rebuild_lexer as lexer;
pub use rebuild_parser as parser;

pub mod compile;

pub use compile::{serialize_ast, CompileOutput, Compiler, Config, Source};
