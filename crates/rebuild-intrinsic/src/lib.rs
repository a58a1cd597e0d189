// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! The intrinsic registry: the `Rebuild` module tree and its host
//! routines.
//!
//! Installation declares this structure into the global scope:
//!
//! ```text
//! Rebuild
//!   say      - print a compile-time value        [compiletime]
//!   concat   - join two strings into one         [compiletime]
//!   Context
//!     declareVariable   name :Type = value       [compiletime]
//!     declareFunction   left= name (right) ():   [compiletime]
//!     declareModule     name:                    [compiletime]
//!   literal
//!     String Number Identifier Operator BlockLiteral IdTypeValue
//! ```
//!
//! Each literal entry is a module wrapping its `type` entry; parameters
//! declared with these types select the sub-parser the type carries.
//!
//! The registry maps function identities to host routines and implements
//! the parser's [`rebuild_parser::IntrinsicRunner`] seam. Declare
//! intrinsics mutate the scope and keep their call node; `concat`
//! produces a value that replaces its call.

mod ops;
mod registry;

pub use ops::IntrinsicError;
pub use registry::Registry;
