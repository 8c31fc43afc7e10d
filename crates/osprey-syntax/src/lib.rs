//! Expression syntax for the osprey front end.
//!
//! All nodes are allocated in a `bumpalo` arena and borrow from it for
//! `'ast`. The expression set is closed: [`ast::Expr`] enumerates every shape
//! the binder accepts. There is no parser here; [`AstBuilder`] builds trees
//! directly for tests, benchmarks and embedding hosts.

pub mod ast;
mod builder;

pub use ast::*;
pub use builder::AstBuilder;
