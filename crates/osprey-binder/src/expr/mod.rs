//! Expression binding.
//!
//! This module turns [`Expr`](osprey_syntax::Expr) syntax into
//! [`BoundExpr`](crate::BoundExpr) trees. Binding is total: every syntax
//! node yields a bound node, failures are reported into the caller's
//! [`DiagnosticBag`](osprey_core::DiagnosticBag) and produce bad-expression
//! nodes that keep their partial children.
//!
//! ## Entry points
//!
//! - [`bind_expression`]: bind any expression; the result may be a type, a
//!   namespace, a method group or an untyped form
//! - [`bind_value`]: bind and then require a value of the given
//!   [`ValueKind`]
//! - [`bind_arguments_and_names`]: bind an argument list
//! - [`natural_type`]: give an untyped form its natural type
//!
//! ## Layout
//!
//! | Module | Forms |
//! |--------|-------|
//! | `dispatch` | the exhaustive match over every syntax shape |
//! | `names` | simple names, `this`, `base`, `alias::Name` |
//! | `member` | `a.b`, including `Color Color` and extension lookup |
//! | `invocation` | calls, overload failure reporting |
//! | `element` | `a[i]`: arrays, pointers, indexers, `Index`/`Range` patterns |
//! | `creation`, `initializers` | `new T(...) { ... }`, delegates |
//! | `arrays` | array creation, `stackalloc` |
//! | `operators`, `folding` | unary, binary, assignment, `^i`, `a..b`; constant folding |
//! | `conditional` | `?:` and switch expressions |
//! | `cast` | casts, `is`, `as` |
//! | `keywords` | `default`, `typeof`, `sizeof`, `nameof`, `checked` |
//! | `tuple`, `lambda`, `literals` | the rest |
//! | `convert` | conversions of bound expressions, including untyped forms |
//! | `value` | value-kind checks |
//! | `recovery` | bad expressions and natural typing |

mod arguments;
mod arrays;
mod cast;
mod conditional;
mod convert;
mod creation;
mod dispatch;
mod element;
mod folding;
mod initializers;
mod invocation;
mod keywords;
mod lambda;
mod literals;
mod member;
mod names;
mod operators;
mod recovery;
mod tuple;
mod value;

#[cfg(test)]
mod test_support;

pub use arguments::{AnalyzedArguments, bind_arguments_and_names};
pub use dispatch::bind_expression;
pub use recovery::{make_bad, natural_type, natural_type_without_default_diagnostic};
pub use value::{ValueKind, bind_value, check_value};
