//! The declarative per-attribute rule language.
//!
//! Rule strings attached to schema attributes are parsed here into structured
//! [`RuleInvocation`]s. The micro-grammar has three delimiters:
//!
//! - `^^` separates component-scoped segments,
//! - `#Name` at the head of a segment scopes it to one component,
//! - `::` chains rule stages left-to-right within a segment.
//!
//! All syntax, arity, and chain validation happens at parse time so schema
//! errors surface before any manifest row is touched.

mod kind;
mod parser;

pub use kind::{InferredType, RuleKind};
pub use parser::{parse, RuleInvocation, RuleResolution};
