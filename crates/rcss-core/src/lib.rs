//! Core of the rcss compiler: parsing, tree rewriting, nesting flattening and
//! negation of selector and at-rule conditions.

pub mod ast;
pub mod dnf;
pub mod emitter;
pub mod error;
pub mod expr;
pub mod negate;
pub mod nesting;
pub mod optimize;
pub mod parser;
pub mod selector;
pub mod walk;

pub use ast::AstNode;
pub use emitter::to_css;
pub use error::{Error, Result};
pub use negate::negate_rules;
pub use nesting::flatten_nesting;
pub use optimize::optimize_ast;
pub use parser::parse;
