//! cfgtoml-core: converter from the cfgtoml configuration language to TOML.
//!
//! The pipeline has four stages, each in its own module:
//!
//! - [`lexer`] -- source text to tokens
//! - [`parser`] -- tokens to a syntax tree ([`ast`])
//! - [`resolve`] -- constant substitution and cycle detection, producing a
//!   [`Table`] of resolved [`Value`]s
//! - [`serialize`] -- resolved mapping to TOML text
//!
//! [`convert()`] runs all four; [`ConvertError`] is the only error type that
//! leaves the pipeline.

pub mod ast;
pub mod convert;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod resolve;
pub mod serialize;
pub mod value;

// ── Convenience re-exports ───────────────────────────────────────────

pub use ast::{Node, TableEntry};
pub use convert::{convert, convert_with, evaluate, ConvertOptions};
pub use error::{ConvertError, Expected};
pub use lexer::{lex, Spanned, Token, TokenKind};
pub use parser::{parse, MAX_NESTING_DEPTH};
pub use resolve::{resolve_all, Resolver, BARE_RESULT_KEY};
pub use serialize::{serialize, TomlDocument};
pub use value::{Table, Value};
