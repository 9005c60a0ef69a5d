//! Conversion pipeline: source text -> tokens -> syntax tree -> resolved
//! values -> TOML text.
//!
//! This is a thin orchestrator that calls each stage in order and stops at
//! the first error.

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::ConvertError;
use crate::lexer;
use crate::parser;
use crate::resolve::Resolver;
use crate::serialize;
use crate::value::Table;

#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOptions {
    /// Emit the `# Generated by ...` timestamp comment as the first line.
    /// Turning it off makes the output depend on the input only.
    pub header: bool,
    /// Constants available to every reference before the program's own
    /// declarations are registered.
    pub defines: Table,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            header: true,
            defines: Table::new(),
        }
    }
}

impl ConvertOptions {
    /// Options for reproducible output: no timestamp header, no defines.
    pub fn deterministic() -> Self {
        ConvertOptions {
            header: false,
            ..Self::default()
        }
    }
}

/// Header comment text for a document generated at `at`.
pub fn generated_header(at: OffsetDateTime) -> String {
    let stamp = at
        .format(&Rfc3339)
        .unwrap_or_else(|_| at.unix_timestamp().to_string());
    format!("Generated by cfgtoml on {}", stamp)
}

/// Convert source text with the default options.
pub fn convert(src: &str) -> Result<String, ConvertError> {
    convert_with(src, &ConvertOptions::default())
}

/// Run the parse and resolve stages only, returning the mapping that would
/// be serialized.
pub fn evaluate(src: &str, options: &ConvertOptions) -> Result<Table, ConvertError> {
    let tokens = lexer::lex(src)?;
    tracing::debug!(tokens = tokens.len(), "scanned source");

    let nodes = parser::parse(&tokens)?;
    tracing::debug!(nodes = nodes.len(), "parsed program");

    Resolver::with_defines(&nodes, &options.defines).resolve()
}

pub fn convert_with(src: &str, options: &ConvertOptions) -> Result<String, ConvertError> {
    let mapping = evaluate(src, options)?;
    let header = options
        .header
        .then(|| generated_header(OffsetDateTime::now_utc()));
    Ok(serialize::serialize(&mapping, header.as_deref()))
}
