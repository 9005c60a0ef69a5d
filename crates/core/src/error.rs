use std::fmt;

use crate::lexer::TokenKind;

/// What the parser was looking for when it hit a mismatching token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    Token(TokenKind),
    /// Any token that can start a value: integer, `?(`, `<<` or `{`.
    Value,
    /// A container opened past the nesting limit.
    NestingAtMost(usize),
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Token(kind) => write!(f, "{}", kind),
            Expected::Value => f.write_str("a value"),
            Expected::NestingAtMost(limit) => write!(f, "at most {} levels of nesting", limit),
        }
    }
}

/// A conversion error. Every failure in the pipeline surfaces as exactly one
/// of these; the first error aborts the conversion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConvertError {
    #[error("{line}:{column}: {message}")]
    Lex {
        line: u32,
        column: u32,
        message: String,
    },

    #[error("{line}:{column}: expected {expected}, found {found}")]
    Syntax {
        expected: Expected,
        found: TokenKind,
        line: u32,
        column: u32,
    },

    #[error("undefined constant '{name}'")]
    UndefinedConstant { name: String },

    /// `path` starts at the first occurrence of `name` on the active
    /// resolution path and ends with `name` again.
    #[error("circular constant dependency: {}", .path.join(" -> "))]
    CircularDependency { name: String, path: Vec<String> },

    /// Resolution would build a value nested deeper than `limit`, or follow
    /// a reference chain longer than `limit`. `name` is the constant being
    /// entered or spliced in, when there is one.
    #[error("{}", nesting_message(.name.as_deref(), .limit))]
    NestingTooDeep { name: Option<String>, limit: usize },
}

fn nesting_message(name: Option<&str>, limit: &usize) -> String {
    match name {
        Some(name) => format!("constant '{}' would nest deeper than {} levels", name, limit),
        None => format!("value would nest deeper than {} levels", limit),
    }
}

impl ConvertError {
    pub fn lex(line: u32, column: u32, message: impl Into<String>) -> Self {
        ConvertError::Lex {
            line,
            column,
            message: message.into(),
        }
    }

    /// Stable tag used in the JSON error format and by the conformance suite.
    pub fn kind(&self) -> &'static str {
        match self {
            ConvertError::Lex { .. } => "lex",
            ConvertError::Syntax { .. } => "syntax",
            ConvertError::UndefinedConstant { .. } => "undefined_constant",
            ConvertError::CircularDependency { .. } => "circular_dependency",
            ConvertError::NestingTooDeep { .. } => "nesting_too_deep",
        }
    }

    /// Source position, for the errors that have one.
    pub fn position(&self) -> Option<(u32, u32)> {
        match self {
            ConvertError::Lex { line, column, .. } | ConvertError::Syntax { line, column, .. } => {
                Some((*line, *column))
            }
            ConvertError::UndefinedConstant { .. }
            | ConvertError::CircularDependency { .. }
            | ConvertError::NestingTooDeep { .. } => None,
        }
    }

    /// Offending constant name, for the resolution errors.
    pub fn name(&self) -> Option<&str> {
        match self {
            ConvertError::UndefinedConstant { name }
            | ConvertError::CircularDependency { name, .. } => Some(name),
            ConvertError::NestingTooDeep { name, .. } => name.as_deref(),
            ConvertError::Lex { .. } | ConvertError::Syntax { .. } => None,
        }
    }

    /// Serialize to the fixed-shape JSON error object.
    /// All fields are always present (null when they do not apply).
    pub fn to_json_value(&self) -> serde_json::Value {
        let (line, column) = match self.position() {
            Some((line, column)) => (Some(line), Some(column)),
            None => (None, None),
        };
        serde_json::json!({
            "column":  column,
            "kind":    self.kind(),
            "line":    line,
            "message": self.to_string(),
            "name":    self.name(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_error_message_names_both_kinds() {
        let err = ConvertError::Syntax {
            expected: Expected::Token(TokenKind::ArrayClose),
            found: TokenKind::Eof,
            line: 3,
            column: 7,
        };
        assert_eq!(err.to_string(), "3:7: expected '>>', found end of input");
        assert_eq!(err.kind(), "syntax");
    }

    #[test]
    fn cycle_message_joins_path() {
        let err = ConvertError::CircularDependency {
            name: "a".to_owned(),
            path: vec!["a".to_owned(), "b".to_owned(), "a".to_owned()],
        };
        assert_eq!(err.to_string(), "circular constant dependency: a -> b -> a");
    }

    #[test]
    fn nesting_message_names_constant_when_known() {
        let err = ConvertError::NestingTooDeep {
            name: Some("deep".to_owned()),
            limit: 256,
        };
        assert_eq!(
            err.to_string(),
            "constant 'deep' would nest deeper than 256 levels"
        );
        assert_eq!(err.name(), Some("deep"));
        assert_eq!(err.kind(), "nesting_too_deep");

        let err = ConvertError::NestingTooDeep {
            name: None,
            limit: 8,
        };
        assert_eq!(err.to_string(), "value would nest deeper than 8 levels");
        assert!(err.to_json_value()["name"].is_null());
    }

    #[test]
    fn nesting_limit_reads_in_syntax_errors() {
        let err = ConvertError::Syntax {
            expected: Expected::NestingAtMost(256),
            found: TokenKind::TableOpen,
            line: 1,
            column: 9,
        };
        assert_eq!(
            err.to_string(),
            "1:9: expected at most 256 levels of nesting, found '{'"
        );
    }

    #[test]
    fn json_value_has_nulls_for_missing_fields() {
        let err = ConvertError::UndefinedConstant {
            name: "port".to_owned(),
        };
        let json = err.to_json_value();
        assert_eq!(json["kind"], "undefined_constant");
        assert_eq!(json["name"], "port");
        assert!(json["line"].is_null());
        assert!(json["column"].is_null());
        assert_eq!(json["message"], "undefined constant 'port'");
    }
}
