//! Resolved values: the tree after constant substitution, ready for output.

use indexmap::IndexMap;

/// Ordered key -> value mapping; insertion order is output order.
pub type Table = IndexMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Integer(i64),
    Boolean(bool),
    Array(Vec<Value>),
    Table(Table),
}

impl Value {
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_table(&self) -> bool {
        matches!(self, Value::Table(_))
    }

    /// Levels of arrays and tables: 0 for a scalar, 1 for a flat container.
    pub fn depth(&self) -> usize {
        match self {
            Value::Integer(_) | Value::Boolean(_) => 0,
            Value::Array(items) => 1 + items.iter().map(Value::depth).max().unwrap_or(0),
            Value::Table(table) => 1 + table.values().map(Value::depth).max().unwrap_or(0),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}
