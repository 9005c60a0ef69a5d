//! Syntax tree produced by the parser.
//!
//! Nodes are built once and never mutated; constant references are kept by
//! name and only substituted by the resolver.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Integer(i64),
    /// `?(name)`
    ConstReference(String),
    /// `<< v, v, ... >>`
    Array(Vec<Node>),
    /// `{ k -> v. k -> v }` -- entry order is preserved to the output
    Table(Vec<TableEntry>),
    /// `name := value;` -- only produced at top level
    ConstDeclaration { name: String, value: Box<Node> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableEntry {
    pub key: String,
    pub value: Node,
}
