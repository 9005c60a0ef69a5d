//! TOML output -- render a resolved mapping as a TOML document.
//!
//! Tables become `[dotted.path]` sections, except inside arrays where they
//! are written as inline tables. Key and element order follow insertion
//! order. Within a table, plain key/value lines always come before its
//! sub-sections, which TOML requires.
//!
//! Rendering recurses once per level of nesting. Values coming out of the
//! resolver are at most [`crate::MAX_NESTING_DEPTH`] levels deep; documents
//! built by hand through [`TomlDocument`] are not checked.

use crate::value::{Table, Value};

/// A TOML document under construction.
///
/// [`TomlDocument::insert`] treats `.` in a key as a path separator, so deep
/// structures can be built from flat keys such as `"server.tls.port"`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TomlDocument {
    header: Option<String>,
    root: Table,
}

impl TomlDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Comment written as the first line(s) of the document.
    pub fn with_header(mut self, comment: impl Into<String>) -> Self {
        self.header = Some(comment.into());
        self
    }

    /// Insert `value` at `key`, splitting the key on `.` into nested tables.
    /// Missing intermediate tables are created; an intermediate that holds a
    /// non-table value is replaced by a table. An existing final key keeps its
    /// position and takes the new value.
    pub fn insert(&mut self, key: &str, value: Value) {
        let mut parts: Vec<&str> = key.split('.').collect();
        let last = parts.pop().unwrap_or(key);
        let mut current = &mut self.root;
        for part in parts {
            current = child_table(current, part);
        }
        current.insert(last.to_owned(), value);
    }

    pub fn root(&self) -> &Table {
        &self.root
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(header) = &self.header {
            for line in header.lines() {
                out.push_str("# ");
                out.push_str(line);
                out.push('\n');
            }
        }
        let mut path = Vec::new();
        write_table(&self.root, &mut path, &mut out);
        out
    }
}

/// Render a resolved mapping. Top-level keys go through
/// [`TomlDocument::insert`], so dotted keys expand into sections.
pub fn serialize(mapping: &Table, header: Option<&str>) -> String {
    let mut doc = TomlDocument::new();
    if let Some(header) = header {
        doc = doc.with_header(header);
    }
    for (key, value) in mapping {
        doc.insert(key, value.clone());
    }
    let out = doc.render();
    tracing::debug!(keys = mapping.len(), bytes = out.len(), "serialized TOML");
    out
}

fn child_table<'t>(table: &'t mut Table, key: &str) -> &'t mut Table {
    let slot = table
        .entry(key.to_owned())
        .or_insert_with(|| Value::Table(Table::new()));
    if !slot.is_table() {
        *slot = Value::Table(Table::new());
    }
    match slot {
        Value::Table(t) => t,
        _ => unreachable!("slot was just replaced by a table"),
    }
}

/// A section header is only needed when the table has something of its own
/// to show; tables holding only sub-tables are implied by their children.
fn needs_header(table: &Table) -> bool {
    table.is_empty() || table.values().any(|v| !v.is_table())
}

fn write_table(table: &Table, path: &mut Vec<String>, out: &mut String) {
    for (key, value) in table {
        if value.is_table() {
            continue;
        }
        out.push_str(&format_key(key));
        out.push_str(" = ");
        write_inline(value, out);
        out.push('\n');
    }

    for (key, value) in table {
        let Value::Table(child) = value else {
            continue;
        };
        path.push(key.clone());
        if needs_header(child) {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push('[');
            out.push_str(&format_path(path));
            out.push_str("]\n");
        }
        write_table(child, path, out);
        path.pop();
    }
}

fn write_inline(value: &Value, out: &mut String) {
    match value {
        Value::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Integer(n) => out.push_str(&n.to_string()),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_inline(item, out);
            }
            out.push(']');
        }
        Value::Table(table) => {
            if table.is_empty() {
                out.push_str("{}");
                return;
            }
            out.push_str("{ ");
            for (i, (key, item)) in table.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&format_key(key));
                out.push_str(" = ");
                write_inline(item, out);
            }
            out.push_str(" }");
        }
    }
}

fn format_path(path: &[String]) -> String {
    path.iter()
        .map(|k| format_key(k))
        .collect::<Vec<_>>()
        .join(".")
}

fn is_bare_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn format_key(key: &str) -> String {
    if is_bare_key(key) {
        return key.to_owned();
    }
    let mut s = String::with_capacity(key.len() + 2);
    s.push('"');
    for c in key.chars() {
        match c {
            '"' => s.push_str("\\\""),
            '\\' => s.push_str("\\\\"),
            '\n' => s.push_str("\\n"),
            '\t' => s.push_str("\\t"),
            '\r' => s.push_str("\\r"),
            c if c.is_control() => s.push_str(&format!("\\u{:04X}", c as u32)),
            c => s.push(c),
        }
    }
    s.push('"');
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: Vec<(&str, Value)>) -> Table {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v))
            .collect()
    }

    fn int(n: i64) -> Value {
        Value::Integer(n)
    }

    #[test]
    fn scalars_then_sections() {
        let mapping = table(vec![
            ("server", Value::Table(table(vec![("port", int(8080))]))),
            ("name", int(1)),
        ]);
        assert_eq!(
            serialize(&mapping, None),
            "name = 1\n\n[server]\nport = 8080\n"
        );
    }

    #[test]
    fn header_comes_first() {
        let mapping = table(vec![("a", int(1))]);
        assert_eq!(serialize(&mapping, Some("hello")), "# hello\na = 1\n");
    }

    #[test]
    fn booleans_are_not_integers() {
        let mapping = table(vec![
            ("on", Value::Boolean(true)),
            ("off", Value::Boolean(false)),
            ("one", int(1)),
        ]);
        assert_eq!(serialize(&mapping, None), "on = true\noff = false\none = 1\n");
    }

    #[test]
    fn tables_in_arrays_are_inline() {
        let mapping = table(vec![(
            "items",
            Value::Array(vec![
                Value::Table(table(vec![("id", int(1)), ("tags", Value::Array(vec![int(2)]))])),
                Value::Table(Table::new()),
                Value::Array(vec![]),
            ]),
        )]);
        assert_eq!(
            serialize(&mapping, None),
            "items = [{ id = 1, tags = [2] }, {}, []]\n"
        );
    }

    #[test]
    fn super_tables_have_no_header() {
        let mapping = table(vec![(
            "database",
            Value::Table(table(vec![(
                "main",
                Value::Table(table(vec![("port", int(5432))])),
            )])),
        )]);
        assert_eq!(
            serialize(&mapping, None),
            "[database.main]\nport = 5432\n"
        );
    }

    #[test]
    fn empty_table_keeps_its_header() {
        let mapping = table(vec![("empty", Value::Table(Table::new()))]);
        assert_eq!(serialize(&mapping, None), "[empty]\n");
    }

    #[test]
    fn nested_sections_follow_parent_values() {
        let mapping = table(vec![(
            "app",
            Value::Table(table(vec![
                ("settings", Value::Table(table(vec![("debug", Value::Boolean(true))]))),
                ("version", Value::Array(vec![int(1), int(2)])),
            ])),
        )]);
        assert_eq!(
            serialize(&mapping, None),
            "[app]\nversion = [1, 2]\n\n[app.settings]\ndebug = true\n"
        );
    }

    #[test]
    fn dotted_keys_expand_into_sections() {
        let mut doc = TomlDocument::new();
        doc.insert("server.tls.port", int(443));
        doc.insert("server.host_id", int(7));
        doc.insert("top", int(1));
        assert_eq!(
            doc.render(),
            "top = 1\n\n[server]\nhost_id = 7\n\n[server.tls]\nport = 443\n"
        );
    }

    #[test]
    fn dotted_key_replaces_scalar_intermediate() {
        let mut doc = TomlDocument::new();
        doc.insert("a", int(1));
        doc.insert("a.b", int(2));
        assert_eq!(doc.root()["a"], Value::Table(table(vec![("b", int(2))])));
    }

    #[test]
    fn non_bare_keys_are_quoted() {
        let mapping = table(vec![
            ("порт", int(1)),
            ("with space", Value::Table(table(vec![("x", int(2))]))),
        ]);
        assert_eq!(
            serialize(&mapping, None),
            "\"порт\" = 1\n\n[\"with space\"]\nx = 2\n"
        );
    }

    #[test]
    fn quoted_key_escapes() {
        assert_eq!(format_key("a\"b\\c"), "\"a\\\"b\\\\c\"");
        assert_eq!(format_key(""), "\"\"");
        assert_eq!(format_key("tab\there"), "\"tab\\there\"");
    }

    #[test]
    fn empty_mapping_renders_header_only() {
        assert_eq!(serialize(&Table::new(), Some("h")), "# h\n");
        assert_eq!(serialize(&Table::new(), None), "");
    }
}
