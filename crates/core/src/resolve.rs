//! Constant resolution -- substitute `?(name)` references, memoize each
//! constant's value and reject reference cycles.
//!
//! Declarations are registered before anything is evaluated, so constants
//! may be referenced before they are declared. A resolver borrows the syntax
//! tree of one program and is consumed by [`Resolver::resolve`]; nothing
//! carries over to the next conversion.
//!
//! Resolved values never nest deeper than [`MAX_NESTING_DEPTH`], and the
//! chain of constants being resolved at once is capped at the same length.

use indexmap::IndexMap;

use crate::ast::Node;
use crate::error::ConvertError;
use crate::parser::MAX_NESTING_DEPTH;
use crate::value::{Table, Value};

/// Output key for top-level values that are not tables.
pub const BARE_RESULT_KEY: &str = "_result";

#[derive(Debug)]
enum Constant<'a> {
    /// Right-hand side of the (last) declaration, not evaluated yet.
    Unresolved(&'a Node),
    Resolved { value: Value, depth: usize },
}

impl Constant<'_> {
    fn resolved(value: Value) -> Self {
        let depth = value.depth();
        Constant::Resolved { value, depth }
    }
}

/// Names of the constants currently being resolved, outermost first.
#[derive(Debug, Default)]
struct ResolutionPath {
    stack: Vec<String>,
}

impl ResolutionPath {
    fn enter(&mut self, name: &str) -> Result<(), ConvertError> {
        if let Some(pos) = self.stack.iter().position(|n| n == name) {
            let mut cycle = self.stack[pos..].to_vec();
            cycle.push(name.to_owned());
            return Err(ConvertError::CircularDependency {
                name: name.to_owned(),
                path: cycle,
            });
        }
        if self.stack.len() == MAX_NESTING_DEPTH {
            return Err(too_deep(Some(name)));
        }
        self.stack.push(name.to_owned());
        Ok(())
    }

    fn exit(&mut self) {
        self.stack.pop();
    }

    fn innermost(&self) -> Option<&str> {
        self.stack.last().map(String::as_str)
    }
}

fn too_deep(name: Option<&str>) -> ConvertError {
    ConvertError::NestingTooDeep {
        name: name.map(str::to_owned),
        limit: MAX_NESTING_DEPTH,
    }
}

pub struct Resolver<'a> {
    nodes: &'a [Node],
    constants: IndexMap<String, Constant<'a>>,
    /// Number of constant right-hand sides evaluated so far.
    evaluations: usize,
}

impl<'a> Resolver<'a> {
    pub fn new(nodes: &'a [Node]) -> Self {
        Self::with_defines(nodes, &Table::new())
    }

    /// Seed the constant table with already-resolved values before the
    /// program's own declarations are registered. A declaration with the
    /// same name replaces the define.
    pub fn with_defines(nodes: &'a [Node], defines: &Table) -> Self {
        let mut constants: IndexMap<String, Constant<'a>> = defines
            .iter()
            .map(|(name, value)| (name.clone(), Constant::resolved(value.clone())))
            .collect();
        for node in nodes {
            if let Node::ConstDeclaration { name, value } = node {
                constants.insert(name.clone(), Constant::Unresolved(&**value));
            }
        }
        Resolver {
            nodes,
            constants,
            evaluations: 0,
        }
    }

    /// Evaluate every top-level value into the output mapping.
    pub fn resolve(mut self) -> Result<Table, ConvertError> {
        self.run()
    }

    fn run(&mut self) -> Result<Table, ConvertError> {
        let nodes = self.nodes;
        let mut path = ResolutionPath::default();
        let mut results = Table::new();

        for node in nodes {
            match node {
                Node::ConstDeclaration { .. } => {}
                // Entries sit inside the top-level table, one level down.
                Node::Table(entries) => {
                    for entry in entries {
                        let value = self.eval(&entry.value, 1, &mut path)?;
                        results.insert(entry.key.clone(), value);
                    }
                }
                other => {
                    let value = self.eval(other, 0, &mut path)?;
                    results.insert(BARE_RESULT_KEY.to_owned(), value);
                }
            }
        }

        // Unreferenced declarations still have to resolve cleanly.
        let pending: Vec<String> = self
            .constants
            .iter()
            .filter(|(_, c)| matches!(c, Constant::Unresolved(_)))
            .map(|(name, _)| name.clone())
            .collect();
        for name in &pending {
            self.resolve_ref(name, 0, &mut path)?;
        }

        tracing::debug!(
            keys = results.len(),
            constants = self.constants.len(),
            evaluated = self.evaluations,
            "resolved constants"
        );
        Ok(results)
    }

    /// `depth` is the number of containers enclosing `node` in the output.
    fn eval(
        &mut self,
        node: &'a Node,
        depth: usize,
        path: &mut ResolutionPath,
    ) -> Result<Value, ConvertError> {
        match node {
            Node::Integer(n) => Ok(Value::Integer(*n)),
            Node::ConstReference(name) => self.resolve_ref(name, depth, path),
            Node::Array(items) => {
                if depth == MAX_NESTING_DEPTH {
                    return Err(too_deep(path.innermost()));
                }
                items
                    .iter()
                    .map(|item| self.eval(item, depth + 1, path))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array)
            }
            Node::Table(entries) => {
                if depth == MAX_NESTING_DEPTH {
                    return Err(too_deep(path.innermost()));
                }
                let mut table = Table::with_capacity(entries.len());
                for entry in entries {
                    let value = self.eval(&entry.value, depth + 1, path)?;
                    table.insert(entry.key.clone(), value);
                }
                Ok(Value::Table(table))
            }
            // Forces the declared constant; top-level callers discard the value.
            Node::ConstDeclaration { name, .. } => self.resolve_ref(name, depth, path),
        }
    }

    fn resolve_ref(
        &mut self,
        name: &str,
        depth: usize,
        path: &mut ResolutionPath,
    ) -> Result<Value, ConvertError> {
        let node = match self.constants.get(name) {
            None => {
                return Err(ConvertError::UndefinedConstant {
                    name: name.to_owned(),
                })
            }
            Some(Constant::Resolved {
                value,
                depth: value_depth,
            }) => {
                if depth + value_depth > MAX_NESTING_DEPTH {
                    return Err(too_deep(Some(name)));
                }
                tracing::trace!(name, "constant cache hit");
                return Ok(value.clone());
            }
            Some(Constant::Unresolved(node)) => *node,
        };

        path.enter(name)?;
        let result = self.eval(node, depth, path);
        path.exit();
        let value = result?;

        tracing::trace!(name, "constant resolved");
        self.evaluations += 1;
        self.constants
            .insert(name.to_owned(), Constant::resolved(value.clone()));
        Ok(value)
    }
}

/// Resolve a parsed program with a fresh constant table.
pub fn resolve_all(nodes: &[Node]) -> Result<Table, ConvertError> {
    Resolver::new(nodes).resolve()
}
