//! Lexically nested symbol table
//!
//! Scopes live in an arena inside [`SymbolTable`] and refer to their parent
//! by [`ScopeId`]. The checker opens one global scope and one child scope per
//! function. Each scope also keeps a stack of active loops, so `break`
//! legality is a property of the scope being checked.

use crate::parser::ast::SourceLocation;
use crate::semantic::types::ValueType;
use rustc_hash::FxHashMap;
use std::fmt;
use tracing::trace;

/// Index of a scope in the arena
pub type ScopeId = usize;

/// The global scope is always the first one created
pub const GLOBAL_SCOPE: ScopeId = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Function(String),
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeKind::Global => write!(f, "global"),
            ScopeKind::Function(name) => write!(f, "function {}", name),
        }
    }
}

/// Whether a variable was declared as a parameter or a local
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarRole {
    Param,
    Local,
}

/// A symbol table entry
#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    Function {
        params: Vec<ValueType>,
        location: SourceLocation,
    },
    Variable {
        ty: ValueType,
        role: VarRole,
        location: SourceLocation,
    },
}

impl Symbol {
    pub fn location(&self) -> &SourceLocation {
        match self {
            Symbol::Function { location, .. } => location,
            Symbol::Variable { location, .. } => location,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Function { params, location } => {
                let params: Vec<String> = params.iter().map(|p| p.to_string()).collect();
                write!(
                    f,
                    "function({}) -> int, line {}",
                    params.join(", "),
                    location.line
                )
            }
            Symbol::Variable { ty, role, location } => {
                let role = match role {
                    VarRole::Param => "param",
                    VarRole::Local => "local",
                };
                write!(f, "{} {}, line {}", role, ty, location.line)
            }
        }
    }
}

/// Marker for one active loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopContext {
    pub location: SourceLocation,
}

/// A single scope: its bindings in definition order and its active loops
#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    entries: FxHashMap<String, Symbol>,
    order: Vec<String>,
    loops: Vec<LoopContext>,
}

impl Scope {
    fn new(kind: ScopeKind, parent: Option<ScopeId>) -> Self {
        Scope {
            kind,
            parent,
            entries: FxHashMap::default(),
            order: Vec::new(),
            loops: Vec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.entries.get(name)
    }

    /// Entries in the order they were defined
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Symbol)> {
        self.order
            .iter()
            .filter_map(|name| self.entries.get(name).map(|sym| (name.as_str(), sym)))
    }
}

/// Returned by [`SymbolTable::define`] when the name is already bound in the
/// current scope. Carries the existing entry's location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicateSymbol {
    pub previous: SourceLocation,
}

/// Arena of scopes with a cursor on the current one
#[derive(Debug, Clone)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    current: ScopeId,
}

impl SymbolTable {
    /// Create a table holding only the global scope
    pub fn new() -> Self {
        SymbolTable {
            scopes: vec![Scope::new(ScopeKind::Global, None)],
            current: GLOBAL_SCOPE,
        }
    }

    /// Open a child of the current scope and make it current
    pub fn push_scope(&mut self, kind: ScopeKind) -> ScopeId {
        let id = self.scopes.len();
        trace!(scope = id, parent = self.current, %kind, "opened scope");
        self.scopes.push(Scope::new(kind, Some(self.current)));
        self.current = id;
        id
    }

    /// Return to the parent scope. The global scope is never popped.
    pub fn pop_scope(&mut self) {
        if let Some(parent) = self.scopes[self.current].parent {
            self.current = parent;
        }
    }

    pub fn scope(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id)
    }

    /// Bind `name` in the current scope. Shadowing an outer binding is fine;
    /// rebinding in the same scope is not.
    pub fn define(&mut self, name: &str, symbol: Symbol) -> Result<(), DuplicateSymbol> {
        let scope = &mut self.scopes[self.current];

        if let Some(existing) = scope.entries.get(name) {
            return Err(DuplicateSymbol {
                previous: *existing.location(),
            });
        }

        scope.entries.insert(name.to_string(), symbol);
        scope.order.push(name.to_string());
        Ok(())
    }

    /// Nearest binding of `name`, searching outward from the current scope
    pub fn resolve(&self, name: &str) -> Option<&Symbol> {
        let mut id = Some(self.current);

        while let Some(scope_id) = id {
            let scope = &self.scopes[scope_id];
            if let Some(symbol) = scope.entries.get(name) {
                return Some(symbol);
            }
            id = scope.parent;
        }

        None
    }

    /// Binding of `name` in the current scope only
    pub fn resolve_local(&self, name: &str) -> Option<&Symbol> {
        self.scopes[self.current].entries.get(name)
    }

    pub fn enter_loop(&mut self, location: SourceLocation) {
        self.scopes[self.current]
            .loops
            .push(LoopContext { location });
    }

    pub fn exit_loop(&mut self) {
        if let Some(context) = self.scopes[self.current].loops.pop() {
            trace!(line = context.location.line, "closed loop");
        }
    }

    pub fn in_loop(&self) -> bool {
        !self.scopes[self.current].loops.is_empty()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (id, scope) in self.scopes.iter().enumerate() {
            match scope.parent {
                Some(parent) => writeln!(f, "scope {} ({}, parent {})", id, scope.kind, parent)?,
                None => writeln!(f, "scope {} ({})", id, scope.kind)?,
            }
            for (name, symbol) in scope.iter() {
                writeln!(f, "  {}: {}", name, symbol)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(ty: ValueType, line: usize) -> Symbol {
        Symbol::Variable {
            ty,
            role: VarRole::Local,
            location: SourceLocation::new(line, 1),
        }
    }

    #[test]
    fn test_resolve_walks_outward() {
        let mut table = SymbolTable::new();
        table
            .define(
                "f",
                Symbol::Function {
                    params: vec![],
                    location: SourceLocation::new(1, 1),
                },
            )
            .unwrap();

        table.push_scope(ScopeKind::Function("f".to_string()));
        table.define("x", var(ValueType::INT, 2)).unwrap();

        assert!(matches!(table.resolve("f"), Some(Symbol::Function { .. })));
        assert!(table.resolve("x").is_some());
        assert!(table.resolve_local("f").is_none());
        assert!(table.resolve("y").is_none());

        table.pop_scope();
        assert!(table.resolve("x").is_none());
    }

    #[test]
    fn test_duplicate_in_same_scope() {
        let mut table = SymbolTable::new();
        table.define("x", var(ValueType::INT, 1)).unwrap();

        let err = table.define("x", var(ValueType::FLOAT, 5)).unwrap_err();
        assert_eq!(err.previous.line, 1);

        // the first binding is kept
        assert!(matches!(
            table.resolve("x"),
            Some(Symbol::Variable { ty, .. }) if *ty == ValueType::INT
        ));
    }

    #[test]
    fn test_shadowing_outer_scope_is_allowed() {
        let mut table = SymbolTable::new();
        table.define("x", var(ValueType::INT, 1)).unwrap();

        table.push_scope(ScopeKind::Function("main".to_string()));
        assert!(table.define("x", var(ValueType::FLOAT, 3)).is_ok());
        assert!(matches!(
            table.resolve("x"),
            Some(Symbol::Variable { ty, .. }) if *ty == ValueType::FLOAT
        ));
    }

    #[test]
    fn test_loop_contexts_nest() {
        let mut table = SymbolTable::new();
        table.push_scope(ScopeKind::Function("main".to_string()));
        assert!(!table.in_loop());

        table.enter_loop(SourceLocation::new(1, 1));
        table.enter_loop(SourceLocation::new(2, 1));
        table.exit_loop();
        assert!(table.in_loop());

        table.exit_loop();
        assert!(!table.in_loop());
    }

    #[test]
    fn test_display_lists_entries_in_definition_order() {
        let mut table = SymbolTable::new();
        table.push_scope(ScopeKind::Function("main".to_string()));
        table.define("b", var(ValueType::INT, 2)).unwrap();
        table
            .define("a", var(ValueType::array(crate::parser::ast::BaseType::Float), 3))
            .unwrap();

        let dump = table.to_string();
        assert_eq!(
            dump,
            "scope 0 (global)\n\
             scope 1 (function main, parent 0)\n  \
             b: local int, line 2\n  \
             a: local float[], line 3\n"
        );
    }
}
