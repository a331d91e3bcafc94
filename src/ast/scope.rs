//! Lexical scopes for typedefs and groupings.
//!
//! Grounded in the teacher's `semantic::symbol_table::scope::Scope`
//! (parent index + name→id map), generalized to two parallel
//! namespaces per `spec.md` §3: a type environment and a grouping
//! environment, each independently scoped and each enforcing
//! "no shadowing" on insertion.

use crate::base::IStr;
use crate::errors::ParseError;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

/// One namespace's scope chain: a name→binding map plus a parent link.
#[derive(Debug)]
struct Namespace<T> {
    parent: Option<ScopeId>,
    bindings: FxHashMap<IStr, T>,
}

impl<T> Namespace<T> {
    fn new(parent: Option<ScopeId>) -> Self {
        Self { parent, bindings: FxHashMap::default() }
    }
}

/// An arena of scopes for one namespace, supporting lexical lookup
/// through parent links and shadow-rejecting insertion.
#[derive(Debug)]
pub struct ScopeArena<T> {
    scopes: Vec<Namespace<T>>,
}

impl<T: Clone> ScopeArena<T> {
    pub fn new() -> Self {
        Self { scopes: Vec::new() }
    }

    pub fn push(&mut self, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Namespace::new(parent));
        id
    }

    /// Insert `name -> value` into `scope`. Rejects a name already
    /// bound in that exact scope (shadowing of an *enclosing* scope's
    /// binding is permitted to be looked up but never inserted over at
    /// the same level — "no shadowing" per `spec.md` §3 means a name
    /// may not be redeclared in the same scope it is already visible
    /// from, which for typedef/grouping symbols is enclosing scopes
    /// too).
    pub fn insert(
        &mut self,
        scope: ScopeId,
        name: IStr,
        value: T,
        span: crate::base::Span,
    ) -> Result<(), ParseError> {
        if self.lookup(scope, &name).is_some() {
            return Err(ParseError::Shadowing { span, name: name.to_string() });
        }
        self.scopes[scope.0 as usize].bindings.insert(name, value);
        Ok(())
    }

    /// Look up `name` starting at `scope`, walking outward through
    /// parent scopes until found or the chain is exhausted.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<T> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let ns = &self.scopes[id.0 as usize];
            if let Some(v) = ns.bindings.get(name) {
                return Some(v.clone());
            }
            current = ns.parent;
        }
        None
    }

    /// Look up `name`, returning it only if bound in `scope` itself
    /// (used by the "no shadowing" test property: a definition looked
    /// up from its own defining scope must be the local one).
    pub fn lookup_local(&self, scope: ScopeId, name: &str) -> Option<T> {
        self.scopes[scope.0 as usize].bindings.get(name).cloned()
    }
}

impl<T: Clone> Default for ScopeArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// The pair of namespaces every AST node owns per `spec.md` §3: typedef
/// symbols and grouping symbols, each independently scoped.
#[derive(Debug, Default)]
pub struct Scopes<TypeSym: Clone, GroupSym: Clone> {
    pub types: ScopeArena<TypeSym>,
    pub groupings: ScopeArena<GroupSym>,
}

impl<TypeSym: Clone, GroupSym: Clone> Scopes<TypeSym, GroupSym> {
    pub fn new() -> Self {
        Self { types: ScopeArena::new(), groupings: ScopeArena::new() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{FileId, Interner, Span};

    #[test]
    fn lookup_finds_binding_in_defining_scope() {
        let mut arena: ScopeArena<u32> = ScopeArena::new();
        let mut interner = Interner::new();
        let root = arena.push(None);
        let child = arena.push(Some(root));
        let name = interner.intern("foo");
        let span = Span::empty(FileId(0), 0);
        arena.insert(child, name.clone(), 7, span).unwrap();
        assert_eq!(arena.lookup(child, "foo"), Some(7));
        assert_eq!(arena.lookup_local(root, "foo"), None);
    }

    #[test]
    fn redeclaration_in_same_scope_is_rejected() {
        let mut arena: ScopeArena<u32> = ScopeArena::new();
        let mut interner = Interner::new();
        let root = arena.push(None);
        let name = interner.intern("dup");
        let span = Span::empty(FileId(0), 0);
        arena.insert(root, name.clone(), 1, span).unwrap();
        let err = arena.insert(root, name, 2, span).unwrap_err();
        assert!(matches!(err, ParseError::Shadowing { .. }));
    }

    #[test]
    fn child_scope_may_not_shadow_parent_binding() {
        let mut arena: ScopeArena<u32> = ScopeArena::new();
        let mut interner = Interner::new();
        let root = arena.push(None);
        let child = arena.push(Some(root));
        let name = interner.intern("dup");
        let span = Span::empty(FileId(0), 0);
        arena.insert(root, name.clone(), 1, span).unwrap();
        let err = arena.insert(child, name, 2, span).unwrap_err();
        assert!(matches!(err, ParseError::Shadowing { .. }));
    }

    #[test]
    fn lookup_resolves_through_parent_chain() {
        let mut arena: ScopeArena<u32> = ScopeArena::new();
        let mut interner = Interner::new();
        let root = arena.push(None);
        let child = arena.push(Some(root));
        let name = interner.intern("inherited");
        let span = Span::empty(FileId(0), 0);
        arena.insert(root, name.clone(), 42, span).unwrap();
        assert_eq!(arena.lookup(child, "inherited"), Some(42));
    }
}
