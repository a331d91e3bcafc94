//! Top-down symbol-build pass: walks a freshly parsed [`Tree`] and
//! populates each scope-owning node's type and grouping environments.
//!
//! Per `spec.md` §4.2, this runs after the whole tree is parsed (not
//! interleaved with parsing) so that a `typedef` or `grouping` is
//! visible to siblings declared before it in source order, not just
//! ones declared after.

use super::scope::ScopeArena;
use super::{ModuleId, Node, NodeId, StatementKind, Tree};
use crate::errors::ParseError;

/// Statement kinds that introduce a new lexical scope for typedefs and
/// groupings.
fn opens_scope(kind: StatementKind) -> bool {
    matches!(
        kind,
        StatementKind::Module
            | StatementKind::Submodule
            | StatementKind::Container
            | StatementKind::List
            | StatementKind::Grouping
            | StatementKind::Rpc
            | StatementKind::Input
            | StatementKind::Output
            | StatementKind::Notification
            | StatementKind::Case
            | StatementKind::Choice
    )
}

pub struct Resolved {
    pub types: ScopeArena<NodeId>,
    pub groupings: ScopeArena<NodeId>,
}

/// Assign scopes bottom-up in id order is not correct since scopes
/// nest top-down from the root; this walks the tree recursively from
/// `tree.root`, threading the current (type-scope, grouping-scope)
/// pair down to children, opening fresh scopes at the kinds named in
/// `opens_scope`, and writes the resolved ids back onto each node.
pub fn resolve(tree: &mut Tree) -> Result<Resolved, ParseError> {
    let mut types: ScopeArena<NodeId> = ScopeArena::new();
    let mut groupings: ScopeArena<NodeId> = ScopeArena::new();
    let root_type_scope = types.push(None);
    let root_grouping_scope = groupings.push(None);

    visit(
        tree,
        tree.root,
        &mut types,
        &mut groupings,
        root_type_scope,
        root_grouping_scope,
        ModuleId(0),
    )?;

    Ok(Resolved { types, groupings })
}

fn visit(
    tree: &mut Tree,
    id: NodeId,
    types: &mut ScopeArena<NodeId>,
    groupings: &mut ScopeArena<NodeId>,
    type_scope: crate::ast::ScopeId,
    grouping_scope: crate::ast::ScopeId,
    module: ModuleId,
) -> Result<(), ParseError> {
    let (kind, span, children, defining_module) = {
        let node = tree.get_mut(id);
        node.type_scope = type_scope;
        node.grouping_scope = grouping_scope;
        node.defining_module = module;
        (node.kind, node.span, node.children.clone(), module)
    };

    let (child_type_scope, child_grouping_scope) = if opens_scope(kind) {
        (types.push(Some(type_scope)), groupings.push(Some(grouping_scope)))
    } else {
        (type_scope, grouping_scope)
    };

    // Register this scope's direct typedef/grouping children before
    // recursing, so every descendant sees siblings regardless of
    // declaration order.
    for &child in &children {
        let child_node: &Node = tree.get(child);
        match child_node.kind {
            StatementKind::Typedef => {
                if let Some(name) = child_node.keyword_text().cloned() {
                    types.insert(child_type_scope, name, child, child_node.span)?;
                }
            }
            StatementKind::Grouping => {
                if let Some(name) = child_node.keyword_text().cloned() {
                    groupings.insert(child_grouping_scope, name, child, child_node.span)?;
                }
            }
            _ => {}
        }
    }

    for &child in &children {
        visit(
            tree,
            child,
            types,
            groupings,
            child_type_scope,
            child_grouping_scope,
            defining_module,
        )?;
    }
    let _ = span;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::cardinality::CardinalityTable;
    use crate::base::{FileId, Interner};
    use crate::parser::Parser;

    fn parse(src: &str) -> Tree {
        let mut interner = Interner::new();
        let table = CardinalityTable::build(&[]);
        let parser = Parser::new(src, FileId(0), &mut interner, &table);
        parser.parse_module(src.to_string()).expect("parses")
    }

    #[test]
    fn sibling_typedefs_do_not_shadow() {
        let mut tree = parse(
            r#"module m { namespace "urn:m"; prefix m;
                typedef a { type string; }
                typedef b { type string; }
            }"#,
        );
        let resolved = resolve(&mut tree).expect("resolves");
        let module_scope = tree.get(tree.root).type_scope;
        assert!(resolved.types.lookup_local(module_scope, "a").is_some());
        assert!(resolved.types.lookup_local(module_scope, "b").is_some());
    }

    #[test]
    fn duplicate_typedef_name_is_shadowing_error() {
        let mut tree = parse(
            r#"module m { namespace "urn:m"; prefix m;
                typedef a { type string; }
                typedef a { type int32; }
            }"#,
        );
        let err = resolve(&mut tree).unwrap_err();
        assert!(matches!(err, ParseError::Shadowing { .. }));
    }

    #[test]
    fn nested_container_sees_module_typedef() {
        let mut tree = parse(
            r#"module m { namespace "urn:m"; prefix m;
                typedef a { type string; }
                container c { leaf x { type a; } }
            }"#,
        );
        let resolved = resolve(&mut tree).expect("resolves");
        let module_scope = tree.get(tree.root).type_scope;
        let container = tree.get(tree.root).children[3];
        let leaf_scope = tree.get(tree.get(container).children[0]).type_scope;
        assert_eq!(resolved.types.lookup(leaf_scope, "a"), resolved.types.lookup_local(module_scope, "a"));
    }
}
