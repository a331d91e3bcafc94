//! The parsed AST: an arena of statement nodes plus the scope chains
//! attached to them.
//!
//! `spec.md` §9 Design Notes calls for an arena keyed by a compact
//! `NodeId` in place of the source's parent-pointer/mutable-child-list
//! tree, specifically so that cloning a subtree (needed to expand a
//! `grouping` at each `uses` site) is cheap and free of cyclic shared
//! ownership. Every [`Node`] holds an `Option<NodeId>` parent and a
//! `Vec<NodeId>` child list in source order.

pub mod argument;
pub mod cardinality;
pub mod kind;
pub mod resolve;
pub mod scope;

pub use argument::Argument;
pub use kind::StatementKind;
pub use scope::ScopeId;

use crate::base::{IStr, Span};
use bitflags::bitflags;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleId(pub u32);

bitflags! {
    /// Flags carried by an AST node, per `spec.md` §3.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// Added beneath an `augment` target; affects `when` evaluation
        /// context (uses the target's parent, not the node itself).
        const FROM_AUGMENT = 0b01;
        /// Suppressed by a `deviate not-supported` statement.
        const NOT_SUPPORTED = 0b10;
    }
}

/// One AST node.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: StatementKind,
    pub argument: Argument,
    pub span: Span,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// The module this node was lexically defined in.
    pub defining_module: ModuleId,
    /// The module this node is used in — differs from `defining_module`
    /// when the node arrived via `uses` expansion of a grouping defined
    /// in a different module; namespace resolution consults this first.
    pub use_module: ModuleId,
    pub flags: NodeFlags,
    pub type_scope: ScopeId,
    pub grouping_scope: ScopeId,
}

impl Node {
    pub fn keyword_text(&self) -> Option<&IStr> {
        match &self.argument {
            Argument::Text(s) | Argument::Identifier(s) | Argument::Uri(s) => Some(s),
            _ => None,
        }
    }
}

/// A parse tree: the root statement plus its owning arena, retained
/// source text (for error-context snippets), and the interner used
/// while parsing it.
pub struct Tree {
    pub nodes: Vec<Node>,
    pub root: NodeId,
    pub source: String,
    pub file: crate::base::FileId,
}

impl Tree {
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        &self.get(id).children
    }

    pub fn child_kinds(&self, id: NodeId) -> Vec<StatementKind> {
        self.children_of(id).iter().map(|c| self.get(*c).kind).collect()
    }

    /// Deep-clone the subtree rooted at `id` into this same arena,
    /// returning the new root id. Used when expanding `uses
    /// <grouping>`: the clone gets a fresh `use_module` at the
    /// splice site while `defining_module` is preserved on every node,
    /// per the "two trees" design note (`spec.md` §9).
    pub fn clone_subtree(&mut self, id: NodeId, new_use_module: ModuleId) -> NodeId {
        let node = self.get(id).clone();
        let new_children: Vec<NodeId> =
            node.children.iter().map(|c| self.clone_subtree(*c, new_use_module)).collect();
        let new_id = NodeId(self.nodes.len() as u32);
        let mut cloned = node;
        cloned.children = new_children.clone();
        cloned.use_module = new_use_module;
        self.nodes.push(cloned);
        for child in &new_children {
            self.get_mut(*child).parent = Some(new_id);
        }
        new_id
    }
}

#[derive(Default)]
pub struct TreeBuilder {
    nodes: Vec<Node>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn nodes_slice(&self) -> &[Node] {
        &self.nodes
    }

    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0 as usize].parent = Some(parent);
        self.nodes[parent.0 as usize].children.push(child);
    }

    pub fn finish(self, root: NodeId, source: String, file: crate::base::FileId) -> Tree {
        Tree { nodes: self.nodes, root, source, file }
    }
}
