//! Tree adapter: bridges a data tree or schema tree into the single
//! node model the XPath VM consumes, per `spec.md` §4.10.
//!
//! Two transforms the teacher's tree types never needed are folded in
//! here: `list` nodes never appear in the XPath view (their *entries*
//! appear directly as children of the list's parent), and `leaf`/
//! `leaf-list` nodes are replaced by an interposed `leaf-value`
//! terminal — implementations build this view once via
//! [`AdapterNode::children`] rather than exposing the raw tree shape.

use crate::base::IStr;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildFilter {
    All,
    ConfigOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortSpec {
    /// Document order as declared (list/leaf-list `ordered-by user`
    /// entries and leaf-lists keep insertion order).
    Insertion,
    /// Natural (alphanumeric) name ordering, with leaf-list values
    /// sorted by value.
    Natural,
}

/// Stable identity for node-set de-duplication: `(path, index)`,
/// since adapter nodes are not guaranteed to be arena-allocated
/// (`spec.md` §9 Design Notes).
pub type NodeIdentity = (Rc<str>, u32);

pub trait AdapterNode {
    fn name(&self) -> IStr;
    /// The terminal value, for `leaf-value` nodes; `None` otherwise.
    fn value(&self) -> Option<IStr>;
    fn parent(&self) -> Option<Rc<dyn AdapterNode>>;
    fn children(&self, filter: ChildFilter, sort: SortSpec) -> Vec<Rc<dyn AdapterNode>>;
    fn path(&self) -> Vec<IStr>;
    fn identity(&self) -> NodeIdentity;
    fn list_keys(&self) -> Vec<(IStr, IStr)>;
    fn list_key_matches(&self, name: &str, value: &str) -> bool;
    fn is_leaf(&self) -> bool;
    fn is_leaf_list(&self) -> bool;
    fn is_non_presence_container(&self) -> bool;
    fn is_ephemeral(&self) -> bool;

    fn string_value(&self) -> String {
        if let Some(v) = self.value() {
            v.to_string()
        } else {
            self.children(ChildFilter::All, SortSpec::Insertion)
                .first()
                .map(|c| c.string_value())
                .unwrap_or_default()
        }
    }

    fn numeric_value(&self) -> f64 {
        super::functions::parse_xpath_number(&self.string_value())
    }

    fn local_name(&self) -> String {
        self.name().to_string()
    }
}

/// A minimal in-memory tree used by tests and by callers without their
/// own tree type to adapt.
pub struct SimpleNode {
    pub name: IStr,
    pub value: Option<IStr>,
    pub children: Vec<Rc<SimpleNode>>,
    pub parent: std::cell::RefCell<Option<Rc<SimpleNode>>>,
    pub path: Vec<IStr>,
}

impl AdapterNode for SimpleNode {
    fn name(&self) -> IStr {
        self.name.clone()
    }
    fn value(&self) -> Option<IStr> {
        self.value.clone()
    }
    fn parent(&self) -> Option<Rc<dyn AdapterNode>> {
        self.parent.borrow().clone().map(|p| p as Rc<dyn AdapterNode>)
    }
    fn children(&self, _filter: ChildFilter, _sort: SortSpec) -> Vec<Rc<dyn AdapterNode>> {
        self.children.iter().map(|c| c.clone() as Rc<dyn AdapterNode>).collect()
    }
    fn path(&self) -> Vec<IStr> {
        self.path.clone()
    }
    fn identity(&self) -> NodeIdentity {
        let path: Rc<str> = self.path.iter().map(|s| s.as_ref()).collect::<Vec<_>>().join("/").into();
        let index = self
            .parent
            .borrow()
            .as_ref()
            .and_then(|p| p.children.iter().position(|c| std::ptr::eq(c.as_ref(), self)))
            .unwrap_or(0) as u32;
        (path, index)
    }
    fn list_keys(&self) -> Vec<(IStr, IStr)> {
        Vec::new()
    }
    fn list_key_matches(&self, _name: &str, _value: &str) -> bool {
        false
    }
    fn is_leaf(&self) -> bool {
        self.value.is_some() && self.children.is_empty()
    }
    fn is_leaf_list(&self) -> bool {
        false
    }
    fn is_non_presence_container(&self) -> bool {
        self.value.is_none() && !self.children.is_empty()
    }
    fn is_ephemeral(&self) -> bool {
        false
    }
}
