//! The compiled schema tree, per `spec.md` §3 (Schema tree) and §4.5.
//!
//! Per `spec.md` §9 Design Notes, the many schema-node kinds are a
//! tagged variant with a shared header (name, namespace, config flag,
//! status, when/must lists, children) and a kind-specific payload;
//! common operations dispatch on the tag rather than through a trait
//! hierarchy, matching the teacher's `hir` tagged-node style.

pub mod compiler;

use crate::ast::argument::{OrderedBy, Status};
use crate::base::IStr;
use crate::types::Type;
use crate::xpath::{ProgramArena, ProgramId};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SchemaNodeId(pub u32);

#[derive(Debug, Clone)]
pub struct CompiledConstraint {
    pub program: ProgramId,
    pub error_message: Option<IStr>,
    pub error_app_tag: Option<IStr>,
}

#[derive(Debug, Clone)]
pub struct Header {
    pub name: IStr,
    pub namespace: IStr,
    pub module: IStr,
    pub submodule: Option<IStr>,
    pub description: Option<IStr>,
    pub reference: Option<IStr>,
    pub config: bool,
    pub status: Option<Status>,
    pub when: Vec<CompiledConstraint>,
    pub musts: Vec<CompiledConstraint>,
    /// Set when this node was spliced in beneath an `augment` target;
    /// `when` evaluation context for such nodes is the target's
    /// *parent*, not the node itself (`spec.md` §4.5 step 4).
    pub from_augment: bool,
    pub not_supported: bool,
}

#[derive(Debug, Clone)]
pub enum Kind {
    ModuleRoot,
    Container { presence: bool },
    List { keys: Vec<IStr>, unique: Vec<Vec<Vec<IStr>>>, min: u64, max: Option<u64>, ordered_by: OrderedBy },
    Leaf { ty: Type, default: Option<IStr> },
    LeafList { ty: Type, min: u64, max: Option<u64>, ordered_by: OrderedBy },
    Choice { mandatory: bool, default_case: Option<IStr> },
    Case,
    Rpc { input: Option<SchemaNodeId>, output: Option<SchemaNodeId> },
    Notification,
    OpdCommand,
    OpdArgument { ty: Type },
    OpdOption { ty: Type },
    OpdOptionValue { ty: Type },
}

#[derive(Debug, Clone)]
pub struct SchemaNode {
    pub header: Header,
    pub kind: Kind,
    pub parent: Option<SchemaNodeId>,
    pub children: Vec<SchemaNodeId>,
    pub children_by_name: FxHashMap<IStr, SchemaNodeId>,
}

impl SchemaNode {
    pub fn is_data_node(&self) -> bool {
        matches!(
            self.kind,
            Kind::Container { .. } | Kind::List { .. } | Kind::Leaf { .. } | Kind::LeafList { .. } | Kind::Choice { .. }
        )
    }
}

/// The compiled output of `spec.md` §4.5: a flat module map, an RPC
/// map and notification map keyed by namespace + local name, and a
/// unified tree root whose children union every module's top-level
/// schema nodes.
pub struct ModelSet {
    pub nodes: Vec<SchemaNode>,
    pub root: SchemaNodeId,
    pub modules: FxHashMap<IStr, IStr>, // name -> namespace
    pub rpcs: FxHashMap<(IStr, IStr), SchemaNodeId>,
    pub notifications: FxHashMap<(IStr, IStr), SchemaNodeId>,
    pub programs: ProgramArena,
    /// `identity` name -> its directly declared `base` names, per
    /// `spec.md` §4.6: an identityref value is valid iff it names an
    /// identity whose transitive base set contains every declared base.
    pub identities: FxHashMap<IStr, Vec<IStr>>,
}

impl ModelSet {
    pub fn get(&self, id: SchemaNodeId) -> &SchemaNode {
        &self.nodes[id.0 as usize]
    }

    pub fn child(&self, id: SchemaNodeId, name: &str) -> Option<SchemaNodeId> {
        self.get(id).children_by_name.get(name).copied()
    }

    /// Whether `name` is, or transitively derives from, `base` (cycle-safe).
    pub fn identity_derives_from(&self, name: &str, base: &str) -> bool {
        let mut seen: std::collections::HashSet<IStr> = std::collections::HashSet::new();
        let mut stack: Vec<String> = vec![name.to_string()];
        while let Some(cur) = stack.pop() {
            if cur == base {
                return true;
            }
            if let Some(bases) = self.identities.get(cur.as_str()) {
                for b in bases {
                    if seen.insert(b.clone()) {
                        stack.push(b.to_string());
                    }
                }
            }
        }
        false
    }
}
