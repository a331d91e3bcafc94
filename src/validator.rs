//! Data-tree validation: a lockstep walk of a compiled [`ModelSet`]
//! against a live tree reached through the [`crate::xpath::adapter`]
//! bridge, per `spec.md` §4.11.
//!
//! Every violation is collected into a `Vec<ValidationError>` and
//! returned together — validation errors never `?`-propagate, unlike
//! every other layer in this crate (`spec.md` §7).

use crate::base::IStr;
use crate::errors::ErrorTag;
use crate::options::{ValidateOptions, ValidationMode};
use crate::schema::{Kind, ModelSet, SchemaNode, SchemaNodeId};
use crate::types::ValueError;
use crate::xpath::adapter::{AdapterNode, ChildFilter, SortSpec};
use crate::xpath::{Datum, TreeFilter, Vm};
use std::rc::Rc;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub tag: ErrorTag,
    pub path: String,
    pub message: String,
}

impl ValidationError {
    fn new(tag: ErrorTag, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { tag, path: path.into(), message: message.into() }
    }
}

struct Validator<'a> {
    model: &'a ModelSet,
    options: ValidateOptions,
    errors: Vec<ValidationError>,
}

fn node_path(node: &Rc<dyn AdapterNode>) -> String {
    node.path().iter().map(|s| s.as_ref()).collect::<Vec<_>>().join("/")
}

fn child_filter(mode: ValidationMode) -> ChildFilter {
    match mode {
        ValidationMode::Config => ChildFilter::ConfigOnly,
        ValidationMode::State => ChildFilter::All,
    }
}

fn tree_filter(mode: ValidationMode) -> TreeFilter {
    match mode {
        ValidationMode::Config => TreeFilter::ConfigOnly,
        ValidationMode::State => TreeFilter::FullTree,
    }
}

/// Validate `root` against `model`, returning every violation found.
/// `root` is the data tree's document root, whose children are matched
/// by name against the model's top-level schema nodes.
pub fn validate(model: &ModelSet, root: Rc<dyn AdapterNode>, options: ValidateOptions) -> Vec<ValidationError> {
    let mut v = Validator { model, options, errors: Vec::new() };
    let top_children = model.get(model.root).children.clone();
    let data_children = root.children(ChildFilter::All, SortSpec::Insertion);
    for child_id in top_children {
        let child = v.model.get(child_id);
        for data_child in &data_children {
            if *data_child.name() == *child.header.name {
                v.walk(child_id, data_child.clone(), root.clone());
            }
        }
    }
    v.errors
}

impl<'a> Validator<'a> {
    fn eval_when(&mut self, node: &SchemaNode, current: Rc<dyn AdapterNode>, data_node: Rc<dyn AdapterNode>) -> bool {
        if node.header.when.is_empty() {
            return true;
        }
        // `when` on an augment-spliced node evaluates against the
        // augment target's parent context, not the node itself
        // (`spec.md` §4.5 step 4 / §4.11).
        let ctx_node = if node.header.from_augment { data_node.parent().unwrap_or_else(|| data_node.clone()) } else { data_node.clone() };
        for w in &node.header.when {
            let vm = Vm::new(&self.model.programs, current.clone(), tree_filter(self.options.mode), false);
            let truthy = match vm.run(w.program, ctx_node.clone()) {
                Ok(d) => d.as_bool(),
                Err(e) => {
                    self.errors.push(ValidationError::new(
                        ErrorTag::OperationFailed,
                        node_path(&ctx_node),
                        format!("when evaluation failed: {e}"),
                    ));
                    false
                }
            };
            if !truthy {
                return false;
            }
        }
        true
    }

    fn eval_musts(&mut self, node: &SchemaNode, current: Rc<dyn AdapterNode>) {
        for m in &node.header.musts {
            let start = self.options.must_threshold_ms.map(|_| Instant::now());
            let vm = Vm::new(&self.model.programs, current.clone(), tree_filter(self.options.mode), false);
            let result = vm.run(m.program, current.clone());
            if let (Some(t0), Some(threshold)) = (start, self.options.must_threshold_ms) {
                let elapsed_ms = t0.elapsed().as_millis() as u64;
                if elapsed_ms > threshold {
                    log::warn!("must evaluation on {} took {}ms (threshold {}ms)", node_path(&current), elapsed_ms, threshold);
                }
            }
            let satisfied = matches!(result, Ok(d) if d.as_bool());
            if !satisfied {
                let message = m.error_message.as_deref().map(|s| s.to_string()).unwrap_or_else(|| "must condition failed".to_string());
                self.errors.push(ValidationError::new(ErrorTag::MustViolation, node_path(&current), message));
            }
        }
    }

    fn check_mandatory_children(&mut self, node: &SchemaNode, data_node: &Rc<dyn AdapterNode>) {
        let present_names: Vec<IStr> = data_node.children(ChildFilter::All, SortSpec::Insertion).iter().map(|c| c.name()).collect();
        for &child_id in &node.children {
            let child = self.model.get(child_id);
            if child.header.not_supported {
                continue;
            }
            let mandatory = match &child.kind {
                Kind::Leaf { default: None, .. } => child.header.config,
                Kind::Choice { mandatory, .. } => *mandatory && child.header.config,
                Kind::List { min, .. } => *min > 0 && child.header.config,
                Kind::LeafList { min, .. } => *min > 0 && child.header.config,
                _ => false,
            };
            if mandatory && !present_names.iter().any(|n| **n == *child.header.name) {
                self.errors.push(ValidationError::new(
                    ErrorTag::MissingElement,
                    node_path(data_node),
                    format!("mandatory node {} is missing", child.header.name),
                ));
            }
        }
    }

    fn walk_children(&mut self, node: &SchemaNode, data_node: &Rc<dyn AdapterNode>, current_root: Rc<dyn AdapterNode>, filter: ChildFilter) {
        for &child_id in &node.children {
            let child = self.model.get(child_id);
            for data_child in data_node.children(filter, SortSpec::Insertion) {
                if *data_child.name() == *child.header.name {
                    self.walk(child_id, data_child, current_root.clone());
                }
            }
        }
    }

    fn walk(&mut self, schema_id: SchemaNodeId, data_node: Rc<dyn AdapterNode>, current_root: Rc<dyn AdapterNode>) {
        let node = self.model.get(schema_id).clone();
        if node.header.not_supported {
            return;
        }
        if self.options.mode == ValidationMode::Config && !node.header.config {
            return;
        }
        // Ephemeral (unconfigured, non-presence) containers still get
        // `must`/`when` evaluated against them, per `spec.md` §8 S7.
        if !self.eval_when(&node, current_root.clone(), data_node.clone()) {
            return;
        }

        match &node.kind {
            Kind::Leaf { ty, .. } => {
                self.eval_musts(&node, data_node.clone());
                match data_node.value() {
                    Some(value) => self.check_value(ty, &value, &data_node),
                    None => self.errors.push(ValidationError::new(ErrorTag::DataMissing, node_path(&data_node), "leaf value missing")),
                }
            }
            Kind::LeafList { ty, min, max, .. } => {
                self.eval_musts(&node, data_node.clone());
                let entries = data_node.children(ChildFilter::All, SortSpec::Insertion);
                if (entries.len() as u64) < *min {
                    self.errors.push(ValidationError::new(ErrorTag::TooFewElements, node_path(&data_node), "too few leaf-list entries"));
                }
                if max.is_some_and(|max| entries.len() as u64 > max) {
                    self.errors.push(ValidationError::new(ErrorTag::TooManyElements, node_path(&data_node), "too many leaf-list entries"));
                }
                for entry in &entries {
                    if let Some(value) = entry.value() {
                        self.check_value(ty, &value, entry);
                    }
                }
            }
            Kind::Container { .. } => {
                self.eval_musts(&node, data_node.clone());
                self.check_mandatory_children(&node, &data_node);
                self.walk_children(&node, &data_node, current_root, child_filter(self.options.mode));
            }
            Kind::List { keys: _, unique, min, max, .. } => {
                let entries = data_node.children(ChildFilter::All, SortSpec::Insertion);
                if (entries.len() as u64) < *min {
                    self.errors.push(ValidationError::new(ErrorTag::TooFewElements, node_path(&data_node), "too few list entries"));
                }
                if max.is_some_and(|max| entries.len() as u64 > max) {
                    self.errors.push(ValidationError::new(ErrorTag::TooManyElements, node_path(&data_node), "too many list entries"));
                }
                self.check_unique(&entries, unique);
                for entry in entries {
                    self.eval_musts(&node, entry.clone());
                    self.check_mandatory_children(&node, &entry);
                    self.walk_children(&node, &entry, current_root.clone(), child_filter(self.options.mode));
                }
            }
            Kind::Choice { .. } => {
                // The active case is resolved by whichever case's
                // children are actually present in the data tree;
                // default-case materialization for an entirely absent
                // choice is not performed here.
                for &case_id in &node.children {
                    let case = self.model.get(case_id);
                    let data_children = data_node.children(ChildFilter::All, SortSpec::Insertion);
                    let present = case.children.iter().any(|c| data_children.iter().any(|d| *d.name() == *self.model.get(*c).header.name));
                    if present {
                        self.walk(case_id, data_node.clone(), current_root.clone());
                    }
                }
            }
            Kind::Case => {
                self.walk_children(&node, &data_node, current_root, ChildFilter::All);
            }
            Kind::Rpc { .. }
            | Kind::Notification
            | Kind::ModuleRoot
            | Kind::OpdCommand
            | Kind::OpdArgument { .. }
            | Kind::OpdOption { .. }
            | Kind::OpdOptionValue { .. } => {
                self.eval_musts(&node, data_node.clone());
                self.walk_children(&node, &data_node, current_root, ChildFilter::All);
            }
        }
    }

    fn check_value(&mut self, ty: &crate::types::Type, value: &IStr, data_node: &Rc<dyn AdapterNode>) {
        if let Err(e) = ty.validate(value) {
            let tag = match e {
                ValueError::RangeViolation { .. } => ErrorTag::RangeViolation,
                ValueError::LengthViolation { .. } => ErrorTag::LengthViolation,
                ValueError::PatternViolation => ErrorTag::PatternViolation,
                _ => ErrorTag::InvalidValue,
            };
            self.errors.push(ValidationError::new(tag, node_path(data_node), e.to_string()));
        }
        if let crate::types::Type::Identityref { bases } = ty {
            let value_str: &str = value;
            let local_name = value_str.rsplit(':').next().unwrap_or(value_str);
            let known = self.model.identities.contains_key(local_name);
            let derives_from_every_base = bases.iter().all(|b| {
                let base_str: &str = b;
                let local_base = base_str.rsplit(':').next().unwrap_or(base_str);
                self.model.identity_derives_from(local_name, local_base)
            });
            if !known || !derives_from_every_base {
                self.errors.push(ValidationError::new(
                    ErrorTag::InvalidValue,
                    node_path(data_node),
                    ValueError::IdentityViolation { value: value.to_string() }.to_string(),
                ));
            }
        }
        if let crate::types::Type::Leafref(path) = ty {
            if path.require_instance {
                let vm = Vm::new(&self.model.programs, data_node.clone(), tree_filter(self.options.mode), false);
                match vm.run(path.program, data_node.clone()) {
                    Ok(Datum::NodeSet(ns)) => {
                        let found = ns.iter().any(|n| n.string_value() == value.to_string());
                        if !found {
                            self.errors.push(ValidationError::new(
                                ErrorTag::DataMissing,
                                node_path(data_node),
                                format!("leafref target for value '{value}' not found"),
                            ));
                        }
                    }
                    _ => self.errors.push(ValidationError::new(
                        ErrorTag::DataMissing,
                        node_path(data_node),
                        "leafref path did not evaluate to a node-set",
                    )),
                }
            }
        }
    }

    /// `unique` groups: join each member path's string-value with
    /// `U+00B7` (middle dot) and compare tuples across entries, per
    /// `spec.md` §4.11 step 6.
    fn check_unique(&mut self, entries: &[Rc<dyn AdapterNode>], groups: &[Vec<Vec<IStr>>]) {
        for group in groups {
            let mut seen: Vec<(String, String)> = Vec::new();
            for entry in entries {
                let tuple = group.iter().map(|path| resolve_unique_path(entry, path)).collect::<Vec<_>>().join("\u{b7}");
                let entry_path = node_path(entry);
                if let Some((_, existing)) = seen.iter().find(|(t, _)| *t == tuple) {
                    self.errors.push(ValidationError::new(
                        ErrorTag::OperationFailed,
                        entry_path.clone(),
                        format!("unique constraint violated with entry at {existing}"),
                    ));
                }
                seen.push((tuple, entry_path));
            }
        }
    }
}

fn resolve_unique_path(entry: &Rc<dyn AdapterNode>, path: &[IStr]) -> String {
    let mut cur = entry.clone();
    for seg in path {
        let next = cur.children(ChildFilter::All, SortSpec::Insertion).into_iter().find(|c| *c.name() == **seg);
        match next {
            Some(n) => cur = n,
            None => return String::new(),
        }
    }
    cur.string_value()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Interner;
    use crate::schema::{Header, Kind, ModelSet, SchemaNode};
    use crate::xpath::adapter::SimpleNode;
    use crate::xpath::ProgramArena;
    use rustc_hash::FxHashMap;
    use std::cell::RefCell;

    fn leaf(name: &str, value: &str, path: Vec<&str>) -> Rc<SimpleNode> {
        Rc::new(SimpleNode {
            name: Rc::from(name),
            value: Some(Rc::from(value)),
            children: Vec::new(),
            parent: RefCell::new(None),
            path: path.into_iter().map(Rc::from).collect(),
        })
    }

    fn container(name: &str, children: Vec<Rc<SimpleNode>>, path: Vec<&str>) -> Rc<SimpleNode> {
        let node = Rc::new(SimpleNode {
            name: Rc::from(name),
            value: None,
            children: children.clone(),
            parent: RefCell::new(None),
            path: path.into_iter().map(Rc::from).collect(),
        });
        for c in &children {
            *c.parent.borrow_mut() = Some(node.clone());
        }
        node
    }

    fn blank_header(interner: &mut Interner, name: &str) -> Header {
        Header {
            name: interner.intern(name),
            namespace: interner.intern("urn:test"),
            module: interner.intern("test"),
            submodule: None,
            description: None,
            reference: None,
            config: true,
            status: None,
            when: Vec::new(),
            musts: Vec::new(),
            from_augment: false,
            not_supported: false,
        }
    }

    fn model_with_one_leaf(interner: &mut Interner, ty: crate::types::Type, default: Option<IStr>) -> ModelSet {
        let leaf_node = SchemaNode {
            header: blank_header(interner, "host"),
            kind: Kind::Leaf { ty, default },
            parent: None,
            children: Vec::new(),
            children_by_name: FxHashMap::default(),
        };
        let root_node = SchemaNode {
            header: blank_header(interner, ""),
            kind: Kind::ModuleRoot,
            parent: None,
            children: vec![SchemaNodeId(1)],
            children_by_name: FxHashMap::default(),
        };
        ModelSet {
            nodes: vec![root_node, leaf_node],
            root: SchemaNodeId(0),
            modules: FxHashMap::default(),
            rpcs: FxHashMap::default(),
            notifications: FxHashMap::default(),
            programs: ProgramArena::new(),
            identities: FxHashMap::default(),
        }
    }

    #[test]
    fn missing_mandatory_leaf_is_reported() {
        let mut interner = Interner::new();
        let model = model_with_one_leaf(&mut interner, crate::types::Type::StringT { length: Vec::new(), patterns: Vec::new() }, None);
        let data_root = container("root", vec![], vec!["root"]);
        let errors = validate(&model, data_root, ValidateOptions::default());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].tag, ErrorTag::MissingElement);
    }

    #[test]
    fn present_leaf_with_valid_value_reports_nothing() {
        let mut interner = Interner::new();
        let model = model_with_one_leaf(&mut interner, crate::types::Type::StringT { length: Vec::new(), patterns: Vec::new() }, None);
        let host_leaf = leaf("host", "router1", vec!["root", "host"]);
        let data_root = container("root", vec![host_leaf], vec!["root"]);
        let errors = validate(&model, data_root, ValidateOptions::default());
        assert!(errors.is_empty());
    }

    #[test]
    fn out_of_range_value_reports_range_violation() {
        let mut interner = Interner::new();
        let model = model_with_one_leaf(&mut interner, crate::types::Type::Integer { bit_width: 8, range: Vec::new() }, None);
        let host_leaf = leaf("host", "999", vec!["root", "host"]);
        let data_root = container("root", vec![host_leaf], vec!["root"]);
        let errors = validate(&model, data_root, ValidateOptions::default());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].tag, ErrorTag::RangeViolation);
    }

    #[test]
    fn leaf_with_default_is_not_mandatory() {
        let mut interner = Interner::new();
        let default = interner.intern("router1");
        let model = model_with_one_leaf(&mut interner, crate::types::Type::StringT { length: Vec::new(), patterns: Vec::new() }, Some(default));
        let data_root = container("root", vec![], vec!["root"]);
        let errors = validate(&model, data_root, ValidateOptions::default());
        assert!(errors.is_empty());
    }
}
