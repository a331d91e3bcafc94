//! The XPath stack machine, per `spec.md` §4.9.
//!
//! Operates over a tagged [`Datum`]. Node-set de-duplication keys on
//! each node's [`super::adapter::NodeIdentity`]; true document order
//! beyond insertion order is not reconstructed (the adapter is
//! responsible for handing back children in the order `spec.md`
//! describes via its `sort` parameter, so a single `Step` already
//! yields sorted results — only `Union`/predicate filtering need the
//! dedup step implemented here).

use super::adapter::{AdapterNode, ChildFilter, NodeIdentity, SortSpec};
use super::bytecode::{Axis, Instr, NameTest, NodeTypeTest, ProgramArena, ProgramId};
use super::functions::{self, as_bool, as_number, as_string};
use std::rc::Rc;

#[derive(Debug, Clone)]
pub enum Datum {
    Number(f64),
    Literal(crate::base::IStr),
    Bool(bool),
    NodeSet(Vec<Rc<dyn AdapterNode>>),
}

impl Datum {
    pub fn as_bool(&self) -> bool {
        as_bool(self)
    }
    pub fn as_number(&self) -> f64 {
        as_number(self)
    }
    pub fn as_string(&self) -> String {
        as_string(self)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum VmError {
    #[error("type error: {0}")]
    TypeError(String),
    #[error("unknown function: {0}")]
    UnknownFunction(String),
    #[error("stack underflow")]
    StackUnderflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeFilter {
    FullTree,
    ConfigOnly,
}

pub struct Vm<'a> {
    arena: &'a ProgramArena,
    current_node: Rc<dyn AdapterNode>,
    filter: TreeFilter,
    debug: bool,
}

fn dedup(nodes: Vec<Rc<dyn AdapterNode>>) -> Vec<Rc<dyn AdapterNode>> {
    let mut seen: Vec<NodeIdentity> = Vec::new();
    let mut out = Vec::new();
    for n in nodes {
        let id = n.identity();
        if !seen.contains(&id) {
            seen.push(id);
            out.push(n);
        }
    }
    out
}

fn name_matches(node: &Rc<dyn AdapterNode>, test: &Option<NameTest>) -> bool {
    match test {
        None => true,
        Some(NameTest::Wildcard) => true,
        Some(NameTest::Name { local, .. }) => &*node.name() == &**local || &**local == "*",
    }
}

fn type_matches(test: &Option<NodeTypeTest>) -> bool {
    matches!(test, None | Some(NodeTypeTest::Node))
}

fn child_filter(filter: TreeFilter) -> ChildFilter {
    match filter {
        TreeFilter::FullTree => ChildFilter::All,
        TreeFilter::ConfigOnly => ChildFilter::ConfigOnly,
    }
}

fn collect_descendant_or_self(node: &Rc<dyn AdapterNode>, filter: TreeFilter, out: &mut Vec<Rc<dyn AdapterNode>>) {
    out.push(node.clone());
    for child in node.children(child_filter(filter), SortSpec::Natural) {
        collect_descendant_or_self(&child, filter, out);
    }
}

impl<'a> Vm<'a> {
    pub fn new(arena: &'a ProgramArena, current_node: Rc<dyn AdapterNode>, filter: TreeFilter, debug: bool) -> Self {
        Self { arena, current_node, filter, debug }
    }

    pub fn run(&self, id: ProgramId, context: Rc<dyn AdapterNode>) -> Result<Datum, VmError> {
        let program = self.arena.get(id);
        let mut stack: Vec<Datum> = Vec::new();
        let mut i = 0usize;
        while i < program.instrs.len() {
            match &program.instrs[i] {
                Instr::NumPush(n) => stack.push(Datum::Number(*n)),
                Instr::LitPush(s) => stack.push(Datum::Literal(s.clone())),
                Instr::PathStart { absolute } => {
                    let start = if *absolute { root_of(&context) } else { context.clone() };
                    stack.push(Datum::NodeSet(vec![start]));
                }
                Instr::PathOperPush(_) => {}
                Instr::Step { axis, name_test, node_type } => {
                    let top = stack.pop().ok_or(VmError::StackUnderflow)?;
                    let Datum::NodeSet(candidates) = top else {
                        return Err(VmError::TypeError("step applied to non-node-set".into()));
                    };
                    let mut next = Vec::new();
                    for node in &candidates {
                        match axis {
                            Axis::Child => {
                                for c in node.children(child_filter(self.filter), SortSpec::Natural) {
                                    if name_matches(&c, name_test) && type_matches(node_type) {
                                        next.push(c);
                                    }
                                }
                            }
                            Axis::Parent => {
                                if let Some(p) = node.parent() {
                                    if name_matches(&p, name_test) && type_matches(node_type) {
                                        next.push(p);
                                    }
                                }
                            }
                            Axis::SelfAxis => {
                                if name_matches(node, name_test) && type_matches(node_type) {
                                    next.push(node.clone());
                                }
                            }
                            Axis::DescendantOrSelf => {
                                let mut all = Vec::new();
                                collect_descendant_or_self(node, self.filter, &mut all);
                                for c in all {
                                    if name_matches(&c, name_test) && type_matches(node_type) {
                                        next.push(c);
                                    }
                                }
                            }
                            Axis::Attribute => {}
                        }
                    }
                    stack.push(Datum::NodeSet(dedup(next)));
                }
                Instr::EvalLocPath | Instr::EvalLocPathExists => {}
                Instr::PredStart(_) | Instr::PredEnd => {}
                Instr::EvalSubMachine(pred_id) => {
                    let top = stack.pop().ok_or(VmError::StackUnderflow)?;
                    let Datum::NodeSet(candidates) = top else {
                        return Err(VmError::TypeError("predicate applied to non-node-set".into()));
                    };
                    let mut kept = Vec::new();
                    for (idx, node) in candidates.iter().enumerate() {
                        let sub_vm = Vm::new(self.arena, self.current_node.clone(), self.filter, self.debug);
                        let result = sub_vm.run(*pred_id, node.clone())?;
                        let matches = match result {
                            Datum::Number(n) => (idx as f64 + 1.0) == n,
                            other => as_bool(&other),
                        };
                        if matches {
                            kept.push(node.clone());
                        }
                    }
                    stack.push(Datum::NodeSet(kept));
                }
                Instr::Builtin { name, arity } => {
                    if *name == "current" {
                        stack.push(Datum::NodeSet(vec![self.current_node.clone()]));
                    } else if *name == "position" || *name == "last" {
                        // Without per-step position tracking in this simplified
                        // machine, `position()`/`last()` outside a predicate
                        // default to 1 — predicates provide their own index via
                        // `EvalSubMachine`'s numeric-match rule instead.
                        stack.push(Datum::Number(1.0));
                    } else {
                        let n = *arity as usize;
                        if stack.len() < n {
                            return Err(VmError::StackUnderflow);
                        }
                        let args: Vec<Datum> = stack.split_off(stack.len() - n);
                        stack.push(functions::call(name, args)?);
                    }
                }
                Instr::Add | Instr::Sub | Instr::Mul | Instr::Div | Instr::Mod => {
                    let b = stack.pop().ok_or(VmError::StackUnderflow)?;
                    let a = stack.pop().ok_or(VmError::StackUnderflow)?;
                    let (x, y) = (as_number(&a), as_number(&b));
                    let r = match &program.instrs[i] {
                        Instr::Add => x + y,
                        Instr::Sub => x - y,
                        Instr::Mul => x * y,
                        Instr::Div => x / y, // division by zero yields ±Infinity, not an error
                        Instr::Mod => {
                            if y == 0.0 {
                                f64::NAN // spec.md §9: NaN on mod-by-zero, not an error
                            } else {
                                x % y
                            }
                        }
                        _ => unreachable!(),
                    };
                    stack.push(Datum::Number(r));
                }
                Instr::Negate => {
                    let a = stack.pop().ok_or(VmError::StackUnderflow)?;
                    stack.push(Datum::Number(-as_number(&a)));
                }
                Instr::Eq | Instr::Ne | Instr::Lt | Instr::Le | Instr::Gt | Instr::Ge => {
                    let b = stack.pop().ok_or(VmError::StackUnderflow)?;
                    let a = stack.pop().ok_or(VmError::StackUnderflow)?;
                    let result = compare(&a, &b, &program.instrs[i]);
                    stack.push(Datum::Bool(result));
                }
                Instr::And => {
                    let b = stack.pop().ok_or(VmError::StackUnderflow)?;
                    let a = stack.pop().ok_or(VmError::StackUnderflow)?;
                    stack.push(Datum::Bool(as_bool(&a) && as_bool(&b)));
                }
                Instr::Or => {
                    let b = stack.pop().ok_or(VmError::StackUnderflow)?;
                    let a = stack.pop().ok_or(VmError::StackUnderflow)?;
                    stack.push(Datum::Bool(as_bool(&a) || as_bool(&b)));
                }
                Instr::Union => {
                    let b = stack.pop().ok_or(VmError::StackUnderflow)?;
                    let a = stack.pop().ok_or(VmError::StackUnderflow)?;
                    let (Datum::NodeSet(mut na), Datum::NodeSet(nb)) = (a, b) else {
                        return Err(VmError::TypeError("union applied to non-node-set".into()));
                    };
                    na.extend(nb);
                    stack.push(Datum::NodeSet(dedup(na)));
                }
                Instr::FilterExprEnd | Instr::Store => {}
            }
            i += 1;
        }
        stack.pop().ok_or(VmError::StackUnderflow)
    }
}

fn root_of(node: &Rc<dyn AdapterNode>) -> Rc<dyn AdapterNode> {
    let mut cur = node.clone();
    while let Some(p) = cur.parent() {
        cur = p;
    }
    cur
}

/// Equality/relational comparison per XPath 1.0 §3.4: nodeset vs
/// nodeset holds iff some pair's string-values satisfy `op`; nodeset
/// vs scalar coerces the scalar's type onto every node's string-value.
fn compare(a: &Datum, b: &Datum, op: &Instr) -> bool {
    let cmp_f = |x: f64, y: f64| -> bool {
        match op {
            Instr::Eq => x == y,
            Instr::Ne => x != y,
            Instr::Lt => x < y,
            Instr::Le => x <= y,
            Instr::Gt => x > y,
            Instr::Ge => x >= y,
            _ => unreachable!(),
        }
    };
    let cmp_s = |x: &str, y: &str| -> bool {
        match op {
            Instr::Eq => x == y,
            Instr::Ne => x != y,
            _ => cmp_f(functions::parse_xpath_number(x), functions::parse_xpath_number(y)),
        }
    };
    match (a, b) {
        (Datum::NodeSet(na), Datum::NodeSet(nb)) => na
            .iter()
            .any(|x| nb.iter().any(|y| cmp_s(&x.string_value(), &y.string_value()))),
        // Operand order matters for non-commutative ops (`<`, `<=`, `>`,
        // `>=`): each arm below keeps the node-set and scalar on the
        // same side of `cmp_f`/`cmp_s` as they appeared in `a op b`.
        (Datum::NodeSet(ns), other) => match other {
            Datum::Number(n) => ns.iter().any(|x| cmp_f(x.numeric_value(), *n)),
            Datum::Bool(bv) => cmp_f(if ns.is_empty() { 0.0 } else { 1.0 }, if *bv { 1.0 } else { 0.0 }),
            Datum::Literal(s) => ns.iter().any(|x| cmp_s(&x.string_value(), s)),
            Datum::NodeSet(_) => unreachable!(),
        },
        (other, Datum::NodeSet(ns)) => match other {
            Datum::Number(n) => ns.iter().any(|x| cmp_f(*n, x.numeric_value())),
            Datum::Bool(bv) => cmp_f(if *bv { 1.0 } else { 0.0 }, if ns.is_empty() { 0.0 } else { 1.0 }),
            Datum::Literal(s) => ns.iter().any(|x| cmp_s(s, &x.string_value())),
            Datum::NodeSet(_) => unreachable!(),
        },
        (Datum::Bool(_), _) | (_, Datum::Bool(_)) => cmp_f(
            if as_bool(a) { 1.0 } else { 0.0 },
            if as_bool(b) { 1.0 } else { 0.0 },
        ),
        (Datum::Number(_), _) | (_, Datum::Number(_)) => cmp_f(as_number(a), as_number(b)),
        _ => cmp_s(&as_string(a), &as_string(b)),
    }
}
