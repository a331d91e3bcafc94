//! The XPath 1.0 subset engine: lexer, parser/bytecode compiler, stack
//! VM, built-in functions, tree adapter, and compile-time path
//! extraction. See `spec.md` §4.7–§4.10.

pub mod adapter;
pub mod bytecode;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod paths;
pub mod vm;

pub use bytecode::{Program, ProgramArena, ProgramId};
pub use vm::{Datum, TreeFilter, Vm, VmError};

use crate::base::{Interner, Span};
use crate::errors::XPathError;
use std::rc::Rc;

/// Compile and immediately run an expression once against `context`,
/// the common case for ad-hoc evaluation (tests, `leafref` checks).
pub fn eval(
    src: &str,
    span: Span,
    interner: &mut Interner,
    context: Rc<dyn adapter::AdapterNode>,
    filter: TreeFilter,
) -> Result<Datum, XPathError> {
    let (arena, id) = parser::compile(src, span, interner)?;
    let vm = Vm::new(&arena, context.clone(), filter, false);
    vm.run(id, context).map_err(|e| XPathError::TypeError { span, message: e.to_string() })
}

#[cfg(test)]
mod tests {
    use super::adapter::SimpleNode;
    use super::*;
    use crate::base::FileId;
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

    #[test]
    fn s4_arithmetic_scenario() {
        let mut interner = Interner::new();
        let root = container("root", vec![], vec!["root"]);
        let result = eval(
            "10 + number(substring('1234', 1, 2))",
            Span::empty(FileId(0), 0),
            &mut interner,
            root,
            TreeFilter::FullTree,
        )
        .unwrap();
        assert_eq!(result.as_number(), 22.0);
    }

    #[test]
    fn s5_predicate_scenario() {
        let mut interner = Interner::new();
        let dp1 = leaf("dataplane", "dp0s1", vec!["root", "dataplane"]);
        let dp2 = leaf("dataplane", "dp0s2", vec!["root", "dataplane"]);
        let dp3 = leaf("dataplane", "dp0s3", vec!["root", "dataplane"]);
        let root = container("root", vec![dp1, dp2, dp3], vec!["root"]);
        let result = eval(
            "dataplane[2]",
            Span::empty(FileId(0), 0),
            &mut interner,
            root,
            TreeFilter::FullTree,
        )
        .unwrap();
        let Datum::NodeSet(ns) = result else { panic!("expected node-set") };
        assert_eq!(ns.len(), 1);
        assert_eq!(ns[0].string_value(), "dp0s2");
    }

    #[test]
    fn count_equals_nodeset_cardinality() {
        let mut interner = Interner::new();
        let dp1 = leaf("dataplane", "dp0s1", vec!["root", "dataplane"]);
        let dp2 = leaf("dataplane", "dp0s2", vec!["root", "dataplane"]);
        let root = container("root", vec![dp1, dp2], vec!["root"]);
        let result = eval(
            "count(dataplane)",
            Span::empty(FileId(0), 0),
            &mut interner,
            root,
            TreeFilter::FullTree,
        )
        .unwrap();
        assert_eq!(result.as_number(), 2.0);
    }

    /// `spec.md` §8 invariant 5: two evaluations of the same compiled
    /// program against the same tree return node-set-equal results in
    /// the same document order.
    #[test]
    fn nodeset_evaluation_is_deterministic() {
        let mut interner = Interner::new();
        let dp1 = leaf("dataplane", "dp0s1", vec!["root", "dataplane"]);
        let dp2 = leaf("dataplane", "dp0s2", vec!["root", "dataplane"]);
        let dp3 = leaf("dataplane", "dp0s3", vec!["root", "dataplane"]);
        let root = container("root", vec![dp1, dp2, dp3], vec!["root"]);
        let span = Span::empty(FileId(0), 0);
        let (arena, id) = parser::compile("dataplane", span, &mut interner).unwrap();

        let run = || {
            let vm = Vm::new(&arena, root.clone(), TreeFilter::FullTree, false);
            let Datum::NodeSet(ns) = vm.run(id, root.clone()).unwrap() else {
                panic!("expected node-set")
            };
            ns.iter().map(|n| n.string_value()).collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
        assert_eq!(run(), vec!["dp0s1", "dp0s2", "dp0s3"]);
    }
}
