//! End-to-end scenarios from `spec.md` §8 that exercise more than one
//! crate layer together (parse → schema compile → validate).

use yang_schema::ast::resolve;
use yang_schema::base::{FileTable, Interner};
use yang_schema::options::{CompileOptions, ValidateOptions};
use yang_schema::schema::compiler::{self, ModuleInput};
use yang_schema::xpath::adapter::SimpleNode;
use yang_schema::{parse_module, Error};

use std::cell::RefCell;
use std::rc::Rc;

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
fn s1_revision_out_of_order_is_rejected() {
    let src = r#"module m {
        namespace "urn:m";
        prefix m;
        revision 2014-12-16;
        revision 2015-12-16;
    }"#;
    let err = parse_module(src, "m.yang").unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
    assert!(err.to_string().contains("revision block out of order 2015-12-16"));
}

#[test]
fn s2_duplicate_revision_is_rejected() {
    let src = r#"module m {
        namespace "urn:m";
        prefix m;
        revision 2015-12-16;
        revision 2015-12-16;
    }"#;
    let err = parse_module(src, "m.yang").unwrap_err();
    assert!(err.to_string().contains("duplicated revision date 2015-12-16"));
}

#[test]
fn s3_identifier_may_not_start_with_xml() {
    let src = r#"module m {
        namespace "urn:m";
        prefix m;
        container top {
            leaf XmLtestcontainer {
                type string;
            }
        }
    }"#;
    let err = parse_module(src, "m.yang").unwrap_err();
    assert!(err.to_string().contains("invalid identifier, not allowed to start with xml: XmLtestcontainer"));
}

fn compile_one(src: &str) -> yang_schema::schema::ModelSet {
    let mut interner = Interner::new();
    let mut files = FileTable::new();
    let file = files.intern(&mut interner, "m.yang");
    let table = yang_schema::ast::cardinality::CardinalityTable::build(&[]);
    let parser = yang_schema::parser::Parser::new(src, file, &mut interner, &table);
    let mut tree = parser.parse_module(src.to_string()).unwrap();
    let resolved = resolve::resolve(&mut tree).unwrap();
    compiler::compile(vec![ModuleInput { tree, resolved }], &mut interner, CompileOptions::default()).unwrap()
}

#[test]
fn s6_leafref_cross_check() {
    let src = r#"module m {
        namespace "urn:m";
        prefix m;
        container top {
            leaf a {
                type string;
            }
            leaf b {
                type leafref {
                    path "../a";
                }
            }
        }
    }"#;
    let model = compile_one(src);

    let a_mismatch = leaf("a", "x", vec!["top", "a"]);
    let b_mismatch = leaf("b", "y", vec!["top", "b"]);
    let top_mismatch = container("top", vec![a_mismatch, b_mismatch], vec!["top"]);
    let root_mismatch: Rc<dyn yang_schema::xpath::adapter::AdapterNode> = container("", vec![top_mismatch], vec![]);
    let errors = yang_schema::validator::validate(&model, root_mismatch, ValidateOptions::default());
    assert!(errors.iter().any(|e| e.tag == yang_schema::ErrorTag::DataMissing));

    let a_match = leaf("a", "x", vec!["top", "a"]);
    let b_match = leaf("b", "x", vec!["top", "b"]);
    let top_match = container("top", vec![a_match, b_match], vec!["top"]);
    let root_match: Rc<dyn yang_schema::xpath::adapter::AdapterNode> = container("", vec![top_match], vec![]);
    let errors = yang_schema::validator::validate(&model, root_match, ValidateOptions::default());
    assert!(errors.is_empty());
}

#[test]
fn s7_must_on_unconfigured_non_presence_container() {
    let src = r#"module m {
        namespace "urn:m";
        prefix m;
        container top {
            must "count(./child) > 0";
            leaf child {
                type string;
            }
        }
    }"#;
    let model = compile_one(src);
    let top_empty = container("top", vec![], vec!["top"]);
    let root: Rc<dyn yang_schema::xpath::adapter::AdapterNode> = container("", vec![top_empty], vec![]);
    let errors = yang_schema::validator::validate(&model, root, ValidateOptions::default());
    assert!(errors.iter().any(|e| e.tag == yang_schema::ErrorTag::MustViolation));
}
