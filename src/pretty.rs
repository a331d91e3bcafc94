//! A YIN-less pretty-printer for the parsed AST and compiled schema
//! tree, per `SPEC_FULL.md` §4.12.
//!
//! This is diagnostic tooling only — statement-indented text, not a
//! round-trippable serialization format — grounded in the teacher's
//! `syntax::formatter` indent-tracking pretty-printer generalized from
//! its CST to this crate's two tree shapes.

use crate::ast::{Node, NodeId, StatementKind, Tree};
use crate::schema::{Kind, ModelSet, SchemaNode, SchemaNodeId};

struct Printer {
    out: String,
    indent: usize,
}

impl Printer {
    fn new() -> Self {
        Self { out: String::new(), indent: 0 }
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn nested(&mut self, f: impl FnOnce(&mut Self)) {
        self.indent += 1;
        f(self);
        self.indent -= 1;
    }
}

fn keyword_of(kind: StatementKind) -> &'static str {
    match kind {
        StatementKind::Module => "module",
        StatementKind::Submodule => "submodule",
        StatementKind::Container => "container",
        StatementKind::Leaf => "leaf",
        StatementKind::LeafList => "leaf-list",
        StatementKind::List => "list",
        StatementKind::Choice => "choice",
        StatementKind::Case => "case",
        StatementKind::Grouping => "grouping",
        StatementKind::Uses => "uses",
        StatementKind::Augment => "augment",
        StatementKind::Deviation => "deviation",
        StatementKind::Typedef => "typedef",
        StatementKind::Type => "type",
        StatementKind::Rpc => "rpc",
        StatementKind::Input => "input",
        StatementKind::Output => "output",
        StatementKind::Notification => "notification",
        StatementKind::When => "when",
        StatementKind::Must => "must",
        StatementKind::Import => "import",
        StatementKind::Include => "include",
        StatementKind::Namespace => "namespace",
        StatementKind::Prefix => "prefix",
        StatementKind::Revision => "revision",
        StatementKind::Extension => "extension",
        _ => "statement",
    }
}

fn node_line(tree: &Tree, id: NodeId) -> String {
    let node: &Node = tree.get(id);
    let keyword = keyword_of(node.kind);
    match node.keyword_text() {
        Some(arg) => format!("{keyword} \"{arg}\";"),
        None => format!("{keyword} {{...}};"),
    }
}

fn print_node(p: &mut Printer, tree: &Tree, id: NodeId) {
    let children = tree.children_of(id).to_vec();
    if children.is_empty() {
        p.line(&node_line(tree, id));
    } else {
        let mut header = node_line(tree, id);
        header.pop(); // drop trailing ';'
        header.push_str(" {");
        p.line(&header);
        p.nested(|p| {
            for child in children {
                print_node(p, tree, child);
            }
        });
        p.line("}");
    }
}

/// Render `tree` as statement-indented text, starting at its root.
pub fn print_tree(tree: &Tree) -> String {
    let mut p = Printer::new();
    print_node(&mut p, tree, tree.root);
    p.out
}

fn kind_label(kind: &Kind) -> &'static str {
    match kind {
        Kind::ModuleRoot => "module-root",
        Kind::Container { .. } => "container",
        Kind::List { .. } => "list",
        Kind::Leaf { .. } => "leaf",
        Kind::LeafList { .. } => "leaf-list",
        Kind::Choice { .. } => "choice",
        Kind::Case => "case",
        Kind::Rpc { .. } => "rpc",
        Kind::Notification => "notification",
        Kind::OpdCommand => "opd:command",
        Kind::OpdArgument { .. } => "opd:argument",
        Kind::OpdOption { .. } => "opd:option",
        Kind::OpdOptionValue { .. } => "opd:option-value",
    }
}

fn print_schema_node(p: &mut Printer, model: &ModelSet, id: SchemaNodeId) {
    let node: &SchemaNode = model.get(id);
    let label = kind_label(&node.kind);
    let suffix = if node.header.config { "" } else { " [state]" };
    if node.children.is_empty() {
        p.line(&format!("{label} {}{suffix};", node.header.name));
    } else {
        p.line(&format!("{label} {}{suffix} {{", node.header.name));
        p.nested(|p| {
            for &child in &node.children {
                print_schema_node(p, model, child);
            }
        });
        p.line("}");
    }
}

/// Render the unified schema tree held by `model` as indented text.
pub fn print_schema(model: &ModelSet) -> String {
    let mut p = Printer::new();
    for &child in &model.get(model.root).children {
        print_schema_node(&mut p, model, child);
    }
    p.out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_module;

    #[test]
    fn prints_nested_container_and_leaf() {
        let src = r#"module m {
            namespace "urn:m";
            prefix m;
            container top {
                leaf name {
                    type string;
                }
            }
        }"#;
        let (tree, _files, _interner) = parse_module(src, "m.yang").unwrap();
        let out = print_tree(&tree);
        assert!(out.contains("container \"top\""));
        assert!(out.contains("leaf \"name\""));
    }
}
