//! Path extraction: the `path-eval` grammar's job (`spec.md` §4.8),
//! implemented as a walk over the same bytecode `expr` compiles to
//! rather than a second grammar — see the parser module doc comment
//! for why this is a safe simplification.

use super::bytecode::{Instr, NameTest, ProgramArena, ProgramId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPath {
    pub absolute: bool,
    pub segments: Vec<String>,
}

/// Collect every location path reachable from `id`'s instruction
/// stream, including inside predicate sub-machines, without evaluating
/// against a live tree.
pub fn extract(arena: &ProgramArena, id: ProgramId) -> Vec<ExtractedPath> {
    let mut out = Vec::new();
    walk(arena, id, &mut out);
    out
}

fn walk(arena: &ProgramArena, id: ProgramId, out: &mut Vec<ExtractedPath>) {
    let program = arena.get(id);
    let mut current: Option<ExtractedPath> = None;
    for instr in &program.instrs {
        match instr {
            Instr::PathStart { absolute } => {
                current = Some(ExtractedPath { absolute: *absolute, segments: Vec::new() });
            }
            Instr::Step { name_test: Some(NameTest::Name { local, .. }), .. } => {
                if let Some(p) = current.as_mut() {
                    p.segments.push(local.to_string());
                }
            }
            Instr::EvalLocPath | Instr::EvalLocPathExists => {
                if let Some(p) = current.take() {
                    out.push(p);
                }
            }
            Instr::EvalSubMachine(sub) => {
                walk(arena, *sub, out);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{FileId, Interner, Span};

    #[test]
    fn extracts_simple_relative_path() {
        let mut interner = Interner::new();
        let (arena, id) =
            super::super::parser::compile("../a", Span::empty(FileId(0), 0), &mut interner).unwrap();
        let paths = extract(&arena, id);
        assert_eq!(paths.len(), 1);
        assert!(!paths[0].absolute);
    }

    #[test]
    fn extracts_path_inside_predicate() {
        let mut interner = Interner::new();
        let (arena, id) =
            super::super::parser::compile("dataplane[name = 'x']", Span::empty(FileId(0), 0), &mut interner)
                .unwrap();
        let paths = extract(&arena, id);
        assert!(paths.iter().any(|p| p.segments == vec!["dataplane".to_string()]));
        assert!(paths.iter().any(|p| p.segments == vec!["name".to_string()]));
    }
}
