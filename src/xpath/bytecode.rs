//! XPath bytecode: the opcode set shared by all three grammars and the
//! flat program arena predicates compile into.
//!
//! Per `spec.md` §9 Design Notes, predicate sub-machines are captured
//! as a [`ProgramId`] into a [`ProgramArena`] rather than an owned heap
//! pointer, so the whole compiled expression — main program plus every
//! nested predicate — lives in one flat, cheaply clonable structure.

use crate::base::IStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Parent,
    SelfAxis,
    DescendantOrSelf,
    Attribute,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NameTest {
    Wildcard,
    Name { prefix: Option<IStr>, local: IStr },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeTypeTest {
    Node,
    Text,
    Comment,
    ProcessingInstruction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathOper {
    /// `/` at the start of an absolute path.
    Root,
    /// `.`
    SelfStep,
    /// `..`
    ParentStep,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
    NumPush(f64),
    LitPush(IStr),
    /// Begin a location path: push the initial context (root or
    /// current node set) that subsequent steps narrow.
    PathStart { absolute: bool },
    PathOperPush(PathOper),
    /// One step: an axis plus either a name test or node-type test.
    Step { axis: Axis, name_test: Option<NameTest>, node_type: Option<NodeTypeTest> },
    /// Evaluate the location path built by the preceding `Step`s,
    /// producing a node-set value on the stack.
    EvalLocPath,
    /// `path-eval` grammar only: record the path's existence rather
    /// than evaluating it against a live tree.
    EvalLocPathExists,
    /// Begin a predicate: `PredEnd` closes it; the body between is a
    /// separately-compiled `ProgramId` run once per candidate node.
    PredStart(ProgramId),
    PredEnd,
    /// Run a separately compiled program (used for predicate bodies),
    /// pushing its result.
    EvalSubMachine(ProgramId),
    Builtin { name: &'static str, arity: u8 },
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Negate,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Union,
    FilterExprEnd,
    Store,
}

#[derive(Debug, Clone, Default)]
pub struct Program {
    pub instrs: Vec<Instr>,
}

/// Owns every program compiled for one expression: the top-level
/// program plus every predicate sub-machine, indexed by [`ProgramId`].
#[derive(Debug, Clone, Default)]
pub struct ProgramArena {
    programs: Vec<Program>,
}

impl ProgramArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, program: Program) -> ProgramId {
        let id = ProgramId(self.programs.len() as u32);
        self.programs.push(program);
        id
    }

    pub fn get(&self, id: ProgramId) -> &Program {
        &self.programs[id.0 as usize]
    }

    pub fn root(&self) -> ProgramId {
        ProgramId(self.programs.len() as u32 - 1)
    }

    /// Absorb every program from `other` into `self`, rewriting the
    /// `ProgramId`s any `PredStart`/`EvalSubMachine` instruction carries
    /// by the offset at which `other`'s programs land. Returns `other`'s
    /// former root under its new id. Used to combine each `when`/`must`
    /// expression's independently-compiled arena into one model-wide
    /// arena (`spec.md` §4.5 step 8).
    pub fn merge(&mut self, other: ProgramArena) -> ProgramId {
        let offset = self.programs.len() as u32;
        let other_root = other.root().0;
        for mut program in other.programs {
            for instr in &mut program.instrs {
                match instr {
                    Instr::PredStart(id) | Instr::EvalSubMachine(id) => id.0 += offset,
                    _ => {}
                }
            }
            self.programs.push(program);
        }
        ProgramId(offset + other_root)
    }
}
