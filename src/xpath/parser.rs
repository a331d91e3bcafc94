//! Recursive-descent XPath parser, compiling directly to bytecode.
//!
//! `spec.md` §4.8 describes three yacc-generated grammars (`expr`,
//! `path-eval`, `leafref`) sharing one lexer. A hand-written recursive-
//! descent parser sidesteps the NCName disambiguation rules in §4.7
//! almost entirely: at each grammar position where an operator name
//! (`and`, `or`, `mod`, `div`) or axis name could appear, the parser
//! already knows structurally whether it's looking for an operator or
//! a primary expression, so no generic previous-token lookahead table
//! is needed — only the function-call-vs-node-type-test-vs-name-test
//! ambiguity (resolved by peeking past the name for `(` or `::`)
//! survives into this implementation. `path-eval` and `leafref` are
//! compiled with this same parser: `path-eval`'s path-extraction need
//! is served by walking the resulting bytecode for `PathStart`/`Step`
//! runs rather than a separate grammar (see [`super::paths::extract`]),
//! and the leafref `path` argument is a strict XPath location-path
//! subset of the full expression grammar, so parsing it with the full
//! parser is a superset that never rejects valid input.

use super::bytecode::{Axis, Instr, NameTest, NodeTypeTest, PathOper, Program, ProgramArena, ProgramId};
use super::lexer::{tokenize, Tok};
use crate::base::{Interner, Span};
use crate::errors::XPathError;

pub struct Parser<'a> {
    toks: Vec<Tok>,
    pos: usize,
    arena: ProgramArena,
    current: Vec<Instr>,
    interner: &'a mut Interner,
    span: Span,
}

pub fn compile(
    src: &str,
    span: Span,
    interner: &mut Interner,
) -> Result<(ProgramArena, ProgramId), XPathError> {
    if src.trim().is_empty() {
        return Err(XPathError::EmptyExpression { span });
    }
    let toks = tokenize(src).map_err(|found| XPathError::UnexpectedToken { span, found })?;
    let mut parser = Parser {
        toks,
        pos: 0,
        arena: ProgramArena::new(),
        current: Vec::new(),
        interner,
        span,
    };
    parser.parse_or_expr()?;
    let main = std::mem::take(&mut parser.current);
    let id = parser.arena.alloc(Program { instrs: main });
    Ok((parser.arena, id))
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos)
    }

    fn bump(&mut self) -> Option<Tok> {
        let t = self.toks.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn err_unexpected(&self) -> XPathError {
        XPathError::UnexpectedToken {
            span: self.span,
            found: self.peek().map(|t| format!("{t:?}")).unwrap_or_else(|| "eof".into()),
        }
    }

    fn eat_name(&mut self, expect: &str) -> bool {
        if let Some(Tok::Name(n)) = self.peek() {
            if n == expect {
                self.pos += 1;
                return true;
            }
        }
        false
    }

    fn emit(&mut self, instr: Instr) {
        self.current.push(instr);
    }

    // OrExpr := AndExpr ('or' AndExpr)*
    fn parse_or_expr(&mut self) -> Result<(), XPathError> {
        self.parse_and_expr()?;
        while self.eat_name("or") {
            self.parse_and_expr()?;
            self.emit(Instr::Or);
        }
        Ok(())
    }

    fn parse_and_expr(&mut self) -> Result<(), XPathError> {
        self.parse_equality_expr()?;
        while self.eat_name("and") {
            self.parse_equality_expr()?;
            self.emit(Instr::And);
        }
        Ok(())
    }

    fn parse_equality_expr(&mut self) -> Result<(), XPathError> {
        self.parse_relational_expr()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Eq) => Instr::Eq,
                Some(Tok::Ne) => Instr::Ne,
                _ => break,
            };
            self.bump();
            self.parse_relational_expr()?;
            self.emit(op);
        }
        Ok(())
    }

    fn parse_relational_expr(&mut self) -> Result<(), XPathError> {
        self.parse_additive_expr()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Lt) => Instr::Lt,
                Some(Tok::Le) => Instr::Le,
                Some(Tok::Gt) => Instr::Gt,
                Some(Tok::Ge) => Instr::Ge,
                _ => break,
            };
            self.bump();
            self.parse_additive_expr()?;
            self.emit(op);
        }
        Ok(())
    }

    fn parse_additive_expr(&mut self) -> Result<(), XPathError> {
        self.parse_multiplicative_expr()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Plus) => Instr::Add,
                Some(Tok::Minus) => Instr::Sub,
                _ => break,
            };
            self.bump();
            self.parse_multiplicative_expr()?;
            self.emit(op);
        }
        Ok(())
    }

    fn parse_multiplicative_expr(&mut self) -> Result<(), XPathError> {
        self.parse_unary_expr()?;
        loop {
            if matches!(self.peek(), Some(Tok::Star)) {
                self.bump();
                self.parse_unary_expr()?;
                self.emit(Instr::Mul);
            } else if self.eat_name("div") {
                self.parse_unary_expr()?;
                self.emit(Instr::Div);
            } else if self.eat_name("mod") {
                self.parse_unary_expr()?;
                self.emit(Instr::Mod);
            } else {
                break;
            }
        }
        Ok(())
    }

    fn parse_unary_expr(&mut self) -> Result<(), XPathError> {
        if matches!(self.peek(), Some(Tok::Minus)) {
            self.bump();
            self.parse_unary_expr()?;
            self.emit(Instr::Negate);
            Ok(())
        } else {
            self.parse_union_expr()
        }
    }

    fn parse_union_expr(&mut self) -> Result<(), XPathError> {
        self.parse_path_expr()?;
        while matches!(self.peek(), Some(Tok::Pipe)) {
            self.bump();
            self.parse_path_expr()?;
            self.emit(Instr::Union);
        }
        Ok(())
    }

    fn starts_location_path(&self) -> bool {
        matches!(
            self.peek(),
            Some(Tok::Slash)
                | Some(Tok::SlashSlash)
                | Some(Tok::Dot)
                | Some(Tok::DotDot)
                | Some(Tok::At)
        ) || matches!(self.peek(), Some(Tok::Name(_)))
    }

    // PathExpr: either a location path, or a primary expr optionally
    // followed by predicates and/or a relative path continuation.
    fn parse_path_expr(&mut self) -> Result<(), XPathError> {
        match self.peek() {
            Some(Tok::Slash) | Some(Tok::SlashSlash) => self.parse_location_path(),
            Some(Tok::Dot) | Some(Tok::DotDot) | Some(Tok::At) => self.parse_location_path(),
            Some(Tok::Name(_)) if self.is_step_start_name() => self.parse_location_path(),
            _ => {
                self.parse_primary_expr()?;
                while matches!(self.peek(), Some(Tok::LBracket)) {
                    self.parse_predicate()?;
                }
                Ok(())
            }
        }
    }

    /// A bare `Name` begins a location step (not a function call)
    /// unless followed by `(` — `foo(` is a function call, `foo` or
    /// `foo/bar` is a name-test step.
    fn is_step_start_name(&self) -> bool {
        if let Some(Tok::Name(n)) = self.peek() {
            if matches!(n.as_str(), "and" | "or" | "mod" | "div") {
                return false;
            }
            return !matches!(self.toks.get(self.pos + 1), Some(Tok::LParen));
        }
        false
    }

    fn parse_location_path(&mut self) -> Result<(), XPathError> {
        let absolute = match self.peek() {
            Some(Tok::Slash) => {
                self.bump();
                true
            }
            Some(Tok::SlashSlash) => {
                // `//foo` == `/descendant-or-self::node()/foo`
                self.bump();
                self.emit(Instr::PathStart { absolute: true });
                self.emit(Instr::Step {
                    axis: Axis::DescendantOrSelf,
                    name_test: None,
                    node_type: Some(NodeTypeTest::Node),
                });
                self.parse_relative_steps()?;
                self.emit(Instr::EvalLocPath);
                return Ok(());
            }
            _ => false,
        };
        self.emit(Instr::PathStart { absolute });
        if absolute && !self.more_steps_follow() {
            self.emit(Instr::EvalLocPath);
            return Ok(());
        }
        self.parse_relative_steps()?;
        self.emit(Instr::EvalLocPath);
        Ok(())
    }

    fn more_steps_follow(&self) -> bool {
        matches!(
            self.peek(),
            Some(Tok::Name(_)) | Some(Tok::Dot) | Some(Tok::DotDot) | Some(Tok::At) | Some(Tok::Star)
        )
    }

    fn parse_relative_steps(&mut self) -> Result<(), XPathError> {
        self.parse_step()?;
        loop {
            match self.peek() {
                Some(Tok::Slash) => {
                    self.bump();
                    self.parse_step()?;
                }
                Some(Tok::SlashSlash) => {
                    self.bump();
                    self.emit(Instr::Step {
                        axis: Axis::DescendantOrSelf,
                        name_test: None,
                        node_type: Some(NodeTypeTest::Node),
                    });
                    self.parse_step()?;
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn parse_step(&mut self) -> Result<(), XPathError> {
        match self.peek() {
            Some(Tok::Dot) => {
                self.bump();
                self.emit(Instr::PathOperPush(PathOper::SelfStep));
                self.emit(Instr::Step { axis: Axis::SelfAxis, name_test: None, node_type: Some(NodeTypeTest::Node) });
                Ok(())
            }
            Some(Tok::DotDot) => {
                self.bump();
                self.emit(Instr::PathOperPush(PathOper::ParentStep));
                self.emit(Instr::Step { axis: Axis::Parent, name_test: None, node_type: Some(NodeTypeTest::Node) });
                Ok(())
            }
            _ => {
                let axis = self.parse_axis_specifier();
                let (name_test, node_type) = self.parse_node_test()?;
                self.emit(Instr::Step { axis, name_test, node_type });
                while matches!(self.peek(), Some(Tok::LBracket)) {
                    self.parse_predicate()?;
                }
                Ok(())
            }
        }
    }

    fn parse_axis_specifier(&mut self) -> Axis {
        if matches!(self.peek(), Some(Tok::At)) {
            self.bump();
            return Axis::Attribute;
        }
        if let Some(Tok::Name(n)) = self.peek() {
            if matches!(self.toks.get(self.pos + 1), Some(Tok::ColonColon)) {
                let axis = match n.as_str() {
                    "parent" => Axis::Parent,
                    "self" => Axis::SelfAxis,
                    "descendant-or-self" => Axis::DescendantOrSelf,
                    "attribute" => Axis::Attribute,
                    _ => Axis::Child,
                };
                self.pos += 2;
                return axis;
            }
        }
        Axis::Child
    }

    fn parse_node_test(&mut self) -> Result<(Option<NameTest>, Option<NodeTypeTest>), XPathError> {
        if matches!(self.peek(), Some(Tok::Star)) {
            self.bump();
            return Ok((Some(NameTest::Wildcard), None));
        }
        let Some(Tok::Name(name)) = self.bump() else {
            return Err(self.err_unexpected());
        };
        if matches!(self.peek(), Some(Tok::LParen)) {
            if let Some(nt) = node_type_of(&name) {
                self.bump();
                if matches!(self.peek(), Some(Tok::RParen)) {
                    self.bump();
                }
                return Ok((None, Some(nt)));
            }
        }
        if matches!(self.peek(), Some(Tok::Colon)) {
            self.bump();
            if matches!(self.peek(), Some(Tok::Star)) {
                self.bump();
                return Ok((
                    Some(NameTest::Name { prefix: Some(self.interner.intern(&name)), local: self.interner.intern("*") }),
                    None,
                ));
            }
            let Some(Tok::Name(local)) = self.bump() else {
                return Err(self.err_unexpected());
            };
            return Ok((
                Some(NameTest::Name { prefix: Some(self.interner.intern(&name)), local: self.interner.intern(&local) }),
                None,
            ));
        }
        Ok((Some(NameTest::Name { prefix: None, local: self.interner.intern(&name) }), None))
    }

    fn parse_predicate(&mut self) -> Result<(), XPathError> {
        self.bump(); // '['
        let saved = std::mem::take(&mut self.current);
        self.parse_or_expr()?;
        let body = std::mem::replace(&mut self.current, saved);
        let id = self.arena.alloc(Program { instrs: body });
        if !matches!(self.bump(), Some(Tok::RBracket)) {
            return Err(self.err_unexpected());
        }
        self.emit(Instr::PredStart(id));
        self.emit(Instr::EvalSubMachine(id));
        self.emit(Instr::PredEnd);
        Ok(())
    }

    fn parse_primary_expr(&mut self) -> Result<(), XPathError> {
        match self.peek().cloned() {
            Some(Tok::LParen) => {
                self.bump();
                self.parse_or_expr()?;
                if !matches!(self.bump(), Some(Tok::RParen)) {
                    return Err(self.err_unexpected());
                }
                Ok(())
            }
            Some(Tok::Literal(s)) => {
                self.bump();
                self.emit(Instr::LitPush(self.interner.intern(&s)));
                Ok(())
            }
            Some(Tok::Number(n)) => {
                self.bump();
                self.emit(Instr::NumPush(n));
                Ok(())
            }
            Some(Tok::Name(name)) => {
                self.bump();
                if matches!(self.peek(), Some(Tok::LParen)) {
                    self.bump();
                    let mut argc = 0u8;
                    if !matches!(self.peek(), Some(Tok::RParen)) {
                        self.parse_or_expr()?;
                        argc += 1;
                        while matches!(self.peek(), Some(Tok::Comma)) {
                            self.bump();
                            self.parse_or_expr()?;
                            argc += 1;
                        }
                    }
                    if !matches!(self.bump(), Some(Tok::RParen)) {
                        return Err(self.err_unexpected());
                    }
                    let static_name: &'static str = super::functions::intern_name(&name);
                    self.emit(Instr::Builtin { name: static_name, arity: argc });
                    Ok(())
                } else {
                    Err(self.err_unexpected())
                }
            }
            _ => Err(self.err_unexpected()),
        }
    }
}

fn node_type_of(name: &str) -> Option<NodeTypeTest> {
    match name {
        "node" => Some(NodeTypeTest::Node),
        "text" => Some(NodeTypeTest::Text),
        "comment" => Some(NodeTypeTest::Comment),
        "processing-instruction" => Some(NodeTypeTest::ProcessingInstruction),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::FileId;

    fn compile_ok(src: &str) -> (ProgramArena, ProgramId) {
        let mut interner = Interner::new();
        compile(src, Span::empty(FileId(0), 0), &mut interner).expect("compiles")
    }

    #[test]
    fn compiles_arithmetic() {
        let (arena, id) = compile_ok("10 + number(substring('1234', 1, 2))");
        let prog = arena.get(id);
        assert!(prog.instrs.iter().any(|i| matches!(i, Instr::Add)));
    }

    #[test]
    fn compiles_predicate_as_submachine() {
        let (arena, id) = compile_ok("dataplane[2]");
        let prog = arena.get(id);
        assert!(prog.instrs.iter().any(|i| matches!(i, Instr::PredStart(_))));
        assert_eq!(arena.get(ProgramId(0)).instrs.len(), 1); // the predicate body: NumPush(2.0)
    }

    #[test]
    fn empty_expression_errors() {
        let mut interner = Interner::new();
        let err = compile("   ", Span::empty(FileId(0), 0), &mut interner).unwrap_err();
        assert!(matches!(err, XPathError::EmptyExpression { .. }));
    }
}
