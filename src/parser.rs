//! Recursive-descent YANG parser: tokens → typed [`ast::Tree`].
//!
//! Grammar (`spec.md` §4.2):
//!
//! ```text
//! file     := stmt stmt*
//! stmt     := identifier [argument] stmtBody
//! stmtBody := ';' | '{' stmt* '}'
//! argument := string | quotedString ([sep] '+' [sep] quotedString)*
//! ```
//!
//! The teacher's parser throws from deep recursion and catches at the
//! top (`syntax::rowan_parser_archive`-style panic-on-error). Per
//! `spec.md` §9 Design Notes this is replaced with ordinary `Result`
//! propagation: every parsing step returns `Result<_, ParseError>` and
//! bails early via `?`.

use crate::ast::argument::{self, Argument};
use crate::ast::cardinality::CardinalityTable;
use crate::ast::kind::{resolve_keyword, StatementKind};
use crate::ast::{ModuleId, Node, NodeFlags, NodeId, Tree, TreeBuilder};
use crate::base::{FileId, IStr, Interner, Span};
use crate::errors::ParseError;
use crate::lexer::{Lexer, TokenKind};

/// Filters [`crate::lexer::Lexer`] output down to the tokens the parser
/// grammar actually cares about, buffering up to three for lookahead.
struct TokenStream<'a> {
    lexer: Lexer<'a>,
    buf: Vec<crate::lexer::Token>,
}

impl<'a> TokenStream<'a> {
    fn new(source: &'a str, file: FileId) -> Self {
        Self { lexer: Lexer::new(source, file), buf: Vec::new() }
    }

    fn fill(&mut self) -> Result<(), ParseError> {
        loop {
            let tok = self.lexer.next_token()?;
            if tok.kind != TokenKind::Separator {
                self.buf.push(tok);
                return Ok(());
            }
        }
    }

    fn peek_n(&mut self, n: usize) -> Result<&crate::lexer::Token, ParseError> {
        while self.buf.len() <= n {
            self.fill()?;
        }
        Ok(&self.buf[n])
    }

    fn peek(&mut self) -> Result<&crate::lexer::Token, ParseError> {
        self.peek_n(0)
    }

    fn bump(&mut self) -> Result<crate::lexer::Token, ParseError> {
        self.peek()?;
        Ok(self.buf.remove(0))
    }

    fn expect(&mut self, kind: TokenKind) -> Result<crate::lexer::Token, ParseError> {
        let tok = self.bump()?;
        if tok.kind != kind {
            return Err(ParseError::UnexpectedToken {
                span: tok.span,
                found: format!("{:?}", tok.kind),
                expected: format!("{kind:?}"),
            });
        }
        Ok(tok)
    }
}

pub struct Parser<'a> {
    stream: TokenStream<'a>,
    builder: TreeBuilder,
    interner: &'a mut Interner,
    arg_interner: argument::ArgumentInterner,
    cardinality: &'a CardinalityTable,
    file: FileId,
    module: ModuleId,
}

const HEADER_STATEMENTS: &[StatementKind] = &[
    StatementKind::YangVersion,
    StatementKind::Namespace,
    StatementKind::Prefix,
    StatementKind::BelongsTo,
];
const LINKAGE_STATEMENTS: &[StatementKind] = &[StatementKind::Import, StatementKind::Include];
const META_STATEMENTS: &[StatementKind] = &[
    StatementKind::Organization,
    StatementKind::Contact,
    StatementKind::Description,
    StatementKind::Reference,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum HeaderPhase {
    Header,
    Linkage,
    Meta,
    Revisions,
    Body,
}

fn phase_of(kind: StatementKind) -> HeaderPhase {
    if HEADER_STATEMENTS.contains(&kind) {
        HeaderPhase::Header
    } else if LINKAGE_STATEMENTS.contains(&kind) {
        HeaderPhase::Linkage
    } else if META_STATEMENTS.contains(&kind) {
        HeaderPhase::Meta
    } else if kind == StatementKind::Revision {
        HeaderPhase::Revisions
    } else {
        HeaderPhase::Body
    }
}

impl<'a> Parser<'a> {
    pub fn new(
        source: &'a str,
        file: FileId,
        interner: &'a mut Interner,
        cardinality: &'a CardinalityTable,
    ) -> Self {
        Self {
            stream: TokenStream::new(source, file),
            builder: TreeBuilder::new(),
            interner,
            arg_interner: argument::ArgumentInterner::new(),
            cardinality,
            file,
            module: ModuleId(0),
        }
    }

    /// Parse one top-level statement (normally `module` or `submodule`)
    /// and everything beneath it, returning the finished tree.
    pub fn parse_module(mut self, source_text: String) -> Result<Tree, ParseError> {
        let root = self.parse_statement()?;
        self.check_module_ordering(root)?;
        self.check_revision_ordering(root)?;
        Ok(self.builder.finish(root, source_text, self.file))
    }

    fn parse_statement(&mut self) -> Result<NodeId, ParseError> {
        let kw_tok = self.stream.expect(TokenKind::UnquotedString)?;
        let raw_kw: String = kw_tok.text.to_string();
        let kind = resolve_keyword(&raw_kw);

        let next = self.stream.peek()?.clone();
        let argument = if next.kind == TokenKind::LeftBrace || next.kind == TokenKind::Semicolon {
            Argument::None
        } else {
            self.parse_argument(kind)?
        };

        let node_start = kw_tok.span;
        let id = self.builder.alloc(Node {
            kind,
            argument,
            span: node_start,
            parent: None,
            children: Vec::new(),
            defining_module: self.module,
            use_module: self.module,
            flags: NodeFlags::empty(),
            type_scope: crate::ast::ScopeId(0),
            grouping_scope: crate::ast::ScopeId(0),
        });

        let body_tok = self.stream.bump()?;
        match body_tok.kind {
            TokenKind::Semicolon => {}
            TokenKind::LeftBrace => loop {
                let peek = self.stream.peek()?.clone();
                if peek.kind == TokenKind::RightBrace {
                    self.stream.bump()?;
                    break;
                }
                if peek.kind == TokenKind::Eof {
                    return Err(ParseError::UnexpectedToken {
                        span: peek.span,
                        found: "eof".into(),
                        expected: "}".into(),
                    });
                }
                let child = self.parse_statement()?;
                self.builder.add_child(id, child);
            },
            other => {
                return Err(ParseError::UnexpectedToken {
                    span: body_tok.span,
                    found: format!("{other:?}"),
                    expected: "';' or '{'".into(),
                });
            }
        }

        self.check_node(id)?;
        Ok(id)
    }

    /// `argument := string | quotedString ([sep] '+' [sep] quotedString)*`
    fn parse_argument(&mut self, kind: StatementKind) -> Result<Argument, ParseError> {
        let next = self.stream.peek()?.clone();
        let (raw, span) = if next.kind == TokenKind::Quote {
            self.parse_quoted_concat()?
        } else {
            let tok = self.stream.expect(TokenKind::UnquotedString)?;
            (tok.text.to_string(), tok.span)
        };
        self.arg_interner.mark(kind, &raw);
        build_typed_argument(kind, &raw, span, self.interner)
    }

    fn parse_quoted_concat(&mut self) -> Result<(String, Span), ParseError> {
        let mut out = String::new();
        let mut span = self.parse_one_quoted(&mut out)?;
        loop {
            let peek = self.stream.peek()?.clone();
            if peek.kind != TokenKind::Plus {
                break;
            }
            self.stream.bump()?;
            let peek2 = self.stream.peek()?.clone();
            if peek2.kind != TokenKind::Quote {
                return Err(ParseError::Lex {
                    span: peek.span,
                    message: "expected quoted string after '+'".into(),
                });
            }
            let piece_span = self.parse_one_quoted(&mut out)?;
            span = span.cover(piece_span);
        }
        Ok((out, span))
    }

    fn parse_one_quoted(&mut self, out: &mut String) -> Result<Span, ParseError> {
        let open = self.stream.expect(TokenKind::Quote)?;
        let body = self.stream.expect(TokenKind::QuotedString)?;
        let close = self.stream.expect(TokenKind::Quote)?;
        out.push_str(&body.text);
        Ok(open.span.cover(close.span))
    }

    fn check_node(&mut self, id: NodeId) -> Result<(), ParseError> {
        let kind = self.node_kind(id);
        let span = self.node_span(id);
        let child_kinds = self.node_child_kinds(id);
        if let Err(violations) = self.cardinality.check(kind, &child_kinds) {
            let (bad_kind, msg) = violations[0];
            return Err(ParseError::Cardinality {
                span,
                message: format!("{bad_kind:?}: {msg}"),
            });
        }
        Ok(())
    }

    fn node_kind(&self, id: NodeId) -> StatementKind {
        self.builder_nodes()[id.0 as usize].kind
    }
    fn node_span(&self, id: NodeId) -> Span {
        self.builder_nodes()[id.0 as usize].span
    }
    fn node_child_kinds(&self, id: NodeId) -> Vec<StatementKind> {
        self.builder_nodes()[id.0 as usize]
            .children
            .iter()
            .map(|c| self.builder_nodes()[c.0 as usize].kind)
            .collect()
    }
    fn builder_nodes(&self) -> &[Node] {
        self.builder.nodes_slice()
    }

    fn check_module_ordering(&self, root: NodeId) -> Result<(), ParseError> {
        let nodes = self.builder_nodes();
        let root_node = &nodes[root.0 as usize];
        let mut phase = HeaderPhase::Header;
        for child in &root_node.children {
            let child_node = &nodes[child.0 as usize];
            let p = phase_of(child_node.kind);
            if p < phase {
                let kw = format!("{:?}", child_node.kind);
                return Err(match phase {
                    HeaderPhase::Linkage => ParseError::UnexpectedLinkageStatement {
                        span: child_node.span,
                        keyword: kw,
                    },
                    HeaderPhase::Meta => ParseError::UnexpectedMetaStatement {
                        span: child_node.span,
                        keyword: kw,
                    },
                    HeaderPhase::Revisions | HeaderPhase::Body => {
                        ParseError::UnexpectedBodyStatement { span: child_node.span, keyword: kw }
                    }
                    HeaderPhase::Header => ParseError::UnexpectedHeaderStatement {
                        span: child_node.span,
                        keyword: kw,
                    },
                });
            }
            phase = phase.max(p);
        }
        Ok(())
    }

    fn check_revision_ordering(&self, root: NodeId) -> Result<(), ParseError> {
        let nodes = self.builder_nodes();
        let root_node = &nodes[root.0 as usize];
        let mut last: Option<(u16, u8, u8, String)> = None;
        for child in &root_node.children {
            let child_node = &nodes[child.0 as usize];
            if child_node.kind != StatementKind::Revision {
                continue;
            }
            let Argument::Date { year, month, day } = child_node.argument else {
                continue;
            };
            let date_str = format!("{year:04}-{month:02}-{day:02}");
            if let Some((py, pm, pd, pdate)) = &last {
                if (year, month, day) == (*py, *pm, *pd) {
                    return Err(ParseError::DuplicatedRevision {
                        span: child_node.span,
                        date: date_str,
                    });
                }
                if (year, month, day) > (*py, *pm, *pd) {
                    let _ = pdate;
                    return Err(ParseError::RevisionOutOfOrder {
                        span: child_node.span,
                        date: date_str,
                    });
                }
            }
            last = Some((year, month, day, date_str));
        }
        Ok(())
    }
}

fn build_typed_argument(
    kind: StatementKind,
    raw: &str,
    span: Span,
    interner: &mut Interner,
) -> Result<Argument, ParseError> {
    use StatementKind::*;
    Ok(match kind {
        Module | Submodule | Prefix | BelongsTo | Typedef | Grouping | Feature | Identity
        | Base | Extension => {
            Argument::Identifier(argument::parse_identifier(raw, span, interner)?)
        }
        Import | Include | Uses | Type | IfFeature => {
            let (prefix, name) = argument::parse_identifier_ref(raw, span, interner)?;
            Argument::IdentifierRef { prefix, name }
        }
        Namespace => Argument::Uri(interner.intern(raw)),
        YangVersion => {
            argument::parse_yang_version(raw, span)?;
            Argument::YangVersion
        }
        RevisionDate | Revision => {
            let (y, m, d) = argument::parse_date(raw, span)?;
            Argument::Date { year: y, month: m, day: d }
        }
        Key => Argument::KeyList(argument::parse_key_list(raw, span, interner)?),
        Range => Argument::RangePart(argument::parse_range_like(raw, span)?),
        Length => Argument::LengthPart(argument::parse_range_like(raw, span)?),
        Pattern => Argument::Pattern { raw: interner.intern(raw), invert_match: false },
        FractionDigits => Argument::FractionDigits(argument::parse_fraction_digits(raw, span)?),
        MaxElements => Argument::MaxValueOrUnbounded(argument::parse_max_value(raw, span)?),
        MinElements => {
            let v: u64 = raw
                .parse()
                .map_err(|_| ParseError::InvalidArgument {
                    span,
                    message: format!("invalid min-elements: {raw}"),
                })?;
            Argument::Unsigned(v)
        }
        Mandatory | YinElement | RequireInstance | ModifierInvertMatch => {
            Argument::Boolean(argument::parse_boolean(raw, span)?)
        }
        Status => Argument::StatusEnum(argument::parse_status(raw, span)?),
        OrderedBy => Argument::OrderedByEnum(argument::parse_ordered_by(raw, span)?),
        DeviateVerb => Argument::DeviateVerb(argument::parse_deviate_verb(raw, span)?),
        Path => {
            let (absolute, segments) = argument::parse_schema_path(raw, span, interner)?;
            Argument::SchemaPath { absolute, segments }
        }
        Value | Position => {
            let v: i64 = raw.parse().map_err(|_| ParseError::InvalidArgument {
                span,
                message: format!("invalid integer: {raw}"),
            })?;
            Argument::Integer(v)
        }
        Unique => {
            let groups = raw
                .split_whitespace()
                .map(|s| {
                    s.split('/')
                        .filter(|x| !x.is_empty())
                        .map(|x| argument::parse_identifier(x, span, interner))
                        .collect::<Result<Vec<_>, _>>()
                })
                .collect::<Result<Vec<_>, _>>()?;
            Argument::UniquePathList(groups)
        }
        _ => Argument::Text(interner.intern(raw)),
    })
}
