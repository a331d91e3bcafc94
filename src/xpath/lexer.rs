//! XPath sub-lexer.
//!
//! Unlike the main YANG lexer (`crate::lexer`, hand-written because of
//! RFC 6020 §6.1.3's column-dependent string trimming), the XPath
//! token alphabet is flat and line-independent, so Logos — the
//! teacher's lexer-generation tool of choice — fits cleanly here.
//!
//! Disambiguation of a bare `NCName` into operator-name, axis-name,
//! node-type-test, function-call, or plain name-test is deliberately
//! *not* done here (per `spec.md` §4.7 these rules depend on the
//! previous emitted token and on lookahead past whitespace); the lexer
//! emits every name as [`Tok::Name`] and [`crate::xpath::parser`]
//! applies the disambiguation rules using its own one-token lookahead.

use logos::Logos;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Tok {
    #[regex(r"[0-9]+(\.[0-9]*)?|\.[0-9]+", |lex| lex.slice().parse().ok())]
    Number(f64),

    #[regex(r#""[^"]*""#, |lex| lex.slice()[1..lex.slice().len()-1].to_string())]
    #[regex(r"'[^']*'", |lex| lex.slice()[1..lex.slice().len()-1].to_string())]
    Literal(String),

    #[regex(r"[A-Za-z_][A-Za-z0-9_.\-]*", |lex| lex.slice().to_string())]
    Name(String),

    #[token("::")]
    ColonColon,
    #[token(":")]
    Colon,
    #[token("//")]
    SlashSlash,
    #[token("/")]
    Slash,
    #[token("..")]
    DotDot,
    #[token(".")]
    Dot,
    #[token("@")]
    At,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token("|")]
    Pipe,
    #[token("*")]
    Star,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("=")]
    Eq,
    #[token("!=")]
    Ne,
    #[token("<=")]
    Le,
    #[token("<")]
    Lt,
    #[token(">=")]
    Ge,
    #[token(">")]
    Gt,
}

pub fn tokenize(src: &str) -> Result<Vec<Tok>, String> {
    let mut out = Vec::new();
    for result in Tok::lexer(src) {
        match result {
            Ok(tok) => out.push(tok),
            Err(_) => return Err(format!("unexpected character in XPath expression: {src}")),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_simple_path() {
        let toks = tokenize("/a/b[1]").unwrap();
        assert_eq!(
            toks,
            vec![
                Tok::Slash,
                Tok::Name("a".into()),
                Tok::Slash,
                Tok::Name("b".into()),
                Tok::LBracket,
                Tok::Number(1.0),
                Tok::RBracket,
            ]
        );
    }

    #[test]
    fn tokenizes_function_call() {
        let toks = tokenize("count(foo)").unwrap();
        assert_eq!(
            toks,
            vec![Tok::Name("count".into()), Tok::LParen, Tok::Name("foo".into()), Tok::RParen]
        );
    }
}
