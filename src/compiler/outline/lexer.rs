//! Logos-based lexer for the outline declaration language.

use logos::Logos;

use crate::base::{TextRange, TextSize};

/// A token with its kind, text, and range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub range: TextRange,
}

/// Lexer wrapping the logos-generated tokenizer. Trivia is skipped.
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, TokenKind>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            inner: TokenKind::lexer(input),
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let kind = self.inner.next()?.unwrap_or(TokenKind::Error);
        let span = self.inner.span();
        let range = TextRange::new(offset(span.start), offset(span.end));
        Some(Token {
            kind,
            text: self.inner.slice(),
            range,
        })
    }
}

fn offset(value: usize) -> TextSize {
    TextSize::new(u32::try_from(value).unwrap_or(u32::MAX))
}

/// Tokenize an entire string into a Vec
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    Lexer::new(input).collect()
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*[^*]*\*+([^/*][^*]*\*+)*/")]
pub enum TokenKind {
    // =========================================================================
    // KEYWORDS
    // =========================================================================
    #[token("package")]
    Package,

    #[token("import")]
    Import,

    #[token("class")]
    Class,

    #[token("interface")]
    Interface,

    #[token("extends")]
    Extends,

    #[token("implements")]
    Implements,

    #[token("field")]
    Field,

    #[token("method")]
    Method,

    #[token("uses")]
    Uses,

    #[token("public")]
    #[token("protected")]
    #[token("private")]
    #[token("static")]
    #[token("final")]
    #[token("abstract")]
    Modifier,

    // =========================================================================
    // NAMES
    // =========================================================================
    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*")]
    Ident,

    // =========================================================================
    // PUNCTUATION
    // =========================================================================
    #[token("@")]
    At,

    #[token(".")]
    Dot,

    #[token("*")]
    Star,

    #[token(",")]
    Comma,

    #[token(";")]
    Semicolon,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    /// Anything the lexer does not recognise.
    Error,
}
