//! Recursive-descent parser for outline units.
//!
//! ```text
//! unit      := [package qname] (import qname ['.' '*'])* type*
//! type      := annotation* modifier* (class | interface) ident
//!              [extends typeref (',' typeref)*]
//!              [implements typeref (',' typeref)*]
//!              '{' member* '}'
//! member    := annotation* modifier* ( field typeref ident
//!                                    | method typeref ident '(' [typeref (',' typeref)*] ')'
//!                                    | uses typeref )
//! typeref   := qname ('[' ']')*
//! ```
//!
//! Semicolons are allowed anywhere a declaration may start. Parsing stops at
//! the first syntax error; declarations parsed before it are kept.

use thiserror::Error;

use super::lexer::{Token, TokenKind, tokenize};
use crate::base::{TextRange, TextSize};

/// A syntax error with its location.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct OutlineError {
    pub message: String,
    pub range: TextRange,
}

impl OutlineError {
    fn unexpected(token: &Token<'_>, expected: &str) -> Self {
        let message = if token.kind == TokenKind::Error {
            format!("Syntax error on token \"{}\", invalid character", token.text)
        } else {
            format!(
                "Syntax error on token \"{}\", {expected} expected",
                token.text
            )
        };
        Self {
            message,
            range: token.range,
        }
    }

    fn eof(at: TextSize, expected: &str) -> Self {
        Self {
            message: format!("Syntax error, insert \"{expected}\" to complete the unit"),
            range: TextRange::empty(at),
        }
    }
}

/// A dotted name occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRef {
    pub text: String,
    pub range: TextRange,
    /// Array dimensions written after the name.
    pub dims: usize,
}

impl NameRef {
    /// Written form including array brackets, used in member signatures.
    pub fn signature(&self) -> String {
        let mut text = self.text.clone();
        for _ in 0..self.dims {
            text.push_str("[]");
        }
        text
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub name: String,
    pub on_demand: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Class,
    Interface,
}

impl DeclKind {
    pub fn keyword(self) -> &'static str {
        match self {
            DeclKind::Class => "class",
            DeclKind::Interface => "interface",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberKind {
    Field { ty: NameRef },
    Method { ret: NameRef, params: Vec<NameRef> },
    Uses { ty: NameRef },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub annotations: Vec<String>,
    pub modifiers: Vec<String>,
    pub name: Option<String>,
    pub kind: MemberKind,
}

impl Member {
    /// Every type name this member mentions.
    pub fn type_refs(&self) -> Vec<&NameRef> {
        match &self.kind {
            MemberKind::Field { ty } | MemberKind::Uses { ty } => vec![ty],
            MemberKind::Method { ret, params } => std::iter::once(ret).chain(params).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    pub kind: DeclKind,
    pub name: String,
    pub annotations: Vec<String>,
    pub modifiers: Vec<String>,
    pub extends: Vec<NameRef>,
    pub implements: Vec<NameRef>,
    pub members: Vec<Member>,
    /// From the first annotation or modifier to the closing brace.
    pub span: TextRange,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutlineUnit {
    pub package: Option<String>,
    pub imports: Vec<Import>,
    pub types: Vec<TypeDecl>,
}

/// Parse a unit. Returns what was parsed and the first syntax error, if any.
pub fn parse(text: &str) -> (OutlineUnit, Option<OutlineError>) {
    let tokens = tokenize(text);
    let end = TextSize::new(u32::try_from(text.len()).unwrap_or(u32::MAX));
    let mut parser = Parser {
        tokens,
        pos: 0,
        end,
    };
    let mut unit = OutlineUnit::default();
    let error = parser.unit(&mut unit).err();
    (unit, error)
}

struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
    end: TextSize,
}

impl<'a> Parser<'a> {
    // ========================================================================
    // CURSOR
    // ========================================================================

    fn peek(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek().is_some_and(|t| t.kind == kind)
    }

    fn bump(&mut self) -> Option<Token<'a>> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token<'a>, OutlineError> {
        match self.peek() {
            Some(token) if token.kind == kind => {}
            Some(token) => return Err(OutlineError::unexpected(token, expected)),
            None => return Err(OutlineError::eof(self.end, expected)),
        }
        let token = self.tokens[self.pos].clone();
        self.pos += 1;
        Ok(token)
    }

    fn skip_semicolons(&mut self) {
        while self.eat(TokenKind::Semicolon) {}
    }

    // ========================================================================
    // GRAMMAR
    // ========================================================================

    fn unit(&mut self, unit: &mut OutlineUnit) -> Result<(), OutlineError> {
        self.skip_semicolons();
        if self.eat(TokenKind::Package) {
            unit.package = Some(self.qualified_name()?.text);
        }
        loop {
            self.skip_semicolons();
            if !self.eat(TokenKind::Import) {
                break;
            }
            unit.imports.push(self.import()?);
        }
        loop {
            self.skip_semicolons();
            if self.peek().is_none() {
                return Ok(());
            }
            let decl = self.type_decl()?;
            unit.types.push(decl);
        }
    }

    fn import(&mut self) -> Result<Import, OutlineError> {
        let first = self.expect(TokenKind::Ident, "Identifier")?;
        let mut name = first.text.to_string();
        while self.eat(TokenKind::Dot) {
            if self.eat(TokenKind::Star) {
                return Ok(Import {
                    name,
                    on_demand: true,
                });
            }
            let part = self.expect(TokenKind::Ident, "Identifier")?;
            name.push('.');
            name.push_str(part.text);
        }
        Ok(Import {
            name,
            on_demand: false,
        })
    }

    fn qualified_name(&mut self) -> Result<NameRef, OutlineError> {
        let first = self.expect(TokenKind::Ident, "Identifier")?;
        let mut text = first.text.to_string();
        let mut range = first.range;
        while self.eat(TokenKind::Dot) {
            let part = self.expect(TokenKind::Ident, "Identifier")?;
            text.push('.');
            text.push_str(part.text);
            range = range.cover(part.range);
        }
        Ok(NameRef {
            text,
            range,
            dims: 0,
        })
    }

    fn type_ref(&mut self) -> Result<NameRef, OutlineError> {
        let mut name = self.qualified_name()?;
        while self.eat(TokenKind::LBracket) {
            self.expect(TokenKind::RBracket, "]")?;
            name.dims += 1;
        }
        Ok(name)
    }

    fn type_list(&mut self) -> Result<Vec<NameRef>, OutlineError> {
        let mut list = vec![self.type_ref()?];
        while self.eat(TokenKind::Comma) {
            list.push(self.type_ref()?);
        }
        Ok(list)
    }

    /// Annotations and modifiers preceding a declaration.
    fn prefix(&mut self) -> Result<(Vec<String>, Vec<String>), OutlineError> {
        let mut annotations = Vec::new();
        let mut modifiers = Vec::new();
        loop {
            if self.eat(TokenKind::At) {
                annotations.push(self.qualified_name()?.text);
            } else if self.at(TokenKind::Modifier) {
                if let Some(token) = self.bump() {
                    modifiers.push(token.text.to_string());
                }
            } else {
                return Ok((annotations, modifiers));
            }
        }
    }

    fn type_decl(&mut self) -> Result<TypeDecl, OutlineError> {
        let start = self.peek().map_or(self.end, |t| t.range.start());
        let (annotations, modifiers) = self.prefix()?;
        let kind = match self.peek() {
            Some(token) if token.kind == TokenKind::Class => DeclKind::Class,
            Some(token) if token.kind == TokenKind::Interface => DeclKind::Interface,
            Some(token) => return Err(OutlineError::unexpected(token, "class or interface")),
            None => return Err(OutlineError::eof(self.end, "class")),
        };
        self.pos += 1;
        let name = self.expect(TokenKind::Ident, "Identifier")?.text.to_string();

        let mut extends = Vec::new();
        let mut implements = Vec::new();
        if self.eat(TokenKind::Extends) {
            extends = self.type_list()?;
        }
        if self.eat(TokenKind::Implements) {
            implements = self.type_list()?;
        }

        self.expect(TokenKind::LBrace, "{")?;
        let mut members = Vec::new();
        loop {
            self.skip_semicolons();
            if self.at(TokenKind::RBrace) {
                break;
            }
            members.push(self.member()?);
        }
        let close = self.expect(TokenKind::RBrace, "}")?;

        Ok(TypeDecl {
            kind,
            name,
            annotations,
            modifiers,
            extends,
            implements,
            members,
            span: TextRange::new(start, close.range.end()),
        })
    }

    fn member(&mut self) -> Result<Member, OutlineError> {
        let (annotations, modifiers) = self.prefix()?;
        let Some(token) = self.bump() else {
            return Err(OutlineError::eof(self.end, "}"));
        };
        let (name, kind) = match token.kind {
            TokenKind::Field => {
                let ty = self.type_ref()?;
                let name = self.expect(TokenKind::Ident, "Identifier")?;
                (Some(name.text.to_string()), MemberKind::Field { ty })
            }
            TokenKind::Method => {
                let ret = self.type_ref()?;
                let name = self.expect(TokenKind::Ident, "Identifier")?;
                self.expect(TokenKind::LParen, "(")?;
                let params = if self.at(TokenKind::RParen) {
                    Vec::new()
                } else {
                    self.type_list()?
                };
                self.expect(TokenKind::RParen, ")")?;
                (Some(name.text.to_string()), MemberKind::Method { ret, params })
            }
            TokenKind::Uses => (None, MemberKind::Uses { ty: self.type_ref()? }),
            _ => return Err(OutlineError::unexpected(&token, "field, method or uses")),
        };
        Ok(Member {
            annotations,
            modifiers,
            name,
            kind,
        })
    }
}
