//! Outline compiler: a small declaration language used to drive the engine.
//!
//! An outline unit declares classes and interfaces with their supertypes and
//! member signatures, nothing more. That is enough to exercise every
//! invalidation path of the build: structural versus cosmetic edits, missing
//! and indirectly referenced types, access restrictions, and duplicates.
//!
//! ```text
//! package p2;
//! import p1.X;
//! public class Y extends X {
//!     field int count;
//!     method X make(String)
//!     uses p3.Z
//! }
//! ```

mod lexer;
mod parser;

pub use lexer::{Lexer, Token, TokenKind, tokenize};
pub use parser::{
    DeclKind, Import, Member, MemberKind, NameRef, OutlineError, OutlineUnit, TypeDecl, parse,
};

use tracing::trace;

use super::{ClasspathView, CompileError, CompileOutput, Compiler, SourceUnit, TypeReference};
use crate::base::TypeName;
use crate::fingerprint::{ContentFingerprint, DefinedType, TypeShape};
use crate::problem::{Problem, ProblemCategory, ProblemKind, ProblemResource, Severity};

/// Names that never refer to a declared type.
const PRIMITIVES: &[&str] = &[
    "boolean", "byte", "char", "short", "int", "long", "float", "double", "void",
];

/// The [`Compiler`] for outline units.
#[derive(Clone, Copy, Debug, Default)]
pub struct OutlineCompiler;

impl OutlineCompiler {
    pub fn new() -> Self {
        Self
    }
}

impl Compiler for OutlineCompiler {
    fn compile(
        &self,
        unit: &SourceUnit<'_>,
        classpath: &ClasspathView<'_>,
    ) -> Result<CompileOutput, CompileError> {
        let (outline, error) = parse(unit.text);
        let mut output = CompileOutput::default();
        if let Some(error) = error {
            trace!("[OUTLINE] syntax error in {}: {}", unit.path, error);
            output.problems.push(
                Problem::new(
                    Severity::Error,
                    ProblemCategory::Syntax,
                    ProblemKind::Compiler,
                    ProblemResource::unit(unit.project, unit.path),
                    error.message,
                )
                .with_range(error.range),
            );
        }

        let scope = Scope {
            package: outline.package.as_deref(),
            imports: &outline.imports,
        };
        for decl in &outline.types {
            let name = scope.qualify_declared(&decl.name);
            let shape = shape_of(decl, &scope, classpath);
            let content = ContentFingerprint::of(&unit.text[decl.span]);
            output
                .defined_types
                .push(DefinedType::new(name.clone(), &shape, content));

            let supertypes = decl.extends.iter().chain(&decl.implements);
            let members = decl.members.iter().flat_map(Member::type_refs);
            for written in supertypes.chain(members) {
                if is_primitive(&written.text) {
                    continue;
                }
                output.references.push(TypeReference::new(
                    name.clone(),
                    written.text.clone(),
                    scope.candidates(&written.text),
                    written.range,
                ));
            }
        }
        Ok(output)
    }
}

fn is_primitive(name: &str) -> bool {
    PRIMITIVES.contains(&name)
}

/// Annotations that change how a type is checked (nullness).
fn is_type_checking_annotation(name: &str) -> bool {
    let simple = name.rsplit('.').next().unwrap_or(name);
    simple.contains("Null")
}

fn shape_of(decl: &TypeDecl, scope: &Scope<'_>, classpath: &ClasspathView<'_>) -> TypeShape {
    let mut shape = TypeShape::new().with_modifier(decl.kind.keyword());
    for modifier in &decl.modifiers {
        shape = shape.with_modifier(modifier.as_str());
    }
    for annotation in decl
        .annotations
        .iter()
        .filter(|a| is_type_checking_annotation(a))
    {
        shape = shape.with_annotation(annotation.as_str());
    }
    for supertype in decl.extends.iter().chain(&decl.implements) {
        shape = shape.with_supertype(scope.resolve(&supertype.text, classpath));
    }
    for member in &decl.members {
        if let Some(signature) = member_signature(member, scope, classpath) {
            shape = shape.with_member(signature);
        }
    }
    shape
}

/// Signature of a member as seen by dependents. `uses` clauses have none.
fn member_signature(
    member: &Member,
    scope: &Scope<'_>,
    classpath: &ClasspathView<'_>,
) -> Option<String> {
    let type_text = |name: &NameRef| {
        let mut text = scope.resolve(&name.text, classpath).as_str().to_string();
        for _ in 0..name.dims {
            text.push_str("[]");
        }
        text
    };

    let mut prefix = String::new();
    for annotation in member
        .annotations
        .iter()
        .filter(|a| is_type_checking_annotation(a))
    {
        prefix.push('@');
        prefix.push_str(annotation);
        prefix.push(' ');
    }
    let mut modifiers: Vec<&str> = member.modifiers.iter().map(String::as_str).collect();
    modifiers.sort_unstable();
    for modifier in modifiers {
        prefix.push_str(modifier);
        prefix.push(' ');
    }

    let name = member.name.as_deref().unwrap_or_default();
    match &member.kind {
        MemberKind::Field { ty } => Some(format!("{prefix}field {} {name}", type_text(ty))),
        MemberKind::Method { ret, params } => {
            let params: Vec<String> = params.iter().map(type_text).collect();
            Some(format!(
                "{prefix}method {} {name}({})",
                type_text(ret),
                params.join(",")
            ))
        }
        MemberKind::Uses { .. } => None,
    }
}

/// Package and imports of the unit being compiled.
struct Scope<'u> {
    package: Option<&'u str>,
    imports: &'u [Import],
}

impl Scope<'_> {
    fn qualify_declared(&self, simple: &str) -> TypeName {
        match self.package {
            Some(package) => TypeName::new(format!("{package}.{simple}")),
            None => TypeName::new(simple),
        }
    }

    /// Qualified names a written name may denote, in lookup order: single-type
    /// imports, the unit's own package, on-demand imports, the default package.
    fn candidates(&self, written: &str) -> Vec<TypeName> {
        if written.contains('.') {
            return vec![TypeName::new(written)];
        }
        let mut candidates: Vec<TypeName> = Vec::new();
        let mut push = |name: TypeName| {
            if !candidates.contains(&name) {
                candidates.push(name);
            }
        };
        for import in self.imports.iter().filter(|i| !i.on_demand) {
            if import.name.rsplit('.').next() == Some(written) {
                push(TypeName::new(&import.name));
            }
        }
        push(self.qualify_declared(written));
        for import in self.imports.iter().filter(|i| i.on_demand) {
            push(TypeName::new(format!("{}.{written}", import.name)));
        }
        push(TypeName::new(written));
        candidates
    }

    /// Best qualified name for a written name: the first candidate on the
    /// classpath, otherwise the first candidate.
    fn resolve(&self, written: &str, classpath: &ClasspathView<'_>) -> TypeName {
        if is_primitive(written) {
            return TypeName::new(written);
        }
        let candidates = self.candidates(written);
        match classpath.resolve_first(&candidates) {
            Some(located) => located.name,
            None => candidates
                .into_iter()
                .next()
                .unwrap_or_else(|| TypeName::new(written)),
        }
    }
}
