//! Compiler collaborator interface.
//!
//! The engine hands one compilation unit at a time to a [`Compiler`] together
//! with a [`ClasspathView`] of everything the unit's project can see. The
//! compiler reports the types the unit defines, the type references it makes
//! (as candidate names, unresolved) and its own problems. Name resolution and
//! the missing / indirect / restricted classification happen in the engine.

mod classpath;
pub mod outline;

pub use classpath::{ClasspathEntry, ClasspathView, Located, Resolution, TypeOwner};
pub use outline::OutlineCompiler;

use thiserror::Error;

use crate::base::{ProjectId, TextRange, TypeName, UnitPath};
use crate::fingerprint::DefinedType;
use crate::problem::Problem;

/// A compilation unit handed to the compiler.
#[derive(Clone, Copy, Debug)]
pub struct SourceUnit<'a> {
    pub project: &'a ProjectId,
    pub path: &'a UnitPath,
    pub text: &'a str,
}

/// One type reference made by a compiled unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeReference {
    /// Type containing the reference.
    pub from: TypeName,
    /// The name as written in source.
    pub written: String,
    /// Qualified names to try, in lookup order.
    pub candidates: Vec<TypeName>,
    pub range: TextRange,
}

impl TypeReference {
    pub fn new(
        from: impl Into<TypeName>,
        written: impl Into<String>,
        candidates: Vec<TypeName>,
        range: TextRange,
    ) -> Self {
        Self {
            from: from.into(),
            written: written.into(),
            candidates,
            range,
        }
    }
}

/// Everything the compiler reports for one unit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompileOutput {
    pub defined_types: Vec<DefinedType>,
    pub references: Vec<TypeReference>,
    pub problems: Vec<Problem>,
}

/// A compiler failure. Converted into an internal-error problem on the unit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("{0}")]
    Failed(String),

    #[error("unsupported compilation unit: {0}")]
    Unsupported(String),
}

impl CompileError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// The language compiler invoked by the build driver.
pub trait Compiler: Send + Sync {
    fn compile(
        &self,
        unit: &SourceUnit<'_>,
        classpath: &ClasspathView<'_>,
    ) -> Result<CompileOutput, CompileError>;
}

impl<C: Compiler + ?Sized> Compiler for std::sync::Arc<C> {
    fn compile(
        &self,
        unit: &SourceUnit<'_>,
        classpath: &ClasspathView<'_>,
    ) -> Result<CompileOutput, CompileError> {
        (**self).compile(unit, classpath)
    }
}
