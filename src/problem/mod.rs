//! Problems: stable, reproducible build diagnostics.
//!
//! Every failure inside the engine is converted into a [`Problem`] attached to
//! a resource (a compilation unit or a whole project) before the build moves
//! on. Messages follow fixed formats so tests and tooling can match on them.

mod set;

pub use set::ProblemSet;

use std::sync::Arc;

use crate::base::{LibraryId, ProjectId, TextRange, TypeName, UnitPath};

// ============================================================================
// PROBLEM TYPES
// ============================================================================

/// Severity level of a problem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "persist", serde(rename_all = "lowercase"))]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// Stable problem class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
pub enum ProblemCategory {
    BuildPath,
    Syntax,
    Import,
    Type,
    Member,
    Internal,
    Restriction,
}

impl ProblemCategory {
    /// Numeric category tag.
    pub fn code(&self) -> u32 {
        match self {
            ProblemCategory::BuildPath => 10,
            ProblemCategory::Syntax => 20,
            ProblemCategory::Import => 30,
            ProblemCategory::Type => 40,
            ProblemCategory::Member => 50,
            ProblemCategory::Internal => 60,
            ProblemCategory::Restriction => 150,
        }
    }
}

/// What a problem is about. Each kind maps to a stable code in [`codes`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
pub enum ProblemKind {
    UndefinedType,
    IndirectlyReferencedType,
    ForbiddenReference,
    DiscouragedReference,
    DuplicateType,
    InternalError,
    CycleDetected,
    ProjectNotBuilt,
    IncompleteBuildPath,
    MissingRequiredProject,
    MissingLibrary,
    /// Reported by the compiler collaborator itself.
    Compiler,
}

impl ProblemKind {
    pub fn code(&self) -> &'static str {
        match self {
            ProblemKind::UndefinedType => codes::UNDEFINED_TYPE,
            ProblemKind::IndirectlyReferencedType => codes::INDIRECTLY_REFERENCED_TYPE,
            ProblemKind::ForbiddenReference => codes::FORBIDDEN_REFERENCE,
            ProblemKind::DiscouragedReference => codes::DISCOURAGED_REFERENCE,
            ProblemKind::DuplicateType => codes::DUPLICATE_TYPE,
            ProblemKind::InternalError => codes::INTERNAL_ERROR,
            ProblemKind::CycleDetected => codes::CYCLE_DETECTED,
            ProblemKind::ProjectNotBuilt => codes::PROJECT_NOT_BUILT,
            ProblemKind::IncompleteBuildPath => codes::INCOMPLETE_BUILD_PATH,
            ProblemKind::MissingRequiredProject => codes::MISSING_REQUIRED_PROJECT,
            ProblemKind::MissingLibrary => codes::MISSING_LIBRARY,
            ProblemKind::Compiler => codes::COMPILER,
        }
    }
}

/// The resource a problem is attached to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
pub enum ProblemResource {
    Project(ProjectId),
    Unit { project: ProjectId, path: UnitPath },
}

impl ProblemResource {
    pub fn unit(project: &ProjectId, path: &UnitPath) -> Self {
        ProblemResource::Unit {
            project: project.clone(),
            path: path.clone(),
        }
    }

    pub fn project(&self) -> &ProjectId {
        match self {
            ProblemResource::Project(project) => project,
            ProblemResource::Unit { project, .. } => project,
        }
    }
}

/// A build problem.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
pub struct Problem {
    pub severity: Severity,
    pub category: ProblemCategory,
    pub kind: ProblemKind,
    pub resource: ProblemResource,
    /// Character range, `None` for whole-resource problems.
    pub range: Option<TextRange>,
    pub message: Arc<str>,
}

impl Problem {
    pub fn new(
        severity: Severity,
        category: ProblemCategory,
        kind: ProblemKind,
        resource: ProblemResource,
        message: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            severity,
            category,
            kind,
            resource,
            range: None,
            message: message.into(),
        }
    }

    /// Set the character range.
    pub fn with_range(mut self, range: TextRange) -> Self {
        self.range = Some(range);
        self
    }

    /// Override the severity.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Range start, `-1` for whole-resource problems.
    pub fn start(&self) -> i64 {
        self.range.map_or(-1, |r| i64::from(u32::from(r.start())))
    }

    /// Range end, `-1` for whole-resource problems.
    pub fn end(&self) -> i64 {
        self.range.map_or(-1, |r| i64::from(u32::from(r.end())))
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    // ------------------------------------------------------------------------
    // Unit-level problems
    // ------------------------------------------------------------------------

    pub fn undefined_type(
        project: &ProjectId,
        unit: &UnitPath,
        written: &str,
        range: TextRange,
    ) -> Self {
        Self::new(
            Severity::Error,
            ProblemCategory::Type,
            ProblemKind::UndefinedType,
            ProblemResource::unit(project, unit),
            format!("{written} cannot be resolved to a type"),
        )
        .with_range(range)
    }

    pub fn indirectly_referenced(
        project: &ProjectId,
        unit: &UnitPath,
        missing: &TypeName,
        referencer: &TypeName,
        range: TextRange,
    ) -> Self {
        Self::new(
            Severity::Error,
            ProblemCategory::BuildPath,
            ProblemKind::IndirectlyReferencedType,
            ProblemResource::unit(project, unit),
            format!(
                "The type {missing} cannot be resolved. It is indirectly referenced from required type {referencer}"
            ),
        )
        .with_range(range)
    }

    pub fn restricted_access(
        project: &ProjectId,
        unit: &UnitPath,
        target: &TypeName,
        via: &RestrictionSource,
        discouraged: bool,
        range: TextRange,
    ) -> Self {
        let (prefix, kind) = if discouraged {
            ("Discouraged access", ProblemKind::DiscouragedReference)
        } else {
            ("Access restriction", ProblemKind::ForbiddenReference)
        };
        let severity = if discouraged {
            Severity::Warning
        } else {
            Severity::Error
        };
        Self::new(
            severity,
            ProblemCategory::Restriction,
            kind,
            ProblemResource::unit(project, unit),
            format!(
                "{prefix}: The type '{}' is not API (restriction on {via})",
                target.simple_name()
            ),
        )
        .with_range(range)
    }

    pub fn duplicate_type(project: &ProjectId, unit: &UnitPath, name: &TypeName) -> Self {
        Self::new(
            Severity::Error,
            ProblemCategory::Type,
            ProblemKind::DuplicateType,
            ProblemResource::unit(project, unit),
            format!("The type {name} is already defined"),
        )
    }

    pub fn internal_error(project: &ProjectId, unit: &UnitPath, detail: &str) -> Self {
        Self::new(
            Severity::Error,
            ProblemCategory::Internal,
            ProblemKind::InternalError,
            ProblemResource::unit(project, unit),
            format!("Internal compiler error: {detail}"),
        )
    }

    // ------------------------------------------------------------------------
    // Project-level problems
    // ------------------------------------------------------------------------

    pub fn cycle_detected(project: &ProjectId, paths: &[String], severity: Severity) -> Self {
        Self::new(
            severity,
            ProblemCategory::BuildPath,
            ProblemKind::CycleDetected,
            ProblemResource::Project(project.clone()),
            format!(
                "One or more cycles were detected in the build path of project '{project}'. The paths towards the cycle and cycle are:\n{}",
                paths.join("\n")
            ),
        )
    }

    pub fn project_not_built(project: &ProjectId) -> Self {
        Self::new(
            Severity::Error,
            ProblemCategory::BuildPath,
            ProblemKind::ProjectNotBuilt,
            ProblemResource::Project(project.clone()),
            "The project cannot be built until build path errors are resolved",
        )
    }

    pub fn incomplete_build_path(project: &ProjectId, missing: &TypeName) -> Self {
        Self::new(
            Severity::Error,
            ProblemCategory::BuildPath,
            ProblemKind::IncompleteBuildPath,
            ProblemResource::Project(project.clone()),
            format!(
                "The project was not built since its build path is incomplete. Cannot find the class file for {missing}. Fix the build path then try building this project"
            ),
        )
    }

    pub fn missing_required_project(project: &ProjectId, required: &ProjectId) -> Self {
        Self::new(
            Severity::Error,
            ProblemCategory::BuildPath,
            ProblemKind::MissingRequiredProject,
            ProblemResource::Project(project.clone()),
            format!("Project '{project}' is missing required project: '{required}'"),
        )
    }

    pub fn missing_library(project: &ProjectId, library: &LibraryId) -> Self {
        Self::new(
            Severity::Error,
            ProblemCategory::BuildPath,
            ProblemKind::MissingLibrary,
            ProblemResource::Project(project.clone()),
            format!("Project '{project}' is missing required library: '{library}'"),
        )
    }
}

/// Where an access restriction came from, for restriction messages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RestrictionSource {
    Project(ProjectId),
    Library(LibraryId),
}

impl std::fmt::Display for RestrictionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RestrictionSource::Project(project) => write!(f, "required project '{project}'"),
            RestrictionSource::Library(library) => write!(f, "required library '{library}'"),
        }
    }
}

// ============================================================================
// PROBLEM CODES
// ============================================================================

/// Stable problem codes.
///
/// ## Code Ranges
///
/// - **B0001-B0099**: Build path problems (cycles, missing projects and libraries)
/// - **T0001-T0099**: Type resolution problems
/// - **I0001**: Internal errors
pub mod codes {
    pub const CYCLE_DETECTED: &str = "B0001";
    pub const PROJECT_NOT_BUILT: &str = "B0002";
    pub const INCOMPLETE_BUILD_PATH: &str = "B0003";
    pub const MISSING_REQUIRED_PROJECT: &str = "B0004";
    pub const MISSING_LIBRARY: &str = "B0005";
    pub const INDIRECTLY_REFERENCED_TYPE: &str = "B0006";

    pub const UNDEFINED_TYPE: &str = "T0001";
    pub const FORBIDDEN_REFERENCE: &str = "T0002";
    pub const DISCOURAGED_REFERENCE: &str = "T0003";
    pub const DUPLICATE_TYPE: &str = "T0004";
    /// Problems reported by the compiler collaborator.
    pub const COMPILER: &str = "T0099";

    pub const INTERNAL_ERROR: &str = "I0001";
}
