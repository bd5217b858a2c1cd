//! # cascade-build
//!
//! Incremental build engine for a graph of interdependent source projects:
//! persisted per-project state, structural change detection, cross-project
//! invalidation and cycle-aware scheduling.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! build       → Incremental Build Driver, options, persistence
//!   ↓
//! analysis    → Structural Dependency Analyzer (cross-project dirtying)
//!   ↓
//! compiler    → Compiler interface, classpath view, outline compiler
//!   ↓
//! changes     → Change Set Resolver, dirty sets
//!   ↓
//! state       → Project State, reverse reference index
//!   ↓
//! schedule    → Build Order Scheduler, BuildOrder trace
//!   ↓
//! graph       → Project Dependency Graph, SCCs, cycle descriptions
//!   ↓
//! workspace   → Projects, libraries, source texts
//!   ↓
//! access      → Access rules
//!   ↓
//! problem     → Problems, severities, stable codes
//!   ↓
//! fingerprint → Structural and content fingerprints
//!   ↓
//! base        → Identifiers, TextRange
//! ```

// ============================================================================
// MODULES (dependency order: base → fingerprint → ... → build)
// ============================================================================

/// Foundation types: ProjectId, TypeName, UnitPath, TextRange
pub mod base;

/// Fingerprint Model: structural versus content signatures
pub mod fingerprint;

/// Problems and the final problem set
pub mod problem;

/// Access rules on project and library edges
pub mod access;

/// Workspace snapshot: projects, libraries, sources
pub mod workspace;

/// Project Dependency Graph
pub mod graph;

/// Build Order Scheduler
pub mod schedule;

/// Project State
pub mod state;

/// Change Set Resolver
pub mod changes;

/// Compiler collaborator interface and the outline compiler
pub mod compiler;

/// Structural Dependency Analyzer
pub mod analysis;

/// Incremental Build Driver
pub mod build;

// Re-export the build entry points
pub use build::{
    BuildContext, BuildError, BuildMode, BuildOptions, BuildRequest, BuildResult, BuildStatus,
    Builder,
};

// Re-export foundation types
pub use base::{LibraryId, ProjectId, TextRange, TextSize, TypeName, UnitPath};
