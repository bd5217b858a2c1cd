//! Foundation types for the build engine.
//!
//! This module provides the identifiers used throughout the engine:
//! - [`ProjectId`] - Unique project name within a workspace
//! - [`TypeName`] - Fully qualified type name (`p1.X`)
//! - [`UnitPath`] - Project-relative path of a compilation unit (`src/p1/X.java`)
//! - [`LibraryId`] - External library identifier
//! - [`TextRange`], [`TextSize`] - Character ranges attached to problems
//!
//! This module has NO dependencies on other engine modules.

mod names;

pub use names::{LibraryId, ProjectId, TypeName, UnitPath};

// Re-export text-size types for convenience
pub use text_size::{TextRange, TextSize};
