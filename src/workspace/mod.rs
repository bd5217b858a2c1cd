//! Workspace snapshot handed to the engine with every build request.
//!
//! The snapshot is fully resolved: every project lists its source roots,
//! required projects and library entries explicitly. The engine never looks
//! anything up outside the snapshot during a build.

mod library;
mod project;
mod snapshot;

pub use library::{BinaryType, Library};
pub use project::{LibraryEntry, Project, RequiredProject, SourceRoot};
pub use snapshot::{SourceStore, WorkspaceSnapshot};
