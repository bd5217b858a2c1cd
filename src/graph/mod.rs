//! Project Dependency Graph.
//!
//! Projects are nodes; `requires` edges carry access rules and an exported
//! flag. The graph answers closure queries for the classpath and the
//! invalidation closure, decomposes itself into strongly connected
//! components, and describes cycles in a stable textual form.

mod cycles;
mod dependency;

pub use cycles::{CyclePath, cycle_paths};
pub use dependency::{ClosureEntry, Edge, ProjectGraph};

use thiserror::Error;

use crate::base::ProjectId;

/// Errors raised while building or ordering the project graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// An operation named a project that is not in the graph.
    #[error("Project '{0}' is not part of the workspace")]
    MissingProject(ProjectId),

    /// Two projects share one identity.
    #[error("Project '{0}' is defined more than once")]
    DuplicateProject(ProjectId),

    /// A strict topological order was requested but the graph has a cycle.
    #[error("Projects form a cycle: {}", join_members(.members))]
    Cycle { members: Vec<ProjectId> },
}

impl GraphError {
    pub fn missing(project: &ProjectId) -> Self {
        Self::MissingProject(project.clone())
    }
}

fn join_members(members: &[ProjectId]) -> String {
    members
        .iter()
        .map(ProjectId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
