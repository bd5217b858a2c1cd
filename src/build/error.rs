use thiserror::Error;

use crate::base::ProjectId;
use crate::graph::GraphError;

#[cfg(feature = "persist")]
use crate::state::PersistError;

/// Errors returned from build entry points.
///
/// Everything that goes wrong inside a project is reported as a problem
/// instead; these only cover requests the engine cannot act on at all.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Project '{0}' is not part of the workspace")]
    MissingProject(ProjectId),

    #[error("Project '{0}' is defined more than once")]
    DuplicateProject(ProjectId),

    #[error(transparent)]
    Graph(GraphError),

    #[cfg(feature = "persist")]
    #[error("failed to persist build state: {0}")]
    Persist(#[from] PersistError),
}

impl From<GraphError> for BuildError {
    fn from(error: GraphError) -> Self {
        match error {
            GraphError::MissingProject(project) => BuildError::MissingProject(project),
            GraphError::DuplicateProject(project) => BuildError::DuplicateProject(project),
            other => BuildError::Graph(other),
        }
    }
}
