use tokio_util::sync::CancellationToken;

use crate::base::ProjectId;
use crate::changes::ChangeSet;
use crate::problem::ProblemSet;
use crate::schedule::BuildOrder;
use crate::workspace::WorkspaceSnapshot;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildMode {
    /// Ignore every State and compile all units.
    Full,
    /// Compile what the change set and States call for.
    Incremental,
}

/// One build request.
#[derive(Clone, Debug)]
pub struct BuildRequest {
    pub snapshot: WorkspaceSnapshot,
    pub changes: ChangeSet,
    pub mode: BuildMode,
    /// Explicit project order. Projects left out keep their natural position.
    pub order: Option<Vec<ProjectId>>,
    pub cancel: CancellationToken,
}

impl BuildRequest {
    pub fn full(snapshot: WorkspaceSnapshot) -> Self {
        Self {
            snapshot,
            changes: ChangeSet::new(),
            mode: BuildMode::Full,
            order: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn incremental(snapshot: WorkspaceSnapshot, changes: ChangeSet) -> Self {
        Self {
            snapshot,
            changes,
            mode: BuildMode::Incremental,
            order: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_order<I, P>(mut self, order: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<ProjectId>,
    {
        self.order = Some(order.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildStatus {
    Complete,
    /// Stopped by the cancellation token. Remaining units are pending.
    Cancelled,
    /// A pass bound was reached. Remaining units are pending.
    Incomplete,
}

/// Outcome of one build.
#[derive(Clone, Debug)]
pub struct BuildResult {
    /// Projects and units compiled, in execution order.
    pub order: BuildOrder,
    /// Every problem currently known, grouped by resource.
    pub problems: ProblemSet,
    pub status: BuildStatus,
}

impl BuildResult {
    pub fn is_complete(&self) -> bool {
        self.status == BuildStatus::Complete
    }
}
