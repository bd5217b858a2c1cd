//! Change Set Resolver.
//!
//! Turns the flat list of added, modified and removed unit paths delivered with
//! a build request into the units each project must compile first, and drops
//! removed units from their States.
//!
//! The explicit change list is reconciled against the snapshot: units on disk
//! unknown to the State count as added, State units no longer on disk count as
//! removed, and units left pending by an interrupted build are dirty again.

mod dirty;

pub use dirty::DirtySet;

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, trace};

use crate::base::{ProjectId, UnitPath};
use crate::fingerprint::ContentFingerprint;
use crate::graph::{GraphError, ProjectGraph};
use crate::state::{ProjectState, StateMap};
use crate::workspace::{Project, WorkspaceSnapshot};

/// Changed unit paths of one project.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProjectChanges {
    pub added: Vec<UnitPath>,
    pub modified: Vec<UnitPath>,
    pub removed: Vec<UnitPath>,
}

impl ProjectChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }
}

/// Flat change list of a build request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSet {
    projects: BTreeMap<ProjectId, ProjectChanges>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn added(mut self, project: impl Into<ProjectId>, path: impl Into<UnitPath>) -> Self {
        self.entry(project).added.push(path.into());
        self
    }

    pub fn modified(mut self, project: impl Into<ProjectId>, path: impl Into<UnitPath>) -> Self {
        self.entry(project).modified.push(path.into());
        self
    }

    pub fn removed(mut self, project: impl Into<ProjectId>, path: impl Into<UnitPath>) -> Self {
        self.entry(project).removed.push(path.into());
        self
    }

    fn entry(&mut self, project: impl Into<ProjectId>) -> &mut ProjectChanges {
        self.projects.entry(project.into()).or_default()
    }

    pub fn for_project(&self, project: &ProjectId) -> Option<&ProjectChanges> {
        self.projects.get(project)
    }

    pub fn projects(&self) -> impl Iterator<Item = &ProjectId> {
        self.projects.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.values().all(ProjectChanges::is_empty)
    }
}

/// Initial work derived from a change set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedChanges {
    /// Units to compile.
    pub dirty: DirtySet,
    /// Units to drop from their States.
    pub removed: BTreeMap<ProjectId, BTreeSet<UnitPath>>,
}

pub struct ChangeSetResolver<'a> {
    snapshot: &'a WorkspaceSnapshot,
}

impl<'a> ChangeSetResolver<'a> {
    pub fn new(snapshot: &'a WorkspaceSnapshot) -> Self {
        Self { snapshot }
    }

    /// Compute the directly dirty and removed units of every project.
    ///
    /// A modified unit whose text has the fingerprint last compiled is skipped.
    pub fn resolve(
        &self,
        changes: &ChangeSet,
        states: &StateMap,
    ) -> Result<ResolvedChanges, GraphError> {
        if let Some(unknown) = changes
            .projects()
            .find(|p| self.snapshot.project(p).is_none())
        {
            return Err(GraphError::missing(unknown));
        }

        let mut resolved = ResolvedChanges::default();
        for project in self.snapshot.projects() {
            let state = states.get(&project.name);
            let explicit = changes.for_project(&project.name);
            self.resolve_project(project, state, explicit, &mut resolved);
        }

        debug!(
            "[CHANGES] {} dirty units, {} removed units",
            resolved.dirty.len(),
            resolved.removed.values().map(BTreeSet::len).sum::<usize>()
        );
        Ok(resolved)
    }

    fn resolve_project(
        &self,
        project: &Project,
        state: Option<&ProjectState>,
        explicit: Option<&ProjectChanges>,
        resolved: &mut ResolvedChanges,
    ) {
        let name = &project.name;
        let on_disk: BTreeSet<UnitPath> = self.snapshot.source_units(project).into_iter().collect();
        let known = |path: &UnitPath| state.is_some_and(|s| s.has_unit(path));
        let mut removed = BTreeSet::new();

        if let Some(explicit) = explicit {
            for path in explicit.added.iter().chain(&explicit.modified) {
                if !project.owns_unit(path) {
                    trace!("[CHANGES] {} is outside the source roots of {}", path, name);
                    continue;
                }
                if !on_disk.contains(path) {
                    if known(path) {
                        removed.insert(path.clone());
                    }
                    continue;
                }
                if self.is_unchanged(project, state, path) {
                    trace!("[CHANGES] {} in {} has identical content, skipped", path, name);
                    continue;
                }
                resolved.dirty.insert(name, path.clone());
            }
            for path in &explicit.removed {
                if on_disk.contains(path) {
                    resolved.dirty.insert(name, path.clone());
                } else if known(path) {
                    removed.insert(path.clone());
                }
            }
        }

        for path in &on_disk {
            let pending = state.is_some_and(|s| s.pending().contains(path));
            if !known(path) || pending {
                resolved.dirty.insert(name, path.clone());
            }
        }
        if let Some(state) = state {
            for (path, _) in state.units() {
                if !on_disk.contains(path) {
                    removed.insert(path.clone());
                }
            }
        }

        if !removed.is_empty() {
            resolved.removed.insert(name.clone(), removed);
        }
    }

    fn is_unchanged(&self, project: &Project, state: Option<&ProjectState>, path: &UnitPath) -> bool {
        let Some(state) = state else {
            return false;
        };
        if state.pending().contains(path) {
            return false;
        }
        let Some(text) = self.snapshot.sources().get(&project.name, path) else {
            return false;
        };
        state.unit_source(path) == Some(ContentFingerprint::of(text.as_bytes()))
    }

    /// Drop removed units from their States.
    ///
    /// Their types count as structurally changed: every unit holding a link to
    /// one of them, in the owning project or any project depending on it, is
    /// returned dirty and the dangling links are dropped.
    pub fn drop_removed(
        &self,
        graph: &ProjectGraph,
        removed: &BTreeMap<ProjectId, BTreeSet<UnitPath>>,
        states: &mut StateMap,
    ) -> DirtySet {
        let mut dirty = DirtySet::new();
        for (project, units) in removed {
            let Some(state) = states.get_mut(project) else {
                continue;
            };
            let mut types = Vec::new();
            for unit in units {
                let outcome = state.remove_unit(unit);
                dirty.extend(project, outcome.also_dirty);
                types.extend(outcome.types);
            }
            if types.is_empty() {
                continue;
            }
            dirty.extend(project, state.forget_references_to(&types));

            for dependent in graph.transitive_dependents(project) {
                if let Some(other) = states.get_mut(&dependent) {
                    dirty.extend(&dependent, other.forget_references_to(&types));
                }
            }
            debug!(
                "[CHANGES] dropped {} units ({} types) from {}",
                units.len(),
                types.len(),
                project
            );
        }
        dirty
    }
}
