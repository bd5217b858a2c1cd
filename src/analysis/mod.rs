//! Structural Dependency Analyzer.
//!
//! Given types whose structural fingerprint changed in one project, finds the
//! units that must be recompiled in the other projects. The transitive
//! closure is reached by the driver: recompiled units whose own types change
//! structurally feed the next round. The analyzer only
//! reads States; the driver applies the result.
//!
//! Every project other than the origin is consulted, not only those reaching
//! the origin over `requires` edges: a unit may depend on a type through the
//! supertype chain of a type it can see (an indirect reference), and such a
//! unit must be rebuilt for its classification to change. Access rules never
//! prune the result, since a restricted reference still binds.

use std::collections::BTreeSet;

use tracing::{debug, trace};

use crate::base::{ProjectId, TypeName, UnitPath};
use crate::changes::DirtySet;
use crate::graph::ProjectGraph;
use crate::state::{ProjectState, StateMap};

pub struct StructuralDependencyAnalyzer<'a> {
    graph: &'a ProjectGraph,
    states: &'a StateMap,
}

impl<'a> StructuralDependencyAnalyzer<'a> {
    pub fn new(graph: &'a ProjectGraph, states: &'a StateMap) -> Self {
        Self { graph, states }
    }

    /// Units in the origin project that reference one of `changed`.
    pub fn local_dependents(state: &ProjectState, changed: &[TypeName]) -> BTreeSet<UnitPath> {
        changed
            .iter()
            .flat_map(|name| state.dependent_units(name))
            .collect()
    }

    /// Units outside `origin` holding a reference to one of `changed`.
    pub fn affected_by(&self, origin: &ProjectId, changed: &[TypeName]) -> DirtySet {
        let mut dirty = DirtySet::new();
        if changed.is_empty() {
            return dirty;
        }
        for (project, state) in self.projects_except(origin) {
            let units = Self::local_dependents(state, changed);
            if !units.is_empty() {
                trace!(
                    "[ANALYSIS] {} units of {} depend on changes in {}",
                    units.len(),
                    project,
                    origin
                );
            }
            dirty.extend(project, units);
        }
        debug!(
            "[ANALYSIS] {} structural changes in {} dirty {} units elsewhere",
            changed.len(),
            origin,
            dirty.len()
        );
        dirty
    }

    fn projects_except<'s>(
        &'s self,
        origin: &'s ProjectId,
    ) -> impl Iterator<Item = (&'s ProjectId, &'s ProjectState)> + 's {
        self.states
            .iter()
            .filter(move |(project, _)| *project != origin && self.graph.contains(project))
    }
}
