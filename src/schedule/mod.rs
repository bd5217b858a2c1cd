//! Build Order Scheduler.
//!
//! Plans project visits as a Kahn-style topological sort over the condensation
//! of the project graph (one node per strongly connected component). Among
//! ready components the one whose best-ranked member comes first wins, where a
//! project's rank is its position in the explicit override order, or after
//! every listed project by name when the override omits it.
//!
//! The plan is static. Re-passes over cyclic components are decided by the
//! build driver, bounded by [`ScheduledComponent::max_passes`].

mod order;

pub use order::{BuildOrder, BuildStep};

use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use tracing::debug;

use crate::base::ProjectId;
use crate::graph::{GraphError, ProjectGraph};

/// A strongly connected component scheduled as one unit of work.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduledComponent {
    /// Members in visiting order.
    pub members: Vec<ProjectId>,
    pub cyclic: bool,
}

impl ScheduledComponent {
    /// Visits allowed per member: one for acyclic components, `k + 1` for a
    /// cycle of `k` projects.
    pub fn max_passes(&self) -> usize {
        if self.cyclic {
            self.members.len() + 1
        } else {
            1
        }
    }
}

/// Component visiting order for one build.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildPlan {
    pub components: Vec<ScheduledComponent>,
}

impl BuildPlan {
    /// Projects in first-visit order.
    pub fn projects(&self) -> impl Iterator<Item = &ProjectId> {
        self.components.iter().flat_map(|c| c.members.iter())
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

type Rank = (usize, ProjectId);

pub struct BuildOrderScheduler<'g> {
    graph: &'g ProjectGraph,
    override_order: Vec<ProjectId>,
}

impl<'g> BuildOrderScheduler<'g> {
    pub fn new(graph: &'g ProjectGraph) -> Self {
        Self {
            graph,
            override_order: Vec::new(),
        }
    }

    /// Prefer this project order wherever the graph allows it.
    pub fn with_override(mut self, order: &[ProjectId]) -> Self {
        self.override_order = order.to_vec();
        self
    }

    pub fn plan(&self) -> Result<BuildPlan, GraphError> {
        if let Some(unknown) = self.override_order.iter().find(|p| !self.graph.contains(p)) {
            return Err(GraphError::missing(unknown));
        }

        let components = self.graph.strongly_connected_components();
        let mut component_of: FxHashMap<&ProjectId, usize> = FxHashMap::default();
        for (idx, members) in components.iter().enumerate() {
            for member in members {
                component_of.insert(member, idx);
            }
        }

        // Edges of the condensation: dependency component -> dependent component.
        let mut dependents: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); components.len()];
        let mut indegree = vec![0usize; components.len()];
        for (idx, members) in components.iter().enumerate() {
            let mut requires = BTreeSet::new();
            for member in members {
                for edge in self.graph.edges(member) {
                    match component_of.get(&edge.to) {
                        Some(&dep) if dep != idx => {
                            requires.insert(dep);
                        }
                        _ => {}
                    }
                }
            }
            indegree[idx] = requires.len();
            for dep in requires {
                dependents[dep].insert(idx);
            }
        }

        let ranks: Vec<Rank> = components
            .iter()
            .map(|members| {
                members
                    .iter()
                    .map(|m| self.rank(m))
                    .min()
                    .unwrap_or((usize::MAX, ProjectId::new("")))
            })
            .collect();

        let mut ready: BTreeSet<(Rank, usize)> = indegree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree == 0)
            .map(|(idx, _)| (ranks[idx].clone(), idx))
            .collect();

        let mut plan = BuildPlan::default();
        while let Some(next) = ready.pop_first() {
            let idx = next.1;
            let mut members = components[idx].clone();
            members.sort_by_cached_key(|m| self.rank(m));
            let cyclic = self.graph.is_cyclic(&members);
            plan.components.push(ScheduledComponent { members, cyclic });

            for &dependent in &dependents[idx] {
                indegree[dependent] -= 1;
                if indegree[dependent] == 0 {
                    ready.insert((ranks[dependent].clone(), dependent));
                }
            }
        }

        debug!(
            "[SCHEDULE] planned {} components for {} projects",
            plan.len(),
            self.graph.len()
        );
        Ok(plan)
    }

    fn rank(&self, project: &ProjectId) -> Rank {
        match self.override_order.iter().position(|p| p == project) {
            Some(idx) => (idx, project.clone()),
            None => (self.override_order.len(), project.clone()),
        }
    }
}
