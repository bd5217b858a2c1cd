//! Stable descriptions of the cycles a project takes part in or leads into.
//!
//! Each line reads `<prefix>->{A, B}`: `prefix` is the path from the project
//! to the first cycle member reached and the braces hold the cycle members
//! sorted by name. A project inside a cyclic component lists only the cycles
//! it belongs to, all with an empty prefix.
//!
//! Every distinct member set appears once, with its shortest prefix (ties
//! broken lexicographically). Lines are ordered by prefix length, then by
//! member list.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::warn;

use super::ProjectGraph;
use crate::base::ProjectId;

/// Upper bound on DFS steps per project. Densely cyclic graphs have
/// exponentially many elementary cycles.
const MAX_SEARCH_STEPS: usize = 100_000;

/// One path towards a cycle, and the cycle itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CyclePath {
    pub prefix: Vec<ProjectId>,
    pub members: Vec<ProjectId>,
}

impl fmt::Display for CyclePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |ids: &[ProjectId]| {
            ids.iter()
                .map(ProjectId::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        };
        write!(f, "{}->{{{}}}", join(&self.prefix), join(&self.members))
    }
}

/// Cycles reachable from `project`, in display order. Empty when the project
/// neither belongs to nor leads into a cycle.
pub fn cycle_paths(graph: &ProjectGraph, project: &ProjectId) -> Vec<CyclePath> {
    let relevant = projects_reaching_cycles(graph);
    if !relevant.contains(project) {
        return Vec::new();
    }
    // Cycles through a member stay inside its component.
    let component = graph
        .strongly_connected_components()
        .into_iter()
        .find(|members| members.contains(project) && graph.is_cyclic(members));
    let member_of_cycle = component.is_some();
    let scope = match component {
        Some(members) => members.into_iter().collect(),
        None => relevant,
    };

    let mut search = CycleSearch {
        graph,
        relevant: &scope,
        member_of_cycle,
        stack: Vec::new(),
        found: BTreeMap::new(),
        steps: 0,
    };
    search.walk(project);
    if search.steps >= MAX_SEARCH_STEPS {
        warn!(
            "[CYCLES] search from {} stopped after {} steps; cycle list is partial",
            project, MAX_SEARCH_STEPS
        );
    }

    let mut paths: Vec<CyclePath> = search
        .found
        .into_iter()
        .map(|(members, prefix)| CyclePath { prefix, members })
        .collect();
    paths.sort_by(|a, b| {
        a.prefix
            .len()
            .cmp(&b.prefix.len())
            .then_with(|| a.members.cmp(&b.members))
            .then_with(|| a.prefix.cmp(&b.prefix))
    });
    paths
}

/// Members of cyclic components plus every project that reaches one.
fn projects_reaching_cycles(graph: &ProjectGraph) -> BTreeSet<ProjectId> {
    let mut relevant = BTreeSet::new();
    // Components come out dependencies first, so one forward sweep suffices.
    for members in graph.strongly_connected_components() {
        let reaches = graph.is_cyclic(&members)
            || members.iter().any(|member| {
                graph
                    .edges(member)
                    .iter()
                    .any(|edge| relevant.contains(&edge.to))
            });
        if reaches {
            relevant.extend(members);
        }
    }
    relevant
}

struct CycleSearch<'g> {
    graph: &'g ProjectGraph,
    relevant: &'g BTreeSet<ProjectId>,
    /// Only cycles closing on the root are recorded.
    member_of_cycle: bool,
    stack: Vec<&'g ProjectId>,
    /// Sorted cycle members → best prefix seen so far.
    found: BTreeMap<Vec<ProjectId>, Vec<ProjectId>>,
    steps: usize,
}

impl<'g> CycleSearch<'g> {
    fn walk(&mut self, node: &'g ProjectId) {
        if self.steps >= MAX_SEARCH_STEPS {
            return;
        }
        self.steps += 1;
        self.stack.push(node);

        let graph = self.graph;
        for edge in graph.edges(node) {
            let target = &edge.to;
            if !self.relevant.contains(target) {
                continue;
            }
            match self.stack.iter().position(|p| *p == target) {
                Some(start) => self.record(start),
                None => self.walk(target),
            }
        }

        self.stack.pop();
    }

    fn record(&mut self, start: usize) {
        if self.member_of_cycle && start != 0 {
            return;
        }
        let prefix: Vec<ProjectId> = self.stack[..start].iter().map(|p| (*p).clone()).collect();
        let mut members: Vec<ProjectId> =
            self.stack[start..].iter().map(|p| (*p).clone()).collect();
        members.sort();

        let better = match self.found.get(&members) {
            None => true,
            Some(existing) => {
                (prefix.len(), &prefix) < (existing.len(), existing)
            }
        };
        if better {
            self.found.insert(members, prefix);
        }
    }
}
