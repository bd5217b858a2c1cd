use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::trace;

use super::GraphError;
use crate::access::AccessRuleSet;
use crate::base::ProjectId;
use crate::workspace::WorkspaceSnapshot;

/// An outgoing `requires` edge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edge {
    pub to: ProjectId,
    pub rules: AccessRuleSet,
    pub exported: bool,
}

/// One project entry on a resolved classpath.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClosureEntry {
    pub project: ProjectId,
    /// Rules of every edge on the path from the resolving project, outermost first.
    pub rules: AccessRuleSet,
}

/// Directed graph of projects.
///
/// Nodes iterate in name order and edges in declaration order, so every query
/// is a pure function of the project definitions.
#[derive(Clone, Debug, Default)]
pub struct ProjectGraph {
    edges: BTreeMap<ProjectId, Vec<Edge>>,
    /// `requires` edges pointing at projects absent from the workspace.
    missing: BTreeMap<ProjectId, Vec<ProjectId>>,
}

impl ProjectGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph for a workspace snapshot.
    ///
    /// Edges to unknown projects are kept aside as missing requirements rather
    /// than rejected; the build reports them as project-level problems.
    pub fn from_workspace(snapshot: &WorkspaceSnapshot) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        for project in snapshot.projects() {
            graph.add_project(project.name.clone())?;
        }
        for project in snapshot.projects() {
            for required in &project.requires {
                if required.project == project.name {
                    trace!("[GRAPH] ignoring self edge on {}", project.name);
                    continue;
                }
                if !graph.contains(&required.project) {
                    graph
                        .missing
                        .entry(project.name.clone())
                        .or_default()
                        .push(required.project.clone());
                    continue;
                }
                graph.add_edge(
                    &project.name,
                    &required.project,
                    required.rules.clone(),
                    required.exported,
                )?;
            }
        }
        Ok(graph)
    }

    pub fn add_project(&mut self, project: ProjectId) -> Result<(), GraphError> {
        if self.edges.contains_key(&project) {
            return Err(GraphError::DuplicateProject(project));
        }
        self.edges.insert(project, Vec::new());
        Ok(())
    }

    /// Add `from requires to`, replacing an existing edge between the two.
    pub fn add_edge(
        &mut self,
        from: &ProjectId,
        to: &ProjectId,
        rules: AccessRuleSet,
        exported: bool,
    ) -> Result<(), GraphError> {
        if !self.contains(to) {
            return Err(GraphError::missing(to));
        }
        let edges = self
            .edges
            .get_mut(from)
            .ok_or_else(|| GraphError::missing(from))?;
        let edge = Edge {
            to: to.clone(),
            rules,
            exported,
        };
        match edges.iter_mut().find(|e| &e.to == to) {
            Some(existing) => *existing = edge,
            None => edges.push(edge),
        }
        Ok(())
    }

    /// Remove `from requires to`. Returns whether an edge existed.
    pub fn remove_edge(&mut self, from: &ProjectId, to: &ProjectId) -> bool {
        let Some(edges) = self.edges.get_mut(from) else {
            return false;
        };
        let before = edges.len();
        edges.retain(|e| &e.to != to);
        edges.len() != before
    }

    pub fn contains(&self, project: &ProjectId) -> bool {
        self.edges.contains_key(project)
    }

    /// Projects in name order.
    pub fn projects(&self) -> impl Iterator<Item = &ProjectId> {
        self.edges.keys()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn edges(&self, project: &ProjectId) -> &[Edge] {
        self.edges.get(project).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn edge(&self, from: &ProjectId, to: &ProjectId) -> Option<&Edge> {
        self.edges(from).iter().find(|e| &e.to == to)
    }

    /// Required projects of `project`, in declaration order.
    pub fn direct_dependencies(&self, project: &ProjectId) -> Vec<&ProjectId> {
        self.edges(project).iter().map(|e| &e.to).collect()
    }

    /// Required projects that are not part of the workspace.
    pub fn missing_requirements(&self, project: &ProjectId) -> &[ProjectId] {
        self.missing
            .get(project)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every project reachable from `project` along `requires` edges.
    pub fn transitive_dependencies(&self, project: &ProjectId) -> BTreeSet<ProjectId> {
        self.reach(project, |p| self.direct_dependencies(p).into_iter().cloned().collect())
    }

    /// Every project that can reach `project` along `requires` edges.
    pub fn transitive_dependents(&self, project: &ProjectId) -> BTreeSet<ProjectId> {
        let reverse = self.reverse_edges();
        self.reach(project, |p| reverse.get(p).cloned().unwrap_or_default())
    }

    fn reverse_edges(&self) -> FxHashMap<&ProjectId, Vec<ProjectId>> {
        let mut reverse: FxHashMap<&ProjectId, Vec<ProjectId>> = FxHashMap::default();
        for (from, edges) in &self.edges {
            for edge in edges {
                reverse.entry(&edge.to).or_default().push(from.clone());
            }
        }
        reverse
    }

    fn reach<F>(&self, start: &ProjectId, next: F) -> BTreeSet<ProjectId>
    where
        F: Fn(&ProjectId) -> Vec<ProjectId>,
    {
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::from([start.clone()]);
        while let Some(current) = queue.pop_front() {
            for neighbour in next(&current) {
                if seen.insert(neighbour.clone()) {
                    queue.push_back(neighbour);
                }
            }
        }
        seen.remove(start);
        seen
    }

    /// Projects visible on the classpath of `project`, in lookup order.
    ///
    /// Each direct edge in declaration order, each followed depth-first by the
    /// exported edges of its target. The first path reaching a project wins;
    /// access rules concatenate along that path. `project` itself is not
    /// included.
    pub fn required_closure(&self, project: &ProjectId) -> Vec<ClosureEntry> {
        let mut entries = Vec::new();
        let mut seen = BTreeSet::from([project.clone()]);
        for edge in self.edges(project) {
            self.push_closure(edge, &AccessRuleSet::default(), &mut seen, &mut entries);
        }
        entries
    }

    fn push_closure(
        &self,
        edge: &Edge,
        outer: &AccessRuleSet,
        seen: &mut BTreeSet<ProjectId>,
        entries: &mut Vec<ClosureEntry>,
    ) {
        if !seen.insert(edge.to.clone()) {
            return;
        }
        let rules = outer.concat(&edge.rules);
        entries.push(ClosureEntry {
            project: edge.to.clone(),
            rules: rules.clone(),
        });
        for inner in self.edges(&edge.to).iter().filter(|e| e.exported) {
            self.push_closure(inner, &rules, seen, entries);
        }
    }

    /// Strongly connected components, dependencies before dependents.
    ///
    /// Members of each component are sorted by name. A project in no cycle is
    /// its own singleton component.
    pub fn strongly_connected_components(&self) -> Vec<Vec<ProjectId>> {
        let mut tarjan = Tarjan::new(self);
        for project in self.edges.keys() {
            if !tarjan.index.contains_key(project) {
                tarjan.visit(project);
            }
        }
        tarjan.components
    }

    /// Whether `members` (one component) needs cycle handling.
    pub fn is_cyclic(&self, members: &[ProjectId]) -> bool {
        match members {
            [] => false,
            [single] => self.edge(single, single).is_some(),
            _ => true,
        }
    }

    /// Strict topological order, dependencies first.
    pub fn acyclic_order(&self) -> Result<Vec<ProjectId>, GraphError> {
        let components = self.strongly_connected_components();
        let mut order = Vec::with_capacity(self.edges.len());
        for members in components {
            if self.is_cyclic(&members) {
                return Err(GraphError::Cycle { members });
            }
            order.extend(members);
        }
        Ok(order)
    }
}

struct Tarjan<'g> {
    graph: &'g ProjectGraph,
    next_index: usize,
    index: FxHashMap<&'g ProjectId, usize>,
    lowlink: FxHashMap<&'g ProjectId, usize>,
    stack: Vec<&'g ProjectId>,
    on_stack: BTreeSet<&'g ProjectId>,
    components: Vec<Vec<ProjectId>>,
}

impl<'g> Tarjan<'g> {
    fn new(graph: &'g ProjectGraph) -> Self {
        Self {
            graph,
            next_index: 0,
            index: FxHashMap::default(),
            lowlink: FxHashMap::default(),
            stack: Vec::new(),
            on_stack: BTreeSet::new(),
            components: Vec::new(),
        }
    }

    fn visit(&mut self, node: &'g ProjectId) {
        self.index.insert(node, self.next_index);
        self.lowlink.insert(node, self.next_index);
        self.next_index += 1;
        self.stack.push(node);
        self.on_stack.insert(node);

        let graph = self.graph;
        for edge in graph.edges(node) {
            let target = &edge.to;
            if !self.index.contains_key(target) {
                self.visit(target);
                let low = self.lowlink[node].min(self.lowlink[target]);
                self.lowlink.insert(node, low);
            } else if self.on_stack.contains(target) {
                let low = self.lowlink[node].min(self.index[target]);
                self.lowlink.insert(node, low);
            }
        }

        if self.lowlink[node] == self.index[node] {
            let mut members = Vec::new();
            while let Some(member) = self.stack.pop() {
                self.on_stack.remove(member);
                members.push(member.clone());
                if member == node {
                    break;
                }
            }
            members.sort();
            self.components.push(members);
        }
    }
}
