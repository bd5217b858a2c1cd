//! Problems grouped by resource.

use std::collections::BTreeMap;

use super::{Problem, ProblemResource, Severity};
use crate::base::{ProjectId, UnitPath};

/// Final problem set of a build, grouped by resource in a deterministic order
/// (project-level problems sort before unit problems).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProblemSet {
    by_resource: BTreeMap<ProblemResource, Vec<Problem>>,
}

impl ProblemSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, problem: Problem) {
        self.by_resource
            .entry(problem.resource.clone())
            .or_default()
            .push(problem);
    }

    pub fn extend<I: IntoIterator<Item = Problem>>(&mut self, problems: I) {
        for problem in problems {
            self.add(problem);
        }
    }

    /// Problems attached to one resource, in the order they were reported.
    pub fn for_resource(&self, resource: &ProblemResource) -> &[Problem] {
        self.by_resource
            .get(resource)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Project-level problems only.
    pub fn for_project(&self, project: &ProjectId) -> &[Problem] {
        self.for_resource(&ProblemResource::Project(project.clone()))
    }

    pub fn for_unit(&self, project: &ProjectId, path: &UnitPath) -> &[Problem] {
        self.for_resource(&ProblemResource::unit(project, path))
    }

    /// Every problem of a project, project-level and unit-level.
    pub fn all_in_project<'a>(
        &'a self,
        project: &'a ProjectId,
    ) -> impl Iterator<Item = &'a Problem> + 'a {
        self.by_resource
            .iter()
            .filter(move |(resource, _)| resource.project() == project)
            .flat_map(|(_, problems)| problems.iter())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Problem> {
        self.by_resource.values().flatten()
    }

    pub fn resources(&self) -> impl Iterator<Item = &ProblemResource> {
        self.by_resource.keys()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Problem> {
        self.iter().filter(|p| p.severity == Severity::Error)
    }

    pub fn len(&self) -> usize {
        self.by_resource.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_resource.values().all(Vec::is_empty)
    }
}
