use crate::base::{ProjectId, UnitPath};

/// One project visit that compiled at least one unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildStep {
    pub project: ProjectId,
    /// Units in the order they were compiled. A unit recompiled within the
    /// same visit appears once per compilation.
    pub units: Vec<UnitPath>,
}

/// Trace of the project visits a build actually executed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildOrder {
    steps: Vec<BuildStep>,
}

impl BuildOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a visit. Visits that compiled nothing are not part of the trace.
    pub fn push(&mut self, project: ProjectId, units: Vec<UnitPath>) {
        if !units.is_empty() {
            self.steps.push(BuildStep { project, units });
        }
    }

    pub fn steps(&self) -> &[BuildStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Visited projects, one entry per step.
    pub fn projects(&self) -> Vec<&ProjectId> {
        self.steps.iter().map(|s| &s.project).collect()
    }

    /// Every compiled unit as `/Project/path`, in compile order.
    pub fn compiled_paths(&self) -> Vec<String> {
        self.steps
            .iter()
            .flat_map(|step| step.units.iter().map(|u| u.display_in(&step.project)))
            .collect()
    }

    /// Whether any step compiled `unit` of `project`.
    pub fn compiled(&self, project: &ProjectId, unit: &UnitPath) -> bool {
        self.steps
            .iter()
            .any(|s| &s.project == project && s.units.contains(unit))
    }
}
