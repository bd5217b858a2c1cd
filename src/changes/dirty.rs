use std::collections::{BTreeMap, BTreeSet};

use crate::base::{ProjectId, UnitPath};

/// Units waiting to be compiled, per project.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DirtySet {
    units: BTreeMap<ProjectId, BTreeSet<UnitPath>>,
}

impl DirtySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the unit was not already dirty.
    pub fn insert(&mut self, project: &ProjectId, unit: UnitPath) -> bool {
        self.units.entry(project.clone()).or_default().insert(unit)
    }

    pub fn extend<I: IntoIterator<Item = UnitPath>>(&mut self, project: &ProjectId, units: I) {
        let mut units = units.into_iter().peekable();
        if units.peek().is_some() {
            self.units.entry(project.clone()).or_default().extend(units);
        }
    }

    pub fn merge(&mut self, other: DirtySet) {
        for (project, units) in other.units {
            self.extend(&project, units);
        }
    }

    pub fn units_of(&self, project: &ProjectId) -> Option<&BTreeSet<UnitPath>> {
        self.units.get(project).filter(|units| !units.is_empty())
    }

    pub fn contains(&self, project: &ProjectId, unit: &UnitPath) -> bool {
        self.units.get(project).is_some_and(|units| units.contains(unit))
    }

    pub fn has_project(&self, project: &ProjectId) -> bool {
        self.units_of(project).is_some()
    }

    /// Remove and return a project's dirty units.
    pub fn take(&mut self, project: &ProjectId) -> BTreeSet<UnitPath> {
        self.units.remove(project).unwrap_or_default()
    }

    /// Projects with at least one dirty unit.
    pub fn projects(&self) -> impl Iterator<Item = &ProjectId> {
        self.units
            .iter()
            .filter(|(_, units)| !units.is_empty())
            .map(|(project, _)| project)
    }

    pub fn len(&self) -> usize {
        self.units.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.units.values().all(BTreeSet::is_empty)
    }
}
