use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::base::{LibraryId, ProjectId, UnitPath};
use crate::workspace::{Library, Project};

/// Source texts of every project's compilation units.
#[derive(Clone, Debug, Default)]
pub struct SourceStore {
    units: BTreeMap<ProjectId, BTreeMap<UnitPath, Arc<str>>>,
}

impl SourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a unit's text. Returns `true` if the unit was new.
    pub fn set(
        &mut self,
        project: impl Into<ProjectId>,
        path: impl Into<UnitPath>,
        text: impl Into<Arc<str>>,
    ) -> bool {
        self.units
            .entry(project.into())
            .or_default()
            .insert(path.into(), text.into())
            .is_none()
    }

    pub fn remove(&mut self, project: &ProjectId, path: &UnitPath) -> bool {
        self.units
            .get_mut(project)
            .is_some_and(|units| units.remove(path).is_some())
    }

    pub fn get(&self, project: &ProjectId, path: &UnitPath) -> Option<&Arc<str>> {
        self.units.get(project)?.get(path)
    }

    pub fn contains(&self, project: &ProjectId, path: &UnitPath) -> bool {
        self.get(project, path).is_some()
    }

    /// Units of a project in path order.
    pub fn units_of<'a>(
        &'a self,
        project: &'a ProjectId,
    ) -> impl Iterator<Item = (&'a UnitPath, &'a Arc<str>)> + 'a {
        self.units.get(project).into_iter().flatten()
    }
}

/// Everything a build request knows about the workspace.
#[derive(Clone, Debug, Default)]
pub struct WorkspaceSnapshot {
    projects: Vec<Project>,
    libraries: IndexMap<LibraryId, Library>,
    sources: SourceStore,
}

impl WorkspaceSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a project. Duplicate names are kept and rejected when the
    /// dependency graph is built.
    pub fn with_project(mut self, project: Project) -> Self {
        self.add_project(project);
        self
    }

    pub fn add_project(&mut self, project: Project) {
        self.projects.push(project);
    }

    /// Replace the definition of an existing project, or add it.
    pub fn replace_project(&mut self, project: Project) {
        match self.projects.iter_mut().find(|p| p.name == project.name) {
            Some(slot) => *slot = project,
            None => self.projects.push(project),
        }
    }

    /// Drop a project definition and its sources.
    pub fn remove_project(&mut self, name: &ProjectId) -> Option<Project> {
        let idx = self.projects.iter().position(|p| &p.name == name)?;
        self.sources.units.remove(name);
        Some(self.projects.remove(idx))
    }

    pub fn with_library(mut self, library: Library) -> Self {
        self.add_library(library);
        self
    }

    pub fn add_library(&mut self, library: Library) {
        self.libraries.insert(library.id.clone(), library);
    }

    /// Set a unit's source text.
    pub fn with_source(
        mut self,
        project: impl Into<ProjectId>,
        path: impl Into<UnitPath>,
        text: impl Into<Arc<str>>,
    ) -> Self {
        self.sources.set(project, path, text);
        self
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn project(&self, name: &ProjectId) -> Option<&Project> {
        self.projects.iter().find(|p| &p.name == name)
    }

    pub fn libraries(&self) -> &IndexMap<LibraryId, Library> {
        &self.libraries
    }

    pub fn library(&self, id: &LibraryId) -> Option<&Library> {
        self.libraries.get(id)
    }

    pub fn sources(&self) -> &SourceStore {
        &self.sources
    }

    pub fn sources_mut(&mut self) -> &mut SourceStore {
        &mut self.sources
    }

    /// Units of `project` that lie inside one of its source roots.
    pub fn source_units(&self, project: &Project) -> Vec<UnitPath> {
        self.sources
            .units_of(&project.name)
            .map(|(path, _)| path)
            .filter(|path| project.owns_unit(path))
            .cloned()
            .collect()
    }

    pub fn build_path_signature(&self, project: &Project) -> u64 {
        project.build_path_signature(&self.libraries)
    }
}
