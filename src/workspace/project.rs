use indexmap::IndexMap;
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};

use crate::access::AccessRuleSet;
use crate::base::{LibraryId, ProjectId, UnitPath};
use crate::workspace::Library;

/// A source root and the output location its units compile to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SourceRoot {
    pub path: String,
    pub output: String,
}

impl SourceRoot {
    pub fn new(path: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            output: output.into(),
        }
    }
}

/// A `requires` edge to another project.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RequiredProject {
    pub project: ProjectId,
    pub rules: AccessRuleSet,
    /// Visible transitively to dependents of the requiring project.
    pub exported: bool,
}

impl RequiredProject {
    pub fn new(project: impl Into<ProjectId>) -> Self {
        Self {
            project: project.into(),
            rules: AccessRuleSet::default(),
            exported: false,
        }
    }

    pub fn with_rules(mut self, rules: AccessRuleSet) -> Self {
        self.rules = rules;
        self
    }

    pub fn exported(mut self) -> Self {
        self.exported = true;
        self
    }
}

/// An external library on a project's build path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LibraryEntry {
    pub library: LibraryId,
    pub rules: AccessRuleSet,
    pub exported: bool,
}

impl LibraryEntry {
    pub fn new(library: impl Into<LibraryId>) -> Self {
        Self {
            library: library.into(),
            rules: AccessRuleSet::default(),
            exported: false,
        }
    }

    pub fn with_rules(mut self, rules: AccessRuleSet) -> Self {
        self.rules = rules;
        self
    }

    pub fn exported(mut self) -> Self {
        self.exported = true;
        self
    }
}

/// A project definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Project {
    pub name: ProjectId,
    pub source_roots: Vec<SourceRoot>,
    pub requires: Vec<RequiredProject>,
    pub libraries: Vec<LibraryEntry>,
}

impl Project {
    pub fn new(name: impl Into<ProjectId>) -> Self {
        Self {
            name: name.into(),
            source_roots: Vec::new(),
            requires: Vec::new(),
            libraries: Vec::new(),
        }
    }

    pub fn with_source_root(mut self, path: impl Into<String>, output: impl Into<String>) -> Self {
        self.source_roots.push(SourceRoot::new(path, output));
        self
    }

    /// Require another project with no access rules.
    pub fn requires(self, project: impl Into<ProjectId>) -> Self {
        self.with_required(RequiredProject::new(project))
    }

    pub fn with_required(mut self, required: RequiredProject) -> Self {
        self.requires.push(required);
        self
    }

    pub fn with_library(mut self, entry: LibraryEntry) -> Self {
        self.libraries.push(entry);
        self
    }

    /// The source root containing `unit`, if any.
    pub fn source_root_of(&self, unit: &UnitPath) -> Option<&SourceRoot> {
        let root = unit.source_root_of(self.source_roots.iter().map(|r| r.path.as_str()))?;
        self.source_roots.iter().find(|r| r.path == root)
    }

    pub fn owns_unit(&self, unit: &UnitPath) -> bool {
        self.source_root_of(unit).is_some()
    }

    /// Hash of everything on the build path: roots, outputs, edges, rules and
    /// library contents. A change invalidates the project's State.
    pub fn build_path_signature(&self, libraries: &IndexMap<LibraryId, Library>) -> u64 {
        let mut hasher = FxHasher::default();
        self.source_roots.hash(&mut hasher);
        self.requires.hash(&mut hasher);
        for entry in &self.libraries {
            entry.hash(&mut hasher);
            match libraries.get(&entry.library) {
                Some(library) => library.content_hash().hash(&mut hasher),
                None => 0u64.hash(&mut hasher),
            }
        }
        hasher.finish()
    }
}
