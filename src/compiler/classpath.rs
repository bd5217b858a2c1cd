use indexmap::IndexMap;
use rustc_hash::FxHashSet;

use crate::access::{AccessClassification, AccessRuleSet};
use crate::base::{LibraryId, ProjectId, TypeName};
use crate::graph::ProjectGraph;
use crate::problem::RestrictionSource;
use crate::state::{ProjectState, StateMap};
use crate::workspace::{Library, WorkspaceSnapshot};

/// Where a type on the classpath comes from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeOwner {
    Project(ProjectId),
    Library(LibraryId),
}

impl TypeOwner {
    pub fn restriction_source(&self) -> RestrictionSource {
        match self {
            TypeOwner::Project(project) => RestrictionSource::Project(project.clone()),
            TypeOwner::Library(library) => RestrictionSource::Library(library.clone()),
        }
    }
}

/// One classpath entry with the rules accumulated on the way to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClasspathEntry {
    pub owner: TypeOwner,
    pub rules: AccessRuleSet,
}

/// A type found on the classpath.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Located {
    pub name: TypeName,
    pub owner: TypeOwner,
    pub access: AccessClassification,
    pub supertypes: Vec<TypeName>,
}

/// Outcome of looking up one qualified name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    Found(Located),
    /// Defined somewhere in the workspace, but not on this classpath.
    NotVisible { owner: TypeOwner },
    Missing,
}

/// Read-only view of every type a project can see.
///
/// Lookup order: the project's own State, then required projects in closure
/// order, then libraries (the project's own entries first, then libraries
/// exported by projects in the closure).
pub struct ClasspathView<'a> {
    project: &'a ProjectId,
    own: Option<&'a ProjectState>,
    entries: Vec<ClasspathEntry>,
    states: &'a StateMap,
    libraries: &'a IndexMap<LibraryId, Library>,
}

impl<'a> ClasspathView<'a> {
    /// Build the view for `project`.
    ///
    /// `own` is passed separately because the driver holds the project's
    /// State outside the map while building it.
    pub fn new(
        graph: &ProjectGraph,
        snapshot: &'a WorkspaceSnapshot,
        states: &'a StateMap,
        project: &'a ProjectId,
        own: Option<&'a ProjectState>,
    ) -> Self {
        let closure = graph.required_closure(project);
        let mut entries: Vec<ClasspathEntry> = closure
            .iter()
            .map(|entry| ClasspathEntry {
                owner: TypeOwner::Project(entry.project.clone()),
                rules: entry.rules.clone(),
            })
            .collect();

        let mut seen_libraries = FxHashSet::default();
        if let Some(definition) = snapshot.project(project) {
            for library in &definition.libraries {
                if seen_libraries.insert(library.library.clone()) {
                    entries.push(ClasspathEntry {
                        owner: TypeOwner::Library(library.library.clone()),
                        rules: library.rules.clone(),
                    });
                }
            }
        }
        for entry in &closure {
            let Some(definition) = snapshot.project(&entry.project) else {
                continue;
            };
            for library in definition.libraries.iter().filter(|l| l.exported) {
                if seen_libraries.insert(library.library.clone()) {
                    entries.push(ClasspathEntry {
                        owner: TypeOwner::Library(library.library.clone()),
                        rules: entry.rules.concat(&library.rules),
                    });
                }
            }
        }

        Self {
            project,
            own,
            entries,
            states,
            libraries: snapshot.libraries(),
        }
    }

    pub fn project(&self) -> &ProjectId {
        self.project
    }

    pub fn entries(&self) -> &[ClasspathEntry] {
        &self.entries
    }

    /// Look up one qualified name.
    ///
    /// The first accessible match wins. A restricted match flagged
    /// `ignore_if_better` only binds when nothing better follows.
    pub fn resolve(&self, name: &TypeName) -> Resolution {
        if let Some(record) = self.own.and_then(|own| own.type_record(name)) {
            return Resolution::Found(Located {
                name: name.clone(),
                owner: TypeOwner::Project(self.project.clone()),
                access: AccessClassification::Accessible,
                supertypes: record.supertypes.clone(),
            });
        }

        let mut fallback: Option<Located> = None;
        for entry in &self.entries {
            let Some(supertypes) = self.lookup(&entry.owner, name) else {
                continue;
            };
            let verdict = entry.rules.classify(name);
            let located = Located {
                name: name.clone(),
                owner: entry.owner.clone(),
                access: verdict.classification,
                supertypes,
            };
            if !verdict.classification.is_restricted() {
                return Resolution::Found(located);
            }
            if verdict.ignore_if_better {
                fallback.get_or_insert(located);
                continue;
            }
            let best = match fallback {
                Some(previous) if previous.access < located.access => previous,
                _ => located,
            };
            return Resolution::Found(best);
        }
        if let Some(located) = fallback {
            return Resolution::Found(located);
        }

        for (project, state) in self.states {
            if project != self.project && state.defines(name) {
                return Resolution::NotVisible {
                    owner: TypeOwner::Project(project.clone()),
                };
            }
        }
        for library in self.libraries.values() {
            if library.find(name).is_some() {
                return Resolution::NotVisible {
                    owner: TypeOwner::Library(library.id.clone()),
                };
            }
        }
        Resolution::Missing
    }

    /// First candidate found on the classpath.
    pub fn resolve_first(&self, candidates: &[TypeName]) -> Option<Located> {
        candidates.iter().find_map(|name| match self.resolve(name) {
            Resolution::Found(located) => Some(located),
            _ => None,
        })
    }

    fn lookup(&self, owner: &TypeOwner, name: &TypeName) -> Option<Vec<TypeName>> {
        match owner {
            TypeOwner::Project(project) => self
                .states
                .get(project)
                .and_then(|state| state.type_record(name))
                .map(|record| record.supertypes.clone()),
            TypeOwner::Library(library) => self
                .libraries
                .get(library)
                .and_then(|library| library.find(name))
                .map(|ty| ty.supertypes.clone()),
        }
    }
}
