use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, trace};

use super::ReferenceIndex;
use crate::base::{ProjectId, TypeName, UnitPath};
use crate::fingerprint::{
    ContentFingerprint, DefinedType, FINGERPRINT_VERSION, StructuralFingerprint, TypeChange,
};
use crate::problem::Problem;

/// What the State knows about one compilation unit.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitRecord {
    /// Types this unit owns.
    pub types: Vec<TypeName>,
    /// Fingerprint of the source text last compiled.
    pub source: ContentFingerprint,
}

/// What the State knows about one type.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeRecord {
    pub unit: UnitPath,
    pub structural: StructuralFingerprint,
    pub content: ContentFingerprint,
    pub supertypes: Vec<TypeName>,
}

/// A type declared by more than one unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DuplicateType {
    pub name: TypeName,
    /// Unit that keeps the type.
    pub owner: UnitPath,
}

/// Outcome of recording one unit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnitUpdate {
    pub changes: Vec<(TypeName, TypeChange)>,
    pub duplicates: Vec<DuplicateType>,
    /// Units that must be recompiled as a consequence (a type they also
    /// declare lost its owner).
    pub also_dirty: BTreeSet<UnitPath>,
}

impl UnitUpdate {
    /// Types whose dependents must be re-queued.
    pub fn structural_changes(&self) -> impl Iterator<Item = &TypeName> {
        self.changes
            .iter()
            .filter(|(_, change)| change.requeues_dependents())
            .map(|(name, _)| name)
    }
}

/// Outcome of removing one unit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RemovedUnit {
    pub types: Vec<TypeName>,
    pub also_dirty: BTreeSet<UnitPath>,
}

/// Per-project build state, persisted across builds.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
pub struct ProjectState {
    project: ProjectId,
    fingerprint_version: u32,
    build_path_signature: u64,
    units: BTreeMap<UnitPath, UnitRecord>,
    types: FxHashMap<TypeName, TypeRecord>,
    /// Types also declared by units that do not own them.
    shadowed: BTreeMap<TypeName, BTreeSet<UnitPath>>,
    references: ReferenceIndex,
    unit_problems: BTreeMap<UnitPath, Vec<Problem>>,
    project_problems: Vec<Problem>,
    /// Types each unit reaches only through a project off the classpath.
    #[cfg_attr(feature = "persist", serde(default))]
    unreachable: BTreeMap<UnitPath, BTreeSet<TypeName>>,
    /// Units left dirty by an interrupted or pass-bounded build.
    pending: BTreeSet<UnitPath>,
}

impl ProjectState {
    pub fn new(project: ProjectId, build_path_signature: u64) -> Self {
        Self {
            project,
            fingerprint_version: FINGERPRINT_VERSION,
            build_path_signature,
            units: BTreeMap::new(),
            types: FxHashMap::default(),
            shadowed: BTreeMap::new(),
            references: ReferenceIndex::new(),
            unit_problems: BTreeMap::new(),
            project_problems: Vec::new(),
            unreachable: BTreeMap::new(),
            pending: BTreeSet::new(),
        }
    }

    pub fn project(&self) -> &ProjectId {
        &self.project
    }

    pub fn build_path_signature(&self) -> u64 {
        self.build_path_signature
    }

    pub fn fingerprint_version(&self) -> u32 {
        self.fingerprint_version
    }

    /// Whether fingerprints in this State can be compared with fresh ones.
    pub fn is_compatible(&self) -> bool {
        self.fingerprint_version == FINGERPRINT_VERSION
    }

    /// Drop everything derived from the old build path.
    ///
    /// Unit and type records survive only as the comparison baseline; the
    /// caller recompiles every unit.
    pub fn invalidate(&mut self, build_path_signature: u64) {
        debug!(
            "[STATE] invalidating state of {} ({} units)",
            self.project,
            self.units.len()
        );
        self.build_path_signature = build_path_signature;
        self.references.clear();
        self.shadowed.clear();
        self.unit_problems.clear();
        self.project_problems.clear();
        self.unreachable.clear();
        self.pending.clear();
    }

    // ========================================================================
    // UNITS AND TYPES
    // ========================================================================

    /// Commit the types a unit defines and classify how each changed.
    pub fn record_unit(
        &mut self,
        path: &UnitPath,
        source: ContentFingerprint,
        defined: &[DefinedType],
    ) -> UnitUpdate {
        let previous = self
            .units
            .get(path)
            .map(|record| record.types.clone())
            .unwrap_or_default();
        self.release_shadows(path);

        let mut update = UnitUpdate::default();
        let mut owned: Vec<TypeName> = Vec::with_capacity(defined.len());

        for def in defined {
            if owned.contains(&def.name) {
                update.duplicates.push(DuplicateType {
                    name: def.name.clone(),
                    owner: path.clone(),
                });
                continue;
            }
            if let Some(owner) = self.owner_elsewhere(&def.name, path) {
                trace!("[STATE] {} already defined by {}", def.name, owner);
                self.shadowed
                    .entry(def.name.clone())
                    .or_default()
                    .insert(path.clone());
                update.duplicates.push(DuplicateType {
                    name: def.name.clone(),
                    owner,
                });
                continue;
            }

            let before = self
                .types
                .get(&def.name)
                .map(|record| (record.structural, record.content));
            let change = TypeChange::classify(before, Some((def.structural, def.content)));
            self.types.insert(
                def.name.clone(),
                TypeRecord {
                    unit: path.clone(),
                    structural: def.structural,
                    content: def.content,
                    supertypes: def.supertypes.clone(),
                },
            );
            if self.shadowed.contains_key(&def.name) {
                update.duplicates.push(DuplicateType {
                    name: def.name.clone(),
                    owner: path.clone(),
                });
            }
            owned.push(def.name.clone());
            update.changes.push((def.name.clone(), change));
        }

        for old in previous {
            if owned.contains(&old) {
                continue;
            }
            if self.types.get(&old).is_some_and(|record| &record.unit == path) {
                self.types.remove(&old);
                update.changes.push((old.clone(), TypeChange::Removed));
                if let Some(units) = self.shadowed.remove(&old) {
                    update.also_dirty.extend(units);
                }
            }
        }

        self.units.insert(
            path.clone(),
            UnitRecord {
                types: owned,
                source,
            },
        );
        self.pending.remove(path);
        update
    }

    /// Drop a unit with its types, references and problems.
    pub fn remove_unit(&mut self, path: &UnitPath) -> RemovedUnit {
        let mut removed = RemovedUnit::default();
        self.release_shadows(path);
        self.references.remove_references_from_unit(path);
        self.unit_problems.remove(path);
        self.unreachable.remove(path);
        self.pending.remove(path);

        let Some(record) = self.units.remove(path) else {
            return removed;
        };
        for name in record.types {
            if self.types.get(&name).is_some_and(|r| &r.unit == path) {
                self.types.remove(&name);
                if let Some(units) = self.shadowed.remove(&name) {
                    removed.also_dirty.extend(units);
                }
                removed.types.push(name);
            }
        }
        debug!(
            "[STATE] removed unit {} from {} ({} types)",
            path,
            self.project,
            removed.types.len()
        );
        removed
    }

    fn owner_elsewhere(&self, name: &TypeName, path: &UnitPath) -> Option<UnitPath> {
        let record = self.types.get(name)?;
        (&record.unit != path && self.units.contains_key(&record.unit))
            .then(|| record.unit.clone())
    }

    /// Forget that `path` shadows any type. Owners whose last conflict goes
    /// away lose their duplicate problem.
    fn release_shadows(&mut self, path: &UnitPath) {
        let mut resolved = Vec::new();
        self.shadowed.retain(|name, units| {
            if units.remove(path) && units.is_empty() {
                resolved.push(name.clone());
            }
            !units.is_empty()
        });
        for name in resolved {
            let Some(owner) = self.types.get(&name).map(|r| r.unit.clone()) else {
                continue;
            };
            let stale = Problem::duplicate_type(&self.project, &owner, &name);
            if let Some(problems) = self.unit_problems.get_mut(&owner) {
                problems.retain(|p| p != &stale);
            }
        }
    }

    pub fn units(&self) -> impl Iterator<Item = (&UnitPath, &UnitRecord)> {
        self.units.iter()
    }

    pub fn unit(&self, path: &UnitPath) -> Option<&UnitRecord> {
        self.units.get(path)
    }

    pub fn has_unit(&self, path: &UnitPath) -> bool {
        self.units.contains_key(path)
    }

    pub fn unit_source(&self, path: &UnitPath) -> Option<ContentFingerprint> {
        self.units.get(path).map(|record| record.source)
    }

    pub fn type_record(&self, name: &TypeName) -> Option<&TypeRecord> {
        self.types.get(name)
    }

    pub fn defines(&self, name: &TypeName) -> bool {
        self.types.contains_key(name)
    }

    /// Every type this project owns, sorted.
    pub fn type_names(&self) -> Vec<&TypeName> {
        let mut names: Vec<&TypeName> = self.types.keys().collect();
        names.sort();
        names
    }

    // ========================================================================
    // REFERENCES
    // ========================================================================

    /// Record that `from` (compiled from `unit`) references `to`.
    pub fn record_reference(&mut self, from: &TypeName, to: &TypeName, unit: &UnitPath) {
        self.references.add_reference(from, to, unit);
    }

    /// Drop the references recorded by `unit` ahead of recording fresh ones.
    pub fn clear_references(&mut self, unit: &UnitPath) {
        self.references.remove_references_from_unit(unit);
    }

    /// Types referencing `name`.
    pub fn lookup_dependents(&self, name: &TypeName) -> Vec<&TypeName> {
        self.references.get_sources(name)
    }

    /// Units holding a reference to `name`.
    pub fn dependent_units(&self, name: &TypeName) -> BTreeSet<UnitPath> {
        self.references.units_referencing(name)
    }

    /// Drop every link to the given types and return the units that held one.
    pub fn forget_references_to<'a, I>(&mut self, names: I) -> BTreeSet<UnitPath>
    where
        I: IntoIterator<Item = &'a TypeName>,
    {
        names
            .into_iter()
            .flat_map(|name| self.references.forget_target(name))
            .collect()
    }

    pub fn references(&self) -> &ReferenceIndex {
        &self.references
    }

    // ========================================================================
    // PROBLEMS
    // ========================================================================

    pub fn set_unit_problems(&mut self, unit: &UnitPath, problems: Vec<Problem>) {
        if problems.is_empty() {
            self.unit_problems.remove(unit);
        } else {
            self.unit_problems.insert(unit.clone(), problems);
        }
    }

    /// Add a problem to a unit unless an identical one is already present.
    pub fn add_unit_problem(&mut self, unit: &UnitPath, problem: Problem) {
        let problems = self.unit_problems.entry(unit.clone()).or_default();
        if !problems.contains(&problem) {
            problems.push(problem);
        }
    }

    /// Problems currently recorded against a unit.
    pub fn snapshot_problems(&self, unit: &UnitPath) -> Vec<Problem> {
        self.unit_problems.get(unit).cloned().unwrap_or_default()
    }

    pub fn unit_problems(&self) -> impl Iterator<Item = (&UnitPath, &[Problem])> {
        self.unit_problems
            .iter()
            .map(|(unit, problems)| (unit, problems.as_slice()))
    }

    pub fn project_problems(&self) -> &[Problem] {
        &self.project_problems
    }

    pub fn set_project_problems(&mut self, problems: Vec<Problem>) {
        self.project_problems = problems;
    }

    /// Replace the set of unreachable types recorded for a unit.
    pub fn set_unreachable_types(&mut self, unit: &UnitPath, names: BTreeSet<TypeName>) {
        if names.is_empty() {
            self.unreachable.remove(unit);
        } else {
            self.unreachable.insert(unit.clone(), names);
        }
    }

    /// Every type some unit reaches only indirectly, sorted.
    pub fn unreachable_types(&self) -> BTreeSet<&TypeName> {
        self.unreachable.values().flatten().collect()
    }

    // ========================================================================
    // PENDING UNITS
    // ========================================================================

    pub fn pending(&self) -> &BTreeSet<UnitPath> {
        &self.pending
    }

    pub fn mark_pending<I: IntoIterator<Item = UnitPath>>(&mut self, units: I) {
        self.pending.extend(units);
    }
}
