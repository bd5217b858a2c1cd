//! Reverse dependency index for one project.
//!
//! Maps a referenced type name to the types (and their units) that reference
//! it. Names are recorded as the compiler's candidates, resolved or not, so
//! that a type appearing later under a previously missing name finds the
//! units that asked for it.

use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeSet;
use tracing::trace;

use crate::base::{TypeName, UnitPath};

/// A single reference from a type in this project.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
pub struct ReferenceInfo {
    /// Type containing the reference.
    pub source: TypeName,
    /// Unit the referencing type was compiled from.
    pub unit: UnitPath,
}

/// Bidirectional reference index.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
pub struct ReferenceIndex {
    /// Reverse index: referenced name → references to it.
    reverse: FxHashMap<TypeName, FxHashSet<ReferenceInfo>>,

    /// Forward index: source type → names it references.
    forward: FxHashMap<TypeName, FxHashSet<TypeName>>,

    /// Unit each source was recorded from (for cleanup on recompile).
    source_to_unit: FxHashMap<TypeName, UnitPath>,
}

impl ReferenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `source`, compiled from `unit`, references `target`.
    pub fn add_reference(&mut self, source: &TypeName, target: &TypeName, unit: &UnitPath) {
        trace!(
            "[REF_INDEX] add_reference: source='{}' target='{}' unit='{}'",
            source, target, unit
        );
        self.reverse
            .entry(target.clone())
            .or_default()
            .insert(ReferenceInfo {
                source: source.clone(),
                unit: unit.clone(),
            });
        self.forward
            .entry(source.clone())
            .or_default()
            .insert(target.clone());
        self.source_to_unit.insert(source.clone(), unit.clone());
    }

    /// Types referencing `target`, sorted by name.
    pub fn get_sources(&self, target: &TypeName) -> Vec<&TypeName> {
        let mut sources: Vec<&TypeName> = self
            .reverse
            .get(target)
            .map(|refs| refs.iter().map(|r| &r.source).collect())
            .unwrap_or_default();
        sources.sort();
        sources.dedup();
        sources
    }

    /// Units holding a reference to `target`.
    pub fn units_referencing(&self, target: &TypeName) -> BTreeSet<UnitPath> {
        self.reverse
            .get(target)
            .map(|refs| refs.iter().map(|r| r.unit.clone()).collect())
            .unwrap_or_default()
    }

    /// Remove all references recorded from `unit`.
    ///
    /// Called before a unit's new references are recorded, and when it is deleted.
    pub fn remove_references_from_unit(&mut self, unit: &UnitPath) {
        for refs in self.reverse.values_mut() {
            refs.retain(|r| &r.unit != unit);
        }

        let sources: Vec<TypeName> = self
            .source_to_unit
            .iter()
            .filter(|(_, u)| *u == unit)
            .map(|(s, _)| s.clone())
            .collect();
        for source in &sources {
            self.source_to_unit.remove(source);
            self.forward.remove(source);
        }

        self.reverse.retain(|_, refs| !refs.is_empty());
    }

    /// Drop every link pointing at `target` and return the units that held one.
    ///
    /// Used when the target type disappears from another project.
    pub fn forget_target(&mut self, target: &TypeName) -> BTreeSet<UnitPath> {
        let Some(refs) = self.reverse.remove(target) else {
            return BTreeSet::new();
        };
        for info in &refs {
            if let Some(targets) = self.forward.get_mut(&info.source) {
                targets.remove(target);
            }
        }
        refs.into_iter().map(|r| r.unit).collect()
    }

    pub fn clear(&mut self) {
        self.reverse.clear();
        self.forward.clear();
        self.source_to_unit.clear();
    }

}
