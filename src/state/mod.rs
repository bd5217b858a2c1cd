//! Project State: the per-project index carried from one build to the next.
//!
//! - unit → owned types and the source fingerprint last compiled
//! - type → owning unit, fingerprints and supertypes
//! - referenced name → referencing types and units (reverse index)
//! - problems per unit and per project
//! - units still pending from an interrupted build
//!
//! A State is owned by exactly one project. Other projects read it while
//! computing invalidation but never mutate it.

mod project_state;
mod reference_index;

#[cfg(feature = "persist")]
mod persist;

pub use project_state::{
    DuplicateType, ProjectState, RemovedUnit, TypeRecord, UnitRecord, UnitUpdate,
};
pub use reference_index::{ReferenceIndex, ReferenceInfo};

use std::collections::BTreeMap;

use crate::base::ProjectId;

/// Every project's State, keyed by project.
pub type StateMap = BTreeMap<ProjectId, ProjectState>;

#[cfg(feature = "persist")]
pub use persist::PersistError;
