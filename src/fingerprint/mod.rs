//! Fingerprint Model: structural versus content signatures of compiled types.
//!
//! A [`StructuralFingerprint`] hashes the externally visible shape of a type
//! (supertypes, member signatures, modifiers and type-checking annotations).
//! A [`ContentFingerprint`] hashes raw bytes. Recompiling a type whose
//! structural fingerprint is unchanged never re-queues its dependents.
//!
//! Both are computed with [`FxHasher`], which is unseeded, so values are stable
//! across runs and can be persisted.

use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};

use crate::base::TypeName;

/// Version of the fingerprint algorithm. Persisted states recorded with a
/// different version are discarded wholesale.
pub const FINGERPRINT_VERSION: u32 = 1;

/// The API shape of a compiled type.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeShape {
    pub modifiers: Vec<String>,
    /// Supertypes in declaration order (order is significant).
    pub supertypes: Vec<TypeName>,
    /// Member signatures. Declaration order is not significant.
    pub members: Vec<String>,
    /// Annotations that affect type-checking (e.g. nullness).
    pub annotations: Vec<String>,
}

impl TypeShape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_supertype(mut self, supertype: impl Into<TypeName>) -> Self {
        self.supertypes.push(supertype.into());
        self
    }

    pub fn with_member(mut self, signature: impl Into<String>) -> Self {
        self.members.push(signature.into());
        self
    }

    pub fn with_modifier(mut self, modifier: impl Into<String>) -> Self {
        self.modifiers.push(modifier.into());
        self
    }

    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotations.push(annotation.into());
        self
    }
}

/// Hash over a type's API shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
pub struct StructuralFingerprint(pub u64);

impl StructuralFingerprint {
    pub fn of(shape: &TypeShape) -> Self {
        let mut hasher = FxHasher::default();

        let mut modifiers: Vec<&str> = shape.modifiers.iter().map(String::as_str).collect();
        modifiers.sort_unstable();
        modifiers.dedup();
        modifiers.hash(&mut hasher);

        for supertype in &shape.supertypes {
            supertype.as_str().hash(&mut hasher);
        }
        0xffu8.hash(&mut hasher);

        let mut members: Vec<&str> = shape.members.iter().map(String::as_str).collect();
        members.sort_unstable();
        members.hash(&mut hasher);

        let mut annotations: Vec<&str> = shape.annotations.iter().map(String::as_str).collect();
        annotations.sort_unstable();
        annotations.hash(&mut hasher);

        Self(hasher.finish())
    }
}

/// Hash over full source or byte content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
pub struct ContentFingerprint(pub u64);

impl ContentFingerprint {
    pub fn of(bytes: impl AsRef<[u8]>) -> Self {
        let mut hasher = FxHasher::default();
        hasher.write(bytes.as_ref());
        Self(hasher.finish())
    }
}

/// A compiled type with its fingerprints.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DefinedType {
    pub name: TypeName,
    pub structural: StructuralFingerprint,
    pub content: ContentFingerprint,
    /// Qualified supertypes, kept to classify indirectly referenced types.
    pub supertypes: Vec<TypeName>,
}

impl DefinedType {
    pub fn new(name: impl Into<TypeName>, shape: &TypeShape, content: ContentFingerprint) -> Self {
        Self {
            name: name.into(),
            structural: StructuralFingerprint::of(shape),
            content,
            supertypes: shape.supertypes.clone(),
        }
    }
}

/// How a type changed between two build states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeChange {
    Added,
    Removed,
    /// Shape differs: dependents must be re-queued.
    Structural,
    /// Recompiled, same shape, different content.
    NonStructural,
    Unchanged,
}

impl TypeChange {
    pub fn classify(
        before: Option<(StructuralFingerprint, ContentFingerprint)>,
        after: Option<(StructuralFingerprint, ContentFingerprint)>,
    ) -> Self {
        match (before, after) {
            (None, None) => TypeChange::Unchanged,
            (None, Some(_)) => TypeChange::Added,
            (Some(_), None) => TypeChange::Removed,
            (Some((old_s, old_c)), Some((new_s, new_c))) => {
                if old_s != new_s {
                    TypeChange::Structural
                } else if old_c != new_c {
                    TypeChange::NonStructural
                } else {
                    TypeChange::Unchanged
                }
            }
        }
    }

    /// Whether dependents of the type must be recompiled.
    pub fn requeues_dependents(self) -> bool {
        matches!(
            self,
            TypeChange::Added | TypeChange::Removed | TypeChange::Structural
        )
    }
}
