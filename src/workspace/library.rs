use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};

use crate::base::{LibraryId, TypeName};

/// A precompiled type shipped by an external library.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BinaryType {
    pub name: TypeName,
    pub supertypes: Vec<TypeName>,
}

impl BinaryType {
    pub fn new(name: impl Into<TypeName>) -> Self {
        Self {
            name: name.into(),
            supertypes: Vec::new(),
        }
    }

    pub fn with_supertype(mut self, supertype: impl Into<TypeName>) -> Self {
        self.supertypes.push(supertype.into());
        self
    }
}

/// An external library: a fixed set of binary types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Library {
    pub id: LibraryId,
    pub types: Vec<BinaryType>,
}

impl Library {
    pub fn new(id: impl Into<LibraryId>) -> Self {
        Self {
            id: id.into(),
            types: Vec::new(),
        }
    }

    pub fn with_type(mut self, ty: BinaryType) -> Self {
        self.types.push(ty);
        self
    }

    pub fn find(&self, name: &TypeName) -> Option<&BinaryType> {
        self.types.iter().find(|ty| &ty.name == name)
    }

    /// Hash of the library's contents, folded into the build path signature of
    /// every project that lists it.
    pub fn content_hash(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.id.hash(&mut hasher);
        let mut types: Vec<&BinaryType> = self.types.iter().collect();
        types.sort_by(|a, b| a.name.cmp(&b.name));
        for ty in types {
            ty.hash(&mut hasher);
        }
        hasher.finish()
    }
}
