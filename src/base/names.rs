//! String-backed identifiers.
//!
//! All identifiers wrap a [`SmolStr`] so they are cheap to clone and small
//! names never allocate. They order lexicographically, which the scheduler
//! and diagnostics rely on for reproducible output.

use smol_str::SmolStr;
use std::borrow::Borrow;
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "persist", serde(transparent))]
        pub struct $name(SmolStr);

        impl $name {
            pub fn new(value: impl AsRef<str>) -> Self {
                Self(SmolStr::new(value.as_ref()))
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:?})", stringify!($name), self.0.as_str())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.0.as_str())
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(SmolStr::from(value))
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                self.0.as_str()
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.0.as_str()
            }
        }
    };
}

string_id!(
    /// Project identity. Unique within a workspace graph.
    ProjectId
);

string_id!(
    /// Fully qualified, dot-separated type name.
    TypeName
);

string_id!(
    /// Path of a compilation unit relative to its project (`src/p1/X.java`).
    UnitPath
);

string_id!(
    /// Identifier of an external library entry.
    LibraryId
);

impl TypeName {
    /// Last segment of the qualified name (`p1.X` → `X`).
    pub fn simple_name(&self) -> &str {
        match self.0.rfind('.') {
            Some(idx) => &self.0[idx + 1..],
            None => self.0.as_str(),
        }
    }

    /// Package prefix, or `None` for the default package.
    pub fn package(&self) -> Option<&str> {
        self.0.rfind('.').map(|idx| &self.0[..idx])
    }

    /// Slash-separated form used when matching access rule patterns.
    pub fn as_path(&self) -> String {
        self.0.replace('.', "/")
    }
}

impl UnitPath {
    /// The source root (from `roots`) containing this unit, if any.
    ///
    /// The longest matching root wins so nested roots resolve to the innermost one.
    pub fn source_root_of<'a, I>(&self, roots: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        roots
            .into_iter()
            .filter(|root| self.is_under(root))
            .max_by_key(|root| root.len())
    }

    fn is_under(&self, root: &str) -> bool {
        let root = root.trim_matches('/');
        if root.is_empty() {
            return true;
        }
        let path = self.0.trim_start_matches('/');
        path.len() > root.len() && path.starts_with(root) && path.as_bytes()[root.len()] == b'/'
    }

    /// Workspace-absolute display form: `/P1/src/p1/X.java`.
    pub fn display_in(&self, project: &ProjectId) -> String {
        format!("/{}/{}", project, self.0.trim_start_matches('/'))
    }
}
