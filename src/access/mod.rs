//! Access rules restricting which types cross a project or library edge.
//!
//! Rules are evaluated in declaration order against the slash-separated path
//! of a type (`p1/internal/X`); the first matching rule wins. A type matching
//! no rule is accessible.
//!
//! Pattern syntax: `*` matches within one path segment, `**` matches any
//! number of segments, `?` matches one character.

use crate::base::TypeName;

/// Classification assigned by an access rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "persist", serde(rename_all = "snake_case"))]
pub enum AccessClassification {
    Accessible,
    Discouraged,
    NonAccessible,
}

impl AccessClassification {
    pub fn is_restricted(self) -> bool {
        self != AccessClassification::Accessible
    }
}

/// A single pattern rule.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
pub struct AccessRule {
    pub pattern: String,
    pub classification: AccessClassification,
    /// A later accessible match elsewhere on the classpath takes precedence.
    #[cfg_attr(feature = "persist", serde(default))]
    pub ignore_if_better: bool,
}

impl AccessRule {
    pub fn new(pattern: impl Into<String>, classification: AccessClassification) -> Self {
        Self {
            pattern: pattern.into(),
            classification,
            ignore_if_better: false,
        }
    }

    pub fn accessible(pattern: impl Into<String>) -> Self {
        Self::new(pattern, AccessClassification::Accessible)
    }

    pub fn discouraged(pattern: impl Into<String>) -> Self {
        Self::new(pattern, AccessClassification::Discouraged)
    }

    pub fn forbidden(pattern: impl Into<String>) -> Self {
        Self::new(pattern, AccessClassification::NonAccessible)
    }

    pub fn ignore_if_better(mut self) -> Self {
        self.ignore_if_better = true;
        self
    }

    pub fn matches(&self, type_path: &str) -> bool {
        matches_pattern(&self.pattern, type_path)
    }
}

/// Result of classifying one type against a rule set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccessVerdict {
    pub classification: AccessClassification,
    pub ignore_if_better: bool,
}

impl AccessVerdict {
    pub const ACCESSIBLE: AccessVerdict = AccessVerdict {
        classification: AccessClassification::Accessible,
        ignore_if_better: false,
    };
}

/// Ordered list of access rules attached to an edge.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "persist", serde(transparent))]
pub struct AccessRuleSet {
    rules: Vec<AccessRule>,
}

impl AccessRuleSet {
    pub fn new(rules: Vec<AccessRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[AccessRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Classify `name`: first matching rule wins, no match means accessible.
    pub fn classify(&self, name: &TypeName) -> AccessVerdict {
        let path = name.as_path();
        self.rules
            .iter()
            .find(|rule| rule.matches(&path))
            .map(|rule| AccessVerdict {
                classification: rule.classification,
                ignore_if_better: rule.ignore_if_better,
            })
            .unwrap_or(AccessVerdict::ACCESSIBLE)
    }

    /// Rules of an outer edge followed by the rules of an inner edge, as seen
    /// through a chain of exported entries.
    pub fn concat(&self, inner: &AccessRuleSet) -> AccessRuleSet {
        let mut rules = self.rules.clone();
        rules.extend(inner.rules.iter().cloned());
        AccessRuleSet { rules }
    }
}

impl FromIterator<AccessRule> for AccessRuleSet {
    fn from_iter<T: IntoIterator<Item = AccessRule>>(iter: T) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}

/// Match a slash-separated path against a rule pattern.
pub fn matches_pattern(pattern: &str, path: &str) -> bool {
    let pattern: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let path: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    match_segments(&pattern, &path)
}

fn match_segments(pattern: &[&str], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((&"**", rest)) => {
            (0..=path.len()).any(|skip| match_segments(rest, &path[skip..]))
        }
        Some((segment, rest)) => match path.split_first() {
            Some((head, tail)) => match_segment(segment, head) && match_segments(rest, tail),
            None => false,
        },
    }
}

fn match_segment(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some((pi, ti));
            pi += 1;
        } else if let Some((star_pi, star_ti)) = star {
            pi = star_pi + 1;
            ti = star_ti + 1;
            star = Some((star_pi, star_ti + 1));
        } else {
            return false;
        }
    }
    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}
