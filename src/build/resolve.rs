//! Binding compiler-reported references against a classpath.
//!
//! - no candidate anywhere on the classpath: `cannot be resolved to a type`
//! - bound through a restricting access rule: restriction problem, the
//!   reference still binds
//! - a supertype of a bound type that exists only off the classpath:
//!   `indirectly referenced`, once per unit and missing type

use std::collections::{BTreeSet, VecDeque};

use rustc_hash::FxHashSet;

use super::BuildOptions;
use crate::access::AccessClassification;
use crate::base::{ProjectId, TypeName, UnitPath};
use crate::compiler::{ClasspathView, Located, Resolution, TypeReference};
use crate::problem::Problem;

/// What binding one unit's references produced.
#[derive(Debug, Default)]
pub(crate) struct UnitResolution {
    pub problems: Vec<Problem>,
    /// `(from, to)` pairs for the reverse index, including names that did not
    /// resolve and every supertype reached while binding.
    pub links: Vec<(TypeName, TypeName)>,
    /// Types reached only through projects off the classpath.
    pub unreachable: BTreeSet<TypeName>,
}

pub(crate) struct ReferenceResolver<'v> {
    view: &'v ClasspathView<'v>,
    options: &'v BuildOptions,
}

impl<'v> ReferenceResolver<'v> {
    pub fn new(view: &'v ClasspathView<'v>, options: &'v BuildOptions) -> Self {
        Self { view, options }
    }

    pub fn resolve_unit(
        &self,
        project: &ProjectId,
        unit: &UnitPath,
        references: &[TypeReference],
    ) -> UnitResolution {
        let mut resolution = UnitResolution::default();
        for reference in references {
            for candidate in &reference.candidates {
                resolution
                    .links
                    .push((reference.from.clone(), candidate.clone()));
            }
            let Some(located) = self.view.resolve_first(&reference.candidates) else {
                resolution.problems.push(Problem::undefined_type(
                    project,
                    unit,
                    &reference.written,
                    reference.range,
                ));
                continue;
            };
            if located.access.is_restricted() {
                resolution
                    .problems
                    .push(self.restriction(project, unit, &located, reference));
            }
            self.walk_supertypes(project, unit, &located, reference, &mut resolution);
        }
        resolution
    }

    fn restriction(
        &self,
        project: &ProjectId,
        unit: &UnitPath,
        located: &Located,
        reference: &TypeReference,
    ) -> Problem {
        let discouraged = located.access == AccessClassification::Discouraged;
        let severity = if discouraged {
            self.options.discouraged_reference_severity
        } else {
            self.options.forbidden_reference_severity
        };
        Problem::restricted_access(
            project,
            unit,
            &located.name,
            &located.owner.restriction_source(),
            discouraged,
            reference.range,
        )
        .with_severity(severity)
    }

    fn walk_supertypes(
        &self,
        project: &ProjectId,
        unit: &UnitPath,
        located: &Located,
        reference: &TypeReference,
        resolution: &mut UnitResolution,
    ) {
        let mut seen: FxHashSet<TypeName> = FxHashSet::default();
        seen.insert(located.name.clone());
        let mut queue: VecDeque<(TypeName, TypeName)> = located
            .supertypes
            .iter()
            .map(|s| (located.name.clone(), s.clone()))
            .collect();

        while let Some((referencer, name)) = queue.pop_front() {
            if !seen.insert(name.clone()) {
                continue;
            }
            resolution
                .links
                .push((reference.from.clone(), name.clone()));
            match self.view.resolve(&name) {
                Resolution::Found(supertype) => {
                    queue.extend(
                        supertype
                            .supertypes
                            .iter()
                            .map(|s| (supertype.name.clone(), s.clone())),
                    );
                }
                Resolution::NotVisible { .. } => {
                    if resolution.unreachable.insert(name.clone()) {
                        resolution.problems.push(Problem::indirectly_referenced(
                            project,
                            unit,
                            &name,
                            &referencer,
                            reference.range,
                        ));
                    }
                }
                // Reported by the project that declares the supertype.
                Resolution::Missing => {}
            }
        }
    }
}
