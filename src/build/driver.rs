//! Incremental Build Driver.
//!
//! One build runs in four phases:
//!
//! 1. **Prepare** - discard States that cannot be reused (full mode, removed
//!    projects, fingerprint version changes) and invalidate States whose build
//!    path changed.
//! 2. **Seed** - resolve the change set into dirty units and drop removed ones.
//! 3. **Execute** - walk the scheduled components; inside each project,
//!    compile dirty units until no new local work appears, pushing structural
//!    changes to other projects through the analyzer.
//! 4. **Finish** - park leftover work as pending and collect problems.

use std::any::Any;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use std::panic::{self, AssertUnwindSafe};

use rayon::prelude::*;
use rustc_hash::FxHasher;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::resolve::{ReferenceResolver, UnitResolution};
use super::{BuildError, BuildMode, BuildOptions, BuildRequest, BuildResult, BuildStatus};
use crate::analysis::StructuralDependencyAnalyzer;
use crate::base::{ProjectId, TypeName, UnitPath};
use crate::changes::{ChangeSet, ChangeSetResolver, DirtySet};
use crate::compiler::{ClasspathView, CompileOutput, Compiler, SourceUnit, TypeReference};
use crate::fingerprint::ContentFingerprint;
use crate::graph::{ProjectGraph, cycle_paths};
use crate::problem::{Problem, ProblemSet};
use crate::schedule::{BuildOrder, BuildOrderScheduler, BuildPlan, ScheduledComponent};
use crate::state::{ProjectState, StateMap};
use crate::workspace::{Project, WorkspaceSnapshot};

/// Run one build against `states`.
pub(crate) fn run<C: Compiler + ?Sized>(
    states: &mut StateMap,
    options: &BuildOptions,
    compiler: &C,
    request: &BuildRequest,
) -> Result<BuildResult, BuildError> {
    let snapshot = &request.snapshot;
    if let Some(unknown) = request
        .changes
        .projects()
        .find(|p| snapshot.project(p).is_none())
    {
        return Err(BuildError::MissingProject(unknown.clone()));
    }

    let graph = ProjectGraph::from_workspace(snapshot)?;
    let order = request.order.as_deref().unwrap_or_default();
    let plan = BuildOrderScheduler::new(&graph).with_override(order).plan()?;
    info!(
        "[BUILD] {:?} build: {} projects in {} components",
        request.mode,
        graph.len(),
        plan.len()
    );

    let mut driver = BuildDriver {
        compiler,
        options,
        snapshot,
        graph,
        cancel: &request.cancel,
        states,
        dirty: DirtySet::new(),
        order: BuildOrder::new(),
        status: BuildStatus::Complete,
        blocked: BTreeSet::new(),
    };
    driver.prepare(request.mode);
    driver.seed(&request.changes)?;
    driver.assign_project_problems();
    driver.execute(&plan);
    Ok(driver.finish())
}

/// Outcome of compiling one unit, before it is committed.
enum Compiled {
    Output {
        source: ContentFingerprint,
        output: CompileOutput,
    },
    Failed {
        detail: String,
    },
    /// The unit's text disappeared from the snapshot.
    Vanished,
    Cancelled,
}

enum StateAction {
    Keep,
    Fresh,
    Invalidate,
}

struct BuildDriver<'r, C: ?Sized> {
    compiler: &'r C,
    options: &'r BuildOptions,
    snapshot: &'r WorkspaceSnapshot,
    graph: ProjectGraph,
    cancel: &'r CancellationToken,
    states: &'r mut StateMap,
    dirty: DirtySet,
    order: BuildOrder,
    status: BuildStatus,
    /// Projects not built because of fatal build path problems.
    blocked: BTreeSet<ProjectId>,
}

impl<C: Compiler + ?Sized> BuildDriver<'_, C> {
    // ========================================================================
    // PREPARE
    // ========================================================================

    fn prepare(&mut self, mode: BuildMode) {
        if mode == BuildMode::Full && !self.states.is_empty() {
            debug!("[BUILD] full build, discarding {} states", self.states.len());
            self.states.clear();
        }

        let removed: Vec<ProjectId> = self
            .states
            .keys()
            .filter(|p| self.snapshot.project(p).is_none())
            .cloned()
            .collect();
        let mut orphaned: Vec<TypeName> = Vec::new();
        for project in removed {
            if let Some(state) = self.states.remove(&project) {
                info!("[BUILD] project {} was removed, dropping its state", project);
                orphaned.extend(state.type_names().into_iter().cloned());
            }
        }

        for project in self.snapshot.projects() {
            let name = &project.name;
            let signature = self.classpath_signature(project);
            let action = match self.states.get(name) {
                None => StateAction::Fresh,
                Some(state) if !state.is_compatible() => {
                    warn!(
                        "[BUILD] state of {} has fingerprint version {}, discarding",
                        name,
                        state.fingerprint_version()
                    );
                    StateAction::Fresh
                }
                Some(state) if state.build_path_signature() != signature => {
                    StateAction::Invalidate
                }
                Some(_) => StateAction::Keep,
            };
            match action {
                StateAction::Keep => {}
                StateAction::Fresh => {
                    self.states
                        .insert(name.clone(), ProjectState::new(name.clone(), signature));
                }
                StateAction::Invalidate => {
                    info!("[BUILD] build path of {} changed, rebuilding it", name);
                    if let Some(state) = self.states.get_mut(name) {
                        state.invalidate(signature);
                    }
                    self.dirty.extend(name, self.snapshot.source_units(project));
                }
            }
        }

        if !orphaned.is_empty() {
            for (project, state) in self.states.iter_mut() {
                self.dirty
                    .extend(project, state.forget_references_to(&orphaned));
            }
        }
    }

    /// The project's own build path signature folded with what it sees
    /// through its required closure, so a change to an exported edge further
    /// down invalidates the project too.
    fn classpath_signature(&self, project: &Project) -> u64 {
        let mut hasher = FxHasher::default();
        self.snapshot.build_path_signature(project).hash(&mut hasher);
        for entry in self.graph.required_closure(&project.name) {
            entry.project.hash(&mut hasher);
            entry.rules.hash(&mut hasher);
            let Some(definition) = self.snapshot.project(&entry.project) else {
                continue;
            };
            for library in definition.libraries.iter().filter(|l| l.exported) {
                library.hash(&mut hasher);
                if let Some(contents) = self.snapshot.library(&library.library) {
                    contents.content_hash().hash(&mut hasher);
                }
            }
        }
        hasher.finish()
    }

    // ========================================================================
    // SEED
    // ========================================================================

    fn seed(&mut self, changes: &ChangeSet) -> Result<(), BuildError> {
        let resolver = ChangeSetResolver::new(self.snapshot);
        let resolved = resolver.resolve(changes, self.states)?;
        self.dirty.merge(resolved.dirty);
        let requeued = resolver.drop_removed(&self.graph, &resolved.removed, self.states);
        self.dirty.merge(requeued);
        debug!("[BUILD] {} units dirty after seeding", self.dirty.len());
        Ok(())
    }

    /// Recompute build path problems for every project and decide which
    /// projects cannot be built.
    fn assign_project_problems(&mut self) {
        for project in self.snapshot.projects() {
            let name = &project.name;
            let mut problems = Vec::new();
            let mut fatal = false;

            for missing in self.graph.missing_requirements(name) {
                problems.push(Problem::missing_required_project(name, missing));
                fatal = true;
            }
            for entry in &project.libraries {
                if self.snapshot.library(&entry.library).is_none() {
                    problems.push(Problem::missing_library(name, &entry.library));
                    fatal = true;
                }
            }
            let cycles = cycle_paths(&self.graph, name);
            if !cycles.is_empty() {
                let lines: Vec<String> = cycles.iter().map(ToString::to_string).collect();
                problems.push(Problem::cycle_detected(
                    name,
                    &lines,
                    self.options.cycle_severity,
                ));
                fatal |= self.options.cycles_abort();
            }
            if fatal {
                info!("[BUILD] {} has build path errors and will not be built", name);
                problems.push(Problem::project_not_built(name));
                self.blocked.insert(name.clone());
            }

            if let Some(state) = self.states.get_mut(name) {
                state.set_project_problems(problems);
            }
        }
    }

    // ========================================================================
    // EXECUTE
    // ========================================================================

    fn execute(&mut self, plan: &BuildPlan) {
        self.park_blocked();
        // Each sweep walks the whole plan once; later sweeps only see units
        // dirtied after their project was visited.
        let max_sweeps = plan.len() + 1;
        for sweep in 1..=max_sweeps {
            for component in &plan.components {
                if self.is_cancelled() {
                    return;
                }
                self.build_component(component);
            }
            self.park_blocked();
            if self.dirty.is_empty() || self.is_cancelled() {
                return;
            }
            debug!(
                "[BUILD] sweep {} left {} dirty units",
                sweep,
                self.dirty.len()
            );
        }
    }

    fn build_component(&mut self, component: &ScheduledComponent) {
        let members: Vec<&ProjectId> = component
            .members
            .iter()
            .filter(|m| !self.blocked.contains(*m))
            .collect();
        let max_passes = component.max_passes();

        for pass in 1..=max_passes {
            let mut visited = false;
            for member in &members {
                if self.is_cancelled() {
                    return;
                }
                if self.dirty.has_project(member) {
                    self.visit(member);
                    visited = true;
                }
            }
            if !visited || !members.iter().any(|m| self.dirty.has_project(m)) {
                return;
            }
            if component.cyclic {
                trace!("[BUILD] cycle pass {} of {} left work", pass, max_passes);
            }
        }

        if component.cyclic {
            for member in &members {
                let units = self.dirty.take(member);
                if units.is_empty() {
                    continue;
                }
                warn!(
                    "[BUILD] cycle pass limit reached, {} units of {} left pending",
                    units.len(),
                    member
                );
                if let Some(state) = self.states.get_mut(*member) {
                    state.mark_pending(units);
                }
                self.mark_incomplete();
            }
        }
    }

    /// Build one project until its own dirty set is empty or the compile
    /// loop bound is reached.
    fn visit(&mut self, project: &ProjectId) {
        let mut batch = self.dirty.take(project);
        let Some(mut state) = self.states.remove(project) else {
            warn!("[BUILD] no state for {}, skipping", project);
            return;
        };
        debug!("[BUILD] building {} ({} dirty units)", project, batch.len());

        let mut compiled: Vec<UnitPath> = Vec::new();
        let mut loops = 0;
        while !batch.is_empty() {
            if loops == self.options.max_compile_loop {
                warn!(
                    "[BUILD] compile loop limit reached in {}, {} units left pending",
                    project,
                    batch.len()
                );
                state.mark_pending(std::mem::take(&mut batch));
                self.mark_incomplete();
                break;
            }
            loops += 1;

            let units: Vec<UnitPath> = std::mem::take(&mut batch).into_iter().collect();
            let results = self.compile_batch(project, &state, &units);
            let (next, changed) = self.commit(project, &mut state, results, &mut compiled);

            let this_loop: BTreeSet<&UnitPath> = units.iter().collect();
            batch.extend(next);
            batch.extend(
                StructuralDependencyAnalyzer::local_dependents(&state, &changed)
                    .into_iter()
                    .filter(|unit| !this_loop.contains(unit)),
            );
            let analyzer = StructuralDependencyAnalyzer::new(&self.graph, &*self.states);
            let elsewhere = analyzer.affected_by(project, &changed);
            self.dirty.merge(elsewhere);

            if self.status == BuildStatus::Cancelled {
                state.mark_pending(std::mem::take(&mut batch));
                break;
            }
        }

        self.order.push(project.clone(), compiled);
        self.states.insert(project.clone(), state);
    }

    fn compile_batch(
        &self,
        project: &ProjectId,
        state: &ProjectState,
        units: &[UnitPath],
    ) -> Vec<(UnitPath, Compiled)> {
        let view = ClasspathView::new(&self.graph, self.snapshot, &*self.states, project, Some(state));
        let compile_one = |path: &UnitPath| {
            if self.cancel.is_cancelled() {
                return (path.clone(), Compiled::Cancelled);
            }
            let Some(text) = self.snapshot.sources().get(project, path) else {
                return (path.clone(), Compiled::Vanished);
            };
            let unit = SourceUnit {
                project,
                path,
                text,
            };
            let source = ContentFingerprint::of(text.as_bytes());
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                self.compiler.compile(&unit, &view)
            }));
            let compiled = match outcome {
                Ok(Ok(output)) => Compiled::Output { source, output },
                Ok(Err(error)) => Compiled::Failed {
                    detail: error.to_string(),
                },
                Err(payload) => Compiled::Failed {
                    detail: panic_message(payload.as_ref()),
                },
            };
            (path.clone(), compiled)
        };

        if self.options.parallel_units {
            units.par_iter().map(compile_one).collect()
        } else {
            units.iter().map(compile_one).collect()
        }
    }

    /// Commit compile results in unit order.
    ///
    /// Returns the units the commit itself re-queues and the types whose
    /// dependents must be recompiled.
    fn commit(
        &mut self,
        project: &ProjectId,
        state: &mut ProjectState,
        results: Vec<(UnitPath, Compiled)>,
        compiled: &mut Vec<UnitPath>,
    ) -> (BTreeSet<UnitPath>, Vec<TypeName>) {
        let mut next = BTreeSet::new();
        let mut changed: Vec<TypeName> = Vec::new();
        let mut committed: Vec<(UnitPath, Vec<TypeReference>)> = Vec::new();

        for (path, result) in results {
            match result {
                Compiled::Cancelled => {
                    if self.status != BuildStatus::Cancelled {
                        info!("[BUILD] cancelled while building {}", project);
                    }
                    self.status = BuildStatus::Cancelled;
                    state.mark_pending([path]);
                }
                Compiled::Vanished => {
                    let removed = state.remove_unit(&path);
                    next.extend(removed.also_dirty);
                    changed.extend(removed.types);
                }
                Compiled::Failed { detail } => {
                    warn!("[BUILD] compiler failed on {} in {}: {}", path, project, detail);
                    state.set_unit_problems(
                        &path,
                        vec![Problem::internal_error(project, &path, &detail)],
                    );
                    compiled.push(path);
                }
                Compiled::Output { source, output } => {
                    let update = state.record_unit(&path, source, &output.defined_types);
                    state.set_unit_problems(&path, output.problems);
                    for duplicate in &update.duplicates {
                        state.add_unit_problem(
                            &path,
                            Problem::duplicate_type(project, &path, &duplicate.name),
                        );
                        state.add_unit_problem(
                            &duplicate.owner,
                            Problem::duplicate_type(project, &duplicate.owner, &duplicate.name),
                        );
                    }
                    for name in update.structural_changes() {
                        trace!("[BUILD] {} changed structurally", name);
                        changed.push(name.clone());
                    }
                    next.extend(update.also_dirty);
                    committed.push((path.clone(), output.references));
                    compiled.push(path);
                }
            }
        }

        let resolutions: Vec<UnitResolution> = {
            let view = ClasspathView::new(
                &self.graph,
                self.snapshot,
                &*self.states,
                project,
                Some(&*state),
            );
            let resolver = ReferenceResolver::new(&view, self.options);
            committed
                .iter()
                .map(|(path, references)| resolver.resolve_unit(project, path, references))
                .collect()
        };
        for ((path, _), resolution) in committed.iter().zip(resolutions) {
            state.clear_references(path);
            for (from, to) in &resolution.links {
                state.record_reference(from, to, path);
            }
            for problem in resolution.problems {
                state.add_unit_problem(path, problem);
            }
            state.set_unreachable_types(path, resolution.unreachable);
        }

        (next, changed)
    }

    fn park_blocked(&mut self) {
        for project in &self.blocked {
            let units = self.dirty.take(project);
            if units.is_empty() {
                continue;
            }
            trace!("[BUILD] {} units of blocked {} left pending", units.len(), project);
            if let Some(state) = self.states.get_mut(project) {
                state.mark_pending(units);
            }
        }
    }

    fn is_cancelled(&mut self) -> bool {
        if self.status != BuildStatus::Cancelled && self.cancel.is_cancelled() {
            info!("[BUILD] cancellation requested");
            self.status = BuildStatus::Cancelled;
        }
        self.status == BuildStatus::Cancelled
    }

    fn mark_incomplete(&mut self) {
        if self.status == BuildStatus::Complete {
            self.status = BuildStatus::Incomplete;
        }
    }

    // ========================================================================
    // FINISH
    // ========================================================================

    fn finish(mut self) -> BuildResult {
        let leftover: Vec<ProjectId> = self.dirty.projects().cloned().collect();
        for project in leftover {
            let units = self.dirty.take(&project);
            if let Some(state) = self.states.get_mut(&project) {
                state.mark_pending(units);
            }
            self.mark_incomplete();
        }

        let mut problems = ProblemSet::new();
        for project in self.snapshot.projects() {
            let Some(state) = self.states.get(&project.name) else {
                continue;
            };
            problems.extend(state.project_problems().iter().cloned());
            for missing in state.unreachable_types() {
                problems.add(Problem::incomplete_build_path(&project.name, missing));
            }
            for (_, unit_problems) in state.unit_problems() {
                problems.extend(unit_problems.iter().cloned());
            }
        }

        info!(
            "[BUILD] done: {} steps, {} problems, {:?}",
            self.order.len(),
            problems.len(),
            self.status
        );
        BuildResult {
            order: self.order,
            problems,
            status: self.status,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "compiler panicked".to_string()
    }
}
