//! Assertion helpers over build results.

use cascade::build::BuildResult;
use cascade::problem::{Problem, ProblemKind};
use cascade::{ProjectId, UnitPath};

/// Every compiled unit as `/Project/path`, in compile order.
pub fn compiled(result: &BuildResult) -> Vec<String> {
    result.order.compiled_paths()
}

/// Visited projects, one entry per step.
pub fn visited(result: &BuildResult) -> Vec<String> {
    result
        .order
        .projects()
        .into_iter()
        .map(|p| p.to_string())
        .collect()
}

pub fn project_messages(result: &BuildResult, project: &str) -> Vec<String> {
    messages_of(result.problems.for_project(&ProjectId::new(project)))
}

pub fn unit_messages(result: &BuildResult, project: &str, path: &str) -> Vec<String> {
    messages_of(
        result
            .problems
            .for_unit(&ProjectId::new(project), &UnitPath::new(path)),
    )
}

/// Problems of one kind anywhere in `project`.
pub fn problems_of_kind<'a>(
    result: &'a BuildResult,
    project: &'a ProjectId,
    kind: ProblemKind,
) -> Vec<&'a Problem> {
    result
        .problems
        .all_in_project(project)
        .filter(|p| p.kind == kind)
        .collect()
}

pub fn assert_no_problems(result: &BuildResult) {
    assert!(
        result.problems.is_empty(),
        "Expected no problems, got:\n{}",
        result
            .problems
            .iter()
            .map(|p| format!("  {:?}: {}", p.resource, p.message))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

fn messages_of(problems: &[Problem]) -> Vec<String> {
    problems.iter().map(|p| p.message.to_string()).collect()
}
