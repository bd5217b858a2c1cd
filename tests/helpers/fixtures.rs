//! Workspace fixtures and build shorthands.

use cascade::build::{BuildRequest, BuildResult, Builder};
use cascade::changes::ChangeSet;
use cascade::compiler::OutlineCompiler;
use cascade::workspace::{Project, WorkspaceSnapshot};

/// A project with a single `src` root compiling to `bin`.
pub fn project(name: &str) -> Project {
    Project::new(name).with_source_root("src", "bin")
}

pub fn builder() -> Builder<OutlineCompiler> {
    Builder::new(OutlineCompiler::new())
}

pub fn full_build<C: cascade::compiler::Compiler>(
    builder: &Builder<C>,
    snapshot: &WorkspaceSnapshot,
) -> BuildResult {
    builder
        .build(&BuildRequest::full(snapshot.clone()))
        .expect("full build")
}

pub fn incremental_build<C: cascade::compiler::Compiler>(
    builder: &Builder<C>,
    snapshot: &WorkspaceSnapshot,
    changes: ChangeSet,
) -> BuildResult {
    builder
        .build(&BuildRequest::incremental(snapshot.clone(), changes))
        .expect("incremental build")
}

pub const A_PATH: &str = "src/a/A.java";
pub const B_PATH: &str = "src/b/B.java";
pub const A_SOURCE: &str = "package a;\npublic class A { }\n";
pub const B_SOURCE: &str = "package b;\nimport a.A;\npublic class B extends A { }\n";

/// Project `A` defines `a.A`; project `B` requires `A` and defines
/// `b.B extends a.A`.
pub fn a_b_workspace(a_source: &str) -> WorkspaceSnapshot {
    WorkspaceSnapshot::new()
        .with_project(project("A"))
        .with_project(project("B").requires("A"))
        .with_source("A", A_PATH, a_source)
        .with_source("B", B_PATH, B_SOURCE)
}

/// `P1` defines interface `p1.I`; `P2` requires `P1` and defines
/// `p2.X implements I`; `P3` requires `P2` only and uses `X`.
pub fn indirect_workspace() -> WorkspaceSnapshot {
    WorkspaceSnapshot::new()
        .with_project(project("P1"))
        .with_project(project("P2").requires("P1"))
        .with_project(project("P3").requires("P2"))
        .with_source("P1", "src/p1/I.java", "package p1;\npublic interface I { }\n")
        .with_source(
            "P2",
            "src/p2/X.java",
            "package p2;\nimport p1.I;\npublic class X implements I { }\n",
        )
        .with_source(
            "P3",
            "src/p3/Z.java",
            "package p3;\nimport p2.X;\npublic class Z { field X x }\n",
        )
}
