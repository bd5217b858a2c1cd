use parking_lot::Mutex;

use super::{BuildContext, BuildError, BuildOptions, BuildRequest, BuildResult};
use crate::compiler::Compiler;

/// Serialising front door of the engine.
///
/// Holds the compiler and the [`BuildContext`]. A build requested while
/// another is running waits for it to finish; builds never interleave.
pub struct Builder<C> {
    compiler: C,
    context: Mutex<BuildContext>,
}

impl<C: Compiler> Builder<C> {
    pub fn new(compiler: C) -> Self {
        Self::with_context(compiler, BuildContext::new())
    }

    pub fn with_options(compiler: C, options: BuildOptions) -> Self {
        Self::with_context(compiler, BuildContext::with_options(options))
    }

    pub fn with_context(compiler: C, context: BuildContext) -> Self {
        Self {
            compiler,
            context: Mutex::new(context),
        }
    }

    pub fn compiler(&self) -> &C {
        &self.compiler
    }

    pub fn build(&self, request: &BuildRequest) -> Result<BuildResult, BuildError> {
        let mut context = self.context.lock();
        context.build(&self.compiler, request)
    }

    /// Read the context between builds.
    pub fn inspect<R>(&self, f: impl FnOnce(&BuildContext) -> R) -> R {
        f(&self.context.lock())
    }

    pub fn into_context(self) -> BuildContext {
        self.context.into_inner()
    }
}
