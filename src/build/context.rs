use super::{BuildError, BuildOptions, BuildRequest, BuildResult, driver};
use crate::base::ProjectId;
use crate::compiler::Compiler;
use crate::state::{ProjectState, StateMap};

/// Everything that survives from one build to the next: the State of every
/// project and the build options.
#[derive(Clone, Debug, Default)]
pub struct BuildContext {
    states: StateMap,
    options: BuildOptions,
}

impl BuildContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: BuildOptions) -> Self {
        Self {
            states: StateMap::new(),
            options,
        }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: BuildOptions) {
        self.options = options;
    }

    pub fn states(&self) -> &StateMap {
        &self.states
    }

    pub fn state(&self, project: &ProjectId) -> Option<&ProjectState> {
        self.states.get(project)
    }

    pub fn into_states(self) -> StateMap {
        self.states
    }

    /// Run one build, updating the States in place.
    pub fn build<C: Compiler + ?Sized>(
        &mut self,
        compiler: &C,
        request: &BuildRequest,
    ) -> Result<BuildResult, BuildError> {
        driver::run(&mut self.states, &self.options, compiler, request)
    }
}

#[cfg(feature = "persist")]
mod persistence {
    use std::fs;
    use std::path::Path;

    use tracing::{debug, warn};

    use super::BuildContext;
    use crate::build::{BuildError, BuildOptions};
    use crate::state::{PersistError, ProjectState};

    /// File name suffix of persisted States.
    pub const STATE_FILE_SUFFIX: &str = ".state.json";

    impl BuildContext {
        /// Write every State to `<dir>/<project>.state.json` and delete State
        /// files of projects that no longer exist.
        pub fn save_to_dir(&self, dir: &Path) -> Result<(), BuildError> {
            fs::create_dir_all(dir).map_err(PersistError::from)?;
            for (project, state) in &self.states {
                state.save(&dir.join(format!("{project}{STATE_FILE_SUFFIX}")))?;
            }
            for entry in fs::read_dir(dir).map_err(PersistError::from)? {
                let path = entry.map_err(PersistError::from)?.path();
                let Some(project) = state_file_project(&path) else {
                    continue;
                };
                if !self.states.contains_key(project) {
                    debug!("[PERSIST] removing stale {}", path.display());
                    fs::remove_file(&path).map_err(PersistError::from)?;
                }
            }
            debug!("[PERSIST] saved {} states to {}", self.states.len(), dir.display());
            Ok(())
        }

        /// Load every State found in `dir`. A missing directory yields an empty
        /// context; States written by another fingerprint version are skipped.
        pub fn load_from_dir(dir: &Path, options: BuildOptions) -> Result<Self, BuildError> {
            let mut context = Self::with_options(options);
            if !dir.is_dir() {
                return Ok(context);
            }
            for entry in fs::read_dir(dir).map_err(PersistError::from)? {
                let path = entry.map_err(PersistError::from)?.path();
                if state_file_project(&path).is_none() {
                    continue;
                }
                match ProjectState::load(&path) {
                    Ok(state) => {
                        context.states.insert(state.project().clone(), state);
                    }
                    Err(PersistError::VersionMismatch { found, expected }) => {
                        warn!(
                            "[PERSIST] {} has fingerprint version {}, expected {}; ignoring",
                            path.display(),
                            found,
                            expected
                        );
                    }
                    Err(error) => return Err(error.into()),
                }
            }
            Ok(context)
        }
    }

    fn state_file_project(path: &Path) -> Option<&str> {
        path.file_name()?.to_str()?.strip_suffix(STATE_FILE_SUFFIX)
    }
}

#[cfg(feature = "persist")]
pub use persistence::STATE_FILE_SUFFIX;
