use crate::problem::Severity;

/// Default bound on compile iterations within one project visit.
pub const DEFAULT_MAX_COMPILE_LOOP: usize = 5;

/// Workspace-wide build configuration.
///
/// Deserialises from JSON with every field optional:
///
/// ```json
/// { "cycle_severity": "error", "parallel_units": true }
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "persist", serde(default))]
pub struct BuildOptions {
    /// Severity of build path cycle problems.
    pub cycle_severity: Severity,
    /// Skip projects carrying an error-severity cycle problem.
    pub abort_on_build_path_errors: bool,
    pub forbidden_reference_severity: Severity,
    pub discouraged_reference_severity: Severity,
    /// Compile the dirty units of one project in parallel.
    pub parallel_units: bool,
    /// Compile iterations allowed per project visit before remaining units
    /// are left pending.
    pub max_compile_loop: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            cycle_severity: Severity::Warning,
            abort_on_build_path_errors: true,
            forbidden_reference_severity: Severity::Error,
            discouraged_reference_severity: Severity::Warning,
            parallel_units: false,
            max_compile_loop: DEFAULT_MAX_COMPILE_LOOP,
        }
    }
}

impl BuildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cycle_severity(mut self, severity: Severity) -> Self {
        self.cycle_severity = severity;
        self
    }

    pub fn with_abort_on_build_path_errors(mut self, abort: bool) -> Self {
        self.abort_on_build_path_errors = abort;
        self
    }

    pub fn with_parallel_units(mut self, parallel: bool) -> Self {
        self.parallel_units = parallel;
        self
    }

    pub fn with_max_compile_loop(mut self, max: usize) -> Self {
        self.max_compile_loop = max.max(1);
        self
    }

    /// Whether projects with an error-severity cycle are skipped.
    pub fn cycles_abort(&self) -> bool {
        self.abort_on_build_path_errors && self.cycle_severity == Severity::Error
    }

    #[cfg(feature = "persist")]
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
