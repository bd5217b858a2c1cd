//! Incremental Build Driver tests
//!
//! End-to-end builds through the outline compiler:
//! - Incremental recompilation and idempotence
//! - Cycles and multi-pass convergence
//! - Classpath visibility, access rules, missing build path entries
//! - Compiler failures, cancellation, duplicate types
//! - Persisted States and build path reconfiguration

pub mod tests_config;
pub mod tests_cycles;
pub mod tests_failures;
pub mod tests_incremental;
#[cfg(feature = "persist")]
pub mod tests_persistence;
