//! Incremental Build Driver and its public surface.
//!
//! ```ignore
//! use cascade::build::{Builder, BuildRequest};
//! use cascade::compiler::OutlineCompiler;
//!
//! let builder = Builder::new(OutlineCompiler::new());
//! let result = builder.build(&BuildRequest::full(snapshot))?;
//! for problem in result.problems.iter() {
//!     println!("{}", problem.message);
//! }
//! ```

mod builder;
mod context;
mod driver;
mod error;
mod options;
mod request;
mod resolve;

pub use builder::Builder;
pub use context::BuildContext;
#[cfg(feature = "persist")]
pub use context::STATE_FILE_SUFFIX;
pub use error::BuildError;
pub use options::{BuildOptions, DEFAULT_MAX_COMPILE_LOOP};
pub use request::{BuildMode, BuildRequest, BuildResult, BuildStatus};
