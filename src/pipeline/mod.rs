//! Pipeline module - loading, caries derivation, merging and cleaning stages

pub mod caries;
pub mod config;
pub mod discovery;
pub mod encode;
pub mod error;
pub mod loader;
pub mod merge;
pub mod output;
pub mod prune;
pub mod runner;
pub mod scrub;
pub mod table;
pub mod xpt;

pub use caries::*;
pub use config::*;
pub use discovery::*;
pub use encode::*;
pub use error::{DataError, PipelineError};
pub use loader::*;
pub use merge::*;
pub use output::*;
pub use prune::*;
pub use runner::*;
pub use scrub::*;
pub use table::*;
