//! Newsletter CLI
//!
//! Wires the Sleeper fetcher, weekly report engine, league registry and
//! season archive into the `newsletter` binary.

pub mod cli;
pub mod logging;
pub mod pipeline;
pub mod settings;
pub mod summary;

pub use cli::{Cli, CliHandler, Commands};
pub use logging::initialize_logging;
pub use pipeline::{Pipeline, PipelineError};
pub use settings::Settings;
