//! Configuration for the runtime mesh proxy and its demo host.
//!
//! Settings persist to disk as `config.ron`, accept CLI overrides via clap, and
//! tolerate missing or unknown fields so old files keep loading.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{CONFIG_FILE_NAME, Config, DebugConfig, LodConfig, RenderConfig, default_config_dir};
pub use error::ConfigError;
