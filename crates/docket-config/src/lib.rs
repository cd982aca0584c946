//! Configuration system for Docket.
//!
//! Provides TOML-based configuration with:
//! - One optional section per subsystem (`[llm]`, `[index]`, `[storage]`,
//!   `[reminders]`, `[channel]`, `[ingest]`, `[logging]`)
//! - Config file layering (user config + project-local overrides)
//! - `DOCKET_*` environment overrides applied on top

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    apply_env_overrides, config_dir, default_data_dir, default_log_dir, load_config,
    load_config_file, load_config_with_options, user_config_path, ConfigSource, LoadedConfig,
};
pub use error::{ConfigError, Result};
pub use types::*;
