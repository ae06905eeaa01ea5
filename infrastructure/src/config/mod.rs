//! Configuration file loading for veil-council
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `VEIL_`-prefixed environment variables (`VEIL_EXPERIMENT__MAX_ROUNDS=6`)
//! 2. `--config <path>` specified file
//! 3. Project root: `./veil.toml` or `./.veil.toml`
//! 4. User config: `$XDG_CONFIG_HOME/veil-council/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileConfig, FileDisclosureConfig, FileDistributionConfig,
    FileExperimentConfig, FileGatewayConfig, FileParticipantConfig,
};
pub use loader::ConfigLoader;
