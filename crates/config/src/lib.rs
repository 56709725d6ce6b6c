//! Configuration loading, validation, and env substitution.
//!
//! Config files: `connecty.toml`, `connecty.yaml`, or `connecty.json`
//! Searched in `./` then `~/.config/connecty/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{config_dir, find_config_file, load_config, load_config_value},
    schema::{CircuitConfig, ConnectyConfig, DiscordConfig, RelayConfig},
    validate::{Diagnostic, Severity, ValidationResult, validate_config, validate_file},
};
