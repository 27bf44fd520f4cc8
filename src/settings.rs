// ADMIN SETTINGS
// Layered configuration for the admin binary: built-in defaults, an optional
// `permchain.toml` in the working directory, then `PERMCHAIN_*` variables.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_LOG_FILTER: &str = "info";
pub const ENV_PREFIX: &str = "PERMCHAIN";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AdminSettings {
    /// Genesis file used by `replay` when none is passed on the command line
    #[serde(default)]
    pub genesis: Option<PathBuf>,

    /// Tracing filter applied when `RUST_LOG` is unset
    pub log_filter: String,
}

impl AdminSettings {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("permchain")
    }

    /// Load with `file_stem` as the optional settings file (any format the
    /// `config` crate recognises by extension).
    pub fn load_from(file_stem: &str) -> Result<Self, ConfigError> {
        Self::load_layered(file_stem, Environment::with_prefix(ENV_PREFIX))
    }

    fn load_layered(file_stem: &str, env: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("log_filter", DEFAULT_LOG_FILTER)?
            .add_source(File::with_name(file_stem).required(false))
            .add_source(env)
            .build()?
            .try_deserialize()
    }
}
