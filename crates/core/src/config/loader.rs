use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Environment variable naming the config file when no path is given.
pub const CONFIG_ENV_VAR: &str = "MEDIA_HYGIENE_CONFIG";

const ENV_PREFIX: &str = "MEDIA_HYGIENE_";

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    load_layered_config(Some(path))
}

/// Load defaults, then the optional TOML file, then `MEDIA_HYGIENE_*` variables.
///
/// Nested keys use a double underscore: `MEDIA_HYGIENE_LOOKUP__RETRY__MAX_RETRIES=5`.
/// Arrays from a later layer replace earlier ones wholesale.
pub fn load_layered_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        figment = figment.merge(Toml::file(path));
    }

    figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
