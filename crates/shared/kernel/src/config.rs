use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File consulted when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "aflow.toml";
/// Prefix of environment overrides (`AFLOW__SERVER__PORT=4000`).
pub const ENV_PREFIX: &str = "AFLOW";

#[aflow_derive::aflow_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Layered configuration loader: optional file first, then environment overrides.
///
/// 1. **File**: the given path (must exist), or [`DEFAULT_CONFIG_FILE`] in the
///    working directory (optional; defaults apply when it is missing).
/// 2. **Environment**: variables prefixed with `AFLOW__`; nested keys are
///    separated by double underscores (`AFLOW__WATCH__DEBOUNCE_MS` maps to
///    `watch.debounce_ms`).
///
/// # Errors
/// Returns [`ConfigError::Config`] if an explicit file is missing, a file is
/// malformed, or the merged values do not deserialize into `T`.
///
/// # Example
/// ```rust
/// use aflow_kernel::config::load_config;
///
/// #[derive(Default, serde::Deserialize)]
/// struct AppConfig {
///     port: u16,
/// }
///
/// let cfg: AppConfig = load_config(Some("config/local.toml")).unwrap_or_default();
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let (effective_path, required) = path.map_or_else(
        || (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        |p| (p.as_ref().to_path_buf(), true),
    );

    let builder = Config::builder()
        .add_source(File::from(effective_path.as_path()).required(required))
        .add_source(
            Environment::with_prefix(ENV_PREFIX).separator("__").convert_case(config::Case::Snake),
        );

    if effective_path.exists() {
        info!(path = %effective_path.display(), "Loading config");
    } else {
        debug!(path = %effective_path.display(), "Config file absent, using defaults");
    }

    let config = builder
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}
