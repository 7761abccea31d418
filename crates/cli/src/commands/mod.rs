pub mod doctor;
pub mod serve;

use anyhow::Context;
use deskpilot_config::AppConfig;
use std::collections::HashMap;
use std::path::Path;

/// Load the config from `path`, or the default location, with
/// environment overrides applied. A `.env` file in the working directory
/// fills in variables the process environment does not set.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let default_path = AppConfig::config_dir().join("config.toml");
    let dotenv = dotenv_vars(Path::new(".env"));
    load_config_with(path.unwrap_or(&default_path), &dotenv)
}

/// Load `path` and apply overrides from the process environment, falling
/// back to `dotenv` for unset keys.
pub fn load_config_with(path: &Path, dotenv: &HashMap<String, String>) -> anyhow::Result<AppConfig> {
    let mut config = AppConfig::load_from(path).context("Failed to load config")?;
    config.apply_env(|key| std::env::var(key).ok().or_else(|| dotenv.get(key).cloned()));
    config.validate().context("Invalid config")?;
    Ok(config)
}

/// Parse a `.env` file without touching the process environment.
/// A missing or unreadable file yields no variables.
fn dotenv_vars(path: &Path) -> HashMap<String, String> {
    match dotenvy::from_path_iter(path) {
        Ok(iter) => iter.filter_map(Result::ok).collect(),
        Err(e) => {
            if !e.not_found() {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable .env file");
            }
            HashMap::new()
        }
    }
}
