//! `deskpilot doctor`: diagnose configuration.

use deskpilot_config::AppConfig;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Ok,
    Warn,
    Fail,
}

#[derive(Debug)]
pub struct Check {
    pub level: Level,
    pub message: String,
}

impl Check {
    fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Offline checks over a loaded config. Nothing is contacted.
pub fn checks(config: &AppConfig) -> Vec<Check> {
    let mut out = Vec::new();

    match config.validate() {
        Ok(()) => out.push(Check::new(Level::Ok, "Settings valid")),
        Err(e) => out.push(Check::new(Level::Fail, format!("Settings invalid: {e}"))),
    }

    if config.openai.api_key.is_some() {
        out.push(Check::new(
            Level::Ok,
            format!("OpenAI key configured ({})", config.openai.base_url),
        ));
    } else {
        out.push(Check::new(Level::Fail, "OPENAI_API_KEY is not set"));
    }

    if config.retrieval.api_key.is_none() {
        out.push(Check::new(Level::Warn, "PINECONE_API_KEY is not set; /query is unavailable"));
    } else if config.retrieval.host.is_none() && config.retrieval.index.is_none() {
        out.push(Check::new(
            Level::Warn,
            "Neither PINECONE_HOST nor PINECONE_INDEX is set; /query is unavailable",
        ));
    } else {
        out.push(Check::new(Level::Ok, "Vector index configured"));
    }

    if config.has_store_credentials() {
        out.push(Check::new(
            Level::Ok,
            format!("Record store credentials configured ({})", config.store.url),
        ));
    } else {
        out.push(Check::new(
            Level::Warn,
            "POCKETBASE_ADMIN_EMAIL/POCKETBASE_ADMIN_PASSWORD not set; /summary and /letter will fail",
        ));
    }

    out
}

pub fn run(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    println!("DeskPilot Doctor: Configuration Diagnostics");
    println!("=========================================\n");

    let path = config_path
        .clone()
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"));
    if path.exists() {
        println!("  [ok]   Config file {}", path.display());
    } else {
        println!("  [warn] No config file at {}; using defaults and environment", path.display());
    }

    let config = match super::load_config(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            println!("  [fail] {e}");
            return Ok(());
        }
    };

    let results = checks(&config);
    for check in &results {
        let tag = match check.level {
            Level::Ok => "[ok]  ",
            Level::Warn => "[warn]",
            Level::Fail => "[fail]",
        };
        println!("  {tag} {}", check.message);
    }

    let issues = results.iter().filter(|c| c.level != Level::Ok).count();
    println!();
    if issues == 0 {
        println!("  All checks passed!");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_report_missing_credentials() {
        let results = checks(&AppConfig::default());
        assert_eq!(results[0].level, Level::Ok);
        assert!(results.iter().any(|c| c.level == Level::Fail && c.message.contains("OPENAI_API_KEY")));
        assert!(results.iter().any(|c| c.message.contains("PINECONE_API_KEY")));
        assert!(results.iter().any(|c| c.message.contains("POCKETBASE_ADMIN_EMAIL")));
    }

    #[test]
    fn fully_configured_passes() {
        let mut config = AppConfig::default();
        config.openai.api_key = Some("sk-test".into());
        config.retrieval.api_key = Some("pc-test".into());
        config.retrieval.index = Some("helpdesk".into());
        config.store.admin_email = Some("admin@example.com".into());
        config.store.admin_password = Some("hunter2".into());

        assert!(checks(&config).iter().all(|c| c.level == Level::Ok));
    }

    #[test]
    fn invalid_settings_fail() {
        let mut config = AppConfig::default();
        config.agent.max_iterations = 0;
        assert_eq!(checks(&config)[0].level, Level::Fail);
    }
}
