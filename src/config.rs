use serde::Deserialize;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, TaipoError};
use crate::input;

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const ORIGINAL_COMMAND_VAR: &str = "TAIPO_ORIGINAL_COMMAND";
pub const DEBUG_VAR: &str = "TAIPO_DEBUG";
pub const CONFIG_PATH_VAR: &str = "TAIPO_CONFIG";
pub const MODEL_VAR: &str = "TAIPO_MODEL";
pub const BASE_URL_VAR: &str = "TAIPO_BASE_URL";
pub const TIMEOUT_VAR: &str = "TAIPO_TIMEOUT";

/// How much confirmation is required before a suggested command runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutomationMode {
    #[default]
    Manual,
    Autonomous,
    Smart,
}

impl fmt::Display for AutomationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AutomationMode::Manual => "manual",
            AutomationMode::Autonomous => "autonomous",
            AutomationMode::Smart => "smart",
        };
        f.write_str(name)
    }
}

/// On-disk mode file. `mode` is the only recognized key.
#[derive(Debug, Deserialize)]
struct ModeFile {
    mode: AutomationMode,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub openai_model: String,
    pub openai_base_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_seconds: u64,
    pub config_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        let config_path = dirs_next::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".taipo")
            .join("config.json");

        Self {
            openai_model: "gpt-4".to_string(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            max_tokens: 200,
            temperature: 0.2,
            timeout_seconds: 30,
            config_path,
        }
    }
}

impl AppConfig {
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from defaults plus `TAIPO_*` overrides read through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(model) = non_blank(lookup(MODEL_VAR)) {
            config.openai_model = model;
        }
        if let Some(url) = non_blank(lookup(BASE_URL_VAR)) {
            config.openai_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(raw) = non_blank(lookup(TIMEOUT_VAR)) {
            match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout_seconds = secs,
                _ => log::warn!("Ignoring invalid {}={:?}", TIMEOUT_VAR, raw),
            }
        }
        if let Some(path) = non_blank(lookup(CONFIG_PATH_VAR)) {
            config.config_path = PathBuf::from(path);
        }

        config
    }

    /// Reads the automation mode. Never fails: any problem means `manual`.
    pub fn load_mode(&self) -> AutomationMode {
        read_mode(&self.config_path)
    }
}

pub fn read_mode(path: &Path) -> AutomationMode {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            log::debug!("No mode config at {} ({}), using manual", path.display(), e);
            return AutomationMode::Manual;
        }
    };

    match serde_json::from_str::<ModeFile>(&content) {
        Ok(file) => file.mode,
        Err(e) => {
            log::debug!("Invalid mode config at {} ({}), using manual", path.display(), e);
            AutomationMode::Manual
        }
    }
}

/// `--debug` or `TAIPO_DEBUG=1`.
pub fn debug_enabled(flag: bool) -> bool {
    flag || env::var(DEBUG_VAR).map(|v| v.trim() == "1").unwrap_or(false)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Everything a run needs, captured once at startup.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub config: AppConfig,
    pub mode: AutomationMode,
    pub api_key: Option<String>,
    pub debug: bool,
    pub raw_input: String,
}

impl RunContext {
    pub fn new(
        config: AppConfig,
        mode: AutomationMode,
        api_key: Option<String>,
        debug: bool,
        raw_input: impl Into<String>,
    ) -> Self {
        Self {
            config,
            mode,
            api_key: non_blank(api_key),
            debug,
            raw_input: raw_input.into(),
        }
    }

    /// Captures the process environment. `args` are the trailing CLI arguments.
    pub fn from_env(args: &[String], debug_flag: bool) -> Self {
        let config = AppConfig::load();
        let mode = config.load_mode();
        let debug = debug_enabled(debug_flag);
        let raw_input = input::resolve_raw_input(env::var(ORIGINAL_COMMAND_VAR).ok(), args);

        Self::new(config, mode, env::var(API_KEY_VAR).ok(), debug, raw_input)
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| TaipoError::CredentialError {
            message: format!("Please set {} in your environment.", API_KEY_VAR),
        })
    }

    pub fn smart(&self) -> bool {
        self.mode == AutomationMode::Smart
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("config.json");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_read_mode_values() {
        let dir = TempDir::new().unwrap();

        let path = write_config(&dir, r#"{"mode": "smart"}"#);
        assert_eq!(read_mode(&path), AutomationMode::Smart);

        let path = write_config(&dir, r#"{"mode": "autonomous"}"#);
        assert_eq!(read_mode(&path), AutomationMode::Autonomous);

        let path = write_config(&dir, r#"{"mode": "manual", "colour": "blue"}"#);
        assert_eq!(read_mode(&path), AutomationMode::Manual);
    }

    #[test]
    fn test_read_mode_falls_back_to_manual() {
        let dir = TempDir::new().unwrap();

        assert_eq!(read_mode(&dir.path().join("missing.json")), AutomationMode::Manual);

        let path = write_config(&dir, "not json {");
        assert_eq!(read_mode(&path), AutomationMode::Manual);

        let path = write_config(&dir, r#"{"mode": "yolo"}"#);
        assert_eq!(read_mode(&path), AutomationMode::Manual);

        let path = write_config(&dir, r#"{"mode": 3}"#);
        assert_eq!(read_mode(&path), AutomationMode::Manual);

        let path = write_config(&dir, r#"{}"#);
        assert_eq!(read_mode(&path), AutomationMode::Manual);

        // A directory cannot be read as a file
        assert_eq!(read_mode(dir.path()), AutomationMode::Manual);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            (MODEL_VAR, "gpt-4o-mini"),
            (BASE_URL_VAR, "http://localhost:9999/v1/"),
            (TIMEOUT_VAR, "5"),
            (CONFIG_PATH_VAR, "/tmp/taipo.json"),
        ]
        .into_iter()
        .collect();

        let config = AppConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.openai_model, "gpt-4o-mini");
        assert_eq!(config.openai_base_url, "http://localhost:9999/v1");
        assert_eq!(config.timeout_seconds, 5);
        assert_eq!(config.config_path, PathBuf::from("/tmp/taipo.json"));
    }

    #[test]
    fn test_invalid_timeout_is_ignored() {
        let config = AppConfig::from_lookup(|k| (k == TIMEOUT_VAR).then(|| "soon".to_string()));
        assert_eq!(config.timeout_seconds, 30);

        let config = AppConfig::from_lookup(|k| (k == TIMEOUT_VAR).then(|| "0".to_string()));
        assert_eq!(config.timeout_seconds, 30);
    }

    #[test]
    fn test_blank_api_key_is_missing() {
        let ctx = RunContext::new(AppConfig::default(), AutomationMode::Manual, Some("  ".into()), false, "gti");
        assert!(ctx.api_key.is_none());
        let err = ctx.require_api_key().unwrap_err();
        assert_eq!(err.exit_code(), 1);
        assert!(err.user_message().contains(API_KEY_VAR));
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(AutomationMode::default().to_string(), "manual");
        assert_eq!(AutomationMode::Smart.to_string(), "smart");
    }
}
