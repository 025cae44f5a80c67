use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub elevenlabs: ElevenLabsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Paths the mock webhook answers on. n8n exposes both a production and a
    /// test URL for the same workflow, so both are mounted by default.
    #[serde(default = "default_webhook_paths")]
    pub webhook_paths: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElevenLabsConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Retry budget for transient failures, on top of the first attempt.
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// Backoff step; attempt N of a request waits N times this.
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    #[serde(default = "default_language")]
    pub default_language: String,
    #[serde(default)]
    pub default_voice_id: Option<String>,
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Base URL of the booking webhook new tools point at.
    #[serde(default)]
    pub webhook_base_url: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_webhook_paths() -> Vec<String> {
    vec![
        "/webhook/appointment-webhook".to_string(),
        "/webhook-test/appointment-webhook".to_string(),
    ]
}

fn default_base_url() -> String {
    "https://api.elevenlabs.io/v1".to_string()
}

fn default_timeout_ms() -> u64 {
    15_000
}

fn default_retries() -> u32 {
    2
}

fn default_backoff_ms() -> u64 {
    500
}

fn default_language() -> String {
    "fr".to_string()
}

fn default_model() -> String {
    "eleven_turbo_v2_5".to_string()
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            webhook_paths: default_webhook_paths(),
        }
    }
}

impl Default for ElevenLabsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
            retries: default_retries(),
            backoff_ms: default_backoff_ms(),
            default_language: default_language(),
            default_voice_id: None,
            default_model: default_model(),
            webhook_base_url: None,
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;

        let path_lower = path.to_lowercase();
        if path_lower.ends_with(".json") || path_lower.ends_with(".jsonld") {
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            let config: Config = serde_yaml::from_str(&content)?;
            Ok(config)
        }
    }

    /// Resolve the process configuration: an explicit `CONFIG_PATH` must
    /// load, `conf.yaml` is tried as a fallback, and the built-in defaults
    /// cover the no-file case (the mock webhook needs no secrets). Env
    /// overrides are applied last.
    pub fn resolve() -> Result<Self> {
        let mut config = match std::env::var("CONFIG_PATH") {
            Ok(path) => Config::load(&path)?,
            Err(_) => match Config::load("conf.yaml") {
                Ok(config) => config,
                Err(e) => {
                    tracing::debug!("no conf.yaml ({}), using defaults", e);
                    Config::default()
                }
            },
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Environment variables win over file values. Names match the ones the
    /// deployment scripts already export.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(port) = port.parse() {
                self.system.port = port;
            }
        }
        if let Ok(api_key) = std::env::var("ELEVENLABS_API_KEY") {
            self.elevenlabs.api_key = api_key;
        }
        if let Ok(voice_id) = std::env::var("ELEVENLABS_DEFAULT_VOICE_ID") {
            self.elevenlabs.default_voice_id = Some(voice_id);
        }
        if let Ok(language) = std::env::var("DEFAULT_LANGUAGE") {
            self.elevenlabs.default_language = language;
        }
        if let Ok(model) = std::env::var("DEFAULT_MODEL") {
            self.elevenlabs.default_model = model;
        }
        if let Ok(url) = std::env::var("N8N_WEBHOOK_URL") {
            self.elevenlabs.webhook_base_url = Some(url);
        }
        if let Ok(timeout) = std::env::var("HTTP_TIMEOUT_MS") {
            if let Ok(timeout) = timeout.parse() {
                self.elevenlabs.timeout_ms = timeout;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_platform_conventions() {
        let config = Config::default();
        assert_eq!(config.system.port, 3000);
        assert_eq!(config.system.webhook_paths.len(), 2);
        assert_eq!(config.elevenlabs.base_url, "https://api.elevenlabs.io/v1");
        assert_eq!(config.elevenlabs.timeout_ms, 15_000);
        assert_eq!(config.elevenlabs.retries, 2);
        assert_eq!(config.elevenlabs.backoff_ms, 500);
        assert_eq!(config.elevenlabs.default_language, "fr");
        assert_eq!(config.elevenlabs.default_model, "eleven_turbo_v2_5");
    }

    #[test]
    fn partial_yaml_keeps_defaults_for_missing_fields() {
        let config: Config = serde_yaml::from_str(
            "system:\n  port: 8080\nelevenlabs:\n  api_key: sk-test\n",
        )
        .unwrap();
        assert_eq!(config.system.port, 8080);
        assert_eq!(config.system.host, "0.0.0.0");
        assert_eq!(config.elevenlabs.api_key, "sk-test");
        assert_eq!(config.elevenlabs.retries, 2);
    }

    #[test]
    fn json_config_is_accepted() {
        let config: Config =
            serde_json::from_str(r#"{"elevenlabs": {"timeout_ms": 1000}}"#).unwrap();
        assert_eq!(config.elevenlabs.timeout_ms, 1000);
        assert_eq!(config.system.port, 3000);
    }
}
