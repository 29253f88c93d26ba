//! Configuration loading and validation.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::interview_store::DEFAULT_COLLECTION;

/// Default text-generation model.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Env var holding the generative-AI API key when none is configured.
pub const DEFAULT_API_KEY_ENV: &str = "GOOGLE_GENERATIVE_AI_API_KEY";

/// Env var holding the voice SDK public key when none is configured.
pub const DEFAULT_VOICE_PUBLIC_KEY_ENV: &str = "VAPI_PUBLIC_KEY";

/// Env var holding the voice assistant id when none is configured.
pub const DEFAULT_VOICE_ASSISTANT_ID_ENV: &str = "VAPI_ASSISTANT_ID";

/// Top-level PrepKit configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway: Option<GatewayConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation: Option<GenerationConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<VoiceConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
}

fn default_port() -> u16 {
    3000
}

/// Hosted text-generation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl GenerationConfig {
    /// Resolve the API key: `api_key` first, then `api_key_env`, then
    /// `GOOGLE_GENERATIVE_AI_API_KEY`.
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_secret_field(&self.api_key, &self.api_key_env)
            .or_else(|| env_secret(DEFAULT_API_KEY_ENV))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding collection files. Supports `~`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
}

/// Voice SDK credentials. Both values are public, client-side settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoiceConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_env: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub assistant_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub assistant_id_env: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl VoiceConfig {
    pub fn resolve_public_key(&self) -> Option<String> {
        resolve_secret_field(&self.public_key, &self.public_key_env)
            .or_else(|| env_secret(DEFAULT_VOICE_PUBLIC_KEY_ENV))
    }

    pub fn resolve_assistant_id(&self) -> Option<String> {
        resolve_secret_field(&self.assistant_id, &self.assistant_id_env)
            .or_else(|| env_secret(DEFAULT_VOICE_ASSISTANT_ID_ENV))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log format: "plain" (default) or "json".
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Log level override (trace/debug/info/warn/error).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Per-crate log level overrides (e.g. "prepkit_gateway=debug").
    #[serde(default)]
    pub filters: Vec<String>,

    /// Output target: "stderr" (default) or "stdout".
    #[serde(default = "default_log_output")]
    pub output: String,
}

fn default_log_format() -> String {
    "plain".into()
}

fn default_log_output() -> String {
    "stderr".into()
}

/// Resolve a secret: check the direct value first, then the env-var reference.
pub fn resolve_secret_field(direct: &Option<String>, env_var: &Option<String>) -> Option<String> {
    if let Some(val) = direct {
        if !val.is_empty() {
            return Some(val.clone());
        }
    }
    env_var.as_deref().and_then(env_secret)
}

fn env_secret(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Substitute `${ENV_VAR}` patterns in a string with their environment variable values.
fn substitute_env_vars(input: &str) -> crate::error::Result<String> {
    let re = regex::Regex::new(r"\$\{([^}]+)\}")
        .map_err(|e| crate::error::PrepKitError::Config(e.to_string()))?;
    Ok(re
        .replace_all(input, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        })
        .into_owned())
}

impl Config {
    /// Load config from a JSON5 file, substituting `${ENV_VAR}` references.
    ///
    /// A missing file yields the default config.
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    /// Parse config text (JSON5) after env-var substitution.
    pub fn parse(raw: &str) -> crate::error::Result<Self> {
        let substituted = substitute_env_vars(raw)?;
        json5::from_str(&substituted)
            .map_err(|e| crate::error::PrepKitError::Config(e.to_string()))
    }

    /// Default config file path: `~/.prepkit/config.json`
    pub fn config_path() -> PathBuf {
        data_dir().join("config.json")
    }

    pub fn gateway_port(&self) -> u16 {
        self.gateway.as_ref().map(|g| g.port).unwrap_or(3000)
    }

    pub fn gateway_bind(&self) -> String {
        self.gateway
            .as_ref()
            .and_then(|g| g.bind.clone())
            .unwrap_or_else(|| "0.0.0.0".to_string())
    }

    pub fn generation(&self) -> GenerationConfig {
        self.generation.clone().unwrap_or_default()
    }

    pub fn model(&self) -> String {
        self.generation
            .as_ref()
            .and_then(|g| g.model.clone())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }

    pub fn voice(&self) -> VoiceConfig {
        self.voice.clone().unwrap_or_default()
    }

    /// Resolve the storage directory, expanding `~`.
    pub fn storage_dir(&self) -> PathBuf {
        self.storage
            .as_ref()
            .and_then(|s| s.dir.as_ref())
            .map(|d| PathBuf::from(shellexpand::tilde(d).as_ref()))
            .unwrap_or_else(|| data_dir().join("data"))
    }

    pub fn collection(&self) -> String {
        self.storage
            .as_ref()
            .and_then(|s| s.collection.clone())
            .unwrap_or_else(|| DEFAULT_COLLECTION.to_string())
    }

    /// Get a config value by dotted path (e.g. "gateway.port", "generation.model").
    pub fn get_path(&self, path: &str) -> Option<serde_json::Value> {
        let json = serde_json::to_value(self).ok()?;
        let mut current = &json;
        for segment in path.split('.') {
            current = current.get(segment)?;
        }
        Some(current.clone())
    }

    /// Validate config, returning (warnings, errors).
    pub fn validate(&self) -> (Vec<String>, Vec<String>) {
        let mut warnings = Vec::new();
        let mut errors = Vec::new();

        if self.generation().resolve_api_key().is_none() {
            warnings.push(format!(
                "Generation has no API key configured (set generation.api_key or {DEFAULT_API_KEY_ENV})"
            ));
        }

        let voice = self.voice();
        if voice.resolve_public_key().is_none() {
            warnings.push(format!(
                "Voice has no public key configured (set voice.public_key or {DEFAULT_VOICE_PUBLIC_KEY_ENV})"
            ));
        }
        if voice.resolve_assistant_id().is_none() {
            warnings.push(format!(
                "Voice has no assistant id configured (set voice.assistant_id or {DEFAULT_VOICE_ASSISTANT_ID_ENV})"
            ));
        }

        if let Some(gw) = &self.gateway {
            if gw.port == 0 {
                errors.push("Gateway port cannot be 0".to_string());
            }
        }

        if let Some(collection) = self.storage.as_ref().and_then(|s| s.collection.as_ref()) {
            if collection.is_empty() || collection.contains(['/', '\\']) {
                errors.push(format!("Invalid storage collection name: {collection:?}"));
            }
        }

        (warnings, errors)
    }
}

/// Base directory for PrepKit data: `~/.prepkit/`
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".prepkit")
}
