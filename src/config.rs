use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

/// Environment variable that overrides the credential from the config file.
pub const API_KEY_ENV: &str = "PUNCT_FIXER_API_KEY";

/// Process-wide configuration for the punctuation pipeline.
///
/// Built once at startup and not mutated afterwards. Any change to the
/// correction rules or the prompt must bump `pipeline_version` so previously
/// cached results are not reused.
#[derive(Clone, Debug)]
pub struct CorrectorConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub request_timeout: Duration,
    /// Additional attempts after the first request fails.
    pub max_retries: u32,
    /// Base delay between retries; attempt N waits N times this.
    pub retry_delay: Duration,
    pub temperature: f32,
    pub max_tokens: u32,
    pub cache_capacity: usize,
    pub pipeline_version: String,
    /// Inputs shorter than this (in characters, after trimming) are returned
    /// unmodified; too short to safely judge sentence completeness.
    pub min_input_len: usize,
    /// Maximum allowed word-count difference between a correction candidate
    /// and the original fragment before the candidate is discarded.
    pub max_word_drift: usize,
    pub config_path: PathBuf,
}

impl Default for CorrectorConfig {
    fn default() -> Self {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: std::env::var(API_KEY_ENV).unwrap_or_default(),
            model: "gpt-4o-mini".to_string(),
            request_timeout: Duration::from_secs(10),
            max_retries: 2,
            retry_delay: Duration::from_millis(1000),
            temperature: 0.1,
            max_tokens: 256,
            cache_capacity: 1000,
            pipeline_version: "v3".to_string(),
            min_input_len: 5,
            max_word_drift: 2,
            config_path: PathBuf::from(&home).join(".config/punct-fixer/config.toml"),
        }
    }
}

impl CorrectorConfig {
    /// Load configuration from the default config file, falling back to
    /// defaults for anything missing. The credential can always be supplied
    /// through `PUNCT_FIXER_API_KEY`, which wins over the file.
    pub fn load() -> Self {
        let config = CorrectorConfig::default();
        Self::load_from(config.config_path.clone())
    }

    pub fn load_from(path: PathBuf) -> Self {
        let mut config = CorrectorConfig::default();
        config.config_path = path;

        if let Ok(contents) = fs::read_to_string(&config.config_path) {
            match contents.parse::<toml_edit::DocumentMut>() {
                Ok(parsed) => config.apply_document(&parsed),
                Err(e) => warn!("Ignoring malformed config file: {}", e),
            }
        }

        // Environment wins over the file for the credential.
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.is_empty() {
                config.api_key = key;
            }
        }

        config
    }

    fn apply_document(&mut self, doc: &toml_edit::DocumentMut) {
        if let Some(endpoint) = doc.get("endpoint").and_then(|v| v.as_str()) {
            self.endpoint = endpoint.to_string();
        }
        if let Some(api_key) = doc.get("api_key").and_then(|v| v.as_str()) {
            self.api_key = api_key.to_string();
        }
        if let Some(model) = doc.get("model").and_then(|v| v.as_str()) {
            self.model = model.to_string();
        }
        if let Some(secs) = doc.get("timeout_secs").and_then(|v| v.as_integer()) {
            self.request_timeout = Duration::from_secs(secs.max(1) as u64);
        }
        if let Some(retries) = doc.get("max_retries").and_then(|v| v.as_integer()) {
            self.max_retries = retries.max(0) as u32;
        }
        if let Some(ms) = doc.get("retry_delay_ms").and_then(|v| v.as_integer()) {
            self.retry_delay = Duration::from_millis(ms.max(0) as u64);
        }
        if let Some(temp) = doc.get("temperature").and_then(|v| v.as_float()) {
            self.temperature = temp as f32;
        }
        if let Some(tokens) = doc.get("max_tokens").and_then(|v| v.as_integer()) {
            self.max_tokens = tokens.max(1) as u32;
        }
        if let Some(capacity) = doc.get("cache_capacity").and_then(|v| v.as_integer()) {
            self.cache_capacity = capacity.max(0) as usize;
        }
        if let Some(version) = doc.get("pipeline_version").and_then(|v| v.as_str()) {
            self.pipeline_version = version.to_string();
        }
        if let Some(len) = doc.get("min_input_len").and_then(|v| v.as_integer()) {
            self.min_input_len = len.max(0) as usize;
        }
        if let Some(drift) = doc.get("max_word_drift").and_then(|v| v.as_integer()) {
            self.max_word_drift = drift.max(0) as usize;
        }
    }

    /// Write the non-secret settings back to the config file.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let mut doc = toml_edit::DocumentMut::new();
        doc["endpoint"] = toml_edit::value(self.endpoint.clone());
        doc["model"] = toml_edit::value(self.model.clone());
        doc["timeout_secs"] = toml_edit::value(self.request_timeout.as_secs() as i64);
        doc["max_retries"] = toml_edit::value(self.max_retries as i64);
        doc["retry_delay_ms"] = toml_edit::value(self.retry_delay.as_millis() as i64);
        doc["temperature"] = toml_edit::value(self.temperature as f64);
        doc["max_tokens"] = toml_edit::value(self.max_tokens as i64);
        doc["cache_capacity"] = toml_edit::value(self.cache_capacity as i64);
        doc["pipeline_version"] = toml_edit::value(self.pipeline_version.clone());
        doc["min_input_len"] = toml_edit::value(self.min_input_len as i64);
        doc["max_word_drift"] = toml_edit::value(self.max_word_drift as i64);

        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.config_path, doc.to_string())
    }
}
