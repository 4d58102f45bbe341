//! Application configuration for postcrew.
//!
//! User config lives at `~/.postcrew/postcrew.toml`.
//! CLI flags override config file values, which override defaults.
//! Secrets are never stored in the file; only the names of the environment
//! variables that hold them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PostcrewError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "postcrew.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".postcrew";

// ---------------------------------------------------------------------------
// Config structs (matching postcrew.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Generation defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Language model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Web search provider settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Image search provider settings.
    #[serde(default)]
    pub images: ImagesConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Directory where generated posts are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Default sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Default writing tone.
    #[serde(default = "default_tone")]
    pub tone: String,

    /// Default post length: short, medium or long.
    #[serde(default = "default_length")]
    pub length: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            temperature: default_temperature(),
            tone: default_tone(),
            length: default_length(),
        }
    }
}

fn default_output_dir() -> String {
    "generated_posts".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_tone() -> String {
    "professional".into()
}
fn default_length() -> String {
    "medium".into()
}

/// `[model]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Name of the env var holding the model API key.
    #[serde(default = "default_model_key_env")]
    pub api_key_env: String,

    /// Name of the env var that may override the model name.
    #[serde(default = "default_model_env")]
    pub model_env: String,

    /// Model used when the override variable is unset.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Base endpoint of the generative language API.
    #[serde(default = "default_model_endpoint")]
    pub endpoint: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_model_timeout")]
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_model_key_env(),
            model_env: default_model_env(),
            default_model: default_model(),
            endpoint: default_model_endpoint(),
            timeout_secs: default_model_timeout(),
        }
    }
}

impl ModelConfig {
    /// Resolve the model name: the override env var wins over `default_model`.
    pub fn resolved_model(&self) -> String {
        optional_key(&self.model_env).unwrap_or_else(|| self.default_model.clone())
    }
}

fn default_model_key_env() -> String {
    "GOOGLE_API_KEY".into()
}
fn default_model_env() -> String {
    "GOOGLE_MODEL_NAME".into()
}
fn default_model() -> String {
    "gemini-1.5-flash".into()
}
fn default_model_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".into()
}
fn default_model_timeout() -> u64 {
    120
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Name of the env var holding the search API key.
    #[serde(default = "default_search_key_env")]
    pub api_key_env: String,

    /// Search endpoint URL.
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_shim_timeout")]
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_search_key_env(),
            endpoint: default_search_endpoint(),
            timeout_secs: default_shim_timeout(),
        }
    }
}

fn default_search_key_env() -> String {
    "SERPER_API_KEY".into()
}
fn default_search_endpoint() -> String {
    "https://google.serper.dev/search".into()
}
fn default_shim_timeout() -> u64 {
    10
}

/// `[images]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagesConfig {
    /// Name of the env var holding the image service access key.
    #[serde(default = "default_images_key_env")]
    pub api_key_env: String,

    /// Image search endpoint URL.
    #[serde(default = "default_images_endpoint")]
    pub endpoint: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_shim_timeout")]
    pub timeout_secs: u64,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_images_key_env(),
            endpoint: default_images_endpoint(),
            timeout_secs: default_shim_timeout(),
        }
    }
}

fn default_images_key_env() -> String {
    "UNSPLASH_ACCESS_KEY".into()
}
fn default_images_endpoint() -> String {
    "https://api.unsplash.com/search/photos".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.postcrew/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| PostcrewError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.postcrew/postcrew.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| PostcrewError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| PostcrewError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| PostcrewError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| PostcrewError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| PostcrewError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Read an optional credential. Unset and empty variables both yield `None`.
pub fn optional_key(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Some(val),
        _ => None,
    }
}

/// Read the model API key, failing with a config error when it is absent.
pub fn require_model_key(model: &ModelConfig) -> Result<String> {
    let var_name = &model.api_key_env;
    optional_key(var_name).ok_or_else(|| {
        PostcrewError::config(format!(
            "model API key not found. Set the {var_name} environment variable."
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("output_dir"));
        assert!(toml_str.contains("GOOGLE_API_KEY"));
        assert!(toml_str.contains("SERPER_API_KEY"));
        assert!(toml_str.contains("UNSPLASH_ACCESS_KEY"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.output_dir, "generated_posts");
        assert_eq!(parsed.search.timeout_secs, 10);
        assert_eq!(parsed.model.api_key_env, "GOOGLE_API_KEY");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[defaults]
output_dir = "/tmp/posts"
temperature = 0.3

[images]
timeout_secs = 5
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.output_dir, "/tmp/posts");
        assert_eq!(config.defaults.tone, "professional");
        assert_eq!(config.images.timeout_secs, 5);
        assert_eq!(config.images.api_key_env, "UNSPLASH_ACCESS_KEY");
        assert_eq!(config.model.default_model, "gemini-1.5-flash");
    }

    #[test]
    fn missing_model_key_is_a_config_error() {
        let mut model = ModelConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        model.api_key_env = "POSTCREW_TEST_NONEXISTENT_KEY_12345".into();
        let result = require_model_key(&model);
        assert!(matches!(result, Err(PostcrewError::Config { .. })));
        assert!(result.unwrap_err().to_string().contains("API key not found"));
    }

    #[test]
    fn resolved_model_falls_back_to_default() {
        let mut model = ModelConfig::default();
        model.model_env = "POSTCREW_TEST_NONEXISTENT_MODEL_12345".into();
        assert_eq!(model.resolved_model(), "gemini-1.5-flash");
    }
}
