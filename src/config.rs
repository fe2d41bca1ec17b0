use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::chunk::ChunkOptions;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub viewer: ViewerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            overlap: default_overlap(),
        }
    }
}

fn default_window_size() -> usize {
    1000
}
fn default_overlap() -> usize {
    200
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct CompletionConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: default_base_url(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_temperature() -> f64 {
    0.2
}
fn default_max_output_tokens() -> u32 {
    600
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_max_retries() -> u32 {
    2
}

impl CompletionConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ViewerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    4545
}

impl Config {
    /// Built-in defaults, used when no config file exists.
    pub fn minimal() -> Self {
        Self::default()
    }

    /// Chunker geometry from `[chunking]`.
    pub fn chunk_options(&self) -> Result<ChunkOptions> {
        ChunkOptions::new(self.chunking.window_size, self.chunking.overlap)
    }
}

/// Load the config at `path`, or the defaults when the file does not exist.
pub fn load_config_or_default(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(Config::minimal());
    }
    load_config(path)
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    // Validate chunking
    config.chunk_options()?;

    // Validate retrieval
    if config.retrieval.top_k < 1 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }

    // Validate completion
    if !(0.0..=2.0).contains(&config.completion.temperature) {
        anyhow::bail!("completion.temperature must be in [0.0, 2.0]");
    }

    match config.completion.provider.as_str() {
        "disabled" | "openai" => {}
        other => anyhow::bail!(
            "Unknown completion provider: '{}'. Must be disabled or openai.",
            other
        ),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.chunking.window_size, 1000);
        assert_eq!(config.chunking.overlap, 200);
        assert_eq!(config.retrieval.top_k, 5);
        assert!(!config.completion.is_enabled());
        assert_eq!(config.viewer.port, 4545);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let file = write_config("[chunking]\nwindow_size = 50\noverlap = 5\n");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.chunk_options().unwrap().window_size(), 50);
        assert_eq!(config.completion.model, "gpt-4o-mini");
        assert_eq!(config.completion.max_output_tokens, 600);
    }

    #[test]
    fn test_overlap_must_be_smaller_than_window() {
        let file = write_config("[chunking]\nwindow_size = 10\noverlap = 10\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("overlap"), "{}", err);
    }

    #[test]
    fn test_rejects_bad_values() {
        for body in [
            "[retrieval]\ntop_k = 0\n",
            "[completion]\ntemperature = 3.0\n",
            "[completion]\nprovider = \"anthropic\"\n",
            "[chunking]\nwindow_size = 0\n",
            "not toml at all [",
        ] {
            let file = write_config(body);
            assert!(load_config(file.path()).is_err(), "accepted: {}", body);
        }
    }

    #[test]
    fn test_example_config_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/canvas.example.toml");
        let config = load_config(&path).unwrap();
        assert_eq!(config.chunking.window_size, 1000);
        assert_eq!(config.viewer.bind, "127.0.0.1");
        assert_eq!(config.completion.max_retries, 2);
    }
}
