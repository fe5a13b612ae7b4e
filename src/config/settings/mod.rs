#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

use crate::embeddings::ollama::DEFAULT_EMBEDDING_DIMENSION;

const APP_DIR_NAME: &str = "hoopscout";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub similarity: SimilarityConfig,
    #[serde(default)]
    pub summarize: SummarizeConfig,
    #[serde(default)]
    pub shots: ShotsConfig,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OllamaConfig {
    pub protocol: String,
    pub host: String,
    pub port: u16,
    pub model: String,
    pub batch_size: u32,
    pub embedding_dimension: u32,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            protocol: "http".to_string(),
            host: "localhost".to_string(),
            port: 11434,
            model: "all-minilm:latest".to_string(),
            batch_size: 64,
            embedding_dimension: DEFAULT_EMBEDDING_DIMENSION,
        }
    }
}

/// Column mapping for the player table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    /// Player file; defaults to `players.csv` in the config directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub id_column: String,
    pub team_column: String,
    pub position_column: String,
    pub height_column: String,
    /// Text embedded for bio search, `{COLUMN}` placeholders are filled per player
    pub bio_template: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: None,
            id_column: "PLAYER_NAME".to_string(),
            team_column: "TEAM_ABBREVIATION".to_string(),
            position_column: "Pos".to_string(),
            height_column: "Height (inches)".to_string(),
            bio_template: "{PLAYER_NAME} is {AGE} years old and plays for {TEAM_ABBREVIATION}"
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimilarityConfig {
    /// Standardized columns for euclidean player similarity
    pub features: Vec<String>,
    /// Raw columns compared by cosine similarity
    pub cosine_features: Vec<String>,
    /// Raw columns compared by manhattan distance
    pub archetype_features: Vec<String>,
    pub default_k: usize,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            features: to_strings(&["PTS", "REB", "AST", "STL", "BLK", "AGE", "GP"]),
            cosine_features: to_strings(&["PTS", "REB", "AST", "AGE", "Height (inches)"]),
            archetype_features: to_strings(&["PTS", "REB", "AST", "AGE"]),
            default_k: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SummarizeConfig {
    pub models: Vec<String>,
    pub min_words: u32,
    pub max_words: u32,
}

impl Default for SummarizeConfig {
    fn default() -> Self {
        Self {
            models: to_strings(&["llama3.2:1b", "qwen2.5:0.5b"]),
            min_words: 30,
            max_words: 100,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShotsConfig {
    /// Shot descriptions with precomputed embeddings; defaults to `shots.json` in the config directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found or could not be created")]
    DirectoryError,
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
    #[error("Invalid port: {0} (must be between 1 and 65535)")]
    InvalidPort(u16),
    #[error("Invalid batch size: {0} (must be between 1 and 1000)")]
    InvalidBatchSize(u32),
    #[error("Invalid model name: {0} (cannot be empty)")]
    InvalidModel(String),
    #[error("Invalid protocol: {0} (must be 'http' or 'https')")]
    InvalidProtocol(String),
    #[error("Invalid embedding dimension: {0} (must be between 8 and 4096)")]
    InvalidEmbeddingDimension(u32),
    #[error("Invalid column name for {0} (cannot be empty)")]
    EmptyColumn(&'static str),
    #[error("Invalid bio template (cannot be empty)")]
    EmptyBioTemplate,
    #[error("Feature list '{0}' cannot be empty")]
    EmptyFeatureList(&'static str),
    #[error("Feature list '{0}' contains duplicate column '{1}'")]
    DuplicateFeature(&'static str, String),
    #[error("Invalid default k: {0} (must be between 1 and 100)")]
    InvalidDefaultK(usize),
    #[error("At least one summarization model must be configured")]
    NoSummaryModels,
    #[error("Invalid summary length bounds: min {0} must be below max {1}")]
    InvalidSummaryBounds(u32, u32),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Config {
    /// Default configuration directory, `hoopscout` under the platform config dir
    #[inline]
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or(ConfigError::DirectoryError)
    }

    #[inline]
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join("config.toml");

        if !config_path.exists() {
            return Ok(Self {
                base_dir: config_dir.as_ref().to_path_buf(),
                ..Self::default()
            });
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
        config.base_dir = config_dir.as_ref().to_path_buf();

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    #[inline]
    pub fn save(&self) -> Result<()> {
        self.validate()
            .context("Configuration validation failed before saving")?;

        let config_dir = self.get_base_dir();

        fs::create_dir_all(config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        let config_path = self.config_file_path();
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    /// Get the base directory for the application
    #[inline]
    pub fn get_base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ollama.validate()?;
        self.validate_catalog_config()?;
        self.validate_similarity_config()?;
        self.validate_summarize_config()?;
        Ok(())
    }

    fn validate_catalog_config(&self) -> Result<(), ConfigError> {
        let config = &self.catalog;

        let columns = [
            ("id_column", &config.id_column),
            ("team_column", &config.team_column),
            ("position_column", &config.position_column),
            ("height_column", &config.height_column),
        ];
        for (name, column) in columns {
            if column.trim().is_empty() {
                return Err(ConfigError::EmptyColumn(name));
            }
        }

        if config.bio_template.trim().is_empty() {
            return Err(ConfigError::EmptyBioTemplate);
        }

        Ok(())
    }

    fn validate_similarity_config(&self) -> Result<(), ConfigError> {
        let config = &self.similarity;

        let lists = [
            ("features", &config.features),
            ("cosine_features", &config.cosine_features),
            ("archetype_features", &config.archetype_features),
        ];
        for (name, list) in lists {
            if list.is_empty() {
                return Err(ConfigError::EmptyFeatureList(name));
            }
            let mut seen = HashSet::new();
            for column in list {
                if !seen.insert(column.as_str()) {
                    return Err(ConfigError::DuplicateFeature(name, column.clone()));
                }
            }
        }

        if !(1..=100).contains(&config.default_k) {
            return Err(ConfigError::InvalidDefaultK(config.default_k));
        }

        Ok(())
    }

    fn validate_summarize_config(&self) -> Result<(), ConfigError> {
        let config = &self.summarize;

        if config.models.is_empty() {
            return Err(ConfigError::NoSummaryModels);
        }
        if let Some(model) = config.models.iter().find(|m| m.trim().is_empty()) {
            return Err(ConfigError::InvalidModel(model.clone()));
        }
        if config.min_words >= config.max_words {
            return Err(ConfigError::InvalidSummaryBounds(
                config.min_words,
                config.max_words,
            ));
        }

        Ok(())
    }

    #[inline]
    pub fn config_file_path(&self) -> PathBuf {
        self.get_base_dir().join("config.toml")
    }

    /// Player file, either configured or `players.csv` next to the config
    #[inline]
    pub fn catalog_path(&self) -> PathBuf {
        self.catalog
            .path
            .clone()
            .unwrap_or_else(|| self.get_base_dir().join("players.csv"))
    }

    #[inline]
    pub fn shots_path(&self) -> PathBuf {
        self.shots
            .path
            .clone()
            .unwrap_or_else(|| self.get_base_dir().join("shots.json"))
    }

    #[inline]
    pub fn ollama_url(&self) -> Result<Url, ConfigError> {
        self.ollama.ollama_url()
    }
}

impl OllamaConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.protocol != "http" && self.protocol != "https" {
            return Err(ConfigError::InvalidProtocol(self.protocol.clone()));
        }

        let url_str = format!("{}://{}:{}", self.protocol, self.host, self.port);
        Url::parse(&url_str).map_err(|_| ConfigError::InvalidUrl(url_str))?;

        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port));
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.model.clone()));
        }

        if self.batch_size == 0 || self.batch_size > 1000 {
            return Err(ConfigError::InvalidBatchSize(self.batch_size));
        }

        if !(8..=4096).contains(&self.embedding_dimension) {
            return Err(ConfigError::InvalidEmbeddingDimension(
                self.embedding_dimension,
            ));
        }

        Ok(())
    }

    pub fn ollama_url(&self) -> Result<Url, ConfigError> {
        let url_str = format!("{}://{}:{}", self.protocol, self.host, self.port);
        Url::parse(&url_str).map_err(|_| ConfigError::InvalidUrl(url_str))
    }

    pub fn set_protocol(&mut self, protocol: String) -> Result<(), ConfigError> {
        if protocol != "http" && protocol != "https" {
            return Err(ConfigError::InvalidProtocol(protocol));
        }
        self.protocol = protocol;
        Ok(())
    }

    pub fn set_host(&mut self, host: String) -> Result<(), ConfigError> {
        let temp_config = OllamaConfig {
            host: host.clone(),
            ..self.clone()
        };
        temp_config.validate()?;
        self.host = host;
        Ok(())
    }

    pub fn set_port(&mut self, port: u16) -> Result<(), ConfigError> {
        if port == 0 {
            return Err(ConfigError::InvalidPort(port));
        }
        self.port = port;
        Ok(())
    }

    pub fn set_model(&mut self, model: String) -> Result<(), ConfigError> {
        if model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(model));
        }
        self.model = model;
        Ok(())
    }

    pub fn set_batch_size(&mut self, batch_size: u32) -> Result<(), ConfigError> {
        if batch_size == 0 || batch_size > 1000 {
            return Err(ConfigError::InvalidBatchSize(batch_size));
        }
        self.batch_size = batch_size;
        Ok(())
    }

    pub fn set_embedding_dimension(&mut self, dimension: u32) -> Result<(), ConfigError> {
        if !(8..=4096).contains(&dimension) {
            return Err(ConfigError::InvalidEmbeddingDimension(dimension));
        }
        self.embedding_dimension = dimension;
        Ok(())
    }
}
