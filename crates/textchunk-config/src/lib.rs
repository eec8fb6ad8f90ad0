//! Configuration for textchunk
//!
//! Chunking settings and logging options, with a simple hierarchy:
//! 1. Safe defaults (defined as constants)
//! 2. A TOML file, when one is given
//! 3. Environment variable overrides
//! 4. Command-line overrides (applied by the binary)
//!
//! Every layer ends in [`validation::Validate`].

pub mod error;
pub mod source;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use source::{ConfigurationLoader, ConfigurationSource, EnvironmentSource, TomlFileSource};
pub use validation::Validate;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

// =============================================================================
// DEFAULTS
// =============================================================================

pub const DEFAULT_CHUNK_SIZE: usize = 512;
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;
pub const DEFAULT_MODEL_NAME: &str = "gpt-3.5-turbo";
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];
/// Marker meaning "every special token the encoding knows"
pub const ALL_SPECIAL_TOKENS: &str = "all";
const DEFAULT_LOG_LEVEL: &str = "info";
const MAX_CHUNK_SIZE: u64 = 1_000_000;

const ENV_PREFIX: &str = "TEXTCHUNK_";

/// Strategy used to cut the input
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChunkMethod {
    /// Fixed windows of tokens
    #[default]
    #[serde(alias = "token")]
    Token,
    /// Recursive separator-based splitting measured in characters
    #[serde(alias = "recursive")]
    Recursive,
    /// Structure-aware splitting of markdown documents
    #[serde(alias = "markdown")]
    Markdown,
}

impl ChunkMethod {
    /// Whether `chunk-overlap < chunk-size` is mandatory for this method
    pub const fn requires_overlap_below_size(self) -> bool {
        matches!(self, Self::Token | Self::Markdown)
    }
}

impl fmt::Display for ChunkMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Token => "Token",
            Self::Recursive => "Recursive",
            Self::Markdown => "Markdown",
        };
        f.write_str(name)
    }
}

impl FromStr for ChunkMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "token" => Ok(Self::Token),
            "recursive" => Ok(Self::Recursive),
            "markdown" => Ok(Self::Markdown),
            _ => Err(ConfigError::UnknownMethod(s.to_string())),
        }
    }
}

/// Settings for one chunking call
///
/// Keys use the kebab-case names of the public input record
/// (`chunk-method`, `chunk-size`, ...). Missing keys take the defaults above.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ChunkSettings {
    pub chunk_method: ChunkMethod,

    /// Maximum chunk size: tokens for the Token and Markdown methods,
    /// characters for Recursive
    pub chunk_size: usize,

    /// Amount of content repeated between neighbouring chunks, same unit as
    /// `chunk_size`
    pub chunk_overlap: usize,

    /// Model whose tokenizer measures the chunks
    #[serde(alias = "tokenizer-model")]
    pub model_name: String,

    /// Special tokens that may appear in the text and count as one token
    /// each. `"all"` allows every special token.
    pub allowed_special: Vec<String>,

    /// Special tokens that make the input invalid. `"all"` means every
    /// special token that is not explicitly allowed.
    pub disallowed_special: Vec<String>,

    /// Separators tried in order (Recursive only)
    pub separators: Vec<String>,

    /// Keep each separator at the front of the piece that follows it
    /// (Recursive only)
    pub keep_separator: bool,
}

impl Default for ChunkSettings {
    fn default() -> Self {
        Self {
            chunk_method: ChunkMethod::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            model_name: DEFAULT_MODEL_NAME.to_string(),
            allowed_special: Vec::new(),
            disallowed_special: vec![ALL_SPECIAL_TOKENS.to_string()],
            separators: DEFAULT_SEPARATORS.iter().map(ToString::to_string).collect(),
            keep_separator: false,
        }
    }
}

impl ChunkSettings {
    /// Default settings for the given method
    pub fn for_method(chunk_method: ChunkMethod) -> Self {
        Self {
            chunk_method,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    #[must_use]
    pub const fn with_chunk_overlap(mut self, chunk_overlap: usize) -> Self {
        self.chunk_overlap = chunk_overlap;
        self
    }

    #[must_use]
    pub fn with_model(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    #[must_use]
    pub fn with_separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.separators = separators.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub const fn with_keep_separator(mut self, keep_separator: bool) -> Self {
        self.keep_separator = keep_separator;
        self
    }

    /// Load settings from environment variables with safe defaults
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        settings.apply_overrides(&|key| std::env::var(key).ok());
        settings
    }

    /// Overwrite fields for which `lookup` yields a parseable value
    ///
    /// Keys are the `TEXTCHUNK_*` environment variable names. Values that do
    /// not parse are ignored and the current value is kept.
    pub fn apply_overrides(&mut self, lookup: &dyn Fn(&str) -> Option<String>) {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(method) = var("CHUNK_METHOD").and_then(|s| s.parse().ok()) {
            self.chunk_method = method;
        }
        if let Some(size) = var("CHUNK_SIZE").and_then(|s| s.parse().ok()) {
            self.chunk_size = size;
        }
        if let Some(overlap) = var("CHUNK_OVERLAP").and_then(|s| s.parse().ok()) {
            self.chunk_overlap = overlap;
        }
        if let Some(model) = var("MODEL").filter(|s| !s.trim().is_empty()) {
            self.model_name = model;
        }
        if let Some(allowed) = var("ALLOWED_SPECIAL") {
            self.allowed_special = split_list(&allowed);
        }
        if let Some(disallowed) = var("DISALLOWED_SPECIAL") {
            self.disallowed_special = split_list(&disallowed);
        }
        if let Some(keep) = var("KEEP_SEPARATOR").and_then(|s| s.parse().ok()) {
            self.keep_separator = keep;
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

impl Validate for ChunkSettings {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_range(self.chunk_size as u64, 1, MAX_CHUNK_SIZE, "chunk-size")?;
        validation::validate_non_empty(&self.model_name, "model-name")?;

        if self.chunk_method.requires_overlap_below_size() && self.chunk_overlap >= self.chunk_size
        {
            return Err(ConfigError::OverlapTooLarge {
                overlap: self.chunk_overlap,
                size: self.chunk_size,
                method: self.chunk_method.to_string(),
            });
        }

        if self.chunk_method == ChunkMethod::Recursive && self.separators.is_empty() {
            return Err(ConfigError::MissingField {
                field: "separators".to_string(),
            });
        }

        Ok(())
    }
}

/// Logging options for the binary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is not set
    pub level: String,

    /// Emit JSON lines instead of human-readable text
    pub json: bool,

    /// Directory for a daily-rotated log file; stderr only when unset
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            json: false,
            directory: None,
        }
    }
}

impl LoggingConfig {
    /// See [`ChunkSettings::apply_overrides`]
    pub fn apply_overrides(&mut self, lookup: &dyn Fn(&str) -> Option<String>) {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(level) = var("LOG_LEVEL") {
            self.level = level;
        }
        if let Some(json) = var("LOG_JSON").and_then(|s| s.parse().ok()) {
            self.json = json;
        }
        if let Some(dir) = var("LOG_DIR").filter(|s| !s.trim().is_empty()) {
            self.directory = Some(PathBuf::from(dir));
        }
    }
}

impl Validate for LoggingConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_log_level(&self.level)
    }
}

/// Complete configuration of the textchunk binary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    pub chunking: ChunkSettings,
    pub logging: LoggingConfig,
}

impl ApplicationConfig {
    /// Load configuration from environment variables with safe defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(&|key| std::env::var(key).ok());
        config
    }

    /// Apply `TEXTCHUNK_*` overrides from `lookup` to every section
    pub fn apply_overrides(&mut self, lookup: &dyn Fn(&str) -> Option<String>) {
        self.chunking.apply_overrides(lookup);
        self.logging.apply_overrides(lookup);
    }
}

impl Validate for ApplicationConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.chunking.validate()?;
        self.logging.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_match_documented_values() {
        let settings = ChunkSettings::default();
        assert_eq!(settings.chunk_method, ChunkMethod::Token);
        assert_eq!(settings.chunk_size, 512);
        assert_eq!(settings.chunk_overlap, 100);
        assert_eq!(settings.model_name, "gpt-3.5-turbo");
        assert_eq!(settings.separators, vec!["\n\n", "\n", " ", ""]);
        assert!(settings.allowed_special.is_empty());
        assert_eq!(settings.disallowed_special, vec!["all"]);
        assert!(!settings.keep_separator);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_overrides_replace_only_parseable_values() {
        let mut settings = ChunkSettings::default();
        let lookup = lookup_from(&[
            ("TEXTCHUNK_CHUNK_METHOD", "markdown"),
            ("TEXTCHUNK_CHUNK_SIZE", "900"),
            ("TEXTCHUNK_CHUNK_OVERLAP", "not-a-number"),
            ("TEXTCHUNK_ALLOWED_SPECIAL", "<|endoftext|>, <|fim_prefix|>"),
        ]);
        settings.apply_overrides(&lookup);

        assert_eq!(settings.chunk_method, ChunkMethod::Markdown);
        assert_eq!(settings.chunk_size, 900);
        assert_eq!(settings.chunk_overlap, DEFAULT_CHUNK_OVERLAP);
        assert_eq!(
            settings.allowed_special,
            vec!["<|endoftext|>", "<|fim_prefix|>"]
        );
    }

    #[test]
    fn test_overlap_rule_applies_to_token_and_markdown_only() {
        for method in [ChunkMethod::Token, ChunkMethod::Markdown] {
            let settings = ChunkSettings::for_method(method)
                .with_chunk_size(100)
                .with_chunk_overlap(100);
            assert!(matches!(
                settings.validate(),
                Err(ConfigError::OverlapTooLarge { .. })
            ));
        }

        let recursive = ChunkSettings::for_method(ChunkMethod::Recursive)
            .with_chunk_size(5)
            .with_chunk_overlap(100);
        assert!(recursive.validate().is_ok());
    }

    #[test]
    fn test_zero_chunk_size_is_rejected() {
        let settings = ChunkSettings::for_method(ChunkMethod::Recursive).with_chunk_size(0);
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_settings_deserialize_with_partial_keys() {
        let json = r#"{"chunk-method": "Recursive", "chunk-size": 5, "separators": [" ", "."]}"#;
        let settings: ChunkSettings = serde_json::from_str(json).expect("Should deserialize");
        assert_eq!(settings.chunk_method, ChunkMethod::Recursive);
        assert_eq!(settings.chunk_size, 5);
        assert_eq!(settings.chunk_overlap, DEFAULT_CHUNK_OVERLAP);
        assert_eq!(settings.separators, vec![" ", "."]);
    }

    #[test]
    fn test_chunk_method_parses_case_insensitively() {
        assert_eq!("MARKDOWN".parse::<ChunkMethod>().ok(), Some(ChunkMethod::Markdown));
        assert!("sentences".parse::<ChunkMethod>().is_err());
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let config = ApplicationConfig::default();
        let text = toml::to_string(&config).expect("Config should serialize to TOML");
        assert!(text.contains("[chunking]"));
        assert!(text.contains("chunk-size = 512"));
        let parsed: ApplicationConfig = toml::from_str(&text).expect("Should parse back");
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_logging_level_is_validated() {
        let mut config = ApplicationConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }
}
