//! Configuration source loading and composition

use crate::validation::Validate;
use crate::{ApplicationConfig, ConfigResult};
use std::path::{Path, PathBuf};

/// A layer of configuration applied on top of the layers below it
pub trait ConfigurationSource {
    /// Apply this source's values to `config`
    ///
    /// # Errors
    /// Returns configuration loading errors
    fn apply(&self, config: &mut ApplicationConfig) -> ConfigResult<()>;

    /// Get the name of this configuration source
    fn name(&self) -> &str;

    /// Get the priority of this source (higher number = applied later)
    fn priority(&self) -> u8;
}

/// `TEXTCHUNK_*` environment variables
pub struct EnvironmentSource;

impl ConfigurationSource for EnvironmentSource {
    fn apply(&self, config: &mut ApplicationConfig) -> ConfigResult<()> {
        config.apply_overrides(&|key| std::env::var(key).ok());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "environment"
    }

    fn priority(&self) -> u8 {
        100
    }
}

/// A TOML file with optional `[chunking]` and `[logging]` tables
pub struct TomlFileSource {
    path: PathBuf,
}

impl TomlFileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ConfigurationSource for TomlFileSource {
    fn apply(&self, config: &mut ApplicationConfig) -> ConfigResult<()> {
        let content = std::fs::read_to_string(&self.path)?;
        // Absent keys fall back to defaults, so the file replaces whole sections.
        *config = toml::from_str(&content)?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "toml_file"
    }

    fn priority(&self) -> u8 {
        50
    }
}

type ConfigSources<'a> = Vec<Box<dyn ConfigurationSource + 'a>>;

/// Builds an [`ApplicationConfig`] from defaults plus prioritized sources
pub struct ConfigurationLoader<'a> {
    sources: ConfigSources<'a>,
}

impl<'a> ConfigurationLoader<'a> {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    #[must_use]
    pub fn add_source(mut self, source: Box<dyn ConfigurationSource + 'a>) -> Self {
        self.sources.push(source);
        self
    }

    /// Apply every source in ascending priority order, then validate
    ///
    /// Unlike environment variables, an unreadable or malformed file is an
    /// error: the caller asked for it explicitly.
    ///
    /// # Errors
    /// Returns source loading or validation errors
    pub fn load(&self) -> ConfigResult<ApplicationConfig> {
        let mut config = ApplicationConfig::default();

        let mut sorted_sources = self.sources.iter().collect::<Vec<_>>();
        sorted_sources.sort_by_key(|source| source.priority());

        for source in sorted_sources {
            source.apply(&mut config)?;
            tracing::debug!(source = source.name(), "Applied configuration source");
        }

        config.validate()?;
        Ok(config)
    }
}

impl Default for ConfigurationLoader<'_> {
    fn default() -> Self {
        Self::new()
    }
}
