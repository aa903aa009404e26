use crate::domain::{ClientConfig, ConfigError};
use crate::ports::ConfigProvider;
use std::fs;
use std::path::Path;

// ============================================================================
// StaticConfigProvider - In-code config for tests and embedding
// ============================================================================

/// Configuration provider holding a fixed [`ClientConfig`].
#[derive(Debug, Clone, Default)]
pub struct StaticConfigProvider {
    config: ClientConfig,
}

impl StaticConfigProvider {
    /// Provider over `config`.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }
}

impl ConfigProvider for StaticConfigProvider {
    fn client_config(&self) -> ClientConfig {
        self.config.clone()
    }
}

// ============================================================================
// TomlConfigProvider - Config file loading
// ============================================================================

/// TOML-based configuration provider.
///
/// Missing sections and fields take their defaults; the loaded values are
/// validated before the provider is returned.
///
/// # Config File Format
///
/// ```toml
/// [manager]
/// host = "manager.example"
/// port = 1883
///
/// [discovery]
/// catalog_timeout_ms = 2000
///
/// [subscription]
/// radius_km = 2.5
/// ```
#[derive(Debug, Clone)]
pub struct TomlConfigProvider {
    config: ClientConfig,
}

impl TomlConfigProvider {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, parsed, or validated.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(Self { config })
    }

    /// The loaded configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl ConfigProvider for TomlConfigProvider {
    fn client_config(&self) -> ClientConfig {
        self.config.clone()
    }
}
