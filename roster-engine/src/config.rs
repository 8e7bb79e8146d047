use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG: &str = r#"
[service]
base_url = "http://127.0.0.1:8080/api"
timeout_secs = 30

[paging]
default_page_size = 25
page_size_options = [10, 25, 50, 100]
# Pages assumed to exist when the service reports no usable total and a full page came back
min_estimated_pages = 2

[import]
batch_size = 100
"#;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub paging: PagingConfig,
    #[serde(default)]
    pub import: ImportConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServiceConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080/api".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct PagingConfig {
    pub default_page_size: u32,
    pub page_size_options: Vec<u32>,
    pub min_estimated_pages: u32,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_page_size: 25,
            page_size_options: vec![10, 25, 50, 100],
            min_estimated_pages: 2,
        }
    }
}

impl PagingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size_options.is_empty() || self.page_size_options.contains(&0) {
            return Err(ConfigError::Message(
                "paging.page_size_options must be non-empty and positive".to_string(),
            ));
        }
        if !self.page_size_options.contains(&self.default_page_size) {
            return Err(ConfigError::Message(format!(
                "paging.default_page_size {} is not one of {:?}",
                self.default_page_size, self.page_size_options
            )));
        }
        if self.min_estimated_pages == 0 {
            return Err(ConfigError::Message(
                "paging.min_estimated_pages must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ImportConfig {
    pub batch_size: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self { batch_size: 100 }
    }
}

impl EngineConfig {
    /// Loads the config from the default location, writing a commented default file first if needed.
    pub fn load() -> Result<(Self, PathBuf), ConfigError> {
        let config_path = get_config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Message(format!("Failed to create config directory: {e}"))
            })?;
        }

        if !config_path.exists() {
            std::fs::write(&config_path, DEFAULT_CONFIG).map_err(|e| {
                ConfigError::Message(format!("Failed to write default config: {e}"))
            })?;
        }

        let config = Self::load_from(&config_path)?;
        Ok((config, config_path))
    }

    /// Loads an explicit file. Environment variables such as `ROSTER__IMPORT__BATCH_SIZE` override it.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::from(path.to_path_buf()))
            .add_source(Environment::with_prefix("ROSTER").separator("__"))
            .build()?;

        let config: EngineConfig = builder.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.paging.validate()?;
        if self.import.batch_size == 0 {
            return Err(ConfigError::Message(
                "import.batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn get_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("roster").join("engine.toml")
    } else {
        PathBuf::from("engine.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_file_parses() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(DEFAULT_CONFIG.as_bytes()).unwrap();

        let config = EngineConfig::load_from(file.path()).unwrap();
        assert_eq!(config.paging.default_page_size, 25);
        assert_eq!(config.paging.page_size_options, vec![10, 25, 50, 100]);
        assert_eq!(config.paging.min_estimated_pages, 2);
        assert_eq!(config.import.batch_size, 100);
        assert_eq!(config.service.timeout_secs, 30);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(b"[import]\nbatch_size = 7\n").unwrap();

        let config = EngineConfig::load_from(file.path()).unwrap();
        assert_eq!(config.import.batch_size, 7);
        assert_eq!(config.paging.default_page_size, 25);
    }

    #[test]
    fn test_partial_sections_fill_missing_fields() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(b"[paging]\ndefault_page_size = 50\n\n[service]\ntimeout_secs = 5\n")
            .unwrap();

        let config = EngineConfig::load_from(file.path()).unwrap();
        assert_eq!(config.paging.default_page_size, 50);
        assert_eq!(config.paging.page_size_options, vec![10, 25, 50, 100]);
        assert_eq!(config.paging.min_estimated_pages, 2);
        assert_eq!(config.service.timeout_secs, 5);
        assert_eq!(config.service.base_url, "http://127.0.0.1:8080/api");
    }

    #[test]
    fn test_rejects_default_page_size_outside_options() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(
            b"[paging]\ndefault_page_size = 30\npage_size_options = [10, 25]\nmin_estimated_pages = 2\n",
        )
        .unwrap();

        assert!(EngineConfig::load_from(file.path()).is_err());
    }
}
