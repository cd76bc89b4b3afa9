use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{PizzeriaError, Result};

/// Environment variable that overrides [`LlmConfig::endpoint`].
pub const ENDPOINT_ENV: &str = "OLLAMA_URL";

/// Top-level configuration for the pizzeria assistant.
///
/// Loaded from `~/.pizzeria/config.toml` by default. Every section falls
/// back to its defaults when omitted, so an empty file is a valid config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PizzeriaConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl PizzeriaConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PizzeriaConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| PizzeriaError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Apply the `OLLAMA_URL` environment override, if set.
    pub fn apply_env_overrides(&mut self) {
        self.override_endpoint(std::env::var(ENDPOINT_ENV).ok());
    }

    /// Replace the model endpoint when `endpoint` is a non-blank value.
    pub fn override_endpoint(&mut self, endpoint: Option<String>) {
        if let Some(url) = endpoint.map(|u| u.trim().to_string()) {
            if !url.is_empty() {
                self.llm.endpoint = url;
            }
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory holding the menu and the order log.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Restaurant name used in prompts and greetings.
    pub restaurant_name: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.pizzeria".to_string(),
            log_level: "warn".to_string(),
            restaurant_name: "Sajid's Pizzeria".to_string(),
        }
    }
}

/// Language-model endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base address of the Ollama-compatible endpoint.
    pub endpoint: String,
    /// Model used when none is selected.
    pub default_model: String,
    /// Models offered for selection.
    pub available_models: Vec<String>,
    /// Timeout for chat requests in seconds.
    pub timeout_secs: u64,
    /// Timeout for the connection health probe in seconds.
    pub health_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            default_model: "gemma:2b".to_string(),
            available_models: vec![
                "gemma:2b".to_string(),
                "llama3".to_string(),
                "mistral".to_string(),
                "phi3".to_string(),
            ],
            timeout_secs: 120,
            health_timeout_secs: 5,
        }
    }
}

/// Menu and order log file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Menu file name, relative to the data directory unless absolute.
    pub menu_file: String,
    /// Order log file name, relative to the data directory unless absolute.
    pub orders_file: String,
    /// Number of rows shown by the recent-orders view.
    pub recent_orders_limit: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            menu_file: "menu.json".to_string(),
            orders_file: "orders.csv".to_string(),
            recent_orders_limit: 10,
        }
    }
}

impl StorageConfig {
    /// Full path of the menu file under `data_dir`.
    pub fn menu_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.menu_file)
    }

    /// Full path of the order log under `data_dir`.
    pub fn orders_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.orders_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = PizzeriaConfig::default();
        assert_eq!(config.general.data_dir, "~/.pizzeria");
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.llm.endpoint, "http://localhost:11434");
        assert_eq!(config.llm.default_model, "gemma:2b");
        assert_eq!(config.llm.available_models.len(), 4);
        assert_eq!(config.llm.timeout_secs, 120);
        assert_eq!(config.llm.health_timeout_secs, 5);
        assert_eq!(config.storage.menu_file, "menu.json");
        assert_eq!(config.storage.orders_file, "orders.csv");
        assert_eq!(config.storage.recent_orders_limit, 10);
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
data_dir = "/srv/pizzeria"
log_level = "debug"
restaurant_name = "Luigi's"

[llm]
endpoint = "http://10.0.0.5:11434"
default_model = "llama3"
available_models = ["llama3"]
timeout_secs = 30

[storage]
menu_file = "carta.json"
orders_file = "log.csv"
recent_orders_limit = 25
"#;
        let file = create_temp_config(content);
        let config = PizzeriaConfig::load(file.path()).unwrap();
        assert_eq!(config.general.data_dir, "/srv/pizzeria");
        assert_eq!(config.general.restaurant_name, "Luigi's");
        assert_eq!(config.llm.endpoint, "http://10.0.0.5:11434");
        assert_eq!(config.llm.default_model, "llama3");
        assert_eq!(config.llm.available_models, vec!["llama3"]);
        assert_eq!(config.llm.timeout_secs, 30);
        // Not set in the file
        assert_eq!(config.llm.health_timeout_secs, 5);
        assert_eq!(config.storage.menu_file, "carta.json");
        assert_eq!(config.storage.recent_orders_limit, 25);
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let content = r#"
[general]
log_level = "error"
"#;
        let file = create_temp_config(content);
        let config = PizzeriaConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "error");
        assert_eq!(config.general.data_dir, "~/.pizzeria");
        assert_eq!(config.llm.timeout_secs, 120);
    }

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        let file = create_temp_config("");
        let config = PizzeriaConfig::load(file.path()).unwrap();
        assert_eq!(config.llm.default_model, "gemma:2b");
        assert_eq!(config.storage.orders_file, "orders.csv");
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = create_temp_config("this is {{ not valid TOML");
        let result = PizzeriaConfig::load(file.path());
        assert!(matches!(result, Err(PizzeriaError::Config(_))));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = PizzeriaConfig::load_or_default(Path::new("/nonexistent/config.toml"));
        assert_eq!(config.general.data_dir, "~/.pizzeria");
    }

    #[test]
    fn test_save_creates_parent_dirs_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.toml");

        let mut config = PizzeriaConfig::default();
        config.llm.default_model = "mistral".to_string();
        config.save(&path).unwrap();

        assert!(path.exists());
        let reloaded = PizzeriaConfig::load(&path).unwrap();
        assert_eq!(reloaded.llm.default_model, "mistral");
        assert_eq!(reloaded.llm.available_models, config.llm.available_models);
    }

    #[test]
    fn test_override_endpoint() {
        let mut config = PizzeriaConfig::default();
        config.override_endpoint(Some("http://gpu-box:11434".to_string()));
        assert_eq!(config.llm.endpoint, "http://gpu-box:11434");
    }

    #[test]
    fn test_override_endpoint_ignores_blank_and_missing() {
        let mut config = PizzeriaConfig::default();
        config.override_endpoint(None);
        assert_eq!(config.llm.endpoint, "http://localhost:11434");
        config.override_endpoint(Some("   ".to_string()));
        assert_eq!(config.llm.endpoint, "http://localhost:11434");
    }

    #[test]
    fn test_storage_paths() {
        let storage = StorageConfig::default();
        let dir = Path::new("/data");
        assert_eq!(storage.menu_path(dir), PathBuf::from("/data/menu.json"));
        assert_eq!(storage.orders_path(dir), PathBuf::from("/data/orders.csv"));

        let absolute = StorageConfig {
            menu_file: "/etc/pizzeria/menu.json".to_string(),
            ..StorageConfig::default()
        };
        assert_eq!(
            absolute.menu_path(dir),
            PathBuf::from("/etc/pizzeria/menu.json")
        );
    }
}
