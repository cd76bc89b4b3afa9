//! CLI argument definitions for the pizzeria assistant.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::warn;

use pizzeria_core::PizzeriaConfig;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "PIZZERIA_CONFIG";

/// Pizzeria ordering assistant backed by a local language model.
#[derive(Parser, Debug)]
#[command(name = "pizzeria", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding menu.json and orders.csv.
    #[arg(short = 'd', long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Model to chat with, e.g. gemma:2b or llama3.
    #[arg(short = 'm', long = "model", global = true)]
    pub model: Option<String>,

    /// Base address of the Ollama endpoint.
    #[arg(short = 'e', long = "endpoint", global = true)]
    pub endpoint: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the menu.
    Menu,
    /// Take an order interactively (default).
    Chat,
    /// Show recent order log rows and totals.
    Orders {
        /// Number of rows to show.
        #[arg(short = 'n', long = "limit")]
        limit: Option<usize>,
    },
    /// Check that the model endpoint is reachable.
    Status,
}

impl CliArgs {
    /// Subcommand to run; `chat` when none was given.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Chat)
    }

    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > PIZZERIA_CONFIG env var > ~/.pizzeria/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        self.config_path_with(std::env::var(CONFIG_ENV).ok())
    }

    fn config_path_with(&self, env_path: Option<String>) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Some(p) = env_path.filter(|p| !p.trim().is_empty()) {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Fold flags and environment into `config`.
    ///
    /// The endpoint follows --endpoint > OLLAMA_URL > file; data directory,
    /// model, and log level follow flag > file.
    pub fn apply(&self, config: &mut PizzeriaConfig) {
        config.apply_env_overrides();
        self.apply_flags(config);
    }

    fn apply_flags(&self, config: &mut PizzeriaConfig) {
        config.override_endpoint(self.endpoint.clone());
        if let Some(ref dir) = self.data_dir {
            config.general.data_dir = dir.to_string_lossy().to_string();
        }
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(ref model) = self.model {
            if !config.llm.available_models.iter().any(|m| m == model) {
                warn!(model = %model, "Model is not in the configured list; using it anyway");
            }
            config.llm.default_model = model.clone();
        }
    }
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        Some(rest) => home_dir().join(rest),
        None if path == "~" => home_dir(),
        None => PathBuf::from(path),
    }
}

fn home_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
    #[cfg(not(target_os = "windows"))]
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home)
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    home_dir().join(".pizzeria").join("config.toml")
}
