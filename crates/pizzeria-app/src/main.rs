mod cli;
mod session;

use std::io::{self, Write};
use std::path::Path;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pizzeria_chat::{ChatRelay, OrderOrchestrator};
use pizzeria_core::PizzeriaConfig;
use pizzeria_storage::{render_as_text, MenuStore, OrderLog};

use crate::cli::{expand_home, CliArgs, Command};

/// Load the config file if there is one. Logging is not up yet, so the
/// outcome is returned for reporting once it is.
fn read_config(path: &Path) -> (PizzeriaConfig, Option<String>) {
    if !path.exists() {
        return (PizzeriaConfig::default(), None);
    }
    match PizzeriaConfig::load(path) {
        Ok(config) => (config, None),
        Err(e) => (PizzeriaConfig::default(), Some(e.to_string())),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let (mut config, config_error) = read_config(&config_file);
    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.general.log_level.clone());

    // Tracing.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level)),
        )
        .init();

    tracing::info!("Starting pizzeria v{}", env!("CARGO_PKG_VERSION"));
    match config_error {
        Some(e) => tracing::warn!(
            path = %config_file.display(),
            error = %e,
            "Failed to load config. Using defaults."
        ),
        None => tracing::info!(path = %config_file.display(), "Configuration resolved"),
    }
    args.apply(&mut config);

    // Storage.
    let data_dir = expand_home(&config.general.data_dir);
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::warn!(path = %data_dir.display(), error = %e, "Failed to create data directory");
    }
    let menu_store = MenuStore::new(config.storage.menu_path(&data_dir));
    let order_log = OrderLog::new(config.storage.orders_path(&data_dir));

    let mut stdout = io::stdout();
    match args.command() {
        Command::Menu => {
            writeln!(stdout, "{}", render_as_text(&menu_store.load()))?;
        }
        Command::Orders { limit } => {
            let limit = limit.unwrap_or(config.storage.recent_orders_limit);
            session::write_orders(&mut stdout, &order_log, limit)?;
        }
        Command::Status => {
            let relay = ChatRelay::from_config(&config.llm)?;
            let status = if relay.health_check() {
                "✅ Ollama Connected"
            } else {
                "❌ Ollama Disconnected"
            };
            writeln!(stdout, "📡 Ollama URL: {}", relay.endpoint())?;
            writeln!(stdout, "🤖 AI Model: {}", config.llm.default_model)?;
            writeln!(stdout, "Connection Status: {}", status)?;
            writeln!(
                stdout,
                "📖 Menu: {} items ({})",
                menu_store.load().item_count(),
                menu_store.path().display()
            )?;
            match order_log.stats() {
                Ok(stats) => writeln!(
                    stdout,
                    "📊 Total Orders: {} | Revenue: ${:.2}",
                    stats.order_count, stats.revenue
                )?,
                Err(e) => writeln!(stdout, "⚠️ Could not read orders: {}", e)?,
            }
        }
        Command::Chat => {
            let relay = ChatRelay::from_config(&config.llm)?;
            writeln!(stdout, "🍕 {}", config.general.restaurant_name)?;
            writeln!(
                stdout,
                "📡 Ollama URL: {} | 🤖 AI Model: {}",
                relay.endpoint(),
                config.llm.default_model
            )?;
            if !relay.health_check() {
                writeln!(
                    stdout,
                    "❌ Ollama Disconnected. Make sure Ollama is running before taking orders!"
                )?;
            }

            let orch = OrderOrchestrator::new(
                relay,
                config.llm.default_model.clone(),
                config.general.restaurant_name.clone(),
                menu_store.load(),
                order_log,
            );
            let placed = session::run(
                &orch,
                config.storage.recent_orders_limit,
                io::stdin().lock(),
                &mut stdout,
            )?;
            tracing::info!(orders = placed, "Session ended");
        }
    }

    Ok(())
}
