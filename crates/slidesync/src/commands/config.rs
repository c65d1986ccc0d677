use anyhow::Result;
use colored::Colorize;

use crate::cli::ConfigCommands;
use crate::config::Config;
use crate::sync::{DEFAULT_TOPIC, FileTransport};

pub fn run(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => show(),
        ConfigCommands::Set { key, value } => set(&key, &value),
    }
}

fn show() -> Result<()> {
    let path = Config::path()?;
    let config = Config::load_or_default();

    println!("{} {}", "Config file:".bold(), path.display());
    if !path.exists() {
        println!("{}", "  (not created yet, showing defaults)".dimmed());
    }
    println!();

    let defaults = config.defaults.clone().unwrap_or_default();
    let sync = config.sync.clone().unwrap_or_default();

    println!("{}", "defaults".cyan().bold());
    print_value("theme", defaults.theme.as_deref(), "light");
    print_value(
        "presenter",
        defaults.presenter.map(|b| b.to_string()).as_deref(),
        "false",
    );

    println!("{}", "sync".cyan().bold());
    print_value("transport", sync.transport.as_deref(), config.transport_kind().name());
    print_value("topic", sync.topic.as_deref(), DEFAULT_TOPIC);
    print_value(
        "per_deck",
        sync.per_deck.map(|b| b.to_string()).as_deref(),
        "false",
    );
    let default_dir = FileTransport::default_dir();
    print_value(
        "dir",
        sync.dir.as_ref().map(|d| d.display().to_string()).as_deref(),
        &default_dir.display().to_string(),
    );
    Ok(())
}

fn print_value(key: &str, value: Option<&str>, default: &str) {
    match value {
        Some(v) => println!("  {key}: {}", v.green()),
        None => println!("  {key}: {} {}", default, "(default)".dimmed()),
    }
}

fn set(key: &str, value: &str) -> Result<()> {
    let mut config = Config::load_or_default();
    config.set(key, value)?;
    let path = config.save()?;
    println!(
        "{} {key} = {} ({})",
        "Saved".green().bold(),
        value.bold(),
        path.display()
    );
    Ok(())
}
