mod app;
mod cli;
mod commands;
mod config;
mod deck;
mod keymap;
mod location;
mod logging;
mod nav;
mod presenter;
mod render;
mod sync;
mod theme;
mod view;

use clap::Parser;
use colored::Colorize;

fn main() {
    let cli = cli::Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }
    logging::init(cli.verbose, cli.quiet);

    if let Err(e) = cli.run() {
        eprintln!("{} {e:#}", "Error:".red().bold());
        std::process::exit(1);
    }
}
