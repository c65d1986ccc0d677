pub mod completion;
pub mod config;

use colored::Colorize;

pub fn print_version() {
    println!(
        "{} {}",
        "slidesync".bold().cyan(),
        env!("CARGO_PKG_VERSION").dimmed()
    );
    println!("{}", env!("CARGO_PKG_DESCRIPTION"));
}
