use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::app::LaunchOptions;
use crate::sync::TransportKind;

#[derive(Parser)]
#[command(name = "slidesync")]
#[command(author, version, about)]
#[command(long_about = "A keyboard-driven slide presenter.\n\n\
    Every view of a deck stays on the same slide: open the deck twice, or add\n\
    a presenter console, and navigating in one moves the others.\n\n\
    Examples:\n  \
    slidesync talk.md                  Present fullscreen\n  \
    slidesync talk.md --windowed       Present in a window\n  \
    slidesync talk.md --console        Add a presenter console window\n  \
    slidesync talk.md --presenter      Start with the next-slide preview")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Markdown file to present
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Launch in a window instead of fullscreen
    #[arg(long, global = false)]
    pub windowed: bool,

    /// Start on a specific slide (1-indexed)
    #[arg(long, global = false)]
    pub slide: Option<usize>,

    /// Start in presenter mode
    #[arg(long, global = false)]
    pub presenter: bool,

    /// Also open a presenter console window
    #[arg(long, global = false)]
    pub console: bool,

    /// Sync topic to join (views only follow views on the same topic)
    #[arg(long, global = false)]
    pub topic: Option<String>,

    /// How views find each other
    #[arg(long, value_enum, global = false)]
    pub transport: Option<TransportArg>,

    /// Increase output verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// View and modify configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Display current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g. defaults.theme, sync.transport, sync.topic)
        key: String,

        /// Value to set
        value: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum TransportArg {
    /// Other processes on this machine
    File,
    /// Windows of this process only
    Local,
    /// No synchronization
    Off,
}

impl From<TransportArg> for TransportKind {
    fn from(arg: TransportArg) -> Self {
        match arg {
            TransportArg::File => TransportKind::File,
            TransportArg::Local => TransportKind::Local,
            TransportArg::Off => TransportKind::Off,
        }
    }
}

#[derive(Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        if let (Some(file), Some(_)) = (&self.file, &self.command) {
            anyhow::bail!(
                "Unexpected file {} before a subcommand; pass either a deck or a subcommand",
                file.display()
            );
        }
        match self.command {
            Some(Commands::Config { command }) => crate::commands::config::run(command),
            Some(Commands::Completion { shell }) => {
                crate::commands::completion::run(shell);
                Ok(())
            }
            Some(Commands::Version) => {
                crate::commands::print_version();
                Ok(())
            }
            None => {
                if let Some(file) = self.file {
                    if !file.exists() {
                        anyhow::bail!("File not found: {}", file.display());
                    }
                    crate::app::run(LaunchOptions {
                        file,
                        windowed: self.windowed,
                        start_slide: self.slide,
                        presenter: self.presenter,
                        console: self.console,
                        topic: self.topic,
                        transport: self.transport.map(TransportKind::from),
                    })
                } else {
                    use clap::CommandFactory;
                    let mut cmd = Self::command();
                    cmd.print_help()?;
                    println!();
                    Ok(())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_launch_flags() {
        let cli = Cli::try_parse_from([
            "slidesync",
            "talk.md",
            "--windowed",
            "--slide",
            "3",
            "--console",
            "--topic",
            "room-1",
            "--transport",
            "local",
        ])
        .unwrap();
        assert_eq!(cli.file, Some(PathBuf::from("talk.md")));
        assert!(cli.windowed && cli.console && !cli.presenter);
        assert_eq!(cli.slide, Some(3));
        assert_eq!(cli.topic.as_deref(), Some("room-1"));
        assert_eq!(
            cli.transport.map(TransportKind::from),
            Some(TransportKind::Local)
        );
    }

    #[test]
    fn test_subcommand_after_global_flags() {
        let cli = Cli::try_parse_from(["slidesync", "-vv", "version"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.file.is_none());
        assert!(matches!(cli.command, Some(Commands::Version)));

        let cli = Cli::try_parse_from(["slidesync", "--no-color", "config", "show"]).unwrap();
        assert!(cli.no_color);
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                command: ConfigCommands::Show
            })
        ));
    }

    #[test]
    fn test_subcommand_rejected_after_file() {
        let rejected = match Cli::try_parse_from(["slidesync", "talk.md", "version"]) {
            Ok(cli) => cli.run().is_err(),
            Err(_) => true,
        };
        assert!(rejected);
        let cli = Cli::try_parse_from(["slidesync", "-q", "talk.md"]).unwrap();
        assert!(cli.quiet);
        assert_eq!(cli.file, Some(PathBuf::from("talk.md")));
        assert!(cli.command.is_none());
    }
}
