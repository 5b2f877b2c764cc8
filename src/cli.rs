use std::path::{Path, PathBuf};

mod aid_type;
mod list;
mod lookup;
mod register;
mod terminal;

use clap::ArgAction;
use list::List;
use lookup::Lookup;
use register::Register;
use tracing::instrument;

use crate::cli::terminal::Colorize;

/// Directory under the root holding the config and the stored needs.
const DATA_DIR: &str = ".needboard";

/// Where the board's data lives for a given root.
fn data_dir(root: &Path) -> PathBuf {
    root.join(DATA_DIR)
}

/// Path of the configuration file for a given root.
fn config_path(root: &Path) -> PathBuf {
    data_dir(root).join("config.toml")
}

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global=true)]
    verbose: u8,

    /// The directory holding the need board
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command
            .unwrap_or_else(|| Command::List(List::default()))
            .run(&self.root)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Initialize a new need board
    Init,

    /// Register a new need
    ///
    /// The address is filled in from the postal code when possible.
    Register(Register),

    /// List needs, optionally filtered by aid type and search text (default)
    List(List),

    /// Look up the address for a postal code
    Lookup(Lookup),

    /// Show or change the aid types needs can be registered under
    AidType(aid_type::Command),
}

impl Command {
    fn run(self, root: &Path) -> anyhow::Result<()> {
        match self {
            Self::Init => init(root)?,
            Self::Register(command) => command.run(root)?,
            Self::List(command) => command.run(root)?,
            Self::Lookup(command) => command.run(root)?,
            Self::AidType(command) => command.run(root)?,
        }
        Ok(())
    }
}

#[instrument]
fn init(root: &Path) -> anyhow::Result<()> {
    use std::fs;

    let data_dir = data_dir(root);
    if data_dir.exists() {
        anyhow::bail!("Need board already initialized (found existing {DATA_DIR} directory)");
    }

    fs::create_dir_all(&data_dir)
        .map_err(|e| anyhow::anyhow!("Failed to create {DATA_DIR} directory: {e}"))?;

    let config = needboard::Config::default();
    config
        .save(&config_path(root))
        .map_err(|e| anyhow::anyhow!("Failed to create config.toml: {e}"))?;

    println!(
        "{}",
        format!("Initialized need board in {}", root.display()).success()
    );
    println!("  Created: {DATA_DIR}/config.toml");
    println!();
    println!("{}", "Next steps:".info());
    println!("  needs register --interactive");
    println!("  needs list --search \"coats\"");

    Ok(())
}
