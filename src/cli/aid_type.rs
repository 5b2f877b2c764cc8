use std::path::Path;

use needboard::Config;
use tracing::instrument;

use crate::cli::{config_path, terminal::Colorize};

#[derive(Debug, clap::Parser)]
pub struct Command {
    #[command(subcommand)]
    command: AidTypeCommand,
}

#[derive(Debug, clap::Parser)]
enum AidTypeCommand {
    /// Add one or more aid types to the allowed list
    Add {
        /// The aid types to add (e.g., Food, "School supplies")
        #[arg(num_args = 1..)]
        aid_types: Vec<String>,
    },

    /// List the allowed aid types
    List,
}

impl Command {
    #[instrument]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let config_path = config_path(root);

        match self.command {
            AidTypeCommand::Add { aid_types } => add(&config_path, aid_types),
            AidTypeCommand::List => {
                list(&Config::load_or_default(&config_path));
                Ok(())
            }
        }
    }
}

fn add(config_path: &Path, aid_types: Vec<String>) -> anyhow::Result<()> {
    let mut config = if config_path.exists() {
        Config::load(config_path).map_err(|e| anyhow::anyhow!("{e}"))?
    } else {
        anyhow::bail!("Need board not initialized. Run 'needs init' first");
    };

    let mut added = Vec::new();
    let mut already_exists = Vec::new();

    for aid_type in aid_types {
        let aid_type = aid_type.trim().to_string();
        if aid_type.is_empty() {
            anyhow::bail!("Aid types cannot be blank");
        }

        if config.add_aid_type(aid_type.clone()) {
            added.push(aid_type);
        } else {
            already_exists.push(aid_type);
        }
    }

    if !added.is_empty() {
        config
            .save(config_path)
            .map_err(|e| anyhow::anyhow!("{e}"))?;

        println!(
            "{}",
            format!("✅ Added {} aid type(s): {}", added.len(), added.join(", ")).success()
        );
    }

    if !already_exists.is_empty() {
        println!(
            "{}",
            format!("ℹ️  Already registered: {}", already_exists.join(", ")).dim()
        );
    }

    Ok(())
}

fn list(config: &Config) {
    if config.aid_types().is_empty() {
        println!("{}", "Any aid type is accepted".dim());
        return;
    }

    for aid_type in config.aid_types() {
        println!("{aid_type}  {}", needboard::render::tag_class(aid_type).dim());
    }
}
