use std::{fmt, io::Write, path::Path};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use needboard::{render, Board, FileStore, Filter, Need};
use tracing::instrument;

use crate::cli::{data_dir, terminal};

/// Width used for card text on narrow terminals.
const NARROW_WIDTH: usize = 40;

/// Command arguments for `needs list`.
#[derive(Debug, Default, Parser)]
#[command(about = "List needs, optionally filtered by aid type and search text")]
pub struct List {
    /// Case-insensitive text to find in the title, description or institution.
    #[arg(long, short, default_value = "")]
    search: String,

    /// Only show needs with exactly this aid type.
    #[arg(long, short = 't', default_value = "")]
    aid_type: String,

    /// Output format (default: cards).
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,
}

/// Supported output formats.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Cards,
    Json,
    Html,
}

impl List {
    #[instrument(level = "debug", skip_all)]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let board = Board::open_lenient(FileStore::new(data_dir(root)));
        let filter = Filter::new(self.search, self.aid_type);

        let needs = board.search(&filter);
        tracing::debug!(
            "{} of {} needs match {filter:?}",
            needs.len(),
            board.needs().len()
        );

        render_needs(&needs, self.output)
    }
}

fn render_needs(needs: &[&Need], output: OutputFormat) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match output {
        OutputFormat::Cards => {
            let width = if terminal::is_narrow() {
                NARROW_WIDTH
            } else {
                terminal::text_width()
            };
            render::write_cards(&mut out, needs, width.saturating_sub(2))
        }
        OutputFormat::Json => render::write_json(&mut out, needs),
        OutputFormat::Html => render::write_html(&mut out, needs),
    }
    .context("failed to render needs")?;

    out.flush().context("failed to flush output")
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cards => "cards",
            Self::Json => "json",
            Self::Html => "html",
        })
    }
}
