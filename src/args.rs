use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "Parse table presets and export rows through their templates")]
pub struct Args {
    /// Log parse failures and lint details (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse a preset and report its columns and lint findings
    Check {
        /// Preset file (defaults to stdin)
        preset: Option<PathBuf>,

        /// Print the parsed preset as JSON
        #[arg(long)]
        json: bool,
    },

    /// Render rows through a preset's WRITE-AS template
    Export {
        /// Preset file
        #[arg(short, long)]
        preset: PathBuf,

        /// Rows as a JSON array or JSON Lines (defaults to stdin)
        #[arg(short, long)]
        rows: Option<PathBuf>,

        /// Table name, used for the output file name
        #[arg(short, long)]
        name: String,

        /// Directory the export is written to
        #[arg(short, long, default_value = ".")]
        out: PathBuf,

        /// Write the export to stdout instead of a file
        #[arg(long, conflicts_with = "out")]
        stdout: bool,
    },

    /// Build one JSON row from KEY=VALUE pairs, typed by the preset
    Row {
        /// Preset file
        #[arg(short, long)]
        preset: PathBuf,

        /// Cell values as KEY=VALUE, KEY being a column's value
        #[arg(required = true)]
        pairs: Vec<String>,
    },
}
