//! CLI definitions for wachat.
//!
//! Uses clap for argument parsing with derive macros.

use crate::model::MessageCategory;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// wachat - WhatsApp chat export parser
#[derive(Parser, Debug)]
#[command(name = "wachat")]
#[command(version)]
#[command(about = "Parse WhatsApp chat exports into typed messages")]
#[command(long_about = r#"
wachat reads the ZIP produced by WhatsApp's "Export chat" and prints every
message with its sender, timestamp and category. Attachments are matched to
the files in the archive; video and voice-note durations and image sizes are
read from the media itself.

Quick start:
  1. In WhatsApp: chat > More > Export chat > Attach media
  2. Run: wachat parse "WhatsApp Chat with Ana.zip"
  3. Totals only: wachat stats "WhatsApp Chat with Ana.zip"
"#)]
pub struct Cli {
    /// Output format (defaults to output.format from the config file)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// More log output on stderr (-v debug, -vv trace)
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Be quiet (suppress non-error output)
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Print how long the parse took
    #[arg(long, global = true)]
    pub timings: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse an export and print its messages
    Parse(ParseArgs),

    /// Show per-category totals for an export
    Stats(StatsArgs),

    /// Show or initialise configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Options shared by every command that opens an archive.
#[derive(Args, Debug, Clone)]
pub struct ArchiveArgs {
    /// Path to the exported .zip
    pub archive: PathBuf,

    /// Do not read attachment bytes (durations and sizes stay at 0)
    #[arg(long)]
    pub no_media: bool,

    /// Suffix identifying the transcript entry
    #[arg(long)]
    pub transcript_suffix: Option<String>,
}

#[derive(Args, Debug)]
pub struct ParseArgs {
    #[command(flatten)]
    pub archive: ArchiveArgs,

    /// Only show these categories
    #[arg(long, short = 'c', value_delimiter = ',')]
    pub category: Option<Vec<CategoryArg>>,

    /// Only show messages from this sender (case-insensitive)
    #[arg(long, short = 's')]
    pub sender: Option<String>,

    /// Show at most N messages
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Skip the summary header
    #[arg(long)]
    pub no_summary: bool,
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    #[command(flatten)]
    pub archive: ArchiveArgs,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Show the effective configuration
    #[arg(long)]
    pub show: bool,

    /// Print the config file location
    #[arg(long)]
    pub path: bool,

    /// Write a default config file if none exists
    #[arg(long)]
    pub init: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    JsonPretty,
    Compact,
    Csv,
}

/// `--category` values.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CategoryArg {
    Text,
    Image,
    Video,
    Audio,
    Document,
    Sticker,
}

impl From<CategoryArg> for MessageCategory {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Text => Self::Text,
            CategoryArg::Image => Self::Image,
            CategoryArg::Video => Self::Video,
            CategoryArg::Audio => Self::Audio,
            CategoryArg::Document => Self::Document,
            CategoryArg::Sticker => Self::Sticker,
        }
    }
}
