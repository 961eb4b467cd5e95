//! CLI command definitions.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use strum::IntoEnumIterator;
use taleweaver::{Genre, StoryLength};

/// Taleweaver - interactive branching stories written with a language model
#[derive(Parser, Debug)]
#[command(name = "taleweaver")]
#[command(about = "Interactive branching stories written with a language model", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Read configuration from this file instead of the default locations
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start a new story
    New(NewStoryArgs),

    /// Continue a saved story
    Play {
        /// Save to resume; defaults to the most recently played unfinished story
        id: Option<String>,
    },

    /// Manage saved stories
    #[command(subcommand)]
    Saves(SavesCommands),
}

fn genre_help() -> String {
    let genres: Vec<String> = Genre::iter().map(|g| g.to_string()).collect();
    format!("Story genre ({})", genres.join(", "))
}

/// Arguments for a new story
#[derive(Args, Debug)]
pub struct NewStoryArgs {
    /// Story genre
    #[arg(long, default_value = "fantasy", help = genre_help())]
    pub genre: String,

    /// Name of the protagonist
    #[arg(long)]
    pub protagonist: String,

    /// Where the story takes place
    #[arg(long)]
    pub setting: String,

    /// Prose style hint
    #[arg(long)]
    pub style: Option<String>,

    /// Extra wishes passed to the model verbatim
    #[arg(long)]
    pub requirements: Option<String>,

    /// Intended arc length
    #[arg(long, value_enum, default_value = "medium")]
    pub length: LengthArg,

    /// Track explicit goals from the first chapter
    #[arg(long)]
    pub advanced: bool,

    /// Title for the first save
    #[arg(long)]
    pub title: Option<String>,

    /// Only write the opening and save it, without entering the play loop
    #[arg(long)]
    pub no_play: bool,
}

/// Arc length accepted on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LengthArg {
    /// A handful of chapters
    Short,
    /// The default arc
    Medium,
    /// An extended arc
    Long,
}

impl From<LengthArg> for StoryLength {
    fn from(arg: LengthArg) -> Self {
        match arg {
            LengthArg::Short => StoryLength::Short,
            LengthArg::Medium => StoryLength::Medium,
            LengthArg::Long => StoryLength::Long,
        }
    }
}

/// Save management subcommands
#[derive(Subcommand, Debug)]
pub enum SavesCommands {
    /// List saved stories, most recently played first
    List {
        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// Show one save
    Show {
        /// Save id
        id: String,

        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// Change the title of a save
    Rename {
        /// Save id
        id: String,

        /// New title
        title: String,
    },

    /// Delete a save
    Delete {
        /// Save id
        id: String,
    },

    /// Write a save as JSON
    Export {
        /// Save id
        id: String,

        /// Destination file; stdout when absent
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Import a save previously exported
    Import {
        /// File holding the exported JSON
        path: PathBuf,
    },

    /// Merge duplicate saves and upgrade old records
    Cleanup,
}

/// Output format for listing commands
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable format
    Human,
    /// JSON format
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_new_story() {
        let cli = Cli::parse_from([
            "taleweaver",
            "new",
            "--genre",
            "sci-fi",
            "--protagonist",
            "Ada",
            "--setting",
            "a derelict station",
            "--advanced",
        ]);
        match cli.command {
            Commands::New(args) => {
                assert_eq!(Genre::from_label(&args.genre), Genre::SciFi);
                assert!(args.advanced);
                assert!(!args.no_play);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_genre_help_lists_every_genre() {
        let help = genre_help();
        for genre in Genre::iter() {
            assert!(help.contains(&genre.to_string()));
        }
    }
}
