//! Taleweaver CLI binary.
//!
//! - Start new stories in any genre
//! - Play saved stories chapter by chapter
//! - Manage saves: list, rename, export, import and reconcile

use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, Commands, handle_saves_command, new_story, play_story};

    // Optional .env with provider keys
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    taleweaver::init_logging(
        &taleweaver::LoggingConfig::new(cli.verbose).with_json_logs(cli.json_logs),
    )?;

    let config = match &cli.config {
        Some(path) => taleweaver::TaleweaverConfig::from_file(path)?,
        None => taleweaver::TaleweaverConfig::load()?,
    };
    tracing::debug!(provider = %config.model.provider, data_dir = %config.data_dir().display(), "Configuration loaded");

    match cli.command {
        Commands::New(args) => {
            new_story(&config, args).await?;
        }

        Commands::Play { id } => {
            play_story(&config, id.as_deref()).await?;
        }

        Commands::Saves(saves_cmd) => {
            handle_saves_command(&config, saves_cmd).await?;
        }
    }

    Ok(())
}
