//! Save management command handlers.

use super::commands::{OutputFormat, SavesCommands};
use std::path::Path;
use taleweaver::{
    ContextStore, GoalStatus, JsonError, SaveId, SaveSummary, StorageError, StorageErrorKind, TaleweaverConfig,
    TaleweaverResult,
};

/// Handle save management commands.
pub async fn handle_saves_command(config: &TaleweaverConfig, cmd: SavesCommands) -> TaleweaverResult<()> {
    let store = config.context_store()?;
    match cmd {
        SavesCommands::List { format } => list_saves(&store, format).await,
        SavesCommands::Show { id, format } => show_save(&store, &SaveId::parse(&id), format).await,
        SavesCommands::Rename { id, title } => {
            store.rename(&SaveId::parse(&id), &title).await?;
            println!("Renamed {} to \"{}\"", id, title.trim());
            Ok(())
        }
        SavesCommands::Delete { id } => {
            if store.delete(&SaveId::parse(&id)).await? {
                println!("Deleted {}", id);
            } else {
                println!("No save named {}", id);
            }
            Ok(())
        }
        SavesCommands::Export { id, output } => {
            export_save(&store, &SaveId::parse(&id), output.as_deref()).await
        }
        SavesCommands::Import { path } => import_save(&store, &path).await,
        SavesCommands::Cleanup => cleanup_saves(&store).await,
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> TaleweaverResult<String> {
    Ok(serde_json::to_string_pretty(value).map_err(|e| JsonError::new(e.to_string()))?)
}

fn kind_label(summary: &SaveSummary) -> &'static str {
    if summary.id.is_snapshot() {
        "snapshot"
    } else if summary.is_auto_save {
        "auto"
    } else {
        "manual"
    }
}

async fn list_saves(store: &ContextStore, format: OutputFormat) -> TaleweaverResult<()> {
    let saves = store.list().await?;

    match format {
        OutputFormat::Json => println!("{}", to_json(&saves)?),
        OutputFormat::Human => {
            if saves.is_empty() {
                println!("No saved stories.");
                return Ok(());
            }
            println!("{:-<80}", "");
            for save in &saves {
                println!(
                    "{}  [{}] {}{}",
                    save.id,
                    kind_label(save),
                    save.title,
                    if save.is_completed { " (finished)" } else { "" }
                );
                println!(
                    "    {} | chapter {} | last played {}",
                    save.genre,
                    save.chapter,
                    save.last_play_time.format("%Y-%m-%d %H:%M")
                );
                if !save.thumbnail.is_empty() {
                    println!("    {}", save.thumbnail);
                }
            }
            println!("{:-<80}", "");
            println!("Total: {} saves", saves.len());
        }
    }
    Ok(())
}

async fn show_save(store: &ContextStore, id: &SaveId, format: OutputFormat) -> TaleweaverResult<()> {
    let record = store.load(id).await?;

    match format {
        OutputFormat::Json => println!("{}", to_json(&record)?),
        OutputFormat::Human => {
            let state = &record.story_state;
            println!("{} ({})", record.title, record.id);
            println!(
                "Genre: {}  Chapter: {}  Progress: {:.0}%",
                record.genre, state.chapter, state.story_progress
            );
            println!("Mood: {}  Tension: {}/10", state.mood, state.tension_level);
            println!(
                "Played: {} min  Saved: {}",
                record.play_time / 60,
                record.save_time.format("%Y-%m-%d %H:%M")
            );
            if !state.characters.is_empty() {
                let names: Vec<&str> = state.characters.iter().map(|c| c.name.as_str()).collect();
                println!("Cast: {}", names.join(", "));
            }
            if !state.achievements.is_empty() {
                println!("Achievements: {}", state.achievements.join(", "));
            }
            if let Some(goals) = &state.story_goals {
                for goal in goals {
                    println!("  [{}] {}", if goal.status == GoalStatus::Completed { "x" } else { " " }, goal.description);
                }
            }
            println!();
            println!("{}", state.current_scene);
        }
    }
    Ok(())
}

async fn export_save(store: &ContextStore, id: &SaveId, output: Option<&Path>) -> TaleweaverResult<()> {
    let blob = store.export(id).await?;
    match output {
        Some(path) => {
            tokio::fs::write(path, blob.as_bytes()).await.map_err(|e| {
                StorageError::new(StorageErrorKind::FileWrite(format!("{}: {}", path.display(), e)))
            })?;
            println!("Exported {} to {}", id, path.display());
        }
        None => println!("{}", blob),
    }
    Ok(())
}

async fn import_save(store: &ContextStore, path: &Path) -> TaleweaverResult<()> {
    let blob = tokio::fs::read_to_string(path).await.map_err(|e| {
        StorageError::new(StorageErrorKind::FileRead(format!("{}: {}", path.display(), e)))
    })?;
    let id = store.import(&blob).await?;
    println!("Imported as {}", id);
    Ok(())
}

async fn cleanup_saves(store: &ContextStore) -> TaleweaverResult<()> {
    let report = store.cleanup_duplicates().await?;
    if report.is_noop() {
        println!("Saves are already tidy.");
        return Ok(());
    }
    for (from, to) in &report.promoted {
        println!("Promoted {} -> {}", from, to);
    }
    for id in &report.discarded {
        println!("Discarded duplicate {}", id);
    }
    for id in &report.upgraded {
        println!("Upgraded {}", id);
    }
    Ok(())
}
