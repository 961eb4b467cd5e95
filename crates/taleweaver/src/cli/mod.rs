//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the taleweaver binary.

mod commands;
mod saves;
mod story;

pub use commands::{Cli, Commands};
pub use saves::handle_saves_command;
pub use story::{new_story, play_story};
