pub mod commands;

pub use commands::{ChatsCommands, Cli, Commands, ProfileCommands};
