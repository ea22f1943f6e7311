use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use vidfront::ChannelRegistry;

mod list_channels;
mod playlist;
mod serve;

pub use list_channels::ListChannelsCommand;
pub use playlist::PlaylistCommand;
pub use serve::ServeCommand;

#[derive(Parser, Debug)]
#[command(name = "vidstream")]
#[command(about = "Live DASH/HLS restreamer for TVHeadend channels")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP streaming server (default)
    Serve(ServeCommand),
    /// Rewrite the backend channel list into a streamer playlist
    Playlist(PlaylistCommand),
    /// List the channels offered by the player menus
    Channels(ListChannelsCommand),
}

impl Args {
    pub async fn run(self) -> Result<()> {
        let command = self
            .command
            .unwrap_or(Command::Serve(ServeCommand::default()));

        match command {
            Command::Serve(cmd) => cmd.run().await,
            Command::Playlist(cmd) => cmd.run().await,
            Command::Channels(cmd) => cmd.run().await,
        }
    }
}

/// Load the registry from `path`, or the built-in one.
fn load_registry(path: Option<&Path>) -> Result<ChannelRegistry> {
    match path {
        Some(path) => ChannelRegistry::from_path(path)
            .with_context(|| format!("Failed to load channel registry {}", path.display())),
        None => Ok(ChannelRegistry::builtin()),
    }
}
