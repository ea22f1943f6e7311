use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::playlist::{RewriteOptions, StreamFormat, fetch_playlist, rewrite_playlist};

#[derive(Parser, Debug)]
pub struct PlaylistCommand {
    /// Backend M3U channel list
    #[arg(long, default_value = "http://kodi.lyhnemail.com:19981/playlist/channels.m3u")]
    pub source: String,

    /// EPG advertised in the generated playlist
    #[arg(long, default_value = "https://kodi.lyhnemail.com/epg.xml")]
    pub epg: String,

    /// Public stream prefix, followed by the channel id
    #[arg(long, default_value = "https://kodi.lyhnemail.com/streamer/stream/")]
    pub stream_base: String,

    /// Stream format the playlist entries point at
    #[arg(short, long, value_enum, default_value = "dash")]
    pub format: StreamFormat,

    /// Output file
    #[arg(short, long, default_value = "streamer.m3u")]
    pub output: PathBuf,
}

impl PlaylistCommand {
    pub async fn run(self) -> Result<()> {
        log::info!("Downloading {}", self.source);
        let client = reqwest::Client::new();
        let m3u = fetch_playlist(&client, &self.source).await?;

        let options = RewriteOptions {
            epg_url: self.epg,
            stream_base: self.stream_base,
            format: self.format,
        };
        let rewritten = rewrite_playlist(&m3u, &options);

        tokio::fs::write(&self.output, rewritten.playlist)
            .await
            .with_context(|| format!("Failed to write {}", self.output.display()))?;

        println!(
            "Saved {} channel(s) to {} ({} skipped)",
            rewritten.channels,
            self.output.display(),
            rewritten.skipped.len()
        );
        Ok(())
    }
}
