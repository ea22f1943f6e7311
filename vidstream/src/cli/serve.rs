use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::{signal, sync::watch};

use crate::media::{StreamConfig, StreamStore, monitor, storage};

#[derive(Parser, Debug)]
pub struct ServeCommand {
    /// HTTP server port
    #[arg(short, long, default_value = "8000")]
    pub port: u16,

    /// Directory holding one output folder per channel
    #[arg(long, default_value = "/tmp/ramdrive/stream")]
    pub stream_dir: PathBuf,

    /// Public URL prefix of the stream route, used in HLS playlists
    #[arg(long, default_value = "https://kodi.lyhnemail.com/streamer/stream")]
    pub public_base: String,

    /// TVHeadend base URL
    #[arg(long, default_value = "http://kodi.lyhnemail.com")]
    pub backend_url: String,

    /// TVHeadend HTTP port
    #[arg(long, default_value = "19981")]
    pub backend_port: u16,

    /// ffmpeg binary
    #[arg(long, default_value = "ffmpeg")]
    pub ffmpeg: PathBuf,

    /// Seconds without segment requests before a client is dropped
    #[arg(long, default_value = "20")]
    pub inactivity_timeout: u64,

    /// Seconds a dropped client is refused the same channel
    #[arg(long, default_value = "180")]
    pub flag_timeout: u64,

    /// Free space to keep in the stream directory, in bytes
    #[arg(long, default_value = "200000000")]
    pub min_free_bytes: u64,

    /// Expire segments by age instead of by free space
    #[arg(long)]
    pub no_global_cleaner: bool,

    /// Segment lifetime in seconds when the global cleaner is off
    #[arg(long, default_value = "720")]
    pub segment_lifetime: u64,

    /// Seconds to wait for a manifest to appear
    #[arg(long, default_value = "15")]
    pub manifest_wait: u64,

    /// Identify clients by the first X-Forwarded-For hop instead of the peer address
    #[arg(long)]
    pub trust_forwarded_for: bool,

    /// Channel registry file (YAML); the built-in list is used when omitted
    #[arg(long)]
    pub channels: Option<PathBuf>,
}

impl Default for ServeCommand {
    fn default() -> Self {
        Self {
            port: 8000,
            stream_dir: PathBuf::from("/tmp/ramdrive/stream"),
            public_base: "https://kodi.lyhnemail.com/streamer/stream".to_string(),
            backend_url: "http://kodi.lyhnemail.com".to_string(),
            backend_port: 19981,
            ffmpeg: PathBuf::from("ffmpeg"),
            inactivity_timeout: 20,
            flag_timeout: 180,
            min_free_bytes: 200_000_000,
            no_global_cleaner: false,
            segment_lifetime: 720,
            manifest_wait: 15,
            trust_forwarded_for: false,
            channels: None,
        }
    }
}

impl ServeCommand {
    fn stream_config(&self) -> StreamConfig {
        StreamConfig {
            stream_dir: self.stream_dir.clone(),
            public_base: self.public_base.clone(),
            backend_url: self.backend_url.clone(),
            backend_port: self.backend_port,
            ffmpeg: self.ffmpeg.clone(),
            inactivity_timeout: Duration::from_secs(self.inactivity_timeout),
            flag_timeout: Duration::from_secs(self.flag_timeout),
            manifest_wait: Duration::from_secs(self.manifest_wait),
            min_free_bytes: self.min_free_bytes,
            global_cleaner: !self.no_global_cleaner,
            segment_lifetime: Duration::from_secs(self.segment_lifetime),
            trust_forwarded_for: self.trust_forwarded_for,
        }
    }

    pub async fn run(self) -> Result<()> {
        let config = self.stream_config();
        let registry = Arc::new(super::load_registry(self.channels.as_deref())?);

        storage::purge_stream_dir(&config.stream_dir).with_context(|| {
            format!("Failed to prepare {}", config.stream_dir.display())
        })?;
        log::info!("Stream directory {}", config.stream_dir.display());

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let store = Arc::new(StreamStore::new(config));

        let mut tasks = vec![monitor::spawn_activity_monitor(
            Arc::clone(&store),
            shutdown_rx.clone(),
        )];
        let config = store.config();
        if config.global_cleaner {
            tasks.push(monitor::spawn_space_cleaner(
                config.stream_dir.clone(),
                config.min_free_bytes,
                shutdown_rx.clone(),
            ));
        } else {
            tasks.push(monitor::spawn_age_cleaner(
                config.stream_dir.clone(),
                config.segment_lifetime,
                shutdown_rx.clone(),
            ));
        }

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        log::info!("HTTP server listening on http://localhost:{}", self.port);

        let server_handle = {
            let store = Arc::clone(&store);
            let shutdown_rx = shutdown_rx.clone();
            tokio::spawn(async move {
                if let Err(e) =
                    crate::server::run_server(addr, store, registry, shutdown_rx).await
                {
                    log::error!("Server error: {e}");
                }
            })
        };

        signal::ctrl_c().await?;
        log::info!("Shutting down...");
        let _ = shutdown_tx.send(true);

        store.stop_all().await;
        let _ = server_handle.await;
        for task in tasks {
            let _ = task.await;
        }

        log::info!("Done.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::{Args, Command};

    #[test]
    fn test_defaults_match_clap_defaults() {
        let parsed = Args::parse_from(["vidstream", "serve"]);
        let Some(Command::Serve(cmd)) = parsed.command else {
            panic!("expected serve");
        };
        let default = ServeCommand::default();
        assert_eq!(cmd.port, default.port);
        assert_eq!(cmd.stream_dir, default.stream_dir);
        assert_eq!(cmd.public_base, default.public_base);
        assert_eq!(cmd.backend_port, default.backend_port);
        assert_eq!(cmd.min_free_bytes, default.min_free_bytes);
        assert_eq!(cmd.segment_lifetime, default.segment_lifetime);
        assert!(!cmd.no_global_cleaner);
        assert!(!cmd.trust_forwarded_for);
    }

    #[test]
    fn test_trusting_forwarded_for() {
        let cmd = ServeCommand::parse_from(["serve", "--trust-forwarded-for"]);
        assert!(cmd.stream_config().trust_forwarded_for);
    }

    #[test]
    fn test_disabling_the_global_cleaner() {
        let cmd = ServeCommand::parse_from(["serve", "--no-global-cleaner", "--port", "9000"]);
        let config = cmd.stream_config();
        assert!(!config.global_cleaner);
        assert_eq!(cmd.port, 9000);
        assert_eq!(config.segment_lifetime, Duration::from_secs(720));
    }
}
