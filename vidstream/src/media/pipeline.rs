use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

use super::activity::{ActivityTracker, SessionKey};
use super::ffmpeg::{self, StreamKind};
use super::storage;

/// Settings shared by every channel transcoder.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub stream_dir: PathBuf,
    pub public_base: String,
    pub backend_url: String,
    pub backend_port: u16,
    pub ffmpeg: PathBuf,
    pub inactivity_timeout: Duration,
    pub flag_timeout: Duration,
    pub manifest_wait: Duration,
    pub min_free_bytes: u64,
    pub global_cleaner: bool,
    pub segment_lifetime: Duration,
    pub trust_forwarded_for: bool,
}

/// A running ffmpeg transcoder for one channel.
struct ChannelProcess {
    kind: StreamKind,
    child: Child,
}

impl ChannelProcess {
    fn spawn(program: &Path, args: &[String], kind: StreamKind) -> std::io::Result<Self> {
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;
        Ok(Self { kind, child })
    }

    fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    async fn kill(&mut self, channel: &str) {
        if let Err(e) = self.child.kill().await {
            log::warn!("Error killing ffmpeg for {channel}: {e}");
        }
    }
}

struct StoreInner {
    processes: HashMap<String, ChannelProcess>,
    activity: ActivityTracker,
}

/**
    Owns every channel transcoder and the activity that keeps it alive.

    At most one process runs per channel, whatever its output format. A process
    that has exited is replaced by the next request for its channel.
*/
pub struct StreamStore {
    config: StreamConfig,
    inner: Mutex<StoreInner>,
}

impl StreamStore {
    pub fn new(config: StreamConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(StoreInner {
                processes: HashMap::new(),
                activity: ActivityTracker::new(),
            }),
        }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn channel_dir(&self, channel: &str) -> PathBuf {
        self.config.stream_dir.join(channel)
    }

    /// Whether `key` is banned from requesting manifests right now.
    pub async fn is_flagged(&self, key: &SessionKey) -> bool {
        let mut inner = self.inner.lock().await;
        inner
            .activity
            .is_flagged(key, Instant::now(), self.config.flag_timeout)
    }

    /**
        Start the DASH transcoder for the session's channel unless one is running.

        A fresh start opens the channel's activity clock and the client's session.
    */
    pub async fn ensure_dash(&self, session: SessionKey) -> Result<()> {
        let channel = session.channel.clone();
        self.ensure_running(&channel, StreamKind::Dash, Some(session))
            .await
    }

    /// Start the HLS transcoder for `channel` unless one is running.
    pub async fn ensure_hls(&self, channel: &str) -> Result<()> {
        self.ensure_running(channel, StreamKind::Hls, None).await
    }

    async fn ensure_running(
        &self,
        channel: &str,
        kind: StreamKind,
        session: Option<SessionKey>,
    ) -> Result<()> {
        let mut inner = self.inner.lock().await;

        if let Some(process) = inner.processes.get_mut(channel) {
            if process.is_running() {
                return Ok(());
            }
            log::info!(
                "ffmpeg ({}) for {} has exited, restarting",
                process.kind.as_str(),
                channel
            );
            inner.processes.remove(channel);
        }

        let out_dir = self.channel_dir(channel);
        tokio::fs::create_dir_all(&out_dir)
            .await
            .with_context(|| format!("Failed to create {}", out_dir.display()))?;
        let clear_dir = out_dir.clone();
        tokio::task::spawn_blocking(move || storage::clear_channel_dir(&clear_dir))
            .await
            .context("Channel directory cleanup panicked")?
            .with_context(|| format!("Failed to clear {}", out_dir.display()))?;

        let input = ffmpeg::upstream_url(&self.config.backend_url, self.config.backend_port, channel);
        let args = match kind {
            StreamKind::Dash => ffmpeg::dash_args(&input, &out_dir),
            StreamKind::Hls => ffmpeg::hls_args(
                &input,
                &out_dir,
                &ffmpeg::channel_base(&self.config.public_base, channel),
            ),
        };

        log::info!("Starting ffmpeg ({}) for {}", kind.as_str(), channel);
        log::debug!("ffmpeg {}", args.join(" "));

        let process = ChannelProcess::spawn(&self.config.ffmpeg, &args, kind).with_context(|| {
            format!(
                "Failed to start {} for {}",
                self.config.ffmpeg.display(),
                channel
            )
        })?;
        inner.processes.insert(channel.to_string(), process);

        let now = Instant::now();
        inner.activity.touch_channel(channel, now);
        if let Some(session) = session {
            inner.activity.touch_session(session, now);
        }

        Ok(())
    }

    /// Refresh the channel clock and the client's session on a media segment request.
    pub async fn record_segment_request(&self, session: SessionKey) {
        let now = Instant::now();
        let mut inner = self.inner.lock().await;
        inner.activity.touch_channel(&session.channel, now);
        inner.activity.touch_session(session, now);
    }

    /**
        Stop transcoders nobody is watching.

        Quiet sessions are flagged first; a channel left without sessions is
        killed. Then every channel whose segments have not been requested within
        the inactivity timeout is killed and its directory emptied.
    */
    pub async fn sweep(&self, now: Instant) {
        let timeout = self.config.inactivity_timeout;
        let mut inner = self.inner.lock().await;

        let orphaned = inner.activity.expire_sessions(now, timeout);
        for channel in orphaned {
            if let Some(mut process) = inner.processes.remove(&channel) {
                log::info!("No clients left for {channel}, stopping ffmpeg");
                process.kill(&channel).await;
            }
        }

        let running: Vec<String> = inner.processes.keys().cloned().collect();
        let idle = inner
            .activity
            .idle_channels(running.iter().map(String::as_str), now, timeout);

        for channel in idle {
            log::info!("Stopping ffmpeg for {channel} due to inactivity");
            if let Some(mut process) = inner.processes.remove(&channel) {
                process.kill(&channel).await;
            }
            inner.activity.forget_channel(&channel);

            let dir = self.channel_dir(&channel);
            let cleared = {
                let dir = dir.clone();
                tokio::task::spawn_blocking(move || storage::clear_channel_dir(&dir)).await
            };
            match cleared {
                Ok(Ok(())) => log::info!("Cleaned {}", dir.display()),
                Ok(Err(e)) => log::warn!("Could not clean {}: {}", dir.display(), e),
                Err(e) => log::error!("Cleanup of {} panicked: {}", dir.display(), e),
            }
        }
    }

    pub async fn has_session(&self, key: &SessionKey) -> bool {
        self.inner.lock().await.activity.has_session(key)
    }

    /// Channels with a live transcoder, sorted by name.
    pub async fn running_channels(&self) -> Vec<(String, StreamKind)> {
        let mut inner = self.inner.lock().await;
        let mut running: Vec<(String, StreamKind)> = inner
            .processes
            .iter_mut()
            .filter_map(|(channel, process)| {
                process
                    .is_running()
                    .then(|| (channel.clone(), process.kind))
            })
            .collect();
        running.sort_by(|a, b| a.0.cmp(&b.0));
        running
    }

    pub async fn stop_all(&self) {
        let mut inner = self.inner.lock().await;
        for (channel, mut process) in inner.processes.drain() {
            log::info!("Stopping ffmpeg for {channel}");
            process.kill(&channel).await;
        }
    }
}

/**
    Poll until `path` is larger than `min_bytes`, for at most `wait`.
*/
pub async fn wait_for_file(path: &Path, min_bytes: u64, wait: Duration) -> bool {
    // A wait too long to represent never expires.
    let deadline = Instant::now().checked_add(wait);
    loop {
        if let Ok(meta) = tokio::fs::metadata(path).await
            && meta.len() > min_bytes
        {
            return true;
        }
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}
