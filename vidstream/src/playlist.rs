use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;

static ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(#EXTINF:-1[^\r\n]*)\r?\n([^\r\n]+)").unwrap());
static TVG_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"tvg-id="([^"]+)""#).unwrap());
static TVG_CHNO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"tvg-chno="([^"]+)""#).unwrap());
static TVG_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"tvg-name="([^"]+)""#).unwrap());
static DISPLAY_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",\s*([^,\n]+)\s*$").unwrap());
static CHANNEL_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/channelid/(\d+)").unwrap());

const UNKNOWN_NAME: &str = "CH-UNKNOWN";

/// Stream flavour the rewritten playlist points players at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StreamFormat {
    /// HLS master playlist (index.m3u8)
    Hls,
    /// MPEG-DASH manifest (manifest.mpd)
    Dash,
}

impl StreamFormat {
    pub fn index_file(self) -> &'static str {
        match self {
            StreamFormat::Hls => crate::media::files::HLS_MASTER,
            StreamFormat::Dash => crate::media::files::DASH_MANIFEST,
        }
    }
}

/// How backend entries are rewritten.
#[derive(Debug, Clone)]
pub struct RewriteOptions {
    pub epg_url: String,
    pub stream_base: String,
    pub format: StreamFormat,
}

/// A rewritten playlist plus the backend URLs that had no channel id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    pub playlist: String,
    pub channels: usize,
    pub skipped: Vec<String>,
}

fn capture<'a>(re: &Regex, haystack: &'a str) -> Option<&'a str> {
    re.captures(haystack)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/**
    Rewrite a backend M3U channel list so every entry points at the streamer.

    Each `#EXTINF:-1` line and the URL after it become one entry. The channel id
    is the numeric `/channelid/<n>` in the backend URL; entries without one are
    skipped.
*/
pub fn rewrite_playlist(m3u: &str, options: &RewriteOptions) -> Rewritten {
    let mut out = vec!["#EXTM3U".to_string(), format!("#EXTXMLTV: {}", options.epg_url)];
    let mut skipped = Vec::new();
    let mut channels = 0;

    for entry in ENTRY.captures_iter(m3u) {
        let info = entry[1].trim();
        let url = entry[2].trim();
        log::debug!("Entry {info} -> {url}");

        let Some(channel_id) = capture(&CHANNEL_ID, url) else {
            log::warn!("No channelid found in URL, skipping: {url}");
            skipped.push(url.to_string());
            continue;
        };

        let tvg_id = capture(&TVG_ID, info).unwrap_or(channel_id);
        let display_name = capture(&DISPLAY_NAME, info)
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .or_else(|| capture(&TVG_NAME, info))
            .unwrap_or(UNKNOWN_NAME);
        let chno = capture(&TVG_CHNO, info)
            .map(|c| format!(" tvg-chno=\"{c}\""))
            .unwrap_or_default();

        out.push(format!(
            "#EXTINF:-1 tvg-id=\"{tvg_id}\" tvg-name=\"{display_name}\"{chno} group-title=\"TV\",{display_name}"
        ));
        out.push(format!(
            "{}{}/{}",
            options.stream_base,
            channel_id,
            options.format.index_file()
        ));
        channels += 1;
    }

    Rewritten {
        playlist: out.join("\n"),
        channels,
        skipped,
    }
}

/// Download the backend's channel list.
pub async fn fetch_playlist(client: &reqwest::Client, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to request {url}"))?
        .error_for_status()
        .with_context(|| format!("Backend rejected {url}"))?;

    response
        .text()
        .await
        .with_context(|| format!("Failed to read playlist body from {url}"))
}
