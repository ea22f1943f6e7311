use std::path::Path;

use super::files::{
    DASH_CHUNK_PREFIX, DASH_INIT_PREFIX, DASH_MANIFEST, HLS_COPY_INDEX, HLS_REENC_INDEX,
};

/// Which output format a channel's ffmpeg process produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Dash,
    Hls,
}

impl StreamKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StreamKind::Dash => "dash",
            StreamKind::Hls => "hls",
        }
    }
}

/// Backend URL for a channel's raw transport stream.
pub fn upstream_url(backend_url: &str, backend_port: u16, channel: &str) -> String {
    format!(
        "{}:{}/stream/channelid/{}?profile=pass",
        backend_url.trim_end_matches('/'),
        backend_port,
        channel
    )
}

/// Public URL prefix for a channel's files.
pub fn channel_base(public_base: &str, channel: &str) -> String {
    format!("{}/{}", public_base.trim_end_matches('/'), channel)
}

fn input_args(input: &str) -> Vec<String> {
    [
        "-loglevel",
        "warning",
        "-stats",
        "-fflags",
        "+discardcorrupt+genpts+igndts",
        "-err_detect",
        "ignore_err",
        "-max_interleave_delta",
        "0",
        "-probesize",
        "10M",
        "-analyzeduration",
        "10M",
        "-i",
        input,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn stream_map_args() -> [&'static str; 7] {
    ["-sn", "-map", "0:v:0", "-map", "0:a:0", "-map", "-0:s"]
}

/// AAC stereo audio and the shared GOP length.
fn audio_args() -> [&'static str; 12] {
    [
        "-c:a",
        "aac",
        "-ac",
        "2",
        "-ar",
        "48000",
        "-b:a",
        "128k",
        "-g",
        "100",
        "-keyint_min",
        "100",
    ]
}

/// High quality 720p H.264 tuned for low latency.
fn high_quality_video_args(filter: &str) -> Vec<String> {
    [
        "-vf",
        filter,
        "-pix_fmt",
        "yuv420p",
        "-c:v",
        "libx264",
        "-tune",
        "zerolatency",
        "-x264opts",
        "keyint=48:min-keyint=1:scenecut=0",
        "-profile:v",
        "high",
        "-level",
        "5.1",
        "-preset",
        "veryfast",
        "-crf",
        "21",
        "-maxrate",
        "6000k",
        "-bufsize",
        "6000k",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Deinterlaced 720p H.264 at a lower bitrate.
fn low_quality_video_args() -> Vec<String> {
    [
        "-vf",
        "yadif=1,scale=-1:720",
        "-pix_fmt",
        "yuv420p",
        "-c:v",
        "libx264",
        "-profile:v",
        "high",
        "-level",
        "5.1",
        "-preset",
        "ultrafast",
        "-crf",
        "23",
        "-maxrate",
        "3000k",
        "-bufsize",
        "6000k",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn hls_output_args(segment_pattern: String, base: &str, index: String) -> Vec<String> {
    vec![
        "-f".into(),
        "hls".into(),
        "-hls_time".into(),
        "2".into(),
        "-hls_list_size".into(),
        "20".into(),
        "-hls_flags".into(),
        "independent_segments+delete_segments+program_date_time".into(),
        "-hls_segment_type".into(),
        "mpegts".into(),
        "-hls_segment_filename".into(),
        segment_pattern,
        "-hls_base_url".into(),
        base.into(),
        index,
    ]
}

/**
    Arguments for a live DASH transcode of `input` into `out_dir`.
*/
pub fn dash_args(input: &str, out_dir: &Path) -> Vec<String> {
    let mut args = input_args(input);
    args.extend(stream_map_args().map(String::from));
    args.extend(high_quality_video_args("setfield=tff,scale=-1:720"));
    args.extend(audio_args().map(String::from));
    args.extend(
        [
            "-f".to_string(),
            "dash".to_string(),
            "-window_size".to_string(),
            "2000".to_string(),
            "-extra_window_size".to_string(),
            "0".to_string(),
            "-init_seg_name".to_string(),
            format!("{DASH_INIT_PREFIX}--$RepresentationID$.m4s"),
            "-media_seg_name".to_string(),
            format!("{DASH_CHUNK_PREFIX}-$RepresentationID$-$Number$.m4s"),
            "-seg_duration".to_string(),
            "2".to_string(),
            "-use_template".to_string(),
            "1".to_string(),
            "-use_timeline".to_string(),
            "1".to_string(),
            "-remove_at_exit".to_string(),
            "1".to_string(),
            out_dir.join(DASH_MANIFEST).display().to_string(),
        ],
    );
    args
}

/**
    Arguments for a dual-variant HLS transcode of `input` into `out_dir`.

    Both variant playlists reference segments through `base`.
*/
pub fn hls_args(input: &str, out_dir: &Path, base: &str) -> Vec<String> {
    let base = if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{base}/")
    };

    let mut args = input_args(input);

    args.extend(stream_map_args().map(String::from));
    args.extend(high_quality_video_args("scale=-1:720"));
    args.extend(audio_args().map(String::from));
    args.extend(hls_output_args(
        out_dir.join("hq_segment-%05d.ts").display().to_string(),
        &base,
        out_dir.join(HLS_COPY_INDEX).display().to_string(),
    ));

    args.extend(stream_map_args().map(String::from));
    args.extend(low_quality_video_args());
    args.extend(audio_args().map(String::from));
    args.extend(hls_output_args(
        out_dir.join("lq_segment-%05d.ts").display().to_string(),
        &base,
        out_dir.join(HLS_REENC_INDEX).display().to_string(),
    ));

    args
}

/**
    HLS master playlist pointing at both variant playlists under `channel_base`.
*/
pub fn master_playlist(channel_base: &str) -> String {
    format!(
        "#EXTM3U\n\
         #EXT-X-VERSION:3\n\
         \n\
         # Copy variant (original resolution)\n\
         #EXT-X-STREAM-INF:BANDWIDTH=5000000,RESOLUTION=1920x1080\n\
         {channel_base}/{HLS_COPY_INDEX}\n\
         \n\
         # Transcoded 720p variant\n\
         #EXT-X-STREAM-INF:BANDWIDTH=3000000,RESOLUTION=1280x720\n\
         {channel_base}/{HLS_REENC_INDEX}\n"
    )
}
