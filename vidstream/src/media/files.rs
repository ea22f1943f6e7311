/*!
    File naming shared by the ffmpeg outputs and the HTTP routes.
*/

pub const DASH_MANIFEST: &str = "manifest.mpd";
pub const DASH_INIT_PREFIX: &str = "init";
pub const DASH_CHUNK_PREFIX: &str = "chunk";

pub const HLS_MASTER: &str = "index.m3u8";
pub const HLS_COPY_INDEX: &str = "copy_index.m3u8";
pub const HLS_REENC_INDEX: &str = "reenc_index.m3u8";

/// Manifests smaller than this are ffmpeg placeholders, not playable yet.
pub const MIN_MANIFEST_BYTES: u64 = 500;

/// Media segments (TS or fMP4), as opposed to playlists and manifests.
pub fn is_segment_file(name: &str) -> bool {
    name.ends_with(".ts") || name.ends_with(".m4s")
}

/// Segments the age cleaner may remove. DASH chunks are pruned by ffmpeg itself.
pub fn is_deletable_segment(name: &str) -> bool {
    name.ends_with(".ts")
}

/// Segments the free-space cleaner may remove. DASH init segments are kept.
pub fn is_prunable_segment(name: &str) -> bool {
    name.ends_with(".ts")
        || (name.ends_with(".m4s") && name.starts_with(&format!("{DASH_CHUNK_PREFIX}-")))
}

pub fn media_type_for(name: &str) -> &'static str {
    if name.ends_with(".ts") {
        "video/MP2T"
    } else if name.ends_with(".m4s") {
        "video/iso.segment"
    } else if name.ends_with(".m3u8") {
        "application/vnd.apple.mpegurl"
    } else if name.ends_with(".mpd") {
        "application/dash+xml"
    } else {
        "application/octet-stream"
    }
}

/// A single path component that cannot escape its parent directory.
pub fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.contains('\0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_types() {
        assert_eq!(media_type_for("hq_segment-00001.ts"), "video/MP2T");
        assert_eq!(media_type_for("chunk-0-12.m4s"), "video/iso.segment");
        assert_eq!(media_type_for("copy_index.m3u8"), "application/vnd.apple.mpegurl");
        assert_eq!(media_type_for("manifest.mpd"), "application/dash+xml");
        assert_eq!(media_type_for("notes.txt"), "application/octet-stream");
    }

    #[test]
    fn test_segment_classification() {
        assert!(is_segment_file("lq_segment-00003.ts"));
        assert!(is_segment_file("init--0.m4s"));
        assert!(!is_segment_file("manifest.mpd"));
        assert!(!is_segment_file("reenc_index.m3u8"));
    }

    #[test]
    fn test_cleaner_classification() {
        assert!(is_deletable_segment("hq_segment-00001.ts"));
        assert!(!is_deletable_segment("chunk-0-1.m4s"));
        assert!(!is_deletable_segment("init--0.m4s"));

        assert!(is_prunable_segment("hq_segment-00001.ts"));
        assert!(is_prunable_segment("chunk-1-44.m4s"));
        assert!(!is_prunable_segment("init--1.m4s"));
        assert!(!is_prunable_segment("manifest.mpd"));
    }

    #[test]
    fn test_plain_names() {
        assert!(is_plain_name("798254152"));
        assert!(is_plain_name("chunk-0-1.m4s"));
        assert!(!is_plain_name(""));
        assert!(!is_plain_name(".."));
        assert!(!is_plain_name("a/b"));
        assert!(!is_plain_name("..\\secret"));
    }
}
