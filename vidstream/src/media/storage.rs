use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use super::files::{is_deletable_segment, is_prunable_segment};

/**
    Empty the stream directory, creating it if missing.

    Children that cannot be removed are logged and skipped.
*/
pub fn purge_stream_dir(dir: &Path) -> io::Result<()> {
    log::info!("Purging {}", dir.display());
    if !dir.exists() {
        log::info!("{} missing, creating it", dir.display());
        return fs::create_dir_all(dir);
    }

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let result = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        if let Err(e) = result {
            log::warn!("Failed removing {}: {}", path.display(), e);
        }
    }

    log::info!("Finished purging {}", dir.display());
    Ok(())
}

/// Remove every file directly inside `dir`, keeping the directory.
pub fn clear_channel_dir(dir: &Path) -> io::Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

/// Prunable segments below `base`, oldest first.
fn collect_prunable(base: &Path) -> Vec<PathBuf> {
    let mut found: Vec<(SystemTime, PathBuf)> = Vec::new();
    let mut pending = vec![base.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            let Ok(meta) = entry.metadata() else {
                continue;
            };
            if meta.is_dir() {
                pending.push(path);
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if is_prunable_segment(&name) {
                let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
                found.push((modified, path));
            }
        }
    }

    found.sort();
    found.into_iter().map(|(_, path)| path).collect()
}

/**
    Delete the oldest segments under `base` until `free_space` reports at least
    `min_free_bytes`, or nothing prunable is left.

    Returns the number of files removed.
*/
pub fn prune_for_space(
    base: &Path,
    min_free_bytes: u64,
    mut free_space: impl FnMut(&Path) -> io::Result<u64>,
) -> io::Result<usize> {
    let mut candidates = collect_prunable(base).into_iter();
    let mut removed = 0;

    while free_space(base)? < min_free_bytes {
        let Some(oldest) = candidates.next() else {
            break;
        };
        match fs::remove_file(&oldest) {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }

    Ok(removed)
}

/// Free bytes on the filesystem holding `path`.
pub fn available_space(path: &Path) -> io::Result<u64> {
    fs2::available_space(path)
}

/**
    Delete deletable segments in `dir` last modified more than `lifetime` before `now`.

    Returns the number of files removed.
*/
pub fn prune_expired(dir: &Path, lifetime: Duration, now: SystemTime) -> io::Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in fs::read_dir(dir)?.filter_map(|e| e.ok()) {
        let name = entry.file_name().to_string_lossy().to_string();
        if !is_deletable_segment(&name) {
            continue;
        }
        let Ok(modified) = entry.metadata().and_then(|m| m.modified()) else {
            continue;
        };
        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        if age > lifetime {
            match fs::remove_file(entry.path()) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
    }
    Ok(removed)
}

/// Run [`prune_expired`] on every channel directory directly below `base`.
pub fn prune_expired_channels(
    base: &Path,
    lifetime: Duration,
    now: SystemTime,
) -> io::Result<usize> {
    if !base.exists() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in fs::read_dir(base)?.filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.is_dir() {
            removed += prune_expired(&path, lifetime, now)?;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::fs::File;

    use super::*;

    fn touch(path: &Path, age: Duration) {
        let file = File::create(path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
    }

    #[test]
    fn test_purge_removes_everything() {
        let temp = tempfile::tempdir().unwrap();
        let channel = temp.path().join("42");
        fs::create_dir(&channel).unwrap();
        touch(&channel.join("chunk-0-1.m4s"), Duration::ZERO);
        touch(&temp.path().join("stray.txt"), Duration::ZERO);

        purge_stream_dir(temp.path()).unwrap();
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_purge_creates_missing_dir() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("ramdrive/stream");
        purge_stream_dir(&dir).unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn test_clear_channel_dir_keeps_dir() {
        let temp = tempfile::tempdir().unwrap();
        touch(&temp.path().join("manifest.mpd"), Duration::ZERO);
        touch(&temp.path().join("init--0.m4s"), Duration::ZERO);

        clear_channel_dir(temp.path()).unwrap();
        assert!(temp.path().is_dir());
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_prune_for_space_removes_oldest_first() {
        let temp = tempfile::tempdir().unwrap();
        let channel = temp.path().join("42");
        fs::create_dir(&channel).unwrap();
        touch(&channel.join("chunk-0-1.m4s"), Duration::from_secs(30));
        touch(&channel.join("chunk-0-2.m4s"), Duration::from_secs(20));
        touch(&channel.join("chunk-0-3.m4s"), Duration::from_secs(10));
        touch(&channel.join("init--0.m4s"), Duration::from_secs(60));

        // Every deletion frees 100 bytes; 250 are needed.
        let free = Cell::new(0u64);
        let removed = prune_for_space(temp.path(), 250, |_| {
            let now = free.get();
            free.set(now + 100);
            Ok(now)
        })
        .unwrap();

        assert_eq!(removed, 3);
        assert!(channel.join("init--0.m4s").exists());

        let temp = tempfile::tempdir().unwrap();
        touch(&temp.path().join("a.ts"), Duration::from_secs(30));
        touch(&temp.path().join("b.ts"), Duration::from_secs(10));
        let mut calls = 0;
        let removed = prune_for_space(temp.path(), 1, |_| {
            calls += 1;
            Ok(if calls > 1 { 1 } else { 0 })
        })
        .unwrap();
        assert_eq!(removed, 1);
        assert!(!temp.path().join("a.ts").exists());
        assert!(temp.path().join("b.ts").exists());
    }

    #[test]
    fn test_prune_for_space_noop_when_enough_space() {
        let temp = tempfile::tempdir().unwrap();
        touch(&temp.path().join("a.ts"), Duration::from_secs(30));

        let removed = prune_for_space(temp.path(), 100, |_| Ok(1_000)).unwrap();
        assert_eq!(removed, 0);
        assert!(temp.path().join("a.ts").exists());
    }

    #[test]
    fn test_prune_expired_only_old_ts() {
        let temp = tempfile::tempdir().unwrap();
        touch(&temp.path().join("old.ts"), Duration::from_secs(800));
        touch(&temp.path().join("fresh.ts"), Duration::from_secs(10));
        touch(&temp.path().join("chunk-0-1.m4s"), Duration::from_secs(800));

        let removed =
            prune_expired(temp.path(), Duration::from_secs(720), SystemTime::now()).unwrap();

        assert_eq!(removed, 1);
        assert!(!temp.path().join("old.ts").exists());
        assert!(temp.path().join("fresh.ts").exists());
        assert!(temp.path().join("chunk-0-1.m4s").exists());
    }

    #[test]
    fn test_prune_expired_channels_walks_channel_dirs() {
        let temp = tempfile::tempdir().unwrap();
        for channel in ["42", "43"] {
            let dir = temp.path().join(channel);
            fs::create_dir(&dir).unwrap();
            touch(&dir.join("lq_segment-00001.ts"), Duration::from_secs(800));
            touch(&dir.join("lq_segment-00002.ts"), Duration::from_secs(5));
        }
        touch(&temp.path().join("stray.ts"), Duration::from_secs(800));

        let removed =
            prune_expired_channels(temp.path(), Duration::from_secs(720), SystemTime::now())
                .unwrap();

        assert_eq!(removed, 2);
        for channel in ["42", "43"] {
            let dir = temp.path().join(channel);
            assert!(!dir.join("lq_segment-00001.ts").exists());
            assert!(dir.join("lq_segment-00002.ts").exists());
        }
        assert!(temp.path().join("stray.ts").exists());
    }

    #[test]
    fn test_prune_expired_channels_missing_base() {
        let temp = tempfile::tempdir().unwrap();
        let removed = prune_expired_channels(
            &temp.path().join("missing"),
            Duration::from_secs(720),
            SystemTime::now(),
        )
        .unwrap();
        assert_eq!(removed, 0);
    }
}
