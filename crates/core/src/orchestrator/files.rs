//! Output file naming and discovery.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Characters that are not allowed in file names on common filesystems.
const ILLEGAL_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Replaces every illegal file-name character with `_`.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if ILLEGAL_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Image extension for a cover URL: the URL's own when it is a known image
/// type, `jpg` otherwise.
pub fn cover_extension(url: &str) -> &'static str {
    let path = reqwest::Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string());
    let ext = Path::new(&path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("png") => "png",
        Some("webp") => "webp",
        _ => "jpg",
    }
}

/// Audio files (by extension, case-insensitive) directly inside `dir`, with
/// their modification times. A missing directory has no files.
pub async fn list_audio_files(dir: &Path, ext: &str) -> io::Result<Vec<(PathBuf, SystemTime)>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(ext));
        if !matches {
            continue;
        }
        let metadata = entry.metadata().await?;
        if metadata.is_file() {
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            files.push((path, modified));
        }
    }
    Ok(files)
}

/// The most recently modified file in `after` that is not in `before`.
pub fn newest_new_file(
    before: &HashSet<PathBuf>,
    after: Vec<(PathBuf, SystemTime)>,
) -> Option<PathBuf> {
    after
        .into_iter()
        .filter(|(path, _)| !before.contains(path))
        .max_by_key(|(_, modified)| *modified)
        .map(|(path, _)| path)
}
