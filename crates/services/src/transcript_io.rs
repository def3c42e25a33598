//! Conversation files on disk: plain text, or a gzipped tar archive
//! holding the conversation as a single text entry.

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageFormat {
    PlainText,
    Archive,
}

impl StorageFormat {
    /// `.tar.gz` and `.tgz` are archives; anything else is plain text.
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            StorageFormat::Archive
        } else {
            StorageFormat::PlainText
        }
    }
}

pub fn save(path: &Path, transcript: &str) -> Result<()> {
    if transcript.trim().is_empty() {
        bail!("no conversation to save");
    }
    match StorageFormat::from_path(path) {
        StorageFormat::PlainText => {
            fs::write(path, transcript).with_context(|| format!("writing {}", path.display()))
        }
        StorageFormat::Archive => save_archive(path, transcript),
    }
}

fn save_archive(path: &Path, transcript: &str) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);

    let entry_name = format!("conversation_{}.txt", chrono::Utc::now().timestamp_millis());
    let data = transcript.as_bytes();
    let mut header = tar::Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder.append_data(&mut header, &entry_name, data)?;

    builder.into_inner()?.finish()?;
    Ok(())
}

pub fn load(path: &Path) -> Result<String> {
    match StorageFormat::from_path(path) {
        StorageFormat::PlainText => {
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
        }
        StorageFormat::Archive => load_archive(path),
    }
}

/// A single text entry comes back verbatim. When an archive holds
/// several, each is prefixed with a `=== File: <name> ===` header so
/// nothing is silently dropped.
fn load_archive(path: &Path) -> Result<String> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));

    let mut texts: Vec<(String, String)> = Vec::new();
    for entry in archive.entries()? {
        let mut entry = entry?;
        let name = entry.path()?.to_string_lossy().into_owned();
        if !name.to_ascii_lowercase().ends_with(".txt") {
            continue;
        }
        let mut text = String::new();
        entry.read_to_string(&mut text)?;
        texts.push((name, text));
    }

    if texts.is_empty() {
        bail!("no text entries found in the archive");
    }
    if texts.len() == 1 {
        return Ok(texts.remove(0).1);
    }
    let mut combined = String::new();
    for (name, text) in &texts {
        combined.push_str(&format!("=== File: {name} ===\n"));
        combined.push_str(text);
        combined.push_str("\n\n");
    }
    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_archive(path: &Path, entries: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, text) in entries {
            let data = text.as_bytes();
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            StorageFormat::from_path(Path::new("chat.txt")),
            StorageFormat::PlainText
        );
        assert_eq!(
            StorageFormat::from_path(Path::new("chat.tar.gz")),
            StorageFormat::Archive
        );
        assert_eq!(
            StorageFormat::from_path(Path::new("CHAT.TGZ")),
            StorageFormat::Archive
        );
        assert_eq!(
            StorageFormat::from_path(Path::new("notes")),
            StorageFormat::PlainText
        );
    }

    #[test]
    fn test_plain_text_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conversation.txt");
        let transcript = "You: Hi\n\nAI: Hello there\n\n";

        save(&path, transcript).unwrap();
        assert_eq!(load(&path).unwrap(), transcript);
    }

    #[test]
    fn test_empty_transcript_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.txt");
        assert!(save(&path, "").is_err());
        assert!(save(&path, "  \n\n ").is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_archive_round_trip_single_entry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conversation.tar.gz");
        let transcript = "You: saved?\n\nAI: saved.\n\n";

        save(&path, transcript).unwrap();
        assert_eq!(load(&path).unwrap(), transcript);
    }

    #[test]
    fn test_multi_entry_archive_gets_headers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("two.tgz");
        write_archive(&path, &[("one.txt", "first"), ("two.txt", "second")]);

        let loaded = load(&path).unwrap();
        assert_eq!(
            loaded,
            "=== File: one.txt ===\nfirst\n\n=== File: two.txt ===\nsecond\n\n"
        );
    }

    #[test]
    fn test_archive_ignores_non_text_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mixed.tar.gz");
        write_archive(&path, &[("debug.log", "noise"), ("chat.txt", "kept")]);

        assert_eq!(load(&path).unwrap(), "kept");
    }

    #[test]
    fn test_archive_without_text_entries_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("binary.tar.gz");
        write_archive(&path, &[("image.png", "not text")]);

        assert!(load(&path).is_err());
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(load(Path::new("/nonexistent/conversation.txt")).is_err());
    }
}
