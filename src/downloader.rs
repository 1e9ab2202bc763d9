//! Single-attempt downloads written atomically into place.
//!
//! A target file is either fully written or absent: bytes go to a temp file
//! in the destination directory, which is fsynced and renamed over the
//! target.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::info;

use crate::error::{Error, Result};
use crate::transport::Transport;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedFile {
    pub path: PathBuf,
    pub size: u64,
    pub sha256: String,
}

pub struct Downloader<T> {
    transport: T,
}

impl<T: Transport> Downloader<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.transport.fetch(url)
    }

    pub fn save(&self, bytes: &[u8], target: &Path) -> Result<SavedFile> {
        write_atomically(target, bytes)?;
        Ok(SavedFile {
            path: target.to_path_buf(),
            size: bytes.len() as u64,
            sha256: hash_bytes(bytes),
        })
    }

    pub fn download(&self, url: &str, target: &Path) -> Result<SavedFile> {
        let bytes = self.fetch(url)?;
        let saved = self.save(&bytes, target)?;
        info!(%url, path = %target.display(), size = saved.size, "downloaded");
        Ok(saved)
    }
}

/// Writes `bytes` to `target`, creating parent directories. On any failure
/// the temp file is removed and `target` is untouched.
pub fn write_atomically(target: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(|e| Error::io(&parent, e))?;

    let mut tmp = NamedTempFile::new_in(&parent).map_err(|e| Error::io(&parent, e))?;
    tmp.write_all(bytes).map_err(|e| Error::io(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| Error::io(tmp.path(), e))?;
    tmp.persist(target).map_err(|e| Error::io(target, e.error))?;
    Ok(())
}

pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::fake::FakeTransport;
    use tempfile::TempDir;

    #[test]
    fn download_creates_layout_directories() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("com/example/demo/1.0/demo-1.0.jar");
        let transport = FakeTransport::new().serve("https://r.example/demo.jar", b"jar-bytes");
        let downloader = Downloader::new(&transport);

        let saved = downloader.download("https://r.example/demo.jar", &target).unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"jar-bytes");
        assert_eq!(saved.size, 9);
        assert_eq!(saved.sha256, hash_bytes(b"jar-bytes"));
    }

    #[test]
    fn failed_fetch_leaves_no_file_behind() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out").join("missing.jar");
        let transport = FakeTransport::new();
        let downloader = Downloader::new(&transport);

        assert!(downloader.download("https://r.example/missing.jar", &target).is_err());
        assert!(!target.exists());
    }

    #[test]
    fn failed_rename_leaves_target_and_parent_untouched() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("demo-1.0.jar");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep.txt"), b"keep").unwrap();

        let transport = FakeTransport::new().serve("https://r.example/demo.jar", b"jar-bytes");
        let downloader = Downloader::new(&transport);
        let err = downloader
            .download("https://r.example/demo.jar", &target)
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));

        assert!(target.is_dir());
        assert_eq!(std::fs::read(target.join("keep.txt")).unwrap(), b"keep");
        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .collect();
        assert_eq!(entries, vec![target]);
    }

    #[test]
    fn write_atomically_replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("file.bin");
        std::fs::write(&target, b"old").unwrap();

        write_atomically(&target, b"new contents").unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"new contents");

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path() != target)
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn hash_bytes_is_sha256_hex() {
        assert_eq!(
            hash_bytes(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
