//! Photo storage abstraction.
//!
//! Items only keep a storage name (`repertoire/photos/<file>`); the bytes live
//! behind a [`PhotoStorage`] implementation.

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

/// Prefix of every stored photo name
pub const PHOTO_PREFIX: &str = "repertoire/photos/";

pub trait PhotoStorage: Send + Sync {
    /// Persist `bytes` and return the storage name assigned to them.
    fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String>;

    /// Read a stored photo, `None` if nothing is stored under `name`.
    fn open(&self, name: &str) -> Result<Option<Vec<u8>>>;

    fn delete(&self, name: &str) -> Result<()>;
}

/// Storage name for a served file name
pub fn storage_name(file: &str) -> String {
    format!("{}{}", PHOTO_PREFIX, file)
}

/// Keeps ASCII letters, digits, `.`, `-` and `_`; anything else becomes `_`.
pub fn sanitize_file_name(original: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim_start_matches('.');

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "photo".to_string()
    } else {
        cleaned
    }
}

/// Candidate file names: `poster.jpg`, `poster_1.jpg`, `poster_2.jpg`, ...
fn candidate_names(file: &str) -> impl Iterator<Item = String> + '_ {
    let (stem, extension) = match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, format!(".{}", ext)),
        _ => (file, String::new()),
    };

    std::iter::once(file.to_string())
        .chain((1..).map(move |n| format!("{}_{}{}", stem, n, extension)))
}

/// Photos stored as plain files under one directory
#[derive(Debug, Clone)]
pub struct FsPhotoStorage {
    root: PathBuf,
}

impl FsPhotoStorage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn path_for(&self, name: &str) -> Option<PathBuf> {
        let file = name.strip_prefix(PHOTO_PREFIX)?;
        if file.is_empty() || file.contains(['/', '\\']) || file.starts_with('.') {
            return None;
        }
        Some(self.root.join(file))
    }
}

impl PhotoStorage for FsPhotoStorage {
    fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String> {
        fs::create_dir_all(&self.root).with_context(|| {
            format!("Failed to create photo directory {}", self.root.display())
        })?;

        let sanitized = sanitize_file_name(original_name);
        for file in candidate_names(&sanitized) {
            let path = self.root.join(&file);
            // Claiming the name and creating the file is one step
            let mut handle = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(handle) => handle,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("Failed to create photo {}", path.display()));
                }
            };

            if let Err(e) = handle.write_all(bytes) {
                fs::remove_file(&path).ok();
                return Err(e).with_context(|| format!("Failed to write photo {}", path.display()));
            }

            tracing::debug!(file = %file, bytes = bytes.len(), "stored photo");
            return Ok(storage_name(&file));
        }

        anyhow::bail!("No free file name for photo {}", sanitized)
    }

    fn open(&self, name: &str) -> Result<Option<Vec<u8>>> {
        let Some(path) = self.path_for(name) else {
            return Ok(None);
        };

        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read photo {}", path.display())),
        }
    }

    fn delete(&self, name: &str) -> Result<()> {
        let Some(path) = self.path_for(name) else {
            return Ok(());
        };

        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to delete photo {}", path.display())),
        }
    }
}
