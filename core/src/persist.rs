use crate::{DocId, InvertedIndex};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

pub const INDEX_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFormat {
    Json,
    Bincode,
}

impl IndexFormat {
    /// `.bin` selects bincode, anything else JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some("bin") => IndexFormat::Bincode,
            _ => IndexFormat::Json,
        }
    }
}

#[derive(Serialize)]
struct IndexFileRef<'a> {
    version: u32,
    created_at: String,
    num_docs: u32,
    postings: &'a BTreeMap<String, Vec<DocId>>,
}

#[derive(Debug, Deserialize)]
struct IndexFile {
    version: u32,
    created_at: String,
    num_docs: u32,
    postings: BTreeMap<String, Vec<DocId>>,
}

#[derive(Debug, Error)]
pub enum IndexLoadError {
    #[error("cannot read index file {}: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },

    #[error("index file {} is malformed: {message}", path.display())]
    Malformed { path: PathBuf, message: String },

    #[error("index file {} has format version {found}, expected {expected}", path.display())]
    UnsupportedVersion { path: PathBuf, found: u32, expected: u32 },
}

/// Serialize `index` to `path`. The bytes go to a temporary file in the same
/// directory first and are renamed into place, so readers see either the old file or the complete new one.
pub fn save_index(path: &Path, index: &InvertedIndex) -> Result<()> {
    let dir = match path.parent().filter(|d| !d.as_os_str().is_empty()) {
        Some(dir) => dir,
        None => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    let file = IndexFileRef {
        version: INDEX_FORMAT_VERSION,
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default(),
        num_docs: index.num_docs(),
        postings: index.postings_map(),
    };
    let bytes = match IndexFormat::from_path(path) {
        IndexFormat::Json => serde_json::to_vec_pretty(&file)?,
        IndexFormat::Bincode => bincode::serialize(&file)?,
    };

    // uniquely named, and removed on drop if anything below fails
    let mut tmp = NamedTempFile::new_in(dir).with_context(|| format!("creating temp file in {}", dir.display()))?;
    tmp.write_all(&bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("moving index into place at {}", path.display()))?;
    tracing::info!(path = %path.display(), terms = index.num_terms(), "index saved");
    Ok(())
}

pub fn load_index(path: &Path) -> std::result::Result<InvertedIndex, IndexLoadError> {
    let io_err = |source| IndexLoadError::Io { path: path.to_path_buf(), source };
    let mut f = File::open(path).map_err(io_err)?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf).map_err(io_err)?;

    let malformed = |message: String| IndexLoadError::Malformed { path: path.to_path_buf(), message };
    let file: IndexFile = match IndexFormat::from_path(path) {
        IndexFormat::Json => serde_json::from_slice(&buf).map_err(|e| malformed(e.to_string()))?,
        IndexFormat::Bincode => bincode::deserialize(&buf).map_err(|e| malformed(e.to_string()))?,
    };
    if file.version != INDEX_FORMAT_VERSION {
        return Err(IndexLoadError::UnsupportedVersion {
            path: path.to_path_buf(),
            found: file.version,
            expected: INDEX_FORMAT_VERSION,
        });
    }
    for (term, list) in &file.postings {
        let mut seen = std::collections::HashSet::with_capacity(list.len());
        if !list.iter().all(|id| seen.insert(*id)) {
            return Err(malformed(format!("posting list for {term:?} repeats a document id")));
        }
    }
    tracing::debug!(path = %path.display(), created_at = %file.created_at, "index loaded");
    Ok(InvertedIndex::from_parts(file.postings, file.num_docs))
}
