//! Document loading: per-format loaders and the recursive directory scan.
//!
//! Format-specific parsing lives behind the [`DocumentLoader`] trait, one
//! implementation per supported format, dispatched by file extension. The
//! [`DirectoryLoader`] walks the data directory, routes each file to its
//! loader, and skips what it cannot handle — the scan is best-effort, the
//! way a directory full of mixed files needs it to be.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::document::Document;
use crate::error::{RagError, Result};

/// Loads one document from a file of a specific format.
pub trait DocumentLoader: Send + Sync {
    /// Lowercase file extensions this loader handles.
    fn extensions(&self) -> &[&str];

    /// Load the file at `path` into a [`Document`] with `id` as its
    /// root-relative identifier.
    fn load(&self, path: &Path, id: &str) -> Result<Document>;
}

/// Read a file as UTF-8 text and collect the filesystem metadata every
/// loader attaches: extension, size, and modification time.
fn read_with_metadata(path: &Path, id: &str) -> Result<(String, HashMap<String, String>)> {
    let text = fs::read_to_string(path)
        .map_err(|e| RagError::Loader(format!("failed to read '{}': {e}", path.display())))?;

    let mut metadata = HashMap::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        metadata.insert("extension".to_string(), ext.to_lowercase());
    }
    if let Ok(fs_meta) = fs::metadata(path) {
        metadata.insert("size_bytes".to_string(), fs_meta.len().to_string());
        if let Some(secs) = fs_meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
        {
            metadata.insert("modified".to_string(), secs.to_string());
        }
    }
    debug!(document = id, "loaded document");
    Ok((text, metadata))
}

/// Loader for plain-text formats.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextLoader;

impl DocumentLoader for TextLoader {
    fn extensions(&self) -> &[&str] {
        &["txt", "text", "log", "csv"]
    }

    fn load(&self, path: &Path, id: &str) -> Result<Document> {
        let (text, mut metadata) = read_with_metadata(path, id)?;
        metadata.insert("format".to_string(), "text".to_string());
        Ok(Document {
            id: id.to_string(),
            text,
            metadata,
            source_path: Some(path.display().to_string()),
        })
    }
}

/// Loader for markdown files.
///
/// Strips a leading YAML front-matter block so that config keys do not end
/// up in the embedded text.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownLoader;

/// Drop a leading `---` front-matter block, if present.
fn strip_front_matter(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("---\n") else {
        return text;
    };
    match rest.find("\n---\n") {
        Some(end) => &rest[end + "\n---\n".len()..],
        None => text,
    }
}

impl DocumentLoader for MarkdownLoader {
    fn extensions(&self) -> &[&str] {
        &["md", "markdown"]
    }

    fn load(&self, path: &Path, id: &str) -> Result<Document> {
        let (text, mut metadata) = read_with_metadata(path, id)?;
        metadata.insert("format".to_string(), "markdown".to_string());
        Ok(Document {
            id: id.to_string(),
            text: strip_front_matter(&text).to_string(),
            metadata,
            source_path: Some(path.display().to_string()),
        })
    }
}

/// Walks a directory tree and loads every file a registered loader can
/// handle.
///
/// # Example
///
/// ```rust,ignore
/// use localrag::DirectoryLoader;
///
/// let loader = DirectoryLoader::new();
/// let documents = loader.load_directory(Path::new("./data"))?;
/// ```
pub struct DirectoryLoader {
    loaders: Vec<Box<dyn DocumentLoader>>,
}

impl Default for DirectoryLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectoryLoader {
    /// Create a loader with the built-in formats (plain text, markdown).
    pub fn new() -> Self {
        Self { loaders: vec![Box::new(TextLoader), Box::new(MarkdownLoader)] }
    }

    /// Register an additional format loader.
    pub fn with_loader(mut self, loader: Box<dyn DocumentLoader>) -> Self {
        self.loaders.push(loader);
        self
    }

    fn loader_for(&self, extension: &str) -> Option<&dyn DocumentLoader> {
        self.loaders.iter().find(|l| l.extensions().contains(&extension)).map(|l| l.as_ref())
    }

    /// Load all supported documents under `root`, recursively.
    ///
    /// Files with no registered loader are skipped silently; files that a
    /// loader fails on (unreadable, not valid UTF-8) are skipped with a
    /// warning. The scan order is sorted so document ids are stable across
    /// runs.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if `root` does not exist or is not a
    /// directory. No service call has been made at that point.
    pub fn load_directory(&self, root: &Path) -> Result<Vec<Document>> {
        if !root.exists() {
            return Err(RagError::Config(format!(
                "data directory '{}' not found; create it and put your documents inside it \
                 before running ingestion",
                root.display()
            )));
        }
        if !root.is_dir() {
            return Err(RagError::Config(format!(
                "data path '{}' is not a directory",
                root.display()
            )));
        }

        let mut files: Vec<PathBuf> = WalkDir::new(root)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .collect();
        files.sort();

        let mut documents = Vec::new();
        for path in files {
            let id = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .display()
                .to_string();
            let extension = path
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_lowercase)
                .unwrap_or_default();
            let Some(loader) = self.loader_for(&extension) else {
                debug!(file = %path.display(), "no loader for extension, skipping");
                continue;
            };
            match loader.load(&path, &id) {
                Ok(document) => documents.push(document),
                Err(e) => warn!(file = %path.display(), error = %e, "skipping unreadable file"),
            }
        }

        info!(count = documents.len(), root = %root.display(), "loaded documents");
        Ok(documents)
    }
}
