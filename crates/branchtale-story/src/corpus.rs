//! Story corpora: where source documents come from.
//!
//! A document directly under the corpus root defines a group named after its
//! file stem. A document inside a directory is one variant of the group named
//! after that directory.

use std::fs;
use std::path::{Path, PathBuf};

const STORY_EXTENSION: &str = "md";

#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("story root not found: {}", .0.display())]
    MissingRoot(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One authored story document, unparsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Path relative to the corpus root, `/`-separated.
    pub source_id: String,
    pub group: String,
    pub raw: String,
}

impl SourceDocument {
    /// Build a document whose group is derived from `source_id`.
    pub fn new(source_id: impl Into<String>, raw: impl Into<String>) -> Self {
        let source_id = source_id.into();
        let group = group_name_for(&source_id);
        Self {
            source_id,
            group,
            raw: raw.into(),
        }
    }
}

/// Anything that can enumerate story documents in a deterministic order.
pub trait Corpus {
    fn documents(&self) -> Result<Vec<SourceDocument>, CorpusError>;
}

/// Group name for a `/`-separated relative path.
pub fn group_name_for(source_id: &str) -> String {
    let mut parts: Vec<&str> = source_id.split('/').filter(|p| !p.is_empty()).collect();
    let file = parts.pop().unwrap_or_default();
    match parts.last() {
        Some(dir) => (*dir).to_string(),
        None => file
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .filter(|stem| !stem.is_empty())
            .unwrap_or(file)
            .to_string(),
    }
}

/// Markdown files under a directory tree.
#[derive(Debug, Clone)]
pub struct DirectoryCorpus {
    root: PathBuf,
}

impl DirectoryCorpus {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn collect(&self, dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), CorpusError> {
        let entries = fs::read_dir(dir).map_err(|source| CorpusError::Read {
            path: dir.to_path_buf(),
            source,
        })?;
        for entry in entries {
            let entry = entry.map_err(|source| CorpusError::Read {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if path.is_dir() {
                self.collect(&path, out)?;
            } else if path.extension().is_some_and(|ext| ext == STORY_EXTENSION) {
                out.push(path);
            }
        }
        Ok(())
    }

    fn source_id(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl Corpus for DirectoryCorpus {
    fn documents(&self) -> Result<Vec<SourceDocument>, CorpusError> {
        if !self.root.is_dir() {
            return Err(CorpusError::MissingRoot(self.root.clone()));
        }

        let mut paths = Vec::new();
        self.collect(&self.root, &mut paths)?;

        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            let raw = fs::read_to_string(&path).map_err(|source| CorpusError::Read {
                path: path.clone(),
                source,
            })?;
            documents.push(SourceDocument::new(self.source_id(&path), raw));
        }
        documents.sort_by(|a, b| a.source_id.cmp(&b.source_id));
        tracing::debug!(
            root = %self.root.display(),
            documents = documents.len(),
            "collected story documents"
        );
        Ok(documents)
    }
}

/// Documents held in memory, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryCorpus {
    documents: Vec<SourceDocument>,
}

impl MemoryCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, source_id: &str, raw: &str) -> Self {
        self.push(source_id, raw);
        self
    }

    pub fn push(&mut self, source_id: &str, raw: &str) {
        self.documents.push(SourceDocument::new(source_id, raw));
    }
}

impl Corpus for MemoryCorpus {
    fn documents(&self) -> Result<Vec<SourceDocument>, CorpusError> {
        Ok(self.documents.clone())
    }
}
