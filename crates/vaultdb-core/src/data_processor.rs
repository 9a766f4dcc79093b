use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::chunker::{chunk_text, ChunkingConfig};
use crate::config::VaultSettings;
use crate::error::{Error, Result};
use crate::extract::extract_file;
use crate::types::{chunk_id, ChunkMetadata, DocumentChunk};

/// Check that `path` is an existing directory and return its canonical form.
pub fn resolve_vault(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        return Err(Error::VaultNotFound(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(Error::NotADirectory(path.to_path_buf()));
    }
    Ok(path.canonicalize()?)
}

/// Where a file sits inside the vault, in the form stored as metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultPath {
    pub relative_path: String,
    pub directory: String,
    pub file_name: String,
}

impl VaultPath {
    pub fn new(root: &Path, file: &Path) -> Self {
        let relative = file.strip_prefix(root).unwrap_or(file);
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        let file_name = parts.last().cloned().unwrap_or_default();
        let directory = if parts.len() > 1 { parts[..parts.len() - 1].join("/") } else { ".".to_string() };
        Self { relative_path: parts.join("/"), directory, file_name }
    }
}

/// Walks a vault and turns each markdown file into chunks.
#[derive(Debug, Clone, Default)]
pub struct DataProcessor {
    chunking_config: ChunkingConfig,
    vault: VaultSettings,
}

impl DataProcessor {
    pub fn new(chunking_config: ChunkingConfig, vault: VaultSettings) -> Self {
        Self { chunking_config, vault }
    }

    /// Markdown files under `root`, sorted, skipping the excluded directory
    /// and hidden directories at any depth. Symlinked files are listed;
    /// symlinked directories are not descended into.
    pub fn list_markdown_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(root)
            .into_iter()
            .filter_entry(|e| !self.is_pruned(e))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() || (e.path_is_symlink() && e.path().is_file()))
            .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some(self.vault.extension.as_str()))
            .map(|e| e.into_path())
            .collect();
        files.sort();
        files
    }

    fn is_pruned(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        name == self.vault.excluded_dir.as_str() || name.starts_with('.')
    }

    /// Extract and chunk one file. An empty result means the file had no text.
    pub fn process_file(&self, root: &Path, file: &Path) -> Result<Vec<DocumentChunk>> {
        let content = extract_file(file)?;
        let location = VaultPath::new(root, file);
        Ok(build_chunks(&location, chunk_text(&content, &self.chunking_config)))
    }
}

/// Attach ids and metadata to a file's chunk texts.
pub fn build_chunks(location: &VaultPath, texts: Vec<String>) -> Vec<DocumentChunk> {
    let total_chunks = texts.len();
    texts
        .into_iter()
        .enumerate()
        .map(|(chunk_index, content)| DocumentChunk {
            id: chunk_id(&location.relative_path, chunk_index),
            content,
            metadata: ChunkMetadata {
                file_path: location.relative_path.clone(),
                chunk_index,
                total_chunks,
                directory: location.directory.clone(),
                file_name: location.file_name.clone(),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vault_path_at_root_uses_dot_directory() {
        let loc = VaultPath::new(Path::new("/v"), Path::new("/v/a.md"));
        assert_eq!(loc, VaultPath { relative_path: "a.md".into(), directory: ".".into(), file_name: "a.md".into() });
    }

    #[test]
    fn vault_path_nested() {
        let loc = VaultPath::new(Path::new("/v"), Path::new("/v/work/projects/plan.md"));
        assert_eq!(loc.relative_path, "work/projects/plan.md");
        assert_eq!(loc.directory, "work/projects");
        assert_eq!(loc.file_name, "plan.md");
    }

    #[test]
    fn build_chunks_numbers_contiguously() {
        let loc = VaultPath::new(Path::new("/v"), Path::new("/v/n/a.md"));
        let chunks = build_chunks(&loc, vec!["one".into(), "two".into(), "three".into()]);
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.metadata.chunk_index, i);
            assert_eq!(c.metadata.total_chunks, 3);
            assert_eq!(c.id, chunk_id("n/a.md", i));
        }
    }
}
