use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};

use vaultdb_core::data_processor::{resolve_vault, DataProcessor, VaultPath};
use vaultdb_core::filter::Filter;
use vaultdb_core::traits::VectorStore;
use vaultdb_core::types::{ChunkId, ChunkMetadata, ChunkRecord};
use vaultdb_core::{Error, Result};

use crate::context::VaultContext;

/// Chunks shown by `VaultIndexer::stats`.
const STATS_SAMPLE: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Indexed(usize),
    Skipped(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedFile {
    pub path: String,
    pub chunks: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedFile {
    pub path: String,
    pub error: String,
}

/// What one indexing run did, file by file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexReport {
    pub files_found: usize,
    /// Rows removed by the clear pre-pass; `None` when it did not run or failed.
    pub cleared: Option<usize>,
    pub indexed: Vec<IndexedFile>,
    pub skipped: Vec<SkippedFile>,
    pub failed: Vec<FailedFile>,
    pub final_count: usize,
}

impl IndexReport {
    pub fn files_processed(&self) -> usize {
        self.files_found - self.failed.len()
    }

    pub fn chunks_indexed(&self) -> usize {
        self.indexed.iter().map(|f| f.chunks).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    pub count: usize,
    pub sample: Vec<ChunkMetadata>,
}

/// Row count plus the first few stored chunks.
pub fn collection_stats(store: &dyn VectorStore) -> Result<StoreStats> {
    let count = store.count()?;
    let sample = store.get(&Filter::new(), Some(STATS_SAMPLE))?.into_iter().map(|c| c.metadata).collect();
    Ok(StoreStats { count, sample })
}

pub struct VaultIndexer<'a> {
    ctx: &'a VaultContext,
    processor: DataProcessor,
    show_progress: bool,
}

impl<'a> VaultIndexer<'a> {
    pub fn new(ctx: &'a VaultContext, processor: DataProcessor) -> Self {
        Self { ctx, processor, show_progress: false }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Delete every chunk in the collection; returns how many were removed.
    pub fn clear(&self) -> Result<usize> {
        let ids: Vec<ChunkId> = self.ctx.store().get(&Filter::new(), None)?.into_iter().map(|c| c.id).collect();
        if ids.is_empty() {
            return Ok(0);
        }
        self.ctx.store().delete(&ids)
    }

    /// Index every markdown file under `vault`. Per-file failures end up in
    /// the report; only a bad vault path or a failing final count is an error.
    pub fn index_vault(&self, vault: &Path, clear_existing: bool) -> Result<IndexReport> {
        let root = resolve_vault(vault)?;
        let mut report = IndexReport::default();

        if clear_existing {
            match self.clear() {
                Ok(n) => {
                    tracing::info!(removed = n, "cleared collection");
                    report.cleared = Some(n);
                }
                Err(e) => tracing::error!(error = %e, "failed to clear collection"),
            }
        }

        let files = self.processor.list_markdown_files(&root);
        report.files_found = files.len();
        tracing::info!(files = files.len(), root = %root.display(), "indexing vault");

        let pb = self.progress_bar(files.len());
        for file in &files {
            let path = VaultPath::new(&root, file).relative_path;
            pb.set_message(path.clone());
            match self.index_file(&root, file) {
                Ok(FileOutcome::Indexed(chunks)) => {
                    tracing::info!(file = %path, chunks, "indexed");
                    report.indexed.push(IndexedFile { path, chunks });
                }
                Ok(FileOutcome::Skipped(reason)) => {
                    tracing::warn!(file = %path, %reason, "skipped");
                    report.skipped.push(SkippedFile { path, reason });
                }
                Err(e) => {
                    tracing::error!(file = %path, error = %e, "failed to index");
                    report.failed.push(FailedFile { path, error: e.to_string() });
                }
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        report.final_count = self.ctx.store().count()?;
        Ok(report)
    }

    /// Extract, chunk, embed and upsert a single file as one batch.
    pub fn index_file(&self, root: &Path, file: &Path) -> Result<FileOutcome> {
        let chunks = self.processor.process_file(root, file)?;
        if chunks.is_empty() {
            return Ok(FileOutcome::Skipped("no text after markdown stripping".into()));
        }
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = self.ctx.embedder().embed_batch(&texts)?;
        if vectors.len() != chunks.len() {
            return Err(Error::Embedding(format!("expected {} vectors, got {}", chunks.len(), vectors.len())));
        }
        let records: Vec<ChunkRecord> =
            chunks.into_iter().zip(vectors).map(|(chunk, vector)| ChunkRecord { chunk, vector }).collect();
        self.ctx.store().upsert(&records)?;
        Ok(FileOutcome::Indexed(records.len()))
    }

    pub fn stats(&self) -> Result<StoreStats> {
        collection_stats(self.ctx.store())
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}
