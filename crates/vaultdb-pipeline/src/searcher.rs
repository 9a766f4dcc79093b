use std::collections::BTreeSet;

use vaultdb_core::config::SearchSettings;
use vaultdb_core::filter::{Filter, MetaField};
use vaultdb_core::types::SearchHit;
use vaultdb_core::Result;

use crate::context::VaultContext;

/// Query side of the vault. Every method returns an empty result instead of
/// an error; failures are logged.
pub struct VaultSearcher<'a> {
    ctx: &'a VaultContext,
    settings: SearchSettings,
}

impl<'a> VaultSearcher<'a> {
    pub fn new(ctx: &'a VaultContext, settings: SearchSettings) -> Self {
        Self { ctx, settings }
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Top `k` chunks nearest to `query`, optionally restricted by `filter`.
    pub fn search(&self, query: &str, k: usize, filter: Option<&Filter>) -> Vec<SearchHit> {
        let empty = Filter::new();
        logged("search", self.semantic(query, k, filter.unwrap_or(&empty)))
    }

    /// Chunks whose `file_path` contains a match for `pattern`. The query text
    /// is empty, so the ordering carries no meaning.
    pub fn search_by_file_pattern(&self, pattern: &str, k: usize) -> Vec<SearchHit> {
        let result = Filter::new()
            .matches(MetaField::FilePath, pattern)
            .and_then(|filter| self.semantic("", k, &filter));
        logged("pattern search", result)
    }

    /// Restrict to directories matching `directory`. A blank `query` lists
    /// stored chunks instead of ranking them, with every distance `0.0`.
    pub fn search_by_directory(&self, directory: &str, query: &str, k: usize) -> Vec<SearchHit> {
        let result = Filter::new().matches(MetaField::Directory, directory).and_then(|filter| {
            if query.trim().is_empty() {
                let chunks = self.ctx.store().get(&filter, Some(k))?;
                Ok(chunks.into_iter().map(|c| SearchHit::from_chunk(c, 0.0)).collect())
            } else {
                self.semantic(query, k, &filter)
            }
        });
        logged("directory search", result)
    }

    /// Texts of every chunk of `file_path`, in chunk order.
    pub fn file_content(&self, file_path: &str) -> Vec<String> {
        let filter = Filter::new().equals(MetaField::FilePath, file_path);
        let result = self.ctx.store().get(&filter, None).map(|mut chunks| {
            chunks.sort_by_key(|c| c.metadata.chunk_index);
            chunks.into_iter().map(|c| c.content).collect()
        });
        logged("file content", result)
    }

    /// Distinct indexed file paths, sorted.
    pub fn list_files(&self) -> Vec<String> {
        let result = self.ctx.store().get(&Filter::new(), None).map(|chunks| {
            let files: BTreeSet<String> = chunks.into_iter().map(|c| c.metadata.file_path).collect();
            files.into_iter().collect()
        });
        logged("list files", result)
    }

    fn semantic(&self, query: &str, k: usize, filter: &Filter) -> Result<Vec<SearchHit>> {
        let vector = self.ctx.embedder().embed(query)?;
        self.ctx.store().query(&vector, k, filter)
    }
}

fn logged<T: Default>(what: &str, result: Result<T>) -> T {
    result.unwrap_or_else(|e| {
        tracing::error!(error = %e, "{} failed", what);
        T::default()
    })
}
