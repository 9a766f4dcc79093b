use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::types::{ChunkId, ChunkRecord, DocumentChunk, SearchHit};

/// Maps text to fixed-dimension, L2-normalized vectors.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| Error::Embedding("embedder returned no vector".into()))
    }
}

/// A persistent collection of embedded chunks.
pub trait VectorStore: Send + Sync {
    /// Insert or overwrite by id.
    fn upsert(&self, records: &[ChunkRecord]) -> Result<()>;
    /// Nearest `k` chunks to `vector` that pass `filter`, best first.
    fn query(&self, vector: &[f32], k: usize, filter: &Filter) -> Result<Vec<SearchHit>>;
    /// Chunks that pass `filter`, in storage order, without ranking.
    fn get(&self, filter: &Filter, limit: Option<usize>) -> Result<Vec<DocumentChunk>>;
    /// Returns how many of `ids` were present.
    fn delete(&self, ids: &[ChunkId]) -> Result<usize>;
    fn count(&self) -> Result<usize>;
}
