//! In-process `VectorStore` with brute-force cosine ranking.
//!
//! Holds everything in a `Vec` guarded by a mutex. Used by the pipeline tests
//! and anywhere a throwaway collection is enough.
use std::sync::{Mutex, MutexGuard};

use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::traits::VectorStore;
use crate::types::{ChunkId, ChunkRecord, DocumentChunk, SearchHit};

#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<ChunkRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<ChunkRecord>>> {
        self.records.lock().map_err(|_| Error::Store("memory store lock poisoned".into()))
    }
}

/// `1 - cos(a, b)`; zero vectors are treated as orthogonal to everything.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        return 1.0;
    }
    1.0 - dot / (na * nb)
}

impl VectorStore for MemoryStore {
    fn upsert(&self, records: &[ChunkRecord]) -> Result<()> {
        let mut stored = self.lock()?;
        for record in records {
            match stored.iter_mut().find(|r| r.chunk.id == record.chunk.id) {
                Some(existing) => *existing = record.clone(),
                None => stored.push(record.clone()),
            }
        }
        Ok(())
    }

    fn query(&self, vector: &[f32], k: usize, filter: &Filter) -> Result<Vec<SearchHit>> {
        let stored = self.lock()?;
        let mut hits: Vec<SearchHit> = stored
            .iter()
            .filter(|r| filter.accepts(&r.chunk.metadata))
            .map(|r| SearchHit::from_chunk(r.chunk.clone(), cosine_distance(vector, &r.vector)))
            .collect();
        hits.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);
        Ok(hits)
    }

    fn get(&self, filter: &Filter, limit: Option<usize>) -> Result<Vec<DocumentChunk>> {
        let stored = self.lock()?;
        let matching = stored.iter().filter(|r| filter.accepts(&r.chunk.metadata)).map(|r| r.chunk.clone());
        Ok(match limit {
            Some(n) => matching.take(n).collect(),
            None => matching.collect(),
        })
    }

    fn delete(&self, ids: &[ChunkId]) -> Result<usize> {
        let mut stored = self.lock()?;
        let before = stored.len();
        stored.retain(|r| !ids.contains(&r.chunk.id));
        Ok(before - stored.len())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }
}
