//! Domain types shared by the indexer, the searcher and the store backends.

use serde::{Deserialize, Serialize};

pub type ChunkId = String;

/// Metadata stored next to every chunk.
///
/// - `file_path`: path relative to the vault root, `/`-separated
/// - `chunk_index`/`total_chunks`: position within the parent file
/// - `directory`: parent of `file_path` (`"."` at the vault root)
/// - `file_name`: last component of `file_path`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub file_path: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
    pub directory: String,
    pub file_name: String,
}

/// A slice of one file's normalized text, the unit that gets embedded and stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: ChunkId,
    pub content: String,
    pub metadata: ChunkMetadata,
}

/// A chunk together with its embedding, as handed to `VectorStore::upsert`.
#[derive(Debug, Clone)]
pub struct ChunkRecord {
    pub chunk: DocumentChunk,
    pub vector: Vec<f32>,
}

/// One retrieved chunk. `distance` is lower-is-better; metadata-only
/// fetches report `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: ChunkId,
    pub document: String,
    pub metadata: ChunkMetadata,
    pub distance: f32,
}

impl SearchHit {
    pub fn from_chunk(chunk: DocumentChunk, distance: f32) -> Self {
        Self { id: chunk.id, document: chunk.content, metadata: chunk.metadata, distance }
    }
}

/// Stable id for chunk `chunk_index` of `relative_path`.
pub fn chunk_id(relative_path: &str, chunk_index: usize) -> ChunkId {
    let key = format!("{}_{}", relative_path, chunk_index);
    blake3::hash(key.as_bytes()).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_ids_are_stable_and_distinct() {
        assert_eq!(chunk_id("notes/a.md", 0), chunk_id("notes/a.md", 0));
        assert_ne!(chunk_id("notes/a.md", 0), chunk_id("notes/a.md", 1));
        assert_ne!(chunk_id("notes/a.md", 0), chunk_id("notes/b.md", 0));
        assert_eq!(chunk_id("notes/a.md", 0).len(), 64);
    }

    #[test]
    fn hit_serializes_with_nested_metadata() {
        let hit = SearchHit {
            id: "x".into(),
            document: "text".into(),
            metadata: ChunkMetadata {
                file_path: "a.md".into(),
                chunk_index: 0,
                total_chunks: 1,
                directory: ".".into(),
                file_name: "a.md".into(),
            },
            distance: 0.25,
        };
        let json = serde_json::to_value(&hit).unwrap();
        assert_eq!(json["metadata"]["file_path"], "a.md");
        assert_eq!(json["distance"], 0.25);
    }
}
