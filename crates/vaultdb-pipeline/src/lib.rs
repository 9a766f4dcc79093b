//! vaultdb-pipeline
//!
//! The two pipelines over a vault: `VaultIndexer` walks, chunks, embeds and
//! upserts; `VaultSearcher` answers semantic and metadata queries. Both share
//! one `VaultContext` holding the store and the embedder.
pub mod context;
pub mod indexer;
pub mod render;
pub mod repl;
pub mod searcher;

pub use context::VaultContext;
pub use indexer::{collection_stats, FileOutcome, IndexReport, StoreStats, VaultIndexer};
pub use searcher::VaultSearcher;
