//! vaultdb-core
//!
//! Shared model for the vault indexer and searcher: configuration, errors,
//! markdown extraction, word-window chunking, vault traversal, metadata
//! filters and the collaborator traits (`Embedder`, `VectorStore`).
#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod chunker;
pub mod config;
pub mod data_processor;
pub mod error;
pub mod extract;
pub mod filter;
pub mod memory;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
