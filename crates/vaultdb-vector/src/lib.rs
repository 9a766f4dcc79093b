//! vaultdb-vector
//!
//! LanceDB implementation of `vaultdb_core::traits::VectorStore`. The async
//! client runs on a runtime owned by each `LanceStore`, so callers stay
//! synchronous.
pub mod schema;
pub mod store;
pub mod table;

pub use store::LanceStore;
