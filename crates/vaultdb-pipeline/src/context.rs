use vaultdb_core::config::{expand_path, Settings};
use vaultdb_core::traits::{Embedder, VectorStore};
use vaultdb_core::{Error, Result};
use vaultdb_embed::get_default_embedder;
use vaultdb_vector::LanceStore;

/// The store and embedder one process works against.
pub struct VaultContext {
    store: Box<dyn VectorStore>,
    embedder: Box<dyn Embedder>,
}

impl VaultContext {
    pub fn new(store: Box<dyn VectorStore>, embedder: Box<dyn Embedder>) -> Self {
        Self { store, embedder }
    }

    /// Load the embedder, then create or open the configured collection.
    pub fn open_for_indexing(settings: &Settings) -> Result<Self> {
        let embedder = load_embedder(settings)?;
        let db_path = expand_path(&settings.store.db_path);
        let store = LanceStore::open(&db_path, &settings.store.collection, embedder.dim())?;
        tracing::info!(db = %db_path.display(), collection = %settings.store.collection, "store ready");
        Ok(Self::new(Box::new(store), embedder))
    }

    /// Connect to an existing collection first so a missing database is
    /// reported before the model is loaded.
    pub fn connect_for_search(settings: &Settings) -> Result<Self> {
        let db_path = expand_path(&settings.store.db_path);
        let store = LanceStore::connect_existing(&db_path, &settings.store.collection)?;
        let embedder = load_embedder(settings)?;
        if embedder.dim() != store.dim() {
            return Err(Error::InvalidConfig(format!(
                "collection '{}' was built with {}-dimensional vectors, the embedder produces {}",
                store.collection(),
                store.dim(),
                embedder.dim()
            )));
        }
        Ok(Self::new(Box::new(store), embedder))
    }

    pub fn store(&self) -> &dyn VectorStore {
        self.store.as_ref()
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }
}

fn load_embedder(settings: &Settings) -> Result<Box<dyn Embedder>> {
    get_default_embedder(&settings.embedding).map_err(|e| Error::Embedding(format!("{e:#}")))
}
