use std::path::PathBuf;

use vaultdb_core::config::{expand_path, Config};
use vaultdb_core::filter::Filter;
use vaultdb_core::traits::VectorStore;
use vaultdb_vector::LanceStore;

fn main() -> anyhow::Result<()> {
    let settings = Config::load()?.settings()?;
    let db_path: PathBuf = std::env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| expand_path(&settings.store.db_path));
    let store = LanceStore::connect_existing(&db_path, &settings.store.collection)?;
    println!("{}: {} chunks, dim={}", store.collection(), store.count()?, store.dim());
    for chunk in store.get(&Filter::new(), Some(5))? {
        println!("  {} [{}/{}]", chunk.metadata.file_path, chunk.metadata.chunk_index + 1, chunk.metadata.total_chunks);
    }
    Ok(())
}
