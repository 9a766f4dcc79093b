use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::bail;
use clap::Parser;

use vaultdb_cli::{init_logging, load_settings};
use vaultdb_core::config::expand_path;
use vaultdb_core::data_processor::{resolve_vault, DataProcessor};
use vaultdb_pipeline::render::{format_report, format_stats};
use vaultdb_pipeline::{collection_stats, VaultContext, VaultIndexer};
use vaultdb_vector::LanceStore;

#[derive(Parser)]
#[command(name = "vaultdb-index", version, about = "Index a markdown vault into a LanceDB collection")]
struct Args {
    /// Vault directory (asked for on stdin when omitted)
    vault: Option<PathBuf>,

    /// Database directory (default from config: ./vault_db)
    #[arg(long)]
    db_path: Option<String>,

    /// Keep existing chunks instead of clearing the collection first
    #[arg(long)]
    no_clear: bool,

    /// Print collection statistics and exit
    #[arg(long)]
    stats_only: bool,

    /// Words per chunk (default from config: 500)
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Words shared by consecutive chunks (default from config: 50)
    #[arg(long)]
    overlap: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let args = Args::parse();
    let mut settings = load_settings()?;
    if let Some(db_path) = args.db_path {
        settings.store.db_path = db_path;
    }
    if let Some(size) = args.chunk_size {
        settings.chunking.size = size;
    }
    if let Some(overlap) = args.overlap {
        settings.chunking.overlap = overlap;
    }
    settings.chunking.validate()?;

    if args.stats_only {
        let store = LanceStore::connect_existing(&expand_path(&settings.store.db_path), &settings.store.collection)?;
        print!("{}", format_stats(&collection_stats(&store)?));
        return Ok(());
    }

    let vault = match args.vault {
        Some(path) => path,
        None => prompt_for_vault()?,
    };
    let root = resolve_vault(&expand_path(vault.to_string_lossy()))?;
    println!("Vault path: {}", root.display());
    println!("Database path: {}", settings.store.db_path);

    println!("Loading embedding model...");
    let ctx = VaultContext::open_for_indexing(&settings)?;
    let processor = DataProcessor::new(settings.chunking, settings.vault.clone());
    let report = VaultIndexer::new(&ctx, processor).with_progress(true).index_vault(&root, !args.no_clear)?;
    print!("{}", format_report(&report));
    print!("\n{}", format_stats(&collection_stats(ctx.store())?));
    Ok(())
}

fn prompt_for_vault() -> anyhow::Result<PathBuf> {
    print!("Enter path to your vault: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    let line = line.trim();
    if line.is_empty() {
        bail!("Vault path is required");
    }
    Ok(PathBuf::from(line))
}
