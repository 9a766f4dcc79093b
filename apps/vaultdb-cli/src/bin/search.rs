use std::io;

use clap::{CommandFactory, Parser};

use vaultdb_cli::{exit_on_interrupt, init_logging, load_settings, SearchMode};
use vaultdb_core::traits::VectorStore;
use vaultdb_pipeline::render::{format_file_list, format_json, format_results, RenderOptions};
use vaultdb_pipeline::{repl, VaultContext, VaultSearcher};

#[derive(Parser)]
#[command(name = "vaultdb-search", version, about = "Search an indexed markdown vault")]
struct Args {
    /// Search query
    query: Option<String>,

    /// Database directory (default from config: ./vault_db)
    #[arg(long)]
    db_path: Option<String>,

    /// Number of results (default: 10, or 20 with --file-pattern)
    #[arg(short = 'n', long = "results")]
    results: Option<usize>,

    /// Do not show content previews
    #[arg(long)]
    no_content: bool,

    /// Maximum preview length in characters (default: 200)
    #[arg(long)]
    max_length: Option<usize>,

    /// Find chunks whose file path matches this regex
    #[arg(long)]
    file_pattern: Option<String>,

    /// Restrict to directories matching this regex
    #[arg(long)]
    directory: Option<String>,

    /// List all indexed files
    #[arg(long)]
    list_files: bool,

    /// Files shown by --list-files (default: 50)
    #[arg(long)]
    limit: Option<usize>,

    /// Start the interactive prompt
    #[arg(short, long)]
    interactive: bool,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let args = Args::parse();
    let mode = SearchMode::select(
        args.interactive,
        args.list_files,
        args.file_pattern.as_deref(),
        args.directory.as_deref(),
        args.query.as_deref(),
    );
    if mode == SearchMode::Help {
        Args::command().print_help()?;
        return Ok(());
    }

    let mut settings = load_settings()?;
    if let Some(db_path) = args.db_path {
        settings.store.db_path = db_path;
    }
    let ctx = match VaultContext::connect_for_search(&settings) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error connecting to database: {}", e);
            eprintln!("Run vaultdb-index first to create the database.");
            std::process::exit(1);
        }
    };
    tracing::info!(db = %settings.store.db_path, chunks = VectorStore::count(ctx.store())?, "connected");

    let search = settings.search.clone();
    let searcher = VaultSearcher::new(&ctx, settings.search);
    let opts = RenderOptions {
        show_content: !args.no_content,
        max_length: args.max_length.unwrap_or(search.preview_length),
    };
    let k = args.results.unwrap_or(search.default_limit);

    let hits = match mode {
        SearchMode::Interactive => {
            exit_on_interrupt()?;
            let stdin = io::stdin();
            return Ok(repl::run(&searcher, &opts, stdin.lock(), &mut io::stdout())?);
        }
        SearchMode::ListFiles => {
            print!("{}", format_file_list(&searcher.list_files(), args.limit.unwrap_or(search.list_limit)));
            return Ok(());
        }
        SearchMode::FilePattern(pattern) => {
            searcher.search_by_file_pattern(&pattern, args.results.unwrap_or(search.pattern_limit))
        }
        SearchMode::Directory { directory, query } => searcher.search_by_directory(&directory, &query, k),
        SearchMode::Query(query) => searcher.search(&query, k, None),
        SearchMode::Help => return Ok(()),
    };

    if args.json {
        println!("{}", format_json(&hits)?);
    } else {
        print!("{}", format_results(&hits, &opts));
    }
    Ok(())
}
