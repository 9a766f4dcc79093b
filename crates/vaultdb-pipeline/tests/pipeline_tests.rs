use std::collections::BTreeSet;
use std::fs;
use std::io::Cursor;
use std::path::Path;

use tempfile::TempDir;

use vaultdb_core::chunker::ChunkingConfig;
use vaultdb_core::config::{SearchSettings, VaultSettings};
use vaultdb_core::data_processor::DataProcessor;
use vaultdb_core::filter::Filter;
use vaultdb_core::memory::MemoryStore;
use vaultdb_core::traits::Embedder;
use vaultdb_core::{Error, Result};
use vaultdb_embed::{FakeEmbedder, FAKE_DIM};
use vaultdb_pipeline::render::{format_report, format_stats, RenderOptions};
use vaultdb_pipeline::repl::{self, PROMPT, UNKNOWN_COMMAND};
use vaultdb_pipeline::{VaultContext, VaultIndexer, VaultSearcher};

/// Fake embeddings, except that any batch mentioning BOOM fails.
struct FlakyEmbedder(FakeEmbedder);

impl Embedder for FlakyEmbedder {
    fn dim(&self) -> usize {
        self.0.dim()
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.iter().any(|t| t.contains("BOOM")) {
            return Err(Error::Embedding("refused".into()));
        }
        self.0.embed_batch(texts)
    }
}

fn context() -> VaultContext {
    VaultContext::new(Box::new(MemoryStore::new()), Box::new(FlakyEmbedder(FakeEmbedder::new(FAKE_DIM))))
}

fn write(root: &Path, rel: &str, body: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

fn small_chunks() -> DataProcessor {
    DataProcessor::new(ChunkingConfig::new(20, 5).unwrap(), VaultSettings::default())
}

fn words(prefix: &str, n: usize) -> String {
    (0..n).map(|i| format!("{prefix}{i}")).collect::<Vec<_>>().join(" ")
}

fn stored_ids(ctx: &VaultContext) -> BTreeSet<String> {
    ctx.store().get(&Filter::new(), None).unwrap().into_iter().map(|c| c.id).collect()
}

#[test]
fn report_separates_indexed_skipped_and_failed() {
    let vault = TempDir::new().unwrap();
    let root = vault.path();
    write(root, "a.md", "# Garden\n\ncompost notes");
    write(root, "projects/b.md", "plan for the shed");
    write(root, "empty.md", "   \n");
    write(root, "bad.md", "this one says BOOM");
    write(root, "System/template.md", "never indexed");

    let ctx = context();
    let report = VaultIndexer::new(&ctx, DataProcessor::default()).index_vault(root, true).unwrap();

    assert_eq!(report.files_found, 4);
    let indexed: Vec<&str> = report.indexed.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(indexed, vec!["a.md", "projects/b.md"]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].path, "empty.md");
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].path, "bad.md");
    assert_eq!(report.files_processed(), 3);
    assert_eq!(report.chunks_indexed(), 2);
    assert_eq!(report.final_count, 2);
    assert_eq!(report.cleared, Some(0));
}

#[test]
fn missing_vault_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let ctx = context();
    let result = VaultIndexer::new(&ctx, DataProcessor::default()).index_vault(&tmp.path().join("nope"), true);
    assert!(matches!(result, Err(Error::VaultNotFound(_))));
}

#[test]
fn reindexing_without_clear_overwrites_in_place() {
    let vault = TempDir::new().unwrap();
    write(vault.path(), "long.md", &words("w", 50));
    write(vault.path(), "notes/short.md", "one short note");

    let ctx = context();
    let indexer = VaultIndexer::new(&ctx, small_chunks());
    let first = indexer.index_vault(vault.path(), true).unwrap();
    let ids = stored_ids(&ctx);
    let contents: Vec<String> = ctx.store().get(&Filter::new(), None).unwrap().into_iter().map(|c| c.content).collect();

    let second = indexer.index_vault(vault.path(), false).unwrap();
    assert_eq!(second.cleared, None);
    assert_eq!(first.final_count, second.final_count);
    assert_eq!(ids, stored_ids(&ctx));
    let again: Vec<String> = ctx.store().get(&Filter::new(), None).unwrap().into_iter().map(|c| c.content).collect();
    assert_eq!(contents, again);
}

#[test]
fn clear_and_reindex_count_matches_independent_chunking() {
    let vault = TempDir::new().unwrap();
    let root = vault.path();
    write(root, "a.md", &words("a", 47));
    write(root, "b/c.md", &words("c", 12));
    write(root, "b/d/e.md", &words("e", 90));

    let processor = small_chunks();
    let expected: usize = processor
        .list_markdown_files(root)
        .iter()
        .map(|f| processor.process_file(root, f).unwrap().len())
        .sum();

    let ctx = context();
    let indexer = VaultIndexer::new(&ctx, small_chunks());
    indexer.index_vault(root, true).unwrap();
    let report = indexer.index_vault(root, true).unwrap();
    assert_eq!(report.cleared, Some(expected));
    assert_eq!(report.final_count, expected);
    assert_eq!(report.chunks_indexed(), expected);
}

#[test]
fn stats_samples_at_most_five_chunks() {
    let vault = TempDir::new().unwrap();
    for i in 0..7 {
        write(vault.path(), &format!("n{i}.md"), &format!("note number {i}"));
    }
    let ctx = context();
    let indexer = VaultIndexer::new(&ctx, DataProcessor::default());
    indexer.index_vault(vault.path(), true).unwrap();

    let stats = indexer.stats().unwrap();
    assert_eq!(stats.count, 7);
    assert_eq!(stats.sample.len(), 5);
    assert!(stats.sample.iter().all(|m| m.chunk_index == 0));
}

#[test]
fn run_summary_ends_with_collection_sample() {
    let vault = TempDir::new().unwrap();
    write(vault.path(), "a.md", "alpha note");
    write(vault.path(), "b.md", "bravo note");
    let ctx = context();
    let indexer = VaultIndexer::new(&ctx, DataProcessor::default());
    let report = indexer.index_vault(vault.path(), true).unwrap();

    let summary = format_report(&report) + &format_stats(&indexer.stats().unwrap());
    assert!(summary.contains("Collection now contains: 2 chunks"));
    assert!(summary.contains("Total chunks in collection: 2"));
    assert!(summary.contains("1. a.md (chunk 0)") || summary.contains("1. b.md (chunk 0)"));
}

fn searchable_vault() -> (TempDir, VaultContext) {
    let vault = TempDir::new().unwrap();
    let root = vault.path();
    write(root, "garden/compost.md", "compost pile turning and watering the compost pile");
    write(root, "finance/taxes.md", "quarterly taxes receipts deductions");
    write(root, "projects/shed.md", "build a shed");
    write(root, "projects/fence.md", "repair the fence");
    write(root, "projects/roof.md", "inspect the roof");
    write(root, "journal/daily-01.md", "daily entry one");
    write(root, "journal/daily-02.md", "daily entry two");
    write(root, "long.md", &words("word", 50));

    let ctx = context();
    VaultIndexer::new(&ctx, small_chunks()).index_vault(root, true).unwrap();
    (vault, ctx)
}

#[test]
fn semantic_search_ranks_shared_words_first() {
    let (_vault, ctx) = searchable_vault();
    let searcher = VaultSearcher::new(&ctx, SearchSettings::default());
    let hits = searcher.search("compost pile turning", 3, None);
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].metadata.file_path, "garden/compost.md");
    assert!(hits[0].distance < hits[1].distance);
}

#[test]
fn directory_listing_with_empty_query_has_zero_distances() {
    let (_vault, ctx) = searchable_vault();
    let searcher = VaultSearcher::new(&ctx, SearchSettings::default());
    let hits = searcher.search_by_directory("projects", "", 10);
    assert_eq!(hits.len(), 3);
    assert!(hits.iter().all(|h| h.distance == 0.0));
    assert!(hits.iter().all(|h| h.metadata.directory == "projects"));

    let ranked = searcher.search_by_directory("projects", "shed", 10);
    assert_eq!(ranked.len(), 3);
    assert_eq!(ranked[0].metadata.file_path, "projects/shed.md");
}

#[test]
fn file_pattern_matches_paths() {
    let (_vault, ctx) = searchable_vault();
    let searcher = VaultSearcher::new(&ctx, SearchSettings::default());
    let hits = searcher.search_by_file_pattern("daily", 20);
    let paths: BTreeSet<&str> = hits.iter().map(|h| h.metadata.file_path.as_str()).collect();
    assert_eq!(paths, BTreeSet::from(["journal/daily-01.md", "journal/daily-02.md"]));
}

#[test]
fn bad_pattern_yields_no_results() {
    let (_vault, ctx) = searchable_vault();
    let searcher = VaultSearcher::new(&ctx, SearchSettings::default());
    assert!(searcher.search_by_file_pattern("[unclosed", 20).is_empty());
    assert!(searcher.search_by_directory("(", "", 10).is_empty());
}

#[test]
fn file_content_is_in_chunk_order() {
    let (_vault, ctx) = searchable_vault();
    let searcher = VaultSearcher::new(&ctx, SearchSettings::default());
    let chunks = searcher.file_content("long.md");
    // 50 words, size 20, overlap 5: windows at 0, 15, 30, 45
    assert_eq!(chunks.len(), 4);
    assert!(chunks[0].starts_with("word0 "));
    assert!(chunks[1].starts_with("word15 "));
    assert!(chunks[3].ends_with("word49"));
    assert!(searcher.file_content("missing.md").is_empty());
}

#[test]
fn list_files_is_sorted_and_distinct() {
    let (_vault, ctx) = searchable_vault();
    let searcher = VaultSearcher::new(&ctx, SearchSettings::default());
    let files = searcher.list_files();
    assert_eq!(files.len(), 8);
    assert_eq!(files.first().map(String::as_str), Some("finance/taxes.md"));
    let mut sorted = files.clone();
    sorted.sort();
    assert_eq!(files, sorted);
}

#[test]
fn interactive_loop_stops_at_quit() {
    let (_vault, ctx) = searchable_vault();
    let searcher = VaultSearcher::new(&ctx, SearchSettings::default());
    let input = Cursor::new("list\n\nsearch compost\nbogus\nquit\nlist\n");
    let mut out = Vec::new();
    repl::run(&searcher, &RenderOptions::default(), input, &mut out).unwrap();

    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.matches(PROMPT).count(), 5);
    assert_eq!(text.matches("Indexed files (8 total):").count(), 1);
    assert!(text.contains("📄 garden/compost.md"));
    assert!(text.contains(UNKNOWN_COMMAND));
}

#[test]
fn interactive_loop_ends_at_eof() {
    let (_vault, ctx) = searchable_vault();
    let searcher = VaultSearcher::new(&ctx, SearchSettings::default());
    let mut out = Vec::new();
    repl::run(&searcher, &RenderOptions::default(), Cursor::new("content long.md\n"), &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("📄 Content of long.md:"));
    assert!(text.contains("--- Chunk 4 ---"));
}

#[test]
fn interactive_loop_survives_undecodable_line() {
    let (_vault, ctx) = searchable_vault();
    let searcher = VaultSearcher::new(&ctx, SearchSettings::default());
    let input = Cursor::new(b"\xff\xfe\nlist\nquit\n".to_vec());
    let mut out = Vec::new();
    repl::run(&searcher, &RenderOptions::default(), input, &mut out).unwrap();

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains(UNKNOWN_COMMAND));
    assert!(text.contains("Indexed files (8 total):"));
    assert_eq!(text.matches(PROMPT).count(), 3);
}
