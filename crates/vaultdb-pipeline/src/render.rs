//! Console and JSON presentation of search results and indexing reports.
use vaultdb_core::types::SearchHit;
use vaultdb_core::{Error, Result};

use crate::indexer::{IndexReport, StoreStats};

/// Lines of a chunk shown under a result.
const PREVIEW_LINES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub show_content: bool,
    pub max_length: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { show_content: true, max_length: 200 }
    }
}

/// Hits of one file, each with its 1-based rank in the full result list.
#[derive(Debug)]
pub struct FileGroup<'a> {
    pub file_path: &'a str,
    pub hits: Vec<(usize, &'a SearchHit)>,
}

impl<'a> FileGroup<'a> {
    pub fn directory(&self) -> &'a str {
        self.hits.first().map(|(_, h)| h.metadata.directory.as_str()).unwrap_or_default()
    }

    /// Lowest distance wins; the earlier hit wins a tie.
    pub fn best(&self) -> Option<(usize, &'a SearchHit)> {
        self.hits.iter().copied().fold(None, |best, (rank, hit)| match best {
            Some((_, b)) if b.distance <= hit.distance => best,
            _ => Some((rank, hit)),
        })
    }
}

/// Group by `file_path`, keeping the order in which files first appear.
pub fn group_by_file(hits: &[SearchHit]) -> Vec<FileGroup<'_>> {
    let mut groups: Vec<FileGroup<'_>> = Vec::new();
    for (i, hit) in hits.iter().enumerate() {
        let path = hit.metadata.file_path.as_str();
        match groups.iter_mut().find(|g| g.file_path == path) {
            Some(group) => group.hits.push((i + 1, hit)),
            None => groups.push(FileGroup { file_path: path, hits: vec![(i + 1, hit)] }),
        }
    }
    groups
}

/// Cut to `max_length` characters (adding `...` when cut), then keep the
/// non-blank lines among the first few, trimmed.
pub fn preview_lines(content: &str, max_length: usize) -> Vec<String> {
    let text = if content.chars().count() > max_length {
        let mut cut: String = content.chars().take(max_length).collect();
        cut.push_str("...");
        cut
    } else {
        content.to_string()
    };
    text.split('\n')
        .take(PREVIEW_LINES)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

pub fn format_results(hits: &[SearchHit], opts: &RenderOptions) -> String {
    if hits.is_empty() {
        return "No results found.\n".to_string();
    }
    let mut out = format!("\nFound {} results:\n{}\n", hits.len(), "=".repeat(80));
    for group in group_by_file(hits) {
        out.push_str(&format!("\n📄 {}\n", group.file_path));
        out.push_str(&format!("   Directory: {}\n", group.directory()));
        out.push_str(&format!("   Chunks found: {}\n", group.hits.len()));
        if let Some((rank, best)) = group.best() {
            out.push_str(&format!("   Best match (rank #{}):\n", rank));
            out.push_str(&format!("   Similarity: {:.3}\n", 1.0 - best.distance));
            if opts.show_content {
                for line in preview_lines(&best.document, opts.max_length) {
                    out.push_str(&format!("   > {}\n", line));
                }
            }
        }
        out.push_str(&format!("{}\n", "-".repeat(40)));
    }
    out
}

pub fn format_json(hits: &[SearchHit]) -> Result<String> {
    serde_json::to_string_pretty(hits).map_err(|e| Error::Operation(format!("serializing results: {e}")))
}

pub fn format_file_list(files: &[String], limit: usize) -> String {
    let mut out = format!("\nIndexed files ({} total):\n{}\n", files.len(), "=".repeat(60));
    for (i, file) in files.iter().take(limit).enumerate() {
        out.push_str(&format!("{:3}. {}\n", i + 1, file));
    }
    if files.len() > limit {
        out.push_str(&format!("\n... and {} more files\n", files.len() - limit));
        out.push_str("Use --limit to see more files\n");
    }
    out
}

pub fn format_file_content(file_path: &str, chunks: &[String]) -> String {
    if chunks.is_empty() {
        return format!("No content found for: {}\n", file_path);
    }
    let mut out = format!("\n📄 Content of {}:\n{}\n", file_path, "=".repeat(60));
    for (i, chunk) in chunks.iter().enumerate() {
        out.push_str(&format!("\n--- Chunk {} ---\n{}\n", i + 1, chunk));
    }
    out
}

pub fn format_report(report: &IndexReport) -> String {
    let mut out = String::new();
    if let Some(n) = report.cleared {
        out.push_str(&format!("Cleared {} existing chunks\n", n));
    }
    out.push_str(&format!("Found {} markdown files\n", report.files_found));
    out.push_str("\nIndexing complete!\n");
    out.push_str(&format!("Total files processed: {}\n", report.files_processed()));
    out.push_str(&format!("Total chunks indexed: {}\n", report.chunks_indexed()));
    if !report.skipped.is_empty() {
        out.push_str(&format!("Skipped files ({}):\n", report.skipped.len()));
        for s in &report.skipped {
            out.push_str(&format!("  {} ({})\n", s.path, s.reason));
        }
    }
    if !report.failed.is_empty() {
        out.push_str(&format!("Failed files ({}):\n", report.failed.len()));
        for f in &report.failed {
            out.push_str(&format!("  {}: {}\n", f.path, f.error));
        }
    }
    out.push_str(&format!("Collection now contains: {} chunks\n", report.final_count));
    out
}

pub fn format_stats(stats: &StoreStats) -> String {
    let mut out = format!("Total chunks in collection: {}\n", stats.count);
    if !stats.sample.is_empty() {
        out.push_str("\nSample chunks:\n");
        for (i, meta) in stats.sample.iter().enumerate() {
            out.push_str(&format!("  {}. {} (chunk {})\n", i + 1, meta.file_path, meta.chunk_index));
        }
    }
    out
}
