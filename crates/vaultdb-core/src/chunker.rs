//! Fixed-size sliding-window chunking over whitespace-separated words.
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Window length in words.
    pub size: usize,
    /// Words shared by consecutive windows.
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { size: 500, overlap: 50 }
    }
}

impl ChunkingConfig {
    pub fn new(size: usize, overlap: usize) -> Result<Self> {
        let config = Self { size, overlap };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(Error::InvalidConfig("chunk size must be at least one word".into()));
        }
        if self.overlap >= self.size {
            return Err(Error::InvalidConfig(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                self.overlap, self.size
            )));
        }
        Ok(())
    }

    fn step(&self) -> usize {
        self.size - self.overlap
    }
}

/// Split normalized text into overlapping word windows.
///
/// Text that fits in one window is returned verbatim, keeping its line breaks.
/// Longer text is re-joined with single spaces. Windows start every
/// `size - overlap` words until the start passes the last word, so a short
/// tail may produce a final window that lies inside its predecessor.
pub fn chunk_text(content: &str, config: &ChunkingConfig) -> Vec<String> {
    if content.trim().is_empty() {
        return Vec::new();
    }
    let words: Vec<&str> = content.split_whitespace().collect();
    if words.len() <= config.size {
        return vec![content.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < words.len() {
        let end = (start + config.size).min(words.len());
        let chunk = words[start..end].join(" ");
        if !chunk.trim().is_empty() {
            chunks.push(chunk);
        }
        start += config.step();
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_words(n: usize) -> String {
        (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn blank_text_has_no_chunks() {
        assert!(chunk_text("  \n\t ", &ChunkingConfig::default()).is_empty());
    }

    #[test]
    fn short_text_is_kept_verbatim() {
        let text = "Title\n\nSome bold text.";
        let chunks = chunk_text(text, &ChunkingConfig::default());
        assert_eq!(chunks, vec![text.to_string()]);
    }

    #[test]
    fn exactly_one_window_is_one_chunk() {
        let config = ChunkingConfig::new(10, 2).unwrap();
        let chunks = chunk_text(&numbered_words(10), &config);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn consecutive_windows_share_overlap_words() {
        let config = ChunkingConfig::new(10, 3).unwrap();
        let text = numbered_words(25);
        let chunks = chunk_text(&text, &config);
        // starts at 0, 7, 14, 21
        assert_eq!(chunks.len(), 4);
        for pair in chunks.windows(2) {
            let prev: Vec<&str> = pair[0].split(' ').collect();
            let next: Vec<&str> = pair[1].split(' ').collect();
            assert_eq!(&prev[prev.len() - 3..], &next[..3]);
        }
        let last = chunks.last().unwrap();
        assert!(last.ends_with("w24"));
    }

    #[test]
    fn long_text_is_rejoined_with_single_spaces() {
        let config = ChunkingConfig::new(3, 1).unwrap();
        let chunks = chunk_text("a  b\n\nc d\te", &config);
        assert_eq!(chunks, vec!["a b c", "c d e", "e"]);
    }

    #[test]
    fn short_tail_yields_contained_window() {
        let config = ChunkingConfig::new(10, 4).unwrap();
        // starts at 0, 6, 12; the last window only holds w12..w13
        let chunks = chunk_text(&numbered_words(14), &config);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2], "w12 w13");
        assert!(chunks[1].ends_with("w13"));
    }

    #[test]
    fn invalid_configs_are_rejected() {
        assert!(ChunkingConfig::new(0, 0).is_err());
        assert!(ChunkingConfig::new(5, 5).is_err());
        assert!(ChunkingConfig::new(5, 9).is_err());
    }
}
