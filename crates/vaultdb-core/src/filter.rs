//! Metadata filters: conjunctions of equality and regex clauses.
use regex::Regex;
use std::borrow::Cow;

use crate::error::Result;
use crate::types::ChunkMetadata;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaField {
    FilePath,
    Directory,
    FileName,
    ChunkIndex,
    TotalChunks,
}

impl MetaField {
    /// Column name used by store backends.
    pub fn column(self) -> &'static str {
        match self {
            MetaField::FilePath => "file_path",
            MetaField::Directory => "directory",
            MetaField::FileName => "file_name",
            MetaField::ChunkIndex => "chunk_index",
            MetaField::TotalChunks => "total_chunks",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, MetaField::ChunkIndex | MetaField::TotalChunks)
    }

    pub fn read(self, meta: &ChunkMetadata) -> Cow<'_, str> {
        match self {
            MetaField::FilePath => Cow::Borrowed(meta.file_path.as_str()),
            MetaField::Directory => Cow::Borrowed(meta.directory.as_str()),
            MetaField::FileName => Cow::Borrowed(meta.file_name.as_str()),
            MetaField::ChunkIndex => Cow::Owned(meta.chunk_index.to_string()),
            MetaField::TotalChunks => Cow::Owned(meta.total_chunks.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Clause {
    Equals(MetaField, String),
    /// Unanchored: the field only has to contain a match.
    Matches(MetaField, Regex),
}

impl Clause {
    pub fn accepts(&self, meta: &ChunkMetadata) -> bool {
        match self {
            Clause::Equals(field, value) => field.read(meta) == value.as_str(),
            Clause::Matches(field, re) => re.is_match(&field.read(meta)),
        }
    }
}

/// All clauses must hold. An empty filter accepts everything.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn equals(mut self, field: MetaField, value: impl Into<String>) -> Self {
        self.clauses.push(Clause::Equals(field, value.into()));
        self
    }

    pub fn matches(mut self, field: MetaField, pattern: &str) -> Result<Self> {
        self.clauses.push(Clause::Matches(field, Regex::new(pattern)?));
        Ok(self)
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn has_regex(&self) -> bool {
        self.clauses.iter().any(|c| matches!(c, Clause::Matches(..)))
    }

    pub fn accepts(&self, meta: &ChunkMetadata) -> bool {
        self.clauses.iter().all(|c| c.accepts(meta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(path: &str, dir: &str, index: usize) -> ChunkMetadata {
        ChunkMetadata {
            file_path: path.into(),
            chunk_index: index,
            total_chunks: 3,
            directory: dir.into(),
            file_name: path.rsplit('/').next().unwrap_or(path).into(),
        }
    }

    #[test]
    fn empty_filter_accepts_all() {
        assert!(Filter::new().accepts(&meta("a.md", ".", 0)));
    }

    #[test]
    fn equality_on_text_and_numbers() {
        let f = Filter::new().equals(MetaField::FilePath, "projects/x.md").equals(MetaField::ChunkIndex, "2");
        assert!(f.accepts(&meta("projects/x.md", "projects", 2)));
        assert!(!f.accepts(&meta("projects/x.md", "projects", 1)));
        assert!(!f.accepts(&meta("projects/y.md", "projects", 2)));
    }

    #[test]
    fn regex_is_unanchored() {
        let f = Filter::new().matches(MetaField::Directory, "proj").unwrap();
        assert!(f.accepts(&meta("work/projects/x.md", "work/projects", 0)));
        assert!(!f.accepts(&meta("home/x.md", "home", 0)));
        assert!(f.has_regex());
    }

    #[test]
    fn invalid_regex_is_an_error() {
        assert!(Filter::new().matches(MetaField::FilePath, "[unclosed").is_err());
    }
}
