use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Vault path does not exist: {}", .0.display())]
    VaultNotFound(PathBuf),

    #[error("Vault path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid filter: {0}")]
    Filter(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Operation failed: {0}")]
    Operation(String),
}

impl From<figment::Error> for Error {
    fn from(e: figment::Error) -> Self {
        Error::InvalidConfig(e.to_string())
    }
}

impl From<regex::Error> for Error {
    fn from(e: regex::Error) -> Self {
        Error::Filter(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vault_errors_name_the_path() {
        let err = Error::NotADirectory(PathBuf::from("/tmp/notes.md"));
        assert_eq!(err.to_string(), "Vault path is not a directory: /tmp/notes.md");
    }

    #[test]
    fn bad_regex_becomes_filter_error() {
        let err: Error = regex::Regex::new("(unclosed").unwrap_err().into();
        assert!(matches!(err, Error::Filter(_)));
    }
}
