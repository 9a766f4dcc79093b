//! Layered configuration for the indexer and searcher.
//!
//! Figment merges built-in defaults, `config.toml`, `config.<env>.toml`
//! (selected by `RUST_ENV`, default `dev`) and `APP_*` environment variables,
//! in that order. Nested keys use a double underscore in the environment,
//! e.g. `APP_CHUNKING__SIZE=300`.
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::chunker::ChunkingConfig;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub db_path: String,
    pub collection: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self { db_path: "./vault_db".to_string(), collection: "vault_notes".to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultSettings {
    /// Directory name skipped at every depth of the walk.
    pub excluded_dir: String,
    /// Extension (without the dot) of files that get indexed.
    pub extension: String,
}

impl Default for VaultSettings {
    fn default() -> Self {
        Self { excluded_dir: "System".to_string(), extension: "md".to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub default_limit: usize,
    pub pattern_limit: usize,
    pub list_limit: usize,
    pub preview_length: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self { default_limit: 10, pattern_limit: 20, list_limit: 50, preview_length: 200 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub model_dir: String,
    pub max_len: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self { model_dir: "models/all-MiniLM-L6-v2".to_string(), max_len: 256 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub store: StoreSettings,
    pub chunking: ChunkingConfig,
    pub vault: VaultSettings,
    pub search: SearchSettings,
    pub embedding: EmbeddingSettings,
}

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        Ok(Self { figment })
    }

    /// Wrap an already assembled figment; tests use this to inject values.
    pub fn from_figment(figment: Figment) -> Self {
        Self { figment: Figment::from(Serialized::defaults(Settings::default())).merge(figment) }
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("Failed to get '{}': {}", key, e)))
    }

    /// Extract the typed settings and reject values the pipelines cannot run with.
    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self.figment.extract()?;
        settings.chunking.validate()?;
        if settings.vault.extension.is_empty() {
            return Err(Error::InvalidConfig("vault.extension must not be empty".into()));
        }
        if settings.store.collection.is_empty() {
            return Err(Error::InvalidConfig("store.collection must not be empty".into()));
        }
        Ok(settings)
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
