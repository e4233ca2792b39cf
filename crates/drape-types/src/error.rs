//! Error types for drape.

use std::io;

/// Errors produced by the drape crates.
#[derive(Debug, thiserror::Error)]
pub enum DrapeError {
    #[error("config error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("graph error: {0}")]
    Graph(String),

    #[error("codec error: {0}")]
    Codec(String),

    #[error("cache error: {0}")]
    Cache(String),

    #[error("import error: {0}")]
    Import(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, DrapeError>;
