use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("invalid color id {0}")]
    InvalidColor(i64),

    #[error("unknown color name {0:?}")]
    UnknownColor(String),

    #[error("cell ({x}, {y}) is outside the drawable area")]
    OutOfBounds { x: i32, y: i32 },

    #[error("terminal error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read scene file: {0}")]
    Read(#[from] io::Error),

    #[error("failed to parse scene file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Validation(String),
}
