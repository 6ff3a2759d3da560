// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

use crate::dom::NodeId;

#[derive(Error, Debug)]
pub enum DomWatchError {
    /// A selector string could not be parsed.
    ///
    /// `offset` is the byte offset into `selector` where parsing stopped.
    #[error("invalid selector '{selector}' at offset {offset}: {reason}")]
    SelectorSyntax {
        selector: String,
        offset: usize,
        reason: String,
    },

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Node limit reached: a document holds at most {0} nodes")]
    NodeLimit(usize),

    #[error("Hierarchy request error: {0}")]
    HierarchyRequest(String),

    #[error("Invalid observe options: {0}")]
    InvalidObserveOptions(String),

    #[error("Observation lost: {0}")]
    ObservationLost(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DomWatchError>;
