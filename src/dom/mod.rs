// src/dom/mod.rs

//! In-memory document host.
//!
//! This module provides the two host facilities the element watcher relies
//! on:
//! - a structural query over the node tree ([`Document::query_selector`],
//!   backed by the [`selector`] engine), and
//! - subtree-mutation notifications ([`Document::observe`] returning a
//!   [`MutationObserver`]).
//!
//! Nodes live in an arena owned by the document and are addressed by
//! [`NodeId`]. The [`Document`] itself is a cheap, clonable handle.

use std::fmt;

pub mod document;
pub mod observer;
pub mod selector;

pub use document::{Document, ElementData, NodeData};
pub use observer::{MutationKind, MutationObserver, MutationRecord, ObserveOptions, ObserverId};
pub use selector::Selector;

/// Index of a node in its document's arena.
///
/// Removed nodes keep their slot, so ids are never reused and a document can
/// create at most [`NodeId::MAX_NODES`] nodes over its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// The document node itself.
    pub const ROOT: NodeId = NodeId(0);

    /// Capacity of a document's arena.
    pub const MAX_NODES: usize = u32::MAX as usize;

    pub(crate) fn from_index(index: usize) -> crate::errors::Result<Self> {
        match u32::try_from(index) {
            Ok(raw) if raw < u32::MAX => Ok(NodeId(raw)),
            _ => Err(crate::errors::DomWatchError::NodeLimit(Self::MAX_NODES)),
        }
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}
