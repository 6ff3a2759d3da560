// src/dom/observer.rs

//! Mutation observers: subscriptions to child-list / attribute changes under
//! a node.

use std::fmt;

use tokio::sync::mpsc;
use tracing::debug;

use crate::dom::{Document, NodeId};
use crate::errors::{DomWatchError, Result};

/// Identifier of a registered observer within one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub(crate) u64);

/// Which mutations an observer is interested in.
///
/// At least one of `child_list` / `attributes` must be set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObserveOptions {
    /// Report insertions and removals of children.
    pub child_list: bool,
    /// Report attribute changes.
    pub attributes: bool,
    /// Also report mutations on any descendant of the observed node.
    pub subtree: bool,
}

impl ObserveOptions {
    /// Insertions/removals anywhere under the observed node.
    pub fn child_list_subtree() -> Self {
        Self {
            child_list: true,
            attributes: false,
            subtree: true,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !self.child_list && !self.attributes {
            return Err(DomWatchError::InvalidObserveOptions(
                "at least one of child_list or attributes must be set".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationKind {
    ChildList,
    Attributes { name: String },
}

/// A single change to the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub kind: MutationKind,
    /// For child-list records, the parent whose children changed; for
    /// attribute records, the element whose attribute changed.
    pub target: NodeId,
    pub added: Vec<NodeId>,
    pub removed: Vec<NodeId>,
}

impl MutationRecord {
    pub(crate) fn child_list(target: NodeId, added: Vec<NodeId>, removed: Vec<NodeId>) -> Self {
        Self {
            kind: MutationKind::ChildList,
            target,
            added,
            removed,
        }
    }

    pub(crate) fn attribute(target: NodeId, name: &str) -> Self {
        Self {
            kind: MutationKind::Attributes {
                name: name.to_string(),
            },
            target,
            added: Vec::new(),
            removed: Vec::new(),
        }
    }
}

/// An active subscription created by [`Document::observe`].
///
/// Records are queued as mutations happen and handed out in batches by
/// [`next_batch`](Self::next_batch). Dropping the observer disconnects it.
pub struct MutationObserver {
    id: ObserverId,
    target: NodeId,
    document: Document,
    rx: mpsc::UnboundedReceiver<MutationRecord>,
    connected: bool,
}

impl fmt::Debug for MutationObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationObserver")
            .field("id", &self.id)
            .field("target", &self.target)
            .field("connected", &self.connected)
            .finish_non_exhaustive()
    }
}

impl MutationObserver {
    pub(crate) fn new(
        id: ObserverId,
        target: NodeId,
        document: Document,
        rx: mpsc::UnboundedReceiver<MutationRecord>,
    ) -> Self {
        Self {
            id,
            target,
            document,
            rx,
            connected: true,
        }
    }

    pub fn id(&self) -> ObserverId {
        self.id
    }

    /// The node this observer was registered on.
    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Wait for at least one record, then return it together with every
    /// record already queued behind it.
    ///
    /// Returns `None` once the observer is disconnected.
    pub async fn next_batch(&mut self) -> Option<Vec<MutationRecord>> {
        if !self.connected {
            return None;
        }

        let first = self.rx.recv().await?;
        let mut batch = vec![first];
        while let Ok(record) = self.rx.try_recv() {
            batch.push(record);
        }
        Some(batch)
    }

    /// Drain queued records without waiting.
    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        let mut records = Vec::new();
        while let Ok(record) = self.rx.try_recv() {
            records.push(record);
        }
        records
    }

    /// Stop receiving records and discard any that are still queued.
    ///
    /// Idempotent.
    pub fn disconnect(&mut self) {
        if !self.connected {
            return;
        }
        self.connected = false;
        self.document.unregister_observer(self.id);
        self.rx.close();
        while self.rx.try_recv().is_ok() {}
        debug!(observer = ?self.id, target = %self.target, "mutation observer disconnected");
    }
}

impl Drop for MutationObserver {
    fn drop(&mut self) {
        self.disconnect();
    }
}
