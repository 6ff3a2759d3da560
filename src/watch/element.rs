// src/watch/element.rs

use std::fmt;
use std::future::Future;

use tracing::{debug, trace};

use crate::dom::{Document, MutationObserver, NodeId, ObserveOptions, Selector};
use crate::errors::{DomWatchError, Result};

/// What to wait for: a selector, optionally scoped to a container node.
///
/// Without a container the whole document is queried and `<body>` is
/// observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchRequest {
    selector: String,
    container: Option<NodeId>,
}

impl WatchRequest {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            container: None,
        }
    }

    /// Scope the query (and the observation) to `container`.
    pub fn within(self, container: NodeId) -> Self {
        Self {
            container: Some(container),
            ..self
        }
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn container(&self) -> Option<NodeId> {
        self.container
    }
}

/// Observable state of a started watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// Holding a subscription; the element has not appeared yet.
    Observing,
    /// Terminal. No subscription is held.
    Resolved(NodeId),
}

/// One-shot wait for an element to appear.
///
/// [`start`](Self::start) performs the immediate lookup and, only if that
/// misses, subscribes to subtree mutations. [`wait`](Self::wait) consumes the
/// watcher and completes once with the first matching element.
pub struct ElementWatcher {
    document: Document,
    selector: Selector,
    scope: NodeId,
    state: WatchState,
    observer: Option<MutationObserver>,
}

impl fmt::Debug for ElementWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementWatcher")
            .field("selector", &self.selector.as_str())
            .field("scope", &self.scope)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl ElementWatcher {
    /// Look the element up now, subscribing to mutations if it isn't there.
    ///
    /// Fails with [`DomWatchError::SelectorSyntax`] for a malformed selector
    /// and [`DomWatchError::NodeNotFound`] for an unknown container.
    pub fn start(document: &Document, request: WatchRequest) -> Result<Self> {
        let selector = Selector::parse(request.selector())?;
        let (scope, observe_root) = match request.container() {
            Some(container) => (container, container),
            None => (NodeId::ROOT, document.body().unwrap_or(NodeId::ROOT)),
        };

        if let Some(found) = document.find_first(scope, &selector)? {
            debug!(selector = %selector, element = %found, "element already present");
            return Ok(Self {
                document: document.clone(),
                selector,
                scope,
                state: WatchState::Resolved(found),
                observer: None,
            });
        }

        let observer = document.observe(observe_root, ObserveOptions::child_list_subtree())?;
        debug!(
            selector = %selector,
            root = %observe_root,
            "element not present yet; observing subtree"
        );

        Ok(Self {
            document: document.clone(),
            selector,
            scope,
            state: WatchState::Observing,
            observer: Some(observer),
        })
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    /// Wait for the element.
    ///
    /// Never completes if the element never appears; dropping the returned
    /// future releases the subscription.
    pub async fn wait(mut self) -> Result<NodeId> {
        if let WatchState::Resolved(found) = self.state {
            return Ok(found);
        }

        let Some(mut observer) = self.observer.take() else {
            return Err(DomWatchError::ObservationLost(format!(
                "no subscription held while waiting for '{}'",
                self.selector
            )));
        };

        while let Some(batch) = observer.next_batch().await {
            trace!(selector = %self.selector, records = batch.len(), "mutation batch");

            if let Some(found) = self.document.find_first(self.scope, &self.selector)? {
                observer.disconnect();
                self.state = WatchState::Resolved(found);
                debug!(selector = %self.selector, element = %found, "element appeared");
                return Ok(found);
            }
        }

        Err(DomWatchError::ObservationLost(format!(
            "mutation observer closed while waiting for '{}'",
            self.selector
        )))
    }
}

/// Wait for the first element matching `selector` inside `container` (or the
/// whole document).
///
/// The immediate lookup and the subscription happen when this is called, not
/// when the future is first polled. The future resolves straight away when
/// the element already exists; otherwise after the first mutation batch that
/// makes it appear.
pub fn wait_for_element(
    document: &Document,
    selector: &str,
    container: Option<NodeId>,
) -> impl Future<Output = Result<NodeId>> + Send + use<> {
    let mut request = WatchRequest::new(selector);
    if let Some(container) = container {
        request = request.within(container);
    }
    let started = ElementWatcher::start(document, request);
    async move { started?.wait().await }
}
