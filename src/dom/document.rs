// src/dom/document.rs

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::dom::observer::{
    MutationKind, MutationObserver, MutationRecord, ObserveOptions, ObserverId,
};
use crate::dom::selector::Selector;
use crate::dom::NodeId;
use crate::errors::{DomWatchError, Result};

/// Payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Document,
    Element(ElementData),
    Text(String),
}

/// Tag name and attributes of an element.
///
/// Tag and attribute names are stored lower-cased; attribute values keep
/// their case and insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ElementData {
    tag: String,
    attributes: IndexMap<String, String>,
}

impl ElementData {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: IndexMap::new(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn id(&self) -> Option<&str> {
        self.attributes.get("id").map(String::as_str)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attributes
            .get("class")
            .is_some_and(|v| v.split_ascii_whitespace().any(|c| c == class))
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: None,
            children: Vec::new(),
        }
    }
}

#[derive(Debug)]
struct Registration {
    target: NodeId,
    options: ObserveOptions,
    tx: mpsc::UnboundedSender<MutationRecord>,
}

impl Registration {
    fn wants(&self, tree: &Tree, record: &MutationRecord) -> bool {
        let kind_enabled = match record.kind {
            MutationKind::ChildList => self.options.child_list,
            MutationKind::Attributes { .. } => self.options.attributes,
        };
        if !kind_enabled {
            return false;
        }
        record.target == self.target
            || (self.options.subtree && tree.is_inclusive_ancestor(self.target, record.target))
    }
}

/// Arena of nodes plus the observers registered against it.
#[derive(Debug)]
pub(crate) struct Tree {
    nodes: Vec<Node>,
    observers: HashMap<ObserverId, Registration>,
    next_observer: u64,
}

impl Tree {
    fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeData::Document)],
            observers: HashMap::new(),
            next_observer: 0,
        }
    }

    fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(id.index())
            .ok_or(DomWatchError::NodeNotFound(id))
    }

    fn push(&mut self, data: NodeData) -> Result<NodeId> {
        let id = NodeId::from_index(self.nodes.len())?;
        self.nodes.push(Node::new(data));
        Ok(id)
    }

    pub(crate) fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.nodes.get(id.index()).map(|n| &n.data) {
            Some(NodeData::Element(el)) => Some(el),
            _ => None,
        }
    }

    fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.index()).and_then(|n| n.parent)
    }

    pub(crate) fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|p| self.element(*p).is_some())
    }

    pub(crate) fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = &self.nodes[parent.index()].children;
        let pos = siblings.iter().position(|c| *c == id)?;
        siblings[..pos]
            .iter()
            .rev()
            .copied()
            .find(|s| self.element(*s).is_some())
    }

    /// True if `ancestor` is `node` or one of its ancestors.
    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Descendants of `scope` (excluding `scope`) in document order.
    fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[scope.index()]
            .children
            .iter()
            .rev()
            .copied()
            .collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id.index()].children.iter().rev().copied());
        }
        out
    }

    fn first_child_element(&self, parent: NodeId, tag: Option<&str>) -> Option<NodeId> {
        self.nodes
            .get(parent.index())?
            .children
            .iter()
            .copied()
            .find(|c| match (self.element(*c), tag) {
                (Some(el), Some(tag)) => el.tag() == tag,
                (Some(_), None) => true,
                (None, _) => false,
            })
    }

    fn check_insert(&self, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> Result<()> {
        let parent_node = self.node(parent)?;
        let child_node = self.node(child)?;

        match (&parent_node.data, &child_node.data) {
            (NodeData::Text(_), _) => {
                return Err(DomWatchError::HierarchyRequest(format!(
                    "text node {parent} cannot have children"
                )));
            }
            (_, NodeData::Document) => {
                return Err(DomWatchError::HierarchyRequest(
                    "the document node cannot be inserted".to_string(),
                ));
            }
            (NodeData::Document, NodeData::Text(_)) => {
                return Err(DomWatchError::HierarchyRequest(
                    "text nodes cannot be children of the document".to_string(),
                ));
            }
            _ => {}
        }

        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomWatchError::HierarchyRequest(format!(
                "{child} is an inclusive ancestor of {parent}"
            )));
        }

        if let Some(reference) = reference {
            if self.node(reference)?.parent != Some(parent) {
                return Err(DomWatchError::HierarchyRequest(format!(
                    "{reference} is not a child of {parent}"
                )));
            }
        }

        Ok(())
    }

    /// Detach `child` from its parent, if any. Returns the removal record.
    fn detach(&mut self, child: NodeId) -> Option<MutationRecord> {
        let parent = self.nodes[child.index()].parent.take()?;
        self.nodes[parent.index()].children.retain(|c| *c != child);
        Some(MutationRecord::child_list(parent, Vec::new(), vec![child]))
    }

    fn insert(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> Result<()> {
        self.check_insert(parent, child, reference)?;

        // Inserting a node before itself means "before its next sibling".
        let reference = match reference {
            Some(r) if r == child => {
                let siblings = &self.nodes[parent.index()].children;
                siblings
                    .iter()
                    .position(|c| *c == child)
                    .and_then(|pos| siblings.get(pos + 1).copied())
            }
            other => other,
        };

        if let Some(record) = self.detach(child) {
            self.notify(record);
        }

        let children = &mut self.nodes[parent.index()].children;
        let index = reference
            .and_then(|r| children.iter().position(|c| *c == r))
            .unwrap_or(children.len());
        children.insert(index, child);
        self.nodes[child.index()].parent = Some(parent);

        self.notify(MutationRecord::child_list(parent, vec![child], Vec::new()));
        Ok(())
    }

    fn notify(&self, record: MutationRecord) {
        trace!(?record, "mutation");
        for (id, reg) in self.observers.iter() {
            if reg.wants(self, &record) && reg.tx.send(record.clone()).is_err() {
                trace!(observer = ?id, "observer receiver already closed");
            }
        }
    }
}

/// Shared handle to an in-memory document.
///
/// Clones refer to the same tree.
#[derive(Clone)]
pub struct Document {
    tree: Arc<Mutex<Tree>>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tree = self.lock();
        f.debug_struct("Document")
            .field("nodes", &tree.nodes.len())
            .field("observers", &tree.observers.len())
            .finish()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document with the usual `html > (head, body)` skeleton.
    pub fn new() -> Self {
        let mut tree = Tree::new();
        let (html, head, body) = (NodeId(1), NodeId(2), NodeId(3));
        for tag in ["html", "head", "body"] {
            tree.nodes.push(Node::new(NodeData::Element(ElementData::new(tag))));
        }
        tree.nodes[NodeId::ROOT.index()].children.push(html);
        tree.nodes[html.index()].parent = Some(NodeId::ROOT);
        tree.nodes[html.index()].children.extend([head, body]);
        tree.nodes[head.index()].parent = Some(html);
        tree.nodes[body.index()].parent = Some(html);

        Self {
            tree: Arc::new(Mutex::new(tree)),
        }
    }

    /// Create a document holding only the document node.
    pub fn empty() -> Self {
        Self {
            tree: Arc::new(Mutex::new(Tree::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Tree> {
        self.tree.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// The first element child of the document (normally `<html>`).
    pub fn document_element(&self) -> Option<NodeId> {
        self.lock().first_child_element(NodeId::ROOT, None)
    }

    pub fn head(&self) -> Option<NodeId> {
        let tree = self.lock();
        let html = tree.first_child_element(NodeId::ROOT, None)?;
        tree.first_child_element(html, Some("head"))
    }

    pub fn body(&self) -> Option<NodeId> {
        let tree = self.lock();
        let html = tree.first_child_element(NodeId::ROOT, None)?;
        tree.first_child_element(html, Some("body"))
    }

    /// Create a detached element.
    ///
    /// Fails with [`DomWatchError::NodeLimit`] once the arena is full.
    pub fn create_element(&self, tag: &str) -> Result<NodeId> {
        self.lock().push(NodeData::Element(ElementData::new(tag)))
    }

    /// Create a detached text node.
    pub fn create_text_node(&self, text: &str) -> Result<NodeId> {
        self.lock().push(NodeData::Text(text.to_string()))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.lock().nodes.len()
    }

    pub fn node_data(&self, id: NodeId) -> Option<NodeData> {
        self.lock().nodes.get(id.index()).map(|n| n.data.clone())
    }

    pub fn tag_name(&self, id: NodeId) -> Option<String> {
        self.lock().element(id).map(|el| el.tag().to_string())
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<String> {
        self.lock()
            .element(id)
            .and_then(|el| el.attribute(name))
            .map(str::to_string)
    }

    pub fn text(&self, id: NodeId) -> Option<String> {
        match self.lock().nodes.get(id.index()).map(|n| &n.data) {
            Some(NodeData::Text(t)) => Some(t.clone()),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.lock().parent(id)
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.lock()
            .nodes
            .get(id.index())
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// True if the node is reachable from the document node.
    pub fn is_connected(&self, id: NodeId) -> bool {
        let tree = self.lock();
        id.index() < tree.nodes.len() && tree.is_inclusive_ancestor(NodeId::ROOT, id)
    }

    pub fn set_attribute(&self, id: NodeId, name: &str, value: &str) -> Result<()> {
        let mut tree = self.lock();
        let name = name.to_ascii_lowercase();
        match tree.nodes.get_mut(id.index()).map(|n| &mut n.data) {
            Some(NodeData::Element(el)) => {
                el.attributes.insert(name.clone(), value.to_string());
            }
            Some(_) => {
                return Err(DomWatchError::HierarchyRequest(format!(
                    "{id} is not an element"
                )));
            }
            None => return Err(DomWatchError::NodeNotFound(id)),
        }
        tree.notify(MutationRecord::attribute(id, &name));
        Ok(())
    }

    /// Remove an attribute; returns whether it was present.
    pub fn remove_attribute(&self, id: NodeId, name: &str) -> Result<bool> {
        let mut tree = self.lock();
        let name = name.to_ascii_lowercase();
        let removed = match tree.nodes.get_mut(id.index()).map(|n| &mut n.data) {
            Some(NodeData::Element(el)) => el.attributes.shift_remove(&name).is_some(),
            Some(_) => false,
            None => return Err(DomWatchError::NodeNotFound(id)),
        };
        if removed {
            tree.notify(MutationRecord::attribute(id, &name));
        }
        Ok(removed)
    }

    /// Append `child` as the last child of `parent`.
    ///
    /// If `child` is already in a tree it is moved.
    pub fn append_child(&self, parent: NodeId, child: NodeId) -> Result<()> {
        self.lock().insert(parent, child, None)
    }

    /// Insert `child` before `reference` (or at the end when `None`).
    pub fn insert_before(
        &self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<()> {
        self.lock().insert(parent, child, reference)
    }

    pub fn remove_child(&self, parent: NodeId, child: NodeId) -> Result<()> {
        let mut tree = self.lock();
        tree.node(parent)?;
        if tree.node(child)?.parent != Some(parent) {
            return Err(DomWatchError::HierarchyRequest(format!(
                "{child} is not a child of {parent}"
            )));
        }
        if let Some(record) = tree.detach(child) {
            tree.notify(record);
        }
        Ok(())
    }

    /// Detach `node` from its parent. No-op for detached nodes.
    pub fn remove(&self, node: NodeId) -> Result<()> {
        let mut tree = self.lock();
        tree.node(node)?;
        if let Some(record) = tree.detach(node) {
            tree.notify(record);
        }
        Ok(())
    }

    /// First descendant of `scope` matching `selector`, in document order.
    pub fn query_selector(&self, scope: NodeId, selector: &str) -> Result<Option<NodeId>> {
        let selector = Selector::parse(selector)?;
        self.find_first(scope, &selector)
    }

    /// All descendants of `scope` matching `selector`, in document order.
    pub fn query_selector_all(&self, scope: NodeId, selector: &str) -> Result<Vec<NodeId>> {
        let selector = Selector::parse(selector)?;
        let tree = self.lock();
        tree.node(scope)?;
        Ok(tree
            .descendants(scope)
            .into_iter()
            .filter(|id| selector.matches(&tree, *id))
            .collect())
    }

    pub(crate) fn find_first(&self, scope: NodeId, selector: &Selector) -> Result<Option<NodeId>> {
        let tree = self.lock();
        tree.node(scope)?;
        Ok(tree
            .descendants(scope)
            .into_iter()
            .find(|id| selector.matches(&tree, *id)))
    }

    /// Register a mutation observer on `target`.
    pub fn observe(&self, target: NodeId, options: ObserveOptions) -> Result<MutationObserver> {
        options.validate()?;

        let (tx, rx) = mpsc::unbounded_channel();
        let id = {
            let mut tree = self.lock();
            tree.node(target)?;
            let id = ObserverId(tree.next_observer);
            tree.next_observer += 1;
            tree.observers.insert(
                id,
                Registration {
                    target,
                    options,
                    tx,
                },
            );
            id
        };

        debug!(observer = ?id, %target, ?options, "mutation observer registered");
        Ok(MutationObserver::new(id, target, self.clone(), rx))
    }

    /// Number of currently registered observers.
    pub fn observer_count(&self) -> usize {
        self.lock().observers.len()
    }

    pub(crate) fn unregister_observer(&self, id: ObserverId) -> bool {
        self.lock().observers.remove(&id).is_some()
    }
}
