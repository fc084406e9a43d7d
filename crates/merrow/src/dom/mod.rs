//! In-memory page document.
//!
//! A small arena tree that stands in for the browser DOM: elements with ordered attributes and
//! class lists, text nodes, document-order queries, inline-style custom properties and an
//! attribute mutation observer. It is intentionally not a full HTML implementation; pages are
//! imported from well-formed XHTML (see [`Document::parse_xml`]) or built programmatically.

mod observer;
mod serialize;
mod style;
mod xml;

pub use observer::{MutationReceiver, MutationRecord, ObserverId};

use indexmap::IndexMap;
use observer::Registration;

#[derive(Debug, thiserror::Error)]
pub enum DomError {
    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("document has no root element")]
    NoRootElement,
    #[error("document has no <body> element")]
    NoBody,
}

pub type Result<T> = std::result::Result<T, DomError>;

/// Handle to a node inside a [`Document`].
///
/// Ids are only meaningful for the document that created them. Once a node is removed with
/// [`Document::remove`], its id is stale and every accessor treats it as missing, even after
/// the arena slot has been handed to a new node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

#[derive(Debug, Clone)]
enum NodeData {
    Element {
        tag: String,
        attrs: IndexMap<String, String>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

#[derive(Debug)]
pub struct Document {
    nodes: Vec<Slot>,
    free: Vec<usize>,
    root: NodeId,
    observers: Vec<Registration>,
    next_observer: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates `<html><head></head><body></body></html>`.
    pub fn new() -> Self {
        let mut doc = Self::with_root("html");
        let head = doc.create_element("head");
        let body = doc.create_element("body");
        let root = doc.root;
        doc.append_child(root, head);
        doc.append_child(root, body);
        doc
    }

    /// Creates a document whose only node is a root element named `tag`.
    pub fn with_root(tag: &str) -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
            observers: Vec::new(),
            next_observer: 0,
        };
        doc.root = doc.create_element(tag);
        doc
    }

    /// The document element (`<html>` for pages).
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn body(&self) -> Option<NodeId> {
        self.child_element(self.root, "body")
    }

    pub fn head(&self) -> Option<NodeId> {
        self.child_element(self.root, "head")
    }

    fn child_element(&self, parent: NodeId, tag: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|&c| self.tag_name(c) == Some(tag))
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let node = Node {
            parent: None,
            children: Vec::new(),
            data,
        };
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.nodes.push(Slot::default());
                self.nodes.len() - 1
            }
        };
        let slot = &mut self.nodes[index];
        slot.node = Some(node);
        NodeId {
            index,
            generation: slot.generation,
        }
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeData::Element {
            tag: tag.to_string(),
            attrs: IndexMap::new(),
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeData::Text(text.to_string()))
    }

    /// Returns `true` while `id` refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(
            self.node(id).map(|n| &n.data),
            Some(NodeData::Element { .. })
        )
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match &self.node(id)?.data {
            NodeData::Element { tag, .. } => Some(tag.as_str()),
            NodeData::Text(_) => None,
        }
    }

    /// The text of a text node (`None` for elements).
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id)?.data {
            NodeData::Text(text) => Some(text.as_str()),
            NodeData::Element { .. } => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Returns `true` when `id` is attached (directly or transitively) to the document root.
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.is_inclusive_ancestor(self.root, id)
    }

    /// Appends `child` as the last child of `parent`, detaching it from its previous parent.
    ///
    /// Appending a node into its own subtree is ignored.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if !self.contains(parent)
            || !self.contains(child)
            || self.is_inclusive_ancestor(child, parent)
        {
            return;
        }
        self.detach(child);
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.node_mut(parent) {
            node.children.push(child);
        }
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, of: NodeId) -> bool {
        let mut cur = Some(of);
        while let Some(node) = cur {
            if node == ancestor {
                return true;
            }
            cur = self.parent(node);
        }
        false
    }

    /// Unlinks `id` from its parent. The subtree stays alive and can be re-attached.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|&c| c != id);
        }
        if let Some(node) = self.node_mut(id) {
            node.parent = None;
        }
    }

    /// Detaches `id` and frees its whole subtree. The root element cannot be removed.
    pub fn remove(&mut self, id: NodeId) {
        if id == self.root || !self.contains(id) {
            return;
        }
        self.detach(id);
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            if self.node(cur).is_none() {
                continue;
            }
            let slot = &mut self.nodes[cur.index];
            // Bumping the generation turns every outstanding id for this slot stale.
            slot.generation = slot.generation.wrapping_add(1);
            if let Some(node) = slot.node.take() {
                stack.extend(node.children);
                self.free.push(cur.index);
            }
        }
        let nodes = &self.nodes;
        self.observers.retain(|r| {
            nodes
                .get(r.target.index)
                .is_some_and(|slot| slot.generation == r.target.generation && slot.node.is_some())
        });
    }

    /// Removes every child of `id`.
    pub fn clear_children(&mut self, id: NodeId) {
        for child in self.children(id).to_vec() {
            self.remove(child);
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.node(id)?.data {
            NodeData::Element { attrs, .. } => attrs.get(name).map(String::as_str),
            NodeData::Text(_) => None,
        }
    }

    pub fn attributes(&self, id: NodeId) -> impl Iterator<Item = (&str, &str)> {
        let attrs = match self.node(id).map(|n| &n.data) {
            Some(NodeData::Element { attrs, .. }) => Some(attrs),
            _ => None,
        };
        attrs
            .into_iter()
            .flat_map(|a| a.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        self.write_attribute(id, name, Some(value.to_string()));
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) {
        self.write_attribute(id, name, None);
    }

    fn write_attribute(&mut self, id: NodeId, name: &str, value: Option<String>) {
        let Some(Node {
            data: NodeData::Element { attrs, .. },
            ..
        }) = self.node_mut(id)
        else {
            return;
        };
        let old_value = match value.clone() {
            Some(v) => attrs.insert(name.to_string(), v),
            None => {
                let old = attrs.shift_remove(name);
                // Removing a missing attribute is not a mutation.
                if old.is_none() {
                    return;
                }
                old
            }
        };
        self.notify_attribute(id, name, old_value, value);
    }

    pub fn classes(&self, id: NodeId) -> impl Iterator<Item = &str> {
        self.attribute(id, "class")
            .unwrap_or_default()
            .split_ascii_whitespace()
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.classes(id).any(|c| c == class)
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if !self.is_element(id) || self.has_class(id, class) {
            return;
        }
        let mut list: Vec<&str> = self.classes(id).collect();
        list.push(class);
        let joined = list.join(" ");
        self.set_attribute(id, "class", &joined);
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        if !self.has_class(id, class) {
            return;
        }
        let joined = self
            .classes(id)
            .filter(|&c| c != class)
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attribute(id, "class", &joined);
    }

    /// Concatenated text of every descendant text node, in document order.
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.text(id) {
            return text.to_string();
        }
        let mut out = String::new();
        for node in self.descendants(id) {
            if let Some(text) = self.text(node) {
                out.push_str(text);
            }
        }
        out
    }

    /// Replaces every child of `id` with a single text node.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) {
        self.clear_children(id);
        if !text.is_empty() {
            let node = self.create_text(text);
            self.append_child(id, node);
        }
    }

    /// All descendants of `id` (excluding `id`) in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(cur) = stack.pop() {
            out.push(cur);
            stack.extend(self.children(cur).iter().rev().copied());
        }
        out
    }

    /// Descendant elements of `scope` carrying `class`, in document order.
    pub fn elements_with_class(&self, scope: NodeId, class: &str) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&n| self.has_class(n, class))
            .collect()
    }

    pub fn first_with_class(&self, scope: NodeId, class: &str) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|&n| self.has_class(n, class))
    }

    /// Descendant elements of `scope` named `tag`, in document order.
    pub fn elements_by_tag(&self, scope: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&n| self.tag_name(n) == Some(tag))
            .collect()
    }
}
