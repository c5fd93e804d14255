use ego_tree::{NodeId, NodeRef, Tree};
use scraper::node::Node;
use scraper::Html;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostNode {
    Document,
    Element {
        name: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

impl HostNode {
    pub fn element(name: &str, attrs: &[(&str, &str)]) -> Self {
        HostNode::Element {
            name: name.to_ascii_lowercase(),
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        match self {
            HostNode::Element { attrs, .. } => attrs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str()),
            HostNode::Document | HostNode::Text(_) => None,
        }
    }

    fn is_element_named(&self, tag: &str) -> bool {
        matches!(self, HostNode::Element { name, .. } if name == tag)
    }
}

/// Structural change to one node's child list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub target: NodeId,
    pub added: Vec<NodeId>,
    pub removed: Vec<NodeId>,
}

/// The host page as an arena tree.
///
/// Removed subtrees stay in the arena, detached, so their attributes and
/// descendants can still be inspected after removal. While an observer is
/// attached every child-list change is queued as a [`MutationRecord`].
pub struct HostDocument {
    tree: Tree<HostNode>,
    observed: bool,
    records: Vec<MutationRecord>,
}

impl Default for HostDocument {
    fn default() -> Self {
        Self::parse("")
    }
}

impl HostDocument {
    /// Builds the document from HTML, keeping elements and text only.
    pub fn parse(html: &str) -> Self {
        let source = Html::parse_document(html);
        let mut tree = Tree::new(HostNode::Document);
        let root = tree.root().id();
        copy_children(source.tree.root(), &mut tree, root);
        Self {
            tree,
            observed: false,
            records: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.tree.root().id()
    }

    pub fn node(&self, id: NodeId) -> Option<&HostNode> {
        self.tree.get(id).map(|node| node.value())
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id)?.attr(name)
    }

    pub fn body(&self) -> Option<NodeId> {
        self.tree
            .root()
            .descendants()
            .find(|node| node.value().is_element_named("body"))
            .map(|node| node.id())
    }

    /// First connected element whose `id` attribute equals `element_id`.
    pub fn element_by_id(&self, element_id: &str) -> Option<NodeId> {
        self.tree
            .root()
            .descendants()
            .find(|node| node.value().attr("id") == Some(element_id))
            .map(|node| node.id())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.tree.get(id)?.parent().map(|p| p.id())
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.tree
            .get(id)
            .map(|node| node.children().map(|c| c.id()).collect())
            .unwrap_or_default()
    }

    /// Whether the node is reachable from the document root.
    pub fn is_connected(&self, id: NodeId) -> bool {
        let Some(node) = self.tree.get(id) else {
            return false;
        };
        let top = node.ancestors().last().unwrap_or(node);
        top.id() == self.root()
    }

    /// The node itself or its nearest ancestor carrying `attr`. In a detached
    /// subtree the search stops at the subtree root.
    pub fn closest_with_attr(&self, id: NodeId, attr: &str) -> Option<NodeId> {
        let node = self.tree.get(id)?;
        std::iter::once(node)
            .chain(node.ancestors())
            .find(|n| n.value().attr(attr).is_some())
            .map(|n| n.id())
    }

    /// Every node strictly below `id` carrying `attr`, in document order.
    pub fn descendants_with_attr(&self, id: NodeId, attr: &str) -> Vec<NodeId> {
        self.tree
            .get(id)
            .map(|node| {
                node.descendants()
                    .skip(1)
                    .filter(|n| n.value().attr(attr).is_some())
                    .map(|n| n.id())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Appends a new child to `parent`. Returns `None` if `parent` is unknown.
    pub fn append(&mut self, parent: NodeId, value: HostNode) -> Option<NodeId> {
        let child = self.tree.get_mut(parent)?.append(value).id();
        self.record(MutationRecord {
            target: parent,
            added: vec![child],
            removed: Vec::new(),
        });
        Some(child)
    }

    /// Detaches `id` from its parent. Returns false for the root or for a
    /// node that is already detached.
    pub fn remove(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.parent(id) else {
            return false;
        };
        let Some(mut node) = self.tree.get_mut(id) else {
            return false;
        };
        node.detach();
        self.record(MutationRecord {
            target: parent,
            added: Vec::new(),
            removed: vec![id],
        });
        true
    }

    /// Detaches every child of `id` in one record.
    pub fn clear_children(&mut self, id: NodeId) -> usize {
        let removed = self.children(id);
        for &child in &removed {
            if let Some(mut node) = self.tree.get_mut(child) {
                node.detach();
            }
        }
        let count = removed.len();
        if count > 0 {
            self.record(MutationRecord {
                target: id,
                added: Vec::new(),
                removed,
            });
        }
        count
    }

    /// Starts queueing records. Returns false if an observer is already attached.
    pub fn observe(&mut self) -> bool {
        !std::mem::replace(&mut self.observed, true)
    }

    /// Stops queueing and drops records not yet taken.
    pub fn disconnect(&mut self) {
        self.observed = false;
        self.records.clear();
    }

    pub fn is_observed(&self) -> bool {
        self.observed
    }

    /// Takes the queued batch.
    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.records)
    }

    fn record(&mut self, record: MutationRecord) {
        if self.observed {
            self.records.push(record);
        }
    }
}

fn copy_children(source: NodeRef<'_, Node>, tree: &mut Tree<HostNode>, parent: NodeId) {
    for child in source.children() {
        let value = match child.value() {
            Node::Element(element) => HostNode::Element {
                name: element.name().to_string(),
                attrs: element
                    .attrs()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            },
            Node::Text(text) => HostNode::Text(String::from(&**text)),
            // comments, doctypes and processing instructions
            _ => continue,
        };
        let Some(mut target) = tree.get_mut(parent) else {
            return;
        };
        let id = target.append(value).id();
        copy_children(child, tree, id);
    }
}
