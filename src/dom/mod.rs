//! Arena-backed document tree
//!
//! The tree is produced from `scraper`'s html5ever output (see `parse`) and
//! owned by a [`crate::Document`]. Nodes are addressed by [`NodeId`] and never
//! freed; detached nodes simply lose their parent link.

pub(crate) mod parse;
pub(crate) mod serialize;

use serde::Serialize;

/// Index of a node inside its document arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// Namespace an element was created in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    Html,
    Svg,
    MathMl,
}

/// Encapsulation mode of a shadow root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowRootMode {
    Open,
    Closed,
}

impl ShadowRootMode {
    pub(crate) fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "open" => Some(ShadowRootMode::Open),
            "closed" => Some(ShadowRootMode::Closed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ElementData {
    pub(crate) tag_name: String,
    pub(crate) namespace: Namespace,
    pub(crate) attrs: Vec<(String, String)>,
}

impl ElementData {
    pub(crate) fn new(tag_name: &str, namespace: Namespace) -> Self {
        let tag_name = if namespace == Namespace::Html {
            tag_name.to_ascii_lowercase()
        } else {
            tag_name.to_string()
        };
        Self {
            tag_name,
            namespace,
            attrs: Vec::new(),
        }
    }

    /// Attribute lookup; HTML elements compare names ASCII case-insensitively.
    pub(crate) fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| self.name_matches(k, name))
            .map(|(_, v)| v.as_str())
    }

    pub(crate) fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    fn name_matches(&self, stored: &str, wanted: &str) -> bool {
        if self.namespace == Namespace::Html {
            stored.eq_ignore_ascii_case(wanted)
        } else {
            stored == wanted
        }
    }

    pub(crate) fn has_class(&self, class_name: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class_name))
    }
}

#[derive(Debug, Clone)]
pub(crate) enum NodeKind {
    Document,
    Element(ElementData),
    Text(String),
    Comment(String),
    ShadowRoot { mode: ShadowRootMode, host: NodeId },
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) kind: NodeKind,
    pub(crate) shadow_root: Option<NodeId>,
    pub(crate) scroll_top: f64,
    pub(crate) scroll_left: f64,
}

impl Node {
    fn new(kind: NodeKind, parent: Option<NodeId>) -> Self {
        Self {
            parent,
            children: Vec::new(),
            kind,
            shadow_root: None,
            scroll_top: 0.0,
            scroll_left: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Dom {
    nodes: Vec<Node>,
    generation: u64,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    pub(crate) fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Document, None)],
            generation: 0,
        }
    }

    pub(crate) fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Incremented on every tree or attribute mutation.
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.generation += 1;
        &mut self.nodes[id.0]
    }

    pub(crate) fn append(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(kind, Some(parent)));
        self.node_mut(parent).children.push(id);
        id
    }

    pub(crate) fn append_element(&mut self, parent: NodeId, tag: &str) -> NodeId {
        self.append(parent, NodeKind::Element(ElementData::new(tag, Namespace::Html)))
    }

    pub(crate) fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.append(parent, NodeKind::Text(text.to_string()))
    }

    pub(crate) fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes.get(id.0)?.kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        if self.element(id).is_none() {
            return None;
        }
        match &mut self.node_mut(id).kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    pub(crate) fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub(crate) fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.tag_name.as_str())
    }

    pub(crate) fn has_tag(&self, id: NodeId, tag: &str) -> bool {
        self.tag_name(id).is_some_and(|t| t.eq_ignore_ascii_case(tag))
    }

    pub(crate) fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub(crate) fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|p| self.is_element(*p))
    }

    pub(crate) fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub(crate) fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).children.first().copied()
    }

    pub(crate) fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|c| self.is_element(*c))
            .collect()
    }

    pub(crate) fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let children = self.children(parent);
        let pos = children.iter().position(|c| *c == id)?;
        children[pos + 1..]
            .iter()
            .copied()
            .find(|c| self.is_element(*c))
    }

    pub(crate) fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let children = self.children(parent);
        let pos = children.iter().position(|c| *c == id)?;
        children[..pos]
            .iter()
            .rev()
            .copied()
            .find(|c| self.is_element(*c))
    }

    pub(crate) fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attr(name)
    }

    pub(crate) fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        let Some(element) = self.element_mut(id) else {
            return;
        };
        let name = if element.namespace == Namespace::Html {
            name.to_ascii_lowercase()
        } else {
            name.to_string()
        };
        match element.attrs.iter_mut().find(|(k, _)| *k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => element.attrs.push((name, value.to_string())),
        }
    }

    pub(crate) fn remove_attr(&mut self, id: NodeId, name: &str) -> bool {
        let Some(element) = self.element(id) else {
            return false;
        };
        if !element.has_attr(name) {
            return false;
        }
        let Some(element) = self.element_mut(id) else {
            return false;
        };
        let html = element.namespace == Namespace::Html;
        element.attrs.retain(|(k, _)| {
            if html {
                !k.eq_ignore_ascii_case(name)
            } else {
                k != name
            }
        });
        true
    }

    pub(crate) fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub(crate) fn is_text(&self, id: NodeId) -> bool {
        self.text(id).is_some()
    }

    /// `textContent`: concatenated data of descendant text nodes.
    pub(crate) fn text_content(&self, id: NodeId) -> String {
        match &self.node(id).kind {
            NodeKind::Text(text) | NodeKind::Comment(text) => text.clone(),
            _ => {
                let mut out = String::new();
                for node in self.descendants(id) {
                    if let Some(text) = self.text(node) {
                        out.push_str(text);
                    }
                }
                out
            }
        }
    }

    /// Descendants of `id` in tree order, excluding `id` and shadow trees.
    pub(crate) fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    pub(crate) fn descendant_elements(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|n| self.is_element(*n))
            .collect()
    }

    /// Every element in the arena, shadow trees included, in creation order.
    pub(crate) fn all_elements(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len())
            .map(NodeId)
            .filter(|id| self.is_element(*id))
    }

    pub(crate) fn is_descendant_of(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut cursor = self.parent(id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    pub(crate) fn document_element(&self) -> Option<NodeId> {
        self.children(self.root())
            .iter()
            .copied()
            .find(|c| self.is_element(*c))
    }

    fn document_child_by_tag(&self, tag: &str) -> Option<NodeId> {
        let html = self.document_element()?;
        self.children(html)
            .iter()
            .copied()
            .find(|c| self.has_tag(*c, tag))
    }

    pub(crate) fn head(&self) -> Option<NodeId> {
        self.document_child_by_tag("head")
    }

    pub(crate) fn body(&self) -> Option<NodeId> {
        self.document_child_by_tag("body")
    }

    /// Attach a shadow root to `host`. Returns `None` when the host already
    /// has one or is not an element.
    pub(crate) fn attach_shadow(&mut self, host: NodeId, mode: ShadowRootMode) -> Option<NodeId> {
        if !self.is_element(host) || self.node(host).shadow_root.is_some() {
            return None;
        }
        let id = NodeId(self.nodes.len());
        self.nodes
            .push(Node::new(NodeKind::ShadowRoot { mode, host }, None));
        self.node_mut(host).shadow_root = Some(id);
        Some(id)
    }

    pub(crate) fn shadow_root(&self, host: NodeId) -> Option<(NodeId, ShadowRootMode)> {
        let root = self.node(host).shadow_root?;
        match self.node(root).kind {
            NodeKind::ShadowRoot { mode, .. } => Some((root, mode)),
            _ => None,
        }
    }

    /// Topmost ancestor of `id` (the document, a shadow root, or a detached node).
    pub(crate) fn tree_root(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    pub(crate) fn shadow_host(&self, id: NodeId) -> Option<NodeId> {
        match self.node(self.tree_root(id)).kind {
            NodeKind::ShadowRoot { host, .. } => Some(host),
            _ => None,
        }
    }

    pub(crate) fn in_shadow_tree(&self, id: NodeId) -> bool {
        self.shadow_host(id).is_some()
    }

    pub(crate) fn scroll_offsets(&self, id: NodeId) -> (f64, f64) {
        let node = self.node(id);
        (node.scroll_left, node.scroll_top)
    }

    pub(crate) fn set_scroll_top(&mut self, id: NodeId, top: f64) {
        self.node_mut(id).scroll_top = top;
    }

    pub(crate) fn set_scroll_left(&mut self, id: NodeId, left: f64) {
        self.node_mut(id).scroll_left = left;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Dom, NodeId, NodeId, NodeId) {
        let mut dom = Dom::new();
        let html = dom.append_element(dom.root(), "html");
        let body = dom.append_element(html, "body");
        let a = dom.append_element(body, "a");
        dom.append_text(body, "between");
        let b = dom.append_element(body, "b");
        dom.append_text(b, "bold");
        (dom, body, a, b)
    }

    #[test]
    fn element_siblings_skip_text_nodes() {
        let (dom, _, a, b) = sample();
        assert_eq!(dom.next_element_sibling(a), Some(b));
        assert_eq!(dom.previous_element_sibling(b), Some(a));
        assert_eq!(dom.previous_element_sibling(a), None);
        assert_eq!(dom.next_element_sibling(b), None);
    }

    #[test]
    fn text_content_concatenates_descendants() {
        let (dom, body, _, _) = sample();
        assert_eq!(dom.text_content(body), "betweenbold");
    }

    #[test]
    fn attributes_are_case_insensitive_for_html() {
        let (mut dom, _, a, _) = sample();
        dom.set_attr(a, "shadowTree", "1");
        assert_eq!(dom.attr(a, "shadowtree"), Some("1"));
        assert_eq!(dom.attr(a, "SHADOWTREE"), Some("1"));
        assert_eq!(dom.element(a).unwrap().attrs[0].0, "shadowtree");

        dom.set_attr(a, "SHADOWTREE", "2");
        assert_eq!(dom.element(a).unwrap().attrs.len(), 1);
        assert!(dom.remove_attr(a, "shadowTree"));
        assert!(!dom.remove_attr(a, "shadowTree"));
    }

    #[test]
    fn mutations_bump_generation() {
        let (mut dom, _, a, _) = sample();
        let before = dom.generation();
        dom.set_attr(a, "href", "#");
        assert!(dom.generation() > before);
    }

    #[test]
    fn shadow_roots_are_separate_trees() {
        let (mut dom, body, a, _) = sample();
        let root = dom.attach_shadow(a, ShadowRootMode::Open).unwrap();
        assert!(dom.attach_shadow(a, ShadowRootMode::Closed).is_none());
        let inner = dom.append_element(root, "span");

        assert_eq!(dom.shadow_host(inner), Some(a));
        assert!(dom.in_shadow_tree(inner));
        assert!(!dom.is_descendant_of(inner, body));
        assert!(!dom.descendants(body).contains(&inner));
        assert_eq!(dom.shadow_root(a), Some((root, ShadowRootMode::Open)));
    }

    #[test]
    fn head_and_body_lookup() {
        let (dom, body, _, _) = sample();
        assert_eq!(dom.body(), Some(body));
        assert_eq!(dom.head(), None);
        assert!(dom.document_element().is_some());
    }
}
