//! The element facade
//!
//! [`Element`] wraps one element of a [`Document`] and answers the questions
//! accessibility rules ask about it. Every accessor is null-safe: missing
//! relatives come back as `None`, missing text and unknown properties as
//! empty strings. Selector errors are the only failures surfaced.

use std::fmt;

use serde::Serialize;

use crate::document::{resolve_href, Document, DocumentState};
use crate::dom::parse::append_fragment;
use crate::dom::serialize::{end_tag, escape_text, inner_html, outer_html, start_tag};
use crate::dom::{Dom, Namespace, NodeId, NodeKind, ShadowRootMode};
use crate::rendering::BoundingBox;
use crate::selector::css_string;
use crate::style::values::format_number;
use crate::style::PseudoElement;
use crate::Result;

/// DOM node type as reported by [`Element::node_type`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Tag,
    Attribute,
    Text,
    Comment,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Tag => "tag",
            NodeType::Attribute => "attribute",
            NodeType::Text => "text",
            NodeType::Comment => "comment",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of [`Element::child_nodes`]
#[derive(Debug, Clone, PartialEq)]
pub enum ChildNode {
    Element(Element),
    Text(String),
    Comment(String),
}

/// Handle to one element of a [`Document`]
#[derive(Clone)]
pub struct Element {
    document: Document,
    node: NodeId,
}

impl Element {
    pub(crate) fn new(document: Document, node: NodeId) -> Self {
        Self { document, node }
    }

    fn wrap(&self, node: Option<NodeId>) -> Option<Element> {
        node.map(|n| Element::new(self.document.clone(), n))
    }

    fn wrap_all(&self, nodes: Vec<NodeId>) -> Vec<Element> {
        nodes
            .into_iter()
            .map(|n| Element::new(self.document.clone(), n))
            .collect()
    }

    /// The document this element belongs to.
    pub fn document(&self) -> Document {
        self.document.clone()
    }

    pub fn node_id(&self) -> NodeId {
        self.node
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        let state = self.document.read();
        state
            .dom
            .element(self.node)
            .is_some_and(|el| el.attrs.iter().any(|(k, _)| k == name))
    }

    pub fn has_attributes(&self) -> bool {
        let state = self.document.read();
        state.dom.element(self.node).is_some_and(|el| !el.attrs.is_empty())
    }

    /// Whether some element child has tag `tag` (ASCII case-insensitive).
    pub fn has_child(&self, tag: &str) -> bool {
        let state = self.document.read();
        let dom = &state.dom;
        dom.element_children(self.node)
            .into_iter()
            .any(|child| tag_eq(dom, child, tag))
    }

    pub fn has_children(&self) -> bool {
        let state = self.document.read();
        !state.dom.element_children(self.node).is_empty()
    }

    /// Whether the parent element has tag `tag`; false without one.
    pub fn has_parent(&self, tag: &str) -> bool {
        let state = self.document.read();
        let dom = &state.dom;
        dom.parent_element(self.node)
            .is_some_and(|parent| tag_eq(dom, parent, tag))
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        let state = self.document.read();
        state.dom.attr(self.node, name).map(str::to_string)
    }

    /// All attributes as (name, value) pairs in document order.
    pub fn attributes(&self) -> Vec<(String, String)> {
        let state = self.document.read();
        state
            .dom
            .element(self.node)
            .map(|el| el.attrs.clone())
            .unwrap_or_default()
    }

    pub fn attribute_names(&self) -> Vec<String> {
        let state = self.document.read();
        state
            .dom
            .element(self.node)
            .map(|el| el.attrs.iter().map(|(k, _)| k.clone()).collect())
            .unwrap_or_default()
    }

    /// Element children that belong to the same shadow-tree partition as
    /// this element, found through its own CSS path.
    pub fn children(&self) -> Vec<Element> {
        let selector = format!("{} > *{}", self.css_selector(), self.tree_selector());
        match self.query_all(&selector) {
            Ok(children) => children,
            Err(e) => {
                log::warn!("children of {:?} not resolved: {}", self.node, e);
                Vec::new()
            }
        }
    }

    /// `[shadowTree="<value>"]` for elements carrying a `shadowTree`
    /// attribute, `:not([shadowTree])` otherwise.
    pub fn tree_selector(&self) -> String {
        match self.attribute("shadowTree") {
            Some(value) => format!("[shadowTree={}]", css_string(&value)),
            None => ":not([shadowTree])".to_string(),
        }
    }

    /// Text content of the first element child with tag `tag`, `None` when
    /// there is no such child or its text is empty.
    pub fn child_text_content(&self, tag: &str) -> Option<String> {
        let state = self.document.read();
        let dom = &state.dom;
        let child = dom
            .element_children(self.node)
            .into_iter()
            .find(|child| tag_eq(dom, *child, tag))?;
        let text = dom.text_content(child);
        (!text.is_empty()).then_some(text)
    }

    /// Markup of the element: the full outer HTML when `full_element`, else
    /// its tags around its `text` property when `with_text`, else its tags
    /// with nothing inside.
    pub fn html_code(&self, with_text: bool, full_element: bool) -> String {
        let state = self.document.read();
        let dom = &state.dom;
        if full_element {
            return outer_html(dom, self.node);
        }
        let mut out = start_tag(dom, self.node);
        if let Some(end) = end_tag(dom, self.node) {
            if with_text {
                if let Some(text) = text_property(dom, self.node) {
                    out.push_str(&escape_text(&text));
                }
            }
            out.push_str(&end);
        }
        out
    }

    /// First descendant matching `selector`.
    pub fn query(&self, selector: &str) -> Result<Option<Element>> {
        let found = self.document.read().query_first(self.node, selector)?;
        Ok(self.wrap(found))
    }

    /// Descendants matching `selector`, in tree order.
    pub fn query_all(&self, selector: &str) -> Result<Vec<Element>> {
        let found = self.document.read().query_all(self.node, selector)?;
        Ok(self.wrap_all(found))
    }

    pub fn next_sibling(&self) -> Option<Element> {
        let next = self.document.read().dom.next_element_sibling(self.node);
        self.wrap(next)
    }

    pub fn previous_sibling(&self) -> Option<Element> {
        let prev = self.document.read().dom.previous_element_sibling(self.node);
        self.wrap(prev)
    }

    pub fn parent(&self) -> Option<Element> {
        let parent = self.document.read().dom.parent_element(self.node);
        self.wrap(parent)
    }

    /// DOM property `name` rendered as a string. Booleans are `"true"` /
    /// `"false"`, numbers use the shortest form; unknown or null properties
    /// give `""`.
    pub fn property(&self, name: &str) -> String {
        let state = self.document.read();
        dom_property(&state, self.node, name).unwrap_or_default()
    }

    /// Unique CSS path of the element.
    ///
    /// `html`, `html > head` and `html > body` for those three; otherwise
    /// `html > ` followed by one `tag:nth-of-type(k)` segment per ancestor
    /// below `<html>` and one for the element. Inside a shadow tree the path
    /// starts at the shadow root and has no `html > ` prefix.
    pub fn css_selector(&self) -> String {
        let state = self.document.read();
        let dom = &state.dom;
        let tag = lower_tag(dom, self.node);
        match tag.as_str() {
            "html" => return "html".to_string(),
            "head" => return "html > head".to_string(),
            "body" => return "html > body".to_string(),
            _ => {}
        }

        let mut segments = vec![location_in_parent(dom, self.node)];
        let mut cursor = dom.parent_element(self.node);
        while let Some(parent) = cursor {
            if lower_tag(dom, parent) == "html" {
                break;
            }
            segments.push(location_in_parent(dom, parent));
            cursor = dom.parent_element(parent);
        }
        segments.reverse();

        let path = segments.join(" > ");
        if dom.tree_root(self.node) == dom.root() {
            format!("html > {}", path)
        } else {
            path
        }
    }

    /// Computed value of `property`, for the element or for `pseudo`
    /// (`::before`, `:after`, ...). Unknown properties and unsupported
    /// pseudo-elements give `""`.
    pub fn style_property(&self, property: &str, pseudo: Option<&str>) -> String {
        let pseudo = match pseudo.map(str::trim).filter(|p| !p.is_empty()) {
            None => None,
            Some(raw) => match PseudoElement::parse(raw) {
                Some(p) => Some(p),
                None => return String::new(),
            },
        };
        let state = self.document.read();
        state
            .computed_style(self.node, pseudo)
            .map(|style| style.get_property_value(property))
            .unwrap_or_default()
    }

    /// Lowercase tag name.
    pub fn tag_name(&self) -> String {
        lower_tag(&self.document.read().dom, self.node)
    }

    /// Text content, empty when there is none.
    pub fn text(&self) -> String {
        self.document.read().dom.text_content(self.node)
    }

    pub fn node_type(&self) -> NodeType {
        match self.document.read().dom.node(self.node).kind {
            NodeKind::Element(_) => NodeType::Tag,
            NodeKind::Text(_) => NodeType::Text,
            _ => NodeType::Comment,
        }
    }

    /// 1 + the number of following element siblings sharing this tag.
    pub fn siblings_with_same_tag(&self) -> usize {
        let state = self.document.read();
        let dom = &state.dom;
        let tag = lower_tag(dom, self.node);
        let mut count = 1;
        let mut cursor = dom.next_element_sibling(self.node);
        while let Some(sibling) = cursor {
            if lower_tag(dom, sibling) == tag {
                count += 1;
            }
            cursor = dom.next_element_sibling(sibling);
        }
        count
    }

    pub fn set_attribute(&self, name: &str, value: &str) {
        self.document.write().dom.set_attr(self.node, name, value);
    }

    /// Remove attribute `name`. Returns whether it was present.
    pub fn remove_attribute(&self, name: &str) -> bool {
        self.document.write().dom.remove_attr(self.node, name)
    }

    /// Accessible name built from the element's children: non-blank text
    /// nodes (trimmed) and, for each element child in order, the matching
    /// entry of `names`, separated by single spaces.
    pub fn concat_a_names<S: AsRef<str>>(&self, names: &[S]) -> String {
        let state = self.document.read();
        let dom = &state.dom;
        let mut result = String::new();
        let mut texts = 0;
        let mut next_name = 0;
        for child in dom.children(self.node) {
            match &dom.node(*child).kind {
                NodeKind::Text(text) if !text.trim().is_empty() => {
                    if texts > 0 {
                        result.push(' ');
                    }
                    result.push_str(text.trim());
                    texts += 1;
                }
                NodeKind::Element(_) => {
                    let name = names.get(next_name).map(|n| n.as_ref()).unwrap_or("");
                    if texts > 0 && !name.is_empty() {
                        result.push(' ');
                    }
                    result.push_str(name);
                    next_name += 1;
                }
                _ => {}
            }
        }
        result
    }

    /// Whether the element lies outside the scrollable document area.
    pub fn is_off_screen(&self) -> bool {
        let state = self.document.read();
        let metrics = state.layout().metrics;
        let height = metrics.max_height();
        let width = metrics.max_width();
        let bounds = state.bounding_box(self.node);
        let no_parent_scrolled = no_parent_scrolled(&state.dom, self.node, bounds.bottom);

        bounds.left > width
            || bounds.right < 0.0
            || (bounds.bottom < 0.0 && no_parent_scrolled)
            || bounds.top > height
            || (bounds.right == 0.0 && bounds.left == 0.0)
    }

    pub fn is_html_element(&self) -> bool {
        let state = self.document.read();
        state
            .dom
            .element(self.node)
            .is_some_and(|el| el.namespace == Namespace::Html)
    }

    /// Document loaded in an `<iframe>`.
    pub fn content_frame(&self) -> Option<Document> {
        let state = self.document.read();
        if lower_tag(&state.dom, self.node) != "iframe" {
            return None;
        }
        state.frame(self.node)
    }

    /// Whether the first child node is a text node.
    pub fn has_text_node(&self) -> bool {
        let state = self.document.read();
        state
            .dom
            .first_child(self.node)
            .is_some_and(|child| state.dom.is_text(child))
    }

    /// Give the element focus if it can take it. Returns whether it did.
    pub fn focus(&self) -> bool {
        self.document.write().focus(self.node)
    }

    pub fn blur(&self) {
        self.document.write().blur(self.node);
    }

    pub fn is_focused(&self) -> bool {
        self.document.read().focused() == Some(self.node)
    }

    /// Border box relative to the viewport.
    pub fn bounding_box(&self) -> BoundingBox {
        self.document.read().bounding_box(self.node)
    }

    /// First match of `selector` inside the element's open shadow root.
    pub fn shadow_element(&self, selector: &str) -> Result<Option<Element>> {
        let state = self.document.read();
        let Some(root) = open_shadow_root(&state.dom, self.node) else {
            return Ok(None);
        };
        let found = state.query_first(root, selector)?;
        drop(state);
        Ok(self.wrap(found))
    }

    /// All matches of `selector` inside the element's open shadow root.
    pub fn shadow_elements(&self, selector: &str) -> Result<Vec<Element>> {
        let state = self.document.read();
        let Some(root) = open_shadow_root(&state.dom, self.node) else {
            return Ok(Vec::new());
        };
        let found = state.query_all(root, selector)?;
        drop(state);
        Ok(self.wrap_all(found))
    }

    /// Attach a shadow root holding `html`. Returns false when the element
    /// already has one.
    pub fn attach_shadow(&self, mode: ShadowRootMode, html: &str) -> bool {
        let mut state = self.document.write();
        let Some(root) = state.dom.attach_shadow(self.node, mode) else {
            return false;
        };
        append_fragment(&mut state.dom, root, html);
        true
    }

    /// Child nodes, text and comments included.
    pub fn child_nodes(&self) -> Vec<ChildNode> {
        let state = self.document.read();
        let dom = &state.dom;
        dom.children(self.node)
            .iter()
            .map(|child| match &dom.node(*child).kind {
                NodeKind::Text(text) => ChildNode::Text(text.clone()),
                NodeKind::Comment(text) => ChildNode::Comment(text.clone()),
                _ => ChildNode::Element(Element::new(self.document.clone(), *child)),
            })
            .collect()
    }

    pub fn scroll_top(&self) -> f64 {
        let state = self.document.read();
        if Some(self.node) == state.dom.document_element() {
            return state.scroll().1;
        }
        state.dom.scroll_offsets(self.node).1
    }

    pub fn scroll_left(&self) -> f64 {
        let state = self.document.read();
        if Some(self.node) == state.dom.document_element() {
            return state.scroll().0;
        }
        state.dom.scroll_offsets(self.node).0
    }

    /// Scroll the element's content, clamped to its scrollable range.
    /// `<html>` scrolls the viewport.
    pub fn set_scroll_top(&self, top: f64) {
        self.document.write().set_element_scroll(self.node, None, Some(top));
    }

    pub fn set_scroll_left(&self, left: f64) {
        self.document.write().set_element_scroll(self.node, Some(left), None);
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node && self.document.ptr_eq(&other.document)
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("node", &self.node)
            .field("tag", &self.tag_name())
            .finish()
    }
}

fn lower_tag(dom: &Dom, node: NodeId) -> String {
    dom.tag_name(node)
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

fn tag_eq(dom: &Dom, node: NodeId, tag: &str) -> bool {
    dom.tag_name(node).is_some_and(|t| t.eq_ignore_ascii_case(tag))
}

fn location_in_parent(dom: &Dom, node: NodeId) -> String {
    let tag = lower_tag(dom, node);
    if tag == "body" || tag == "head" {
        return tag;
    }
    let mut same = 0;
    let mut cursor = dom.previous_element_sibling(node);
    while let Some(prev) = cursor {
        if lower_tag(dom, prev) == tag {
            same += 1;
        }
        cursor = dom.previous_element_sibling(prev);
    }
    format!("{}:nth-of-type({})", tag, same + 1)
}

/// Whether no ancestor below `<html>` is scrolled far enough to bring
/// `offset` (the element's bottom edge) back to zero or beyond.
fn no_parent_scrolled(dom: &Dom, node: NodeId, mut offset: f64) -> bool {
    let mut cursor = dom.parent_element(node);
    while let Some(parent) = cursor {
        if lower_tag(dom, parent) == "html" {
            break;
        }
        let (_, top) = dom.scroll_offsets(parent);
        if top != 0.0 {
            offset += top;
            if offset >= 0.0 {
                return false;
            }
        }
        cursor = dom.parent_element(parent);
    }
    true
}

fn open_shadow_root(dom: &Dom, host: NodeId) -> Option<NodeId> {
    match dom.shadow_root(host)? {
        (root, ShadowRootMode::Open) => Some(root),
        (_, ShadowRootMode::Closed) => None,
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_ascii_whitespace().collect::<Vec<_>>().join(" ")
}

/// The `text` IDL attribute, defined only for a few elements.
fn text_property(dom: &Dom, node: NodeId) -> Option<String> {
    match lower_tag(dom, node).as_str() {
        "a" | "script" | "title" => Some(dom.text_content(node)),
        "option" => Some(collapse_whitespace(&dom.text_content(node))),
        _ => None,
    }
}

fn flag(value: bool) -> Option<String> {
    Some(value.to_string())
}

fn number(value: f64) -> Option<String> {
    Some(format_number(value))
}

fn reflect(dom: &Dom, node: NodeId, attr: &str) -> Option<String> {
    Some(dom.attr(node, attr).unwrap_or_default().to_string())
}

fn dom_property(state: &DocumentState, node: NodeId, name: &str) -> Option<String> {
    let dom = &state.dom;
    let el = dom.element(node)?;
    let tag = el.tag_name.to_ascii_lowercase();
    let html = el.namespace == Namespace::Html;

    match name {
        "tagName" | "nodeName" => Some(if html {
            el.tag_name.to_ascii_uppercase()
        } else {
            el.tag_name.clone()
        }),
        "localName" => Some(el.tag_name.clone()),
        "nodeType" => number(1.0),
        "namespaceURI" => Some(
            match el.namespace {
                Namespace::Html => "http://www.w3.org/1999/xhtml",
                Namespace::Svg => "http://www.w3.org/2000/svg",
                Namespace::MathMl => "http://www.w3.org/1998/Math/MathML",
            }
            .to_string(),
        ),
        "id" => reflect(dom, node, "id"),
        "className" => reflect(dom, node, "class"),
        "title" => reflect(dom, node, "title"),
        "lang" => reflect(dom, node, "lang"),
        "dir" => reflect(dom, node, "dir"),
        "role" => dom.attr(node, "role").map(str::to_string),
        "alt" => reflect(dom, node, "alt"),
        "name" => reflect(dom, node, "name"),
        "placeholder" => reflect(dom, node, "placeholder"),
        "htmlFor" if tag == "label" => reflect(dom, node, "for"),
        "accessKey" => reflect(dom, node, "accesskey"),
        "textContent" => Some(dom.text_content(node)),
        "innerText" | "outerText" => Some(dom.text_content(node)),
        "innerHTML" => Some(inner_html(dom, node)),
        "outerHTML" => Some(outer_html(dom, node)),
        "text" => text_property(dom, node),
        "label" if tag == "option" => Some(
            dom.attr(node, "label")
                .map(str::to_string)
                .unwrap_or_else(|| collapse_whitespace(&dom.text_content(node))),
        ),
        "href" if matches!(tag.as_str(), "a" | "area" | "link" | "base") => {
            Some(dom.attr(node, "href").map(|h| resolve_href(state.url(), h)).unwrap_or_default())
        }
        "src" if matches!(tag.as_str(), "img" | "iframe" | "script" | "input" | "source" | "video" | "audio" | "embed" | "track") => {
            Some(dom.attr(node, "src").map(|s| resolve_href(state.url(), s)).unwrap_or_default())
        }
        "type" if tag == "input" => Some(
            dom.attr(node, "type")
                .map(str::to_ascii_lowercase)
                .unwrap_or_else(|| "text".to_string()),
        ),
        "type" if tag == "button" => Some(
            dom.attr(node, "type")
                .map(str::to_ascii_lowercase)
                .filter(|t| matches!(t.as_str(), "submit" | "reset" | "button"))
                .unwrap_or_else(|| "submit".to_string()),
        ),
        "value" => form_value(dom, node, &tag),
        "checked" if tag == "input" => flag(el.has_attr("checked")),
        "selected" if tag == "option" => flag(el.has_attr("selected")),
        "disabled" | "required" | "multiple" | "readOnly" | "autofocus"
            if matches!(tag.as_str(), "input" | "button" | "select" | "textarea" | "fieldset" | "option") =>
        {
            flag(el.has_attr(&name.to_ascii_lowercase()))
        }
        "hidden" => flag(el.has_attr("hidden")),
        "isContentEditable" => flag(
            el.attr("contenteditable")
                .is_some_and(|v| !v.eq_ignore_ascii_case("false")),
        ),
        "tabIndex" => {
            let explicit = el.attr("tabindex").and_then(|v| v.trim().parse::<i64>().ok());
            let default = match tag.as_str() {
                "a" | "area" if el.has_attr("href") => 0,
                "button" | "input" | "select" | "textarea" | "iframe" | "summary" => 0,
                _ => -1,
            };
            number(explicit.unwrap_or(default) as f64)
        }
        "childElementCount" => number(dom.element_children(node).len() as f64),
        "isConnected" => flag(dom.tree_root(node) == dom.root() || dom.in_shadow_tree(node)),
        "scrollTop" => number(if Some(node) == dom.document_element() {
            state.scroll().1
        } else {
            dom.scroll_offsets(node).1
        }),
        "scrollLeft" => number(if Some(node) == dom.document_element() {
            state.scroll().0
        } else {
            dom.scroll_offsets(node).0
        }),
        "clientWidth" | "clientHeight" | "offsetWidth" | "offsetHeight" | "scrollWidth"
        | "scrollHeight" => {
            let metrics = state.element_metrics(node).unwrap_or_default();
            let value = match name {
                "clientWidth" => metrics.client_width,
                "clientHeight" => metrics.client_height,
                "offsetWidth" => metrics.offset_width,
                "offsetHeight" => metrics.offset_height,
                "scrollWidth" => metrics.scroll_width,
                _ => metrics.scroll_height,
            };
            number(value.round())
        }
        _ => {
            // ariaLabel, ariaHidden, ... reflect aria-* attributes; null when absent.
            let rest = name.strip_prefix("aria")?;
            if rest.is_empty() || !rest.starts_with(|c: char| c.is_ascii_uppercase()) {
                return None;
            }
            dom.attr(node, &format!("aria-{}", rest.to_ascii_lowercase()))
                .map(str::to_string)
        }
    }
}

fn form_value(dom: &Dom, node: NodeId, tag: &str) -> Option<String> {
    match tag {
        "input" | "button" | "data" | "param" | "li" => reflect(dom, node, "value"),
        "textarea" => Some(dom.text_content(node)),
        "option" => Some(
            dom.attr(node, "value")
                .map(str::to_string)
                .unwrap_or_else(|| collapse_whitespace(&dom.text_content(node))),
        ),
        "select" => {
            let options: Vec<NodeId> = dom
                .descendant_elements(node)
                .into_iter()
                .filter(|n| dom.has_tag(*n, "option"))
                .collect();
            let chosen = options
                .iter()
                .copied()
                .find(|o| dom.attr(*o, "selected").is_some())
                .or_else(|| options.first().copied());
            Some(chosen.and_then(|o| form_value(dom, o, "option")).unwrap_or_default())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InspectConfig;

    fn doc(html: &str) -> Document {
        Document::parse(html, InspectConfig::default()).unwrap()
    }

    fn get(d: &Document, selector: &str) -> Element {
        d.query(selector).unwrap().unwrap()
    }

    #[test]
    fn attribute_accessors() {
        let d = doc("<div id=x data-Role=main class='a b'></div><span></span>");
        let div = get(&d, "#x");
        assert!(div.has_attributes());
        assert!(div.has_attribute("data-role"));
        assert!(!div.has_attribute("data-Role"));
        assert_eq!(div.attribute("class").as_deref(), Some("a b"));
        assert_eq!(div.attribute("missing"), None);
        assert_eq!(div.attribute_names(), vec!["id", "data-role", "class"]);
        assert!(!get(&d, "span").has_attributes());
    }

    #[test]
    fn set_and_remove_attribute() {
        let d = doc("<p></p>");
        let p = get(&d, "p");
        p.set_attribute("ARIA-label", "hi");
        assert_eq!(p.attribute("aria-label").as_deref(), Some("hi"));
        assert_eq!(p.property("ariaLabel"), "hi");
        assert!(p.remove_attribute("aria-label"));
        assert!(!p.remove_attribute("aria-label"));
        assert_eq!(p.property("ariaLabel"), "");
    }

    #[test]
    fn tree_navigation() {
        let d = doc("<ul><li>a</li><li id=b>b</li><li>c</li></ul>");
        let b = get(&d, "#b");
        assert_eq!(b.previous_sibling().unwrap().text(), "a");
        assert_eq!(b.next_sibling().unwrap().text(), "c");
        assert!(b.has_parent("UL"));
        assert!(!b.has_parent("ol"));
        let ul = b.parent().unwrap();
        assert!(ul.has_child("li"));
        assert!(ul.has_children());
        assert!(!b.has_children());
        assert!(d.document_element().unwrap().parent().is_none());
    }

    #[test]
    fn children_respect_shadow_tree_partition() {
        let d = doc("<div id=p><span></span><i shadowTree=1></i><b></b></div>");
        let p = get(&d, "#p");
        let tags: Vec<_> = p.children().iter().map(Element::tag_name).collect();
        assert_eq!(tags, vec!["span", "b"]);
        assert_eq!(p.tree_selector(), ":not([shadowTree])");

        let d = doc("<div id=p shadowTree=2><span></span><i shadowTree=2></i></div>");
        let p = get(&d, "#p");
        assert_eq!(p.tree_selector(), "[shadowTree=\"2\"]");
        let tags: Vec<_> = p.children().iter().map(Element::tag_name).collect();
        assert_eq!(tags, vec!["i"]);
    }

    #[test]
    fn tree_selector_escapes_quotes_and_backslashes() {
        let d = doc(r#"<div id=p shadowTree='a"b\c'><i shadowTree='a"b\c'></i><b></b></div>"#);
        let p = get(&d, "#p");
        assert_eq!(p.tree_selector(), r#"[shadowTree="a\"b\\c"]"#);
        let tags: Vec<_> = p.children().iter().map(Element::tag_name).collect();
        assert_eq!(tags, vec!["i"]);
    }

    #[test]
    fn child_text_content_stops_at_first_match() {
        let d = doc("<figure><figcaption></figcaption><figcaption>x</figcaption><p>para</p></figure>");
        let fig = get(&d, "figure");
        assert_eq!(fig.child_text_content("figcaption"), None);
        assert_eq!(fig.child_text_content("P").as_deref(), Some("para"));
        assert_eq!(fig.child_text_content("img"), None);
    }

    #[test]
    fn html_code_variants() {
        let d = doc("<a href='/x' class=c>Go <b>now</b></a><div id=d>text</div><img src=i.png>");
        let a = get(&d, "a");
        assert_eq!(a.html_code(false, true), "<a href=\"/x\" class=\"c\">Go <b>now</b></a>");
        assert_eq!(a.html_code(true, false), "<a href=\"/x\" class=\"c\">Go now</a>");
        assert_eq!(a.html_code(false, false), "<a href=\"/x\" class=\"c\"></a>");
        assert_eq!(get(&d, "#d").html_code(true, false), "<div id=\"d\"></div>");
        assert_eq!(get(&d, "img").html_code(true, false), "<img src=\"i.png\">");
    }

    #[test]
    fn css_selector_paths() {
        let d = doc("<div></div><div><p></p><span></span><p id=t></p></div>");
        assert_eq!(d.document_element().unwrap().css_selector(), "html");
        assert_eq!(d.head().unwrap().css_selector(), "html > head");
        assert_eq!(d.body().unwrap().css_selector(), "html > body");
        let t = get(&d, "#t");
        let path = t.css_selector();
        assert_eq!(path, "html > body > div:nth-of-type(2) > p:nth-of-type(2)");
        assert_eq!(d.query(&path).unwrap().unwrap(), t);
    }

    #[test]
    fn css_selector_in_shadow_tree() {
        let d = doc("<div id=host><template shadowrootmode=open><section><em></em></section></template></div>");
        let host = get(&d, "#host");
        let em = host.shadow_element("em").unwrap().unwrap();
        assert_eq!(em.css_selector(), "section:nth-of-type(1) > em:nth-of-type(1)");
        assert_eq!(host.shadow_elements("*").unwrap().len(), 2);
        assert!(d.query("em").unwrap().is_none());
    }

    #[test]
    fn closed_shadow_roots_are_hidden() {
        let d = doc("<div id=host><template shadowrootmode=closed><em></em></template></div>");
        let host = get(&d, "#host");
        assert!(host.shadow_element("em").unwrap().is_none());
        assert!(host.shadow_elements("em").unwrap().is_empty());
    }

    #[test]
    fn attach_shadow_populates_root() {
        let d = doc("<div id=host></div>");
        let host = get(&d, "#host");
        assert!(host.shadow_element("p").unwrap().is_none());
        assert!(host.attach_shadow(ShadowRootMode::Open, "<p>in</p>"));
        assert!(!host.attach_shadow(ShadowRootMode::Open, ""));
        assert_eq!(host.shadow_element("p").unwrap().unwrap().text(), "in");
    }

    #[test]
    fn style_property_and_pseudo() {
        let d = doc("<style>p{color:#00f} p::before{content:'x';color:red}</style><p>t</p>");
        let p = get(&d, "p");
        assert_eq!(p.style_property("color", None), "rgb(0, 0, 255)");
        assert_eq!(p.style_property("color", Some("::before")), "rgb(255, 0, 0)");
        assert_eq!(p.style_property("color", Some(":after")), "rgb(0, 0, 255)");
        assert_eq!(p.style_property("color", Some("::marker-x")), "");
        assert_eq!(p.style_property("no-such-prop", None), "");
    }

    #[test]
    fn tag_text_and_type() {
        let d = doc("<svg><circle></circle></svg><P>Hello <b>you</b></P>");
        let p = get(&d, "p");
        assert_eq!(p.tag_name(), "p");
        assert_eq!(p.text(), "Hello you");
        assert_eq!(p.node_type(), NodeType::Tag);
        assert_eq!(p.node_type().to_string(), "tag");
        assert!(p.is_html_element());
        assert!(!get(&d, "circle").is_html_element());
        assert_eq!(p.property("tagName"), "P");
        assert_eq!(p.property("nonexistent"), "");
    }

    #[test]
    fn siblings_with_same_tag_counts_following() {
        let d = doc("<a id=f></a><span></span><a></a><a></a><p id=p></p><p></p>");
        assert_eq!(get(&d, "#f").siblings_with_same_tag(), 3);
        assert_eq!(get(&d, "#p").siblings_with_same_tag(), 2);
    }

    #[test]
    fn concat_a_names_interleaves() {
        let d = doc("<a id=a> Visit <img> site <span></span></a><a id=b><img></a><a id=c><img>text</a>");
        assert_eq!(get(&d, "#a").concat_a_names(&["logo", "x"]), "Visit logo site x");
        assert_eq!(get(&d, "#b").concat_a_names(&["only"]), "only");
        assert_eq!(get(&d, "#b").concat_a_names::<&str>(&[]), "");
        assert_eq!(get(&d, "#c").concat_a_names(&["pic"]), "pictext");
    }

    #[test]
    fn text_node_detection() {
        let d = doc("<p id=a>x<b></b></p><p id=b><b></b>x</p><p id=c></p>");
        assert!(get(&d, "#a").has_text_node());
        assert!(!get(&d, "#b").has_text_node());
        assert!(!get(&d, "#c").has_text_node());
    }

    #[test]
    fn child_nodes_include_text() {
        let d = doc("<p>a<!--c--><b>b</b></p>");
        let nodes = get(&d, "p").child_nodes();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0], ChildNode::Text("a".into()));
        assert_eq!(nodes[1], ChildNode::Comment("c".into()));
        assert!(matches!(&nodes[2], ChildNode::Element(e) if e.tag_name() == "b"));
    }

    #[test]
    fn properties_reflect_dom_state() {
        let d = Document::parse_with_url(
            "<a href='page.html'>x</a><input id=i disabled><select><option>One</option><option value=2 selected>Two</option></select><button>b</button>",
            "http://example.com/dir/",
            InspectConfig::default(),
        )
        .unwrap();
        let input = get(&d, "#i");
        assert_eq!(input.property("type"), "text");
        assert_eq!(input.property("disabled"), "true");
        assert_eq!(input.property("tabIndex"), "0");
        assert_eq!(get(&d, "select").property("value"), "2");
        assert_eq!(get(&d, "button").property("type"), "submit");
        assert_eq!(get(&d, "a").property("text"), "x");
        assert_eq!(get(&d, "body").property("tabIndex"), "-1");
        #[cfg(feature = "fetch")]
        assert_eq!(get(&d, "a").property("href"), "http://example.com/dir/page.html");
    }

    #[test]
    fn bounding_box_and_off_screen() {
        let d = doc(
            "<style>body{margin:0}</style>\
             <div id=a style='height:50px'></div>\
             <div id=far style='position:absolute;left:-500px;top:0;width:10px;height:10px'></div>\
             <div id=above style='position:absolute;top:-100px;left:10px;width:10px;height:10px'></div>\
             <div id=none style='display:none'></div>",
        );
        let a = get(&d, "#a");
        let bb = a.bounding_box();
        assert_eq!(bb.top, 0.0);
        assert_eq!(bb.width, 1280.0);
        assert_eq!(bb.height, 50.0);
        assert!(!a.is_off_screen());
        assert!(get(&d, "#far").is_off_screen());
        assert!(get(&d, "#above").is_off_screen());
        assert!(get(&d, "#none").is_off_screen());
    }

    #[test]
    fn viewport_scroll_moves_bounding_boxes() {
        let d = doc("<style>body{margin:0}</style><div style='height:3000px'></div><p id=p style='height:10px;margin:0'>x</p>");
        let p = get(&d, "#p");
        assert_eq!(p.bounding_box().top, 3000.0);
        let html = d.document_element().unwrap();
        html.set_scroll_top(2000.0);
        assert_eq!(d.scroll_position().1, 2000.0);
        assert_eq!(html.scroll_top(), 2000.0);
        assert_eq!(p.bounding_box().top, 1000.0);
        assert!(!p.is_off_screen());

        // 3010px of content in a 720px viewport
        html.set_scroll_top(9999.0);
        assert_eq!(d.scroll_position().1, 2290.0);
    }

    #[test]
    fn scrolled_container_offsets_children() {
        let d = doc(
            "<style>body{margin:0} #box{height:100px;overflow:auto} .row{height:80px}</style>\
             <div id=box><div class=row></div><div class=row></div><div id=last class=row></div></div>",
        );
        let container = get(&d, "#box");
        let last = get(&d, "#last");
        assert_eq!(last.bounding_box().top, 160.0);
        container.set_scroll_top(1000.0);
        assert_eq!(container.scroll_top(), 140.0);
        assert_eq!(last.bounding_box().top, 20.0);

        let first = get(&d, ".row");
        assert_eq!(first.bounding_box().bottom, -60.0);
        assert!(!first.is_off_screen());
    }

    #[test]
    fn unscrollable_elements_stay_at_zero() {
        let d = doc("<div id=v style='height:10px'><p style='height:100px'></p></div>");
        let v = get(&d, "#v");
        v.set_scroll_top(50.0);
        assert_eq!(v.scroll_top(), 0.0);
    }

    #[test]
    fn focus_tracks_focusable_elements() {
        let d = doc("<button id=b>b</button><div id=d></div><div id=t tabindex=-1></div><input id=h type=hidden>");
        let b = get(&d, "#b");
        assert!(b.focus());
        assert!(b.is_focused());
        assert!(!get(&d, "#d").focus());
        assert!(b.is_focused());
        assert!(!get(&d, "#h").focus());
        let t = get(&d, "#t");
        assert!(t.focus());
        assert!(!b.is_focused());
        t.blur();
        assert_eq!(d.active_element().unwrap().tag_name(), "body");
    }

    #[test]
    fn focus_affects_focus_styles() {
        let d = doc("<style>a:focus{outline-color:red}</style><a href=#>x</a>");
        let a = get(&d, "a");
        assert_ne!(a.style_property("outline-color", None), "rgb(255, 0, 0)");
        a.focus();
        assert_eq!(a.style_property("outline-color", None), "rgb(255, 0, 0)");
    }

    #[test]
    fn content_frame_only_for_iframes() {
        let d = doc("<iframe srcdoc='<p>inner</p>'></iframe><div></div>");
        let frame = get(&d, "iframe").content_frame().unwrap();
        assert_eq!(frame.query("p").unwrap().unwrap().text(), "inner");
        assert!(get(&d, "div").content_frame().is_none());
    }

    #[test]
    fn query_scoped_to_element() {
        let d = doc("<div id=a><p>1</p></div><div id=b><p>2</p><p>3</p></div>");
        let b = get(&d, "#b");
        assert_eq!(b.query("p").unwrap().unwrap().text(), "2");
        assert_eq!(b.query_all("p").unwrap().len(), 2);
        assert_eq!(b.query_all("div p").unwrap().len(), 2);
        assert!(b.query("[[").is_err());
    }
}
