//! Loaded documents
//!
//! A [`Document`] is a cheap, cloneable handle to one parsed page: its node
//! arena, the stylesheets fetched for it, nested frame documents and the
//! little bit of live state inspection needs (viewport scroll, focus).
//! Styles and layout are derived lazily and cached until the tree changes.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::dom::parse::parse_document;
use crate::dom::{Dom, Namespace, NodeId};
use crate::element::Element;
use crate::rendering::layout::{layout_document, DocumentMetrics, ElementMetrics, LayoutTree};
use crate::rendering::BoundingBox;
use crate::selector::{MatchContext, SelectorList};
use crate::style::values::format_px;
use crate::style::{is_stylesheet_link, style_parent, ComputedStyle, PseudoElement, StyleResolver};
use crate::{InspectConfig, Result};

#[cfg(feature = "fetch")]
use crate::loader::Loader;

/// Source of linked resources: stylesheets and frame documents.
///
/// [`Loader`](crate::Loader) implements this over HTTP; tests and embedders
/// can supply their own.
pub trait ResourceFetcher {
    fn fetch_text(&self, url: &str) -> Result<String>;
}

#[cfg(feature = "fetch")]
impl ResourceFetcher for Loader {
    fn fetch_text(&self, url: &str) -> Result<String> {
        Loader::fetch_text(self, url)
    }
}

/// Handle to a parsed document. Clones share the same document.
#[derive(Clone)]
pub struct Document {
    inner: Arc<RwLock<DocumentState>>,
}

pub(crate) struct DocumentState {
    pub(crate) dom: Dom,
    url: Option<String>,
    config: InspectConfig,
    /// Viewport scroll offset as (x, y).
    scroll: (f64, f64),
    focused: Option<NodeId>,
    frames: HashMap<NodeId, Document>,
    /// Fetched stylesheet text keyed by the raw `href` attribute.
    stylesheets: HashMap<String, String>,
    layout: Mutex<Option<CachedLayout>>,
}

struct CachedLayout {
    generation: u64,
    focused: Option<NodeId>,
    tree: Arc<LayoutTree>,
}

impl Document {
    /// Parse `html` with no base URL. Linked resources are not fetched.
    pub fn parse(html: &str, config: InspectConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(html, None, &config, None, 0))
    }

    /// Parse `html` as if it had been loaded from `url`.
    pub fn parse_with_url(html: &str, url: &str, config: InspectConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(html, Some(url), &config, None, 0))
    }

    /// Parse `html`, pulling linked stylesheets and frame documents through
    /// `fetcher`.
    pub fn parse_with_fetcher(
        html: &str,
        url: Option<&str>,
        config: InspectConfig,
        fetcher: &dyn ResourceFetcher,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(html, url, &config, Some(fetcher), 0))
    }

    /// Read and parse a local HTML file.
    pub fn from_file(path: impl AsRef<Path>, config: InspectConfig) -> Result<Self> {
        config.validate()?;
        let path = path.as_ref();
        let html = std::fs::read_to_string(path)?;
        let url = std::fs::canonicalize(path)
            .ok()
            .map(|p| format!("file://{}", p.display()));
        Ok(Self::build(&html, url.as_deref(), &config, None, 0))
    }

    /// Fetch `url` and parse the response, following linked stylesheets and
    /// frames as configured.
    #[cfg(feature = "fetch")]
    pub fn load_url(url: &str, config: InspectConfig) -> Result<Self> {
        config.validate()?;
        let loader = Loader::new(&config)?;
        let html = loader
            .fetch_text(url)
            .map_err(|e| crate::Error::LoadError(format!("Failed to load {}: {}", url, e)))?;
        Ok(Self::build(&html, Some(url), &config, Some(&loader), 0))
    }

    fn build(
        html: &str,
        url: Option<&str>,
        config: &InspectConfig,
        fetcher: Option<&dyn ResourceFetcher>,
        depth: usize,
    ) -> Self {
        let dom = parse_document(html);
        log::debug!(
            "loaded {} ({} nodes, frame depth {})",
            url.unwrap_or("about:blank"),
            dom.len(),
            depth
        );

        let mut stylesheets = HashMap::new();
        if let (true, Some(fetcher)) = (config.fetch_stylesheets, fetcher) {
            for link in dom.all_elements() {
                if !dom.has_tag(link, "link") || !is_stylesheet_link(&dom, link) {
                    continue;
                }
                let Some(href) = dom.attr(link, "href") else {
                    continue;
                };
                if stylesheets.contains_key(href) {
                    continue;
                }
                let target = resolve_href(url, href);
                match fetcher.fetch_text(&target) {
                    Ok(css) => {
                        stylesheets.insert(href.to_string(), css);
                    }
                    Err(e) => log::warn!("stylesheet {} not loaded: {}", target, e),
                }
            }
        }

        let mut frames = HashMap::new();
        if depth < config.max_frame_depth {
            for frame in dom.all_elements().filter(|n| dom.has_tag(*n, "iframe")) {
                if let Some(srcdoc) = dom.attr(frame, "srcdoc") {
                    let doc = Self::build(srcdoc, Some("about:srcdoc"), config, fetcher, depth + 1);
                    frames.insert(frame, doc);
                    continue;
                }
                let src = dom.attr(frame, "src").map(str::trim).filter(|s| !s.is_empty());
                match (src, fetcher) {
                    (None, _) => {
                        let doc = Self::build("", Some("about:blank"), config, fetcher, depth + 1);
                        frames.insert(frame, doc);
                    }
                    (Some(src), Some(fetcher)) if config.load_frames => {
                        let target = resolve_href(url, src);
                        match fetcher.fetch_text(&target) {
                            Ok(html) => {
                                let doc = Self::build(&html, Some(&target), config, Some(fetcher), depth + 1);
                                frames.insert(frame, doc);
                            }
                            Err(e) => log::warn!("frame {} not loaded: {}", target, e),
                        }
                    }
                    _ => {}
                }
            }
        }

        let state = DocumentState {
            dom,
            url: url.map(str::to_string),
            config: config.clone(),
            scroll: (0.0, 0.0),
            focused: None,
            frames,
            stylesheets,
            layout: Mutex::new(None),
        };
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, DocumentState> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, DocumentState> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn element(&self, node: NodeId) -> Element {
        Element::new(self.clone(), node)
    }

    /// Whether both handles refer to the same document.
    pub fn ptr_eq(&self, other: &Document) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn url(&self) -> Option<String> {
        self.read().url.clone()
    }

    pub fn config(&self) -> InspectConfig {
        self.read().config.clone()
    }

    /// The `<html>` element.
    pub fn document_element(&self) -> Option<Element> {
        let node = self.read().dom.document_element()?;
        Some(self.element(node))
    }

    pub fn head(&self) -> Option<Element> {
        let node = self.read().dom.head()?;
        Some(self.element(node))
    }

    pub fn body(&self) -> Option<Element> {
        let node = self.read().dom.body()?;
        Some(self.element(node))
    }

    /// Text of the first `<title>`, whitespace collapsed.
    pub fn title(&self) -> String {
        let state = self.read();
        let dom = &state.dom;
        dom.descendant_elements(dom.root())
            .into_iter()
            .find(|n| {
                dom.has_tag(*n, "title")
                    && dom.element(*n).is_some_and(|e| e.namespace == Namespace::Html)
            })
            .map(|n| dom.text_content(n).split_ascii_whitespace().collect::<Vec<_>>().join(" "))
            .unwrap_or_default()
    }

    /// First element in the document matching `selector`.
    pub fn query(&self, selector: &str) -> Result<Option<Element>> {
        let found = {
            let state = self.read();
            state.query_first(state.dom.root(), selector)?
        };
        Ok(found.map(|n| self.element(n)))
    }

    /// All elements in the document matching `selector`, in tree order.
    pub fn query_all(&self, selector: &str) -> Result<Vec<Element>> {
        let found = {
            let state = self.read();
            state.query_all(state.dom.root(), selector)?
        };
        Ok(found.into_iter().map(|n| self.element(n)).collect())
    }

    /// The focused element, or `<body>` when nothing has focus.
    pub fn active_element(&self) -> Option<Element> {
        let node = {
            let state = self.read();
            state.focused.or_else(|| state.dom.body())
        };
        node.map(|n| self.element(n))
    }

    /// Scroll the viewport, clamped to the scrollable area.
    pub fn scroll_to(&self, x: f64, y: f64) {
        self.write().scroll_to(x, y);
    }

    /// Current viewport scroll offset as (x, y).
    pub fn scroll_position(&self) -> (f64, f64) {
        self.read().scroll
    }

    /// Client, offset and scroll sizes of `<html>` and `<body>`.
    pub fn metrics(&self) -> DocumentMetrics {
        self.read().layout().metrics
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        f.debug_struct("Document")
            .field("url", &state.url)
            .field("nodes", &state.dom.len())
            .field("frames", &state.frames.len())
            .finish()
    }
}

impl DocumentState {
    fn resolver(&self) -> StyleResolver<'_> {
        StyleResolver::new(
            &self.dom,
            self.focused,
            self.config.viewport,
            self.config.default_font_size,
            &self.stylesheets,
        )
    }

    pub(crate) fn query_all(&self, scope: NodeId, selector: &str) -> Result<Vec<NodeId>> {
        let list = SelectorList::parse(selector)?;
        Ok(MatchContext::new(&self.dom, self.focused).query_all(scope, &list))
    }

    pub(crate) fn query_first(&self, scope: NodeId, selector: &str) -> Result<Option<NodeId>> {
        let list = SelectorList::parse(selector)?;
        Ok(MatchContext::new(&self.dom, self.focused).query_first(scope, &list))
    }

    pub(crate) fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub(crate) fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    pub(crate) fn frame(&self, node: NodeId) -> Option<Document> {
        self.frames.get(&node).cloned()
    }

    /// Layout of the current tree, recomputed when the tree or focus changed.
    pub(crate) fn layout(&self) -> Arc<LayoutTree> {
        let generation = self.dom.generation();
        let mut cache = self.layout.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = cache.as_ref() {
            if cached.generation == generation && cached.focused == self.focused {
                return Arc::clone(&cached.tree);
            }
        }
        let mut resolver = self.resolver();
        let tree = Arc::new(layout_document(&self.dom, &mut resolver, self.config.viewport));
        *cache = Some(CachedLayout {
            generation,
            focused: self.focused,
            tree: Arc::clone(&tree),
        });
        tree
    }

    /// Computed style with `width`/`height` replaced by the used size for
    /// rendered non-inline boxes, as `getComputedStyle` reports them.
    pub(crate) fn computed_style(&self, node: NodeId, pseudo: Option<PseudoElement>) -> Option<ComputedStyle> {
        let mut style = self.resolver().computed_style(node, pseudo).cloned()?;
        if pseudo.is_some() || style.display() == "inline" {
            return Some(style);
        }
        let layout = self.layout();
        if let Some(b) = layout.get(node) {
            let (width, height) = if style.get("box-sizing") == Some("border-box") {
                (b.rect.width, b.rect.height)
            } else {
                let model = &b.box_model;
                (
                    b.rect.width - model.border.horizontal() - model.padding.horizontal(),
                    b.rect.height - model.border.vertical() - model.padding.vertical(),
                )
            };
            style.set("width", format_px(width.max(0.0)));
            style.set("height", format_px(height.max(0.0)));
        }
        Some(style)
    }

    pub(crate) fn element_metrics(&self, node: NodeId) -> Option<ElementMetrics> {
        self.layout().get(node).map(ElementMetrics::from_box)
    }

    /// Border box relative to the viewport: document position minus the
    /// scroll offsets of every scrolled ancestor and of the viewport.
    pub(crate) fn bounding_box(&self, node: NodeId) -> BoundingBox {
        let layout = self.layout();
        let Some(layout_box) = layout.get(node) else {
            return BoundingBox::default();
        };
        let mut rect = layout_box.rect;
        if !layout_box.fixed {
            let html = self.dom.document_element();
            let mut cursor = style_parent(&self.dom, node);
            while let Some(ancestor) = cursor {
                if Some(ancestor) == html {
                    break;
                }
                let (left, top) = self.dom.scroll_offsets(ancestor);
                rect.x -= left;
                rect.y -= top;
                cursor = style_parent(&self.dom, ancestor);
            }
            rect.x -= self.scroll.0;
            rect.y -= self.scroll.1;
        }
        BoundingBox::from(rect)
    }

    pub(crate) fn scroll(&self) -> (f64, f64) {
        self.scroll
    }

    pub(crate) fn scroll_to(&mut self, x: f64, y: f64) {
        let metrics = self.layout().metrics;
        let max_x = scroll_range(metrics.html.scroll_width, metrics.html.client_width);
        let max_y = scroll_range(metrics.html.scroll_height, metrics.html.client_height);
        self.scroll = (clamp_scroll(x, max_x), clamp_scroll(y, max_y));
        log::debug!("viewport scrolled to {:?}", self.scroll);
    }

    /// Set an element's scroll offsets. `<html>` scrolls the viewport;
    /// elements that do not clip their overflow stay at zero.
    pub(crate) fn set_element_scroll(&mut self, node: NodeId, left: Option<f64>, top: Option<f64>) {
        if Some(node) == self.dom.document_element() {
            let (x, y) = self.scroll;
            self.scroll_to(left.unwrap_or(x), top.unwrap_or(y));
            return;
        }
        let Some(metrics) = self.element_metrics(node) else {
            return;
        };
        let Some(style) = self.resolver().computed_style(node, None).cloned() else {
            return;
        };
        let clips = |prop: &str| !matches!(style.get(prop), None | Some("visible" | "clip"));

        if let Some(left) = left {
            let max = scroll_range(metrics.scroll_width, metrics.client_width);
            let value = if clips("overflow-x") { clamp_scroll(left, max) } else { 0.0 };
            self.dom.set_scroll_left(node, value);
        }
        if let Some(top) = top {
            let max = scroll_range(metrics.scroll_height, metrics.client_height);
            let value = if clips("overflow-y") { clamp_scroll(top, max) } else { 0.0 };
            self.dom.set_scroll_top(node, value);
        }
    }

    /// Move focus to `node` if it can take focus. Returns whether it did.
    pub(crate) fn focus(&mut self, node: NodeId) -> bool {
        if !self.is_focusable(node) {
            log::debug!("{:?} is not focusable", node);
            return false;
        }
        if self.focused != Some(node) {
            log::debug!("focus moved to {:?}", node);
            self.focused = Some(node);
        }
        true
    }

    pub(crate) fn blur(&mut self, node: NodeId) {
        if self.focused == Some(node) {
            self.focused = None;
        }
    }

    fn is_focusable(&self, node: NodeId) -> bool {
        let Some(el) = self.dom.element(node) else {
            return false;
        };
        let tag = el.tag_name.to_ascii_lowercase();
        let disableable = matches!(tag.as_str(), "button" | "input" | "select" | "textarea");
        if disableable && el.has_attr("disabled") {
            return false;
        }
        let native = match tag.as_str() {
            "a" | "area" => el.has_attr("href"),
            "button" | "select" | "textarea" | "iframe" | "summary" => true,
            "input" => !el.attr("type").is_some_and(|t| t.eq_ignore_ascii_case("hidden")),
            _ => false,
        };
        let editable = el
            .attr("contenteditable")
            .is_some_and(|v| !v.eq_ignore_ascii_case("false"));
        let tabindex = el
            .attr("tabindex")
            .is_some_and(|v| v.trim().parse::<i64>().is_ok());
        if !(native || editable || tabindex) {
            return false;
        }
        if self.layout().get(node).is_none() {
            return false;
        }
        self.resolver()
            .computed_style(node, None)
            .is_some_and(|s| s.get("visibility") == Some("visible"))
    }
}

/// Largest scroll offset, from the integer `scroll*` and `client*` sizes.
fn scroll_range(scroll: f64, client: f64) -> f64 {
    (scroll.round() - client.round()).max(0.0)
}

fn clamp_scroll(value: f64, max: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, max)
    } else {
        0.0
    }
}

/// Resolve a link target against the document URL.
#[cfg(feature = "fetch")]
pub(crate) fn resolve_href(base: Option<&str>, href: &str) -> String {
    crate::loader::resolve_url(base, href)
}

#[cfg(not(feature = "fetch"))]
pub(crate) fn resolve_href(_base: Option<&str>, href: &str) -> String {
    href.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::cell::RefCell;

    struct StaticFetcher {
        resources: HashMap<&'static str, &'static str>,
        requested: RefCell<Vec<String>>,
    }

    impl StaticFetcher {
        fn new(resources: &[(&'static str, &'static str)]) -> Self {
            Self {
                resources: resources.iter().copied().collect(),
                requested: RefCell::new(Vec::new()),
            }
        }
    }

    impl ResourceFetcher for StaticFetcher {
        fn fetch_text(&self, url: &str) -> Result<String> {
            self.requested.borrow_mut().push(url.to_string());
            self.resources
                .get(url)
                .map(|s| s.to_string())
                .ok_or_else(|| Error::NetworkError(format!("404 {}", url)))
        }
    }

    fn doc(html: &str) -> Document {
        Document::parse(html, InspectConfig::default()).unwrap()
    }

    #[test]
    fn title_and_structure() {
        let d = doc("<title>  Hello \n  world </title><p>x</p>");
        assert_eq!(d.title(), "Hello world");
        assert_eq!(d.document_element().unwrap().tag_name(), "html");
        assert!(d.head().is_some());
        assert!(d.body().is_some());
        assert_eq!(d.url(), None);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = InspectConfig {
            timeout_ms: 0,
            ..Default::default()
        };
        assert!(matches!(Document::parse("", config), Err(Error::ConfigError(_))));
    }

    #[test]
    fn query_reports_invalid_selectors() {
        let d = doc("<p></p>");
        assert!(matches!(d.query("p[["), Err(Error::InvalidSelector(_))));
        assert_eq!(d.query_all("p").unwrap().len(), 1);
    }

    #[test]
    fn active_element_defaults_to_body() {
        let d = doc("<input id=a><div id=b></div>");
        assert_eq!(d.active_element().unwrap().tag_name(), "body");
        let input = d.query("#a").unwrap().unwrap();
        let div = d.query("#b").unwrap().unwrap();
        assert!(!div.focus());
        assert!(input.focus());
        assert_eq!(d.active_element().unwrap(), input);
    }

    #[test]
    fn viewport_scroll_is_clamped() {
        let d = doc("<div style='height:2000px'></div>");
        d.scroll_to(0.0, 5000.0);
        let (_, y) = d.scroll_position();
        let m = d.metrics();
        assert_eq!(y, m.html.scroll_height.round() - 720.0);
        d.scroll_to(-10.0, -10.0);
        assert_eq!(d.scroll_position(), (0.0, 0.0));
    }

    #[test]
    fn element_scroll_clamps_to_whole_pixels() {
        let d = doc(
            "<style>body{margin:0} #box{height:100px;overflow:auto} #tall{height:160.3px}</style>\
             <div id=box><div id=tall></div></div>",
        );
        let b = d.query("#box").unwrap().unwrap();
        b.set_scroll_top(500.0);
        assert_eq!(b.scroll_top(), 60.0);
        assert_eq!(b.property("scrollHeight"), "160");
    }

    #[test]
    #[cfg(feature = "fetch")]
    fn linked_stylesheets_come_from_the_fetcher() {
        let fetcher = StaticFetcher::new(&[("http://example.com/css/site.css", "p { color: red }")]);
        let d = Document::parse_with_fetcher(
            "<link rel=stylesheet href='css/site.css'><link rel=stylesheet href=missing.css><p>x</p>",
            Some("http://example.com/index.html"),
            InspectConfig::default(),
            &fetcher,
        )
        .unwrap();
        let p = d.query("p").unwrap().unwrap();
        assert_eq!(p.style_property("color", None), "rgb(255, 0, 0)");
        assert_eq!(fetcher.requested.borrow().len(), 2);
    }

    #[test]
    #[cfg(feature = "fetch")]
    fn frames_load_from_srcdoc_and_src() {
        let fetcher = StaticFetcher::new(&[("http://example.com/inner.html", "<h1>inner</h1>")]);
        let d = Document::parse_with_fetcher(
            "<iframe id=a srcdoc='<b>doc</b>'></iframe><iframe id=b src=inner.html></iframe><iframe id=c src=gone.html></iframe>",
            Some("http://example.com/"),
            InspectConfig::default(),
            &fetcher,
        )
        .unwrap();
        let a = d.query("#a").unwrap().unwrap().content_frame().unwrap();
        assert!(a.query("b").unwrap().is_some());
        assert_eq!(a.url().as_deref(), Some("about:srcdoc"));
        let b = d.query("#b").unwrap().unwrap().content_frame().unwrap();
        assert_eq!(b.query("h1").unwrap().unwrap().text(), "inner");
        assert!(d.query("#c").unwrap().unwrap().content_frame().is_none());
    }

    #[test]
    fn frame_depth_is_bounded() {
        let config = InspectConfig {
            max_frame_depth: 1,
            ..Default::default()
        };
        let d = Document::parse(
            "<iframe srcdoc=\"<iframe srcdoc='<p>deep</p>'></iframe>\"></iframe>",
            config,
        )
        .unwrap();
        let outer = d.query("iframe").unwrap().unwrap().content_frame().unwrap();
        let inner = outer.query("iframe").unwrap().unwrap();
        assert!(inner.content_frame().is_none());
    }
}
