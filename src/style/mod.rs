//! Computed styles
//!
//! The cascade runs per element: user-agent rules, then author sheets of the
//! element's tree scope (the document, or the shadow root it lives in), then
//! the inline `style` attribute. Specified values are then turned into
//! computed values the way `getComputedStyle` reports them: colors as
//! `rgb()`/`rgba()`, absolute lengths in `px`, numeric font weights.
//!
//! Elements inside a shadow tree inherit from their host.

pub(crate) mod css;
pub(crate) mod values;

use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use serde::Serialize;

use crate::dom::{Dom, NodeId, NodeKind};
use crate::selector::{MatchContext, Specificity};
use crate::Viewport;
use css::{parse_declarations, Declaration, Stylesheet};
use values::{format_number, format_px, parse_color, parse_length, px_value, Length, LengthContext};

pub use css::PseudoElement;

/// Computed values of one element (or pseudo-element)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ComputedStyle {
    values: BTreeMap<String, String>,
}

impl ComputedStyle {
    /// Value of `property`, or the empty string when it is unknown.
    pub fn get_property_value(&self, property: &str) -> String {
        let property = property.trim();
        let value = if property.starts_with("--") {
            self.values.get(property)
        } else {
            self.values.get(&property.to_ascii_lowercase())
        };
        value.cloned().unwrap_or_default()
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.values.get(property).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn set(&mut self, property: &str, value: String) {
        self.values.insert(property.to_string(), value);
    }

    /// Pixel value of a property computed to `Npx`.
    pub(crate) fn px(&self, property: &str) -> Option<f64> {
        self.get(property).and_then(px_value)
    }

    pub(crate) fn font_size(&self) -> f64 {
        self.px("font-size").unwrap_or(16.0)
    }

    pub(crate) fn display(&self) -> &str {
        self.get("display").unwrap_or("inline")
    }
}

// name, initial value, inherited
//
// Order matters: font-size and color come first since other values resolve
// against them, and each `*-style` precedes its `*-width`.
const PROPERTIES: &[(&str, &str, bool)] = &[
    ("font-size", "medium", true),
    ("color", "canvastext", true),
    ("position", "static", false),
    ("float", "none", false),
    ("display", "inline", false),
    ("top", "auto", false),
    ("right", "auto", false),
    ("bottom", "auto", false),
    ("left", "auto", false),
    ("clear", "none", false),
    ("width", "auto", false),
    ("height", "auto", false),
    ("min-width", "auto", false),
    ("min-height", "auto", false),
    ("max-width", "none", false),
    ("max-height", "none", false),
    ("margin-top", "0", false),
    ("margin-right", "0", false),
    ("margin-bottom", "0", false),
    ("margin-left", "0", false),
    ("padding-top", "0", false),
    ("padding-right", "0", false),
    ("padding-bottom", "0", false),
    ("padding-left", "0", false),
    ("border-top-style", "none", false),
    ("border-right-style", "none", false),
    ("border-bottom-style", "none", false),
    ("border-left-style", "none", false),
    ("border-top-width", "medium", false),
    ("border-right-width", "medium", false),
    ("border-bottom-width", "medium", false),
    ("border-left-width", "medium", false),
    ("border-top-color", "currentcolor", false),
    ("border-right-color", "currentcolor", false),
    ("border-bottom-color", "currentcolor", false),
    ("border-left-color", "currentcolor", false),
    ("outline-style", "none", false),
    ("outline-width", "medium", false),
    ("outline-color", "currentcolor", false),
    ("box-sizing", "content-box", false),
    ("overflow-x", "visible", false),
    ("overflow-y", "visible", false),
    ("background-color", "transparent", false),
    ("opacity", "1", false),
    ("z-index", "auto", false),
    ("vertical-align", "baseline", false),
    ("text-decoration-line", "none", false),
    ("content", "normal", false),
    ("transform", "none", false),
    ("font-family", "serif", true),
    ("font-weight", "normal", true),
    ("font-style", "normal", true),
    ("line-height", "normal", true),
    ("text-align", "start", true),
    ("text-transform", "none", true),
    ("text-indent", "0", true),
    ("letter-spacing", "normal", true),
    ("word-spacing", "0", true),
    ("white-space", "normal", true),
    ("visibility", "visible", true),
    ("cursor", "auto", true),
    ("list-style-type", "disc", true),
    ("direction", "ltr", true),
    ("pointer-events", "auto", true),
];

const LENGTH_PROPERTIES: &[&str] = &[
    "top",
    "right",
    "bottom",
    "left",
    "width",
    "height",
    "min-width",
    "min-height",
    "max-width",
    "max-height",
    "margin-top",
    "margin-right",
    "margin-bottom",
    "margin-left",
    "padding-top",
    "padding-right",
    "padding-bottom",
    "padding-left",
    "text-indent",
    "letter-spacing",
    "word-spacing",
];

const COLOR_PROPERTIES: &[&str] = &[
    "background-color",
    "border-top-color",
    "border-right-color",
    "border-bottom-color",
    "border-left-color",
    "outline-color",
];

const UA_STYLESHEET: &str = r#"
html, address, blockquote, body, center, dd, details, dialog, dir, div, dl, dt,
fieldset, figcaption, figure, footer, form, frameset, h1, h2, h3, h4, h5, h6,
header, hgroup, hr, legend, main, menu, nav, ol, p, pre, section, article,
aside, summary, ul, optgroup { display: block }
head, script, style, link, meta, title, template, noscript, base, datalist,
param, area, [hidden], input[type="hidden"], dialog:not([open]) { display: none }
li { display: list-item }
table { display: table; border-spacing: 2px }
caption { display: table-caption; text-align: center }
thead { display: table-header-group }
tbody { display: table-row-group }
tfoot { display: table-footer-group }
tr { display: table-row }
td, th { display: table-cell; padding: 1px }
th { font-weight: bold; text-align: center }
col { display: table-column }
colgroup { display: table-column-group }
button, input, select, textarea, meter, progress { display: inline-block }
body { margin: 8px }
p, dl, multicol { margin-top: 1em; margin-bottom: 1em }
blockquote, figure { margin: 1em 40px }
ul, ol, menu, dir { margin-top: 1em; margin-bottom: 1em; padding-left: 40px }
ol { list-style-type: decimal }
dd { margin-left: 40px }
h1 { font-size: 2em; margin-top: 0.67em; margin-bottom: 0.67em; font-weight: bold }
h2 { font-size: 1.5em; margin-top: 0.83em; margin-bottom: 0.83em; font-weight: bold }
h3 { font-size: 1.17em; margin-top: 1em; margin-bottom: 1em; font-weight: bold }
h4 { margin-top: 1.33em; margin-bottom: 1.33em; font-weight: bold }
h5 { font-size: 0.83em; margin-top: 1.67em; margin-bottom: 1.67em; font-weight: bold }
h6 { font-size: 0.67em; margin-top: 2.33em; margin-bottom: 2.33em; font-weight: bold }
b, strong { font-weight: bolder }
i, cite, em, var, dfn, address { font-style: italic }
pre, code, kbd, samp, tt, xmp, listing, plaintext { font-family: monospace }
pre, xmp, listing, plaintext { white-space: pre; margin-top: 1em; margin-bottom: 1em }
small { font-size: smaller }
big { font-size: larger }
sub { vertical-align: sub; font-size: smaller }
sup { vertical-align: super; font-size: smaller }
center { text-align: center }
a[href] { color: #0000ee; text-decoration-line: underline; cursor: pointer }
u, ins { text-decoration-line: underline }
s, strike, del { text-decoration-line: line-through }
mark { background-color: yellow; color: black }
hr { border: 1px inset; margin: 0.5em auto; color: gray }
fieldset { margin-left: 2px; margin-right: 2px; padding: 0.35em 0.75em 0.625em; border: 2px groove }
iframe { border: 2px inset }
img, svg, video, canvas, iframe, embed, object { vertical-align: baseline }
"#;

fn ua_stylesheet() -> &'static Stylesheet {
    static SHEET: OnceLock<Stylesheet> = OnceLock::new();
    SHEET.get_or_init(|| Stylesheet::parse(UA_STYLESHEET, Viewport::default()))
}

fn property_def(name: &str) -> Option<(&'static str, bool)> {
    PROPERTIES
        .iter()
        .find(|(n, _, _)| *n == name)
        .map(|(_, initial, inherited)| (*initial, *inherited))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Origin {
    UserAgent,
    Author,
    Inline,
}

/// (important, origin, specificity, source order)
type CascadeKey = (bool, Origin, Specificity, usize);

/// Element whose computed style a node inherits from.
pub(crate) fn style_parent(dom: &Dom, node: NodeId) -> Option<NodeId> {
    let parent = dom.parent(node)?;
    match dom.node(parent).kind {
        NodeKind::Element(_) => Some(parent),
        NodeKind::ShadowRoot { host, .. } => Some(host),
        _ => None,
    }
}

/// Resolves computed styles for one snapshot of a document.
///
/// Results are memoized; the resolver must be dropped once the tree changes.
pub(crate) struct StyleResolver<'a> {
    dom: &'a Dom,
    ctx: MatchContext<'a>,
    viewport: Viewport,
    default_font_size: f64,
    external: &'a HashMap<String, String>,
    sheets: HashMap<NodeId, Vec<Stylesheet>>,
    cache: HashMap<(NodeId, Option<PseudoElement>), ComputedStyle>,
}

impl<'a> StyleResolver<'a> {
    pub(crate) fn new(
        dom: &'a Dom,
        focused: Option<NodeId>,
        viewport: Viewport,
        default_font_size: f64,
        external: &'a HashMap<String, String>,
    ) -> Self {
        Self {
            dom,
            ctx: MatchContext::new(dom, focused),
            viewport,
            default_font_size,
            external,
            sheets: HashMap::new(),
            cache: HashMap::new(),
        }
    }

    /// Computed style of an element, `None` for non-element nodes.
    pub(crate) fn computed_style(
        &mut self,
        node: NodeId,
        pseudo: Option<PseudoElement>,
    ) -> Option<&ComputedStyle> {
        if !self.dom.is_element(node) {
            return None;
        }

        // Ancestors first, top-down, so every parent is cached before its child.
        let mut chain = vec![node];
        let mut cursor = style_parent(self.dom, node);
        while let Some(ancestor) = cursor {
            if self.cache.contains_key(&(ancestor, None)) {
                break;
            }
            chain.push(ancestor);
            cursor = style_parent(self.dom, ancestor);
        }
        for id in chain.into_iter().rev() {
            self.ensure(id, None);
        }
        if pseudo.is_some() {
            self.ensure(node, pseudo);
        }
        self.cache.get(&(node, pseudo))
    }

    fn ensure(&mut self, node: NodeId, pseudo: Option<PseudoElement>) {
        if self.cache.contains_key(&(node, pseudo)) {
            return;
        }
        let specified = self.cascade(node, pseudo);
        let is_root = pseudo.is_none() && self.dom.document_element() == Some(node);
        let root_font_size = if is_root {
            self.default_font_size
        } else {
            self.dom
                .document_element()
                .and_then(|root| self.cache.get(&(root, None)))
                .map(ComputedStyle::font_size)
                .unwrap_or(self.default_font_size)
        };
        let env = ComputeEnv {
            default_font_size: self.default_font_size,
            root_font_size,
            viewport: self.viewport,
            pseudo,
            is_root,
        };
        let parent_key = match pseudo {
            Some(_) => Some((node, None)),
            None => style_parent(self.dom, node).map(|p| (p, None)),
        };
        let style = {
            let parent = parent_key.and_then(|key| self.cache.get(&key));
            compute_style(&specified, parent, &env)
        };
        self.cache.insert((node, pseudo), style);
    }

    fn load_scope(&mut self, scope: NodeId) {
        if self.sheets.contains_key(&scope) {
            return;
        }
        let dom = self.dom;
        let mut sheets = Vec::new();
        for el in dom.descendant_elements(scope) {
            let css = if dom.has_tag(el, "style") {
                Some(dom.text_content(el))
            } else if dom.has_tag(el, "link") && is_stylesheet_link(dom, el) {
                dom.attr(el, "href").and_then(|href| self.external.get(href)).cloned()
            } else {
                None
            };
            let Some(css) = css else {
                continue;
            };
            let css = match dom.attr(el, "media").map(str::trim) {
                Some(media) if !media.is_empty() => format!("@media {media} {{{css}}}"),
                _ => css,
            };
            sheets.push(Stylesheet::parse(&css, self.viewport));
        }
        log::debug!("collected {} author stylesheet(s) for scope {:?}", sheets.len(), scope);
        self.sheets.insert(scope, sheets);
    }

    /// Winning specified value per property.
    fn cascade(&mut self, node: NodeId, pseudo: Option<PseudoElement>) -> HashMap<String, String> {
        let scope = self.dom.tree_root(node);
        self.load_scope(scope);

        let inline: Vec<Declaration> = match (pseudo, self.dom.attr(node, "style")) {
            (None, Some(style)) => parse_declarations(style),
            _ => Vec::new(),
        };

        let author = self.sheets.get(&scope).map(Vec::as_slice).unwrap_or(&[]);
        let sheets = std::iter::once((Origin::UserAgent, ua_stylesheet()))
            .chain(author.iter().map(|sheet| (Origin::Author, sheet)));

        let mut matched: Vec<(CascadeKey, &Declaration)> = Vec::new();
        let mut order = 0usize;
        for (origin, sheet) in sheets {
            for rule in &sheet.rules {
                order += 1;
                if rule.pseudo != pseudo {
                    continue;
                }
                let Some(specificity) = rule.selector.matching_specificity(&self.ctx, node) else {
                    continue;
                };
                for decl in &rule.declarations {
                    matched.push(((decl.important, origin, specificity, order), decl));
                }
            }
        }
        for decl in &inline {
            order += 1;
            matched.push(((decl.important, Origin::Inline, Specificity::default(), order), decl));
        }

        matched.sort_by(|a, b| a.0.cmp(&b.0));
        let mut specified = HashMap::new();
        for (_, decl) in matched {
            specified.insert(decl.name.clone(), decl.value.clone());
        }
        specified
    }
}

pub(crate) fn is_stylesheet_link(dom: &Dom, link: NodeId) -> bool {
    dom.attr(link, "rel").is_some_and(|rel| {
        rel.split_ascii_whitespace()
            .any(|token| token.eq_ignore_ascii_case("stylesheet"))
    })
}

struct ComputeEnv {
    default_font_size: f64,
    root_font_size: f64,
    viewport: Viewport,
    pseudo: Option<PseudoElement>,
    is_root: bool,
}

enum Cascaded {
    /// Already computed on the parent.
    Inherited(String),
    Specified(String),
}

fn cascaded_value(
    name: &str,
    specified: &HashMap<String, String>,
    parent: Option<&ComputedStyle>,
    out: &ComputedStyle,
) -> Cascaded {
    let (initial, inherited) = property_def(name).unwrap_or(("", false));
    let from_parent = || {
        parent
            .and_then(|p| p.get(name))
            .map(|v| Cascaded::Inherited(v.to_string()))
            .unwrap_or_else(|| Cascaded::Specified(initial.to_string()))
    };

    let value = specified.get(name).and_then(|v| substitute_vars(v, out));
    let Some(value) = value else {
        return if inherited {
            from_parent()
        } else {
            Cascaded::Specified(initial.to_string())
        };
    };
    match value.to_ascii_lowercase().as_str() {
        "inherit" => from_parent(),
        "initial" => Cascaded::Specified(initial.to_string()),
        "unset" | "revert" => {
            if inherited {
                from_parent()
            } else {
                Cascaded::Specified(initial.to_string())
            }
        }
        _ => Cascaded::Specified(value),
    }
}

fn compute_style(
    specified: &HashMap<String, String>,
    parent: Option<&ComputedStyle>,
    env: &ComputeEnv,
) -> ComputedStyle {
    let mut out = ComputedStyle::default();

    // Custom properties always inherit.
    if let Some(parent) = parent {
        for (name, value) in parent.iter().filter(|(name, _)| name.starts_with("--")) {
            out.set(name, value.to_string());
        }
    }
    for (name, value) in specified.iter().filter(|(name, _)| name.starts_with("--")) {
        match value.to_ascii_lowercase().as_str() {
            "initial" => {
                out.values.remove(name);
            }
            "inherit" | "unset" => {}
            _ => {
                if let Some(value) = substitute_vars(value, &out) {
                    out.set(name, value);
                }
            }
        }
    }

    let parent_font_size = parent.map(ComputedStyle::font_size).unwrap_or(env.default_font_size);
    for (name, _, _) in PROPERTIES {
        let value = match cascaded_value(name, specified, parent, &out) {
            Cascaded::Inherited(value) => value,
            Cascaded::Specified(value) => compute_value(name, &value, &out, parent, parent_font_size, env),
        };
        out.set(name, value);
    }

    // Anything else declared is reported as specified.
    for (name, value) in specified {
        if name.starts_with("--") || property_def(name).is_some() {
            continue;
        }
        if let Some(value) = substitute_vars(value, &out) {
            let value = value.trim().to_string();
            if !value.is_empty() {
                out.set(name, value);
            }
        }
    }
    out
}

fn compute_value(
    name: &str,
    value: &str,
    out: &ComputedStyle,
    parent: Option<&ComputedStyle>,
    parent_font_size: f64,
    env: &ComputeEnv,
) -> String {
    let value = value.trim();
    let lower = value.to_ascii_lowercase();
    let lengths = LengthContext {
        font_size: out.font_size(),
        root_font_size: env.root_font_size,
        viewport_width: env.viewport.width as f64,
        viewport_height: env.viewport.height as f64,
    };

    match name {
        "font-size" => format_px(compute_font_size(&lower, parent_font_size, env)),
        "color" => match lower.as_str() {
            "currentcolor" => parent
                .and_then(|p| p.get("color"))
                .map(str::to_string)
                .unwrap_or_else(|| "rgb(0, 0, 0)".to_string()),
            "canvastext" => "rgb(0, 0, 0)".to_string(),
            _ => normalize_color(value),
        },
        n if COLOR_PROPERTIES.contains(&n) => {
            if lower == "currentcolor" {
                out.get("color").unwrap_or("rgb(0, 0, 0)").to_string()
            } else {
                normalize_color(value)
            }
        }
        n if n.ends_with("-width") && (n.starts_with("border-") || n == "outline-width") => {
            let style = n.replace("-width", "-style");
            if matches!(out.get(&style), Some("none" | "hidden")) {
                return "0px".to_string();
            }
            match lower.as_str() {
                "thin" => "1px".to_string(),
                "medium" => "3px".to_string(),
                "thick" => "5px".to_string(),
                _ => compute_length(value, &lengths),
            }
        }
        "font-weight" => {
            let parent_weight = parent
                .and_then(|p| p.get("font-weight"))
                .and_then(|w| w.parse::<f64>().ok())
                .unwrap_or(400.0);
            let weight = match lower.as_str() {
                "normal" => 400.0,
                "bold" => 700.0,
                "bolder" if parent_weight < 350.0 => 400.0,
                "bolder" if parent_weight < 550.0 => 700.0,
                "bolder" => 900.0,
                "lighter" if parent_weight < 550.0 => 100.0,
                "lighter" if parent_weight < 750.0 => 400.0,
                "lighter" => 700.0,
                other => match other.parse::<f64>() {
                    Ok(w) => w.clamp(1.0, 1000.0),
                    Err(_) => 400.0,
                },
            };
            format_number(weight)
        }
        "line-height" => {
            if lower == "normal" {
                return lower;
            }
            if let Ok(number) = lower.parse::<f64>() {
                return format_number(number);
            }
            match parse_length(&lower, &lengths) {
                Some(Length::Px(px)) => format_px(px),
                Some(Length::Percent(pct)) => format_px(out.font_size() * pct / 100.0),
                None => "normal".to_string(),
            }
        }
        "display" => {
            let positioned = matches!(out.get("position"), Some("absolute" | "fixed"));
            let floated = !matches!(out.get("float"), Some("none") | None);
            if positioned || floated || env.is_root {
                blockify(&lower)
            } else {
                lower
            }
        }
        "float" => {
            if matches!(out.get("position"), Some("absolute" | "fixed")) {
                "none".to_string()
            } else {
                lower
            }
        }
        "content" => {
            if env.pseudo.is_some() && lower == "normal" {
                "none".to_string()
            } else {
                value.to_string()
            }
        }
        "opacity" => match lower.strip_suffix('%') {
            Some(pct) => pct
                .parse::<f64>()
                .map(|p| format_number((p / 100.0).clamp(0.0, 1.0)))
                .unwrap_or_else(|_| "1".to_string()),
            None => lower
                .parse::<f64>()
                .map(|o| format_number(o.clamp(0.0, 1.0)))
                .unwrap_or_else(|_| "1".to_string()),
        },
        "letter-spacing" if lower == "normal" => lower,
        n if LENGTH_PROPERTIES.contains(&n) => compute_length(value, &lengths),
        "font-family" | "transform" => value.to_string(),
        _ => lower,
    }
}

fn compute_font_size(value: &str, parent_font_size: f64, env: &ComputeEnv) -> f64 {
    let medium = env.default_font_size;
    match value {
        "xx-small" => medium * 3.0 / 5.0,
        "x-small" => medium * 3.0 / 4.0,
        "small" => medium * 8.0 / 9.0,
        "medium" => medium,
        "large" => medium * 6.0 / 5.0,
        "x-large" => medium * 3.0 / 2.0,
        "xx-large" => medium * 2.0,
        "xxx-large" => medium * 3.0,
        "larger" => parent_font_size * 1.2,
        "smaller" => parent_font_size / 1.2,
        _ => {
            let ctx = LengthContext {
                font_size: parent_font_size,
                root_font_size: env.root_font_size,
                viewport_width: env.viewport.width as f64,
                viewport_height: env.viewport.height as f64,
            };
            match parse_length(value, &ctx) {
                Some(Length::Px(px)) if px >= 0.0 => px,
                Some(Length::Percent(pct)) if pct >= 0.0 => parent_font_size * pct / 100.0,
                _ => parent_font_size,
            }
        }
    }
}

fn compute_length(value: &str, ctx: &LengthContext) -> String {
    match parse_length(value, ctx) {
        Some(Length::Px(px)) => format_px(px),
        Some(Length::Percent(pct)) => format!("{}%", format_number(pct)),
        None => value.to_ascii_lowercase(),
    }
}

fn normalize_color(value: &str) -> String {
    parse_color(value)
        .map(|c| c.to_css())
        .unwrap_or_else(|| value.to_ascii_lowercase())
}

fn blockify(display: &str) -> String {
    match display {
        "inline" | "inline-block" | "table-row" | "table-cell" | "table-caption" | "table-row-group"
        | "table-header-group" | "table-footer-group" | "table-column" | "table-column-group" => {
            "block".to_string()
        }
        "inline-flex" => "flex".to_string(),
        "inline-grid" => "grid".to_string(),
        "inline-table" => "table".to_string(),
        other => other.to_string(),
    }
}

/// Replace `var(--name[, fallback])` references. `None` when a reference
/// cannot be resolved and has no fallback.
fn substitute_vars(value: &str, custom: &ComputedStyle) -> Option<String> {
    if !value.contains("var(") {
        return Some(value.to_string());
    }
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find("var(") {
        out.push_str(&rest[..start]);
        let args_start = start + 4;
        let mut depth = 1usize;
        let mut close = None;
        for (idx, ch) in rest[args_start..].char_indices() {
            match ch {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        close = Some(args_start + idx);
                        break;
                    }
                }
                _ => {}
            }
        }
        let close = close?;
        let args = &rest[args_start..close];
        let (name, fallback) = match args.split_once(',') {
            Some((name, fallback)) => (name.trim(), Some(fallback.trim())),
            None => (args.trim(), None),
        };
        match custom.get(name) {
            Some(v) => out.push_str(v),
            None => out.push_str(&substitute_vars(fallback?, custom)?),
        }
        rest = &rest[close + 1..];
    }
    out.push_str(rest);
    Some(out)
}
