//! Block and inline layout
//!
//! A small formatting model: block-level boxes stack vertically and adjacent
//! sibling margins collapse; inline content fills lines of the containing
//! block and wraps between words. Text is measured with a fixed advance of
//! half the font size per character. Flex, grid and table boxes are laid out
//! as plain blocks.

use std::collections::HashMap;

use serde::Serialize;

use crate::dom::{Dom, NodeId, NodeKind};
use crate::style::values::px_value;
use crate::style::{ComputedStyle, StyleResolver};
use crate::Viewport;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Edges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Edges {
    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BoxModel {
    pub margin: Edges,
    pub border: Edges,
    pub padding: Edges,
}

/// Layout result for one element
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutBox {
    /// Border box in document coordinates (before any scrolling)
    pub rect: Rect,
    pub box_model: BoxModel,
    pub client_width: f64,
    pub client_height: f64,
    pub scroll_width: f64,
    pub scroll_height: f64,
    /// Inside a `position: fixed` subtree; such boxes ignore viewport scrolling.
    pub fixed: bool,
}

/// Client, offset and scroll sizes of one element
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ElementMetrics {
    pub client_width: f64,
    pub client_height: f64,
    pub offset_width: f64,
    pub offset_height: f64,
    pub scroll_width: f64,
    pub scroll_height: f64,
}

impl ElementMetrics {
    pub(crate) fn from_box(layout: &LayoutBox) -> Self {
        Self {
            client_width: layout.client_width,
            client_height: layout.client_height,
            offset_width: layout.rect.width,
            offset_height: layout.rect.height,
            scroll_width: layout.scroll_width,
            scroll_height: layout.scroll_height,
        }
    }
}

/// Sizes of `<html>` and `<body>`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DocumentMetrics {
    pub html: ElementMetrics,
    pub body: ElementMetrics,
}

impl DocumentMetrics {
    /// Largest of the scroll, offset and client heights of body and html.
    pub fn max_height(&self) -> f64 {
        [
            self.body.scroll_height,
            self.html.scroll_height,
            self.body.offset_height,
            self.html.offset_height,
            self.body.client_height,
            self.html.client_height,
        ]
        .into_iter()
        .fold(0.0, f64::max)
    }

    /// Largest of the scroll, offset and client widths of body and html.
    pub fn max_width(&self) -> f64 {
        [
            self.body.scroll_width,
            self.html.scroll_width,
            self.body.offset_width,
            self.html.offset_width,
            self.body.client_width,
            self.html.client_width,
        ]
        .into_iter()
        .fold(0.0, f64::max)
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct LayoutTree {
    boxes: HashMap<NodeId, LayoutBox>,
    pub(crate) metrics: DocumentMetrics,
}

impl LayoutTree {
    pub(crate) fn get(&self, node: NodeId) -> Option<&LayoutBox> {
        self.boxes.get(&node)
    }
}

/// Lay out the whole document against `viewport`.
pub(crate) fn layout_document<'a>(
    dom: &'a Dom,
    resolver: &mut StyleResolver<'a>,
    viewport: Viewport,
) -> LayoutTree {
    let mut layout = Layout {
        dom,
        resolver,
        viewport,
        boxes: HashMap::new(),
        positioned: Vec::new(),
        extents: Vec::new(),
        fixed_depth: 0,
    };

    let vw = viewport.width as f64;
    let vh = viewport.height as f64;
    layout.extents.push(Extent::default());
    if let Some(html) = dom.document_element() {
        if let Some(style) = layout.style(html) {
            if style.display() != "none" {
                let cb = Containing {
                    width: vw,
                    height: Some(vh),
                };
                layout.layout_block(html, &style, (0.0, 0.0), cb, None);
            }
        }
    }
    let extent = layout.extents.pop().unwrap_or_default();

    let mut metrics = DocumentMetrics::default();
    metrics.html.client_width = vw;
    metrics.html.client_height = vh;
    metrics.html.scroll_width = vw.max(extent.right);
    metrics.html.scroll_height = vh.max(extent.bottom);
    if let Some(html) = dom.document_element().and_then(|h| layout.boxes.get(&h)) {
        metrics.html.offset_width = html.rect.width;
        metrics.html.offset_height = html.rect.height;
    }
    if let Some(body) = dom.body().and_then(|b| layout.boxes.get(&b)) {
        metrics.body = ElementMetrics::from_box(body);
    }

    log::debug!("laid out {} boxes", layout.boxes.len());
    LayoutTree {
        boxes: layout.boxes,
        metrics,
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Extent {
    right: f64,
    bottom: f64,
}

#[derive(Debug, Clone, Copy)]
struct Containing {
    width: f64,
    height: Option<f64>,
}

struct BlockOutcome {
    outer_height: f64,
    margin: Edges,
    rect: Rect,
}

#[derive(Debug, Default)]
struct Line {
    cursor: f64,
    height: f64,
    // Collapsible space waiting for the next item on this line.
    space: f64,
}

/// Inline formatting state of one block container.
struct Flow {
    left: f64,
    width: f64,
    y: f64,
    line: Option<Line>,
    margin_bottom: f64,
    open: Vec<(NodeId, Rect)>,
}

impl Flow {
    fn new(left: f64, width: f64, y: f64) -> Self {
        Self {
            left,
            width,
            y,
            line: None,
            margin_bottom: 0.0,
            open: Vec::new(),
        }
    }

    fn line(&mut self) -> &mut Line {
        self.line.get_or_insert_with(Line::default)
    }

    fn pending_space(&mut self, width: f64) {
        if let Some(line) = &mut self.line {
            if line.cursor > 0.0 {
                line.space = width;
            }
        }
    }

    /// Place an inline item, moving to a new line first when it does not fit.
    fn place(&mut self, width: f64, height: f64, wrap: bool) -> Rect {
        let mut line = self.line.take().unwrap_or_default();
        if wrap && line.cursor > 0.0 && line.cursor + line.space + width > self.width + 0.01 {
            self.y += line.height;
            line = Line::default();
        }
        let rect = Rect {
            x: self.left + line.cursor + line.space,
            y: self.y,
            width,
            height,
        };
        line.cursor += line.space + width;
        line.space = 0.0;
        line.height = line.height.max(height);
        self.line = Some(line);
        self.margin_bottom = 0.0;
        self.union_open(rect);
        rect
    }

    fn advance(&mut self, width: f64) {
        if width != 0.0 {
            let line = self.line();
            line.cursor += line.space + width;
            line.space = 0.0;
        }
    }

    fn grow_line(&mut self, height: f64) {
        let line = self.line();
        line.height = line.height.max(height);
    }

    fn line_break(&mut self, height: f64) {
        let line = self.line.take().unwrap_or_default();
        self.y += if line.height > 0.0 { line.height } else { height };
        self.line = Some(Line::default());
        self.margin_bottom = 0.0;
    }

    fn cursor_rect(&mut self, height: f64) -> Rect {
        let x = self.left + self.line().cursor;
        Rect {
            x,
            y: self.y,
            width: 0.0,
            height,
        }
    }

    fn static_position(&self) -> (f64, f64) {
        match &self.line {
            Some(line) => (self.left + line.cursor, self.y),
            None => (self.left, self.y),
        }
    }

    fn end_line(&mut self) {
        if let Some(line) = self.line.take() {
            self.y += line.height;
        }
    }

    fn finish(mut self) -> f64 {
        self.end_line();
        self.y
    }

    fn union_open(&mut self, rect: Rect) {
        for (_, open) in &mut self.open {
            *open = open.union(&rect);
        }
    }
}

struct Layout<'r, 'a> {
    dom: &'a Dom,
    resolver: &'r mut StyleResolver<'a>,
    viewport: Viewport,
    boxes: HashMap<NodeId, LayoutBox>,
    // Padding boxes of positioned ancestors, innermost last.
    positioned: Vec<Rect>,
    extents: Vec<Extent>,
    fixed_depth: usize,
}

impl<'r, 'a> Layout<'r, 'a> {
    fn style(&mut self, node: NodeId) -> Option<ComputedStyle> {
        self.resolver.computed_style(node, None).cloned()
    }

    fn note_extent(&mut self, rect: &Rect) {
        if let Some(top) = self.extents.last_mut() {
            top.right = top.right.max(rect.right());
            top.bottom = top.bottom.max(rect.bottom());
        }
    }

    fn viewport_rect(&self) -> Rect {
        Rect {
            x: 0.0,
            y: 0.0,
            width: self.viewport.width as f64,
            height: self.viewport.height as f64,
        }
    }

    /// Children taking part in layout: the shadow tree replaces light
    /// children, and slots render what is assigned to them.
    fn rendered_children(&self, node: NodeId) -> Vec<NodeId> {
        let dom = self.dom;
        if let Some((root, _)) = dom.shadow_root(node) {
            return dom.children(root).to_vec();
        }
        if dom.has_tag(node, "template") {
            return Vec::new();
        }
        if dom.has_tag(node, "slot") {
            if let Some(host) = dom.shadow_host(node) {
                let name = dom.attr(node, "name").unwrap_or("");
                let assigned: Vec<NodeId> = dom
                    .children(host)
                    .iter()
                    .copied()
                    .filter(|child| {
                        if dom.is_element(*child) {
                            dom.attr(*child, "slot").unwrap_or("") == name
                        } else {
                            name.is_empty()
                        }
                    })
                    .collect();
                let has_content = assigned
                    .iter()
                    .any(|c| dom.is_element(*c) || dom.text(*c).is_some_and(|t| !t.trim().is_empty()));
                if has_content {
                    return assigned;
                }
            }
        }
        dom.children(node).to_vec()
    }

    fn replaced_size(&self, node: NodeId, style: &ComputedStyle) -> Option<(f64, f64)> {
        let dom = self.dom;
        let attr_px = |name: &str| {
            dom.attr(node, name)
                .and_then(|v| v.trim().trim_end_matches("px").parse::<f64>().ok())
        };
        let advance = char_advance(style);
        let line = line_height(style);
        let size = match dom.tag_name(node)? {
            "img" => (attr_px("width").unwrap_or(0.0), attr_px("height").unwrap_or(0.0)),
            "iframe" | "video" | "canvas" | "embed" | "object" | "svg" => (
                attr_px("width").unwrap_or(300.0),
                attr_px("height").unwrap_or(150.0),
            ),
            "input" => match dom.attr(node, "type").map(str::to_ascii_lowercase).as_deref() {
                Some("checkbox" | "radio") => (13.0, 13.0),
                _ => (advance * 20.0, line),
            },
            "textarea" => (advance * 20.0, line * 2.0),
            "select" => (advance * 10.0, line),
            _ => return None,
        };
        Some(size)
    }

    fn layout_block(
        &mut self,
        node: NodeId,
        style: &ComputedStyle,
        origin: (f64, f64),
        cb: Containing,
        width_hint: Option<f64>,
    ) -> BlockOutcome {
        let position = style.get("position").unwrap_or("static");
        let fixed = position == "fixed";
        if fixed {
            self.fixed_depth += 1;
        }

        let mut margin = edges(style, |side| format!("margin-{side}"), cb.width);
        let border = edges(style, |side| format!("border-{side}-width"), cb.width);
        let padding = non_negative(edges(style, |side| format!("padding-{side}"), cb.width));
        let frame_h = border.horizontal() + padding.horizontal();
        let frame_v = border.vertical() + padding.vertical();
        let border_box = style.get("box-sizing") == Some("border-box");
        let replaced = self.replaced_size(node, style);

        let specified_width = resolve(style, "width", Some(cb.width)).map(|w| {
            if border_box {
                (w - frame_h).max(0.0)
            } else {
                w
            }
        });
        let width = match (specified_width, replaced, width_hint) {
            (Some(w), _, _) => w,
            (None, Some((intrinsic, _)), _) => intrinsic,
            (None, None, Some(hint)) => hint,
            (None, None, None) => (cb.width - margin.horizontal() - frame_h).max(0.0),
        };
        let width = clamp_size(style, ("min-width", "max-width"), width, Some(cb.width), frame_h, border_box);

        if width_hint.is_none() && (specified_width.is_some() || replaced.is_some()) {
            let left_auto = style.get("margin-left") == Some("auto");
            let right_auto = style.get("margin-right") == Some("auto");
            let free = cb.width - width - frame_h;
            if left_auto && right_auto {
                margin.left = (free / 2.0).max(0.0);
                margin.right = margin.left;
            } else if left_auto {
                margin.left = (free - margin.right).max(0.0);
            }
        }

        let (dx, dy) = if position == "relative" {
            relative_offset(style, cb)
        } else {
            (0.0, 0.0)
        };
        let x = origin.0 + margin.left + dx;
        let y = origin.1 + margin.top + dy;
        let content_x = x + border.left + padding.left;
        let content_y = y + border.top + padding.top;

        let specified_height = resolve(style, "height", cb.height).map(|h| {
            if border_box {
                (h - frame_v).max(0.0)
            } else {
                h
            }
        });

        let positioned = position != "static";
        if positioned {
            let height = specified_height
                .map(|h| h + padding.vertical())
                .unwrap_or(self.viewport.height as f64);
            self.positioned.push(Rect {
                x: x + border.left,
                y: y + border.top,
                width: width + padding.horizontal(),
                height,
            });
        }

        self.extents.push(Extent {
            right: content_x,
            bottom: content_y,
        });
        let content_height = match replaced {
            Some((_, intrinsic)) => intrinsic,
            None => {
                let mut flow = Flow::new(content_x, width, content_y);
                let inner = Containing {
                    width,
                    height: specified_height,
                };
                self.flow_children(node, style, &mut flow, inner);
                flow.finish() - content_y
            }
        };
        let extent = self.extents.pop().unwrap_or_default();
        if positioned {
            self.positioned.pop();
        }

        let height = specified_height.unwrap_or(content_height);
        let height = clamp_size(style, ("min-height", "max-height"), height, cb.height, frame_v, border_box);

        let rect = Rect {
            x,
            y,
            width: width + frame_h,
            height: height + frame_v,
        };
        let client_width = width + padding.horizontal();
        let client_height = height + padding.vertical();
        let padding_left = x + border.left;
        let padding_top = y + border.top;
        let layout_box = LayoutBox {
            rect,
            box_model: BoxModel {
                margin,
                border,
                padding,
            },
            client_width,
            client_height,
            scroll_width: client_width.max(extent.right + padding.right - padding_left),
            scroll_height: client_height.max(extent.bottom + padding.bottom - padding_top),
            fixed: self.fixed_depth > 0,
        };
        self.boxes.insert(node, layout_box);

        let clipped = [style.get("overflow-x"), style.get("overflow-y")]
            .iter()
            .any(|o| !matches!(o, Some("visible") | None));
        self.note_extent(&rect);
        if !clipped {
            self.note_extent(&Rect {
                x,
                y,
                width: extent.right - x,
                height: extent.bottom - y,
            });
        }

        if fixed {
            self.fixed_depth -= 1;
        }
        BlockOutcome {
            outer_height: margin.top + rect.height + margin.bottom,
            margin,
            rect,
        }
    }

    fn flow_children(&mut self, parent: NodeId, style: &ComputedStyle, flow: &mut Flow, cb: Containing) {
        let dom = self.dom;
        for child in self.rendered_children(parent) {
            match &dom.node(child).kind {
                NodeKind::Text(text) => self.flow_text(text, style, flow),
                NodeKind::Element(_) => self.flow_element(child, flow, cb),
                _ => {}
            }
        }
    }

    fn flow_text(&mut self, text: &str, style: &ComputedStyle, flow: &mut Flow) {
        let advance = char_advance(style);
        let height = line_height(style);
        let white_space = style.get("white-space").unwrap_or("normal");

        if matches!(white_space, "pre" | "pre-wrap" | "pre-line" | "break-spaces") {
            for (idx, segment) in text.split('\n').enumerate() {
                if idx > 0 {
                    flow.line_break(height);
                }
                if segment.is_empty() {
                    continue;
                }
                let width = segment.chars().count() as f64 * advance;
                let rect = flow.place(width, height, white_space != "pre");
                self.note_extent(&rect);
            }
            return;
        }

        let wrap = white_space != "nowrap";
        let is_space = |c: char| c.is_ascii_whitespace();
        if text.starts_with(is_space) {
            flow.pending_space(advance);
        }
        let mut placed = false;
        for (idx, word) in text.split_ascii_whitespace().enumerate() {
            if idx > 0 {
                flow.pending_space(advance);
            }
            let width = word.chars().count() as f64 * advance;
            let rect = flow.place(width, height, wrap);
            self.note_extent(&rect);
            placed = true;
        }
        if placed && text.ends_with(is_space) {
            flow.pending_space(advance);
        }
    }

    fn flow_element(&mut self, node: NodeId, flow: &mut Flow, cb: Containing) {
        let Some(style) = self.style(node) else {
            return;
        };
        let display = style.display().to_string();
        if display == "none" {
            return;
        }

        if matches!(style.get("position"), Some("absolute" | "fixed")) {
            let static_position = flow.static_position();
            self.layout_absolute(node, &style, static_position);
            return;
        }

        if self.dom.has_tag(node, "br") {
            flow.line_break(line_height(&style));
            return;
        }

        if is_block_level(&display) {
            flow.end_line();
            let margin_top = resolve(&style, "margin-top", Some(flow.width)).unwrap_or(0.0);
            let overlap = if flow.margin_bottom > 0.0 && margin_top > 0.0 {
                flow.margin_bottom.min(margin_top)
            } else {
                0.0
            };
            let containing = Containing {
                width: flow.width,
                height: cb.height,
            };
            let outcome = self.layout_block(node, &style, (flow.left, flow.y - overlap), containing, None);
            flow.y = flow.y - overlap + outcome.outer_height;
            flow.margin_bottom = outcome.margin.bottom;
            flow.union_open(outcome.rect);
            return;
        }

        if is_atomic_inline(&display) || self.replaced_size(node, &style).is_some() {
            self.flow_atomic(node, &style, flow, cb);
            return;
        }

        if display == "contents" {
            self.flow_children(node, &style, flow, cb);
            return;
        }

        self.flow_inline(node, &style, flow, cb);
    }

    fn flow_inline(&mut self, node: NodeId, style: &ComputedStyle, flow: &mut Flow, cb: Containing) {
        let margin = edges(style, |side| format!("margin-{side}"), flow.width);
        let border = edges(style, |side| format!("border-{side}-width"), flow.width);
        let padding = non_negative(edges(style, |side| format!("padding-{side}"), flow.width));
        let height = line_height(style);

        flow.advance(margin.left);
        let start = flow.cursor_rect(height);
        flow.advance(border.left + padding.left);
        flow.open.push((node, start));

        self.flow_children(node, style, flow, cb);

        flow.advance(border.right + padding.right);
        let end = flow.cursor_rect(height);
        let rect = match flow.open.pop() {
            Some((_, rect)) => rect.union(&end),
            None => start.union(&end),
        };
        flow.advance(margin.right);
        flow.union_open(rect);
        self.note_extent(&rect);

        let client_width = (rect.width - border.horizontal()).max(0.0);
        let client_height = (rect.height - border.vertical()).max(0.0);
        self.boxes.insert(
            node,
            LayoutBox {
                rect,
                box_model: BoxModel {
                    margin,
                    border,
                    padding,
                },
                client_width,
                client_height,
                scroll_width: client_width,
                scroll_height: client_height,
                fixed: self.fixed_depth > 0,
            },
        );
    }

    fn flow_atomic(&mut self, node: NodeId, style: &ComputedStyle, flow: &mut Flow, cb: Containing) {
        let margin = edges(style, |side| format!("margin-{side}"), flow.width);
        let border = edges(style, |side| format!("border-{side}-width"), flow.width);
        let padding = non_negative(edges(style, |side| format!("padding-{side}"), flow.width));
        let frame_h = border.horizontal() + padding.horizontal();

        let width = match resolve(style, "width", Some(flow.width)) {
            Some(w) if style.get("box-sizing") == Some("border-box") => (w - frame_h).max(0.0),
            Some(w) => w,
            None => match self.replaced_size(node, style) {
                Some((intrinsic, _)) => intrinsic,
                None => self
                    .max_content_width(node, style)
                    .min((flow.width - margin.horizontal() - frame_h).max(0.0)),
            },
        };

        let slot = flow.place(width + frame_h + margin.horizontal(), 0.0, true);
        let containing = Containing {
            width: flow.width,
            height: cb.height,
        };
        let outcome = self.layout_block(node, style, (slot.x, slot.y), containing, Some(width));
        flow.grow_line(outcome.outer_height);
        flow.union_open(outcome.rect);
    }

    fn layout_absolute(&mut self, node: NodeId, style: &ComputedStyle, static_position: (f64, f64)) {
        let viewport = self.viewport_rect();
        let cb = if style.get("position") == Some("fixed") {
            viewport
        } else {
            self.positioned.last().copied().unwrap_or(viewport)
        };

        let left = resolve(style, "left", Some(cb.width));
        let right = resolve(style, "right", Some(cb.width));
        let top = resolve(style, "top", Some(cb.height));
        let bottom = resolve(style, "bottom", Some(cb.height));

        let margin = edges(style, |side| format!("margin-{side}"), cb.width);
        let border = edges(style, |side| format!("border-{side}-width"), cb.width);
        let padding = non_negative(edges(style, |side| format!("padding-{side}"), cb.width));
        let frame_h = border.horizontal() + padding.horizontal();
        let frame_v = border.vertical() + padding.vertical();
        let border_box = style.get("box-sizing") == Some("border-box");

        let width = match resolve(style, "width", Some(cb.width)) {
            Some(w) if border_box => (w - frame_h).max(0.0),
            Some(w) => w,
            None => match (self.replaced_size(node, style), left, right) {
                (Some((intrinsic, _)), _, _) => intrinsic,
                (None, Some(l), Some(r)) => (cb.width - l - r - margin.horizontal() - frame_h).max(0.0),
                _ => self
                    .max_content_width(node, style)
                    .min((cb.width - margin.horizontal() - frame_h).max(0.0)),
            },
        };
        let outer_width = width + frame_h + margin.horizontal();

        let x = match (left, right) {
            (Some(l), _) => cb.x + l,
            (None, Some(r)) => cb.x + cb.width - r - outer_width,
            _ => static_position.0,
        };
        let height = resolve(style, "height", Some(cb.height)).map(|h| if border_box { h } else { h + frame_v });
        let y = match (top, bottom, height) {
            (Some(t), _, _) => cb.y + t,
            (None, Some(b), Some(h)) => cb.y + cb.height - b - h - margin.vertical(),
            _ => static_position.1,
        };

        let containing = Containing {
            width: cb.width,
            height: Some(cb.height),
        };
        self.layout_block(node, style, (x, y), containing, Some(width));
    }

    /// Width of the content laid out on a single unbroken line.
    fn max_content_width(&mut self, node: NodeId, style: &ComputedStyle) -> f64 {
        if let Some((width, _)) = self.replaced_size(node, style) {
            return width;
        }
        let dom = self.dom;
        let mut widest: f64 = 0.0;
        let mut line: f64 = 0.0;
        for child in self.rendered_children(node) {
            match &dom.node(child).kind {
                NodeKind::Text(text) => {
                    let words: Vec<&str> = text.split_ascii_whitespace().collect();
                    let chars = words.join(" ").chars().count();
                    line += chars as f64 * char_advance(style);
                }
                NodeKind::Element(_) => {
                    let Some(child_style) = self.style(child) else {
                        continue;
                    };
                    let display = child_style.display().to_string();
                    if display == "none" || matches!(child_style.get("position"), Some("absolute" | "fixed")) {
                        continue;
                    }
                    if dom.has_tag(child, "br") {
                        widest = widest.max(line);
                        line = 0.0;
                        continue;
                    }
                    let frame = edges(&child_style, |side| format!("margin-{side}"), 0.0).horizontal()
                        + edges(&child_style, |side| format!("border-{side}-width"), 0.0).horizontal()
                        + edges(&child_style, |side| format!("padding-{side}"), 0.0).horizontal();
                    let inner = match child_style.px("width") {
                        Some(w) => w,
                        None => self.max_content_width(child, &child_style),
                    };
                    if is_block_level(&display) {
                        widest = widest.max(line).max(inner + frame);
                        line = 0.0;
                    } else {
                        line += inner + frame;
                    }
                }
                _ => {}
            }
        }
        widest.max(line)
    }
}

fn is_block_level(display: &str) -> bool {
    matches!(
        display,
        "block"
            | "list-item"
            | "flow-root"
            | "flex"
            | "grid"
            | "table"
            | "table-row"
            | "table-cell"
            | "table-caption"
            | "table-row-group"
            | "table-header-group"
            | "table-footer-group"
            | "table-column"
            | "table-column-group"
    )
}

fn is_atomic_inline(display: &str) -> bool {
    matches!(display, "inline-block" | "inline-flex" | "inline-grid" | "inline-table")
}

fn char_advance(style: &ComputedStyle) -> f64 {
    style.font_size() * 0.5
}

fn line_height(style: &ComputedStyle) -> f64 {
    let font_size = style.font_size();
    match style.get("line-height") {
        Some(value) => px_value(value)
            .or_else(|| value.parse::<f64>().ok().map(|n| n * font_size))
            .unwrap_or(font_size * 1.2),
        None => font_size * 1.2,
    }
}

/// A computed `px` or percentage value against `base`.
fn resolve(style: &ComputedStyle, property: &str, base: Option<f64>) -> Option<f64> {
    let value = style.get(property)?;
    if let Some(px) = px_value(value) {
        return Some(px);
    }
    let pct = value.strip_suffix('%')?.trim().parse::<f64>().ok()?;
    base.map(|b| b * pct / 100.0)
}

fn edges(style: &ComputedStyle, property: impl Fn(&str) -> String, base: f64) -> Edges {
    let side = |name: &str| resolve(style, &property(name), Some(base)).unwrap_or(0.0);
    Edges {
        top: side("top"),
        right: side("right"),
        bottom: side("bottom"),
        left: side("left"),
    }
}

fn non_negative(edges: Edges) -> Edges {
    Edges {
        top: edges.top.max(0.0),
        right: edges.right.max(0.0),
        bottom: edges.bottom.max(0.0),
        left: edges.left.max(0.0),
    }
}

fn clamp_size(
    style: &ComputedStyle,
    (min, max): (&str, &str),
    value: f64,
    base: Option<f64>,
    frame: f64,
    border_box: bool,
) -> f64 {
    let adjust = |v: f64| if border_box { (v - frame).max(0.0) } else { v };
    let mut value = value;
    if let Some(max) = resolve(style, max, base) {
        value = value.min(adjust(max));
    }
    if let Some(min) = resolve(style, min, base) {
        value = value.max(adjust(min));
    }
    value
}

fn relative_offset(style: &ComputedStyle, cb: Containing) -> (f64, f64) {
    let dx = match resolve(style, "left", Some(cb.width)) {
        Some(left) => left,
        None => -resolve(style, "right", Some(cb.width)).unwrap_or(0.0),
    };
    let dy = match resolve(style, "top", cb.height) {
        Some(top) => top,
        None => -resolve(style, "bottom", cb.height).unwrap_or(0.0),
    };
    (dx, dy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse::parse_document;

    const EPSILON: f64 = 1e-6;

    fn layout(html: &str) -> (Dom, LayoutTree) {
        let dom = parse_document(html);
        let external = HashMap::new();
        let viewport = Viewport {
            width: 800,
            height: 600,
        };
        let tree = {
            let mut resolver = StyleResolver::new(&dom, None, viewport, 16.0, &external);
            layout_document(&dom, &mut resolver, viewport)
        };
        (dom, tree)
    }

    fn by_id(dom: &Dom, id: &str) -> NodeId {
        (0..dom.len())
            .map(NodeId)
            .find(|n| dom.attr(*n, "id") == Some(id))
            .expect("element with id")
    }

    fn rect(dom: &Dom, tree: &LayoutTree, id: &str) -> Rect {
        tree.get(by_id(dom, id)).expect("laid out").rect
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn blocks_stack_inside_body_margin() {
        let (dom, tree) = layout(
            r#"<div id=a style="height:50px"></div><div id=b style="height:20px;margin-top:10px"></div>"#,
        );
        let a = rect(&dom, &tree, "a");
        assert_eq!(a, Rect { x: 8.0, y: 8.0, width: 784.0, height: 50.0 });
        let b = rect(&dom, &tree, "b");
        assert!(close(b.y, 68.0));
    }

    #[test]
    fn sibling_margins_collapse() {
        let (dom, tree) = layout("<p id=p1>one</p><p id=p2>two</p>");
        let p1 = rect(&dom, &tree, "p1");
        let p2 = rect(&dom, &tree, "p2");
        assert!(close(p1.y, 24.0));
        assert!(close(p1.height, 19.2));
        assert!(close(p2.y - p1.bottom(), 16.0));
    }

    #[test]
    fn inline_text_wraps_between_words() {
        let (dom, tree) = layout(
            r#"<div style="width:60px;font-size:10px"><span id=s>aaaa bbbb cccc dddd</span></div>"#,
        );
        let span = rect(&dom, &tree, "s");
        assert!(close(span.x, 8.0));
        assert!(close(span.width, 45.0));
        assert!(close(span.height, 24.0));
    }

    #[test]
    fn absolute_boxes_use_positioned_ancestor() {
        let (dom, tree) = layout(
            r#"<div style="position:relative;margin-top:100px;height:200px">
                 <div id=abs style="position:absolute;top:10px;left:20px;width:30px;height:40px"></div>
               </div>"#,
        );
        assert_eq!(
            rect(&dom, &tree, "abs"),
            Rect { x: 28.0, y: 118.0, width: 30.0, height: 40.0 }
        );
    }

    #[test]
    fn relative_offset_moves_box_only() {
        let (dom, tree) = layout(
            r#"<div id=r style="position:relative;top:5px;left:-3px;height:10px"></div><div id=n style="height:10px"></div>"#,
        );
        let r = rect(&dom, &tree, "r");
        assert!(close(r.x, 5.0) && close(r.y, 13.0));
        assert!(close(rect(&dom, &tree, "n").y, 18.0));
    }

    #[test]
    fn hidden_elements_have_no_box() {
        let (dom, tree) = layout(r#"<div id=gone style="display:none"><p id=inner>x</p></div>"#);
        assert!(tree.get(by_id(&dom, "gone")).is_none());
        assert!(tree.get(by_id(&dom, "inner")).is_none());
    }

    #[test]
    fn scroll_sizes_track_overflowing_content() {
        let (dom, tree) = layout(
            r#"<div id=scroller style="height:100px;overflow:auto"><div style="height:300px"></div></div>"#,
        );
        let scroller = tree.get(by_id(&dom, "scroller")).expect("laid out");
        assert!(close(scroller.client_height, 100.0));
        assert!(close(scroller.scroll_height, 300.0));
    }

    #[test]
    fn document_metrics_cover_viewport_and_content() {
        let (_, tree) = layout(r#"<div style="height:2000px"></div>"#);
        let metrics = tree.metrics;
        assert!(close(metrics.html.client_width, 800.0));
        assert!(close(metrics.html.client_height, 600.0));
        assert!(close(metrics.body.offset_height, 2000.0));
        assert!(close(metrics.max_height(), 2016.0));
        assert!(close(metrics.max_width(), 800.0));
    }

    #[test]
    fn replaced_elements_use_attributes() {
        let (dom, tree) = layout(r#"<img id=i width=120 height=40><iframe id=f></iframe>"#);
        let img = rect(&dom, &tree, "i");
        assert!(close(img.width, 120.0) && close(img.height, 40.0));
        let frame = rect(&dom, &tree, "f");
        assert!(close(frame.width, 304.0));
        assert!(close(frame.x, img.right()));
    }
}
