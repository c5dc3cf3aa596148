//! HTML serialization (`outerHTML` / `innerHTML`)

use super::{Dom, NodeId, NodeKind};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext",
];

pub(crate) fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

pub(crate) fn start_tag(dom: &Dom, id: NodeId) -> String {
    let Some(element) = dom.element(id) else {
        return String::new();
    };
    let mut out = format!("<{}", element.tag_name);
    for (name, value) in &element.attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape_attr(value));
        out.push('"');
    }
    out.push('>');
    out
}

/// Closing tag, `None` for void elements.
pub(crate) fn end_tag(dom: &Dom, id: NodeId) -> Option<String> {
    let tag = dom.tag_name(id)?;
    if is_void(tag) {
        None
    } else {
        Some(format!("</{}>", tag))
    }
}

pub(crate) fn outer_html(dom: &Dom, id: NodeId) -> String {
    let mut out = String::new();
    write_node(dom, id, &mut out);
    out
}

pub(crate) fn inner_html(dom: &Dom, id: NodeId) -> String {
    let mut out = String::new();
    for child in dom.children(id) {
        write_node(dom, *child, &mut out);
    }
    out
}

fn write_node(dom: &Dom, id: NodeId, out: &mut String) {
    match &dom.node(id).kind {
        NodeKind::Element(_) => {
            out.push_str(&start_tag(dom, id));
            if let Some(end) = end_tag(dom, id) {
                for child in dom.children(id) {
                    write_node(dom, *child, out);
                }
                out.push_str(&end);
            }
        }
        NodeKind::Text(text) => {
            let raw = dom
                .parent(id)
                .and_then(|p| dom.tag_name(p))
                .is_some_and(|t| RAW_TEXT_ELEMENTS.contains(&t));
            if raw {
                out.push_str(text);
            } else {
                out.push_str(&escape_text(text));
            }
        }
        NodeKind::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeKind::Document | NodeKind::ShadowRoot { .. } => {
            for child in dom.children(id) {
                write_node(dom, *child, out);
            }
        }
    }
}

pub(crate) fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse::parse_document;

    #[test]
    fn serializes_elements_and_escapes() {
        let dom = parse_document(r#"<p class="x">a &amp; b<br><img alt='"q"'></p>"#);
        let p = dom.element_children(dom.body().unwrap())[0];
        assert_eq!(
            outer_html(&dom, p),
            r#"<p class="x">a &amp; b<br><img alt="&quot;q&quot;"></p>"#
        );
        assert_eq!(inner_html(&dom, p), r#"a &amp; b<br><img alt="&quot;q&quot;">"#);
    }

    #[test]
    fn raw_text_is_not_escaped() {
        let dom = parse_document("<script>if (a < b) {}</script>");
        let head = dom.head().unwrap();
        let script = dom.element_children(head)[0];
        assert_eq!(outer_html(&dom, script), "<script>if (a < b) {}</script>");
    }
}
