//! Bridge from `scraper` (html5ever) output into the document arena

use super::{Dom, ElementData, Namespace, NodeId, NodeKind, ShadowRootMode};
use scraper::Html;

/// Parse a full HTML document.
///
/// Declarative shadow roots (`<template shadowrootmode>`, or the older
/// `shadowroot` attribute) are attached to their parent element instead of
/// being kept as template elements.
pub(crate) fn parse_document(html: &str) -> Dom {
    let document = Html::parse_document(html);
    let mut dom = Dom::new();
    let root = dom.root();
    import(&mut dom, &document, root, false);
    log::debug!("parsed document into {} nodes", dom.len());
    dom
}

/// Parse `html` as a fragment and append its nodes to `parent`.
pub(crate) fn append_fragment(dom: &mut Dom, parent: NodeId, html: &str) {
    let fragment = Html::parse_fragment(html);
    import(dom, &fragment, parent, true);
}

/// Copy the nodes of `source` under `root`. Fragments skip the `<html>`
/// wrapper html5ever puts around them.
fn import(dom: &mut Dom, source: &Html, root: NodeId, fragment: bool) {
    let top: Vec<_> = if fragment {
        source.root_element().children().collect()
    } else {
        source.tree.root().children().collect()
    };
    let mut stack = Vec::with_capacity(top.len());
    for child in top.into_iter().rev() {
        stack.push((child, root, Namespace::Html));
    }

    while let Some((node, parent, parent_ns)) = stack.pop() {
        let created = match node.value() {
            scraper::Node::Element(el) => {
                let name = el.name();
                if name.eq_ignore_ascii_case("template") && dom.is_element(parent) {
                    let mode = el
                        .attrs()
                        .find(|(k, _)| {
                            k.eq_ignore_ascii_case("shadowrootmode") || k.eq_ignore_ascii_case("shadowroot")
                        })
                        .and_then(|(_, v)| ShadowRootMode::parse(v));
                    if let Some(mode) = mode {
                        if let Some(shadow) = dom.attach_shadow(parent, mode) {
                            let children: Vec<_> = node.children().collect();
                            for child in children.into_iter().rev() {
                                stack.push((child, shadow, Namespace::Html));
                            }
                            continue;
                        }
                    }
                }

                let namespace = element_namespace(dom, parent, parent_ns, name);
                let mut data = ElementData::new(name, namespace);
                data.attrs = el
                    .attrs()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect();
                Some((dom.append(parent, NodeKind::Element(data)), namespace))
            }
            scraper::Node::Text(text) => {
                dom.append(parent, NodeKind::Text(text.text.to_string()));
                None
            }
            scraper::Node::Comment(comment) => {
                dom.append(parent, NodeKind::Comment(comment.comment.to_string()));
                None
            }
            // Template contents live under a fragment node; splice them in.
            scraper::Node::Fragment => {
                let children: Vec<_> = node.children().collect();
                for child in children.into_iter().rev() {
                    stack.push((child, parent, parent_ns));
                }
                None
            }
            _ => None,
        };

        if let Some((id, namespace)) = created {
            let children: Vec<_> = node.children().collect();
            for child in children.into_iter().rev() {
                stack.push((child, id, namespace));
            }
        }
    }
}

fn element_namespace(dom: &Dom, parent: NodeId, parent_ns: Namespace, name: &str) -> Namespace {
    match parent_ns {
        Namespace::Html => {
            if name.eq_ignore_ascii_case("svg") {
                Namespace::Svg
            } else if name.eq_ignore_ascii_case("math") {
                Namespace::MathMl
            } else {
                Namespace::Html
            }
        }
        // HTML integration points switch back to the HTML namespace
        Namespace::Svg => {
            if ["foreignObject", "desc", "title"]
                .iter()
                .any(|t| dom.tag_name(parent) == Some(*t))
            {
                Namespace::Html
            } else {
                Namespace::Svg
            }
        }
        Namespace::MathMl => {
            if dom.tag_name(parent) == Some("annotation-xml") {
                Namespace::Html
            } else {
                Namespace::MathMl
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_into_html_head_body() {
        let dom = parse_document("<title>T</title><p id=x class='a b'>Hi<!-- note --></p>");
        let html = dom.document_element().unwrap();
        assert_eq!(dom.tag_name(html), Some("html"));
        let body = dom.body().unwrap();
        let p = dom.element_children(body)[0];
        assert_eq!(dom.attr(p, "id"), Some("x"));
        assert!(dom.element(p).unwrap().has_class("b"));
        assert_eq!(dom.children(p).len(), 2);
        assert_eq!(dom.text_content(p), "Hi");
    }

    #[test]
    fn attribute_order_is_preserved() {
        let dom = parse_document("<div zeta=1 alpha=2 mid=3></div>");
        let div = dom.element_children(dom.body().unwrap())[0];
        let names: Vec<_> = dom
            .element(div)
            .unwrap()
            .attrs
            .iter()
            .map(|(k, _)| k.as_str())
            .collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn svg_subtree_gets_svg_namespace() {
        let dom = parse_document(
            "<svg><circle></circle><foreignObject><div></div></foreignObject></svg>",
        );
        let svg = dom.element_children(dom.body().unwrap())[0];
        let kids = dom.element_children(svg);
        assert_eq!(dom.element(svg).unwrap().namespace, Namespace::Svg);
        assert_eq!(dom.element(kids[0]).unwrap().namespace, Namespace::Svg);
        let div = dom.element_children(kids[1])[0];
        assert_eq!(dom.element(div).unwrap().namespace, Namespace::Html);
    }

    #[test]
    fn declarative_shadow_root_is_attached() {
        let dom = parse_document(
            "<div id=host><template shadowrootmode=open><span>inside</span></template><i>light</i></div>",
        );
        let host = dom.element_children(dom.body().unwrap())[0];
        let (root, mode) = dom.shadow_root(host).unwrap();
        assert_eq!(mode, ShadowRootMode::Open);
        assert_eq!(dom.text_content(root), "inside");
        assert_eq!(dom.element_children(host).len(), 1);
        assert_eq!(dom.text_content(host), "light");
    }

    #[test]
    fn legacy_shadowroot_attribute_keeps_nested_content() {
        let dom = parse_document(
            "<section><template shadowroot=closed><ul><li>one</li><li>two</li></ul></template></section>",
        );
        let host = dom.element_children(dom.body().unwrap())[0];
        let (root, mode) = dom.shadow_root(host).unwrap();
        assert_eq!(mode, ShadowRootMode::Closed);
        let list = dom.element_children(root);
        assert_eq!(list.len(), 1);
        assert_eq!(dom.tag_name(list[0]), Some("ul"));
        assert_eq!(dom.element_children(list[0]).len(), 2);
        assert_eq!(dom.text_content(root), "onetwo");
    }

    #[test]
    fn plain_template_content_stays_under_the_template() {
        let dom = parse_document("<template id=t><p>kept</p></template>");
        let template = dom
            .all_elements()
            .find(|n| dom.tag_name(*n) == Some("template"))
            .unwrap();
        let kids = dom.element_children(template);
        assert_eq!(kids.len(), 1);
        assert_eq!(dom.tag_name(kids[0]), Some("p"));
    }

    #[test]
    fn fragment_is_appended_without_wrapper() {
        let mut dom = parse_document("<div></div>");
        let div = dom.element_children(dom.body().unwrap())[0];
        append_fragment(&mut dom, div, "<b>bold</b> tail<i></i>");
        let kids = dom.element_children(div);
        assert_eq!(kids.len(), 2);
        assert_eq!(dom.tag_name(kids[0]), Some("b"));
        assert_eq!(dom.text_content(div), "bold tail");
    }
}
