//! Minimal CSS stylesheet parser
//!
//! Handles style rules, `!important`, comments, `@media` blocks evaluated
//! against the viewport, and the common box shorthands. Rules whose selector
//! list contains anything the selector engine does not support are dropped
//! as a whole, as browsers do.

use super::values::parse_color;
use crate::selector::{split_selector_list, SelectorList};
use crate::Viewport;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Declaration {
    pub(crate) name: String,
    pub(crate) value: String,
    pub(crate) important: bool,
}

/// Pseudo-elements that carry their own computed style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PseudoElement {
    Before,
    After,
}

impl PseudoElement {
    /// Parse `::before`, `:before`, `before` (any case).
    pub fn parse(value: &str) -> Option<Self> {
        let name = value.trim().trim_start_matches(':').to_ascii_lowercase();
        match name.as_str() {
            "before" => Some(PseudoElement::Before),
            "after" => Some(PseudoElement::After),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct StyleRule {
    pub(crate) selector: SelectorList,
    pub(crate) pseudo: Option<PseudoElement>,
    pub(crate) declarations: Vec<Declaration>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Stylesheet {
    pub(crate) rules: Vec<StyleRule>,
}

impl Stylesheet {
    pub(crate) fn parse(css: &str, viewport: Viewport) -> Self {
        let css = strip_comments(css);
        let mut rules = Vec::new();
        parse_rules(&css, viewport, &mut rules);
        Stylesheet { rules }
    }
}

fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

/// Index of the `}` closing the block opened at `open`.
fn matching_brace(src: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (idx, ch) in src[open..].char_indices() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + idx);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_rules(src: &str, viewport: Viewport, rules: &mut Vec<StyleRule>) {
    let mut rest = src;
    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            return;
        }

        let brace = rest.find('{');
        if rest.starts_with('@') {
            let semi = rest.find(';');
            let statement_end = match (semi, brace) {
                (Some(s), Some(b)) if s < b => Some(s),
                (Some(s), None) => Some(s),
                _ => None,
            };
            if let Some(end) = statement_end {
                // @import, @charset, @namespace
                rest = &rest[end + 1..];
                continue;
            }
        }

        let Some(brace) = brace else {
            return;
        };
        let Some(close) = matching_brace(rest, brace) else {
            log::debug!("unterminated CSS block, ignoring the remainder");
            return;
        };
        let prelude = rest[..brace].trim();
        let body = &rest[brace + 1..close];

        if let Some(at_rule) = prelude.strip_prefix('@') {
            let lower = at_rule.to_ascii_lowercase();
            if let Some(query) = lower.strip_prefix("media") {
                if media_matches(query, viewport) {
                    parse_rules(body, viewport, rules);
                }
            } else if lower.starts_with("supports") {
                parse_rules(body, viewport, rules);
            }
        } else {
            push_style_rule(prelude, body, rules);
        }

        rest = &rest[close + 1..];
    }
}

fn push_style_rule(prelude: &str, body: &str, rules: &mut Vec<StyleRule>) {
    let Some(selectors) = split_selector_list(prelude) else {
        log::debug!("skipping rule with malformed selector list {:?}", prelude);
        return;
    };

    let mut parsed = Vec::with_capacity(selectors.len());
    for selector in &selectors {
        let Some((base, pseudo)) = split_pseudo_element(selector) else {
            log::debug!("skipping rule with unsupported pseudo-element {:?}", selector);
            return;
        };
        match SelectorList::parse(&base) {
            Ok(list) => parsed.push((list, pseudo)),
            Err(_) => {
                log::debug!("skipping rule with unsupported selector {:?}", selector);
                return;
            }
        }
    }

    let declarations = parse_declarations(body);
    if declarations.is_empty() {
        return;
    }
    for (selector, pseudo) in parsed {
        rules.push(StyleRule {
            selector,
            pseudo,
            declarations: declarations.clone(),
        });
    }
}

/// Split a trailing pseudo-element off a selector. `None` when the
/// pseudo-element is not one we compute styles for.
fn split_pseudo_element(selector: &str) -> Option<(String, Option<PseudoElement>)> {
    let lower = selector.to_ascii_lowercase();
    if let Some(pos) = lower.find("::") {
        let pseudo = PseudoElement::parse(&lower[pos..])?;
        return Some((base_or_universal(&selector[..pos]), Some(pseudo)));
    }
    for (suffix, pseudo) in [(":before", PseudoElement::Before), (":after", PseudoElement::After)] {
        if lower.ends_with(suffix) {
            let base = &selector[..selector.len() - suffix.len()];
            return Some((base_or_universal(base), Some(pseudo)));
        }
    }
    Some((selector.to_string(), None))
}

fn base_or_universal(base: &str) -> String {
    let base = base.trim();
    if base.is_empty() || base.ends_with(|c: char| c.is_whitespace() || matches!(c, '>' | '+' | '~')) {
        format!("{base}*")
    } else {
        base.to_string()
    }
}

fn media_matches(query: &str, viewport: Viewport) -> bool {
    query
        .split(',')
        .any(|single| single_media_matches(single.trim(), viewport))
}

fn single_media_matches(query: &str, viewport: Viewport) -> bool {
    if query.is_empty() {
        return true;
    }
    let (negate, query) = match query.strip_prefix("not ") {
        Some(rest) => (true, rest.trim()),
        None => (false, query.strip_prefix("only ").unwrap_or(query).trim()),
    };

    let mut matched = true;
    for part in query.split(" and ") {
        let part = part.trim();
        let ok = match part {
            "all" | "screen" | "" => true,
            "print" | "speech" => false,
            feature if feature.starts_with('(') && feature.ends_with(')') => {
                media_feature_matches(&feature[1..feature.len() - 1], viewport)
            }
            _ => false,
        };
        matched &= ok;
    }
    matched != negate
}

fn media_feature_matches(feature: &str, viewport: Viewport) -> bool {
    let Some((name, value)) = feature.split_once(':') else {
        return false;
    };
    let name = name.trim();
    let value = value.trim();
    let px = value
        .strip_suffix("px")
        .and_then(|v| v.trim().parse::<f64>().ok())
        .or_else(|| value.strip_suffix("em").and_then(|v| v.trim().parse::<f64>().ok()).map(|v| v * 16.0));
    let width = viewport.width as f64;
    let height = viewport.height as f64;
    match (name, px) {
        ("min-width", Some(px)) => width >= px,
        ("max-width", Some(px)) => width <= px,
        ("min-height", Some(px)) => height >= px,
        ("max-height", Some(px)) => height <= px,
        ("orientation", _) => match value {
            "portrait" => height >= width,
            "landscape" => width > height,
            _ => false,
        },
        _ => false,
    }
}

/// Parse the body of a rule or an inline `style` attribute.
pub(crate) fn parse_declarations(body: &str) -> Vec<Declaration> {
    let mut out = Vec::new();
    for raw in split_declarations(body) {
        let Some((name, value)) = raw.split_once(':') else {
            continue;
        };
        let name = name.trim();
        let name = if name.starts_with("--") {
            name.to_string()
        } else {
            name.to_ascii_lowercase()
        };
        let mut value = value.trim().to_string();
        let mut important = false;
        if let Some(pos) = value.rfind('!') {
            if value[pos + 1..].trim().eq_ignore_ascii_case("important") {
                important = true;
                value = value[..pos].trim().to_string();
            }
        }
        if name.is_empty() || value.is_empty() {
            continue;
        }
        expand_shorthand(&name, &value, important, &mut out);
    }
    out
}

fn split_declarations(body: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for ch in body.chars() {
        if let Some(q) = quote {
            current.push(ch);
            if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => {
                quote = Some(ch);
                current.push(ch);
            }
            '(' => {
                depth += 1;
                current.push(ch);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            ';' if depth == 0 => {
                if !current.trim().is_empty() {
                    parts.push(current.trim().to_string());
                }
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

/// Split a value on whitespace outside parentheses.
fn value_tokens(value: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    for ch in value.chars() {
        match ch {
            '(' => {
                depth += 1;
                current.push(ch);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            c if c.is_whitespace() && depth == 0 => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(ch),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

const SIDES: [&str; 4] = ["top", "right", "bottom", "left"];

const BORDER_STYLES: &[&str] = &[
    "none", "hidden", "dotted", "dashed", "solid", "double", "groove", "ridge", "inset", "outset",
];

/// Expand 1-4 values to top/right/bottom/left.
fn four_sides(tokens: &[String]) -> Option<[String; 4]> {
    let t = |i: usize| tokens[i].clone();
    match tokens.len() {
        1 => Some([t(0), t(0), t(0), t(0)]),
        2 => Some([t(0), t(1), t(0), t(1)]),
        3 => Some([t(0), t(1), t(2), t(1)]),
        4 => Some([t(0), t(1), t(2), t(3)]),
        _ => None,
    }
}

fn is_border_width(token: &str) -> bool {
    let lower = token.to_ascii_lowercase();
    matches!(lower.as_str(), "thin" | "medium" | "thick")
        || lower == "0"
        || lower.starts_with(|c: char| c.is_ascii_digit() || c == '.')
}

fn expand_shorthand(name: &str, value: &str, important: bool, out: &mut Vec<Declaration>) {
    let mut push = |name: String, value: String| {
        out.push(Declaration {
            name,
            value,
            important,
        })
    };
    let tokens = value_tokens(value);
    let global = matches!(
        value.to_ascii_lowercase().as_str(),
        "inherit" | "initial" | "unset"
    );

    match name {
        "margin" | "padding" | "border-width" | "border-style" | "border-color" => {
            let sides = if global {
                Some([value.to_string(), value.to_string(), value.to_string(), value.to_string()])
            } else {
                four_sides(&tokens)
            };
            let Some(sides) = sides else {
                return;
            };
            for (side, v) in SIDES.iter().zip(sides) {
                let longhand = match name.strip_prefix("border-") {
                    Some(kind) => format!("border-{side}-{kind}"),
                    None => format!("{name}-{side}"),
                };
                push(longhand, v);
            }
        }
        "border" | "border-top" | "border-right" | "border-bottom" | "border-left" | "outline" => {
            let (mut width, mut style, mut color) = if global {
                (value.to_string(), value.to_string(), value.to_string())
            } else {
                ("medium".to_string(), "none".to_string(), "currentcolor".to_string())
            };
            if !global {
                for token in &tokens {
                    let lower = token.to_ascii_lowercase();
                    if BORDER_STYLES.contains(&lower.as_str()) {
                        style = lower;
                    } else if is_border_width(token) {
                        width = token.clone();
                    } else {
                        color = token.clone();
                    }
                }
            }
            if name == "outline" {
                push("outline-width".into(), width);
                push("outline-style".into(), style);
                push("outline-color".into(), color);
                return;
            }
            let sides: Vec<&str> = match name.strip_prefix("border-") {
                Some(side) => vec![side],
                None => SIDES.to_vec(),
            };
            for side in sides {
                push(format!("border-{side}-width"), width.clone());
                push(format!("border-{side}-style"), style.clone());
                push(format!("border-{side}-color"), color.clone());
            }
        }
        "background" => {
            let color = if global {
                value.to_string()
            } else {
                tokens
                    .iter()
                    .find(|t| parse_color(t).is_some() || t.eq_ignore_ascii_case("currentcolor"))
                    .cloned()
                    .unwrap_or_else(|| "transparent".to_string())
            };
            push("background-color".into(), color);
            push("background".into(), value.to_string());
        }
        "overflow" => {
            let (x, y) = match tokens.as_slice() {
                [x, y] => (x.clone(), y.clone()),
                _ => (value.to_string(), value.to_string()),
            };
            push("overflow-x".into(), x);
            push("overflow-y".into(), y.clone());
            push("overflow".into(), value.to_string());
        }
        "inset" => {
            let Some(sides) = four_sides(&tokens) else {
                return;
            };
            for (side, v) in SIDES.iter().zip(sides) {
                push(side.to_string(), v);
            }
        }
        _ => push(name.to_string(), value.to_string()),
    }
}
