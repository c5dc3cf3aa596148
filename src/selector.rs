//! CSS selector parsing and matching over the document arena
//!
//! Selectors are parsed into a list of complex selectors, each a chain of
//! compound steps joined by combinators, and matched right to left.

use crate::dom::{Dom, NodeId};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AttrCondition {
    Exists { key: String },
    Eq { key: String, value: String },
    Includes { key: String, value: String },
    DashMatch { key: String, value: String },
    StartsWith { key: String, value: String },
    EndsWith { key: String, value: String },
    Contains { key: String, value: String },
}

impl AttrCondition {
    fn key(&self) -> &str {
        match self {
            AttrCondition::Exists { key }
            | AttrCondition::Eq { key, .. }
            | AttrCondition::Includes { key, .. }
            | AttrCondition::DashMatch { key, .. }
            | AttrCondition::StartsWith { key, .. }
            | AttrCondition::EndsWith { key, .. }
            | AttrCondition::Contains { key, .. } => key,
        }
    }

    fn matches(&self, actual: &str) -> bool {
        match self {
            AttrCondition::Exists { .. } => true,
            AttrCondition::Eq { value, .. } => actual == value,
            AttrCondition::Includes { value, .. } => {
                !value.is_empty() && actual.split_ascii_whitespace().any(|t| t == value)
            }
            AttrCondition::DashMatch { value, .. } => {
                actual == value || actual.starts_with(&format!("{value}-"))
            }
            AttrCondition::StartsWith { value, .. } => !value.is_empty() && actual.starts_with(value.as_str()),
            AttrCondition::EndsWith { value, .. } => !value.is_empty() && actual.ends_with(value.as_str()),
            AttrCondition::Contains { value, .. } => !value.is_empty() && actual.contains(value.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Nth {
    Odd,
    Even,
    AnPlusB(i64, i64),
}

impl Nth {
    fn matches(&self, index: usize) -> bool {
        let index = index as i64;
        match self {
            Nth::Odd => index % 2 == 1,
            Nth::Even => index % 2 == 0,
            Nth::AnPlusB(a, b) => {
                // Widened so extreme coefficients cannot overflow.
                let (a, b, index) = (i128::from(*a), i128::from(*b), i128::from(index));
                let diff = index - b;
                if a == 0 {
                    diff == 0
                } else {
                    diff % a == 0 && diff / a >= 0
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PseudoClass {
    FirstChild,
    LastChild,
    OnlyChild,
    FirstOfType,
    LastOfType,
    OnlyOfType,
    Empty,
    Root,
    Focus,
    Checked,
    Disabled,
    Enabled,
    NthChild(Nth),
    NthLastChild(Nth),
    NthOfType(Nth),
    NthLastOfType(Nth),
    Not(Vec<Vec<SelectorPart>>),
    Is(Vec<Vec<SelectorPart>>),
    Where(Vec<Vec<SelectorPart>>),
    Has(Vec<Vec<SelectorPart>>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct CompoundSelector {
    tag: Option<String>,
    universal: bool,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrCondition>,
    pseudo_classes: Vec<PseudoClass>,
}

impl CompoundSelector {
    fn is_empty(&self) -> bool {
        self.tag.is_none()
            && !self.universal
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attrs.is_empty()
            && self.pseudo_classes.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Combinator {
    Descendant,
    Child,
    NextSibling,
    SubsequentSibling,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SelectorPart {
    step: CompoundSelector,
    // Relation to the part on the left.
    combinator: Option<Combinator>,
}

/// Selector specificity as (ids, classes/attributes/pseudo-classes, types)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Specificity(pub u32, pub u32, pub u32);

impl std::ops::Add for Specificity {
    type Output = Specificity;

    fn add(self, rhs: Specificity) -> Specificity {
        Specificity(self.0 + rhs.0, self.1 + rhs.1, self.2 + rhs.2)
    }
}

/// A parsed, comma separated selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    selectors: Vec<Vec<SelectorPart>>,
}

impl SelectorList {
    pub fn parse(selector: &str) -> Result<Self> {
        let selectors = parse_groups(selector)
            .ok_or_else(|| Error::InvalidSelector(selector.to_string()))?;
        Ok(Self { selectors })
    }

    pub(crate) fn matches(&self, ctx: &MatchContext<'_>, node: NodeId) -> bool {
        self.selectors.iter().any(|chain| ctx.matches_chain(node, chain))
    }

    /// Highest specificity among the selectors of the list matching `node`.
    pub(crate) fn matching_specificity(&self, ctx: &MatchContext<'_>, node: NodeId) -> Option<Specificity> {
        self.selectors
            .iter()
            .filter(|chain| ctx.matches_chain(node, chain))
            .map(|chain| chain_specificity(chain))
            .max()
    }

    pub fn specificity(&self) -> Specificity {
        self.selectors
            .iter()
            .map(|chain| chain_specificity(chain))
            .max()
            .unwrap_or_default()
    }
}

fn chain_specificity(chain: &[SelectorPart]) -> Specificity {
    chain
        .iter()
        .map(|part| compound_specificity(&part.step))
        .fold(Specificity::default(), |acc, s| acc + s)
}

fn compound_specificity(step: &CompoundSelector) -> Specificity {
    let mut spec = Specificity(
        step.id.is_some() as u32,
        (step.classes.len() + step.attrs.len()) as u32,
        step.tag.is_some() as u32,
    );
    for pseudo in &step.pseudo_classes {
        spec = spec
            + match pseudo {
                PseudoClass::Where(_) => Specificity::default(),
                PseudoClass::Not(inner) | PseudoClass::Is(inner) | PseudoClass::Has(inner) => inner
                    .iter()
                    .map(|chain| chain_specificity(chain))
                    .max()
                    .unwrap_or_default(),
                _ => Specificity(0, 1, 0),
            };
    }
    spec
}

/// Read-only matching state: the tree and the focused element.
pub(crate) struct MatchContext<'a> {
    pub(crate) dom: &'a Dom,
    pub(crate) focused: Option<NodeId>,
}

impl<'a> MatchContext<'a> {
    pub(crate) fn new(dom: &'a Dom, focused: Option<NodeId>) -> Self {
        Self { dom, focused }
    }

    /// Elements below `scope` (same tree only) matching `list`, in tree order.
    pub(crate) fn query_all(&self, scope: NodeId, list: &SelectorList) -> Vec<NodeId> {
        self.dom
            .descendant_elements(scope)
            .into_iter()
            .filter(|node| list.matches(self, *node))
            .collect()
    }

    pub(crate) fn query_first(&self, scope: NodeId, list: &SelectorList) -> Option<NodeId> {
        self.dom
            .descendant_elements(scope)
            .into_iter()
            .find(|node| list.matches(self, *node))
    }

    fn matches_chain(&self, node: NodeId, chain: &[SelectorPart]) -> bool {
        let Some((last, rest)) = chain.split_last() else {
            return false;
        };
        if !self.matches_step(node, &last.step) {
            return false;
        }
        if rest.is_empty() {
            return true;
        }

        let dom = self.dom;
        match last.combinator.unwrap_or(Combinator::Descendant) {
            Combinator::Child => dom
                .parent_element(node)
                .is_some_and(|parent| self.matches_chain(parent, rest)),
            Combinator::Descendant => {
                let mut cursor = dom.parent_element(node);
                while let Some(ancestor) = cursor {
                    if self.matches_chain(ancestor, rest) {
                        return true;
                    }
                    cursor = dom.parent_element(ancestor);
                }
                false
            }
            Combinator::NextSibling => dom
                .previous_element_sibling(node)
                .is_some_and(|sibling| self.matches_chain(sibling, rest)),
            Combinator::SubsequentSibling => {
                let mut cursor = dom.previous_element_sibling(node);
                while let Some(sibling) = cursor {
                    if self.matches_chain(sibling, rest) {
                        return true;
                    }
                    cursor = dom.previous_element_sibling(sibling);
                }
                false
            }
        }
    }

    fn matches_step(&self, node: NodeId, step: &CompoundSelector) -> bool {
        let Some(element) = self.dom.element(node) else {
            return false;
        };

        if let Some(tag) = &step.tag {
            if !element.tag_name.eq_ignore_ascii_case(tag) {
                return false;
            }
        }

        if let Some(id) = &step.id {
            if element.attr("id") != Some(id.as_str()) {
                return false;
            }
        }

        if step.classes.iter().any(|c| !element.has_class(c)) {
            return false;
        }

        for cond in &step.attrs {
            match element.attr(cond.key()) {
                Some(actual) if cond.matches(actual) => {}
                _ => return false,
            }
        }

        step.pseudo_classes
            .iter()
            .all(|pseudo| self.matches_pseudo(node, pseudo))
    }

    fn matches_pseudo(&self, node: NodeId, pseudo: &PseudoClass) -> bool {
        let dom = self.dom;
        match pseudo {
            PseudoClass::FirstChild => dom.previous_element_sibling(node).is_none(),
            PseudoClass::LastChild => dom.next_element_sibling(node).is_none(),
            PseudoClass::OnlyChild => {
                dom.previous_element_sibling(node).is_none() && dom.next_element_sibling(node).is_none()
            }
            PseudoClass::FirstOfType => self.index_of_type(node, false) == Some(1),
            PseudoClass::LastOfType => self.index_of_type(node, true) == Some(1),
            PseudoClass::OnlyOfType => {
                self.index_of_type(node, false) == Some(1) && self.index_of_type(node, true) == Some(1)
            }
            PseudoClass::Empty => dom.children(node).iter().all(|child| {
                !dom.is_element(*child) && dom.text(*child).map_or(true, str::is_empty)
            }),
            PseudoClass::Root => dom.parent(node) == Some(dom.root()),
            PseudoClass::Focus => self.focused == Some(node),
            PseudoClass::Checked => {
                let Some(element) = dom.element(node) else {
                    return false;
                };
                match element.tag_name.as_str() {
                    "input" => {
                        let kind = element.attr("type").unwrap_or("").to_ascii_lowercase();
                        (kind == "checkbox" || kind == "radio") && element.has_attr("checked")
                    }
                    "option" => element.has_attr("selected"),
                    _ => false,
                }
            }
            PseudoClass::Disabled => is_form_control(dom, node) && dom.attr(node, "disabled").is_some(),
            PseudoClass::Enabled => is_form_control(dom, node) && dom.attr(node, "disabled").is_none(),
            PseudoClass::NthChild(nth) => self.element_index(node, false).is_some_and(|i| nth.matches(i)),
            PseudoClass::NthLastChild(nth) => self.element_index(node, true).is_some_and(|i| nth.matches(i)),
            PseudoClass::NthOfType(nth) => self
                .index_of_type(node, false)
                .is_some_and(|i| nth.matches(i)),
            PseudoClass::NthLastOfType(nth) => self
                .index_of_type(node, true)
                .is_some_and(|i| nth.matches(i)),
            PseudoClass::Not(inner) => !inner.iter().any(|chain| self.matches_chain(node, chain)),
            PseudoClass::Is(inner) | PseudoClass::Where(inner) => {
                inner.iter().any(|chain| self.matches_chain(node, chain))
            }
            PseudoClass::Has(inner) => dom
                .descendant_elements(node)
                .into_iter()
                .any(|d| inner.iter().any(|chain| self.matches_chain(d, chain))),
        }
    }

    /// 1-based position among element siblings, optionally counted from the end.
    fn element_index(&self, node: NodeId, from_end: bool) -> Option<usize> {
        let parent = self.dom.parent(node)?;
        let mut siblings = self.dom.element_children(parent);
        if from_end {
            siblings.reverse();
        }
        siblings.iter().position(|s| *s == node).map(|p| p + 1)
    }

    /// 1-based position among same-tag siblings.
    fn index_of_type(&self, node: NodeId, from_end: bool) -> Option<usize> {
        let parent = self.dom.parent(node)?;
        let tag = self.dom.tag_name(node)?;
        let mut same: Vec<NodeId> = self
            .dom
            .element_children(parent)
            .into_iter()
            .filter(|s| self.dom.tag_name(*s) == Some(tag))
            .collect();
        if from_end {
            same.reverse();
        }
        same.iter().position(|s| *s == node).map(|p| p + 1)
    }
}

fn is_form_control(dom: &Dom, node: NodeId) -> bool {
    matches!(
        dom.tag_name(node),
        Some("button" | "input" | "select" | "textarea" | "optgroup" | "option" | "fieldset")
    )
}

fn parse_groups(selector: &str) -> Option<Vec<Vec<SelectorPart>>> {
    let mut out = Vec::new();
    for group in split_top_level(selector, ',')? {
        out.push(parse_chain(&group)?);
    }
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

/// Split a comma separated selector list into its complex selectors.
pub(crate) fn split_selector_list(selector: &str) -> Option<Vec<String>> {
    split_top_level(selector, ',')
}

/// Split on `sep` outside brackets, parentheses and quotes.
fn split_top_level(input: &str, sep: char) -> Option<Vec<String>> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for ch in input.chars() {
        if let Some(q) = quote {
            current.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => {
                quote = Some(ch);
                current.push(ch);
            }
            '[' | '(' => {
                depth += 1;
                current.push(ch);
            }
            ']' | ')' => {
                depth = depth.checked_sub(1)?;
                current.push(ch);
            }
            c if c == sep && depth == 0 => {
                let trimmed = current.trim();
                if trimmed.is_empty() {
                    return None;
                }
                parts.push(trimmed.to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    if depth != 0 || quote.is_some() {
        return None;
    }
    let trimmed = current.trim();
    if trimmed.is_empty() {
        return None;
    }
    parts.push(trimmed.to_string());
    Some(parts)
}

fn tokenize(selector: &str) -> Option<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    let flush = |current: &mut String, tokens: &mut Vec<String>| {
        if !current.trim().is_empty() {
            tokens.push(current.trim().to_string());
        }
        current.clear();
    };

    for ch in selector.chars() {
        if let Some(q) = quote {
            current.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => {
                quote = Some(ch);
                current.push(ch);
            }
            '[' | '(' => {
                depth += 1;
                current.push(ch);
            }
            ']' | ')' => {
                depth = depth.checked_sub(1)?;
                current.push(ch);
            }
            '>' | '+' | '~' if depth == 0 => {
                flush(&mut current, &mut tokens);
                tokens.push(ch.to_string());
            }
            c if c.is_whitespace() && depth == 0 => flush(&mut current, &mut tokens),
            _ => current.push(ch),
        }
    }
    if depth != 0 || quote.is_some() {
        return None;
    }
    flush(&mut current, &mut tokens);
    Some(tokens)
}

fn parse_chain(selector: &str) -> Option<Vec<SelectorPart>> {
    let mut parts: Vec<SelectorPart> = Vec::new();
    let mut pending: Option<Combinator> = None;

    for token in tokenize(selector)? {
        let combinator = match token.as_str() {
            ">" => Some(Combinator::Child),
            "+" => Some(Combinator::NextSibling),
            "~" => Some(Combinator::SubsequentSibling),
            _ => None,
        };
        if let Some(combinator) = combinator {
            if pending.is_some() || parts.is_empty() {
                return None;
            }
            pending = Some(combinator);
            continue;
        }

        let step = parse_compound(&token)?;
        let combinator = if parts.is_empty() {
            None
        } else {
            Some(pending.take().unwrap_or(Combinator::Descendant))
        };
        parts.push(SelectorPart { step, combinator });
    }

    if parts.is_empty() || pending.is_some() {
        return None;
    }
    Some(parts)
}

fn parse_compound(part: &str) -> Option<CompoundSelector> {
    let bytes = part.as_bytes();
    let mut i = 0usize;
    let mut step = CompoundSelector::default();

    while i < bytes.len() {
        match bytes[i] {
            b'*' => {
                if i != 0 {
                    return None;
                }
                step.universal = true;
                i += 1;
            }
            b'#' => {
                let (id, next) = parse_ident(part, i + 1)?;
                if step.id.replace(id).is_some() {
                    return None;
                }
                i = next;
            }
            b'.' => {
                let (class_name, next) = parse_ident(part, i + 1)?;
                step.classes.push(class_name);
                i = next;
            }
            b'[' => {
                let (cond, next) = parse_attr_condition(part, i)?;
                step.attrs.push(cond);
                i = next;
            }
            b':' => {
                let (pseudo, next) = parse_pseudo(part, i + 1)?;
                step.pseudo_classes.push(pseudo);
                i = next;
            }
            _ => {
                if i != 0 {
                    return None;
                }
                let (tag, next) = parse_ident(part, i)?;
                step.tag = Some(tag.to_ascii_lowercase());
                i = next;
            }
        }
    }

    if step.is_empty() {
        None
    } else {
        Some(step)
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b >= 0x80
}

fn parse_ident(src: &str, start: usize) -> Option<(String, usize)> {
    let bytes = src.as_bytes();
    let mut end = start;
    while end < bytes.len() && is_ident_byte(bytes[end]) {
        end += 1;
    }
    if end == start {
        return None;
    }
    Some((src.get(start..end)?.to_string(), end))
}

fn parse_attr_condition(src: &str, open: usize) -> Option<(AttrCondition, usize)> {
    let close = open + find_closing(&src[open + 1..], b'[', b']')? + 1;
    let body = src[open + 1..close].trim();

    let op_pos = body.find(|c: char| matches!(c, '=' | '~' | '|' | '^' | '$' | '*'));
    let Some(op_pos) = op_pos else {
        let key = body.to_ascii_lowercase();
        if key.is_empty() || !key.bytes().all(|b| is_ident_byte(b) || b == b':') {
            return None;
        }
        return Some((AttrCondition::Exists { key }, close + 1));
    };

    let key = body[..op_pos].trim().to_ascii_lowercase();
    if key.is_empty() {
        return None;
    }
    let rest = &body[op_pos..];
    let (op, value) = if let Some(v) = rest.strip_prefix('=') {
        ("=", v)
    } else {
        let v = rest.get(2..)?;
        if rest.as_bytes().get(1) != Some(&b'=') {
            return None;
        }
        (&rest[..1], v)
    };

    let value = value.trim();
    // Trailing case-sensitivity flags are accepted and ignored.
    let value = value
        .strip_suffix(" i")
        .or_else(|| value.strip_suffix(" s"))
        .unwrap_or(value)
        .trim();
    let value = unquote(value)?;

    let cond = match op {
        "=" => AttrCondition::Eq { key, value },
        "~" => AttrCondition::Includes { key, value },
        "|" => AttrCondition::DashMatch { key, value },
        "^" => AttrCondition::StartsWith { key, value },
        "$" => AttrCondition::EndsWith { key, value },
        "*" => AttrCondition::Contains { key, value },
        _ => return None,
    };
    Some((cond, close + 1))
}

/// Quote `value` as a CSS string, escaping quotes and backslashes.
pub(crate) fn css_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        if matches!(ch, '"' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

fn unquote(value: &str) -> Option<String> {
    let bytes = value.as_bytes();
    match bytes.first() {
        Some(q @ (b'"' | b'\'')) => {
            if bytes.len() < 2 || bytes[bytes.len() - 1] != *q {
                return None;
            }
            let mut out = String::new();
            let mut chars = value[1..value.len() - 1].chars();
            while let Some(ch) = chars.next() {
                match ch {
                    '\\' => out.extend(chars.next()),
                    _ => out.push(ch),
                }
            }
            Some(out)
        }
        _ => {
            if value.chars().any(char::is_whitespace) {
                None
            } else {
                Some(value.to_string())
            }
        }
    }
}

/// Byte offset of the `close` matching an already consumed `open`.
fn find_closing(body: &str, open: u8, close: u8) -> Option<usize> {
    let mut depth = 1usize;
    let mut quote: Option<u8> = None;
    let mut escaped = false;
    for (idx, b) in body.bytes().enumerate() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == q {
                quote = None;
            }
            continue;
        }
        if b == b'"' || b == b'\'' {
            quote = Some(b);
        } else if b == open {
            depth += 1;
        } else if b == close {
            depth -= 1;
            if depth == 0 {
                return Some(idx);
            }
        }
    }
    None
}

fn parse_pseudo(part: &str, start: usize) -> Option<(PseudoClass, usize)> {
    let (name, after_name) = parse_ident(part, start)?;
    let name = name.to_ascii_lowercase();

    if part.as_bytes().get(after_name) == Some(&b'(') {
        let close = after_name + 1 + find_closing(&part[after_name + 1..], b'(', b')')?;
        let arg = part[after_name + 1..close].trim();
        let next = close + 1;
        let pseudo = match name.as_str() {
            "nth-child" => PseudoClass::NthChild(parse_nth(arg)?),
            "nth-last-child" => PseudoClass::NthLastChild(parse_nth(arg)?),
            "nth-of-type" => PseudoClass::NthOfType(parse_nth(arg)?),
            "nth-last-of-type" => PseudoClass::NthLastOfType(parse_nth(arg)?),
            "not" => PseudoClass::Not(parse_groups(arg)?),
            "is" | "matches" => PseudoClass::Is(parse_groups(arg)?),
            "where" => PseudoClass::Where(parse_groups(arg)?),
            "has" => PseudoClass::Has(parse_groups(arg)?),
            _ => return None,
        };
        return Some((pseudo, next));
    }

    let pseudo = match name.as_str() {
        "first-child" => PseudoClass::FirstChild,
        "last-child" => PseudoClass::LastChild,
        "only-child" => PseudoClass::OnlyChild,
        "first-of-type" => PseudoClass::FirstOfType,
        "last-of-type" => PseudoClass::LastOfType,
        "only-of-type" => PseudoClass::OnlyOfType,
        "empty" => PseudoClass::Empty,
        "root" => PseudoClass::Root,
        "focus" => PseudoClass::Focus,
        "checked" => PseudoClass::Checked,
        "disabled" => PseudoClass::Disabled,
        "enabled" => PseudoClass::Enabled,
        _ => return None,
    };
    Some((pseudo, after_name))
}

fn parse_nth(raw: &str) -> Option<Nth> {
    let expr: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();

    match expr.as_str() {
        "" => None,
        "odd" => Some(Nth::Odd),
        "even" => Some(Nth::Even),
        _ => {
            let Some(n_pos) = expr.find('n') else {
                return expr.parse::<i64>().ok().map(|b| Nth::AnPlusB(0, b));
            };
            let (a_part, rest) = expr.split_at(n_pos);
            let b_part = &rest[1..];
            let a = match a_part {
                "" | "+" => 1,
                "-" => -1,
                _ => a_part.parse::<i64>().ok()?,
            };
            let b = if b_part.is_empty() {
                0
            } else if b_part.starts_with('+') || b_part.starts_with('-') {
                b_part.parse::<i64>().ok()?
            } else {
                return None;
            };
            Some(Nth::AnPlusB(a, b))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse::parse_document;

    fn select(html: &str, selector: &str) -> Vec<String> {
        let dom = parse_document(html);
        let list = SelectorList::parse(selector).expect("selector should parse");
        let ctx = MatchContext::new(&dom, None);
        ctx.query_all(dom.root(), &list)
            .into_iter()
            .map(|n| {
                dom.attr(n, "id")
                    .map(str::to_string)
                    .unwrap_or_else(|| dom.tag_name(n).unwrap_or("").to_string())
            })
            .collect()
    }

    #[test]
    fn combinators_and_nth_of_type() {
        let html = "<div id=a><p id=p1></p><span id=s1></span><p id=p2></p></div><div id=b><p id=p3></p></div>";
        assert_eq!(select(html, "html > body > div:nth-of-type(1) > p:nth-of-type(2)"), vec!["p2"]);
        assert_eq!(select(html, "div p"), vec!["p1", "p2", "p3"]);
        assert_eq!(select(html, "#p1 + span"), vec!["s1"]);
        assert_eq!(select(html, "#p1 ~ p"), vec!["p2"]);
        assert_eq!(select(html, "div:nth-of-type(2) > *"), vec!["p3"]);
    }

    #[test]
    fn nth_with_extreme_coefficients() {
        let html = "<ul><li id=a></li><li id=b></li><li id=c></li></ul>";
        assert_eq!(select(html, "li:nth-child(n-9223372036854775808)"), vec!["a", "b", "c"]);
        assert_eq!(select(html, "li:nth-child(-n+9223372036854775807)"), vec!["a", "b", "c"]);
        assert!(select(html, "li:nth-child(-n-9223372036854775808)").is_empty());
        assert_eq!(select(html, "li:nth-child(-9223372036854775808n+1)"), vec!["a"]);
        assert!(select(html, "li:nth-last-child(9223372036854775807n+9223372036854775807)").is_empty());
    }

    #[test]
    fn attribute_conditions() {
        let html = r#"<a id=x href="https://example.com/page" lang="en-US" class="btn primary"></a><a id=y></a>"#;
        assert_eq!(select(html, "a[href]"), vec!["x"]);
        assert_eq!(select(html, "a[href^='https://']"), vec!["x"]);
        assert_eq!(select(html, "a[href$=page]"), vec!["x"]);
        assert_eq!(select(html, "a[href*=\"example\"]"), vec!["x"]);
        assert_eq!(select(html, "[lang|=en]"), vec!["x"]);
        assert_eq!(select(html, "[class~=primary]"), vec!["x"]);
        assert_eq!(select(html, "a:not([href])"), vec!["y"]);
        assert_eq!(select(html, "[HREF]"), vec!["x"]);
    }

    #[test]
    fn tree_attribute_filters() {
        let html = r#"<ul id=list><li id=l1></li><li id=l2 shadowTree="1"></li></ul>"#;
        assert_eq!(select(html, "ul > *:not([shadowTree])"), vec!["l1"]);
        assert_eq!(select(html, "ul > *[shadowTree=\"1\"]"), vec!["l2"]);
    }

    #[test]
    fn structural_pseudo_classes() {
        let html = "<ol><li id=a></li><li id=b></li><li id=c></li><li id=d></li></ol>";
        assert_eq!(select(html, "li:first-child"), vec!["a"]);
        assert_eq!(select(html, "li:last-child"), vec!["d"]);
        assert_eq!(select(html, "li:nth-child(odd)"), vec!["a", "c"]);
        assert_eq!(select(html, "li:nth-child(2n)"), vec!["b", "d"]);
        assert_eq!(select(html, "li:nth-last-child(1)"), vec!["d"]);
        assert_eq!(select(html, "li:nth-child(-n+2)"), vec!["a", "b"]);
        assert_eq!(select(html, "ol:has(#c)"), vec!["ol"]);
        assert_eq!(select(html, "li:is(#a, #d)"), vec!["a", "d"]);
    }

    #[test]
    fn selector_lists_keep_tree_order() {
        let html = "<h2 id=two></h2><h1 id=one></h1>";
        assert_eq!(select(html, "h1, h2"), vec!["two", "one"]);
    }

    #[test]
    fn invalid_selectors_are_rejected() {
        for bad in ["", "div >", "> p", "a[href", "p:hover", "div,,p", "p:nth-child()"] {
            assert!(SelectorList::parse(bad).is_err(), "expected {bad:?} to be rejected");
        }
    }

    #[test]
    fn specificity_ordering() {
        let id = SelectorList::parse("#hello").unwrap().specificity();
        let class = SelectorList::parse("div.greeting").unwrap().specificity();
        let tag = SelectorList::parse("body div").unwrap().specificity();
        assert!(id > class);
        assert!(class > tag);
        assert_eq!(tag, Specificity(0, 0, 2));
        assert_eq!(
            SelectorList::parse("a:where(.x):not(#y)").unwrap().specificity(),
            Specificity(1, 0, 1)
        );
    }
}
