//! A small CSS selector engine.
//!
//! Supports type, universal, class, id and attribute (`[name]`,
//! `[name=value]`) selectors, compounds of those, the descendant and child
//! combinators, and comma separated lists.

use crate::document::{ElementId, MemoryDocument};
use crate::error::{DomError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Simple {
    Universal,
    Tag(String),
    Class(String),
    Id(String),
    Attribute { name: String, value: Option<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

/// Simple selectors that all apply to one element.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Compound(Vec<Simple>);

/// Compounds joined by combinators. `parts[0]` has no combinator.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    parts: Vec<(Combinator, Compound)>,
}

/// A parsed comma separated selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList(Vec<Complex>);

impl SelectorList {
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || DomError::InvalidSelector(input.to_string());
        let mut list = Vec::new();
        for part in input.split(',') {
            let part = part.trim();
            if part.is_empty() {
                return Err(invalid());
            }
            list.push(parse_complex(part).ok_or_else(invalid)?);
        }
        Ok(Self(list))
    }

    pub fn matches(&self, doc: &MemoryDocument, element: ElementId) -> bool {
        self.0.iter().any(|complex| complex.matches(doc, element))
    }
}

fn parse_complex(input: &str) -> Option<Complex> {
    let mut parts = Vec::new();
    let mut combinator = Combinator::Descendant;
    // Spaces around `>` are optional, so split it off first.
    let spaced = input.replace('>', " > ");
    for token in spaced.split_whitespace() {
        if token == ">" {
            if parts.is_empty() || combinator == Combinator::Child {
                return None;
            }
            combinator = Combinator::Child;
            continue;
        }
        parts.push((combinator, parse_compound(token)?));
        combinator = Combinator::Descendant;
    }
    if parts.is_empty() || combinator == Combinator::Child {
        return None;
    }
    Some(Complex { parts })
}

fn parse_compound(token: &str) -> Option<Compound> {
    let mut simples = Vec::new();
    let mut rest = token;

    let tag_end = rest.find(['.', '#', '[']).unwrap_or(rest.len());
    match &rest[..tag_end] {
        "" => {}
        "*" => simples.push(Simple::Universal),
        tag if is_ident(tag) => simples.push(Simple::Tag(tag.to_ascii_lowercase())),
        _ => return None,
    }
    rest = &rest[tag_end..];

    while let Some(first) = rest.chars().next() {
        match first {
            '.' | '#' => {
                let body = &rest[1..];
                let end = body.find(['.', '#', '[']).unwrap_or(body.len());
                let name = &body[..end];
                if !is_ident(name) {
                    return None;
                }
                simples.push(if first == '.' {
                    Simple::Class(name.to_string())
                } else {
                    Simple::Id(name.to_string())
                });
                rest = &body[end..];
            }
            '[' => {
                let close = rest.find(']')?;
                let inner = &rest[1..close];
                let (name, value) = match inner.split_once('=') {
                    Some((name, value)) => {
                        let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
                        (name.trim(), Some(value.to_string()))
                    }
                    None => (inner.trim(), None),
                };
                if !is_ident(name) {
                    return None;
                }
                simples.push(Simple::Attribute {
                    name: name.to_string(),
                    value,
                });
                rest = &rest[close + 1..];
            }
            _ => return None,
        }
    }

    (!simples.is_empty()).then_some(Compound(simples))
}

fn is_ident(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl Compound {
    fn matches(&self, doc: &MemoryDocument, element: ElementId) -> bool {
        let Some(tag) = doc.tag(element) else {
            return false;
        };
        self.0.iter().all(|simple| match simple {
            Simple::Universal => true,
            Simple::Tag(name) => tag.eq_ignore_ascii_case(name),
            Simple::Class(class) => doc.has_class_name(element, class),
            Simple::Id(id) => doc.attribute_value(element, "id") == Some(id.as_str()),
            Simple::Attribute { name, value } => match (doc.attribute_value(element, name), value) {
                (Some(actual), Some(expected)) => actual == expected,
                (Some(_), None) => true,
                (None, _) => false,
            },
        })
    }
}

impl Complex {
    fn matches(&self, doc: &MemoryDocument, element: ElementId) -> bool {
        self.matches_from(doc, element, self.parts.len())
    }

    /// Whether `element` matches `parts[..end]`, right to left.
    fn matches_from(&self, doc: &MemoryDocument, element: ElementId, end: usize) -> bool {
        let Some(last) = end.checked_sub(1) else {
            return true;
        };
        let (combinator, compound) = &self.parts[last];
        if !compound.matches(doc, element) {
            return false;
        }
        if last == 0 {
            return true;
        }
        let mut ancestor = doc.parent(element);
        match combinator {
            Combinator::Child => {
                ancestor.is_some_and(|parent| self.matches_from(doc, parent, last))
            }
            Combinator::Descendant => {
                while let Some(current) = ancestor {
                    if self.matches_from(doc, current, last) {
                        return true;
                    }
                    ancestor = doc.parent(current);
                }
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ReflowMode;

    fn doc() -> (MemoryDocument, ElementId, ElementId, ElementId) {
        let mut doc = MemoryDocument::new(ReflowMode::Fixed);
        let list = doc.create_element("ul");
        doc.add_class_name(list, "list");
        doc.append_child(doc.body(), list).unwrap();
        let item = doc.create_element("li");
        doc.add_class_name(item, "item");
        doc.set_attribute_value(item, "id", "first");
        doc.append_child(list, item).unwrap();
        let label = doc.create_element("span");
        doc.set_attribute_value(label, "data-role", "label");
        doc.append_child(item, label).unwrap();
        (doc, list, item, label)
    }

    #[test]
    fn test_compound_selectors() {
        let (doc, list, item, _) = doc();
        assert!(SelectorList::parse("li.item#first").unwrap().matches(&doc, item));
        assert!(SelectorList::parse(".list").unwrap().matches(&doc, list));
        assert!(!SelectorList::parse("li.other").unwrap().matches(&doc, item));
        assert!(SelectorList::parse("*").unwrap().matches(&doc, item));
    }

    #[test]
    fn test_combinators() {
        let (doc, _, item, label) = doc();
        assert!(SelectorList::parse(".list span").unwrap().matches(&doc, label));
        assert!(SelectorList::parse("ul > li").unwrap().matches(&doc, item));
        assert!(!SelectorList::parse("ul > span").unwrap().matches(&doc, label));
        assert!(SelectorList::parse("li>span").unwrap().matches(&doc, label));
    }

    #[test]
    fn test_attribute_and_lists() {
        let (doc, list, _, label) = doc();
        let selector = SelectorList::parse("[data-role=\"label\"], ul").unwrap();
        assert!(selector.matches(&doc, label));
        assert!(selector.matches(&doc, list));
        assert!(SelectorList::parse("[data-role]").unwrap().matches(&doc, label));
    }

    #[test]
    fn test_invalid_selectors() {
        assert!(SelectorList::parse("").is_err());
        assert!(SelectorList::parse("a,,b").is_err());
        assert!(SelectorList::parse("> li").is_err());
        assert!(SelectorList::parse("li >").is_err());
        assert!(SelectorList::parse("li!").is_err());
    }
}
