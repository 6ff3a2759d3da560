// src/dom/selector.rs

//! A small CSS selector engine.
//!
//! Supported:
//! - selector lists (`a, b`)
//! - combinators: descendant (whitespace), child (`>`), next sibling (`+`),
//!   subsequent sibling (`~`)
//! - type and universal selectors, `#id`, `.class`
//! - attribute selectors `[name]`, `[name=v]`, `[name~=v]`, `[name|=v]`,
//!   `[name^=v]`, `[name$=v]`, `[name*=v]` with bare or quoted values
//!
//! Pseudo-classes, pseudo-elements, namespaces and escapes are rejected as
//! syntax errors rather than silently ignored.

use std::fmt;

use crate::dom::document::{ElementData, Tree};
use crate::dom::NodeId;
use crate::errors::{DomWatchError, Result};

/// A compiled selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    alternatives: Vec<ComplexSelector>,
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Selector {
    /// Compile a selector string.
    pub fn parse(source: &str) -> Result<Self> {
        let alternatives = Parser::new(source).parse_list()?;
        Ok(Self {
            source: source.to_string(),
            alternatives,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub(crate) fn matches(&self, tree: &Tree, node: NodeId) -> bool {
        self.alternatives.iter().any(|alt| alt.matches(tree, node))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
    NextSibling,
    SubsequentSibling,
}

/// One complex selector stored right-to-left: the subject compound, then
/// each `(combinator, compound)` step moving away from the subject.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ComplexSelector {
    subject: CompoundSelector,
    steps: Vec<(Combinator, CompoundSelector)>,
}

impl ComplexSelector {
    fn matches(&self, tree: &Tree, node: NodeId) -> bool {
        match tree.element(node) {
            Some(el) if self.subject.matches(el) => matches_steps(tree, node, &self.steps),
            _ => false,
        }
    }
}

fn matches_steps(tree: &Tree, node: NodeId, steps: &[(Combinator, CompoundSelector)]) -> bool {
    let Some(((combinator, compound), rest)) = steps.split_first() else {
        return true;
    };

    let candidate_matches = |id: NodeId| {
        tree.element(id).is_some_and(|el| compound.matches(el)) && matches_steps(tree, id, rest)
    };

    match combinator {
        Combinator::Child => tree.parent_element(node).is_some_and(candidate_matches),
        Combinator::NextSibling => tree
            .previous_element_sibling(node)
            .is_some_and(candidate_matches),
        Combinator::Descendant => {
            let mut current = tree.parent_element(node);
            while let Some(id) = current {
                if candidate_matches(id) {
                    return true;
                }
                current = tree.parent_element(id);
            }
            false
        }
        Combinator::SubsequentSibling => {
            let mut current = tree.previous_element_sibling(node);
            while let Some(id) = current {
                if candidate_matches(id) {
                    return true;
                }
                current = tree.previous_element_sibling(id);
            }
            false
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct CompoundSelector {
    /// `None` for `*` or when no type selector is given.
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attributes: Vec<AttributeSelector>,
}

impl CompoundSelector {
    fn matches(&self, el: &ElementData) -> bool {
        if let Some(tag) = &self.tag {
            if el.tag() != tag {
                return false;
            }
        }
        self.ids.iter().all(|id| el.id() == Some(id.as_str()))
            && self.classes.iter().all(|c| el.has_class(c))
            && self.attributes.iter().all(|a| a.matches(el))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttributeOp {
    Equals,
    Includes,
    DashMatch,
    Prefix,
    Suffix,
    Substring,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttributeSelector {
    name: String,
    test: Option<(AttributeOp, String)>,
}

impl AttributeSelector {
    fn matches(&self, el: &ElementData) -> bool {
        let Some(actual) = el.attribute(&self.name) else {
            return false;
        };
        let Some((op, expected)) = &self.test else {
            return true;
        };
        let expected = expected.as_str();
        match op {
            AttributeOp::Equals => actual == expected,
            AttributeOp::Includes => {
                !expected.is_empty()
                    && !expected.contains(char::is_whitespace)
                    && actual.split_ascii_whitespace().any(|w| w == expected)
            }
            AttributeOp::DashMatch => {
                actual == expected
                    || actual
                        .strip_prefix(expected)
                        .is_some_and(|rest| rest.starts_with('-'))
            }
            AttributeOp::Prefix => !expected.is_empty() && actual.starts_with(expected),
            AttributeOp::Suffix => !expected.is_empty() && actual.ends_with(expected),
            AttributeOp::Substring => !expected.is_empty() && actual.contains(expected),
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '-' || c == '_' || !c.is_ascii()
}

struct Parser<'a> {
    source: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().collect(),
            pos: 0,
        }
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.pos)
            .map(|(o, _)| *o)
            .unwrap_or(self.source.len())
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|(_, c)| *c)
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).map(|(_, c)| *c)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    /// Skip whitespace; returns true if any was skipped.
    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn error(&self, reason: impl Into<String>) -> DomWatchError {
        DomWatchError::SelectorSyntax {
            selector: self.source.to_string(),
            offset: self.offset(),
            reason: reason.into(),
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected '{expected}', found '{c}'"))),
            None => Err(self.error(format!("expected '{expected}', found end of input"))),
        }
    }

    fn parse_list(&mut self) -> Result<Vec<ComplexSelector>> {
        let mut alternatives = Vec::new();
        loop {
            self.skip_ws();
            alternatives.push(self.parse_complex()?);
            self.skip_ws();
            match self.peek() {
                None => break,
                Some(',') => {
                    self.bump();
                }
                Some(c) => return Err(self.error(format!("unexpected character '{c}'"))),
            }
        }
        Ok(alternatives)
    }

    fn parse_complex(&mut self) -> Result<ComplexSelector> {
        let mut compounds = vec![self.parse_compound()?];
        let mut combinators = Vec::new();

        loop {
            let had_ws = self.skip_ws();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => Combinator::Child,
                Some('+') => Combinator::NextSibling,
                Some('~') => Combinator::SubsequentSibling,
                Some(_) if had_ws => Combinator::Descendant,
                Some(c) => return Err(self.error(format!("unexpected character '{c}'"))),
            };
            if combinator != Combinator::Descendant {
                self.bump();
                self.skip_ws();
            }
            compounds.push(self.parse_compound()?);
            combinators.push(combinator);
        }

        let subject = compounds.pop().unwrap_or_default();
        let steps = combinators
            .into_iter()
            .rev()
            .zip(compounds.into_iter().rev())
            .collect();
        Ok(ComplexSelector { subject, steps })
    }

    fn parse_compound(&mut self) -> Result<CompoundSelector> {
        let start = self.pos;
        let mut compound = CompoundSelector::default();

        match self.peek() {
            Some('*') => {
                self.bump();
            }
            Some(c) if is_ident_start(c) => {
                compound.tag = Some(self.parse_ident()?.to_ascii_lowercase());
            }
            _ => {}
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    compound.ids.push(self.parse_ident()?);
                }
                Some('.') => {
                    self.bump();
                    compound.classes.push(self.parse_ident()?);
                }
                Some('[') => {
                    self.bump();
                    compound.attributes.push(self.parse_attribute()?);
                }
                Some(':') => {
                    return Err(self.error("pseudo-classes and pseudo-elements are not supported"));
                }
                Some('|') => return Err(self.error("namespace prefixes are not supported")),
                Some('\\') => return Err(self.error("escape sequences are not supported")),
                _ => break,
            }
        }

        if self.pos == start {
            return Err(match self.peek() {
                Some(c) => self.error(format!("expected a selector, found '{c}'")),
                None => self.error("expected a selector, found end of input"),
            });
        }
        Ok(compound)
    }

    fn parse_ident(&mut self) -> Result<String> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }
        let ident: String = self.chars[start..self.pos].iter().map(|(_, c)| *c).collect();

        let mut chars = ident.chars();
        let valid = match (chars.next(), chars.next()) {
            (None, _) => false,
            (Some(first), _) if first.is_ascii_digit() => false,
            (Some('-'), None) => false,
            (Some('-'), Some(second)) => !second.is_ascii_digit(),
            _ => true,
        };
        if !valid {
            self.pos = start;
            return Err(self.error("expected an identifier"));
        }
        Ok(ident)
    }

    fn parse_attribute(&mut self) -> Result<AttributeSelector> {
        self.skip_ws();
        let name = self.parse_ident()?.to_ascii_lowercase();
        self.skip_ws();

        let op = match (self.peek(), self.peek_at(1)) {
            (Some(']'), _) => {
                self.bump();
                return Ok(AttributeSelector { name, test: None });
            }
            (Some('='), _) => AttributeOp::Equals,
            (Some('~'), Some('=')) => AttributeOp::Includes,
            (Some('|'), Some('=')) => AttributeOp::DashMatch,
            (Some('^'), Some('=')) => AttributeOp::Prefix,
            (Some('$'), Some('=')) => AttributeOp::Suffix,
            (Some('*'), Some('=')) => AttributeOp::Substring,
            _ => return Err(self.error("expected an attribute operator or ']'")),
        };
        self.pos += if op == AttributeOp::Equals { 1 } else { 2 };
        self.skip_ws();

        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                self.parse_quoted(quote)?
            }
            _ => self.parse_ident()?,
        };

        self.skip_ws();
        self.expect(']')?;
        Ok(AttributeSelector {
            name,
            test: Some((op, value)),
        })
    }

    fn parse_quoted(&mut self, quote: char) -> Result<String> {
        let mut value = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(value),
                Some('\\') => {
                    self.pos -= 1;
                    return Err(self.error("escape sequences are not supported"));
                }
                Some(c) => value.push(c),
                None => return Err(self.error("unterminated string")),
            }
        }
    }
}
