// CSS selector subset used by the site adapters
//
// Supported: type, `*`, `#id`, `.class`, `[attr]`, `[attr="v"]`, `:not(compound)`,
// `:nth-child(n)`, `:first-child`, `:last-child`, descendant and `>` combinators,
// and comma-separated lists. Anything else is a `Selector` error.

use super::{NodeId, Page};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    source: String,
    alternatives: Vec<Complex>,
}

#[derive(Debug, Clone, PartialEq)]
struct Complex {
    compounds: Vec<Compound>,
    /// `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`
    combinators: Vec<Combinator>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    conditions: Vec<Condition>,
}

#[derive(Debug, Clone, PartialEq)]
enum Condition {
    Id(String),
    Class(String),
    HasAttr(String),
    AttrEquals(String, String),
    Not(Box<Compound>),
    NthChild(usize),
    FirstChild,
    LastChild,
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self> {
        let mut parser = Parser {
            source,
            chars: source.chars().collect(),
            pos: 0,
        };
        let mut alternatives = vec![parser.complex()?];
        loop {
            parser.skip_ws();
            if parser.eat(',') {
                alternatives.push(parser.complex()?);
            } else {
                break;
            }
        }
        if !parser.at_end() {
            return Err(parser.error("unexpected character"));
        }
        Ok(Selector {
            source: source.to_string(),
            alternatives,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether element `id` matches, evaluated against the whole document
    pub fn matches(&self, page: &Page, id: NodeId) -> bool {
        self.alternatives.iter().any(|c| c.matches(page, id))
    }
}

impl Complex {
    fn matches(&self, page: &Page, id: NodeId) -> bool {
        self.matches_at(page, id, self.compounds.len() - 1)
    }

    fn matches_at(&self, page: &Page, id: NodeId, idx: usize) -> bool {
        if !self.compounds[idx].matches(page, id) {
            return false;
        }
        if idx == 0 {
            return true;
        }
        match self.combinators[idx - 1] {
            Combinator::Child => page
                .parent_element(id)
                .map(|parent| self.matches_at(page, parent, idx - 1))
                .unwrap_or(false),
            Combinator::Descendant => {
                let mut ancestor = page.parent_element(id);
                while let Some(candidate) = ancestor {
                    if self.matches_at(page, candidate, idx - 1) {
                        return true;
                    }
                    ancestor = page.parent_element(candidate);
                }
                false
            }
        }
    }
}

impl Compound {
    fn matches(&self, page: &Page, id: NodeId) -> bool {
        let Some(el) = page.element(id) else {
            return false;
        };
        if let Some(tag) = &self.tag {
            if el.tag != *tag {
                return false;
            }
        }
        self.conditions.iter().all(|cond| match cond {
            Condition::Id(value) => page.attr(id, "id") == Some(value.as_str()),
            Condition::Class(class) => page.has_class(id, class),
            Condition::HasAttr(name) => page.attr(id, name).is_some(),
            Condition::AttrEquals(name, value) => page.attr(id, name) == Some(value.as_str()),
            Condition::Not(inner) => !inner.matches(page, id),
            Condition::NthChild(n) => page.element_position(id).map(|(pos, _)| pos) == Some(*n),
            Condition::FirstChild => page.element_position(id).map(|(pos, _)| pos) == Some(1),
            Condition::LastChild => page
                .element_position(id)
                .map(|(pos, count)| pos == count)
                .unwrap_or(false),
        })
    }
}

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, reason: &str) -> Error {
        Error::Selector {
            selector: self.source.to_string(),
            reason: format!("{reason} at offset {}", self.pos),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, ch: char) -> Result<()> {
        if self.eat(ch) {
            Ok(())
        } else {
            Err(self.error(&format!("expected `{ch}`")))
        }
    }

    /// Returns whether any whitespace was skipped
    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().map(char::is_whitespace).unwrap_or(false) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn ident(&mut self) -> Result<String> {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '-' || ch == '_' || !ch.is_ascii() {
                self.pos += 1;
            } else {
                break;
            }
        }
        if self.pos == start {
            return Err(self.error("expected identifier"));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn complex(&mut self) -> Result<Complex> {
        self.skip_ws();
        let mut compounds = vec![self.compound()?];
        let mut combinators = Vec::new();
        loop {
            let had_ws = self.skip_ws();
            match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.pos += 1;
                    self.skip_ws();
                    combinators.push(Combinator::Child);
                }
                Some('+') | Some('~') => return Err(self.error("sibling combinators are not supported")),
                Some(_) if had_ws => combinators.push(Combinator::Descendant),
                Some(_) => return Err(self.error("unexpected character")),
            }
            compounds.push(self.compound()?);
        }
        Ok(Complex {
            compounds,
            combinators,
        })
    }

    fn compound(&mut self) -> Result<Compound> {
        let mut compound = Compound::default();
        let mut any = false;

        if self.eat('*') {
            any = true;
        } else if self
            .peek()
            .map(|c| c.is_alphabetic() || c == '_' || !c.is_ascii())
            .unwrap_or(false)
        {
            compound.tag = Some(self.ident()?.to_ascii_lowercase());
            any = true;
        }

        loop {
            let condition = match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    Condition::Id(self.ident()?)
                }
                Some('.') => {
                    self.pos += 1;
                    Condition::Class(self.ident()?)
                }
                Some('[') => {
                    self.pos += 1;
                    self.attribute()?
                }
                Some(':') => {
                    self.pos += 1;
                    self.pseudo()?
                }
                _ => break,
            };
            compound.conditions.push(condition);
            any = true;
        }

        if !any {
            return Err(self.error("expected selector"));
        }
        Ok(compound)
    }

    fn attribute(&mut self) -> Result<Condition> {
        self.skip_ws();
        let name = self.ident()?.to_ascii_lowercase();
        self.skip_ws();
        if self.eat(']') {
            return Ok(Condition::HasAttr(name));
        }
        self.expect('=')?;
        self.skip_ws();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let start = self.pos;
                while self.peek().map(|c| c != quote).unwrap_or(false) {
                    self.pos += 1;
                }
                let value: String = self.chars[start..self.pos].iter().collect();
                self.expect(quote)?;
                value
            }
            _ => self.ident()?,
        };
        self.skip_ws();
        self.expect(']')?;
        Ok(Condition::AttrEquals(name, value))
    }

    fn pseudo(&mut self) -> Result<Condition> {
        let name = self.ident()?.to_ascii_lowercase();
        match name.as_str() {
            "not" => {
                self.expect('(')?;
                self.skip_ws();
                let inner = self.compound()?;
                self.skip_ws();
                self.expect(')')?;
                Ok(Condition::Not(Box::new(inner)))
            }
            "nth-child" => {
                self.expect('(')?;
                self.skip_ws();
                let start = self.pos;
                while self.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) {
                    self.pos += 1;
                }
                let digits: String = self.chars[start..self.pos].iter().collect();
                let n: usize = digits
                    .parse()
                    .map_err(|_| self.error("nth-child only supports a plain index"))?;
                if n == 0 {
                    return Err(self.error("nth-child index starts at 1"));
                }
                self.skip_ws();
                self.expect(')')?;
                Ok(Condition::NthChild(n))
            }
            "first-child" => Ok(Condition::FirstChild),
            "last-child" => Ok(Condition::LastChild),
            other => Err(self.error(&format!("unsupported pseudo-class `:{other}`"))),
        }
    }
}
