// 🧭 Site Registry
// Ordered URL rules → the adapter for the current page (first match wins)

use crate::adapter::{SiteAdapter, SiteKind};
use crate::dom::Page;
use crate::error::Result;
use crate::sites::adapter_for;
use regex::Regex;

/// Navigation state a rule is evaluated against
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageState {
    pub url: String,
    pub title: String,
}

impl PageState {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        PageState {
            url: url.into(),
            title: title.into(),
        }
    }

    pub fn of(page: &Page) -> Self {
        PageState::new(page.url(), page.title())
    }
}

/// Extra check for sites the URL alone cannot identify
pub type PageMatcher = fn(&PageState) -> bool;

struct Rule {
    pattern: Regex,
    kind: SiteKind,
    additional: Option<PageMatcher>,
}

impl Rule {
    fn matches(&self, state: &PageState) -> bool {
        self.pattern.is_match(&state.url) && self.additional.map_or(true, |check| check(state))
    }
}

fn is_who_is_hiring_thread(state: &PageState) -> bool {
    state.title.starts_with("Ask HN: Who is hiring?")
}

pub struct SiteRegistry {
    rules: Vec<Rule>,
}

impl SiteRegistry {
    /// No rules; every page resolves to nothing
    pub fn empty() -> Self {
        SiteRegistry { rules: Vec::new() }
    }

    /// The supported job boards
    pub fn new() -> Result<Self> {
        SiteRegistry::empty()
            .with_rule(r"^https://wellfound\.com/", SiteKind::Wellfound, None)?
            .with_rule(r"^https://www\.techjobsforgood\.com/", SiteKind::TechJobsForGood, None)?
            .with_rule(r"^https://www\.workatastartup\.com/", SiteKind::WorkAtAStartup, None)?
            .with_rule(r"^https://climatebase\.org/", SiteKind::Climatebase, None)?
            .with_rule(r"^https://terra\.do/", SiteKind::TerraDo, None)?
            .with_rule(r"^https://jobs\.ffwd\.org/", SiteKind::Getro, None)?
            .with_rule(r"^https://[^./]+\.getro\.com/", SiteKind::Getro, None)?
            .with_rule(
                r"^https://news\.ycombinator\.com/item",
                SiteKind::HackerNewsWhoIsHiring,
                Some(is_who_is_hiring_thread),
            )?
            .with_rule(r"^https://jobs\.80000hours\.org/", SiteKind::EightyThousandHours, None)
    }

    /// Append a rule; evaluated after all earlier ones
    pub fn with_rule(
        mut self,
        pattern: &str,
        kind: SiteKind,
        additional: Option<PageMatcher>,
    ) -> Result<Self> {
        self.rules.push(Rule {
            pattern: Regex::new(pattern)?,
            kind,
            additional,
        });
        Ok(self)
    }

    pub fn resolve_kind(&self, state: &PageState) -> Option<SiteKind> {
        self.rules
            .iter()
            .find(|rule| rule.matches(state))
            .map(|rule| rule.kind)
    }

    /// None is not an error: the host runs on pages no rule covers
    pub fn resolve(&self, state: &PageState) -> Option<Box<dyn SiteAdapter>> {
        self.resolve_kind(state).map(adapter_for)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
