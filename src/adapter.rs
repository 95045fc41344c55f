// 🏗️ Site Adapter Framework
// One adapter per supported job board, all behind the same capability trait

use crate::dom::{NodeId, Page};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Marker set on a company element once its hide control is attached.
/// Part of the element's observable contract: later passes rely on it.
pub const BOUND_ATTR: &str = "data-jsa-bound";

/// Company name carried by the hide control itself
pub const COMPANY_ATTR: &str = "data-jsa-company";

pub const HIDE_BUTTON_LABEL: &str = "Hide Company";

const HIDE_BUTTON_STYLE: &[(&str, &str)] = &[
    ("background", "linear-gradient(to left, rgb(127, 53, 185), rgb(124, 58, 237))"),
    (
        "filter",
        "drop-shadow(rgba(0, 0, 0, 0.07) 0px 4px 3px) drop-shadow(rgba(0, 0, 0, 0.06) 0px 2px 2px)",
    ),
    ("color", "white"),
    ("border", "0"),
    ("font-weight", "500"),
    ("cursor", "pointer"),
];

// ============================================================================
// CORE TYPES
// ============================================================================

/// SiteKind - closed set of supported job boards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SiteKind {
    Wellfound,
    TechJobsForGood,
    WorkAtAStartup,
    Climatebase,
    TerraDo,
    Getro,
    HackerNewsWhoIsHiring,
    EightyThousandHours,
}

impl SiteKind {
    /// Human-readable name for display
    pub fn name(&self) -> &'static str {
        match self {
            SiteKind::Wellfound => "Wellfound",
            SiteKind::TechJobsForGood => "Tech Jobs for Good",
            SiteKind::WorkAtAStartup => "Work at a Startup",
            SiteKind::Climatebase => "Climatebase",
            SiteKind::TerraDo => "Terra.do",
            SiteKind::Getro => "Getro",
            SiteKind::HackerNewsWhoIsHiring => "HN Who is hiring",
            SiteKind::EightyThousandHours => "80,000 Hours",
        }
    }

    pub fn all() -> [SiteKind; 8] {
        [
            SiteKind::Wellfound,
            SiteKind::TechJobsForGood,
            SiteKind::WorkAtAStartup,
            SiteKind::Climatebase,
            SiteKind::TerraDo,
            SiteKind::Getro,
            SiteKind::HackerNewsWhoIsHiring,
            SiteKind::EightyThousandHours,
        ]
    }
}

/// CompanyResult - one listing found in the current pass.
/// Re-created every pass; the page owns the element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyResult {
    pub name: String,
    pub element: NodeId,
    pub bound: bool,
}

/// Outcome of binding one element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindOutcome {
    /// A control was injected now
    Bound(NodeId),
    /// The element carried the marker from an earlier pass
    AlreadyBound,
}

// ============================================================================
// CAPABILITY TRAIT
// ============================================================================

/// SiteAdapter - the capability set every supported site implements.
///
/// Adding a site = one `SiteKind` variant, one implementation, one registry rule.
pub trait SiteAdapter: Send + Sync {
    fn kind(&self) -> SiteKind;

    /// DOM nodes representing one company/job listing each, in document order
    fn list_company_elements(&self, page: &Page) -> Result<Vec<NodeId>>;

    /// Display name for one listing.
    ///
    /// Fails with `Error::Extraction` when the expected sub-element is missing;
    /// a wrong name would corrupt the hide list's identity space.
    fn extract_name(&self, page: &Page, element: NodeId) -> Result<String>;

    /// Node inside `element` the control is placed relative to.
    /// Fails with `Error::Bind` when the listing has no such node.
    fn insertion_anchor(&self, page: &Page, element: NodeId) -> Result<NodeId>;

    /// Put `control` at `anchor`, styled for the site
    fn attach_control(&self, page: &mut Page, anchor: NodeId, control: NodeId);

    /// Idempotent: a bound element is left untouched.
    /// Nothing is created when the anchor is missing.
    fn bind(&self, page: &mut Page, element: NodeId, name: &str) -> Result<BindOutcome> {
        if is_bound(page, element)? {
            return Ok(BindOutcome::AlreadyBound);
        }
        let anchor = self.insertion_anchor(page, element)?;
        let control = make_hide_button(page, name);
        self.attach_control(page, anchor, control);
        page.set_attr(element, BOUND_ATTR, "true");
        Ok(BindOutcome::Bound(control))
    }

    /// Idempotent: hiding twice leaves the element hidden
    fn hide(&self, page: &mut Page, element: NodeId) -> Result<()> {
        page.hide(element);
        Ok(())
    }

    /// Extract + bind one element
    fn company_result(&self, page: &mut Page, element: NodeId) -> Result<CompanyResult> {
        let name = self.extract_name(page, element)?;
        self.bind(page, element, &name)?;
        Ok(CompanyResult {
            name,
            element,
            bound: true,
        })
    }
}

// ============================================================================
// SHARED HELPERS
// ============================================================================

/// Element carries the marker, or holds a control from an older revision
pub fn is_bound(page: &Page, element: NodeId) -> Result<bool> {
    if page.attr(element, BOUND_ATTR).is_some() {
        return Ok(true);
    }
    Ok(!page
        .select(element, &format!("button[{BOUND_ATTR}]"))?
        .is_empty())
}

/// Detached `Hide Company` button carrying the company name
pub fn make_hide_button(page: &mut Page, name: &str) -> NodeId {
    let button = page.create_element("button");
    for (property, value) in HIDE_BUTTON_STYLE {
        page.set_style(button, property, value, false);
    }
    page.set_text(button, HIDE_BUTTON_LABEL);
    page.set_attr(button, BOUND_ATTR, "true");
    page.set_attr(button, COMPANY_ATTR, name);
    page.set_attr(button, "title", &format!("Hide Company ({name})"));
    button
}

/// `<tag style="display: flex">` (or plain) holding `control`
pub fn wrap_control(page: &mut Page, tag: &str, control: NodeId, flex: bool) -> NodeId {
    let wrapper = page.create_element(tag);
    if flex {
        page.set_style(wrapper, "display", "flex", false);
    }
    page.append_child(wrapper, control);
    wrapper
}

/// Text of the first `css` match under `element`, as an Extraction error when absent
pub fn required_text(page: &Page, element: NodeId, css: &str, site: SiteKind) -> Result<String> {
    let node = page
        .select_first(element, css)?
        .ok_or_else(|| Error::extraction(site.name(), format!("no `{css}` in listing")))?;
    non_empty(page.text(node), css, site)
}

pub fn non_empty(name: String, css: &str, site: SiteKind) -> Result<String> {
    if name.is_empty() {
        return Err(Error::extraction(site.name(), format!("`{css}` is empty")));
    }
    Ok(name)
}

/// First `css` match under `element`, as a Bind error when absent
pub fn required_anchor(page: &Page, element: NodeId, css: &str, site: SiteKind) -> Result<NodeId> {
    page.select_first(element, css)?
        .ok_or_else(|| Error::bind(site.name(), format!("insertion anchor `{css}` not found")))
}
