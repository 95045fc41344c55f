// Wellfound (formerly AngelList Talent)

use crate::adapter::{required_text, SiteAdapter, SiteKind};
use crate::dom::{NodeId, Page};
use crate::error::{Error, Result};

// `:not` filters out the compact "featured" strip
const RESULTS: &str = r#"div:not([data-test="FeaturedStartups"]) > * > [data-test="StartupResult"]"#;

pub struct WellfoundAdapter;

impl WellfoundAdapter {
    pub fn new() -> Self {
        WellfoundAdapter
    }
}

impl Default for WellfoundAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteAdapter for WellfoundAdapter {
    fn kind(&self) -> SiteKind {
        SiteKind::Wellfound
    }

    fn list_company_elements(&self, page: &Page) -> Result<Vec<NodeId>> {
        page.select(page.document(), RESULTS)
    }

    fn extract_name(&self, page: &Page, element: NodeId) -> Result<String> {
        required_text(page, element, ".relative h2", self.kind())
    }

    fn insertion_anchor(&self, page: &Page, element: NodeId) -> Result<NodeId> {
        page.select(element, "button")?
            .into_iter()
            .find(|&button| page.text(button).contains("Report"))
            .ok_or_else(|| Error::bind(self.kind().name(), "no `Report` button in listing"))
    }

    fn attach_control(&self, page: &mut Page, report: NodeId, control: NodeId) {
        page.insert_before(report, control);
        page.set_style(control, "padding", "0 0.75rem", false);
        page.set_style(control, "border-radius", "0.5rem", false);
        page.set_style(control, "margin-left", "auto", false);
        page.set_style(control, "margin-right", "0.5rem", false);
        page.set_style(report, "margin-left", "0", false);
    }
}
