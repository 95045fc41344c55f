// Getro-hosted boards (jobs.ffwd.org, *.getro.com)

use crate::adapter::{required_anchor, required_text, wrap_control, SiteAdapter, SiteKind};
use crate::dom::{NodeId, Page};
use crate::error::Result;

pub struct GetroAdapter;

impl GetroAdapter {
    pub fn new() -> Self {
        GetroAdapter
    }
}

impl Default for GetroAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteAdapter for GetroAdapter {
    fn kind(&self) -> SiteKind {
        SiteKind::Getro
    }

    fn list_company_elements(&self, page: &Page) -> Result<Vec<NodeId>> {
        page.select(
            page.document(),
            r#".infinite-scroll-component > [data-testid="job-list-item"]"#,
        )
    }

    fn extract_name(&self, page: &Page, element: NodeId) -> Result<String> {
        required_text(page, element, r#"[itemprop="hiringOrganization"]"#, self.kind())
    }

    fn insertion_anchor(&self, page: &Page, element: NodeId) -> Result<NodeId> {
        required_anchor(page, element, ".job-info", self.kind())
    }

    fn attach_control(&self, page: &mut Page, info: NodeId, control: NodeId) {
        let row = wrap_control(page, "div", control, false);
        page.append_child(info, row);
        page.set_style(control, "padding", "0.5rem 0.75rem", false);
        page.set_style(control, "border-radius", "0.5rem", false);
        page.set_style(control, "margin-top", "0.5rem", false);
        // Same stacking as the card's other links, above "Read more"
        page.set_style(control, "position", "relative", false);
        page.set_style(control, "z-index", "2", false);
    }
}
