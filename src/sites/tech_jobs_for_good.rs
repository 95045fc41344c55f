// Tech Jobs for Good

use crate::adapter::{non_empty, SiteAdapter, SiteKind};
use crate::dom::{NodeId, Page};
use crate::error::{Error, Result};

pub struct TechJobsForGoodAdapter;

impl TechJobsForGoodAdapter {
    pub fn new() -> Self {
        TechJobsForGoodAdapter
    }
}

impl Default for TechJobsForGoodAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteAdapter for TechJobsForGoodAdapter {
    fn kind(&self) -> SiteKind {
        SiteKind::TechJobsForGood
    }

    fn list_company_elements(&self, page: &Page) -> Result<Vec<NodeId>> {
        page.select(page.document(), ".three.column.grid .ui.card")
    }

    fn extract_name(&self, page: &Page, element: NodeId) -> Result<String> {
        // Markup, not rendered text: the site's CSS uppercases the rendered name
        let node = page
            .select_first(element, ".company_name")?
            .ok_or_else(|| Error::extraction(self.kind().name(), "no `.company_name` in card"))?;
        non_empty(page.inner_html(node), ".company_name", self.kind())
    }

    /// The posted-time row, a direct child of the card
    fn insertion_anchor(&self, page: &Page, element: NodeId) -> Result<NodeId> {
        for child in page.element_children(element) {
            if page.matches(child, ".extra.content")? {
                return Ok(child);
            }
        }
        Err(Error::bind(self.kind().name(), "no `.extra.content` row in card"))
    }

    fn attach_control(&self, page: &mut Page, posted_time: NodeId, control: NodeId) {
        page.insert_after(posted_time, control);
        page.set_style(control, "padding", "0.75rem", false);
        page.set_style(control, "display", "block", false);
    }
}
