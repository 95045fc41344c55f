// 80,000 Hours job board

use crate::adapter::{required_text, SiteAdapter, SiteKind};
use crate::dom::{NodeId, Page};
use crate::error::Result;

pub struct EightyThousandHoursAdapter;

impl EightyThousandHoursAdapter {
    pub fn new() -> Self {
        EightyThousandHoursAdapter
    }
}

impl Default for EightyThousandHoursAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteAdapter for EightyThousandHoursAdapter {
    fn kind(&self) -> SiteKind {
        SiteKind::EightyThousandHours
    }

    fn list_company_elements(&self, page: &Page) -> Result<Vec<NodeId>> {
        page.select(page.document(), "button.job-card")
    }

    fn extract_name(&self, page: &Page, element: NodeId) -> Result<String> {
        required_text(page, element, ".flex-col > div:nth-child(2)", self.kind())
    }

    /// The card itself; the control goes last
    fn insertion_anchor(&self, _page: &Page, element: NodeId) -> Result<NodeId> {
        Ok(element)
    }

    fn attach_control(&self, page: &mut Page, card: NodeId, control: NodeId) {
        page.append_child(card, control);
        page.set_style(control, "padding", "0.5rem 0.75rem", false);
        page.set_style(control, "border-radius", "0.5rem", false);
        page.set_style(control, "margin-top", "0.5rem", false);
    }
}
