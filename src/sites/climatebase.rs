// Climatebase

use crate::adapter::{required_text, wrap_control, SiteAdapter, SiteKind};
use crate::dom::{NodeId, Page};
use crate::error::{Error, Result};

pub struct ClimatebaseAdapter;

impl ClimatebaseAdapter {
    pub fn new() -> Self {
        ClimatebaseAdapter
    }
}

impl Default for ClimatebaseAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteAdapter for ClimatebaseAdapter {
    fn kind(&self) -> SiteKind {
        SiteKind::Climatebase
    }

    fn list_company_elements(&self, page: &Page) -> Result<Vec<NodeId>> {
        page.select(page.document(), "#jobList > .list_card")
    }

    fn extract_name(&self, page: &Page, element: NodeId) -> Result<String> {
        required_text(page, element, ".list_card__subtitle", self.kind())
    }

    fn insertion_anchor(&self, page: &Page, element: NodeId) -> Result<NodeId> {
        // Some cards have no tags row
        match page.select_first(element, ".list_card__tags")? {
            Some(tags) => Ok(tags),
            None => page.select_first(element, ".list_card__metadata")?.ok_or_else(|| {
                Error::bind(self.kind().name(), "neither tags nor metadata row in card")
            }),
        }
    }

    fn attach_control(&self, page: &mut Page, anchor: NodeId, control: NodeId) {
        let row = wrap_control(page, "div", control, true);
        page.insert_after(anchor, row);
        page.set_style(control, "padding", "0.5rem 0.75rem", false);
        page.set_style(control, "border-radius", "0.5rem", false);
        page.set_style(control, "margin-top", "0.75rem", false);
        page.set_style(control, "margin-left", "auto", false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JOBS: &str = r#"<div id="jobList">
  <a class="list_card" href="/job/1">
    <div class="list_card__subtitle">Form Energy</div>
    <div class="list_card__metadata">Remote</div>
    <div class="list_card__tags">Energy</div>
  </a>
  <a class="list_card" href="/job/2">
    <div class="list_card__subtitle">Novi Connect</div>
    <div class="list_card__metadata">Remote</div>
  </a>
</div>"#;

    #[test]
    fn test_falls_back_to_metadata_row() {
        let mut page = Page::parse("https://climatebase.org/jobs", JOBS);
        let adapter = ClimatebaseAdapter::new();
        let cards = adapter.list_company_elements(&page).unwrap();
        assert_eq!(cards.len(), 2);

        for &card in &cards {
            adapter.company_result(&mut page, card).unwrap();
        }

        let first = page.element_children(cards[0]);
        assert!(page.has_class(first[2], "list_card__tags"));
        assert_eq!(page.text(first[3]), "Hide Company");

        let second = page.element_children(cards[1]);
        assert!(page.has_class(second[1], "list_card__metadata"));
        assert_eq!(page.text(second[2]), "Hide Company");
    }
}
