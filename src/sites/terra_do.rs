// Terra.do climate job board

use crate::adapter::{required_anchor, required_text, wrap_control, SiteAdapter, SiteKind};
use crate::dom::{NodeId, Page};
use crate::error::Result;

pub struct TerraDoAdapter;

impl TerraDoAdapter {
    pub fn new() -> Self {
        TerraDoAdapter
    }
}

impl Default for TerraDoAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteAdapter for TerraDoAdapter {
    fn kind(&self) -> SiteKind {
        SiteKind::TerraDo
    }

    fn list_company_elements(&self, page: &Page) -> Result<Vec<NodeId>> {
        page.select(page.document(), "#search-results > div")
    }

    fn extract_name(&self, page: &Page, element: NodeId) -> Result<String> {
        required_text(page, element, "p > a", self.kind())
    }

    fn insertion_anchor(&self, page: &Page, element: NodeId) -> Result<NodeId> {
        required_anchor(page, element, ".flex > .flex-col", self.kind())
    }

    fn attach_control(&self, page: &mut Page, column: NodeId, control: NodeId) {
        let row = wrap_control(page, "div", control, true);
        page.append_child(column, row);

        // The site styles every button with `!important`
        page.set_style(control, "padding", "0.5rem 0.75rem", true);
        page.set_style(control, "color", "white", true);
        page.set_style(control, "border-radius", "0.5rem", false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_important_styles() {
        let html = r#"<div id="search-results">
  <div><div class="flex"><div class="flex-col"><p><a href="/c/1">Watershed</a></p></div></div></div>
</div>"#;
        let mut page = Page::parse("https://terra.do/climate-jobs/job-board/", html);
        let adapter = TerraDoAdapter::new();
        let results = adapter.list_company_elements(&page).unwrap();

        let result = adapter.company_result(&mut page, results[0]).unwrap();
        assert_eq!(result.name, "Watershed");

        let button = page.select_first(results[0], ".flex-col > div > button").unwrap().unwrap();
        let style = page.attr(button, "style").unwrap();
        assert!(style.contains("padding: 0.5rem 0.75rem !important;"));
        assert!(style.contains("color: white !important;"));
    }
}
