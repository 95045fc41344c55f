// Work at a Startup (Y Combinator)

use crate::adapter::{required_anchor, required_text, wrap_control, SiteAdapter, SiteKind};
use crate::dom::{NodeId, Page};
use crate::error::{Error, Result};

pub struct WorkAtAStartupAdapter;

impl WorkAtAStartupAdapter {
    pub fn new() -> Self {
        WorkAtAStartupAdapter
    }
}

impl Default for WorkAtAStartupAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteAdapter for WorkAtAStartupAdapter {
    fn kind(&self) -> SiteKind {
        SiteKind::WorkAtAStartup
    }

    fn list_company_elements(&self, page: &Page) -> Result<Vec<NodeId>> {
        page.select(page.document(), ".directory-list > div:not(.loading)")
    }

    fn extract_name(&self, page: &Page, element: NodeId) -> Result<String> {
        required_text(page, element, ".company-name", self.kind())
    }

    /// Last row of the details column
    fn insertion_anchor(&self, page: &Page, element: NodeId) -> Result<NodeId> {
        let column = required_anchor(page, element, ".w-full", self.kind())?;
        page.element_children(column)
            .last()
            .copied()
            .ok_or_else(|| Error::bind(self.kind().name(), "`.w-full` has no rows"))
    }

    fn attach_control(&self, page: &mut Page, last_row: NodeId, control: NodeId) {
        let row = wrap_control(page, "div", control, true);
        page.insert_after(last_row, row);
        page.set_style(control, "padding", "0.5rem 0.75rem", false);
        page.set_style(control, "border-radius", "0.5rem", false);
        page.set_style(control, "margin-top", "0.75rem", false);
        page.set_style(control, "margin-left", "auto", false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIRECTORY: &str = r#"<div class="directory-list">
  <div><div class="w-full"><div><span class="company-name">Hooli (W21)</span></div><div>Jobs</div></div></div>
  <div class="loading">Loading…</div>
</div>"#;

    #[test]
    fn test_loading_placeholder_is_skipped() {
        let page = Page::parse("https://www.workatastartup.com/companies", DIRECTORY);
        let adapter = WorkAtAStartupAdapter::new();
        assert_eq!(adapter.list_company_elements(&page).unwrap().len(), 1);
    }

    #[test]
    fn test_row_appended_after_last_row() {
        let mut page = Page::parse("https://www.workatastartup.com/companies", DIRECTORY);
        let adapter = WorkAtAStartupAdapter::new();
        let companies = adapter.list_company_elements(&page).unwrap();

        let result = adapter.company_result(&mut page, companies[0]).unwrap();
        assert_eq!(result.name, "Hooli (W21)");

        let column = page.select_first(companies[0], ".w-full").unwrap().unwrap();
        let rows = page.element_children(column);
        assert_eq!(rows.len(), 3);
        assert_eq!(page.style(rows[2], "display").as_deref(), Some("flex"));
        assert_eq!(page.text(rows[2]), "Hide Company");
    }
}
