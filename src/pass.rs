// 🔁 Binding Pass
// resolve adapter → enumerate → extract + bind → load hide list once → hide matches

use crate::adapter::{is_bound, CompanyResult, SiteKind};
use crate::dom::{NodeId, Page};
use crate::error::Result;
use crate::hide_list::{is_hidden, HideListStore};
use crate::registry::{PageState, SiteRegistry};
use crate::storage::ValueStore;
use tracing::{debug, warn};

/// One element the pass had to skip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementFailure {
    pub element: NodeId,
    pub reason: String,
}

/// What one pass saw and did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// None when no rule matched the page (nothing was touched)
    pub site: Option<SiteKind>,
    pub results: Vec<CompanyResult>,
    pub newly_bound: usize,
    pub hidden: usize,
    pub failures: Vec<ElementFailure>,
}

impl PassReport {
    pub fn summary(&self) -> String {
        match self.site {
            Some(site) => format!(
                "{}: {} companies, {} newly bound, {} hidden, {} failed",
                site.name(),
                self.results.len(),
                self.newly_bound,
                self.hidden,
                self.failures.len()
            ),
            None => "no adapter for this page".to_string(),
        }
    }
}

/// Run one binding pass over `page`.
///
/// Extraction and bind failures are per element: logged, recorded and skipped.
/// A hide list that fails to parse fails the pass.
pub fn bind_to_page<S: ValueStore>(
    page: &mut Page,
    registry: &SiteRegistry,
    store: &HideListStore<S>,
) -> Result<PassReport> {
    let state = PageState::of(page);
    let Some(adapter) = registry.resolve(&state) else {
        debug!(url = %state.url, "no adapter for page");
        return Ok(PassReport::default());
    };

    let mut report = PassReport {
        site: Some(adapter.kind()),
        ..PassReport::default()
    };

    for element in adapter.list_company_elements(page)? {
        let was_bound = is_bound(page, element)?;
        match adapter.company_result(page, element) {
            Ok(result) => {
                if !was_bound {
                    report.newly_bound += 1;
                }
                report.results.push(result);
            }
            Err(err) if err.is_element_local() => {
                warn!(site = adapter.kind().name(), error = %err, "skipping listing");
                report.failures.push(ElementFailure {
                    element,
                    reason: err.to_string(),
                });
            }
            Err(err) => return Err(err),
        }
    }

    let list = store.read()?;
    for result in &report.results {
        if is_hidden(&list, &result.name) {
            adapter.hide(page, result.element)?;
            report.hidden += 1;
        }
    }

    debug!(
        site = adapter.kind().name(),
        companies = ?report.results.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
        "pass complete"
    );
    Ok(report)
}
