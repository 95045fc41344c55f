// Site adapters, one per supported job board

mod climatebase;
mod eighty_thousand_hours;
mod getro;
mod hacker_news;
mod tech_jobs_for_good;
mod terra_do;
mod wellfound;
mod work_at_a_startup;

pub use climatebase::ClimatebaseAdapter;
pub use eighty_thousand_hours::EightyThousandHoursAdapter;
pub use getro::GetroAdapter;
pub use hacker_news::HackerNewsAdapter;
pub use tech_jobs_for_good::TechJobsForGoodAdapter;
pub use terra_do::TerraDoAdapter;
pub use wellfound::WellfoundAdapter;
pub use work_at_a_startup::WorkAtAStartupAdapter;

use crate::adapter::{SiteAdapter, SiteKind};

/// Get the adapter for a site
///
/// Factory pattern: Returns Box<dyn SiteAdapter> for polymorphism
pub fn adapter_for(kind: SiteKind) -> Box<dyn SiteAdapter> {
    match kind {
        SiteKind::Wellfound => Box::new(WellfoundAdapter::new()),
        SiteKind::TechJobsForGood => Box::new(TechJobsForGoodAdapter::new()),
        SiteKind::WorkAtAStartup => Box::new(WorkAtAStartupAdapter::new()),
        SiteKind::Climatebase => Box::new(ClimatebaseAdapter::new()),
        SiteKind::TerraDo => Box::new(TerraDoAdapter::new()),
        SiteKind::Getro => Box::new(GetroAdapter::new()),
        SiteKind::HackerNewsWhoIsHiring => Box::new(HackerNewsAdapter::new()),
        SiteKind::EightyThousandHours => Box::new(EightyThousandHoursAdapter::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_returns_matching_kind() {
        for kind in SiteKind::all() {
            assert_eq!(adapter_for(kind).kind(), kind);
        }
    }
}
