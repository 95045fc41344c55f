// Job Search Assist - Core Library
// Hide-company controls for job boards: hide list store, site adapters,
// binding pass and the observation loop that re-runs it.

pub mod config;
pub mod error;
pub mod logging;
pub mod storage;
pub mod hide_list;
pub mod dom;
pub mod adapter;
pub mod sites;
pub mod registry;
pub mod pass;
pub mod observer;
pub mod commands;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use storage::{MemoryValueStore, SqliteValueStore, ValueStore};
pub use hide_list::{is_hidden, HideEntry, HideList, HideListStore, PendingAppend};
pub use dom::{NodeId, Page};
pub use adapter::{BindOutcome, CompanyResult, SiteAdapter, SiteKind};
pub use sites::adapter_for;
pub use registry::{PageState, SiteRegistry};
pub use pass::{bind_to_page, ElementFailure, PassReport};
pub use observer::{ClickOutcome, LoopHandle, LoopSummary, ObservationLoop, PageEvent, Throttle};
pub use commands::{ClearOutcome, Dump, Prompt};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
