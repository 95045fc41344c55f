// 👀 Observation Loop
// Owns the page, re-runs the binding pass on page-ready, host mutations
// (throttled) and hide-control clicks.

use crate::adapter::{BOUND_ATTR, COMPANY_ATTR};
use crate::config::Config;
use crate::dom::{NodeId, Page};
use crate::error::{Error, Result};
use crate::hide_list::HideListStore;
use crate::pass::{bind_to_page, PassReport};
use crate::registry::{PageState, SiteRegistry};
use crate::storage::ValueStore;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};

const EVENT_BUFFER: usize = 64;

// ============================================================================
// THROTTLE
// ============================================================================

/// Leading + trailing edge throttle over a fixed window.
///
/// A trigger outside a window runs immediately and opens a window. Triggers
/// inside it collapse into one trailing run at the window's end, which opens
/// the next window.
#[derive(Debug, Clone)]
pub struct Throttle {
    window: Duration,
    window_end: Option<Instant>,
    pending: bool,
}

impl Throttle {
    pub fn new(window: Duration) -> Self {
        Throttle {
            window,
            window_end: None,
            pending: false,
        }
    }

    /// Record a trigger at `now`; true when the caller should run right away
    pub fn trigger(&mut self, now: Instant) -> bool {
        match self.window_end {
            Some(end) if now < end => {
                self.pending = true;
                false
            }
            _ => {
                self.window_end = Some(now + self.window);
                true
            }
        }
    }

    /// When the collapsed trailing run is due, if one is owed
    pub fn trailing_deadline(&self) -> Option<Instant> {
        if self.pending {
            self.window_end
        } else {
            None
        }
    }

    /// Take the owed trailing run (if any), opening a new window at `now`
    pub fn fire_trailing(&mut self, now: Instant) -> bool {
        if !self.pending {
            return false;
        }
        self.pending = false;
        self.window_end = Some(now + self.window);
        true
    }
}

// ============================================================================
// EVENTS
// ============================================================================

/// What happened to a click after the loop saw it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// A hide control handled it; the host's default action is suppressed
    Consumed,
    /// Not ours
    Default,
}

pub enum PageEvent {
    /// The host changed the document (infinite scroll, re-render)
    Mutated(Box<dyn FnOnce(&mut Page) + Send>),
    /// Client-side navigation
    Navigated { url: String, title: Option<String> },
    /// User activation on `target`
    Click {
        target: NodeId,
        reply: Option<oneshot::Sender<ClickOutcome>>,
    },
    /// Read-only look at the current document
    Inspect(Box<dyn FnOnce(&Page) + Send>),
    Shutdown,
}

/// Returned by `ObservationLoop::run` once it stops
#[derive(Debug)]
pub struct LoopSummary {
    pub page: Page,
    pub passes: Vec<PassReport>,
}

// ============================================================================
// HANDLE
// ============================================================================

/// Sender side of a running loop; cheap to clone
#[derive(Clone)]
pub struct LoopHandle {
    events: mpsc::Sender<PageEvent>,
}

impl LoopHandle {
    async fn send(&self, event: PageEvent) -> Result<()> {
        self.events.send(event).await.map_err(|_| Error::LoopClosed)
    }

    pub async fn mutate<F>(&self, mutation: F) -> Result<()>
    where
        F: FnOnce(&mut Page) + Send + 'static,
    {
        self.send(PageEvent::Mutated(Box::new(mutation))).await
    }

    pub async fn navigate(&self, url: impl Into<String>, title: Option<String>) -> Result<()> {
        self.send(PageEvent::Navigated {
            url: url.into(),
            title,
        })
        .await
    }

    pub async fn click(&self, target: NodeId) -> Result<ClickOutcome> {
        let (reply, outcome) = oneshot::channel();
        self.send(PageEvent::Click {
            target,
            reply: Some(reply),
        })
        .await?;
        outcome.await.map_err(|_| Error::LoopClosed)
    }

    /// Run `query` against the current document and return its answer
    pub async fn inspect<F, T>(&self, query: F) -> Result<T>
    where
        F: FnOnce(&Page) -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.send(PageEvent::Inspect(Box::new(move |page: &Page| {
            let _ = tx.send(query(page));
        })))
        .await?;
        rx.await.map_err(|_| Error::LoopClosed)
    }

    /// The hide control for `company_name`, if the page has one
    pub async fn hide_control(&self, company_name: &str) -> Result<Option<NodeId>> {
        let name = company_name.to_string();
        self.inspect(move |page| find_hide_control(page, &name)).await?
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(PageEvent::Shutdown).await
    }
}

fn find_hide_control(page: &Page, company_name: &str) -> Result<Option<NodeId>> {
    Ok(page
        .select(page.document(), &format!("button[{COMPANY_ATTR}]"))?
        .into_iter()
        .find(|&button| page.attr(button, COMPANY_ATTR) == Some(company_name)))
}

// ============================================================================
// LOOP
// ============================================================================

/// Single-task event loop over one page.
///
/// Passes never overlap: the loop runs them inline between events.
pub struct ObservationLoop<S: ValueStore> {
    page: Page,
    registry: SiteRegistry,
    store: HideListStore<S>,
    throttle: Throttle,
    events: mpsc::Receiver<PageEvent>,
    passes: Vec<PassReport>,
}

impl<S: ValueStore> ObservationLoop<S> {
    pub fn new(
        page: Page,
        registry: SiteRegistry,
        store: HideListStore<S>,
        config: &Config,
    ) -> (Self, LoopHandle) {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let observation = ObservationLoop {
            page,
            registry,
            store,
            throttle: Throttle::new(config.throttle()),
            events: rx,
            passes: Vec::new(),
        };
        (observation, LoopHandle { events: tx })
    }

    /// Run until `Shutdown` or until every handle is dropped.
    /// A trailing pass still owed at shutdown runs before returning.
    pub async fn run(mut self) -> LoopSummary {
        self.run_pass("page ready");

        loop {
            let deadline = self.throttle.trailing_deadline();
            tokio::select! {
                event = self.events.recv() => {
                    match event {
                        Some(PageEvent::Mutated(mutation)) => {
                            mutation(&mut self.page);
                            self.on_trigger("mutation");
                        }
                        Some(PageEvent::Navigated { url, title }) => {
                            self.page.set_url(url);
                            if let Some(title) = title {
                                self.page.set_title(&title);
                            }
                            self.on_trigger("navigation");
                        }
                        Some(PageEvent::Click { target, reply }) => {
                            let outcome = self.on_click(target);
                            if let Some(reply) = reply {
                                let _ = reply.send(outcome);
                            }
                        }
                        Some(PageEvent::Inspect(query)) => query(&self.page),
                        Some(PageEvent::Shutdown) | None => break,
                    }
                }
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if self.throttle.fire_trailing(Instant::now()) {
                        self.run_pass("throttled");
                    }
                }
            }
        }

        if self.throttle.fire_trailing(Instant::now()) {
            self.run_pass("flush");
        }
        info!(passes = self.passes.len(), "observation loop stopped");
        LoopSummary {
            page: self.page,
            passes: self.passes,
        }
    }

    fn on_trigger(&mut self, trigger: &'static str) {
        if self.throttle.trigger(Instant::now()) {
            self.run_pass(trigger);
        } else {
            debug!(trigger, "pass deferred to end of throttle window");
        }
    }

    fn run_pass(&mut self, trigger: &'static str) {
        match bind_to_page(&mut self.page, &self.registry, &self.store) {
            Ok(report) => {
                debug!(trigger, summary = %report.summary(), "binding pass");
                self.passes.push(report);
            }
            Err(err) => error!(trigger, error = %err, "binding pass failed"),
        }
    }

    fn on_click(&mut self, target: NodeId) -> ClickOutcome {
        let control = match self.page.closest(target, &format!("button[{COMPANY_ATTR}]")) {
            Ok(Some(control)) => control,
            Ok(None) => return ClickOutcome::Default,
            Err(err) => {
                error!(error = %err, "click dispatch failed");
                return ClickOutcome::Default;
            }
        };
        let Some(company_name) = self.page.attr(control, COMPANY_ATTR).map(str::to_string) else {
            return ClickOutcome::Default;
        };

        if let Err(err) = self.store.append(&company_name) {
            error!(company = %company_name, error = %err, "could not hide company");
            return ClickOutcome::Consumed;
        }

        if let Err(err) = self.hide_listing(control) {
            warn!(company = %company_name, error = %err, "listing not hidden until next pass");
        }
        self.run_pass("hide click");
        ClickOutcome::Consumed
    }

    /// Hide the bound listing that holds `control`
    fn hide_listing(&mut self, control: NodeId) -> Result<()> {
        let Some(parent) = self.page.parent(control) else {
            return Ok(());
        };
        let Some(listing) = self.page.closest(parent, &format!("[{BOUND_ATTR}]"))? else {
            return Ok(());
        };
        if let Some(adapter) = self.registry.resolve(&PageState::of(&self.page)) {
            adapter.hide(&mut self.page, listing)?;
        }
        Ok(())
    }
}
