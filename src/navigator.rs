use std::rc::Rc;
use std::time::Instant;

use kuchiki::NodeRef;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::chrome::{reload_button_markup, DISMISS_SELECTOR, RELOAD_BUTTON_ID};
use crate::config::NavigatorConfig;
use crate::dom::{self, Document, DomError};
use crate::handlers::{
    anchor_descriptor, form_descriptor, fragment_descriptor, record, replayable,
    toggle_select_all, ANCHOR_SELECTOR, FORM_SELECTOR, SELECT_ALL_SELECTOR,
};
use crate::history::{HistoryError, SessionHistory};
use crate::navigation::{dispatch, DispatchOutcome, PendingDispatch};
use crate::net::{ReqwestTransport, Transport, TransportError};
use crate::page::Page;
use crate::progress::{ProgressIndicator, ProgressTracker, TracingProgress};
use crate::request::{AttachMode, Method, RequestDescriptor};
use crate::window::Window;

#[derive(Debug, Error)]
pub enum NavigatorError {
    #[error("no element matches {0:?}")]
    NoSuchElement(String),
    #[error(transparent)]
    Dom(#[from] DomError),
    #[error("failed to record history entry: {0}")]
    History(#[from] HistoryError),
    #[error("failed to build transport: {0}")]
    Transport(#[from] TransportError),
}

/// What a page event turned into.
pub struct Interaction {
    pub default_prevented: bool,
    pub pending: Option<PendingDispatch>,
}

impl Interaction {
    fn ignored() -> Self {
        Self {
            default_prevented: false,
            pending: None,
        }
    }

    fn handled(pending: Option<PendingDispatch>) -> Self {
        Self {
            default_prevented: true,
            pending,
        }
    }

    pub fn is_handled(&self) -> bool {
        self.default_prevented
    }

    /// Drive the dispatch this interaction issued, if any.
    pub async fn settle(self) -> Option<DispatchOutcome> {
        match self.pending {
            Some(pending) => Some(pending.await),
            None => None,
        }
    }
}

pub struct NavigatorBuilder {
    html: String,
    location: String,
    config: NavigatorConfig,
    transport: Option<Rc<dyn Transport>>,
    progress: Option<Rc<dyn ProgressIndicator>>,
}

impl NavigatorBuilder {
    pub fn new(html: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            location: location.into(),
            config: NavigatorConfig::default(),
            transport: None,
            progress: None,
        }
    }

    pub fn with_config(mut self, config: NavigatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_transport(mut self, transport: Rc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_progress(mut self, indicator: Rc<dyn ProgressIndicator>) -> Self {
        self.progress = Some(indicator);
        self
    }

    pub fn build(self) -> Result<Navigator, NavigatorError> {
        let transport: Rc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Rc::new(ReqwestTransport::new(self.config.request_timeout())?),
        };
        let indicator: Rc<dyn ProgressIndicator> = match self.progress {
            Some(indicator) => indicator,
            None => Rc::new(TracingProgress),
        };

        let document = Document::parse(&self.html);
        if self.config.reload_button {
            match document.body() {
                Some(body) => {
                    dom::merge_markup(&body, &reload_button_markup(), AttachMode::Append)
                }
                None => {
                    warn!(target = "navigate", "document has no body, reload button skipped")
                }
            }
        }

        let page = Page::new(
            document,
            self.location,
            transport,
            ProgressTracker::new(indicator),
            self.config,
        );
        Ok(Navigator {
            page: Rc::new(page),
        })
    }
}

/// Ajax navigation over one page: delegated event handling, request
/// dispatch, and history synchronization.
pub struct Navigator {
    page: Rc<Page>,
}

impl Navigator {
    pub fn builder(html: impl Into<String>, location: impl Into<String>) -> NavigatorBuilder {
        NavigatorBuilder::new(html, location)
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn document(&self) -> &Document {
        self.page.document()
    }

    /// Snapshot of the window. Dispatches update the live window, so a
    /// snapshot taken before an await does not see their effects.
    pub fn window(&self) -> Window {
        self.page.window().clone()
    }

    /// Snapshot of the session history.
    pub fn history(&self) -> SessionHistory {
        self.page.history().clone()
    }

    pub fn base_url(&self) -> &str {
        self.page.base_url()
    }

    pub fn dispatch(&self, descriptor: RequestDescriptor) -> PendingDispatch {
        dispatch(&self.page, descriptor)
    }

    /// Replay the address fragment the page was opened with, if any.
    pub fn initial_load(&self) -> Option<PendingDispatch> {
        let fragment = self.page.window().hash()?.to_string();
        let descriptor = fragment_descriptor(
            &fragment,
            self.page.base_url(),
            &self.page.config().default_destination,
        );
        info!(target = "navigate", fragment = %fragment, "loading address fragment");
        Some(self.dispatch(descriptor))
    }

    pub fn click(&self, selector: &str) -> Result<Interaction, NavigatorError> {
        let target = self.element(selector)?;
        self.click_node(&target)
    }

    /// Deliver a click to `target`, routed to the closest handler that claims it.
    pub fn click_node(&self, target: &NodeRef) -> Result<Interaction, NavigatorError> {
        if dom::closest(target, &dom::compile(&format!("#{RELOAD_BUTTON_ID}"))?).is_some() {
            return Ok(Interaction::handled(self.reload()));
        }

        if dom::closest(target, &dom::compile(DISMISS_SELECTOR)?).is_some()
            && self.page.dismiss_banner(target)
        {
            return Ok(Interaction::handled(None));
        }

        let Some(anchor) = dom::closest(target, &dom::compile(ANCHOR_SELECTOR)?) else {
            return Ok(Interaction::ignored());
        };

        let descriptor = anchor_descriptor(&anchor, &self.page.config().default_destination);
        let pending = self.dispatch(descriptor.clone());
        if !descriptor.temporary {
            record(&self.page, &descriptor)?;
        }
        Ok(Interaction::handled(Some(pending)))
    }

    pub fn submit(&self, selector: &str) -> Result<Interaction, NavigatorError> {
        let target = self.element(selector)?;
        let Some(form) = dom::closest(&target, &dom::compile(FORM_SELECTOR)?) else {
            return Ok(Interaction::ignored());
        };

        let descriptor = form_descriptor(&form, &self.page.config().default_destination);
        if !descriptor.temporary && descriptor.method == Method::Get {
            record(&self.page, &descriptor)?;
        }
        Ok(Interaction::handled(Some(self.dispatch(descriptor))))
    }

    /// Deliver a `change` event. Only select-all toggles react.
    pub fn change(&self, selector: &str) -> Result<Interaction, NavigatorError> {
        let target = self.element(selector)?;
        if let Some(toggle) = dom::closest(&target, &dom::compile(SELECT_ALL_SELECTOR)?) {
            let count = toggle_select_all(&toggle);
            debug!(target = "navigate", checkboxes = count, "select-all toggled");
        }
        Ok(Interaction::ignored())
    }

    pub fn back(&self) -> Option<PendingDispatch> {
        self.traverse(-1)
    }

    pub fn forward(&self) -> Option<PendingDispatch> {
        self.traverse(1)
    }

    /// Move through history by `delta` and replay the landed-on entry.
    pub fn go(&self, delta: isize) -> Option<PendingDispatch> {
        self.traverse(delta)
    }

    /// Reissue the request stored on the current history entry.
    pub fn reload(&self) -> Option<PendingDispatch> {
        let stored = self.page.history().state_as::<RequestDescriptor>();
        match stored {
            Ok(Some(descriptor)) => Some(self.dispatch(descriptor)),
            Ok(None) => {
                debug!(target = "navigate", "nothing to reload");
                None
            }
            Err(err) => {
                warn!(target = "navigate", error = %err, "history state is not a request, ignoring");
                None
            }
        }
    }

    pub fn pump_timers(&self, now: Instant) -> usize {
        self.page.pump_timers(now)
    }

    pub fn next_timer_deadline(&self) -> Option<Instant> {
        self.page.next_timer_deadline()
    }

    fn traverse(&self, delta: isize) -> Option<PendingDispatch> {
        let popped = self.page.history_mut().go(delta)?;
        self.page.window_mut().set_address(&popped.url);
        let descriptor = replayable(popped.state)?;
        Some(self.dispatch(descriptor))
    }

    fn element(&self, selector: &str) -> Result<NodeRef, NavigatorError> {
        self.page
            .document()
            .query(selector)?
            .ok_or_else(|| NavigatorError::NoSuchElement(selector.to_string()))
    }
}
