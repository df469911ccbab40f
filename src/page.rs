use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::Rc;
use std::time::Instant;

use kuchiki::NodeRef;
use tracing::debug;

use crate::chrome::{error_banner_markup, BANNER_ID_ATTR, BANNER_SELECTOR};
use crate::config::NavigatorConfig;
use crate::dom::{self, Document};
use crate::history::SessionHistory;
use crate::net::Transport;
use crate::progress::ProgressTracker;
use crate::request::AttachMode;
use crate::window::Window;

struct PendingBanner {
    id: u64,
    node: NodeRef,
    expires_at: Instant,
}

/// Everything a dispatch touches: the document, the window, session history
/// and the external capabilities. Lives on the event-loop thread.
pub struct Page {
    document: Document,
    window: RefCell<Window>,
    history: RefCell<SessionHistory>,
    transport: Rc<dyn Transport>,
    progress: Rc<ProgressTracker>,
    banners: RefCell<Vec<PendingBanner>>,
    next_banner_id: Cell<u64>,
    base_url: String,
    config: NavigatorConfig,
}

impl Page {
    pub(crate) fn new(
        document: Document,
        location: String,
        transport: Rc<dyn Transport>,
        progress: Rc<ProgressTracker>,
        config: NavigatorConfig,
    ) -> Self {
        let base_url = config
            .base_url
            .clone()
            .or_else(|| document.meta_content("base-url"))
            .unwrap_or_default();
        debug!(target = "navigate", base_url = %base_url, location = %location, "page attached");

        Self {
            document,
            history: RefCell::new(SessionHistory::new(location.clone())),
            window: RefCell::new(Window::new(location)),
            transport,
            progress,
            banners: RefCell::new(Vec::new()),
            next_banner_id: Cell::new(1),
            base_url,
            config,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub(crate) fn window(&self) -> Ref<'_, Window> {
        self.window.borrow()
    }

    pub(crate) fn window_mut(&self) -> RefMut<'_, Window> {
        self.window.borrow_mut()
    }

    pub(crate) fn history(&self) -> Ref<'_, SessionHistory> {
        self.history.borrow()
    }

    pub(crate) fn history_mut(&self) -> RefMut<'_, SessionHistory> {
        self.history.borrow_mut()
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub(crate) fn progress(&self) -> &Rc<ProgressTracker> {
        &self.progress
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    /// Replace `target`'s content with an error banner followed by the raw
    /// response body. The banner expires after the configured TTL.
    pub(crate) fn show_error_banner(&self, target: &NodeRef, thrown: &str, body: &str) {
        let id = self.next_banner_id.get();
        self.next_banner_id.set(id + 1);

        dom::merge_markup(target, &error_banner_markup(id, thrown), AttachMode::Replace);
        let banner = target.first_child();
        dom::merge_markup(target, body, AttachMode::Append);

        if let Some(node) = banner {
            self.banners.borrow_mut().push(PendingBanner {
                id,
                node,
                expires_at: Instant::now() + self.config.banner_ttl(),
            });
        }
    }

    /// Remove `node`'s enclosing banner, if any.
    pub(crate) fn dismiss_banner(&self, node: &NodeRef) -> bool {
        let Ok(selectors) = dom::compile(BANNER_SELECTOR) else {
            return false;
        };
        let Some(banner) = dom::closest(node, &selectors) else {
            return false;
        };
        banner.detach();
        let id = dom::attr(&banner, BANNER_ID_ATTR).and_then(|id| id.parse::<u64>().ok());
        self.banners.borrow_mut().retain(|pending| {
            pending.node != banner && Some(pending.id) != id
        });
        debug!(target = "navigate", banner = ?id, "error banner dismissed");
        true
    }

    /// Expire banners whose deadline is at or before `now`. Returns how many
    /// were removed.
    pub fn pump_timers(&self, now: Instant) -> usize {
        let mut banners = self.banners.borrow_mut();
        let before = banners.len();
        banners.retain(|pending| {
            if pending.expires_at <= now {
                debug!(target = "navigate", banner = pending.id, "error banner expired");
                pending.node.detach();
                false
            } else {
                true
            }
        });
        before - banners.len()
    }

    pub fn next_timer_deadline(&self) -> Option<Instant> {
        self.banners
            .borrow()
            .iter()
            .map(|pending| pending.expires_at)
            .min()
    }

    pub fn pending_banners(&self) -> usize {
        self.banners.borrow().len()
    }
}
