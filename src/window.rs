use tracing::info;

use crate::normalize::resolve;

/// Location and viewport of the hosting page.
#[derive(Debug, Clone)]
pub struct Window {
    href: String,
    scroll_y: f64,
    loads: Vec<String>,
}

impl Window {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            scroll_y: 0.0,
            loads: Vec::new(),
        }
    }

    pub fn href(&self) -> &str {
        &self.href
    }

    /// Address fragment without the leading `#`, if non-empty.
    pub fn hash(&self) -> Option<&str> {
        self.href
            .split_once('#')
            .map(|(_, fragment)| fragment)
            .filter(|fragment| !fragment.is_empty())
    }

    /// Update the visible address without loading anything.
    pub fn set_address(&mut self, address: &str) {
        self.href = self.resolve_address(address);
    }

    /// Full-page navigation. The page is gone after this.
    pub fn assign(&mut self, address: &str) {
        let target = self.resolve_address(address);
        info!(target = "navigate", from = %self.href, to = %target, "full page navigation");
        self.loads.push(target.clone());
        self.href = target;
    }

    /// Full-page loads issued through [`Window::assign`], oldest first.
    pub fn loads(&self) -> &[String] {
        &self.loads
    }

    pub fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    pub fn scroll_to(&mut self, y: f64) {
        self.scroll_y = y.max(0.0);
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll_to(0.0);
    }

    /// `address` resolved against the current location, or verbatim when it
    /// cannot be resolved.
    pub fn resolve_address(&self, address: &str) -> String {
        resolve(&self.href, address)
            .map(|url| url.to_string())
            .unwrap_or_else(|_| address.to_string())
    }
}
