use std::rc::Rc;

use futures_util::future::LocalBoxFuture;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::dom;
use crate::net::{HttpRequest, TransportError};
use crate::normalize::{absolute, resolve};
use crate::page::Page;
use crate::request::{AttachMode, RequestDescriptor};

/// A dispatch that has been issued but not yet driven to completion.
pub type PendingDispatch = LocalBoxFuture<'static, DispatchOutcome>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbortReason {
    #[error("destination {0:?} matched no element")]
    MissingDestination(String),
    #[error("destination {0:?} is not a valid selector")]
    InvalidDestination(String),
    #[error("request URL could not be resolved: {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    /// Markup merged into every matching destination.
    Applied {
        destination: String,
        attach: AttachMode,
        status: u16,
    },
    /// The server answered 401; the whole window went to the base path.
    Redirected { to: String },
    /// Any other failure; an error banner now fills the destination.
    Failed { error: TransportError },
    /// Nothing was sent.
    Aborted(AbortReason),
}

impl DispatchOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, DispatchOutcome::Applied { .. })
    }
}

/// Issue `descriptor` against `page`. The returned future does the work; the
/// caller decides whether to await it or spawn it on a `LocalSet`.
pub fn dispatch(page: &Rc<Page>, descriptor: RequestDescriptor) -> PendingDispatch {
    let page = Rc::clone(page);
    Box::pin(async move { execute(&page, descriptor).await })
}

async fn execute(page: &Page, descriptor: RequestDescriptor) -> DispatchOutcome {
    let targets = match page.document().query_all(&descriptor.destination) {
        Ok(targets) if !targets.is_empty() => targets,
        Ok(_) => {
            warn!(
                target = "navigate",
                destination = %descriptor.destination,
                url = %descriptor.url,
                "destination not found, request dropped"
            );
            return DispatchOutcome::Aborted(AbortReason::MissingDestination(
                descriptor.destination,
            ));
        }
        Err(err) => {
            warn!(target = "navigate", error = %err, "request dropped");
            return DispatchOutcome::Aborted(AbortReason::InvalidDestination(
                descriptor.destination,
            ));
        }
    };

    let target_url = absolute(&descriptor.url, page.base_url());
    let resolved = resolve(page.window().href(), &target_url);
    let url = match resolved {
        Ok(url) => url,
        Err(err) => {
            warn!(target = "navigate", url = %target_url, error = %err, "request dropped");
            return DispatchOutcome::Aborted(AbortReason::InvalidUrl(err.to_string()));
        }
    };

    debug!(
        target = "navigate",
        method = %descriptor.method,
        url = %url,
        destination = %descriptor.destination,
        "dispatching"
    );

    let request = HttpRequest {
        url,
        method: descriptor.method,
        payload: descriptor.payload.clone(),
    };
    let result = {
        let _in_flight = page.progress().begin();
        page.transport().send(request).await
    };

    let outcome = match result {
        Ok(response) => {
            for target in &targets {
                dom::merge_markup(target, &response.body, descriptor.attach);
            }
            DispatchOutcome::Applied {
                destination: descriptor.destination,
                attach: descriptor.attach,
                status: response.status,
            }
        }
        Err(err) if err.is_unauthorized() => {
            let base = page.base_url().to_string();
            info!(target = "navigate", url = %target_url, "unauthorized, leaving page");
            page.window_mut().assign(&base);
            let to = page.window().href().to_string();
            DispatchOutcome::Redirected { to }
        }
        Err(err) => {
            error!(
                target = "navigate",
                url = %target_url,
                status = ?err.status(),
                error = %err,
                body = %err.body(),
                "request failed"
            );
            let thrown = err.thrown();
            for target in &targets {
                page.show_error_banner(target, &thrown, err.body());
            }
            DispatchOutcome::Failed { error: err }
        }
    };

    page.window_mut().scroll_to_top();
    outcome
}
