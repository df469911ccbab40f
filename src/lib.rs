// Library exports for the driver binary and tests

pub mod chrome;
pub mod config;
pub mod dom;
pub mod handlers;
pub mod history;
pub mod navigation;
pub mod navigator;
pub mod net;
pub mod normalize;
pub mod page;
pub mod progress;
pub mod request;
pub mod window;

#[cfg(test)]
mod test_support;

// Re-export commonly used types for tests
pub use config::NavigatorConfig;
pub use navigation::{DispatchOutcome, PendingDispatch};
pub use navigator::{Interaction, Navigator, NavigatorBuilder, NavigatorError};
pub use net::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};
pub use request::{AttachMode, Method, Payload, RequestDescriptor};
