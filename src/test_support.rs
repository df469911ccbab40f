//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::net::{HttpRequest, HttpResponse, Transport, TransportError, TransportFuture};

/// Transport answering from a table keyed by URL path. Unknown paths get 404.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: RefCell<HashMap<String, Result<HttpResponse, TransportError>>>,
    requests: RefCell<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn respond(&self, path: &str, body: &str) {
        self.routes.borrow_mut().insert(
            path.to_string(),
            Ok(HttpResponse {
                status: 200,
                body: body.to_string(),
            }),
        );
    }

    pub fn fail(&self, path: &str, status: u16, reason: &str, body: &str) {
        self.routes.borrow_mut().insert(
            path.to_string(),
            Err(TransportError::Status {
                status,
                reason: reason.to_string(),
                body: body.to_string(),
            }),
        );
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    pub fn last_path(&self) -> Option<String> {
        self.requests
            .borrow()
            .last()
            .map(|request| request.url.path().to_string())
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: HttpRequest) -> TransportFuture {
        let result = self
            .routes
            .borrow()
            .get(request.url.path())
            .cloned()
            .unwrap_or_else(|| {
                Err(TransportError::Status {
                    status: 404,
                    reason: "Not Found".to_string(),
                    body: String::new(),
                })
            });
        self.requests.borrow_mut().push(request);
        Box::pin(async move { result })
    }
}
