use std::time::Duration;

use futures_util::future::BoxFuture;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use reqwest::multipart;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::request::{Method, Payload};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

pub type TransportFuture = BoxFuture<'static, Result<HttpResponse, TransportError>>;

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: Url,
    pub method: Method,
    pub payload: Option<Payload>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("server responded {status} {reason}")]
    Status {
        status: u16,
        reason: String,
        body: String,
    },
    #[error("failed to encode payload: {0}")]
    Encode(String),
}

impl TransportError {
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Short error text shown to the user.
    pub fn thrown(&self) -> String {
        match self {
            TransportError::Timeout => "timeout".to_string(),
            TransportError::Network(message) | TransportError::Encode(message) => message.clone(),
            TransportError::Status { status, reason, .. } if reason.is_empty() => {
                status.to_string()
            }
            TransportError::Status { reason, .. } => reason.clone(),
        }
    }

    /// Raw response body, empty when no response arrived.
    pub fn body(&self) -> &str {
        match self {
            TransportError::Status { body, .. } => body,
            _ => "",
        }
    }

    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

/// The HTTP capability the dispatcher calls into.
///
/// Implementations must treat non-2xx responses as `TransportError::Status`
/// and leave payload encoding to [`encode_request`] semantics: query string
/// for GET/DELETE, body otherwise.
pub trait Transport {
    fn send(&self, request: HttpRequest) -> TransportFuture;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(TransportError::from_reqwest)?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: HttpRequest) -> TransportFuture {
        let client = self.client.clone();
        Box::pin(async move {
            let builder = encode_request(&client, request)?
                .header("X-Requested-With", "XMLHttpRequest")
                .header(CACHE_CONTROL, "no-cache");

            let response = builder.send().await.map_err(TransportError::from_reqwest)?;
            let status = response.status();
            let body = response.text().await.map_err(TransportError::from_reqwest)?;
            debug!(
                target = "navigate",
                status = status.as_u16(),
                bytes = body.len(),
                "response received"
            );

            if !status.is_success() {
                return Err(TransportError::Status {
                    status: status.as_u16(),
                    reason: status.canonical_reason().unwrap_or_default().to_string(),
                    body,
                });
            }

            Ok(HttpResponse {
                status: status.as_u16(),
                body,
            })
        })
    }
}

/// Build the request with the payload passed through in its own encoding.
pub fn encode_request(
    client: &reqwest::Client,
    request: HttpRequest,
) -> Result<reqwest::RequestBuilder, TransportError> {
    let HttpRequest {
        mut url,
        method,
        payload,
    } = request;

    let Some(payload) = payload else {
        return Ok(client.request(method.into(), url));
    };

    if method.uses_query() {
        let encoded = payload
            .to_urlencoded()
            .map_err(|err| TransportError::Encode(err.to_string()))?;
        append_query(&mut url, &encoded);
        return Ok(client.request(method.into(), url));
    }

    let builder = client.request(method.into(), url);
    match payload {
        Payload::FormData(data) => {
            let form = data
                .fields()
                .iter()
                .fold(multipart::Form::new(), |form, field| {
                    form.text(field.name.clone(), field.value.clone())
                });
            Ok(builder.multipart(form))
        }
        fields @ Payload::Fields(_) => {
            let encoded = fields
                .to_urlencoded()
                .map_err(|err| TransportError::Encode(err.to_string()))?;
            Ok(builder
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(encoded))
        }
    }
}

fn append_query(url: &mut Url, encoded: &str) {
    if encoded.is_empty() {
        return;
    }
    let query = match url.query() {
        Some(existing) if !existing.is_empty() => format!("{existing}&{encoded}"),
        _ => encoded.to_string(),
    };
    url.set_query(Some(&query));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{FormData, FormField};

    fn url(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    #[test]
    fn get_fields_go_into_query_string() {
        let client = reqwest::Client::new();
        let request = encode_request(
            &client,
            HttpRequest {
                url: url("http://h/search?page=2"),
                method: Method::Get,
                payload: Some(Payload::Fields(vec![FormField::new("q", "a b")])),
            },
        )
        .unwrap()
        .build()
        .unwrap();
        assert_eq!(request.url().as_str(), "http://h/search?page=2&q=a+b");
        assert!(request.body().is_none());
    }

    #[test]
    fn get_form_data_is_also_query_encoded() {
        let client = reqwest::Client::new();
        let request = encode_request(
            &client,
            HttpRequest {
                url: url("http://h/search"),
                method: Method::Get,
                payload: Some(Payload::FormData(FormData::new(vec![FormField::new(
                    "q", "x",
                )]))),
            },
        )
        .unwrap()
        .build()
        .unwrap();
        assert_eq!(request.url().query(), Some("q=x"));
    }

    #[test]
    fn post_fields_are_urlencoded_body() {
        let client = reqwest::Client::new();
        let request = encode_request(
            &client,
            HttpRequest {
                url: url("http://h/save"),
                method: Method::Post,
                payload: Some(Payload::Fields(vec![FormField::new("name", "Ada")])),
            },
        )
        .unwrap()
        .build()
        .unwrap();
        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(
            request.headers()[CONTENT_TYPE],
            "application/x-www-form-urlencoded"
        );
        assert_eq!(
            request.body().and_then(|body| body.as_bytes()),
            Some(&b"name=Ada"[..])
        );
    }

    #[test]
    fn post_form_data_is_multipart() {
        let client = reqwest::Client::new();
        let request = encode_request(
            &client,
            HttpRequest {
                url: url("http://h/upload"),
                method: Method::Post,
                payload: Some(Payload::FormData(FormData::new(vec![FormField::new(
                    "title", "doc",
                )]))),
            },
        )
        .unwrap()
        .build()
        .unwrap();
        let content_type = request.headers()[CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary="));
    }

    #[test]
    fn thrown_text_prefers_reason_phrase() {
        let err = TransportError::Status {
            status: 500,
            reason: "Internal Server Error".into(),
            body: "trace".into(),
        };
        assert_eq!(err.thrown(), "Internal Server Error");
        assert_eq!(err.body(), "trace");
        assert!(!err.is_unauthorized());

        let err = TransportError::Status {
            status: 599,
            reason: String::new(),
            body: String::new(),
        };
        assert_eq!(err.thrown(), "599");
        assert_eq!(TransportError::Timeout.thrown(), "timeout");
    }
}
