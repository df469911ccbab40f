use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

pub const DEFAULT_DESTINATION: &str = "#content";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Parse a form `method` attribute. Unknown verbs fall back to GET.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "" | "GET" => Method::Get,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "PATCH" => Method::Patch,
            "DELETE" => Method::Delete,
            other => {
                warn!(target = "navigate", method = other, "unknown method, using GET");
                Method::Get
            }
        }
    }

    /// Whether the payload travels in the query string rather than the body.
    pub fn uses_query(self) -> bool {
        matches!(self, Method::Get | Method::Delete)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Stored states may carry the verb in any case, as a form attribute would.
impl<'de> Deserialize<'de> for Method {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Method::parse(&raw))
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// How returned markup merges into the destination region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachMode {
    #[default]
    Replace,
    Append,
    Prepend,
}

impl AttachMode {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "append" => AttachMode::Append,
            "prepend" => AttachMode::Prepend,
            _ => AttachMode::Replace,
        }
    }
}

impl<'de> Deserialize<'de> for AttachMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(AttachMode::parse(&raw))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    pub value: String,
}

impl FormField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Snapshot of a submitted form, sent as `multipart/form-data`.
///
/// This is the live submission payload. It never goes into history; the
/// serialized field list is stored there instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: Vec<FormField>,
}

impl FormData {
    pub fn new(fields: Vec<FormField>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| field.value.as_str())
    }
}

/// Request payload. Only the field list is stored in history, as a bare
/// `[{name, value}, ...]` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Fields(Vec<FormField>),
    #[serde(skip)]
    FormData(FormData),
}

impl Payload {
    pub fn fields(&self) -> &[FormField] {
        match self {
            Payload::Fields(fields) => fields,
            Payload::FormData(data) => data.fields(),
        }
    }

    /// Render as `application/x-www-form-urlencoded`.
    pub fn to_urlencoded(&self) -> Result<String, serde_urlencoded::ser::Error> {
        let pairs: Vec<(&str, &str)> = self
            .fields()
            .iter()
            .map(|field| (field.name.as_str(), field.value.as_str()))
            .collect();
        serde_urlencoded::to_string(pairs)
    }
}

/// Everything needed to issue, and later reissue, one navigation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    pub url: String,
    #[serde(default)]
    pub method: Method,
    #[serde(rename = "dst", default = "default_destination")]
    pub destination: String,
    #[serde(rename = "data", default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
    #[serde(default)]
    pub attach: AttachMode,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub temporary: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

fn default_destination() -> String {
    DEFAULT_DESTINATION.to_string()
}

impl RequestDescriptor {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::Get,
            destination: default_destination(),
            payload: None,
            attach: AttachMode::Replace,
            temporary: false,
            title: None,
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = destination.into();
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_attach(mut self, attach: AttachMode) -> Self {
        self.attach = attach;
        self
    }

    pub fn temporary(mut self, temporary: bool) -> Self {
        self.temporary = temporary;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn title_or_url(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.url)
    }

    /// The replayable form of this descriptor: live form data becomes the
    /// serialized field list.
    pub fn for_history(&self) -> Self {
        let mut recorded = self.clone();
        if let Some(Payload::FormData(data)) = &self.payload {
            recorded.payload = Some(Payload::Fields(data.fields().to_vec()));
        }
        recorded
    }
}
