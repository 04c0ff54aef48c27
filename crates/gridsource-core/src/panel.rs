//! Opaque rendered panels.

use bytes::Bytes;

/// A backend-rendered artifact forwarded to the client untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panel {
    pub content_type: String,
    pub body: Bytes,
}

impl Panel {
    pub fn new(content_type: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            content_type: content_type.into(),
            body: body.into(),
        }
    }

    pub fn html(body: impl Into<String>) -> Self {
        Self::new("text/html; charset=utf-8", body.into())
    }

    pub fn json(value: &serde_json::Value) -> Self {
        Self::new("application/json", value.to_string())
    }
}
