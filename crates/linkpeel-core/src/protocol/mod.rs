//! Action protocol between the UI layer and the core.
//!
//! Requests are JSON objects tagged by `action`; every request gets exactly one
//! response envelope, `{"success": true, "result": ...}` or
//! `{"success": false, "error": "..."}`.

mod dispatch;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use dispatch::{ClickAction, Dispatcher, Host};

use crate::resolver::ResolveMode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    /// Open a URL in the user's browser.
    OpenUrl { url: String },
    /// Show the wrapped/clean pair to the user.
    ShowPopup { original: String, clean: String },
    /// Resolve a shortener link over the network.
    ResolveShortener {
        url: String,
        #[serde(default)]
        method: ResolveMode,
    },
    /// Progress notification for an in-flight resolution.
    ResolutionProgress { status: String },
}

impl Request {
    pub fn action(&self) -> &'static str {
        match self {
            Request::OpenUrl { .. } => "openUrl",
            Request::ShowPopup { .. } => "showPopup",
            Request::ResolveShortener { .. } => "resolveShortener",
            Request::ResolutionProgress { .. } => "resolutionProgress",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn ok(result: Value) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
        }
    }

    /// Success without a payload (`result` is `null`).
    pub fn done() -> Self {
        Self::ok(Value::Null)
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed request: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("transport: {0}")]
    Io(#[from] std::io::Error),
}

/// Parses one request line.
pub fn parse_request(line: &str) -> Result<Request, ProtocolError> {
    Ok(serde_json::from_str(line)?)
}
