use serde::Deserialize;
use thiserror::Error;

/// Broken invariants of the selection. These never reach the user.
#[derive(Error, Clone, PartialEq, Eq, Debug)]
pub enum SelectionError {
    #[error("Can't hold more than two points without a clear")]
    CapacityExceeded,

    #[error("A route needs exactly 2 stops, got {0}")]
    InvalidStopCount(usize),
}

// The error payload of the routing service. It's sent with HTTP 200 as often as not.
#[derive(Deserialize, Debug)]
pub(crate) struct ServiceErrorPayload {
    pub error: ServiceErrorDetail,
}

#[derive(Deserialize, Debug)]
pub(crate) struct ServiceErrorDetail {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: Vec<String>,
}

impl From<ServiceErrorDetail> for RouteError {
    fn from(detail: ServiceErrorDetail) -> Self {
        let mut message = detail.message;
        if !detail.details.is_empty() {
            message = format!("{message} ({})", detail.details.join("; "));
        }
        RouteError::Service {
            code: detail.code,
            message,
        }
    }
}

/// Any way a solve can fail. The controller treats them all the same.
#[derive(Error, Debug)]
pub enum RouteError {
    #[error("Routing service error (code {code}): {message}")]
    Service { code: i64, message: String },

    #[error("Routing service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Underlying request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to parse route response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Malformed route response: {0}")]
    Malformed(String),
}

/// The router was called into while it was already busy with another call on the same thread.
#[derive(Error, Clone, Copy, PartialEq, Eq, Debug)]
#[error("The router is already handling a call")]
pub struct ReentrantCall;
