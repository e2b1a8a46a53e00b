//! The `{status, data}` wrapper every endpoint answers with

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    /// Caller-correctable outcome
    Fail,
    /// Unexpected runtime fault
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    pub status: Status,
    pub data: Value,
    #[serde(skip)]
    http_status: StatusCode,
}

impl Envelope {
    pub fn success(data: Value) -> Self {
        Self::new(Status::Success, data)
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self::new(Status::Fail, message_payload(message))
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Status::Error, message_payload(message))
    }

    fn new(status: Status, data: Value) -> Self {
        Self {
            status,
            data,
            http_status: StatusCode::OK,
        }
    }

    pub fn with_http_status(mut self, http_status: StatusCode) -> Self {
        self.http_status = http_status;
        self
    }

    pub fn http_status(&self) -> StatusCode {
        self.http_status
    }

    /// `data.message` of a `fail`/`error` envelope
    pub fn message(&self) -> Option<&str> {
        self.data.get("message").and_then(Value::as_str)
    }
}

fn message_payload(message: impl Into<String>) -> Value {
    json!({ "message": message.into() })
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        (self.http_status, Json(self)).into_response()
    }
}
