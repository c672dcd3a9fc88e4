// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! HTTP error mapping for WAPI responses.
//!
//! WAPI error bodies look like
//! `{"Error": "AdmConDataNotFound: ...", "code": "Client.Ibap.Data.NotFound", "text": "..."}`.
//! This module extracts a readable message from such a body and maps status codes to a
//! short explanation used when the body carries nothing useful.
//!
//! # Usage
//!
//! ```rust
//! use nios_provider::http_errors::map_http_error_to_reason;
//!
//! let (reason, message) = map_http_error_to_reason(404);
//! assert_eq!(reason, "ObjectNotFound");
//! assert!(message.contains("404"));
//! ```

use serde::Deserialize;

use crate::constants::WAPI_NOT_FOUND_CODE;

/// Reason for HTTP 400
pub const REASON_BAD_REQUEST: &str = "BadRequest";
/// Reason for HTTP 401 and 403
pub const REASON_AUTH_FAILED: &str = "AuthFailed";
/// Reason for HTTP 404
pub const REASON_OBJECT_NOT_FOUND: &str = "ObjectNotFound";
/// Reason for HTTP 429
pub const REASON_RATE_LIMITED: &str = "RateLimited";
/// Reason for HTTP 500
pub const REASON_INTERNAL_ERROR: &str = "ApplianceInternalError";
/// Reason for HTTP 502, 503 and 504
pub const REASON_GATEWAY_ERROR: &str = "GatewayError";
/// Reason for any other status
pub const REASON_UNEXPECTED: &str = "UnexpectedResponse";

/// Map HTTP status code to reason and message.
///
/// | HTTP Code | Reason | Meaning |
/// |-----------|--------|---------|
/// | 400 | `BadRequest` | Invalid request or field value |
/// | 401 | `AuthFailed` | Authentication required |
/// | 403 | `AuthFailed` | Insufficient permissions |
/// | 404 | `ObjectNotFound` | Object or reference not found |
/// | 429 | `RateLimited` | Too many requests |
/// | 500 | `ApplianceInternalError` | Internal server error |
/// | 502-504 | `GatewayError` | Grid master unreachable or overloaded |
/// | Other | `UnexpectedResponse` | Unexpected error |
#[must_use]
pub fn map_http_error_to_reason(status_code: u16) -> (&'static str, String) {
    match status_code {
        400 => (
            REASON_BAD_REQUEST,
            "Invalid request to the WAPI (400)".into(),
        ),
        401 => (
            REASON_AUTH_FAILED,
            "WAPI authentication required (401)".into(),
        ),
        403 => (
            REASON_AUTH_FAILED,
            "WAPI user lacks permission for this object (403)".into(),
        ),
        404 => (
            REASON_OBJECT_NOT_FOUND,
            "Object or reference not found on the grid (404)".into(),
        ),
        429 => (
            REASON_RATE_LIMITED,
            "Too many requests to the WAPI (429)".into(),
        ),
        500 => (
            REASON_INTERNAL_ERROR,
            "Grid master internal error (500)".into(),
        ),
        502 => (REASON_GATEWAY_ERROR, "Bad gateway reaching the grid (502)".into()),
        503 => (
            REASON_GATEWAY_ERROR,
            "Grid master service unavailable (503)".into(),
        ),
        504 => (
            REASON_GATEWAY_ERROR,
            "Gateway timeout reaching the grid (504)".into(),
        ),
        _ => (
            REASON_UNEXPECTED,
            format!("Unexpected HTTP error from the WAPI ({status_code})"),
        ),
    }
}

/// Error body returned by the WAPI on failed requests.
#[derive(Debug, Default, Deserialize)]
pub struct WapiErrorBody {
    #[serde(rename = "Error", default)]
    pub error: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl WapiErrorBody {
    /// Parse a response body, returning `None` when it is not a WAPI error document.
    #[must_use]
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str::<Self>(body)
            .ok()
            .filter(|b| b.error.is_some() || b.code.is_some() || b.text.is_some())
    }

    /// True when the body reports a reference that does not resolve.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.code.as_deref() == Some(WAPI_NOT_FOUND_CODE)
    }
}

/// Build the message stored in a client error from a status code and response body.
///
/// Prefers the WAPI `text`, then `Error`, then the raw body, then the status mapping.
#[must_use]
pub fn error_message(status_code: u16, body: &str) -> String {
    if let Some(parsed) = WapiErrorBody::parse(body) {
        if let Some(text) = parsed.text.or(parsed.error) {
            return text;
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        map_http_error_to_reason(status_code).1
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
#[path = "http_errors_tests.rs"]
mod http_errors_tests;
