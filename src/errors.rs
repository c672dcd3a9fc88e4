// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for the NIOS provider.
//!
//! This module provides specialized error types for:
//! - WAPI HTTP client operations (read, create, update, delete, list)
//! - Extensible attribute decoding and internal id handling
//! - Provider configuration loading
//! - Resource CRUD operations surfaced to the caller as diagnostics

use std::fmt;
use thiserror::Error;

use crate::diagnostics::Diagnostics;

/// CRUD operation a resource error occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    Import,
    List,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Import => "import",
            Self::List => "list",
        };
        f.write_str(verb)
    }
}

/// Errors returned by the WAPI client.
///
/// `NotFound` is the sentinel for "object no longer exists" and drives the
/// internal-id fallback lookup. Everything else is fatal for the calling operation.
#[derive(Error, Debug, Clone)]
pub enum ClientError {
    /// The referenced object does not exist (HTTP 404 or a WAPI not-found error body)
    #[error("object '{reference}' not found (HTTP {status})")]
    NotFound {
        /// Reference or object type that was requested
        reference: String,
        /// HTTP status code returned by the appliance
        status: u16,
    },

    /// WAPI returned a non-success status code
    #[error("{method} {url} failed with HTTP {status}: {message}")]
    Api {
        /// HTTP method of the failed request
        method: String,
        /// Full request URL
        url: String,
        /// HTTP status code
        status: u16,
        /// Error text extracted from the response body
        message: String,
    },

    /// HTTP connection failed (network unreachable, connection refused, timeout)
    #[error("HTTP connection to {url} failed: {reason}")]
    Connection {
        /// URL that could not be reached
        url: String,
        /// Reason for the connection failure
        reason: String,
    },

    /// WAPI responded with a body that could not be decoded
    #[error("Invalid response from {url}: {reason}")]
    InvalidResponse {
        /// URL that returned the response
        url: String,
        /// What was wrong with the body
        reason: String,
    },

    /// The request could not be built (bad base URL, bad reference)
    #[error("Invalid WAPI request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    /// Returns true if this error means the object no longer exists.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// HTTP status code carried by the error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound { status, .. } | Self::Api { status, .. } => Some(*status),
            Self::Connection { .. } | Self::InvalidResponse { .. } | Self::InvalidRequest(_) => {
                None
            }
        }
    }
}

/// Errors raised while decoding or stamping extensible attributes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtAttrError {
    /// The server returned something other than a JSON object for `extattrs`
    #[error("extensible attributes must be an object, got {found}")]
    NotAnObject {
        /// JSON kind that was found
        found: &'static str,
    },

    /// A wire-format attribute has no `value` field
    #[error("extensible attribute '{key}' has no value")]
    MissingValue {
        /// Attribute name
        key: String,
    },

    /// An attribute value has a shape that cannot be represented
    #[error("extensible attribute '{key}' has unsupported value type {found}")]
    UnsupportedValue {
        /// Attribute name
        key: String,
        /// JSON kind that was found
        found: &'static str,
    },

    /// The reserved internal id attribute is present but not a string
    #[error("extensible attribute '{key}' must be a string internal id")]
    InvalidInternalId {
        /// Attribute name
        key: String,
    },
}

/// Errors raised while loading provider configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required setting was not provided by the file or the environment
    #[error("missing provider setting '{setting}' (set it in the config file or {env_var})")]
    Missing {
        /// Setting name
        setting: &'static str,
        /// Environment variable that can provide it
        env_var: &'static str,
    },

    /// A setting was provided but is not usable
    #[error("invalid provider setting '{setting}': {reason}")]
    Invalid {
        /// Setting name
        setting: &'static str,
        /// Explanation of what is invalid
        reason: String,
    },

    /// The configuration file could not be read
    #[error("failed to read provider config file {path}: {source}")]
    Io {
        /// Path of the file
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML for the expected shape
    #[error("failed to parse provider config file {path}: {source}")]
    Parse {
        /// Path of the file
        path: String,
        /// Underlying YAML error
        #[source]
        source: serde_yaml::Error,
    },
}

/// Errors returned by resource and data source operations.
///
/// These are converted into [`crate::diagnostics::Diagnostic`]s at the surface.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// A WAPI call failed
    #[error("Unable to {operation} {type_name}, got error: {source}")]
    Client {
        /// Operation that failed
        operation: Operation,
        /// Resource type name
        type_name: &'static str,
        /// Underlying client error
        #[source]
        source: ClientError,
    },

    /// Extensible attributes could not be decoded or stamped
    #[error("Unable to process extensible attributes for {type_name}: {source}")]
    ExtAttrs {
        /// Resource type name
        type_name: &'static str,
        /// Underlying decoding error
        #[source]
        source: ExtAttrError,
    },

    /// The internal id needed for a fallback lookup is absent from state
    #[error("Missing Internal ID: {type_name} '{reference}' could not be located and state holds no internal id")]
    MissingInternalId {
        /// Resource type name
        type_name: &'static str,
        /// Stale reference held in state
        reference: String,
    },

    /// The object could be located neither by reference nor by internal id
    #[error("Unable to {operation} {type_name}: object '{reference}' no longer exists")]
    ObjectGone {
        /// Operation that failed
        operation: Operation,
        /// Resource type name
        type_name: &'static str,
        /// Stale reference held in state
        reference: String,
    },

    /// Configuration failed validation; carries the individual diagnostics
    #[error("Invalid configuration for {type_name}: {diagnostics}")]
    Validation {
        /// Resource type name
        type_name: &'static str,
        /// Validation diagnostics
        diagnostics: Diagnostics,
    },

    /// A state or API document did not match the expected shape
    #[error("Unable to decode {what} for {type_name}: {source}")]
    Decode {
        /// Resource type name
        type_name: &'static str,
        /// Which document failed to decode
        what: &'static str,
        /// Underlying serde error
        #[source]
        source: serde_json::Error,
    },

    /// No resource or data source is registered under this type name
    #[error("Unknown resource type '{0}'")]
    UnknownType(String),

    /// Provider configuration failed
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ProviderError {
    /// Short summary line used when converting to a diagnostic.
    #[must_use]
    pub fn summary(&self) -> &'static str {
        match self {
            Self::Client { .. } => "Client Error",
            Self::ExtAttrs { .. } => "Extensible Attributes Error",
            Self::MissingInternalId { .. } => "Missing Internal ID",
            Self::ObjectGone { .. } => "Object Not Found",
            Self::Validation { .. } => "Invalid Configuration",
            Self::Decode { .. } => "Decode Error",
            Self::UnknownType(_) => "Unknown Resource Type",
            Self::Config(_) => "Provider Configuration Error",
        }
    }

    /// Wrap a client error raised during `operation`.
    #[must_use]
    pub fn client(operation: Operation, type_name: &'static str, source: ClientError) -> Self {
        Self::Client {
            operation,
            type_name,
            source,
        }
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
