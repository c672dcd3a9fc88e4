// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! DNS object types: resource records, zones and name server groups.
//!
//! The attribute constants and validation helpers here are shared by the record and
//! zone tables so that, for example, every `ttl` is described and checked the same
//! way.

pub mod nsgroup;
pub mod records;
pub mod zones;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::constants::DEFAULT_DNS_VIEW;
use crate::diagnostics::Diagnostics;
use crate::schema::{Attribute, AttributeKind, DefaultValue};

/// Prefix of WAPI function calls accepted in address fields (`func:nextavailableip:...`).
const WAPI_FUNCTION_PREFIX: &str = "func:";

/// Largest TTL accepted by NIOS (2^31 - 1).
pub const MAX_TTL: u32 = 2_147_483_647;

// ============================================================================
// Shared attributes
// ============================================================================

pub const VIEW: Attribute = Attribute::optional(
    "view",
    AttributeKind::String,
    "The name of the DNS view in which the object resides.",
)
.with_default(DefaultValue::Str(DEFAULT_DNS_VIEW));

pub const TTL: Attribute = Attribute::optional(
    "ttl",
    AttributeKind::Int,
    "The Time To Live (TTL) value in seconds.",
);

pub const USE_TTL: Attribute = Attribute::optional_computed(
    "use_ttl",
    AttributeKind::Bool,
    "Use flag for ttl.",
);

pub const COMMENT: Attribute = Attribute::optional(
    "comment",
    AttributeKind::String,
    "Comment for the object; maximum 256 characters.",
);

pub const DISABLE: Attribute = Attribute::optional(
    "disable",
    AttributeKind::Bool,
    "Determines if the object is disabled or not.",
)
.with_default(DefaultValue::Bool(false));

pub const ZONE: Attribute = Attribute::computed(
    "zone",
    AttributeKind::String,
    "The name of the zone in which the record resides.",
);

pub const DNS_NAME: Attribute = Attribute::computed(
    "dns_name",
    AttributeKind::String,
    "The name for the record in punycode format.",
);

pub const NS_GROUP: Attribute = Attribute::optional(
    "ns_group",
    AttributeKind::String,
    "The name server group that serves DNS for this zone.",
);

pub const GRID_PRIMARY: Attribute = Attribute::optional(
    "grid_primary",
    AttributeKind::ObjectList,
    "The grid primary servers.",
);

pub const GRID_SECONDARIES: Attribute = Attribute::optional(
    "grid_secondaries",
    AttributeKind::ObjectList,
    "The list with Grid members that are secondary servers.",
);

// ============================================================================
// Shared nested types
// ============================================================================

/// A grid member serving a zone or NS group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MemberServer {
    /// The grid member name.
    pub name: String,
    /// Whether the member is hidden from NS records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stealth: Option<bool>,
    /// Whether grid replication is used instead of zone transfers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_replicate: Option<bool>,
    /// Whether the member is the lead secondary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead: Option<bool>,
}

// ============================================================================
// Validation helpers
// ============================================================================

/// Check that a DNS name is non-empty, has no whitespace and no trailing dot.
pub fn validate_dns_name(attribute: &str, value: Option<&str>, diagnostics: &mut Diagnostics) {
    let Some(value) = value else {
        return;
    };
    let problem = if value.is_empty() {
        Some("must not be empty")
    } else if value.chars().any(char::is_whitespace) {
        Some("must not contain whitespace")
    } else if value.len() > 1 && value.ends_with('.') {
        Some("must not end with a dot")
    } else {
        None
    };
    if let Some(problem) = problem {
        diagnostics.add_attribute_error(
            attribute,
            "Invalid Attribute Value",
            format!("\"{attribute}\" {problem}, got \"{value}\""),
        );
    }
}

pub fn validate_ttl(ttl: Option<u32>, diagnostics: &mut Diagnostics) {
    if let Some(ttl) = ttl.filter(|ttl| *ttl > MAX_TTL) {
        diagnostics.add_attribute_error(
            "ttl",
            "Invalid Attribute Value",
            format!("\"ttl\" must be at most {MAX_TTL}, got {ttl}"),
        );
    }
}

/// Check an IPv4 address; WAPI function calls are passed through.
pub fn validate_ipv4(attribute: &str, value: Option<&str>, diagnostics: &mut Diagnostics) {
    let Some(value) = value.filter(|v| !v.starts_with(WAPI_FUNCTION_PREFIX)) else {
        return;
    };
    if value.parse::<Ipv4Addr>().is_err() {
        diagnostics.add_attribute_error(
            attribute,
            "Invalid Attribute Value",
            format!("\"{attribute}\" must be a valid IPv4 address, got \"{value}\""),
        );
    }
}

/// Check an IPv6 address; WAPI function calls are passed through.
pub fn validate_ipv6(attribute: &str, value: Option<&str>, diagnostics: &mut Diagnostics) {
    let Some(value) = value.filter(|v| !v.starts_with(WAPI_FUNCTION_PREFIX)) else {
        return;
    };
    if value.parse::<Ipv6Addr>().is_err() {
        diagnostics.add_attribute_error(
            attribute,
            "Invalid Attribute Value",
            format!("\"{attribute}\" must be a valid IPv6 address, got \"{value}\""),
        );
    }
}

/// Check that an integer attribute is at most `max`.
pub fn validate_at_most(attribute: &str, value: Option<u32>, max: u32, diagnostics: &mut Diagnostics) {
    if let Some(value) = value.filter(|v| *v > max) {
        diagnostics.add_attribute_error(
            attribute,
            "Invalid Attribute Value",
            format!("\"{attribute}\" must be between 0 and {max}, got {value}"),
        );
    }
}

pub fn validate_comment(comment: Option<&str>, diagnostics: &mut Diagnostics) {
    if let Some(comment) = comment.filter(|c| c.chars().count() > 256) {
        diagnostics.add_attribute_error(
            "comment",
            "Invalid Attribute Value",
            format!(
                "\"comment\" must be at most 256 characters, got {}",
                comment.chars().count()
            ),
        );
    }
}
