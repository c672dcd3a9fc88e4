// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Authoritative and forward zones.
//!
//! A zone's `fqdn`, `view` and `zone_format` identify it on the appliance and cannot
//! be changed after creation; they are left out of update payloads.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use super::{
    validate_comment, validate_dns_name, MemberServer, COMMENT, DISABLE, GRID_PRIMARY,
    GRID_SECONDARIES, NS_GROUP, VIEW,
};
use crate::constants::{
    DEFAULT_ZONE_FORMAT, OBJECT_ZONE_AUTH, OBJECT_ZONE_FORWARD, TYPE_ZONE_AUTH, TYPE_ZONE_FORWARD,
};
use crate::diagnostics::Diagnostics;
use crate::resources::NiosObject;
use crate::schema::{Attribute, AttributeKind, DefaultValue};

/// Zone formats accepted by `zone_auth`.
pub const ZONE_FORMATS: [&str; 3] = ["FORWARD", "IPV4", "IPV6"];

const FQDN: Attribute = Attribute::required(
    "fqdn",
    AttributeKind::String,
    "The name of this DNS zone. For a reverse zone, this is in CIDR format.",
)
.create_only();

const ZONE_VIEW: Attribute = VIEW.create_only();

const DISPLAY_DOMAIN: Attribute = Attribute::computed(
    "display_domain",
    AttributeKind::String,
    "The displayed name of the DNS zone.",
);

fn validate_fqdn(fqdn: Option<&str>, diagnostics: &mut Diagnostics) {
    // reverse zones are given in CIDR form (10.0.0.0/24)
    if fqdn.is_some_and(|f| f.contains('/')) {
        return;
    }
    validate_dns_name("fqdn", fqdn, diagnostics);
}

fn validate_servers(ns_group: Option<&str>, grid_primary: &[MemberServer], diagnostics: &mut Diagnostics) {
    if ns_group.is_some() && !grid_primary.is_empty() {
        diagnostics.add_attribute_error(
            "grid_primary",
            "Invalid Attribute Combination",
            "\"grid_primary\" cannot be set together with \"ns_group\"",
        );
    }
    for (index, server) in grid_primary.iter().enumerate() {
        if server.name.is_empty() {
            diagnostics.add_attribute_error(
                format!("grid_primary[{index}].name"),
                "Invalid Attribute Value",
                "Grid member name must not be empty",
            );
        }
    }
}

// ============================================================================
// zone_auth
// ============================================================================

/// Authoritative zone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ZoneAuthModel {
    /// The name of this DNS zone.
    pub fqdn: Option<String>,
    pub view: Option<String>,
    /// FORWARD, IPV4 or IPV6.
    pub zone_format: Option<String>,
    pub ns_group: Option<String>,
    pub comment: Option<String>,
    pub disable: Option<bool>,
    pub grid_primary: Option<Vec<MemberServer>>,
    pub grid_secondaries: Option<Vec<MemberServer>>,
    /// Default TTL of the SOA record, in seconds.
    pub soa_default_ttl: Option<u32>,
    pub display_domain: Option<String>,
    /// Type of the primary server.
    pub primary_type: Option<String>,
}

pub struct ZoneAuth;

impl NiosObject for ZoneAuth {
    const OBJECT_TYPE: &'static str = OBJECT_ZONE_AUTH;
    const TYPE_NAME: &'static str = TYPE_ZONE_AUTH;
    const RETURN_FIELDS: &'static str = "extattrs,fqdn,view,zone_format,ns_group,comment,disable,grid_primary,grid_secondaries,soa_default_ttl,display_domain,primary_type";
    const DESCRIPTION: &'static str = "Manages an authoritative DNS zone.";

    type Model = ZoneAuthModel;

    fn attributes() -> &'static [Attribute] {
        const ATTRIBUTES: &[Attribute] = &[
            FQDN,
            ZONE_VIEW,
            Attribute::optional(
                "zone_format",
                AttributeKind::String,
                "Determines the format of this zone: FORWARD, IPV4 or IPV6.",
            )
            .with_default(DefaultValue::Str(DEFAULT_ZONE_FORMAT))
            .create_only(),
            NS_GROUP,
            COMMENT,
            DISABLE,
            GRID_PRIMARY,
            GRID_SECONDARIES,
            Attribute::optional(
                "soa_default_ttl",
                AttributeKind::Int,
                "The Time to Live (TTL) value of the SOA record of this zone.",
            ),
            DISPLAY_DOMAIN,
            Attribute::computed(
                "primary_type",
                AttributeKind::String,
                "The type of the primary server.",
            ),
        ];
        ATTRIBUTES
    }

    fn validate(model: &Self::Model, diagnostics: &mut Diagnostics) {
        validate_fqdn(model.fqdn.as_deref(), diagnostics);
        validate_comment(model.comment.as_deref(), diagnostics);
        if let Some(format) = model
            .zone_format
            .as_deref()
            .filter(|f| !ZONE_FORMATS.contains(f))
        {
            diagnostics.add_attribute_error(
                "zone_format",
                "Invalid Attribute Value",
                format!(
                    "\"zone_format\" must be one of {}, got \"{format}\"",
                    ZONE_FORMATS.join(", ")
                ),
            );
        }
        validate_servers(
            model.ns_group.as_deref(),
            model.grid_primary.as_deref().unwrap_or_default(),
            diagnostics,
        );
    }
}

// ============================================================================
// zone_forward
// ============================================================================

/// Forwarder a forward zone sends queries to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Forwarder {
    /// Host name of the forwarder.
    pub name: String,
    /// IP address of the forwarder.
    pub address: String,
}

/// Forward zone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ZoneForwardModel {
    pub fqdn: Option<String>,
    pub view: Option<String>,
    /// Servers queries for this zone are forwarded to.
    pub forward_to: Option<Vec<Forwarder>>,
    /// Only forward, never recurse, when set.
    pub forwarders_only: Option<bool>,
    pub ns_group: Option<String>,
    pub comment: Option<String>,
    pub disable: Option<bool>,
    pub display_domain: Option<String>,
}

pub struct ZoneForward;

impl NiosObject for ZoneForward {
    const OBJECT_TYPE: &'static str = OBJECT_ZONE_FORWARD;
    const TYPE_NAME: &'static str = TYPE_ZONE_FORWARD;
    const RETURN_FIELDS: &'static str =
        "extattrs,fqdn,view,forward_to,forwarders_only,ns_group,comment,disable,display_domain";
    const DESCRIPTION: &'static str = "Manages a forward DNS zone.";

    type Model = ZoneForwardModel;

    fn attributes() -> &'static [Attribute] {
        const ATTRIBUTES: &[Attribute] = &[
            FQDN,
            ZONE_VIEW,
            Attribute::required(
                "forward_to",
                AttributeKind::ObjectList,
                "The information for the remote name servers to which you want the Infoblox appliance to forward queries for a specified domain name.",
            ),
            Attribute::optional(
                "forwarders_only",
                AttributeKind::Bool,
                "Determines if the appliance sends queries to forwarders only, and not to other internal or Internet root servers.",
            ),
            NS_GROUP,
            COMMENT,
            DISABLE,
            DISPLAY_DOMAIN,
        ];
        ATTRIBUTES
    }

    fn validate(model: &Self::Model, diagnostics: &mut Diagnostics) {
        validate_fqdn(model.fqdn.as_deref(), diagnostics);
        validate_comment(model.comment.as_deref(), diagnostics);

        let forwarders = model.forward_to.as_deref().unwrap_or_default();
        if model.forward_to.is_some() && forwarders.is_empty() {
            diagnostics.add_attribute_error(
                "forward_to",
                "Invalid Attribute Value",
                "\"forward_to\" must contain at least one forwarder",
            );
        }
        for (index, forwarder) in forwarders.iter().enumerate() {
            if forwarder.address.parse::<IpAddr>().is_err() {
                diagnostics.add_attribute_error(
                    format!("forward_to[{index}].address"),
                    "Invalid Attribute Value",
                    format!("\"{}\" is not a valid IP address", forwarder.address),
                );
            }
        }
    }
}

#[cfg(test)]
#[path = "zones_tests.rs"]
mod zones_tests;
