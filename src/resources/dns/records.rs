// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! DNS resource record types.
//!
//! Each record type is a marker struct implementing [`NiosObject`] plus a model
//! struct holding its attributes. Attribute names match WAPI field names, so the
//! default Expand/Flatten mappings apply.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{
    validate_at_most, validate_comment, validate_dns_name, validate_ipv4, validate_ipv6,
    validate_ttl, COMMENT, DISABLE, DNS_NAME, TTL, USE_TTL, VIEW, ZONE,
};
use crate::constants::{
    OBJECT_RECORD_A, OBJECT_RECORD_AAAA, OBJECT_RECORD_CAA, OBJECT_RECORD_CNAME,
    OBJECT_RECORD_MX, OBJECT_RECORD_PTR, OBJECT_RECORD_SRV, OBJECT_RECORD_TXT, TYPE_RECORD_A,
    TYPE_RECORD_AAAA, TYPE_RECORD_CAA, TYPE_RECORD_CNAME, TYPE_RECORD_MX, TYPE_RECORD_PTR,
    TYPE_RECORD_SRV, TYPE_RECORD_TXT,
};
use crate::diagnostics::Diagnostics;
use crate::resources::NiosObject;
use crate::schema::{Attribute, AttributeKind};

/// CAA property tags accepted by NIOS.
pub const CAA_TAGS: [&str; 3] = ["issue", "issuewild", "iodef"];

const fn name_attribute(description: &'static str) -> Attribute {
    Attribute::required("name", AttributeKind::String, description)
}

fn validate_common(
    name: Option<&str>,
    ttl: Option<u32>,
    comment: Option<&str>,
    diagnostics: &mut Diagnostics,
) {
    validate_dns_name("name", name, diagnostics);
    validate_ttl(ttl, diagnostics);
    validate_comment(comment, diagnostics);
}

// ============================================================================
// A
// ============================================================================

/// IPv4 address record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RecordAModel {
    /// Name for the A record in FQDN format.
    pub name: Option<String>,
    /// The IPv4 address of the record.
    pub ipv4addr: Option<String>,
    pub view: Option<String>,
    pub ttl: Option<u32>,
    pub use_ttl: Option<bool>,
    pub comment: Option<String>,
    pub disable: Option<bool>,
    pub zone: Option<String>,
    pub dns_name: Option<String>,
}

pub struct RecordA;

impl NiosObject for RecordA {
    const OBJECT_TYPE: &'static str = OBJECT_RECORD_A;
    const TYPE_NAME: &'static str = TYPE_RECORD_A;
    const RETURN_FIELDS: &'static str =
        "extattrs,name,ipv4addr,view,ttl,use_ttl,comment,disable,zone,dns_name";
    const DESCRIPTION: &'static str = "Manages a DNS A record.";

    type Model = RecordAModel;

    fn attributes() -> &'static [Attribute] {
        const ATTRIBUTES: &[Attribute] = &[
            name_attribute("Name for the A record in FQDN format."),
            Attribute::required(
                "ipv4addr",
                AttributeKind::String,
                "The IPv4 address of the record.",
            ),
            VIEW,
            TTL,
            USE_TTL,
            COMMENT,
            DISABLE,
            ZONE,
            DNS_NAME,
        ];
        ATTRIBUTES
    }

    fn validate(model: &Self::Model, diagnostics: &mut Diagnostics) {
        validate_common(
            model.name.as_deref(),
            model.ttl,
            model.comment.as_deref(),
            diagnostics,
        );
        validate_ipv4("ipv4addr", model.ipv4addr.as_deref(), diagnostics);
    }
}

// ============================================================================
// AAAA
// ============================================================================

/// IPv6 address record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RecordAaaaModel {
    /// Name for the AAAA record in FQDN format.
    pub name: Option<String>,
    /// The IPv6 address of the record.
    pub ipv6addr: Option<String>,
    pub view: Option<String>,
    pub ttl: Option<u32>,
    pub use_ttl: Option<bool>,
    pub comment: Option<String>,
    pub disable: Option<bool>,
    pub zone: Option<String>,
    pub dns_name: Option<String>,
}

pub struct RecordAaaa;

impl NiosObject for RecordAaaa {
    const OBJECT_TYPE: &'static str = OBJECT_RECORD_AAAA;
    const TYPE_NAME: &'static str = TYPE_RECORD_AAAA;
    const RETURN_FIELDS: &'static str =
        "extattrs,name,ipv6addr,view,ttl,use_ttl,comment,disable,zone,dns_name";
    const DESCRIPTION: &'static str = "Manages a DNS AAAA record.";

    type Model = RecordAaaaModel;

    fn attributes() -> &'static [Attribute] {
        const ATTRIBUTES: &[Attribute] = &[
            name_attribute("Name for the AAAA record in FQDN format."),
            Attribute::required(
                "ipv6addr",
                AttributeKind::String,
                "The IPv6 address of the record.",
            ),
            VIEW,
            TTL,
            USE_TTL,
            COMMENT,
            DISABLE,
            ZONE,
            DNS_NAME,
        ];
        ATTRIBUTES
    }

    fn validate(model: &Self::Model, diagnostics: &mut Diagnostics) {
        validate_common(
            model.name.as_deref(),
            model.ttl,
            model.comment.as_deref(),
            diagnostics,
        );
        validate_ipv6("ipv6addr", model.ipv6addr.as_deref(), diagnostics);
    }
}

// ============================================================================
// CNAME
// ============================================================================

/// Canonical name record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RecordCnameModel {
    /// The alias name in FQDN format.
    pub name: Option<String>,
    /// Canonical name in FQDN format.
    pub canonical: Option<String>,
    pub view: Option<String>,
    pub ttl: Option<u32>,
    pub use_ttl: Option<bool>,
    pub comment: Option<String>,
    pub disable: Option<bool>,
    pub zone: Option<String>,
    pub dns_name: Option<String>,
}

pub struct RecordCname;

impl NiosObject for RecordCname {
    const OBJECT_TYPE: &'static str = OBJECT_RECORD_CNAME;
    const TYPE_NAME: &'static str = TYPE_RECORD_CNAME;
    const RETURN_FIELDS: &'static str =
        "extattrs,name,canonical,view,ttl,use_ttl,comment,disable,zone,dns_name";
    const DESCRIPTION: &'static str = "Manages a DNS CNAME record.";

    type Model = RecordCnameModel;

    fn attributes() -> &'static [Attribute] {
        const ATTRIBUTES: &[Attribute] = &[
            name_attribute("The alias name in FQDN format."),
            Attribute::required(
                "canonical",
                AttributeKind::String,
                "Canonical name in FQDN format.",
            ),
            VIEW,
            TTL,
            USE_TTL,
            COMMENT,
            DISABLE,
            ZONE,
            DNS_NAME,
        ];
        ATTRIBUTES
    }

    fn validate(model: &Self::Model, diagnostics: &mut Diagnostics) {
        validate_common(
            model.name.as_deref(),
            model.ttl,
            model.comment.as_deref(),
            diagnostics,
        );
        validate_dns_name("canonical", model.canonical.as_deref(), diagnostics);
        if model.name.is_some() && model.name == model.canonical {
            diagnostics.add_attribute_error(
                "canonical",
                "Invalid Attribute Value",
                "\"canonical\" must differ from \"name\"",
            );
        }
    }
}

// ============================================================================
// MX
// ============================================================================

/// Mail exchanger record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RecordMxModel {
    /// Name for the MX record in FQDN format.
    pub name: Option<String>,
    /// Mail exchanger name in FQDN format.
    pub mail_exchanger: Option<String>,
    /// Preference value, 0 to 65535 (inclusive).
    pub preference: Option<u32>,
    pub view: Option<String>,
    pub ttl: Option<u32>,
    pub use_ttl: Option<bool>,
    pub comment: Option<String>,
    pub disable: Option<bool>,
    pub zone: Option<String>,
}

pub struct RecordMx;

impl NiosObject for RecordMx {
    const OBJECT_TYPE: &'static str = OBJECT_RECORD_MX;
    const TYPE_NAME: &'static str = TYPE_RECORD_MX;
    const RETURN_FIELDS: &'static str =
        "extattrs,name,mail_exchanger,preference,view,ttl,use_ttl,comment,disable,zone";
    const DESCRIPTION: &'static str = "Manages a DNS MX record.";

    type Model = RecordMxModel;

    fn attributes() -> &'static [Attribute] {
        const ATTRIBUTES: &[Attribute] = &[
            name_attribute("Name for the MX record in FQDN format."),
            Attribute::required(
                "mail_exchanger",
                AttributeKind::String,
                "Mail exchanger name in FQDN format.",
            ),
            Attribute::required(
                "preference",
                AttributeKind::Int,
                "Preference value, 0 to 65535 (inclusive).",
            ),
            VIEW,
            TTL,
            USE_TTL,
            COMMENT,
            DISABLE,
            ZONE,
        ];
        ATTRIBUTES
    }

    fn validate(model: &Self::Model, diagnostics: &mut Diagnostics) {
        validate_common(
            model.name.as_deref(),
            model.ttl,
            model.comment.as_deref(),
            diagnostics,
        );
        validate_dns_name("mail_exchanger", model.mail_exchanger.as_deref(), diagnostics);
        validate_at_most("preference", model.preference, 65535, diagnostics);
    }
}

// ============================================================================
// PTR
// ============================================================================

/// Pointer record.
///
/// Either `ipv4addr`, `ipv6addr` or a reverse-zone `name` identifies the record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RecordPtrModel {
    /// The domain name of the DNS PTR record in FQDN format.
    pub ptrdname: Option<String>,
    /// The name of the DNS PTR record in FQDN format (reverse zone).
    pub name: Option<String>,
    pub ipv4addr: Option<String>,
    pub ipv6addr: Option<String>,
    pub view: Option<String>,
    pub ttl: Option<u32>,
    pub use_ttl: Option<bool>,
    pub comment: Option<String>,
    pub disable: Option<bool>,
    pub zone: Option<String>,
}

pub struct RecordPtr;

impl NiosObject for RecordPtr {
    const OBJECT_TYPE: &'static str = OBJECT_RECORD_PTR;
    const TYPE_NAME: &'static str = TYPE_RECORD_PTR;
    const RETURN_FIELDS: &'static str =
        "extattrs,ptrdname,name,ipv4addr,ipv6addr,view,ttl,use_ttl,comment,disable,zone";
    const DESCRIPTION: &'static str = "Manages a DNS PTR record.";

    type Model = RecordPtrModel;

    fn attributes() -> &'static [Attribute] {
        const ATTRIBUTES: &[Attribute] = &[
            Attribute::required(
                "ptrdname",
                AttributeKind::String,
                "The domain name of the DNS PTR record in FQDN format.",
            ),
            Attribute::optional_computed(
                "name",
                AttributeKind::String,
                "The name of the DNS PTR record in FQDN format.",
            ),
            Attribute::optional_computed(
                "ipv4addr",
                AttributeKind::String,
                "The IPv4 address of the record.",
            ),
            Attribute::optional_computed(
                "ipv6addr",
                AttributeKind::String,
                "The IPv6 address of the record.",
            ),
            VIEW,
            TTL,
            USE_TTL,
            COMMENT,
            DISABLE,
            ZONE,
        ];
        ATTRIBUTES
    }

    fn validate(model: &Self::Model, diagnostics: &mut Diagnostics) {
        validate_common(
            model.name.as_deref(),
            model.ttl,
            model.comment.as_deref(),
            diagnostics,
        );
        validate_dns_name("ptrdname", model.ptrdname.as_deref(), diagnostics);
        validate_ipv4("ipv4addr", model.ipv4addr.as_deref(), diagnostics);
        validate_ipv6("ipv6addr", model.ipv6addr.as_deref(), diagnostics);

        if model.ipv4addr.is_some() && model.ipv6addr.is_some() {
            diagnostics.add_attribute_error(
                "ipv6addr",
                "Invalid Attribute Combination",
                "Only one of \"ipv4addr\" and \"ipv6addr\" can be set",
            );
        }
        if model.name.is_none() && model.ipv4addr.is_none() && model.ipv6addr.is_none() {
            diagnostics.add_attribute_error(
                "name",
                "Invalid Attribute Combination",
                "One of \"name\", \"ipv4addr\" or \"ipv6addr\" must be set",
            );
        }
    }
}

// ============================================================================
// SRV
// ============================================================================

/// Service location record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RecordSrvModel {
    /// A name in the `_service._proto.domain` format.
    pub name: Option<String>,
    /// The target host name in FQDN format.
    pub target: Option<String>,
    pub port: Option<u32>,
    pub priority: Option<u32>,
    pub weight: Option<u32>,
    pub view: Option<String>,
    pub ttl: Option<u32>,
    pub use_ttl: Option<bool>,
    pub comment: Option<String>,
    pub disable: Option<bool>,
    pub zone: Option<String>,
}

pub struct RecordSrv;

impl NiosObject for RecordSrv {
    const OBJECT_TYPE: &'static str = OBJECT_RECORD_SRV;
    const TYPE_NAME: &'static str = TYPE_RECORD_SRV;
    const RETURN_FIELDS: &'static str =
        "extattrs,name,target,port,priority,weight,view,ttl,use_ttl,comment,disable,zone";
    const DESCRIPTION: &'static str = "Manages a DNS SRV record.";

    type Model = RecordSrvModel;

    fn attributes() -> &'static [Attribute] {
        const ATTRIBUTES: &[Attribute] = &[
            name_attribute("A name in the _service._proto.domain format."),
            Attribute::required(
                "target",
                AttributeKind::String,
                "The target host name in FQDN format.",
            ),
            Attribute::required(
                "port",
                AttributeKind::Int,
                "The port of the service, 0 to 65535 (inclusive).",
            ),
            Attribute::required(
                "priority",
                AttributeKind::Int,
                "The priority of the record, 0 to 65535 (inclusive).",
            ),
            Attribute::required(
                "weight",
                AttributeKind::Int,
                "The weight of the record, 0 to 65535 (inclusive).",
            ),
            VIEW,
            TTL,
            USE_TTL,
            COMMENT,
            DISABLE,
            ZONE,
        ];
        ATTRIBUTES
    }

    fn validate(model: &Self::Model, diagnostics: &mut Diagnostics) {
        validate_common(
            model.name.as_deref(),
            model.ttl,
            model.comment.as_deref(),
            diagnostics,
        );
        validate_dns_name("target", model.target.as_deref(), diagnostics);
        validate_at_most("port", model.port, 65535, diagnostics);
        validate_at_most("priority", model.priority, 65535, diagnostics);
        validate_at_most("weight", model.weight, 65535, diagnostics);
    }
}

// ============================================================================
// TXT
// ============================================================================

/// Text record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RecordTxtModel {
    /// Name for the TXT record in FQDN format.
    pub name: Option<String>,
    /// Text associated with the record.
    pub text: Option<String>,
    pub view: Option<String>,
    pub ttl: Option<u32>,
    pub use_ttl: Option<bool>,
    pub comment: Option<String>,
    pub disable: Option<bool>,
    pub zone: Option<String>,
}

pub struct RecordTxt;

impl NiosObject for RecordTxt {
    const OBJECT_TYPE: &'static str = OBJECT_RECORD_TXT;
    const TYPE_NAME: &'static str = TYPE_RECORD_TXT;
    const RETURN_FIELDS: &'static str =
        "extattrs,name,text,view,ttl,use_ttl,comment,disable,zone";
    const DESCRIPTION: &'static str = "Manages a DNS TXT record.";

    type Model = RecordTxtModel;

    fn attributes() -> &'static [Attribute] {
        const ATTRIBUTES: &[Attribute] = &[
            name_attribute("Name for the TXT record in FQDN format."),
            Attribute::required(
                "text",
                AttributeKind::String,
                "Text associated with the record.",
            ),
            VIEW,
            TTL,
            USE_TTL,
            COMMENT,
            DISABLE,
            ZONE,
        ];
        ATTRIBUTES
    }

    fn validate(model: &Self::Model, diagnostics: &mut Diagnostics) {
        validate_common(
            model.name.as_deref(),
            model.ttl,
            model.comment.as_deref(),
            diagnostics,
        );
        if model.text.as_deref() == Some("") {
            diagnostics.add_attribute_error(
                "text",
                "Invalid Attribute Value",
                "\"text\" must not be empty",
            );
        }
    }
}

// ============================================================================
// CAA
// ============================================================================

/// Certification authority authorization record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RecordCaaModel {
    /// Name for the CAA record in FQDN format.
    pub name: Option<String>,
    /// Flag of the CAA record, 0 or 128 in practice.
    pub ca_flag: Option<u32>,
    /// Property tag: issue, issuewild or iodef.
    pub ca_tag: Option<String>,
    /// Value of the property.
    pub ca_value: Option<String>,
    pub view: Option<String>,
    pub ttl: Option<u32>,
    pub use_ttl: Option<bool>,
    pub comment: Option<String>,
    pub disable: Option<bool>,
    pub zone: Option<String>,
}

pub struct RecordCaa;

impl NiosObject for RecordCaa {
    const OBJECT_TYPE: &'static str = OBJECT_RECORD_CAA;
    const TYPE_NAME: &'static str = TYPE_RECORD_CAA;
    const RETURN_FIELDS: &'static str =
        "extattrs,name,ca_flag,ca_tag,ca_value,view,ttl,use_ttl,comment,disable,zone";
    const DESCRIPTION: &'static str = "Manages a DNS CAA record.";

    type Model = RecordCaaModel;

    fn attributes() -> &'static [Attribute] {
        const ATTRIBUTES: &[Attribute] = &[
            name_attribute("Name for the CAA record in FQDN format."),
            Attribute::required("ca_flag", AttributeKind::Int, "Flag of the CAA record."),
            Attribute::required(
                "ca_tag",
                AttributeKind::String,
                "Property tag: issue, issuewild or iodef.",
            ),
            Attribute::required("ca_value", AttributeKind::String, "Value of the property."),
            VIEW,
            TTL,
            USE_TTL,
            COMMENT,
            DISABLE,
            ZONE,
        ];
        ATTRIBUTES
    }

    fn validate(model: &Self::Model, diagnostics: &mut Diagnostics) {
        validate_common(
            model.name.as_deref(),
            model.ttl,
            model.comment.as_deref(),
            diagnostics,
        );
        validate_at_most("ca_flag", model.ca_flag, 255, diagnostics);
        if let Some(tag) = model.ca_tag.as_deref().filter(|t| !CAA_TAGS.contains(t)) {
            diagnostics.add_attribute_error(
                "ca_tag",
                "Invalid Attribute Value",
                format!(
                    "\"ca_tag\" must be one of {}, got \"{tag}\"",
                    CAA_TAGS.join(", ")
                ),
            );
        }
    }
}

#[cfg(test)]
#[path = "records_tests.rs"]
mod records_tests;
