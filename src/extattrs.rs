// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Extensible attribute (tag) reconciliation.
//!
//! NIOS objects carry extensible attributes that are either configured by the
//! practitioner or inherited from a parent object such as a network. The server
//! returns both kinds together, so every read has to separate them again:
//!
//! - `extattrs` (configured) only ever holds keys the practitioner declared
//! - `extattrs_all` (effective) holds everything the server returned, so inherited
//!   attributes can be sent back on the next update
//!
//! Every object created by the provider is also stamped with the
//! [`INTERNAL_ID_EXT_ATTR`] attribute, which is what the dual lookup falls back to
//! when a stored reference goes stale.
//!
//! # Wire format
//!
//! ```json
//! {
//!   "Site":   {"value": "nyc"},
//!   "Region": {"value": "us-east", "inheritance_source": {"_ref": "network/..."}}
//! }
//! ```

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::constants::{EXT_ATTR_INHERITANCE_SOURCE_KEY, EXT_ATTR_VALUE_KEY, INTERNAL_ID_EXT_ATTR};
use crate::errors::ExtAttrError;

/// Value of a single extensible attribute.
///
/// NIOS attribute types (STRING, INTEGER, EMAIL, URL, DATE, ENUM) all travel as
/// strings or integers; multi-value attributes travel as lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ExtAttrValue {
    Bool(bool),
    Integer(i64),
    String(String),
    List(Vec<ExtAttrValue>),
}

impl ExtAttrValue {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Bool(_) | Self::Integer(_) | Self::List(_) => None,
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(*b),
            Self::Integer(i) => Value::from(*i),
            Self::String(s) => Value::String(s.clone()),
            Self::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
        }
    }
}

impl fmt::Display for ExtAttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::String(s) => f.write_str(s),
            Self::List(items) => {
                let rendered: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", rendered.join(","))
            }
        }
    }
}

impl From<&str> for ExtAttrValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ExtAttrValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for ExtAttrValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

/// Tag set keyed by attribute name.
pub type ExtAttrs = BTreeMap<String, ExtAttrValue>;

/// Result of separating configured attributes from inherited ones after a read.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReconciledExtAttrs {
    /// Attributes to store as configured (`extattrs`)
    pub configured: Option<ExtAttrs>,
    /// Every attribute the server returned (`extattrs_all`)
    pub all: ExtAttrs,
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn decode_value(key: &str, value: &Value) -> Result<ExtAttrValue, ExtAttrError> {
    match value {
        Value::Bool(b) => Ok(ExtAttrValue::Bool(*b)),
        Value::Number(n) => n
            .as_i64()
            .map(ExtAttrValue::Integer)
            .ok_or_else(|| ExtAttrError::UnsupportedValue {
                key: key.to_string(),
                found: "float",
            }),
        Value::String(s) => Ok(ExtAttrValue::String(s.clone())),
        Value::Array(items) => items
            .iter()
            .map(|item| decode_value(key, item))
            .collect::<Result<Vec<_>, _>>()
            .map(ExtAttrValue::List),
        Value::Null | Value::Object(_) => Err(ExtAttrError::UnsupportedValue {
            key: key.to_string(),
            found: json_kind(value),
        }),
    }
}

fn wire_entries(raw: Option<&Value>) -> Result<Option<&Map<String, Value>>, ExtAttrError> {
    match raw {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(other) => Err(ExtAttrError::NotAnObject {
            found: json_kind(other),
        }),
    }
}

fn decode_entry(key: &str, entry: &Value) -> Result<(ExtAttrValue, bool), ExtAttrError> {
    let Value::Object(fields) = entry else {
        return Err(ExtAttrError::MissingValue {
            key: key.to_string(),
        });
    };
    let value = fields
        .get(EXT_ATTR_VALUE_KEY)
        .ok_or_else(|| ExtAttrError::MissingValue {
            key: key.to_string(),
        })?;
    let inherited = fields.contains_key(EXT_ATTR_INHERITANCE_SOURCE_KEY);
    Ok((decode_value(key, value)?, inherited))
}

/// Decode the wire form of `extattrs` into a tag set.
///
/// # Errors
///
/// Returns an error if the document is not an object, or if an entry has no
/// `value` or a value that is null, a float or an object.
pub fn decode_wire(raw: Option<&Value>) -> Result<ExtAttrs, ExtAttrError> {
    let Some(entries) = wire_entries(raw)? else {
        return Ok(ExtAttrs::new());
    };
    entries
        .iter()
        .map(|(key, entry)| decode_entry(key, entry).map(|(value, _)| (key.clone(), value)))
        .collect()
}

/// Encode a tag set into the wire form sent to the WAPI.
#[must_use]
pub fn to_wire(tags: &ExtAttrs) -> Value {
    let entries = tags
        .iter()
        .map(|(key, value)| {
            let mut entry = Map::new();
            entry.insert(EXT_ATTR_VALUE_KEY.to_string(), value.to_json());
            (key.clone(), Value::Object(entry))
        })
        .collect();
    Value::Object(entries)
}

/// Separate the server's effective tag set into what is stored as configured and
/// what is retained for the next update.
///
/// Every key the server returned lands in `all`. A key lands in `configured` only if
/// the practitioner configured it. The result never fails on missing keys, only on a
/// malformed wire document.
///
/// When nothing was configured and nothing survives the pruning, `configured` stays
/// `None` so an unset attribute does not turn into an empty map.
///
/// # Errors
///
/// Returns an error if the server document cannot be decoded.
pub fn remove_inherited_ext_attrs(
    configured: Option<&ExtAttrs>,
    server: Option<&Value>,
) -> Result<ReconciledExtAttrs, ExtAttrError> {
    let all = decode_wire(server)?;

    let pruned: ExtAttrs = all
        .iter()
        .filter(|(key, _)| configured.is_some_and(|c| c.contains_key(*key)))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    let configured = match configured {
        None if pruned.is_empty() => None,
        _ => Some(pruned),
    };

    Ok(ReconciledExtAttrs { configured, all })
}

/// Merge the retained effective tag set back into a newly configured one.
///
/// Keys present in `all_from_last_read` but absent from `configured` are added back
/// so an update does not drop inherited attributes the server expects to keep.
/// Configured values always win.
#[must_use]
pub fn add_inherited_ext_attrs(
    configured: Option<&ExtAttrs>,
    all_from_last_read: Option<&ExtAttrs>,
) -> ExtAttrs {
    let mut merged = configured.cloned().unwrap_or_default();
    if let Some(all) = all_from_last_read {
        for (key, value) in all {
            merged
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }
    merged
}

/// Narrow a retained effective tag set to what should be re-sent on update.
///
/// Keys the practitioner configured last time and has since removed are dropped, so
/// removing a tag from configuration removes it from the object. Everything else
/// (inherited attributes and the internal id) is kept.
#[must_use]
pub fn retained_for_update(
    previous_all: Option<&ExtAttrs>,
    previous_configured: Option<&ExtAttrs>,
    configured: Option<&ExtAttrs>,
) -> ExtAttrs {
    let Some(previous_all) = previous_all else {
        return ExtAttrs::new();
    };
    previous_all
        .iter()
        .filter(|(key, _)| {
            let was_configured = previous_configured.is_some_and(|p| p.contains_key(*key));
            let still_configured = configured.is_some_and(|c| c.contains_key(*key));
            !was_configured || still_configured
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Stamp the reserved internal id attribute onto a tag set.
///
/// A set that already carries the attribute is returned unchanged, so calling this
/// repeatedly yields the same id.
///
/// # Errors
///
/// Returns an error if the attribute is present but not a string.
pub fn add_internal_id_to_ext_attrs(tags: Option<&ExtAttrs>) -> Result<ExtAttrs, ExtAttrError> {
    let mut stamped = tags.cloned().unwrap_or_default();
    match stamped.get(INTERNAL_ID_EXT_ATTR) {
        Some(ExtAttrValue::String(_)) => {}
        Some(_) => {
            return Err(ExtAttrError::InvalidInternalId {
                key: INTERNAL_ID_EXT_ATTR.to_string(),
            })
        }
        None => {
            stamped.insert(
                INTERNAL_ID_EXT_ATTR.to_string(),
                ExtAttrValue::String(generate_internal_id()),
            );
        }
    }
    Ok(stamped)
}

/// Read the internal id out of a tag set.
#[must_use]
pub fn internal_id(tags: Option<&ExtAttrs>) -> Option<&str> {
    tags?
        .get(INTERNAL_ID_EXT_ATTR)
        .and_then(ExtAttrValue::as_str)
        .filter(|id| !id.is_empty())
}

/// Split a server tag set for import, where no configuration exists yet.
///
/// Attributes carrying an `inheritance_source` are inherited; the internal id is
/// never treated as configured. Returns `(local, all)`.
///
/// # Errors
///
/// Returns an error if the server document cannot be decoded.
pub fn split_inherited(server: Option<&Value>) -> Result<(ExtAttrs, ExtAttrs), ExtAttrError> {
    let mut local = ExtAttrs::new();
    let mut all = ExtAttrs::new();
    if let Some(entries) = wire_entries(server)? {
        for (key, entry) in entries {
            let (value, inherited) = decode_entry(key, entry)?;
            if !inherited && key != INTERNAL_ID_EXT_ATTR {
                local.insert(key.clone(), value.clone());
            }
            all.insert(key.clone(), value);
        }
    }
    Ok((local, all))
}

/// Generate a new internal id in the textual UUID v4 form.
#[must_use]
pub fn generate_internal_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
#[path = "extattrs_tests.rs"]
mod extattrs_tests;
