// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Attribute tables and configuration validation.
//!
//! Every resource and data source declares a static table of [`Attribute`]s. The
//! tables are constants compiled into the binary and are never mutated, so the
//! provider registry can hand out `&'static` slices freely.
//!
//! Validation works on the raw JSON configuration so that type errors are
//! reported as diagnostics instead of deserialization failures.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::diagnostics::Diagnostics;
use crate::extattrs::ExtAttrValue;

/// Value type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    String,
    Bool,
    Int,
    StringList,
    /// `name -> string` map (data source filters)
    StringMap,
    /// Extensible attribute map
    Tags,
    /// List of nested objects
    ObjectList,
}

impl AttributeKind {
    fn describe(self) -> &'static str {
        match self {
            Self::String => "a string",
            Self::Bool => "a boolean",
            Self::Int => "an integer",
            Self::StringList => "a list of strings",
            Self::StringMap => "a map of strings",
            Self::Tags => "a map of extensible attribute values",
            Self::ObjectList => "a list of objects",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Bool => value.is_boolean(),
            Self::Int => value.is_i64() || value.is_u64(),
            Self::StringList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
            Self::StringMap => value
                .as_object()
                .is_some_and(|map| map.values().all(Value::is_string)),
            Self::Tags => value.as_object().is_some_and(|map| {
                map.values()
                    .all(|v| serde_json::from_value::<ExtAttrValue>(v.clone()).is_ok())
            }),
            Self::ObjectList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_object)),
        }
    }
}

/// Whether an attribute is set by the practitioner, the provider, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Required,
    Optional,
    /// Set only by the provider
    Computed,
    /// Optional, filled in by the provider when omitted
    OptionalComputed,
}

/// Default applied to a plan when the attribute is omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DefaultValue {
    Bool(bool),
    Int(i64),
    Str(&'static str),
}

impl DefaultValue {
    fn to_json(self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(b),
            Self::Int(i) => Value::from(i),
            Self::Str(s) => Value::String(s.to_string()),
        }
    }
}

/// One attribute in a resource or data source schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub name: &'static str,
    pub kind: AttributeKind,
    pub presence: Presence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
    /// Changing the value requires a new object; never sent on update
    pub create_only: bool,
    pub description: &'static str,
}

impl Attribute {
    const fn new(
        name: &'static str,
        kind: AttributeKind,
        presence: Presence,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            kind,
            presence,
            default: None,
            create_only: false,
            description,
        }
    }

    #[must_use]
    pub const fn required(name: &'static str, kind: AttributeKind, description: &'static str) -> Self {
        Self::new(name, kind, Presence::Required, description)
    }

    #[must_use]
    pub const fn optional(name: &'static str, kind: AttributeKind, description: &'static str) -> Self {
        Self::new(name, kind, Presence::Optional, description)
    }

    #[must_use]
    pub const fn computed(name: &'static str, kind: AttributeKind, description: &'static str) -> Self {
        Self::new(name, kind, Presence::Computed, description)
    }

    #[must_use]
    pub const fn optional_computed(
        name: &'static str,
        kind: AttributeKind,
        description: &'static str,
    ) -> Self {
        Self::new(name, kind, Presence::OptionalComputed, description)
    }

    #[must_use]
    pub const fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self.presence = Presence::OptionalComputed;
        self
    }

    #[must_use]
    pub const fn create_only(mut self) -> Self {
        self.create_only = true;
        self
    }

    #[must_use]
    pub fn is_computed_only(&self) -> bool {
        self.presence == Presence::Computed
    }
}

// ============================================================================
// Attributes shared by every managed object
// ============================================================================

/// `ref`: the object reference assigned by the appliance.
pub const REF: Attribute = Attribute::computed(
    "ref",
    AttributeKind::String,
    "The reference to the object.",
);

/// `extattrs`: configured extensible attributes.
pub const EXTATTRS: Attribute = Attribute::optional(
    "extattrs",
    AttributeKind::Tags,
    "Extensible attributes associated with the object.",
);

/// `extattrs_all`: every extensible attribute on the object, including inherited ones.
pub const EXTATTRS_ALL: Attribute = Attribute::computed(
    "extattrs_all",
    AttributeKind::Tags,
    "Extensible attributes associated with the object, including default and inherited attributes.",
);

/// `internal_id`: mirror of the internal id extensible attribute.
pub const INTERNAL_ID: Attribute = Attribute::computed(
    "internal_id",
    AttributeKind::String,
    "Internal identifier used to locate the object when its reference changes.",
);

/// Attributes every managed object carries, in addition to its own.
pub const COMMON_ATTRIBUTES: &[Attribute] = &[REF, EXTATTRS, EXTATTRS_ALL, INTERNAL_ID];

/// Attributes of every data source.
pub const DATA_SOURCE_ATTRIBUTES: &[Attribute] = &[
    Attribute::optional(
        "filters",
        AttributeKind::StringMap,
        "Field filters applied to the list request.",
    ),
    Attribute::optional(
        "extattrfilters",
        AttributeKind::StringMap,
        "Extensible attribute filters applied to the list request.",
    ),
    Attribute::computed(
        "result",
        AttributeKind::ObjectList,
        "Objects matching the filters.",
    ),
];

/// Look up an attribute by name across several tables.
#[must_use]
pub fn find_attribute<'a>(tables: &[&'a [Attribute]], name: &str) -> Option<&'a Attribute> {
    tables
        .iter()
        .flat_map(|table| table.iter())
        .find(|attribute| attribute.name == name)
}

/// Validate a configuration document against attribute tables.
///
/// Reports, per attribute:
/// - attributes not in the schema
/// - computed-only attributes that were set
/// - required attributes that are missing or null
/// - values of the wrong type
#[must_use]
pub fn validate_config(tables: &[&[Attribute]], config: &Value) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();

    let Some(fields) = config.as_object() else {
        diagnostics.add_attribute_error(
            "",
            "Invalid Configuration",
            "Configuration must be a JSON object",
        );
        return diagnostics;
    };

    for (name, value) in fields {
        let Some(attribute) = find_attribute(tables, name) else {
            diagnostics.add_attribute_error(
                name.clone(),
                "Unsupported Attribute",
                format!("An argument named \"{name}\" is not expected here."),
            );
            continue;
        };
        if value.is_null() {
            continue;
        }
        if attribute.is_computed_only() {
            diagnostics.add_attribute_error(
                name.clone(),
                "Invalid Configuration for Read-Only Attribute",
                format!("Cannot set value for this attribute as the provider has marked it as read-only. Remove the configuration line setting the value. Refer to the provider documentation for details about \"{name}\"."),
            );
            continue;
        }
        if !attribute.kind.accepts(value) {
            diagnostics.add_attribute_error(
                name.clone(),
                "Incorrect Attribute Value Type",
                format!("\"{name}\" must be {}", attribute.kind.describe()),
            );
        }
    }

    for attribute in tables.iter().flat_map(|table| table.iter()) {
        if attribute.presence != Presence::Required {
            continue;
        }
        if fields.get(attribute.name).is_none_or(Value::is_null) {
            diagnostics.add_attribute_error(
                attribute.name,
                "Missing required argument",
                format!(
                    "The argument \"{}\" is required, but no definition was found.",
                    attribute.name
                ),
            );
        }
    }

    diagnostics
}

/// Fill in defaults for attributes the plan leaves unset.
pub fn apply_defaults(tables: &[&[Attribute]], plan: &mut Map<String, Value>) {
    for attribute in tables.iter().flat_map(|table| table.iter()) {
        let Some(default) = attribute.default else {
            continue;
        };
        let slot = plan
            .entry(attribute.name.to_string())
            .or_insert(Value::Null);
        if slot.is_null() {
            *slot = default.to_json();
        }
    }
}

/// Names of create-only attributes whose planned value differs from the prior one.
///
/// An unset planned value is not a change.
#[must_use]
pub fn changed_create_only(
    attributes: &[Attribute],
    prior: &Map<String, Value>,
    planned: &Map<String, Value>,
) -> Vec<&'static str> {
    attributes
        .iter()
        .filter(|attribute| attribute.create_only)
        .filter(|attribute| match planned.get(attribute.name) {
            None | Some(Value::Null) => false,
            Some(value) => prior.get(attribute.name).is_some_and(|old| !old.is_null() && old != value),
        })
        .map(|attribute| attribute.name)
        .collect()
}

/// Description of one resource or data source, emitted by the `schema` command.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceSchema {
    pub type_name: &'static str,
    pub description: &'static str,
    pub attributes: Vec<Attribute>,
    /// JSON Schema of the state document
    pub json_schema: Value,
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod schema_tests;
