// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Name server groups.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{validate_comment, MemberServer, COMMENT, GRID_PRIMARY, GRID_SECONDARIES};
use crate::constants::{OBJECT_NSGROUP, TYPE_NSGROUP};
use crate::diagnostics::Diagnostics;
use crate::resources::NiosObject;
use crate::schema::{Attribute, AttributeKind};

/// Name server group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct NsGroupModel {
    /// The name of this name server group.
    pub name: Option<String>,
    pub comment: Option<String>,
    pub grid_primary: Option<Vec<MemberServer>>,
    pub grid_secondaries: Option<Vec<MemberServer>>,
    /// Whether this is the grid default name server group.
    pub is_grid_default: Option<bool>,
    /// Whether an external server is primary for zones using this group.
    pub use_external_primary: Option<bool>,
}

pub struct NsGroup;

impl NiosObject for NsGroup {
    const OBJECT_TYPE: &'static str = OBJECT_NSGROUP;
    const TYPE_NAME: &'static str = TYPE_NSGROUP;
    const RETURN_FIELDS: &'static str =
        "extattrs,name,comment,grid_primary,grid_secondaries,is_grid_default,use_external_primary";
    const DESCRIPTION: &'static str = "Manages a DNS name server group.";

    type Model = NsGroupModel;

    fn attributes() -> &'static [Attribute] {
        const ATTRIBUTES: &[Attribute] = &[
            Attribute::required(
                "name",
                AttributeKind::String,
                "The name of this name server group.",
            ),
            COMMENT,
            GRID_PRIMARY,
            GRID_SECONDARIES,
            Attribute::optional(
                "is_grid_default",
                AttributeKind::Bool,
                "Determines if this name server group is the Grid default.",
            ),
            Attribute::optional(
                "use_external_primary",
                AttributeKind::Bool,
                "This flag controls whether the group is using an external primary.",
            ),
        ];
        ATTRIBUTES
    }

    fn validate(model: &Self::Model, diagnostics: &mut Diagnostics) {
        validate_comment(model.comment.as_deref(), diagnostics);

        if model.name.as_deref().is_some_and(str::is_empty) {
            diagnostics.add_attribute_error(
                "name",
                "Invalid Attribute Value",
                "\"name\" must not be empty",
            );
        }

        let has_primary = model.grid_primary.as_ref().is_some_and(|p| !p.is_empty());
        let external = model.use_external_primary.unwrap_or(false);
        if !has_primary && !external {
            diagnostics.add_attribute_error(
                "grid_primary",
                "Missing Attribute Configuration",
                "\"grid_primary\" must list at least one member unless \"use_external_primary\" is true",
            );
        }
    }
}

#[cfg(test)]
#[path = "nsgroup_tests.rs"]
mod nsgroup_tests;
