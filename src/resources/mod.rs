// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Managed resources.
//!
//! Every NIOS object type the provider manages implements [`NiosObject`], which
//! describes the WAPI object type, the fields to request, the attribute table and
//! the Expand (model to API) and Flatten (API to model) mappings. The CRUD control
//! flow is written once in [`ManagedResource`]:
//!
//! ```text
//! Create:  validate -> stamp internal id -> POST <type> -> reconcile tags
//! Read:    GET <ref> | search by internal id -> reconcile tags (gone: drop state)
//! Update:  validate -> re-add inherited tags -> PUT <ref> (stale: search by id)
//! Delete:  DELETE <ref> (stale: search by id; gone: success)
//! Import:  GET <ref> -> split inherited tags -> stamp internal id if missing
//! ```
//!
//! [`ResourceHandler`] is the object-safe, JSON-level view of a resource that the
//! provider registry stores.

pub mod dns;
pub mod ip_association;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::client::{RequestOptions, WapiApi};
use crate::diagnostics::Diagnostics;
use crate::errors::{Operation, ProviderError};
use crate::extattrs::{
    add_inherited_ext_attrs, add_internal_id_to_ext_attrs, internal_id, remove_inherited_ext_attrs,
    retained_for_update, split_inherited, to_wire, ExtAttrs,
};
use crate::lookup::{object_reference, LookupSource, Resolution, Resolver};
use crate::schema::{
    apply_defaults, changed_create_only, validate_config, Attribute, ResourceSchema,
    COMMON_ATTRIBUTES,
};

/// Field name of extensible attributes in WAPI payloads.
pub const EXTATTRS_FIELD: &str = "extattrs";

/// State document of a managed object: the common attributes plus the type's model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ResourceState<M> {
    /// Object reference
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
    /// Configured extensible attributes
    #[serde(default)]
    pub extattrs: Option<ExtAttrs>,
    /// Every extensible attribute on the object, including inherited ones
    #[serde(default)]
    pub extattrs_all: Option<ExtAttrs>,
    /// Internal id, mirrored from `extattrs_all`
    #[serde(default)]
    pub internal_id: Option<String>,
    #[serde(flatten)]
    pub model: M,
}

impl<M> ResourceState<M> {
    /// Internal id known for this object, from the retained tags or the mirror.
    #[must_use]
    pub fn known_internal_id(&self) -> Option<&str> {
        internal_id(self.extattrs_all.as_ref())
            .or_else(|| self.internal_id.as_deref().filter(|id| !id.is_empty()))
    }
}

/// Description of one NIOS object type.
pub trait NiosObject: Send + Sync + 'static {
    /// WAPI object type (`record:a`)
    const OBJECT_TYPE: &'static str;
    /// Provider type name (`nios_dns_record_a`)
    const TYPE_NAME: &'static str;
    /// Fields requested with `_return_fields+`
    const RETURN_FIELDS: &'static str;
    const DESCRIPTION: &'static str;

    /// Provider-facing model of the type-specific attributes.
    type Model: Serialize
        + DeserializeOwned
        + JsonSchema
        + Clone
        + Default
        + Debug
        + PartialEq
        + Send
        + Sync;

    /// Type-specific attributes, excluding [`COMMON_ATTRIBUTES`].
    fn attributes() -> &'static [Attribute];

    /// Type-specific validation rules, run after the schema checks.
    fn validate(_model: &Self::Model, _diagnostics: &mut Diagnostics) {}

    /// Convert the model into a WAPI payload.
    ///
    /// The default serializes the model, drops unset fields and drops attributes
    /// the provider computes.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be serialized.
    fn expand(model: &Self::Model) -> Result<Map<String, Value>, serde_json::Error> {
        let Value::Object(fields) = serde_json::to_value(model)? else {
            return Ok(Map::new());
        };
        let attributes = Self::attributes();
        Ok(fields
            .into_iter()
            .filter(|(_, value)| !value.is_null())
            .filter(|(name, _)| {
                attributes
                    .iter()
                    .find(|a| a.name == name)
                    .is_some_and(|a| !a.is_computed_only())
            })
            .collect())
    }

    /// Convert a WAPI object into the model.
    ///
    /// # Errors
    ///
    /// Returns an error if the object does not match the model.
    fn flatten(object: &Value) -> Result<Self::Model, serde_json::Error> {
        serde_json::from_value(object.clone())
    }

    /// Adjust an update payload. The default removes create-only attributes.
    fn prepare_update(payload: &mut Map<String, Value>) {
        for attribute in Self::attributes().iter().filter(|a| a.create_only) {
            payload.remove(attribute.name);
        }
    }
}

/// Request options used for every call on `O`.
fn request_options<O: NiosObject>() -> RequestOptions {
    RequestOptions::new()
        .return_fields_plus(O::RETURN_FIELDS)
        .return_as_object()
}

/// Build the JSON schema description of `O`.
#[must_use]
pub fn resource_schema<O: NiosObject>() -> ResourceSchema {
    let json_schema = serde_json::to_value(schemars::schema_for!(ResourceState<O::Model>))
        .unwrap_or(Value::Null);
    ResourceSchema {
        type_name: O::TYPE_NAME,
        description: O::DESCRIPTION,
        attributes: COMMON_ATTRIBUTES
            .iter()
            .chain(O::attributes())
            .copied()
            .collect(),
        json_schema,
    }
}

/// Decode a JSON document into a typed state.
///
/// # Errors
///
/// Returns a `Decode` error naming `what` was being decoded.
pub fn decode_state<M: DeserializeOwned>(
    type_name: &'static str,
    what: &'static str,
    document: Value,
) -> Result<M, ProviderError> {
    serde_json::from_value(document).map_err(|source| ProviderError::Decode {
        type_name,
        what,
        source,
    })
}

/// Encode a typed state into a JSON document.
///
/// # Errors
///
/// Returns a `Decode` error if serialization fails.
pub fn encode_state<M: Serialize>(type_name: &'static str, state: &M) -> Result<Value, ProviderError> {
    serde_json::to_value(state).map_err(|source| ProviderError::Decode {
        type_name,
        what: "state",
        source,
    })
}

/// CRUD engine for one object type.
pub struct ManagedResource<O: NiosObject> {
    api: Arc<dyn WapiApi>,
    _object: PhantomData<fn() -> O>,
}

impl<O: NiosObject> ManagedResource<O> {
    #[must_use]
    pub fn new(api: Arc<dyn WapiApi>) -> Self {
        Self {
            api,
            _object: PhantomData,
        }
    }

    fn resolver(&self) -> Resolver<'_> {
        Resolver::new(
            self.api.as_ref(),
            O::OBJECT_TYPE,
            O::TYPE_NAME,
            request_options::<O>(),
        )
    }

    fn tag_error(source: crate::errors::ExtAttrError) -> ProviderError {
        ProviderError::ExtAttrs {
            type_name: O::TYPE_NAME,
            source,
        }
    }

    /// Run the type's own validation rules on a decoded plan.
    #[must_use]
    pub fn validate(&self, plan: &ResourceState<O::Model>) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        O::validate(&plan.model, &mut diagnostics);
        diagnostics
    }

    fn ensure_valid(&self, plan: &ResourceState<O::Model>) -> Result<(), ProviderError> {
        let diagnostics = self.validate(plan);
        if diagnostics.has_error() {
            return Err(ProviderError::Validation {
                type_name: O::TYPE_NAME,
                diagnostics,
            });
        }
        Ok(())
    }

    /// Build state from a WAPI object, keeping only the configured tags in `extattrs`.
    fn state_from_object(
        &self,
        object: &Value,
        configured: Option<&ExtAttrs>,
    ) -> Result<ResourceState<O::Model>, ProviderError> {
        let reconciled =
            remove_inherited_ext_attrs(configured, object.get(EXTATTRS_FIELD)).map_err(Self::tag_error)?;
        let model = O::flatten(object).map_err(|source| ProviderError::Decode {
            type_name: O::TYPE_NAME,
            what: "WAPI object",
            source,
        })?;

        Ok(ResourceState {
            reference: object_reference(object).map(str::to_string),
            internal_id: internal_id(Some(&reconciled.all)).map(str::to_string),
            extattrs: reconciled.configured,
            extattrs_all: Some(reconciled.all),
            model,
        })
    }

    fn payload(&self, model: &O::Model, tags: &ExtAttrs) -> Result<Value, ProviderError> {
        let mut payload = O::expand(model).map_err(|source| ProviderError::Decode {
            type_name: O::TYPE_NAME,
            what: "plan",
            source,
        })?;
        payload.insert(EXTATTRS_FIELD.to_string(), to_wire(tags));
        Ok(Value::Object(payload))
    }

    /// Create the object.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails, the tags cannot be stamped, or the WAPI
    /// call fails.
    pub async fn create(
        &self,
        plan: ResourceState<O::Model>,
    ) -> Result<ResourceState<O::Model>, ProviderError> {
        self.ensure_valid(&plan)?;

        let tags = add_internal_id_to_ext_attrs(plan.extattrs.as_ref()).map_err(Self::tag_error)?;
        let payload = self.payload(&plan.model, &tags)?;

        let created = self
            .api
            .create(O::OBJECT_TYPE, &payload, &request_options::<O>())
            .await
            .map_err(|e| ProviderError::client(Operation::Create, O::TYPE_NAME, e))?;

        let state = self.state_from_object(&created, plan.extattrs.as_ref())?;
        info!(
            type_name = O::TYPE_NAME,
            reference = state.reference.as_deref().unwrap_or_default(),
            internal_id = state.internal_id.as_deref().unwrap_or_default(),
            "Created object"
        );
        Ok(state)
    }

    /// Refresh state from the appliance.
    ///
    /// Returns `None` when the object no longer exists and should be removed from
    /// state.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails or the internal id needed for the
    /// fallback is missing.
    pub async fn read(
        &self,
        state: ResourceState<O::Model>,
    ) -> Result<Option<ResourceState<O::Model>>, ProviderError> {
        let resolution = self
            .resolver()
            .resolve(
                Operation::Read,
                state.reference.as_deref(),
                state.known_internal_id(),
            )
            .await?;

        match resolution {
            Resolution::Found { object, source } => {
                if source == LookupSource::InternalId {
                    info!(
                        type_name = O::TYPE_NAME,
                        stale_reference = state.reference.as_deref().unwrap_or_default(),
                        reference = object_reference(&object).unwrap_or_default(),
                        "Adopted new reference found by internal id"
                    );
                }
                self.state_from_object(&object, state.extattrs.as_ref())
                    .map(Some)
            }
            Resolution::Gone => {
                warn!(
                    type_name = O::TYPE_NAME,
                    reference = state.reference.as_deref().unwrap_or_default(),
                    "Object no longer exists, removing from state"
                );
                Ok(None)
            }
        }
    }

    /// Update the object.
    ///
    /// Inherited tags retained from the last read are sent back along with the
    /// configured ones.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails, a create-only attribute changed, the
    /// object cannot be located, or the WAPI call fails.
    pub async fn update(
        &self,
        prior: ResourceState<O::Model>,
        plan: ResourceState<O::Model>,
    ) -> Result<ResourceState<O::Model>, ProviderError> {
        self.ensure_valid(&plan)?;
        self.ensure_create_only_unchanged(&prior, &plan)?;

        let retained = retained_for_update(
            prior.extattrs_all.as_ref(),
            prior.extattrs.as_ref(),
            plan.extattrs.as_ref(),
        );
        let mut tags = add_inherited_ext_attrs(plan.extattrs.as_ref(), Some(&retained));
        if let Some(id) = prior.known_internal_id() {
            tags.entry(crate::constants::INTERNAL_ID_EXT_ATTR.to_string())
                .or_insert_with(|| id.into());
        }
        let tags = add_internal_id_to_ext_attrs(Some(&tags)).map_err(Self::tag_error)?;

        let mut payload = self.payload(&plan.model, &tags)?;
        if let Value::Object(fields) = &mut payload {
            O::prepare_update(fields);
        }

        let updated = self.update_located(&prior, &payload).await?;
        self.state_from_object(&updated, plan.extattrs.as_ref())
    }

    fn ensure_create_only_unchanged(
        &self,
        prior: &ResourceState<O::Model>,
        plan: &ResourceState<O::Model>,
    ) -> Result<(), ProviderError> {
        let (Ok(Value::Object(prior_fields)), Ok(Value::Object(plan_fields))) = (
            serde_json::to_value(&prior.model),
            serde_json::to_value(&plan.model),
        ) else {
            return Ok(());
        };

        let changed = changed_create_only(O::attributes(), &prior_fields, &plan_fields);
        if changed.is_empty() {
            return Ok(());
        }

        let mut diagnostics = Diagnostics::new();
        for name in changed {
            diagnostics.add_attribute_error(
                name,
                "Attribute Requires Replacement",
                format!("\"{name}\" cannot be changed after creation"),
            );
        }
        Err(ProviderError::Validation {
            type_name: O::TYPE_NAME,
            diagnostics,
        })
    }

    /// PUT the payload, re-locating the object by internal id if the reference is stale.
    async fn update_located(
        &self,
        prior: &ResourceState<O::Model>,
        payload: &Value,
    ) -> Result<Value, ProviderError> {
        let options = request_options::<O>();
        let stale_reference = prior.reference.as_deref().unwrap_or_default();

        if !stale_reference.is_empty() {
            match self.api.update(stale_reference, payload, &options).await {
                Ok(updated) => return Ok(updated),
                Err(e) if e.is_not_found() => {
                    debug!(
                        type_name = O::TYPE_NAME,
                        reference = stale_reference,
                        "Reference not found on update, searching by internal id"
                    );
                }
                Err(e) => return Err(ProviderError::client(Operation::Update, O::TYPE_NAME, e)),
            }
        }

        let Some(id) = prior.known_internal_id() else {
            return Err(ProviderError::MissingInternalId {
                type_name: O::TYPE_NAME,
                reference: stale_reference.to_string(),
            });
        };

        let found = self
            .resolver()
            .find_by_internal_id(Operation::Update, id)
            .await?;
        let Some(reference) = found.as_ref().and_then(object_reference) else {
            return Err(ProviderError::ObjectGone {
                operation: Operation::Update,
                type_name: O::TYPE_NAME,
                reference: stale_reference.to_string(),
            });
        };

        self.api
            .update(reference, payload, &options)
            .await
            .map_err(|e| ProviderError::client(Operation::Update, O::TYPE_NAME, e))
    }

    /// Delete the object. An object that no longer exists is already deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if a WAPI call fails for any reason other than not-found.
    pub async fn delete(&self, state: ResourceState<O::Model>) -> Result<(), ProviderError> {
        let stale_reference = state.reference.as_deref().unwrap_or_default();

        if !stale_reference.is_empty() {
            match self.api.delete(stale_reference).await {
                Ok(()) => {
                    info!(type_name = O::TYPE_NAME, reference = stale_reference, "Deleted object");
                    return Ok(());
                }
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(ProviderError::client(Operation::Delete, O::TYPE_NAME, e)),
            }
        }

        let Some(id) = state.known_internal_id() else {
            warn!(
                type_name = O::TYPE_NAME,
                reference = stale_reference,
                "Object not found and no internal id is known, treating as deleted"
            );
            return Ok(());
        };

        let found = self
            .resolver()
            .find_by_internal_id(Operation::Delete, id)
            .await?;
        let Some(reference) = found.as_ref().and_then(object_reference) else {
            info!(
                type_name = O::TYPE_NAME,
                internal_id = id,
                "Object already deleted"
            );
            return Ok(());
        };

        match self.api.delete(reference).await {
            Ok(()) => {
                info!(type_name = O::TYPE_NAME, reference = reference, "Deleted object");
                Ok(())
            }
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(ProviderError::client(Operation::Delete, O::TYPE_NAME, e)),
        }
    }

    /// Import an existing object by reference.
    ///
    /// Tags without an `inheritance_source` become configured. An object without an
    /// internal id is stamped with one so later lookups can fall back to it.
    ///
    /// # Errors
    ///
    /// Returns an error if the object does not exist or a WAPI call fails.
    pub async fn import(&self, reference: &str) -> Result<ResourceState<O::Model>, ProviderError> {
        let options = request_options::<O>();
        let mut object = self.api.read(reference, &options).await.map_err(|e| {
            if e.is_not_found() {
                ProviderError::ObjectGone {
                    operation: Operation::Import,
                    type_name: O::TYPE_NAME,
                    reference: reference.to_string(),
                }
            } else {
                ProviderError::client(Operation::Import, O::TYPE_NAME, e)
            }
        })?;

        let (local, all) = split_inherited(object.get(EXTATTRS_FIELD)).map_err(Self::tag_error)?;

        if internal_id(Some(&all)).is_none() {
            let tags = add_internal_id_to_ext_attrs(Some(&all)).map_err(Self::tag_error)?;
            let mut body = Map::new();
            body.insert(EXTATTRS_FIELD.to_string(), to_wire(&tags));
            let current_reference = object_reference(&object).unwrap_or(reference).to_string();

            object = self
                .api
                .update(&current_reference, &Value::Object(body), &options)
                .await
                .map_err(|e| ProviderError::client(Operation::Import, O::TYPE_NAME, e))?;
            debug!(
                type_name = O::TYPE_NAME,
                reference = current_reference,
                "Stamped internal id on imported object"
            );
        }

        let configured = (!local.is_empty()).then_some(local);
        self.state_from_object(&object, configured.as_ref())
    }
}

/// JSON-level view of a resource, as stored in the provider registry.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> ResourceSchema;

    /// Validate a configuration document without calling the WAPI.
    fn validate_config(&self, config: &Value) -> Diagnostics;

    async fn create(&self, plan: Value) -> Result<Value, ProviderError>;

    /// `Ok(None)` means the object is gone and should be removed from state.
    async fn read(&self, state: Value) -> Result<Option<Value>, ProviderError>;

    async fn update(&self, prior: Value, plan: Value) -> Result<Value, ProviderError>;

    async fn delete(&self, state: Value) -> Result<(), ProviderError>;

    async fn import(&self, reference: &str) -> Result<Value, ProviderError>;
}

/// Validate a plan document and apply attribute defaults to it.
///
/// # Errors
///
/// Returns a `Validation` error carrying every diagnostic found.
pub fn prepare_plan(
    type_name: &'static str,
    tables: &[&[Attribute]],
    mut plan: Value,
) -> Result<Value, ProviderError> {
    let diagnostics = validate_config(tables, &plan);
    if diagnostics.has_error() {
        return Err(ProviderError::Validation {
            type_name,
            diagnostics,
        });
    }
    if let Value::Object(fields) = &mut plan {
        apply_defaults(tables, fields);
    }
    Ok(plan)
}

impl<O: NiosObject> ManagedResource<O> {
    fn tables() -> [&'static [Attribute]; 2] {
        [COMMON_ATTRIBUTES, O::attributes()]
    }

    fn decode_plan(plan: Value) -> Result<ResourceState<O::Model>, ProviderError> {
        let plan = prepare_plan(O::TYPE_NAME, &Self::tables(), plan)?;
        decode_state(O::TYPE_NAME, "plan", plan)
    }
}

#[async_trait]
impl<O: NiosObject> ResourceHandler for ManagedResource<O> {
    fn type_name(&self) -> &'static str {
        O::TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        resource_schema::<O>()
    }

    fn validate_config(&self, config: &Value) -> Diagnostics {
        let mut diagnostics = validate_config(&Self::tables(), config);
        if diagnostics.has_error() {
            return diagnostics;
        }
        match serde_json::from_value::<ResourceState<O::Model>>(config.clone()) {
            Ok(plan) => diagnostics.extend(self.validate(&plan)),
            Err(e) => diagnostics.add_attribute_error("", "Invalid Configuration", e.to_string()),
        }
        diagnostics
    }

    async fn create(&self, plan: Value) -> Result<Value, ProviderError> {
        let plan = Self::decode_plan(plan)?;
        let state = ManagedResource::create(self, plan).await?;
        encode_state(O::TYPE_NAME, &state)
    }

    async fn read(&self, state: Value) -> Result<Option<Value>, ProviderError> {
        let state = decode_state(O::TYPE_NAME, "state", state)?;
        match ManagedResource::read(self, state).await? {
            Some(refreshed) => encode_state(O::TYPE_NAME, &refreshed).map(Some),
            None => Ok(None),
        }
    }

    async fn update(&self, prior: Value, plan: Value) -> Result<Value, ProviderError> {
        let prior = decode_state(O::TYPE_NAME, "state", prior)?;
        let plan = Self::decode_plan(plan)?;
        let state = ManagedResource::update(self, prior, plan).await?;
        encode_state(O::TYPE_NAME, &state)
    }

    async fn delete(&self, state: Value) -> Result<(), ProviderError> {
        let state = decode_state(O::TYPE_NAME, "state", state)?;
        ManagedResource::delete(self, state).await
    }

    async fn import(&self, reference: &str) -> Result<Value, ProviderError> {
        let state = ManagedResource::import(self, reference).await?;
        encode_state(O::TYPE_NAME, &state)
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod mod_tests;
