// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Data sources: filtered, paged listing of NIOS objects.
//!
//! Each managed object type has a matching data source under the same type name.
//! A query takes `filters` (WAPI field filters) and `extattrfilters` (extensible
//! attribute filters) and returns `result`, the matching objects in state form.
//! Unlike managed resources, a data source does not know which tags were
//! configured, so `extattrs` carries the object's full tag set.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info};

use crate::client::{RequestOptions, WapiApi};
use crate::diagnostics::Diagnostics;
use crate::errors::{Operation, ProviderError};
use crate::extattrs::{decode_wire, internal_id};
use crate::lookup::object_reference;
use crate::resources::{decode_state, encode_state, NiosObject, ResourceState, EXTATTRS_FIELD};
use crate::schema::{validate_config, ResourceSchema, DATA_SOURCE_ATTRIBUTES};

/// Query document of a data source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DataSourceQuery {
    /// WAPI field filters, `field -> value`
    pub filters: Option<BTreeMap<String, String>>,
    /// Extensible attribute filters, `name -> value`
    pub extattrfilters: Option<BTreeMap<String, String>>,
}

impl DataSourceQuery {
    /// Request options carrying the query's filters.
    #[must_use]
    pub fn request_options(&self, return_fields: &str) -> RequestOptions {
        let mut options = RequestOptions::new()
            .return_fields_plus(return_fields)
            .return_as_object();
        for (field, value) in self.filters.iter().flatten() {
            options = options.filter(field.clone(), value.clone());
        }
        for (name, value) in self.extattrfilters.iter().flatten() {
            options = options.ext_attr_filter(name.clone(), value.clone());
        }
        options
    }
}

/// Query document with its results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DataSourceResult<M> {
    #[serde(flatten)]
    pub query: DataSourceQuery,
    pub result: Vec<ResourceState<M>>,
}

/// Object-safe view of a data source, as stored in the provider registry.
#[async_trait]
pub trait DataSourceHandler: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> ResourceSchema;

    /// Validate a query document without calling the WAPI.
    fn validate_config(&self, config: &Value) -> Diagnostics;

    /// Run a query and return the query document with `result` filled in.
    async fn read(&self, query: Value) -> Result<Value, ProviderError>;
}

/// Data source listing objects of type `O`.
pub struct ObjectDataSource<O: NiosObject> {
    api: Arc<dyn WapiApi>,
    _object: PhantomData<fn() -> O>,
}

impl<O: NiosObject> ObjectDataSource<O> {
    #[must_use]
    pub fn new(api: Arc<dyn WapiApi>) -> Self {
        Self {
            api,
            _object: PhantomData,
        }
    }

    fn state_from_object(object: &Value) -> Result<ResourceState<O::Model>, ProviderError> {
        let tags = decode_wire(object.get(EXTATTRS_FIELD)).map_err(|source| {
            ProviderError::ExtAttrs {
                type_name: O::TYPE_NAME,
                source,
            }
        })?;
        let model = O::flatten(object).map_err(|source| ProviderError::Decode {
            type_name: O::TYPE_NAME,
            what: "WAPI object",
            source,
        })?;
        Ok(ResourceState {
            reference: object_reference(object).map(str::to_string),
            internal_id: internal_id(Some(&tags)).map(str::to_string),
            extattrs: Some(tags),
            extattrs_all: None,
            model,
        })
    }

    /// List the objects matching `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the list call fails or an object cannot be decoded.
    pub async fn query(
        &self,
        query: DataSourceQuery,
    ) -> Result<DataSourceResult<O::Model>, ProviderError> {
        let options = query.request_options(O::RETURN_FIELDS);
        debug!(
            object_type = O::OBJECT_TYPE,
            filters = ?query.filters,
            extattrfilters = ?query.extattrfilters,
            "Listing objects"
        );

        let objects = self
            .api
            .list(O::OBJECT_TYPE, &options)
            .await
            .map_err(|e| ProviderError::client(Operation::List, O::TYPE_NAME, e))?;

        let result = objects
            .iter()
            .map(Self::state_from_object)
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            type_name = O::TYPE_NAME,
            count = result.len(),
            "Data source query complete"
        );
        Ok(DataSourceResult { query, result })
    }
}

#[async_trait]
impl<O: NiosObject> DataSourceHandler for ObjectDataSource<O> {
    fn type_name(&self) -> &'static str {
        O::TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        ResourceSchema {
            type_name: O::TYPE_NAME,
            description: O::DESCRIPTION,
            attributes: DATA_SOURCE_ATTRIBUTES.to_vec(),
            json_schema: serde_json::to_value(schemars::schema_for!(DataSourceResult<O::Model>))
                .unwrap_or(Value::Null),
        }
    }

    fn validate_config(&self, config: &Value) -> Diagnostics {
        validate_config(&[DATA_SOURCE_ATTRIBUTES], config)
    }

    async fn read(&self, query: Value) -> Result<Value, ProviderError> {
        let diagnostics = DataSourceHandler::validate_config(self, &query);
        if diagnostics.has_error() {
            return Err(ProviderError::Validation {
                type_name: O::TYPE_NAME,
                diagnostics,
            });
        }
        let query = decode_state(O::TYPE_NAME, "query", query)?;
        let result = self.query(query).await?;
        encode_state(O::TYPE_NAME, &result)
    }
}

#[cfg(test)]
#[path = "data_sources_tests.rs"]
mod data_sources_tests;
