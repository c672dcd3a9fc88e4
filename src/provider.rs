// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Provider registry.
//!
//! The provider is configured once with connection settings and then holds a
//! read-only table of resource and data source handlers keyed by type name. Every
//! handler shares one WAPI client.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::client::{RequestOptions, WapiApi, WapiClient};
use crate::config::ProviderConfig;
use crate::data_sources::{DataSourceHandler, ObjectDataSource};
use crate::errors::{ClientError, ConfigError, ProviderError};
use crate::resources::dns::nsgroup::NsGroup;
use crate::resources::dns::records::{
    RecordA, RecordAaaa, RecordCaa, RecordCname, RecordMx, RecordPtr, RecordSrv, RecordTxt,
};
use crate::resources::dns::zones::{ZoneAuth, ZoneForward};
use crate::resources::ip_association::IpAssociationResource;
use crate::resources::{ManagedResource, NiosObject, ResourceHandler};
use crate::schema::ResourceSchema;

/// Configured provider.
pub struct Provider {
    resources: BTreeMap<&'static str, Arc<dyn ResourceHandler>>,
    data_sources: BTreeMap<&'static str, Arc<dyn DataSourceHandler>>,
}

impl Provider {
    /// Validate `config`, build a WAPI client from it and register every handler.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error if a setting is missing or the client cannot be built.
    pub fn configure(config: &ProviderConfig) -> Result<Self, ProviderError> {
        config.validate()?;
        let client = WapiClient::new(config).map_err(|e| ConfigError::Invalid {
            setting: "nios_host_url",
            reason: e.to_string(),
        })?;
        info!(
            base_url = %client.base_url(),
            username = %config.nios_username,
            "Configured NIOS provider"
        );
        Ok(Self::with_api(Arc::new(client)))
    }

    /// Provider usable for schema and validation only; every WAPI call fails.
    #[must_use]
    pub fn unconfigured() -> Self {
        Self::with_api(Arc::new(Unconfigured))
    }

    /// Register every handler against an existing WAPI implementation.
    #[must_use]
    pub fn with_api(api: Arc<dyn WapiApi>) -> Self {
        let mut provider = Self {
            resources: BTreeMap::new(),
            data_sources: BTreeMap::new(),
        };

        provider.register::<RecordA>(&api);
        provider.register::<RecordAaaa>(&api);
        provider.register::<RecordCname>(&api);
        provider.register::<RecordMx>(&api);
        provider.register::<RecordPtr>(&api);
        provider.register::<RecordSrv>(&api);
        provider.register::<RecordTxt>(&api);
        provider.register::<RecordCaa>(&api);
        provider.register::<ZoneAuth>(&api);
        provider.register::<ZoneForward>(&api);
        provider.register::<NsGroup>(&api);

        let association: Arc<dyn ResourceHandler> = Arc::new(IpAssociationResource::new(api));
        provider
            .resources
            .insert(association.type_name(), association);

        provider
    }

    fn register<O: NiosObject>(&mut self, api: &Arc<dyn WapiApi>) {
        self.resources.insert(
            O::TYPE_NAME,
            Arc::new(ManagedResource::<O>::new(Arc::clone(api))),
        );
        self.data_sources.insert(
            O::TYPE_NAME,
            Arc::new(ObjectDataSource::<O>::new(Arc::clone(api))),
        );
    }

    /// Resource handler registered under `type_name`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownType` if no resource has that name.
    pub fn resource(&self, type_name: &str) -> Result<Arc<dyn ResourceHandler>, ProviderError> {
        self.resources
            .get(type_name)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownType(type_name.to_string()))
    }

    /// Data source handler registered under `type_name`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownType` if no data source has that name.
    pub fn data_source(
        &self,
        type_name: &str,
    ) -> Result<Arc<dyn DataSourceHandler>, ProviderError> {
        self.data_sources
            .get(type_name)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownType(type_name.to_string()))
    }

    pub fn resource_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resources.keys().copied()
    }

    pub fn data_source_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.data_sources.keys().copied()
    }

    /// Schemas of every resource and data source, keyed by kind then type name.
    #[must_use]
    pub fn schemas(&self) -> BTreeMap<&'static str, BTreeMap<&'static str, ResourceSchema>> {
        let resources = self
            .resources
            .iter()
            .map(|(name, handler)| (*name, handler.schema()))
            .collect();
        let data_sources = self
            .data_sources
            .iter()
            .map(|(name, handler)| (*name, handler.schema()))
            .collect();
        BTreeMap::from([("resources", resources), ("data_sources", data_sources)])
    }
}

/// WAPI stand-in for a provider that has not been configured.
struct Unconfigured;

fn not_configured() -> ClientError {
    ClientError::InvalidRequest("provider is not configured".to_string())
}

#[async_trait]
impl WapiApi for Unconfigured {
    async fn read(&self, _reference: &str, _options: &RequestOptions) -> Result<Value, ClientError> {
        Err(not_configured())
    }

    async fn list(
        &self,
        _object_type: &str,
        _options: &RequestOptions,
    ) -> Result<Vec<Value>, ClientError> {
        Err(not_configured())
    }

    async fn create(
        &self,
        _object_type: &str,
        _body: &Value,
        _options: &RequestOptions,
    ) -> Result<Value, ClientError> {
        Err(not_configured())
    }

    async fn update(
        &self,
        _reference: &str,
        _body: &Value,
        _options: &RequestOptions,
    ) -> Result<Value, ClientError> {
        Err(not_configured())
    }

    async fn delete(&self, _reference: &str) -> Result<(), ClientError> {
        Err(not_configured())
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod provider_tests;
