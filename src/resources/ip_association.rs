// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! IP association: DHCP settings patched onto an existing host record.
//!
//! This resource does not own a NIOS object. It locates a `record:host` (by
//! reference, falling back to the host's internal id), sets the DHCP fields of the
//! first IPv4 and/or IPv6 address block, and writes the host record back with every
//! other field untouched. Deleting the association clears those fields again; the
//! host record itself is never deleted.
//!
//! # IPv6 match modes
//!
//! | `match_client` | `duid`   | `mac`    |
//! |----------------|----------|----------|
//! | `DUID`         | set      | cleared  |
//! | `MAC_ADDRESS`  | cleared  | set      |
//! | unset          | set if non-empty, otherwise `mac` is set |

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::client::{RequestOptions, WapiApi};
use crate::constants::{
    MATCH_CLIENT_DUID, MATCH_CLIENT_MAC_ADDRESS, OBJECT_RECORD_HOST, TYPE_IP_ASSOCIATION,
};
use crate::diagnostics::Diagnostics;
use crate::errors::{Operation, ProviderError};
use crate::lookup::{object_internal_id, object_reference, Resolution, Resolver};
use crate::resources::{decode_state, encode_state, prepare_plan, ResourceHandler};
use crate::schema::{Attribute, AttributeKind, DefaultValue, ResourceSchema};

/// Host record fields requested on every call.
pub const HOST_RETURN_FIELDS: &str =
    "extattrs,name,view,configure_for_dns,ipv4addrs,ipv6addrs,aliases,comment,disable,ttl,use_ttl";

/// Host record fields the appliance computes and rejects on update.
pub const READ_ONLY_HOST_FIELDS: [&str; 7] = [
    "cloud_info",
    "creation_time",
    "dns_aliases",
    "dns_name",
    "last_queried",
    "network_view",
    "zone",
];

/// Match modes accepted in `match_client`.
pub const MATCH_CLIENT_MODES: [&str; 2] = [MATCH_CLIENT_MAC_ADDRESS, MATCH_CLIENT_DUID];

/// Attributes of `nios_ip_association`.
pub const ATTRIBUTES: &[Attribute] = &[
    Attribute::required(
        "ref",
        AttributeKind::String,
        "The reference of the host record to associate DHCP settings with.",
    ),
    Attribute::optional_computed(
        "internal_id",
        AttributeKind::String,
        "Internal id of the host record, used when its reference changes.",
    ),
    Attribute::optional(
        "mac",
        AttributeKind::String,
        "The MAC address to associate with the first IP address of the host record.",
    ),
    Attribute::optional(
        "duid",
        AttributeKind::String,
        "The DHCP unique identifier to associate with the first IPv6 address of the host record.",
    ),
    Attribute::optional(
        "configure_for_dhcp",
        AttributeKind::Bool,
        "Set this to true to enable DHCP configuration for the host address.",
    )
    .with_default(DefaultValue::Bool(false)),
    Attribute::optional(
        "match_client",
        AttributeKind::String,
        "How DHCP clients are matched for the IPv6 address: MAC_ADDRESS or DUID.",
    ),
];

// ============================================================================
// State
// ============================================================================

/// State of an IP association.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct IpAssociationState {
    /// Reference of the host record
    #[serde(rename = "ref")]
    pub reference: Option<String>,
    /// Internal id of the host record
    pub internal_id: Option<String>,
    pub mac: Option<String>,
    pub duid: Option<String>,
    pub configure_for_dhcp: Option<bool>,
    pub match_client: Option<String>,
}

impl IpAssociationState {
    fn mac(&self) -> Option<&str> {
        self.mac.as_deref().filter(|m| !m.is_empty())
    }

    fn duid(&self) -> Option<&str> {
        self.duid.as_deref().filter(|d| !d.is_empty())
    }

    fn match_client(&self) -> Option<&str> {
        self.match_client.as_deref().filter(|m| !m.is_empty())
    }

    fn dhcp_enabled(&self) -> bool {
        self.configure_for_dhcp.unwrap_or(false)
    }
}

// ============================================================================
// Host record wire types
// ============================================================================

/// IPv4 address block of a host record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostIpv4 {
    #[serde(rename = "_ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4addr: Option<String>,
    /// Owning host name; read-only
    #[serde(default, skip_serializing)]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configure_for_dhcp: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_client: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// IPv6 address block of a host record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostIpv6 {
    #[serde(rename = "_ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6addr: Option<String>,
    /// Owning host name; read-only
    #[serde(default, skip_serializing)]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configure_for_dhcp: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_client: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Host record as read from and written to the WAPI.
///
/// Fields the provider does not touch are kept in `other` and sent back as read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostRecord {
    #[serde(rename = "_ref", default, skip_serializing)]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configure_for_dns: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ipv4addrs: Vec<HostIpv4>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ipv6addrs: Vec<HostIpv6>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl HostRecord {
    /// Remove fields the appliance rejects on update.
    ///
    /// `extattrs` is dropped too: the host record's tags belong to whatever manages
    /// the host record, and leaving the field out of the update leaves them as they
    /// are. `name` and `view` are dropped when the host is not configured for DNS.
    pub fn strip_read_only(&mut self) {
        for field in READ_ONLY_HOST_FIELDS {
            self.other.remove(field);
        }
        self.other.remove(crate::resources::EXTATTRS_FIELD);
        for address in &mut self.ipv4addrs {
            address.host = None;
        }
        for address in &mut self.ipv6addrs {
            address.host = None;
        }
        if self.configure_for_dns == Some(false) {
            self.name = None;
            self.view = None;
        }
    }
}

/// Apply the association's DHCP settings to the first address blocks.
pub fn merge_dhcp_settings(host: &mut HostRecord, association: &IpAssociationState) {
    let dhcp = association.dhcp_enabled();
    let match_client = association.match_client();

    if let Some(ipv4) = host.ipv4addrs.first_mut() {
        ipv4.mac = Some(association.mac().unwrap_or_default().to_string());
        ipv4.configure_for_dhcp = Some(dhcp);
        if let Some(mode) = match_client.filter(|m| dhcp && *m != MATCH_CLIENT_DUID) {
            ipv4.match_client = Some(mode.to_string());
        }
    }

    if let Some(ipv6) = host.ipv6addrs.first_mut() {
        let use_duid = match match_client {
            Some(MATCH_CLIENT_DUID) => true,
            Some(MATCH_CLIENT_MAC_ADDRESS) => false,
            _ => association.duid().is_some() || association.mac().is_none(),
        };
        if use_duid {
            ipv6.duid = Some(association.duid().unwrap_or_default().to_string());
            ipv6.mac = None;
        } else {
            ipv6.mac = Some(association.mac().unwrap_or_default().to_string());
            ipv6.duid = None;
        }
        ipv6.configure_for_dhcp = Some(dhcp);
        if let Some(mode) = match_client.filter(|_| dhcp) {
            ipv6.match_client = Some(mode.to_string());
        }
    }
}

/// Reset the DHCP settings of the first address blocks.
///
/// On the IPv6 block the identifier that is set (MAC or DUID) is blanked; an
/// omitted field would be left unchanged by the appliance.
pub fn clear_dhcp_settings(host: &mut HostRecord) {
    if let Some(ipv4) = host.ipv4addrs.first_mut() {
        ipv4.mac = Some(String::new());
        ipv4.configure_for_dhcp = Some(false);
    }
    if let Some(ipv6) = host.ipv6addrs.first_mut() {
        let has_mac = non_empty(ipv6.mac.as_ref()).is_some();
        if has_mac {
            ipv6.mac = Some(String::new());
        }
        if !has_mac || non_empty(ipv6.duid.as_ref()).is_some() {
            ipv6.duid = Some(String::new());
        }
        ipv6.configure_for_dhcp = Some(false);
    }
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.is_empty()).cloned()
}

/// Build association state from a host record.
///
/// `match_client` is not reported reliably by the appliance and is carried over
/// from `previous`.
#[must_use]
pub fn state_from_host(object: &Value, host: &HostRecord, previous: &IpAssociationState) -> IpAssociationState {
    let ipv4 = host.ipv4addrs.first();
    let ipv6 = host.ipv6addrs.first();

    let mac = non_empty(ipv4.and_then(|a| a.mac.as_ref()))
        .or_else(|| non_empty(ipv6.and_then(|a| a.mac.as_ref())));
    let duid = non_empty(ipv6.and_then(|a| a.duid.as_ref()));
    let configure_for_dhcp = ipv4
        .and_then(|a| a.configure_for_dhcp)
        .into_iter()
        .chain(ipv6.and_then(|a| a.configure_for_dhcp))
        .reduce(|a, b| a || b);

    IpAssociationState {
        reference: object_reference(object).map(str::to_string),
        internal_id: object_internal_id(object)
            .map(str::to_string)
            .or_else(|| previous.internal_id.clone()),
        mac,
        duid,
        configure_for_dhcp,
        match_client: previous.match_client.clone(),
    }
}

/// Check that a MAC address is six `:` or `-` separated hex octets.
fn is_mac_address(value: &str) -> bool {
    let octets: Vec<&str> = value.split([':', '-']).collect();
    octets.len() == 6
        && octets
            .iter()
            .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Validate an association before any API call.
#[must_use]
pub fn validate(association: &IpAssociationState) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();

    if association.dhcp_enabled() && association.mac().is_none() && association.duid().is_none() {
        diagnostics.add_attribute_error(
            "configure_for_dhcp",
            "Missing Attribute Configuration",
            "Both mac and duid cannot be empty when configure_for_dhcp is true",
        );
    }

    if let Some(mac) = association.mac().filter(|m| !is_mac_address(m)) {
        diagnostics.add_attribute_error(
            "mac",
            "Invalid Attribute Value",
            format!("\"{mac}\" is not a valid MAC address"),
        );
    }

    match association.match_client() {
        None => {}
        Some(MATCH_CLIENT_DUID) if association.duid().is_none() => {
            diagnostics.add_attribute_error(
                "duid",
                "Missing Attribute Configuration",
                "duid is required when match_client is DUID",
            );
        }
        Some(MATCH_CLIENT_MAC_ADDRESS) if association.mac().is_none() => {
            diagnostics.add_attribute_error(
                "mac",
                "Missing Attribute Configuration",
                "mac is required when match_client is MAC_ADDRESS",
            );
        }
        Some(mode) if !MATCH_CLIENT_MODES.contains(&mode) => {
            diagnostics.add_attribute_error(
                "match_client",
                "Invalid Attribute Value",
                format!(
                    "match_client must be one of {}, got \"{mode}\"",
                    MATCH_CLIENT_MODES.join(", ")
                ),
            );
        }
        Some(_) => {}
    }

    diagnostics
}

// ============================================================================
// Resource
// ============================================================================

/// CRUD for `nios_ip_association`.
pub struct IpAssociationResource {
    api: Arc<dyn WapiApi>,
}

fn request_options() -> RequestOptions {
    RequestOptions::new()
        .return_fields_plus(HOST_RETURN_FIELDS)
        .return_as_object()
}

fn decode_host(object: &Value) -> Result<HostRecord, ProviderError> {
    serde_json::from_value(object.clone()).map_err(|source| ProviderError::Decode {
        type_name: TYPE_IP_ASSOCIATION,
        what: "host record",
        source,
    })
}

impl IpAssociationResource {
    #[must_use]
    pub fn new(api: Arc<dyn WapiApi>) -> Self {
        Self { api }
    }

    fn resolver(&self) -> Resolver<'_> {
        Resolver::new(
            self.api.as_ref(),
            OBJECT_RECORD_HOST,
            TYPE_IP_ASSOCIATION,
            request_options(),
        )
    }

    fn ensure_valid(association: &IpAssociationState) -> Result<(), ProviderError> {
        let diagnostics = validate(association);
        if diagnostics.has_error() {
            return Err(ProviderError::Validation {
                type_name: TYPE_IP_ASSOCIATION,
                diagnostics,
            });
        }
        Ok(())
    }

    /// Locate the host record; a missing host is an error for `operation`.
    async fn find_host(
        &self,
        operation: Operation,
        reference: Option<&str>,
        internal_id: Option<&str>,
    ) -> Result<Value, ProviderError> {
        match self
            .resolver()
            .resolve(operation, reference, internal_id)
            .await?
        {
            Resolution::Found { object, .. } => Ok(object),
            Resolution::Gone => Err(ProviderError::ObjectGone {
                operation,
                type_name: TYPE_IP_ASSOCIATION,
                reference: reference.unwrap_or_default().to_string(),
            }),
        }
    }

    /// Write a modified host record back.
    async fn write_host(
        &self,
        operation: Operation,
        object: &Value,
        host: &HostRecord,
    ) -> Result<Value, ProviderError> {
        let reference = object_reference(object).unwrap_or_default();
        let body = serde_json::to_value(host).map_err(|source| ProviderError::Decode {
            type_name: TYPE_IP_ASSOCIATION,
            what: "host record",
            source,
        })?;
        debug!(reference = reference, body = %body, "Updating host record DHCP settings");
        self.api
            .update(reference, &body, &request_options())
            .await
            .map_err(|e| ProviderError::client(operation, TYPE_IP_ASSOCIATION, e))
    }

    async fn associate(
        &self,
        operation: Operation,
        object: Value,
        plan: &IpAssociationState,
    ) -> Result<IpAssociationState, ProviderError> {
        let mut host = decode_host(&object)?;
        if host.ipv4addrs.is_empty() && host.ipv6addrs.is_empty() {
            let mut diagnostics = Diagnostics::new();
            diagnostics.add_attribute_error(
                "ref",
                "Invalid Host Record",
                "The host record has no IPv4 or IPv6 address to associate",
            );
            return Err(ProviderError::Validation {
                type_name: TYPE_IP_ASSOCIATION,
                diagnostics,
            });
        }

        merge_dhcp_settings(&mut host, plan);
        host.strip_read_only();

        let updated = self.write_host(operation, &object, &host).await?;
        let updated_host = decode_host(&updated)?;
        let state = state_from_host(&updated, &updated_host, plan);
        info!(
            reference = state.reference.as_deref().unwrap_or_default(),
            mac = state.mac.as_deref().unwrap_or_default(),
            duid = state.duid.as_deref().unwrap_or_default(),
            "Associated DHCP settings with host record"
        );
        Ok(state)
    }

    /// Associate DHCP settings with the host record.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails, the host record cannot be located, or
    /// the update fails.
    pub async fn create(&self, plan: IpAssociationState) -> Result<IpAssociationState, ProviderError> {
        Self::ensure_valid(&plan)?;
        let object = self
            .find_host(
                Operation::Create,
                plan.reference.as_deref(),
                plan.internal_id.as_deref(),
            )
            .await?;
        self.associate(Operation::Create, object, &plan).await
    }

    /// Refresh the association from the host record.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    pub async fn read(
        &self,
        state: IpAssociationState,
    ) -> Result<Option<IpAssociationState>, ProviderError> {
        match self
            .resolver()
            .resolve(
                Operation::Read,
                state.reference.as_deref(),
                state.internal_id.as_deref(),
            )
            .await?
        {
            Resolution::Found { object, .. } => {
                let host = decode_host(&object)?;
                Ok(Some(state_from_host(&object, &host, &state)))
            }
            Resolution::Gone => {
                warn!(
                    reference = state.reference.as_deref().unwrap_or_default(),
                    "Host record no longer exists, removing association from state"
                );
                Ok(None)
            }
        }
    }

    /// Change the association.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails, the host record cannot be located, or
    /// the update fails.
    pub async fn update(
        &self,
        prior: IpAssociationState,
        plan: IpAssociationState,
    ) -> Result<IpAssociationState, ProviderError> {
        Self::ensure_valid(&plan)?;

        let same_host = plan.reference.is_none() || plan.reference == prior.reference;
        let reference = plan.reference.as_deref().or(prior.reference.as_deref());
        let internal_id = plan.internal_id.as_deref().or(if same_host {
            prior.internal_id.as_deref()
        } else {
            None
        });

        let object = self
            .find_host(Operation::Update, reference, internal_id)
            .await?;
        self.associate(Operation::Update, object, &plan).await
    }

    /// Remove the association. The host record is kept; a missing host record is
    /// already un-associated.
    ///
    /// # Errors
    ///
    /// Returns an error if a WAPI call fails for any reason other than not-found.
    pub async fn delete(&self, state: IpAssociationState) -> Result<(), ProviderError> {
        let resolution = self
            .resolver()
            .resolve(
                Operation::Delete,
                state.reference.as_deref(),
                state.internal_id.as_deref(),
            )
            .await;

        let object = match resolution {
            Ok(Resolution::Found { object, .. }) => object,
            Ok(Resolution::Gone) | Err(ProviderError::MissingInternalId { .. }) => {
                info!(
                    reference = state.reference.as_deref().unwrap_or_default(),
                    "Host record already gone, nothing to un-associate"
                );
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let mut host = decode_host(&object)?;
        clear_dhcp_settings(&mut host);
        host.strip_read_only();

        match self.write_host(Operation::Delete, &object, &host).await {
            Ok(_) => Ok(()),
            Err(ProviderError::Client { source, .. }) if source.is_not_found() => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Import the association of an existing host record.
    ///
    /// # Errors
    ///
    /// Returns an error if the host record does not exist or the read fails.
    pub async fn import(&self, reference: &str) -> Result<IpAssociationState, ProviderError> {
        let object = self
            .api
            .read(reference, &request_options())
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    ProviderError::ObjectGone {
                        operation: Operation::Import,
                        type_name: TYPE_IP_ASSOCIATION,
                        reference: reference.to_string(),
                    }
                } else {
                    ProviderError::client(Operation::Import, TYPE_IP_ASSOCIATION, e)
                }
            })?;
        let host = decode_host(&object)?;

        let match_client = host
            .ipv6addrs
            .first()
            .and_then(|a| a.match_client.clone())
            .or_else(|| host.ipv4addrs.first().and_then(|a| a.match_client.clone()));
        let previous = IpAssociationState {
            match_client,
            ..IpAssociationState::default()
        };
        Ok(state_from_host(&object, &host, &previous))
    }
}

#[async_trait]
impl ResourceHandler for IpAssociationResource {
    fn type_name(&self) -> &'static str {
        TYPE_IP_ASSOCIATION
    }

    fn schema(&self) -> ResourceSchema {
        ResourceSchema {
            type_name: TYPE_IP_ASSOCIATION,
            description: "Associates a MAC address or DUID with the first address of a host record.",
            attributes: ATTRIBUTES.to_vec(),
            json_schema: serde_json::to_value(schemars::schema_for!(IpAssociationState))
                .unwrap_or(Value::Null),
        }
    }

    fn validate_config(&self, config: &Value) -> Diagnostics {
        let mut diagnostics = crate::schema::validate_config(&[ATTRIBUTES], config);
        if diagnostics.has_error() {
            return diagnostics;
        }
        match serde_json::from_value::<IpAssociationState>(config.clone()) {
            Ok(plan) => diagnostics.extend(validate(&plan)),
            Err(e) => diagnostics.add_attribute_error("", "Invalid Configuration", e.to_string()),
        }
        diagnostics
    }

    async fn create(&self, plan: Value) -> Result<Value, ProviderError> {
        let plan = prepare_plan(TYPE_IP_ASSOCIATION, &[ATTRIBUTES], plan)?;
        let plan = decode_state(TYPE_IP_ASSOCIATION, "plan", plan)?;
        let state = IpAssociationResource::create(self, plan).await?;
        encode_state(TYPE_IP_ASSOCIATION, &state)
    }

    async fn read(&self, state: Value) -> Result<Option<Value>, ProviderError> {
        let state = decode_state(TYPE_IP_ASSOCIATION, "state", state)?;
        match IpAssociationResource::read(self, state).await? {
            Some(refreshed) => encode_state(TYPE_IP_ASSOCIATION, &refreshed).map(Some),
            None => Ok(None),
        }
    }

    async fn update(&self, prior: Value, plan: Value) -> Result<Value, ProviderError> {
        let prior = decode_state(TYPE_IP_ASSOCIATION, "state", prior)?;
        let plan = prepare_plan(TYPE_IP_ASSOCIATION, &[ATTRIBUTES], plan)?;
        let plan = decode_state(TYPE_IP_ASSOCIATION, "plan", plan)?;
        let state = IpAssociationResource::update(self, prior, plan).await?;
        encode_state(TYPE_IP_ASSOCIATION, &state)
    }

    async fn delete(&self, state: Value) -> Result<(), ProviderError> {
        let state = decode_state(TYPE_IP_ASSOCIATION, "state", state)?;
        IpAssociationResource::delete(self, state).await
    }

    async fn import(&self, reference: &str) -> Result<Value, ProviderError> {
        let state = IpAssociationResource::import(self, reference).await?;
        encode_state(TYPE_IP_ASSOCIATION, &state)
    }
}

#[cfg(test)]
#[path = "ip_association_tests.rs"]
mod ip_association_tests;
