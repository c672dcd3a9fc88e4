// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # nios-provider - Infoblox NIOS DNS resource provider
//!
//! Manages Infoblox NIOS DNS objects (zones, resource records, name server groups)
//! and DHCP associations on host records as declarative resources, through the NIOS
//! WAPI REST interface.
//!
//! ## Overview
//!
//! Beyond plain CRUD, the provider handles three things the WAPI leaves to callers:
//!
//! - Extensible attribute reconciliation: attributes inherited from parent objects
//!   are tracked separately from configured ones and sent back on update
//! - Stable identity: every created object is stamped with an internal id attribute,
//!   and a stale `_ref` falls back to a search on that id
//! - IP association: MAC/DUID DHCP settings merged onto an existing host record
//!
//! ## Modules
//!
//! - [`client`] - WAPI REST client and the [`client::WapiApi`] trait
//! - [`extattrs`] - Extensible attribute model and reconciliation
//! - [`lookup`] - Lookup by reference with internal id fallback
//! - [`resources`] - Generic CRUD engine and the managed object types
//! - [`data_sources`] - Filtered listing of objects
//! - [`provider`] - Registry of resources and data sources
//! - [`schema`] - Attribute tables and configuration validation
//!
//! ## Example
//!
//! ```rust,no_run
//! use nios_provider::config::ProviderConfig;
//! use nios_provider::provider::Provider;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), nios_provider::errors::ProviderError> {
//! let config = ProviderConfig::default().with_env_overrides();
//! let provider = Provider::configure(&config)?;
//!
//! let record = provider.resource("nios_dns_record_a")?;
//! let state = record
//!     .create(json!({
//!         "name": "www.example.com",
//!         "ipv4addr": "10.0.0.10",
//!         "extattrs": {"Site": "nyc"}
//!     }))
//!     .await?;
//! println!("{state}");
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod constants;
pub mod data_sources;
pub mod diagnostics;
pub mod errors;
pub mod extattrs;
pub mod http_errors;
pub mod lookup;
pub mod provider;
pub mod resources;
pub mod retry;
pub mod schema;
