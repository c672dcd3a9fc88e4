// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Dual lookup: by reference first, then by internal id.
//!
//! A stored `_ref` is only a cache. The appliance may rewrite it (a rename, a
//! restore from backup) and a stale reference then answers 404. Every object the
//! provider created carries the [`INTERNAL_ID_EXT_ATTR`] extensible attribute, so the
//! resolver falls back to a single list call filtered on that attribute:
//!
//! ```text
//! GET <ref>                                  -> found, done
//!   404                                      -> GET <type>?*Terraform Internal ID=<id>
//!                                                 0 results   -> gone
//!                                                 1+ results  -> first result
//! ```
//!
//! A successful read whose internal id differs from the one held in state means the
//! reference was recycled for another object, and is treated like a 404.

use serde_json::Value;
use tracing::{debug, warn};

use crate::client::{RequestOptions, WapiApi};
use crate::constants::{EXT_ATTR_VALUE_KEY, INTERNAL_ID_EXT_ATTR};
use crate::errors::{Operation, ProviderError};

/// How an object was located.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupSource {
    /// The stored reference was still valid
    Reference,
    /// The stored reference was stale; found by internal id
    InternalId,
}

/// Outcome of a lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The object exists
    Found {
        /// Object as returned by the WAPI
        object: Value,
        /// Which lookup found it
        source: LookupSource,
    },
    /// Neither lookup found the object
    Gone,
}

/// `_ref` of a WAPI object.
#[must_use]
pub fn object_reference(object: &Value) -> Option<&str> {
    object.get("_ref").and_then(Value::as_str)
}

/// Internal id carried in a WAPI object's wire-form `extattrs`.
#[must_use]
pub fn object_internal_id(object: &Value) -> Option<&str> {
    object
        .get("extattrs")?
        .get(INTERNAL_ID_EXT_ATTR)?
        .get(EXT_ATTR_VALUE_KEY)?
        .as_str()
        .filter(|id| !id.is_empty())
}

/// Resolver for one object type.
pub struct Resolver<'a> {
    api: &'a dyn WapiApi,
    object_type: &'a str,
    type_name: &'static str,
    options: RequestOptions,
}

impl<'a> Resolver<'a> {
    /// Create a resolver. `options` are sent on both the read and the list, so they
    /// normally carry the type's `_return_fields+`.
    #[must_use]
    pub fn new(
        api: &'a dyn WapiApi,
        object_type: &'a str,
        type_name: &'static str,
        options: RequestOptions,
    ) -> Self {
        Self {
            api,
            object_type,
            type_name,
            options,
        }
    }

    /// Locate an object by reference, falling back to its internal id.
    ///
    /// # Errors
    ///
    /// - `MissingInternalId` if the fallback is needed and no internal id is known
    /// - `Client` for any WAPI failure other than not-found
    pub async fn resolve(
        &self,
        operation: Operation,
        reference: Option<&str>,
        internal_id: Option<&str>,
    ) -> Result<Resolution, ProviderError> {
        let reference = reference.filter(|r| !r.is_empty());
        let internal_id = internal_id.filter(|id| !id.is_empty());

        if let Some(reference) = reference {
            match self.api.read(reference, &self.options).await {
                Ok(object) => match (internal_id, object_internal_id(&object)) {
                    (Some(expected), Some(found)) if expected != found => {
                        warn!(
                            type_name = self.type_name,
                            reference = reference,
                            expected_internal_id = expected,
                            found_internal_id = found,
                            "Reference now points at a different object, searching by internal id"
                        );
                    }
                    _ => {
                        return Ok(Resolution::Found {
                            object,
                            source: LookupSource::Reference,
                        })
                    }
                },
                Err(e) if e.is_not_found() => {
                    debug!(
                        type_name = self.type_name,
                        reference = reference,
                        "Reference not found, searching by internal id"
                    );
                }
                Err(e) => return Err(ProviderError::client(operation, self.type_name, e)),
            }
        }

        let Some(internal_id) = internal_id else {
            return Err(ProviderError::MissingInternalId {
                type_name: self.type_name,
                reference: reference.unwrap_or_default().to_string(),
            });
        };

        match self.find_by_internal_id(operation, internal_id).await? {
            Some(object) => Ok(Resolution::Found {
                object,
                source: LookupSource::InternalId,
            }),
            None => Ok(Resolution::Gone),
        }
    }

    /// Search for an object by its internal id with one filtered list call.
    ///
    /// Several matches should not happen; the first one is used and a warning is
    /// logged.
    ///
    /// # Errors
    ///
    /// Returns a `Client` error if the list call fails.
    pub async fn find_by_internal_id(
        &self,
        operation: Operation,
        internal_id: &str,
    ) -> Result<Option<Value>, ProviderError> {
        let options = self
            .options
            .clone()
            .return_as_object()
            .ext_attr_filter(INTERNAL_ID_EXT_ATTR, internal_id);

        let results = self
            .api
            .list(self.object_type, &options)
            .await
            .map_err(|e| ProviderError::client(operation, self.type_name, e))?;

        if results.len() > 1 {
            warn!(
                type_name = self.type_name,
                internal_id = internal_id,
                matches = results.len(),
                "Multiple objects share one internal id, using the first"
            );
        }

        let found = results.into_iter().next();
        match found.as_ref().and_then(object_reference) {
            Some(reference) => debug!(
                type_name = self.type_name,
                internal_id = internal_id,
                reference = reference,
                "Found object by internal id"
            ),
            None => debug!(
                type_name = self.type_name,
                internal_id = internal_id,
                "No object carries this internal id"
            ),
        }
        Ok(found)
    }
}

#[cfg(test)]
#[path = "lookup_tests.rs"]
mod lookup_tests;
