// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the NIOS provider.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Extensible Attribute Constants
// ============================================================================

/// Reserved extensible attribute key holding the client-generated internal id.
///
/// Every object created by the provider is stamped with this attribute so it can
/// be found again after its `_ref` changes.
pub const INTERNAL_ID_EXT_ATTR: &str = "Terraform Internal ID";

/// Key of the value field inside a wire-format extensible attribute.
pub const EXT_ATTR_VALUE_KEY: &str = "value";

/// Key marking an extensible attribute as inherited from a parent object.
pub const EXT_ATTR_INHERITANCE_SOURCE_KEY: &str = "inheritance_source";

// ============================================================================
// WAPI Constants
// ============================================================================

/// Default WAPI version used when none is configured
pub const DEFAULT_WAPI_VERSION: &str = "v2.13.6";

/// Path segment between the host URL and the WAPI version
pub const WAPI_PATH_PREFIX: &str = "wapi";

/// Query parameter requesting extra fields on top of the defaults
pub const PARAM_RETURN_FIELDS_PLUS: &str = "_return_fields+";

/// Query parameter requesting a `{"result": ...}` wrapped response
pub const PARAM_RETURN_AS_OBJECT: &str = "_return_as_object";

/// Query parameter enabling paged list responses
pub const PARAM_PAGING: &str = "_paging";

/// Query parameter setting the page size of a paged list
pub const PARAM_MAX_RESULTS: &str = "_max_results";

/// Query parameter carrying the continuation token of a paged list
pub const PARAM_PAGE_ID: &str = "_page_id";

/// Prefix turning a query parameter into an extensible attribute filter
pub const EXT_ATTR_FILTER_PREFIX: char = '*';

/// Response field wrapping the payload when `_return_as_object=1`
pub const RESULT_FIELD: &str = "result";

/// Response field carrying the next page token of a paged list
pub const NEXT_PAGE_ID_FIELD: &str = "next_page_id";

/// WAPI error code returned for a reference that no longer resolves
pub const WAPI_NOT_FOUND_CODE: &str = "Client.Ibap.Data.NotFound";

/// Default page size for list operations
pub const DEFAULT_PAGE_SIZE: u32 = 1000;

// ============================================================================
// WAPI Object Types
// ============================================================================

/// WAPI object type for A records
pub const OBJECT_RECORD_A: &str = "record:a";

/// WAPI object type for AAAA records
pub const OBJECT_RECORD_AAAA: &str = "record:aaaa";

/// WAPI object type for CNAME records
pub const OBJECT_RECORD_CNAME: &str = "record:cname";

/// WAPI object type for MX records
pub const OBJECT_RECORD_MX: &str = "record:mx";

/// WAPI object type for PTR records
pub const OBJECT_RECORD_PTR: &str = "record:ptr";

/// WAPI object type for SRV records
pub const OBJECT_RECORD_SRV: &str = "record:srv";

/// WAPI object type for TXT records
pub const OBJECT_RECORD_TXT: &str = "record:txt";

/// WAPI object type for CAA records
pub const OBJECT_RECORD_CAA: &str = "record:caa";

/// WAPI object type for host records
pub const OBJECT_RECORD_HOST: &str = "record:host";

/// WAPI object type for authoritative zones
pub const OBJECT_ZONE_AUTH: &str = "zone_auth";

/// WAPI object type for forward zones
pub const OBJECT_ZONE_FORWARD: &str = "zone_forward";

/// WAPI object type for name server groups
pub const OBJECT_NSGROUP: &str = "nsgroup";

// ============================================================================
// Resource Type Names
// ============================================================================

/// Type name for the A record resource
pub const TYPE_RECORD_A: &str = "nios_dns_record_a";

/// Type name for the AAAA record resource
pub const TYPE_RECORD_AAAA: &str = "nios_dns_record_aaaa";

/// Type name for the CNAME record resource
pub const TYPE_RECORD_CNAME: &str = "nios_dns_record_cname";

/// Type name for the MX record resource
pub const TYPE_RECORD_MX: &str = "nios_dns_record_mx";

/// Type name for the PTR record resource
pub const TYPE_RECORD_PTR: &str = "nios_dns_record_ptr";

/// Type name for the SRV record resource
pub const TYPE_RECORD_SRV: &str = "nios_dns_record_srv";

/// Type name for the TXT record resource
pub const TYPE_RECORD_TXT: &str = "nios_dns_record_txt";

/// Type name for the CAA record resource
pub const TYPE_RECORD_CAA: &str = "nios_dns_record_caa";

/// Type name for the authoritative zone resource
pub const TYPE_ZONE_AUTH: &str = "nios_dns_zone_auth";

/// Type name for the forward zone resource
pub const TYPE_ZONE_FORWARD: &str = "nios_dns_zone_forward";

/// Type name for the name server group resource
pub const TYPE_NSGROUP: &str = "nios_dns_nsgroup";

/// Type name for the IP association resource
pub const TYPE_IP_ASSOCIATION: &str = "nios_ip_association";

// ============================================================================
// DNS Defaults
// ============================================================================

/// DNS view used when a resource does not name one
pub const DEFAULT_DNS_VIEW: &str = "default";

/// Zone format used when an authoritative zone does not name one
pub const DEFAULT_ZONE_FORMAT: &str = "FORWARD";

// ============================================================================
// DHCP Match Client Modes
// ============================================================================

/// Match DHCP clients by MAC address
pub const MATCH_CLIENT_MAC_ADDRESS: &str = "MAC_ADDRESS";

/// Match DHCPv6 clients by DUID
pub const MATCH_CLIENT_DUID: &str = "DUID";

// ============================================================================
// Provider Configuration Defaults
// ============================================================================

/// Environment variable holding the NIOS grid master URL
pub const ENV_NIOS_HOST_URL: &str = "NIOS_HOST_URL";

/// Environment variable holding the WAPI username
pub const ENV_NIOS_USERNAME: &str = "NIOS_USERNAME";

/// Environment variable holding the WAPI password
pub const ENV_NIOS_PASSWORD: &str = "NIOS_PASSWORD";

/// Environment variable overriding the WAPI version
pub const ENV_NIOS_WAPI_VERSION: &str = "NIOS_WAPI_VERSION";

/// Default HTTP request timeout (60 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default upper bound on time spent retrying one request (2 minutes)
pub const DEFAULT_MAX_RETRY_ELAPSED_SECS: u64 = 120;
