// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common test utilities for integration tests.

#![allow(dead_code)]

use nios_provider::client::WapiClient;
use nios_provider::config::ProviderConfig;
use nios_provider::provider::Provider;
use serde_json::{json, Value};
use wiremock::{MockServer, Request};

pub const WAPI_VERSION: &str = "v2.13.6";

/// `Basic` authorization header for admin/infoblox
pub const AUTHORIZATION: &str = "Basic YWRtaW46aW5mb2Jsb3g=";

/// Provider configuration pointing at a mock grid master, with retries disabled.
pub fn config(server: &MockServer) -> ProviderConfig {
    ProviderConfig {
        nios_host_url: server.uri(),
        nios_username: "admin".to_string(),
        nios_password: "infoblox".to_string(),
        wapi_version: WAPI_VERSION.to_string(),
        max_retry_elapsed_secs: 0,
        page_size: 2,
        ..ProviderConfig::default()
    }
}

pub fn provider(server: &MockServer) -> Provider {
    Provider::configure(&config(server)).expect("provider should configure")
}

pub fn client(server: &MockServer) -> WapiClient {
    WapiClient::new(&config(server)).expect("client should build")
}

/// Request path of an object type or reference.
pub fn wapi_path(path: &str) -> String {
    format!("/wapi/{WAPI_VERSION}/{path}")
}

/// `{"result": ...}` wrapper returned with `_return_as_object=1`.
pub fn result(value: Value) -> Value {
    json!({ "result": value })
}

/// WAPI error body for a reference that does not resolve.
pub fn not_found_body(reference: &str) -> Value {
    json!({
        "Error": format!("AdmConDataNotFoundError: Reference {reference} not found"),
        "code": "Client.Ibap.Data.NotFound",
        "text": format!("Reference {reference} not found")
    })
}

/// JSON body of a recorded request.
pub fn body_json(request: &Request) -> Value {
    serde_json::from_slice(&request.body).unwrap_or(Value::Null)
}

/// Wire-form internal id carried in a request body, if any.
pub fn internal_id_in(request: &Request) -> Option<String> {
    body_json(request)["extattrs"]["Terraform Internal ID"]["value"]
        .as_str()
        .map(str::to_string)
}
