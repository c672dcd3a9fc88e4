// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! IP association against a mock WAPI.

mod common;

use common::{body_json, provider, result, wapi_path};
use nios_provider::errors::ProviderError;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const HOST_REF: &str = "record:host/ZG5zLmhvc3QkLl9kZWZhdWx0LmNvbS5leGFtcGxlLnNlcnZlcjE:server1.example.com/default";

fn host(mac: &str, dhcp: bool) -> Value {
    json!({
        "_ref": HOST_REF,
        "name": "server1.example.com",
        "view": "default",
        "configure_for_dns": true,
        "comment": "managed elsewhere",
        "zone": "example.com",
        "network_view": "default",
        "extattrs": {"Owner": {"value": "netops"}},
        "ipv4addrs": [{
            "_ref": "record:host_ipv4addr/ZG5zLmhvc3RfYWRkcmVzcw:10.0.0.5/server1.example.com/default",
            "ipv4addr": "10.0.0.5",
            "host": "server1.example.com",
            "mac": mac,
            "configure_for_dhcp": dhcp
        }]
    })
}

#[tokio::test]
async fn test_association_lifecycle() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(wapi_path(HOST_REF)))
        .and(query_param("_return_as_object", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(result(host("", false))))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path(wapi_path(HOST_REF)))
        .and(|request: &Request| {
            let body = body_json(request);
            let address = &body["ipv4addrs"][0];
            address["mac"] == json!("aa:bb:cc:dd:ee:ff")
                && address["configure_for_dhcp"] == json!(true)
                && address.get("host").is_none()
                && body.get("zone").is_none()
                && body.get("network_view").is_none()
                && body.get("extattrs").is_none()
                && body["comment"] == json!("managed elsewhere")
        })
        .respond_with(
            ResponseTemplate::new(200).set_body_json(result(host("aa:bb:cc:dd:ee:ff", true))),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path(wapi_path(HOST_REF)))
        .and(|request: &Request| {
            let address = &body_json(request)["ipv4addrs"][0];
            address["mac"] == json!("") && address["configure_for_dhcp"] == json!(false)
        })
        .respond_with(ResponseTemplate::new(200).set_body_json(result(host("", false))))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let resource = provider(&server).resource("nios_ip_association").unwrap();

    let state = resource
        .create(json!({
            "ref": HOST_REF,
            "mac": "aa:bb:cc:dd:ee:ff",
            "configure_for_dhcp": true
        }))
        .await
        .unwrap();

    assert_eq!(state["ref"], json!(HOST_REF));
    assert_eq!(state["mac"], json!("aa:bb:cc:dd:ee:ff"));
    assert_eq!(state["configure_for_dhcp"], json!(true));

    resource.delete(state).await.unwrap();
}

#[tokio::test]
async fn test_dhcp_without_identifier_is_rejected_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let resource = provider(&server).resource("nios_ip_association").unwrap();
    let err = resource
        .create(json!({"ref": HOST_REF, "configure_for_dhcp": true}))
        .await
        .unwrap_err();

    let ProviderError::Validation { diagnostics, .. } = err else {
        panic!("expected a validation error");
    };
    assert!(diagnostics
        .iter()
        .any(|d| d.attribute.as_deref() == Some("configure_for_dhcp")));
}

#[tokio::test]
async fn test_delete_of_missing_host_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(wapi_path(HOST_REF)))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let resource = provider(&server).resource("nios_ip_association").unwrap();
    resource
        .delete(json!({"ref": HOST_REF, "mac": "aa:bb:cc:dd:ee:ff", "configure_for_dhcp": true}))
        .await
        .unwrap();
}
