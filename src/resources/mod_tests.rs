// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for the generic resource engine.

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::client::mock::{not_found, Call, MockWapi};
    use crate::extattrs::ExtAttrValue;
    use crate::resources::dns::records::{RecordA, RecordAModel};
    use crate::resources::dns::zones::ZoneAuth;
    use serde_json::json;

    const REF: &str = "record:a/ZG5zLmJpbmRfYSQ:www.example.com/default";
    const NEW_REF: &str = "record:a/bmV3:www.example.com/default";

    fn tags(pairs: &[(&str, &str)]) -> ExtAttrs {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), ExtAttrValue::from(*v)))
            .collect()
    }

    fn model() -> RecordAModel {
        RecordAModel {
            name: Some("www.example.com".to_string()),
            ipv4addr: Some("10.0.0.10".to_string()),
            view: Some("default".to_string()),
            ..RecordAModel::default()
        }
    }

    fn plan(extattrs: Option<ExtAttrs>) -> ResourceState<RecordAModel> {
        ResourceState {
            extattrs,
            model: model(),
            ..ResourceState::default()
        }
    }

    fn server_object(reference: &str, site: &str) -> Value {
        json!({
            "_ref": reference,
            "name": "www.example.com",
            "ipv4addr": "10.0.0.10",
            "view": "default",
            "zone": "example.com",
            "extattrs": {
                "Site": {"value": site},
                "Region": {"value": "us-east", "inheritance_source": {"_ref": "network/abc"}},
                "Terraform Internal ID": {"value": "id-1"}
            }
        })
    }

    fn stored_state() -> ResourceState<RecordAModel> {
        ResourceState {
            reference: Some(REF.to_string()),
            extattrs: Some(tags(&[("Site", "nyc")])),
            extattrs_all: Some(tags(&[
                ("Site", "nyc"),
                ("Region", "us-east"),
                ("Terraform Internal ID", "id-1"),
            ])),
            internal_id: Some("id-1".to_string()),
            model: model(),
        }
    }

    fn engine(api: &Arc<MockWapi>) -> ManagedResource<RecordA> {
        ManagedResource::new(api.clone())
    }

    fn wire_tags(body: &Value) -> Vec<&str> {
        body["extattrs"]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect()
    }

    // =====================================================
    // Create
    // =====================================================

    #[tokio::test]
    async fn test_create_prunes_inherited_tags_from_configured_state() {
        let api = Arc::new(MockWapi::new().on_create(Ok(server_object(REF, "nyc"))));

        let state = engine(&api)
            .create(plan(Some(tags(&[("Site", "nyc")]))))
            .await
            .unwrap();

        assert_eq!(state.reference.as_deref(), Some(REF));
        assert_eq!(state.extattrs, Some(tags(&[("Site", "nyc")])));
        let all = state.extattrs_all.unwrap();
        assert!(all.contains_key("Site"));
        assert!(all.contains_key("Region"));
        assert_eq!(state.internal_id.as_deref(), Some("id-1"));
        assert_eq!(state.model.zone.as_deref(), Some("example.com"));
    }

    #[tokio::test]
    async fn test_create_stamps_internal_id_and_sends_payload() {
        let api = Arc::new(MockWapi::new().on_create(Ok(server_object(REF, "nyc"))));

        engine(&api)
            .create(plan(Some(tags(&[("Site", "nyc")]))))
            .await
            .unwrap();

        let calls = api.calls();
        let Call::Create { object_type, body } = &calls[0] else {
            panic!("expected a create call, got {:?}", calls[0]);
        };
        assert_eq!(object_type, "record:a");
        assert_eq!(wire_tags(body), vec!["Site", "Terraform Internal ID"]);
        assert_eq!(body["name"], json!("www.example.com"));
        assert!(body.get("zone").is_none());
        let id = body["extattrs"]["Terraform Internal ID"]["value"]
            .as_str()
            .unwrap();
        assert_eq!(id.len(), 36);
    }

    #[tokio::test]
    async fn test_create_without_tags_keeps_extattrs_null() {
        let api = Arc::new(MockWapi::new().on_create(Ok(server_object(REF, "nyc"))));

        let state = engine(&api).create(plan(None)).await.unwrap();

        assert_eq!(state.extattrs, None);
        assert_eq!(state.extattrs_all.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_create_validation_fails_without_api_calls() {
        let api = Arc::new(MockWapi::new());
        let mut invalid = plan(None);
        invalid.model.ipv4addr = Some("300.1.1.1".to_string());

        let result = engine(&api).create(invalid).await;

        assert!(matches!(result, Err(ProviderError::Validation { .. })));
        assert!(api.calls().is_empty());
    }

    // =====================================================
    // Read
    // =====================================================

    #[tokio::test]
    async fn test_read_refreshes_state() {
        let api = Arc::new(MockWapi::new().on_read(Ok(server_object(REF, "la"))));

        let state = engine(&api).read(stored_state()).await.unwrap().unwrap();

        assert_eq!(state.extattrs, Some(tags(&[("Site", "la")])));
        assert_eq!(state.reference.as_deref(), Some(REF));
    }

    #[tokio::test]
    async fn test_read_adopts_reference_found_by_internal_id() {
        let api = Arc::new(
            MockWapi::new()
                .on_read(Err(not_found(REF)))
                .on_list(Ok(vec![server_object(NEW_REF, "nyc")])),
        );

        let state = engine(&api).read(stored_state()).await.unwrap().unwrap();

        assert_eq!(state.reference.as_deref(), Some(NEW_REF));
        let lists = api
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::List { .. }))
            .count();
        assert_eq!(lists, 1);
    }

    #[tokio::test]
    async fn test_read_gone_removes_from_state() {
        let api = Arc::new(
            MockWapi::new()
                .on_read(Err(not_found(REF)))
                .on_list(Ok(vec![])),
        );

        assert_eq!(engine(&api).read(stored_state()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_read_without_internal_id_aborts() {
        let api = Arc::new(MockWapi::new().on_read(Err(not_found(REF))));
        let mut state = stored_state();
        state.extattrs_all = Some(tags(&[("Site", "nyc")]));
        state.internal_id = None;

        let result = engine(&api).read(state).await;

        let Err(err) = result else {
            panic!("expected an error");
        };
        assert_eq!(err.summary(), "Missing Internal ID");
    }

    #[tokio::test]
    async fn test_read_uses_internal_id_mirror() {
        let api = Arc::new(
            MockWapi::new()
                .on_read(Err(not_found(REF)))
                .on_list(Ok(vec![server_object(NEW_REF, "nyc")])),
        );
        let mut state = stored_state();
        state.extattrs_all = None;

        let state = engine(&api).read(state).await.unwrap().unwrap();
        assert_eq!(state.reference.as_deref(), Some(NEW_REF));
    }

    // =====================================================
    // Update
    // =====================================================

    #[tokio::test]
    async fn test_update_sends_configured_and_inherited_tags() {
        let api = Arc::new(MockWapi::new().on_update(Ok(server_object(REF, "sf"))));

        let state = engine(&api)
            .update(stored_state(), plan(Some(tags(&[("Site", "sf")]))))
            .await
            .unwrap();

        let calls = api.calls();
        let Call::Update { reference, body } = &calls[0] else {
            panic!("expected an update call, got {:?}", calls[0]);
        };
        assert_eq!(reference, REF);
        assert_eq!(
            body["extattrs"],
            json!({
                "Site": {"value": "sf"},
                "Region": {"value": "us-east"},
                "Terraform Internal ID": {"value": "id-1"}
            })
        );
        assert_eq!(state.extattrs, Some(tags(&[("Site", "sf")])));
    }

    #[tokio::test]
    async fn test_update_removes_tags_dropped_from_configuration() {
        let api = Arc::new(MockWapi::new().on_update(Ok(server_object(REF, "nyc"))));
        let mut prior = stored_state();
        prior.extattrs = Some(tags(&[("Site", "nyc"), ("Owner", "ops")]));
        prior.extattrs_all = Some(tags(&[
            ("Site", "nyc"),
            ("Owner", "ops"),
            ("Region", "us-east"),
            ("Terraform Internal ID", "id-1"),
        ]));

        engine(&api)
            .update(prior, plan(Some(tags(&[("Site", "nyc")]))))
            .await
            .unwrap();

        let Call::Update { body, .. } = &api.calls()[0] else {
            panic!("expected an update call");
        };
        assert_eq!(
            wire_tags(body),
            vec!["Region", "Site", "Terraform Internal ID"]
        );
    }

    #[tokio::test]
    async fn test_update_follows_stale_reference() {
        let api = Arc::new(
            MockWapi::new()
                .on_update(Err(not_found(REF)))
                .on_list(Ok(vec![server_object(NEW_REF, "nyc")]))
                .on_update(Ok(server_object(NEW_REF, "sf"))),
        );

        let state = engine(&api)
            .update(stored_state(), plan(Some(tags(&[("Site", "sf")]))))
            .await
            .unwrap();

        assert_eq!(state.reference.as_deref(), Some(NEW_REF));
        let Call::Update { reference, .. } = &api.calls()[2] else {
            panic!("expected a second update call");
        };
        assert_eq!(reference, NEW_REF);
    }

    #[tokio::test]
    async fn test_update_of_gone_object_is_an_error() {
        let api = Arc::new(
            MockWapi::new()
                .on_update(Err(not_found(REF)))
                .on_list(Ok(vec![])),
        );

        let result = engine(&api)
            .update(stored_state(), plan(Some(tags(&[("Site", "sf")]))))
            .await;

        assert!(matches!(result, Err(ProviderError::ObjectGone { .. })));
    }

    #[tokio::test]
    async fn test_update_rejects_create_only_change() {
        use crate::resources::dns::zones::ZoneAuthModel;

        let api = Arc::new(MockWapi::new());
        let zone = |fqdn: &str| ResourceState {
            reference: Some("zone_auth/ZG5z:example.com/default".to_string()),
            model: ZoneAuthModel {
                fqdn: Some(fqdn.to_string()),
                view: Some("default".to_string()),
                zone_format: Some("FORWARD".to_string()),
                ..ZoneAuthModel::default()
            },
            ..ResourceState::default()
        };

        let result = ManagedResource::<ZoneAuth>::new(api.clone())
            .update(zone("example.com"), zone("example.org"))
            .await;

        let Err(ProviderError::Validation { diagnostics, .. }) = result else {
            panic!("expected a validation error");
        };
        assert_eq!(
            diagnostics.iter().next().unwrap().attribute.as_deref(),
            Some("fqdn")
        );
        assert!(api.calls().is_empty());
    }

    // =====================================================
    // Delete
    // =====================================================

    #[tokio::test]
    async fn test_delete_by_reference() {
        let api = Arc::new(MockWapi::new().on_delete(Ok(())));

        engine(&api).delete(stored_state()).await.unwrap();

        assert_eq!(
            api.calls(),
            vec![Call::Delete {
                reference: REF.to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_delete_when_both_lookups_miss_succeeds() {
        let api = Arc::new(
            MockWapi::new()
                .on_delete(Err(not_found(REF)))
                .on_list(Ok(vec![])),
        );

        engine(&api).delete(stored_state()).await.unwrap();
        assert_eq!(api.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_follows_stale_reference() {
        let api = Arc::new(
            MockWapi::new()
                .on_delete(Err(not_found(REF)))
                .on_list(Ok(vec![server_object(NEW_REF, "nyc")]))
                .on_delete(Ok(())),
        );

        engine(&api).delete(stored_state()).await.unwrap();

        assert_eq!(
            api.calls().last(),
            Some(&Call::Delete {
                reference: NEW_REF.to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_delete_without_internal_id_treated_as_deleted() {
        let api = Arc::new(MockWapi::new().on_delete(Err(not_found(REF))));
        let mut state = stored_state();
        state.extattrs_all = None;
        state.internal_id = None;

        engine(&api).delete(state).await.unwrap();
        assert_eq!(api.calls().len(), 1);
    }

    // =====================================================
    // Import
    // =====================================================

    #[tokio::test]
    async fn test_import_splits_inherited_tags() {
        let api = Arc::new(MockWapi::new().on_read(Ok(server_object(REF, "nyc"))));

        let state = engine(&api).import(REF).await.unwrap();

        assert_eq!(state.extattrs, Some(tags(&[("Site", "nyc")])));
        assert_eq!(state.internal_id.as_deref(), Some("id-1"));
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_import_stamps_missing_internal_id() {
        let untagged = json!({
            "_ref": REF,
            "name": "www.example.com",
            "ipv4addr": "10.0.0.10",
            "extattrs": {"Site": {"value": "nyc"}}
        });
        let api = Arc::new(
            MockWapi::new()
                .on_read(Ok(untagged))
                .on_update(Ok(server_object(REF, "nyc"))),
        );

        let state = engine(&api).import(REF).await.unwrap();

        let Call::Update { body, .. } = &api.calls()[1] else {
            panic!("expected an update call");
        };
        assert_eq!(wire_tags(body), vec!["Site", "Terraform Internal ID"]);
        assert_eq!(state.internal_id.as_deref(), Some("id-1"));
    }

    #[tokio::test]
    async fn test_import_missing_object() {
        let api = Arc::new(MockWapi::new().on_read(Err(not_found(REF))));

        let result = engine(&api).import(REF).await;
        assert!(matches!(result, Err(ProviderError::ObjectGone { .. })));
    }

    // =====================================================
    // JSON handler
    // =====================================================

    #[tokio::test]
    async fn test_handler_applies_defaults_before_create() {
        let api = Arc::new(MockWapi::new().on_create(Ok(server_object(REF, "nyc"))));
        let handler: &dyn ResourceHandler = &engine(&api);

        let state = handler
            .create(json!({
                "name": "www.example.com",
                "ipv4addr": "10.0.0.10",
                "extattrs": {"Site": "nyc"}
            }))
            .await
            .unwrap();

        let Call::Create { body, .. } = &api.calls()[0] else {
            panic!("expected a create call");
        };
        assert_eq!(body["view"], json!("default"));
        assert_eq!(body["disable"], json!(false));
        assert_eq!(state["ref"], json!(REF));
        assert_eq!(state["extattrs"], json!({"Site": "nyc"}));
        assert_eq!(state["internal_id"], json!("id-1"));
    }

    #[tokio::test]
    async fn test_handler_rejects_unknown_attribute() {
        let api = Arc::new(MockWapi::new());
        let handler: &dyn ResourceHandler = &engine(&api);

        let result = handler
            .create(json!({"name": "www.example.com", "ipv4addr": "10.0.0.10", "ttl_": 5}))
            .await;

        assert!(matches!(result, Err(ProviderError::Validation { .. })));
        assert!(api.calls().is_empty());
    }

    #[test]
    fn test_handler_validate_config_runs_type_rules() {
        let api = Arc::new(MockWapi::new());
        let handler = engine(&api);

        let diagnostics = ResourceHandler::validate_config(
            &handler,
            &json!({"name": "www.example.com", "ipv4addr": "nope"}),
        );
        assert!(diagnostics.has_error());
        assert_eq!(
            diagnostics.iter().next().unwrap().attribute.as_deref(),
            Some("ipv4addr")
        );
    }

    #[test]
    fn test_resource_schema_lists_common_and_type_attributes() {
        let schema = resource_schema::<RecordA>();

        assert_eq!(schema.type_name, "nios_dns_record_a");
        let names: Vec<&str> = schema.attributes.iter().map(|a| a.name).collect();
        assert_eq!(&names[..4], &["ref", "extattrs", "extattrs_all", "internal_id"]);
        assert!(names.contains(&"ipv4addr"));
        assert!(schema.json_schema.is_object());
    }

    #[test]
    fn test_state_serializes_ref_key() {
        let value = serde_json::to_value(stored_state()).unwrap();
        assert_eq!(value["ref"], json!(REF));
        assert_eq!(value["name"], json!("www.example.com"));

        let back: ResourceState<RecordAModel> = serde_json::from_value(value).unwrap();
        assert_eq!(back, stored_state());
    }
}
