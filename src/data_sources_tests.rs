// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `data_sources.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::client::mock::{Call, MockWapi};
    use crate::errors::ClientError;
    use crate::resources::dns::records::RecordA;
    use serde_json::json;

    fn record(reference: &str, name: &str, ip: &str) -> Value {
        json!({
            "_ref": reference,
            "name": name,
            "ipv4addr": ip,
            "view": "default",
            "ttl": 3600,
            "use_ttl": true,
            "zone": "example.com",
            "extattrs": {
                "Site": {"value": "nyc"},
                "Region": {"value": "us-east", "inheritance_source": {"_ref": "network/abc"}},
                "Terraform Internal ID": {"value": "id-1"}
            }
        })
    }

    // =====================================================
    // Query options
    // =====================================================

    #[test]
    fn test_query_builds_filters() {
        let query = DataSourceQuery {
            filters: Some(BTreeMap::from([("name".to_string(), "www.example.com".to_string())])),
            extattrfilters: Some(BTreeMap::from([("Site".to_string(), "nyc".to_string())])),
        };

        let options = query.request_options("extattrs,name");

        assert_eq!(options.return_fields_plus.as_deref(), Some("extattrs,name"));
        assert!(options.return_as_object);
        assert_eq!(options.filters.get("name").map(String::as_str), Some("www.example.com"));
        assert_eq!(options.ext_attr_filters.get("Site").map(String::as_str), Some("nyc"));
    }

    #[test]
    fn test_empty_query_has_no_filters() {
        let options = DataSourceQuery::default().request_options("extattrs");
        assert!(options.filters.is_empty());
        assert!(options.ext_attr_filters.is_empty());
    }

    // =====================================================
    // Read
    // =====================================================

    #[tokio::test]
    async fn test_query_returns_full_tag_set() {
        let api = Arc::new(MockWapi::new().on_list(Ok(vec![
            record("record:a/1:www.example.com/default", "www.example.com", "10.0.0.1"),
            record("record:a/2:api.example.com/default", "api.example.com", "10.0.0.2"),
        ])));
        let data_source = ObjectDataSource::<RecordA>::new(api.clone());

        let result = data_source
            .query(DataSourceQuery {
                extattrfilters: Some(BTreeMap::from([("Site".to_string(), "nyc".to_string())])),
                ..DataSourceQuery::default()
            })
            .await
            .unwrap();

        assert_eq!(result.result.len(), 2);
        let first = &result.result[0];
        assert_eq!(first.reference.as_deref(), Some("record:a/1:www.example.com/default"));
        assert_eq!(first.internal_id.as_deref(), Some("id-1"));
        assert_eq!(first.model.ipv4addr.as_deref(), Some("10.0.0.1"));
        let tags = first.extattrs.as_ref().unwrap();
        assert!(tags.contains_key("Site"));
        assert!(tags.contains_key("Region"));

        let calls = api.calls();
        let Call::List { object_type, options } = &calls[0] else {
            panic!("expected a list call");
        };
        assert_eq!(object_type, "record:a");
        assert_eq!(options.ext_attr_filters.get("Site").map(String::as_str), Some("nyc"));
    }

    #[tokio::test]
    async fn test_handler_read_fills_result() {
        let api = Arc::new(MockWapi::new().on_list(Ok(vec![record(
            "record:a/1:www.example.com/default",
            "www.example.com",
            "10.0.0.1",
        )])));
        let handler: &dyn DataSourceHandler = &ObjectDataSource::<RecordA>::new(api);

        let document = handler
            .read(json!({"filters": {"name": "www.example.com"}}))
            .await
            .unwrap();

        assert_eq!(document["filters"]["name"], json!("www.example.com"));
        assert_eq!(document["result"][0]["ref"], json!("record:a/1:www.example.com/default"));
        assert_eq!(document["result"][0]["name"], json!("www.example.com"));
        assert_eq!(document["result"][0]["extattrs"]["Site"], json!("nyc"));
    }

    #[tokio::test]
    async fn test_handler_rejects_unknown_query_fields_without_calls() {
        let api = Arc::new(MockWapi::new());
        let handler: &dyn DataSourceHandler = &ObjectDataSource::<RecordA>::new(api.clone());

        let result = handler.read(json!({"name": "www.example.com"})).await;

        assert!(matches!(result, Err(ProviderError::Validation { .. })));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_list_failure_is_client_error() {
        let api = Arc::new(MockWapi::new().on_list(Err(ClientError::Api {
            method: "GET".to_string(),
            url: "https://gm.example.com/wapi/v2.13.6/record:a".to_string(),
            status: 401,
            message: "Authorization Required".to_string(),
        })));
        let data_source = ObjectDataSource::<RecordA>::new(api);

        let err = data_source
            .query(DataSourceQuery::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ProviderError::Client {
                operation: Operation::List,
                ..
            }
        ));
    }

    #[test]
    fn test_schema_lists_query_attributes() {
        let handler = ObjectDataSource::<RecordA>::new(Arc::new(MockWapi::new()));
        let schema = DataSourceHandler::schema(&handler);
        let names: Vec<&str> = schema.attributes.iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["filters", "extattrfilters", "result"]);
        assert_eq!(schema.type_name, "nios_dns_record_a");
    }
}
