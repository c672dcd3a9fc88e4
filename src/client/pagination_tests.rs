// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `pagination.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn url() -> Url {
        Url::parse("https://gm.example.com/wapi/v2.13.6/record:a").unwrap()
    }

    #[test]
    fn test_page_from_paged_response() {
        let page = Page::from_response(
            json!({"result": [{"_ref": "a"}, {"_ref": "b"}], "next_page_id": "789c"}),
            &url(),
        )
        .unwrap();

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.next_page_id.as_deref(), Some("789c"));
    }

    #[test]
    fn test_page_from_bare_array() {
        let page = Page::from_response(json!([{"_ref": "a"}]), &url()).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.next_page_id, None);
    }

    #[test]
    fn test_page_without_result_is_empty() {
        let page = Page::from_response(json!({"next_page_id": ""}), &url()).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.next_page_id, None);
    }

    #[test]
    fn test_page_rejects_scalar_result() {
        let result = Page::from_response(json!({"result": "oops"}), &url());
        assert!(matches!(result, Err(ClientError::InvalidResponse { .. })));

        let result = Page::from_response(json!("oops"), &url());
        assert!(matches!(result, Err(ClientError::InvalidResponse { .. })));
    }

    #[tokio::test]
    async fn test_list_all_pages_follows_page_ids() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = seen.clone();

        let items = list_all_pages(move |page_id: Option<String>| {
            recorder.lock().unwrap().push(page_id.clone());
            async move {
                let page = match page_id.as_deref() {
                    None => Page {
                        items: vec![json!(1), json!(2)],
                        next_page_id: Some("p2".to_string()),
                    },
                    Some("p2") => Page {
                        items: vec![json!(3)],
                        next_page_id: None,
                    },
                    Some(other) => panic!("unexpected page id {other}"),
                };
                Ok(page)
            }
        })
        .await
        .unwrap();

        assert_eq!(items, vec![json!(1), json!(2), json!(3)]);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![None, Some("p2".to_string())]
        );
    }

    #[tokio::test]
    async fn test_list_all_pages_propagates_errors() {
        let result = list_all_pages(|_page_id: Option<String>| async {
            Err(ClientError::InvalidRequest("boom".to_string()))
        })
        .await;

        assert!(matches!(result, Err(ClientError::InvalidRequest(_))));
    }
}
