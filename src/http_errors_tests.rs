// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `http_errors.rs`

#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn test_map_http_400() {
        let (reason, message) = map_http_error_to_reason(400);
        assert_eq!(reason, REASON_BAD_REQUEST);
        assert!(message.contains("400"));
    }

    #[test]
    fn test_map_http_401_and_403() {
        assert_eq!(map_http_error_to_reason(401).0, REASON_AUTH_FAILED);
        assert_eq!(map_http_error_to_reason(403).0, REASON_AUTH_FAILED);
    }

    #[test]
    fn test_map_http_404() {
        let (reason, message) = map_http_error_to_reason(404);
        assert_eq!(reason, REASON_OBJECT_NOT_FOUND);
        assert!(message.contains("not found"));
    }

    #[test]
    fn test_map_http_gateway_errors() {
        for code in [502, 503, 504] {
            let (reason, message) = map_http_error_to_reason(code);
            assert_eq!(reason, REASON_GATEWAY_ERROR);
            assert!(message.contains(&code.to_string()));
        }
    }

    #[test]
    fn test_map_http_unknown() {
        let (reason, message) = map_http_error_to_reason(418);
        assert_eq!(reason, REASON_UNEXPECTED);
        assert!(message.contains("418"));
    }

    #[test]
    fn test_parse_wapi_error_body() {
        let body = r#"{"Error": "AdmConDataNotFound: Reference record:a/abc not found",
                       "code": "Client.Ibap.Data.NotFound",
                       "text": "Reference record:a/abc not found"}"#;

        let parsed = WapiErrorBody::parse(body).unwrap();
        assert!(parsed.is_not_found());
        assert_eq!(parsed.text.as_deref(), Some("Reference record:a/abc not found"));
    }

    #[test]
    fn test_parse_rejects_non_error_documents() {
        assert!(WapiErrorBody::parse("{}").is_none());
        assert!(WapiErrorBody::parse("<html>bad gateway</html>").is_none());
    }

    #[test]
    fn test_error_message_prefers_text() {
        let body = r#"{"Error": "AdmConProtoError: bad", "code": "Client.Ibap.Proto", "text": "bad field"}"#;
        assert_eq!(error_message(400, body), "bad field");
    }

    #[test]
    fn test_error_message_falls_back_to_raw_body() {
        assert_eq!(error_message(500, "  upstream exploded \n"), "upstream exploded");
    }

    #[test]
    fn test_error_message_falls_back_to_status_mapping() {
        assert_eq!(
            error_message(503, ""),
            "Grid master service unavailable (503)"
        );
    }
}
