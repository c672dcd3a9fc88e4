// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `diagnostics.rs`

#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn test_warnings_do_not_count_as_errors() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(Diagnostic::warning("Deprecated", "use_ttl is implied by ttl"));

        assert!(!diagnostics.is_empty());
        assert!(!diagnostics.has_error());
    }

    #[test]
    fn test_attribute_error_counts_as_error() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.add_attribute_error("name", "Missing Required Attribute", "name is required");

        assert!(diagnostics.has_error());
        let first = diagnostics.iter().next().unwrap();
        assert_eq!(first.attribute.as_deref(), Some("name"));
    }

    #[test]
    fn test_display_joins_diagnostics() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(Diagnostic::error("A", "first"));
        diagnostics.push(Diagnostic::error("B", "second").at("ttl"));

        assert_eq!(diagnostics.to_string(), "A: first; B (ttl): second");
    }

    #[test]
    fn test_extend_keeps_order() {
        let mut left = Diagnostics::new();
        left.push(Diagnostic::error("A", "first"));
        let mut right = Diagnostics::new();
        right.push(Diagnostic::warning("B", "second"));

        left.extend(right);

        let summaries: Vec<_> = left.iter().map(|d| d.summary.as_str()).collect();
        assert_eq!(summaries, vec!["A", "B"]);
    }

    #[test]
    fn test_serializes_as_list() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(Diagnostic::error("A", "first").at("mac"));

        let json = serde_json::to_value(&diagnostics).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"severity": "error", "summary": "A", "detail": "first", "attribute": "mac"}
            ])
        );
    }
}
