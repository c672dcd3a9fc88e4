// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `config.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn complete_config() -> ProviderConfig {
        ProviderConfig {
            nios_host_url: "https://gridmaster.example.com".to_string(),
            nios_username: "admin".to_string(),
            nios_password: "infoblox".to_string(),
            ..ProviderConfig::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = ProviderConfig::default();
        assert_eq!(config.wapi_version, "v2.13.6");
        assert_eq!(config.timeout(), Duration::from_secs(60));
        assert_eq!(config.max_retry_elapsed(), Duration::from_secs(120));
        assert_eq!(config.page_size, 1000);
        assert!(!config.insecure_skip_verify);
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "nios_host_url: https://gm.example.com\nnios_username: admin\nnios_password: secret\ninsecure_skip_verify: true\npage_size: 50"
        )
        .unwrap();

        let config = ProviderConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.nios_host_url, "https://gm.example.com");
        assert_eq!(config.nios_username, "admin");
        assert!(config.insecure_skip_verify);
        assert_eq!(config.page_size, 50);
        assert_eq!(config.wapi_version, "v2.13.6");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_missing_file() {
        let result = ProviderConfig::from_yaml_file(Path::new("/nonexistent/nios.yaml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_from_invalid_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "page_size: [not, a, number]").unwrap();

        let result = ProviderConfig::from_yaml_file(file.path());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_overrides_win_over_file_values() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("NIOS_HOST_URL", "https://override.example.com"),
            ("NIOS_PASSWORD", "from-env"),
            ("NIOS_USERNAME", ""),
        ]);

        let config =
            complete_config().with_overrides(|name| vars.get(name).map(|v| (*v).to_string()));

        assert_eq!(config.nios_host_url, "https://override.example.com");
        assert_eq!(config.nios_password, "from-env");
        // Empty values are ignored
        assert_eq!(config.nios_username, "admin");
    }

    #[test]
    fn test_validate_missing_host() {
        let config = ProviderConfig {
            nios_host_url: String::new(),
            ..complete_config()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing {
                setting: "nios_host_url",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_bad_scheme() {
        let config = ProviderConfig {
            nios_host_url: "gridmaster.example.com".to_string(),
            ..complete_config()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                setting: "nios_host_url",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_missing_password() {
        let config = ProviderConfig {
            nios_password: String::new(),
            ..complete_config()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing {
                setting: "nios_password",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_zero_page_size() {
        let config = ProviderConfig {
            page_size: 0,
            ..complete_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", complete_config());
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("infoblox"));
    }
}
