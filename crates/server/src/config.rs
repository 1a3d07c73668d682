//! Server configuration

use crate::address::ServerAddressStrategy;

/// Server configuration loaded from environment variables
pub struct Config {
    pub bind_address: String,
    /// JSON binding registry; an empty registry is served when unset
    pub bindings_file: Option<String>,
    /// Fixed base URL; derived from each request when unset
    pub server_base_url: Option<String>,
    pub publisher: Option<String>,
    pub capability_cache: bool,
    pub cors_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            bind_address: non_empty("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:8080".into()),
            bindings_file: non_empty("BINDINGS_FILE"),
            server_base_url: non_empty("SERVER_BASE_URL"),
            // Set but empty means "omit the publisher"
            publisher: match lookup("FHIR_PUBLISHER") {
                Some(value) if value.trim().is_empty() => None,
                Some(value) => Some(value),
                None => Some(crate::conformance::DEFAULT_PUBLISHER.to_string()),
            },
            capability_cache: non_empty("CAPABILITY_CACHE")
                .map(|v| {
                    !matches!(
                        v.trim().to_ascii_lowercase().as_str(),
                        "false" | "0" | "no" | "off"
                    )
                })
                .unwrap_or(true),
            cors_origins: non_empty("CORS_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_else(|| vec!["*".to_string()]),
        }
    }

    pub fn address_strategy(&self) -> ServerAddressStrategy {
        match &self.server_base_url {
            Some(base) => ServerAddressStrategy::hardcoded(base.clone()),
            None => ServerAddressStrategy::Incoming,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]);
        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert!(config.bindings_file.is_none());
        assert_eq!(config.publisher.as_deref(), Some("Not provided"));
        assert!(config.capability_cache);
        assert_eq!(config.cors_origins, vec!["*"]);
        assert_eq!(config.address_strategy(), ServerAddressStrategy::Incoming);
    }

    #[test]
    fn reads_variables() {
        let config = config(&[
            ("BIND_ADDRESS", "127.0.0.1:9000"),
            ("BINDINGS_FILE", "/etc/fhir/bindings.json"),
            ("SERVER_BASE_URL", "https://fhir.example.org/"),
            ("FHIR_PUBLISHER", "Example Health"),
            ("CAPABILITY_CACHE", "false"),
            ("CORS_ORIGINS", "https://a.example, https://b.example"),
        ]);
        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert_eq!(config.bindings_file.as_deref(), Some("/etc/fhir/bindings.json"));
        assert_eq!(config.publisher.as_deref(), Some("Example Health"));
        assert!(!config.capability_cache);
        assert_eq!(
            config.cors_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert_eq!(
            config.address_strategy(),
            ServerAddressStrategy::Hardcoded("https://fhir.example.org".into())
        );
    }

    #[test]
    fn empty_publisher_is_omitted() {
        let config = config(&[("FHIR_PUBLISHER", "")]);
        assert!(config.publisher.is_none());
    }
}
