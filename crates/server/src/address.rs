//! Server base URL resolution

use axum::http::HeaderMap;

/// How the server determines its own base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerAddressStrategy {
    /// Derive the base from the incoming request, honouring forwarding headers
    Incoming,
    /// Always use the configured base
    Hardcoded(String),
}

impl ServerAddressStrategy {
    pub fn hardcoded(base: impl Into<String>) -> Self {
        let base = base.into();
        ServerAddressStrategy::Hardcoded(base.trim_end_matches('/').to_string())
    }

    /// Base URL (`{scheme}://{host}`) for the request carrying `headers`
    pub fn determine_server_base(&self, headers: &HeaderMap) -> String {
        match self {
            ServerAddressStrategy::Hardcoded(base) => base.clone(),
            ServerAddressStrategy::Incoming => {
                let scheme = headers
                    .get("x-forwarded-proto")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("http");
                let host = headers
                    .get("x-forwarded-host")
                    .or_else(|| headers.get("host"))
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("localhost");
                format!("{}://{}", scheme, host)
            }
        }
    }
}
