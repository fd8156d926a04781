//! Service configuration.
//!
//! All configuration is read from the process environment once at startup and
//! carried in an explicit `ServiceConfig` value; no component reads ambient
//! environment state after construction.

use crate::gateway::GatewayConfig;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to `RocksDB` data directory (default: "/data/vitae-ledger").
    pub data_dir: String,

    /// Identity provider base URL for JWT validation.
    pub auth_base_url: String,

    /// Expected JWT audience (default: "vitae-billing").
    pub auth_audience: String,

    /// Service API key for service-to-service auth (gate endpoints).
    pub service_api_key: Option<String>,

    /// Payment gateway configuration (optional; without it checkout and
    /// callbacks are disabled).
    pub gateway: Option<GatewayConfig>,

    /// Frontend URL for post-payment redirects.
    pub frontend_url: String,

    /// Publicly reachable base URL of this service, for the gateway's
    /// notify callback.
    pub public_url: String,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let frontend_url =
            std::env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".into());
        let public_url =
            std::env::var("PUBLIC_URL").unwrap_or_else(|_| "http://localhost:8080".into());

        let gateway = load_gateway_config(&frontend_url, &public_url);

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "/data/vitae-ledger".into()),
            auth_base_url: std::env::var("AUTH_BASE_URL")
                .unwrap_or_else(|_| "https://auth.vitae.app".into()),
            auth_audience: std::env::var("AUTH_AUDIENCE")
                .unwrap_or_else(|_| "vitae-billing".into()),
            service_api_key: std::env::var("SERVICE_API_KEY").ok(),
            gateway,
            frontend_url,
            public_url,
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1024 * 1024), // 1MB
            request_timeout_seconds: std::env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        }
    }
}

/// Load gateway credentials from the environment.
///
/// The gateway is only enabled when both the merchant id and key are present;
/// the passphrase is kept separate so a missing one disables callback
/// verification rather than the whole integration.
fn load_gateway_config(frontend_url: &str, public_url: &str) -> Option<GatewayConfig> {
    let merchant_id = std::env::var("GATEWAY_MERCHANT_ID").ok()?;
    let merchant_key = std::env::var("GATEWAY_MERCHANT_KEY").ok()?;

    Some(GatewayConfig {
        merchant_id,
        merchant_key,
        passphrase: std::env::var("GATEWAY_PASSPHRASE").ok(),
        process_url: std::env::var("GATEWAY_PROCESS_URL")
            .unwrap_or_else(|_| "https://sandbox.payfast.co.za/eng/process".into()),
        return_url: format!("{frontend_url}/billing/return"),
        cancel_url: format!("{frontend_url}/billing/cancel"),
        notify_url: format!("{public_url}/webhooks/payment"),
    })
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "/data/vitae-ledger".into(),
            auth_base_url: "https://auth.vitae.app".into(),
            auth_audience: "vitae-billing".into(),
            service_api_key: None,
            gateway: None,
            frontend_url: "http://localhost:3000".into(),
            public_url: "http://localhost:8080".into(),
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
        }
    }
}
