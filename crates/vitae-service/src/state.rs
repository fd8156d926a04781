//! Application state.

use std::sync::Arc;

use vitae_store::RocksStore;

use crate::config::ServiceConfig;
use crate::gateway::PaymentGateway;
use crate::ledger::Ledger;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The credit ledger service (sole writer-of-record).
    pub ledger: Ledger,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Payment gateway adapter (optional).
    pub gateway: Option<Arc<PaymentGateway>>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<RocksStore>, config: ServiceConfig) -> Self {
        let gateway = config.gateway.clone().map(|gateway_config| {
            tracing::info!(
                merchant_id = %gateway_config.merchant_id,
                process_url = %gateway_config.process_url,
                signed = %gateway_config.passphrase.is_some(),
                "Payment gateway enabled"
            );
            Arc::new(PaymentGateway::new(gateway_config))
        });

        if gateway.is_none() {
            tracing::warn!("Payment gateway not configured - purchases will not be available");
        }

        Self {
            ledger: Ledger::new(store),
            config,
            gateway,
        }
    }
}
