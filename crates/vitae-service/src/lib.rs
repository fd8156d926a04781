//! Vitae Billing HTTP API Service.
//!
//! This crate provides the HTTP API for the vitae credit ledger, including:
//!
//! - Credit balance and transaction history
//! - Checkout initiation against the payment gateway
//! - Feature gating for the CV-generation and interview services
//! - Payment gateway callback verification and purchase finalization
//!
//! # Authentication
//!
//! The service supports two authentication methods:
//!
//! 1. **JWT bearer tokens** - For end-user requests (dashboard, etc.)
//! 2. **Service API keys** - For service-to-service requests (the feature
//!    handlers consulting the gate endpoints)

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers need async for consistency

pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod ledger;
pub mod routes;
pub mod state;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use gateway::{CheckoutRequest, GatewayConfig, PaymentGateway};
pub use ledger::Ledger;
pub use routes::create_router;
pub use state::AppState;
