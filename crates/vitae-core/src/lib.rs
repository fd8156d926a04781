//! Core types for the vitae credit ledger.
//!
//! This crate provides the foundational types used throughout the vitae
//! billing platform:
//!
//! - **Identifiers**: `UserId`, `PurchaseId`, `TransactionId`
//! - **Balances**: `CreditBalance`
//! - **Purchases**: `PurchaseRecord`, `PurchaseStatus`, `PurchaseOutcome`
//! - **Transactions**: `CreditTransaction`, `TransactionType`
//! - **Catalog**: `CreditPackage`, `Feature`
//!
//! # Credits
//!
//! A credit is the platform's internal usage unit. Credits are purchased in
//! packages through the payment gateway and consumed per feature invocation
//! (CV generation, interview sessions). Balances are stored as `i64` whole
//! credits and are never negative.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod balance;
pub mod catalog;
pub mod credits;
pub mod ids;
pub mod purchase;

pub use balance::CreditBalance;
pub use catalog::{
    find_package, CreditPackage, Feature, UnknownFeature, COST_CV_GENERATION,
    COST_INTERVIEW_SESSION, PACKAGES,
};
pub use credits::{CreditTransaction, TransactionType};
pub use ids::{IdError, PurchaseId, TransactionId, UserId};
pub use purchase::{PurchaseOutcome, PurchaseRecord, PurchaseStatus};
