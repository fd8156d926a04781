//! HTTP request handlers.

pub mod credits;
pub mod gate;
pub mod health;
pub mod webhooks;
