//! Persisted domain records for the admin kernel.
//!
//! # Responsibility
//! - Define extension install records and authorization rule records.
//! - Keep persistence shapes independent from the runtime registry.

pub mod auth_rule;
pub mod extension;
