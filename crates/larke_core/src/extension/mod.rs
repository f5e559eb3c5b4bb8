//! Extension kernel.
//!
//! This module owns the runtime side of admin extensions: name registration,
//! identifier resolution through the service container, metadata validation,
//! directory bootstrap loading, the boot lifecycle and rule tree creation.

pub mod container;
pub mod info;
pub mod kernel;
pub mod loader;
pub mod namespace;
pub mod rules;
pub mod service;
