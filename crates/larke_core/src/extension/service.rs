//! Extension service contract and boot callback chains.
//!
//! # Responsibility
//! - Define what a resolvable extension instance must provide.
//! - Provide the pre-boot/post-boot callback chains services can embed.
//!
//! # Invariants
//! - `info()` returning `None` marks a service without metadata; such a
//!   service still boots but is never described.
//! - Callback chains run in registration order and stop at the first error.

use crate::extension::container::ServiceContainer;
use crate::extension::info::InfoMap;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

/// Result of one lifecycle hook.
pub type BootResult = Result<(), BootHookError>;

/// Failure raised from inside an extension's own lifecycle code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootHookError {
    pub message: String,
}

impl BootHookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for BootHookError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for BootHookError {}

/// Capability every bootable extension implements.
///
/// Only [`ExtensionService::info`] is required. The boot hook, callback chains
/// and method dispatch default to no-ops so an extension opts into each one.
pub trait ExtensionService: Send {
    /// Declared metadata (`name`, `title`, `introduce`, ...).
    fn info(&self) -> Option<&InfoMap>;

    /// Boot hook; dependencies are pulled from `container`.
    fn boot(&mut self, container: &ServiceContainer) -> BootResult {
        let _ = container;
        Ok(())
    }

    fn call_booting_callbacks(&mut self) -> BootResult {
        Ok(())
    }

    fn call_booted_callbacks(&mut self) -> BootResult {
        Ok(())
    }

    /// Dispatches a named extension point.
    ///
    /// Returns `None` when the service has no method called `method`.
    fn call_method(&mut self, method: &str, args: &[Value]) -> Option<Value> {
        let _ = (method, args);
        None
    }
}

type BootCallback = Box<dyn FnMut() -> BootResult + Send>;

/// Booting/booted callback chains an extension service can embed.
#[derive(Default)]
pub struct BootCallbacks {
    booting: Vec<BootCallback>,
    booted: Vec<BootCallback>,
}

impl BootCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback that runs before the boot hook.
    pub fn booting(&mut self, callback: impl FnMut() -> BootResult + Send + 'static) {
        self.booting.push(Box::new(callback));
    }

    /// Registers a callback that runs after the boot hook.
    pub fn booted(&mut self, callback: impl FnMut() -> BootResult + Send + 'static) {
        self.booted.push(Box::new(callback));
    }

    pub fn call_booting(&mut self) -> BootResult {
        run_chain(&mut self.booting)
    }

    pub fn call_booted(&mut self) -> BootResult {
        run_chain(&mut self.booted)
    }
}

impl Debug for BootCallbacks {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootCallbacks")
            .field("booting", &self.booting.len())
            .field("booted", &self.booted.len())
            .finish()
    }
}

fn run_chain(chain: &mut [BootCallback]) -> BootResult {
    for callback in chain.iter_mut() {
        callback()?;
    }
    Ok(())
}
