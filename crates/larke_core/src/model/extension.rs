//! Persisted extension install record.
//!
//! # Invariants
//! - Only `ExtensionStatus::Enabled` records take part in the boot sequence.
//! - Any persisted status code other than `1` reads as disabled.

use serde::{Deserialize, Serialize};

/// Persisted activation state of one installed extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtensionStatus {
    Enabled,
    Disabled,
}

impl ExtensionStatus {
    /// Integer code stored in `larke_extensions.status`.
    pub fn code(self) -> i64 {
        match self {
            Self::Enabled => 1,
            Self::Disabled => 0,
        }
    }

    pub fn from_code(code: i64) -> Self {
        if code == 1 {
            Self::Enabled
        } else {
            Self::Disabled
        }
    }

    pub fn is_enabled(self) -> bool {
        matches!(self, Self::Enabled)
    }
}

/// One row of `larke_extensions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionRecord {
    /// Registry name of the extension.
    pub name: String,
    /// Implementation identifier resolved through the service container.
    pub class_name: String,
    /// Installed version, if recorded.
    pub version: Option<String>,
    pub status: ExtensionStatus,
}

impl ExtensionRecord {
    /// Creates an enabled record.
    pub fn enabled(name: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class_name: class_name.into(),
            version: None,
            status: ExtensionStatus::Enabled,
        }
    }

    /// Creates a disabled record.
    pub fn disabled(name: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            status: ExtensionStatus::Disabled,
            ..Self::enabled(name, class_name)
        }
    }
}
