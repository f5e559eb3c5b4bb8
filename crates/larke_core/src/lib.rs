//! Extension kernel for the Larke admin back office.
//!
//! Registers admin extensions, resolves them through a service container,
//! boots the enabled ones and creates their authorization rule trees.

pub mod config;
pub mod db;
pub mod extension;
pub mod logging;
pub mod maintenance;
pub mod model;
pub mod repo;

pub use config::{ConfigError, LarkeConfig};
pub use extension::container::{ResolveError, ServiceContainer};
pub use extension::info::{
    check_info, validate_info, ExtensionInfo, InfoMap, InfoValidationError,
};
pub use extension::kernel::{
    BootError, BootFailurePolicy, BootReport, BootStage, ExtendLookup, ExtensionRegistry,
    SkipReason, SkippedExtension,
};
pub use extension::loader::{BootstrapManifest, ExtensionLoader, LoaderError};
pub use extension::namespace::{NamespaceError, NamespaceMap};
pub use extension::rules::{RuleTreeBuilder, RuleTreeError};
pub use extension::service::{BootCallbacks, BootHookError, BootResult, ExtensionService};
pub use logging::{default_log_level, init_logging, logging_status};
pub use maintenance::{clear_cache, MaintenanceError, MaintenanceHost, MaintenanceTask};
pub use model::auth_rule::{AuthRule, NewAuthRule, RuleDraft, ROOT_RULE_PARENT_ID};
pub use model::extension::{ExtensionRecord, ExtensionStatus};
pub use repo::extension_repo::{ExtensionRepository, SqliteExtensionRepository};
pub use repo::rule_repo::{RuleRepository, SqliteRuleRepository};
pub use repo::{RepoError, RepoResult};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
