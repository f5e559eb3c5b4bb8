//! Extension registry and boot lifecycle.
//!
//! # Responsibility
//! - Own the `name -> implementation identifier` mapping.
//! - Resolve identifiers to extension services through the container.
//! - Describe registered extensions and drive the boot sequence.
//!
//! # Invariants
//! - Re-registering a name overwrites its identifier and keeps its position.
//! - Lookups and description never fail; absence is `None`/empty.
//! - Discovery is best-effort; boot hook failures follow [`BootFailurePolicy`].

use crate::extension::container::{ResolveError, ServiceContainer};
use crate::extension::info::{self, ExtensionInfo, InfoMap};
use crate::extension::rules::{RuleTreeBuilder, RuleTreeError, DEFAULT_MAX_RULE_DEPTH};
use crate::extension::service::{BootHookError, ExtensionService};
use crate::model::auth_rule::{AuthRule, RuleDraft};
use crate::repo::extension_repo::ExtensionRepository;
use crate::repo::rule_repo::RuleRepository;
use crate::repo::RepoError;
use indexmap::IndexMap;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// What happens when a boot hook of one extension fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BootFailurePolicy {
    /// Return the first hook error; later extensions are not booted.
    #[default]
    FailFast,
    /// Record the error in [`BootReport::failures`] and keep booting.
    Isolate,
}

/// Lifecycle stage a hook error was raised from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootStage {
    Booting,
    Boot,
    Booted,
}

impl BootStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Booting => "booting",
            Self::Boot => "boot",
            Self::Booted => "booted",
        }
    }
}

/// Boot sequence errors.
#[derive(Debug)]
pub enum BootError {
    /// Extension records could not be read.
    Store(RepoError),
    /// An extension's own lifecycle code failed.
    Hook {
        extension: String,
        stage: BootStage,
        source: BootHookError,
    },
}

impl Display for BootError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "failed to read extension records: {err}"),
            Self::Hook {
                extension,
                stage,
                source,
            } => write!(
                f,
                "extension `{extension}` failed during {}: {source}",
                stage.as_str()
            ),
        }
    }
}

impl Error for BootError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Hook { source, .. } => Some(source),
        }
    }
}

impl From<RepoError> for BootError {
    fn from(value: RepoError) -> Self {
        Self::Store(value)
    }
}

/// Why a persisted extension did not boot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
    EmptyClassName,
    Unresolvable(ResolveError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedExtension {
    pub name: String,
    pub reason: SkipReason,
}

/// Outcome of [`ExtensionRegistry::discover_and_boot`].
#[derive(Debug, Default)]
pub struct BootReport {
    /// Names of extensions whose full lifecycle ran, in boot order.
    pub booted: Vec<String>,
    pub skipped: Vec<SkippedExtension>,
    /// Hook failures collected under [`BootFailurePolicy::Isolate`].
    pub failures: Vec<BootError>,
}

/// Result of the registry-or-identifier lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtendLookup {
    /// The name is registered under this identifier.
    Found(String),
    /// The name is not registered; carries the whole registry.
    All(IndexMap<String, String>),
}

/// Registry of extension names and the boot lifecycle driver.
#[derive(Debug, Default)]
pub struct ExtensionRegistry {
    extensions: IndexMap<String, String>,
    container: ServiceContainer,
    failure_policy: BootFailurePolicy,
    max_rule_depth: Option<usize>,
}

impl ExtensionRegistry {
    pub fn new(container: ServiceContainer) -> Self {
        Self {
            container,
            ..Self::default()
        }
    }

    pub fn with_failure_policy(mut self, policy: BootFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_max_rule_depth(mut self, max_depth: usize) -> Self {
        self.max_rule_depth = Some(max_depth);
        self
    }

    pub fn failure_policy(&self) -> BootFailurePolicy {
        self.failure_policy
    }

    pub fn container(&self) -> &ServiceContainer {
        &self.container
    }

    pub fn container_mut(&mut self) -> &mut ServiceContainer {
        &mut self.container
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Registers `name` under `class_name`, replacing any previous identifier.
    pub fn extend(&mut self, name: impl Into<String>, class_name: impl Into<String>) {
        let name = name.into();
        let class_name = class_name.into();
        debug!(
            "event=extension_extend module=extension status=ok name={} class_name={}",
            name, class_name
        );
        self.extensions.insert(name, class_name);
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.extensions.get(name).map(String::as_str)
    }

    /// Looks up each name in input order.
    pub fn get_many<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> IndexMap<String, Option<String>> {
        names
            .into_iter()
            .map(|name| (name.to_string(), self.get(name).map(str::to_string)))
            .collect()
    }

    /// All registrations in registration order.
    pub fn all(&self) -> &IndexMap<String, String> {
        &self.extensions
    }

    /// Returns the identifier for `name`, or the whole registry when `name`
    /// is not registered.
    pub fn get_extend(&self, name: &str) -> ExtendLookup {
        match self.extensions.get(name) {
            Some(class_name) => ExtendLookup::Found(class_name.clone()),
            None => ExtendLookup::All(self.extensions.clone()),
        }
    }

    /// Applies [`ExtensionRegistry::get_extend`] to each name in input order.
    pub fn get_extend_many<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> IndexMap<String, ExtendLookup> {
        names
            .into_iter()
            .map(|name| (name.to_string(), self.get_extend(name)))
            .collect()
    }

    /// Removes `name`, returning its identifier if it was registered.
    pub fn forget(&mut self, name: &str) -> Option<String> {
        let removed = self.extensions.shift_remove(name);
        if removed.is_some() {
            debug!("event=extension_forget module=extension status=ok name={name}");
        }
        removed
    }

    pub fn forget_many<'a>(
        &mut self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> IndexMap<String, Option<String>> {
        names
            .into_iter()
            .map(|name| (name.to_string(), self.forget(name)))
            .collect()
    }

    /// Builds a fresh service for an implementation identifier.
    pub fn resolve_instance(
        &self,
        class_name: &str,
    ) -> Result<Box<dyn ExtensionService>, ResolveError> {
        self.container.resolve_extension(class_name)
    }

    /// Builds a fresh service for a registered extension name.
    pub fn resolve_extension(
        &self,
        name: &str,
    ) -> Result<Box<dyn ExtensionService>, ResolveError> {
        let class_name = self
            .get(name)
            .ok_or_else(|| ResolveError::UnregisteredName(name.to_string()))?;
        self.resolve_instance(class_name)
    }

    /// Resolves `class_name` and dispatches `method` with positional `args`.
    ///
    /// Returns `None` when either argument is blank, resolution fails or the
    /// service has no such method.
    pub fn invoke_method(&self, class_name: &str, method: &str, args: &[Value]) -> Option<Value> {
        if class_name.trim().is_empty() || method.trim().is_empty() {
            return None;
        }
        let mut service = self.resolve_instance(class_name).ok()?;
        service.call_method(method, args)
    }

    /// Describes a registered extension from its declared metadata.
    pub fn describe(&self, name: &str) -> Option<ExtensionInfo> {
        let service = match self.resolve_extension(name) {
            Ok(service) => service,
            Err(err) => {
                debug!("event=extension_describe module=extension status=skip name={name} reason={err}");
                return None;
            }
        };
        let info = service.info()?;
        Some(ExtensionInfo::from_map(info, self.get(name)))
    }

    /// Declared `config` of a registered extension; empty on any failure.
    pub fn describe_config(&self, name: &str) -> InfoMap {
        self.describe(name)
            .map(|info| info.config)
            .unwrap_or_default()
    }

    /// Describes every registered extension in registration order, dropping
    /// those that cannot be described.
    pub fn list_all(&self) -> Vec<ExtensionInfo> {
        self.extensions
            .keys()
            .filter_map(|name| self.describe(name))
            .collect()
    }

    /// Returns whether the required metadata fields are present and non-empty.
    pub fn validate_info(&self, metadata: &InfoMap) -> bool {
        info::validate_info(metadata)
    }

    /// Resolves every enabled persisted extension and runs its lifecycle.
    ///
    /// A missing store boots nothing. Disabled records, records without an
    /// identifier and unresolvable identifiers are skipped. Hook failures are
    /// handled by the configured [`BootFailurePolicy`].
    pub fn discover_and_boot(
        &self,
        store: &impl ExtensionRepository,
    ) -> Result<BootReport, BootError> {
        let mut report = BootReport::default();
        if !store.store_exists()? {
            info!("event=extension_boot module=extension status=skip reason=store_missing");
            return Ok(report);
        }

        let mut services = Vec::new();
        for record in store.list_extensions()? {
            if !record.status.is_enabled() {
                report.skipped.push(SkippedExtension {
                    name: record.name,
                    reason: SkipReason::Disabled,
                });
                continue;
            }
            if record.class_name.trim().is_empty() {
                report.skipped.push(SkippedExtension {
                    name: record.name,
                    reason: SkipReason::EmptyClassName,
                });
                continue;
            }
            match self.resolve_instance(&record.class_name) {
                Ok(service) => services.push((record, service)),
                Err(err) => {
                    warn!(
                        "event=extension_resolve module=extension status=error name={} class_name={} error={}",
                        record.name, record.class_name, err
                    );
                    report.skipped.push(SkippedExtension {
                        name: record.name,
                        reason: SkipReason::Unresolvable(err),
                    });
                }
            }
        }

        for (record, mut service) in services {
            match self.boot_service(&record.name, service.as_mut()) {
                Ok(()) => report.booted.push(record.name),
                Err(err) => match self.failure_policy {
                    BootFailurePolicy::FailFast => {
                        warn!("event=extension_boot module=extension status=error policy=fail_fast error={err}");
                        return Err(err);
                    }
                    BootFailurePolicy::Isolate => {
                        warn!("event=extension_boot module=extension status=error policy=isolate error={err}");
                        report.failures.push(err);
                    }
                },
            }
        }

        info!(
            "event=extension_boot module=extension status=ok booted={} skipped={} failed={}",
            report.booted.len(),
            report.skipped.len(),
            report.failures.len()
        );
        Ok(report)
    }

    fn boot_service(
        &self,
        name: &str,
        service: &mut dyn ExtensionService,
    ) -> Result<(), BootError> {
        let hook_error = |stage: BootStage| {
            move |source: BootHookError| BootError::Hook {
                extension: name.to_string(),
                stage,
                source,
            }
        };

        service
            .call_booting_callbacks()
            .map_err(hook_error(BootStage::Booting))?;
        service
            .boot(&self.container)
            .map_err(hook_error(BootStage::Boot))?;
        service
            .call_booted_callbacks()
            .map_err(hook_error(BootStage::Booted))?;
        debug!("event=extension_boot module=extension status=ok name={name}");
        Ok(())
    }

    /// Creates `data` under `parent_id` and `children` beneath it.
    ///
    /// Returns `Ok(None)` for an empty draft.
    pub fn create_rule<R: RuleRepository>(
        &self,
        store: &R,
        data: &RuleDraft,
        parent_id: i64,
        children: &[RuleDraft],
    ) -> Result<Option<AuthRule>, RuleTreeError> {
        self.rule_builder(store)
            .create_rule(data, parent_id, children)
    }

    /// Creates `draft` with its own nested `children` under `parent_id`.
    pub fn create_rule_tree<R: RuleRepository>(
        &self,
        store: &R,
        draft: &RuleDraft,
        parent_id: i64,
    ) -> Result<Option<AuthRule>, RuleTreeError> {
        self.rule_builder(store).create_rule_tree(draft, parent_id)
    }

    fn rule_builder<'r, R: RuleRepository>(&self, store: &'r R) -> RuleTreeBuilder<'r, R> {
        RuleTreeBuilder::new(store)
            .with_max_depth(self.max_rule_depth.unwrap_or(DEFAULT_MAX_RULE_DEPTH))
    }
}

#[cfg(test)]
mod tests {
    use super::{ExtendLookup, ExtensionRegistry};
    use crate::extension::container::{ResolveError, ServiceContainer};
    use crate::extension::info::InfoMap;
    use crate::extension::service::ExtensionService;
    use serde_json::{json, Value};

    struct Echo;

    impl ExtensionService for Echo {
        fn info(&self) -> Option<&InfoMap> {
            None
        }

        fn call_method(&mut self, method: &str, args: &[Value]) -> Option<Value> {
            match method {
                "echo" => Some(Value::Array(args.to_vec())),
                "nothing" => Some(Value::Null),
                _ => None,
            }
        }
    }

    fn registry() -> ExtensionRegistry {
        let mut container = ServiceContainer::new();
        container.bind_extension("echo.service", |_| Echo);
        ExtensionRegistry::new(container)
    }

    #[test]
    fn last_registration_wins_and_keeps_position() {
        let mut registry = registry();
        registry.extend("a", "x");
        registry.extend("b", "y");
        registry.extend("a", "z");

        assert_eq!(registry.get("a"), Some("z"));
        assert_eq!(
            registry.all().keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
    }

    #[test]
    fn get_extend_falls_back_to_whole_registry() {
        let mut registry = registry();
        registry.extend("n1", "id1");

        assert_eq!(registry.get_extend("n1"), ExtendLookup::Found("id1".to_string()));
        assert_eq!(
            registry.get_extend("absent"),
            ExtendLookup::All(registry.all().clone())
        );

        let many = registry.get_extend_many(["n1", "n2"]);
        assert_eq!(
            many.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["n1", "n2"]
        );
        assert_eq!(many["n1"], ExtendLookup::Found("id1".to_string()));
        assert_eq!(many["n2"], ExtendLookup::All(registry.all().clone()));
    }

    #[test]
    fn get_many_reports_absence_per_name() {
        let mut registry = registry();
        registry.extend("n1", "id1");
        let many = registry.get_many(["n2", "n1"]);
        assert_eq!(
            many.into_iter().collect::<Vec<_>>(),
            vec![
                ("n2".to_string(), None),
                ("n1".to_string(), Some("id1".to_string())),
            ]
        );
    }

    #[test]
    fn forget_removes_once() {
        let mut registry = registry();
        registry.extend("n1", "id1");
        registry.extend("n2", "id2");

        assert_eq!(registry.forget("n1"), Some("id1".to_string()));
        assert_eq!(registry.forget("n1"), None);
        assert!(matches!(registry.get_extend("n1"), ExtendLookup::All(all) if all.len() == 1));

        let removed = registry.forget_many(["n2", "n3"]);
        assert_eq!(removed["n2"], Some("id2".to_string()));
        assert_eq!(removed["n3"], None);
        assert!(registry.is_empty());
    }

    #[test]
    fn invoke_method_returns_result_verbatim_or_none() {
        let registry = registry();
        assert_eq!(
            registry.invoke_method("echo.service", "echo", &[json!(1), json!("two")]),
            Some(json!([1, "two"]))
        );
        assert_eq!(
            registry.invoke_method("echo.service", "nothing", &[]),
            Some(Value::Null)
        );
        assert_eq!(registry.invoke_method("echo.service", "absent", &[]), None);
        assert_eq!(registry.invoke_method("missing", "echo", &[]), None);
        assert_eq!(registry.invoke_method("echo.service", " ", &[]), None);
    }

    #[test]
    fn resolve_extension_requires_registration() {
        let registry = registry();
        assert_eq!(
            registry.resolve_extension("echo").err(),
            Some(ResolveError::UnregisteredName("echo".to_string()))
        );
    }

    #[test]
    fn service_without_info_is_not_described() {
        let mut registry = registry();
        registry.extend("echo", "echo.service");
        assert!(registry.resolve_extension("echo").is_ok());
        assert!(registry.describe("echo").is_none());
        assert!(registry.describe_config("echo").is_empty());
        assert!(registry.list_all().is_empty());
    }
}
