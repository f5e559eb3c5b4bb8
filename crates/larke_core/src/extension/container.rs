//! Identifier-keyed service container.
//!
//! # Responsibility
//! - Map implementation identifiers to factories.
//! - Build extension services and their constructor dependencies on demand.
//!
//! # Invariants
//! - Every `make`/`resolve_extension` call runs the factory again; the
//!   container never caches built values.
//! - Identifiers match bindings exactly; surrounding whitespace is not
//!   stripped.
//! - A binding that does not produce an extension service is reported as
//!   `ResolveError::NotExtensionService`, never as a panic.

use crate::extension::service::ExtensionService;
use std::any::Any;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

type Factory = Arc<dyn Fn(&ServiceContainer) -> Box<dyn Any + Send> + Send + Sync>;

/// Resolution failure kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    EmptyIdentifier,
    /// The extension name is not registered.
    UnregisteredName(String),
    /// No binding exists for the identifier.
    UnknownIdentifier(String),
    /// The binding exists but does not build an extension service.
    NotExtensionService(String),
}

impl Display for ResolveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyIdentifier => write!(f, "implementation identifier must not be empty"),
            Self::UnregisteredName(name) => write!(f, "extension is not registered: {name}"),
            Self::UnknownIdentifier(id) => write!(f, "no binding for identifier: {id}"),
            Self::NotExtensionService(id) => {
                write!(f, "binding is not an extension service: {id}")
            }
        }
    }
}

impl Error for ResolveError {}

/// Service container used to resolve implementation identifiers.
#[derive(Clone, Default)]
pub struct ServiceContainer {
    bindings: HashMap<String, Factory>,
}

impl ServiceContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `id` to a factory building any value.
    pub fn bind<T, F>(&mut self, id: impl Into<String>, factory: F)
    where
        T: Any + Send,
        F: Fn(&ServiceContainer) -> T + Send + Sync + 'static,
    {
        self.bindings.insert(
            id.into(),
            Arc::new(move |container: &ServiceContainer| {
                Box::new(factory(container)) as Box<dyn Any + Send>
            }),
        );
    }

    /// Binds `id` to a factory building an extension service.
    pub fn bind_extension<S, F>(&mut self, id: impl Into<String>, factory: F)
    where
        S: ExtensionService + 'static,
        F: Fn(&ServiceContainer) -> S + Send + Sync + 'static,
    {
        self.bind(id, move |container| {
            Box::new(factory(container)) as Box<dyn ExtensionService>
        });
    }

    /// Binds `id` to a shared value handed out by clone.
    pub fn instance<T>(&mut self, id: impl Into<String>, value: T)
    where
        T: Any + Clone + Send + Sync,
    {
        self.bind(id, move |_| value.clone());
    }

    pub fn has(&self, id: &str) -> bool {
        self.bindings.contains_key(id)
    }

    /// Removes a binding, returning whether one existed.
    pub fn unbind(&mut self, id: &str) -> bool {
        self.bindings.remove(id).is_some()
    }

    /// Builds the value bound to `id` as `T`.
    ///
    /// Returns `None` when nothing is bound or the binding builds another type.
    pub fn make<T: Any>(&self, id: &str) -> Option<T> {
        let factory = self.bindings.get(id)?;
        factory(self).downcast::<T>().ok().map(|value| *value)
    }

    /// Builds the extension service bound to `id`.
    pub fn resolve_extension(&self, id: &str) -> Result<Box<dyn ExtensionService>, ResolveError> {
        if id.trim().is_empty() {
            return Err(ResolveError::EmptyIdentifier);
        }
        let factory = self
            .bindings
            .get(id)
            .ok_or_else(|| ResolveError::UnknownIdentifier(id.to_string()))?;
        factory(self)
            .downcast::<Box<dyn ExtensionService>>()
            .map(|service| *service)
            .map_err(|_| ResolveError::NotExtensionService(id.to_string()))
    }
}

impl Debug for ServiceContainer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<&String> = self.bindings.keys().collect();
        ids.sort();
        f.debug_struct("ServiceContainer")
            .field("bindings", &ids)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{ResolveError, ServiceContainer};
    use crate::extension::info::InfoMap;
    use crate::extension::service::ExtensionService;

    struct Greeter {
        info: InfoMap,
        greeting: String,
    }

    impl ExtensionService for Greeter {
        fn info(&self) -> Option<&InfoMap> {
            Some(&self.info)
        }
    }

    #[test]
    fn factories_pull_dependencies_from_container() {
        let mut container = ServiceContainer::new();
        container.instance("greeting", "hello".to_string());
        container.bind_extension("greeter", |c| Greeter {
            info: InfoMap::new(),
            greeting: c.make::<String>("greeting").unwrap_or_default(),
        });

        assert_eq!(container.make::<String>("greeting").as_deref(), Some("hello"));
        assert!(container.resolve_extension("greeter").is_ok());

        let mut direct = ServiceContainer::new();
        direct.bind("greeter.concrete", |c| Greeter {
            info: InfoMap::new(),
            greeting: c.make::<String>("greeting").unwrap_or_else(|| "none".to_string()),
        });
        let greeter = direct.make::<Greeter>("greeter.concrete").unwrap();
        assert_eq!(greeter.greeting, "none");
    }

    #[test]
    fn resolve_reports_failure_kinds() {
        let mut container = ServiceContainer::new();
        container.instance("plain", 7_u32);

        assert_eq!(
            container.resolve_extension("  ").err(),
            Some(ResolveError::EmptyIdentifier)
        );
        assert_eq!(
            container.resolve_extension("missing").err(),
            Some(ResolveError::UnknownIdentifier("missing".to_string()))
        );
        assert_eq!(
            container.resolve_extension("plain").err(),
            Some(ResolveError::NotExtensionService("plain".to_string()))
        );
    }

    #[test]
    fn identifiers_are_matched_exactly() {
        let mut container = ServiceContainer::new();
        container.bind_extension("alpha.service", |_| Greeter {
            info: InfoMap::new(),
            greeting: String::new(),
        });

        assert!(container.resolve_extension("alpha.service").is_ok());
        assert_eq!(
            container.resolve_extension(" alpha.service ").err(),
            Some(ResolveError::UnknownIdentifier(" alpha.service ".to_string()))
        );
    }

    #[test]
    fn make_with_wrong_type_is_none() {
        let mut container = ServiceContainer::new();
        container.instance("count", 3_i64);
        assert_eq!(container.make::<i64>("count"), Some(3));
        assert!(container.make::<String>("count").is_none());
        assert!(container.unbind("count"));
        assert!(!container.has("count"));
    }
}
