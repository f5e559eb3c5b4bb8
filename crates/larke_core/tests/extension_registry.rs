use larke_core::{
    validate_info, ExtendLookup, ExtensionRegistry, ExtensionService, InfoMap, ServiceContainer,
};
use serde_json::{json, Value};

struct DemoExtension {
    info: InfoMap,
}

impl DemoExtension {
    fn new(name: &str) -> Self {
        let info = match json!({
            "name": name,
            "title": "Demo",
            "introduce": "Demo extension",
            "author": "larke",
            "authorsite": "https://example.com",
            "version": "1.0.2",
            "adaptation": "1.0.*",
            "require_extension": ["base"],
            "config": {"page_size": 20},
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        Self { info }
    }
}

impl ExtensionService for DemoExtension {
    fn info(&self) -> Option<&InfoMap> {
        Some(&self.info)
    }
}

fn registry() -> ExtensionRegistry {
    let mut container = ServiceContainer::new();
    container.bind_extension("demo.service", |_| DemoExtension::new("demo"));
    container.bind_extension("other.service", |_| DemoExtension::new("other"));
    container.instance("plain.value", "not an extension".to_string());
    ExtensionRegistry::new(container)
}

#[test]
fn describe_projects_declared_metadata() {
    let mut registry = registry();
    registry.extend("demo", "demo.service");

    let info = registry.describe("demo").expect("demo is describable");
    assert_eq!(info.name.as_deref(), Some("demo"));
    assert_eq!(info.author_site.as_deref(), Some("https://example.com"));
    assert!(info.author_email.is_none());
    assert_eq!(info.required_extensions, vec!["base".to_string()]);
    assert_eq!(info.class_name.as_deref(), Some("demo.service"));
    assert_eq!(registry.describe_config("demo")["page_size"], json!(20));
}

#[test]
fn describe_is_empty_for_unregistered_or_nonconforming() {
    let mut registry = registry();
    registry.extend("plain", "plain.value");
    registry.extend("ghost", "ghost.service");

    assert!(registry.describe("missing").is_none());
    assert!(registry.describe("plain").is_none());
    assert!(registry.describe("ghost").is_none());
    assert!(registry.describe_config("plain").is_empty());
}

#[test]
fn list_all_keeps_registration_order_and_drops_failures() {
    let mut registry = registry();
    registry.extend("other", "other.service");
    registry.extend("broken", "ghost.service");
    registry.extend("demo", "demo.service");

    let names: Vec<Option<String>> = registry.list_all().into_iter().map(|info| info.name).collect();
    assert_eq!(
        names,
        vec![Some("other".to_string()), Some("demo".to_string())]
    );
}

#[test]
fn declared_metadata_passes_validation() {
    let registry = registry();
    let demo = DemoExtension::new("demo");
    assert!(registry.validate_info(&demo.info));
    assert!(validate_info(&demo.info));

    let mut incomplete = demo.info.clone();
    incomplete.remove("adaptation");
    assert!(!registry.validate_info(&incomplete));
    assert!(!registry.validate_info(&InfoMap::new()));
}

#[test]
fn absent_lookup_returns_entire_registry() {
    let mut registry = registry();
    registry.extend("n1", "demo.service");
    registry.extend("n2", "other.service");

    match registry.get_extend("absent") {
        ExtendLookup::All(all) => assert_eq!(&all, registry.all()),
        other => panic!("expected whole registry, got {other:?}"),
    }
    assert!(registry.get("absent").is_none());
}

#[test]
fn re_registration_after_forget_resolves_again() {
    let mut registry = registry();
    registry.extend("demo", "demo.service");
    assert_eq!(registry.forget("demo").as_deref(), Some("demo.service"));
    assert!(registry.describe("demo").is_none());

    registry.extend("demo", "other.service");
    assert_eq!(
        registry.describe("demo").and_then(|info| info.name).as_deref(),
        Some("other")
    );
}
