//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `larke_core` linkage.
//! - With a config path argument, load the extension root and print the
//!   registered extensions.

use larke_core::{LarkeConfig, NamespaceMap, ServiceContainer};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("larke_core ping={}", larke_core::ping());
    println!("larke_core version={}", larke_core::core_version());

    let Some(config_path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };

    match load_and_report(&config_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn load_and_report(config_path: &str) -> Result<(), String> {
    let config = LarkeConfig::load(config_path).map_err(|err| err.to_string())?;
    config.init_logging()?;

    let mut registry = config.build_registry(ServiceContainer::new());
    let mut namespaces = NamespaceMap::new();
    let mut loader = config.build_loader();
    loader.register_extension_namespace(&mut namespaces);
    loader
        .load_extensions(&mut registry, &mut namespaces)
        .map_err(|err| err.to_string())?;
    log::info!(
        "event=cli_load module=cli status=ok extensions={}",
        registry.len()
    );

    println!(
        "extension_root={} bootstraps={}",
        loader.root().display(),
        loader.loaded_count()
    );
    for (name, class_name) in registry.all() {
        println!("extension name={name} class_name={class_name}");
    }
    Ok(())
}
