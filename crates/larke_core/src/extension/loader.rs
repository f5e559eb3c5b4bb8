//! Extension directory discovery and bootstrap manifests.
//!
//! # Responsibility
//! - Walk the immediate subdirectories of the extension root.
//! - Apply each subdirectory's bootstrap manifest exactly once: register its
//!   extensions and namespaces.
//!
//! # Invariants
//! - Subdirectories are visited in sorted path order.
//! - A bootstrap path already applied by this loader is never applied again.
//! - I/O and parse failures abort the walk and propagate.

use crate::extension::kernel::ExtensionRegistry;
use crate::extension::namespace::{NamespaceError, NamespaceMap};
use indexmap::IndexMap;
use log::{debug, info};
use serde::Deserialize;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Default bootstrap manifest file name inside each extension directory.
pub const DEFAULT_BOOTSTRAP_FILE: &str = "bootstrap.json";

/// Declarations carried by one extension directory's bootstrap manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BootstrapManifest {
    /// `name -> implementation identifier` registrations.
    #[serde(default)]
    pub extensions: IndexMap<String, String>,
    /// `prefix -> paths`, paths relative to the extension directory.
    #[serde(default)]
    pub namespaces: IndexMap<String, Vec<PathBuf>>,
}

/// Directory loading errors.
#[derive(Debug)]
pub enum LoaderError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    Namespace {
        path: PathBuf,
        source: NamespaceError,
    },
}

impl Display for LoaderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "failed to read `{}`: {source}", path.display()),
            Self::Parse { path, source } => {
                write!(f, "invalid bootstrap manifest `{}`: {source}", path.display())
            }
            Self::Namespace { path, source } => {
                write!(f, "bootstrap manifest `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for LoaderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Namespace { source, .. } => Some(source),
        }
    }
}

/// Loads extension directories below one root.
#[derive(Debug, Clone)]
pub struct ExtensionLoader {
    root: PathBuf,
    bootstrap_file: String,
    loaded: HashSet<PathBuf>,
}

impl ExtensionLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            bootstrap_file: DEFAULT_BOOTSTRAP_FILE.to_string(),
            loaded: HashSet::new(),
        }
    }

    pub fn with_bootstrap_file(mut self, file_name: impl Into<String>) -> Self {
        self.bootstrap_file = file_name.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Extension root, or `sub` below it when non-empty.
    pub fn extension_directory(&self, sub: &str) -> PathBuf {
        if sub.is_empty() {
            self.root.clone()
        } else {
            self.root.join(sub)
        }
    }

    /// Number of bootstrap manifests applied so far.
    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }

    /// Maps the empty namespace prefix to the extension root.
    pub fn register_extension_namespace(&self, namespaces: &mut NamespaceMap) {
        namespaces.register_extension_namespaces(&self.root);
    }

    /// Applies every not-yet-applied bootstrap manifest below the root.
    pub fn load_extensions(
        &mut self,
        registry: &mut ExtensionRegistry,
        namespaces: &mut NamespaceMap,
    ) -> Result<&mut Self, LoaderError> {
        let mut dirs = Vec::new();
        let entries = std::fs::read_dir(&self.root).map_err(|source| LoaderError::Io {
            path: self.root.clone(),
            source,
        })?;
        for entry in entries {
            let entry = entry.map_err(|source| LoaderError::Io {
                path: self.root.clone(),
                source,
            })?;
            let path = entry.path();
            if path.is_dir() {
                dirs.push(path);
            }
        }
        dirs.sort();

        let mut applied = 0usize;
        for dir in dirs {
            let bootstrap = dir.join(&self.bootstrap_file);
            if !bootstrap.is_file() || self.loaded.contains(&bootstrap) {
                continue;
            }
            let manifest = read_manifest(&bootstrap)?;
            apply_manifest(&dir, &bootstrap, &manifest, registry, namespaces)?;
            self.loaded.insert(bootstrap);
            applied += 1;
        }

        info!(
            "event=extension_load module=extension status=ok root={} applied={} total_loaded={}",
            self.root.display(),
            applied,
            self.loaded.len()
        );
        Ok(self)
    }
}

fn read_manifest(path: &Path) -> Result<BootstrapManifest, LoaderError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoaderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| LoaderError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn apply_manifest(
    dir: &Path,
    bootstrap: &Path,
    manifest: &BootstrapManifest,
    registry: &mut ExtensionRegistry,
    namespaces: &mut NamespaceMap,
) -> Result<(), LoaderError> {
    for (prefix, paths) in &manifest.namespaces {
        namespaces
            .set_psr4(prefix, paths.iter().map(|path| dir.join(path)))
            .map_err(|source| LoaderError::Namespace {
                path: bootstrap.to_path_buf(),
                source,
            })?;
    }
    for (name, class_name) in &manifest.extensions {
        registry.extend(name.as_str(), class_name.as_str());
    }
    debug!(
        "event=extension_bootstrap module=extension status=ok path={} extensions={} namespaces={}",
        bootstrap.display(),
        manifest.extensions.len(),
        manifest.namespaces.len()
    );
    Ok(())
}
