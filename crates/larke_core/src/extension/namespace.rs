//! Namespace prefix to directory mapping for extension resources.
//!
//! # Responsibility
//! - Map dotted identifier prefixes (`vendor.demo.`) to one or more
//!   directories, PSR-4 style.
//! - Map the empty prefix to the extension root so any identifier can be
//!   located under it.
//!
//! # Invariants
//! - Non-empty prefixes are dot-separated identifier segments ending in `.`.
//! - Lookup prefers the longest matching prefix, then the fallback paths.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

static NAMESPACE_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*\.)+$").expect("valid namespace prefix regex")
});

/// Namespace registration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceError {
    InvalidPrefix(String),
}

impl Display for NamespaceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPrefix(prefix) => write!(
                f,
                "namespace prefix is invalid: `{prefix}` (expected dotted segments ending in `.`)"
            ),
        }
    }
}

impl Error for NamespaceError {}

/// Prefix to paths table consulted when locating extension resources.
#[derive(Debug, Clone, Default)]
pub struct NamespaceMap {
    prefixes: BTreeMap<String, Vec<PathBuf>>,
    fallback: Vec<PathBuf>,
}

impl NamespaceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the paths registered for `prefix`.
    ///
    /// The empty prefix replaces the fallback paths.
    pub fn set_psr4<P: AsRef<Path>>(
        &mut self,
        prefix: &str,
        paths: impl IntoIterator<Item = P>,
    ) -> Result<&mut Self, NamespaceError> {
        let paths: Vec<PathBuf> = paths
            .into_iter()
            .map(|path| path.as_ref().to_path_buf())
            .collect();
        if prefix.is_empty() {
            debug!(
                "event=namespace_set module=extension status=ok prefix=<fallback> paths={}",
                paths.len()
            );
            self.fallback = paths;
            return Ok(self);
        }
        if !NAMESPACE_PREFIX_RE.is_match(prefix) {
            return Err(NamespaceError::InvalidPrefix(prefix.to_string()));
        }
        debug!(
            "event=namespace_set module=extension status=ok prefix={} paths={}",
            prefix,
            paths.len()
        );
        self.prefixes.insert(prefix.to_string(), paths);
        Ok(self)
    }

    /// Maps the empty prefix to the extension root directory.
    pub fn register_extension_namespaces(&mut self, extension_root: impl AsRef<Path>) {
        self.fallback = vec![extension_root.as_ref().to_path_buf()];
    }

    pub fn paths_for(&self, prefix: &str) -> Option<&[PathBuf]> {
        if prefix.is_empty() {
            return Some(self.fallback.as_slice());
        }
        self.prefixes.get(prefix).map(Vec::as_slice)
    }

    /// Candidate paths for `identifier`, most specific prefix first.
    pub fn candidates(&self, identifier: &str) -> Vec<PathBuf> {
        let mut matches: Vec<(&String, &Vec<PathBuf>)> = self
            .prefixes
            .iter()
            .filter(|(prefix, _)| identifier.starts_with(prefix.as_str()))
            .collect();
        matches.sort_by_key(|(prefix, _)| std::cmp::Reverse(prefix.len()));

        let mut result = Vec::new();
        for (prefix, paths) in matches {
            let relative = relative_path(&identifier[prefix.len()..]);
            result.extend(paths.iter().map(|path| path.join(&relative)));
        }
        let relative = relative_path(identifier);
        result.extend(self.fallback.iter().map(|path| path.join(&relative)));
        result
    }

    /// First candidate path for `identifier` that exists on disk.
    pub fn locate(&self, identifier: &str) -> Option<PathBuf> {
        self.candidates(identifier)
            .into_iter()
            .find(|path| path.exists())
    }
}

fn relative_path(rest: &str) -> PathBuf {
    rest.split('.').filter(|segment| !segment.is_empty()).collect()
}
