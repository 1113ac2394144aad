//! Filesystem-backed template source provider.
//!
//! Templates are looked up across a list of search roots, first match wins.
//! Besides the main roots, additional roots can be registered under a
//! namespace and addressed as `@namespace/template.html`, mirroring the
//! plugin view directories of the surrounding application.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::Error;
use crate::{SourceContext, TemplateSource};

#[cfg(test)]
#[path = "filesystem_tests.rs"]
mod tests;

/// Search-path configuration for a [`FilesystemSource`], typically
/// deserialized from the application settings file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Main-namespace search roots, in priority order.
    pub paths: Vec<PathBuf>,
    /// Namespace name to search roots, addressed as `@namespace/...`.
    #[serde(default)]
    pub namespaces: HashMap<String, Vec<PathBuf>>,
}

/// Template source provider reading from configured directories.
#[derive(Debug, Default)]
pub struct FilesystemSource {
    paths: Vec<PathBuf>,
    namespaced: HashMap<String, Vec<PathBuf>>,
}

impl FilesystemSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &SourceConfig) -> Self {
        let mut source = Self::new();
        for path in &config.paths {
            source.add_path(path);
        }
        for (namespace, paths) in &config.namespaces {
            for path in paths {
                source.add_namespaced_path(namespace, path);
            }
        }
        source
    }

    /// Appends a main-namespace search root.
    pub fn add_path(&mut self, path: impl Into<PathBuf>) {
        self.paths.push(path.into());
    }

    /// Appends a search root under `@namespace`.
    pub fn add_namespaced_path(&mut self, namespace: &str, path: impl Into<PathBuf>) {
        self.namespaced
            .entry(namespace.to_string())
            .or_default()
            .push(path.into());
    }

    /// Main-namespace search roots, in priority order.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Registered namespace names.
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.namespaced.keys().map(String::as_str)
    }

    /// Search roots registered under `namespace`, if any.
    pub fn namespaced_paths(&self, namespace: &str) -> Option<&[PathBuf]> {
        self.namespaced.get(namespace).map(Vec::as_slice)
    }

    /// Resolves a template name to the first matching file across the
    /// relevant search roots.
    fn find(&self, name: &str) -> Result<Option<PathBuf>, Error> {
        validate_name(name)?;
        let (roots, relative) = match split_namespace(name) {
            Some((namespace, relative)) => {
                let Some(roots) = self.namespaced.get(namespace) else {
                    return Ok(None);
                };
                (roots.as_slice(), relative)
            }
            None => (self.paths.as_slice(), name),
        };

        for root in roots {
            let candidate = root.join(relative);
            if candidate.is_file() {
                debug!(name, path = %candidate.display(), "template resolved");
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }
}

impl TemplateSource for FilesystemSource {
    fn exists(&self, name: &str) -> bool {
        matches!(self.find(name), Ok(Some(_)))
    }

    fn source_context(&self, name: &str) -> Result<SourceContext, Error> {
        let path = self
            .find(name)?
            .ok_or_else(|| Error::NotFound(name.to_string()))?;
        let bytes = fs::read(&path)?;
        let code =
            String::from_utf8(bytes).map_err(|_| Error::InvalidUtf8(name.to_string()))?;
        Ok(SourceContext {
            code,
            name: name.to_string(),
            path,
        })
    }

    fn cache_key(&self, name: &str) -> Result<String, Error> {
        let path = self
            .find(name)?
            .ok_or_else(|| Error::NotFound(name.to_string()))?;
        Ok(path.display().to_string())
    }

    fn is_fresh(&self, name: &str, since: DateTime<Utc>) -> Result<bool, Error> {
        let path = self
            .find(name)?
            .ok_or_else(|| Error::NotFound(name.to_string()))?;
        Ok(modification_time(&path)? <= since)
    }
}

/// Splits `@namespace/rest` names; returns `None` for main-namespace names.
fn split_namespace(name: &str) -> Option<(&str, &str)> {
    let stripped = name.strip_prefix('@')?;
    let (namespace, relative) = stripped.split_once('/')?;
    Some((namespace, relative))
}

/// Rejects names that would escape the search roots.
fn validate_name(name: &str) -> Result<(), Error> {
    let invalid = name.is_empty()
        || name.starts_with('/')
        || name.contains('\\')
        || name.split('/').any(|segment| segment == "..");
    if invalid {
        return Err(Error::InvalidName(name.to_string()));
    }
    Ok(())
}

pub(crate) fn modification_time(path: &Path) -> Result<DateTime<Utc>, Error> {
    let modified = fs::metadata(path)?.modified()?;
    Ok(DateTime::<Utc>::from(modified))
}
