//! Fallback-aware template loading for FSFramework's Twig stack.
//!
//! The application serves two generations of view files side by side:
//! legacy RainTPL templates (`.html`) and native Twig templates
//! (`.html.twig`). [`LegacyLoader`] decorates any [`TemplateSource`] so the
//! rendering engine can ask for either spelling:
//!
//! - a missing `.html` template falls back to its `.html.twig` sibling,
//!   served as-is;
//! - a missing `.html.twig` template falls back to its `.html` sibling,
//!   translated to Twig syntax by [`rain_to_twig`] on the way out;
//! - root-level views the configured search paths cannot see are read
//!   directly from a conventional `{root}/view/` directory as a fail-safe.
//!
//! Cache keys of translated templates are prefixed `legacy_` so a shared
//! template cache never confuses a translated source with a native one.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use rain_to_twig::RainToTwig;
use tracing::{debug, warn};

mod errors;
mod filesystem;

pub use errors::Error;
pub use filesystem::{FilesystemSource, SourceConfig};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Extension of legacy RainTPL templates, translated before serving.
pub const LEGACY_SUFFIX: &str = ".html";

/// Extension of native Twig templates, served untouched.
pub const NATIVE_SUFFIX: &str = ".html.twig";

/// A resolved template: source code, the logical name actually served, and
/// the physical path used for error reporting and freshness checks.
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub code: String,
    pub name: String,
    pub path: PathBuf,
}

/// A provider of template source text and metadata.
///
/// [`LegacyLoader`] both consumes this trait (the wrapped inner provider)
/// and implements it, so it can be substituted wherever a provider is
/// expected.
pub trait TemplateSource: Send + Sync {
    /// Whether the provider can supply `name` exactly as given.
    fn exists(&self, name: &str) -> bool;

    /// Loads the source text and metadata for `name`.
    fn source_context(&self, name: &str) -> Result<SourceContext, Error>;

    /// A key identifying the current on-disk identity of `name` for a
    /// shared template cache.
    fn cache_key(&self, name: &str) -> Result<String, Error>;

    /// Whether `name` is unchanged since `since`.
    fn is_fresh(&self, name: &str, since: DateTime<Utc>) -> Result<bool, Error>;
}

/// Decorator adding legacy/native extension fallback and RainTPL
/// translation in front of an inner [`TemplateSource`].
pub struct LegacyLoader<S> {
    inner: S,
    translator: RainToTwig,
    root: Option<PathBuf>,
}

impl<S: TemplateSource> LegacyLoader<S> {
    pub fn new(inner: S) -> Result<Self, Error> {
        Ok(Self {
            inner,
            translator: RainToTwig::new()?,
            root: None,
        })
    }

    /// Like [`new`](LegacyLoader::new), additionally enabling the fail-safe
    /// `{root}/view/` lookup for root-level legacy views the inner
    /// provider's search paths do not cover.
    pub fn with_root(inner: S, root: impl Into<PathBuf>) -> Result<Self, Error> {
        Ok(Self {
            inner,
            translator: RainToTwig::new()?,
            root: Some(root.into()),
        })
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Resolves a requested name to the name actually served.
    ///
    /// A `.html` request missing from the inner provider resolves to its
    /// `.html.twig` sibling when that exists, and vice versa; the reverse
    /// direction additionally consults the fail-safe root path. Anything
    /// else resolves to itself, found or not.
    fn resolve(&self, name: &str) -> String {
        if is_legacy_name(name) && !self.inner.exists(name) {
            let twig_name = format!("{name}.twig");
            if self.inner.exists(&twig_name) {
                debug!(name, resolved = %twig_name, "legacy template resolved to native sibling");
                return twig_name;
            }
        }

        if name.ends_with(NATIVE_SUFFIX) && !self.inner.exists(name) {
            let legacy_name = &name[..name.len() - ".twig".len()];
            if self.inner.exists(legacy_name) {
                debug!(name, resolved = legacy_name, "native template resolved to legacy sibling");
                return legacy_name.to_string();
            }
            if self.root_view_path(legacy_name).is_some() {
                debug!(name, resolved = legacy_name, "native template resolved via root view path");
                return legacy_name.to_string();
            }
        }

        name.to_string()
    }

    /// The fail-safe `{root}/view/{name}` path, when a root directory is
    /// configured and the file exists on disk.
    fn root_view_path(&self, name: &str) -> Option<PathBuf> {
        let path = self.root.as_ref()?.join("view").join(name);
        path.is_file().then_some(path)
    }

    fn translate(&self, context: SourceContext) -> Result<SourceContext, Error> {
        let code = self.translator.translate(&context.code)?;
        Ok(SourceContext {
            code,
            name: context.name,
            path: context.path,
        })
    }
}

impl<S: TemplateSource> TemplateSource for LegacyLoader<S> {
    fn exists(&self, name: &str) -> bool {
        if self.inner.exists(name) {
            return true;
        }

        if is_legacy_name(name) {
            return self.inner.exists(&format!("{name}.twig"));
        }

        if name.ends_with(NATIVE_SUFFIX) {
            let legacy_name = &name[..name.len() - ".twig".len()];
            if self.inner.exists(legacy_name) {
                return true;
            }
            return self.root_view_path(legacy_name).is_some();
        }

        false
    }

    fn source_context(&self, name: &str) -> Result<SourceContext, Error> {
        let resolved = self.resolve(name);

        let context = match self.inner.source_context(&resolved) {
            Ok(context) => context,
            Err(Error::NotFound(missing)) if is_legacy_name(&resolved) => {
                // The inner provider's search paths may not cover
                // root-level views; read them directly before giving up.
                let Some(path) = self.root_view_path(&resolved) else {
                    return Err(Error::NotFound(missing));
                };
                warn!(name = %resolved, path = %path.display(), "serving root view outside configured search paths");
                let bytes = fs::read(&path)?;
                let code = String::from_utf8(bytes)
                    .map_err(|_| Error::InvalidUtf8(resolved.clone()))?;
                SourceContext {
                    code,
                    name: resolved.clone(),
                    path,
                }
            }
            Err(other) => return Err(other),
        };

        if is_legacy_name(&resolved) {
            return self.translate(context);
        }
        Ok(context)
    }

    fn cache_key(&self, name: &str) -> Result<String, Error> {
        let resolved = self.resolve(name);

        if is_legacy_name(&resolved) {
            // The root-path key tracks the direct-read file, which the inner
            // provider may not even know exists.
            if let Some(path) = self.root_view_path(&resolved) {
                return Ok(format!("legacy_root_{}", path.display()));
            }
            // Translated and native sources must never collide in a shared
            // cache.
            return Ok(format!("legacy_{}", self.inner.cache_key(&resolved)?));
        }

        self.inner.cache_key(&resolved)
    }

    fn is_fresh(&self, name: &str, since: DateTime<Utc>) -> Result<bool, Error> {
        let resolved = self.resolve(name);

        if is_legacy_name(&resolved) {
            if let Some(path) = self.root_view_path(&resolved) {
                return Ok(filesystem::modification_time(&path)? <= since);
            }
        }

        self.inner.is_fresh(&resolved, since)
    }
}

/// Whether `name` carries the legacy suffix (and not the native one).
fn is_legacy_name(name: &str) -> bool {
    name.ends_with(LEGACY_SUFFIX) && !name.ends_with(NATIVE_SUFFIX)
}
