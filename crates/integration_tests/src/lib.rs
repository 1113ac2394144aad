//! Shared fixtures for the end-to-end template loading tests.

use std::fs;
use std::path::{Path, PathBuf};

use legacy_loader::{FilesystemSource, LegacyLoader};
use tempfile::TempDir;

/// A temporary on-disk template tree mimicking the application layout:
/// a `Core/View/` search directory plus the root-level `view/` directory
/// served by the loader's fail-safe.
pub struct TemplateTree {
    dir: TempDir,
}

impl TemplateTree {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create template tree");
        fs::create_dir_all(dir.path().join("Core/View")).unwrap();
        fs::create_dir_all(dir.path().join("view")).unwrap();
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Writes a template under the `Core/View/` search directory.
    pub fn write_view(&self, name: &str, code: &str) -> PathBuf {
        self.write(&format!("Core/View/{name}"), code)
    }

    /// Writes a template under the root `view/` fail-safe directory.
    pub fn write_root_view(&self, name: &str, code: &str) -> PathBuf {
        self.write(&format!("view/{name}"), code)
    }

    fn write(&self, relative: &str, code: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, code).unwrap();
        path
    }

    /// A loader over this tree: `Core/View/` as the configured search path,
    /// the tree root enabling the `view/` fail-safe.
    pub fn loader(&self) -> LegacyLoader<FilesystemSource> {
        let mut source = FilesystemSource::new();
        source.add_path(self.dir.path().join("Core/View"));
        LegacyLoader::with_root(source, self.dir.path()).expect("Failed to create loader")
    }
}

impl Default for TemplateTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Installs a test tracing subscriber; repeated calls are a no-op.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}
