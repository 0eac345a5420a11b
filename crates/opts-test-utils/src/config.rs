//! On-disk configuration fixtures

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A temporary directory of `<group>.<env>.properties` files.
///
/// # Example
///
/// ```ignore
/// let config = ConfigDir::new()
///     .properties("compiler-explorer", "defaults", &[("languages", "c++")])
///     .properties("c++", "defaults", &[("libs", "boost")]);
/// let store = PropertyStore::load_dir(config.path(), &["defaults".into()])?;
/// ```
pub struct ConfigDir {
    dir: TempDir,
}

impl ConfigDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// Append `pairs` to `<group>.<env>.properties`.
    pub fn properties(self, group: &str, env: &str, pairs: &[(&str, &str)]) -> Self {
        let path = self.dir.path().join(format!("{group}.{env}.properties"));
        let mut text = fs::read_to_string(&path).unwrap_or_default();
        for (key, value) in pairs {
            text.push_str(&format!("{key}={value}\n"));
        }
        fs::write(&path, text).expect("Failed to write properties file");
        self
    }

    /// Write raw text to `<group>.<env>.properties`, replacing any content.
    pub fn raw(self, group: &str, env: &str, text: &str) -> Self {
        let path = self.dir.path().join(format!("{group}.{env}.properties"));
        fs::write(&path, text).expect("Failed to write properties file");
        self
    }

    /// Create an empty file standing in for a tool binary and return its path.
    pub fn executable(&self, name: &str) -> PathBuf {
        let bin = self.dir.path().join("bin");
        fs::create_dir_all(&bin).expect("Failed to create bin dir");
        let path = bin.join(name);
        fs::write(&path, "#!/bin/sh\nexit 0\n").expect("Failed to write executable");
        path
    }

    /// A path under the fixture that is guaranteed not to exist.
    pub fn missing(&self, name: &str) -> PathBuf {
        self.dir.path().join("missing").join(name)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

impl Default for ConfigDir {
    fn default() -> Self {
        Self::new()
    }
}
