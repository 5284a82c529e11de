//! Configuration loading.

use camino::Utf8Path;
use serde::Deserialize;
use std::fs;

/// Build configuration, read from `coffee-build.json` at the workspace root.
///
/// The surrounding package decides which names are visible beyond each file's
/// local scope; this file is where it says so.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildConfig {
    /// Names the package exports.
    pub exports: Vec<String>,

    /// Glob patterns to exclude from the build.
    pub ignore: Vec<String>,
}

impl BuildConfig {
    pub const FILENAME: &'static str = "coffee-build.json";

    /// Loads configuration from the workspace root, falling back to defaults
    /// when the file is absent. A malformed file is reported and ignored.
    pub fn load(workspace_root: &Utf8Path) -> Self {
        let path = workspace_root.join(Self::FILENAME);
        let Ok(content) = fs::read_to_string(&path) else {
            return Self::default();
        };

        match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: failed to parse {}: {}", path, e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();

        let config = BuildConfig::load(&root);
        assert!(config.exports.is_empty());
        assert!(config.ignore.is_empty());
    }

    #[test]
    fn loads_exports_and_ignores() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        std::fs::write(
            root.join(BuildConfig::FILENAME),
            r#"{"exports": ["Posts", "Comments"], "ignore": ["**/vendor/**"]}"#,
        )
        .unwrap();

        let config = BuildConfig::load(&root);
        assert_eq!(config.exports, vec!["Posts".to_string(), "Comments".to_string()]);
        assert_eq!(config.ignore, vec!["**/vendor/**".to_string()]);
    }

    #[test]
    fn malformed_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        std::fs::write(root.join(BuildConfig::FILENAME), "{ not json").unwrap();

        let config = BuildConfig::load(&root);
        assert!(config.exports.is_empty());
    }
}
