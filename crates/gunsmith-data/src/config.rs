//! Loader configuration.
//!
//! Can be read from a RON, JSON, or TOML file (format picked by extension):
//!
//! ```toml
//! directory = "guns"
//! fallback_ammo = "cgm:basic_ammo"
//! formats = ["json", "toml"]
//! ```
//!
//! Every key is optional; [`LoaderConfig::default`] gives the standard
//! layout `<namespace>/guns/<path>.json`.

use serde::Deserialize;
use std::path::Path;

use gunsmith_core::gun::{Gun, default_fallback_ammo};
use gunsmith_core::id::Identifier;

use crate::loader::{Format, LoadError, detect_format};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    /// Folder under each namespace holding gun definitions.
    pub directory: String,
    /// Projectile item of the fallback gun.
    pub fallback_ammo: Identifier,
    /// Document formats probed for each gun, in order.
    pub formats: Vec<Format>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            directory: "guns".to_string(),
            fallback_ammo: default_fallback_ammo(),
            formats: vec![Format::Json],
        }
    }
}

impl LoaderConfig {
    /// Read a configuration file.
    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let format = detect_format(path)?;
        let file = path.display().to_string();
        let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
            path: file.clone(),
            source,
        })?;
        format.parse(&bytes, &file)
    }

    /// The gun substituted for definitions that fail to load.
    pub fn fallback_gun(&self) -> Gun {
        Gun::fallback(self.fallback_ammo.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gunsmith_core::test_utils::id;
    use std::fs;
    use std::path::PathBuf;

    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "gunsmith_config_test_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn default_layout() {
        let config = LoaderConfig::default();
        assert_eq!(config.directory, "guns");
        assert_eq!(config.fallback_ammo, id("cgm:basic_ammo"));
        assert_eq!(config.formats, vec![Format::Json]);
    }

    #[test]
    fn toml_overrides() {
        let dir = make_test_dir("toml");
        let path = dir.join("loader.toml");
        fs::write(
            &path,
            r#"
fallback_ammo = "mod:bullet"
formats = ["json", "ron"]
"#,
        )
        .unwrap();

        let config = LoaderConfig::from_file(&path).unwrap();
        assert_eq!(config.directory, "guns");
        assert_eq!(config.fallback_ammo, id("mod:bullet"));
        assert_eq!(config.formats, vec![Format::Json, Format::Ron]);
        assert_eq!(config.fallback_gun().projectile.item, Some(id("mod:bullet")));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn ron_config() {
        let dir = make_test_dir("ron");
        let path = dir.join("loader.ron");
        fs::write(&path, r#"(directory: "weapons")"#).unwrap();

        let config = LoaderConfig::from_file(&path).unwrap();
        assert_eq!(config.directory, "weapons");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn unknown_key_rejected() {
        let dir = make_test_dir("unknown");
        let path = dir.join("loader.json");
        fs::write(&path, r#"{"dir": "guns"}"#).unwrap();

        assert!(matches!(
            LoaderConfig::from_file(&path),
            Err(LoadError::Parse { .. })
        ));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = make_test_dir("missing");
        let result = LoaderConfig::from_file(&dir.join("nope.toml"));
        assert!(matches!(result, Err(LoadError::Io { .. })));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn unsupported_extension() {
        let result = LoaderConfig::from_file(Path::new("loader.yaml"));
        assert!(matches!(result, Err(LoadError::UnsupportedFormat { .. })));
    }
}
