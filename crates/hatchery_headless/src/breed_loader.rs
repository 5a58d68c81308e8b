//! Breed and config data loading for headless runs.
//!
//! Each `.ron` file in a breed directory holds one `BreedData`. Files are
//! read in file-name order, which is also the habitat tie-break order.

use std::fs;
use std::path::{Path, PathBuf};

use hatchery_core::breeds::BreedRegistry;
use hatchery_core::config::EggConfig;
use hatchery_core::data::BreedData;
use hatchery_core::error::HatcheryError;
use thiserror::Error;

/// Errors that can occur while loading breed or config data.
#[derive(Error, Debug)]
pub enum BreedLoadError {
    /// Failed to read a file or directory.
    #[error("IO error reading '{0}': {1}")]
    IoError(String, String),
    /// Failed to parse RON.
    #[error("Parse error in '{0}': {1}")]
    ParseError(String, String),
    /// Directory not found.
    #[error("Directory not found: {0}")]
    DirectoryNotFound(String),
    /// The loaded data did not form a valid registry or config.
    #[error(transparent)]
    Invalid(#[from] HatcheryError),
}

/// Load one breed definition.
pub fn load_breed_file(path: &Path) -> Result<BreedData, BreedLoadError> {
    let content = fs::read_to_string(path)
        .map_err(|e| BreedLoadError::IoError(path.display().to_string(), e.to_string()))?;

    ron::from_str(&content)
        .map_err(|e| BreedLoadError::ParseError(path.display().to_string(), e.to_string()))
}

/// Load every breed file in `dir`. Unreadable files are skipped with a
/// warning.
pub fn load_breed_directory(dir: &Path) -> Result<Vec<BreedData>, BreedLoadError> {
    if !dir.exists() {
        return Err(BreedLoadError::DirectoryNotFound(
            dir.display().to_string(),
        ));
    }

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)
        .map_err(|e| BreedLoadError::IoError(dir.display().to_string(), e.to_string()))?
    {
        let entry =
            entry.map_err(|e| BreedLoadError::IoError(dir.display().to_string(), e.to_string()))?;
        let path = entry.path();
        if path.extension().is_some_and(|e| e == "ron") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut loaded = Vec::with_capacity(paths.len());
    for path in paths {
        match load_breed_file(&path) {
            Ok(data) => {
                tracing::debug!(breed = %data.id, file = %path.display(), "Loaded breed");
                loaded.push(data);
            }
            Err(e) => {
                tracing::warn!("Failed to load breed from {:?}: {}", path, e);
            }
        }
    }

    Ok(loaded)
}

/// Build a registry from a breed directory.
pub fn load_registry(
    dir: &Path,
    default_breed: Option<&str>,
) -> Result<BreedRegistry, BreedLoadError> {
    let data = load_breed_directory(dir)?;
    let registry = BreedRegistry::new(data, default_breed)?;
    tracing::info!(breeds = registry.len(), dir = %dir.display(), "Breed registry ready");
    Ok(registry)
}

/// Load an egg config file, or the defaults when `path` is `None`.
pub fn load_config(path: Option<&Path>) -> Result<EggConfig, BreedLoadError> {
    let Some(path) = path else {
        return Ok(EggConfig::default());
    };
    let content = fs::read_to_string(path)
        .map_err(|e| BreedLoadError::IoError(path.display().to_string(), e.to_string()))?;
    Ok(EggConfig::from_ron(&path.display().to_string(), &content)?)
}

/// Resolve the default breed data directory.
///
/// Looks for breed RON files in standard locations:
/// 1. Environment variable `HATCHERY_BREED_DATA_DIR`
/// 2. `./crates/hatchery_headless/assets/breeds/` (repo root)
/// 3. `./assets/breeds/` (running from hatchery_headless)
pub fn default_breed_data_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("HATCHERY_BREED_DATA_DIR") {
        let path = PathBuf::from(dir);
        if path.exists() {
            return Some(path);
        }
    }

    let candidates = ["crates/hatchery_headless/assets/breeds", "assets/breeds"];

    candidates
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, text: &str) {
        fs::write(dir.join(name), text).unwrap();
    }

    const ICE: &str =
        r#"BreedData(id: "ice", primary_color: (200, 235, 255), secondary_color: (120, 160, 255))"#;
    const FIRE: &str =
        r#"BreedData(id: "fire", primary_color: (204, 65, 20), secondary_color: (255, 190, 0))"#;

    #[test]
    fn test_directory_loads_in_file_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b_ice.ron", ICE);
        write(dir.path(), "a_fire.ron", FIRE);
        write(dir.path(), "notes.txt", "not a breed");

        let registry = load_registry(dir.path(), None).unwrap();
        let ids: Vec<_> = registry.iter().map(|b| b.id.to_string()).collect();
        assert_eq!(ids, vec!["fire", "ice"]);
        assert_eq!(registry.default_breed().id.as_str(), "fire");
    }

    #[test]
    fn test_bad_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "fire.ron", FIRE);
        write(dir.path(), "broken.ron", "BreedData(id: ");

        let data = load_breed_directory(dir.path()).unwrap();
        assert_eq!(data.len(), 1);
    }

    #[test]
    fn test_empty_directory_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_registry(dir.path(), None),
            Err(BreedLoadError::Invalid(HatcheryError::EmptyRegistry))
        ));
    }

    #[test]
    fn test_unknown_default_breed() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "fire.ron", FIRE);
        assert!(matches!(
            load_registry(dir.path(), Some("storm")),
            Err(BreedLoadError::Invalid(HatcheryError::UnknownBreed(_)))
        ));
    }

    #[test]
    fn test_missing_directory() {
        assert!(matches!(
            load_breed_directory(Path::new("/definitely/not/here")),
            Err(BreedLoadError::DirectoryNotFound(_))
        ));
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("egg.ron");
        fs::write(&path, "EggConfig(default_hatch_time: 600)").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.default_hatch_time, 600);
        assert_eq!(config.transition_time, EggConfig::default().transition_time);
        assert_eq!(load_config(None).unwrap(), EggConfig::default());
    }

    #[test]
    fn test_shipped_breeds_parse() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/breeds");
        let registry = load_registry(&dir, Some("fire")).unwrap();
        assert!(registry.len() >= 4);
        assert!(registry.resolve("end").is_some());
    }
}
