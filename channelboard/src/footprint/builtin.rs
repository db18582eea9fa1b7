//! Built-in and External Footprints
//!
//! Footprints come from:
//! 1. Embedded JSON files compiled into the binary
//! 2. External JSON files in a user directory (added on top, later wins)
//!
//! Every file holds a JSON array of footprints.

use std::path::Path;

use crate::core::LayoutError;
use crate::footprint::Footprint;

const EMBEDDED_PASSIVES: &str = include_str!("../../footprints/passives.json");
const EMBEDDED_POWER: &str = include_str!("../../footprints/power.json");
const EMBEDDED_ICS: &str = include_str!("../../footprints/ics.json");
const EMBEDDED_CONNECTORS: &str = include_str!("../../footprints/connectors.json");

/// Get all footprints from the embedded JSON files
pub fn get_all_footprints() -> Vec<Footprint> {
    let embedded_jsons = [
        EMBEDDED_PASSIVES,
        EMBEDDED_POWER,
        EMBEDDED_ICS,
        EMBEDDED_CONNECTORS,
    ];

    let mut footprints = Vec::new();
    for json_str in embedded_jsons {
        match serde_json::from_str::<Vec<Footprint>>(json_str) {
            Ok(batch) => footprints.extend(batch),
            Err(e) => {
                tracing::warn!("Failed to parse embedded footprints: {}", e);
            }
        }
    }
    footprints
}

/// Load footprints from a single JSON file
pub fn load_footprints_from_file(path: &Path) -> Result<Vec<Footprint>, LayoutError> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| LayoutError::Parse(format!("{}: {}", path.display(), e)))
}

/// Load footprints from a directory of JSON files.
/// Returns the footprints that loaded and the errors for the files that did not.
pub fn load_footprints_from_directory(dir: &Path) -> (Vec<Footprint>, Vec<String>) {
    let mut footprints = Vec::new();
    let mut errors = Vec::new();

    if !dir.is_dir() {
        return (footprints, errors);
    }

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            errors.push(format!("Failed to read directory {:?}: {}", dir, e));
            return (footprints, errors);
        }
    };

    let mut paths: Vec<_> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().map(|e| e == "json").unwrap_or(false))
        .collect();
    paths.sort();

    for path in paths {
        match load_footprints_from_file(&path) {
            Ok(batch) => {
                tracing::info!("Loaded {} footprints from {:?}", batch.len(), path.file_name());
                footprints.extend(batch);
            }
            Err(e) => {
                let error_msg = format!("Failed to load {:?}: {}", path.file_name(), e);
                tracing::warn!("{}", error_msg);
                errors.push(error_msg);
            }
        }
    }

    (footprints, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_embedded_files_parse() {
        let all = get_all_footprints();
        assert!(all.len() >= 10, "expected full catalog, got {}", all.len());
        assert!(all.iter().all(|fp| !fp.pads.is_empty()));
    }

    #[test]
    fn test_load_directory_reports_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.json");
        let bad = dir.path().join("bad.json");
        std::fs::write(
            &good,
            r#"[{"type": "buzzer", "size": {"width": 12.0, "height": 12.0},
                "pads": [{"id": "+", "offset": {"x": -3.0, "y": 0.0}, "size": {"width": 2.0, "height": 2.0}}]}]"#,
        )
        .unwrap();
        let mut f = std::fs::File::create(&bad).unwrap();
        writeln!(f, "not json").unwrap();

        let (footprints, errors) = load_footprints_from_directory(dir.path());
        assert_eq!(footprints.len(), 1);
        assert_eq!(footprints[0].component_type, "buzzer");
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let (footprints, errors) = load_footprints_from_directory(Path::new("/nonexistent/footprints"));
        assert!(footprints.is_empty());
        assert!(errors.is_empty());
    }
}
