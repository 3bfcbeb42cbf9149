//! Engine options file.
//!
//! User-editable JSON mapping UCI option names to values. A few options
//! are reserved for the application itself and silently dropped if the
//! user sets them.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::AnalysisError;

/// Options the application manages itself; user values are ignored.
const RESERVED_OPTIONS: [&str; 3] = ["ponder", "multipv", "uci_chess960"];

/// Load engine options from `path`, filtering reserved names.
///
/// A missing file is not an error: it is created (parent directories
/// included) with `defaults` pretty-printed as a starting point, and an
/// empty map is returned.
pub fn load_or_init(
    path: &Path,
    defaults: &HashMap<String, Value>,
) -> Result<HashMap<String, Value>, AnalysisError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "options file missing, writing defaults");
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, serde_json::to_string_pretty(defaults)?)?;
            return Ok(HashMap::new());
        }
        Err(e) => return Err(e.into()),
    };

    let options: HashMap<String, Value> = serde_json::from_str(&text)?;
    Ok(options
        .into_iter()
        .filter(|(name, _)| !RESERVED_OPTIONS.contains(&name.to_lowercase().as_str()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("uci-options-{}-{name}.json", std::process::id()))
    }

    #[test]
    fn test_missing_file_writes_defaults() {
        let path = temp_path("init");
        let _ = std::fs::remove_file(&path);

        let mut defaults = HashMap::new();
        defaults.insert("Threads".to_string(), Value::from(2));

        let loaded = load_or_init(&path, &defaults).unwrap();
        assert!(loaded.is_empty());

        let written: HashMap<String, Value> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.get("Threads"), Some(&Value::from(2)));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_reserved_options_filtered() {
        let path = temp_path("filter");
        std::fs::write(
            &path,
            r#"{"Threads": 4, "Ponder": true, "MultiPV": 5, "Hash": 128}"#,
        )
        .unwrap();

        let loaded = load_or_init(&path, &HashMap::new()).unwrap();
        assert_eq!(loaded.get("Threads"), Some(&Value::from(4)));
        assert_eq!(loaded.get("Hash"), Some(&Value::from(128)));
        assert!(!loaded.contains_key("Ponder"), "reserved, case-insensitive");
        assert!(!loaded.contains_key("MultiPV"));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let path = temp_path("malformed");
        std::fs::write(&path, "not json").unwrap();
        assert!(load_or_init(&path, &HashMap::new()).is_err());
        let _ = std::fs::remove_file(&path);
    }
}
