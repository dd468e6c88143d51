//! Bring an older configuration file up to the current layout.
//!
//! Keys added after the first release have serde defaults, so an old file
//! still loads. These helpers make the defaults visible in the file itself.

use super::Config;
use crate::errors::{AppError, AppResult};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;

fn to_value(cfg: &Config) -> AppResult<Value> {
    serde_yaml::to_value(cfg).map_err(|e| AppError::Config(e.to_string()))
}

/// Dotted paths present in `reference` but absent from `actual`.
fn missing_in(reference: &Mapping, actual: &Mapping, prefix: &str, out: &mut Vec<String>) {
    for (key, ref_val) in reference {
        let Some(name) = key.as_str() else { continue };
        let path = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}.{name}")
        };

        match (actual.get(key), ref_val.as_mapping()) {
            (None, _) => out.push(path),
            (Some(Value::Mapping(sub)), Some(ref_sub)) => missing_in(ref_sub, sub, &path, out),
            _ => {}
        }
    }
}

/// Copy every key of `reference` that `actual` lacks. Existing values win.
fn fill_missing(reference: &Mapping, actual: &mut Mapping) {
    for (key, ref_val) in reference {
        match actual.get_mut(key) {
            None => {
                actual.insert(key.clone(), ref_val.clone());
            }
            Some(Value::Mapping(sub)) => {
                if let Some(ref_sub) = ref_val.as_mapping() {
                    fill_missing(ref_sub, sub);
                }
            }
            Some(_) => {}
        }
    }
}

fn parse_mapping(content: &str) -> AppResult<Mapping> {
    let value: Value = serde_yaml::from_str(content)
        .map_err(|e| AppError::Config(format!("invalid configuration: {}", e)))?;
    match value {
        Value::Mapping(m) => Ok(m),
        Value::Null => Ok(Mapping::new()),
        _ => Err(AppError::Config(
            "configuration root must be a mapping".into(),
        )),
    }
}

/// Keys the file at `path` does not set explicitly.
pub fn missing_keys(path: &Path) -> AppResult<Vec<String>> {
    let content = fs::read_to_string(path)?;
    let actual = parse_mapping(&content)?;

    let reference = to_value(&Config::default())?;
    let mut out = Vec::new();
    if let Some(reference) = reference.as_mapping() {
        missing_in(reference, &actual, "", &mut out);
    }
    Ok(out)
}

/// Rewrite the file at `path` with every missing key filled in.
/// Returns the keys that were added.
pub fn migrate_file(path: &Path) -> AppResult<Vec<String>> {
    let added = missing_keys(path)?;
    if added.is_empty() {
        return Ok(added);
    }

    let content = fs::read_to_string(path)?;
    let mut actual = parse_mapping(&content)?;
    let reference = to_value(&Config::default())?;
    if let Some(reference) = reference.as_mapping() {
        fill_missing(reference, &mut actual);
    }

    let serialized =
        serde_yaml::to_string(&Value::Mapping(actual)).map_err(|_| AppError::ConfigSave)?;
    // The result must still be a loadable configuration.
    Config::parse(&serialized)?;
    fs::write(path, serialized)?;

    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn temp_conf(name: &str, body: &str) -> std::path::PathBuf {
        let path = env::temp_dir().join(format!("fieldcheck_{}_{}.conf", name, std::process::id()));
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn reports_nested_missing_keys() {
        let path = temp_conf(
            "missing",
            "database: /tmp/a.sqlite\nverification:\n  max_acceptable_distance_meters: 300\n",
        );
        let missing = missing_keys(&path).unwrap();
        assert!(missing.contains(&"zones_file".to_string()));
        assert!(missing.contains(&"verification.max_acceptable_accuracy_meters".to_string()));
        assert!(!missing.contains(&"database".to_string()));
        assert!(!missing.contains(&"verification.max_acceptable_distance_meters".to_string()));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn migrate_keeps_user_values() {
        let path = temp_conf(
            "migrate",
            "database: /tmp/b.sqlite\nverification:\n  max_acceptable_distance_meters: 300\n",
        );
        let added = migrate_file(&path).unwrap();
        assert!(!added.is_empty());

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.database, "/tmp/b.sqlite");
        assert_eq!(cfg.verification.max_acceptable_distance_meters, 300.0);
        assert!(missing_keys(&path).unwrap().is_empty());
        assert!(migrate_file(&path).unwrap().is_empty());
        let _ = fs::remove_file(path);
    }
}
