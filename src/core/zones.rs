//! Read-only zone geometry, supplied by the zone-management side.

use crate::errors::{AppError, AppResult};
use crate::models::zone::Zone;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Zone lookup by id.
pub trait ZoneSource {
    fn zone(&self, id: i64) -> AppResult<Zone>;
}

impl ZoneSource for HashMap<i64, Zone> {
    fn zone(&self, id: i64) -> AppResult<Zone> {
        self.get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("zone {}", id)))
    }
}

#[derive(Debug, Deserialize)]
struct ZoneFile {
    #[serde(default)]
    zones: Vec<Zone>,
}

/// Parse a YAML zone export:
///
/// ```yaml
/// zones:
///   - id: 1
///     name: Old Town
///     boundary: [{lat: 31.89, lng: 35.19}, ...]
///     reference: {lat: 31.90, lng: 35.20}
/// ```
pub fn parse_zones(yaml: &str) -> AppResult<HashMap<i64, Zone>> {
    let file: ZoneFile = serde_yaml::from_str(yaml)
        .map_err(|e| AppError::Config(format!("invalid zones file: {}", e)))?;

    let mut out = HashMap::new();
    for z in file.zones {
        if out.contains_key(&z.id) {
            return Err(AppError::Config(format!("duplicate zone id {}", z.id)));
        }
        out.insert(z.id, z);
    }
    Ok(out)
}

/// Load the zones file; a missing file yields an empty set.
pub fn load_zone_file(path: &Path) -> AppResult<HashMap<i64, Zone>> {
    if !path.exists() {
        warn!(path = %path.display(), "zones file not found, no zones available");
        return Ok(HashMap::new());
    }

    let content = fs::read_to_string(path)?;
    let zones = parse_zones(&content)?;
    debug!(count = zones.len(), path = %path.display(), "zones loaded");
    Ok(zones)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_polygon_and_reference_zones() {
        let yaml = r#"
zones:
  - id: 1
    name: Old Town
    boundary:
      - {lat: 31.89, lng: 35.19}
      - {lat: 31.89, lng: 35.21}
      - {lat: 31.91, lng: 35.21}
  - id: 2
    name: Depot
    reference: {lat: 31.90, lng: 35.20}
"#;
        let zones = parse_zones(yaml).unwrap();
        assert_eq!(zones.len(), 2);
        assert_eq!(zones.zone(1).unwrap().boundary.len(), 3);
        assert!(zones.zone(2).unwrap().reference.is_some());
        assert!(matches!(zones.zone(3), Err(AppError::NotFound(_))));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let yaml = "zones:\n  - {id: 1, name: A}\n  - {id: 1, name: B}\n";
        assert!(matches!(parse_zones(yaml), Err(AppError::Config(_))));
    }
}
