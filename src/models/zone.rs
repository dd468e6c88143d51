use super::position::LatLng;
use serde::{Deserialize, Serialize};

/// Read-only snapshot of a zone, as handed over by the zone-management side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: i64,
    pub name: String,
    /// Ordered polygon vertices. An empty boundary means "reference point only".
    #[serde(default)]
    pub boundary: Vec<LatLng>,
    #[serde(default)]
    pub reference: Option<LatLng>,
}

impl Zone {
    pub fn has_polygon(&self) -> bool {
        !self.boundary.is_empty()
    }
}
