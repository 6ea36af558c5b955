use std::collections::HashMap;

use crate::types::Spot;

/// Label used for spot ids that have no configured name.
pub const UNKNOWN_SPOT_NAME: &str = "Unknown";

/// Immutable spot id -> display name table, built once from configuration.
#[derive(Debug, Clone, Default)]
pub struct SpotNames {
    names: HashMap<String, String>,
}

impl SpotNames {
    pub fn new(names: HashMap<String, String>) -> Self {
        Self { names }
    }

    pub fn resolve(&self, spot_id: &str) -> &str {
        self.names
            .get(spot_id)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_SPOT_NAME)
    }

    pub fn spot(&self, spot_id: &str) -> Spot {
        Spot {
            id: spot_id.to_string(),
            name: self.resolve(spot_id).to_string(),
        }
    }
}
