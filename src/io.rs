use serde::{Deserialize, Serialize};

use crate::pin::PinId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireData {
    pub source: PinId,
    pub target: PinId,
    #[serde(skip_serializing_if = "is_false", default)]
    pub bus: bool,
    /// Source to target.
    pub points: Vec<(f32, f32)>,
}

/// Saved wires, indexed by wire id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireGraphData {
    pub wires: Vec<Option<WireData>>,
}

fn is_false(v: &bool) -> bool {
    !v
}
