use serde::{Deserialize, Serialize};

use crate::state::WireState;

/// Base depth of each wire layer. Priority offsets are added on top.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthLayers {
    pub normal_low: f32,
    pub normal_high: f32,
    pub bus_low: f32,
    pub bus_high: f32,
}

impl Default for DepthLayers {
    fn default() -> Self {
        Self {
            normal_low: 0.0,
            normal_high: 1.0,
            bus_low: 2.0,
            bus_high: 3.0,
        }
    }
}

impl DepthLayers {
    pub fn layer(&self, bus: bool, state: WireState) -> f32 {
        match (bus, state.is_high()) {
            (true, true) => self.bus_high,
            (true, false) => self.bus_low,
            (false, true) => self.normal_high,
            (false, false) => self.normal_low,
        }
    }

    /// Smallest distance between two neighbouring layers.
    pub fn min_gap(&self) -> f32 {
        [
            self.normal_high - self.normal_low,
            self.bus_low - self.normal_high,
            self.bus_high - self.bus_low,
        ]
        .into_iter()
        .fold(f32::INFINITY, f32::min)
        .max(0.0)
    }
}

/// Presentation settings shared by every wire of a graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireStyle {
    pub wire_thickness: f32,
    pub bus_wire_thickness: f32,
    /// Added to the stroke while a wire is highlighted.
    pub selection_padding: f32,
    pub curve_amount: f32,
    pub curve_resolution: usize,
    /// Seconds.
    pub colour_fade_duration: f32,
    pub depth_layers: DepthLayers,
    /// Depth added per theme priority step. Priorities above
    /// [`WireStyle::max_priority`] are clamped so a wire never reaches the
    /// next layer.
    pub priority_increment: f32,
}

impl Default for WireStyle {
    fn default() -> Self {
        Self {
            wire_thickness: 0.2,
            bus_wire_thickness: 0.4,
            selection_padding: 0.1,
            curve_amount: 0.3,
            curve_resolution: 6,
            colour_fade_duration: 0.1,
            depth_layers: DepthLayers::default(),
            priority_increment: 0.001,
        }
    }
}

impl WireStyle {
    pub fn from_ron(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }

    pub fn base_thickness(&self, bus: bool) -> f32 {
        if bus {
            self.bus_wire_thickness
        } else {
            self.wire_thickness
        }
    }

    pub fn thickness(&self, bus: bool, highlighted: bool) -> f32 {
        let base = self.base_thickness(bus);
        if highlighted {
            base + self.selection_padding
        } else {
            base
        }
    }

    /// Highest priority whose offset stays below the gap between layers.
    pub fn max_priority(&self) -> u32 {
        if self.priority_increment <= 0.0 {
            return 0;
        }
        let steps = (self.depth_layers.min_gap() / self.priority_increment).floor();
        (steps as u32).saturating_sub(1)
    }

    pub fn depth(&self, bus: bool, state: WireState, priority: u32) -> f32 {
        let priority = priority.min(self.max_priority());
        self.depth_layers.layer(bus, state) + priority as f32 * self.priority_increment
    }
}
