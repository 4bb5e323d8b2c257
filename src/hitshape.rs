use emath::{Pos2, Rect};

use crate::path::distance_sq_to_polyline;

/// Collision boundary used for pointer interaction.
pub trait HitShape: Send + Sync {
    fn set_points(&mut self, points: &[Pos2]);

    fn set_edge_radius(&mut self, radius: f32);

    fn set_enabled(&mut self, enabled: bool);

    fn is_enabled(&self) -> bool;

    fn contains(&self, p: Pos2) -> bool;

    fn release(&mut self) {}
}

/// A polyline swept by a circle of `radius`.
#[derive(Debug, Clone, Default)]
pub struct PolylineHitShape {
    points: Vec<Pos2>,
    radius: f32,
    enabled: bool,
    bounds: Option<Rect>,
}

impl PolylineHitShape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn points(&self) -> &[Pos2] {
        &self.points
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    fn update_bounds(&mut self) {
        self.bounds = (!self.points.is_empty())
            .then(|| Rect::from_points(&self.points).expand(self.radius));
    }
}

impl HitShape for PolylineHitShape {
    fn set_points(&mut self, points: &[Pos2]) {
        self.points.clear();
        self.points.extend_from_slice(points);
        self.update_bounds();
    }

    fn set_edge_radius(&mut self, radius: f32) {
        self.radius = radius.max(0.0);
        self.update_bounds();
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn contains(&self, p: Pos2) -> bool {
        if !self.enabled || self.points.len() < 2 {
            return false;
        }
        if !self.bounds.is_some_and(|b| b.contains(p)) {
            return false;
        }
        distance_sq_to_polyline(&self.points, p).is_some_and(|d| d <= self.radius * self.radius)
    }

    fn release(&mut self) {
        self.enabled = false;
        self.points.clear();
        self.bounds = None;
    }
}
