use eframe::epaint::{Color32, Shape, Stroke};
use emath::Pos2;

use crate::path::{closest_point_on_polyline, smooth_path};

/// Turns a wire's anchor list into something drawable.
pub trait PathRenderer: Send + Sync {
    fn set_anchor_points(&mut self, points: &[Pos2], curve_amount: f32, curve_resolution: usize);

    /// Fades from the current colour to `colour` over `fade_duration` seconds.
    fn set_colour(&mut self, colour: Color32, fade_duration: f32);

    fn set_thickness(&mut self, value: f32);

    fn set_depth(&mut self, depth: f32);

    /// Closest point on the drawn curve, which may differ from the anchors.
    fn closest_point_on_path(&self, p: Pos2) -> Pos2;

    /// Drops any backend resources. Called once when the wire is deleted.
    fn release(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ColourFade {
    from: Color32,
    to: Color32,
    duration: f32,
    elapsed: f32,
}

impl ColourFade {
    fn still(colour: Color32) -> Self {
        Self {
            from: colour,
            to: colour,
            duration: 0.0,
            elapsed: 0.0,
        }
    }

    fn current(&self) -> Color32 {
        if self.duration <= 0.0 || self.elapsed >= self.duration {
            return self.to;
        }
        let t = self.elapsed / self.duration;
        let [fr, fg, fb, fa] = self.from.to_array();
        let [tr, tg, tb, ta] = self.to.to_array();
        let lerp = |a: u8, b: u8| emath::lerp(a as f32..=b as f32, t).round() as u8;
        Color32::from_rgba_premultiplied(lerp(fr, tr), lerp(fg, tg), lerp(fb, tb), lerp(fa, ta))
    }

    fn is_done(&self) -> bool {
        self.duration <= 0.0 || self.elapsed >= self.duration
    }
}

/// Default renderer: rounds corners with [`smooth_path`] and paints the
/// result as an epaint line.
#[derive(Debug, Clone)]
pub struct CurvePathRenderer {
    anchors: Vec<Pos2>,
    points: Vec<Pos2>,
    fade: ColourFade,
    thickness: f32,
    depth: f32,
    released: bool,
}

impl CurvePathRenderer {
    pub fn new() -> Self {
        Self {
            anchors: vec![],
            points: vec![],
            fade: ColourFade::still(Color32::TRANSPARENT),
            thickness: 0.0,
            depth: 0.0,
            released: false,
        }
    }

    pub fn points(&self) -> &[Pos2] {
        &self.points
    }

    pub fn anchors(&self) -> &[Pos2] {
        &self.anchors
    }

    pub fn colour(&self) -> Color32 {
        self.fade.current()
    }

    pub fn target_colour(&self) -> Color32 {
        self.fade.to
    }

    pub fn thickness(&self) -> f32 {
        self.thickness
    }

    pub fn depth(&self) -> f32 {
        self.depth
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn is_fading(&self) -> bool {
        !self.fade.is_done()
    }

    /// Progresses the colour fade by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        if !self.fade.is_done() {
            self.fade.elapsed += dt.max(0.0);
        }
    }

    pub fn shape(&self) -> Shape {
        if self.released || self.points.len() < 2 {
            return Shape::Noop;
        }
        Shape::line(self.points.clone(), Stroke::new(self.thickness, self.colour()))
    }
}

impl Default for CurvePathRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PathRenderer for CurvePathRenderer {
    fn set_anchor_points(&mut self, points: &[Pos2], curve_amount: f32, curve_resolution: usize) {
        self.anchors.clear();
        self.anchors.extend_from_slice(points);
        self.points = smooth_path(points, curve_amount, curve_resolution);
    }

    fn set_colour(&mut self, colour: Color32, fade_duration: f32) {
        if colour == self.fade.to {
            return;
        }
        self.fade = ColourFade {
            from: self.fade.current(),
            to: colour,
            duration: fade_duration.max(0.0),
            elapsed: 0.0,
        };
    }

    fn set_thickness(&mut self, value: f32) {
        self.thickness = value;
    }

    fn set_depth(&mut self, depth: f32) {
        self.depth = depth;
    }

    fn closest_point_on_path(&self, p: Pos2) -> Pos2 {
        closest_point_on_polyline(&self.points, p)
            .or_else(|| closest_point_on_polyline(&self.anchors, p))
            .unwrap_or(p)
    }

    fn release(&mut self) {
        self.released = true;
        self.anchors.clear();
        self.points.clear();
    }
}

#[cfg(test)]
mod test {
    use eframe::epaint::{Color32, Shape};
    use emath::pos2;

    use super::{CurvePathRenderer, PathRenderer};

    #[test]
    fn colour_fades_linearly() {
        let mut renderer = CurvePathRenderer::new();
        renderer.set_colour(Color32::from_rgb(0, 0, 0), 0.0);
        assert_eq!(renderer.colour(), Color32::from_rgb(0, 0, 0));

        renderer.set_colour(Color32::from_rgb(200, 100, 0), 1.0);
        assert!(renderer.is_fading());
        assert_eq!(renderer.colour(), Color32::from_rgb(0, 0, 0));

        renderer.advance(0.5);
        assert_eq!(renderer.colour(), Color32::from_rgb(100, 50, 0));

        renderer.advance(0.75);
        assert!(!renderer.is_fading());
        assert_eq!(renderer.colour(), Color32::from_rgb(200, 100, 0));
    }

    #[test]
    fn closest_point_uses_smoothed_curve() {
        let mut renderer = CurvePathRenderer::new();
        renderer.set_anchor_points(&[pos2(0.0, 0.0), pos2(4.0, 0.0), pos2(4.0, 4.0)], 1.0, 8);

        // the raw corner is not on the rounded curve
        let closest = renderer.closest_point_on_path(pos2(4.0, 0.0));
        assert!(closest.distance(pos2(4.0, 0.0)) > 0.1);
    }

    #[test]
    fn released_renderer_draws_nothing() {
        let mut renderer = CurvePathRenderer::new();
        renderer.set_anchor_points(&[pos2(0.0, 0.0), pos2(1.0, 0.0)], 0.3, 4);
        renderer.set_thickness(0.2);
        assert!(matches!(renderer.shape(), Shape::Path(_) | Shape::LineSegment { .. }));

        renderer.release();
        assert!(renderer.is_released());
        assert!(matches!(renderer.shape(), Shape::Noop));
    }
}
