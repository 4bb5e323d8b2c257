use eframe::epaint::{Color32, QuadraticBezierShape, Stroke};
use emath::Pos2;

use crate::ext::{Pos2Ext, Vec2Ext};

/// Rounds every interior corner of `anchors` with a quadratic bezier.
///
/// The curve starts `curve_amount` before the corner and ends `curve_amount`
/// after it, each cut clamped to half of the adjacent segment so neighbouring
/// curves never overlap. Endpoints are kept as is.
pub fn smooth_path(anchors: &[Pos2], curve_amount: f32, resolution: usize) -> Vec<Pos2> {
    if anchors.len() < 3 || curve_amount <= 0.0 || resolution == 0 {
        return anchors.to_vec();
    }

    let mut points = Vec::with_capacity(2 + (anchors.len() - 2) * (resolution + 1));
    points.push(anchors[0]);

    for window in anchors.windows(3) {
        let (prev, corner, next) = (window[0], window[1], window[2]);

        let to_prev = prev - corner;
        let to_next = next - corner;
        let (Some(dir_prev), Some(dir_next)) = (to_prev.try_normalized(), to_next.try_normalized())
        else {
            points.push(corner);
            continue;
        };

        let start = corner + dir_prev * (to_prev.length() * 0.5).min(curve_amount);
        let end = corner + dir_next * (to_next.length() * 0.5).min(curve_amount);

        let bezier = QuadraticBezierShape {
            points: [start, corner, end],
            closed: false,
            fill: Color32::TRANSPARENT,
            stroke: Stroke::NONE,
        };

        for i in 0..=resolution {
            points.push(bezier.sample(i as f32 / resolution as f32));
        }
    }

    points.push(anchors[anchors.len() - 1]);
    points.dedup_by(|a, b| a.within_sq(*b, f32::EPSILON));
    points
}

pub fn closest_point_on_polyline(points: &[Pos2], p: Pos2) -> Option<Pos2> {
    match points {
        [] => None,
        [single] => Some(*single),
        _ => points
            .windows(2)
            .map(|seg| p.project_on_segment(seg[0], seg[1]))
            .min_by(|a, b| a.distance_sq(p).total_cmp(&b.distance_sq(p))),
    }
}

pub fn distance_sq_to_polyline(points: &[Pos2], p: Pos2) -> Option<f32> {
    closest_point_on_polyline(points, p).map(|c| c.distance_sq(p))
}

#[cfg(test)]
mod test {
    use emath::pos2;

    use super::{closest_point_on_polyline, distance_sq_to_polyline, smooth_path};
    use crate::ext::Pos2Ext;

    #[test]
    fn straight_paths_are_unchanged() {
        let anchors = [pos2(0.0, 0.0), pos2(4.0, 0.0)];
        assert_eq!(smooth_path(&anchors, 0.5, 8), anchors.to_vec());

        let corner = [pos2(0.0, 0.0), pos2(4.0, 0.0), pos2(4.0, 4.0)];
        assert_eq!(smooth_path(&corner, 0.0, 8), corner.to_vec());
    }

    #[test]
    fn corners_are_rounded() {
        let anchors = [pos2(0.0, 0.0), pos2(4.0, 0.0), pos2(4.0, 4.0)];
        let points = smooth_path(&anchors, 1.0, 4);

        assert_eq!(points.first(), Some(&anchors[0]));
        assert_eq!(points.last(), Some(&anchors[2]));
        assert_eq!(points.len(), 2 + 5);

        assert!(points[1].within_sq(pos2(3.0, 0.0), 1e-6));
        assert!(points[5].within_sq(pos2(4.0, 1.0), 1e-6));
        // the sharp corner itself is cut off
        assert!(!points.iter().any(|p| p.within_sq(anchors[1], 1e-4)));
    }

    #[test]
    fn curve_cut_is_clamped_to_half_segment() {
        let anchors = [pos2(0.0, 0.0), pos2(1.0, 0.0), pos2(1.0, 10.0)];
        let points = smooth_path(&anchors, 5.0, 2);
        assert!(points[1].within_sq(pos2(0.5, 0.0), 1e-6));
    }

    #[test]
    fn closest_point_projects_on_segments() {
        let line = [pos2(0.0, 0.0), pos2(10.0, 0.0), pos2(10.0, 10.0)];
        let closest = closest_point_on_polyline(&line, pos2(5.0, 3.0)).unwrap();
        assert!(closest.within_sq(pos2(5.0, 0.0), 1e-6));

        let closest = closest_point_on_polyline(&line, pos2(12.0, 8.0)).unwrap();
        assert!(closest.within_sq(pos2(10.0, 8.0), 1e-6));

        assert_eq!(closest_point_on_polyline(&[], pos2(0.0, 0.0)), None);
        assert_eq!(distance_sq_to_polyline(&[pos2(1.0, 1.0)], pos2(1.0, 3.0)), Some(4.0));
    }
}
