use emath::{Pos2, Vec2};

pub trait Pos2Ext {
    /// True if `other` is at most `dist_sq` squared units away.
    fn within_sq(self, other: Pos2, dist_sq: f32) -> bool;

    /// Closest point to `self` on the segment `a..b`.
    fn project_on_segment(self, a: Pos2, b: Pos2) -> Pos2;
}

impl Pos2Ext for Pos2 {
    fn within_sq(self, other: Pos2, dist_sq: f32) -> bool {
        self.distance_sq(other) <= dist_sq
    }

    fn project_on_segment(self, a: Pos2, b: Pos2) -> Pos2 {
        let ab = b - a;
        let len_sq = ab.length_sq();
        if len_sq <= f32::EPSILON {
            return a;
        }
        let t = ((self - a).dot(ab) / len_sq).clamp(0.0, 1.0);
        a + ab * t
    }
}

pub trait Vec2Ext {
    /// Unit vector, or `None` for a (near) zero vector.
    fn try_normalized(self) -> Option<Vec2>;
}

impl Vec2Ext for Vec2 {
    fn try_normalized(self) -> Option<Vec2> {
        let len = self.length();
        (len > f32::EPSILON).then(|| self / len)
    }
}
