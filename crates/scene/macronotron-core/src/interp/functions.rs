//! Interpolation functions:
//! - lerp_f64 / lerp_vec2 (component-wise linear)
//! - shortest_arc_delta / lerp_angle (degrees, never more than 180° of travel)
//! - lerp_transform (shortest-arc rotation, linear position and scale)
//! - step (hold the left value)

use crate::geometry::{Transform2, Vec2};

/// Linear interpolation of scalars.
#[inline]
pub fn lerp_f64(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

#[inline]
pub fn lerp_vec2(a: Vec2, b: Vec2, t: f64) -> Vec2 {
    Vec2::new(lerp_f64(a.x, b.x, t), lerp_f64(a.y, b.y, t))
}

/// Signed travel from `a` to `b` in `[-180, 180)`.
#[inline]
pub fn shortest_arc_delta(a: f64, b: f64) -> f64 {
    (b - a + 180.0).rem_euclid(360.0) - 180.0
}

/// Angle interpolation along the shortest arc. The result is not wrapped back
/// into `[0, 360)`: `lerp_angle(350, 10, 0.5) == 360`.
///
/// Pairwise only; a run of three or more keyframes with large rotations is not
/// unwrapped across segments.
#[inline]
pub fn lerp_angle(a: f64, b: f64, t: f64) -> f64 {
    a + shortest_arc_delta(a, b) * t
}

/// Blend two transforms that live in the same coordinate frame.
#[inline]
pub fn lerp_transform(a: &Transform2, b: &Transform2, t: f64) -> Transform2 {
    Transform2 {
        position: lerp_vec2(a.position, b.position, t),
        rotation: lerp_angle(a.rotation, b.rotation, t),
        scale: lerp_f64(a.scale, b.scale, t),
    }
}

/// Step semantics: hold the left value for the whole segment.
#[inline]
pub fn step<T: Clone>(left: &T) -> T {
    left.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arc_crosses_zero_seam() {
        assert_eq!(shortest_arc_delta(350.0, 10.0), 20.0);
        assert_eq!(lerp_angle(350.0, 10.0, 0.5), 360.0);
        assert_eq!(lerp_angle(10.0, 350.0, 0.5), 0.0);
    }

    #[test]
    fn half_turn_goes_negative() {
        assert_eq!(shortest_arc_delta(0.0, 180.0), -180.0);
        assert_eq!(shortest_arc_delta(0.0, 90.0), 90.0);
        assert_eq!(shortest_arc_delta(720.0, 0.0), 0.0);
    }

    #[test]
    fn transform_blend() {
        let a = Transform2 {
            position: Vec2::new(0.0, 0.0),
            rotation: 0.0,
            scale: 1.0,
        };
        let b = Transform2 {
            position: Vec2::new(10.0, 20.0),
            rotation: 90.0,
            scale: 2.0,
        };
        let m = lerp_transform(&a, &b, 0.5);
        assert_eq!(m.position, Vec2::new(5.0, 10.0));
        assert_eq!(m.rotation, 45.0);
        assert_eq!(m.scale, 1.5);
        assert_eq!(step(&"left"), "left");
    }
}
