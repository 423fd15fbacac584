//! Planar math shared by the hierarchy and the pose engine.
//!
//! Angles are in degrees. Scene coordinates are y-down, so a positive
//! rotation turns clockwise on screen.

use serde::{Deserialize, Serialize};

/// 2D point/vector. Serialized as `[x, y]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn add(self, o: Vec2) -> Vec2 {
        Vec2::new(self.x + o.x, self.y + o.y)
    }

    #[inline]
    pub fn sub(self, o: Vec2) -> Vec2 {
        Vec2::new(self.x - o.x, self.y - o.y)
    }

    #[inline]
    pub fn scale(self, s: f64) -> Vec2 {
        Vec2::new(self.x * s, self.y * s)
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<[f64; 2]> for Vec2 {
    fn from(v: [f64; 2]) -> Self {
        Vec2::new(v[0], v[1])
    }
}

impl From<Vec2> for [f64; 2] {
    fn from(v: Vec2) -> Self {
        [v.x, v.y]
    }
}

/// Rotate `v` by `degrees` around the origin.
#[inline]
pub fn rotate(v: Vec2, degrees: f64) -> Vec2 {
    let (s, c) = degrees.to_radians().sin_cos();
    Vec2::new(v.x * c - v.y * s, v.x * s + v.y * c)
}

/// Inverse of [`rotate`].
#[inline]
pub fn inverse_rotate(v: Vec2, degrees: f64) -> Vec2 {
    rotate(v, -degrees)
}

/// Axis-aligned bounding box `(min_x, min_y, max_x, max_y)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Rect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Rect {
    pub const fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.min_x + self.max_x) * 0.5,
            (self.min_y + self.max_y) * 0.5,
        )
    }
}

impl From<[f64; 4]> for Rect {
    fn from(r: [f64; 4]) -> Self {
        Rect::new(r[0], r[1], r[2], r[3])
    }
}

impl From<Rect> for [f64; 4] {
    fn from(r: Rect) -> Self {
        [r.min_x, r.min_y, r.max_x, r.max_y]
    }
}

/// Position, rotation and uniform scale in some coordinate frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform2 {
    pub position: Vec2,
    pub rotation: f64,
    pub scale: f64,
}

impl Default for Transform2 {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
            scale: 1.0,
        }
    }
}

impl Transform2 {
    /// Express `self` (a transform local to `parent`) in the parent's outer frame.
    ///
    /// Offsets are rotated but not scaled by the parent.
    pub fn compose(parent: &Transform2, local: &Transform2) -> Transform2 {
        Transform2 {
            position: parent
                .position
                .add(rotate(local.position, parent.rotation)),
            rotation: parent.rotation + local.rotation,
            scale: parent.scale * local.scale,
        }
    }

    /// Inverse of [`Transform2::compose`]: express `world` inside `parent`.
    /// A zero parent scale leaves the scale untouched.
    pub fn relative_to(parent: &Transform2, world: &Transform2) -> Transform2 {
        let scale = if parent.scale != 0.0 {
            world.scale / parent.scale
        } else {
            world.scale
        };
        Transform2 {
            position: inverse_rotate(world.position.sub(parent.position), parent.rotation),
            rotation: world.rotation - parent.rotation,
            scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec2, b: Vec2) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    #[test]
    fn rotate_quarter_turn() {
        let r = rotate(Vec2::new(1.0, 0.0), 90.0);
        assert!(close(r, Vec2::new(0.0, 1.0)));
        assert!(close(inverse_rotate(r, 90.0), Vec2::new(1.0, 0.0)));
    }

    #[test]
    fn compose_then_relative_is_identity() {
        let parent = Transform2 {
            position: Vec2::new(10.0, -4.0),
            rotation: 33.0,
            scale: 2.0,
        };
        let world = Transform2 {
            position: Vec2::new(-7.5, 12.0),
            rotation: 250.0,
            scale: 0.75,
        };
        let local = Transform2::relative_to(&parent, &world);
        let back = Transform2::compose(&parent, &local);
        assert!(close(back.position, world.position));
        assert!((back.rotation - world.rotation).abs() < 1e-9);
        assert!((back.scale - world.scale).abs() < 1e-9);
    }

    #[test]
    fn vec2_serializes_as_pair() {
        let s = serde_json::to_string(&Vec2::new(1.5, -2.0)).unwrap();
        assert_eq!(s, "[1.5,-2.0]");
        let r: Rect = serde_json::from_str("[0, 0, 10, 20]").unwrap();
        assert_eq!(r.center(), Vec2::new(5.0, 10.0));
    }
}
