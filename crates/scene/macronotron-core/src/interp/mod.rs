//! Interpolation helpers.
//!
//! Three policies only: linear for positions and scales, shortest-arc for
//! angles, step (hold left) for discrete channels such as variants.

pub mod functions;

pub use functions::{lerp_angle, lerp_f64, lerp_transform, lerp_vec2, shortest_arc_delta, step};
