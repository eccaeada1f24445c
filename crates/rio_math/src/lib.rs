//! # rio_math - 2D Math Primitives
//!
//! Small value types shared by the physics, navigation and entity crates.
//! Screen space is y-down: positive `y` points downstream.

pub mod vector;

pub use vector::*;

/// Common math constants
pub mod consts {
    pub const PI: f32 = core::f32::consts::PI;
    pub const TAU: f32 = PI * 2.0;
    pub const EPSILON: f32 = 1e-6;
}

/// Clamp a value into `[-1, 1]`, the range of every steering intent.
#[inline]
pub fn clamp_unit(value: f32) -> f32 {
    value.clamp(-1.0, 1.0)
}
