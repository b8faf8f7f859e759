//! Particle Toybox - touch-driven particle toys on a shared 2D simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (emit, integrate, collide, cull)
//! - `renderer`: Immediate-mode surface boundary and the WebGPU host
//! - `driver`: Host frame timestamps to fixed simulation substeps
//! - `settings`: Runtime knobs, persisted as JSON

pub mod driver;
pub mod error;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use driver::FrameClock;
pub use error::{RenderError, SampleError, SettingsError};
pub use settings::{QualityPreset, Settings};
pub use sim::{FrameInput, InputEvent, Scene, tick};

use glam::Vec2;

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;
    /// Largest host frame gap fed to the accumulator (tab backgrounding)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Default per-step velocity damping
    pub const DEFAULT_FRICTION: f32 = 0.98;
    /// Default downward gravity (pixels/s²)
    pub const DEFAULT_GRAVITY: f32 = 30.0;
    /// Default wall restitution
    pub const DEFAULT_RESTITUTION: f32 = 0.7;

    /// Upper bound for the input intensity scalar
    pub const MAX_INTENSITY: f32 = 4.0;
    /// Forces weaker than this are dropped
    pub const FORCE_EPSILON: f32 = 0.001;

    /// Pinball ball defaults
    pub const BALL_RADIUS: f32 = 30.0;
    /// Closest approach used by gravity wells (avoids the 1/r² singularity)
    pub const WELL_MIN_DISTANCE: f32 = 10.0;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    if !angle.is_finite() {
        return 0.0;
    }
    if angle.abs() > 4.0 * PI {
        angle = angle.rem_euclid(2.0 * PI);
    }
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_normalize_angle_wraps() {
        assert!((normalize_angle(3.0 * PI) - (-PI)).abs() < 1e-4);
        assert!((normalize_angle(-PI / 2.0) + PI / 2.0).abs() < 1e-6);
        assert_eq!(normalize_angle(f32::NAN), 0.0);
        let far = normalize_angle(1e30);
        assert!((-PI..PI).contains(&far));
    }

    #[test]
    fn test_polar_to_cartesian() {
        let p = polar_to_cartesian(10.0, PI / 2.0);
        assert!(p.x.abs() < 1e-4);
        assert!((p.y - 10.0).abs() < 1e-4);
    }
}
