//! Per-frame particle integration

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::forces::ActiveForce;
use super::particle::Shape;
use super::pool::ParticlePool;
use crate::consts::{DEFAULT_FRICTION, DEFAULT_GRAVITY};
use crate::normalize_angle;

/// Global motion parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Physics {
    /// Constant acceleration (pixels/s²)
    pub gravity: Vec2,
    /// Velocity multiplier applied once per step
    pub friction: f32,
}

impl Default for Physics {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, DEFAULT_GRAVITY),
            friction: DEFAULT_FRICTION,
        }
    }
}

impl Physics {
    /// No gravity, no damping
    pub const fn none() -> Self {
        Self {
            gravity: Vec2::ZERO,
            friction: 1.0,
        }
    }
}

/// Advance every live particle by `dt`.
///
/// `dt` is assumed sane; clamping is the frame driver's job.
pub fn step(pool: &mut ParticlePool, dt: f32, physics: &Physics, forces: &[ActiveForce]) {
    for p in pool.iter_mut() {
        if !p.is_alive() {
            continue;
        }

        let accel = forces
            .iter()
            .fold(physics.gravity, |a, f| a + f.accel_at(p.pos));
        p.vel += accel * dt;
        p.vel *= physics.friction;
        p.pos += p.vel * dt;
        p.life = (p.life - dt).clamp(0.0, p.max_life);

        match p.shape {
            Shape::Square | Shape::Triangle => {
                p.rotation = normalize_angle(p.rotation + p.spin * dt);
            }
            Shape::Star => {
                p.phase = (p.phase + p.twinkle * dt).rem_euclid(std::f32::consts::TAU);
            }
            Shape::Circle => {}
        }

        if !p.pos.is_finite() || !p.vel.is_finite() {
            p.kill();
        }
    }
}
