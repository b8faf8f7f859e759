//! Transient force fields and sand-table brush tools

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::pool::ParticlePool;
use crate::consts::FORCE_EPSILON;

/// Acceleration field sampled per particle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ForceField {
    /// Same acceleration everywhere (drag push, wind)
    Uniform { accel: Vec2 },
    /// Push (positive) or pull (negative) around a point, fading linearly to
    /// zero at `radius`
    Radial {
        center: Vec2,
        radius: f32,
        strength: f32,
    },
}

impl ForceField {
    pub fn accel_at(&self, pos: Vec2) -> Vec2 {
        match *self {
            ForceField::Uniform { accel } => accel,
            ForceField::Radial {
                center,
                radius,
                strength,
            } => {
                let offset = pos - center;
                let dist = offset.length();
                if dist <= 0.0 || dist >= radius {
                    return Vec2::ZERO;
                }
                offset / dist * strength * (1.0 - dist / radius)
            }
        }
    }
}

/// A force field whose gain shrinks geometrically every frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveForce {
    pub field: ForceField,
    pub gain: f32,
    /// Per-frame gain multiplier in [0, 1)
    pub decay: f32,
}

impl ActiveForce {
    pub fn new(field: ForceField, decay: f32) -> Self {
        let decay = if decay.is_finite() { decay.clamp(0.0, 0.999) } else { 0.0 };
        Self {
            field,
            gain: 1.0,
            decay,
        }
    }

    pub fn accel_at(&self, pos: Vec2) -> Vec2 {
        self.field.accel_at(pos) * self.gain
    }

    /// Decay once; returns false when the force has faded out
    pub fn decay(&mut self) -> bool {
        self.gain *= self.decay;
        if self.gain < FORCE_EPSILON {
            self.gain = 0.0;
        }
        self.is_active()
    }

    pub fn is_active(&self) -> bool {
        self.gain >= FORCE_EPSILON
    }
}

/// Gravity vector from normalized device tilt (each axis clamped to [-1, 1])
pub fn gravity_from_tilt(x: f32, y: f32, strength: f32) -> Vec2 {
    let axis = |v: f32| if v.is_finite() { v.clamp(-1.0, 1.0) } else { 0.0 };
    Vec2::new(axis(x), axis(y)) * strength
}

/// One-shot sand-table tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BrushTool {
    /// Push particles away from the centre
    Dig,
    /// Pull particles toward their local mean and calm them
    Smooth,
    /// Random kick
    Shake,
}

/// Apply a brush to live particles within `radius` of `center`.
///
/// Returns how many particles were affected.
pub fn apply_brush<R: Rng + ?Sized>(
    pool: &mut ParticlePool,
    tool: BrushTool,
    center: Vec2,
    radius: f32,
    strength: f32,
    rng: &mut R,
) -> usize {
    if !(radius > 0.0) || !strength.is_finite() || !center.is_finite() {
        return 0;
    }
    let in_reach = |pos: Vec2| {
        let d = pos.distance(center);
        (d < radius).then_some(d)
    };

    let mean = if tool == BrushTool::Smooth {
        let (sum, n) = pool
            .iter()
            .filter(|p| p.is_alive() && in_reach(p.pos).is_some())
            .fold((Vec2::ZERO, 0u32), |(s, n), p| (s + p.pos, n + 1));
        if n == 0 {
            return 0;
        }
        sum / n as f32
    } else {
        center
    };

    let mut affected = 0;
    for p in pool.iter_mut().filter(|p| p.is_alive()) {
        let Some(dist) = in_reach(p.pos) else {
            continue;
        };
        let falloff = strength * (1.0 - dist / radius);
        match tool {
            BrushTool::Dig => {
                p.vel += (p.pos - center).normalize_or_zero() * falloff;
            }
            BrushTool::Smooth => {
                p.vel += (mean - p.pos).normalize_or_zero() * falloff;
                p.vel *= 0.9;
            }
            BrushTool::Shake => {
                let angle = rng.random_range(0.0..std::f32::consts::TAU);
                p.vel += crate::polar_to_cartesian(falloff, angle);
            }
        }
        affected += 1;
    }
    affected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::particle::Particle;
    use crate::sim::pool::EvictionPolicy;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_radial_push_and_pull() {
        let push = ForceField::Radial {
            center: Vec2::ZERO,
            radius: 100.0,
            strength: 10.0,
        };
        let a = push.accel_at(Vec2::new(50.0, 0.0));
        assert!((a.x - 5.0).abs() < 1e-5);
        assert_eq!(a.y, 0.0);

        let pull = ForceField::Radial {
            center: Vec2::ZERO,
            radius: 100.0,
            strength: -10.0,
        };
        assert!(pull.accel_at(Vec2::new(0.0, 50.0)).y < 0.0);
    }

    #[test]
    fn test_radial_degenerate_offsets() {
        let field = ForceField::Radial {
            center: Vec2::new(5.0, 5.0),
            radius: 10.0,
            strength: 100.0,
        };
        assert_eq!(field.accel_at(Vec2::new(5.0, 5.0)), Vec2::ZERO);
        assert_eq!(field.accel_at(Vec2::new(500.0, 5.0)), Vec2::ZERO);
    }

    #[test]
    fn test_active_force_decays_out() {
        let mut force = ActiveForce::new(
            ForceField::Uniform {
                accel: Vec2::new(1.0, 0.0),
            },
            0.5,
        );
        let mut frames = 0;
        while force.decay() {
            frames += 1;
            assert!(frames < 100);
        }
        // 0.5^10 < 0.001 <= 0.5^9
        assert_eq!(frames, 9);
        assert_eq!(force.accel_at(Vec2::ZERO), Vec2::ZERO);
    }

    #[test]
    fn test_tilt_is_clamped() {
        let g = gravity_from_tilt(3.0, -0.5, 10.0);
        assert_eq!(g, Vec2::new(10.0, -5.0));
        assert_eq!(gravity_from_tilt(f32::NAN, 1.0, 2.0), Vec2::new(0.0, 2.0));
    }

    fn sand_pool() -> ParticlePool {
        let mut pool = ParticlePool::new(8, EvictionPolicy::OldestFirst);
        pool.add(Particle::new(Vec2::new(10.0, 0.0), Vec2::ZERO, 1.0));
        pool.add(Particle::new(Vec2::new(-10.0, 0.0), Vec2::ZERO, 1.0));
        pool.add(Particle::new(Vec2::new(500.0, 0.0), Vec2::ZERO, 1.0));
        pool
    }

    #[test]
    fn test_dig_pushes_outward() {
        let mut rng = Pcg32::seed_from_u64(0);
        let mut pool = sand_pool();
        let n = apply_brush(&mut pool, BrushTool::Dig, Vec2::ZERO, 20.0, 4.0, &mut rng);
        assert_eq!(n, 2);
        let vels: Vec<Vec2> = pool.iter().map(|p| p.vel).collect();
        assert!((vels[0].x - 2.0).abs() < 1e-5);
        assert!((vels[1].x + 2.0).abs() < 1e-5);
        assert_eq!(vels[2], Vec2::ZERO);
    }

    #[test]
    fn test_smooth_pulls_to_mean_and_damps() {
        let mut rng = Pcg32::seed_from_u64(0);
        let mut pool = ParticlePool::new(4, EvictionPolicy::OldestFirst);
        pool.add(Particle::new(Vec2::new(0.0, 0.0), Vec2::new(0.0, 10.0), 1.0));
        pool.add(Particle::new(Vec2::new(10.0, 0.0), Vec2::ZERO, 1.0));
        apply_brush(&mut pool, BrushTool::Smooth, Vec2::ZERO, 20.0, 2.0, &mut rng);
        let first = pool.iter().next().map(|p| p.vel).unwrap_or_default();
        assert!(first.x > 0.0);
        assert!(first.y < 10.0);
    }

    #[test]
    fn test_brush_with_bad_radius_is_noop() {
        let mut rng = Pcg32::seed_from_u64(0);
        let mut pool = sand_pool();
        assert_eq!(apply_brush(&mut pool, BrushTool::Shake, Vec2::ZERO, 0.0, 1.0, &mut rng), 0);
        assert_eq!(
            apply_brush(&mut pool, BrushTool::Shake, Vec2::ZERO, f32::NAN, 1.0, &mut rng),
            0
        );
    }
}
