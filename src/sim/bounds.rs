//! Screen bounds and edge policies

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::pool::ParticlePool;

/// Axis-aligned rectangle in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Rect anchored at the origin (canvas-sized)
    pub fn from_size(width: f32, height: f32) -> Self {
        Self::new(Vec2::ZERO, Vec2::new(width.max(0.0), height.max(0.0)))
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Map `[0,1]²` input coordinates to pixels
    pub fn denormalize(&self, uv: Vec2) -> Vec2 {
        self.min + uv * self.size()
    }

    /// Map pixels to `[0,1]²` (zero on a degenerate axis)
    pub fn normalize(&self, p: Vec2) -> Vec2 {
        let size = self.size();
        let axis = |v: f32, lo: f32, extent: f32| if extent > 0.0 { (v - lo) / extent } else { 0.0 };
        Vec2::new(
            axis(p.x, self.min.x, size.x),
            axis(p.y, self.min.y, size.y),
        )
    }

    /// Uniformly random point inside
    pub fn random_point<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec2 {
        let size = self.size();
        Vec2::new(
            self.min.x + rng.random::<f32>() * size.x,
            self.min.y + rng.random::<f32>() * size.y,
        )
    }
}

/// What happens to a particle that leaves the bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BoundaryPolicy {
    /// No edges; particles fly off and expire
    Open,
    /// Clamp to the edge and reflect the velocity scaled by restitution
    Bounce { restitution: f32 },
    /// Re-enter from the opposite edge
    Wrap,
    /// Teleport to a random point inside
    Respawn,
}

impl Default for BoundaryPolicy {
    fn default() -> Self {
        BoundaryPolicy::Bounce {
            restitution: crate::consts::DEFAULT_RESTITUTION,
        }
    }
}

/// Clamp a circle of `radius` inside `rect`, reflecting the velocity on contact.
///
/// Returns true if any edge was touched. An axis narrower than the circle
/// centres it.
pub fn bounce_circle(pos: &mut Vec2, vel: &mut Vec2, radius: f32, rect: &Rect, restitution: f32) -> bool {
    let r = restitution.clamp(0.0, 1.0);
    let mut hit = false;
    for axis in 0..2 {
        let lo = rect.min[axis] + radius;
        let hi = rect.max[axis] - radius;
        if lo > hi {
            pos[axis] = (rect.min[axis] + rect.max[axis]) * 0.5;
            vel[axis] = 0.0;
            continue;
        }
        if pos[axis] < lo {
            pos[axis] = lo;
            vel[axis] = vel[axis].abs() * r;
            hit = true;
        } else if pos[axis] > hi {
            pos[axis] = hi;
            vel[axis] = -vel[axis].abs() * r;
            hit = true;
        }
    }
    hit
}

/// Apply the edge policy to every live particle
pub fn resolve_bounds<R: Rng + ?Sized>(
    pool: &mut ParticlePool,
    rect: &Rect,
    policy: BoundaryPolicy,
    rng: &mut R,
) {
    match policy {
        BoundaryPolicy::Open => {}
        BoundaryPolicy::Bounce { restitution } => {
            for p in pool.iter_mut().filter(|p| p.is_alive()) {
                bounce_circle(&mut p.pos, &mut p.vel, 0.0, rect, restitution);
            }
        }
        BoundaryPolicy::Wrap => {
            let size = rect.size();
            for p in pool.iter_mut().filter(|p| p.is_alive()) {
                for axis in 0..2 {
                    if size[axis] > 0.0 {
                        p.pos[axis] = rect.min[axis] + (p.pos[axis] - rect.min[axis]).rem_euclid(size[axis]);
                    } else {
                        p.pos[axis] = rect.min[axis];
                    }
                }
            }
        }
        BoundaryPolicy::Respawn => {
            for p in pool.iter_mut().filter(|p| p.is_alive()) {
                if !rect.contains(p.pos) {
                    p.pos = rect.random_point(rng);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::particle::Particle;
    use crate::sim::pool::EvictionPolicy;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn pool_with(pos: Vec2, vel: Vec2) -> ParticlePool {
        let mut pool = ParticlePool::new(4, EvictionPolicy::OldestFirst);
        pool.add(Particle::new(pos, vel, 1.0));
        pool
    }

    #[test]
    fn test_bounce_reflects_with_restitution() {
        let mut rng = Pcg32::seed_from_u64(0);
        let rect = Rect::from_size(100.0, 100.0);
        let mut pool = pool_with(Vec2::new(104.0, 50.0), Vec2::new(20.0, 3.0));
        resolve_bounds(&mut pool, &rect, BoundaryPolicy::Bounce { restitution: 0.5 }, &mut rng);

        let p = pool.iter().next().expect("particle");
        assert!((p.vel.x - (-10.0)).abs() < 1e-5);
        assert!((p.vel.y - 3.0).abs() < 1e-6);
        assert!(rect.contains(p.pos));
        assert_eq!(p.pos.x, 100.0);
    }

    #[test]
    fn test_bounce_left_and_top() {
        let mut rng = Pcg32::seed_from_u64(0);
        let rect = Rect::from_size(100.0, 100.0);
        let mut pool = pool_with(Vec2::new(-3.0, -8.0), Vec2::new(-10.0, -4.0));
        resolve_bounds(&mut pool, &rect, BoundaryPolicy::Bounce { restitution: 1.0 }, &mut rng);
        let p = pool.iter().next().expect("particle");
        assert_eq!(p.pos, Vec2::ZERO);
        assert_eq!(p.vel, Vec2::new(10.0, 4.0));
    }

    #[test]
    fn test_wrap() {
        let mut rng = Pcg32::seed_from_u64(0);
        let rect = Rect::from_size(100.0, 100.0);
        let mut pool = pool_with(Vec2::new(105.0, -5.0), Vec2::ZERO);
        resolve_bounds(&mut pool, &rect, BoundaryPolicy::Wrap, &mut rng);
        let p = pool.iter().next().expect("particle");
        assert!((p.pos.x - 5.0).abs() < 1e-4);
        assert!((p.pos.y - 95.0).abs() < 1e-4);
    }

    #[test]
    fn test_respawn_lands_inside() {
        let mut rng = Pcg32::seed_from_u64(9);
        let rect = Rect::new(Vec2::new(10.0, 10.0), Vec2::new(20.0, 30.0));
        let mut pool = pool_with(Vec2::new(500.0, -500.0), Vec2::new(1.0, 1.0));
        resolve_bounds(&mut pool, &rect, BoundaryPolicy::Respawn, &mut rng);
        let p = pool.iter().next().expect("particle");
        assert!(rect.contains(p.pos));
        assert_eq!(p.vel, Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_open_leaves_particles_alone() {
        let mut rng = Pcg32::seed_from_u64(0);
        let rect = Rect::from_size(10.0, 10.0);
        let mut pool = pool_with(Vec2::new(-50.0, 70.0), Vec2::ZERO);
        resolve_bounds(&mut pool, &rect, BoundaryPolicy::Open, &mut rng);
        assert_eq!(pool.iter().next().map(|p| p.pos), Some(Vec2::new(-50.0, 70.0)));
    }

    #[test]
    fn test_denormalize_and_normalize() {
        let rect = Rect::from_size(200.0, 100.0);
        let px = rect.denormalize(Vec2::new(0.5, 0.25));
        assert_eq!(px, Vec2::new(100.0, 25.0));
        assert_eq!(rect.normalize(px), Vec2::new(0.5, 0.25));
        assert_eq!(Rect::from_size(0.0, 0.0).normalize(Vec2::ONE), Vec2::ZERO);
    }

    #[test]
    fn test_bounce_circle_respects_radius() {
        let rect = Rect::from_size(100.0, 100.0);
        let mut pos = Vec2::new(95.0, 50.0);
        let mut vel = Vec2::new(10.0, 0.0);
        assert!(bounce_circle(&mut pos, &mut vel, 10.0, &rect, 0.7));
        assert_eq!(pos.x, 90.0);
        assert!((vel.x + 7.0).abs() < 1e-5);
    }
}
