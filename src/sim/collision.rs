//! Collision detection and response for circular bodies
//!
//! Narrow-phase tests return a `CollisionResult` whose normal points toward
//! the body being pushed. Response is a discrete impulse plus positional
//! correction; there is no swept test, so a body moving more than its radius
//! per step can pass through a thin wall.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// A rigid circle (pinball ball)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Non-positive mass makes the body static
    pub mass: f32,
    pub restitution: f32,
    /// Portal pair the body was last sent through and has not yet left
    pub portal_lock: Option<u32>,
}

impl Body {
    pub fn new(id: u32, pos: Vec2, vel: Vec2, radius: f32) -> Self {
        Self {
            id,
            pos,
            vel,
            radius: radius.max(0.0),
            mass: 1.0,
            restitution: 1.0,
            portal_lock: None,
        }
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    #[inline]
    pub fn inv_mass(&self) -> f32 {
        if self.mass > 0.0 && self.mass.is_finite() {
            1.0 / self.mass
        } else {
            0.0
        }
    }

    pub fn is_static(&self) -> bool {
        self.inv_mass() == 0.0
    }
}

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Contact point (if hit)
    pub point: Vec2,
    /// Unit contact normal
    pub normal: Vec2,
    /// Penetration depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec2::ZERO,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Overlap between two circles; the normal points from `a` to `b`.
///
/// Coincident centres have no usable normal and report a miss.
pub fn circle_circle(a_pos: Vec2, a_radius: f32, b_pos: Vec2, b_radius: f32) -> CollisionResult {
    let delta = b_pos - a_pos;
    let dist = delta.length();
    let reach = a_radius + b_radius;
    if dist >= reach || dist <= f32::EPSILON {
        return CollisionResult::miss();
    }
    let normal = delta / dist;
    CollisionResult {
        hit: true,
        point: a_pos + normal * a_radius,
        normal,
        penetration: reach - dist,
    }
}

/// Circle against a thick segment (capsule); the normal points toward the circle
pub fn circle_segment(pos: Vec2, radius: f32, a: Vec2, b: Vec2, thickness: f32) -> CollisionResult {
    let line_vec = b - a;
    let line_len_sq = line_vec.length_squared();
    let t = if line_len_sq < 0.0001 {
        0.0
    } else {
        ((pos - a).dot(line_vec) / line_len_sq).clamp(0.0, 1.0)
    };
    let closest = a + line_vec * t;
    let offset = pos - closest;
    let dist = offset.length();
    let reach = radius + thickness.max(0.0) * 0.5;

    if dist >= reach {
        return CollisionResult::miss();
    }

    let normal = if dist > f32::EPSILON {
        offset / dist
    } else {
        // Centre on the line: push out along the segment's perpendicular
        line_vec.perp().normalize_or_zero()
    };
    if normal == Vec2::ZERO {
        return CollisionResult::miss();
    }
    CollisionResult {
        hit: true,
        point: closest,
        normal,
        penetration: reach - dist,
    }
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Resolve an overlapping pair with an impulse along the contact normal.
///
/// Bodies are separated by the full overlap, split by inverse mass. Returns
/// whether the pair was in contact.
pub fn resolve_pair(a: &mut Body, b: &mut Body) -> bool {
    let contact = circle_circle(a.pos, a.radius, b.pos, b.radius);
    if !contact.hit {
        return false;
    }
    let inv_a = a.inv_mass();
    let inv_b = b.inv_mass();
    let inv_sum = inv_a + inv_b;
    if inv_sum <= 0.0 {
        return true;
    }
    let n = contact.normal;

    let rel_along_normal = (b.vel - a.vel).dot(n);
    if rel_along_normal < 0.0 {
        let restitution = a.restitution.max(b.restitution).max(0.0);
        let impulse = -(1.0 + restitution) * rel_along_normal / inv_sum;
        a.vel -= n * impulse * inv_a;
        b.vel += n * impulse * inv_b;
    }

    let correction = contact.penetration / inv_sum;
    a.pos -= n * correction * inv_a;
    b.pos += n * correction * inv_b;
    true
}

/// Push a body out of a static surface and bounce it off.
///
/// `restitution` above 1.0 adds energy (bumpers).
pub fn resolve_static(body: &mut Body, contact: &CollisionResult, restitution: f32) {
    if !contact.hit || body.is_static() {
        return;
    }
    let n = contact.normal;
    body.pos += n * contact.penetration;
    let vn = body.vel.dot(n);
    if vn < 0.0 {
        body.vel -= (1.0 + restitution.max(0.0)) * vn * n;
    }
}
