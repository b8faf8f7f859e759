//! Rendering module
//!
//! `draw` walks the scene read-only and issues immediate-mode calls against a
//! `Surface`. The simulation never sees a graphics API; the WebGPU host is one
//! `Surface` implementation (`VertexBatch`) plus the pipeline that uploads it.

pub mod batch;
pub mod pipeline;
pub mod shapes;

pub use batch::{Vertex, VertexBatch};
pub use pipeline::RenderState;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI, TAU};

use crate::sim::effects::Ripple;
use crate::sim::particle::{Color, Particle, Shape};
use crate::sim::pool::ParticlePool;
use crate::sim::scene::Scene;
use crate::sim::shadow::Caster;
use crate::sim::table::{Obstacle, Table};

/// Immediate-mode drawing target. Coordinates are scene pixels.
pub trait Surface {
    fn clear(&mut self, color: Color);
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color);
    /// Convex or star-shaped polygon, filled from its first point
    fn fill_polygon(&mut self, points: &[Vec2], color: Color);
    fn stroke_ring(&mut self, center: Vec2, radius: f32, width: f32, color: Color);
}

/// How alpha follows the remaining-life ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AlphaCurve {
    #[default]
    Linear,
    /// Stays bright, fades late
    EaseOut,
    EaseInOut,
}

impl AlphaCurve {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlphaCurve::Linear => "linear",
            AlphaCurve::EaseOut => "ease-out",
            AlphaCurve::EaseInOut => "ease-in-out",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "linear" => Some(AlphaCurve::Linear),
            "ease-out" => Some(AlphaCurve::EaseOut),
            "ease-in-out" => Some(AlphaCurve::EaseInOut),
            _ => None,
        }
    }

    /// Map a life ratio in [0, 1] to an alpha multiplier in [0, 1]
    pub fn apply(&self, ratio: f32) -> f32 {
        let t = if ratio.is_finite() { ratio.clamp(0.0, 1.0) } else { 0.0 };
        match self {
            AlphaCurve::Linear => t,
            AlphaCurve::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            AlphaCurve::EaseInOut => t * t * (3.0 - 2.0 * t),
        }
    }
}

pub const BACKGROUND: Color = Color::rgba(0.02, 0.02, 0.05, 1.0);
/// Shadow fill for light painting
pub const SHADOW: Color = Color::rgba(0.0, 0.0, 0.0, 0.6);

pub const BALL: Color = Color::rgba(0.92, 0.92, 0.96, 1.0);
pub const WALL: Color = Color::rgba(0.45, 0.5, 0.65, 1.0);
pub const BUMPER: Color = Color::rgba(1.0, 0.4, 0.2, 1.0);
pub const WELL: Color = Color::rgba(0.6, 0.2, 0.8, 0.8);
pub const PORTAL: Color = Color::rgba(0.2, 0.8, 1.0, 1.0);
pub const CASTER: Color = Color::rgba(0.3, 0.3, 0.35, 1.0);

/// Points per rounded wall end
const CAP_SEGMENTS: usize = 6;

/// Star sprite points
const STAR_POINTS: usize = 5;
const STAR_INNER_RATIO: f32 = 0.45;

/// Corners of a regular polygon with `n` sides, first corner at `rotation`
fn regular_polygon(center: Vec2, radius: f32, n: usize, rotation: f32) -> Vec<Vec2> {
    (0..n)
        .map(|i| {
            let theta = rotation + i as f32 / n as f32 * TAU;
            center + Vec2::new(theta.cos(), theta.sin()) * radius
        })
        .collect()
}

fn star_points(center: Vec2, radius: f32, rotation: f32) -> Vec<Vec2> {
    (0..STAR_POINTS * 2)
        .map(|i| {
            let r = if i % 2 == 0 { radius } else { radius * STAR_INNER_RATIO };
            let theta = rotation - FRAC_PI_2 + i as f32 * PI / STAR_POINTS as f32;
            center + Vec2::new(theta.cos(), theta.sin()) * r
        })
        .collect()
}

fn draw_particle<S: Surface + ?Sized>(p: &Particle, surface: &mut S, curve: AlphaCurve) {
    let mut alpha = p.color.alpha() * curve.apply(p.life_ratio());
    let radius = p.size * 0.5;
    match p.shape {
        Shape::Circle => {
            surface.fill_circle(p.pos, radius, p.color.with_alpha(alpha));
        }
        Shape::Square => {
            let corners = regular_polygon(p.pos, radius * std::f32::consts::SQRT_2, 4, p.rotation + PI / 4.0);
            surface.fill_polygon(&corners, p.color.with_alpha(alpha));
        }
        Shape::Triangle => {
            let corners = regular_polygon(p.pos, radius, 3, p.rotation - FRAC_PI_2);
            surface.fill_polygon(&corners, p.color.with_alpha(alpha));
        }
        Shape::Star => {
            // Twinkle between half and full brightness
            alpha *= 0.75 + 0.25 * p.phase.sin();
            surface.fill_polygon(&star_points(p.pos, radius, p.rotation), p.color.with_alpha(alpha));
        }
    }
}

/// Draw live particles (pool order) then rings. Reads only.
pub fn draw<S: Surface + ?Sized>(pool: &ParticlePool, ripples: &[Ripple], surface: &mut S, curve: AlphaCurve) {
    for p in pool.iter().filter(|p| p.is_alive() && p.size > 0.0) {
        draw_particle(p, surface, curve);
    }
    for r in ripples.iter().filter(|r| r.is_alive()) {
        let alpha = r.color.alpha() * curve.apply(r.life_ratio());
        surface.stroke_ring(r.center, r.radius, r.width, r.color.with_alpha(alpha));
    }
}

/// Convex stadium outline around segment `a`-`b`
fn capsule(a: Vec2, b: Vec2, half_width: f32) -> Vec<Vec2> {
    let dir = (b - a).normalize_or_zero();
    if dir == Vec2::ZERO {
        return regular_polygon(a, half_width, CAP_SEGMENTS * 2, 0.0);
    }
    let base = dir.perp().to_angle();
    let arc = |center: Vec2, start: f32| {
        (0..=CAP_SEGMENTS).map(move |i| {
            let theta = start - i as f32 / CAP_SEGMENTS as f32 * PI;
            center + Vec2::new(theta.cos(), theta.sin()) * half_width
        })
    };
    arc(b, base).chain(arc(a, base - PI)).collect()
}

/// Draw the pinball table: furniture first, balls on top. Reads only.
pub fn draw_table<S: Surface + ?Sized>(table: &Table, surface: &mut S) {
    for obstacle in &table.obstacles {
        match *obstacle {
            Obstacle::Wall { a, b, thickness } => {
                surface.fill_polygon(&capsule(a, b, thickness * 0.5), WALL);
            }
            Obstacle::Bumper { center, radius, .. } => surface.stroke_ring(center, radius, 4.0, BUMPER),
            Obstacle::GravityWell { center, radius, .. } => surface.stroke_ring(center, radius, 2.0, WELL),
            Obstacle::Portal { center, radius, .. } => surface.stroke_ring(center, radius, 3.0, PORTAL),
        }
    }
    for body in &table.bodies {
        surface.fill_circle(body.pos, body.radius, BALL);
    }
}

/// Fill each shadow polygon
pub fn draw_shadows<S: Surface + ?Sized>(shadows: &[Vec<Vec2>], surface: &mut S, color: Color) {
    for shadow in shadows.iter().filter(|s| s.len() >= 3) {
        surface.fill_polygon(shadow, color);
    }
}

/// Shadow-casting shapes, drawn over their own shadows
pub fn draw_casters<S: Surface + ?Sized>(casters: &[Caster], surface: &mut S, color: Color) {
    for caster in casters {
        match caster {
            Caster::Circle { center, radius } => surface.fill_circle(*center, *radius, color),
            Caster::Polygon(points) if points.len() >= 3 => surface.fill_polygon(points, color),
            Caster::Polygon(_) => {}
        }
    }
}

/// Whole frame, back to front: shadows, casters, table, particles and rings
pub fn draw_scene<S: Surface + ?Sized>(scene: &Scene, surface: &mut S) {
    surface.clear(BACKGROUND);
    draw_shadows(&scene.shadows(), surface, SHADOW);
    draw_casters(&scene.casters, surface, CASTER);
    draw_table(&scene.table, surface);
    draw(&scene.pool, &scene.ripples, surface, scene.settings.alpha_curve);
}
