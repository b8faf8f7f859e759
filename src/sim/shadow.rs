//! Hard shadows cast by a point light (light painting)
//!
//! Each caster yields a quad running from its two silhouette points out along
//! the light rays for `length` pixels.

use glam::Vec2;

use crate::normalize_angle;

/// Something that blocks the light
#[derive(Debug, Clone, PartialEq)]
pub enum Caster {
    Circle { center: Vec2, radius: f32 },
    /// Convex outline
    Polygon(Vec<Vec2>),
}

impl Caster {
    /// Shadow polygon for this caster, empty when it casts none
    pub fn shadow(&self, light: Vec2, length: f32) -> Vec<Vec2> {
        match self {
            Caster::Circle { center, radius } => circle_shadow(*center, *radius, light, length)
                .map(|quad| quad.to_vec())
                .unwrap_or_default(),
            Caster::Polygon(points) => polygon_shadow(points, light, length),
        }
    }
}

/// Shadow quad behind a circle: `[tangent_a, far_a, far_b, tangent_b]`.
///
/// `None` when the light sits inside the circle.
pub fn circle_shadow(center: Vec2, radius: f32, light: Vec2, length: f32) -> Option<[Vec2; 4]> {
    let to_light = light - center;
    let dist = to_light.length();
    if !(dist > radius) || radius <= 0.0 {
        return None;
    }
    let dir = to_light / dist;
    // Angle at the centre between the light direction and each tangent point
    let half = (radius / dist).clamp(-1.0, 1.0).acos();
    let (sin, cos) = half.sin_cos();
    let rot = |s: f32| Vec2::new(dir.x * cos - dir.y * s, dir.x * s + dir.y * cos);

    let t1 = center + rot(sin) * radius;
    let t2 = center + rot(-sin) * radius;
    let far1 = t1 + (t1 - light).normalize_or_zero() * length;
    let far2 = t2 + (t2 - light).normalize_or_zero() * length;
    Some([t1, far1, far2, t2])
}

/// Shadow quad behind a convex caster, from its two angular extremes as seen
/// from the light.
///
/// Points coincident with the light are ignored. Returns an empty vec when
/// fewer than two usable points remain.
pub fn polygon_shadow(points: &[Vec2], light: Vec2, length: f32) -> Vec<Vec2> {
    let usable: Vec<Vec2> = points
        .iter()
        .copied()
        .filter(|p| p.is_finite() && p.distance_squared(light) > f32::EPSILON)
        .collect();
    if usable.len() < 2 {
        return Vec::new();
    }

    let centroid = usable.iter().copied().sum::<Vec2>() / usable.len() as f32;
    let axis = centroid - light;
    if axis.length_squared() <= f32::EPSILON {
        return Vec::new();
    }
    let base = axis.y.atan2(axis.x);
    let relative = |p: Vec2| {
        let d = p - light;
        normalize_angle(d.y.atan2(d.x) - base)
    };

    let mut lo = usable[0];
    let mut hi = usable[0];
    for &p in &usable[1..] {
        if relative(p) < relative(lo) {
            lo = p;
        }
        if relative(p) > relative(hi) {
            hi = p;
        }
    }
    if lo == hi {
        return Vec::new();
    }

    let extrude = |p: Vec2| p + (p - light).normalize_or_zero() * length;
    vec![lo, extrude(lo), extrude(hi), hi]
}
