//! Triangle-list tessellation for 2D primitives

use glam::Vec2;
use std::f32::consts::TAU;

use super::batch::Vertex;
use crate::sim::particle::Color;

/// Segment count for a circle of `radius` pixels
pub fn segments_for(radius: f32) -> u32 {
    ((radius * 0.75) as u32).clamp(6, 48)
}

fn point_on(center: Vec2, radius: f32, theta: f32) -> Vec2 {
    center + Vec2::new(theta.cos(), theta.sin()) * radius
}

/// Append a filled circle as a triangle fan
pub fn circle(out: &mut Vec<Vertex>, center: Vec2, radius: f32, color: Color, segments: u32) {
    let segments = segments.max(3);
    out.reserve((segments * 3) as usize);

    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * TAU;
        let theta2 = ((i + 1) as f32 / segments as f32) * TAU;

        // Triangle from center to edge
        out.push(Vertex::at(center, color));
        out.push(Vertex::at(point_on(center, radius, theta1), color));
        out.push(Vertex::at(point_on(center, radius, theta2), color));
    }
}

/// Append a ring (hollow circle) between two radii
pub fn ring(
    out: &mut Vec<Vertex>,
    center: Vec2,
    inner_radius: f32,
    outer_radius: f32,
    color: Color,
    segments: u32,
) {
    let segments = segments.max(3);
    out.reserve((segments * 6) as usize);

    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * TAU;
        let theta2 = ((i + 1) as f32 / segments as f32) * TAU;

        let inner1 = point_on(center, inner_radius, theta1);
        let outer1 = point_on(center, outer_radius, theta1);
        let inner2 = point_on(center, inner_radius, theta2);
        let outer2 = point_on(center, outer_radius, theta2);

        // Two triangles per segment
        out.push(Vertex::at(inner1, color));
        out.push(Vertex::at(outer1, color));
        out.push(Vertex::at(inner2, color));

        out.push(Vertex::at(inner2, color));
        out.push(Vertex::at(outer1, color));
        out.push(Vertex::at(outer2, color));
    }
}

/// Append a polygon fanned from its centroid (exact for convex and star shapes)
pub fn polygon(out: &mut Vec<Vertex>, points: &[Vec2], color: Color) {
    if points.len() < 3 {
        return;
    }
    let centroid = points.iter().copied().sum::<Vec2>() / points.len() as f32;
    out.reserve(points.len() * 3);

    for (i, &a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        out.push(Vertex::at(centroid, color));
        out.push(Vertex::at(a, color));
        out.push(Vertex::at(b, color));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_vertex_count() {
        let mut out = Vec::new();
        circle(&mut out, Vec2::ZERO, 10.0, Color::WHITE, 12);
        assert_eq!(out.len(), 36);
        assert!(out.iter().all(|v| Vec2::from(v.position).length() <= 10.0 + 1e-4));
    }

    #[test]
    fn test_ring_stays_between_radii() {
        let mut out = Vec::new();
        ring(&mut out, Vec2::new(5.0, 5.0), 8.0, 10.0, Color::WHITE, 16);
        assert_eq!(out.len(), 96);
        for v in &out {
            let d = Vec2::from(v.position).distance(Vec2::new(5.0, 5.0));
            assert!((8.0 - 1e-3..=10.0 + 1e-3).contains(&d));
        }
    }

    #[test]
    fn test_polygon_needs_three_points() {
        let mut out = Vec::new();
        polygon(&mut out, &[Vec2::ZERO, Vec2::X], Color::WHITE);
        assert!(out.is_empty());
        polygon(&mut out, &[Vec2::ZERO, Vec2::X, Vec2::Y], Color::WHITE);
        assert_eq!(out.len(), 9);
    }

    #[test]
    fn test_segments_scale_with_radius() {
        assert_eq!(segments_for(1.0), 6);
        assert_eq!(segments_for(1000.0), 48);
        assert!(segments_for(20.0) > segments_for(8.0));
    }
}
