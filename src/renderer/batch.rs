//! CPU-side vertex batch: the `Surface` the WebGPU host draws into

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use super::Surface;
use super::shapes;
use crate::sim::particle::Color;

/// Flat-colour vertex. Scene pixels while batched, NDC once uploaded.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x4];

    pub fn at(pos: Vec2, color: Color) -> Self {
        Self {
            position: pos.to_array(),
            color: color.0,
        }
    }

    /// Same colour, position moved by `f`
    pub fn map_position(self, f: impl Fn([f32; 2]) -> [f32; 2]) -> Self {
        Self {
            position: f(self.position),
            ..self
        }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Sprites smaller than this are skipped (pixels)
const MIN_RADIUS: f32 = 0.1;

/// Triangle list collected for one frame
#[derive(Debug, Clone)]
pub struct VertexBatch {
    pub vertices: Vec<Vertex>,
    pub clear_color: Color,
}

impl Default for VertexBatch {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            clear_color: super::BACKGROUND,
        }
    }
}

impl VertexBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

impl Surface for VertexBatch {
    /// Drops queued geometry; the pipeline clears to `clear_color`
    fn clear(&mut self, color: Color) {
        self.vertices.clear();
        self.clear_color = color;
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        if radius < MIN_RADIUS || color.alpha() <= 0.0 {
            return;
        }
        shapes::circle(&mut self.vertices, center, radius, color, shapes::segments_for(radius));
    }

    fn fill_polygon(&mut self, points: &[Vec2], color: Color) {
        if color.alpha() <= 0.0 {
            return;
        }
        shapes::polygon(&mut self.vertices, points, color);
    }

    fn stroke_ring(&mut self, center: Vec2, radius: f32, width: f32, color: Color) {
        if width <= 0.0 || color.alpha() <= 0.0 {
            return;
        }
        let half = width * 0.5;
        shapes::ring(
            &mut self.vertices,
            center,
            (radius - half).max(0.0),
            radius + half,
            color,
            shapes::segments_for(radius),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{AlphaCurve, draw};
    use crate::sim::particle::Particle;
    use crate::sim::pool::{EvictionPolicy, ParticlePool};

    #[test]
    fn test_vertex_layout_matches_struct() {
        let layout = Vertex::layout();
        assert_eq!(layout.array_stride, 24);
        assert_eq!(layout.attributes[1].offset, 8);
        let v = Vertex::at(Vec2::new(3.0, 4.0), Color::WHITE).map_position(|[x, y]| [-x, y]);
        assert_eq!(v.position, [-3.0, 4.0]);
        assert_eq!(v.color, Color::WHITE.0);
    }

    #[test]
    fn test_clear_resets_geometry() {
        let mut batch = VertexBatch::new();
        batch.fill_circle(Vec2::ZERO, 10.0, Color::WHITE);
        assert!(!batch.is_empty());
        batch.clear(Color::BLACK);
        assert!(batch.is_empty());
        assert_eq!(batch.clear_color, Color::BLACK);
    }

    #[test]
    fn test_invisible_sprites_emit_nothing() {
        let mut batch = VertexBatch::new();
        batch.fill_circle(Vec2::ZERO, 10.0, Color::WHITE.with_alpha(0.0));
        batch.fill_circle(Vec2::ZERO, 0.0, Color::WHITE);
        batch.stroke_ring(Vec2::ZERO, 10.0, 0.0, Color::WHITE);
        assert!(batch.is_empty());
    }

    #[test]
    fn test_draw_into_batch_is_triangle_list() {
        let mut pool = ParticlePool::new(4, EvictionPolicy::OldestFirst);
        pool.add(Particle::new(Vec2::new(10.0, 10.0), Vec2::ZERO, 1.0).with_size(8.0));
        let mut batch = VertexBatch::new();
        draw(&pool, &[], &mut batch, AlphaCurve::Linear);
        assert!(!batch.is_empty());
        assert_eq!(batch.len() % 3, 0);
    }
}
