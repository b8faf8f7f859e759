//! Particle entity and its visual tags

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Sprite drawn for a particle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Shape {
    #[default]
    Circle,
    Square,
    Triangle,
    Star,
}

/// Which effect spawned a particle; drives priority eviction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum EffectClass {
    /// Background/drawing particles
    #[default]
    Ambient,
    /// Routine tap feedback
    Tap,
    /// Combo bursts
    Combo,
    /// Milestone celebrations (kept longest under pressure)
    Milestone,
}

impl EffectClass {
    pub fn priority(&self) -> u8 {
        match self {
            EffectClass::Ambient => 0,
            EffectClass::Tap => 1,
            EffectClass::Combo => 2,
            EffectClass::Milestone => 3,
        }
    }
}

/// Linear RGBA color, components in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color(pub [f32; 4]);

impl Color {
    pub const WHITE: Color = Color([1.0, 1.0, 1.0, 1.0]);
    pub const BLACK: Color = Color([0.0, 0.0, 0.0, 1.0]);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self([r, g, b, a])
    }

    /// Opaque colour from 8-bit channels
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self([r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0])
    }

    /// Build from hue (degrees), saturation, lightness and alpha (all but hue in [0, 1])
    pub fn from_hsla(hue: f32, saturation: f32, lightness: f32, alpha: f32) -> Self {
        let h = hue.rem_euclid(360.0) / 60.0;
        let s = saturation.clamp(0.0, 1.0);
        let l = lightness.clamp(0.0, 1.0);

        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = l - c / 2.0;
        Self([r + m, g + m, b + m, alpha.clamp(0.0, 1.0)])
    }

    pub fn with_alpha(self, alpha: f32) -> Self {
        let [r, g, b, _] = self.0;
        Self([r, g, b, alpha])
    }

    pub fn alpha(&self) -> f32 {
        self.0[3]
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

/// A short-lived visual particle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Diameter in pixels
    pub size: f32,
    pub color: Color,
    /// Remaining life in seconds, 0..=max_life
    pub life: f32,
    pub max_life: f32,
    pub shape: Shape,
    pub class: EffectClass,
    /// Sprite rotation (radians)
    pub rotation: f32,
    /// Rotation speed (radians/sec)
    pub spin: f32,
    /// Oscillation phase for twinkling sprites
    pub phase: f32,
    /// Phase speed (radians/sec)
    pub twinkle: f32,
}

impl Particle {
    pub fn new(pos: Vec2, vel: Vec2, max_life: f32) -> Self {
        let max_life = if max_life.is_finite() { max_life.max(0.0) } else { 0.0 };
        Self {
            pos,
            vel,
            size: 4.0,
            color: Color::WHITE,
            life: max_life,
            max_life,
            shape: Shape::Circle,
            class: EffectClass::Ambient,
            rotation: 0.0,
            spin: 0.0,
            phase: 0.0,
            twinkle: 0.0,
        }
    }

    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_class(mut self, class: EffectClass) -> Self {
        self.class = class;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_size(mut self, size: f32) -> Self {
        self.size = size.max(0.0);
        self
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.life > 0.0
    }

    /// Remaining fraction of life in [0, 1]
    pub fn life_ratio(&self) -> f32 {
        if self.max_life <= 0.0 {
            0.0
        } else {
            (self.life / self.max_life).clamp(0.0, 1.0)
        }
    }

    pub fn kill(&mut self) {
        self.life = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_particle_is_full_life() {
        let p = Particle::new(Vec2::ZERO, Vec2::ZERO, 2.0);
        assert_eq!(p.life, 2.0);
        assert!(p.is_alive());
        assert_eq!(p.life_ratio(), 1.0);
    }

    #[test]
    fn test_negative_life_is_clamped() {
        let p = Particle::new(Vec2::ZERO, Vec2::ZERO, -5.0);
        assert_eq!(p.max_life, 0.0);
        assert!(!p.is_alive());
        assert_eq!(p.life_ratio(), 0.0);
    }

    #[test]
    fn test_hsla_primaries() {
        let red = Color::from_hsla(0.0, 1.0, 0.5, 1.0);
        assert!((red.0[0] - 1.0).abs() < 1e-5);
        assert!(red.0[1].abs() < 1e-5);
        assert!(red.0[2].abs() < 1e-5);

        let blue = Color::from_hsla(240.0, 1.0, 0.5, 0.5);
        assert!((blue.0[2] - 1.0).abs() < 1e-5);
        assert!((blue.alpha() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_rgb8() {
        assert_eq!(Color::from_rgb8(255, 0, 255).0, [1.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_class_priority_order() {
        assert!(EffectClass::Milestone.priority() > EffectClass::Combo.priority());
        assert!(EffectClass::Combo.priority() > EffectClass::Tap.priority());
        assert!(EffectClass::Tap.priority() > EffectClass::Ambient.priority());
    }
}
