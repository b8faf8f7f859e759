//! Tap feedback effects (wooden-fish style)
//!
//! Effect builders are pure: they return an `EffectPlan` describing bursts,
//! ripples and emitters, and the scene carries it out. Staggered pieces are
//! delayed actions rather than timers, so a reset cancels them.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::emitter::{ColorSource, ContinuousEmitter, EmitterConfig, ShapeWeights, Span};
use super::particle::{Color, EffectClass, Shape};
use super::schedule::Action;

/// Velocities below are authored in pixels per 60 Hz frame
const FRAME_RATE: f32 = 60.0;

/// Combo counts that trigger a milestone celebration
pub const MILESTONES: [u32; 7] = [10, 30, 50, 100, 200, 300, 500];

/// Look of the per-tap effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TapStyle {
    /// White sparks and one ring
    Simple,
    /// Golden sparks, one or two rings
    #[default]
    Standard,
    /// Multicoloured sparks, staggered rings, a short star stream
    Fancy,
}

impl TapStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            TapStyle::Simple => "simple",
            TapStyle::Standard => "standard",
            TapStyle::Fancy => "fancy",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "simple" => Some(TapStyle::Simple),
            "standard" => Some(TapStyle::Standard),
            "fancy" => Some(TapStyle::Fancy),
            _ => None,
        }
    }
}

/// An expanding, fading ring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ripple {
    pub center: Vec2,
    pub radius: f32,
    pub max_radius: f32,
    /// Radius growth (pixels/s)
    pub growth: f32,
    /// Stroke width (pixels)
    pub width: f32,
    pub color: Color,
    pub life: f32,
    pub max_life: f32,
}

impl Ripple {
    /// Starting radius of a new ring
    pub const START_RADIUS: f32 = 5.0;

    pub fn new(center: Vec2, max_radius: f32, growth: f32, width: f32, color: Color, life: f32) -> Self {
        let life = if life.is_finite() { life.max(0.0) } else { 0.0 };
        Self {
            center,
            radius: Self::START_RADIUS,
            max_radius: max_radius.max(Self::START_RADIUS),
            growth: growth.max(0.0),
            width: width.max(0.0),
            color,
            life,
            max_life: life,
        }
    }

    /// Grow and age the ring; returns whether it is still visible
    pub fn update(&mut self, dt: f32) -> bool {
        self.radius += self.growth * dt;
        self.life = (self.life - dt).clamp(0.0, self.max_life);
        self.is_alive()
    }

    pub fn is_alive(&self) -> bool {
        self.life > 0.0 && self.radius <= self.max_radius
    }

    pub fn life_ratio(&self) -> f32 {
        if self.max_life <= 0.0 {
            0.0
        } else {
            (self.life / self.max_life).clamp(0.0, 1.0)
        }
    }
}

/// One immediate spawn request
#[derive(Debug, Clone)]
pub struct Burst {
    pub origin: Vec2,
    pub config: EmitterConfig,
    pub intensity: f32,
}

/// Everything an effect wants to happen
#[derive(Debug, Clone, Default)]
pub struct EffectPlan {
    pub bursts: Vec<Burst>,
    pub ripples: Vec<Ripple>,
    pub emitters: Vec<ContinuousEmitter>,
    /// (delay in seconds, action)
    pub delayed: Vec<(f32, Action)>,
}

impl EffectPlan {
    pub fn is_empty(&self) -> bool {
        self.bursts.is_empty() && self.ripples.is_empty() && self.emitters.is_empty() && self.delayed.is_empty()
    }

    /// Particles the immediate bursts will request at intensity 1
    pub fn burst_count(&self) -> u32 {
        self.bursts.iter().map(|b| b.config.count).sum()
    }
}

/// Combo ranking, D (lowest) to SSS
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ComboRank {
    D,
    C,
    B,
    A,
    S,
    SS,
    SSS,
}

impl ComboRank {
    pub fn from_combo(combo: u32) -> Self {
        match combo {
            150.. => ComboRank::SSS,
            100.. => ComboRank::SS,
            80.. => ComboRank::S,
            60.. => ComboRank::A,
            40.. => ComboRank::B,
            20.. => ComboRank::C,
            _ => ComboRank::D,
        }
    }

    pub fn color(&self) -> Color {
        match self {
            ComboRank::D => Color::from_rgb8(0x6b, 0x72, 0x80),
            ComboRank::C => Color::from_rgb8(0x3b, 0x82, 0xf6),
            ComboRank::B => Color::from_rgb8(0x10, 0xb9, 0x81),
            ComboRank::A => Color::from_rgb8(0xf5, 0x9e, 0x0b),
            ComboRank::S => Color::from_rgb8(0xef, 0x44, 0x44),
            ComboRank::SS => Color::from_rgb8(0x8b, 0x5c, 0xf6),
            ComboRank::SSS => Color::from_rgb8(0xec, 0x48, 0x99),
        }
    }
}

/// A milestone crossed by the combo counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Milestone {
    pub threshold: u32,
    /// Celebration size, 0..=2
    pub level: u32,
}

/// Remembers which milestones the current combo streak has already hit
#[derive(Debug, Clone, Default)]
pub struct MilestoneTracker {
    reached: usize,
    last_combo: u32,
}

impl MilestoneTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the latest combo count; returns a milestone the first time it is crossed.
    ///
    /// A combo lower than the previous one starts a new streak.
    pub fn record(&mut self, combo: u32) -> Option<Milestone> {
        if combo < self.last_combo {
            self.reached = 0;
        }
        self.last_combo = combo;

        let crossed = MILESTONES[self.reached..]
            .iter()
            .take_while(|&&t| combo >= t)
            .count();
        if crossed == 0 {
            return None;
        }
        self.reached += crossed;
        let threshold = MILESTONES[self.reached - 1];
        Some(Milestone {
            threshold,
            level: milestone_level(threshold),
        })
    }

    pub fn reset(&mut self) {
        self.reached = 0;
        self.last_combo = 0;
    }
}

fn milestone_level(threshold: u32) -> u32 {
    match threshold {
        100.. => 2,
        50.. => 1,
        _ => 0,
    }
}

/// Speed span around a per-frame speed
fn speed_around(per_frame: f32) -> Span {
    Span::new(per_frame * 0.7 * FRAME_RATE, per_frame * 1.3 * FRAME_RATE)
}

fn scaled_count(base: u32, quality: f32) -> u32 {
    let q = if quality.is_finite() { quality.clamp(0.0, 1.0) } else { 1.0 };
    (base as f32 * q).round() as u32
}

fn burst(origin: Vec2, config: EmitterConfig, intensity: f32) -> Burst {
    Burst {
        origin,
        config: config.sanitized(),
        intensity,
    }
}

/// Feedback for a single tap.
///
/// `quality` is the device-tier burst scale in [0, 1]. Sizes, lifetimes and
/// ring extents follow `intensity` clamped to [0, 1]. Speeds are scaled by
/// the full intensity when the bursts are emitted; counts never grow past the
/// configured ones.
pub fn tap_effect(style: TapStyle, origin: Vec2, intensity: f32, quality: f32) -> EffectPlan {
    let k = if intensity.is_finite() { intensity.clamp(0.0, 1.0) } else { 1.0 };
    let mut plan = EffectPlan::default();

    match style {
        TapStyle::Simple => {
            let config = EmitterConfig {
                count: scaled_count(15, quality),
                speed: speed_around(1.0 + k * 2.0),
                size: Span::fixed(2.0 + k * 2.0),
                life: Span::fixed(0.4 + k * 0.3),
                color: ColorSource::Fixed(Color::WHITE.with_alpha(0.8)),
                class: EffectClass::Tap,
                ..Default::default()
            };
            plan.bursts.push(burst(origin, config, intensity));
            plan.ripples.push(Ripple::new(
                origin,
                40.0 + k * 30.0,
                30.0 + k * 15.0,
                1.0,
                Color::WHITE.with_alpha(0.4),
                0.4 + k * 0.2,
            ));
        }
        TapStyle::Standard => {
            let config = EmitterConfig {
                count: scaled_count(30, quality),
                speed: speed_around(2.0 + k * 3.0),
                size: Span::fixed(3.0 + k * 3.0),
                life: Span::fixed(0.5 + k * 0.5),
                color: ColorSource::HueRange {
                    hue: Span::new(30.0, 50.0),
                    saturation: 1.0,
                    lightness: 0.7,
                    alpha: 1.0,
                },
                class: EffectClass::Tap,
                ..Default::default()
            };
            plan.bursts.push(burst(origin, config, intensity));
            plan.ripples.push(Ripple::new(
                origin,
                50.0 + k * 50.0,
                40.0 + k * 20.0,
                1.0 + k * 2.0,
                Color::WHITE.with_alpha(0.5 * k),
                0.5 + k * 0.3,
            ));
            if k > 0.7 {
                plan.ripples.push(Ripple::new(
                    origin,
                    30.0 + k * 40.0,
                    30.0 + k * 15.0,
                    1.0 + k,
                    Color::from_rgb8(255, 200, 100).with_alpha(0.3 * k),
                    0.4 + k * 0.2,
                ));
            }
        }
        TapStyle::Fancy => {
            let count = scaled_count(50, quality);
            let rainbow = ColorSource::HueRange {
                hue: Span::new(0.0, 360.0),
                saturation: 1.0,
                lightness: 0.6,
                alpha: 1.0,
            };
            let sparks = EmitterConfig {
                count,
                speed: speed_around(3.0 + k * 4.0),
                size: Span::fixed(3.0 + k * 4.0),
                life: Span::fixed(0.6 + k * 0.6),
                color: rainbow.clone(),
                shapes: ShapeWeights {
                    circle: 1.0,
                    star: 1.0,
                    ..ShapeWeights::only(Shape::Circle)
                },
                class: EffectClass::Tap,
                ..Default::default()
            };
            let squares = EmitterConfig {
                count: count / 2,
                speed: speed_around(2.0 + k * 3.0),
                size: Span::fixed(2.0 + k * 3.0),
                life: Span::fixed(0.5 + k * 0.5),
                color: rainbow,
                shapes: ShapeWeights::only(Shape::Square),
                class: EffectClass::Tap,
                ..Default::default()
            };
            plan.bursts.push(burst(origin, sparks, intensity));
            plan.bursts.push(burst(origin, squares, intensity));

            for i in 0..3 {
                let i_f = i as f32;
                let ring = Ripple::new(
                    origin,
                    40.0 + k * 60.0 + i_f * 20.0,
                    50.0 + k * 25.0 - i_f * 10.0,
                    2.0 - i_f * 0.5,
                    Color::WHITE.with_alpha((0.6 - i_f * 0.15) * k),
                    0.6 + k * 0.4 - i_f * 0.1,
                );
                plan.delayed.push((i_f * 0.1, Action::Ripple(ring)));
            }

            if k > 0.6 {
                let stream = EmitterConfig {
                    speed: speed_around(2.0),
                    size: Span::fixed(2.0 + k * 2.0),
                    life: Span::fixed(0.3 + k * 0.3),
                    color: ColorSource::HueRange {
                        hue: Span::new(0.0, 360.0),
                        saturation: 1.0,
                        lightness: 0.7,
                        alpha: 0.8,
                    },
                    shapes: ShapeWeights::only(Shape::Star),
                    class: EffectClass::Tap,
                    ..Default::default()
                };
                plan.emitters
                    .push(ContinuousEmitter::new(origin, 20.0, Some(10), stream.sanitized()));
            }
        }
    }
    plan
}

/// Burst for a running combo; colour follows the combo rank
pub fn combo_effect(origin: Vec2, combo: u32, quality: f32) -> EffectPlan {
    let rank = ComboRank::from_combo(combo);
    let c = combo as f32;
    let mut plan = EffectPlan::default();

    let config = EmitterConfig {
        count: scaled_count(40, quality),
        speed: speed_around(3.0 + (c / 20.0).min(5.0)),
        size: Span::fixed(4.0),
        life: Span::fixed(1.0 + (c / 50.0).min(1.0)),
        color: ColorSource::Fixed(rank.color()),
        shapes: ShapeWeights::only(Shape::Star),
        class: EffectClass::Combo,
        ..Default::default()
    };
    plan.bursts.push(burst(origin, config, 1.0));
    plan.ripples.push(Ripple::new(
        origin,
        80.0 + c.min(50.0),
        50.0 + (c / 2.0).min(30.0),
        2.0,
        rank.color().with_alpha(0.7),
        0.8,
    ));

    if combo >= 50 {
        let stream = EmitterConfig {
            speed: speed_around(2.0),
            size: Span::fixed(3.0),
            life: Span::fixed(0.8),
            color: ColorSource::Fixed(rank.color()),
            shapes: ShapeWeights::only(Shape::Star),
            class: EffectClass::Combo,
            ..Default::default()
        };
        plan.emitters
            .push(ContinuousEmitter::new(origin, 20.0, Some(10), stream.sanitized()));
    }
    plan
}

/// Celebration for a crossed milestone (`level` 0..=2, larger is bigger)
pub fn milestone_effect(origin: Vec2, level: u32, quality: f32) -> EffectPlan {
    const COLORS: [Color; 3] = [
        Color::rgba(1.0, 0.922, 0.231, 1.0),
        Color::rgba(1.0, 0.596, 0.0, 1.0),
        Color::rgba(0.957, 0.263, 0.212, 1.0),
    ];
    let level = level.min(2);
    let color = COLORS[level as usize];
    let l = level as f32;
    let mut plan = EffectPlan::default();

    let config = EmitterConfig {
        count: scaled_count(80, quality),
        speed: speed_around(4.0 + l),
        size: Span::fixed(4.0 + l),
        life: Span::fixed(1.0 + l * 0.5),
        color: ColorSource::Fixed(color),
        shapes: ShapeWeights::only(Shape::Star),
        class: EffectClass::Milestone,
        ..Default::default()
    };
    plan.bursts.push(burst(origin, config, 1.0));

    for i in 0..3 {
        let i_f = i as f32;
        plan.ripples.push(Ripple::new(
            origin,
            70.0 + l * 30.0 + i_f * 20.0,
            40.0 + l * 10.0 + i_f * 5.0,
            2.0 + i_f,
            color.with_alpha(0.7 - i_f * 0.2),
            0.8 + i_f * 0.2,
        ));
    }

    let stream = EmitterConfig {
        speed: speed_around(3.0),
        size: Span::fixed(3.0 + l),
        life: Span::fixed(1.0),
        color: ColorSource::Fixed(color),
        shapes: ShapeWeights::only(Shape::Star),
        class: EffectClass::Milestone,
        ..Default::default()
    };
    plan.emitters.push(ContinuousEmitter::new(
        origin,
        30.0,
        Some(20 + level * 10),
        stream.sanitized(),
    ));
    plan
}
