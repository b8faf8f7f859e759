//! Particle emission
//!
//! `emit` spawns a burst of particles at a point; `ContinuousEmitter` trickles
//! particles out at a fixed rate until its budget is spent. Both draw every
//! random value from the caller's RNG so a seeded scene stays deterministic.

use glam::Vec2;
use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use serde::{Deserialize, Serialize};

use super::particle::{Color, EffectClass, Particle, Shape};
use super::pool::ParticlePool;
use crate::consts::MAX_INTENSITY;
use crate::error::SampleError;
use crate::polar_to_cartesian;

/// Closed range of floats, always ordered and finite
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub min: f32,
    pub max: f32,
}

impl Span {
    /// Build a span, swapping reversed bounds and zeroing non-finite ones
    pub fn new(a: f32, b: f32) -> Self {
        let a = if a.is_finite() { a } else { 0.0 };
        let b = if b.is_finite() { b } else { 0.0 };
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub const fn fixed(v: f32) -> Self {
        Self { min: v, max: v }
    }

    /// Uniform draw; spans too wide to measure collapse to `min`
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.max > self.min && (self.max - self.min).is_finite() {
            rng.random_range(self.min..self.max)
        } else {
            self.min
        }
    }

    /// Clamp both ends to be >= 0
    pub fn non_negative(self) -> Self {
        Span::new(self.min.max(0.0), self.max.max(0.0))
    }

    pub fn scaled(self, k: f32) -> Self {
        Span::new(self.min * k, self.max * k)
    }
}

/// Colour themes of the doodle pad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Palette {
    /// Blues and cyans
    #[default]
    Quantum,
    /// Violets
    Elegant,
    /// Any hue, soft and light
    Pastel,
    /// Blue-grey greys
    Monochrome,
    /// Greens
    Aurora,
}

impl Palette {
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Color {
        let (hue, sat, light, alpha) = match self {
            Palette::Quantum => (Span::new(200.0, 260.0), 0.8, Span::fixed(0.7), 0.7),
            Palette::Elegant => (Span::new(260.0, 290.0), 0.6, Span::fixed(0.65), 0.7),
            Palette::Pastel => (Span::new(0.0, 360.0), 0.5, Span::fixed(0.8), 0.6),
            Palette::Monochrome => (Span::fixed(240.0), 0.1, Span::new(0.5, 0.9), 0.7),
            Palette::Aurora => (Span::new(120.0, 180.0), 0.7, Span::fixed(0.65), 0.7),
        };
        Color::from_hsla(hue.sample(rng), sat, light.sample(rng), alpha)
    }
}

/// RGBA pixels handed over by the host (e.g. an uploaded photo)
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSampler {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 4]>,
}

impl ImageSampler {
    pub fn from_rgba(width: u32, height: u32, bytes: &[u8]) -> Result<Self, SampleError> {
        if width == 0 || height == 0 {
            return Err(SampleError::EmptyImage);
        }
        let expected = width as usize * height as usize * 4;
        if bytes.len() != expected {
            return Err(SampleError::SizeMismatch {
                expected,
                actual: bytes.len(),
            });
        }
        let pixels = bytes
            .chunks_exact(4)
            .map(|c| [c[0], c[1], c[2], c[3]])
            .collect();
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Nearest-pixel lookup at normalized coordinates (clamped to the image)
    pub fn sample(&self, uv: Vec2) -> Color {
        let u = if uv.x.is_finite() { uv.x.clamp(0.0, 1.0) } else { 0.0 };
        let v = if uv.y.is_finite() { uv.y.clamp(0.0, 1.0) } else { 0.0 };
        let x = ((u * self.width as f32) as u32).min(self.width - 1);
        let y = ((v * self.height as f32) as u32).min(self.height - 1);
        let [r, g, b, a] = self.pixels[(y * self.width + x) as usize];
        Color::rgba(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        )
    }
}

/// Where spawned particles get their colour
#[derive(Debug, Clone, PartialEq)]
pub enum ColorSource {
    Fixed(Color),
    Palette(Palette),
    /// Random hue in a range, fixed saturation/lightness
    HueRange {
        hue: Span,
        saturation: f32,
        lightness: f32,
        alpha: f32,
    },
    /// Colour taken from an image at the spawn point's position within `frame`
    Sampled {
        image: ImageSampler,
        frame: super::bounds::Rect,
    },
}

impl Default for ColorSource {
    fn default() -> Self {
        ColorSource::Fixed(Color::WHITE)
    }
}

impl ColorSource {
    pub fn pick<R: Rng + ?Sized>(&self, at: Vec2, rng: &mut R) -> Color {
        match self {
            ColorSource::Fixed(c) => *c,
            ColorSource::Palette(p) => p.sample(rng),
            ColorSource::HueRange {
                hue,
                saturation,
                lightness,
                alpha,
            } => Color::from_hsla(hue.sample(rng), *saturation, *lightness, *alpha),
            ColorSource::Sampled { image, frame } => image.sample(frame.normalize(at)),
        }
    }
}

/// Relative likelihood of each sprite shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeWeights {
    pub circle: f32,
    pub square: f32,
    pub triangle: f32,
    pub star: f32,
}

impl Default for ShapeWeights {
    fn default() -> Self {
        Self::only(Shape::Circle)
    }
}

impl ShapeWeights {
    pub fn only(shape: Shape) -> Self {
        let mut w = Self {
            circle: 0.0,
            square: 0.0,
            triangle: 0.0,
            star: 0.0,
        };
        match shape {
            Shape::Circle => w.circle = 1.0,
            Shape::Square => w.square = 1.0,
            Shape::Triangle => w.triangle = 1.0,
            Shape::Star => w.star = 1.0,
        }
        w
    }

    fn table(&self) -> [(Shape, f32); 4] {
        let clean = |w: f32| if w.is_finite() { w.max(0.0) } else { 0.0 };
        [
            (Shape::Circle, clean(self.circle)),
            (Shape::Square, clean(self.square)),
            (Shape::Triangle, clean(self.triangle)),
            (Shape::Star, clean(self.star)),
        ]
    }

    /// Build a reusable sampler; all-zero weights fall back to circles
    fn sampler(&self) -> Option<WeightedIndex<f32>> {
        WeightedIndex::new(self.table().iter().map(|(_, w)| *w)).ok()
    }
}

/// Parameters for one spawn call
#[derive(Debug, Clone, PartialEq)]
pub struct EmitterConfig {
    pub count: u32,
    /// Initial speed (pixels/s)
    pub speed: Span,
    /// Particle diameter (pixels)
    pub size: Span,
    /// Lifetime (seconds)
    pub life: Span,
    /// Rotation speed (radians/s)
    pub spin: Span,
    pub color: ColorSource,
    pub shapes: ShapeWeights,
    pub class: EffectClass,
    /// Centre direction of emission (radians)
    pub direction: f32,
    /// Total angular spread around `direction` (radians, TAU = omnidirectional)
    pub spread: f32,
    /// Random offset of the spawn point (pixels)
    pub jitter: f32,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            count: 20,
            speed: Span::new(60.0, 300.0),
            size: Span::new(2.0, 6.0),
            life: Span::new(0.5, 1.5),
            spin: Span::new(-6.0, 6.0),
            color: ColorSource::default(),
            shapes: ShapeWeights::default(),
            class: EffectClass::Tap,
            direction: 0.0,
            spread: std::f32::consts::TAU,
            jitter: 0.0,
        }
    }
}

impl EmitterConfig {
    /// Clamp every field into its valid range
    pub fn sanitized(mut self) -> Self {
        self.speed = Span::new(self.speed.min, self.speed.max).non_negative();
        self.size = Span::new(self.size.min, self.size.max).non_negative();
        self.life = Span::new(self.life.min, self.life.max).non_negative();
        self.spin = Span::new(self.spin.min, self.spin.max);
        self.direction = crate::normalize_angle(self.direction);
        self.spread = if self.spread.is_finite() {
            self.spread.clamp(0.0, std::f32::consts::TAU)
        } else {
            std::f32::consts::TAU
        };
        self.jitter = if self.jitter.is_finite() { self.jitter.max(0.0) } else { 0.0 };
        self
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    pub fn with_color(mut self, color: ColorSource) -> Self {
        self.color = color;
        self
    }

    pub fn with_class(mut self, class: EffectClass) -> Self {
        self.class = class;
        self
    }

    pub fn with_shapes(mut self, shapes: ShapeWeights) -> Self {
        self.shapes = shapes;
        self
    }

    fn spawn_one<R: Rng + ?Sized>(
        &self,
        origin: Vec2,
        intensity: f32,
        shapes: Option<&WeightedIndex<f32>>,
        rng: &mut R,
    ) -> Particle {
        let half = self.spread * 0.5;
        let angle = if half > 0.0 {
            self.direction + rng.random_range(-half..=half)
        } else {
            self.direction
        };
        let speed = self.speed.sample(rng) * intensity;
        let offset = if self.jitter > 0.0 {
            let reach = Span::new(-self.jitter, self.jitter);
            Vec2::new(reach.sample(rng), reach.sample(rng))
        } else {
            Vec2::ZERO
        };
        let pos = origin + offset;

        let table = self.shapes.table();
        let shape = shapes.map(|s| table[s.sample(rng)].0).unwrap_or(Shape::Circle);

        let mut p = Particle::new(pos, polar_to_cartesian(speed, angle), self.life.sample(rng))
            .with_size(self.size.sample(rng))
            .with_color(self.color.pick(pos, rng))
            .with_shape(shape)
            .with_class(self.class);
        p.rotation = rng.random_range(-std::f32::consts::PI..std::f32::consts::PI);
        p.spin = self.spin.sample(rng);
        p.phase = rng.random_range(0.0..std::f32::consts::TAU);
        if shape == Shape::Star {
            p.twinkle = rng.random_range(4.0..10.0);
        }
        p
    }
}

/// Clamp an input intensity scalar into the supported range (NaN -> 1.0)
pub fn clamp_intensity(intensity: f32) -> f32 {
    if intensity.is_finite() {
        intensity.clamp(0.0, MAX_INTENSITY)
    } else {
        1.0
    }
}

/// Spawn up to `config.count` particles at `origin`, evicting residents as
/// needed.
///
/// Speed scales with `intensity`; the count only shrinks for intensities
/// below 1. Returns the number of particles inserted.
pub fn emit<R: Rng + ?Sized>(
    pool: &mut ParticlePool,
    origin: Vec2,
    config: &EmitterConfig,
    intensity: f32,
    rng: &mut R,
) -> usize {
    if !origin.is_finite() {
        log::debug!("Ignoring emit at non-finite origin");
        return 0;
    }
    let config = config.clone().sanitized();
    let intensity = clamp_intensity(intensity);
    let count = ((config.count as f32 * intensity.min(1.0)).round() as usize).min(config.count as usize);
    let shapes = config.shapes.sampler();
    for _ in 0..count {
        let p = config.spawn_one(origin, intensity, shapes.as_ref(), rng);
        pool.add(p);
    }
    count
}

/// Rate-limited emitter that lives for a number of particles
#[derive(Debug, Clone)]
pub struct ContinuousEmitter {
    pub origin: Vec2,
    /// Particles per second
    pub rate: f32,
    /// Particles left to emit (None = unlimited)
    pub remaining: Option<u32>,
    pub config: EmitterConfig,
    accumulator: f32,
}

impl ContinuousEmitter {
    pub fn new(origin: Vec2, rate: f32, total: Option<u32>, config: EmitterConfig) -> Self {
        let rate = if rate.is_finite() { rate.max(0.0) } else { 0.0 };
        Self {
            origin,
            rate,
            remaining: total,
            config: config.with_count(1),
            accumulator: 0.0,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.remaining == Some(0)
    }

    /// Emit this frame's share of particles. Returns true once exhausted.
    pub fn update<R: Rng + ?Sized>(&mut self, dt: f32, pool: &mut ParticlePool, rng: &mut R) -> bool {
        if self.is_finished() {
            return true;
        }
        self.accumulator += self.rate * dt.max(0.0);
        let mut due = self.accumulator.floor() as u32;
        self.accumulator -= due as f32;
        if let Some(left) = self.remaining {
            due = due.min(left);
        }
        if due > 0 {
            emit(pool, self.origin, &self.config.clone().with_count(due), 1.0, rng);
            if let Some(left) = self.remaining.as_mut() {
                *left -= due;
            }
        }
        self.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::bounds::Rect;
    use crate::sim::pool::EvictionPolicy;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_emit_appends_count() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut pool = ParticlePool::new(100, EvictionPolicy::OldestFirst);
        let config = EmitterConfig::default().with_count(12);
        let n = emit(&mut pool, Vec2::new(50.0, 50.0), &config, 1.0, &mut rng);
        assert_eq!(n, 12);
        assert_eq!(pool.len(), 12);
        for p in pool.iter() {
            assert!(p.life > 0.0 && p.life <= p.max_life);
            assert!(p.pos.is_finite());
        }
    }

    #[test]
    fn test_emit_at_capacity_evicts_instead_of_dropping() {
        let mut rng = Pcg32::seed_from_u64(2);
        let mut pool = ParticlePool::new(10, EvictionPolicy::OldestFirst);
        let old = EmitterConfig::default().with_count(10);
        emit(&mut pool, Vec2::ZERO, &old, 1.0, &mut rng);
        let fresh = EmitterConfig::default()
            .with_count(4)
            .with_class(EffectClass::Milestone);
        emit(&mut pool, Vec2::ZERO, &fresh, 1.0, &mut rng);
        assert_eq!(pool.len(), 10);
        let milestones = pool
            .iter()
            .filter(|p| p.class == EffectClass::Milestone)
            .count();
        assert_eq!(milestones, 4);
    }

    #[test]
    fn test_intensity_never_exceeds_count() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut pool = ParticlePool::new(100, EvictionPolicy::OldestFirst);
        let config = EmitterConfig::default().with_count(10);
        assert_eq!(emit(&mut pool, Vec2::ZERO, &config, 0.0, &mut rng), 0);
        assert_eq!(emit(&mut pool, Vec2::ZERO, &config, 0.5, &mut rng), 5);
        assert_eq!(emit(&mut pool, Vec2::ZERO, &config, 3.0, &mut rng), 10);
        assert_eq!(emit(&mut pool, Vec2::ZERO, &config, 100.0, &mut rng), 10);
        assert_eq!(pool.len(), 25);
    }

    #[test]
    fn test_intensity_scales_speed() {
        let config = EmitterConfig {
            speed: Span::fixed(100.0),
            ..EmitterConfig::default().with_count(1)
        };
        let mut pool = ParticlePool::new(10, EvictionPolicy::OldestFirst);
        emit(&mut pool, Vec2::ZERO, &config, 3.0, &mut Pcg32::seed_from_u64(9));
        let p = pool.iter().next().expect("particle");
        assert!((p.vel.length() - 300.0).abs() < 1e-2);
    }

    #[test]
    fn test_huge_span_samples_min() {
        let mut rng = Pcg32::seed_from_u64(10);
        let span = Span::new(-f32::MAX, f32::MAX);
        assert_eq!(span.sample(&mut rng), -f32::MAX);
    }

    #[test]
    fn test_extreme_config_does_not_panic() {
        let mut rng = Pcg32::seed_from_u64(11);
        let mut pool = ParticlePool::new(50, EvictionPolicy::OldestFirst);
        let configs = [
            EmitterConfig {
                spin: Span::new(-f32::MAX, f32::MAX),
                ..Default::default()
            },
            EmitterConfig {
                jitter: f32::INFINITY,
                ..Default::default()
            },
            EmitterConfig {
                speed: Span { min: f32::NAN, max: f32::MAX },
                size: Span { min: -f32::MAX, max: f32::MAX },
                spread: f32::NAN,
                direction: f32::INFINITY,
                jitter: f32::MAX,
                ..Default::default()
            },
        ];
        for config in &configs {
            let n = emit(&mut pool, Vec2::new(10.0, 10.0), config, 1.0, &mut rng);
            assert_eq!(n, config.count as usize);
        }
        assert!(pool.len() <= 50);
    }

    proptest! {
        #[test]
        fn prop_emit_never_exceeds_capacity(
            cap in 1usize..64,
            calls in prop::collection::vec((0u32..80, -1.0f32..10.0), 1..20),
            seed in any::<u64>(),
        ) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut pool = ParticlePool::new(cap, EvictionPolicy::OldestFirst);
            for (count, intensity) in calls {
                let config = EmitterConfig::default().with_count(count);
                let n = emit(&mut pool, Vec2::ZERO, &config, intensity, &mut rng);
                prop_assert!(n <= count as usize);
                prop_assert!(pool.len() <= cap);
            }
        }
    }

    #[test]
    fn test_all_zero_shape_weights_fall_back_to_circle() {
        let mut rng = Pcg32::seed_from_u64(4);
        let mut pool = ParticlePool::new(10, EvictionPolicy::OldestFirst);
        let weights = ShapeWeights {
            circle: 0.0,
            square: 0.0,
            triangle: 0.0,
            star: f32::NAN,
        };
        let config = EmitterConfig::default().with_count(5).with_shapes(weights);
        emit(&mut pool, Vec2::ZERO, &config, 1.0, &mut rng);
        assert!(pool.iter().all(|p| p.shape == Shape::Circle));
    }

    #[test]
    fn test_single_shape_weight() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut pool = ParticlePool::new(20, EvictionPolicy::OldestFirst);
        let config = EmitterConfig::default()
            .with_count(20)
            .with_shapes(ShapeWeights::only(Shape::Star));
        emit(&mut pool, Vec2::ZERO, &config, 1.0, &mut rng);
        assert!(pool.iter().all(|p| p.shape == Shape::Star && p.twinkle > 0.0));
    }

    #[test]
    fn test_sanitized_config() {
        let config = EmitterConfig {
            speed: Span { min: 10.0, max: -5.0 },
            life: Span { min: -1.0, max: f32::INFINITY },
            spread: 100.0,
            jitter: -3.0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(config.speed, Span::new(0.0, 10.0));
        assert_eq!(config.life, Span::new(0.0, 0.0));
        assert!((config.spread - std::f32::consts::TAU).abs() < 1e-6);
        assert_eq!(config.jitter, 0.0);
    }

    #[test]
    fn test_image_sampler_validates_size() {
        assert_eq!(
            ImageSampler::from_rgba(0, 4, &[]),
            Err(SampleError::EmptyImage)
        );
        assert_eq!(
            ImageSampler::from_rgba(2, 2, &[0; 15]),
            Err(SampleError::SizeMismatch {
                expected: 16,
                actual: 15
            })
        );
    }

    #[test]
    fn test_image_sampler_picks_quadrant() {
        // 2x1 image: left red, right blue
        let bytes = [255, 0, 0, 255, 0, 0, 255, 255];
        let image = ImageSampler::from_rgba(2, 1, &bytes).expect("valid image");
        let left = image.sample(Vec2::new(0.1, 0.5));
        let right = image.sample(Vec2::new(0.9, 0.5));
        assert_eq!(left.0, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(right.0, [0.0, 0.0, 1.0, 1.0]);
        // Out of range clamps to the edge
        assert_eq!(image.sample(Vec2::new(5.0, -2.0)).0, [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_sampled_color_source_uses_frame() {
        let bytes = [255, 0, 0, 255, 0, 0, 255, 255];
        let image = ImageSampler::from_rgba(2, 1, &bytes).expect("valid image");
        let source = ColorSource::Sampled {
            image,
            frame: Rect::from_size(200.0, 100.0),
        };
        let mut rng = Pcg32::seed_from_u64(6);
        assert_eq!(source.pick(Vec2::new(150.0, 50.0), &mut rng).0[2], 1.0);
    }

    #[test]
    fn test_continuous_emitter_rate_and_budget() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut pool = ParticlePool::new(100, EvictionPolicy::OldestFirst);
        let mut emitter =
            ContinuousEmitter::new(Vec2::ZERO, 20.0, Some(10), EmitterConfig::default());

        // 0.25 s at 20/s = 5 particles
        for _ in 0..5 {
            assert!(!emitter.update(0.05, &mut pool, &mut rng));
        }
        assert_eq!(pool.len(), 5);

        // Budget caps the rest
        let mut finished = false;
        for _ in 0..20 {
            finished = emitter.update(0.05, &mut pool, &mut rng);
        }
        assert!(finished);
        assert_eq!(pool.len(), 10);
    }

    #[test]
    fn test_palettes_stay_in_gamut() {
        let mut rng = Pcg32::seed_from_u64(8);
        for palette in [
            Palette::Quantum,
            Palette::Elegant,
            Palette::Pastel,
            Palette::Monochrome,
            Palette::Aurora,
        ] {
            for _ in 0..20 {
                let c = palette.sample(&mut rng);
                assert!(c.0.iter().all(|v| (0.0..=1.0).contains(v)));
            }
        }
    }
}
