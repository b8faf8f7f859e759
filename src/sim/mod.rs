//! Deterministic simulation module
//!
//! All toy logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (insertion order in the pool, by id on the table)
//! - No rendering or platform dependencies

pub mod bounds;
pub mod collision;
pub mod effects;
pub mod emitter;
pub mod forces;
pub mod integrate;
pub mod particle;
pub mod pool;
pub mod scene;
pub mod schedule;
pub mod shadow;
pub mod spatial;
pub mod table;
pub mod tick;

pub use bounds::{BoundaryPolicy, Rect};
pub use collision::{Body, CollisionResult, circle_circle, circle_segment, reflect_velocity};
pub use effects::{ComboRank, EffectPlan, Ripple, TapStyle, combo_effect, milestone_effect, tap_effect};
pub use emitter::{ColorSource, ContinuousEmitter, EmitterConfig, ImageSampler, Palette, Span, emit};
pub use forces::{ActiveForce, BrushTool, ForceField};
pub use integrate::{Physics, step};
pub use particle::{Color, EffectClass, Particle, Shape};
pub use pool::{EvictionPolicy, ParticlePool};
pub use scene::Scene;
pub use shadow::Caster;
pub use table::{Obstacle, Table};
pub use tick::{FrameInput, InputEvent, Placement, TickStats, tick};
