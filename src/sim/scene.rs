//! Simulation context
//!
//! A `Scene` owns everything one toy needs between frames. Nothing lives in
//! globals: the host owns the scene and hands it to `tick` once per step.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::bounds::{BoundaryPolicy, Rect, resolve_bounds};
use super::effects::{EffectPlan, MilestoneTracker, Ripple, combo_effect, milestone_effect, tap_effect};
use super::emitter::{ColorSource, ContinuousEmitter, EmitterConfig, Span, emit};
use super::forces::{ActiveForce, BrushTool, ForceField, apply_brush, gravity_from_tilt};
use super::integrate::Physics;
use super::particle::EffectClass;
use super::pool::ParticlePool;
use super::schedule::{Action, PendingQueue};
use super::shadow::Caster;
use super::table::Table;
use crate::settings::Settings;

/// Radius of the push left behind by a drag (pixels)
const DRAG_RADIUS: f32 = 120.0;
/// Push strength per pixel of drag movement
const DRAG_GAIN: f32 = 30.0;
const DRAG_MAX_STRENGTH: f32 = 3000.0;
/// Per-frame decay of drag pushes
const DRAG_DECAY: f32 = 0.9;

pub struct Scene {
    pub settings: Settings,
    pub physics: Physics,
    pub pool: ParticlePool,
    pub ripples: Vec<Ripple>,
    pub emitters: Vec<ContinuousEmitter>,
    pub forces: Vec<ActiveForce>,
    pub pending: PendingQueue,
    pub table: Table,
    pub milestones: MilestoneTracker,
    pub bounds: Rect,
    pub boundary: BoundaryPolicy,
    /// Light-painting light position
    pub light: Option<Vec2>,
    pub casters: Vec<Caster>,
    /// Normalized device tilt, when the host reports one
    pub tilt: Option<Vec2>,
    /// Scene time (seconds)
    pub time: f32,
    pub frame: u64,
    enabled: bool,
    rng: Pcg32,
}

impl Scene {
    pub fn new(seed: u64, bounds: Rect, settings: &Settings) -> Self {
        let settings = settings.clone().sanitized();
        let mut scene = Self {
            physics: Physics::default(),
            pool: ParticlePool::new(settings.max_particles(), settings.eviction),
            ripples: Vec::new(),
            emitters: Vec::new(),
            forces: Vec::new(),
            pending: PendingQueue::new(),
            table: Table::new(),
            milestones: MilestoneTracker::new(),
            bounds,
            boundary: settings.boundary_policy(),
            light: None,
            casters: Vec::new(),
            tilt: None,
            time: 0.0,
            frame: 0,
            enabled: settings.particles,
            rng: Pcg32::seed_from_u64(seed),
            settings,
        };
        scene.update_physics();
        log::info!(
            "Scene created: seed {}, {}x{}, capacity {}",
            seed,
            bounds.size().x,
            bounds.size().y,
            scene.pool.capacity()
        );
        scene
    }

    pub fn rng(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Apply changed settings live. Only a capacity or eviction change touches the pool.
    pub fn apply_settings(&mut self, settings: &Settings) {
        let settings = settings.clone().sanitized();
        let capacity = settings.max_particles();

        if settings.eviction != self.pool.policy() {
            let mut pool = ParticlePool::new(capacity, settings.eviction);
            for p in self.pool.iter() {
                pool.add(p.clone());
            }
            log::info!("Eviction policy now {:?}", settings.eviction);
            self.pool = pool;
        } else {
            self.pool.reallocate(capacity);
        }

        self.boundary = settings.boundary_policy();
        let enabled = settings.particles;
        self.settings = settings;
        self.update_physics();
        self.set_enabled(enabled);
    }

    fn update_physics(&mut self) {
        let strength = self.settings.gravity;
        self.physics = Physics {
            gravity: match self.tilt {
                Some(t) => gravity_from_tilt(t.x, t.y, strength),
                None => Vec2::new(0.0, strength),
            },
            friction: self.settings.friction,
        };
        self.table.set_ball_restitution(self.settings.restitution);
    }

    /// Point gravity along the device tilt (each axis in [-1, 1])
    pub fn set_tilt(&mut self, x: f32, y: f32) {
        self.tilt = Some(Vec2::new(x, y));
        self.update_physics();
    }

    /// Drop every transient: particles, rings, emitters, forces, pending actions
    /// and balls. Table furniture and casters stay.
    pub fn reset(&mut self) {
        self.pool.clear();
        self.ripples.clear();
        self.emitters.clear();
        self.forces.clear();
        self.pending.clear();
        self.table.clear_bodies();
        self.milestones.reset();
        log::info!("Scene reset");
    }

    /// Turning particles off clears the scene like `reset`
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        if !enabled {
            self.reset();
        }
        log::info!("Particles {}", if enabled { "enabled" } else { "disabled" });
    }

    /// Spawn particles at `pos` with the user's size setting applied
    pub fn emit_at(&mut self, pos: Vec2, config: &EmitterConfig, intensity: f32) -> usize {
        if !self.enabled {
            return 0;
        }
        let mut config = config.clone();
        config.size = config.size.scaled(self.settings.particle_size);
        emit(&mut self.pool, pos, &config, intensity, &mut self.rng)
    }

    /// Carry out an effect plan now; delayed parts are queued
    pub fn apply_plan(&mut self, plan: EffectPlan) -> usize {
        if !self.enabled {
            return 0;
        }
        let mut spawned = 0;
        for burst in plan.bursts {
            spawned += self.emit_at(burst.origin, &burst.config, burst.intensity);
        }
        self.ripples.extend(plan.ripples);
        self.emitters.extend(plan.emitters);
        for (delay, action) in plan.delayed {
            self.pending.schedule(self.time + delay.max(0.0), action);
        }
        spawned
    }

    pub fn tap(&mut self, pos: Vec2, intensity: f32) -> usize {
        let plan = tap_effect(
            self.settings.tap_style,
            pos,
            intensity,
            self.settings.quality.burst_scale(),
        );
        self.apply_plan(plan)
    }

    /// Combo burst, plus a milestone celebration the first time one is crossed
    pub fn combo(&mut self, pos: Vec2, combo: u32) -> usize {
        let quality = self.settings.quality.burst_scale();
        let mut spawned = self.apply_plan(combo_effect(pos, combo, quality));
        if let Some(milestone) = self.milestones.record(combo) {
            log::debug!("Combo milestone {} reached", milestone.threshold);
            spawned += self.apply_plan(milestone_effect(pos, milestone.level, quality));
        }
        spawned
    }

    /// Doodle stroke: palette particles along the drag plus a short-lived push
    pub fn drag(&mut self, pos: Vec2, delta: Vec2) -> usize {
        if !pos.is_finite() || !delta.is_finite() {
            return 0;
        }
        let strength = (delta.length() * DRAG_GAIN).min(DRAG_MAX_STRENGTH);
        if strength > 0.0 {
            self.forces.push(ActiveForce::new(
                ForceField::Radial {
                    center: pos,
                    radius: DRAG_RADIUS,
                    strength,
                },
                DRAG_DECAY,
            ));
        }
        let config = EmitterConfig {
            count: 4,
            speed: Span::new(5.0, 40.0),
            size: Span::new(2.0, 6.0),
            life: Span::new(1.0, 2.5),
            color: ColorSource::Palette(self.settings.palette),
            class: EffectClass::Ambient,
            direction: delta.y.atan2(delta.x),
            spread: std::f32::consts::FRAC_PI_2,
            jitter: 3.0,
            ..Default::default()
        }
        .sanitized();
        self.emit_at(pos, &config, 1.0)
    }

    /// Sand-table tool stroke; returns how many particles it touched
    pub fn brush(&mut self, tool: BrushTool, pos: Vec2, radius: f32, strength: f32) -> usize {
        apply_brush(&mut self.pool, tool, pos, radius, strength, &mut self.rng)
    }

    /// Advance continuous emitters, dropping exhausted ones. Returns particles spawned.
    pub(crate) fn run_emitters(&mut self, dt: f32) -> usize {
        if !self.enabled {
            return 0;
        }
        let before = self.pool.len() as u64 + self.pool.evicted_total();
        let (pool, rng) = (&mut self.pool, &mut self.rng);
        self.emitters.retain_mut(|e| !e.update(dt, pool, rng));
        let after = self.pool.len() as u64 + self.pool.evicted_total();
        (after - before) as usize
    }

    /// Apply the edge policy to every live particle
    pub(crate) fn resolve_edges(&mut self) {
        resolve_bounds(&mut self.pool, &self.bounds, self.boundary, &mut self.rng);
    }

    /// Run a delayed action that has come due
    pub(crate) fn run_action(&mut self, action: Action) -> usize {
        match action {
            Action::Burst(burst) => {
                self.emit_at(burst.origin, &burst.config, burst.intensity)
            }
            Action::Ripple(ripple) => {
                if self.enabled {
                    self.ripples.push(ripple);
                }
                0
            }
        }
    }

    /// Shadow polygons for the current light, one per caster that casts one
    pub fn shadows(&self) -> Vec<Vec<Vec2>> {
        let Some(light) = self.light else {
            return Vec::new();
        };
        let length = self.bounds.size().length() * 2.0;
        self.casters
            .iter()
            .map(|c| c.shadow(light, length))
            .filter(|s| !s.is_empty())
            .collect()
    }
}
