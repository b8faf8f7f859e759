//! Fixed timestep simulation tick
//!
//! Advances a scene by one step in a fixed order: input, due actions,
//! emitters, integration, table, bounds, rings, force decay, cleanup.
//! Everything integrates before anything is resolved, and the renderer only
//! ever sees the state between ticks.

use glam::Vec2;

use super::forces::BrushTool;
use super::integrate::step;
use super::scene::Scene;
use super::shadow::Caster;
use super::table::{BUMPER_RADIUS, PORTAL_RADIUS, WALL_THICKNESS, WELL_RADIUS, WELL_STRENGTH};

/// Where to put a new piece of pinball furniture
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    Bumper(Vec2),
    GravityWell(Vec2),
    Portals(Vec2, Vec2),
}

/// Host input, in raw pixel coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Tap/click; intensity from pressure, default 1.0
    Tap { pos: Vec2, intensity: f32 },
    /// Pointer moved while pressed
    Drag { pos: Vec2, delta: Vec2 },
    /// Normalized device tilt, each axis in [-1, 1]
    Tilt { x: f32, y: f32 },
    /// Sand-table tool stroke
    Brush {
        tool: BrushTool,
        pos: Vec2,
        radius: f32,
        strength: f32,
    },
    /// Combo counter update from the host's tap rhythm tracking
    Combo { pos: Vec2, combo: u32 },
    /// Launch a pinball
    Ball { pos: Vec2, vel: Vec2 },
    /// Finished wall stroke
    Wall { points: Vec<Vec2> },
    Place(Placement),
    /// Remove the obstacle under the pointer
    Erase { pos: Vec2 },
    /// Move the painting light
    Light { pos: Vec2 },
    /// Add a shadow caster
    Caster(Caster),
    Reset,
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    pub events: Vec<InputEvent>,
}

impl FrameInput {
    pub fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

/// Eraser reach (pixels)
pub const ERASE_RADIUS: f32 = 20.0;

/// What happened during one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    pub spawned: usize,
    pub removed: usize,
    pub contacts: u32,
}

fn handle_event(scene: &mut Scene, event: &InputEvent) -> usize {
    match event {
        InputEvent::Tap { pos, intensity } => scene.tap(*pos, *intensity),
        InputEvent::Drag { pos, delta } => scene.drag(*pos, *delta),
        InputEvent::Tilt { x, y } => {
            scene.set_tilt(*x, *y);
            0
        }
        InputEvent::Brush {
            tool,
            pos,
            radius,
            strength,
        } => {
            let affected = scene.brush(*tool, *pos, *radius, *strength);
            log::debug!("{:?} brush moved {} particles", tool, affected);
            0
        }
        InputEvent::Combo { pos, combo } => scene.combo(*pos, *combo),
        InputEvent::Ball { pos, vel } => {
            if pos.is_finite() && vel.is_finite() {
                scene.table.add_ball(*pos, *vel);
            }
            0
        }
        InputEvent::Wall { points } => {
            scene.table.add_wall_polyline(points, WALL_THICKNESS);
            0
        }
        InputEvent::Place(placement) => {
            match *placement {
                Placement::Bumper(pos) => scene.table.add_bumper(pos, BUMPER_RADIUS),
                Placement::GravityWell(pos) => scene.table.add_gravity_well(pos, WELL_RADIUS, WELL_STRENGTH),
                Placement::Portals(a, b) => {
                    scene.table.add_portal_pair(a, b, PORTAL_RADIUS);
                }
            }
            0
        }
        InputEvent::Erase { pos } => {
            if let Some(index) = scene.table.obstacle_at(*pos, ERASE_RADIUS) {
                scene.table.remove_obstacle(index);
            }
            0
        }
        InputEvent::Light { pos } => {
            scene.light = pos.is_finite().then_some(*pos);
            0
        }
        InputEvent::Caster(caster) => {
            scene.casters.push(caster.clone());
            0
        }
        InputEvent::Reset => {
            scene.reset();
            0
        }
    }
}

/// Advance the scene by one fixed timestep
pub fn tick(scene: &mut Scene, input: &FrameInput, dt: f32) -> TickStats {
    let mut stats = TickStats::default();

    for event in &input.events {
        stats.spawned += handle_event(scene, event);
    }

    for action in scene.pending.drain_due(scene.time) {
        stats.spawned += scene.run_action(action);
    }

    stats.spawned += scene.run_emitters(dt);

    step(&mut scene.pool, dt, &scene.physics, &scene.forces);

    let table = scene.table.step(dt, &scene.physics, &scene.bounds);
    stats.contacts = table.contacts;

    scene.resolve_edges();

    scene.ripples.retain_mut(|r| r.update(dt));
    scene.forces.retain_mut(|f| f.decay());

    stats.removed = scene.pool.remove_dead();
    scene.time += dt;
    scene.frame += 1;
    stats
}
