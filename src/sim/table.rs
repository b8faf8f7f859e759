//! Pinball sandbox: balls, drawn walls and special obstacles

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::bounds::{Rect, bounce_circle};
use super::collision::{Body, CollisionResult, circle_circle, circle_segment, resolve_pair, resolve_static};
use super::integrate::Physics;
use super::spatial::SpatialGrid;
use crate::consts::{BALL_RADIUS, DEFAULT_RESTITUTION, WELL_MIN_DISTANCE};

/// Default wall stroke thickness (pixels)
pub const WALL_THICKNESS: f32 = 8.0;
pub const BUMPER_RADIUS: f32 = 25.0;
/// Bumpers return more energy than they receive
pub const BUMPER_KICK: f32 = 2.0;
pub const WELL_RADIUS: f32 = 40.0;
/// Gravity well pull, scaled by 1/r² (pixels³/s²)
pub const WELL_STRENGTH: f32 = 200_000.0;
pub const PORTAL_RADIUS: f32 = 30.0;

/// Static table furniture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Obstacle {
    Wall {
        a: Vec2,
        b: Vec2,
        thickness: f32,
    },
    /// Bounces balls off with restitution `kick`
    Bumper {
        center: Vec2,
        radius: f32,
        kick: f32,
    },
    /// Inverse-square attraction while a ball's centre is within `radius`
    GravityWell {
        center: Vec2,
        radius: f32,
        strength: f32,
    },
    /// Teleports a ball to `exit`, the centre of its partner portal
    Portal {
        center: Vec2,
        radius: f32,
        exit: Vec2,
        pair: u32,
    },
}

impl Obstacle {
    /// Distance from `pos` to the obstacle's outline (0 inside)
    pub fn distance_to(&self, pos: Vec2) -> f32 {
        match *self {
            Obstacle::Wall { a, b, thickness } => {
                let line = b - a;
                let len_sq = line.length_squared();
                let t = if len_sq > 0.0 {
                    ((pos - a).dot(line) / len_sq).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                (pos.distance(a + line * t) - thickness * 0.5).max(0.0)
            }
            Obstacle::Bumper { center, radius, .. }
            | Obstacle::GravityWell { center, radius, .. }
            | Obstacle::Portal { center, radius, .. } => (pos.distance(center) - radius).max(0.0),
        }
    }
}

/// Step counters, for logging
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableStats {
    pub contacts: u32,
    pub teleports: u32,
}

#[derive(Debug, Clone)]
pub struct Table {
    pub bodies: Vec<Body>,
    pub obstacles: Vec<Obstacle>,
    grid: SpatialGrid,
    /// Wall and edge bounce for balls, shared with the particle edges
    ball_restitution: f32,
    next_body_id: u32,
    next_pair: u32,
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

impl Table {
    pub fn new() -> Self {
        Self {
            bodies: Vec::new(),
            obstacles: Vec::new(),
            grid: SpatialGrid::new(BALL_RADIUS * 2.0),
            ball_restitution: DEFAULT_RESTITUTION,
            next_body_id: 0,
            next_pair: 0,
        }
    }

    /// Drop a ball; returns its id
    pub fn add_ball(&mut self, pos: Vec2, vel: Vec2) -> u32 {
        let id = self.next_body_id;
        self.next_body_id = self.next_body_id.wrapping_add(1);
        self.bodies
            .push(Body::new(id, pos, vel, BALL_RADIUS).with_restitution(self.ball_restitution));
        id
    }

    pub fn ball_restitution(&self) -> f32 {
        self.ball_restitution
    }

    /// Change the bounce of new and existing balls (clamped to [0, 1])
    pub fn set_ball_restitution(&mut self, restitution: f32) {
        let r = if restitution.is_finite() {
            restitution.clamp(0.0, 1.0)
        } else {
            DEFAULT_RESTITUTION
        };
        self.ball_restitution = r;
        for body in &mut self.bodies {
            body.restitution = r;
        }
    }

    /// One wall per consecutive pair of points. Returns the number added.
    pub fn add_wall_polyline(&mut self, points: &[Vec2], thickness: f32) -> usize {
        let before = self.obstacles.len();
        for seg in points.windows(2) {
            if seg[0].is_finite() && seg[1].is_finite() && seg[0] != seg[1] {
                self.obstacles.push(Obstacle::Wall {
                    a: seg[0],
                    b: seg[1],
                    thickness: thickness.max(1.0),
                });
            }
        }
        self.obstacles.len() - before
    }

    pub fn add_bumper(&mut self, center: Vec2, radius: f32) {
        self.obstacles.push(Obstacle::Bumper {
            center,
            radius: radius.max(1.0),
            kick: BUMPER_KICK,
        });
    }

    pub fn add_gravity_well(&mut self, center: Vec2, radius: f32, strength: f32) {
        self.obstacles.push(Obstacle::GravityWell {
            center,
            radius: radius.max(1.0),
            strength,
        });
    }

    /// Two linked portals; a ball entering either comes out of the other
    pub fn add_portal_pair(&mut self, a: Vec2, b: Vec2, radius: f32) -> u32 {
        let pair = self.next_pair;
        self.next_pair = self.next_pair.wrapping_add(1);
        let radius = radius.max(1.0);
        self.obstacles.push(Obstacle::Portal {
            center: a,
            radius,
            exit: b,
            pair,
        });
        self.obstacles.push(Obstacle::Portal {
            center: b,
            radius,
            exit: a,
            pair,
        });
        pair
    }

    /// Index of the obstacle nearest to `pos`, if any is within `radius` (eraser)
    pub fn obstacle_at(&self, pos: Vec2, radius: f32) -> Option<usize> {
        self.obstacles
            .iter()
            .enumerate()
            .map(|(i, o)| (i, o.distance_to(pos)))
            .filter(|(_, d)| *d <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    /// Remove an obstacle; erasing a portal also removes its partner.
    ///
    /// Returns how many obstacles were removed.
    pub fn remove_obstacle(&mut self, index: usize) -> usize {
        if index >= self.obstacles.len() {
            return 0;
        }
        let removed = self.obstacles.remove(index);
        if let Obstacle::Portal { pair, .. } = removed {
            let before = self.obstacles.len();
            self.obstacles
                .retain(|o| !matches!(o, Obstacle::Portal { pair: p, .. } if *p == pair));
            for body in &mut self.bodies {
                if body.portal_lock == Some(pair) {
                    body.portal_lock = None;
                }
            }
            return 1 + before - self.obstacles.len();
        }
        1
    }

    /// Remove every ball, keep the furniture
    pub fn clear_bodies(&mut self) {
        self.bodies.clear();
    }

    pub fn clear(&mut self) {
        self.bodies.clear();
        self.obstacles.clear();
    }

    /// Advance the table by `dt`.
    ///
    /// Order: integrate, obstacle rules, ball-ball pairs, table edges.
    pub fn step(&mut self, dt: f32, physics: &Physics, bounds: &Rect) -> TableStats {
        let mut stats = TableStats::default();
        if self.bodies.is_empty() {
            return stats;
        }

        for body in self.bodies.iter_mut().filter(|b| !b.is_static()) {
            let accel = physics.gravity + well_accel(&self.obstacles, body.pos);
            body.vel += accel * dt;
            body.vel *= physics.friction;
            body.pos += body.vel * dt;
        }

        for body in self.bodies.iter_mut() {
            for obstacle in &self.obstacles {
                let (contact, restitution) = match *obstacle {
                    Obstacle::Wall { a, b, thickness } => (
                        circle_segment(body.pos, body.radius, a, b, thickness),
                        body.restitution,
                    ),
                    Obstacle::Bumper {
                        center,
                        radius,
                        kick,
                    } => (circle_circle(center, radius, body.pos, body.radius), kick),
                    _ => (CollisionResult::miss(), 0.0),
                };
                if contact.hit {
                    resolve_static(body, &contact, restitution);
                    stats.contacts += 1;
                }
            }
            if apply_portals(&self.obstacles, body) {
                stats.teleports += 1;
            }
        }

        self.grid.clear();
        let mut max_radius: f32 = 0.0;
        for (i, body) in self.bodies.iter().enumerate() {
            self.grid.insert(i, body.pos);
            max_radius = max_radius.max(body.radius);
        }
        for i in 0..self.bodies.len() {
            let query = self.bodies[i].radius + max_radius;
            for j in self.grid.query_radius(self.bodies[i].pos, query) {
                if j <= i {
                    continue;
                }
                let (left, right) = self.bodies.split_at_mut(j);
                if resolve_pair(&mut left[i], &mut right[0]) {
                    stats.contacts += 1;
                }
            }
        }

        for body in self.bodies.iter_mut() {
            bounce_circle(&mut body.pos, &mut body.vel, body.radius, bounds, body.restitution);
        }

        let before = self.bodies.len();
        self.bodies.retain(|b| b.pos.is_finite() && b.vel.is_finite());
        if self.bodies.len() != before {
            log::debug!("Dropped {} diverged balls", before - self.bodies.len());
        }
        stats
    }
}

fn well_accel(obstacles: &[Obstacle], pos: Vec2) -> Vec2 {
    obstacles
        .iter()
        .filter_map(|o| match *o {
            Obstacle::GravityWell {
                center,
                radius,
                strength,
            } => {
                let offset = center - pos;
                let dist = offset.length();
                if dist >= radius || dist <= f32::EPSILON {
                    return None;
                }
                let d = dist.max(WELL_MIN_DISTANCE);
                Some(offset / dist * strength / (d * d))
            }
            _ => None,
        })
        .sum()
}

/// Teleport through the first portal the ball's centre is inside. Returns true
/// on teleport.
fn apply_portals(obstacles: &[Obstacle], body: &mut Body) -> bool {
    let pos = body.pos;
    let inside = |o: &Obstacle| match *o {
        Obstacle::Portal { center, radius, .. } => pos.distance(center) < radius,
        _ => false,
    };

    if let Some(lock) = body.portal_lock {
        let still_inside = obstacles
            .iter()
            .any(|o| matches!(o, Obstacle::Portal { pair, .. } if *pair == lock) && inside(o));
        if still_inside {
            return false;
        }
        body.portal_lock = None;
    }

    let entered = obstacles.iter().find_map(|o| match *o {
        Obstacle::Portal { exit, pair, .. } if inside(o) => Some((exit, pair)),
        _ => None,
    });
    match entered {
        Some((exit, pair)) => {
            body.pos = exit;
            body.portal_lock = Some(pair);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena() -> Rect {
        Rect::from_size(1000.0, 1000.0)
    }

    #[test]
    fn test_polyline_makes_one_wall_per_pair() {
        let mut table = Table::new();
        let points = [
            Vec2::new(0.0, 0.0),
            Vec2::new(100.0, 0.0),
            Vec2::new(100.0, 0.0),
            Vec2::new(100.0, 100.0),
        ];
        // The repeated point contributes nothing
        assert_eq!(table.add_wall_polyline(&points, WALL_THICKNESS), 2);
        assert_eq!(table.add_wall_polyline(&points[..1], WALL_THICKNESS), 0);
    }

    #[test]
    fn test_ball_bounces_off_wall() {
        let mut table = Table::new();
        table.add_wall_polyline(&[Vec2::new(0.0, 500.0), Vec2::new(1000.0, 500.0)], WALL_THICKNESS);
        table.add_ball(Vec2::new(500.0, 470.0), Vec2::new(0.0, 300.0));
        let stats = table.step(1.0 / 60.0, &Physics::none(), &arena());
        assert!(stats.contacts >= 1);
        let ball = &table.bodies[0];
        assert!(ball.vel.y < 0.0);
        assert!(ball.pos.y <= 500.0 - BALL_RADIUS - WALL_THICKNESS * 0.5 + 1e-3);
    }

    #[test]
    fn test_bumper_adds_energy() {
        let mut table = Table::new();
        table.add_bumper(Vec2::new(500.0, 500.0), BUMPER_RADIUS);
        table.add_ball(Vec2::new(500.0, 500.0 - BUMPER_RADIUS - BALL_RADIUS + 2.0), Vec2::new(0.0, 100.0));
        table.step(1.0 / 60.0, &Physics::none(), &arena());
        assert!(table.bodies[0].vel.y < -150.0);
    }

    #[test]
    fn test_gravity_well_pulls_in() {
        let mut table = Table::new();
        table.add_gravity_well(Vec2::new(500.0, 500.0), 200.0, WELL_STRENGTH);
        table.add_ball(Vec2::new(400.0, 500.0), Vec2::ZERO);
        table.step(1.0 / 60.0, &Physics::none(), &arena());
        assert!(table.bodies[0].vel.x > 0.0);
        assert_eq!(table.bodies[0].vel.y, 0.0);
    }

    #[test]
    fn test_portal_teleports_once_until_exit() {
        let mut table = Table::new();
        let a = Vec2::new(200.0, 200.0);
        let b = Vec2::new(800.0, 800.0);
        table.add_portal_pair(a, b, PORTAL_RADIUS);
        table.add_ball(a, Vec2::new(60.0, 0.0));

        let stats = table.step(1.0 / 60.0, &Physics::none(), &arena());
        assert_eq!(stats.teleports, 1);
        let ball = &table.bodies[0];
        assert_eq!(ball.pos, b);
        assert_eq!(ball.vel, Vec2::new(60.0, 0.0));

        // Still inside the exit disc: no bounce back
        let stats = table.step(1.0 / 60.0, &Physics::none(), &arena());
        assert_eq!(stats.teleports, 0);
        assert!(table.bodies[0].pos.distance(b) < PORTAL_RADIUS);
    }

    #[test]
    fn test_eraser_finds_nearest_and_removes_portal_pairs() {
        let mut table = Table::new();
        table.add_bumper(Vec2::new(100.0, 100.0), BUMPER_RADIUS);
        table.add_portal_pair(Vec2::new(300.0, 300.0), Vec2::new(600.0, 600.0), PORTAL_RADIUS);

        assert_eq!(table.obstacle_at(Vec2::new(100.0, 140.0), 20.0), Some(0));
        assert_eq!(table.obstacle_at(Vec2::new(900.0, 100.0), 20.0), None);

        let portal = table
            .obstacle_at(Vec2::new(600.0, 600.0), 20.0)
            .expect("portal under cursor");
        assert_eq!(table.remove_obstacle(portal), 2);
        assert_eq!(table.obstacles.len(), 1);
        assert_eq!(table.remove_obstacle(10), 0);
    }

    #[test]
    fn test_balls_collide_through_grid() {
        let mut table = Table::new();
        table.add_ball(Vec2::new(500.0, 500.0), Vec2::new(50.0, 0.0));
        table.add_ball(Vec2::new(550.0, 500.0), Vec2::new(-50.0, 0.0));
        table.step(1.0 / 60.0, &Physics::none(), &arena());
        let (a, b) = (&table.bodies[0], &table.bodies[1]);
        assert!(a.vel.x < 0.0 && b.vel.x > 0.0);
        assert!(a.pos.distance(b.pos) >= 2.0 * BALL_RADIUS - 1e-3);
    }

    #[test]
    fn test_restitution_setting_reaches_balls() {
        let mut table = Table::new();
        table.add_ball(Vec2::new(500.0, 500.0), Vec2::ZERO);
        table.set_ball_restitution(0.25);
        table.add_ball(Vec2::new(200.0, 200.0), Vec2::ZERO);
        assert!(table.bodies.iter().all(|b| b.restitution == 0.25));

        table.set_ball_restitution(f32::NAN);
        assert_eq!(table.ball_restitution(), DEFAULT_RESTITUTION);

        // Dead ball off the floor
        table.set_ball_restitution(0.0);
        table.clear_bodies();
        table.add_ball(Vec2::new(500.0, 990.0 - BALL_RADIUS), Vec2::new(0.0, 1200.0));
        table.step(1.0 / 60.0, &Physics::none(), &arena());
        assert!(table.bodies[0].vel.y.abs() < 1e-3);
    }

    #[test]
    fn test_fast_ball_does_not_overflow_grid() {
        let mut table = Table::new();
        table.add_ball(Vec2::new(500.0, 500.0), Vec2::new(1e30, 0.0));
        table.add_ball(Vec2::new(100.0, 100.0), Vec2::ZERO);
        table.step(1.0 / 60.0, &Physics::none(), &arena());
        assert!(table.bodies.len() <= 2);
        assert!(table.bodies.iter().all(|b| b.pos.is_finite()));
    }

    #[test]
    fn test_balls_stay_on_table() {
        let mut table = Table::new();
        table.add_ball(Vec2::new(990.0, 10.0), Vec2::new(600.0, -600.0));
        for _ in 0..30 {
            table.step(1.0 / 60.0, &Physics::default(), &arena());
        }
        let ball = &table.bodies[0];
        assert!(arena().contains(ball.pos));
        table.clear_bodies();
        assert!(table.bodies.is_empty());
    }
}
