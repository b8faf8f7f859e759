//! Bounded particle pool
//!
//! Insertion order is kept so that "oldest" is always the front of the queue.
//! The pool never grows past its capacity and never refuses an insert: when
//! full, one resident is evicted according to the pool's policy.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::particle::Particle;

/// Which particle gives way when the pool is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EvictionPolicy {
    /// Evict the oldest particle (FIFO)
    #[default]
    OldestFirst,
    /// Evict the lowest-priority particle, oldest first among equals
    LowestPriority,
}

/// Fixed-capacity particle container
#[derive(Debug, Clone)]
pub struct ParticlePool {
    particles: VecDeque<Particle>,
    capacity: usize,
    policy: EvictionPolicy,
    /// Total particles evicted for capacity since creation
    evicted: u64,
}

impl ParticlePool {
    pub fn new(capacity: usize, policy: EvictionPolicy) -> Self {
        Self {
            particles: VecDeque::with_capacity(capacity),
            capacity,
            policy,
            evicted: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn evicted_total(&self) -> u64 {
        self.evicted
    }

    /// Insert a particle, evicting one resident first if the pool is full.
    ///
    /// Returns the evicted particle, if any. With a capacity of zero the
    /// incoming particle itself is returned.
    pub fn add(&mut self, particle: Particle) -> Option<Particle> {
        if self.capacity == 0 {
            self.evicted += 1;
            return Some(particle);
        }

        let evicted = if self.particles.len() >= self.capacity {
            self.evict_one()
        } else {
            None
        };
        self.particles.push_back(particle);
        evicted
    }

    /// Drop every dead particle, returning how many were removed
    pub fn remove_dead(&mut self) -> usize {
        let before = self.particles.len();
        self.particles.retain(|p| p.is_alive());
        before - self.particles.len()
    }

    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&Particle),
    {
        for p in &self.particles {
            f(p);
        }
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Particle> {
        self.particles.iter_mut()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    /// Change capacity (density/quality change). Shrinking evicts by policy.
    pub fn reallocate(&mut self, capacity: usize) {
        if capacity == self.capacity {
            return;
        }
        log::info!(
            "Particle pool capacity {} -> {} ({} live)",
            self.capacity,
            capacity,
            self.particles.len()
        );
        self.capacity = capacity;
        while self.particles.len() > capacity {
            if self.evict_one().is_none() {
                break;
            }
        }
        if self.particles.capacity() < capacity {
            self.particles.reserve(capacity - self.particles.len());
        }
    }

    fn evict_one(&mut self) -> Option<Particle> {
        let victim = match self.policy {
            EvictionPolicy::OldestFirst => self.particles.pop_front(),
            EvictionPolicy::LowestPriority => {
                // min_by_key returns the first minimum, i.e. the oldest
                let idx = self
                    .particles
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, p)| p.class.priority())
                    .map(|(i, _)| i);
                idx.and_then(|i| self.particles.remove(i))
            }
        };
        if victim.is_some() {
            self.evicted += 1;
        }
        victim
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::particle::EffectClass;
    use glam::Vec2;
    use proptest::prelude::*;

    fn particle_at(x: f32) -> Particle {
        Particle::new(Vec2::new(x, 0.0), Vec2::ZERO, 1.0)
    }

    #[test]
    fn test_fifo_eviction_drops_oldest() {
        let mut pool = ParticlePool::new(3, EvictionPolicy::OldestFirst);
        for i in 0..3 {
            assert!(pool.add(particle_at(i as f32)).is_none());
        }
        let evicted = pool.add(particle_at(3.0)).expect("pool was full");
        assert_eq!(evicted.pos.x, 0.0);
        assert_eq!(pool.len(), 3);
        let xs: Vec<f32> = pool.iter().map(|p| p.pos.x).collect();
        assert_eq!(xs, vec![1.0, 2.0, 3.0]);
        assert_eq!(pool.evicted_total(), 1);
    }

    #[test]
    fn test_priority_eviction_keeps_milestones() {
        let mut pool = ParticlePool::new(3, EvictionPolicy::LowestPriority);
        pool.add(particle_at(0.0).with_class(EffectClass::Milestone));
        pool.add(particle_at(1.0).with_class(EffectClass::Tap));
        pool.add(particle_at(2.0).with_class(EffectClass::Tap));

        let evicted = pool.add(particle_at(3.0).with_class(EffectClass::Milestone));
        // Oldest of the two taps goes
        assert_eq!(evicted.map(|p| p.pos.x), Some(1.0));
        assert!(pool.iter().any(|p| p.pos.x == 0.0));
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn test_zero_capacity_never_holds() {
        let mut pool = ParticlePool::new(0, EvictionPolicy::OldestFirst);
        assert!(pool.add(particle_at(0.0)).is_some());
        assert!(pool.is_empty());
    }

    #[test]
    fn test_remove_dead_is_idempotent() {
        let mut pool = ParticlePool::new(8, EvictionPolicy::OldestFirst);
        pool.add(particle_at(0.0));
        let mut dead = particle_at(1.0);
        dead.kill();
        pool.add(dead);
        pool.add(particle_at(2.0));

        assert_eq!(pool.remove_dead(), 1);
        let first: Vec<f32> = pool.iter().map(|p| p.pos.x).collect();
        assert_eq!(pool.remove_dead(), 0);
        let second: Vec<f32> = pool.iter().map(|p| p.pos.x).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_reallocate_shrinks_by_policy() {
        let mut pool = ParticlePool::new(5, EvictionPolicy::OldestFirst);
        for i in 0..5 {
            pool.add(particle_at(i as f32));
        }
        pool.reallocate(2);
        assert_eq!(pool.capacity(), 2);
        let xs: Vec<f32> = pool.iter().map(|p| p.pos.x).collect();
        assert_eq!(xs, vec![3.0, 4.0]);

        pool.reallocate(10);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.capacity(), 10);
    }

    proptest! {
        #[test]
        fn prop_pool_never_exceeds_capacity(
            capacity in 0usize..64,
            adds in 0usize..300,
            priority_policy in any::<bool>(),
        ) {
            let policy = if priority_policy {
                EvictionPolicy::LowestPriority
            } else {
                EvictionPolicy::OldestFirst
            };
            let mut pool = ParticlePool::new(capacity, policy);
            for i in 0..adds {
                let class = match i % 4 {
                    0 => EffectClass::Ambient,
                    1 => EffectClass::Tap,
                    2 => EffectClass::Combo,
                    _ => EffectClass::Milestone,
                };
                pool.add(particle_at(i as f32).with_class(class));
                prop_assert!(pool.len() <= capacity);
            }
            prop_assert_eq!(pool.len(), adds.min(capacity));
        }
    }
}
