//! Delayed effects, held as data until their scene time comes due

use super::effects::{Burst, Ripple};

/// Work a delayed effect performs
#[derive(Debug, Clone)]
pub enum Action {
    Burst(Burst),
    Ripple(Ripple),
}

#[derive(Debug, Clone)]
pub struct ScheduledAction {
    /// Scene time (seconds) at which the action fires
    pub due: f32,
    seq: u64,
    pub action: Action,
}

/// Pending actions, drained once per frame
#[derive(Debug, Clone, Default)]
pub struct PendingQueue {
    items: Vec<ScheduledAction>,
    next_seq: u64,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-finite due times fire on the next drain
    pub fn schedule(&mut self, due: f32, action: Action) {
        let due = if due.is_finite() { due } else { f32::NEG_INFINITY };
        self.items.push(ScheduledAction {
            due,
            seq: self.next_seq,
            action,
        });
        self.next_seq += 1;
    }

    /// Remove and return every action due at or before `now`, ordered by due
    /// time then by scheduling order
    pub fn drain_due(&mut self, now: f32) -> Vec<Action> {
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.items.drain(..).partition(|item| item.due <= now);
        self.items = pending;
        due.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.seq.cmp(&b.seq)));
        due.into_iter().map(|item| item.action).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::particle::Color;
    use glam::Vec2;

    fn ripple(tag: f32) -> Action {
        Action::Ripple(Ripple::new(Vec2::new(tag, 0.0), 50.0, 40.0, 1.0, Color::WHITE, 0.5))
    }

    fn tag(action: &Action) -> f32 {
        match action {
            Action::Ripple(r) => r.center.x,
            Action::Burst(b) => b.origin.x,
        }
    }

    #[test]
    fn test_drain_orders_by_due_then_insertion() {
        let mut queue = PendingQueue::new();
        queue.schedule(0.2, ripple(3.0));
        queue.schedule(0.1, ripple(1.0));
        queue.schedule(0.1, ripple(2.0));
        queue.schedule(0.5, ripple(4.0));

        let fired: Vec<f32> = queue.drain_due(0.3).iter().map(tag).collect();
        assert_eq!(fired, vec![1.0, 2.0, 3.0]);
        assert_eq!(queue.len(), 1);
        assert!(queue.drain_due(0.3).is_empty());
        assert_eq!(queue.drain_due(1.0).len(), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_clear_cancels_everything() {
        let mut queue = PendingQueue::new();
        queue.schedule(0.1, ripple(0.0));
        queue.schedule(f32::NAN, ripple(1.0));
        queue.clear();
        assert!(queue.drain_due(f32::INFINITY).is_empty());
    }

    #[test]
    fn test_non_finite_due_fires_immediately() {
        let mut queue = PendingQueue::new();
        queue.schedule(f32::NAN, ripple(1.0));
        assert_eq!(queue.drain_due(0.0).len(), 1);
    }
}
