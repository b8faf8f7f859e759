//! Host frame timestamps to fixed simulation substeps
//!
//! The host calls `advance` once per animation frame with its timestamp and
//! runs `tick` once per returned substep. Leftover time carries over.

use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};

#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    /// Unsimulated time (seconds)
    pub accumulator: f32,
    /// Previous host timestamp (milliseconds); None before the first frame
    pub last_time_ms: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a host timestamp; returns how many `SIM_DT` steps to run
    pub fn advance(&mut self, now_ms: f64) -> u32 {
        let dt = match self.last_time_ms {
            Some(last) => ((now_ms - last) / 1000.0) as f32,
            None => SIM_DT,
        };
        self.last_time_ms = Some(now_ms);

        // Clock went backwards or the tab slept
        let dt = if dt.is_finite() { dt.clamp(0.0, MAX_FRAME_DT) } else { 0.0 };
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        // Drop what the substep cap could not absorb
        if substeps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(SIM_DT);
        }
        substeps
    }

    /// Forget timing history (after a pause or tab switch)
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.last_time_ms = None;
    }

    /// Fraction of a step left over, for render interpolation
    pub fn alpha(&self) -> f32 {
        (self.accumulator / SIM_DT).clamp(0.0, 1.0)
    }
}
