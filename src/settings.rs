//! Runtime settings
//!
//! Persisted as JSON in LocalStorage. Every knob applies live; only a change
//! in the particle cap reallocates the pool.

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_FRICTION, DEFAULT_GRAVITY, DEFAULT_RESTITUTION};
use crate::error::SettingsError;
use crate::renderer::AlphaCurve;
use crate::sim::bounds::BoundaryPolicy;
use crate::sim::effects::TapStyle;
use crate::sim::emitter::Palette;
use crate::sim::pool::EvictionPolicy;

/// Device tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Pool capacity for this tier
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 300,
            QualityPreset::Medium => 1000,
            QualityPreset::High => 3000,
        }
    }

    /// Multiplier on effect burst counts
    pub fn burst_scale(&self) -> f32 {
        match self {
            QualityPreset::Low => 0.3,
            QualityPreset::Medium => 0.6,
            QualityPreset::High => 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub quality: QualityPreset,

    // === Particles ===
    /// Master switch; off clears the scene
    pub particles: bool,
    /// Multiplier on the tier's particle cap (0.1 - 2.0)
    pub density: f32,
    /// Multiplier on spawned particle size (0.25 - 4.0)
    pub particle_size: f32,
    pub tap_style: TapStyle,
    pub palette: Palette,
    pub alpha_curve: AlphaCurve,

    // === Physics ===
    /// Downward gravity (pixels/s², 0 - 2000)
    pub gravity: f32,
    /// Per-step velocity multiplier (0.8 - 1.0)
    pub friction: f32,
    /// Edge bounce restitution (0.0 - 1.0)
    pub restitution: f32,
    pub boundary: BoundaryKind,
    pub eviction: EvictionPolicy,
}

/// Edge behaviour as stored in settings; restitution is its own knob
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BoundaryKind {
    Open,
    #[default]
    Bounce,
    Wrap,
    Respawn,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,

            particles: true,
            density: 1.0,
            particle_size: 1.0,
            tap_style: TapStyle::Standard,
            palette: Palette::Quantum,
            alpha_curve: AlphaCurve::Linear,

            gravity: DEFAULT_GRAVITY,
            friction: DEFAULT_FRICTION,
            restitution: DEFAULT_RESTITUTION,
            boundary: BoundaryKind::Bounce,
            eviction: EvictionPolicy::OldestFirst,
        }
    }
}

fn clamp_or(v: f32, lo: f32, hi: f32, fallback: f32) -> f32 {
    if v.is_finite() { v.clamp(lo, hi) } else { fallback }
}

impl Settings {
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Clamp every numeric knob into range (NaN falls back to the default)
    pub fn sanitized(mut self) -> Self {
        self.density = clamp_or(self.density, 0.1, 2.0, 1.0);
        self.particle_size = clamp_or(self.particle_size, 0.25, 4.0, 1.0);
        self.gravity = clamp_or(self.gravity, 0.0, 2000.0, DEFAULT_GRAVITY);
        self.friction = clamp_or(self.friction, 0.8, 1.0, DEFAULT_FRICTION);
        self.restitution = clamp_or(self.restitution, 0.0, 1.0, DEFAULT_RESTITUTION);
        self
    }

    /// Parse stored JSON; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        Ok(settings.sanitized())
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Effective pool capacity
    pub fn max_particles(&self) -> usize {
        if !self.particles {
            0
        } else {
            (self.quality.max_particles() as f32 * self.density).round() as usize
        }
    }

    pub fn boundary_policy(&self) -> BoundaryPolicy {
        match self.boundary {
            BoundaryKind::Open => BoundaryPolicy::Open,
            BoundaryKind::Bounce => BoundaryPolicy::Bounce {
                restitution: self.restitution,
            },
            BoundaryKind::Wrap => BoundaryPolicy::Wrap,
            BoundaryKind::Respawn => BoundaryPolicy::Respawn,
        }
    }

    fn parse_or_default(json: &str) -> Self {
        match Self::from_json(json) {
            Ok(settings) => {
                log::info!("Loaded settings from LocalStorage");
                settings
            }
            Err(e) => {
                log::warn!("{}; using default settings", e);
                Self::default()
            }
        }
    }

    /// LocalStorage key
    const STORAGE_KEY: &'static str = "particle_toybox_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                return Self::parse_or_default(&json);
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            match self.to_json() {
                Ok(json) => {
                    let _ = storage.set_item(Self::STORAGE_KEY, &json);
                    log::info!("Settings saved");
                }
                Err(e) => log::warn!("{}", e),
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        log::debug!("No settings store for {}", Self::STORAGE_KEY);
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
