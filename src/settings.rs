//! Game settings and preferences
//!
//! Persisted in LocalStorage. Only pacing is configurable; machine geometry
//! is fixed in `consts`.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::{Pacing, Timing};

/// Overall machine speed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SpeedPreset {
    Relaxed,
    #[default]
    Normal,
    Arcade,
}

impl SpeedPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeedPreset::Relaxed => "Relaxed",
            SpeedPreset::Normal => "Normal",
            SpeedPreset::Arcade => "Arcade",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "relaxed" | "slow" => Some(SpeedPreset::Relaxed),
            "normal" => Some(SpeedPreset::Normal),
            "arcade" | "fast" => Some(SpeedPreset::Arcade),
            _ => None,
        }
    }

    /// Step interval multiplier (1.0 = canonical)
    pub fn interval_scale(&self) -> f32 {
        match self {
            SpeedPreset::Relaxed => 1.5,
            SpeedPreset::Normal => 1.0,
            SpeedPreset::Arcade => 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub preset: SpeedPreset,

    // === Motion ===
    /// Distance covered per motion tick
    pub step_size: f32,
    /// Milliseconds between motion ticks, before the preset scale
    pub step_interval_ms: u64,

    // === Pauses ===
    /// Claw open before the arm extends
    pub open_delay_ms: u64,
    /// Fully extended before the claw closes
    pub grab_delay_ms: u64,
    /// Hovering over the chute before release
    pub drop_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            preset: SpeedPreset::Normal,
            step_size: STEP_SIZE,
            step_interval_ms: STEP_INTERVAL_MS,
            open_delay_ms: OPEN_DELAY_MS,
            grab_delay_ms: GRAB_DELAY_MS,
            drop_delay_ms: DROP_DELAY_MS,
        }
    }
}

impl Settings {
    pub fn from_preset(preset: SpeedPreset) -> Self {
        Self {
            preset,
            ..Self::default()
        }
    }

    /// Step interval after the preset scale, never below 1 ms
    pub fn effective_interval_ms(&self) -> u64 {
        ((self.step_interval_ms as f32 * self.preset.interval_scale()).round() as u64).max(1)
    }

    /// Sequencer timing for these settings
    pub fn timing(&self) -> Timing {
        let step = if self.step_size > 0.0 {
            self.step_size
        } else {
            log::warn!("Step size {} is not positive, using {}", self.step_size, STEP_SIZE);
            STEP_SIZE
        };
        Timing {
            pacing: Pacing {
                step,
                interval_ms: self.effective_interval_ms(),
            },
            open_delay_ms: self.open_delay_ms,
            grab_delay_ms: self.grab_delay_ms,
            drop_delay_ms: self.drop_delay_ms,
        }
    }

    /// LocalStorage key
    const STORAGE_KEY: &'static str = "claw_machine_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match serde_json::from_str(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
                }
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
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
