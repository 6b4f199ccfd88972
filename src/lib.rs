//! Claw Machine - a virtual claw-machine arcade game
//!
//! Core modules:
//! - `sim`: Timer-driven motion, toy targeting and the arm state machine
//! - `engine`: Ties the simulation to a render surface and the host clock
//! - `renderer`: Render surface capability (DOM on the web)
//! - `platform`: Host page messaging (turn sync, collection reports)
//! - `catalog`: Toy catalog metadata and fetching
//! - `settings`: Pacing preferences

pub mod catalog;
pub mod engine;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use catalog::{Catalog, CatalogError, ToyMeta};
pub use engine::Engine;
pub use settings::{Settings, SpeedPreset};

/// Machine geometry and pacing constants (layout units, milliseconds)
pub mod consts {
    use glam::Vec2;

    /// Largest distance covered by one motion tick
    pub const STEP_SIZE: f32 = 10.0;
    /// Default motion tick period
    pub const STEP_INTERVAL_MS: u64 = 100;

    /// Claw opens this long before the arm starts extending
    pub const OPEN_DELAY_MS: u64 = 500;
    /// Pause at full extension before the claw closes
    pub const GRAB_DELAY_MS: u64 = 500;
    /// Pause over the chute before the toy is released
    pub const DROP_DELAY_MS: u64 = 700;

    /// Vertical rail: slides along x
    pub const RAIL_REST: Vec2 = Vec2::new(20.0, 40.0);
    pub const RAIL_SIZE: Vec2 = Vec2::new(16.0, 200.0);
    pub const RAIL_FAR_X: f32 = 300.0;

    /// Arm joint: mounted on the rail (x is rail-relative), slides along y
    pub const JOINT_REST: Vec2 = Vec2::new(0.0, 180.0);
    pub const JOINT_SIZE: Vec2 = Vec2::new(32.0, 24.0);
    pub const JOINT_TOP_Y: f32 = 40.0;

    /// Arm extension: its height is the cable length
    pub const ARM_REST: Vec2 = Vec2::new(12.0, 24.0);
    pub const ARM_SIZE: Vec2 = Vec2::new(8.0, 40.0);
    pub const ARM_MAX_H: f32 = 160.0;

    /// Claw tip relative to the joint's world position
    pub const CLAW_OFFSET: Vec2 = Vec2::new(20.0, 200.0);
    pub const CLAW_SIZE: Vec2 = Vec2::new(24.0, 16.0);

    /// Toy cavity grid (lower part of the machine)
    pub const SPAWN_SLOTS: usize = 12;
    pub const GRID_COLUMNS: usize = 4;
    pub const CAVITY_ORIGIN: Vec2 = Vec2::new(20.0, 270.0);
    pub const CELL_SIZE: Vec2 = Vec2::new(80.0, 50.0);
    /// Per-toy placement jitter bound (±x, ±y)
    pub const JITTER: Vec2 = Vec2::new(6.0, 2.0);

    /// Where a held toy lands after the drop
    pub const DROP_POINT: Vec2 = Vec2::new(300.0, 440.0);
    /// Display shelf for collected toys
    pub const SHELF_ORIGIN: Vec2 = Vec2::new(10.0, 500.0);
    pub const SHELF_SPACING: f32 = 44.0;

    /// Paint order
    pub const TOY_Z_BASE: i32 = 1;
    pub const RAIL_Z: i32 = 30;
    pub const ARM_Z: i32 = 31;
    pub const JOINT_Z: i32 = 32;
}

/// Normalize an angle in degrees to (-180, 180]
///
/// Folds into [0, 360) first, then re-expresses anything past 180 as a
/// negative (left-leaning) angle. Non-finite input maps to 0.
#[inline]
pub fn normalize_angle(degrees: f32) -> f32 {
    if !degrees.is_finite() {
        return 0.0;
    }
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    let angle = degrees.rem_euclid(360.0);
    if angle > 180.0 { angle - 360.0 } else { angle }
}
