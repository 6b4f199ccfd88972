//! Claw machine simulation
//!
//! All gameplay logic lives here. This module has no rendering or platform
//! dependencies:
//! - Virtual clock only; the host advances time
//! - Seeded RNG only
//! - Render changes are recorded as dirty sets, never applied directly

pub mod motion;
pub mod object;
pub mod sequencer;
pub mod state;
pub mod targeting;
pub mod timers;
pub mod toys;

pub use motion::{MotionTask, Pacing};
pub use object::{Attribute, ObjectId, Origin, Placement, Pose, PositionedObject};
pub use sequencer::{ArmPhase, Button, Continuation, Sequencer, Timing};
pub use state::{ClawVisual, GameEvent, GameSession, Parts};
pub use targeting::{Footprint, find_closest_toy, hang_angle, overlaps};
pub use timers::{TimerId, TimerQueue, TimerTask};
pub use toys::{Toy, ToyVisual};
