//! Arm sequencer: the grab-cycle state machine
//!
//! Two momentary buttons drive the cycle:
//!
//! ```text
//! Idle --h-press--> HorizontalTravel --h-release / bound--> Idle (vertical unlocked)
//! Idle --v-press--> VerticalDescend --v-release / bound--> Grabbing
//! Grabbing --extended, grab--> VerticalAscend --> HorizontalReturn --> VerticalRetract
//! VerticalRetract --joint home--> Dropping --delay--> Idle (horizontal unlocked)
//! ```
//!
//! Every phase ends in exactly one `Continuation`, produced either by a motion
//! reaching its target, by a button release cutting the motion short, or by a
//! pacing delay. Continuations that do not match the current phase are
//! ignored, so two concurrent legs of the cycle cannot happen.

use serde::{Deserialize, Serialize};

use super::motion::{self, Pacing};
use super::object::{Attribute, Origin};
use super::state::{ClawVisual, GameEvent, GameSession};
use super::targeting::{self, Footprint};
use super::timers::{TimerId, TimerTask};
use super::toys::ToyVisual;
use crate::consts::*;

/// Player-visible phase of the grab cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ArmPhase {
    #[default]
    Idle,
    /// Rail sliding toward the far side
    HorizontalTravel,
    /// Joint traveling toward the back; the claw lowers into position
    VerticalDescend,
    /// Claw open, arm extending, claw closing
    Grabbing,
    /// Arm retracting
    VerticalAscend,
    /// Rail sliding home
    HorizontalReturn,
    /// Joint sliding home
    VerticalRetract,
    /// Hovering over the chute
    Dropping,
}

/// What happens when a leg of the cycle ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Continuation {
    HorizontalStopped,
    VerticalStopped,
    BeginExtend,
    Extended,
    Grab,
    Retracted,
    RailReturned,
    JointReturned,
    Drop,
}

impl Continuation {
    /// The only phase this continuation may fire in
    fn expected_phase(self) -> ArmPhase {
        match self {
            Continuation::HorizontalStopped => ArmPhase::HorizontalTravel,
            Continuation::VerticalStopped => ArmPhase::VerticalDescend,
            Continuation::BeginExtend | Continuation::Extended | Continuation::Grab => {
                ArmPhase::Grabbing
            }
            Continuation::Retracted => ArmPhase::VerticalAscend,
            Continuation::RailReturned => ArmPhase::HorizontalReturn,
            Continuation::JointReturned => ArmPhase::VerticalRetract,
            Continuation::Drop => ArmPhase::Dropping,
        }
    }
}

/// Momentary input buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Button {
    Horizontal,
    Vertical,
}

/// Motion pacing and the pauses between legs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timing {
    pub pacing: Pacing,
    pub open_delay_ms: u64,
    pub grab_delay_ms: u64,
    pub drop_delay_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            pacing: Pacing::default(),
            open_delay_ms: OPEN_DELAY_MS,
            grab_delay_ms: GRAB_DELAY_MS,
            drop_delay_ms: DROP_DELAY_MS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Sequencer {
    phase: ArmPhase,
    horizontal_locked: bool,
    vertical_locked: bool,
    timing: Timing,
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new(Timing::default())
    }
}

impl Sequencer {
    pub fn new(timing: Timing) -> Self {
        Self {
            phase: ArmPhase::Idle,
            horizontal_locked: false,
            vertical_locked: true,
            timing,
        }
    }

    pub fn phase(&self) -> ArmPhase {
        self.phase
    }

    pub fn is_locked(&self, button: Button) -> bool {
        match button {
            Button::Horizontal => self.horizontal_locked,
            Button::Vertical => self.vertical_locked,
        }
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    pub fn press(&mut self, session: &mut GameSession, button: Button) {
        if session.is_torn_down() || self.phase != ArmPhase::Idle || self.is_locked(button) {
            return;
        }
        let parts = session.parts;
        let pacing = self.timing.pacing;
        let now = match button {
            Button::Horizontal => {
                if session.remaining_turns <= 0 {
                    log::debug!("No turns left, ignoring horizontal press");
                    return;
                }
                self.enter(ArmPhase::HorizontalTravel);
                motion::move_attr(
                    session,
                    parts.rail,
                    Attribute::X,
                    Some(RAIL_FAR_X),
                    pacing,
                    Some(Continuation::HorizontalStopped),
                )
            }
            Button::Vertical => {
                self.enter(ArmPhase::VerticalDescend);
                motion::move_attr(
                    session,
                    parts.joint,
                    Attribute::Y,
                    Some(JOINT_TOP_Y),
                    pacing,
                    Some(Continuation::VerticalStopped),
                )
            }
        };
        self.run(session, now);
    }

    /// An early release ends the leg exactly like reaching the bound
    pub fn release(&mut self, session: &mut GameSession, button: Button) {
        let (phase, object) = match button {
            Button::Horizontal => (ArmPhase::HorizontalTravel, session.parts.rail),
            Button::Vertical => (ArmPhase::VerticalDescend, session.parts.joint),
        };
        if self.phase != phase {
            return;
        }
        let now = motion::halt(session, object);
        self.run(session, now);
    }

    /// Dispatch a fired timer
    pub fn on_timer(&mut self, session: &mut GameSession, id: TimerId, task: TimerTask) {
        let now = match task {
            TimerTask::Motion(task) => motion::step(session, id, &task),
            TimerTask::Delay(continuation) => Some(continuation),
        };
        self.run(session, now);
    }

    /// Run a continuation and anything it completes synchronously
    pub fn run(&mut self, session: &mut GameSession, first: Option<Continuation>) {
        let mut next = first;
        while let Some(continuation) = next {
            next = self.advance(session, continuation);
        }
    }

    fn enter(&mut self, phase: ArmPhase) {
        log::debug!("Arm phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    fn delay(&self, session: &mut GameSession, ms: u64, continuation: Continuation) {
        session
            .timers
            .schedule_once(ms, TimerTask::Delay(continuation));
    }

    /// One transition. Returns a continuation that completed immediately.
    fn advance(&mut self, session: &mut GameSession, c: Continuation) -> Option<Continuation> {
        if session.is_torn_down() {
            return None;
        }
        if c.expected_phase() != self.phase {
            log::warn!("Ignoring {:?} during {:?}", c, self.phase);
            return None;
        }

        let parts = session.parts;
        let pacing = self.timing.pacing;
        match c {
            Continuation::HorizontalStopped => {
                self.horizontal_locked = true;
                self.vertical_locked = false;
                self.enter(ArmPhase::Idle);
                None
            }
            Continuation::VerticalStopped => {
                self.vertical_locked = true;
                let footprint = Footprint::at_claw(session);
                targeting::find_closest_toy(session, &footprint);
                session.set_claw_visual(ClawVisual::Open);
                self.enter(ArmPhase::Grabbing);
                self.delay(session, self.timing.open_delay_ms, Continuation::BeginExtend);
                None
            }
            Continuation::BeginExtend => motion::move_attr(
                session,
                parts.arm,
                Attribute::H,
                Some(ARM_MAX_H),
                pacing,
                Some(Continuation::Extended),
            ),
            Continuation::Extended => {
                self.delay(session, self.timing.grab_delay_ms, Continuation::Grab);
                None
            }
            Continuation::Grab => {
                self.grab(session);
                self.enter(ArmPhase::VerticalAscend);
                motion::resume(
                    session,
                    parts.arm,
                    Attribute::H,
                    None,
                    pacing,
                    Some(Continuation::Retracted),
                )
            }
            Continuation::Retracted => {
                self.enter(ArmPhase::HorizontalReturn);
                motion::resume(
                    session,
                    parts.rail,
                    Attribute::X,
                    None,
                    pacing,
                    Some(Continuation::RailReturned),
                )
            }
            Continuation::RailReturned => {
                self.enter(ArmPhase::VerticalRetract);
                motion::resume(
                    session,
                    parts.joint,
                    Attribute::Y,
                    None,
                    pacing,
                    Some(Continuation::JointReturned),
                )
            }
            Continuation::JointReturned => {
                session.set_claw_visual(ClawVisual::Open);
                self.enter(ArmPhase::Dropping);
                self.delay(session, self.timing.drop_delay_ms, Continuation::Drop);
                None
            }
            Continuation::Drop => {
                self.drop_toy(session);
                self.horizontal_locked = false;
                self.vertical_locked = true;
                self.enter(ArmPhase::Idle);
                None
            }
        }
    }

    /// Close the claw: hang the targeted toy from the arm, or miss
    fn grab(&mut self, session: &mut GameSession) {
        let held = session
            .targeted
            .and_then(|i| session.toy(i))
            .map(|t| (t.spawn_index, t.object, t.claw_anchor));

        let Some((spawn_index, object, anchor)) = held else {
            session.set_claw_visual(ClawVisual::Missed);
            log::info!("Grab missed");
            return;
        };

        let parts = session.parts;
        for driver in [parts.rail, parts.joint, parts.arm] {
            session.attach(driver, object);
        }
        let toy = session.object(object);
        let center = toy.pos + toy.size * 0.5;
        let angle = targeting::hang_angle(center, anchor.unwrap_or(center));
        session.update(object, |o| o.set_angle(angle));
        session.set_toy_visual(spawn_index, ToyVisual::Grabbed);
        session.set_claw_visual(ClawVisual::Grabbed);
        log::info!("Grabbed toy {} (swing {:.1}°)", spawn_index, angle);
    }

    /// Release over the chute and close out the turn.
    /// The turn budget is decremented once, never below zero.
    fn drop_toy(&mut self, session: &mut GameSession) {
        let parts = session.parts;
        for driver in [parts.rail, parts.joint, parts.arm] {
            session.detach(driver);
        }

        if let Some(spawn_index) = session.targeted.take() {
            if let Some(object) = session.toy(spawn_index).map(|t| t.object) {
                session.update(object, |o| {
                    let moved = o.pos != DROP_POINT;
                    o.pos = DROP_POINT;
                    let turned = o.set_angle(0.0);
                    let centered = o.set_origin(Origin::Center);
                    moved || turned || centered
                });
                session.set_toy_visual(spawn_index, ToyVisual::Selected);
            }
            if let Some(toy) = session.toy_mut(spawn_index) {
                toy.claw_anchor = None;
            }
        }

        // One decrement per completed cycle, never below zero
        if session.remaining_turns > 0 {
            session.remaining_turns -= 1;
        }
        session.set_claw_visual(ClawVisual::Resting);
        session.emit(GameEvent::TurnComplete);
        log::info!("Turn complete, {} left", session.remaining_turns);
    }
}
