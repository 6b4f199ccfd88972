//! Movement scheduler
//!
//! Drives one attribute of one object toward a target in fixed-size steps on
//! a periodic timer. Each step is mirrored onto the object's passenger, if it
//! has one. Completion hands back a `Continuation` for the caller to run;
//! nothing here calls back into the arm sequencer directly.

use serde::{Deserialize, Serialize};

use super::object::{Attribute, ObjectId};
use super::sequencer::Continuation;
use super::state::GameSession;
use super::timers::{TimerId, TimerTask};
use crate::consts::{STEP_INTERVAL_MS, STEP_SIZE};

/// Step size and tick period of a motion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pacing {
    pub step: f32,
    pub interval_ms: u64,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            step: STEP_SIZE,
            interval_ms: STEP_INTERVAL_MS,
        }
    }
}

/// A motion in flight, carried by its periodic timer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionTask {
    pub object: ObjectId,
    pub attr: Attribute,
    pub target: f32,
    pub step: f32,
    pub on_complete: Option<Continuation>,
}

/// Next value one step from `current` toward `target`. Never overshoots.
#[inline]
pub fn next_value(current: f32, target: f32, step: f32) -> f32 {
    let remaining = target - current;
    if remaining.abs() <= step {
        target
    } else {
        current + step.copysign(remaining)
    }
}

/// Start moving `object.attr` toward `target` (default: its rest value).
///
/// If the object is already moving this is a cancel-and-jump request: the
/// in-flight motion stops where it is and a continuation is handed back
/// immediately, the new one if given, otherwise the in-flight one.
///
/// A zero-distance move starts no timer and hands back `on_complete` at once.
/// The caller runs whatever continuation is returned, exactly once.
#[must_use]
pub fn move_attr(
    session: &mut GameSession,
    object: ObjectId,
    attr: Attribute,
    target: Option<f32>,
    pacing: Pacing,
    on_complete: Option<Continuation>,
) -> Option<Continuation> {
    if session.object(object).is_moving() {
        let in_flight = cancel(session, object);
        log::debug!("Motion on {:?} cut short", object);
        return on_complete.or(in_flight);
    }

    let target = target.unwrap_or_else(|| session.object(object).rest.get(attr));
    if session.object(object).get(attr) == target {
        return on_complete;
    }

    let task = MotionTask {
        object,
        attr,
        target,
        step: pacing.step,
        on_complete,
    };
    let id = session
        .timers
        .schedule_repeating(pacing.interval_ms, TimerTask::Motion(task));
    session.object_mut_untracked(object).active_timer = Some(id);
    None
}

/// Like `move_attr`, but first drops any handle left over from a previous
/// phase on the same object without running its continuation.
#[must_use]
pub fn resume(
    session: &mut GameSession,
    object: ObjectId,
    attr: Attribute,
    target: Option<f32>,
    pacing: Pacing,
    on_complete: Option<Continuation>,
) -> Option<Continuation> {
    let _ = cancel(session, object);
    move_attr(session, object, attr, target, pacing, on_complete)
}

/// Stop an in-flight motion and hand back its continuation without running
/// it. Equivalent to `move_attr` with no new continuation.
#[must_use]
pub fn halt(session: &mut GameSession, object: ObjectId) -> Option<Continuation> {
    let in_flight = cancel(session, object);
    if in_flight.is_some() {
        log::debug!("Motion on {:?} halted", object);
    }
    in_flight
}

/// Silently cancel any motion on `object`, returning the dropped continuation
pub fn cancel(session: &mut GameSession, object: ObjectId) -> Option<Continuation> {
    let id = session.object_mut_untracked(object).active_timer.take()?;
    match session.timers.cancel(id) {
        Some(TimerTask::Motion(task)) => task.on_complete,
        _ => None,
    }
}

/// Advance one motion by a single step.
///
/// Returns `Some(continuation)` when the target was reached and a
/// continuation was attached.
#[must_use]
pub fn step(session: &mut GameSession, id: TimerId, task: &MotionTask) -> Option<Continuation> {
    let current = session.object(task.object).get(task.attr);
    let next = next_value(current, task.target, task.step);
    let delta = next - current;

    session.update(task.object, |o| o.set(task.attr, next));
    if let Some(passenger) = session.passenger(task.object) {
        let attr = task.attr.propagated();
        session.update(passenger, |o| {
            let value = o.get(attr) + delta;
            o.set(attr, value)
        });
    }

    if next != task.target {
        return None;
    }

    session.timers.cancel(id);
    let object = session.object_mut_untracked(task.object);
    if object.active_timer == Some(id) {
        object.active_timer = None;
    }
    task.on_complete
}
