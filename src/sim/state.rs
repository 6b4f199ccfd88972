//! Game session state
//!
//! The session exclusively owns every positioned object, the toy catalog and
//! the live timers. Other components borrow it for the length of one step.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::object::{ObjectId, PositionedObject};
use super::timers::TimerQueue;
use super::toys::Toy;
use crate::catalog::Catalog;
use crate::consts::*;

/// Claw appearance, independent of where the arm is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClawVisual {
    #[default]
    Resting,
    /// Jaws open, descending or releasing
    Open,
    /// Closed around a toy
    Grabbed,
    /// Closed on nothing
    Missed,
}

/// Outbound notifications for the hosting page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum GameEvent {
    /// A selected toy was clicked and moved to the shelf
    ToyCollected { toy_id: String },
    /// One grab cycle finished (hit or miss)
    TurnComplete,
}

/// The fixed machine parts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parts {
    /// Vertical rail, travels horizontally
    pub rail: ObjectId,
    /// Arm joint, mounted on the rail, travels vertically
    pub joint: ObjectId,
    /// Arm extension, mounted on the joint, grows downward
    pub arm: ObjectId,
}

/// Process-wide mutable game state
#[derive(Debug)]
pub struct GameSession {
    pub catalog: Catalog,
    /// Toy type per grid slot, one slot left empty
    pub spawn_order: Vec<Option<String>>,
    /// Authoritative turn budget, overwritten by the host at any time
    pub remaining_turns: i32,
    /// Spawn index of the toy under the claw, if any
    pub targeted: Option<usize>,
    pub collected_count: u32,
    pub timers: TimerQueue,
    pub toys: Vec<Toy>,
    pub parts: Parts,
    pub claw_visual: ClawVisual,
    pub(crate) rng: Pcg32,
    objects: Vec<PositionedObject>,
    /// Structural mounting: child -> parent. Child positions are parent-relative.
    mounts: BTreeMap<ObjectId, ObjectId>,
    /// Driver -> the one passenger that mirrors its motion
    attachments: BTreeMap<ObjectId, ObjectId>,
    dirty_objects: BTreeSet<ObjectId>,
    dirty_toys: BTreeSet<usize>,
    claw_dirty: bool,
    events: Vec<GameEvent>,
    torn_down: bool,
}

impl GameSession {
    /// Build the machine and lay out toys from `catalog`
    pub fn new(catalog: Catalog, turns: i32, seed: u64) -> Self {
        let mut objects = Vec::with_capacity(3 + SPAWN_SLOTS);
        objects.push(PositionedObject::new(RAIL_REST, RAIL_SIZE, RAIL_Z));
        objects.push(PositionedObject::new(JOINT_REST, JOINT_SIZE, JOINT_Z));
        objects.push(PositionedObject::new(ARM_REST, ARM_SIZE, ARM_Z));
        let parts = Parts {
            rail: ObjectId(0),
            joint: ObjectId(1),
            arm: ObjectId(2),
        };

        let mut mounts = BTreeMap::new();
        mounts.insert(parts.joint, parts.rail);
        mounts.insert(parts.arm, parts.joint);

        let mut session = Self {
            catalog,
            spawn_order: Vec::new(),
            remaining_turns: turns,
            targeted: None,
            collected_count: 0,
            timers: TimerQueue::new(),
            toys: Vec::new(),
            parts,
            claw_visual: ClawVisual::Resting,
            rng: Pcg32::seed_from_u64(seed),
            objects,
            mounts,
            attachments: BTreeMap::new(),
            dirty_objects: BTreeSet::new(),
            dirty_toys: BTreeSet::new(),
            claw_dirty: true,
            events: Vec::new(),
            torn_down: false,
        };
        session.dirty_objects.extend([parts.rail, parts.joint, parts.arm]);
        session.spawn_toys();

        log::info!(
            "Session started: {} catalog entries, {} toys, {} turns",
            session.catalog.len(),
            session.toys.len(),
            turns
        );
        session
    }

    pub fn object(&self, id: ObjectId) -> &PositionedObject {
        &self.objects[id.0]
    }

    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &PositionedObject)> {
        self.objects.iter().enumerate().map(|(i, o)| (ObjectId(i), o))
    }

    pub(crate) fn add_object(&mut self, object: PositionedObject) -> ObjectId {
        let id = ObjectId(self.objects.len());
        self.objects.push(object);
        self.dirty_objects.insert(id);
        id
    }

    /// Mutate an object; `f` returns whether a rendered attribute changed
    pub fn update<F>(&mut self, id: ObjectId, f: F) -> bool
    where
        F: FnOnce(&mut PositionedObject) -> bool,
    {
        let changed = f(&mut self.objects[id.0]);
        if changed {
            self.mark_dirty(id);
        }
        changed
    }

    /// Timer handle bookkeeping does not affect rendering
    pub(crate) fn object_mut_untracked(&mut self, id: ObjectId) -> &mut PositionedObject {
        &mut self.objects[id.0]
    }

    fn mark_dirty(&mut self, id: ObjectId) {
        if !self.dirty_objects.insert(id) {
            return;
        }
        let children: Vec<ObjectId> = self
            .mounts
            .iter()
            .filter(|(_, parent)| **parent == id)
            .map(|(child, _)| *child)
            .collect();
        for child in children {
            self.mark_dirty(child);
        }
    }

    /// Position in machine coordinates, composing mounts
    pub fn world_pos(&self, id: ObjectId) -> Vec2 {
        let own = self.objects[id.0].pos;
        match self.mounts.get(&id) {
            Some(parent) => own + self.world_pos(*parent),
            None => own,
        }
    }

    /// Claw tip: joint world position plus the claw offset
    pub fn claw_anchor(&self) -> Vec2 {
        self.world_pos(self.parts.joint) + CLAW_OFFSET
    }

    pub fn attach(&mut self, driver: ObjectId, passenger: ObjectId) {
        self.attachments.insert(driver, passenger);
    }

    pub fn detach(&mut self, driver: ObjectId) -> Option<ObjectId> {
        self.attachments.remove(&driver)
    }

    pub fn passenger(&self, driver: ObjectId) -> Option<ObjectId> {
        self.attachments.get(&driver).copied()
    }

    pub fn set_claw_visual(&mut self, visual: ClawVisual) {
        if self.claw_visual != visual {
            self.claw_visual = visual;
            self.claw_dirty = true;
        }
    }

    /// Queue every object, toy and the claw for the next flush
    pub fn mark_all_dirty(&mut self) {
        self.dirty_objects.extend((0..self.objects.len()).map(ObjectId));
        self.dirty_toys.extend(self.toys.iter().map(|t| t.spawn_index));
        self.claw_dirty = true;
    }

    pub(crate) fn mark_toy_dirty(&mut self, spawn_index: usize) {
        self.dirty_toys.insert(spawn_index);
    }

    /// Objects whose placement changed since the last call
    pub fn take_dirty_objects(&mut self) -> Vec<ObjectId> {
        std::mem::take(&mut self.dirty_objects).into_iter().collect()
    }

    pub fn take_dirty_toys(&mut self) -> Vec<usize> {
        std::mem::take(&mut self.dirty_toys).into_iter().collect()
    }

    pub fn take_claw_dirty(&mut self) -> bool {
        std::mem::take(&mut self.claw_dirty)
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Overwrite the turn budget (inbound host event)
    pub fn set_turns(&mut self, turns: i32) {
        log::debug!("Turns updated: {} -> {}", self.remaining_turns, turns);
        self.remaining_turns = turns;
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Cancel every live timer in one pass
    pub fn teardown(&mut self) {
        let cancelled = self.timers.clear();
        for object in &mut self.objects {
            object.active_timer = None;
        }
        self.torn_down = true;
        log::info!("Session torn down ({} timers cancelled)", cancelled);
    }
}
