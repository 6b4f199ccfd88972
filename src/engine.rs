//! Engine: one game session bound to a render surface
//!
//! The host owns the clock and the event loop. It forwards input, advances
//! time and drains outbound events; the engine flushes every visible change
//! to its surface after each call.

use crate::catalog::Catalog;
use crate::platform::HostMessage;
use crate::renderer::Surface;
use crate::sim::{Button, GameEvent, GameSession, Sequencer, Timing};

pub struct Engine<S: Surface> {
    session: GameSession,
    sequencer: Sequencer,
    surface: S,
}

impl<S: Surface> Engine<S> {
    /// Start a session and draw the initial machine
    pub fn new(catalog: Catalog, turns: i32, seed: u64, timing: Timing, surface: S) -> Self {
        let mut engine = Self {
            session: GameSession::new(catalog, turns, seed),
            sequencer: Sequencer::new(timing),
            surface,
        };
        engine.flush();
        engine
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn press(&mut self, button: Button) {
        self.sequencer.press(&mut self.session, button);
        self.flush();
    }

    pub fn release(&mut self, button: Button) {
        self.sequencer.release(&mut self.session, button);
        self.flush();
    }

    /// Player clicked a toy; only a toy waiting in the chute is collected
    pub fn click_toy(&mut self, spawn_index: usize) -> bool {
        if self.session.is_torn_down() {
            return false;
        }
        let collected = self.session.collect_toy(spawn_index);
        self.flush();
        collected
    }

    pub fn set_turns(&mut self, turns: i32) {
        self.session.set_turns(turns);
    }

    pub fn handle_host_message(&mut self, message: &HostMessage) {
        match message {
            HostMessage::TurnsUpdated { turns } => self.set_turns(*turns),
            HostMessage::Unknown => {}
        }
    }

    /// Move the virtual clock forward, firing every timer that comes due
    pub fn advance(&mut self, elapsed_ms: u64) {
        if self.session.is_torn_down() {
            return;
        }
        let deadline = self.session.timers.now() + elapsed_ms;
        while let Some((id, task)) = self.session.timers.pop_due(deadline) {
            self.sequencer.on_timer(&mut self.session, id, task);
        }
        self.session.timers.settle(deadline);
        self.flush();
    }

    /// Push pending changes to the surface
    pub fn flush(&mut self) {
        // Toys first so their elements exist before they are placed
        for spawn_index in self.session.take_dirty_toys() {
            if let Some(toy) = self.session.toy(spawn_index) {
                let meta = self.session.catalog.get(&toy.toy_id);
                self.surface.set_toy_visual(toy, meta);
            }
        }

        for id in self.session.take_dirty_objects() {
            let mut placement = self.session.object(id).placement();
            placement.pos = self.session.world_pos(id);
            self.surface.apply_placement(id, &placement);
        }

        if self.session.take_claw_dirty() {
            self.surface.set_claw_visual(self.session.claw_visual);
        }
    }

    /// Re-send the whole scene, e.g. after the surface was rebound
    pub fn redraw(&mut self) {
        self.session.mark_all_dirty();
        self.flush();
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.session.drain_events()
    }

    /// Cancel every timer; later input and time are ignored
    pub fn teardown(&mut self) {
        self.session.teardown();
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::catalog::tests::catalog;
    use crate::consts::*;
    use crate::renderer::RecordingSurface;
    use crate::sim::toys::shelf_position;
    use crate::sim::{ArmPhase, ClawVisual, PositionedObject, Toy, ToyVisual};

    /// Engine with no spawned toys and a single "bear" placed by hand
    fn engine_with_toy(turns: i32, pos: Vec2) -> (Engine<RecordingSurface>, usize) {
        let mut engine = Engine::new(
            catalog(&["bear"]),
            turns,
            7,
            Timing::default(),
            RecordingSurface::new(),
        );
        engine.session.toys.clear();
        let object = engine
            .session
            .add_object(PositionedObject::new(pos, Vec2::new(60.0, 40.0), TOY_Z_BASE));
        engine.session.toys.push(Toy {
            object,
            toy_id: "bear".into(),
            spawn_index: 5,
            claw_anchor: None,
            visual: ToyVisual::Normal,
        });
        engine.session.mark_toy_dirty(5);
        engine.flush();
        (engine, 5)
    }

    /// H held 500 ms puts the rail at x 70; V held 400 ms puts the joint at
    /// y 140. Claw tip: (70 + 0 + 20, 40 + 140 + 200) = (90, 380).
    fn play_cycle(engine: &mut Engine<RecordingSurface>) {
        engine.press(Button::Horizontal);
        engine.advance(500);
        engine.release(Button::Horizontal);
        engine.press(Button::Vertical);
        engine.advance(400);
        engine.release(Button::Vertical);
    }

    #[test]
    fn test_full_cycle_selects_toy() {
        let (mut engine, index) = engine_with_toy(1, Vec2::new(60.0, 360.0));
        play_cycle(&mut engine);
        assert_eq!(engine.session().claw_anchor(), Vec2::new(90.0, 380.0));
        assert_eq!(engine.session().targeted, Some(index));

        engine.advance(60_000);
        let session = engine.session();
        assert_eq!(engine.sequencer().phase(), ArmPhase::Idle);
        assert_eq!(session.remaining_turns, 0);
        assert_eq!(session.targeted, None);
        assert_eq!(session.toy(index).map(|t| t.visual), Some(ToyVisual::Selected));
        let object = session.toy(index).map(|t| t.object).expect("toy");
        assert_eq!(session.object(object).pos, DROP_POINT);
        assert_eq!(session.object(object).angle(), 0.0);

        assert_eq!(engine.surface().toy_visuals.get(&index), Some(&ToyVisual::Selected));
        assert_eq!(
            engine.surface().placement(object).map(|p| p.pos),
            Some(DROP_POINT)
        );
        assert_eq!(engine.surface().claw_visual, ClawVisual::Resting);
        assert_eq!(engine.drain_events(), vec![GameEvent::TurnComplete]);
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn test_collect_after_cycle() {
        let (mut engine, index) = engine_with_toy(1, Vec2::new(60.0, 360.0));
        play_cycle(&mut engine);
        engine.advance(60_000);
        engine.drain_events();

        assert!(engine.click_toy(index));
        assert!(!engine.click_toy(index));
        let object = engine.session().toy(index).map(|t| t.object).expect("toy");
        assert_eq!(engine.session().collected_count, 1);
        assert_eq!(
            engine.surface().placement(object).map(|p| p.pos),
            Some(shelf_position(0))
        );
        assert_eq!(engine.surface().toy_visuals.get(&index), Some(&ToyVisual::Collected));
        assert_eq!(
            engine.surface().toy_sprites.get(&index).map(String::as_str),
            Some("data:image/png;base64,Q09MTA==")
        );
        assert_eq!(
            engine.drain_events(),
            vec![GameEvent::ToyCollected {
                toy_id: "bear".into()
            }]
        );
    }

    #[test]
    fn test_collect_during_next_cycle() {
        let (mut engine, index) = engine_with_toy(2, Vec2::new(60.0, 360.0));
        play_cycle(&mut engine);
        engine.advance(60_000);
        engine.drain_events();

        // Second cycle underway, rail still traveling
        engine.press(Button::Horizontal);
        engine.advance(200);
        let rail = engine.session().parts.rail;
        let rail_x = engine.session().object(rail).pos.x;
        let timers = engine.session().timers.len();
        assert_eq!(engine.sequencer().phase(), ArmPhase::HorizontalTravel);

        assert!(engine.click_toy(index));
        assert_eq!(engine.sequencer().phase(), ArmPhase::HorizontalTravel);
        assert_eq!(engine.session().timers.len(), timers);
        assert_eq!(engine.session().object(rail).pos.x, rail_x);
        assert!(engine.session().object(rail).is_moving());
        assert_eq!(
            engine.drain_events(),
            vec![GameEvent::ToyCollected {
                toy_id: "bear".into()
            }]
        );

        engine.advance(100);
        assert_eq!(engine.session().object(rail).pos.x, rail_x + STEP_SIZE);
        engine.release(Button::Horizontal);
        assert_eq!(engine.sequencer().phase(), ArmPhase::Idle);
        assert!(!engine.sequencer().is_locked(Button::Vertical));
    }

    #[test]
    fn test_missed_cycle_leaves_toy() {
        let (mut engine, index) = engine_with_toy(2, Vec2::new(200.0, 280.0));
        play_cycle(&mut engine);
        assert_eq!(engine.session().targeted, None);
        engine.advance(60_000);
        assert_eq!(engine.session().remaining_turns, 1);
        assert_eq!(engine.session().toy(index).map(|t| t.visual), Some(ToyVisual::Normal));
        assert!(!engine.click_toy(index));
    }

    #[test]
    fn test_held_toy_follows_the_rail_home() {
        let (mut engine, index) = engine_with_toy(1, Vec2::new(60.0, 360.0));
        play_cycle(&mut engine);
        let object = engine.session().toy(index).map(|t| t.object).expect("toy");

        // Open delay, 12 extension ticks, grab delay, 12 retraction ticks
        engine.advance(500 + 1_200 + 500 + 1_200);
        assert_eq!(engine.sequencer().phase(), ArmPhase::HorizontalReturn);
        let before = engine.session().object(object).pos;
        engine.advance(200);
        let after = engine.session().object(object).pos;
        assert_eq!(after.x, before.x - 20.0);
        assert_eq!(after.y, before.y);
        assert_eq!(engine.surface().placement(object).map(|p| p.pos), Some(after));
    }

    #[test]
    fn test_placements_use_machine_coordinates() {
        let mut engine = Engine::new(
            Catalog::default(),
            1,
            1,
            Timing::default(),
            RecordingSurface::new(),
        );
        engine.press(Button::Horizontal);
        engine.advance(300);
        let parts = engine.session().parts;
        let joint = engine.surface().placement(parts.joint).expect("joint placed");
        assert_eq!(joint.pos, RAIL_REST + Vec2::new(30.0, 0.0) + JOINT_REST);
        let arm = engine.surface().placement(parts.arm).expect("arm placed");
        assert_eq!(arm.pos, joint.pos + ARM_REST);
    }

    #[test]
    fn test_flush_only_writes_changes() {
        let mut engine = Engine::new(
            catalog(&["bear", "cat"]),
            1,
            3,
            Timing::default(),
            RecordingSurface::new(),
        );
        let writes = engine.surface().placement_writes;
        assert_eq!(writes, 3 + engine.session().toys.len());
        assert_eq!(engine.surface().claw_writes, 1);

        engine.flush();
        engine.advance(1_000);
        assert_eq!(engine.surface().placement_writes, writes);
        assert_eq!(engine.surface().claw_writes, 1);
    }

    #[test]
    fn test_redraw_resends_scene() {
        let mut engine = Engine::new(
            catalog(&["bear"]),
            1,
            3,
            Timing::default(),
            RecordingSurface::new(),
        );
        let writes = engine.surface().placement_writes;
        *engine.surface_mut() = RecordingSurface::new();
        engine.redraw();
        assert_eq!(engine.surface().placement_writes, writes);
        assert_eq!(engine.surface().toy_visuals.len(), engine.session().toys.len());
        assert_eq!(engine.surface().claw_writes, 1);
    }

    #[test]
    fn test_host_turns_gate_new_cycles() {
        let mut engine = Engine::new(
            Catalog::default(),
            0,
            1,
            Timing::default(),
            RecordingSurface::new(),
        );
        engine.press(Button::Horizontal);
        assert!(engine.session().timers.is_empty());

        engine.handle_host_message(&HostMessage::Unknown);
        engine.handle_host_message(&HostMessage::TurnsUpdated { turns: 2 });
        assert_eq!(engine.session().remaining_turns, 2);
        engine.press(Button::Horizontal);
        assert_eq!(engine.sequencer().phase(), ArmPhase::HorizontalTravel);
    }

    #[test]
    fn test_teardown_freezes_engine() {
        let (mut engine, index) = engine_with_toy(1, Vec2::new(60.0, 360.0));
        engine.press(Button::Horizontal);
        engine.advance(200);
        engine.teardown();
        assert!(engine.session().timers.is_empty());

        let writes = engine.surface().placement_writes;
        engine.advance(5_000);
        engine.release(Button::Horizontal);
        engine.press(Button::Vertical);
        assert!(!engine.click_toy(index));
        assert_eq!(engine.surface().placement_writes, writes);
        assert!(engine.drain_events().is_empty());
    }
}
