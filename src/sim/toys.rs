//! Toy registry and spawner
//!
//! Toys are laid out once per session in a 4-column grid across the lower
//! cavity, with small random jitter so rows never line up perfectly. One of
//! the twelve slots is always left empty.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::object::{ObjectId, Origin, PositionedObject};
use super::state::{GameEvent, GameSession};
use crate::catalog::Catalog;
use crate::consts::*;

/// Where a toy is in its life
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ToyVisual {
    /// Resting in the cavity, can be grabbed
    #[default]
    Normal,
    /// Hanging from the claw
    Grabbed,
    /// Dropped in the chute, waiting for a click
    Selected,
    /// On the display shelf
    Collected,
}

/// A spawned toy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Toy {
    pub object: ObjectId,
    pub toy_id: String,
    /// Placement order, 0..12; later toys win targeting ties
    pub spawn_index: usize,
    /// Claw position at the moment this toy was targeted
    pub claw_anchor: Option<Vec2>,
    pub visual: ToyVisual,
}

/// Pick a toy type for every slot but one, uniformly from the catalog
pub fn choose_spawn_order(catalog: &Catalog, rng: &mut Pcg32) -> Vec<Option<String>> {
    let ids: Vec<&str> = catalog.ids().collect();
    if ids.is_empty() {
        return vec![None; SPAWN_SLOTS];
    }
    let empty_slot = rng.random_range(0..SPAWN_SLOTS);
    (0..SPAWN_SLOTS)
        .map(|slot| {
            (slot != empty_slot).then(|| ids[rng.random_range(0..ids.len())].to_string())
        })
        .collect()
}

/// Top-left of a grid cell
pub fn slot_origin(spawn_index: usize) -> Vec2 {
    let col = (spawn_index % GRID_COLUMNS) as f32;
    let row = (spawn_index / GRID_COLUMNS) as f32;
    CAVITY_ORIGIN + Vec2::new(col * CELL_SIZE.x, row * CELL_SIZE.y)
}

/// Toy position: centered in its cell, then jittered
pub fn slot_position(spawn_index: usize, size: Vec2, rng: &mut Pcg32) -> Vec2 {
    let jitter = Vec2::new(
        rng.random_range(-JITTER.x..=JITTER.x),
        rng.random_range(-JITTER.y..=JITTER.y),
    );
    slot_origin(spawn_index) + (CELL_SIZE - size) * 0.5 + jitter
}

/// Shelf position for the n-th collected toy
pub fn shelf_position(n: u32) -> Vec2 {
    SHELF_ORIGIN + Vec2::new(n as f32 * SHELF_SPACING, 0.0)
}

impl GameSession {
    /// Lay out toys from the catalog. Called once, at session start.
    pub(crate) fn spawn_toys(&mut self) {
        self.spawn_order = choose_spawn_order(&self.catalog, &mut self.rng);

        for (spawn_index, slot) in self.spawn_order.clone().into_iter().enumerate() {
            let Some(toy_id) = slot else { continue };
            let Some(size) = self.catalog.get(&toy_id).map(|m| m.size()) else {
                log::warn!("Toy `{}` missing from catalog, slot {} left empty", toy_id, spawn_index);
                continue;
            };
            let pos = slot_position(spawn_index, size, &mut self.rng);
            let object = self.add_object(PositionedObject::new(
                pos,
                size,
                TOY_Z_BASE + spawn_index as i32,
            ));
            self.toys.push(Toy {
                object,
                toy_id,
                spawn_index,
                claw_anchor: None,
                visual: ToyVisual::Normal,
            });
            self.mark_toy_dirty(spawn_index);
        }
        log::debug!("Spawned {} toys", self.toys.len());
    }

    pub fn toy(&self, spawn_index: usize) -> Option<&Toy> {
        self.toys.iter().find(|t| t.spawn_index == spawn_index)
    }

    pub(crate) fn toy_mut(&mut self, spawn_index: usize) -> Option<&mut Toy> {
        self.toys.iter_mut().find(|t| t.spawn_index == spawn_index)
    }

    pub fn set_toy_visual(&mut self, spawn_index: usize, visual: ToyVisual) {
        let Some(toy) = self.toy_mut(spawn_index) else {
            return;
        };
        if toy.visual != visual {
            toy.visual = visual;
            self.mark_toy_dirty(spawn_index);
        }
    }

    /// Finalize a selected toy: shelve it, count it and report it.
    ///
    /// Only toys waiting in the chute respond; any other click is ignored.
    pub fn collect_toy(&mut self, spawn_index: usize) -> bool {
        let Some(toy) = self.toy(spawn_index) else {
            return false;
        };
        if toy.visual != ToyVisual::Selected {
            return false;
        }
        let object = toy.object;
        let toy_id = toy.toy_id.clone();

        let shelf = shelf_position(self.collected_count);
        self.update(object, |o| {
            let moved = o.pos != shelf;
            o.pos = shelf;
            let turned = o.set_angle(0.0);
            let centered = o.set_origin(Origin::Center);
            moved || turned || centered
        });
        self.set_toy_visual(spawn_index, ToyVisual::Collected);
        self.collected_count += 1;

        log::info!("Collected `{}` ({} total)", toy_id, self.collected_count);
        self.emit(GameEvent::ToyCollected { toy_id });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::catalog;
    use rand::SeedableRng;

    #[test]
    fn test_spawn_order_leaves_one_slot_empty() {
        let mut rng = Pcg32::seed_from_u64(42);
        let order = choose_spawn_order(&catalog(&["bear", "cat", "owl"]), &mut rng);
        assert_eq!(order.len(), SPAWN_SLOTS);
        assert_eq!(order.iter().filter(|s| s.is_none()).count(), 1);
        assert!(order.iter().flatten().all(|id| ["bear", "cat", "owl"].contains(&id.as_str())));
    }

    #[test]
    fn test_empty_catalog_spawns_nothing() {
        let session = GameSession::new(Catalog::default(), 1, 42);
        assert!(session.toys.is_empty());
        assert!(session.spawn_order.iter().all(Option::is_none));
    }

    #[test]
    fn test_toys_stay_near_their_cell() {
        let session = GameSession::new(catalog(&["bear", "cat"]), 1, 9);
        assert_eq!(session.toys.len(), SPAWN_SLOTS - 1);
        for toy in &session.toys {
            let obj = session.object(toy.object);
            let centered = slot_origin(toy.spawn_index) + (CELL_SIZE - obj.size) * 0.5;
            let offset = obj.pos - centered;
            assert!(offset.x.abs() <= JITTER.x + 1e-3 && offset.y.abs() <= JITTER.y + 1e-3);
            assert_eq!(obj.z, TOY_Z_BASE + toy.spawn_index as i32);
        }
        // Spawn indices are unique
        let mut indices: Vec<_> = session.toys.iter().map(|t| t.spawn_index).collect();
        indices.dedup();
        assert_eq!(indices.len(), SPAWN_SLOTS - 1);
    }

    #[test]
    fn test_same_seed_same_layout() {
        let a = GameSession::new(catalog(&["bear", "cat", "owl"]), 1, 1234);
        let b = GameSession::new(catalog(&["bear", "cat", "owl"]), 1, 1234);
        assert_eq!(a.spawn_order, b.spawn_order);
        for (ta, tb) in a.toys.iter().zip(&b.toys) {
            assert_eq!(a.object(ta.object).pos, b.object(tb.object).pos);
        }
    }

    #[test]
    fn test_collect_only_selected_and_only_once() {
        let mut session = GameSession::new(catalog(&["bear"]), 1, 5);
        let index = session.toys[0].spawn_index;

        assert!(!session.collect_toy(index));
        session.set_toy_visual(index, ToyVisual::Selected);
        assert!(session.collect_toy(index));
        assert!(!session.collect_toy(index));

        assert_eq!(session.collected_count, 1);
        let toy = session.toy(index).expect("toy");
        assert_eq!(toy.visual, ToyVisual::Collected);
        assert_eq!(session.object(toy.object).pos, shelf_position(0));
        assert_eq!(
            session.drain_events(),
            vec![GameEvent::ToyCollected { toy_id: "bear".into() }]
        );
    }

    #[test]
    fn test_collect_unknown_index() {
        let mut session = GameSession::new(Catalog::default(), 1, 5);
        assert!(!session.collect_toy(3));
        assert_eq!(session.collected_count, 0);
    }
}
