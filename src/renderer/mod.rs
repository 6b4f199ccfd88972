//! Render surface abstraction
//!
//! The engine never touches the page directly. It flushes changed placements
//! and visual states to a `Surface`; the browser build uses the DOM surface,
//! tests and the native demo use the recording surface.

#[cfg(target_arch = "wasm32")]
pub mod dom;

#[cfg(target_arch = "wasm32")]
pub use dom::DomSurface;

use std::collections::BTreeMap;

use crate::catalog::ToyMeta;
use crate::sim::{ClawVisual, ObjectId, Placement, Toy, ToyVisual};

/// Where the engine's output lands
pub trait Surface {
    /// Place an object. Applying the same placement twice is a no-op.
    fn apply_placement(&mut self, object: ObjectId, placement: &Placement);

    fn set_claw_visual(&mut self, visual: ClawVisual);

    /// Show a toy in its current visual state. `meta` is absent when the
    /// toy type has no catalog entry.
    fn set_toy_visual(&mut self, toy: &Toy, meta: Option<&ToyMeta>);
}

/// CSS class for a claw state
pub fn claw_class(visual: ClawVisual) -> &'static str {
    match visual {
        ClawVisual::Resting => "claw-resting",
        ClawVisual::Open => "claw-open",
        ClawVisual::Grabbed => "claw-grabbed",
        ClawVisual::Missed => "claw-missed",
    }
}

/// CSS class for a toy state
pub fn toy_class(visual: ToyVisual) -> &'static str {
    match visual {
        ToyVisual::Normal => "toy-normal",
        ToyVisual::Grabbed => "toy-grabbed",
        ToyVisual::Selected => "toy-selected",
        ToyVisual::Collected => "toy-collected",
    }
}

/// Keeps the latest state of every object and counts how often the engine
/// wrote to it
#[derive(Debug, Default, Clone)]
pub struct RecordingSurface {
    pub placements: BTreeMap<ObjectId, Placement>,
    pub toy_visuals: BTreeMap<usize, ToyVisual>,
    /// Sprite URL last shown per toy
    pub toy_sprites: BTreeMap<usize, String>,
    pub claw_visual: ClawVisual,
    /// Total `apply_placement` calls
    pub placement_writes: usize,
    pub claw_writes: usize,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn placement(&self, object: ObjectId) -> Option<&Placement> {
        self.placements.get(&object)
    }
}

impl Surface for RecordingSurface {
    fn apply_placement(&mut self, object: ObjectId, placement: &Placement) {
        self.placement_writes += 1;
        self.placements.insert(object, *placement);
    }

    fn set_claw_visual(&mut self, visual: ClawVisual) {
        self.claw_writes += 1;
        self.claw_visual = visual;
    }

    fn set_toy_visual(&mut self, toy: &Toy, meta: Option<&ToyMeta>) {
        self.toy_visuals.insert(toy.spawn_index, toy.visual);
        if let Some(meta) = meta {
            self.toy_sprites
                .insert(toy.spawn_index, meta.data_url(toy.visual));
        }
    }
}
