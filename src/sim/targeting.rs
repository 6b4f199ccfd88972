//! Claw targeting
//!
//! Finds the toy under the claw tip at the end of the descent, anchors its
//! rotation on the claw, and computes how it swings once lifted.

use glam::Vec2;

use super::object::Origin;
use super::state::GameSession;
use super::toys::ToyVisual;
use crate::consts::CLAW_SIZE;
use crate::normalize_angle;

/// Claw rectangle used for overlap tests
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint {
    /// Claw tip; the point tested against toys
    pub pos: Vec2,
    pub size: Vec2,
}

impl Footprint {
    /// Footprint at the current joint position
    pub fn at_claw(session: &GameSession) -> Self {
        Self {
            pos: session.claw_anchor(),
            size: CLAW_SIZE,
        }
    }
}

/// True iff `point` lies strictly inside the rectangle on both axes.
/// Touching an edge is not an overlap.
#[inline]
pub fn overlaps(point: Vec2, pos: Vec2, size: Vec2) -> bool {
    point.x > pos.x && point.x < pos.x + size.x && point.y > pos.y && point.y < pos.y + size.y
}

/// Rotation (degrees, (-180, 180]) that swings a toy so its center hangs
/// straight below the point it was grabbed at.
pub fn hang_angle(center: Vec2, anchor: Vec2) -> f32 {
    let d = center - anchor;
    if d.length_squared() < f32::EPSILON {
        return 0.0;
    }
    normalize_angle(90.0 - d.y.atan2(d.x).to_degrees())
}

/// Target the overlapping toy with the highest spawn index.
///
/// On a hit the toy's transform origin moves to the claw tip, the tip is
/// remembered as its claw anchor, and the session's target is set. On a miss
/// nothing changes.
pub fn find_closest_toy(session: &mut GameSession, claw: &Footprint) -> Option<usize> {
    let hit = session
        .toys
        .iter()
        .filter(|t| t.visual == ToyVisual::Normal)
        .filter(|t| {
            let obj = session.object(t.object);
            overlaps(claw.pos, obj.pos, obj.size)
        })
        .max_by_key(|t| t.spawn_index)
        .map(|t| (t.spawn_index, t.object));

    let Some((spawn_index, object)) = hit else {
        log::debug!("Claw at {:?} missed", claw.pos);
        return None;
    };

    let offset = claw.pos - session.object(object).pos;
    session.update(object, |o| o.set_origin(Origin::Point(offset)));
    if let Some(toy) = session.toy_mut(spawn_index) {
        toy.claw_anchor = Some(claw.pos);
    }
    session.targeted = Some(spawn_index);
    log::debug!("Claw at {:?} targeted toy {}", claw.pos, spawn_index);
    Some(spawn_index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::catalog::tests::catalog;
    use crate::sim::object::{Attribute, PositionedObject};
    use crate::sim::toys::Toy;
    use proptest::prelude::*;

    fn place_toy(session: &mut GameSession, spawn_index: usize, pos: Vec2, size: Vec2) {
        let object = session.add_object(PositionedObject::new(pos, size, spawn_index as i32));
        session.toys.push(Toy {
            object,
            toy_id: format!("toy{}", spawn_index),
            spawn_index,
            claw_anchor: None,
            visual: ToyVisual::Normal,
        });
    }

    fn claw(x: f32, y: f32) -> Footprint {
        Footprint {
            pos: Vec2::new(x, y),
            size: CLAW_SIZE,
        }
    }

    #[test]
    fn test_edges_do_not_overlap() {
        let pos = Vec2::new(10.0, 10.0);
        let size = Vec2::new(20.0, 20.0);
        assert!(overlaps(Vec2::new(15.0, 15.0), pos, size));
        assert!(!overlaps(Vec2::new(10.0, 15.0), pos, size));
        assert!(!overlaps(Vec2::new(30.0, 15.0), pos, size));
        assert!(!overlaps(Vec2::new(15.0, 10.0), pos, size));
        assert!(!overlaps(Vec2::new(15.0, 30.0), pos, size));
    }

    #[test]
    fn test_later_spawn_wins() {
        let mut session = GameSession::new(Catalog::default(), 1, 0);
        place_toy(&mut session, 7, Vec2::new(100.0, 100.0), Vec2::new(60.0, 40.0));
        place_toy(&mut session, 3, Vec2::new(110.0, 105.0), Vec2::new(60.0, 40.0));

        let hit = find_closest_toy(&mut session, &claw(130.0, 120.0));
        assert_eq!(hit, Some(7));
        assert_eq!(session.targeted, Some(7));

        let toy = session.toy(7).expect("toy 7");
        assert_eq!(toy.claw_anchor, Some(Vec2::new(130.0, 120.0)));
        assert_eq!(
            session.object(toy.object).placement().origin,
            Vec2::new(30.0, 20.0)
        );
    }

    #[test]
    fn test_miss_leaves_target_unset() {
        let mut session = GameSession::new(Catalog::default(), 1, 0);
        place_toy(&mut session, 2, Vec2::new(100.0, 100.0), Vec2::new(60.0, 40.0));
        assert_eq!(find_closest_toy(&mut session, &claw(10.0, 10.0)), None);
        assert_eq!(session.targeted, None);
    }

    #[test]
    fn test_only_resting_toys_are_targets() {
        let mut session = GameSession::new(Catalog::default(), 1, 0);
        place_toy(&mut session, 1, Vec2::new(100.0, 100.0), Vec2::new(60.0, 40.0));
        place_toy(&mut session, 9, Vec2::new(100.0, 100.0), Vec2::new(60.0, 40.0));
        session.set_toy_visual(9, ToyVisual::Selected);
        assert_eq!(find_closest_toy(&mut session, &claw(120.0, 120.0)), Some(1));
    }

    #[test]
    fn test_footprint_tracks_joint() {
        let mut session = GameSession::new(catalog(&["bear"]), 1, 0);
        let rail = session.parts.rail;
        let joint = session.parts.joint;
        session.update(rail, |o| o.set(Attribute::X, 100.0));
        session.update(joint, |o| o.set(Attribute::Y, 60.0));
        let footprint = Footprint::at_claw(&session);
        assert_eq!(footprint.pos, session.world_pos(joint) + crate::consts::CLAW_OFFSET);
        assert_eq!(footprint.size, CLAW_SIZE);
    }

    #[test]
    fn test_hang_angle_sign() {
        let anchor = Vec2::ZERO;
        assert!(hang_angle(Vec2::new(0.0, 10.0), anchor).abs() < 1e-4);
        assert!((hang_angle(Vec2::new(10.0, 0.0), anchor) - 90.0).abs() < 1e-4);
        assert!((hang_angle(Vec2::new(-10.0, 0.0), anchor) + 90.0).abs() < 1e-4);
        assert!((hang_angle(Vec2::new(0.0, -10.0), anchor).abs() - 180.0).abs() < 1e-3);
        // Up and to the left folds to a negative angle
        assert!(hang_angle(Vec2::new(-10.0, -1.0), anchor) < -90.0);
        assert_eq!(hang_angle(anchor, anchor), 0.0);
    }

    proptest! {
        #[test]
        fn overlap_is_strict(
            tx in -500i32..500, ty in -500i32..500,
            w in 1i32..200, h in 1i32..200,
            px in -800i32..800, py in -800i32..800,
        ) {
            let pos = Vec2::new(tx as f32, ty as f32);
            let size = Vec2::new(w as f32, h as f32);
            let inside = px > tx && px < tx + w && py > ty && py < ty + h;
            prop_assert_eq!(overlaps(Vec2::new(px as f32, py as f32), pos, size), inside);
            // Corners and edges never count
            prop_assert!(!overlaps(pos, pos, size));
            prop_assert!(!overlaps(pos + size, pos, size));
            prop_assert!(!overlaps(Vec2::new(pos.x, py as f32), pos, size));
            prop_assert!(!overlaps(Vec2::new(px as f32, pos.y + size.y), pos, size));
        }
    }
}
