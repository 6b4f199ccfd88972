//! Positioned objects: the animatable rectangles of the machine
//!
//! Every machine part and every toy is a `PositionedObject`. Setters report
//! whether the rendered placement changed so the owner can re-apply it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::timers::TimerId;
use crate::normalize_angle;

/// Index of an object in the session's object arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub usize);

/// The single attribute a motion drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attribute {
    X,
    Y,
    /// Height; on the arm this is the extension length
    H,
}

impl Attribute {
    /// Attribute of a passenger that mirrors a driver's motion on `self`.
    /// A longer arm lowers whatever hangs from it.
    pub fn propagated(self) -> Attribute {
        match self {
            Attribute::X => Attribute::X,
            Attribute::Y | Attribute::H => Attribute::Y,
        }
    }
}

/// Point rotation is anchored on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum Origin {
    #[default]
    Center,
    TopLeft,
    /// Offset from the object's top-left corner
    Point(Vec2),
}

impl Origin {
    /// Offset from the top-left corner for an object of `size`
    pub fn resolve(&self, size: Vec2) -> Vec2 {
        match self {
            Origin::Center => size * 0.5,
            Origin::TopLeft => Vec2::ZERO,
            Origin::Point(p) => *p,
        }
    }
}

/// Rest pose: the implicit return target of every motion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Pose {
    pub fn get(&self, attr: Attribute) -> f32 {
        match attr {
            Attribute::X => self.pos.x,
            Attribute::Y => self.pos.y,
            Attribute::H => self.size.y,
        }
    }
}

/// Everything a render surface needs to place an object
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub pos: Vec2,
    pub size: Vec2,
    pub z: i32,
    /// Degrees, (-180, 180]
    pub angle: f32,
    /// Resolved transform origin, relative to top-left
    pub origin: Vec2,
}

/// A mutable rectangle with a rest pose
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionedObject {
    pub pos: Vec2,
    pub size: Vec2,
    pub z: i32,
    angle: f32,
    pub origin: Origin,
    pub rest: Pose,
    /// Present iff a motion is in flight
    #[serde(skip)]
    pub active_timer: Option<TimerId>,
}

impl PositionedObject {
    pub fn new(pos: Vec2, size: Vec2, z: i32) -> Self {
        Self {
            pos,
            size,
            z,
            angle: 0.0,
            origin: Origin::default(),
            rest: Pose { pos, size },
            active_timer: None,
        }
    }

    pub fn get(&self, attr: Attribute) -> f32 {
        match attr {
            Attribute::X => self.pos.x,
            Attribute::Y => self.pos.y,
            Attribute::H => self.size.y,
        }
    }

    /// Set one attribute; true if the value changed
    pub fn set(&mut self, attr: Attribute, value: f32) -> bool {
        let slot = match attr {
            Attribute::X => &mut self.pos.x,
            Attribute::Y => &mut self.pos.y,
            Attribute::H => &mut self.size.y,
        };
        let changed = *slot != value;
        *slot = value;
        changed
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Store a rotation, normalized to (-180, 180]
    pub fn set_angle(&mut self, degrees: f32) -> bool {
        let angle = normalize_angle(degrees);
        let changed = self.angle != angle;
        self.angle = angle;
        changed
    }

    pub fn set_origin(&mut self, origin: Origin) -> bool {
        let changed = self.origin != origin;
        self.origin = origin;
        changed
    }

    pub fn is_moving(&self) -> bool {
        self.active_timer.is_some()
    }

    pub fn placement(&self) -> Placement {
        Placement {
            pos: self.pos,
            size: self.size,
            z: self.z,
            angle: self.angle,
            origin: self.origin.resolve(self.size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_reports_change() {
        let mut obj = PositionedObject::new(Vec2::new(10.0, 20.0), Vec2::new(30.0, 40.0), 1);
        assert!(!obj.set(Attribute::X, 10.0));
        assert!(obj.set(Attribute::X, 15.0));
        assert!(obj.set(Attribute::H, 50.0));
        assert_eq!(obj.size.y, 50.0);
        // Rest pose is a snapshot of construction time
        assert_eq!(obj.rest.get(Attribute::X), 10.0);
        assert_eq!(obj.rest.get(Attribute::H), 40.0);
    }

    #[test]
    fn test_angle_is_normalized_on_store() {
        let mut obj = PositionedObject::new(Vec2::ZERO, Vec2::ONE, 0);
        obj.set_angle(270.0);
        assert_eq!(obj.angle(), -90.0);
        assert!(!obj.set_angle(-90.0 + 360.0));
    }

    #[test]
    fn test_placement_resolves_origin() {
        let mut obj = PositionedObject::new(Vec2::ZERO, Vec2::new(40.0, 20.0), 0);
        assert_eq!(obj.placement().origin, Vec2::new(20.0, 10.0));
        obj.set_origin(Origin::Point(Vec2::new(5.0, 6.0)));
        assert_eq!(obj.placement().origin, Vec2::new(5.0, 6.0));
        obj.set_origin(Origin::TopLeft);
        assert_eq!(obj.placement().origin, Vec2::ZERO);
    }

    #[test]
    fn test_height_propagates_as_vertical_offset() {
        assert_eq!(Attribute::H.propagated(), Attribute::Y);
        assert_eq!(Attribute::X.propagated(), Attribute::X);
        assert_eq!(Attribute::Y.propagated(), Attribute::Y);
    }
}
