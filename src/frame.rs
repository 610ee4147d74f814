//! Coordinate frame resolution.
//!
//! Operator intents are expressed relative to a [`CoordinateFrame`]. Device
//! poses live in the space of the reference's parent (the rig origin).

use crate::types::CoordinateFrame;
use glam::{Quat, Vec3};

/// World orientation of the reference transform (camera equivalent) and of
/// its parent, if it has one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceFrame {
    pub camera_rotation: Quat,
    pub parent_rotation: Option<Quat>,
}

impl Default for ReferenceFrame {
    fn default() -> Self {
        Self {
            camera_rotation: Quat::IDENTITY,
            parent_rotation: None,
        }
    }
}

impl ReferenceFrame {
    pub fn new(camera_rotation: Quat, parent_rotation: Option<Quat>) -> Self {
        Self {
            camera_rotation,
            parent_rotation,
        }
    }

    /// Inverse of the parent orientation; identity without a parent.
    pub fn inverse_parent_rotation(&self) -> Quat {
        self.parent_rotation
            .map(|rotation| rotation.inverse())
            .unwrap_or(Quat::IDENTITY)
    }
}

/// Looks up the current reference frame. `None` means no reference is
/// available this tick.
pub trait ReferenceProvider {
    fn reference_frame(&self) -> Option<ReferenceFrame>;
}

impl ReferenceProvider for ReferenceFrame {
    fn reference_frame(&self) -> Option<ReferenceFrame> {
        Some(*self)
    }
}

impl<F> ReferenceProvider for F
where
    F: Fn() -> Option<ReferenceFrame>,
{
    fn reference_frame(&self) -> Option<ReferenceFrame> {
        self()
    }
}

/// Right/up/forward basis vectors of a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Axes {
    pub right: Vec3,
    pub up: Vec3,
    pub forward: Vec3,
}

impl Axes {
    pub const WORLD: Axes = Axes {
        right: Vec3::X,
        up: Vec3::Y,
        forward: Vec3::NEG_Z,
    };

    fn rotated(rotation: Quat) -> Axes {
        Axes {
            right: rotation * Vec3::X,
            up: rotation * Vec3::Y,
            forward: rotation * Vec3::NEG_Z,
        }
    }

    /// Combine per-axis amounts into one vector in this basis.
    pub fn combine(&self, amounts: Vec3) -> Vec3 {
        self.right * amounts.x + self.up * amounts.y + self.forward * amounts.z
    }
}

/// Basis vectors of `frame` given the reference transform.
///
/// `Local` assumes the reference and the devices are siblings and uses the
/// shared parent's orientation.
pub fn axes(frame: CoordinateFrame, reference: &ReferenceFrame) -> Axes {
    match frame {
        CoordinateFrame::Local => reference
            .parent_rotation
            .map(Axes::rotated)
            .unwrap_or(Axes::WORLD),
        CoordinateFrame::Parent => Axes::WORLD,
        CoordinateFrame::Screen => Axes::rotated(reference.camera_rotation),
    }
}

/// Rotation converting a translation expressed in `frame` into the space the
/// device pose lives in.
pub fn delta_rotation(
    frame: CoordinateFrame,
    device_rotation: Quat,
    inverse_parent_rotation: Quat,
) -> Quat {
    match frame {
        CoordinateFrame::Local => device_rotation * inverse_parent_rotation,
        CoordinateFrame::Parent => Quat::IDENTITY,
        CoordinateFrame::Screen => inverse_parent_rotation,
    }
}

/// Translate `amounts` (right, up, forward) in `frame` into a position delta
/// for a device with `device_rotation`.
pub fn resolve_translation(
    frame: CoordinateFrame,
    reference: &ReferenceFrame,
    device_rotation: Quat,
    amounts: Vec3,
) -> Vec3 {
    let delta = axes(frame, reference).combine(amounts);
    delta_rotation(frame, device_rotation, reference.inverse_parent_rotation()) * delta
}
