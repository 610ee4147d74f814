//! Pose delta accumulation.
//!
//! Converts one tick of resolved operator intent into translation and rotation
//! deltas on the targeted devices of a [`SimulatedRig`].

use crate::config::SimulatorConfig;
use crate::frame::{resolve_translation, ReferenceFrame};
use crate::types::{
    euler_to_quat, AxisConstraints, CoordinateFrame, DeviceMode, DevicePose, DeviceTargets,
    Handedness, SimulatedRig, TransformationMode,
};
use glam::{Quat, Vec2, Vec3};

/// Magnitude substituted on every axis when a reset lands exactly on zero.
pub const RESET_EPSILON: f32 = 1e-5;

/// Whether a downstream consumer would read `value` as actuated.
pub fn is_actuated(value: Vec3) -> bool {
    value.length_squared() > 0.0
}

/// Recombine three input channels onto the axes left free by `constraints`.
///
/// A single locked axis receives the sum of the first two channels; two
/// locked axes receive them as a plane; no lock (or all three) passes the
/// channels through. The third channel survives only without a restriction.
pub fn constrain(channels: Vec3, constraints: AxisConstraints) -> Vec3 {
    let (a, b, c) = (channels.x, channels.y, channels.z);
    match (constraints.x, constraints.y, constraints.z) {
        (false, false, false) | (true, true, true) => Vec3::new(a, b, c),
        (true, false, false) => Vec3::new(a + b, 0.0, 0.0),
        (false, true, false) => Vec3::new(0.0, a + b, 0.0),
        (false, false, true) => Vec3::new(0.0, 0.0, a + b),
        (true, true, false) => Vec3::new(a, b, 0.0),
        (true, false, true) => Vec3::new(a, 0.0, b),
        (false, true, true) => Vec3::new(0.0, b, a),
    }
}

/// Component-wise reset scale. Without any constraint everything resets;
/// otherwise only the constrained axes do.
pub fn reset_mask(constraints: AxisConstraints) -> Vec3 {
    if !constraints.any() {
        return Vec3::ZERO;
    }
    let keep = |locked: bool| if locked { 0.0 } else { 1.0 };
    Vec3::new(keep(constraints.x), keep(constraints.y), keep(constraints.z))
}

/// Scale `value` by `mask`, never returning the exact zero vector.
pub fn apply_reset(value: Vec3, mask: Vec3) -> Vec3 {
    let scaled = value * mask;
    if scaled == Vec3::ZERO {
        Vec3::splat(RESET_EPSILON)
    } else {
        scaled
    }
}

/// Manipulation intent for one tick, already read from input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseInput {
    /// Directional channels `(right, up, forward)`, each in [-1, 1].
    pub keyboard: Vec3,
    /// Pointer movement in pixels; +y is up.
    pub pointer: Vec2,
    pub scroll: f32,
    /// Effective pointer mode for this tick.
    pub mode: TransformationMode,
    pub constraints: AxisConstraints,
    pub reset: bool,
    pub dt: f32,
}

impl Default for PoseInput {
    fn default() -> Self {
        Self {
            keyboard: Vec3::ZERO,
            pointer: Vec2::ZERO,
            scroll: 0.0,
            mode: TransformationMode::Translate,
            constraints: AxisConstraints::NONE,
            reset: false,
            dt: 0.0,
        }
    }
}

/// Applies [`PoseInput`] to a rig.
#[derive(Debug, Clone)]
pub struct PoseAccumulator {
    keyboard_speed: Vec3,
    body_multiplier: f32,
    keyboard_frame: CoordinateFrame,
    pointer_translate: Vec3,
    pointer_frame: CoordinateFrame,
    pointer_rotate: Vec3,
    invert_y: bool,
    max_pitch_deg: f32,
}

impl PoseAccumulator {
    pub fn new(config: &SimulatorConfig) -> Self {
        Self {
            keyboard_speed: Vec3::new(
                config.keyboard_x_translate_speed,
                config.keyboard_y_translate_speed,
                config.keyboard_z_translate_speed,
            ),
            body_multiplier: config.body_translate_multiplier,
            keyboard_frame: config.keyboard_translate_frame,
            pointer_translate: Vec3::new(
                config.pointer_x_translate_sensitivity,
                config.pointer_y_translate_sensitivity,
                config.pointer_scroll_translate_sensitivity,
            ),
            pointer_frame: config.pointer_translate_frame,
            pointer_rotate: Vec3::new(
                config.pointer_x_rotate_sensitivity,
                config.pointer_y_rotate_sensitivity,
                config.pointer_scroll_rotate_sensitivity,
            ),
            invert_y: config.invert_pointer_y_rotation,
            max_pitch_deg: config.max_fps_pitch_deg,
        }
    }

    /// Keyboard translation amounts `(right, up, forward)` in meters.
    pub fn keyboard_amounts(&self, input: &PoseInput, body: bool) -> Vec3 {
        let multiplier = if body { self.body_multiplier } else { 1.0 };
        let scaled = input.keyboard * self.keyboard_speed * input.dt * multiplier;
        constrain(scaled, input.constraints)
    }

    /// Pointer translation amounts `(right, up, forward)` in meters. Zero
    /// unless the pointer is in translate mode.
    pub fn pointer_amounts(&self, input: &PoseInput) -> Vec3 {
        if input.mode != TransformationMode::Translate {
            return Vec3::ZERO;
        }
        let scaled = Vec3::new(input.pointer.x, input.pointer.y, input.scroll) * self.pointer_translate;
        constrain(scaled, input.constraints)
    }

    /// Euler delta `(pitch, yaw, roll)` in degrees. Zero unless the pointer
    /// is in rotate mode.
    pub fn rotation_angles(&self, input: &PoseInput) -> Vec3 {
        if input.mode != TransformationMode::Rotate {
            return Vec3::ZERO;
        }
        let invert = if self.invert_y { -1.0 } else { 1.0 };
        let scaled = Vec3::new(
            input.pointer.y * self.pointer_rotate.y * invert,
            -input.pointer.x * self.pointer_rotate.x,
            input.scroll * self.pointer_rotate.z,
        );
        constrain(scaled, input.constraints)
    }

    /// Apply one tick to every device in `targets`. Hand devices move in the
    /// representation given by `modes`.
    pub fn apply(
        &self,
        rig: &mut SimulatedRig,
        modes: [DeviceMode; 2],
        targets: DeviceTargets,
        reference: &ReferenceFrame,
        input: &PoseInput,
    ) {
        if targets.has_device(DeviceTargets::FPS) {
            self.apply_body(rig, reference, input);
            if input.reset {
                self.reset_body(rig, input);
            }
            return;
        }

        let keyboard = self.keyboard_amounts(input, false);
        let pointer = self.pointer_amounts(input);
        let angles = self.rotation_angles(input);

        if targets.has_device(DeviceTargets::HMD) {
            self.apply_device(&mut rig.head, reference, keyboard, pointer, angles);
            if input.reset {
                reset_device(&mut rig.head, input);
            }
        }
        for hand in Handedness::ALL {
            if !targets.has_device(hand.target()) {
                continue;
            }
            if let Some(pose) = rig.hand_device_mut(hand, modes[hand.index()]) {
                self.apply_device(pose, reference, keyboard, pointer, angles);
                if input.reset {
                    reset_device(pose, input);
                }
            }
        }
    }

    fn apply_device(
        &self,
        pose: &mut DevicePose,
        reference: &ReferenceFrame,
        keyboard: Vec3,
        pointer: Vec3,
        angles: Vec3,
    ) {
        pose.position += resolve_translation(self.keyboard_frame, reference, pose.rotation, keyboard);
        pose.position += resolve_translation(self.pointer_frame, reference, pose.rotation, pointer);
        if angles != Vec3::ZERO {
            pose.euler_deg += angles;
            pose.refresh_rotation();
        }
    }

    /// FPS mode: translate every device together, then turn the whole rig
    /// about the head.
    fn apply_body(&self, rig: &mut SimulatedRig, reference: &ReferenceFrame, input: &PoseInput) {
        // Body translation ignores head pitch and roll.
        let body = euler_to_quat(Vec3::new(0.0, rig.head.euler_deg.y, 0.0));
        let delta = resolve_translation(
            self.keyboard_frame,
            reference,
            body,
            self.keyboard_amounts(input, true),
        ) + resolve_translation(self.pointer_frame, reference, body, self.pointer_amounts(input));
        if delta != Vec3::ZERO {
            for pose in rig.all_poses_mut() {
                pose.position += delta;
            }
        }

        let mut angles = self.rotation_angles(input);
        angles.z = 0.0;
        if angles != Vec3::ZERO {
            let mut euler = rig.head.euler_deg + angles;
            euler.x = self.clamp_pitch(rig.head.euler_deg.x, angles.x);
            set_head_euler(rig, euler);
        }
    }

    /// Apply `delta` to `pitch` within the FPS pitch limit. A pitch already
    /// past the limit (from head-only rotation) is kept, and may only move
    /// back towards the range.
    fn clamp_pitch(&self, pitch: f32, delta: f32) -> f32 {
        let low = pitch.min(-self.max_pitch_deg);
        let high = pitch.max(self.max_pitch_deg);
        (pitch + delta).clamp(low, high)
    }

    fn reset_body(&self, rig: &mut SimulatedRig, input: &PoseInput) {
        let mask = reset_mask(input.constraints);
        match input.mode {
            TransformationMode::Translate => {
                let delta = apply_reset(rig.head.position, mask) - rig.head.position;
                for pose in rig.all_poses_mut() {
                    pose.position += delta;
                }
            }
            TransformationMode::Rotate => {
                let euler = apply_reset(rig.head.euler_deg, mask);
                set_head_euler(rig, euler);
            }
        }
    }
}

/// Set the head orientation and carry every hand device rigidly with it
/// around the head position.
fn set_head_euler(rig: &mut SimulatedRig, euler_deg: Vec3) {
    let previous = rig.head.rotation;
    rig.head.euler_deg = euler_deg;
    rig.head.refresh_rotation();
    let turn: Quat = rig.head.rotation * previous.inverse();
    let pivot = rig.head.position;
    for pose in rig.all_poses_mut().into_iter().skip(1) {
        pose.position = pivot + turn * (pose.position - pivot);
        pose.set_rotation(turn * pose.rotation);
    }
}

fn reset_device(pose: &mut DevicePose, input: &PoseInput) {
    let mask = reset_mask(input.constraints);
    match input.mode {
        TransformationMode::Translate => pose.position = apply_reset(pose.position, mask),
        TransformationMode::Rotate => {
            pose.euler_deg = apply_reset(pose.euler_deg, mask);
            pose.refresh_rotation();
        }
    }
}
