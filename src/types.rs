use glam::{EulerRot, Quat, Vec2, Vec3};

/// Which physical side a hand device sits on.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handedness {
    Left = 0,
    Right = 1,
}

impl Handedness {
    /// Both hands in the fixed per-tick processing order.
    pub const ALL: [Handedness; 2] = [Handedness::Left, Handedness::Right];

    pub fn index(self) -> usize {
        self as usize
    }

    /// The target flag that manipulates this hand.
    pub fn target(self) -> DeviceTargets {
        match self {
            Handedness::Left => DeviceTargets::LEFT_DEVICE,
            Handedness::Right => DeviceTargets::RIGHT_DEVICE,
        }
    }
}

bitflags::bitflags! {
    /// Which pose components a device currently reports as valid.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[repr(C)]
    pub struct TrackingState: u32 {
        const POSITION = 1 << 0;
        const ROTATION = 1 << 1;
    }
}

/// Convert an Euler accumulator in degrees `(pitch, yaw, roll)` to a rotation.
///
/// Yaw is applied first, then pitch, then roll (intrinsic YXZ).
pub fn euler_to_quat(euler_deg: Vec3) -> Quat {
    Quat::from_euler(
        EulerRot::YXZ,
        euler_deg.y.to_radians(),
        euler_deg.x.to_radians(),
        euler_deg.z.to_radians(),
    )
}

/// Inverse of [`euler_to_quat`].
pub fn quat_to_euler(rotation: Quat) -> Vec3 {
    let (yaw, pitch, roll) = rotation.to_euler(EulerRot::YXZ);
    Vec3::new(pitch.to_degrees(), yaw.to_degrees(), roll.to_degrees())
}

/// 6DOF pose of one simulated device.
///
/// Rotation edits go through `euler_deg`; `rotation` is always derived from it
/// with [`DevicePose::refresh_rotation`] so that repeated small increments do
/// not accumulate quaternion drift or unintended roll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DevicePose {
    pub position: Vec3,
    pub rotation: Quat,
    /// Euler accumulator in degrees `(pitch, yaw, roll)`.
    pub euler_deg: Vec3,
    pub is_tracked: bool,
    pub tracking_state: TrackingState,
}

impl Default for DevicePose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            euler_deg: Vec3::ZERO,
            is_tracked: true,
            tracking_state: TrackingState::all(),
        }
    }
}

impl DevicePose {
    pub fn new(position: Vec3, euler_deg: Vec3) -> Self {
        Self {
            position,
            rotation: euler_to_quat(euler_deg),
            euler_deg,
            ..Self::default()
        }
    }

    pub fn refresh_rotation(&mut self) {
        self.rotation = euler_to_quat(self.euler_deg);
    }

    /// Overwrite the rotation and resynchronise the Euler accumulator from it.
    pub fn set_rotation(&mut self, rotation: Quat) {
        self.euler_deg = quat_to_euler(rotation);
        self.rotation = rotation.normalize();
    }

    pub fn set_tracked(&mut self, tracked: bool) {
        self.is_tracked = tracked;
        self.tracking_state = if tracked {
            TrackingState::all()
        } else {
            TrackingState::empty()
        };
    }
}

bitflags::bitflags! {
    /// Devices currently receiving manipulation input. Empty means none.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[repr(C)]
    pub struct DeviceTargets: u32 {
        const FPS          = 1 << 0;
        const LEFT_DEVICE  = 1 << 1;
        const RIGHT_DEVICE = 1 << 2;
        const HMD          = 1 << 3;
    }
}

impl DeviceTargets {
    pub fn with_device(self, device: DeviceTargets) -> Self {
        self | device
    }

    pub fn without_device(self, device: DeviceTargets) -> Self {
        self & !device
    }

    pub fn has_device(self, device: DeviceTargets) -> bool {
        self.contains(device)
    }

    /// Hands whose control surfaces receive button input under this set.
    ///
    /// FPS drives both hands, an exclusive HMD target drives neither.
    pub fn control_hands(self) -> impl Iterator<Item = Handedness> {
        Handedness::ALL.into_iter().filter(move |hand| {
            self.has_device(hand.target()) || self.has_device(DeviceTargets::FPS)
        })
    }
}

bitflags::bitflags! {
    /// Control-surface fields the directional axis input is routed to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[repr(C)]
    pub struct Axis2DTargets: u32 {
        const POSITION          = 1 << 0;
        const PRIMARY_2D_AXIS   = 1 << 1;
        const SECONDARY_2D_AXIS = 1 << 2;
    }
}

/// Representation a simulated hand is currently exposed as.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceMode {
    Controller = 0,
    Hand = 1,
    None = 2,
}

impl DeviceMode {
    /// The opposite representation. Only defined for `Controller` and `Hand`.
    pub fn negate(self) -> DeviceMode {
        match self {
            DeviceMode::Controller => DeviceMode::Hand,
            DeviceMode::Hand => DeviceMode::Controller,
            DeviceMode::None => unreachable!("DeviceMode::None has no negation"),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeviceMode::Controller => "controller",
            DeviceMode::Hand => "hand",
            DeviceMode::None => "none",
        }
    }
}

bitflags::bitflags! {
    /// Discrete control surfaces of a simulated motion controller.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[repr(C)]
    pub struct ControllerButtons: u32 {
        const TRIGGER               = 1 << 0;
        const GRIP                  = 1 << 1;
        const PRIMARY_BUTTON        = 1 << 2;
        const SECONDARY_BUTTON      = 1 << 3;
        const MENU                  = 1 << 4;
        const PRIMARY_2D_AXIS_CLICK = 1 << 5;
        const SECONDARY_2D_AXIS_CLICK = 1 << 6;
        const PRIMARY_2D_AXIS_TOUCH = 1 << 7;
        const SECONDARY_2D_AXIS_TOUCH = 1 << 8;
        const PRIMARY_TOUCH         = 1 << 9;
        const SECONDARY_TOUCH       = 1 << 10;
    }
}

impl Default for ControllerButtons {
    fn default() -> Self {
        Self::empty()
    }
}

/// The single control surface the quick action currently toggles.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerInputMode {
    None = 0,
    Trigger,
    Grip,
    PrimaryButton,
    SecondaryButton,
    Menu,
    Primary2DAxisClick,
    Secondary2DAxisClick,
    Primary2DAxisTouch,
    Secondary2DAxisTouch,
    PrimaryTouch,
    SecondaryTouch,
}

impl ControllerInputMode {
    /// Next mode in the quick-action cycle. `None` is never cycled to.
    pub fn next(self) -> ControllerInputMode {
        match self {
            Self::None => Self::Trigger,
            Self::Trigger => Self::Grip,
            Self::Grip => Self::PrimaryButton,
            Self::PrimaryButton => Self::SecondaryButton,
            Self::SecondaryButton => Self::Menu,
            Self::Menu => Self::Primary2DAxisClick,
            Self::Primary2DAxisClick => Self::Secondary2DAxisClick,
            Self::Secondary2DAxisClick => Self::Primary2DAxisTouch,
            Self::Primary2DAxisTouch => Self::Secondary2DAxisTouch,
            Self::Secondary2DAxisTouch => Self::PrimaryTouch,
            Self::PrimaryTouch => Self::SecondaryTouch,
            Self::SecondaryTouch => Self::Trigger,
        }
    }

    pub fn button(self) -> ControllerButtons {
        match self {
            Self::None => ControllerButtons::empty(),
            Self::Trigger => ControllerButtons::TRIGGER,
            Self::Grip => ControllerButtons::GRIP,
            Self::PrimaryButton => ControllerButtons::PRIMARY_BUTTON,
            Self::SecondaryButton => ControllerButtons::SECONDARY_BUTTON,
            Self::Menu => ControllerButtons::MENU,
            Self::Primary2DAxisClick => ControllerButtons::PRIMARY_2D_AXIS_CLICK,
            Self::Secondary2DAxisClick => ControllerButtons::SECONDARY_2D_AXIS_CLICK,
            Self::Primary2DAxisTouch => ControllerButtons::PRIMARY_2D_AXIS_TOUCH,
            Self::Secondary2DAxisTouch => ControllerButtons::SECONDARY_2D_AXIS_TOUCH,
            Self::PrimaryTouch => ControllerButtons::PRIMARY_TOUCH,
            Self::SecondaryTouch => ControllerButtons::SECONDARY_TOUCH,
        }
    }
}

/// Full state of one simulated motion controller.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControllerState {
    pub pose: DevicePose,
    /// Continuous trigger pull [0..1].
    pub trigger: f32,
    /// Continuous grip pull [0..1].
    pub grip: f32,
    pub buttons: ControllerButtons,
    pub primary_2d_axis: Vec2,
    pub secondary_2d_axis: Vec2,
}

/// Symbolic identifier of a hand expression, resolved by the hand subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExpressionId(pub String);

impl ExpressionId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ExpressionId {
    fn default() -> Self {
        Self::new(crate::hands::DEFAULT_EXPRESSION)
    }
}

/// Expression currently applied to a hand.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HandExpressionState {
    pub id: ExpressionId,
    pub is_quick_action: bool,
}

/// Full state of one simulated tracked hand.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HandState {
    /// Root (wrist) pose of the hand.
    pub pose: DevicePose,
    pub expression: HandExpressionState,
}

/// Selector for the frame operator intents are expressed in.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateFrame {
    /// Relative to the manipulated device itself.
    Local = 0,
    /// Relative to the rig origin (the reference's parent).
    Parent = 1,
    /// Relative to the reference (camera) orientation.
    Screen = 2,
}

impl CoordinateFrame {
    /// Decode a raw frame selector.
    ///
    /// # Panics
    /// Any value other than 0, 1 or 2 is a caller defect.
    pub fn from_index(value: u32) -> CoordinateFrame {
        match value {
            0 => CoordinateFrame::Local,
            1 => CoordinateFrame::Parent,
            2 => CoordinateFrame::Screen,
            other => unreachable!("invalid coordinate frame selector {}", other),
        }
    }
}

/// Whether pointer input moves or turns the targeted devices.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformationMode {
    Translate = 0,
    Rotate = 1,
}

impl TransformationMode {
    pub fn negate(self) -> TransformationMode {
        match self {
            TransformationMode::Translate => TransformationMode::Rotate,
            TransformationMode::Rotate => TransformationMode::Translate,
        }
    }
}

/// Per-axis locks. A set flag restricts motion to that axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AxisConstraints {
    pub x: bool,
    pub y: bool,
    pub z: bool,
}

impl AxisConstraints {
    pub const NONE: AxisConstraints = AxisConstraints {
        x: false,
        y: false,
        z: false,
    };

    pub fn any(self) -> bool {
        self.x || self.y || self.z
    }
}

/// Every device state the engine owns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimulatedRig {
    pub head: DevicePose,
    pub controllers: [ControllerState; 2],
    pub hands: [HandState; 2],
}

impl SimulatedRig {
    pub fn controller(&self, hand: Handedness) -> &ControllerState {
        &self.controllers[hand.index()]
    }

    pub fn controller_mut(&mut self, hand: Handedness) -> &mut ControllerState {
        &mut self.controllers[hand.index()]
    }

    pub fn hand(&self, hand: Handedness) -> &HandState {
        &self.hands[hand.index()]
    }

    pub fn hand_mut(&mut self, hand: Handedness) -> &mut HandState {
        &mut self.hands[hand.index()]
    }

    /// Pose of whichever representation is visible for `hand` in `mode`.
    pub fn hand_device_mut(&mut self, hand: Handedness, mode: DeviceMode) -> Option<&mut DevicePose> {
        match mode {
            DeviceMode::Controller => Some(&mut self.controllers[hand.index()].pose),
            DeviceMode::Hand => Some(&mut self.hands[hand.index()].pose),
            DeviceMode::None => None,
        }
    }

    /// Mutable access to all five device poses, head first.
    pub fn all_poses_mut(&mut self) -> [&mut DevicePose; 5] {
        let [left_controller, right_controller] = &mut self.controllers;
        let [left_hand, right_hand] = &mut self.hands;
        [
            &mut self.head,
            &mut left_controller.pose,
            &mut right_controller.pose,
            &mut left_hand.pose,
            &mut right_hand.pose,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_set_edits() {
        let targets = DeviceTargets::FPS;
        let targets = targets.with_device(DeviceTargets::LEFT_DEVICE);
        assert!(targets.has_device(DeviceTargets::FPS));
        assert!(targets.has_device(DeviceTargets::LEFT_DEVICE));
        let targets = targets.without_device(DeviceTargets::FPS);
        assert_eq!(targets, DeviceTargets::LEFT_DEVICE);
        // idempotent
        assert_eq!(targets.without_device(DeviceTargets::FPS), targets);
    }

    #[test]
    fn test_control_hands() {
        let fps: Vec<_> = DeviceTargets::FPS.control_hands().collect();
        assert_eq!(fps, vec![Handedness::Left, Handedness::Right]);
        let right: Vec<_> = DeviceTargets::RIGHT_DEVICE.control_hands().collect();
        assert_eq!(right, vec![Handedness::Right]);
        assert_eq!(DeviceTargets::HMD.control_hands().count(), 0);
    }

    #[test]
    fn test_negate_mode() {
        assert_eq!(DeviceMode::Controller.negate(), DeviceMode::Hand);
        assert_eq!(DeviceMode::Hand.negate(), DeviceMode::Controller);
    }

    #[test]
    #[should_panic]
    fn test_negate_none_panics() {
        let _ = DeviceMode::None.negate();
    }

    #[test]
    fn test_quick_action_cycle_skips_none() {
        let mut mode = ControllerInputMode::Trigger;
        for _ in 0..11 {
            mode = mode.next();
            assert_ne!(mode, ControllerInputMode::None);
        }
        assert_eq!(mode, ControllerInputMode::Trigger);
    }

    #[test]
    fn test_euler_round_trip() {
        let euler = Vec3::new(30.0, -45.0, 10.0);
        let back = quat_to_euler(euler_to_quat(euler));
        assert!((back - euler).length() < 1e-3);
    }

    #[test]
    fn test_yaw_turns_forward() {
        // +90 yaw about +Y turns -Z forward toward -X
        let q = euler_to_quat(Vec3::new(0.0, 90.0, 0.0));
        let forward = q * Vec3::NEG_Z;
        assert!((forward - Vec3::NEG_X).length() < 1e-5);
    }

    #[test]
    #[should_panic]
    fn test_invalid_frame_index_panics() {
        let _ = CoordinateFrame::from_index(7);
    }
}
