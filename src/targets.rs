//! Selection of the devices receiving manipulation input.

use crate::input::{Action, InputFrame};
use crate::types::{Axis2DTargets, DeviceTargets};

/// Side effects of a target update the engine has to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TargetUpdate {
    /// Both toggles were pressed together while both hands were already
    /// targeted.
    pub mode_switch_requested: bool,
}

/// Maintains the [`DeviceTargets`] and [`Axis2DTargets`] sets.
///
/// Two layers feed the effective target set: a toggle layer edited by the
/// toggle, cycle and head inputs, and a hold layer that overrides it while any
/// "manipulate" input is held. Releasing every hold falls back to the toggle
/// layer, which starts as `FPS`.
#[derive(Debug, Clone)]
pub struct TargetSelector {
    toggled: DeviceTargets,
    held: DeviceTargets,
    before_head: DeviceTargets,
    dual_latched: bool,
    axis_2d: Axis2DTargets,
}

impl Default for TargetSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl TargetSelector {
    pub fn new() -> Self {
        Self {
            toggled: DeviceTargets::FPS,
            held: DeviceTargets::empty(),
            before_head: DeviceTargets::FPS,
            dual_latched: false,
            axis_2d: Axis2DTargets::POSITION,
        }
    }

    /// Devices receiving manipulation input this tick.
    pub fn targets(&self) -> DeviceTargets {
        if self.held.is_empty() {
            self.toggled
        } else {
            self.held
        }
    }

    pub fn axis_2d_targets(&self) -> Axis2DTargets {
        self.axis_2d
    }

    /// Whether the dual toggle gesture is latched awaiting release.
    pub fn is_dual_latched(&self) -> bool {
        self.dual_latched
    }

    /// Apply one tick of input.
    pub fn update(&mut self, frame: &InputFrame) -> TargetUpdate {
        let mut update = TargetUpdate::default();

        self.hold(DeviceTargets::LEFT_DEVICE, frame.held(Action::ManipulateLeft));
        self.hold(DeviceTargets::RIGHT_DEVICE, frame.held(Action::ManipulateRight));

        let left = frame.button(Action::ToggleManipulateLeft);
        let right = frame.button(Action::ToggleManipulateRight);
        if self.dual_latched {
            if !left.performed && !right.performed {
                self.dual_latched = false;
            }
        } else if left.performed && right.performed && (left.pressed || right.pressed) {
            self.dual_latched = true;
            update.mode_switch_requested = self.toggle_both();
        } else {
            if left.pressed {
                self.toggle_device(DeviceTargets::LEFT_DEVICE);
            }
            if right.pressed {
                self.toggle_device(DeviceTargets::RIGHT_DEVICE);
            }
        }

        if frame.pressed(Action::CycleDevices) {
            self.cycle();
        }
        if frame.pressed(Action::ToggleManipulateHead) {
            self.toggle_head();
        }
        if frame.pressed(Action::StopManipulation) {
            self.stop_manipulation();
        }
        if frame.pressed(Action::TogglePrimary2DAxisTarget) {
            self.toggle_axis_2d(Axis2DTargets::PRIMARY_2D_AXIS);
        }
        if frame.pressed(Action::ToggleSecondary2DAxisTarget) {
            self.toggle_axis_2d(Axis2DTargets::SECONDARY_2D_AXIS);
        }

        update
    }

    /// Set or clear a hold-layer flag.
    pub fn hold(&mut self, device: DeviceTargets, held: bool) {
        self.held = if held {
            self.held.with_device(device)
        } else {
            self.held.without_device(device)
        };
    }

    /// Exclusively target `device`, or return to `FPS` if it already is.
    pub fn toggle_device(&mut self, device: DeviceTargets) {
        self.toggled = if self.toggled == device {
            DeviceTargets::FPS
        } else {
            device
        };
    }

    /// Target both hands. Returns true, leaving the set untouched, when both
    /// hands were already targeted, through either layer: the gesture then
    /// asks for a mode switch.
    pub fn toggle_both(&mut self) -> bool {
        let both = DeviceTargets::LEFT_DEVICE | DeviceTargets::RIGHT_DEVICE;
        if self.targets() == both {
            true
        } else {
            self.toggled = both;
            false
        }
    }

    /// Advance `FPS -> LeftDevice -> RightDevice -> FPS`.
    pub fn cycle(&mut self) {
        self.toggled = if self.toggled == DeviceTargets::FPS {
            DeviceTargets::LEFT_DEVICE
        } else if self.toggled == DeviceTargets::LEFT_DEVICE {
            DeviceTargets::RIGHT_DEVICE
        } else {
            DeviceTargets::FPS
        };
    }

    /// Exclusively target the head, or restore the set active before.
    pub fn toggle_head(&mut self) {
        if self.toggled == DeviceTargets::HMD {
            self.toggled = self.before_head;
        } else {
            self.before_head = self.toggled;
            self.toggled = DeviceTargets::HMD;
        }
    }

    pub fn stop_manipulation(&mut self) {
        self.toggled = DeviceTargets::FPS;
    }

    /// Flip a 2D-axis routing flag. `POSITION` stays set exactly while no
    /// axis flag is.
    pub fn toggle_axis_2d(&mut self, axis: Axis2DTargets) {
        self.axis_2d.toggle(axis);
        let routed = self
            .axis_2d
            .intersects(Axis2DTargets::PRIMARY_2D_AXIS | Axis2DTargets::SECONDARY_2D_AXIS);
        self.axis_2d.set(Axis2DTargets::POSITION, !routed);
    }
}
