//! C FFI layer for xrsim.
//!
//! Provides an opaque handle-based API for C/C++ consumers. The host feeds
//! input through `xs_set_*`, advances with `xs_tick`, and reads device
//! states back. The generated C header is written to `include/xrsim.h` by
//! cbindgen.

use crate::config::SimulatorConfig;
use crate::engine::{Simulator, SimulatorContext};
use crate::error::LastError;
use crate::frame::ReferenceFrame;
use crate::hands::SimulatedHandSubsystem;
use crate::input::{Action, SnapshotInput};
use crate::mode::SwitchOutcome;
use crate::sink::NullSink;
use crate::types::{CoordinateFrame, DeviceMode, DevicePose, Handedness};
use crate::XrSimError;
use glam::{Quat, Vec2};
use std::ffi::{c_char, c_int};

/// Last error message for C consumers.
static LAST_ERROR: LastError = LastError::new();

/// Opaque simulator handle for C consumers.
pub struct XsSimulator {
    sim: Simulator<NullSink, SimulatedHandSubsystem>,
    input: SnapshotInput,
    context: SimulatorContext,
}

/// Device pose in C-compatible layout.
#[repr(C)]
pub struct XsPose {
    /// Position [x, y, z] in meters.
    pub position: [f32; 3],
    /// Quaternion [qx, qy, qz, qw].
    pub rotation: [f32; 4],
    /// Euler angles [pitch, yaw, roll] in degrees.
    pub euler_deg: [f32; 3],
    pub is_tracked: bool,
    /// `TrackingState` bits.
    pub tracking_state: u32,
}

/// Controller state in C-compatible layout.
#[repr(C)]
pub struct XsController {
    pub pose: XsPose,
    pub trigger: f32,
    pub grip: f32,
    /// `ControllerButtons` bits.
    pub buttons: u32,
    pub primary_2d_axis: [f32; 2],
    pub secondary_2d_axis: [f32; 2],
    /// False while the hand is represented as a tracked hand.
    pub connected: bool,
}

impl From<&DevicePose> for XsPose {
    fn from(pose: &DevicePose) -> Self {
        XsPose {
            position: pose.position.to_array(),
            rotation: pose.rotation.to_array(),
            euler_deg: pose.euler_deg.to_array(),
            is_tracked: pose.is_tracked,
            tracking_state: pose.tracking_state.bits(),
        }
    }
}

fn hand_from_index(hand: c_int) -> Option<Handedness> {
    match hand {
        0 => Some(Handedness::Left),
        1 => Some(Handedness::Right),
        _ => {
            LAST_ERROR.set(&XrSimError::InvalidHand(hand));
            None
        }
    }
}

fn action_from_code(code: u32) -> Option<Action> {
    let action = Action::from_code(code);
    if action.is_none() {
        LAST_ERROR.set(&XrSimError::UnknownAction(code));
    }
    action
}

fn create(initial_mode: c_int) -> crate::Result<XsSimulator> {
    let mut config = SimulatorConfig::default().with_env_overrides();
    match initial_mode {
        0 => config.initial_device_mode = DeviceMode::Controller,
        1 => config.initial_device_mode = DeviceMode::Hand,
        _ => {}
    }
    let mut sim = Simulator::new(config, NullSink, SimulatedHandSubsystem::new())?;
    let mut context = SimulatorContext::new();
    sim.initialize()?;
    sim.start(&mut context)?;
    Ok(XsSimulator {
        sim,
        input: SnapshotInput::new(),
        context,
    })
}

/// Create and start a simulator configured from `XRSIM_*` environment
/// variables.
/// `initial_mode`: 0 = controller, 1 = hand, anything else keeps the
/// configured mode.
/// Returns NULL on error (check xs_last_error()).
#[no_mangle]
pub extern "C" fn xs_create(initial_mode: c_int) -> *mut XsSimulator {
    match create(initial_mode) {
        Ok(sim) => {
            LAST_ERROR.clear();
            Box::into_raw(Box::new(sim))
        }
        Err(e) => {
            LAST_ERROR.set(&e);
            std::ptr::null_mut()
        }
    }
}

/// Stop a simulator and free its resources.
///
/// # Safety
/// `sim` must be a pointer returned by `xs_create`, or null.
#[no_mangle]
pub unsafe extern "C" fn xs_destroy(sim: *mut XsSimulator) {
    if sim.is_null() {
        return;
    }
    let mut handle = Box::from_raw(sim);
    let XsSimulator { sim, context, .. } = &mut *handle;
    if let Err(e) = sim.stop(context).and_then(|_| sim.dispose()) {
        log::debug!("simulator teardown: {}", e);
    }
}

/// Set whether a button action is held.
/// Returns 0 on success, -1 on error.
///
/// # Safety
/// `sim` must be a valid simulator pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn xs_set_button(sim: *mut XsSimulator, action: u32, held: bool) -> c_int {
    if sim.is_null() {
        return -1;
    }
    let sim = &mut *sim;
    match action_from_code(action) {
        Some(action) => {
            sim.input.set_button(action, held);
            0
        }
        None => -1,
    }
}

/// Set a scalar value action.
/// Returns 0 on success, -1 on error.
///
/// # Safety
/// `sim` must be a valid simulator pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn xs_set_value(sim: *mut XsSimulator, action: u32, value: f32) -> c_int {
    if sim.is_null() {
        return -1;
    }
    let sim = &mut *sim;
    match action_from_code(action) {
        Some(action) => {
            sim.input.set_value(action, value);
            0
        }
        None => -1,
    }
}

/// Set a 2D value action. Pointer and scroll deltas last one tick.
/// Returns 0 on success, -1 on error.
///
/// # Safety
/// `sim` must be a valid simulator pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn xs_set_vector2(
    sim: *mut XsSimulator,
    action: u32,
    x: f32,
    y: f32,
) -> c_int {
    if sim.is_null() {
        return -1;
    }
    let sim = &mut *sim;
    match action_from_code(action) {
        Some(action) => {
            sim.input.set_vector2(action, Vec2::new(x, y));
            0
        }
        None => -1,
    }
}

/// Set the reference (camera) orientation.
/// `camera_rotation` and `parent_rotation` are quaternions [qx, qy, qz, qw];
/// `parent_rotation` may be NULL when the camera has no parent.
///
/// # Safety
/// `sim` must be a valid simulator pointer, or null. Non-null quaternion
/// pointers must point to 4 floats.
#[no_mangle]
pub unsafe extern "C" fn xs_set_reference(
    sim: *mut XsSimulator,
    camera_rotation: *const f32,
    parent_rotation: *const f32,
) -> c_int {
    if sim.is_null() || camera_rotation.is_null() {
        return -1;
    }
    let sim = &mut *sim;
    let read_quat = |ptr: *const f32| {
        let values = std::slice::from_raw_parts(ptr, 4);
        Quat::from_xyzw(values[0], values[1], values[2], values[3]).normalize()
    };
    let camera = read_quat(camera_rotation);
    let parent = (!parent_rotation.is_null()).then(|| read_quat(parent_rotation));
    sim.sim
        .set_reference_provider(ReferenceFrame::new(camera, parent));
    0
}

/// Select the frames translation input is expressed in.
/// `keyboard` and `pointer`: 0 = local, 1 = parent, 2 = screen.
/// Returns 0 on success, -1 on error.
///
/// # Safety
/// `sim` must be a valid simulator pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn xs_set_translate_frames(
    sim: *mut XsSimulator,
    keyboard: u32,
    pointer: u32,
) -> c_int {
    if sim.is_null() {
        return -1;
    }
    if keyboard > 2 || pointer > 2 {
        LAST_ERROR.set(&XrSimError::InvalidConfig(format!(
            "coordinate frame selectors must be 0..=2, got {} and {}",
            keyboard, pointer
        )));
        return -1;
    }
    let sim = &mut *sim;
    sim.sim.set_translate_frames(
        CoordinateFrame::from_index(keyboard),
        CoordinateFrame::from_index(pointer),
    );
    0
}

/// Advance the simulation by `dt` seconds using the input set since the
/// last tick.
/// Returns 0 on success, -1 on error.
///
/// # Safety
/// `sim` must be a valid simulator pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn xs_tick(sim: *mut XsSimulator, dt: f32) -> c_int {
    if sim.is_null() {
        return -1;
    }
    let sim = &mut *sim;
    let result = sim.sim.tick(&sim.input, dt);
    sim.input.end_frame();
    match result {
        Ok(()) => 0,
        Err(e) => {
            LAST_ERROR.set(&e);
            -1
        }
    }
}

/// Read the head pose.
/// Returns 0 on success, -1 on error.
///
/// # Safety
/// `sim` and `out` must be valid pointers, or null.
#[no_mangle]
pub unsafe extern "C" fn xs_get_head_pose(sim: *const XsSimulator, out: *mut XsPose) -> c_int {
    if sim.is_null() || out.is_null() {
        return -1;
    }
    let sim = &*sim;
    out.write(XsPose::from(sim.sim.head_pose()));
    0
}

/// Read a controller state. `hand`: 0 = left, 1 = right.
/// Returns 0 on success, -1 on error.
///
/// # Safety
/// `sim` and `out` must be valid pointers, or null.
#[no_mangle]
pub unsafe extern "C" fn xs_get_controller(
    sim: *const XsSimulator,
    hand: c_int,
    out: *mut XsController,
) -> c_int {
    if sim.is_null() || out.is_null() {
        return -1;
    }
    let Some(hand) = hand_from_index(hand) else {
        return -1;
    };
    let sim = &*sim;
    let controller = sim.sim.rig().controller(hand);
    out.write(XsController {
        pose: XsPose::from(&controller.pose),
        trigger: controller.trigger,
        grip: controller.grip,
        buttons: controller.buttons.bits(),
        primary_2d_axis: controller.primary_2d_axis.to_array(),
        secondary_2d_axis: controller.secondary_2d_axis.to_array(),
        connected: sim.sim.controller_connected(hand),
    });
    0
}

/// Read a hand root pose. `hand`: 0 = left, 1 = right.
/// Returns 0 on success, -1 on error.
///
/// # Safety
/// `sim` and `out` must be valid pointers, or null.
#[no_mangle]
pub unsafe extern "C" fn xs_get_hand(sim: *const XsSimulator, hand: c_int, out: *mut XsPose) -> c_int {
    if sim.is_null() || out.is_null() {
        return -1;
    }
    let Some(hand) = hand_from_index(hand) else {
        return -1;
    };
    let sim = &*sim;
    out.write(XsPose::from(&sim.sim.hand_state(hand).pose));
    0
}

/// Current device mode of a hand: 0 = controller, 1 = hand, 2 = none,
/// -1 on error.
///
/// # Safety
/// `sim` must be a valid simulator pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn xs_device_mode(sim: *const XsSimulator, hand: c_int) -> c_int {
    if sim.is_null() {
        return -1;
    }
    let Some(hand) = hand_from_index(hand) else {
        return -1;
    };
    let sim = &*sim;
    sim.sim.device_mode(hand) as c_int
}

/// `DeviceTargets` bits currently receiving manipulation input.
///
/// # Safety
/// `sim` must be a valid simulator pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn xs_targets(sim: *const XsSimulator) -> u32 {
    if sim.is_null() {
        return 0;
    }
    let sim = &*sim;
    sim.sim.targets().bits()
}

/// Request a controller/hand switch for one hand. It completes over the
/// next two ticks.
/// Returns 0 = started, 1 = switch already in progress, 2 = vetoed,
/// 3 = inactive, -1 on error.
///
/// # Safety
/// `sim` must be a valid simulator pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn xs_toggle_mode(sim: *mut XsSimulator, hand: c_int) -> c_int {
    if sim.is_null() {
        return -1;
    }
    let Some(hand) = hand_from_index(hand) else {
        return -1;
    };
    let sim = &mut *sim;
    match sim.sim.request_mode_switch(hand) {
        SwitchOutcome::Started => 0,
        SwitchOutcome::Busy => 1,
        SwitchOutcome::Vetoed => 2,
        SwitchOutcome::Inactive => 3,
    }
}

/// Get the last error message. Returns NULL if no error.
/// The returned pointer is valid until the next xrsim API call.
#[no_mangle]
pub extern "C" fn xs_last_error() -> *const c_char {
    LAST_ERROR.as_ptr()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::MaybeUninit;

    #[test]
    fn test_create_tick_read_destroy() {
        unsafe {
            let sim = xs_create(0);
            assert!(!sim.is_null());

            let forward = 31; // Action::Axis2D
            assert_eq!(xs_set_vector2(sim, forward, 0.0, 1.0), 0);
            assert_eq!(xs_tick(sim, 0.5), 0);

            let mut head = MaybeUninit::<XsPose>::uninit();
            assert_eq!(xs_get_head_pose(sim, head.as_mut_ptr()), 0);
            let head = head.assume_init();
            assert!(head.position[2] < 0.0);
            assert!(head.is_tracked);

            let mut controller = MaybeUninit::<XsController>::uninit();
            assert_eq!(xs_get_controller(sim, 1, controller.as_mut_ptr()), 0);
            assert!(controller.assume_init().connected);

            xs_destroy(sim);
        }
    }

    #[test]
    fn test_toggle_mode_over_two_ticks() {
        unsafe {
            let sim = xs_create(0);
            assert_eq!(xs_toggle_mode(sim, 0), 0);
            assert_eq!(xs_toggle_mode(sim, 0), 1);
            xs_tick(sim, 0.01);
            assert_eq!(xs_device_mode(sim, 0), DeviceMode::Controller as c_int);
            xs_tick(sim, 0.01);
            assert_eq!(xs_device_mode(sim, 0), DeviceMode::Hand as c_int);
            assert_eq!(xs_device_mode(sim, 1), DeviceMode::Controller as c_int);
            xs_destroy(sim);
        }
    }

    #[test]
    fn test_bad_arguments() {
        unsafe {
            let sim = xs_create(1);
            assert_eq!(xs_set_button(sim, 999, true), -1);
            assert_eq!(xs_device_mode(sim, 2), -1);
            assert_eq!(xs_set_translate_frames(sim, 1, 3), -1);
            assert_eq!(xs_set_translate_frames(sim, 1, 2), 0);
            assert_eq!(xs_tick(std::ptr::null_mut(), 0.1), -1);
            assert_eq!(xs_targets(sim), crate::DeviceTargets::FPS.bits());
            xs_destroy(sim);
        }
    }
}
