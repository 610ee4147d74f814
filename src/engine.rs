//! The simulator driver: lifecycle plus the per-tick pipeline.
//!
//! Within a tick the order is fixed: read input, update targets, queue mode
//! switches, accumulate poses, advance mode transitions, process controls,
//! then write every device state to the sink. Left is always handled before
//! right.

use crate::config::SimulatorConfig;
use crate::controls::ControlProcessor;
use crate::frame::{ReferenceFrame, ReferenceProvider};
use crate::hands::HandExpressionDriver;
use crate::input::{Action, InputFrame, InputReader};
use crate::mode::{HandoffAnchors, ModeController, SwitchOutcome, TransitionState};
use crate::pose::{PoseAccumulator, PoseInput};
use crate::sink::DeviceSink;
use crate::targets::TargetSelector;
use crate::types::{
    Axis2DTargets, AxisConstraints, ControllerInputMode, CoordinateFrame, DeviceMode, DevicePose,
    DeviceTargets, HandState, Handedness, SimulatedRig, TransformationMode,
};
use crate::{Result, XrSimError};
use glam::{Vec2, Vec3};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`Simulator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(u64);

impl InstanceId {
    fn next() -> Self {
        Self(NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Where a [`Simulator`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Created,
    Initialized,
    Running,
    Stopped,
    Disposed,
}

impl LifecycleState {
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleState::Created => "created",
            LifecycleState::Initialized => "initialized",
            LifecycleState::Running => "running",
            LifecycleState::Stopped => "stopped",
            LifecycleState::Disposed => "disposed",
        }
    }
}

type InstanceObserver = Box<dyn FnMut(Option<InstanceId>)>;

/// Tracks which simulator is active. Observers run whenever that changes.
#[derive(Default)]
pub struct SimulatorContext {
    active: Option<InstanceId>,
    observers: Vec<InstanceObserver>,
}

impl SimulatorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_instance(&self) -> Option<InstanceId> {
        self.active
    }

    pub fn subscribe(&mut self, observer: impl FnMut(Option<InstanceId>) + 'static) {
        self.observers.push(Box::new(observer));
    }

    fn set_active(&mut self, instance: Option<InstanceId>) {
        if self.active == instance {
            return;
        }
        self.active = instance;
        for observer in &mut self.observers {
            observer(instance);
        }
    }
}

/// Input-to-pose simulation engine.
///
/// `S` receives device states every tick, `H` receives hand tracking and
/// expression updates.
pub struct Simulator<S: DeviceSink, H: HandExpressionDriver> {
    id: InstanceId,
    config: SimulatorConfig,
    state: LifecycleState,
    sink: S,
    hands: H,
    rig: SimulatedRig,
    targets: TargetSelector,
    modes: ModeController,
    controls: ControlProcessor,
    accumulator: PoseAccumulator,
    reference: Box<dyn ReferenceProvider>,
    transformation_mode: TransformationMode,
    input_available: bool,
    reference_available: bool,
    ticks: u64,
}

impl<S: DeviceSink, H: HandExpressionDriver> Simulator<S, H> {
    /// Build a simulator after validating `config`. The reference frame
    /// defaults to identity until [`Simulator::set_reference_provider`].
    pub fn new(config: SimulatorConfig, sink: S, hands: H) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            id: InstanceId::next(),
            state: LifecycleState::Created,
            sink,
            hands,
            rig: SimulatedRig::default(),
            targets: TargetSelector::new(),
            modes: ModeController::new(),
            controls: ControlProcessor::new(&config),
            accumulator: PoseAccumulator::new(&config),
            reference: Box::new(ReferenceFrame::default()),
            transformation_mode: config.initial_transformation_mode,
            input_available: true,
            reference_available: true,
            ticks: 0,
            config,
        })
    }

    /// Place the rig at its configured initial pose.
    pub fn initialize(&mut self) -> Result<()> {
        self.expect_state("initialize", &[LifecycleState::Created])?;

        let head = self.config.head_position;
        self.rig = SimulatedRig::default();
        self.rig.head = DevicePose::new(head, Vec3::ZERO);
        let offsets = [self.config.left_device_offset, self.config.right_device_offset];
        for hand in Handedness::ALL {
            let pose = DevicePose::new(head + offsets[hand.index()], Vec3::ZERO);
            self.rig.controller_mut(hand).pose = pose;
            self.rig.hand_mut(hand).pose = pose;
        }

        self.state = LifecycleState::Initialized;
        log::debug!("simulator {} initialized at {:?}", self.id.get(), head);
        Ok(())
    }

    /// Become the active instance of `context` and create the devices of the
    /// initial mode.
    pub fn start(&mut self, context: &mut SimulatorContext) -> Result<()> {
        self.expect_state(
            "start",
            &[LifecycleState::Initialized, LifecycleState::Stopped],
        )?;

        if let Some(other) = context.active_instance().filter(|&other| other != self.id) {
            log::warn!(
                "simulator {} replaces active simulator {}",
                self.id.get(),
                other.get()
            );
        }
        context.set_active(Some(self.id));

        self.modes
            .activate(self.config.initial_device_mode, &mut self.hands, &mut self.rig);
        self.state = LifecycleState::Running;
        log::info!(
            "simulator {} started in {} mode",
            self.id.get(),
            self.config.initial_device_mode.as_str()
        );
        Ok(())
    }

    /// Advance the simulation by `dt` seconds.
    ///
    /// Outside the running state this does nothing, except after
    /// [`Simulator::dispose`] where it is an error.
    pub fn tick(&mut self, input: &dyn InputReader, dt: f32) -> Result<()> {
        match self.state {
            LifecycleState::Running => {}
            LifecycleState::Disposed => return Err(self.lifecycle_error("tick")),
            _ => return Ok(()),
        }
        self.ticks += 1;

        let frame = if self.check_input(input) {
            Some(InputFrame::read(input, self.controls.expressions().len()))
        } else {
            None
        };

        if let Some(frame) = &frame {
            self.update_targets(frame);
            self.accumulate(frame, dt);
        }

        self.modes.advance(&mut self.hands, &mut self.rig);

        if let Some(frame) = &frame {
            self.controls.process(
                frame,
                self.targets.targets(),
                self.targets.axis_2d_targets(),
                self.modes.modes(),
                &mut self.rig,
                &mut self.hands,
            );
        }

        for hand in Handedness::ALL {
            if self.modes.mode(hand) == DeviceMode::Hand {
                self.hands.set_root_hand_pose(hand, &self.rig.hand(hand).pose);
            }
        }

        self.write_sink();
        log::trace!(
            "tick {}: targets {:?}, modes {:?}",
            self.ticks,
            self.targets.targets(),
            self.modes.modes()
        );
        Ok(())
    }

    /// Remove every device and give up the active slot in `context`.
    pub fn stop(&mut self, context: &mut SimulatorContext) -> Result<()> {
        self.expect_state("stop", &[LifecycleState::Running])?;

        self.modes.deactivate(&mut self.hands);
        for hand in &mut self.rig.hands {
            hand.pose.set_tracked(false);
        }
        self.write_sink();
        if context.active_instance() == Some(self.id) {
            context.set_active(None);
        }
        self.state = LifecycleState::Stopped;
        log::info!("simulator {} stopped after {} ticks", self.id.get(), self.ticks);
        Ok(())
    }

    /// Release the simulator. Only a stopped or never-started one can be
    /// disposed.
    pub fn dispose(&mut self) -> Result<()> {
        self.expect_state(
            "dispose",
            &[
                LifecycleState::Created,
                LifecycleState::Initialized,
                LifecycleState::Stopped,
            ],
        )?;
        self.state = LifecycleState::Disposed;
        log::debug!("simulator {} disposed", self.id.get());
        Ok(())
    }

    pub fn set_reference_provider(&mut self, provider: impl ReferenceProvider + 'static) {
        self.reference = Box::new(provider);
    }

    /// Change the frames keyboard and pointer translation are expressed in.
    pub fn set_translate_frames(&mut self, keyboard: CoordinateFrame, pointer: CoordinateFrame) {
        self.config.keyboard_translate_frame = keyboard;
        self.config.pointer_translate_frame = pointer;
        self.accumulator = PoseAccumulator::new(&self.config);
    }

    pub fn set_anchors(&mut self, anchors: HandoffAnchors) {
        self.modes.set_anchors(anchors);
    }

    /// Queue a mode switch for `hand` as if requested by input.
    pub fn request_mode_switch(&mut self, hand: Handedness) -> SwitchOutcome {
        self.modes.request_switch(hand)
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn rig(&self) -> &SimulatedRig {
        &self.rig
    }

    pub fn head_pose(&self) -> &DevicePose {
        &self.rig.head
    }

    pub fn hand_state(&self, hand: Handedness) -> &HandState {
        self.rig.hand(hand)
    }

    pub fn device_mode(&self, hand: Handedness) -> DeviceMode {
        self.modes.mode(hand)
    }

    pub fn transition(&self, hand: Handedness) -> TransitionState {
        self.modes.transition(hand)
    }

    pub fn controller_connected(&self, hand: Handedness) -> bool {
        self.modes.controller_connected(hand)
    }

    pub fn targets(&self) -> DeviceTargets {
        self.targets.targets()
    }

    pub fn axis_2d_targets(&self) -> Axis2DTargets {
        self.targets.axis_2d_targets()
    }

    pub fn transformation_mode(&self) -> TransformationMode {
        self.transformation_mode
    }

    pub fn quick_action(&self) -> ControllerInputMode {
        self.controls.quick_action()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn hands(&self) -> &H {
        &self.hands
    }

    fn update_targets(&mut self, frame: &InputFrame) {
        let update = self.targets.update(frame);
        if update.mode_switch_requested {
            for hand in Handedness::ALL {
                self.modes.request_switch(hand);
            }
        }
        if frame.pressed(Action::ToggleDeviceMode) {
            for hand in self.targets.targets().control_hands() {
                self.modes.request_switch(hand);
            }
        }
    }

    fn accumulate(&mut self, frame: &InputFrame, dt: f32) {
        if frame.pressed(Action::ToggleMouseTransformation) {
            self.transformation_mode = self.transformation_mode.negate();
            log::debug!("pointer transformation is now {:?}", self.transformation_mode);
        }
        let mode = if frame.held(Action::NegateMouseTransformation) {
            self.transformation_mode.negate()
        } else {
            self.transformation_mode
        };

        let Some(reference) = self.reference_frame() else {
            return;
        };

        let directional = if self.targets.axis_2d_targets().contains(Axis2DTargets::POSITION) {
            frame.axis_2d
        } else {
            Vec2::ZERO
        };
        let input = PoseInput {
            keyboard: Vec3::new(directional.x, frame.vertical, directional.y),
            pointer: frame.pointer_delta,
            scroll: frame.scroll,
            mode,
            constraints: AxisConstraints {
                x: frame.held(Action::XConstraint),
                y: frame.held(Action::YConstraint),
                z: frame.held(Action::ZConstraint),
            },
            reset: frame.pressed(Action::Reset),
            dt,
        };
        self.accumulator.apply(
            &mut self.rig,
            self.modes.modes(),
            self.targets.targets(),
            &reference,
            &input,
        );
    }

    fn check_input(&mut self, input: &dyn InputReader) -> bool {
        let configured = input.is_configured();
        if configured != self.input_available {
            if configured {
                log::info!("input bindings available, resuming input processing");
            } else {
                log::warn!("input bindings missing, skipping input processing");
            }
            self.input_available = configured;
        }
        configured
    }

    fn reference_frame(&mut self) -> Option<ReferenceFrame> {
        let reference = self.reference.reference_frame();
        let available = reference.is_some();
        if available != self.reference_available {
            if available {
                log::info!("reference frame available, resuming pose updates");
            } else {
                log::warn!("no reference frame, pose updates paused");
            }
            self.reference_available = available;
        }
        reference
    }

    fn write_sink(&mut self) {
        let rig = &self.rig;
        self.sink.apply_head_pose(&rig.head);
        let left = self
            .modes
            .controller_connected(Handedness::Left)
            .then_some(&rig.controllers[0]);
        let right = self
            .modes
            .controller_connected(Handedness::Right)
            .then_some(&rig.controllers[1]);
        self.sink.apply_controller_poses(left, right);
        self.sink.apply_hand_states(&rig.hands[0], &rig.hands[1]);
    }

    fn expect_state(&self, op: &'static str, allowed: &[LifecycleState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(self.lifecycle_error(op))
        }
    }

    fn lifecycle_error(&self, op: &'static str) -> XrSimError {
        XrSimError::Lifecycle {
            op,
            state: self.state.as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hands::SimulatedHandSubsystem;
    use crate::input::SnapshotInput;
    use crate::sink::{ChannelSink, NullSink, SinkStream};
    use std::cell::RefCell;
    use std::rc::Rc;

    type TestSimulator = Simulator<NullSink, SimulatedHandSubsystem>;

    fn running(config: SimulatorConfig) -> (TestSimulator, SimulatorContext) {
        let mut context = SimulatorContext::new();
        let mut sim = Simulator::new(config, NullSink, SimulatedHandSubsystem::new()).unwrap();
        sim.initialize().unwrap();
        sim.start(&mut context).unwrap();
        (sim, context)
    }

    fn step<S: DeviceSink, H: HandExpressionDriver>(
        sim: &mut Simulator<S, H>,
        input: &mut SnapshotInput,
    ) {
        sim.tick(&*input, 1.0 / 60.0).unwrap();
        input.end_frame();
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = SimulatorConfig {
            grip_amount: 2.0,
            ..SimulatorConfig::default()
        };
        let result = Simulator::new(config, NullSink, SimulatedHandSubsystem::new());
        assert!(matches!(result, Err(XrSimError::InvalidConfig(_))));
    }

    #[test]
    fn test_lifecycle_order() {
        let mut context = SimulatorContext::new();
        let mut sim = Simulator::new(
            SimulatorConfig::default(),
            NullSink,
            SimulatedHandSubsystem::new(),
        )
        .unwrap();
        let input = SnapshotInput::new();

        assert!(matches!(
            sim.start(&mut context),
            Err(XrSimError::Lifecycle { op: "start", .. })
        ));
        // ticking before start does nothing
        sim.tick(&input, 0.1).unwrap();

        sim.initialize().unwrap();
        assert!(sim.initialize().is_err());
        sim.start(&mut context).unwrap();
        assert!(sim.dispose().is_err());
        sim.stop(&mut context).unwrap();
        sim.start(&mut context).unwrap();
        sim.stop(&mut context).unwrap();
        sim.dispose().unwrap();

        let err = sim.tick(&input, 0.1).unwrap_err();
        assert_eq!(err.to_string(), "Cannot tick while simulator is disposed");
    }

    #[test]
    fn test_context_observers() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut context = SimulatorContext::new();
        let log = seen.clone();
        context.subscribe(move |id| log.borrow_mut().push(id));

        let mut first = TestSimulator::new(
            SimulatorConfig::default(),
            NullSink,
            SimulatedHandSubsystem::new(),
        )
        .unwrap();
        let mut second = TestSimulator::new(
            SimulatorConfig::default(),
            NullSink,
            SimulatedHandSubsystem::new(),
        )
        .unwrap();
        first.initialize().unwrap();
        second.initialize().unwrap();

        first.start(&mut context).unwrap();
        second.start(&mut context).unwrap();
        assert_eq!(context.active_instance(), Some(second.id()));
        // not active, leaves the slot alone
        first.stop(&mut context).unwrap();
        second.stop(&mut context).unwrap();

        assert_eq!(
            *seen.borrow(),
            vec![Some(first.id()), Some(second.id()), None]
        );
    }

    #[test]
    fn test_initial_placement() {
        let config = SimulatorConfig {
            head_position: Vec3::new(0.0, 1.6, 0.0),
            ..SimulatorConfig::default()
        };
        let (sim, _) = running(config);
        assert_eq!(sim.head_pose().position, Vec3::new(0.0, 1.6, 0.0));
        let left = sim.rig().controller(Handedness::Left).pose.position;
        assert!((left - Vec3::new(-0.1, 1.55, -0.3)).length() < 1e-5);
        assert!(sim.controller_connected(Handedness::Right));
        assert!(!sim.hand_state(Handedness::Right).pose.is_tracked);
    }

    #[test]
    fn test_hold_one_tick_then_release() {
        let (mut sim, _) = running(SimulatorConfig::default());
        let mut input = SnapshotInput::new();
        assert_eq!(sim.targets(), DeviceTargets::FPS);

        input.press(Action::ManipulateLeft);
        step(&mut sim, &mut input);
        assert_eq!(sim.targets(), DeviceTargets::LEFT_DEVICE);

        input.release(Action::ManipulateLeft);
        step(&mut sim, &mut input);
        assert_eq!(sim.targets(), DeviceTargets::FPS);
    }

    #[test]
    fn test_dual_press_switches_mode_of_both_hands() {
        let (mut sim, _) = running(SimulatorConfig::default());
        let mut input = SnapshotInput::new();
        let both = DeviceTargets::LEFT_DEVICE | DeviceTargets::RIGHT_DEVICE;

        input.press(Action::ToggleManipulateLeft);
        input.press(Action::ToggleManipulateRight);
        step(&mut sim, &mut input);
        assert_eq!(sim.targets(), both);
        assert!(!sim.transition(Handedness::Left).dirty);

        input.release(Action::ToggleManipulateLeft);
        input.release(Action::ToggleManipulateRight);
        step(&mut sim, &mut input);

        input.press(Action::ToggleManipulateLeft);
        input.press(Action::ToggleManipulateRight);
        step(&mut sim, &mut input);
        assert_eq!(sim.targets(), both);
        for hand in Handedness::ALL {
            let transition = sim.transition(hand);
            assert!(transition.dirty && transition.started_change);
            assert_eq!(sim.device_mode(hand), DeviceMode::Controller);
        }

        step(&mut sim, &mut input);
        for hand in Handedness::ALL {
            assert_eq!(sim.device_mode(hand), DeviceMode::Hand);
            assert!(!sim.transition(hand).dirty);
            assert!(!sim.controller_connected(hand));
            assert!(sim.hands().hand(hand).is_tracked);
        }
    }

    #[test]
    fn test_dual_press_from_hand_mode_untracks_both_hands() {
        let config = SimulatorConfig {
            initial_device_mode: DeviceMode::Hand,
            ..SimulatorConfig::default()
        };
        let (mut sim, _) = running(config);
        let mut input = SnapshotInput::new();

        for _ in 0..2 {
            input.press(Action::ToggleManipulateLeft);
            input.press(Action::ToggleManipulateRight);
            step(&mut sim, &mut input);
            input.release(Action::ToggleManipulateLeft);
            input.release(Action::ToggleManipulateRight);
            step(&mut sim, &mut input);
        }
        step(&mut sim, &mut input);

        assert!(sim.hands().updates_allowed());
        for hand in Handedness::ALL {
            assert_eq!(sim.device_mode(hand), DeviceMode::Controller);
            assert!(sim.controller_connected(hand));
            assert!(!sim.hands().hand(hand).is_tracked, "{:?} hand still tracked", hand);
            assert!(!sim.hand_state(hand).pose.is_tracked);
        }
    }

    #[test]
    fn test_toggle_device_mode_follows_targets() {
        let (mut sim, _) = running(SimulatorConfig::default());
        let mut input = SnapshotInput::new();

        input.press(Action::ToggleManipulateRight);
        step(&mut sim, &mut input);
        input.release(Action::ToggleManipulateRight);
        input.press(Action::ToggleDeviceMode);
        step(&mut sim, &mut input);
        input.release(Action::ToggleDeviceMode);
        step(&mut sim, &mut input);

        assert_eq!(sim.device_mode(Handedness::Left), DeviceMode::Controller);
        assert_eq!(sim.device_mode(Handedness::Right), DeviceMode::Hand);
    }

    #[test]
    fn test_fps_walks_forward() {
        let (mut sim, _) = running(SimulatorConfig::default());
        let mut input = SnapshotInput::new();
        input.set_vector2(Action::Axis2D, Vec2::new(0.0, 1.0));
        sim.tick(&input, 1.0).unwrap();

        // 0.2 m/s with the 5x body multiplier
        assert!((sim.head_pose().position - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
        assert!(
            (sim.rig().controller(Handedness::Left).pose.position - Vec3::new(-0.1, -0.05, -1.3))
                .length()
                < 1e-5
        );
    }

    #[test]
    fn test_axis_routed_to_controller_does_not_move() {
        let (mut sim, _) = running(SimulatorConfig::default());
        let mut input = SnapshotInput::new();
        input.press(Action::TogglePrimary2DAxisTarget);
        step(&mut sim, &mut input);
        input.release(Action::TogglePrimary2DAxisTarget);

        input.set_vector2(Action::Axis2D, Vec2::new(1.0, 0.0));
        step(&mut sim, &mut input);
        assert_eq!(sim.head_pose().position, Vec3::ZERO);
        assert_eq!(
            sim.rig().controller(Handedness::Left).primary_2d_axis,
            Vec2::new(1.0, 0.0)
        );
    }

    #[test]
    fn test_transformation_toggle_and_negate() {
        let (mut sim, _) = running(SimulatorConfig::default());
        let mut input = SnapshotInput::new();

        input.press(Action::ToggleMouseTransformation);
        step(&mut sim, &mut input);
        assert_eq!(sim.transformation_mode(), TransformationMode::Rotate);
        input.release(Action::ToggleMouseTransformation);

        // held negate translates instead of rotating
        input.press(Action::NegateMouseTransformation);
        input.set_vector2(Action::PointerDelta, Vec2::new(100.0, 0.0));
        step(&mut sim, &mut input);
        assert_eq!(sim.transformation_mode(), TransformationMode::Rotate);
        assert!(sim.head_pose().position.x > 0.0);
        assert_eq!(sim.head_pose().euler_deg, Vec3::ZERO);

        input.release(Action::NegateMouseTransformation);
        input.set_vector2(Action::PointerDelta, Vec2::new(100.0, 0.0));
        step(&mut sim, &mut input);
        assert!(sim.head_pose().euler_deg.y < 0.0);
    }

    #[test]
    fn test_missing_reference_pauses_pose_updates() {
        let available = Rc::new(RefCell::new(false));
        let (mut sim, _) = running(SimulatorConfig::default());
        let flag = available.clone();
        sim.set_reference_provider(move || (*flag.borrow()).then(ReferenceFrame::default));

        let mut input = SnapshotInput::new();
        input.set_vector2(Action::Axis2D, Vec2::new(0.0, 1.0));
        sim.tick(&input, 1.0).unwrap();
        assert_eq!(sim.head_pose().position, Vec3::ZERO);

        *available.borrow_mut() = true;
        sim.tick(&input, 1.0).unwrap();
        assert!(sim.head_pose().position.z < 0.0);
    }

    #[test]
    fn test_unconfigured_input_is_ignored() {
        let (mut sim, _) = running(SimulatorConfig::default());
        let mut input = SnapshotInput::unconfigured();
        input.press(Action::ManipulateRight);
        input.set_vector2(Action::Axis2D, Vec2::new(1.0, 0.0));
        sim.tick(&input, 1.0).unwrap();
        assert_eq!(sim.targets(), DeviceTargets::FPS);
        assert_eq!(sim.head_pose().position, Vec3::ZERO);

        input.set_configured(true);
        sim.tick(&input, 1.0).unwrap();
        assert_eq!(sim.targets(), DeviceTargets::RIGHT_DEVICE);
    }

    #[test]
    fn test_sink_sees_removed_controllers() {
        let (sink, stream): (ChannelSink, SinkStream) = ChannelSink::new(16);
        let config = SimulatorConfig {
            initial_device_mode: DeviceMode::Hand,
            ..SimulatorConfig::default()
        };
        let mut context = SimulatorContext::new();
        let mut sim = Simulator::new(config, sink, SimulatedHandSubsystem::new()).unwrap();
        sim.initialize().unwrap();
        sim.start(&mut context).unwrap();

        let mut input = SnapshotInput::new();
        step(&mut sim, &mut input);
        let frame = stream.try_recv().unwrap();
        assert_eq!(frame.controllers, [None, None]);
        assert!(frame.hands[0].pose.is_tracked);

        sim.request_mode_switch(Handedness::Left);
        step(&mut sim, &mut input);
        let frame = stream.try_recv().unwrap();
        assert!(frame.controllers[0].is_some());
        assert!(frame.controllers[1].is_none());

        sim.stop(&mut context).unwrap();
        let frame = stream.try_recv().unwrap();
        assert_eq!(frame.controllers, [None, None]);
    }

    #[test]
    fn test_vetoed_switch_keeps_mode() {
        let (mut sim, _) = running(SimulatorConfig::default());
        sim.set_anchors(HandoffAnchors::LEFT_CONTROLLER | HandoffAnchors::RIGHT_CONTROLLER);
        assert_eq!(
            sim.request_mode_switch(Handedness::Left),
            SwitchOutcome::Vetoed
        );
        let mut input = SnapshotInput::new();
        step(&mut sim, &mut input);
        step(&mut sim, &mut input);
        assert_eq!(sim.device_mode(Handedness::Left), DeviceMode::Controller);
    }
}
