//! End-to-end scenarios driving a simulator through scripted input.

use glam::{Vec2, Vec3};
use std::time::Duration;
use xrsim::{
    Action, ChannelSink, ControllerButtons, DeviceMode, DeviceTargets, Handedness,
    SimulatedHandSubsystem, Simulator, SimulatorConfig, SimulatorContext, SinkStream,
    SnapshotInput,
};

const DT: f32 = 1.0 / 60.0;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

struct Harness {
    sim: Simulator<ChannelSink, SimulatedHandSubsystem>,
    stream: SinkStream,
    input: SnapshotInput,
    context: SimulatorContext,
}

impl Harness {
    fn start(config: SimulatorConfig) -> Self {
        init_logging();
        let (sink, stream) = ChannelSink::new(256);
        let mut sim = Simulator::new(config, sink, SimulatedHandSubsystem::new()).unwrap();
        let mut context = SimulatorContext::new();
        sim.initialize().unwrap();
        sim.start(&mut context).unwrap();
        Self {
            sim,
            stream,
            input: SnapshotInput::new(),
            context,
        }
    }

    fn step(&mut self) {
        self.sim.tick(&self.input, DT).unwrap();
        self.input.end_frame();
    }

    fn tap(&mut self, action: Action) {
        self.input.press(action);
        self.step();
        self.input.release(action);
        self.step();
    }
}

#[test]
fn grab_with_right_controller_then_switch_to_hands() {
    let mut h = Harness::start(SimulatorConfig::default());

    h.tap(Action::ToggleManipulateRight);
    assert_eq!(h.sim.targets(), DeviceTargets::RIGHT_DEVICE);

    h.input.press(Action::Grip);
    h.step();
    let right = h.sim.rig().controller(Handedness::Right);
    assert!(right.buttons.contains(ControllerButtons::GRIP));
    assert_eq!(right.grip, 1.0);
    assert_eq!(h.sim.rig().controller(Handedness::Left).grip, 0.0);

    // move the right controller up while gripping
    h.input.set_value(Action::TranslateVertical, 1.0);
    for _ in 0..30 {
        h.step();
    }
    h.input.set_value(Action::TranslateVertical, 0.0);
    let lifted = h.sim.rig().controller(Handedness::Right).pose.position;
    assert!(lifted.y > -0.05 + 0.09);
    assert_eq!(h.sim.head_pose().position, Vec3::ZERO);

    h.tap(Action::ToggleDeviceMode);
    assert_eq!(h.sim.device_mode(Handedness::Right), DeviceMode::Hand);
    assert_eq!(h.sim.device_mode(Handedness::Left), DeviceMode::Controller);
    let hand = h.sim.hands().hand(Handedness::Right);
    assert!(hand.is_tracked);
    assert!((hand.root_pose.position - lifted).length() < 1e-5);

    let mut last = None;
    while let Some(frame) = h.stream.try_recv() {
        last = Some(frame);
    }
    let last = last.unwrap();
    assert!(last.controllers[0].is_some());
    assert!(last.controllers[1].is_none());

    h.sim.stop(&mut h.context).unwrap();
    let frame = h.stream.recv_timeout(Duration::from_millis(100)).unwrap();
    assert_eq!(frame.controllers, [None, None]);
}

#[test]
fn head_only_look_around_and_back() {
    let mut h = Harness::start(SimulatorConfig::default());

    h.tap(Action::ToggleManipulateHead);
    assert_eq!(h.sim.targets(), DeviceTargets::HMD);

    h.input.press(Action::NegateMouseTransformation);
    h.input.set_vector2(Action::PointerDelta, Vec2::new(-300.0, 0.0));
    h.step();
    h.input.release(Action::NegateMouseTransformation);
    h.step();

    // head turned left, controllers stayed put
    assert!((h.sim.head_pose().euler_deg.y - 30.0).abs() < 1e-3);
    let left = h.sim.rig().controller(Handedness::Left).pose;
    assert_eq!(left.euler_deg, Vec3::ZERO);

    h.input.press(Action::ToggleMouseTransformation);
    h.input.press(Action::Reset);
    h.step();
    assert!(h.sim.head_pose().euler_deg.y.abs() < 1e-4);

    h.input.release(Action::ToggleMouseTransformation);
    h.input.release(Action::Reset);
    h.step();
    h.tap(Action::ToggleManipulateHead);
    assert_eq!(h.sim.targets(), DeviceTargets::FPS);
}

#[test]
fn hand_expressions_in_hand_mode() {
    let config = SimulatorConfig {
        initial_device_mode: DeviceMode::Hand,
        ..SimulatorConfig::default()
    };
    let mut h = Harness::start(config);

    // "pinch" is the second quick action
    h.tap(Action::CycleQuickAction);
    h.tap(Action::PerformQuickAction);
    for hand in Handedness::ALL {
        assert_eq!(h.sim.hand_state(hand).expression.id.as_str(), "pinch");
        assert_eq!(h.sim.hands().hand(hand).expression.as_str(), "pinch");
    }

    h.tap(Action::ToggleManipulateLeft);
    h.tap(Action::HandExpression(5));
    assert_eq!(h.sim.hand_state(Handedness::Left).expression.id.as_str(), "fist");
    assert_eq!(h.sim.hand_state(Handedness::Right).expression.id.as_str(), "pinch");
}

#[test]
fn cycle_devices_and_stop_manipulation() {
    let mut h = Harness::start(SimulatorConfig::default());
    h.tap(Action::CycleDevices);
    assert_eq!(h.sim.targets(), DeviceTargets::LEFT_DEVICE);
    h.tap(Action::CycleDevices);
    assert_eq!(h.sim.targets(), DeviceTargets::RIGHT_DEVICE);
    h.tap(Action::StopManipulation);
    assert_eq!(h.sim.targets(), DeviceTargets::FPS);
}
