//! Drive the simulator with a scripted input sequence and print sink frames.
//!
//! Usage: cargo run --example simulate
//! Set RUST_LOG=debug to see targeting and mode transitions.

use glam::Vec2;
use std::time::Duration;
use xrsim::{
    Action, ChannelSink, Handedness, SimulatedHandSubsystem, Simulator, SimulatorConfig,
    SimulatorContext, SnapshotInput,
};

const TICK_HZ: f32 = 90.0;

/// One scripted step: inputs held for a number of ticks.
struct Step {
    label: &'static str,
    ticks: u32,
    buttons: &'static [Action],
    axis: Vec2,
    pointer: Vec2,
}

const SCRIPT: &[Step] = &[
    Step {
        label: "walk forward",
        ticks: 90,
        buttons: &[],
        axis: Vec2::new(0.0, 1.0),
        pointer: Vec2::ZERO,
    },
    Step {
        label: "turn right",
        ticks: 30,
        buttons: &[Action::NegateMouseTransformation],
        axis: Vec2::ZERO,
        pointer: Vec2::new(10.0, 0.0),
    },
    Step {
        label: "reach with left controller",
        ticks: 45,
        buttons: &[Action::ManipulateLeft],
        axis: Vec2::new(0.0, 1.0),
        pointer: Vec2::ZERO,
    },
    Step {
        label: "pull left trigger",
        ticks: 10,
        buttons: &[Action::ManipulateLeft, Action::Trigger],
        axis: Vec2::ZERO,
        pointer: Vec2::ZERO,
    },
    Step {
        label: "switch to hands",
        ticks: 5,
        buttons: &[Action::ToggleDeviceMode],
        axis: Vec2::ZERO,
        pointer: Vec2::ZERO,
    },
    Step {
        label: "idle",
        ticks: 10,
        buttons: &[],
        axis: Vec2::ZERO,
        pointer: Vec2::ZERO,
    },
];

fn main() {
    env_logger::init();

    let config = SimulatorConfig::default().with_env_overrides();
    let (sink, stream) = ChannelSink::new(1024);
    let mut sim = match Simulator::new(config, sink, SimulatedHandSubsystem::new()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to create simulator: {}", e);
            std::process::exit(1);
        }
    };

    let mut context = SimulatorContext::new();
    context.subscribe(|id| println!("active simulator: {:?}", id.map(|id| id.get())));
    if let Err(e) = sim.initialize().and_then(|_| sim.start(&mut context)) {
        eprintln!("Failed to start simulator: {}", e);
        std::process::exit(1);
    }

    let dt = 1.0 / TICK_HZ;
    let mut input = SnapshotInput::new();

    for step in SCRIPT {
        println!("== {} ==", step.label);
        for &action in step.buttons {
            input.press(action);
        }
        input.set_vector2(Action::Axis2D, step.axis);

        for _ in 0..step.ticks {
            input.set_vector2(Action::PointerDelta, step.pointer);
            if let Err(e) = sim.tick(&input, dt) {
                eprintln!("Tick failed: {}", e);
                std::process::exit(1);
            }
            input.end_frame();
        }

        for &action in step.buttons {
            input.release(action);
        }

        let mut frame = None;
        while let Ok(next) = stream.recv_timeout(Duration::from_millis(10)) {
            frame = Some(next);
        }
        if let Some(frame) = frame {
            let head = &frame.head;
            println!(
                "tick={:<5} head=[{:+.3}, {:+.3}, {:+.3}] yaw={:+.1}",
                frame.sequence,
                head.position.x,
                head.position.y,
                head.position.z,
                head.euler_deg.y,
            );
            for hand in Handedness::ALL {
                match &frame.controllers[hand.index()] {
                    Some(c) => println!(
                        "  {:?} controller pos=[{:+.3}, {:+.3}, {:+.3}] trigger={:.2} buttons={:?}",
                        hand,
                        c.pose.position.x,
                        c.pose.position.y,
                        c.pose.position.z,
                        c.trigger,
                        c.buttons,
                    ),
                    None => {
                        let h = &frame.hands[hand.index()];
                        println!(
                            "  {:?} hand pos=[{:+.3}, {:+.3}, {:+.3}] tracked={} expression={}",
                            hand,
                            h.pose.position.x,
                            h.pose.position.y,
                            h.pose.position.z,
                            h.pose.is_tracked,
                            h.expression.id.as_str(),
                        );
                    }
                }
            }
        }
    }

    if let Err(e) = sim.stop(&mut context).and_then(|_| sim.dispose()) {
        eprintln!("Failed to stop simulator: {}", e);
    }
}
