//! # xrsim - Input-to-Pose Simulation Engine
//!
//! Drives a simulated XR rig (head, two motion controllers, two tracked
//! hands) from desktop-style input. Provides:
//! - Target selection with hold and toggle layers, FPS-pivot mode
//! - Pose accumulation in local, parent or screen frames with axis locks
//! - Two-tick controller/hand mode switching
//! - Controller buttons, trigger/grip, 2D axes and quick actions
//! - C FFI for integration with C/C++ hosts
//!
//! ## Quick Start
//! ```no_run
//! use xrsim::{Action, ChannelSink, SimulatedHandSubsystem, Simulator, SimulatorConfig,
//!             SimulatorContext, SnapshotInput};
//! use glam::Vec2;
//! use std::time::Duration;
//!
//! let (sink, stream) = ChannelSink::new(64);
//! let mut sim = Simulator::new(SimulatorConfig::default(), sink, SimulatedHandSubsystem::new())
//!     .unwrap();
//! let mut context = SimulatorContext::new();
//! sim.initialize().unwrap();
//! sim.start(&mut context).unwrap();
//!
//! let mut input = SnapshotInput::new();
//! input.set_vector2(Action::Axis2D, Vec2::new(0.0, 1.0));
//! for _ in 0..60 {
//!     sim.tick(&input, 1.0 / 60.0).unwrap();
//!     input.end_frame();
//!     let frame = stream.recv_timeout(Duration::from_secs(1)).unwrap();
//!     println!("head: {:?}", frame.head.position);
//! }
//! ```

pub mod error;
pub mod types;
pub mod config;
pub mod input;
pub mod frame;
pub mod targets;
pub mod pose;
pub mod hands;
pub mod mode;
pub mod controls;
pub mod sink;
pub mod engine;
pub mod ffi;

pub use config::SimulatorConfig;
pub use engine::{InstanceId, LifecycleState, Simulator, SimulatorContext};
pub use error::XrSimError;
pub use frame::{ReferenceFrame, ReferenceProvider};
pub use hands::{HandExpression, HandExpressionDriver, SimulatedHandSubsystem};
pub use input::{Action, InputReader, SnapshotInput};
pub use mode::{HandoffAnchors, SwitchOutcome, TransitionState};
pub use sink::{ChannelSink, DeviceSink, NullSink, SinkFrame, SinkStream};
pub use types::*;

/// Result type alias for xrsim operations.
pub type Result<T> = std::result::Result<T, XrSimError>;
