use crate::types::{ControllerState, DevicePose, HandState};
use crate::{Result, XrSimError};
use crossbeam_channel::{Receiver, Sender};
use std::time::Duration;

/// Consumer of the simulated device states, written once per tick after all
/// pose math.
pub trait DeviceSink {
    fn apply_head_pose(&mut self, head: &DevicePose);

    /// `None` for a hand whose controller device does not currently exist.
    fn apply_controller_poses(
        &mut self,
        left: Option<&ControllerState>,
        right: Option<&ControllerState>,
    );

    fn apply_hand_states(&mut self, left: &HandState, right: &HandState);
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DeviceSink for NullSink {
    fn apply_head_pose(&mut self, _head: &DevicePose) {}

    fn apply_controller_poses(
        &mut self,
        _left: Option<&ControllerState>,
        _right: Option<&ControllerState>,
    ) {
    }

    fn apply_hand_states(&mut self, _left: &HandState, _right: &HandState) {}
}

/// Everything written to a sink during one tick.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SinkFrame {
    /// Tick counter, starting at 1 for the first forwarded frame.
    pub sequence: u64,
    pub head: DevicePose,
    pub controllers: [Option<ControllerState>; 2],
    pub hands: [HandState; 2],
}

/// Sink forwarding each tick as a [`SinkFrame`] over a bounded channel.
///
/// A full channel drops the frame instead of stalling the tick.
pub struct ChannelSink {
    sender: Sender<SinkFrame>,
    pending: SinkFrame,
    sequence: u64,
}

impl ChannelSink {
    /// Create a sink and the stream that receives its frames.
    pub fn new(capacity: usize) -> (ChannelSink, SinkStream) {
        let (sender, receiver) = crossbeam_channel::bounded(capacity);
        let sink = ChannelSink {
            sender,
            pending: SinkFrame::default(),
            sequence: 0,
        };
        (sink, SinkStream { receiver })
    }

    fn flush(&mut self) {
        self.sequence += 1;
        self.pending.sequence = self.sequence;
        if let Err(e) = self.sender.try_send(self.pending.clone()) {
            match e {
                crossbeam_channel::TrySendError::Full(_) => {
                    log::trace!("sink channel full, dropping frame {}", self.sequence);
                }
                crossbeam_channel::TrySendError::Disconnected(_) => {
                    log::trace!("sink stream dropped, discarding frame {}", self.sequence);
                }
            }
        }
    }
}

impl DeviceSink for ChannelSink {
    fn apply_head_pose(&mut self, head: &DevicePose) {
        self.pending.head = *head;
    }

    fn apply_controller_poses(
        &mut self,
        left: Option<&ControllerState>,
        right: Option<&ControllerState>,
    ) {
        self.pending.controllers = [left.copied(), right.copied()];
    }

    // Hands are written last in a tick, so this completes the frame.
    fn apply_hand_states(&mut self, left: &HandState, right: &HandState) {
        self.pending.hands = [left.clone(), right.clone()];
        self.flush();
    }
}

/// Receiving end of a [`ChannelSink`].
pub struct SinkStream {
    receiver: Receiver<SinkFrame>,
}

impl SinkStream {
    /// Receive the next frame (blocks until available).
    pub fn recv(&self) -> Result<SinkFrame> {
        self.receiver.recv().map_err(|_| XrSimError::StreamStopped)
    }

    /// Try to receive a frame without blocking.
    pub fn try_recv(&self) -> Option<SinkFrame> {
        self.receiver.try_recv().ok()
    }

    /// Receive a frame with a timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<SinkFrame> {
        self.receiver.recv_timeout(timeout).map_err(|e| match e {
            crossbeam_channel::RecvTimeoutError::Timeout => XrSimError::Timeout,
            crossbeam_channel::RecvTimeoutError::Disconnected => XrSimError::StreamStopped,
        })
    }

    /// Frames waiting to be received.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}
