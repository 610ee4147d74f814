//! Per-hand switching between controller and tracked-hand representations.
//!
//! A switch is staged over two ticks so that downstream consumers observe a
//! tracking loss between representations instead of both at once:
//!
//! | from       | tick 1                                   | tick 2                                  |
//! |------------|------------------------------------------|-----------------------------------------|
//! | Controller | freeze hand updates                      | remove controller, track hand, unfreeze |
//! | Hand       | create controller, untrack hand, freeze  | unfreeze                                |

use crate::hands::HandExpressionDriver;
use crate::types::{DeviceMode, Handedness, SimulatedRig};

bitflags::bitflags! {
    /// External reference objects each representation needs before it can
    /// take over a hand.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[repr(C)]
    pub struct HandoffAnchors: u32 {
        const LEFT_CONTROLLER  = 1 << 0;
        const RIGHT_CONTROLLER = 1 << 1;
        const LEFT_HAND        = 1 << 2;
        const RIGHT_HAND       = 1 << 3;
    }
}

impl HandoffAnchors {
    /// Anchor `hand` needs to be represented in `mode`.
    pub fn required(hand: Handedness, mode: DeviceMode) -> HandoffAnchors {
        match (hand, mode) {
            (Handedness::Left, DeviceMode::Controller) => HandoffAnchors::LEFT_CONTROLLER,
            (Handedness::Right, DeviceMode::Controller) => HandoffAnchors::RIGHT_CONTROLLER,
            (Handedness::Left, DeviceMode::Hand) => HandoffAnchors::LEFT_HAND,
            (Handedness::Right, DeviceMode::Hand) => HandoffAnchors::RIGHT_HAND,
            (_, DeviceMode::None) => HandoffAnchors::empty(),
        }
    }
}

/// Progress of an in-flight mode switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransitionState {
    pub dirty: bool,
    pub started_change: bool,
}

/// Result of a mode switch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    Started,
    /// A switch was already in progress; the request was dropped.
    Busy,
    /// The destination representation has no anchor.
    Vetoed,
    /// The hand is not active.
    Inactive,
}

#[derive(Debug, Clone)]
struct HandModeMachine {
    hand: Handedness,
    mode: DeviceMode,
    transition: TransitionState,
    controller_connected: bool,
}

impl HandModeMachine {
    fn new(hand: Handedness) -> Self {
        Self {
            hand,
            mode: DeviceMode::None,
            transition: TransitionState::default(),
            controller_connected: false,
        }
    }

    /// Per-hand writes of one transition step. The shared freeze is owned
    /// by [`ModeController::advance`].
    fn advance<H: HandExpressionDriver>(&mut self, hands: &mut H, rig: &mut SimulatedRig) {
        if !self.transition.dirty {
            return;
        }
        let hand = self.hand;
        match (self.mode, self.transition.started_change) {
            (DeviceMode::Controller, false) => {
                self.transition.started_change = true;
            }
            (DeviceMode::Controller, true) => {
                self.controller_connected = false;
                let mut pose = rig.controller(hand).pose;
                pose.set_tracked(true);
                rig.hand_mut(hand).pose = pose;
                hands.set_is_tracked(hand, true);
                hands.set_root_hand_pose(hand, &pose);
                self.finish(DeviceMode::Hand);
            }
            (DeviceMode::Hand, false) => {
                let mut pose = rig.hand(hand).pose;
                pose.set_tracked(true);
                rig.controller_mut(hand).pose = pose;
                rig.hand_mut(hand).pose.set_tracked(false);
                self.controller_connected = true;
                hands.set_is_tracked(hand, false);
                self.transition.started_change = true;
            }
            (DeviceMode::Hand, true) => {
                let mut pose = rig.hand(hand).pose;
                pose.set_tracked(true);
                rig.controller_mut(hand).pose = pose;
                self.finish(DeviceMode::Controller);
            }
            (DeviceMode::None, _) => unreachable!("transition on inactive {:?} hand", hand),
        }
    }

    /// Between the two steps of a switch, hand updates stay frozen.
    fn is_frozen(&self) -> bool {
        self.transition.dirty && self.transition.started_change
    }

    fn finish(&mut self, mode: DeviceMode) {
        log::debug!(
            "{:?} hand switched {} -> {}",
            self.hand,
            self.mode.as_str(),
            mode.as_str()
        );
        self.mode = mode;
        self.transition = TransitionState::default();
    }
}

/// Owns the mode state machine of both hands.
#[derive(Debug, Clone)]
pub struct ModeController {
    machines: [HandModeMachine; 2],
    anchors: HandoffAnchors,
}

impl Default for ModeController {
    fn default() -> Self {
        Self::new()
    }
}

impl ModeController {
    pub fn new() -> Self {
        Self {
            machines: [
                HandModeMachine::new(Handedness::Left),
                HandModeMachine::new(Handedness::Right),
            ],
            anchors: HandoffAnchors::all(),
        }
    }

    pub fn mode(&self, hand: Handedness) -> DeviceMode {
        self.machines[hand.index()].mode
    }

    /// Committed mode of both hands, left first.
    pub fn modes(&self) -> [DeviceMode; 2] {
        [self.machines[0].mode, self.machines[1].mode]
    }

    pub fn transition(&self, hand: Handedness) -> TransitionState {
        self.machines[hand.index()].transition
    }

    /// Whether the controller device for `hand` currently exists.
    pub fn controller_connected(&self, hand: Handedness) -> bool {
        self.machines[hand.index()].controller_connected
    }

    pub fn anchors(&self) -> HandoffAnchors {
        self.anchors
    }

    pub fn set_anchors(&mut self, anchors: HandoffAnchors) {
        self.anchors = anchors;
    }

    /// Bring both hands up in `mode` without a staged transition.
    pub fn activate<H: HandExpressionDriver>(
        &mut self,
        mode: DeviceMode,
        hands: &mut H,
        rig: &mut SimulatedRig,
    ) {
        let tracked = mode == DeviceMode::Hand;
        hands.set_update_hands_allowed(true);
        for machine in &mut self.machines {
            let hand = machine.hand;
            machine.mode = mode;
            machine.transition = TransitionState::default();
            machine.controller_connected = mode == DeviceMode::Controller;
            rig.hand_mut(hand).pose.set_tracked(tracked);
            rig.controller_mut(hand).pose.set_tracked(!tracked);
            hands.set_is_tracked(hand, tracked);
            hands.set_hand_expression(hand, &rig.hand(hand).expression.id);
            hands.set_root_hand_pose(hand, &rig.hand(hand).pose);
        }
    }

    /// Remove every device and return both hands to `None`.
    pub fn deactivate<H: HandExpressionDriver>(&mut self, hands: &mut H) {
        hands.set_update_hands_allowed(true);
        for machine in &mut self.machines {
            machine.mode = DeviceMode::None;
            machine.transition = TransitionState::default();
            machine.controller_connected = false;
            hands.set_is_tracked(machine.hand, false);
        }
    }

    /// Ask `hand` to switch to the opposite representation.
    ///
    /// Dropped while a switch is in progress and vetoed when the destination
    /// anchor is missing. An accepted request completes on the second
    /// [`ModeController::advance`] call.
    pub fn request_switch(&mut self, hand: Handedness) -> SwitchOutcome {
        let anchors = self.anchors;
        let machine = &mut self.machines[hand.index()];
        if machine.mode == DeviceMode::None {
            return SwitchOutcome::Inactive;
        }
        if machine.transition.dirty {
            log::debug!("{:?} hand mode switch dropped, transition in progress", hand);
            return SwitchOutcome::Busy;
        }
        let target = machine.mode.negate();
        let required = HandoffAnchors::required(hand, target);
        if !anchors.contains(required) {
            log::warn!(
                "{:?} hand cannot switch to {}: missing {:?} anchor",
                hand,
                target.as_str(),
                required
            );
            return SwitchOutcome::Vetoed;
        }
        machine.transition = TransitionState {
            dirty: true,
            started_change: false,
        };
        SwitchOutcome::Started
    }

    /// Run one tick of every in-flight transition, left hand first.
    ///
    /// Hand updates are frozen for the whole subsystem, so the freeze is
    /// lifted before any per-hand write and set again afterwards while any
    /// hand sits between its two steps.
    pub fn advance<H: HandExpressionDriver>(&mut self, hands: &mut H, rig: &mut SimulatedRig) {
        if !self.machines.iter().any(|m| m.transition.dirty) {
            return;
        }
        hands.set_update_hands_allowed(true);
        for machine in &mut self.machines {
            machine.advance(hands, rig);
        }
        let frozen = self.machines.iter().any(HandModeMachine::is_frozen);
        if !frozen {
            // writes dropped during the freeze
            for machine in &self.machines {
                if machine.mode == DeviceMode::Hand {
                    let hand = machine.hand;
                    hands.set_hand_expression(hand, &rig.hand(hand).expression.id);
                }
            }
        }
        hands.set_update_hands_allowed(!frozen);
    }
}
