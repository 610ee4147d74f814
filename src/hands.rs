//! Hand-expression subsystem capability and an in-memory implementation.

use crate::types::{DevicePose, ExpressionId, Handedness};

/// Expression a hand returns to when no other expression is active.
pub const DEFAULT_EXPRESSION: &str = "default";

/// One entry of the hand expression catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandExpression {
    pub id: ExpressionId,
    /// Reachable through the quick-action cycle.
    pub is_quick_action: bool,
}

impl HandExpression {
    pub fn new(name: &str, is_quick_action: bool) -> Self {
        Self {
            id: ExpressionId::new(name),
            is_quick_action,
        }
    }
}

/// Stock catalog: the first four expressions are quick-action candidates.
pub fn default_expressions() -> Vec<HandExpression> {
    vec![
        HandExpression::new("poke", true),
        HandExpression::new("pinch", true),
        HandExpression::new("grab", true),
        HandExpression::new("thumb", true),
        HandExpression::new("open", false),
        HandExpression::new("fist", false),
        HandExpression::new("point", false),
    ]
}

/// Receiver of hand tracking state. Driven by the mode controller and the
/// control-input processor; never handed simulation state by reference.
pub trait HandExpressionDriver {
    fn set_is_tracked(&mut self, hand: Handedness, tracked: bool);

    fn set_hand_expression(&mut self, hand: Handedness, expression: &ExpressionId);

    fn set_root_hand_pose(&mut self, hand: Handedness, pose: &DevicePose);

    /// Freeze (`false`) or resume (`true`) hand updates.
    fn set_update_hands_allowed(&mut self, allowed: bool);
}

/// Last state the subsystem accepted for one hand.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedHand {
    pub is_tracked: bool,
    pub expression: ExpressionId,
    pub root_pose: DevicePose,
}

impl Default for SimulatedHand {
    fn default() -> Self {
        Self {
            is_tracked: false,
            expression: ExpressionId::default(),
            root_pose: DevicePose::default(),
        }
    }
}

/// In-memory hand subsystem. While updates are disallowed every per-hand
/// write is ignored, which is how a tracking loss looks downstream.
#[derive(Debug, Clone)]
pub struct SimulatedHandSubsystem {
    updates_allowed: bool,
    hands: [SimulatedHand; 2],
}

impl Default for SimulatedHandSubsystem {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedHandSubsystem {
    pub fn new() -> Self {
        Self {
            updates_allowed: true,
            hands: Default::default(),
        }
    }

    pub fn updates_allowed(&self) -> bool {
        self.updates_allowed
    }

    pub fn hand(&self, hand: Handedness) -> &SimulatedHand {
        &self.hands[hand.index()]
    }

    fn writable(&mut self, hand: Handedness) -> Option<&mut SimulatedHand> {
        if self.updates_allowed {
            Some(&mut self.hands[hand.index()])
        } else {
            log::trace!("hand update for {:?} ignored while frozen", hand);
            None
        }
    }
}

impl HandExpressionDriver for SimulatedHandSubsystem {
    fn set_is_tracked(&mut self, hand: Handedness, tracked: bool) {
        if let Some(state) = self.writable(hand) {
            state.is_tracked = tracked;
        }
    }

    fn set_hand_expression(&mut self, hand: Handedness, expression: &ExpressionId) {
        if let Some(state) = self.writable(hand) {
            state.expression = expression.clone();
        }
    }

    fn set_root_hand_pose(&mut self, hand: Handedness, pose: &DevicePose) {
        if let Some(state) = self.writable(hand) {
            state.root_pose = *pose;
        }
    }

    fn set_update_hands_allowed(&mut self, allowed: bool) {
        self.updates_allowed = allowed;
    }
}
