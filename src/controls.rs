//! Button, trigger/grip, directional axis and quick-action processing.

use crate::config::SimulatorConfig;
use crate::hands::{HandExpression, HandExpressionDriver, DEFAULT_EXPRESSION};
use crate::input::{Action, InputFrame};
use crate::types::{
    Axis2DTargets, ControllerButtons, ControllerInputMode, DeviceMode, DeviceTargets,
    ExpressionId, HandExpressionState, Handedness, SimulatedRig,
};
use glam::Vec2;

/// Button actions and the controller surface each one drives.
const SURFACES: [(Action, ControllerButtons); 11] = [
    (Action::Trigger, ControllerButtons::TRIGGER),
    (Action::Grip, ControllerButtons::GRIP),
    (Action::PrimaryButton, ControllerButtons::PRIMARY_BUTTON),
    (Action::SecondaryButton, ControllerButtons::SECONDARY_BUTTON),
    (Action::Menu, ControllerButtons::MENU),
    (Action::Primary2DAxisClick, ControllerButtons::PRIMARY_2D_AXIS_CLICK),
    (Action::Secondary2DAxisClick, ControllerButtons::SECONDARY_2D_AXIS_CLICK),
    (Action::Primary2DAxisTouch, ControllerButtons::PRIMARY_2D_AXIS_TOUCH),
    (Action::Secondary2DAxisTouch, ControllerButtons::SECONDARY_2D_AXIS_TOUCH),
    (Action::PrimaryTouch, ControllerButtons::PRIMARY_TOUCH),
    (Action::SecondaryTouch, ControllerButtons::SECONDARY_TOUCH),
];

/// Translates control inputs into controller surfaces and hand expressions.
#[derive(Debug, Clone)]
pub struct ControlProcessor {
    trigger_amount: f32,
    grip_amount: f32,
    quick_action: ControllerInputMode,
    expressions: Vec<HandExpression>,
    /// Catalog indices reachable through the quick-action cycle.
    quick_expressions: Vec<usize>,
    quick_expression: usize,
}

impl ControlProcessor {
    pub fn new(config: &SimulatorConfig) -> Self {
        let quick_expressions = config
            .hand_expressions
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_quick_action)
            .map(|(i, _)| i)
            .collect();
        let quick_action = match config.initial_quick_action {
            ControllerInputMode::None => ControllerInputMode::Trigger,
            mode => mode,
        };
        Self {
            trigger_amount: config.trigger_amount,
            grip_amount: config.grip_amount,
            quick_action,
            expressions: config.hand_expressions.clone(),
            quick_expressions,
            quick_expression: 0,
        }
    }

    /// Surface the controller quick action currently toggles.
    pub fn quick_action(&self) -> ControllerInputMode {
        self.quick_action
    }

    /// Expression the hand quick action currently toggles.
    pub fn quick_expression(&self) -> Option<&HandExpression> {
        self.quick_expressions
            .get(self.quick_expression)
            .map(|&i| &self.expressions[i])
    }

    pub fn expressions(&self) -> &[HandExpression] {
        &self.expressions
    }

    /// Apply one tick of control input to the hands selected by `targets`.
    pub fn process<H: HandExpressionDriver>(
        &mut self,
        frame: &InputFrame,
        targets: DeviceTargets,
        axis_targets: Axis2DTargets,
        modes: [DeviceMode; 2],
        rig: &mut SimulatedRig,
        hands: &mut H,
    ) {
        let control_hands: Vec<Handedness> = targets.control_hands().collect();

        for &hand in &control_hands {
            if modes[hand.index()] != DeviceMode::Controller {
                continue;
            }
            let controller = rig.controller_mut(hand);
            for (action, surface) in SURFACES {
                if frame.pressed(action) {
                    controller.buttons.insert(surface);
                } else if frame.released(action) {
                    controller.buttons.remove(surface);
                }
            }
            controller.primary_2d_axis =
                routed_axis(frame, axis_targets, Axis2DTargets::PRIMARY_2D_AXIS);
            controller.secondary_2d_axis =
                routed_axis(frame, axis_targets, Axis2DTargets::SECONDARY_2D_AXIS);
        }

        if frame.pressed(Action::CycleQuickAction) {
            if let Some(&first) = control_hands.first() {
                self.cycle_quick_action(modes[first.index()]);
            }
        }

        if frame.pressed(Action::PerformQuickAction) {
            for &hand in &control_hands {
                match modes[hand.index()] {
                    DeviceMode::Controller => {
                        rig.controller_mut(hand)
                            .buttons
                            .toggle(self.quick_action.button());
                    }
                    DeviceMode::Hand => {
                        if let Some(&index) = self.quick_expressions.get(self.quick_expression) {
                            let id = self.expressions[index].id.clone();
                            toggle_expression(rig, hands, hand, &id, true);
                        }
                    }
                    DeviceMode::None => {}
                }
            }
        }

        for index in 0..self.expressions.len().min(u8::MAX as usize + 1) {
            if !frame.pressed(Action::HandExpression(index as u8)) {
                continue;
            }
            let id = self.expressions[index].id.clone();
            for &hand in &control_hands {
                if modes[hand.index()] == DeviceMode::Hand {
                    toggle_expression(rig, hands, hand, &id, false);
                }
            }
        }

        for controller in &mut rig.controllers {
            controller.trigger = if controller.buttons.contains(ControllerButtons::TRIGGER) {
                self.trigger_amount
            } else {
                0.0
            };
            controller.grip = if controller.buttons.contains(ControllerButtons::GRIP) {
                self.grip_amount
            } else {
                0.0
            };
        }
    }

    fn cycle_quick_action(&mut self, mode: DeviceMode) {
        match mode {
            DeviceMode::Controller => {
                self.quick_action = self.quick_action.next();
                log::debug!("controller quick action is now {:?}", self.quick_action);
            }
            DeviceMode::Hand => {
                if self.quick_expressions.is_empty() {
                    return;
                }
                self.quick_expression = (self.quick_expression + 1) % self.quick_expressions.len();
                if let Some(expression) = self.quick_expression() {
                    log::debug!("hand quick action is now '{}'", expression.id.as_str());
                }
            }
            DeviceMode::None => {}
        }
    }
}

fn routed_axis(frame: &InputFrame, targets: Axis2DTargets, axis: Axis2DTargets) -> Vec2 {
    if targets.contains(axis) {
        frame.axis_2d
    } else {
        Vec2::ZERO
    }
}

/// Apply `id` to `hand`, or return to the default expression if it is
/// already active.
fn toggle_expression<H: HandExpressionDriver>(
    rig: &mut SimulatedRig,
    hands: &mut H,
    hand: Handedness,
    id: &ExpressionId,
    is_quick_action: bool,
) {
    let state = &mut rig.hand_mut(hand).expression;
    *state = if state.id == *id {
        HandExpressionState {
            id: ExpressionId::new(DEFAULT_EXPRESSION),
            is_quick_action: false,
        }
    } else {
        HandExpressionState {
            id: id.clone(),
            is_quick_action,
        }
    };
    hands.set_hand_expression(hand, &state.id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hands::SimulatedHandSubsystem;
    use crate::input::ButtonState;

    const CONTROLLERS: [DeviceMode; 2] = [DeviceMode::Controller, DeviceMode::Controller];
    const HANDS: [DeviceMode; 2] = [DeviceMode::Hand, DeviceMode::Hand];

    fn press(action: Action) -> InputFrame {
        let mut frame = InputFrame::default();
        frame.set_button(
            action,
            ButtonState {
                performed: true,
                pressed: true,
                released: false,
            },
        );
        frame
    }

    fn release(action: Action) -> InputFrame {
        let mut frame = InputFrame::default();
        frame.set_button(
            action,
            ButtonState {
                performed: false,
                pressed: false,
                released: true,
            },
        );
        frame
    }

    struct Fixture {
        controls: ControlProcessor,
        rig: SimulatedRig,
        hands: SimulatedHandSubsystem,
    }

    impl Fixture {
        fn new() -> Self {
            let config = SimulatorConfig {
                trigger_amount: 0.8,
                ..SimulatorConfig::default()
            };
            Self {
                controls: ControlProcessor::new(&config),
                rig: SimulatedRig::default(),
                hands: SimulatedHandSubsystem::new(),
            }
        }

        fn run(&mut self, frame: &InputFrame, targets: DeviceTargets, modes: [DeviceMode; 2]) {
            self.controls.process(
                frame,
                targets,
                Axis2DTargets::POSITION,
                modes,
                &mut self.rig,
                &mut self.hands,
            );
        }
    }

    #[test]
    fn test_trigger_follows_button_on_targeted_controller() {
        let mut f = Fixture::new();
        f.run(&press(Action::Trigger), DeviceTargets::LEFT_DEVICE, CONTROLLERS);
        assert!(f.rig.controllers[0].buttons.contains(ControllerButtons::TRIGGER));
        assert_eq!(f.rig.controllers[0].trigger, 0.8);
        assert_eq!(f.rig.controllers[1].trigger, 0.0);

        // latched on the left while the right is targeted
        f.run(&InputFrame::default(), DeviceTargets::RIGHT_DEVICE, CONTROLLERS);
        assert_eq!(f.rig.controllers[0].trigger, 0.8);

        f.run(&release(Action::Trigger), DeviceTargets::LEFT_DEVICE, CONTROLLERS);
        assert_eq!(f.rig.controllers[0].buttons, ControllerButtons::empty());
        assert_eq!(f.rig.controllers[0].trigger, 0.0);
    }

    #[test]
    fn test_fps_drives_both_and_hmd_neither() {
        let mut f = Fixture::new();
        f.run(&press(Action::Grip), DeviceTargets::HMD, CONTROLLERS);
        assert_eq!(f.rig.controllers[0].grip, 0.0);

        f.run(&press(Action::Grip), DeviceTargets::FPS, CONTROLLERS);
        assert_eq!(f.rig.controllers[0].grip, 1.0);
        assert_eq!(f.rig.controllers[1].grip, 1.0);
    }

    #[test]
    fn test_axis_routing() {
        let mut f = Fixture::new();
        let mut frame = InputFrame::default();
        frame.axis_2d = Vec2::new(0.5, -1.0);
        f.controls.process(
            &frame,
            DeviceTargets::RIGHT_DEVICE,
            Axis2DTargets::SECONDARY_2D_AXIS,
            CONTROLLERS,
            &mut f.rig,
            &mut f.hands,
        );
        assert_eq!(f.rig.controllers[1].secondary_2d_axis, Vec2::new(0.5, -1.0));
        assert_eq!(f.rig.controllers[1].primary_2d_axis, Vec2::ZERO);
        assert_eq!(f.rig.controllers[0].secondary_2d_axis, Vec2::ZERO);
    }

    #[test]
    fn test_controller_quick_action() {
        let mut f = Fixture::new();
        assert_eq!(f.controls.quick_action(), ControllerInputMode::Trigger);
        f.run(&press(Action::CycleQuickAction), DeviceTargets::FPS, CONTROLLERS);
        assert_eq!(f.controls.quick_action(), ControllerInputMode::Grip);

        f.run(&press(Action::PerformQuickAction), DeviceTargets::LEFT_DEVICE, CONTROLLERS);
        assert_eq!(f.rig.controllers[0].buttons, ControllerButtons::GRIP);
        assert_eq!(f.rig.controllers[0].grip, 1.0);

        f.run(&press(Action::PerformQuickAction), DeviceTargets::LEFT_DEVICE, CONTROLLERS);
        assert_eq!(f.rig.controllers[0].buttons, ControllerButtons::empty());
    }

    #[test]
    fn test_hand_quick_action_toggles_expression() {
        let mut f = Fixture::new();
        assert_eq!(f.controls.quick_expression().unwrap().id.as_str(), "poke");
        f.run(&press(Action::CycleQuickAction), DeviceTargets::FPS, HANDS);
        assert_eq!(f.controls.quick_expression().unwrap().id.as_str(), "pinch");

        f.run(&press(Action::PerformQuickAction), DeviceTargets::RIGHT_DEVICE, HANDS);
        assert_eq!(f.rig.hands[1].expression.id.as_str(), "pinch");
        assert!(f.rig.hands[1].expression.is_quick_action);
        assert_eq!(f.hands.hand(Handedness::Right).expression.as_str(), "pinch");
        assert_eq!(f.rig.hands[0].expression.id.as_str(), DEFAULT_EXPRESSION);

        f.run(&press(Action::PerformQuickAction), DeviceTargets::RIGHT_DEVICE, HANDS);
        assert_eq!(f.rig.hands[1].expression.id.as_str(), DEFAULT_EXPRESSION);
    }

    #[test]
    fn test_quick_expression_cycle_wraps() {
        let mut f = Fixture::new();
        for _ in 0..4 {
            f.run(&press(Action::CycleQuickAction), DeviceTargets::FPS, HANDS);
        }
        assert_eq!(f.controls.quick_expression().unwrap().id.as_str(), "poke");
    }

    #[test]
    fn test_expression_toggle_only_in_hand_mode() {
        let mut f = Fixture::new();
        // catalog index 5 is "fist"
        f.run(&press(Action::HandExpression(5)), DeviceTargets::FPS, CONTROLLERS);
        assert_eq!(f.rig.hands[0].expression.id.as_str(), DEFAULT_EXPRESSION);

        f.run(
            &press(Action::HandExpression(5)),
            DeviceTargets::FPS,
            [DeviceMode::Hand, DeviceMode::Controller],
        );
        assert_eq!(f.rig.hands[0].expression.id.as_str(), "fist");
        assert!(!f.rig.hands[0].expression.is_quick_action);
        assert_eq!(f.rig.hands[1].expression.id.as_str(), DEFAULT_EXPRESSION);
    }
}
