//! Input reader abstraction.
//!
//! The engine never assumes a physical binding. It polls an [`InputReader`]
//! once per tick for every [`Action`] it understands and works from the
//! resulting [`InputFrame`] snapshot.

use glam::Vec2;
use std::collections::{HashMap, HashSet};

/// Every logical input the simulator reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    // -- target selection (buttons) --
    /// Hold to manipulate the left device.
    ManipulateLeft,
    /// Hold to manipulate the right device.
    ManipulateRight,
    ToggleManipulateLeft,
    ToggleManipulateRight,
    /// Toggle exclusive manipulation of the head.
    ToggleManipulateHead,
    CycleDevices,
    StopManipulation,

    // -- transformation (buttons) --
    ToggleMouseTransformation,
    /// Hold to temporarily invert the pointer transformation mode.
    NegateMouseTransformation,
    XConstraint,
    YConstraint,
    ZConstraint,
    Reset,

    // -- device mode / axis routing (buttons) --
    ToggleDeviceMode,
    TogglePrimary2DAxisTarget,
    ToggleSecondary2DAxisTarget,

    // -- quick action (buttons) --
    CycleQuickAction,
    PerformQuickAction,

    // -- controller surfaces (buttons) --
    Trigger,
    Grip,
    PrimaryButton,
    SecondaryButton,
    Menu,
    Primary2DAxisClick,
    Secondary2DAxisClick,
    Primary2DAxisTouch,
    Secondary2DAxisTouch,
    PrimaryTouch,
    SecondaryTouch,

    /// Toggle for the hand expression at this catalog index.
    HandExpression(u8),

    // -- values --
    /// Pointer movement this frame, in pixels.
    PointerDelta,
    /// Scroll movement this frame; only `y` is used.
    ScrollDelta,
    /// Directional input (keyboard WASD or a stick), each component in [-1, 1].
    Axis2D,
    /// Vertical directional input in [-1, 1].
    TranslateVertical,
}

/// Code offset for [`Action::HandExpression`] in the C API.
pub const HAND_EXPRESSION_CODE_BASE: u32 = 1000;

static CODED_ACTIONS: [Action; 33] = [
    Action::ManipulateLeft,
    Action::ManipulateRight,
    Action::ToggleManipulateLeft,
    Action::ToggleManipulateRight,
    Action::ToggleManipulateHead,
    Action::CycleDevices,
    Action::StopManipulation,
    Action::ToggleMouseTransformation,
    Action::NegateMouseTransformation,
    Action::XConstraint,
    Action::YConstraint,
    Action::ZConstraint,
    Action::Reset,
    Action::ToggleDeviceMode,
    Action::TogglePrimary2DAxisTarget,
    Action::ToggleSecondary2DAxisTarget,
    Action::CycleQuickAction,
    Action::PerformQuickAction,
    Action::Trigger,
    Action::Grip,
    Action::PrimaryButton,
    Action::SecondaryButton,
    Action::Menu,
    Action::Primary2DAxisClick,
    Action::Secondary2DAxisClick,
    Action::Primary2DAxisTouch,
    Action::Secondary2DAxisTouch,
    Action::PrimaryTouch,
    Action::SecondaryTouch,
    Action::PointerDelta,
    Action::ScrollDelta,
    Action::Axis2D,
    Action::TranslateVertical,
];

/// Actions read as buttons every tick, excluding hand expressions.
fn button_actions() -> &'static [Action] {
    &CODED_ACTIONS[..29]
}

impl Action {
    /// Decode a C API action code. Codes follow declaration order; hand
    /// expressions start at [`HAND_EXPRESSION_CODE_BASE`].
    pub fn from_code(code: u32) -> Option<Action> {
        if code >= HAND_EXPRESSION_CODE_BASE {
            return u8::try_from(code - HAND_EXPRESSION_CODE_BASE)
                .ok()
                .map(Action::HandExpression);
        }
        CODED_ACTIONS.get(code as usize).copied()
    }

    /// Per-frame deltas reset to zero at the end of a frame.
    fn is_delta(self) -> bool {
        matches!(self, Action::PointerDelta | Action::ScrollDelta)
    }
}

/// Polled source of operator input.
pub trait InputReader {
    /// False when no binding asset is available; the engine then skips all
    /// input-driven work for the tick.
    fn is_configured(&self) -> bool {
        true
    }

    fn is_performed(&self, action: Action) -> bool;

    fn was_performed_this_frame(&self, action: Action) -> bool;

    fn was_completed_this_frame(&self, action: Action) -> bool;

    fn read_value(&self, action: Action) -> f32;

    fn read_vector2(&self, action: Action) -> Vec2;

    fn button(&self, action: Action) -> ButtonState {
        ButtonState {
            performed: self.is_performed(action),
            pressed: self.was_performed_this_frame(action),
            released: self.was_completed_this_frame(action),
        }
    }
}

/// The three boolean query shapes of one button for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonState {
    /// Currently held.
    pub performed: bool,
    /// Went down this frame.
    pub pressed: bool,
    /// Went up this frame.
    pub released: bool,
}

/// Everything read from the [`InputReader`] for one tick.
#[derive(Debug, Clone, Default)]
pub struct InputFrame {
    buttons: HashMap<Action, ButtonState>,
    pub pointer_delta: Vec2,
    pub scroll: f32,
    pub axis_2d: Vec2,
    pub vertical: f32,
}

impl InputFrame {
    /// Poll every action, including `expression_count` hand expression toggles.
    pub fn read(reader: &dyn InputReader, expression_count: usize) -> Self {
        let expression_actions = (0..expression_count.min(u8::MAX as usize + 1))
            .map(|i| Action::HandExpression(i as u8));
        let buttons = button_actions()
            .iter()
            .copied()
            .chain(expression_actions)
            .map(|action| (action, reader.button(action)))
            .collect();

        Self {
            buttons,
            pointer_delta: reader.read_vector2(Action::PointerDelta),
            scroll: reader.read_vector2(Action::ScrollDelta).y,
            axis_2d: reader.read_vector2(Action::Axis2D),
            vertical: reader.read_value(Action::TranslateVertical),
        }
    }

    pub fn button(&self, action: Action) -> ButtonState {
        self.buttons.get(&action).copied().unwrap_or_default()
    }

    pub fn held(&self, action: Action) -> bool {
        self.button(action).performed
    }

    pub fn pressed(&self, action: Action) -> bool {
        self.button(action).pressed
    }

    pub fn released(&self, action: Action) -> bool {
        self.button(action).released
    }

    /// Set a button state directly; used to script frames without a reader.
    pub fn set_button(&mut self, action: Action, state: ButtonState) {
        self.buttons.insert(action, state);
    }
}

/// Frame-snapshot [`InputReader`] with edge detection.
///
/// Drivers write the current state of each action, hand the snapshot to
/// `Simulator::tick`, then call [`SnapshotInput::end_frame`]. Pointer and
/// scroll deltas are cleared at the end of each frame.
#[derive(Debug, Clone)]
pub struct SnapshotInput {
    configured: bool,
    held: HashSet<Action>,
    previous: HashSet<Action>,
    values: HashMap<Action, f32>,
    vectors: HashMap<Action, Vec2>,
}

impl Default for SnapshotInput {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotInput {
    pub fn new() -> Self {
        Self {
            configured: true,
            held: HashSet::new(),
            previous: HashSet::new(),
            values: HashMap::new(),
            vectors: HashMap::new(),
        }
    }

    /// A reader that reports no binding asset.
    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new()
        }
    }

    pub fn set_configured(&mut self, configured: bool) {
        self.configured = configured;
    }

    pub fn press(&mut self, action: Action) {
        self.held.insert(action);
    }

    pub fn release(&mut self, action: Action) {
        self.held.remove(&action);
    }

    pub fn set_button(&mut self, action: Action, held: bool) {
        if held {
            self.press(action);
        } else {
            self.release(action);
        }
    }

    pub fn set_value(&mut self, action: Action, value: f32) {
        self.values.insert(action, value);
    }

    pub fn set_vector2(&mut self, action: Action, value: Vec2) {
        self.vectors.insert(action, value);
    }

    /// Latch the current button state as the previous frame and clear deltas.
    pub fn end_frame(&mut self) {
        self.previous.clone_from(&self.held);
        self.vectors.retain(|action, _| !action.is_delta());
    }
}

impl InputReader for SnapshotInput {
    fn is_configured(&self) -> bool {
        self.configured
    }

    fn is_performed(&self, action: Action) -> bool {
        self.held.contains(&action)
    }

    fn was_performed_this_frame(&self, action: Action) -> bool {
        self.held.contains(&action) && !self.previous.contains(&action)
    }

    fn was_completed_this_frame(&self, action: Action) -> bool {
        !self.held.contains(&action) && self.previous.contains(&action)
    }

    fn read_value(&self, action: Action) -> f32 {
        self.values.get(&action).copied().unwrap_or(0.0)
    }

    fn read_vector2(&self, action: Action) -> Vec2 {
        self.vectors.get(&action).copied().unwrap_or(Vec2::ZERO)
    }
}
