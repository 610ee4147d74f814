use crate::hands::{default_expressions, HandExpression};
use crate::types::{ControllerInputMode, CoordinateFrame, DeviceMode, TransformationMode};
use crate::{Result, XrSimError};
use glam::Vec3;
use std::collections::HashSet;

/// Tunables supplied at construction time.
///
/// Speeds are in meters per second, translate sensitivities in meters per
/// pixel, rotate sensitivities in degrees per pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorConfig {
    pub keyboard_x_translate_speed: f32,
    pub keyboard_y_translate_speed: f32,
    pub keyboard_z_translate_speed: f32,
    /// Scale on keyboard translation while the whole rig moves.
    pub body_translate_multiplier: f32,
    pub keyboard_translate_frame: CoordinateFrame,

    pub pointer_x_translate_sensitivity: f32,
    pub pointer_y_translate_sensitivity: f32,
    pub pointer_scroll_translate_sensitivity: f32,
    pub pointer_translate_frame: CoordinateFrame,

    pub pointer_x_rotate_sensitivity: f32,
    pub pointer_y_rotate_sensitivity: f32,
    pub pointer_scroll_rotate_sensitivity: f32,
    pub invert_pointer_y_rotation: bool,

    pub initial_transformation_mode: TransformationMode,
    /// Largest head pitch magnitude reachable in FPS mode, in degrees.
    pub max_fps_pitch_deg: f32,

    /// Trigger pull reported while the trigger button is on.
    pub trigger_amount: f32,
    /// Grip pull reported while the grip button is on.
    pub grip_amount: f32,

    pub initial_device_mode: DeviceMode,
    pub initial_quick_action: ControllerInputMode,

    pub head_position: Vec3,
    /// Hand device offsets from the head at initialization.
    pub left_device_offset: Vec3,
    pub right_device_offset: Vec3,

    pub hand_expressions: Vec<HandExpression>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            keyboard_x_translate_speed: 0.2,
            keyboard_y_translate_speed: 0.2,
            keyboard_z_translate_speed: 0.2,
            body_translate_multiplier: 5.0,
            keyboard_translate_frame: CoordinateFrame::Local,
            pointer_x_translate_sensitivity: 0.0004,
            pointer_y_translate_sensitivity: 0.0004,
            pointer_scroll_translate_sensitivity: 0.0002,
            pointer_translate_frame: CoordinateFrame::Screen,
            pointer_x_rotate_sensitivity: 0.1,
            pointer_y_rotate_sensitivity: 0.1,
            pointer_scroll_rotate_sensitivity: 0.05,
            invert_pointer_y_rotation: false,
            initial_transformation_mode: TransformationMode::Translate,
            max_fps_pitch_deg: 80.0,
            trigger_amount: 1.0,
            grip_amount: 1.0,
            initial_device_mode: DeviceMode::Controller,
            initial_quick_action: ControllerInputMode::Trigger,
            head_position: Vec3::ZERO,
            left_device_offset: Vec3::new(-0.1, -0.05, -0.3),
            right_device_offset: Vec3::new(0.1, -0.05, -0.3),
            hand_expressions: default_expressions(),
        }
    }
}

impl SimulatorConfig {
    /// Check every field for a usable value.
    pub fn validate(&self) -> Result<()> {
        let rates = [
            ("keyboard_x_translate_speed", self.keyboard_x_translate_speed),
            ("keyboard_y_translate_speed", self.keyboard_y_translate_speed),
            ("keyboard_z_translate_speed", self.keyboard_z_translate_speed),
            ("body_translate_multiplier", self.body_translate_multiplier),
            ("pointer_x_translate_sensitivity", self.pointer_x_translate_sensitivity),
            ("pointer_y_translate_sensitivity", self.pointer_y_translate_sensitivity),
            (
                "pointer_scroll_translate_sensitivity",
                self.pointer_scroll_translate_sensitivity,
            ),
            ("pointer_x_rotate_sensitivity", self.pointer_x_rotate_sensitivity),
            ("pointer_y_rotate_sensitivity", self.pointer_y_rotate_sensitivity),
            (
                "pointer_scroll_rotate_sensitivity",
                self.pointer_scroll_rotate_sensitivity,
            ),
        ];
        for (name, value) in rates {
            if !value.is_finite() || value < 0.0 {
                return Err(XrSimError::InvalidConfig(format!(
                    "{} must be a finite non-negative number, got {}",
                    name, value
                )));
            }
        }

        for (name, value) in [
            ("trigger_amount", self.trigger_amount),
            ("grip_amount", self.grip_amount),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(XrSimError::InvalidConfig(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        if !(self.max_fps_pitch_deg > 0.0 && self.max_fps_pitch_deg < 90.0) {
            return Err(XrSimError::InvalidConfig(format!(
                "max_fps_pitch_deg must be within (0, 90), got {}",
                self.max_fps_pitch_deg
            )));
        }

        if self.initial_device_mode == DeviceMode::None {
            return Err(XrSimError::InvalidConfig(
                "initial_device_mode must be controller or hand".into(),
            ));
        }

        for (name, v) in [
            ("head_position", self.head_position),
            ("left_device_offset", self.left_device_offset),
            ("right_device_offset", self.right_device_offset),
        ] {
            if !v.is_finite() {
                return Err(XrSimError::InvalidConfig(format!("{} is not finite", name)));
            }
        }

        if self.hand_expressions.len() > u8::MAX as usize + 1 {
            return Err(XrSimError::InvalidConfig(format!(
                "at most 256 hand expressions supported, got {}",
                self.hand_expressions.len()
            )));
        }
        let mut seen = HashSet::new();
        for expression in &self.hand_expressions {
            let name = expression.id.as_str();
            if name.is_empty() || name == crate::hands::DEFAULT_EXPRESSION {
                return Err(XrSimError::InvalidConfig(format!(
                    "invalid hand expression name '{}'",
                    name
                )));
            }
            if !seen.insert(name) {
                return Err(XrSimError::InvalidConfig(format!(
                    "duplicate hand expression '{}'",
                    name
                )));
            }
        }

        Ok(())
    }

    /// Overlay `XRSIM_*` environment variables onto this config. Unset or
    /// unparseable variables keep the current value.
    pub fn with_env_overrides(mut self) -> Self {
        let speed = read_env_f32("XRSIM_KEYBOARD_TRANSLATE_SPEED", f32::NAN);
        if !speed.is_nan() {
            self.keyboard_x_translate_speed = speed;
            self.keyboard_y_translate_speed = speed;
            self.keyboard_z_translate_speed = speed;
        }
        self.body_translate_multiplier =
            read_env_f32("XRSIM_BODY_TRANSLATE_MULTIPLIER", self.body_translate_multiplier);

        let rotate = read_env_f32("XRSIM_POINTER_ROTATE_SENSITIVITY", f32::NAN);
        if !rotate.is_nan() {
            self.pointer_x_rotate_sensitivity = rotate;
            self.pointer_y_rotate_sensitivity = rotate;
        }
        self.invert_pointer_y_rotation =
            read_env_bool("XRSIM_INVERT_POINTER_Y", self.invert_pointer_y_rotation);
        self.max_fps_pitch_deg = read_env_f32("XRSIM_MAX_FPS_PITCH", self.max_fps_pitch_deg);
        self.trigger_amount = read_env_f32("XRSIM_TRIGGER_AMOUNT", self.trigger_amount);
        self.grip_amount = read_env_f32("XRSIM_GRIP_AMOUNT", self.grip_amount);

        self.keyboard_translate_frame =
            read_env_frame("XRSIM_KEYBOARD_FRAME", self.keyboard_translate_frame);
        self.pointer_translate_frame =
            read_env_frame("XRSIM_POINTER_FRAME", self.pointer_translate_frame);

        match read_env_string("XRSIM_INITIAL_MODE", "").as_str() {
            "" => {}
            "controller" => self.initial_device_mode = DeviceMode::Controller,
            "hand" => self.initial_device_mode = DeviceMode::Hand,
            other => log::warn!(
                "Unknown XRSIM_INITIAL_MODE='{}', keeping {} (supported: controller|hand)",
                other,
                self.initial_device_mode.as_str()
            ),
        }

        self
    }
}

fn read_env_f32(name: &str, default: f32) -> f32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<f32>().ok())
        .unwrap_or(default)
}

fn read_env_bool(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .and_then(|v| {
            let v = v.trim().to_ascii_lowercase();
            match v.as_str() {
                "1" | "true" | "yes" | "on" => Some(true),
                "0" | "false" | "no" | "off" => Some(false),
                _ => None,
            }
        })
        .unwrap_or(default)
}

fn read_env_string(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn read_env_frame(name: &str, default: CoordinateFrame) -> CoordinateFrame {
    match read_env_string(name, "").as_str() {
        "" => default,
        "local" => CoordinateFrame::Local,
        "parent" => CoordinateFrame::Parent,
        "screen" => CoordinateFrame::Screen,
        other => {
            log::warn!(
                "Unknown {}='{}', keeping {:?} (supported: local|parent|screen)",
                name,
                other,
                default
            );
            default
        }
    }
}
