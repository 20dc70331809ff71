/// Gamepad input tracker using gilrs.
///
/// Button mapping comes from the `[gamepad]` section of config.toml.
/// Default mapping:
///   D-pad / Left Stick    →  Movement
///   Start / A             →  Confirm
///   Select                →  Reset level
///
/// Without the `gamepad` feature this compiles to an always-disconnected
/// pad, so callers never need their own cfg gates.

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;
use crate::domain::entity::FrameInput;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,
    R1,
    L2,
    R2,
    Start,
    Select,
}

const BTN_COUNT: usize = 10;

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH"  => Some(Btn::A),
            "B" | "EAST"   => Some(Btn::B),
            "X" | "WEST"   => Some(Btn::X),
            "Y" | "NORTH"  => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER"  => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "L2" | "LT" | "LEFTTRIGGER2"  => Some(Btn::L2),
            "R2" | "RT" | "RIGHTTRIGGER2" => Some(Btn::R2),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South     => Some(Btn::A),
            Button::East      => Some(Btn::B),
            Button::West      => Some(Btn::X),
            Button::North     => Some(Btn::Y),
            Button::LeftTrigger  => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::LeftTrigger2  => Some(Btn::L2),
            Button::RightTrigger2 => Some(Btn::R2),
            Button::Start     => Some(Btn::Start),
            Button::Select    => Some(Btn::Select),
            _ => None,
        }
    }
}

struct ActionMap {
    confirm: Vec<Btn>,
    reset: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            confirm: vec![Btn::Start, Btn::A],
            reset: vec![Btn::Select],
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    /// Buttons pressed since the last `merge_into` (edge).
    pressed: [bool; BTN_COUNT],

    // D-pad
    dpad_up: bool,
    dpad_down: bool,
    dpad_left: bool,
    dpad_right: bool,

    // Left stick
    stick_x: f32,
    stick_y: f32,

    action_map: ActionMap,

    pub connected: bool,
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        {
            let mut pad = Self::offline();
            match Gilrs::new() {
                Ok(g) => {
                    pad.connected = g.gamepads().next().is_some();
                    if pad.connected {
                        log::info!("gamepad connected");
                    }
                    pad.gilrs = Some(g);
                }
                Err(e) => log::warn!("gamepad support unavailable: {e}"),
            }
            pad
        }
        #[cfg(not(feature = "gamepad"))]
        {
            Self::offline()
        }
    }

    fn offline() -> Self {
        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: None,
            pressed: [false; BTN_COUNT],
            dpad_up: false,
            dpad_down: false,
            dpad_left: false,
            dpad_right: false,
            stick_x: 0.0,
            stick_y: 0.0,
            action_map: ActionMap::default(),
            connected: false,
        }
    }

    /// Apply the configured button names. Unknown names are skipped;
    /// a list with no known names keeps the default.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn parse_list(names: &[String]) -> Vec<Btn> {
            names.iter()
                .filter_map(|s| {
                    let b = Btn::from_name(s);
                    if b.is_none() {
                        log::warn!("unknown gamepad button '{s}' in config");
                    }
                    b
                })
                .collect()
        }
        let cf = parse_list(&cfg.confirm);
        if !cf.is_empty() { self.action_map.confirm = cf; }
        let rs = parse_list(&cfg.reset);
        if !rs.is_empty() { self.action_map.reset = rs; }
    }

    /// Drain pad events. Call once per frame.
    pub fn update(&mut self) {
        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, true);
                }
                EventType::ButtonReleased(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, false);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    match axis {
                        Axis::LeftStickX => self.stick_x = value,
                        Axis::LeftStickY => self.stick_y = value,
                        _ => {}
                    }
                }
                EventType::Connected => {
                    self.connected = true;
                    log::info!("gamepad connected");
                }
                EventType::Disconnected => {
                    self.connected = false;
                    self.release_all();
                    log::info!("gamepad disconnected");
                }
                _ => {}
            }
        }
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, gilrs_btn: Button, held: bool) {
        match gilrs_btn {
            Button::DPadUp    => self.dpad_up = held,
            Button::DPadDown  => self.dpad_down = held,
            Button::DPadLeft  => self.dpad_left = held,
            Button::DPadRight => self.dpad_right = held,
            other => {
                if let (Some(btn), true) = (Btn::from_gilrs(other), held) {
                    self.press(btn);
                }
            }
        }
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn press(&mut self, btn: Btn) {
        self.pressed[btn as usize] = true;
    }

    /// OR the pad into a keyboard snapshot. Consumes pending button presses.
    pub fn merge_into(&mut self, input: &mut FrameInput) {
        input.left |= self.dpad_left || self.stick_x < -STICK_DEADZONE;
        input.right |= self.dpad_right || self.stick_x > STICK_DEADZONE;
        input.up |= self.dpad_up || self.stick_y > STICK_DEADZONE;
        input.down |= self.dpad_down || self.stick_y < -STICK_DEADZONE;
        input.confirm |= self.any_just_pressed(&self.action_map.confirm);
        input.reset |= self.any_just_pressed(&self.action_map.reset);

        self.pressed = [false; BTN_COUNT];
    }

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.pressed[b as usize])
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        self.pressed = [false; BTN_COUNT];
        self.dpad_up = false;
        self.dpad_down = false;
        self.dpad_left = false;
        self.dpad_right = false;
        self.stick_x = 0.0;
        self.stick_y = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_names_are_case_insensitive() {
        assert_eq!(Btn::from_name("start"), Some(Btn::Start));
        assert_eq!(Btn::from_name("Back"), Some(Btn::Select));
        assert_eq!(Btn::from_name("south"), Some(Btn::A));
        assert_eq!(Btn::from_name("turbo"), None);
    }

    #[test]
    fn config_overrides_and_falls_back() {
        let mut pad = GamepadState::offline();
        pad.load_button_config(&GamepadConfig {
            confirm: vec!["nope".into()],
            reset: vec!["Y".into(), "x".into()],
        });
        assert_eq!(pad.action_map.confirm, vec![Btn::Start, Btn::A]);
        assert_eq!(pad.action_map.reset, vec![Btn::Y, Btn::X]);
    }

    #[test]
    fn press_is_edge_and_consumed_by_merge() {
        let mut pad = GamepadState::offline();
        pad.press(Btn::Start);

        let mut input = FrameInput::default();
        pad.merge_into(&mut input);
        assert!(input.confirm);
        assert!(!input.reset);

        let mut input = FrameInput::default();
        pad.merge_into(&mut input);
        assert!(!input.confirm, "still held, but not a new press");
    }

    #[test]
    fn stick_respects_deadzone() {
        let mut pad = GamepadState::offline();
        pad.stick_x = -0.1;
        pad.stick_y = 0.9;
        let mut input = FrameInput::default();
        pad.merge_into(&mut input);
        assert!(!input.left && !input.right);
        assert!(input.up && !input.down);
    }

    #[test]
    fn merge_keeps_keyboard_state() {
        let mut pad = GamepadState::offline();
        let mut input = FrameInput { right: true, reset: true, ..FrameInput::default() };
        pad.merge_into(&mut input);
        assert!(input.right && input.reset);
    }
}
