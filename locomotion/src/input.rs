use std::{fmt, str::FromStr};

use crate::{
    bitmask_flags::BitmaskFlags, define_bitmask_flags, error::ParseActionError, physics::Vec3,
};

define_bitmask_flags!(
    /// Named boolean inputs an avatar reacts to.
    Action,
    u16,
    {
        Up,
        Down,
        Left,
        Right,
        Run,
        Jump,
        Enter,
        EnterPassenger,
        Clap,
        Wave,
        Dance,
        QuitEmote,
    }
);

impl Action {
    pub const DIRECTIONS: [Action; 4] = [Action::Up, Action::Down, Action::Left, Action::Right];

    pub fn name(self) -> &'static str {
        match self {
            Action::Up => "up",
            Action::Down => "down",
            Action::Left => "left",
            Action::Right => "right",
            Action::Run => "run",
            Action::Jump => "jump",
            Action::Enter => "enter",
            Action::EnterPassenger => "enter_passenger",
            Action::Clap => "clap",
            Action::Wave => "wave",
            Action::Dance => "dance",
            Action::QuitEmote => "quit_emote",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Action {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Action::ALL
            .iter()
            .copied()
            .find(|action| action.name() == normalized)
            .ok_or_else(|| ParseActionError(s.to_owned()))
    }
}

/// Pressed state plus the edges of the most recent change.
///
/// Edges only live for the duration of one input-change dispatch: the avatar sets them,
/// lets the active state react, then clears them again.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActionStates {
    pressed: BitmaskFlags<u16>,
    just_pressed: BitmaskFlags<u16>,
    just_released: BitmaskFlags<u16>,
}

impl ActionStates {
    #[inline]
    pub fn is_pressed(&self, action: Action) -> bool {
        self.pressed.has(action)
    }

    #[inline]
    pub fn just_pressed(&self, action: Action) -> bool {
        self.just_pressed.has(action)
    }

    #[inline]
    pub fn just_released(&self, action: Action) -> bool {
        self.just_released.has(action)
    }

    pub fn any_direction(&self) -> bool {
        self.pressed.has_any(&Action::DIRECTIONS)
    }

    pub fn no_direction(&self) -> bool {
        !self.any_direction()
    }

    pub fn any_direction_just_pressed(&self) -> bool {
        self.just_pressed.has_any(&Action::DIRECTIONS)
    }

    /// Record a new value for `action`. Returns false, and records nothing, if the value
    /// did not change.
    pub(crate) fn apply(&mut self, action: Action, pressed: bool) -> bool {
        if self.pressed.has(action) == pressed {
            return false;
        }
        self.pressed.set(action, pressed);
        self.just_pressed.set(action, pressed);
        self.just_released.set(action, !pressed);
        true
    }

    pub(crate) fn clear_edges(&mut self, action: Action) {
        self.just_pressed.remove(action);
        self.just_released.remove(action);
    }

    /// Release without producing an edge.
    pub(crate) fn release_silently(&mut self, action: Action) {
        self.pressed.remove(action);
        self.clear_edges(action);
    }

    /// Release everything without producing edges.
    pub(crate) fn reset(&mut self) {
        self.pressed.clear();
        self.just_pressed.clear();
        self.just_released.clear();
    }

    /// Unit direction in avatar-local axes from the held directional actions.
    ///
    /// Left is +X, up is +Z. Opposing keys cancel out and yield zero.
    pub fn local_direction(&self) -> Vec3 {
        let axis = |positive: Action, negative: Action| {
            let mut value = 0.0;
            if self.is_pressed(positive) {
                value += 1.0;
            }
            if self.is_pressed(negative) {
                value -= 1.0;
            }
            value
        };
        let dir = Vec3::new(
            axis(Action::Left, Action::Right),
            0.0,
            axis(Action::Up, Action::Down),
        );
        dir.try_normalize(1.0e-6).unwrap_or_else(Vec3::zeros)
    }
}
