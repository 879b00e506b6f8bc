/*!
Locomotion states.

The active state is a [`StateKind`] value plus a little shared bookkeeping ([`State`]).
Entering a state runs [`enter`], which resets the avatar to the base presets and then
applies the state's own spring/velocity/animation setup. Per-frame behaviour and input
reactions live in [`machine`].
*/

pub mod landing;
pub(crate) mod machine;

use crate::{
    animation::clips,
    avatar::Avatar,
    bitmask_flags::BitmaskFlags,
    constants::*,
    define_bitmask_flags,
    input::Action,
    physics::Quat,
    seat::SeatId,
};

define_bitmask_flags!(
    /// Seat-related permissions of the active state.
    Capability,
    u8,
    {
        FindObjectsToEnter,
        EnterChairs,
        LeaveChairs,
    }
);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Emote {
    Clap,
    Wave,
    Dance,
}

impl Emote {
    pub const ALL: [Emote; 3] = [Emote::Clap, Emote::Wave, Emote::Dance];

    pub fn clip(self) -> &'static str {
        match self {
            Emote::Clap => clips::CLAP,
            Emote::Wave => clips::WAVE,
            Emote::Dance => clips::DANCE,
        }
    }

    pub fn action(self) -> Action {
        match self {
            Emote::Clap => Action::Clap,
            Emote::Wave => Action::Wave,
            Emote::Dance => Action::Dance,
        }
    }
}

/// Rotation blend of the sit-down and stand-up clips, in the seat's frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeatTransition {
    pub seat: SeatId,
    pub entry_point: usize,
    pub start_rotation: Quat,
    pub end_rotation: Quat,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StateKind {
    Idle,
    Walk,
    Sprint,
    EndWalk,
    JumpIdle { already_jumped: bool },
    JumpRunning { already_jumped: bool },
    Falling,
    DropIdle,
    DropRunning,
    DropRolling,
    Emote(Emote),
    EnteringChair(SeatTransition),
    Sitting { seat: SeatId, entry_point: usize },
    ExitingChair(SeatTransition),
}

/// Payload-free name of a state, for snapshots and logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StateTag {
    Idle,
    Walk,
    Sprint,
    EndWalk,
    JumpIdle,
    JumpRunning,
    Falling,
    DropIdle,
    DropRunning,
    DropRolling,
    StandClap,
    StandWave,
    StandDance,
    EnteringChair,
    Sitting,
    ExitingChair,
}

impl StateKind {
    pub const fn jump_idle() -> Self {
        StateKind::JumpIdle {
            already_jumped: false,
        }
    }

    pub const fn jump_running() -> Self {
        StateKind::JumpRunning {
            already_jumped: false,
        }
    }

    pub fn tag(&self) -> StateTag {
        match self {
            StateKind::Idle => StateTag::Idle,
            StateKind::Walk => StateTag::Walk,
            StateKind::Sprint => StateTag::Sprint,
            StateKind::EndWalk => StateTag::EndWalk,
            StateKind::JumpIdle { .. } => StateTag::JumpIdle,
            StateKind::JumpRunning { .. } => StateTag::JumpRunning,
            StateKind::Falling => StateTag::Falling,
            StateKind::DropIdle => StateTag::DropIdle,
            StateKind::DropRunning => StateTag::DropRunning,
            StateKind::DropRolling => StateTag::DropRolling,
            StateKind::Emote(Emote::Clap) => StateTag::StandClap,
            StateKind::Emote(Emote::Wave) => StateTag::StandWave,
            StateKind::Emote(Emote::Dance) => StateTag::StandDance,
            StateKind::EnteringChair(_) => StateTag::EnteringChair,
            StateKind::Sitting { .. } => StateTag::Sitting,
            StateKind::ExitingChair(_) => StateTag::ExitingChair,
        }
    }

    /// States that drop into `Falling` as soon as the ground probe misses.
    pub(crate) fn falls_in_air(&self) -> bool {
        matches!(
            self,
            StateKind::Idle
                | StateKind::Walk
                | StateKind::Sprint
                | StateKind::EndWalk
                | StateKind::DropIdle
                | StateKind::DropRunning
                | StateKind::DropRolling
                | StateKind::Emote(_)
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct State {
    pub(crate) kind: StateKind,
    /// Seconds since the state was entered.
    pub(crate) timer: f32,
    /// Duration of the clip started on entry; `None` if the player did not know it.
    pub(crate) animation_length: Option<f32>,
    pub(crate) capabilities: BitmaskFlags<u8>,
}

impl State {
    /// Bare state with the base capabilities and no presets applied.
    pub(crate) fn new(kind: StateKind) -> Self {
        let mut capabilities = BitmaskFlags::default();
        capabilities.add_many(&[Capability::FindObjectsToEnter, Capability::LeaveChairs]);
        Self {
            kind,
            timer: 0.0,
            animation_length: None,
            capabilities,
        }
    }

    #[inline]
    pub fn kind(&self) -> &StateKind {
        &self.kind
    }

    #[inline]
    pub fn tag(&self) -> StateTag {
        self.kind.tag()
    }

    #[inline]
    pub fn timer(&self) -> f32 {
        self.timer
    }

    #[inline]
    pub fn animation_length(&self) -> Option<f32> {
        self.animation_length
    }

    #[inline]
    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities.has(capability)
    }

    /// True once the entry clip will have finished by the end of this frame.
    ///
    /// A state whose clip length is unknown never ends on its own.
    pub fn animation_ended(&self, dt: f32) -> bool {
        match self.animation_length {
            Some(length) => self.timer >= length - dt,
            None => {
                log::error!("{:?}: animation_ended queried without a clip length", self.tag());
                false
            }
        }
    }

    /// Normalized progress through the entry clip. Unknown lengths count as finished.
    pub(crate) fn animation_progress(&self) -> f32 {
        match self.animation_length {
            Some(length) if length > 0.0 => (self.timer / length).clamp(0.0, 1.0),
            _ => 1.0,
        }
    }
}

/// Apply the base presets and `kind`'s entry setup to `avatar`, returning the new state.
pub(crate) fn enter(avatar: &mut Avatar, kind: StateKind) -> State {
    let mut state = State::new(kind);

    let config = avatar.config;
    avatar.velocity_spring.set_mass(config.velocity_spring_mass);
    avatar.velocity_spring.damping = config.velocity_spring_damping;
    avatar.rotation_spring.set_mass(config.rotation_spring_mass);
    avatar.rotation_spring.damping = config.rotation_spring_damping;
    avatar.arcade_velocity_is_additive = false;
    avatar.set_arcade_velocity_influence(1.0, 0.0, 1.0);

    let (clip, fade_in) = match kind {
        StateKind::Idle => {
            avatar.velocity_spring.damping = IDLE_VELOCITY_SPRING_DAMPING;
            avatar.velocity_spring.set_mass(IDLE_VELOCITY_SPRING_MASS);
            avatar.set_arcade_velocity_target(0.0);
            (clips::IDLE, 0.1)
        }
        StateKind::Walk => {
            state.capabilities.add(Capability::EnterChairs);
            avatar.set_arcade_velocity_target(WALK_VELOCITY_TARGET);
            (clips::RUN, 0.1)
        }
        StateKind::Sprint => {
            state.capabilities.add(Capability::EnterChairs);
            avatar.velocity_spring.set_mass(SPRINT_VELOCITY_SPRING_MASS);
            avatar.rotation_spring.damping = SPRINT_ROTATION_SPRING_DAMPING;
            avatar.rotation_spring.set_mass(SPRINT_ROTATION_SPRING_MASS);
            avatar.set_arcade_velocity_target(SPRINT_VELOCITY_TARGET);
            (clips::SPRINT, 0.1)
        }
        StateKind::EndWalk => {
            avatar.set_arcade_velocity_target(0.0);
            (clips::STOP, 0.1)
        }
        StateKind::JumpIdle { .. } => {
            avatar.velocity_spring.set_mass(JUMP_IDLE_VELOCITY_SPRING_MASS);
            avatar.set_arcade_velocity_target(0.0);
            (clips::JUMP_IDLE, 0.1)
        }
        StateKind::JumpRunning { .. } => {
            avatar.velocity_spring.set_mass(AIRBORNE_VELOCITY_SPRING_MASS);
            avatar.set_arcade_velocity_target(0.0);
            (clips::JUMP_RUNNING, 0.03)
        }
        StateKind::Falling => {
            avatar.velocity_spring.set_mass(AIRBORNE_VELOCITY_SPRING_MASS);
            avatar.rotation_spring.damping = AIRBORNE_ROTATION_SPRING_DAMPING;
            avatar.arcade_velocity_is_additive = true;
            avatar.set_arcade_velocity_influence(
                AIR_VELOCITY_INFLUENCE,
                0.0,
                AIR_VELOCITY_INFLUENCE,
            );
            (clips::FALLING, 0.3)
        }
        StateKind::DropIdle => {
            avatar.velocity_spring.damping = DROP_IDLE_VELOCITY_SPRING_DAMPING;
            avatar.velocity_spring.set_mass(DROP_IDLE_VELOCITY_SPRING_MASS);
            avatar.set_arcade_velocity_target(0.0);
            (clips::DROP_IDLE, 0.1)
        }
        StateKind::DropRunning => {
            avatar.set_arcade_velocity_target(WALK_VELOCITY_TARGET);
            (clips::DROP_RUNNING, 0.1)
        }
        StateKind::DropRolling => {
            avatar.velocity_spring.set_mass(DROP_ROLLING_VELOCITY_SPRING_MASS);
            avatar.velocity_spring.damping = DROP_ROLLING_VELOCITY_SPRING_DAMPING;
            avatar.set_arcade_velocity_target(WALK_VELOCITY_TARGET);
            (clips::DROP_RUNNING_ROLL, 0.03)
        }
        StateKind::Emote(emote) => {
            avatar.set_arcade_velocity_target(0.0);
            (emote.clip(), 0.1)
        }
        StateKind::EnteringChair(_) => {
            state.capabilities.remove(Capability::FindObjectsToEnter);
            (clips::SIT_DOWN, 0.1)
        }
        StateKind::Sitting { .. } => {
            state.capabilities.remove(Capability::FindObjectsToEnter);
            (clips::SITTING, 0.1)
        }
        StateKind::ExitingChair(_) => {
            state.capabilities.remove(Capability::FindObjectsToEnter);
            (clips::STAND_UP, 0.1)
        }
    };
    state.animation_length = avatar.play_animation(clip, fade_in);
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{avatar::testing, physics::Vec3};

    #[test]
    fn animation_ended_uses_frame_lookahead() {
        let mut state = State::new(StateKind::EndWalk);
        state.animation_length = Some(0.5);
        state.timer = 0.48;
        assert!(!state.animation_ended(0.01));
        assert!(state.animation_ended(0.02));
        state.timer = 0.5;
        assert!(state.animation_ended(0.0));
    }

    #[test]
    fn unknown_clip_length_never_ends() {
        let mut state = State::new(StateKind::Idle);
        state.timer = 100.0;
        assert!(!state.animation_ended(1.0 / 60.0));
        assert_eq!(state.animation_progress(), 1.0);
    }

    #[test]
    fn base_capabilities_and_overrides() {
        let mut avatar = testing::avatar(1);
        assert!(avatar.state().can(Capability::FindObjectsToEnter));
        assert!(avatar.state().can(Capability::LeaveChairs));
        assert!(!avatar.state().can(Capability::EnterChairs));

        avatar.set_state(StateKind::Walk);
        assert!(avatar.state().can(Capability::EnterChairs));

        avatar.set_state(StateKind::Sitting {
            seat: SeatId(0),
            entry_point: 0,
        });
        assert!(!avatar.state().can(Capability::FindObjectsToEnter));
        assert!(avatar.state().can(Capability::LeaveChairs));
    }

    #[test]
    fn entry_presets_reset_between_states() {
        let mut avatar = testing::avatar(1);
        avatar.set_state(StateKind::Falling);
        assert!(avatar.is_arcade_velocity_additive());
        assert_eq!(avatar.velocity_spring.mass(), AIRBORNE_VELOCITY_SPRING_MASS);
        assert_eq!(avatar.arcade_velocity_influence(), Vec3::new(0.05, 0.0, 0.05));

        avatar.set_state(StateKind::Sprint);
        assert!(!avatar.is_arcade_velocity_additive());
        assert_eq!(avatar.arcade_velocity_influence(), Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(avatar.velocity_spring.mass(), SPRINT_VELOCITY_SPRING_MASS);
        assert_eq!(avatar.velocity_spring.damping, avatar.config().velocity_spring_damping);
        assert_eq!(avatar.rotation_spring.mass(), SPRINT_ROTATION_SPRING_MASS);
        assert_eq!(avatar.velocity_target(), Vec3::new(0.0, 0.0, SPRINT_VELOCITY_TARGET));
        assert_eq!(avatar.animation().current_clip(), Some(clips::SPRINT));
        assert_eq!(avatar.state().timer(), 0.0);
    }

    #[test]
    fn emote_tags_name_the_gesture() {
        assert_eq!(StateKind::Emote(Emote::Wave).tag(), StateTag::StandWave);
        assert_eq!(Emote::Dance.action(), Action::Dance);
        assert_eq!(Emote::Clap.clip(), clips::CLAP);
    }
}
