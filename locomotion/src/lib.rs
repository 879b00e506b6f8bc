/*!
Avatar locomotion core.

A [`World`] owns avatars, seats and a [`PhysicsBackend`]. Every frame it runs fixed
physics steps, blends each avatar's spring-smoothed arcade velocity into its capsule body,
and drives the per-avatar state machine (idle, walking, sprinting, jumping, falling,
landing, emotes and sitting in seats).
*/

pub mod animation;
pub mod avatar;
pub mod bitmask_flags;
pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod input;
pub mod interaction;
pub mod physics;
pub mod seat;
pub mod spring;
pub mod state;
pub mod utils;
pub mod world;

pub use animation::{AnimationPlayer, ClipLibrary};
pub use avatar::{Avatar, AvatarId, AvatarSnapshot, ReferenceFrame};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AvatarConfig, WorldConfig};
pub use error::{AvatarError, ConfigError, ParseActionError, SeatError, SpringError};
pub use events::{AvatarEvent, CameraRequest, WorldEvent};
pub use input::Action;
pub use physics::{
    Iso, PhysicsBackend, Quat, Vec3,
    ground::{GroundHit, GroundProbe},
    rapier_world::{ColliderShapeDef, RapierWorld, WorldStaticDef},
};
pub use seat::{Seat, SeatId, SeatKind, SeatRegistry};
pub use spring::{RelativeSpringSimulator, SpringSimulator, VectorSpringSimulator};
pub use state::{StateKind, StateTag};
pub use world::World;
