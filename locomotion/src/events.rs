//! Signals the core emits for its collaborators (UI, camera, replication).
//!
//! Avatars queue events while they update; the world drains them into a single outbox
//! tagged with the emitting avatar.

use crate::{avatar::AvatarId, physics::Vec3, seat::SeatId};

/// Camera behaviour the avatar asks for. Placement itself is up to the camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CameraRequest {
    /// Frame the seat the avatar just sat down in.
    FocusSeat(SeatId),
    FollowAvatar,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AvatarEvent {
    SeatOccupancyChanged {
        seat: SeatId,
        occupant: Option<AvatarId>,
    },
    Camera(CameraRequest),
    Respawned {
        position: Vec3,
    },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldEvent {
    pub avatar: AvatarId,
    pub event: AvatarEvent,
}
