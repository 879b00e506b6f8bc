/*!
Physics collaborator seam.

The locomotion core never owns a physics world. It talks to one through
[`PhysicsBackend`], which covers exactly what the avatar needs:

- a capsule body per avatar (insert, remove, enable/disable)
- linear velocity and translation reads/writes on that body
- point velocity of whatever body the avatar stands on
- a filtered downward ray cast
- the fixed-rate step itself

[`rapier_world::RapierWorld`] is the production backend.
*/

pub mod bridge;
pub mod ground;
pub mod rapier_world;

#[cfg(test)]
pub(crate) mod mock;

use nalgebra as na;
use rapier3d::prelude::Group;

pub use rapier3d::prelude::{InteractionGroups, Ray, RigidBodyHandle};

/// Common math aliases for clarity and consistency.
pub type Vec3 = na::Vector3<f32>;
pub type Quat = na::UnitQuaternion<f32>;
pub type Iso = na::Isometry3<f32>;
pub type Point3 = na::Point3<f32>;

/// Capsule collision volume, Y-aligned, centered on the body translation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CapsuleSpec {
    /// Half the length of the cylindrical segment (meters).
    pub half_height: f32,
    pub radius: f32,
}

impl CapsuleSpec {
    /// Distance from the capsule center to its lowest point.
    #[inline]
    pub fn center_to_bottom(&self) -> f32 {
        self.half_height + self.radius
    }
}

/// Result of a ray cast against the physics world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub point: Vec3,
    pub normal: Vec3,
    /// Distance from the ray origin along its (unit) direction.
    pub distance: f32,
    /// Body owning the hit collider. `None` for parentless colliders.
    pub body: Option<RigidBodyHandle>,
}

/// Layered collision membership bits.
pub mod groups {
    use super::{Group, InteractionGroups};

    /// Ordinary level geometry.
    pub const DEFAULT: Group = Group::GROUP_1;
    /// Avatar capsules.
    pub const CHARACTERS: Group = Group::GROUP_2;
    /// Static triangle-mesh geometry. Avatar capsules never collide with it; the ground
    /// ray handles contact instead.
    pub const TRIMESH: Group = Group::GROUP_3;

    /// Groups for an avatar's own capsule collider.
    pub fn avatar_body() -> InteractionGroups {
        InteractionGroups::all()
            .with_memberships(CHARACTERS)
            .with_filter(Group::ALL.difference(TRIMESH))
    }

    /// Groups for the ground probe: level geometry only, never other avatars.
    pub fn ground_ray() -> InteractionGroups {
        InteractionGroups::all().with_filter(DEFAULT.union(TRIMESH))
    }
}

/// Everything the locomotion core needs from a physics engine.
///
/// Implementations treat unknown or removed handles as absent: reads return `None`
/// and writes are ignored.
pub trait PhysicsBackend {
    /// Insert a dynamic, rotation-locked capsule body at `translation`.
    fn insert_avatar_body(
        &mut self,
        translation: Vec3,
        capsule: CapsuleSpec,
        groups: InteractionGroups,
    ) -> RigidBodyHandle;

    fn remove_body(&mut self, body: RigidBodyHandle);

    /// Advance the simulation by one fixed step of `dt` seconds.
    fn step(&mut self, dt: f32);

    /// Cast `ray` up to `max_toi`, skipping `exclude` and colliders rejected by `groups`.
    fn cast_ray(
        &self,
        ray: &Ray,
        max_toi: f32,
        exclude: Option<RigidBodyHandle>,
        groups: InteractionGroups,
    ) -> Option<RayHit>;

    fn translation(&self, body: RigidBodyHandle) -> Option<Vec3>;

    fn set_translation(&mut self, body: RigidBodyHandle, translation: Vec3);

    fn linvel(&self, body: RigidBodyHandle) -> Option<Vec3>;

    fn set_linvel(&mut self, body: RigidBodyHandle, linvel: Vec3);

    /// Velocity of `body` at the world-space `point`. `None` if the body no longer exists.
    fn velocity_at_point(&self, body: RigidBodyHandle, point: &Vec3) -> Option<Vec3>;

    /// Disabled bodies are neither simulated nor hit by queries.
    fn set_enabled(&mut self, body: RigidBodyHandle, enabled: bool);
}
