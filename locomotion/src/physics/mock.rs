//! Deterministic flat-ground backend for unit tests.
//!
//! The ground is the plane y = 0 owned by handle index 0. Bodies integrate with
//! semi-implicit Euler and never sink below the plane.

use super::{
    CapsuleSpec, InteractionGroups, PhysicsBackend, Ray, RayHit, RigidBodyHandle, Vec3,
};
use crate::constants::GRAVITY_MPS2;

#[derive(Clone, Debug)]
struct MockBody {
    translation: Vec3,
    linvel: Vec3,
    bottom: f32,
    enabled: bool,
}

#[derive(Debug)]
pub(crate) struct FlatGround {
    bodies: Vec<Option<MockBody>>,
    /// Velocity reported for the ground body, as if it were a moving platform.
    pub ground_velocity: Vec3,
    /// When false the ground body reports no velocity, as if destroyed mid-step.
    pub ground_alive: bool,
    /// Normal reported by ground hits, as if the plane were a slope under the probe.
    pub ground_normal: Vec3,
    pub steps: usize,
}

impl FlatGround {
    pub(crate) fn new() -> Self {
        Self {
            bodies: Vec::new(),
            ground_velocity: Vec3::zeros(),
            ground_alive: true,
            ground_normal: Vec3::y(),
            steps: 0,
        }
    }

    pub(crate) fn ground_handle() -> RigidBodyHandle {
        RigidBodyHandle::from_raw_parts(0, 0)
    }

    pub(crate) fn is_enabled(&self, body: RigidBodyHandle) -> bool {
        self.get(body).is_some_and(|b| b.enabled)
    }

    fn slot(body: RigidBodyHandle) -> Option<usize> {
        let (index, _) = body.into_raw_parts();
        (index as usize).checked_sub(1)
    }

    fn get(&self, body: RigidBodyHandle) -> Option<&MockBody> {
        Self::slot(body).and_then(|i| self.bodies.get(i)).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, body: RigidBodyHandle) -> Option<&mut MockBody> {
        Self::slot(body)
            .and_then(|i| self.bodies.get_mut(i))
            .and_then(Option::as_mut)
    }
}

impl PhysicsBackend for FlatGround {
    fn insert_avatar_body(
        &mut self,
        translation: Vec3,
        capsule: CapsuleSpec,
        _groups: InteractionGroups,
    ) -> RigidBodyHandle {
        self.bodies.push(Some(MockBody {
            translation,
            linvel: Vec3::zeros(),
            bottom: capsule.center_to_bottom(),
            enabled: true,
        }));
        RigidBodyHandle::from_raw_parts(self.bodies.len() as u32, 0)
    }

    fn remove_body(&mut self, body: RigidBodyHandle) {
        if let Some(slot) = Self::slot(body).and_then(|i| self.bodies.get_mut(i)) {
            *slot = None;
        }
    }

    fn step(&mut self, dt: f32) {
        self.steps += 1;
        for body in self.bodies.iter_mut().flatten().filter(|b| b.enabled) {
            body.linvel.y -= GRAVITY_MPS2 * dt;
            body.translation += body.linvel * dt;
            if body.translation.y < body.bottom {
                body.translation.y = body.bottom;
                body.linvel.y = body.linvel.y.max(0.0);
            }
        }
    }

    fn cast_ray(
        &self,
        ray: &Ray,
        max_toi: f32,
        _exclude: Option<RigidBodyHandle>,
        _groups: InteractionGroups,
    ) -> Option<RayHit> {
        if ray.origin.y < 0.0 || ray.dir.y >= 0.0 {
            return None;
        }
        let distance = ray.origin.y / -ray.dir.y;
        if distance > max_toi {
            return None;
        }
        Some(RayHit {
            point: ray.origin.coords + ray.dir * distance,
            normal: self.ground_normal,
            distance,
            body: Some(Self::ground_handle()),
        })
    }

    fn translation(&self, body: RigidBodyHandle) -> Option<Vec3> {
        self.get(body).map(|b| b.translation)
    }

    fn set_translation(&mut self, body: RigidBodyHandle, translation: Vec3) {
        if let Some(b) = self.get_mut(body) {
            b.translation = translation;
        }
    }

    fn linvel(&self, body: RigidBodyHandle) -> Option<Vec3> {
        self.get(body).map(|b| b.linvel)
    }

    fn set_linvel(&mut self, body: RigidBodyHandle, linvel: Vec3) {
        if let Some(b) = self.get_mut(body) {
            b.linvel = linvel;
        }
    }

    fn velocity_at_point(&self, body: RigidBodyHandle, _point: &Vec3) -> Option<Vec3> {
        if body == Self::ground_handle() {
            return self.ground_alive.then_some(self.ground_velocity);
        }
        self.get(body).map(|b| b.linvel)
    }

    fn set_enabled(&mut self, body: RigidBodyHandle, enabled: bool) {
        if let Some(b) = self.get_mut(body) {
            b.enabled = enabled;
        }
    }
}
