use super::{InteractionGroups, PhysicsBackend, Point3, Ray, RigidBodyHandle, Vec3};

/// Standing surface found under an avatar.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundHit {
    pub point: Vec3,
    pub normal: Vec3,
    /// Body the avatar stands on, used to inherit platform velocity.
    pub body: Option<RigidBodyHandle>,
}

impl GroundHit {
    /// Velocity of the supporting body at the hit point.
    ///
    /// `None` for parentless colliders and bodies removed since the probe.
    pub fn point_velocity<P: PhysicsBackend + ?Sized>(&self, physics: &P) -> Option<Vec3> {
        physics.velocity_at_point(self.body?, &self.point)
    }
}

/// Downward ray from the capsule center.
///
/// The ray is `ray_cast_length + ray_safe_offset` long. A grounded body hovers at
/// `ray_cast_length` above the hit point, so the safe offset is the slack that keeps
/// contact through small bumps and the gravity drift of a single step.
#[derive(Clone, Copy, Debug)]
pub struct GroundProbe {
    pub ray_cast_length: f32,
    pub ray_safe_offset: f32,
    pub groups: InteractionGroups,
}

impl GroundProbe {
    #[inline]
    pub fn max_distance(&self) -> f32 {
        self.ray_cast_length + self.ray_safe_offset
    }

    /// Probe below `body`'s current translation. A missing body reports no ground.
    pub fn probe<P: PhysicsBackend + ?Sized>(
        &self,
        physics: &P,
        body: RigidBodyHandle,
    ) -> Option<GroundHit> {
        let origin = physics.translation(body)?;
        self.probe_from(physics, origin, Some(body))
    }

    /// Probe straight down from an arbitrary world position.
    pub fn probe_from<P: PhysicsBackend + ?Sized>(
        &self,
        physics: &P,
        origin: Vec3,
        exclude: Option<RigidBodyHandle>,
    ) -> Option<GroundHit> {
        let ray = Ray::new(Point3::from(origin), -Vec3::y());
        physics
            .cast_ray(&ray, self.max_distance(), exclude, self.groups)
            .map(|hit| GroundHit {
                point: hit.point,
                normal: hit.normal,
                body: hit.body,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{CapsuleSpec, groups, mock::FlatGround};

    fn probe() -> GroundProbe {
        GroundProbe {
            ray_cast_length: 0.57,
            ray_safe_offset: 0.03,
            groups: groups::ground_ray(),
        }
    }

    fn capsule() -> CapsuleSpec {
        CapsuleSpec {
            half_height: 0.25,
            radius: 0.25,
        }
    }

    #[test]
    fn hits_ground_within_ray_length() {
        let mut physics = FlatGround::new();
        let body = physics.insert_avatar_body(
            Vec3::new(1.0, 0.58, -2.0),
            capsule(),
            groups::avatar_body(),
        );

        let hit = probe().probe(&physics, body).expect("ground below");
        assert!((hit.point - Vec3::new(1.0, 0.0, -2.0)).norm() < 1.0e-5);
        assert_eq!(hit.normal, Vec3::y());
        assert_eq!(hit.body, Some(FlatGround::ground_handle()));
    }

    #[test]
    fn misses_ground_beyond_safe_offset() {
        let mut physics = FlatGround::new();
        let body =
            physics.insert_avatar_body(Vec3::new(0.0, 0.61, 0.0), capsule(), groups::avatar_body());
        assert_eq!(probe().probe(&physics, body), None);
    }

    #[test]
    fn probing_twice_without_moving_is_identical() {
        let mut physics = FlatGround::new();
        let body =
            physics.insert_avatar_body(Vec3::new(0.0, 0.55, 0.0), capsule(), groups::avatar_body());
        let first = probe().probe(&physics, body);
        let second = probe().probe(&physics, body);
        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[test]
    fn removed_body_reports_no_ground() {
        let mut physics = FlatGround::new();
        let body =
            physics.insert_avatar_body(Vec3::new(0.0, 0.55, 0.0), capsule(), groups::avatar_body());
        physics.remove_body(body);
        assert_eq!(probe().probe(&physics, body), None);
    }

    #[test]
    fn point_velocity_vanishes_with_the_platform() {
        let mut physics = FlatGround::new();
        physics.ground_velocity = Vec3::new(2.0, 0.0, 0.0);
        let body =
            physics.insert_avatar_body(Vec3::new(0.0, 0.57, 0.0), capsule(), groups::avatar_body());
        let hit = probe().probe(&physics, body).expect("ground below");
        assert_eq!(hit.point_velocity(&physics), Some(Vec3::new(2.0, 0.0, 0.0)));

        physics.ground_alive = false;
        assert_eq!(hit.point_velocity(&physics), None);
    }
}
