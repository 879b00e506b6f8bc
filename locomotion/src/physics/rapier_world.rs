//! Rapier-backed physics world.
//!
//! Static level geometry is described by [`WorldStaticDef`] values and inserted once, in
//! `id` order, so two worlds built from the same defs are identical. Avatar capsules and
//! kinematic platforms are added afterwards.

use rapier3d::na::{Translation3, UnitQuaternion};
use rapier3d::prelude::*;

use super::{CapsuleSpec, PhysicsBackend, Point3, RayHit, Vec3, groups};

/// Canonical definition of an immutable world collider.
///
/// Conventions
/// - Units are meters.
/// - For planes the normal is derived from the pose: `normal = rotation * +Y`.
#[derive(Clone, Debug)]
pub struct WorldStaticDef {
    /// Stable unique identifier used to ensure deterministic insertion order.
    pub id: u32,
    pub translation: Vec3,
    pub rotation: UnitQuaternion<f32>,
    pub shape: ColliderShapeDef,
    /// Put the collider in the static-mesh group, which avatar capsules never collide
    /// with. Ground probes still hit it.
    pub trimesh: bool,
}

impl WorldStaticDef {
    /// Unrotated, non-mesh static at `translation`.
    pub fn new(id: u32, translation: Vec3, shape: ColliderShapeDef) -> Self {
        Self {
            id,
            translation,
            rotation: UnitQuaternion::identity(),
            shape,
            trimesh: false,
        }
    }

    pub fn pose(&self) -> Isometry<f32> {
        Isometry::from_parts(Translation3::from(self.translation), self.rotation)
    }
}

#[derive(Clone, Debug)]
pub enum ColliderShapeDef {
    /// Infinite half-space, offset along its normal (meters).
    Plane { offset_along_normal: f32 },
    Cuboid { half_extents: Vec3 },
    Sphere { radius: f32 },
    CapsuleY { radius: f32, half_height: f32 },
}

fn collider_from_def(def: &WorldStaticDef) -> Collider {
    let membership = if def.trimesh {
        groups::TRIMESH
    } else {
        groups::DEFAULT
    };
    let builder = match &def.shape {
        ColliderShapeDef::Plane {
            offset_along_normal,
        } => {
            // Local +Y; the parent body's pose rotates and places it.
            ColliderBuilder::new(SharedShape::new(HalfSpace::new(Vector::y_axis())))
                .translation(Vector::y() * *offset_along_normal)
        }
        ColliderShapeDef::Cuboid { half_extents } => {
            ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
        }
        ColliderShapeDef::Sphere { radius } => ColliderBuilder::ball(*radius),
        ColliderShapeDef::CapsuleY {
            radius,
            half_height,
        } => ColliderBuilder::capsule_y(*half_height, *radius),
    };
    builder
        .collision_groups(InteractionGroups::all().with_memberships(membership))
        .build()
}

pub struct RapierWorld {
    gravity: Vec3,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
}

impl RapierWorld {
    pub fn new(gravity: Vec3) -> Self {
        Self {
            gravity,
            integration_parameters: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
        }
    }

    /// Build a world containing `defs` as fixed bodies, ready for queries.
    ///
    /// The input is sorted by `id` before insertion.
    pub fn build(gravity: Vec3, mut defs: Vec<WorldStaticDef>) -> Self {
        defs.sort_by_key(|d| d.id);

        let mut world = Self::new(gravity);
        for def in &defs {
            world.insert_static(def);
        }
        world.refresh_queries();
        world
    }

    pub fn insert_static(&mut self, def: &WorldStaticDef) -> RigidBodyHandle {
        let body = RigidBodyBuilder::fixed().pose(def.pose()).build();
        let handle = self.bodies.insert(body);
        self.colliders
            .insert_with_parent(collider_from_def(def), handle, &mut self.bodies);
        handle
    }

    /// Insert a kinematic platform moving at `linvel`. Avatars standing on it inherit its
    /// point velocity.
    pub fn insert_platform(&mut self, def: &WorldStaticDef, linvel: Vec3) -> RigidBodyHandle {
        let body = RigidBodyBuilder::kinematic_velocity_based()
            .pose(def.pose())
            .linvel(linvel)
            .build();
        let handle = self.bodies.insert(body);
        self.colliders
            .insert_with_parent(collider_from_def(def), handle, &mut self.bodies);
        handle
    }

    /// Run collision detection only, so ray casts see colliders inserted since the last
    /// step.
    pub fn refresh_queries(&mut self) {
        let mut collision_pipeline = CollisionPipeline::new();
        collision_pipeline.step(
            0.0,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &(),
            &(),
        );
    }

    pub fn query_pipeline<'a>(&'a self, filter: QueryFilter<'a>) -> QueryPipeline<'a> {
        self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            filter,
        )
    }

    pub fn bodies(&self) -> &RigidBodySet {
        &self.bodies
    }

    pub fn colliders(&self) -> &ColliderSet {
        &self.colliders
    }
}

impl PhysicsBackend for RapierWorld {
    fn insert_avatar_body(
        &mut self,
        translation: Vec3,
        capsule: CapsuleSpec,
        groups: InteractionGroups,
    ) -> RigidBodyHandle {
        let body = RigidBodyBuilder::dynamic()
            .translation(translation)
            .lock_rotations()
            .can_sleep(false)
            .build();
        let handle = self.bodies.insert(body);
        let collider = ColliderBuilder::capsule_y(capsule.half_height, capsule.radius)
            .friction(0.0)
            .friction_combine_rule(CoefficientCombineRule::Min)
            .collision_groups(groups)
            .build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        handle
    }

    fn remove_body(&mut self, body: RigidBodyHandle) {
        self.bodies.remove(
            body,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            &(),
        );
    }

    fn cast_ray(
        &self,
        ray: &Ray,
        max_toi: f32,
        exclude: Option<RigidBodyHandle>,
        groups: InteractionGroups,
    ) -> Option<RayHit> {
        let mut filter = QueryFilter::default().groups(groups);
        if let Some(body) = exclude {
            filter = filter.exclude_rigid_body(body);
        }
        let (collider, hit) = self
            .query_pipeline(filter)
            .cast_ray_and_get_normal(ray, max_toi, true)?;
        Some(RayHit {
            point: ray.point_at(hit.time_of_impact).coords,
            normal: hit.normal,
            distance: hit.time_of_impact,
            body: self.colliders.get(collider).and_then(|c| c.parent()),
        })
    }

    fn translation(&self, body: RigidBodyHandle) -> Option<Vec3> {
        self.bodies.get(body).map(|b| *b.translation())
    }

    fn set_translation(&mut self, body: RigidBodyHandle, translation: Vec3) {
        if let Some(b) = self.bodies.get_mut(body) {
            b.set_translation(translation, true);
        }
    }

    fn linvel(&self, body: RigidBodyHandle) -> Option<Vec3> {
        self.bodies.get(body).map(|b| *b.linvel())
    }

    fn set_linvel(&mut self, body: RigidBodyHandle, linvel: Vec3) {
        if let Some(b) = self.bodies.get_mut(body) {
            b.set_linvel(linvel, true);
        }
    }

    fn velocity_at_point(&self, body: RigidBodyHandle, point: &Vec3) -> Option<Vec3> {
        self.bodies
            .get(body)
            .map(|b| b.velocity_at_point(&Point3::from(*point)))
    }

    fn set_enabled(&mut self, body: RigidBodyHandle, enabled: bool) {
        if let Some(b) = self.bodies.get_mut(body) {
            b.set_enabled(enabled);
        }
    }
}
