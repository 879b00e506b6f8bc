/*!
The controlled entity.

An [`Avatar`] owns its springs, input edges, active [`State`] and optional interaction
instance. It does not own its physics body; it keeps the handle and reaches the body
through the [`PhysicsBackend`] passed to each call.

Two writers share the avatar transform, and `physics_enabled` selects which one is live:
- physics sync (interpolated body translation, rotation from `orientation`)
- the seat frame (pose relative to a seat, resolved every frame)
*/

use std::fmt;

use crate::{
    animation::{AnimationPlayer, REQUIRED_CLIPS},
    config::AvatarConfig,
    constants::TILT_FACTOR,
    error::AvatarError,
    events::{AvatarEvent, CameraRequest},
    input::{Action, ActionStates},
    interaction::{self, InteractionInstance},
    physics::{Iso, PhysicsBackend, Quat, RigidBodyHandle, Vec3, ground::GroundHit},
    seat::{SeatId, SeatRegistry},
    spring::{RelativeSpringSimulator, VectorSpringSimulator},
    state::{self, State, StateKind, StateTag, machine},
    utils::{
        apply_vector_matrix_xz, flat_direction, forward_from_rotation, rotate_about_y,
        rotation_from_forward, signed_angle_between,
    },
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AvatarId(pub u32);

impl fmt::Display for AvatarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "avatar#{}", self.0)
    }
}

/// Frame the avatar transform is expressed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReferenceFrame {
    World,
    /// Pose is relative to the seat and resolved against its current world pose.
    Seat(SeatId),
}

/// Render/replication view of one avatar.
#[derive(Clone, Debug, PartialEq)]
pub struct AvatarSnapshot {
    pub id: AvatarId,
    pub position: Vec3,
    pub rotation: Quat,
    pub orientation: Vec3,
    pub animation: Option<String>,
    pub state: StateTag,
    pub seat: Option<SeatId>,
    pub physics_enabled: bool,
    /// Cosmetic lean about the forward axis (radians).
    pub tilt: f32,
}

pub struct Avatar {
    id: AvatarId,
    pub(crate) config: AvatarConfig,
    pub(crate) body: Option<RigidBodyHandle>,

    /// Render position (world space).
    pub(crate) position: Vec3,
    /// Body translation before the most recent physics step.
    pub(crate) previous_body_translation: Vec3,
    pub(crate) rotation: Quat,

    /// Flat unit forward vector and where the rotation spring is turning it.
    pub(crate) orientation: Vec3,
    pub(crate) orientation_target: Vec3,
    pub(crate) angular_velocity: f32,

    /// Avatar-local velocity (spring output) and its target.
    pub(crate) velocity: Vec3,
    pub(crate) velocity_target: Vec3,
    pub(crate) acceleration: Vec3,
    pub(crate) velocity_spring: VectorSpringSimulator,
    pub(crate) rotation_spring: RelativeSpringSimulator,

    pub(crate) arcade_velocity_influence: Vec3,
    pub(crate) arcade_velocity_is_additive: bool,

    pub(crate) ground: Option<GroundHit>,
    /// Last airborne body velocity, read by the landing selector.
    pub(crate) ground_impact_velocity: Vec3,
    pub(crate) wants_to_jump: bool,
    /// Explicit horizontal jump speed; `None` keeps the current momentum.
    pub(crate) init_jump_speed: Option<f32>,

    pub(crate) actions: ActionStates,
    /// Camera look direction used for camera-relative steering.
    pub(crate) view_vector: Vec3,

    pub(crate) state: State,
    pub(crate) interaction: Option<InteractionInstance>,
    pub(crate) seat: Option<SeatId>,
    pub(crate) frame: ReferenceFrame,
    pub(crate) local_pose: Iso,
    pub(crate) physics_enabled: bool,
    pub(crate) tilt: f32,

    pub(crate) animation: Box<dyn AnimationPlayer>,
    events: Vec<AvatarEvent>,
}

impl Avatar {
    /// Build an avatar at `position`, validating the config and every clip it will play.
    pub fn new(
        id: AvatarId,
        config: AvatarConfig,
        animation: Box<dyn AnimationPlayer>,
        position: Vec3,
    ) -> Result<Self, AvatarError> {
        config.validate()?;
        for &clip in REQUIRED_CLIPS {
            let usable = animation
                .clip_duration(clip)
                .is_some_and(|d| d.is_finite() && d > 0.0);
            if !usable {
                return Err(AvatarError::MissingClip { clip });
            }
        }

        let velocity_spring = VectorSpringSimulator::new(
            config.spring_frame_rate,
            config.velocity_spring_damping,
            config.velocity_spring_mass,
        )?;
        let rotation_spring = RelativeSpringSimulator::new(
            config.spring_frame_rate,
            config.rotation_spring_damping,
            config.rotation_spring_mass,
        )?;

        let mut avatar = Self {
            id,
            config,
            body: None,
            position,
            previous_body_translation: position,
            rotation: Quat::identity(),
            orientation: Vec3::z(),
            orientation_target: Vec3::z(),
            angular_velocity: 0.0,
            velocity: Vec3::zeros(),
            velocity_target: Vec3::zeros(),
            acceleration: Vec3::zeros(),
            velocity_spring,
            rotation_spring,
            arcade_velocity_influence: Vec3::new(1.0, 0.0, 1.0),
            arcade_velocity_is_additive: false,
            ground: None,
            ground_impact_velocity: Vec3::zeros(),
            wants_to_jump: false,
            init_jump_speed: None,
            actions: ActionStates::default(),
            view_vector: Vec3::z(),
            state: State::new(StateKind::Idle),
            interaction: None,
            seat: None,
            frame: ReferenceFrame::World,
            local_pose: Iso::identity(),
            physics_enabled: true,
            tilt: 0.0,
            animation,
            events: Vec::new(),
        };
        avatar.state = state::enter(&mut avatar, StateKind::Idle);
        Ok(avatar)
    }

    // --- Accessors ---

    #[inline]
    pub fn id(&self) -> AvatarId {
        self.id
    }

    pub fn config(&self) -> &AvatarConfig {
        &self.config
    }

    pub fn body(&self) -> Option<RigidBodyHandle> {
        self.body
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn orientation(&self) -> Vec3 {
        self.orientation
    }

    pub fn orientation_target(&self) -> Vec3 {
        self.orientation_target
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn velocity_target(&self) -> Vec3 {
        self.velocity_target
    }

    pub fn acceleration(&self) -> Vec3 {
        self.acceleration
    }

    pub fn angular_velocity(&self) -> f32 {
        self.angular_velocity
    }

    pub fn arcade_velocity_influence(&self) -> Vec3 {
        self.arcade_velocity_influence
    }

    pub fn is_arcade_velocity_additive(&self) -> bool {
        self.arcade_velocity_is_additive
    }

    pub fn ground(&self) -> Option<&GroundHit> {
        self.ground.as_ref()
    }

    pub fn ground_impact_velocity(&self) -> Vec3 {
        self.ground_impact_velocity
    }

    pub fn wants_to_jump(&self) -> bool {
        self.wants_to_jump
    }

    pub fn actions(&self) -> &ActionStates {
        &self.actions
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn state_tag(&self) -> StateTag {
        self.state.tag()
    }

    pub fn interaction(&self) -> Option<&InteractionInstance> {
        self.interaction.as_ref()
    }

    /// Seat currently occupied, if any.
    pub fn seat(&self) -> Option<SeatId> {
        self.seat
    }

    pub fn frame(&self) -> ReferenceFrame {
        self.frame
    }

    pub fn is_physics_enabled(&self) -> bool {
        self.physics_enabled
    }

    pub fn tilt(&self) -> f32 {
        self.tilt
    }

    pub fn animation(&self) -> &dyn AnimationPlayer {
        self.animation.as_ref()
    }

    pub fn snapshot(&self) -> AvatarSnapshot {
        AvatarSnapshot {
            id: self.id,
            position: self.position,
            rotation: self.rotation,
            orientation: self.orientation,
            animation: self.animation.current_clip().map(str::to_owned),
            state: self.state.tag(),
            seat: self.seat,
            physics_enabled: self.physics_enabled,
            tilt: self.tilt,
        }
    }

    // --- Input ---

    pub fn set_view_vector(&mut self, view: Vec3) {
        if let Some(flat) = flat_direction(&view) {
            self.view_vector = flat;
        }
    }

    /// Feed one named boolean. Only changes reach the active state.
    pub fn trigger_action(&mut self, action: Action, pressed: bool, seats: &SeatRegistry) {
        if !self.actions.apply(action, pressed) {
            return;
        }
        machine::on_input_change(self, seats);
        self.actions.clear_edges(action);
    }

    /// Release every action without notifying the state.
    pub(crate) fn reset_controls(&mut self) {
        self.actions.reset();
    }

    // --- Frame update ---

    /// Per-frame logic: interaction, state, springs, cosmetics, animation, transform sync.
    ///
    /// `alpha` is the fraction of a physics step left in the accumulator, used to
    /// interpolate the render position.
    pub fn update(
        &mut self,
        dt: f32,
        alpha: f32,
        physics: &mut dyn PhysicsBackend,
        seats: &mut SeatRegistry,
    ) {
        if self.interaction.is_some() {
            interaction::update(self, physics, seats);
        }
        machine::update(self, dt, physics, seats);

        if self.physics_enabled {
            self.spring_movement(dt);
            self.spring_rotation(dt);
            self.rotate_model();
        }
        self.animation.update(dt);
        self.sync_transform(alpha, physics, seats);
    }

    fn spring_movement(&mut self, dt: f32) {
        self.velocity_spring.target = self.velocity_target;
        self.velocity_spring.simulate(dt);
        self.velocity = self.velocity_spring.position;
        self.acceleration = self.velocity_spring.velocity;
    }

    fn spring_rotation(&mut self, dt: f32) {
        let angle = signed_angle_between(&self.orientation, &self.orientation_target);
        self.rotation_spring.target = angle;
        self.rotation_spring.simulate(dt);
        let turned = rotate_about_y(&self.orientation, self.rotation_spring.position);
        self.orientation = flat_direction(&turned).unwrap_or(self.orientation);
        self.angular_velocity = self.rotation_spring.velocity;
    }

    fn rotate_model(&mut self) {
        self.rotation = rotation_from_forward(&self.orientation);
        self.tilt = -self.angular_velocity * TILT_FACTOR * self.velocity.norm();
    }

    fn sync_transform(&mut self, alpha: f32, physics: &mut dyn PhysicsBackend, seats: &SeatRegistry) {
        if self.physics_enabled {
            if let Some(current) = self.body.and_then(|b| physics.translation(b)) {
                self.position = self.previous_body_translation.lerp(&current, alpha);
            }
            return;
        }
        let ReferenceFrame::Seat(seat_id) = self.frame else {
            return;
        };
        let Some(seat) = seats.get(seat_id) else {
            return;
        };
        let world = seat.pose * self.local_pose;
        self.position = world.translation.vector;
        self.rotation = world.rotation;
        if let Some(body) = self.body {
            physics.set_translation(body, self.position);
        }
    }

    // --- Motion intent ---

    /// Set the forward velocity target in avatar-local units.
    pub(crate) fn set_arcade_velocity_target(&mut self, forward: f32) {
        self.velocity_target = Vec3::new(0.0, 0.0, forward);
    }

    pub(crate) fn set_arcade_velocity_influence(&mut self, x: f32, y: f32, z: f32) {
        self.arcade_velocity_influence = Vec3::new(x, y, z);
    }

    /// Turn toward `direction` (flattened). Degenerate directions are ignored.
    pub fn set_orientation(&mut self, direction: &Vec3, instantly: bool) {
        let Some(look) = flat_direction(direction) else {
            return;
        };
        self.orientation_target = look;
        if instantly {
            self.orientation = look;
        }
    }

    /// Held directions mapped through the camera's flat view vector into world space.
    pub fn camera_relative_movement_vector(&self) -> Vec3 {
        apply_vector_matrix_xz(&self.view_vector, &self.actions.local_direction())
    }

    /// Steer toward the camera-relative input, or hold the current heading without input.
    ///
    /// Ignored while homing toward a seat; the approach owns the heading then.
    pub(crate) fn set_camera_relative_orientation_target(&mut self) {
        if self.interaction.is_some() {
            return;
        }
        let movement = self.camera_relative_movement_vector();
        if movement == Vec3::zeros() {
            self.orientation_target = self.orientation;
        } else {
            self.set_orientation(&movement, false);
        }
    }

    /// Request a jump on the next post-step.
    pub(crate) fn jump(&mut self, init_speed: Option<f32>) {
        self.wants_to_jump = true;
        self.init_jump_speed = init_speed;
    }

    pub(crate) fn play_animation(&mut self, clip: &str, fade_in: f32) -> Option<f32> {
        self.animation.play(clip, fade_in)
    }

    pub(crate) fn set_state(&mut self, kind: StateKind) {
        let from = self.state.tag();
        self.state = state::enter(self, kind);
        log::debug!("{}: {:?} -> {:?}", self.id, from, self.state.tag());
    }

    /// True if whatever the avatar stands on is moving at the contact point.
    pub(crate) fn is_ground_moving(&self, physics: &dyn PhysicsBackend) -> bool {
        self.ground
            .as_ref()
            .and_then(|hit| hit.point_velocity(physics))
            .is_some_and(|v| v.norm_squared() > 0.0)
    }

    // --- Resets ---

    pub(crate) fn reset_velocity(&mut self, physics: &mut dyn PhysicsBackend) {
        self.reset_springs();
        if let Some(body) = self.body {
            physics.set_linvel(body, Vec3::zeros());
        }
    }

    fn reset_springs(&mut self) {
        self.velocity = Vec3::zeros();
        self.velocity_target = Vec3::zeros();
        self.acceleration = Vec3::zeros();
        self.velocity_spring.init();
        self.rotation_spring.init();
        self.angular_velocity = 0.0;
    }

    /// Snap orientation and its target to the model's current facing.
    pub(crate) fn reset_orientation(&mut self) {
        let forward = forward_from_rotation(&self.rotation);
        self.set_orientation(&forward, true);
    }

    // --- Physics body ---

    pub(crate) fn set_physics_enabled(&mut self, enabled: bool, physics: &mut dyn PhysicsBackend) {
        self.physics_enabled = enabled;
        if let Some(body) = self.body {
            physics.set_enabled(body, enabled);
        }
    }

    /// Create the avatar's body at its current position and probe the ground once.
    pub(crate) fn insert_into(&mut self, physics: &mut dyn PhysicsBackend) {
        let body =
            physics.insert_avatar_body(self.position, self.config.capsule, self.config.body_groups);
        self.body = Some(body);
        self.previous_body_translation = self.position;
        if !self.physics_enabled {
            physics.set_enabled(body, false);
        }
        self.ground = self.config.ground_probe().probe(&*physics, body);
    }

    pub(crate) fn remove_from(&mut self, physics: &mut dyn PhysicsBackend) {
        if let Some(body) = self.body.take() {
            physics.remove_body(body);
        }
        self.ground = None;
    }

    /// Teleport to `position` with zero velocity and start falling.
    pub(crate) fn respawn(&mut self, position: Vec3, physics: &mut dyn PhysicsBackend) {
        if let Some(body) = self.body {
            physics.set_translation(body, position);
        }
        self.reset_velocity(physics);
        self.position = position;
        self.previous_body_translation = position;
        interaction::cancel(self);
        self.ground = None;
        self.wants_to_jump = false;
        self.set_state(StateKind::Falling);
        log::info!("{} respawned at {:?}", self.id, position);
        self.push_event(AvatarEvent::Respawned { position });
    }

    // --- Seats ---

    /// Hand the transform over to `seat_id`'s frame, placing the avatar on the seat point.
    pub(crate) fn attach_to_seat(
        &mut self,
        seat_id: SeatId,
        seat_pose: &Iso,
        seat_point: &Iso,
        physics: &mut dyn PhysicsBackend,
    ) {
        self.reset_controls();
        self.reset_velocity(physics);
        self.tilt = 0.0;
        self.set_physics_enabled(false, physics);

        let start_rotation = seat_pose.rotation.inverse() * self.rotation;
        self.frame = ReferenceFrame::Seat(seat_id);
        self.local_pose = Iso::from_parts(seat_point.translation, start_rotation);
        self.push_event(AvatarEvent::Camera(CameraRequest::FocusSeat(seat_id)));
    }

    /// Return to the world frame at `position`, physics on, with the body moving at `linvel`.
    pub(crate) fn detach_from_seat(
        &mut self,
        position: Vec3,
        linvel: Vec3,
        physics: &mut dyn PhysicsBackend,
    ) {
        self.frame = ReferenceFrame::World;
        self.local_pose = Iso::identity();
        self.position = position;
        self.previous_body_translation = position;
        self.set_physics_enabled(true, physics);
        if let Some(body) = self.body {
            physics.set_translation(body, position);
            physics.set_linvel(body, linvel);
        }
        self.reset_springs();
        self.reset_orientation();
        self.ground = self
            .body
            .and_then(|body| self.config.ground_probe().probe(&*physics, body));
        self.push_event(AvatarEvent::Camera(CameraRequest::FollowAvatar));
    }

    pub(crate) fn occupy_seat(&mut self, seat: SeatId) {
        self.seat = Some(seat);
        log::info!("{} sat down in {:?}", self.id, seat);
        self.push_event(AvatarEvent::SeatOccupancyChanged {
            seat,
            occupant: Some(self.id),
        });
    }

    /// Give up the occupied seat, if any.
    pub(crate) fn leave_seat(&mut self, seats: &mut SeatRegistry) {
        let Some(seat) = self.seat.take() else {
            return;
        };
        match seats.release(seat, self.id) {
            Ok(true) => {
                log::info!("{} left {:?}", self.id, seat);
                self.push_event(AvatarEvent::SeatOccupancyChanged {
                    seat,
                    occupant: None,
                });
            }
            Ok(false) => {}
            Err(err) => log::warn!("{}: {err}", self.id),
        }
    }

    // --- Events ---

    pub(crate) fn push_event(&mut self, event: AvatarEvent) {
        self.events.push(event);
    }

    pub fn drain_events(&mut self) -> std::vec::Drain<'_, AvatarEvent> {
        self.events.drain(..)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::{animation::ClipLibrary, physics::mock::FlatGround};

    /// Hover height of a grounded avatar with the default config.
    pub(crate) const STANDING_Y: f32 = 0.57;

    pub(crate) fn avatar(id: u32) -> Avatar {
        Avatar::new(
            AvatarId(id),
            AvatarConfig::default(),
            Box::new(ClipLibrary::standard()),
            Vec3::new(0.0, STANDING_Y, 0.0),
        )
        .expect("default avatar")
    }

    pub(crate) fn standing(physics: &mut FlatGround) -> Avatar {
        let mut avatar = avatar(1);
        avatar.insert_into(physics);
        avatar
    }
}
