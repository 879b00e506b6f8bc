/*!
Container that drives avatars, seats and a physics backend.

Each [`World::update`] accumulates the (scaled, clamped) frame delta and runs whole fixed
physics steps from it. Around every step the bridge probes the ground and blends the
avatars' arcade velocities into their bodies. The per-frame avatar logic runs once
afterwards, interpolating render positions by the leftover accumulator fraction.
*/

use std::collections::BTreeMap;

use crate::{
    animation::AnimationPlayer,
    avatar::{Avatar, AvatarId, AvatarSnapshot, ReferenceFrame},
    clock::Clock,
    config::{AvatarConfig, WorldConfig},
    error::{AvatarError, ConfigError},
    events::WorldEvent,
    input::Action,
    interaction,
    physics::{PhysicsBackend, Vec3, bridge},
    seat::{Seat, SeatId, SeatRegistry},
};

pub struct World<P: PhysicsBackend> {
    physics: P,
    config: WorldConfig,
    avatars: BTreeMap<AvatarId, Avatar>,
    seats: SeatRegistry,
    accumulator: f32,
    /// Interpolation factor of the last update, in [0, 1].
    alpha: f32,
    next_avatar_id: u32,
    events: Vec<WorldEvent>,
}

impl<P: PhysicsBackend> World<P> {
    pub fn new(physics: P, config: WorldConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            physics,
            config,
            avatars: BTreeMap::new(),
            seats: SeatRegistry::new(),
            accumulator: 0.0,
            alpha: 0.0,
            next_avatar_id: 0,
            events: Vec::new(),
        })
    }

    // --- Accessors ---

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn physics(&self) -> &P {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut P {
        &mut self.physics
    }

    pub fn seats(&self) -> &SeatRegistry {
        &self.seats
    }

    /// Move or re-tune seats. Occupants follow the seat pose on the next update.
    pub fn seats_mut(&mut self) -> &mut SeatRegistry {
        &mut self.seats
    }

    pub fn avatar(&self, id: AvatarId) -> Option<&Avatar> {
        self.avatars.get(&id)
    }

    pub fn avatars(&self) -> impl Iterator<Item = &Avatar> {
        self.avatars.values()
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    // --- Avatars ---

    /// Build an avatar with a fresh id and add it at `position`.
    pub fn spawn_avatar(
        &mut self,
        config: AvatarConfig,
        animation: Box<dyn AnimationPlayer>,
        position: Vec3,
    ) -> Result<AvatarId, AvatarError> {
        while self.avatars.contains_key(&AvatarId(self.next_avatar_id)) {
            self.next_avatar_id += 1;
        }
        let id = AvatarId(self.next_avatar_id);
        self.next_avatar_id += 1;

        let avatar = Avatar::new(id, config, animation, position)?;
        self.add(avatar);
        Ok(id)
    }

    /// Insert `avatar` and create its physics body.
    ///
    /// An avatar whose id is already present is dropped with a warning. Returns whether
    /// the avatar was added.
    pub fn add(&mut self, mut avatar: Avatar) -> bool {
        let id = avatar.id();
        if self.avatars.contains_key(&id) {
            log::warn!("{id} is already in the world, ignoring add");
            return false;
        }
        avatar.insert_into(&mut self.physics);
        self.avatars.insert(id, avatar);
        log::debug!("{id} added");
        true
    }

    /// Take `id` out of the world, freeing its seat and physics body.
    ///
    /// Removing an unknown id logs a warning and returns `None`.
    pub fn remove(&mut self, id: AvatarId) -> Option<Avatar> {
        let Some(mut avatar) = self.avatars.remove(&id) else {
            log::warn!("{id} is not in the world, ignoring remove");
            return None;
        };
        interaction::cancel(&mut avatar);
        avatar.leave_seat(&mut self.seats);
        avatar.remove_from(&mut self.physics);
        self.events.extend(
            avatar
                .drain_events()
                .map(|event| WorldEvent { avatar: id, event }),
        );
        log::debug!("{id} removed");
        Some(avatar)
    }

    /// Forward a named input to `id`. Unknown ids are ignored.
    pub fn trigger_action(&mut self, id: AvatarId, action: Action, pressed: bool) {
        if let Some(avatar) = self.avatars.get_mut(&id) {
            avatar.trigger_action(action, pressed, &self.seats);
        }
    }

    pub fn set_view_vector(&mut self, id: AvatarId, view: Vec3) {
        if let Some(avatar) = self.avatars.get_mut(&id) {
            avatar.set_view_vector(view);
        }
    }

    // --- Seats ---

    pub fn add_seat(&mut self, seat: Seat) -> SeatId {
        self.seats.insert(seat)
    }

    /// Remove a seat. Its occupant, if any, stands up on the next update.
    pub fn remove_seat(&mut self, id: SeatId) -> Option<Seat> {
        self.seats.remove(id)
    }

    // --- Frame ---

    /// Advance by the clock's delta.
    pub fn tick(&mut self, clock: &mut impl Clock) {
        self.update(clock.delta());
    }

    /// Advance the world by `dt` seconds of wall time.
    pub fn update(&mut self, dt: f32) {
        let dt = (dt.max(0.0) * self.config.time_scale).min(self.config.max_frame_dt);
        let fixed_dt = self.config.fixed_dt();
        self.accumulator += dt;

        let mut steps = 0;
        while self.accumulator >= fixed_dt && steps < self.config.max_sub_steps {
            for avatar in self.avatars.values_mut() {
                bridge::pre_step(avatar, &self.physics);
            }
            self.physics.step(fixed_dt);
            for avatar in self.avatars.values_mut() {
                bridge::post_step(avatar, &mut self.physics, self.config.physics_frame_rate);
            }
            self.accumulator -= fixed_dt;
            steps += 1;
        }
        if self.accumulator >= fixed_dt {
            log::debug!("dropping {:.3}s of physics backlog", self.accumulator);
            self.accumulator %= fixed_dt;
        }
        self.alpha = (self.accumulator / fixed_dt).clamp(0.0, 1.0);

        self.respawn_out_of_bounds();

        for (&id, avatar) in self.avatars.iter_mut() {
            avatar.update(dt, self.alpha, &mut self.physics, &mut self.seats);
            self.events
                .extend(avatar.drain_events().map(|event| WorldEvent { avatar: id, event }));
        }
    }

    fn respawn_out_of_bounds(&mut self) {
        let respawn_point = self.config.respawn_point;
        for avatar in self.avatars.values_mut() {
            if !avatar.is_physics_enabled() || avatar.frame() != ReferenceFrame::World {
                continue;
            }
            let Some(body) = avatar.body() else {
                continue;
            };
            let below = self
                .physics
                .translation(body)
                .is_some_and(|t| t.y < self.config.out_of_bounds_y);
            if below {
                avatar.respawn(respawn_point, &mut self.physics);
            }
        }
    }

    // --- Output ---

    pub fn snapshot(&self) -> Vec<AvatarSnapshot> {
        self.avatars.values().map(Avatar::snapshot).collect()
    }

    pub fn drain_events(&mut self) -> std::vec::Drain<'_, WorldEvent> {
        self.events.drain(..)
    }
}
