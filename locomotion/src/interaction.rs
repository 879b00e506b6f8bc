//! Walking to a seat's entry point before sitting down.

use crate::{
    avatar::Avatar,
    constants::{SEAT_APPROACH_HEIGHT_TOLERANCE, SEAT_APPROACH_PLANAR_DISTANCE},
    input::Action,
    physics::{Iso, PhysicsBackend},
    seat::{SeatId, SeatKind, SeatRegistry, SeatTarget},
    state::{Capability, SeatTransition, StateKind},
    utils::planar_distance_sq,
};

/// Seat the avatar is currently walking toward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InteractionInstance {
    pub seat: SeatId,
    pub entry_point: usize,
    /// The approach pressed "up" itself. False when the player already held it.
    pub synthetic_forward: bool,
}

impl From<SeatTarget> for InteractionInstance {
    fn from(target: SeatTarget) -> Self {
        Self {
            seat: target.seat,
            entry_point: target.entry_point,
            synthetic_forward: false,
        }
    }
}

/// Pick the nearest free seat of `kind` in range and start approaching it.
///
/// Returns false if nothing is in range; that is not an error.
pub(crate) fn begin(avatar: &mut Avatar, seats: &SeatRegistry, kind: SeatKind) -> bool {
    let radius = avatar.config.seat_search_radius;
    let Some(target) = seats.find_nearest(&avatar.position, kind, radius) else {
        log::debug!("{}: no free {kind:?} seat within {radius} m", avatar.id());
        return false;
    };
    log::debug!(
        "{}: approaching {:?} via entry point {}",
        avatar.id(),
        target.seat,
        target.entry_point
    );
    avatar.interaction = Some(target.into());
    true
}

/// Abandon the approach and drop its synthetic forward press without notifying the state.
pub(crate) fn cancel(avatar: &mut Avatar) {
    let Some(instance) = avatar.interaction.take() else {
        return;
    };
    log::debug!("{}: cancelled approach to {:?}", avatar.id(), instance.seat);
    if instance.synthetic_forward {
        avatar.actions.release_silently(Action::Up);
    }
}

/// Steer toward the entry point and sit down once close enough.
pub(crate) fn update(avatar: &mut Avatar, physics: &mut dyn PhysicsBackend, seats: &SeatRegistry) {
    let Some(instance) = avatar.interaction else {
        return;
    };
    let target = seats
        .get(instance.seat)
        .filter(|seat| seat.is_free())
        .and_then(|seat| {
            let entry = seat.world_entry_point(instance.entry_point)?;
            Some((seat.pose, seat.seat_point, entry))
        });
    let Some((seat_pose, seat_point, entry)) = target else {
        log::debug!(
            "{}: {:?} is gone or taken, giving up",
            avatar.id(),
            instance.seat
        );
        avatar.interaction = None;
        if instance.synthetic_forward {
            avatar.trigger_action(Action::Up, false, seats);
        }
        return;
    };

    let entry_position = entry.translation.vector;
    let to_entry = entry_position - avatar.position;
    avatar.set_orientation(&to_entry, false);

    let close = planar_distance_sq(&avatar.position, &entry_position)
        < SEAT_APPROACH_PLANAR_DISTANCE * SEAT_APPROACH_PLANAR_DISTANCE
        && to_entry.y.abs() < SEAT_APPROACH_HEIGHT_TOLERANCE;
    if close && avatar.state.can(Capability::EnterChairs) {
        enter_seat(avatar, instance, &seat_pose, &seat_point, physics);
    }
}

fn enter_seat(
    avatar: &mut Avatar,
    instance: InteractionInstance,
    seat_pose: &Iso,
    seat_point: &Iso,
    physics: &mut dyn PhysicsBackend,
) {
    avatar.interaction = None;
    avatar.attach_to_seat(instance.seat, seat_pose, seat_point, physics);
    let transition = SeatTransition {
        seat: instance.seat,
        entry_point: instance.entry_point,
        start_rotation: avatar.local_pose.rotation,
        end_rotation: seat_point.rotation,
    };
    avatar.set_state(StateKind::EnteringChair(transition));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        avatar::{AvatarId, ReferenceFrame, testing},
        events::{AvatarEvent, CameraRequest},
        physics::{Vec3, mock::FlatGround},
        seat::Seat,
        state::StateTag,
    };

    fn chair_at(z: f32) -> Seat {
        Seat::new(
            SeatKind::Primary,
            Iso::translation(0.0, 0.0, z),
            Iso::translation(0.0, 0.45, 0.0),
            vec![Iso::translation(0.0, 0.0, -1.0)],
        )
    }

    #[test]
    fn begin_records_nearest_target() {
        let mut seats = SeatRegistry::new();
        let id = seats.insert(chair_at(3.0));
        let mut avatar = testing::avatar(1);

        assert!(begin(&mut avatar, &seats, SeatKind::Primary));
        assert_eq!(
            avatar.interaction(),
            Some(&InteractionInstance {
                seat: id,
                entry_point: 0,
                synthetic_forward: false,
            })
        );
        assert!(!begin(&mut avatar, &seats, SeatKind::Passenger));
    }

    #[test]
    fn approach_turns_toward_entry_point() {
        let mut physics = FlatGround::new();
        let mut seats = SeatRegistry::new();
        seats.insert(Seat::new(
            SeatKind::Primary,
            Iso::translation(4.0, 0.0, 0.0),
            Iso::translation(0.0, 0.45, 0.0),
            vec![Iso::identity()],
        ));
        let mut avatar = testing::standing(&mut physics);
        begin(&mut avatar, &seats, SeatKind::Primary);

        update(&mut avatar, &mut physics, &seats);
        assert!((avatar.orientation_target() - Vec3::x()).norm() < 1.0e-5);
        assert_eq!(avatar.orientation(), Vec3::z());
    }

    #[test]
    fn close_enough_but_not_allowed_never_enters() {
        let mut physics = FlatGround::new();
        let mut seats = SeatRegistry::new();
        seats.insert(chair_at(1.05));
        let mut avatar = testing::standing(&mut physics);
        begin(&mut avatar, &seats, SeatKind::Primary);
        assert!(!avatar.state().can(Capability::EnterChairs));

        for _ in 0..10 {
            update(&mut avatar, &mut physics, &seats);
        }
        assert_eq!(avatar.state_tag(), StateTag::Idle);
        assert!(avatar.interaction().is_some());
        assert!(avatar.is_physics_enabled());
    }

    #[test]
    fn reaching_entry_point_while_walking_attaches_to_seat() {
        let mut physics = FlatGround::new();
        let mut seats = SeatRegistry::new();
        let id = seats.insert(chair_at(1.05));
        let mut avatar = testing::standing(&mut physics);
        begin(&mut avatar, &seats, SeatKind::Primary);
        avatar.set_state(StateKind::Walk);

        update(&mut avatar, &mut physics, &seats);

        assert_eq!(avatar.state_tag(), StateTag::EnteringChair);
        assert_eq!(avatar.interaction(), None);
        assert_eq!(avatar.frame(), ReferenceFrame::Seat(id));
        assert!(!avatar.is_physics_enabled());
        assert!(!physics.is_enabled(avatar.body().unwrap()));
        assert_eq!(avatar.velocity(), Vec3::zeros());
        assert_eq!(
            avatar.drain_events().collect::<Vec<_>>(),
            vec![AvatarEvent::Camera(CameraRequest::FocusSeat(id))]
        );
    }

    #[test]
    fn taken_seat_aborts_approach_and_releases_forward() {
        let mut physics = FlatGround::new();
        let mut seats = SeatRegistry::new();
        let id = seats.insert(chair_at(5.0));
        let mut avatar = testing::standing(&mut physics);
        avatar.trigger_action(Action::Enter, true, &seats);
        assert_eq!(avatar.state_tag(), StateTag::Walk);
        assert!(avatar.actions().is_pressed(Action::Up));

        seats.occupy(id, AvatarId(2)).unwrap();
        update(&mut avatar, &mut physics, &seats);

        assert_eq!(avatar.interaction(), None);
        assert!(!avatar.actions().is_pressed(Action::Up));
        assert_eq!(avatar.state_tag(), StateTag::Idle);
    }

    #[test]
    fn taken_seat_keeps_forward_the_player_was_holding() {
        let mut physics = FlatGround::new();
        let mut seats = SeatRegistry::new();
        let id = seats.insert(chair_at(5.0));
        let mut avatar = testing::standing(&mut physics);
        avatar.trigger_action(Action::Up, true, &seats);
        avatar.trigger_action(Action::Enter, true, &seats);
        assert!(avatar.interaction().is_some_and(|i| !i.synthetic_forward));

        seats.occupy(id, AvatarId(2)).unwrap();
        update(&mut avatar, &mut physics, &seats);

        assert_eq!(avatar.interaction(), None);
        assert!(avatar.actions().is_pressed(Action::Up));
        assert_eq!(avatar.state_tag(), StateTag::Walk);
    }

    #[test]
    fn cancel_releases_only_synthetic_forward() {
        let mut seats = SeatRegistry::new();
        seats.insert(chair_at(5.0));

        let mut avatar = testing::avatar(1);
        avatar.trigger_action(Action::Enter, true, &seats);
        assert!(avatar.interaction().is_some_and(|i| i.synthetic_forward));
        cancel(&mut avatar);
        assert!(!avatar.actions().is_pressed(Action::Up));

        let mut avatar = testing::avatar(2);
        avatar.trigger_action(Action::Up, true, &seats);
        avatar.trigger_action(Action::Enter, true, &seats);
        cancel(&mut avatar);
        assert_eq!(avatar.interaction(), None);
        assert!(avatar.actions().is_pressed(Action::Up));
    }
}
