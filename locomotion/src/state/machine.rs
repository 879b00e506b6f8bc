//! Per-frame updates and input reactions of each state.

use crate::{
    avatar::Avatar,
    constants::*,
    input::Action,
    interaction,
    physics::{PhysicsBackend, Quat, Vec3},
    seat::{SeatId, SeatKind, SeatRegistry},
    utils::{ease_in_out_sine, forward_from_rotation, rotation_from_forward},
};

use super::{Capability, Emote, SeatTransition, StateKind, landing::select_landing_state};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Consumed,
}

// --- Frame update ---

pub(crate) fn update(
    avatar: &mut Avatar,
    dt: f32,
    physics: &mut dyn PhysicsBackend,
    seats: &mut SeatRegistry,
) {
    avatar.state.timer += dt;
    let kind = avatar.state.kind;

    if kind.falls_in_air() && avatar.ground.is_none() {
        avatar.set_state(StateKind::Falling);
        return;
    }

    match kind {
        StateKind::Idle | StateKind::Emote(_) => {}
        StateKind::Walk | StateKind::Sprint => avatar.set_camera_relative_orientation_target(),
        StateKind::EndWalk => {
            if avatar.state.animation_ended(dt) {
                avatar.set_state(StateKind::Idle);
            }
        }
        StateKind::JumpIdle { already_jumped } => {
            update_jump_idle(avatar, dt, already_jumped, physics)
        }
        StateKind::JumpRunning { already_jumped } => {
            update_jump_running(avatar, dt, already_jumped)
        }
        StateKind::Falling => {
            avatar.set_camera_relative_orientation_target();
            set_velocity_target_from_input(avatar);
            if avatar.ground.is_some() {
                land(avatar);
            }
        }
        StateKind::DropIdle | StateKind::DropRunning | StateKind::DropRolling => {
            avatar.set_camera_relative_orientation_target();
            if avatar.state.animation_ended(dt) {
                let next = if avatar.actions.any_direction() {
                    StateKind::Walk
                } else {
                    StateKind::Idle
                };
                avatar.set_state(next);
            }
        }
        StateKind::EnteringChair(transition) => {
            update_entering_chair(avatar, dt, transition, physics, seats)
        }
        StateKind::Sitting { seat, entry_point } => {
            if seats.get(seat).is_none() {
                log::warn!("{}: {seat:?} disappeared while seated", avatar.id());
                avatar.seat = None;
                stand_up(avatar, seat, entry_point, physics, seats);
            }
        }
        StateKind::ExitingChair(transition) => {
            update_exiting_chair(avatar, dt, transition, physics, seats)
        }
    }
}

fn set_velocity_target_from_input(avatar: &mut Avatar) {
    let target = if avatar.actions.any_direction() {
        WALK_VELOCITY_TARGET
    } else {
        0.0
    };
    avatar.set_arcade_velocity_target(target);
}

fn land(avatar: &mut Avatar) {
    let next = select_landing_state(
        avatar.ground_impact_velocity.y,
        avatar.actions.any_direction(),
        avatar.actions.is_pressed(Action::Run),
    );
    avatar.set_state(next);
}

fn mark_jumped(avatar: &mut Avatar) {
    match &mut avatar.state.kind {
        StateKind::JumpIdle { already_jumped } | StateKind::JumpRunning { already_jumped } => {
            *already_jumped = true
        }
        _ => {}
    }
}

fn update_jump_idle(
    avatar: &mut Avatar,
    dt: f32,
    already_jumped: bool,
    physics: &dyn PhysicsBackend,
) {
    if already_jumped {
        avatar.set_camera_relative_orientation_target();
        set_velocity_target_from_input(avatar);
    }

    let timer = avatar.state.timer;
    if timer > JUMP_IDLE_WINDUP_S && !already_jumped {
        avatar.jump(None);
        mark_jumped(avatar);
        avatar
            .velocity_spring
            .set_mass(AIRBORNE_VELOCITY_SPRING_MASS);
        avatar.rotation_spring.damping = AIRBORNE_ROTATION_SPRING_DAMPING;
        if avatar.is_ground_moving(physics) {
            avatar.set_arcade_velocity_influence(0.0, 0.0, 0.0);
        } else {
            avatar.set_arcade_velocity_influence(
                JUMP_IDLE_VELOCITY_INFLUENCE,
                0.0,
                JUMP_IDLE_VELOCITY_INFLUENCE,
            );
        }
    } else if timer > JUMP_IDLE_LANDING_WINDOW_S && avatar.ground.is_some() {
        land(avatar);
    } else if avatar.state.animation_ended(dt) {
        avatar.set_state(StateKind::Falling);
    }
}

fn update_jump_running(avatar: &mut Avatar, dt: f32, already_jumped: bool) {
    avatar.set_camera_relative_orientation_target();

    let timer = avatar.state.timer;
    if timer > JUMP_RUNNING_WINDUP_S && !already_jumped {
        avatar.jump(Some(RUNNING_JUMP_SPEED));
        mark_jumped(avatar);
        avatar.rotation_spring.damping = AIRBORNE_ROTATION_SPRING_DAMPING;
        avatar.arcade_velocity_is_additive = true;
        avatar.set_arcade_velocity_influence(AIR_VELOCITY_INFLUENCE, 0.0, AIR_VELOCITY_INFLUENCE);
    } else if timer > JUMP_RUNNING_LANDING_WINDOW_S && avatar.ground.is_some() {
        land(avatar);
    } else if avatar.state.animation_ended(dt) {
        avatar.set_state(StateKind::Falling);
    }
}

fn blended_rotation(avatar: &Avatar, transition: &SeatTransition) -> Quat {
    let t = ease_in_out_sine(avatar.state.animation_progress());
    transition
        .start_rotation
        .try_slerp(&transition.end_rotation, t, 1.0e-6)
        .unwrap_or(transition.end_rotation)
}

fn update_entering_chair(
    avatar: &mut Avatar,
    dt: f32,
    transition: SeatTransition,
    physics: &mut dyn PhysicsBackend,
    seats: &mut SeatRegistry,
) {
    if !avatar.state.animation_ended(dt) {
        avatar.local_pose.rotation = blended_rotation(avatar, &transition);
        return;
    }

    avatar.local_pose.rotation = transition.end_rotation;
    match seats.occupy(transition.seat, avatar.id()) {
        Ok(()) => {
            avatar.occupy_seat(transition.seat);
            avatar.set_state(StateKind::Sitting {
                seat: transition.seat,
                entry_point: transition.entry_point,
            });
        }
        Err(err) => {
            log::warn!("{}: cannot sit down: {err}", avatar.id());
            stand_up(
                avatar,
                transition.seat,
                transition.entry_point,
                physics,
                seats,
            );
        }
    }
}

fn update_exiting_chair(
    avatar: &mut Avatar,
    dt: f32,
    transition: SeatTransition,
    physics: &mut dyn PhysicsBackend,
    seats: &mut SeatRegistry,
) {
    if !avatar.state.animation_ended(dt) {
        avatar.local_pose.rotation = blended_rotation(avatar, &transition);
        return;
    }
    avatar.local_pose.rotation = transition.end_rotation;
    stand_up(
        avatar,
        transition.seat,
        transition.entry_point,
        physics,
        seats,
    );
}

/// Put the avatar back in the world next to the seat and give the seat up.
///
/// Stands above the entry point, inheriting the seat's velocity. Without a seat the
/// avatar stays where it is.
fn stand_up(
    avatar: &mut Avatar,
    seat_id: SeatId,
    entry_point: usize,
    physics: &mut dyn PhysicsBackend,
    seats: &mut SeatRegistry,
) {
    let hover = Vec3::new(0.0, avatar.config.ray_cast_length, 0.0);
    let (position, linvel) = match seats.get(seat_id) {
        Some(seat) => {
            let ground = seat
                .world_entry_point(entry_point)
                .unwrap_or_else(|| seat.world_seat_point());
            avatar.rotation = seat.pose.rotation * avatar.local_pose.rotation;
            (ground.translation.vector + hover, seat.linear_velocity)
        }
        None => (avatar.position, Vec3::zeros()),
    };
    avatar.detach_from_seat(position, linvel, physics);
    avatar.set_state(StateKind::Idle);
    avatar.leave_seat(seats);
}

/// Stand-up rotation (seat frame) facing along the exit point's forward axis.
fn exit_transition(
    avatar: &Avatar,
    seat_id: SeatId,
    entry_point: usize,
    seats: &SeatRegistry,
) -> SeatTransition {
    let start_rotation = avatar.local_pose.rotation;
    let end_rotation = seats
        .get(seat_id)
        .and_then(|seat| {
            let exit = seat.world_entry_point(entry_point)?;
            let facing = rotation_from_forward(&forward_from_rotation(&exit.rotation));
            Some(seat.pose.rotation.inverse() * facing)
        })
        .unwrap_or(start_rotation);
    SeatTransition {
        seat: seat_id,
        entry_point,
        start_rotation,
        end_rotation,
    }
}

// --- Input ---

/// React to a change of one action. Edges are still set while this runs.
pub(crate) fn on_input_change(avatar: &mut Avatar, seats: &SeatRegistry) {
    if base_input(avatar, seats) == Flow::Consumed {
        return;
    }
    state_input(avatar, seats);
}

/// Seat search and approach cancellation, shared by every state.
fn base_input(avatar: &mut Avatar, seats: &SeatRegistry) -> Flow {
    let actions = avatar.actions;
    let state = avatar.state;

    if state.can(Capability::FindObjectsToEnter) {
        let kind = if actions.just_pressed(Action::Enter) {
            Some(SeatKind::Primary)
        } else if actions.just_pressed(Action::EnterPassenger) {
            Some(SeatKind::Passenger)
        } else {
            None
        };
        if let Some(kind) = kind {
            if interaction::begin(avatar, seats, kind) {
                let injected = press_synthetic(avatar, Action::Up, seats);
                if let Some(instance) = avatar.interaction.as_mut() {
                    instance.synthetic_forward = injected;
                }
                return Flow::Consumed;
            }
            return Flow::Continue;
        }
    }

    if state.can(Capability::EnterChairs)
        && avatar.interaction.is_some()
        && actions.any_direction_just_pressed()
    {
        interaction::cancel(avatar);
    }
    Flow::Continue
}

/// Press `action` on the player's behalf, bypassing the shared seat policy.
///
/// Returns false if it was already held.
fn press_synthetic(avatar: &mut Avatar, action: Action, seats: &SeatRegistry) -> bool {
    if !avatar.actions.apply(action, true) {
        return false;
    }
    state_input(avatar, seats);
    avatar.actions.clear_edges(action);
    true
}

fn emote_just_pressed(avatar: &Avatar) -> Option<Emote> {
    Emote::ALL
        .into_iter()
        .find(|emote| avatar.actions.just_pressed(emote.action()))
}

fn moving_state(avatar: &Avatar) -> StateKind {
    if avatar.actions.is_pressed(Action::Run) {
        StateKind::Sprint
    } else {
        StateKind::Walk
    }
}

/// State-specific reaction. The first matching rule wins.
fn state_input(avatar: &mut Avatar, seats: &SeatRegistry) {
    let actions = avatar.actions;
    let kind = avatar.state.kind;
    let next = match kind {
        StateKind::Idle => {
            if actions.any_direction() {
                Some(moving_state(avatar))
            } else if actions.just_pressed(Action::Jump) {
                Some(StateKind::jump_idle())
            } else {
                emote_just_pressed(avatar).map(StateKind::Emote)
            }
        }
        StateKind::Walk => {
            if actions.no_direction() {
                if avatar.velocity.norm() > END_WALK_MIN_SPEED {
                    Some(StateKind::EndWalk)
                } else {
                    Some(StateKind::Idle)
                }
            } else if actions.just_pressed(Action::Jump) {
                Some(StateKind::jump_running())
            } else if actions.just_pressed(Action::Run) {
                Some(StateKind::Sprint)
            } else {
                None
            }
        }
        StateKind::Sprint => {
            if actions.no_direction() {
                Some(StateKind::EndWalk)
            } else if actions.just_pressed(Action::Jump) {
                Some(StateKind::jump_running())
            } else if !actions.is_pressed(Action::Run) {
                Some(StateKind::Walk)
            } else {
                None
            }
        }
        StateKind::EndWalk | StateKind::DropIdle => {
            if actions.any_direction() {
                Some(moving_state(avatar))
            } else if actions.just_pressed(Action::Jump) {
                Some(StateKind::jump_idle())
            } else {
                None
            }
        }
        StateKind::DropRunning => {
            if actions.just_pressed(Action::Jump) {
                Some(StateKind::jump_running())
            } else if actions.any_direction() && actions.just_pressed(Action::Run) {
                Some(StateKind::Sprint)
            } else if actions.no_direction() {
                Some(StateKind::EndWalk)
            } else {
                None
            }
        }
        StateKind::Emote(current) => {
            if actions.just_pressed(Action::QuitEmote) {
                Some(StateKind::Idle)
            } else if actions.any_direction() {
                Some(StateKind::Walk)
            } else {
                emote_just_pressed(avatar)
                    .filter(|emote| *emote != current)
                    .map(StateKind::Emote)
            }
        }
        StateKind::Sitting { seat, entry_point } => {
            let leave = actions.just_pressed(Action::Enter)
                || actions.just_pressed(Action::EnterPassenger);
            if leave && avatar.state.can(Capability::LeaveChairs) {
                Some(StateKind::ExitingChair(exit_transition(
                    avatar,
                    seat,
                    entry_point,
                    seats,
                )))
            } else {
                None
            }
        }
        StateKind::JumpIdle { .. }
        | StateKind::JumpRunning { .. }
        | StateKind::Falling
        | StateKind::DropRolling
        | StateKind::EnteringChair(_)
        | StateKind::ExitingChair(_) => None,
    };

    if let Some(next) = next {
        avatar.set_state(next);
    }
}
