/*!
Per-step glue between an avatar and its physics body.

Before each fixed step the ground probe refreshes `Avatar::ground`; after it the
avatar's arcade velocity is blended into the body's simulated velocity, the body is
snapped to its hover height when grounded, and a pending jump is applied.

Axes: the arcade velocity is avatar-local (+Z forward) and is mapped to world space
through the flat orientation vector.
*/

use crate::{
    avatar::Avatar,
    constants::{JUMP_VERTICAL_IMPULSE, RUNNING_JUMP_MOMENTUM_SCALE},
    utils::{apply_vector_matrix_xz, have_different_signs, lerp, rotation_from_up},
};

use super::{PhysicsBackend, Vec3};

/// Record the pre-step translation and probe the ground under the avatar.
pub fn pre_step(avatar: &mut Avatar, physics: &dyn PhysicsBackend) {
    if !avatar.physics_enabled {
        return;
    }
    let Some(body) = avatar.body else {
        return;
    };
    if let Some(translation) = physics.translation(body) {
        avatar.previous_body_translation = translation;
    }
    avatar.ground = avatar.config.ground_probe().probe(physics, body);
}

/// Per-axis interpolation from the simulated velocity toward the arcade velocity.
pub fn lerp_velocity(simulated: &Vec3, arcade: &Vec3, influence: &Vec3) -> Vec3 {
    Vec3::new(
        lerp(simulated.x, arcade.x, influence.x),
        lerp(simulated.y, arcade.y, influence.y),
        lerp(simulated.z, arcade.z, influence.z),
    )
}

/// Per-axis additive steering used in the air.
///
/// An axis gains `arcade * influence` only while the simulated speed is below the
/// target speed on that axis, or when the arcade velocity pushes against it.
pub fn add_velocity(simulated: &Vec3, arcade: &Vec3, target: &Vec3, influence: &Vec3) -> Vec3 {
    let mut out = *simulated;
    for i in 0..3 {
        if simulated[i].abs() < target[i].abs() || have_different_signs(simulated[i], arcade[i]) {
            out[i] += arcade[i] * influence[i];
        }
    }
    out
}

/// Blend arcade motion into the stepped body, handle ground contact and jumps.
pub fn post_step(avatar: &mut Avatar, physics: &mut dyn PhysicsBackend, physics_frame_rate: f32) {
    if !avatar.physics_enabled {
        return;
    }
    let Some(body) = avatar.body else {
        return;
    };
    let (Some(simulated), Some(mut translation)) = (physics.linvel(body), physics.translation(body))
    else {
        return;
    };

    let move_speed = avatar.config.move_speed;
    let arcade = apply_vector_matrix_xz(&avatar.orientation, &(avatar.velocity * move_speed));
    let influence = avatar.arcade_velocity_influence;

    let mut velocity = if avatar.arcade_velocity_is_additive {
        let target = apply_vector_matrix_xz(&avatar.orientation, &avatar.velocity_target)
            * move_speed;
        add_velocity(&simulated, &arcade, &target, &influence)
    } else {
        lerp_velocity(&simulated, &arcade, &influence)
    };

    match avatar.ground {
        Some(hit) => {
            velocity.y = 0.0;
            if let Some(platform) = hit.point_velocity(&*physics) {
                velocity += platform;
            }
            velocity = rotation_from_up(&hit.normal) * velocity;
            physics.set_linvel(body, velocity);

            translation.y =
                hit.point.y + avatar.config.ray_cast_length + velocity.y / physics_frame_rate;
            physics.set_translation(body, translation);
        }
        None => {
            physics.set_linvel(body, velocity);
            avatar.ground_impact_velocity = velocity;
        }
    }

    if avatar.wants_to_jump {
        apply_jump(avatar, physics, velocity, translation);
    }
}

fn apply_jump(
    avatar: &mut Avatar,
    physics: &mut dyn PhysicsBackend,
    mut velocity: Vec3,
    mut translation: Vec3,
) {
    let Some(body) = avatar.body else {
        return;
    };
    match avatar.init_jump_speed {
        Some(speed) => {
            let momentum = avatar.velocity_spring.position.norm() * RUNNING_JUMP_MOMENTUM_SCALE;
            velocity = avatar.orientation * momentum.max(speed);
        }
        None => {
            let platform = avatar
                .ground
                .as_ref()
                .and_then(|hit| hit.point_velocity(&*physics));
            if let Some(platform) = platform {
                velocity -= platform;
            }
        }
    }
    velocity.y += JUMP_VERTICAL_IMPULSE;
    translation.y += 2.0 * avatar.config.ray_safe_offset;

    physics.set_linvel(body, velocity);
    physics.set_translation(body, translation);
    avatar.wants_to_jump = false;
    log::debug!("{}: jump, velocity {:?}", avatar.id(), velocity);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{avatar::testing, physics::mock::FlatGround, state::StateKind};

    const RATE: f32 = 60.0;
    const EPS: f32 = 1.0e-5;

    #[test]
    fn lerp_takes_influence_per_axis() {
        let v = lerp_velocity(
            &Vec3::new(2.0, -3.0, 0.0),
            &Vec3::new(0.0, 0.0, 4.0),
            &Vec3::new(1.0, 0.0, 0.5),
        );
        assert_eq!(v, Vec3::new(0.0, -3.0, 2.0));
    }

    #[test]
    fn additive_steering_caps_at_target_speed() {
        let influence = Vec3::new(0.05, 0.0, 0.05);
        let target = Vec3::new(0.0, 0.0, 3.2);

        let slow = add_velocity(&Vec3::new(0.0, -1.0, 1.0), &Vec3::new(0.0, 0.0, 3.2), &target, &influence);
        assert!((slow.z - 1.16).abs() < EPS);
        assert_eq!(slow.y, -1.0);

        let fast = add_velocity(&Vec3::new(0.0, 0.0, 5.0), &Vec3::new(0.0, 0.0, 3.2), &target, &influence);
        assert_eq!(fast.z, 5.0);

        let braking = add_velocity(&Vec3::new(0.0, 0.0, 5.0), &Vec3::new(0.0, 0.0, -3.2), &target, &influence);
        assert!((braking.z - 4.84).abs() < EPS);
    }

    #[test]
    fn grounded_step_zeroes_vertical_speed_and_snaps_to_hover_height() {
        let mut physics = FlatGround::new();
        let mut avatar = testing::standing(&mut physics);
        let body = avatar.body().unwrap();
        physics.set_linvel(body, Vec3::new(0.0, -2.0, 0.0));

        pre_step(&mut avatar, &physics);
        physics.step(1.0 / RATE);
        post_step(&mut avatar, &mut physics, RATE);

        assert_eq!(physics.linvel(body).unwrap(), Vec3::zeros());
        let y = physics.translation(body).unwrap().y;
        assert!((y - testing::STANDING_Y).abs() < EPS);
    }

    #[test]
    fn grounded_avatar_rides_moving_platform() {
        let mut physics = FlatGround::new();
        physics.ground_velocity = Vec3::new(1.5, 0.0, 0.0);
        let mut avatar = testing::standing(&mut physics);
        let body = avatar.body().unwrap();

        pre_step(&mut avatar, &physics);
        physics.step(1.0 / RATE);
        post_step(&mut avatar, &mut physics, RATE);
        assert!((physics.linvel(body).unwrap() - Vec3::new(1.5, 0.0, 0.0)).norm() < EPS);
    }

    #[test]
    fn destroyed_platform_contributes_nothing() {
        let mut physics = FlatGround::new();
        physics.ground_velocity = Vec3::new(1.5, 0.0, 0.0);
        let mut avatar = testing::standing(&mut physics);
        let body = avatar.body().unwrap();

        pre_step(&mut avatar, &physics);
        physics.ground_alive = false;
        physics.step(1.0 / RATE);
        post_step(&mut avatar, &mut physics, RATE);
        assert_eq!(physics.linvel(body).unwrap(), Vec3::zeros());
    }

    #[test]
    fn airborne_step_records_impact_velocity() {
        let mut physics = FlatGround::new();
        let mut avatar = testing::standing(&mut physics);
        let body = avatar.body().unwrap();
        physics.set_translation(body, Vec3::new(0.0, 5.0, 0.0));

        pre_step(&mut avatar, &physics);
        assert!(avatar.ground().is_none());
        physics.step(1.0 / RATE);
        post_step(&mut avatar, &mut physics, RATE);

        let impact = avatar.ground_impact_velocity();
        assert!(impact.y < 0.0);
        assert_eq!(impact, physics.linvel(body).unwrap());
    }

    #[test]
    fn walking_velocity_follows_orientation() {
        let mut physics = FlatGround::new();
        let mut avatar = testing::standing(&mut physics);
        let body = avatar.body().unwrap();
        avatar.set_orientation(&Vec3::x(), true);
        avatar.velocity = Vec3::new(0.0, 0.0, 0.8);

        pre_step(&mut avatar, &physics);
        physics.step(1.0 / RATE);
        post_step(&mut avatar, &mut physics, RATE);
        let linvel = physics.linvel(body).unwrap();
        assert!((linvel - Vec3::new(3.2, 0.0, 0.0)).norm() < EPS);
    }

    #[test]
    fn grounded_velocity_follows_slope() {
        let mut physics = FlatGround::new();
        let (sin, cos) = std::f32::consts::FRAC_PI_6.sin_cos();
        // Rises toward +Z.
        physics.ground_normal = Vec3::new(0.0, cos, -sin);
        let mut avatar = testing::standing(&mut physics);
        let body = avatar.body().unwrap();
        avatar.velocity = Vec3::new(0.0, 0.0, 0.8);

        pre_step(&mut avatar, &physics);
        physics.step(1.0 / RATE);
        post_step(&mut avatar, &mut physics, RATE);

        let normal = physics.ground_normal;
        let linvel = physics.linvel(body).unwrap();
        assert!(linvel.dot(&normal).abs() < EPS);
        assert!((linvel.norm() - 3.2).abs() < 1.0e-4);
        assert!((linvel - Vec3::new(0.0, 3.2 * sin, 3.2 * cos)).norm() < 1.0e-4);

        let y = physics.translation(body).unwrap().y;
        assert!((y - (testing::STANDING_Y + linvel.y / RATE)).abs() < EPS);
    }

    #[test]
    fn jump_is_applied_once() {
        let mut physics = FlatGround::new();
        let mut avatar = testing::standing(&mut physics);
        let body = avatar.body().unwrap();
        avatar.jump(None);

        pre_step(&mut avatar, &physics);
        physics.step(1.0 / RATE);
        post_step(&mut avatar, &mut physics, RATE);

        assert!(!avatar.wants_to_jump());
        let linvel = physics.linvel(body).unwrap();
        assert!((linvel.y - JUMP_VERTICAL_IMPULSE).abs() < EPS);
        let lifted = physics.translation(body).unwrap().y;
        assert!((lifted - (testing::STANDING_Y + 0.06)).abs() < EPS);

        pre_step(&mut avatar, &physics);
        assert!(avatar.ground().is_none());
        physics.step(1.0 / RATE);
        post_step(&mut avatar, &mut physics, RATE);
        assert!(physics.linvel(body).unwrap().y < JUMP_VERTICAL_IMPULSE);
    }

    #[test]
    fn running_jump_keeps_at_least_explicit_speed() {
        let mut physics = FlatGround::new();
        let mut avatar = testing::standing(&mut physics);
        let body = avatar.body().unwrap();
        avatar.set_state(StateKind::jump_running());
        avatar.jump(Some(4.0));

        pre_step(&mut avatar, &physics);
        physics.step(1.0 / RATE);
        post_step(&mut avatar, &mut physics, RATE);

        let linvel = physics.linvel(body).unwrap();
        assert!((linvel - Vec3::new(0.0, JUMP_VERTICAL_IMPULSE, 4.0)).norm() < EPS);
    }

    #[test]
    fn standing_jump_cancels_platform_velocity() {
        let mut physics = FlatGround::new();
        physics.ground_velocity = Vec3::new(2.0, 0.0, 0.0);
        let mut avatar = testing::standing(&mut physics);
        let body = avatar.body().unwrap();
        avatar.jump(None);

        pre_step(&mut avatar, &physics);
        physics.step(1.0 / RATE);
        post_step(&mut avatar, &mut physics, RATE);

        let linvel = physics.linvel(body).unwrap();
        assert!((linvel - Vec3::new(0.0, JUMP_VERTICAL_IMPULSE, 0.0)).norm() < EPS);
    }

    #[test]
    fn disabled_physics_leaves_body_alone() {
        let mut physics = FlatGround::new();
        let mut avatar = testing::standing(&mut physics);
        let body = avatar.body().unwrap();
        avatar.set_physics_enabled(false, &mut physics);
        physics.set_linvel(body, Vec3::new(0.0, 0.0, 9.0));

        post_step(&mut avatar, &mut physics, RATE);
        assert_eq!(physics.linvel(body).unwrap(), Vec3::new(0.0, 0.0, 9.0));
    }
}
