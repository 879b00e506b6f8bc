/*!
Per-avatar and per-world tuning.

Defaults reproduce the hand-tuned values in [`crate::constants`]. Override fields from game
data, then call `validate()` once; constructors that take a config validate it too.
*/

use crate::{
    constants::{
        DEFAULT_ROTATION_SPRING_DAMPING, DEFAULT_ROTATION_SPRING_MASS,
        DEFAULT_VELOCITY_SPRING_DAMPING, DEFAULT_VELOCITY_SPRING_MASS, GRAVITY_MPS2,
        MAX_FRAME_DT_S, MAX_PHYSICS_SUB_STEPS, OUT_OF_BOUNDS_Y, PHYSICS_FRAME_RATE,
        SEAT_SEARCH_RADIUS, SPRING_FRAME_RATE,
    },
    error::ConfigError,
    physics::{CapsuleSpec, InteractionGroups, Vec3, ground::GroundProbe, groups},
};

/// Capsule radius (meters).
pub const DEFAULT_CAPSULE_RADIUS: f32 = 0.25;
/// Half length of the capsule's cylindrical segment (meters).
pub const DEFAULT_CAPSULE_HALF_HEIGHT: f32 = 0.25;
/// Arcade speed multiplier applied to the local velocity spring (m/s per unit).
pub const DEFAULT_MOVE_SPEED: f32 = 4.0;
/// Hover height of the capsule center above the ground hit (meters).
pub const DEFAULT_RAY_CAST_LENGTH: f32 = 0.57;
/// Extra probe length below the hover height (meters).
pub const DEFAULT_RAY_SAFE_OFFSET: f32 = 0.03;

#[derive(Clone, Copy, Debug)]
pub struct AvatarConfig {
    pub capsule: CapsuleSpec,
    pub move_speed: f32,
    pub ray_cast_length: f32,
    pub ray_safe_offset: f32,
    pub velocity_spring_mass: f32,
    pub velocity_spring_damping: f32,
    pub rotation_spring_mass: f32,
    pub rotation_spring_damping: f32,
    pub spring_frame_rate: f32,
    /// Cutoff for the nearest-seat search (meters).
    pub seat_search_radius: f32,
    /// Membership/filter of the avatar's own capsule.
    pub body_groups: InteractionGroups,
    /// Filter used by the ground probe.
    pub ground_ray_groups: InteractionGroups,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            capsule: CapsuleSpec {
                half_height: DEFAULT_CAPSULE_HALF_HEIGHT,
                radius: DEFAULT_CAPSULE_RADIUS,
            },
            move_speed: DEFAULT_MOVE_SPEED,
            ray_cast_length: DEFAULT_RAY_CAST_LENGTH,
            ray_safe_offset: DEFAULT_RAY_SAFE_OFFSET,
            velocity_spring_mass: DEFAULT_VELOCITY_SPRING_MASS,
            velocity_spring_damping: DEFAULT_VELOCITY_SPRING_DAMPING,
            rotation_spring_mass: DEFAULT_ROTATION_SPRING_MASS,
            rotation_spring_damping: DEFAULT_ROTATION_SPRING_DAMPING,
            spring_frame_rate: SPRING_FRAME_RATE,
            seat_search_radius: SEAT_SEARCH_RADIUS,
            body_groups: groups::avatar_body(),
            ground_ray_groups: groups::ground_ray(),
        }
    }
}

impl AvatarConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::require_positive("capsule.radius", self.capsule.radius)?;
        ConfigError::require_positive("capsule.half_height", self.capsule.half_height)?;
        ConfigError::require_positive("move_speed", self.move_speed)?;
        ConfigError::require_positive("ray_cast_length", self.ray_cast_length)?;
        ConfigError::require_positive("ray_safe_offset", self.ray_safe_offset)?;
        ConfigError::require_positive("velocity_spring_mass", self.velocity_spring_mass)?;
        ConfigError::require_unit_interval(
            "velocity_spring_damping",
            self.velocity_spring_damping,
        )?;
        ConfigError::require_positive("rotation_spring_mass", self.rotation_spring_mass)?;
        ConfigError::require_unit_interval(
            "rotation_spring_damping",
            self.rotation_spring_damping,
        )?;
        ConfigError::require_positive("spring_frame_rate", self.spring_frame_rate)?;
        ConfigError::require_positive("seat_search_radius", self.seat_search_radius)?;
        Ok(())
    }

    #[inline]
    pub fn ground_probe(&self) -> GroundProbe {
        GroundProbe {
            ray_cast_length: self.ray_cast_length,
            ray_safe_offset: self.ray_safe_offset,
            groups: self.ground_ray_groups,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldConfig {
    /// Fixed physics steps per second.
    pub physics_frame_rate: f32,
    /// Cap on fixed steps per `update`; the remaining backlog is dropped.
    pub max_sub_steps: u32,
    /// Multiplier applied to every frame delta.
    pub time_scale: f32,
    /// Largest scaled frame delta accepted by `update` (seconds).
    pub max_frame_dt: f32,
    pub gravity: Vec3,
    /// Avatars whose body falls below this height are respawned.
    pub out_of_bounds_y: f32,
    pub respawn_point: Vec3,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            physics_frame_rate: PHYSICS_FRAME_RATE,
            max_sub_steps: MAX_PHYSICS_SUB_STEPS,
            time_scale: 1.0,
            max_frame_dt: MAX_FRAME_DT_S,
            gravity: Vec3::new(0.0, -GRAVITY_MPS2, 0.0),
            out_of_bounds_y: OUT_OF_BOUNDS_Y,
            respawn_point: Vec3::new(0.0, 1.0, 0.0),
        }
    }
}

impl WorldConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::require_positive("physics_frame_rate", self.physics_frame_rate)?;
        ConfigError::require_positive("time_scale", self.time_scale)?;
        ConfigError::require_positive("max_frame_dt", self.max_frame_dt)?;
        if self.max_sub_steps == 0 {
            return Err(ConfigError::NoSubSteps);
        }
        if !self.out_of_bounds_y.is_finite() {
            return Err(ConfigError::NonFinite {
                field: "out_of_bounds_y",
                value: self.out_of_bounds_y,
            });
        }
        Ok(())
    }

    /// Duration of one fixed physics step (seconds).
    #[inline]
    pub fn fixed_dt(&self) -> f32 {
        1.0 / self.physics_frame_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(AvatarConfig::default().validate(), Ok(()));
        assert_eq!(WorldConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_non_positive_move_speed() {
        let config = AvatarConfig {
            move_speed: 0.0,
            ..AvatarConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::NonPositive {
                field: "move_speed",
                value: 0.0
            })
        );
    }

    #[test]
    fn rejects_zero_sub_steps_and_nan_rates() {
        let config = WorldConfig {
            max_sub_steps: 0,
            ..WorldConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NoSubSteps));

        let config = WorldConfig {
            physics_frame_rate: f32::NAN,
            ..WorldConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonFinite {
                field: "physics_frame_rate",
                ..
            })
        ));
    }

    #[test]
    fn rejects_damping_above_one() {
        let config = AvatarConfig {
            velocity_spring_damping: 1.5,
            ..AvatarConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::OutsideUnitInterval {
                field: "velocity_spring_damping",
                value: 1.5
            })
        );

        let config = AvatarConfig {
            rotation_spring_damping: 1.0,
            ..AvatarConfig::default()
        };
        assert_eq!(config.validate(), Ok(()));

        let config = AvatarConfig {
            rotation_spring_damping: 2.0,
            ..AvatarConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutsideUnitInterval {
                field: "rotation_spring_damping",
                ..
            })
        ));
    }

    #[test]
    fn probe_uses_hover_and_safe_offset() {
        let probe = AvatarConfig::default().ground_probe();
        assert!((probe.max_distance() - 0.6).abs() < 1.0e-6);
    }
}
