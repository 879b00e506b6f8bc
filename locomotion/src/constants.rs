//! Tuned locomotion constants.
//!
//! These values were tuned by hand against the animation set and the 60 Hz physics rate.
//! Treat any change as a behaviour change: the replicated motion of other clients depends
//! on every peer using the same numbers.

/// Fixed physics rate in steps per second.
pub const PHYSICS_FRAME_RATE: f32 = 60.0;

/// Fixed rate the spring simulators integrate at, independent of render rate.
pub const SPRING_FRAME_RATE: f32 = 60.0;

/// Upper bound on spring frames generated by a single `simulate()` call.
///
/// A stalled frame (debugger, tab switch) would otherwise generate thousands of frames.
pub const MAX_SPRING_FRAMES_PER_CALL: usize = 120;

/// Largest frame delta fed into the world update (seconds).
pub const MAX_FRAME_DT_S: f32 = 1.0 / 30.0;

/// Maximum number of physics sub-steps per world update.
pub const MAX_PHYSICS_SUB_STEPS: u32 = 10;

/// Gravity along -Y in meters per second squared (positive magnitude).
pub const GRAVITY_MPS2: f32 = 9.81;

/// Bodies below this height are respawned.
pub const OUT_OF_BOUNDS_Y: f32 = -100.0;

// ---------------------------------------------------------------------------------------------
// Arcade velocity targets (avatar-local units, scaled by `move_speed`)
// ---------------------------------------------------------------------------------------------

/// Local forward velocity target while walking.
pub const WALK_VELOCITY_TARGET: f32 = 0.8;

/// Local forward velocity target while sprinting.
pub const SPRINT_VELOCITY_TARGET: f32 = 1.4;

/// Walking releases into `EndWalk` above this speed and into `Idle` below it.
pub const END_WALK_MIN_SPEED: f32 = 1.0;

/// Horizontal arcade influence while airborne (x and z; y is always zero).
pub const AIR_VELOCITY_INFLUENCE: f32 = 0.05;

/// Horizontal arcade influence after a standing jump from static ground.
pub const JUMP_IDLE_VELOCITY_INFLUENCE: f32 = 0.3;

// ---------------------------------------------------------------------------------------------
// Jumping and landing
// ---------------------------------------------------------------------------------------------

/// Vertical velocity added by a jump (m/s).
pub const JUMP_VERTICAL_IMPULSE: f32 = 4.0;

/// Explicit initial speed of a running jump.
pub const RUNNING_JUMP_SPEED: f32 = 4.0;

/// Spring momentum multiplier used when a running jump carries horizontal speed.
pub const RUNNING_JUMP_MOMENTUM_SCALE: f32 = 4.0;

/// Seconds into the standing jump clip when the impulse is applied.
pub const JUMP_IDLE_WINDUP_S: f32 = 0.2;

/// Seconds into the standing jump clip after which ground contact lands the avatar.
pub const JUMP_IDLE_LANDING_WINDOW_S: f32 = 0.3;

/// Seconds into the running jump clip when the impulse is applied.
pub const JUMP_RUNNING_WINDUP_S: f32 = 0.13;

/// Seconds into the running jump clip after which ground contact lands the avatar.
pub const JUMP_RUNNING_LANDING_WINDOW_S: f32 = 0.24;

/// Impact vertical speed below which a landing becomes a roll.
pub const LANDING_ROLL_IMPACT_Y: f32 = -6.0;

/// Impact vertical speed below which a moving landing plays the running drop.
pub const LANDING_RUN_IMPACT_Y: f32 = -2.0;

// ---------------------------------------------------------------------------------------------
// Seats
// ---------------------------------------------------------------------------------------------

/// Planar distance to the entry point that triggers the attach transition.
pub const SEAT_APPROACH_PLANAR_DISTANCE: f32 = 0.2;

/// Vertical tolerance between avatar and entry point for the attach transition.
pub const SEAT_APPROACH_HEIGHT_TOLERANCE: f32 = 2.0;

/// Default cutoff for the nearest-seat search.
pub const SEAT_SEARCH_RADIUS: f32 = 10.0;

// ---------------------------------------------------------------------------------------------
// Spring presets (mass, damping)
// ---------------------------------------------------------------------------------------------

pub const DEFAULT_VELOCITY_SPRING_MASS: f32 = 50.0;
pub const DEFAULT_VELOCITY_SPRING_DAMPING: f32 = 0.8;
pub const DEFAULT_ROTATION_SPRING_MASS: f32 = 10.0;
pub const DEFAULT_ROTATION_SPRING_DAMPING: f32 = 0.5;

pub const IDLE_VELOCITY_SPRING_MASS: f32 = 10.0;
pub const IDLE_VELOCITY_SPRING_DAMPING: f32 = 0.6;

pub const SPRINT_VELOCITY_SPRING_MASS: f32 = 10.0;
pub const SPRINT_ROTATION_SPRING_MASS: f32 = 50.0;
pub const SPRINT_ROTATION_SPRING_DAMPING: f32 = 0.8;

pub const JUMP_IDLE_VELOCITY_SPRING_MASS: f32 = 50.0;

pub const AIRBORNE_VELOCITY_SPRING_MASS: f32 = 100.0;
pub const AIRBORNE_ROTATION_SPRING_DAMPING: f32 = 0.3;

pub const DROP_IDLE_VELOCITY_SPRING_MASS: f32 = 7.0;
pub const DROP_IDLE_VELOCITY_SPRING_DAMPING: f32 = 0.5;

pub const DROP_ROLLING_VELOCITY_SPRING_MASS: f32 = 1.0;
pub const DROP_ROLLING_VELOCITY_SPRING_DAMPING: f32 = 0.6;

/// Smallest mass a spring accepts through its setters.
pub const MIN_SPRING_MASS: f32 = 1.0e-3;

// ---------------------------------------------------------------------------------------------
// Cosmetics
// ---------------------------------------------------------------------------------------------

/// Lean factor applied to `angular_velocity * speed`.
pub const TILT_FACTOR: f32 = 2.3;
