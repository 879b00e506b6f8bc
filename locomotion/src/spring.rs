//! Fixed-rate spring simulators.
//!
//! Every simulator integrates a discrete mass-spring-damper at its own frame rate and
//! interpolates between the last two generated frames, so the smoothed signal does not
//! depend on the render frame rate and stays stable for large `dt`.
//!
//! One frame of integration:
//! - `acceleration = (target - position) / mass`
//! - `velocity = (velocity + acceleration) * damping`
//! - `position = position + velocity`
//!
//! `damping` is a per-frame velocity retention factor in (0, 1].

use std::ops::{Add, Mul, Sub};

use crate::{
    constants::{MAX_SPRING_FRAMES_PER_CALL, MIN_SPRING_MASS},
    error::SpringError,
    physics::Vec3,
};

/// Values a [`SpringSimulator`] can integrate.
pub trait SpringValue:
    Copy + Add<Output = Self> + Sub<Output = Self> + Mul<f32, Output = Self>
{
    fn zero() -> Self;

    fn interpolate(a: Self, b: Self, t: f32) -> Self {
        a + (b - a) * t
    }
}

impl SpringValue for f32 {
    fn zero() -> Self {
        0.0
    }
}

impl SpringValue for Vec3 {
    fn zero() -> Self {
        Vec3::zeros()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct SimulationFrame<T> {
    position: T,
    velocity: T,
}

#[inline]
fn spring_frame<T: SpringValue>(
    frame: SimulationFrame<T>,
    target: T,
    mass: f32,
    damping: f32,
) -> SimulationFrame<T> {
    let acceleration = (target - frame.position) * (1.0 / mass);
    let velocity = (frame.velocity + acceleration) * damping;
    SimulationFrame {
        position: frame.position + velocity,
        velocity,
    }
}

/// Converts variable time steps into a whole number of fixed frames plus a remainder.
#[derive(Clone, Copy, Debug)]
struct FrameClock {
    frame_time: f32,
    offset: f32,
}

impl FrameClock {
    fn new(frame_rate: f32) -> Result<Self, SpringError> {
        if frame_rate <= 0.0 || !frame_rate.is_finite() {
            return Err(SpringError::NonPositiveFrameRate(frame_rate));
        }
        Ok(Self {
            frame_time: 1.0 / frame_rate,
            offset: 0.0,
        })
    }

    /// Advance by `dt` and return how many frames must be generated.
    fn advance(&mut self, dt: f32) -> usize {
        let total = self.offset + dt.max(0.0);
        let frames = (total / self.frame_time).floor();
        self.offset = total % self.frame_time;
        (frames as usize).min(MAX_SPRING_FRAMES_PER_CALL)
    }

    /// Interpolation factor between the last two frames.
    fn alpha(&self) -> f32 {
        (self.offset / self.frame_time).clamp(0.0, 1.0)
    }
}

fn checked_mass(mass: f32) -> Result<f32, SpringError> {
    if mass > 0.0 && mass.is_finite() {
        Ok(mass)
    } else {
        Err(SpringError::NonPositiveMass(mass))
    }
}

fn clamped_mass(mass: f32) -> f32 {
    if mass > 0.0 && mass.is_finite() {
        mass
    } else {
        log::warn!("spring mass {mass} is not positive, clamping to {MIN_SPRING_MASS}");
        MIN_SPRING_MASS
    }
}

/// Absolute spring over a scalar or a vector; vectors integrate each axis independently.
#[derive(Clone, Debug)]
pub struct SpringSimulator<T: SpringValue> {
    mass: f32,
    pub damping: f32,
    pub target: T,
    pub position: T,
    pub velocity: T,
    clock: FrameClock,
    cache: [SimulationFrame<T>; 2],
}

/// Per-axis spring used for the avatar's local velocity.
pub type VectorSpringSimulator = SpringSimulator<Vec3>;

impl<T: SpringValue> SpringSimulator<T> {
    pub fn new(frame_rate: f32, damping: f32, mass: f32) -> Result<Self, SpringError> {
        let clock = FrameClock::new(frame_rate)?;
        let mass = checked_mass(mass)?;
        let rest = SimulationFrame {
            position: T::zero(),
            velocity: T::zero(),
        };
        Ok(Self {
            mass,
            damping,
            target: T::zero(),
            position: T::zero(),
            velocity: T::zero(),
            clock,
            cache: [rest; 2],
        })
    }

    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Set the mass; non-positive values are clamped with a warning.
    pub fn set_mass(&mut self, mass: f32) {
        self.mass = clamped_mass(mass);
    }

    /// Reset position, velocity and history to rest at zero.
    pub fn init(&mut self) {
        let rest = SimulationFrame {
            position: T::zero(),
            velocity: T::zero(),
        };
        self.position = T::zero();
        self.velocity = T::zero();
        self.cache = [rest; 2];
        self.clock.offset = 0.0;
    }

    pub fn simulate(&mut self, dt: f32) {
        let frames = self.clock.advance(dt);
        for _ in 0..frames {
            let next = spring_frame(self.cache[1], self.target, self.mass, self.damping);
            self.cache = [self.cache[1], next];
        }

        let t = self.clock.alpha();
        self.position = T::interpolate(self.cache[0].position, self.cache[1].position, t);
        self.velocity = T::interpolate(self.cache[0].velocity, self.cache[1].velocity, t);
    }
}

/// Spring over a signed angle whose output is the delta since the previous call.
///
/// Callers set `target` to the remaining angle each frame and accumulate `position` onto
/// their own orientation. The simulator re-zeroes its history on the last generated frame,
/// so it tracks a relative offset and never accumulates wraparound error.
#[derive(Clone, Debug)]
pub struct RelativeSpringSimulator {
    mass: f32,
    pub damping: f32,
    pub target: f32,
    pub position: f32,
    pub velocity: f32,
    last_lerp: f32,
    clock: FrameClock,
    cache: [SimulationFrame<f32>; 2],
}

impl RelativeSpringSimulator {
    pub fn new(frame_rate: f32, damping: f32, mass: f32) -> Result<Self, SpringError> {
        let clock = FrameClock::new(frame_rate)?;
        let mass = checked_mass(mass)?;
        let rest = SimulationFrame {
            position: 0.0,
            velocity: 0.0,
        };
        Ok(Self {
            mass,
            damping,
            target: 0.0,
            position: 0.0,
            velocity: 0.0,
            last_lerp: 0.0,
            clock,
            cache: [rest; 2],
        })
    }

    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn set_mass(&mut self, mass: f32) {
        self.mass = clamped_mass(mass);
    }

    pub fn init(&mut self) {
        self.position = 0.0;
        self.velocity = 0.0;
        self.last_lerp = 0.0;
        self.cache = [SimulationFrame {
            position: 0.0,
            velocity: 0.0,
        }; 2];
        self.clock.offset = 0.0;
    }

    pub fn simulate(&mut self, dt: f32) {
        let frames = self.clock.advance(dt);
        for i in 0..frames {
            let mut frame = self.cache[1];
            if i + 1 == frames {
                // Re-zero so the next call measures from the orientation we just applied.
                self.last_lerp -= frame.position;
                frame.position = 0.0;
            }
            let next = spring_frame(frame, self.target, self.mass, self.damping);
            self.cache = [self.cache[1], next];
        }

        let t = self.clock.alpha();
        let lerp = <f32 as SpringValue>::interpolate(0.0, self.cache[1].position, t);
        self.position = lerp - self.last_lerp;
        self.last_lerp = lerp;
        self.velocity =
            <f32 as SpringValue>::interpolate(self.cache[0].velocity, self.cache[1].velocity, t);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: f32 = 60.0;

    #[test]
    fn rejects_non_positive_mass() {
        assert_eq!(
            SpringSimulator::<f32>::new(RATE, 0.8, 0.0).unwrap_err(),
            SpringError::NonPositiveMass(0.0)
        );
        assert!(RelativeSpringSimulator::new(RATE, 0.5, -1.0).is_err());
        assert!(VectorSpringSimulator::new(0.0, 0.8, 1.0).is_err());
    }

    #[test]
    fn setter_clamps_non_positive_mass() {
        let mut spring = SpringSimulator::<f32>::new(RATE, 0.8, 50.0).unwrap();
        spring.set_mass(-3.0);
        assert_eq!(spring.mass(), MIN_SPRING_MASS);
    }

    #[test]
    fn scalar_spring_converges_to_target() {
        let mut spring = SpringSimulator::<f32>::new(RATE, 0.8, 50.0).unwrap();
        spring.target = 0.8;
        for _ in 0..600 {
            spring.simulate(1.0 / 60.0);
        }
        assert!((spring.position - 0.8).abs() < 1.0e-3);
        assert!(spring.velocity.abs() < 1.0e-3);
    }

    #[test]
    fn result_is_independent_of_call_granularity() {
        let mut fine = VectorSpringSimulator::new(RATE, 0.8, 50.0).unwrap();
        let mut coarse = fine.clone();
        fine.target = Vec3::new(0.0, 0.0, 1.4);
        coarse.target = fine.target;

        for _ in 0..60 {
            fine.simulate(1.0 / 60.0);
        }
        for _ in 0..4 {
            coarse.simulate(0.25);
        }
        assert!((fine.position - coarse.position).norm() < 1.0e-3);
    }

    #[test]
    fn huge_step_stays_bounded() {
        let mut spring = SpringSimulator::<f32>::new(RATE, 0.8, 1.0).unwrap();
        spring.target = 1.0;
        spring.simulate(1.0e4);
        assert!(spring.position.is_finite());
        assert!(spring.position.abs() < 10.0);
    }

    #[test]
    fn init_returns_to_rest() {
        let mut spring = VectorSpringSimulator::new(RATE, 0.8, 10.0).unwrap();
        spring.target = Vec3::new(1.0, 0.0, 1.0);
        spring.simulate(0.5);
        spring.init();
        assert_eq!(spring.position, Vec3::zeros());
        spring.simulate(0.0);
        assert_eq!(spring.position, Vec3::zeros());
    }

    #[test]
    fn relative_spring_accumulates_toward_fixed_offset() {
        let mut spring = RelativeSpringSimulator::new(RATE, 0.5, 10.0).unwrap();
        let mut remaining = 1.0_f32;
        for _ in 0..600 {
            spring.target = remaining;
            spring.simulate(1.0 / 60.0);
            remaining -= spring.position;
        }
        assert!(remaining.abs() < 1.0e-3, "remaining angle {remaining}");
    }
}
