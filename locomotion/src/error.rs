use thiserror::Error;

use crate::{avatar::AvatarId, seat::SeatId};

/// Invalid tuning or world parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("`{field}` must be strictly positive (got {value})")]
    NonPositive { field: &'static str, value: f32 },
    #[error("`{field}` must be finite (got {value})")]
    NonFinite { field: &'static str, value: f32 },
    #[error("`{field}` must be in (0, 1] (got {value})")]
    OutsideUnitInterval { field: &'static str, value: f32 },
    #[error("`max_sub_steps` must be at least 1")]
    NoSubSteps,
}

impl ConfigError {
    /// Check that `value` is finite and strictly positive.
    pub(crate) fn require_positive(field: &'static str, value: f32) -> Result<(), Self> {
        if !value.is_finite() {
            return Err(Self::NonFinite { field, value });
        }
        if value <= 0.0 {
            return Err(Self::NonPositive { field, value });
        }
        Ok(())
    }

    /// Check that `value` is finite and in `(0, 1]`.
    pub(crate) fn require_unit_interval(field: &'static str, value: f32) -> Result<(), Self> {
        Self::require_positive(field, value)?;
        if value > 1.0 {
            return Err(Self::OutsideUnitInterval { field, value });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SpringError {
    #[error("spring mass must be strictly positive (got {0})")]
    NonPositiveMass(f32),
    #[error("spring frame rate must be strictly positive (got {0})")]
    NonPositiveFrameRate(f32),
}

/// Errors that abort avatar construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AvatarError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Spring(#[from] SpringError),
    #[error("animation clip `{clip}` is missing or has no length")]
    MissingClip { clip: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SeatError {
    #[error("seat {0:?} does not exist")]
    UnknownSeat(SeatId),
    #[error("seat {seat:?} is already occupied by {by:?}")]
    Occupied { seat: SeatId, by: AvatarId },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown action `{0}`")]
pub struct ParseActionError(pub String);
