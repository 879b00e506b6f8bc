use crate::constants::{LANDING_ROLL_IMPACT_Y, LANDING_RUN_IMPACT_Y};

use super::StateKind;

/// Pick the state to land in from the vertical impact speed and the held input.
pub fn select_landing_state(impact_velocity_y: f32, any_direction: bool, run: bool) -> StateKind {
    if impact_velocity_y < LANDING_ROLL_IMPACT_Y {
        return StateKind::DropRolling;
    }
    if !any_direction {
        return StateKind::DropIdle;
    }
    if impact_velocity_y < LANDING_RUN_IMPACT_Y {
        StateKind::DropRunning
    } else if run {
        StateKind::Sprint
    } else {
        StateKind::Walk
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hard_impact_rolls_regardless_of_input() {
        assert_eq!(select_landing_state(-8.0, false, false), StateKind::DropRolling);
        assert_eq!(select_landing_state(-8.0, true, true), StateKind::DropRolling);
    }

    #[test]
    fn medium_impact_with_direction_drops_running() {
        assert_eq!(select_landing_state(-3.0, true, false), StateKind::DropRunning);
        assert_eq!(select_landing_state(-3.0, false, false), StateKind::DropIdle);
    }

    #[test]
    fn soft_impact_keeps_moving() {
        assert_eq!(select_landing_state(-1.0, true, true), StateKind::Sprint);
        assert_eq!(select_landing_state(-1.0, true, false), StateKind::Walk);
        assert_eq!(select_landing_state(-1.0, false, true), StateKind::DropIdle);
    }

    #[test]
    fn thresholds_are_strict() {
        assert_eq!(select_landing_state(-6.0, true, false), StateKind::DropRunning);
        assert_eq!(select_landing_state(-2.0, true, false), StateKind::Walk);
    }
}
