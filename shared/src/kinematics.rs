//! Fixed-step velocity integration from acceleration intents.
//!
//! Each step is a pure function of one entity's state, so the batch path runs as a data-parallel
//! map (rayon, behind the `parallel` feature). Clearing intents and stop flags changes the shape
//! of the movement state, so those edits are collected during the pass and applied afterwards.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::{
    constants::VELOCITY_EPS_SQ,
    movement::{MoveAbility, MovementState, StructuralEdit},
    pose::{Quat, Vec3, Velocity},
};

/// Everything the integrator needs for one entity.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Mover {
    pub ability: MoveAbility,
    pub state: MovementState,
    pub orientation: Quat,
    pub velocity: Velocity,
}

/// Structural edits produced by one entity's step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepEdits {
    pub linear: Option<StructuralEdit>,
    pub angular: Option<StructuralEdit>,
}

impl StepEdits {
    pub fn is_empty(&self) -> bool {
        self.linear.is_none() && self.angular.is_none()
    }

    pub fn apply(self, state: &mut MovementState) {
        if let Some(edit) = self.linear {
            state.apply_edit(edit);
        }
        if let Some(edit) = self.angular {
            state.apply_edit(edit);
        }
    }
}

/// Advance `velocity` by one step of `dt` seconds.
///
/// `state` is read only; the returned edits must be applied for the stop logic to terminate.
pub fn integrate_velocity(
    velocity: &mut Velocity,
    orientation: &Quat,
    state: &MovementState,
    ability: &MoveAbility,
    dt: f32,
) -> StepEdits {
    let mut edits = StepEdits::default();

    if state.stop_movement {
        if brake(&mut velocity.linear, ability.linear_acceleration * dt) {
            edits.linear = Some(StructuralEdit::MovementStopped);
        }
    } else if let Some(intent) = state.linear_intent {
        velocity.linear += orientation * intent * dt;
        clamp_magnitude(&mut velocity.linear, ability.max_linear_speed);
    }

    if state.stop_rotation {
        if brake(&mut velocity.angular, ability.angular_acceleration * dt) {
            edits.angular = Some(StructuralEdit::RotationStopped);
        }
    } else if let Some(intent) = state.angular_intent {
        velocity.angular += intent * dt;
        clamp_components(&mut velocity.angular, ability.max_angular_speed);
    }

    edits
}

/// Step a single entity and apply its edits immediately.
pub fn integrate_mover(mover: &mut Mover, dt: f32) -> StepEdits {
    let edits = integrate_velocity(
        &mut mover.velocity,
        &mover.orientation,
        &mover.state,
        &mover.ability,
        dt,
    );
    edits.apply(&mut mover.state);
    edits
}

/// Step every mover. Velocities are advanced in one pass (in parallel when enabled), then the
/// structural edits are applied in index order. Returns the number of edits applied.
pub fn integrate_all(movers: &mut [Mover], dt: f32) -> usize {
    let step = |(index, mover): (usize, &mut Mover)| {
        let edits = integrate_velocity(
            &mut mover.velocity,
            &mover.orientation,
            &mover.state,
            &mover.ability,
            dt,
        );
        (!edits.is_empty()).then_some((index, edits))
    };

    #[cfg(feature = "parallel")]
    let pending: Vec<(usize, StepEdits)> =
        movers.par_iter_mut().enumerate().filter_map(step).collect();

    #[cfg(not(feature = "parallel"))]
    let pending: Vec<(usize, StepEdits)> =
        movers.iter_mut().enumerate().filter_map(step).collect();

    let mut applied = 0;
    for (index, edits) in pending {
        applied += usize::from(edits.linear.is_some()) + usize::from(edits.angular.is_some());
        edits.apply(&mut movers[index].state);
    }
    applied
}

/// Decelerate `v` toward zero by `step`. Returns true once it reached zero.
fn brake(v: &mut Vec3, step: f32) -> bool {
    if v.norm_squared() < step * step || v.norm_squared() <= VELOCITY_EPS_SQ {
        *v = Vec3::zeros();
        return true;
    }
    *v -= v.normalize() * step;
    false
}

fn clamp_magnitude(v: &mut Vec3, max: f32) {
    let len_sq = v.norm_squared();
    if len_sq > max * max {
        *v *= max / len_sq.sqrt();
    }
}

fn clamp_components(v: &mut Vec3, max: f32) {
    v.iter_mut().for_each(|c| *c = c.clamp(-max, max));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{action::apply_actions, action::UnitAction};

    const DT: f32 = 1.0 / 15.0;

    fn mover_with(actions: &[UnitAction]) -> Mover {
        let mut mover = Mover::default();
        apply_actions(&mut mover.state, &mover.ability, actions);
        mover
    }

    #[test]
    fn drive_accelerates_along_rotated_forward() {
        let mut mover = mover_with(&[UnitAction::MoveForward(1.0)]);
        mover.orientation = Quat::from_axis_angle(&Vec3::y_axis(), std::f32::consts::FRAC_PI_2);
        integrate_mover(&mut mover, DT);
        // Forward (-Z) turned 90 degrees about +Y points along -X.
        let expected = Vec3::new(-DT, 0.0, 0.0);
        assert!((mover.velocity.linear - expected).norm() < 1.0e-6);
    }

    #[test]
    fn linear_speed_never_exceeds_cap() {
        let mut mover = mover_with(&[UnitAction::MoveForward(1.0), UnitAction::MoveRight(1.0)]);
        mover.ability.linear_acceleration = 50.0;
        apply_actions(&mut mover.state, &mover.ability, &[UnitAction::MoveUp(1.0)]);
        for _ in 0..200 {
            integrate_mover(&mut mover, DT);
            assert!(mover.velocity.linear.norm() <= mover.ability.max_linear_speed + 1.0e-4);
        }
    }

    #[test]
    fn angular_speed_clamped_per_component() {
        let mut mover = mover_with(&[UnitAction::TurnRight(1.0), UnitAction::TurnUp(1.0)]);
        mover.ability.angular_acceleration = 40.0;
        for _ in 0..30 {
            integrate_mover(&mut mover, DT);
        }
        let max = mover.ability.max_angular_speed;
        assert!((mover.velocity.angular.x - max).abs() < 1.0e-5);
        assert!((mover.velocity.angular.y + max).abs() < 1.0e-5);
    }

    #[test]
    fn stop_converges_to_exact_zero_and_clears_state() {
        let mut mover = mover_with(&[UnitAction::MoveForward(1.0), UnitAction::AutoStopMove]);
        mover.velocity.linear = Vec3::new(0.0, 0.0, -3.0);

        let bound = (3.0 / (mover.ability.linear_acceleration * DT)).ceil() as usize + 1;
        let mut steps = 0;
        while mover.state.stop_movement {
            integrate_mover(&mut mover, DT);
            steps += 1;
            assert!(steps <= bound, "did not stop within {bound} steps");
        }

        assert_eq!(mover.velocity.linear, Vec3::zeros());
        assert_eq!(mover.state.linear_intent, None);
        assert!(mover.state.is_idle());
    }

    #[test]
    fn stop_ignores_intent_while_braking() {
        let mut mover = mover_with(&[UnitAction::MoveForward(1.0), UnitAction::AutoStopMove]);
        mover.velocity.linear = Vec3::new(0.0, 0.0, -1.0);
        integrate_mover(&mut mover, DT);
        assert!((mover.velocity.linear.z + 1.0 - DT).abs() < 1.0e-6);
    }

    #[test]
    fn batch_applies_edits_after_pass() {
        let mut movers = vec![
            mover_with(&[UnitAction::AutoStopMove]),
            mover_with(&[UnitAction::MoveForward(1.0)]),
            mover_with(&[UnitAction::AutoStopMove, UnitAction::AutoStopTurn]),
        ];
        movers[1].velocity.linear = Vec3::new(0.0, 0.0, -1.0);

        let applied = integrate_all(&mut movers, DT);

        assert_eq!(applied, 3);
        assert!(movers[0].state.is_idle());
        assert!(movers[2].state.is_idle());
        assert!((movers[1].velocity.linear.z + 1.0 + DT).abs() < 1.0e-6);
        assert!(movers[1].state.linear_intent.is_some());
    }
}
