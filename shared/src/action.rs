//! Discrete unit actions folded into acceleration intents.
//!
//! A "start" action adds `parameter * acceleration` on its axis and the matching "stop" action
//! adds the negation, so releasing a key removes exactly what pressing it contributed. Opposite
//! inputs held together (forward + backward) cancel through the signed sum instead of one
//! overriding the other.
//!
//! Auto-stop actions only raise the stop flag. Deceleration is left to the integrator so that
//! momentum bleeds off over several steps.

use crate::{
    constants::{local_forward, local_right, local_up, pitch_up_axis, yaw_right_axis},
    movement::{MoveAbility, MovementState},
    pose::Vec3,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UnitAction {
    MoveForward(f32),
    StopMoveForward(f32),
    MoveRight(f32),
    StopMoveRight(f32),
    MoveUp(f32),
    StopMoveUp(f32),
    AutoStopMove,
    TurnUp(f32),
    StopTurnUp(f32),
    TurnRight(f32),
    StopTurnRight(f32),
    AutoStopTurn,
}

/// Fold one tick's ordered actions into `state`.
///
/// Pure and deterministic for a given action order.
pub fn apply_actions(state: &mut MovementState, ability: &MoveAbility, actions: &[UnitAction]) {
    for action in actions {
        apply_action(state, ability, *action);
    }
}

pub fn apply_action(state: &mut MovementState, ability: &MoveAbility, action: UnitAction) {
    use UnitAction::*;

    let linear = ability.linear_acceleration;
    let angular = ability.angular_acceleration;

    match action {
        MoveForward(p) => add_linear(state, local_forward() * (p * linear)),
        StopMoveForward(p) => add_linear(state, local_forward() * (-p * linear)),
        MoveRight(p) => add_linear(state, local_right() * (p * linear)),
        StopMoveRight(p) => add_linear(state, local_right() * (-p * linear)),
        MoveUp(p) => add_linear(state, local_up() * (p * linear)),
        StopMoveUp(p) => add_linear(state, local_up() * (-p * linear)),
        AutoStopMove => state.stop_movement = true,
        TurnUp(p) => add_angular(state, pitch_up_axis() * (p * angular)),
        StopTurnUp(p) => add_angular(state, pitch_up_axis() * (-p * angular)),
        TurnRight(p) => add_angular(state, yaw_right_axis() * (p * angular)),
        StopTurnRight(p) => add_angular(state, yaw_right_axis() * (-p * angular)),
        AutoStopTurn => state.stop_rotation = true,
    }
}

fn add_linear(state: &mut MovementState, delta: Vec3) {
    *state.linear_intent.get_or_insert_with(Vec3::zeros) += delta;
    state.stop_movement = false;
}

fn add_angular(state: &mut MovementState, delta: Vec3) {
    *state.angular_intent.get_or_insert_with(Vec3::zeros) += delta;
    state.stop_rotation = false;
}
