//! Held-key snapshots turned into [`UnitAction`]s.
//!
//! The device layer (keyboard polling, key remapping) lives in the client. Each frame it reports
//! which directional keys are held plus the press/release edges, and [`ActionEmitter`] produces
//! the action stream, including the auto-stop actions emitted when the last key of a group is
//! released.

use crate::{
    action::UnitAction,
    bitmask_flags::BitmaskFlags,
    define_bitmask_flags,
};

define_bitmask_flags!(
    /// Directional keys understood by the emitter.
    DirectionKey, u16, {
        Forward,
        Backward,
        StrafeLeft,
        StrafeRight,
        Ascend,
        Descend,
        PitchUp,
        PitchDown,
        YawLeft,
        YawRight,
    }
);

const MOVE_KEYS: [DirectionKey; 6] = [
    DirectionKey::Forward,
    DirectionKey::Backward,
    DirectionKey::StrafeLeft,
    DirectionKey::StrafeRight,
    DirectionKey::Ascend,
    DirectionKey::Descend,
];

const TURN_KEYS: [DirectionKey; 4] = [
    DirectionKey::PitchUp,
    DirectionKey::PitchDown,
    DirectionKey::YawLeft,
    DirectionKey::YawRight,
];

/// One frame of directional input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputFrame {
    pub held: BitmaskFlags<u16>,
    pub just_pressed: BitmaskFlags<u16>,
    pub just_released: BitmaskFlags<u16>,
    /// Stop both movement and rotation this frame.
    pub brake: bool,
}

impl InputFrame {
    /// Build the frame from the previous and current held sets.
    pub fn from_transition(previous: BitmaskFlags<u16>, held: BitmaskFlags<u16>, brake: bool) -> Self {
        Self {
            held,
            just_pressed: BitmaskFlags::new(held.without(previous.bits)),
            just_released: BitmaskFlags::new(previous.without(held.bits)),
            brake,
        }
    }
}

/// Tracks whether each key group was active last frame so auto-stops fire once.
#[derive(Clone, Copy, Debug, Default)]
pub struct ActionEmitter {
    has_move_input: bool,
    has_rotate_input: bool,
}

impl ActionEmitter {
    pub fn emit(&mut self, frame: &InputFrame) -> Vec<UnitAction> {
        let mut actions = Vec::new();

        for key in DirectionKey::ALL {
            if frame.just_pressed.has(*key) {
                actions.push(start_action(*key));
            } else if frame.just_released.has(*key) {
                actions.push(stop_action(*key));
            }
        }

        if frame.brake {
            actions.push(UnitAction::AutoStopMove);
            actions.push(UnitAction::AutoStopTurn);
            self.has_move_input = false;
            self.has_rotate_input = false;
        } else {
            let has_move_input = frame.held.has_any(&MOVE_KEYS);
            if self.has_move_input && !has_move_input {
                actions.push(UnitAction::AutoStopMove);
            }
            self.has_move_input = has_move_input;
        }

        let has_rotate_input = frame.held.has_any(&TURN_KEYS);
        if self.has_rotate_input && !has_rotate_input {
            actions.push(UnitAction::AutoStopTurn);
        }
        self.has_rotate_input = has_rotate_input;

        actions
    }
}

fn start_action(key: DirectionKey) -> UnitAction {
    use DirectionKey::*;
    match key {
        Forward => UnitAction::MoveForward(1.0),
        Backward => UnitAction::MoveForward(-1.0),
        StrafeRight => UnitAction::MoveRight(1.0),
        StrafeLeft => UnitAction::MoveRight(-1.0),
        Ascend => UnitAction::MoveUp(1.0),
        Descend => UnitAction::MoveUp(-1.0),
        PitchUp => UnitAction::TurnUp(1.0),
        PitchDown => UnitAction::TurnUp(-1.0),
        YawRight => UnitAction::TurnRight(1.0),
        YawLeft => UnitAction::TurnRight(-1.0),
    }
}

fn stop_action(key: DirectionKey) -> UnitAction {
    use DirectionKey::*;
    match key {
        Forward => UnitAction::StopMoveForward(1.0),
        Backward => UnitAction::StopMoveForward(-1.0),
        StrafeRight => UnitAction::StopMoveRight(1.0),
        StrafeLeft => UnitAction::StopMoveRight(-1.0),
        Ascend => UnitAction::StopMoveUp(1.0),
        Descend => UnitAction::StopMoveUp(-1.0),
        PitchUp => UnitAction::StopTurnUp(1.0),
        PitchDown => UnitAction::StopTurnUp(-1.0),
        YawRight => UnitAction::StopTurnRight(1.0),
        YawLeft => UnitAction::StopTurnRight(-1.0),
    }
}
