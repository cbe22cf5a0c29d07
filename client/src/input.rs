//! Keyboard → unit actions.
//!
//! leafwing-input-manager owns the key bindings; each frame the held directional keys are folded
//! into an `InputFrame` and `ActionEmitter` turns the edges into unit actions. Actions are buffered
//! until the next fixed movement step consumes them.

use crate::AppSystems;
use bevy::prelude::*;
use leafwing_input_manager::prelude::*;
use movesync_shared::{
    ActionEmitter, DirectionKey, InputFrame, UnitAction, bitmask_flags::BitmaskFlags,
};

#[derive(Reflect, Actionlike, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputAction {
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
    /// Stop both movement and rotation.
    Brake,
}

impl InputAction {
    fn direction_key(self) -> Option<DirectionKey> {
        use InputAction::*;
        Some(match self {
            Forward => DirectionKey::Forward,
            Backward => DirectionKey::Backward,
            StrafeLeft => DirectionKey::StrafeLeft,
            StrafeRight => DirectionKey::StrafeRight,
            Ascend => DirectionKey::Ascend,
            Descend => DirectionKey::Descend,
            PitchUp => DirectionKey::PitchUp,
            PitchDown => DirectionKey::PitchDown,
            YawLeft => DirectionKey::YawLeft,
            YawRight => DirectionKey::YawRight,
            Brake => return None,
        })
    }
}

const DIRECTIONAL: [InputAction; 10] = [
    InputAction::Forward,
    InputAction::Backward,
    InputAction::StrafeLeft,
    InputAction::StrafeRight,
    InputAction::Ascend,
    InputAction::Descend,
    InputAction::PitchUp,
    InputAction::PitchDown,
    InputAction::YawLeft,
    InputAction::YawRight,
];

/// Unit actions waiting for the next fixed movement step.
#[derive(Resource, Default, Debug)]
pub struct PendingActions(pub Vec<UnitAction>);

/// Held keys as of last frame, plus the auto-stop tracker.
#[derive(Resource, Default)]
struct InputTracker {
    held: BitmaskFlags<u16>,
    emitter: ActionEmitter,
}

pub(super) fn plugin(app: &mut App) {
    app.add_plugins(InputManagerPlugin::<InputAction>::default());

    app.register_type::<InputAction>();

    app.insert_resource(default_input_map());
    app.insert_resource(ActionState::<InputAction>::default());
    app.init_resource::<PendingActions>();
    app.init_resource::<InputTracker>();

    app.add_systems(Update, record_actions.in_set(AppSystems::RecordInput));
}

fn default_input_map() -> InputMap<InputAction> {
    InputMap::new([
        (InputAction::Forward, KeyCode::KeyW),
        (InputAction::Backward, KeyCode::KeyS),
        (InputAction::StrafeLeft, KeyCode::KeyA),
        (InputAction::StrafeRight, KeyCode::KeyD),
        (InputAction::Ascend, KeyCode::KeyE),
        (InputAction::Descend, KeyCode::KeyQ),
        (InputAction::PitchUp, KeyCode::ArrowUp),
        (InputAction::PitchDown, KeyCode::ArrowDown),
        (InputAction::YawLeft, KeyCode::ArrowLeft),
        (InputAction::YawRight, KeyCode::ArrowRight),
        (InputAction::Brake, KeyCode::Space),
    ])
}

fn record_actions(
    actions: Res<ActionState<InputAction>>,
    mut tracker: ResMut<InputTracker>,
    mut pending: ResMut<PendingActions>,
) {
    let mut held = BitmaskFlags::<u16>::default();
    for action in DIRECTIONAL {
        if let Some(key) = action.direction_key() {
            held.set(key, actions.pressed(&action));
        }
    }
    let brake = actions.just_pressed(&InputAction::Brake);

    let frame = InputFrame::from_transition(tracker.held, held, brake);
    tracker.held = held;
    let emitted = tracker.emitter.emit(&frame);
    if !emitted.is_empty() {
        debug!("input actions: {emitted:?}");
        pending.0.extend(emitted);
    }
}
