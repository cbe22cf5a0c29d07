pub mod action;
pub mod bitmask_flags;
pub mod constants;
pub mod error;
pub mod fixed_step;
pub mod inbox;
pub mod input;
pub mod kinematics;
pub mod movement;
pub mod pose;
pub mod prediction;
pub mod protocol;
pub mod quantize;
pub mod rapier;
pub mod settings;
pub mod smoothing;
pub mod stats;
pub mod validation;
pub mod wire;

pub use action::{UnitAction, apply_actions};
pub use error::{SyncError, SyncResult};
pub use fixed_step::FixedStep;
pub use input::{ActionEmitter, DirectionKey, InputFrame};
pub use kinematics::{Mover, integrate_all, integrate_mover};
pub use movement::{MoveAbility, MovementState, QuantizedMoveAbility};
pub use pose::{KinematicBody, PhysicsBody, Pose, Quat, Vec3, Velocity};
pub use prediction::{PredictionEngine, PredictionState, Reconciliation};
pub use protocol::{AuthoritativeSnapshot, MoveRequest};
pub use quantize::{CompressedQuat, QuantizedVec3, compress_quat, decompress_quat};
pub use settings::{CorrectionPolicy, SyncSettings};
pub use smoothing::RemoteSmoother;
pub use stats::SyncStats;
pub use validation::{ServerAuthority, validate_move_request};
