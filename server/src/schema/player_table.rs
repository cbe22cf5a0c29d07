use crate::types::*;
use spacetimedb::*;

/// Player account data persisted across sessions.
///
/// The live `MoveBody` is created by `enter_world` and destroyed on leave/disconnect, at which
/// point its pose is written back here.
#[table(name = player, public)]
pub struct Player {
    #[primary_key]
    pub identity: Identity,

    /// Live body id. None if not currently in-world.
    #[index(btree)]
    pub body_id: Option<u64>,

    pub position: DbVec3,
    pub orientation: DbQuat,
    pub ability: DbMoveAbility,
}
