use crate::types::*;
use movesync_shared::AuthoritativeSnapshot;
use spacetimedb::*;

/// Latest authoritative snapshot per body. Clients subscribe to this table: the owner
/// reconciles against it, everybody else smooths toward it.
#[table(name = move_snapshot, public)]
pub struct MoveSnapshot {
    #[primary_key]
    pub body_id: u64,

    #[index(btree)]
    pub owner: Identity,

    /// Absolute position at `POSITION_SCALE`.
    pub position: DbQuantizedVec3,
    /// Smallest-three packed orientation.
    pub orientation: u32,
    pub verified: Option<DbMoveRequest>,

    /// Server tick that produced this row.
    pub tick: u64,
}

impl MoveSnapshot {
    pub fn from_snapshot(snapshot: &AuthoritativeSnapshot, owner: Identity, tick: u64) -> Self {
        Self {
            body_id: snapshot.entity_id,
            owner,
            position: snapshot.position.into(),
            orientation: snapshot.orientation.0,
            verified: snapshot.verified.map(DbMoveRequest::from),
            tick,
        }
    }
}
