use crate::types::*;
use movesync_shared::{
    validation::ServerAuthority, wire::MoveRequestDecoder, MoveRequest, PhysicsBody, Pose,
    Velocity,
};
use spacetimedb::*;

/// Server-side physics state of one controlled entity.
///
/// Private: clients only ever see the published `move_snapshot` rows.
#[table(name = move_body)]
#[derive(Clone, Debug)]
pub struct MoveBody {
    #[primary_key]
    #[auto_inc]
    pub id: u64,

    #[unique]
    pub owner: Identity,

    pub position: DbVec3,
    pub orientation: DbQuat,
    pub linear_velocity: DbVec3,
    pub angular_velocity: DbVec3,

    pub ability: DbMoveAbility,

    /// Sequence of the last applied request. Older or equal sequences are ignored.
    pub last_sequence: Option<u32>,
    /// Last applied request after clamping; echoed in every snapshot.
    pub verified: Option<DbMoveRequest>,
    /// Last received (pre-clamp) velocities, so byte requests can omit unchanged fields.
    pub received_linear: DbQuantizedVec3,
    pub received_angular: DbQuantizedVec3,

    /// A request was applied since the last published snapshot.
    pub dirty: bool,
    pub violations: u64,
}

impl MoveBody {
    pub fn spawn(owner: Identity, pose: Pose, ability: DbMoveAbility) -> Self {
        Self {
            id: 0,
            owner,
            position: pose.position.into(),
            orientation: pose.orientation.into(),
            linear_velocity: DbVec3::ZERO,
            angular_velocity: DbVec3::ZERO,
            ability,
            last_sequence: None,
            verified: None,
            received_linear: DbQuantizedVec3::default(),
            received_angular: DbQuantizedVec3::default(),
            dirty: true,
            violations: 0,
        }
    }

    /// Rebuild the authority from the row.
    pub fn authority(&self) -> ServerAuthority {
        ServerAuthority {
            entity_id: self.id,
            ability: self.ability.into(),
            last_sequence: self.last_sequence,
            verified: self.verified.map(MoveRequest::from),
            dirty: self.dirty,
            violations: self.violations,
        }
    }

    /// Write the authority's state back into the row.
    pub fn store_authority(&mut self, authority: &ServerAuthority) {
        self.last_sequence = authority.last_sequence;
        self.verified = authority.verified.map(DbMoveRequest::from);
        self.dirty = authority.dirty;
        self.violations = authority.violations;
    }

    pub fn request_decoder(&self) -> MoveRequestDecoder {
        MoveRequestDecoder::resume(self.received_linear.into(), self.received_angular.into())
    }

    pub fn store_request_decoder(&mut self, decoder: &MoveRequestDecoder) {
        let (linear, angular) = decoder.last();
        self.received_linear = linear.into();
        self.received_angular = angular.into();
    }
}

impl PhysicsBody for MoveBody {
    fn pose(&self) -> Pose {
        Pose::new(self.position.into(), self.orientation.into())
    }

    fn velocity(&self) -> Velocity {
        Velocity::new(self.linear_velocity.into(), self.angular_velocity.into())
    }

    fn set_pose(&mut self, pose: Pose) {
        self.position = pose.position.into();
        self.orientation = pose.orientation.into();
    }

    fn set_velocity(&mut self, velocity: Velocity) {
        self.linear_velocity = velocity.linear.into();
        self.angular_velocity = velocity.angular.into();
    }
}
