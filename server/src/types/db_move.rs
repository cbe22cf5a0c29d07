//! Fixed-point movement types as stored in tables and sent by clients.

use movesync_shared::{MoveAbility, MoveRequest, QuantizedMoveAbility, QuantizedVec3};

/// Per-axis fixed-point vector; the scale depends on the column (see `movesync_shared::constants`).
#[derive(spacetimedb::SpacetimeType, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DbQuantizedVec3 {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl From<DbQuantizedVec3> for QuantizedVec3 {
    fn from(v: DbQuantizedVec3) -> Self {
        QuantizedVec3::new(v.x, v.y, v.z)
    }
}

impl From<QuantizedVec3> for DbQuantizedVec3 {
    fn from(v: QuantizedVec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

/// A client move request (velocities at `VELOCITY_SCALE`).
#[derive(spacetimedb::SpacetimeType, Debug, Default, Clone, Copy, PartialEq)]
pub struct DbMoveRequest {
    pub sequence: u32,
    pub client_time: f32,
    pub linear_velocity: DbQuantizedVec3,
    pub angular_velocity: DbQuantizedVec3,
}

impl From<DbMoveRequest> for MoveRequest {
    fn from(r: DbMoveRequest) -> Self {
        MoveRequest {
            sequence: r.sequence,
            client_time: r.client_time,
            linear_velocity: r.linear_velocity.into(),
            angular_velocity: r.angular_velocity.into(),
        }
    }
}

impl From<MoveRequest> for DbMoveRequest {
    fn from(r: MoveRequest) -> Self {
        Self {
            sequence: r.sequence,
            client_time: r.client_time,
            linear_velocity: r.linear_velocity.into(),
            angular_velocity: r.angular_velocity.into(),
        }
    }
}

/// Movement ability at `VELOCITY_SCALE`, the way abilities are persisted.
#[derive(spacetimedb::SpacetimeType, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbMoveAbility {
    pub linear_acceleration: i32,
    pub angular_acceleration: i32,
    pub max_linear_speed: i32,
    pub max_angular_speed: i32,
}

impl Default for DbMoveAbility {
    fn default() -> Self {
        MoveAbility::default().into()
    }
}

impl From<DbMoveAbility> for MoveAbility {
    fn from(a: DbMoveAbility) -> Self {
        MoveAbility::from_quantized(QuantizedMoveAbility {
            linear_acceleration: a.linear_acceleration,
            angular_acceleration: a.angular_acceleration,
            max_linear_speed: a.max_linear_speed,
            max_angular_speed: a.max_angular_speed,
        })
    }
}

impl From<MoveAbility> for DbMoveAbility {
    fn from(a: MoveAbility) -> Self {
        let q = a.to_quantized();
        Self {
            linear_acceleration: q.linear_acceleration,
            angular_acceleration: q.angular_acceleration,
            max_linear_speed: q.max_linear_speed,
            max_angular_speed: q.max_angular_speed,
        }
    }
}
