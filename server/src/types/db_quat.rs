use movesync_shared::Quat;
use nalgebra as na;

/// A unit quaternion stored as four `f32` scalars in `(x, y, z, w)` order.
#[derive(spacetimedb::SpacetimeType, Debug, Clone, Copy, PartialEq)]
pub struct DbQuat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for DbQuat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl DbQuat {
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };
}

impl From<DbQuat> for Quat {
    fn from(q: DbQuat) -> Self {
        Quat::from_quaternion(na::Quaternion::new(q.w, q.x, q.y, q.z))
    }
}

impl From<Quat> for DbQuat {
    fn from(uq: Quat) -> Self {
        let q = uq.into_inner();
        DbQuat {
            x: q.i,
            y: q.j,
            z: q.k,
            w: q.w,
        }
    }
}
