mod db_move;
mod db_quat;
mod db_vec3;

pub use db_move::{DbMoveAbility, DbMoveRequest, DbQuantizedVec3};
pub use db_quat::DbQuat;
pub use db_vec3::DbVec3;
