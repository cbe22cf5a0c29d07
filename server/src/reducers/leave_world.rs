use crate::{reducers::despawn_body, schema::*};
use spacetimedb::ReducerContext;

/// Leave the world: persist the caller's pose and despawn the live body.
///
/// A no-op when the caller has no live body.
#[spacetimedb::reducer]
pub fn leave_world(ctx: &ReducerContext) {
    let Some(player) = ctx.db.player().identity().find(ctx.sender) else {
        return;
    };
    despawn_body(ctx, player);
}
