mod connection;
pub mod enter_world;
pub mod leave_world;
pub(crate) mod movement_tick;
pub mod request_move;

use crate::schema::*;
use spacetimedb::ReducerContext;

/// Persist the live body's pose back to `player` and despawn it.
pub(crate) fn despawn_body(ctx: &ReducerContext, mut player: Player) {
    let Some(body_id) = player.body_id else {
        return;
    };

    if let Some(body) = ctx.db.move_body().id().find(body_id) {
        player.position = body.position;
        player.orientation = body.orientation;
        ctx.db.move_body().id().delete(body.id);
    } else {
        log::warn!("{:?} had a dangling body id {body_id}", player.identity);
    }
    ctx.db.move_snapshot().body_id().delete(body_id);

    player.body_id = None;
    ctx.db.player().identity().update(player);
}
