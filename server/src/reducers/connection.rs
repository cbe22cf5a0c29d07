//! Connection lifecycle reducers.
//!
//! - On connect: ensure a `Player` row exists and clear any dangling `body_id`.
//! - On disconnect: persist the live body's pose back to the `Player` row, then despawn it.

use crate::{reducers::despawn_body, schema::*, types::*};
use spacetimedb::{ReducerContext, Table};

/// Fired when a client connects to the module.
///
/// This reducer does not spawn a body. That is handled by `enter_world`.
#[spacetimedb::reducer(client_connected)]
pub fn identity_connected(ctx: &ReducerContext) {
    log::info!("Client connected: {:?}", ctx.sender);

    if let Some(player) = ctx.db.player().identity().find(ctx.sender) {
        // Body left over from an unclean shutdown.
        if player.body_id.is_some() {
            despawn_body(ctx, player);
        }
    } else {
        ctx.db.player().insert(Player {
            identity: ctx.sender,
            body_id: None,
            position: DbVec3::ZERO,
            orientation: DbQuat::default(),
            ability: DbMoveAbility::default(),
        });
    }
}

/// Fired when a client disconnects from the module.
#[spacetimedb::reducer(client_disconnected)]
pub fn identity_disconnected(ctx: &ReducerContext) {
    log::info!("Client disconnected: {:?}", ctx.sender);

    let Some(player) = ctx.db.player().identity().find(ctx.sender) else {
        return;
    };
    despawn_body(ctx, player);
}
