use crate::schema::*;
use movesync_shared::Pose;
use spacetimedb::{ReducerContext, Table};

/// Enter the world: (re)create the caller's live body from their persisted `Player` state.
///
/// The body starts at rest and dirty, so the next movement tick publishes its first snapshot.
#[spacetimedb::reducer]
pub fn enter_world(ctx: &ReducerContext) -> Result<(), String> {
    let Some(mut player) = ctx.db.player().identity().find(ctx.sender) else {
        return Err("No player found!".into());
    };

    if player.body_id.is_some() {
        return Err("Player is already in world".into());
    }

    let pose = Pose::new(player.position.into(), player.orientation.into());
    let body = ctx
        .db
        .move_body()
        .insert(MoveBody::spawn(player.identity, pose, player.ability));
    log::info!("{:?} entered world as body {}", ctx.sender, body.id);

    player.body_id = Some(body.id);
    ctx.db.player().identity().update(player);
    Ok(())
}
