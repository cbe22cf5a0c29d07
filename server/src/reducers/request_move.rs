use crate::{schema::*, types::DbMoveRequest};
use movesync_shared::{
    validation::RequestOutcome,
    wire::{decode_envelope, WireBody},
    MoveRequest, SyncError,
};
use spacetimedb::ReducerContext;

/// Apply a move request from the caller to their live body.
///
/// Stale requests (sequence not newer than the last applied one) are accepted and ignored, so
/// duplicated or reordered delivery never errors. Over-limit velocities are clamped, not rejected.
#[spacetimedb::reducer]
pub fn request_move(ctx: &ReducerContext, request: DbMoveRequest) -> Result<(), String> {
    let mut body = caller_body(ctx)?;
    apply(&mut body, &request.into());
    ctx.db.move_body().id().update(body);
    Ok(())
}

/// Byte-encoded variant of [`request_move`].
///
/// Takes a move request envelope whose unchanged velocity fields may be omitted. Omitted fields
/// carry forward from the last request received for this body.
#[spacetimedb::reducer]
pub fn request_move_bytes(ctx: &ReducerContext, payload: Vec<u8>) -> Result<(), String> {
    let envelope = decode_envelope(&payload).map_err(|e| e.to_string())?;
    let WireBody::MoveRequest(msg) = envelope.body else {
        return Err(SyncError::UnexpectedMessage.to_string());
    };

    let mut body = caller_body(ctx)?;
    if envelope.entity_id != body.id {
        return Err(SyncError::UnknownEntity(envelope.entity_id).to_string());
    }

    let mut decoder = body.request_decoder();
    let request = decoder.decode(&msg);
    body.store_request_decoder(&decoder);
    apply(&mut body, &request);
    ctx.db.move_body().id().update(body);
    Ok(())
}

fn caller_body(ctx: &ReducerContext) -> Result<MoveBody, String> {
    let Some(player) = ctx.db.player().identity().find(ctx.sender) else {
        return Err("Player not found".into());
    };
    let Some(body_id) = player.body_id else {
        return Err("Body not found".into());
    };
    ctx.db
        .move_body()
        .id()
        .find(body_id)
        .ok_or_else(|| "Body not found".into())
}

fn apply(body: &mut MoveBody, request: &MoveRequest) {
    let mut authority = body.authority();
    if let RequestOutcome::Applied { .. } = authority.apply_request(request, body) {
        body.store_authority(&authority);
    }
}
