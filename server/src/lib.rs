mod reducers;
pub mod schema;
pub mod types;
mod utils;

use crate::schema::*;
use movesync_shared::SyncSettings;
use spacetimedb::*;

#[reducer(init)]
pub fn init(ctx: &ReducerContext) {
    ctx.db.sync_settings().id().delete(1);
    ctx.db
        .sync_settings()
        .insert(SyncSettingsRow::from(&SyncSettings::default()));
    reducers::movement_tick::init(ctx);
}
