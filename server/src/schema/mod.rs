mod move_body_table;
mod move_snapshot_table;
mod player_table;
mod sync_settings_table;

pub use move_body_table::*;
pub use move_snapshot_table::*;
pub use player_table::*;
pub use sync_settings_table::*;
