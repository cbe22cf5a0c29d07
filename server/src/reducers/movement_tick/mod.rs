//! Authoritative movement tick.
//!
//! - `constants.rs`: tick rate and logging knobs
//! - `tick.rs`: scheduled timer + reducer that integrates bodies and publishes snapshots

mod constants;
mod tick;

/// Schedule the movement tick. Called from the crate `init` reducer.
pub fn init(ctx: &spacetimedb::ReducerContext) {
    tick::init(ctx);
}
