// Support configuring Bevy lints within code.
#![cfg_attr(bevy_lint, feature(register_tool), register_tool(bevy))]
// Disable console on Windows for non-dev builds.
#![cfg_attr(not(feature = "dev"), windows_subsystem = "windows")]

#[cfg(feature = "dev_native")]
mod debug_tools;

mod actor;
mod camera;
mod convert;
mod input;
mod net;
mod world;

#[cfg(target_os = "macos")]
use bevy::window::CompositeAlphaMode;

use bevy::prelude::*;

fn main() -> AppExit {
    App::new().add_plugins(AppPlugin).run()
}

/// Per-frame ordering of the movement pipeline.
///
/// Reconciliation runs before the local step so a correction is predicted forward in the same
/// frame. The loopback authority runs after the step so it sees this frame's request.
#[derive(SystemSet, Debug, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum AppSystems {
    RecordInput,
    Receive,
    Simulate,
    Transport,
    Present,
}

pub struct AppPlugin;
impl Plugin for AppPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Window {
                title: "Movement Sync".to_string(),
                fit_canvas_to_parent: true,
                #[cfg(target_os = "macos")]
                composite_alpha_mode: CompositeAlphaMode::PostMultiplied,
                ..default()
            }
            .into(),
            ..default()
        }));

        app.configure_sets(
            Update,
            (
                AppSystems::RecordInput,
                AppSystems::Receive,
                AppSystems::Simulate,
                AppSystems::Transport,
                AppSystems::Present,
            )
                .chain(),
        );

        app.add_plugins((
            net::plugin,
            world::plugin,
            input::plugin,
            actor::plugin,
            camera::plugin,
        ));

        #[cfg(feature = "dev_native")]
        app.add_plugins(debug_tools::plugin);
    }
}
