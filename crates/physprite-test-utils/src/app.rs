//! Bevy test app builders with various plugin combinations.

use bevy::prelude::*;

use physprite_core::{PhySpriteCorePlugin, PhysicsConfig};
use physprite_physics::PhySpritePhysicsPlugin;

/// Create a minimal test app with only the core plugin.
///
/// Provides `PhySpriteSet` ordering and a default [`PhysicsConfig`] but no
/// physics world.
pub fn minimal_test_app() -> App {
    let mut app = App::new();
    app.add_plugins(PhySpriteCorePlugin);
    app.finish();
    app.cleanup();
    app
}

/// Create a test app with the rapier backend and the default config
/// (gravity [0, -9.8], 32 px/m, fixed 1/30 s steps).
pub fn physics_test_app() -> App {
    physics_test_app_with(PhysicsConfig::default())
}

/// Create a test app with the rapier backend and the given config.
pub fn physics_test_app_with(config: PhysicsConfig) -> App {
    let mut app = App::new();
    app.insert_resource(config);
    app.add_plugins(PhySpritePhysicsPlugin::rapier());
    app.finish();
    app.cleanup();
    app
}

/// Run `frames` app updates.
pub fn run_frames(app: &mut App, frames: usize) {
    for _ in 0..frames {
        app.update();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
