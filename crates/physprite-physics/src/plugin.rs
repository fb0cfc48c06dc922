//! The main physics plugin that delegates to a concrete backend.

use bevy::app::{App, Plugin};

use physprite_core::PhySpriteCorePlugin;

use crate::backend::PhysicsBackend;
use crate::rapier::RapierBackend;

/// Bevy plugin that wires a [`PhysicsBackend`] into the app.
///
/// # Usage
///
/// ```ignore
/// app.insert_resource(PhysicsConfig::default());
/// app.add_plugins(PhySpritePhysicsPlugin::new(RapierBackend));
/// ```
///
/// Adds [`PhySpriteCorePlugin`] when missing, so the frame ordering and a
/// default config are always present, then delegates to the backend's
/// [`build`](PhysicsBackend::build).
pub struct PhySpritePhysicsPlugin {
    backend: Box<dyn PhysicsBackend>,
}

impl PhySpritePhysicsPlugin {
    /// Create a new physics plugin with the given backend.
    pub fn new(backend: impl PhysicsBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    /// Plugin using [`RapierBackend`].
    pub fn rapier() -> Self {
        Self::new(RapierBackend)
    }

    /// The name of the active physics backend.
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }
}

impl Plugin for PhySpritePhysicsPlugin {
    fn build(&self, app: &mut App) {
        if !app.is_plugin_added::<PhySpriteCorePlugin>() {
            app.add_plugins(PhySpriteCorePlugin);
        }
        self.backend.build(app);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
