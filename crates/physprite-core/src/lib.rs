// physprite-core: units, configuration, errors and frame ordering for PhySprite.

pub mod config;
pub mod error;
pub mod units;

use bevy::prelude::*;

pub use config::PhysicsConfig;
pub use error::{BindingError, ConfigError, PhySpriteError};
pub use units::{WorldScale, to_degrees, to_radians};

// ---------------------------------------------------------------------------
// PhySpriteSet
// ---------------------------------------------------------------------------

/// Per-frame ordering of the physics adapter.
///
/// `Step` always runs before `Sync`, so nodes are written from post-step
/// state.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhySpriteSet {
    /// Advance the simulation.
    Step,
    /// Copy simulated poses into node transforms.
    Sync,
}

// ---------------------------------------------------------------------------
// PhySpriteCorePlugin
// ---------------------------------------------------------------------------

/// Registers [`PhySpriteSet`] ordering on `Update` and a default
/// [`PhysicsConfig`] when the app has none.
pub struct PhySpriteCorePlugin;

impl Plugin for PhySpriteCorePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PhysicsConfig>();
        app.configure_sets(Update, (PhySpriteSet::Step, PhySpriteSet::Sync).chain());
    }
}
