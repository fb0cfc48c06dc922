//! [`RapierBackend`]: concrete physics backend using raw `rapier2d`.

use bevy::prelude::*;
use tracing::error;

use physprite_core::{PhySpriteSet, PhysicsConfig};

use crate::backend::PhysicsBackend;

use super::context::PhysicsWorld;
use super::joint::{DistanceJoint, PrismaticJoint, PulleyJoint, RevoluteJoint};
use super::systems::{
    physics_step_system, release_removed_body, release_removed_joint, sync_sprite_transforms,
};

/// Insert a [`PhysicsWorld`] built from the app's [`PhysicsConfig`].
///
/// # Panics
///
/// If the configuration is invalid. A world that cannot be built is fatal.
fn insert_physics_world(app: &mut App) {
    let config = app
        .world()
        .get_resource::<PhysicsConfig>()
        .cloned()
        .unwrap_or_default();
    match PhysicsWorld::new(&config) {
        Ok(world) => {
            app.insert_resource(world);
        }
        Err(err) => {
            error!(%err, "invalid physics configuration");
            panic!("cannot build physics world: {err}");
        }
    }
}

/// Raw rapier2d physics backend.
///
/// Inserts a [`PhysicsWorld`] resource and registers the step system in
/// [`PhySpriteSet::Step`] and the transform sync in [`PhySpriteSet::Sync`],
/// both on `Update`. Observers release the simulation objects of nodes and
/// joint entities that are despawned directly.
pub struct RapierBackend;

impl PhysicsBackend for RapierBackend {
    fn build(&self, app: &mut App) {
        insert_physics_world(app);
        app.add_systems(
            Update,
            (
                physics_step_system.in_set(PhySpriteSet::Step),
                sync_sprite_transforms.in_set(PhySpriteSet::Sync),
            ),
        );
        app.add_observer(release_removed_body)
            .add_observer(release_removed_joint::<DistanceJoint>)
            .add_observer(release_removed_joint::<RevoluteJoint>)
            .add_observer(release_removed_joint::<PulleyJoint>)
            .add_observer(release_removed_joint::<PrismaticJoint>);
    }

    fn name(&self) -> &str {
        "rapier2d"
    }
}
