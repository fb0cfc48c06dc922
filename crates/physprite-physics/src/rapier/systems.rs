//! Frame systems: step the world, then copy poses onto nodes.

use bevy::prelude::*;

use physprite_core::PhysicsConfig;

use super::bridge::from_vector;
use super::body::BodyBinding;
use super::context::PhysicsWorld;
use super::joint::BoundJoint;
use crate::components::BindingState;

/// Advance the [`PhysicsWorld`] once per frame.
///
/// Uses the configured fixed timestep, or the frame delta from [`Time`]
/// when the config has none.
pub fn physics_step_system(
    mut world: ResMut<PhysicsWorld>,
    config: Res<PhysicsConfig>,
    time: Option<Res<Time>>,
) {
    let dt = match config.timestep {
        Some(dt) => dt,
        None => time.map_or(0.0, |t| t.delta_secs()),
    };
    // The first frame has no delta yet.
    if dt > 0.0 {
        world.step(dt);
    }
}

/// Write each bound body's pose into its node's [`Transform`].
///
/// Static bodies are skipped; they only move when set explicitly, which
/// already updates the node. Z and scale are left untouched.
pub fn sync_sprite_transforms(
    world: Res<PhysicsWorld>,
    mut nodes: Query<(&BodyBinding, &mut Transform)>,
) {
    let scale = world.scale();
    for (binding, mut transform) in &mut nodes {
        if binding.state() != BindingState::Active {
            continue;
        }
        let Some(body) = world.rigid_bodies().get(binding.body_handle()) else {
            continue;
        };
        if body.is_fixed() {
            continue;
        }
        let position = scale.vec_to_pixels(from_vector(body.translation()));
        transform.translation.x = position.x;
        transform.translation.y = position.y;
        transform.rotation = Quat::from_rotation_z(body.rotation().angle());
    }
}

/// Drop the body of a node whose [`BodyBinding`] is removed or despawned
/// without going through [`BodyBinding::destroy`].
pub fn release_removed_body(
    trigger: Trigger<OnRemove, BodyBinding>,
    nodes: Query<&BodyBinding>,
    world: Option<ResMut<PhysicsWorld>>,
) {
    let (Ok(binding), Some(mut world)) = (nodes.get(trigger.target()), world) else {
        return;
    };
    if binding.state() == BindingState::Active {
        world.forget_body(binding.body_handle(), binding.node());
    }
}

/// Drop the simulation joint of a joint entity that goes away without
/// being destroyed.
pub fn release_removed_joint<J: BoundJoint>(
    trigger: Trigger<OnRemove, J>,
    joints: Query<&J>,
    world: Option<ResMut<PhysicsWorld>>,
) {
    let (Ok(joint), Some(mut world)) = (joints.get(trigger.target()), world) else {
        return;
    };
    let binding = joint.binding();
    if binding.state() == BindingState::Active {
        world.forget_joint(binding.id(), binding.entity());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
