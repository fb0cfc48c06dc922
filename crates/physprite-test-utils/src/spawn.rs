//! Entity spawn helpers for tests.

use bevy::prelude::*;

use physprite_physics::prelude::{BindingError, BodyBinding, BodyKind, FixtureDef, PhysicsWorld};

/// Spawn a node bound to a box body of `size` pixels, placed at `at`.
pub fn spawn_box(app: &mut App, at: Vec2, size: Vec2, kind: BodyKind) -> Entity {
    spawn_bound(app, at, |world, node| {
        BodyBinding::create_box(world, node, size, kind, FixtureDef::default())
    })
}

/// Spawn a node bound to a circle body of `radius` pixels, placed at `at`.
pub fn spawn_circle(app: &mut App, at: Vec2, radius: f32, kind: BodyKind) -> Entity {
    spawn_bound(app, at, |world, node| {
        BodyBinding::create_circle(world, node, radius, kind, FixtureDef::default())
    })
}

fn spawn_bound<F>(app: &mut App, at: Vec2, create: F) -> Entity
where
    F: FnOnce(&mut PhysicsWorld, Entity) -> Result<BodyBinding, BindingError>,
{
    let mut transform = Transform::default();
    let node = app.world_mut().spawn_empty().id();
    let binding = app
        .world_mut()
        .resource_scope(|_, mut world: Mut<PhysicsWorld>| {
            let binding = create(&mut *world, node)?;
            binding.set_position(&mut world, &mut transform, at);
            Ok::<_, BindingError>(binding)
        })
        .unwrap();
    app.world_mut().entity_mut(node).insert((transform, binding));
    node
}

/// Run `f` with the physics world and the [`BodyBinding`]s of `a` and `b`,
/// e.g. to create a joint between them.
///
/// # Panics
///
/// If either node has no binding.
pub fn with_bindings<R>(
    app: &mut App,
    a: Entity,
    b: Entity,
    f: impl FnOnce(&mut PhysicsWorld, &BodyBinding, &BodyBinding) -> R,
) -> R {
    app.world_mut()
        .resource_scope(|ecs, mut world: Mut<PhysicsWorld>| {
            let ba = ecs.get::<BodyBinding>(a).unwrap();
            let bb = ecs.get::<BodyBinding>(b).unwrap();
            f(&mut *world, ba, bb)
        })
}

/// Spawn an entity and attach the joint component built by `build`.
pub fn spawn_joint<J, F>(app: &mut App, a: Entity, b: Entity, build: F) -> Entity
where
    J: Component,
    F: FnOnce(&mut PhysicsWorld, Entity, &BodyBinding, &BodyBinding) -> Result<J, BindingError>,
{
    let entity = app.world_mut().spawn_empty().id();
    let joint = with_bindings(app, a, b, |world, ba, bb| build(world, entity, ba, bb)).unwrap();
    app.world_mut().entity_mut(entity).insert(joint);
    entity
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::physics_test_app;
    use physprite_physics::prelude::{DistanceJoint, ShapeKind};

    #[test]
    fn spawn_box_binds_node() {
        let mut app = physics_test_app();
        let at = Vec2::new(10.0, 20.0);
        let node = spawn_box(&mut app, at, Vec2::splat(32.0), BodyKind::Dynamic);

        let binding = app.world().get::<BodyBinding>(node).unwrap();
        assert_eq!(binding.node(), node);
        assert_eq!(binding.shape(), ShapeKind::Box);
        let world = app.world().resource::<PhysicsWorld>();
        assert_eq!(world.entity_for_body(binding.body_handle()), Some(node));
        assert!((binding.x(world) - 10.0).abs() < 1e-4);
    }

    #[test]
    fn spawn_circle_binds_node() {
        let mut app = physics_test_app();
        let node = spawn_circle(&mut app, Vec2::ZERO, 8.0, BodyKind::Static);
        let binding = app.world().get::<BodyBinding>(node).unwrap();
        assert_eq!(binding.shape(), ShapeKind::Circle);
    }

    #[test]
    fn spawn_joint_attaches_component() {
        let mut app = physics_test_app();
        let a = spawn_box(&mut app, Vec2::ZERO, Vec2::splat(16.0), BodyKind::Static);
        let below = Vec2::new(0.0, -48.0);
        let b = spawn_box(&mut app, below, Vec2::splat(16.0), BodyKind::Dynamic);
        let joint = spawn_joint(&mut app, a, b, DistanceJoint::new);

        assert!(app.world().get::<DistanceJoint>(joint).is_some());
        assert_eq!(app.world().resource::<PhysicsWorld>().joint_count(), 1);
    }
}
