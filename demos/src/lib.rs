//! Shared scene setup for the PhySprite demos.

use bevy::prelude::*;
use tracing::warn;

use physprite_core::{ConfigError, PhysicsConfig};
use physprite_physics::prelude::*;

/// Width and height of the demo floor in pixels.
pub const FLOOR_SIZE: Vec2 = Vec2::new(800.0, 32.0);

/// Load a config from `path`, or the defaults when no path is given.
pub fn load_config(path: Option<&std::path::Path>) -> Result<PhysicsConfig, ConfigError> {
    path.map_or_else(|| Ok(PhysicsConfig::default()), PhysicsConfig::from_file)
}

/// Headless app with the rapier backend and `config`.
pub fn headless_app(config: PhysicsConfig) -> App {
    let mut app = App::new();
    app.insert_resource(config);
    app.add_plugins(PhySpritePhysicsPlugin::rapier());
    app.finish();
    app.cleanup();
    app
}

/// Spawn a node and bind it to a body built by `create`, placed at `at`.
pub fn spawn_sprite(
    app: &mut App,
    at: Vec2,
    create: impl FnOnce(&mut PhysicsWorld, Entity) -> Result<BodyBinding, BindingError>,
) -> Result<Entity, BindingError> {
    let node = app.world_mut().spawn_empty().id();
    let mut transform = Transform::default();
    let created = app
        .world_mut()
        .resource_scope(|_, mut world: Mut<PhysicsWorld>| {
            let binding = create(&mut world, node)?;
            binding.set_position(&mut world, &mut transform, at);
            Ok(binding)
        });
    match created {
        Ok(binding) => {
            app.world_mut().entity_mut(node).insert((transform, binding));
            Ok(node)
        }
        Err(err) => {
            warn!(%err, "could not bind sprite");
            app.world_mut().despawn(node);
            Err(err)
        }
    }
}

/// Static floor centered at `y`.
pub fn spawn_floor(app: &mut App, y: f32) -> Result<Entity, BindingError> {
    spawn_sprite(app, Vec2::new(0.0, y), |world, node| {
        BodyBinding::create_box(world, node, FLOOR_SIZE, BodyKind::Static, FixtureDef::default())
    })
}

/// Attach a joint built by `build` to a new entity.
pub fn spawn_joint<J: Component>(
    app: &mut App,
    a: Entity,
    b: Entity,
    build: impl FnOnce(
        &mut PhysicsWorld,
        Entity,
        &BodyBinding,
        &BodyBinding,
    ) -> Result<J, BindingError>,
) -> Result<Entity, BindingError> {
    let entity = app.world_mut().spawn_empty().id();
    let joint = app
        .world_mut()
        .resource_scope(|ecs, mut world: Mut<PhysicsWorld>| {
            let (Some(ba), Some(bb)) = (ecs.get::<BodyBinding>(a), ecs.get::<BodyBinding>(b))
            else {
                return Err(BindingError::UnknownBody);
            };
            build(&mut world, entity, ba, bb)
        });
    match joint {
        Ok(joint) => {
            app.world_mut().entity_mut(entity).insert(joint);
            Ok(entity)
        }
        Err(err) => {
            app.world_mut().despawn(entity);
            Err(err)
        }
    }
}

/// Position of `node`'s transform in pixels.
pub fn node_position(app: &App, node: Entity) -> Option<Vec2> {
    app.world()
        .get::<Transform>(node)
        .map(|t| t.translation.truncate())
}
