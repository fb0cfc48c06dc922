//! Integration test: demo scene helpers build working scenes.

use bevy::prelude::*;

use physprite_demos::{
    headless_app, load_config, node_position, spawn_floor, spawn_joint, spawn_sprite,
};
use physprite_physics::prelude::*;

fn dynamic_box(app: &mut App, at: Vec2) -> Entity {
    spawn_sprite(app, at, |world, node| {
        BodyBinding::create_box(
            world,
            node,
            Vec2::splat(24.0),
            BodyKind::Dynamic,
            FixtureDef::default(),
        )
    })
    .unwrap()
}

#[test]
fn box_lands_on_floor() {
    let mut app = headless_app(load_config(None).unwrap());
    let floor = spawn_floor(&mut app, -100.0).unwrap();
    let node = dynamic_box(&mut app, Vec2::new(0.0, 0.0));
    for _ in 0..90 {
        app.update();
    }
    let p = node_position(&app, node).unwrap();
    // Floor top at -84, box half height 12.
    assert!((p.y + 72.0).abs() < 2.0, "box rests at {}", p.y);

    let world = app.world().resource::<PhysicsWorld>();
    let mut partners = Vec::new();
    app.world()
        .get::<BodyBinding>(floor)
        .unwrap()
        .contact(world, |n| partners.push(n));
    assert_eq!(partners, vec![node]);
}

#[test]
fn failed_binding_leaves_no_node() {
    let mut app = headless_app(PhysicsConfig::default());
    let before = app.world().entities().len();
    let result = spawn_sprite(&mut app, Vec2::ZERO, |world, node| {
        BodyBinding::create_box(
            world,
            node,
            Vec2::new(0.0, 10.0),
            BodyKind::Dynamic,
            FixtureDef::default(),
        )
    });
    assert!(matches!(result, Err(BindingError::InvalidSize { .. })));
    assert_eq!(app.world().entities().len(), before);
    assert_eq!(app.world().resource::<PhysicsWorld>().body_count(), 0);
}

#[test]
fn joint_with_missing_body_is_rejected() {
    let mut app = headless_app(PhysicsConfig::default());
    let a = dynamic_box(&mut app, Vec2::ZERO);
    let stray = app.world_mut().spawn_empty().id();
    let result = spawn_joint(&mut app, a, stray, DistanceJoint::new);
    assert_eq!(result.err(), Some(BindingError::UnknownBody));
    assert_eq!(app.world().resource::<PhysicsWorld>().joint_count(), 0);
}
