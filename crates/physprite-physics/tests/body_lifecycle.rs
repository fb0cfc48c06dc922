//! Integration test: body bindings inside a full app.
//!
//! Covers the lifecycle guarantees a scene relies on:
//! 1. Unit conversions round-trip between pixels and meters
//! 2. Bodies at rest without gravity stay where they were placed
//! 3. Impulses wake sleeping bodies and push them the right way
//! 4. Destroying a binding twice never touches another body, and nodes
//!    or joint entities despawned directly take their bodies and joints along
//! 5. Contact callbacks report each partner once and never the body itself
//! 6. Clearing the world removes bound and unbound bodies alike

use bevy::ecs::system::RunSystemOnce;
use bevy::prelude::*;

use physprite_physics::prelude::*;
use physprite_test_utils::{physics_test_app, physics_test_app_with, run_frames, spawn_box};

/// Destroy the binding on `node` twice in one go, the way a game system
/// would, then apply the despawn.
fn destroy_twice(app: &mut App, node: Entity) {
    app.world_mut()
        .run_system_once(
            move |mut world: ResMut<PhysicsWorld>,
                  mut nodes: Query<&mut BodyBinding>,
                  mut commands: Commands| {
                let mut binding = nodes.get_mut(node).expect("node has a binding");
                binding.destroy(&mut world, &mut commands);
                binding.destroy(&mut world, &mut commands);
                assert_eq!(binding.state(), BindingState::Destroyed);
            },
        )
        .expect("destroy system runs");
}

#[test]
fn units_round_trip() {
    let scale = WorldScale::new(32.0).unwrap();
    for px in [0.0_f32, 1.0, -48.5, 640.0] {
        assert!((scale.to_pixels(scale.to_meters(px)) - px).abs() < 1e-3);
    }
    for deg in [0.0_f32, 45.0, -90.0, 360.0] {
        assert!((to_degrees(to_radians(deg)) - deg).abs() < 1e-3);
    }
    assert!((scale.to_meters(32.0) - 1.0).abs() < f32::EPSILON);
}

#[test]
fn resting_body_without_gravity_stays_put() {
    let mut app = physics_test_app_with(PhysicsConfig::zero_gravity());
    let at = Vec2::new(120.0, -40.0);
    let node = spawn_box(&mut app, at, Vec2::splat(16.0), BodyKind::Dynamic);
    run_frames(&mut app, 100);

    let world = app.world().resource::<PhysicsWorld>();
    let b = app.world().get::<BodyBinding>(node).unwrap();
    assert!(b.position(world).distance(at) < 1e-3);
    assert!(b.velocity(world).length() < 1e-4);
    let t = app.world().get::<Transform>(node).unwrap();
    assert!((t.translation.x - at.x).abs() < 1e-3);
}

#[test]
fn impulse_wakes_body_and_moves_it() {
    let mut app = physics_test_app_with(PhysicsConfig::zero_gravity());
    let node = spawn_box(&mut app, Vec2::ZERO, Vec2::splat(32.0), BodyKind::Dynamic);

    app.world_mut()
        .resource_scope(|ecs, mut world: Mut<PhysicsWorld>| {
            let b = ecs.get::<BodyBinding>(node).unwrap();
            b.set_awake(&mut world, false);
            assert!(!b.is_awake(&world));
            b.apply_impulse(&mut world, Vec2::new(2.0, 0.0));
            assert!(b.is_awake(&world));
            assert!(b.vx(&world) > 0.0);
            assert!(b.vy(&world).abs() < 1e-4);
        });

    run_frames(&mut app, 10);
    let t = app.world().get::<Transform>(node).unwrap();
    assert!(t.translation.x > 0.0);
    assert!(t.translation.y.abs() < 1e-3);
}

#[test]
fn double_destroy_leaves_other_bodies_alone() {
    let mut app = physics_test_app();
    let a = spawn_box(&mut app, Vec2::ZERO, Vec2::splat(16.0), BodyKind::Dynamic);
    let b = spawn_box(&mut app, Vec2::new(0.0, 64.0), Vec2::splat(16.0), BodyKind::Dynamic);

    destroy_twice(&mut app, a);
    assert!(app.world().get_entity(a).is_err());
    assert!(app.world().get_entity(b).is_ok());

    let world = app.world().resource::<PhysicsWorld>();
    assert_eq!(world.body_count(), 1);
    let other = app.world().get::<BodyBinding>(b).unwrap();
    assert_eq!(world.entity_for_body(other.body_handle()), Some(b));

    run_frames(&mut app, 2);
}

#[test]
fn despawned_node_releases_its_body() {
    let mut app = physics_test_app();
    let floor = spawn_box(&mut app, Vec2::ZERO, Vec2::new(640.0, 32.0), BodyKind::Static);
    let at = Vec2::new(0.0, 40.0);
    let node = spawn_box(&mut app, at, Vec2::splat(32.0), BodyKind::Dynamic);
    let handle = app.world().get::<BodyBinding>(node).unwrap().body_handle();
    run_frames(&mut app, 30);

    app.world_mut().despawn(node);

    let world = app.world().resource::<PhysicsWorld>();
    assert_eq!(world.body_count(), 1);
    assert!(world.entity_for_body(handle).is_none());
    assert!(world.rigid_bodies().get(handle).is_none());

    run_frames(&mut app, 2);
    let world = app.world().resource::<PhysicsWorld>();
    let mut partners = Vec::new();
    app.world()
        .get::<BodyBinding>(floor)
        .unwrap()
        .contact(world, |node| partners.push(node));
    assert!(partners.is_empty(), "dead node still touching: {partners:?}");
}

#[test]
fn removing_binding_component_releases_body() {
    let mut app = physics_test_app();
    let node = spawn_box(&mut app, Vec2::ZERO, Vec2::splat(16.0), BodyKind::Dynamic);
    app.world_mut().entity_mut(node).remove::<BodyBinding>();

    assert!(app.world().get_entity(node).is_ok());
    assert_eq!(app.world().resource::<PhysicsWorld>().body_count(), 0);
}

#[test]
fn despawned_joint_entity_releases_its_joint() {
    let mut app = physics_test_app();
    let a = spawn_box(&mut app, Vec2::ZERO, Vec2::splat(16.0), BodyKind::Static);
    let b = spawn_box(&mut app, Vec2::new(0.0, -48.0), Vec2::splat(16.0), BodyKind::Dynamic);
    let joint = physprite_test_utils::spawn_joint(&mut app, a, b, DistanceJoint::new);
    assert_eq!(app.world().resource::<PhysicsWorld>().joint_count(), 1);

    app.world_mut().despawn(joint);

    let world = app.world().resource::<PhysicsWorld>();
    assert_eq!(world.joint_count(), 0);
    assert_eq!(world.body_count(), 2);
}

#[test]
fn contact_reports_each_partner_once() {
    let mut app = physics_test_app();
    let floor = spawn_box(&mut app, Vec2::ZERO, Vec2::new(640.0, 32.0), BodyKind::Static);
    let left = spawn_box(&mut app, Vec2::new(-100.0, 40.0), Vec2::splat(32.0), BodyKind::Dynamic);
    let right = spawn_box(&mut app, Vec2::new(100.0, 40.0), Vec2::splat(32.0), BodyKind::Dynamic);
    run_frames(&mut app, 60);

    let world = app.world().resource::<PhysicsWorld>();
    let b = app.world().get::<BodyBinding>(floor).unwrap();
    let mut seen = Vec::new();
    b.contact(world, |node| seen.push(node));
    assert_eq!(seen.len(), 2, "got {seen:?}");
    assert!(seen.contains(&left));
    assert!(seen.contains(&right));
    assert!(!seen.contains(&floor));

    let l = app.world().get::<BodyBinding>(left).unwrap();
    let mut partners = Vec::new();
    l.contact(world, |node| partners.push(node));
    assert_eq!(partners, vec![floor]);
    assert_eq!(world.contact_pairs().len(), 2);
}

#[test]
fn clear_removes_every_body() {
    let mut app = physics_test_app();
    let a = spawn_box(&mut app, Vec2::ZERO, Vec2::splat(16.0), BodyKind::Static);
    let b = spawn_box(&mut app, Vec2::new(0.0, -48.0), Vec2::splat(16.0), BodyKind::Dynamic);
    let joint = physprite_test_utils::spawn_joint(&mut app, a, b, DistanceJoint::new);

    app.world_mut()
        .resource_scope(|_, mut world: Mut<PhysicsWorld>| {
            world.insert_unbound_body(rapier2d::prelude::RigidBodyBuilder::dynamic(), None);
            world.ground_body();
            assert_eq!(world.body_count(), 4);
        });

    app.world_mut()
        .resource_scope(|ecs, mut world: Mut<PhysicsWorld>| {
            world.clear(&mut ecs.commands());
        });
    app.world_mut().flush();

    let world = app.world().resource::<PhysicsWorld>();
    assert_eq!(world.body_count(), 0);
    assert_eq!(world.joint_count(), 0);
    for e in [a, b, joint] {
        assert!(app.world().get_entity(e).is_err());
    }

    // The world keeps stepping afterwards.
    run_frames(&mut app, 2);
}
