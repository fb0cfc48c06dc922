//! [`BodyBinding`]: a node bound to one simulated body.

use bevy::prelude::{Commands, Component, Entity, Quat, Transform, Vec2};
use rapier2d::prelude::{
    ColliderHandle, RigidBody, RigidBodyActivation, RigidBodyBuilder, RigidBodyHandle, Rotation,
};
use tracing::debug;

use physprite_core::{BindingError, to_degrees, to_radians};

use super::bridge::{
    ShapeDef, body_kind, body_type, collider_builder, from_vector, shape_outline, to_vector,
};
use super::context::PhysicsWorld;
use crate::components::{BindingState, BodyKind, FixtureDef, ShapeKind};

/// Binds a node (an entity with a [`Transform`]) to one rigid body.
///
/// Positions are in pixels at the node's center, angles in degrees,
/// velocities in pixels and degrees per second. The node's `Transform` is
/// written from the body each frame by
/// [`sync_sprite_transforms`](super::systems::sync_sprite_transforms).
///
/// Using a binding after [`destroy`](Self::destroy) panics.
#[derive(Component, Debug)]
pub struct BodyBinding {
    node: Entity,
    body: RigidBodyHandle,
    collider: ColliderHandle,
    shape: ShapeKind,
    size: Vec2,
    state: BindingState,
}

impl BodyBinding {
    // -- Creation --

    /// Rectangle body the size of the node (pixels), created at the origin.
    pub fn create_box(
        world: &mut PhysicsWorld,
        node: Entity,
        size: Vec2,
        kind: BodyKind,
        fixture: FixtureDef,
    ) -> Result<Self, BindingError> {
        let shape = ShapeDef::Box { size };
        Self::create(world, node, size, &shape, kind, fixture)
    }

    /// Circle body of `radius` pixels, created at the origin.
    pub fn create_circle(
        world: &mut PhysicsWorld,
        node: Entity,
        radius: f32,
        kind: BodyKind,
        fixture: FixtureDef,
    ) -> Result<Self, BindingError> {
        let size = Vec2::splat(radius * 2.0);
        let shape = ShapeDef::Circle { radius };
        Self::create(world, node, size, &shape, kind, fixture)
    }

    /// Convex polygon body created at the origin. `vertices` are pixels
    /// relative to the node's center; `size` is the node's display size.
    pub fn create_polygon(
        world: &mut PhysicsWorld,
        node: Entity,
        size: Vec2,
        vertices: &[Vec2],
        kind: BodyKind,
        fixture: FixtureDef,
    ) -> Result<Self, BindingError> {
        let shape = ShapeDef::Polygon { vertices };
        Self::create(world, node, size, &shape, kind, fixture)
    }

    fn create(
        world: &mut PhysicsWorld,
        node: Entity,
        size: Vec2,
        shape: &ShapeDef<'_>,
        kind: BodyKind,
        fixture: FixtureDef,
    ) -> Result<Self, BindingError> {
        let scale = world.scale();
        let collider = collider_builder(shape, &fixture, scale)?;
        let body = RigidBodyBuilder::new(body_type(kind)).sleeping(!fixture.awake);

        let mut binding = Self {
            node,
            body: RigidBodyHandle::invalid(),
            collider: ColliderHandle::invalid(),
            shape: shape.kind(),
            size,
            state: BindingState::Created,
        };
        let (body, collider) = world.insert_body(body, collider, node);
        binding.body = body;
        binding.collider = collider;
        binding.state = binding.state.advance();
        debug!(?node, ?kind, shape = ?binding.shape, "created body");
        Ok(binding)
    }

    // -- Identity --

    /// The bound node.
    pub fn node(&self) -> Entity {
        self.node
    }

    pub fn state(&self) -> BindingState {
        self.state
    }

    pub fn body_handle(&self) -> RigidBodyHandle {
        self.body
    }

    pub fn collider_handle(&self) -> ColliderHandle {
        self.collider
    }

    pub fn shape(&self) -> ShapeKind {
        self.shape
    }

    /// Node size in pixels given at creation.
    pub fn size(&self) -> Vec2 {
        self.size
    }

    fn rb<'w>(&self, world: &'w PhysicsWorld) -> &'w RigidBody {
        assert!(
            self.state == BindingState::Active,
            "body binding of {:?} used after destroy",
            self.node
        );
        world
            .rigid_body_set
            .get(self.body)
            .unwrap_or_else(|| panic!("body of {:?} no longer exists", self.node))
    }

    fn rb_mut<'w>(&self, world: &'w mut PhysicsWorld) -> &'w mut RigidBody {
        assert!(
            self.state == BindingState::Active,
            "body binding of {:?} used after destroy",
            self.node
        );
        world
            .rigid_body_set
            .get_mut(self.body)
            .unwrap_or_else(|| panic!("body of {:?} no longer exists", self.node))
    }

    // -- Pose --

    /// Center position in pixels.
    pub fn position(&self, world: &PhysicsWorld) -> Vec2 {
        world
            .scale()
            .vec_to_pixels(from_vector(self.rb(world).translation()))
    }

    /// Move the body (and the node, immediately) to `position` pixels.
    /// A sleeping body stays asleep.
    pub fn set_position(
        &self,
        world: &mut PhysicsWorld,
        transform: &mut Transform,
        position: Vec2,
    ) {
        let meters = world.scale().vec_to_meters(position);
        self.rb_mut(world).set_translation(to_vector(meters), false);
        transform.translation.x = position.x;
        transform.translation.y = position.y;
    }

    pub fn x(&self, world: &PhysicsWorld) -> f32 {
        self.position(world).x
    }

    pub fn set_x(&self, world: &mut PhysicsWorld, transform: &mut Transform, x: f32) {
        let y = self.y(world);
        self.set_position(world, transform, Vec2::new(x, y));
    }

    pub fn y(&self, world: &PhysicsWorld) -> f32 {
        self.position(world).y
    }

    pub fn set_y(&self, world: &mut PhysicsWorld, transform: &mut Transform, y: f32) {
        let x = self.x(world);
        self.set_position(world, transform, Vec2::new(x, y));
    }

    /// Rotation in degrees, counter-clockwise.
    pub fn angle(&self, world: &PhysicsWorld) -> f32 {
        to_degrees(self.rb(world).rotation().angle())
    }

    /// Rotate the body (and the node, immediately) to `degrees`.
    pub fn set_angle(&self, world: &mut PhysicsWorld, transform: &mut Transform, degrees: f32) {
        let radians = to_radians(degrees);
        self.rb_mut(world).set_rotation(Rotation::new(radians), false);
        transform.rotation = Quat::from_rotation_z(radians);
    }

    // -- Velocity --

    /// Linear velocity in pixels per second.
    pub fn velocity(&self, world: &PhysicsWorld) -> Vec2 {
        world
            .scale()
            .vec_to_pixels(from_vector(self.rb(world).linvel()))
    }

    pub fn set_velocity(&self, world: &mut PhysicsWorld, velocity: Vec2) {
        let meters = world.scale().vec_to_meters(velocity);
        self.rb_mut(world).set_linvel(to_vector(meters), true);
    }

    pub fn vx(&self, world: &PhysicsWorld) -> f32 {
        self.velocity(world).x
    }

    pub fn set_vx(&self, world: &mut PhysicsWorld, vx: f32) {
        let vy = self.vy(world);
        self.set_velocity(world, Vec2::new(vx, vy));
    }

    pub fn vy(&self, world: &PhysicsWorld) -> f32 {
        self.velocity(world).y
    }

    pub fn set_vy(&self, world: &mut PhysicsWorld, vy: f32) {
        let vx = self.vx(world);
        self.set_velocity(world, Vec2::new(vx, vy));
    }

    /// Angular velocity in degrees per second.
    pub fn angular_velocity(&self, world: &PhysicsWorld) -> f32 {
        to_degrees(self.rb(world).angvel())
    }

    /// Wakes the body, then sets its angular velocity.
    pub fn set_angular_velocity(&self, world: &mut PhysicsWorld, degrees_per_second: f32) {
        let body = self.rb_mut(world);
        body.wake_up(true);
        body.set_angvel(to_radians(degrees_per_second), true);
    }

    // -- Forces --
    //
    // Forces, impulses and torques are in simulation units (N, N*s, N*m).
    // Forces and torques last until the end of the next step.

    /// Force at the center of mass.
    pub fn apply_force(&self, world: &mut PhysicsWorld, force: Vec2) {
        let body = self.rb_mut(world);
        body.wake_up(true);
        body.add_force(to_vector(force), true);
    }

    /// Impulse at the center of mass.
    pub fn apply_impulse(&self, world: &mut PhysicsWorld, impulse: Vec2) {
        let body = self.rb_mut(world);
        body.wake_up(true);
        body.apply_impulse(to_vector(impulse), true);
    }

    pub fn apply_torque(&self, world: &mut PhysicsWorld, torque: f32) {
        let body = self.rb_mut(world);
        body.wake_up(true);
        body.add_torque(torque, true);
    }

    // -- Kind & activity --

    pub fn kind(&self, world: &PhysicsWorld) -> BodyKind {
        body_kind(self.rb(world).body_type())
    }

    pub fn set_kind(&self, world: &mut PhysicsWorld, kind: BodyKind) {
        self.rb_mut(world).set_body_type(body_type(kind), true);
    }

    pub fn is_static(&self, world: &PhysicsWorld) -> bool {
        self.kind(world) == BodyKind::Static
    }

    pub fn is_dynamic(&self, world: &PhysicsWorld) -> bool {
        self.kind(world) == BodyKind::Dynamic
    }

    pub fn is_kinematic(&self, world: &PhysicsWorld) -> bool {
        self.kind(world) == BodyKind::Kinematic
    }

    pub fn is_awake(&self, world: &PhysicsWorld) -> bool {
        !self.rb(world).is_sleeping()
    }

    pub fn set_awake(&self, world: &mut PhysicsWorld, awake: bool) {
        let body = self.rb_mut(world);
        if awake {
            body.wake_up(true);
        } else {
            body.sleep();
        }
    }

    /// Whether the body may fall asleep when resting.
    pub fn sleeping_allowed(&self, world: &PhysicsWorld) -> bool {
        self.rb(world).activation().normalized_linear_threshold >= 0.0
    }

    pub fn set_sleeping_allowed(&self, world: &mut PhysicsWorld, allowed: bool) {
        let body = self.rb_mut(world);
        *body.activation_mut() = if allowed {
            RigidBodyActivation::active()
        } else {
            RigidBodyActivation::cannot_sleep()
        };
        body.wake_up(true);
    }

    /// Whether the body takes part in the simulation at all.
    pub fn is_active(&self, world: &PhysicsWorld) -> bool {
        self.rb(world).is_enabled()
    }

    pub fn set_active(&self, world: &mut PhysicsWorld, active: bool) {
        self.rb_mut(world).set_enabled(active);
    }

    // -- Queries --

    /// Call `f(node)` once for every node touching this body.
    pub fn contact(&self, world: &PhysicsWorld, mut f: impl FnMut(Entity)) {
        self.rb(world);
        for node in world.contacts_with(self.body) {
            f(node);
        }
    }

    /// Collision outline in pixels, relative to the node's center.
    pub fn outline(&self, world: &PhysicsWorld) -> Vec<Vec2> {
        self.rb(world);
        world
            .collider_set
            .get(self.collider)
            .map(|c| shape_outline(c.shared_shape(), world.scale()))
            .unwrap_or_default()
    }

    // -- Teardown --

    /// Remove the body and detach the node from the scene.
    ///
    /// Idempotent. Nothing is removed unless the world still associates the
    /// body with this node.
    pub fn destroy(&mut self, world: &mut PhysicsWorld, commands: &mut Commands<'_, '_>) {
        if self.state == BindingState::Destroyed {
            return;
        }
        world.release_body(self.body, self.node, commands);
        self.state = BindingState::Destroyed;
        debug!(node = ?self.node, "destroyed body binding");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
