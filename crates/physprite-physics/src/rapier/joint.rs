//! Joint bindings: distance, revolute, pulley and prismatic.
//!
//! Each joint is a component on its own entity. Getters read the binding's
//! stored parameters; setters push them to the simulation immediately. A
//! joint whose participant body was destroyed is invalid: setters become
//! no-ops and [`JointBinding::is_valid`] reports `false`.

use bevy::prelude::{Commands, Component, Entity, Vec2};
use nalgebra::Vector2;
use rapier2d::prelude::{JointAxis, Real, RigidBodyHandle};
use tracing::debug;

use physprite_core::{BindingError, WorldScale, to_degrees, to_radians};

use super::body::BodyBinding;
use super::bridge::{
    configure_distance, configure_limits, configure_motor, distance_joint, from_vector,
    prismatic_joint, revolute_joint, to_point, to_vector, unit_axis,
};
use super::context::{JointId, PhysicsWorld, despawn};
use super::pulley::PulleyConstraint;
use crate::components::{BindingState, JointKind};

// ---------------------------------------------------------------------------
// JointBinding
// ---------------------------------------------------------------------------

/// State shared by every joint kind: identity, participants and lifecycle.
#[derive(Debug)]
pub struct JointBinding {
    entity: Entity,
    id: JointId,
    kind: JointKind,
    body_a: RigidBodyHandle,
    body_b: RigidBodyHandle,
    scale: WorldScale,
    state: BindingState,
}

impl JointBinding {
    fn new(
        entity: Entity,
        id: JointId,
        kind: JointKind,
        body_a: RigidBodyHandle,
        body_b: RigidBodyHandle,
        scale: WorldScale,
    ) -> Self {
        debug!(?entity, ?kind, "created joint");
        Self {
            entity,
            id,
            kind,
            body_a,
            body_b,
            scale,
            state: BindingState::Created.advance(),
        }
    }

    /// The entity holding this joint.
    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn id(&self) -> JointId {
        self.id
    }

    pub fn kind(&self) -> JointKind {
        self.kind
    }

    pub fn state(&self) -> BindingState {
        self.state
    }

    /// Participant bodies. For prismatic joints `body_a` is the ground body.
    pub fn bodies(&self) -> (RigidBodyHandle, RigidBodyHandle) {
        (self.body_a, self.body_b)
    }

    /// Whether the joint still exists in `world` and belongs to this binding.
    pub fn is_valid(&self, world: &PhysicsWorld) -> bool {
        self.state == BindingState::Active && world.entity_for_joint(self.id) == Some(self.entity)
    }

    /// Remove the joint and despawn its entity. Idempotent.
    pub fn destroy(&mut self, world: &mut PhysicsWorld, commands: &mut Commands<'_, '_>) {
        if self.state == BindingState::Destroyed {
            return;
        }
        if !world.release_joint(self.id, self.entity, commands) {
            despawn(commands, self.entity);
        }
        self.state = BindingState::Destroyed;
        debug!(entity = ?self.entity, kind = ?self.kind, "destroyed joint binding");
    }

    fn check(&self) {
        assert!(
            self.state == BindingState::Active,
            "{:?} joint {:?} used after destroy",
            self.kind,
            self.entity
        );
    }
}

/// Handle of a body that is bound in `world`, or `UnknownBody`.
fn participant(
    world: &PhysicsWorld,
    sprite: &BodyBinding,
) -> Result<RigidBodyHandle, BindingError> {
    let handle = sprite.body_handle();
    let bound = world.entity_for_body(handle) == Some(sprite.node());
    if sprite.state() != BindingState::Active || !bound {
        return Err(BindingError::UnknownBody);
    }
    Ok(handle)
}

/// A joint component built on a [`JointBinding`].
pub trait BoundJoint: Component {
    /// Shared binding state.
    fn binding(&self) -> &JointBinding;
}

macro_rules! joint_binding_accessors {
    ($ty:ty) => {
        impl BoundJoint for $ty {
            fn binding(&self) -> &JointBinding {
                &self.joint
            }
        }

        impl $ty {
            pub fn is_valid(&self, world: &PhysicsWorld) -> bool {
                self.joint.is_valid(world)
            }

            /// Remove the joint and despawn its entity. Idempotent.
            pub fn destroy(&mut self, world: &mut PhysicsWorld, commands: &mut Commands<'_, '_>) {
                self.joint.destroy(world, commands);
            }
        }
    };
}

// ---------------------------------------------------------------------------
// DistanceJoint
// ---------------------------------------------------------------------------

/// Keeps two body centers at a fixed distance, rigidly or as a spring.
#[derive(Component, Debug)]
pub struct DistanceJoint {
    joint: JointBinding,
    length: Real,
    frequency: Real,
    damping_ratio: Real,
}

impl DistanceJoint {
    /// Join the centers of `a` and `b` at their current distance.
    pub fn new(
        world: &mut PhysicsWorld,
        entity: Entity,
        a: &BodyBinding,
        b: &BodyBinding,
    ) -> Result<Self, BindingError> {
        let ha = participant(world, a)?;
        let hb = participant(world, b)?;
        let bodies = world.rigid_bodies();
        let length = (bodies[hb].translation() - bodies[ha].translation()).norm();
        let id = world.insert_impulse_joint(
            ha,
            hb,
            distance_joint(length, 0.0, 0.0),
            entity,
            JointKind::Distance,
        );
        Ok(Self {
            joint: JointBinding::new(entity, id, JointKind::Distance, ha, hb, world.scale()),
            length,
            frequency: 0.0,
            damping_ratio: 0.0,
        })
    }

    /// Rest length in pixels.
    pub fn length(&self) -> f32 {
        self.joint.check();
        self.joint.scale.to_pixels(self.length)
    }

    pub fn set_length(&mut self, world: &mut PhysicsWorld, pixels: f32) {
        self.joint.check();
        self.length = self.joint.scale.to_meters(pixels).max(0.0);
        self.apply(world);
    }

    /// Spring frequency in Hz. Zero means rigid.
    pub fn frequency(&self) -> f32 {
        self.joint.check();
        self.frequency
    }

    pub fn set_frequency(&mut self, world: &mut PhysicsWorld, hz: f32) {
        self.joint.check();
        self.frequency = hz.max(0.0);
        self.apply(world);
    }

    /// Spring damping ratio (0 none, 1 critical).
    pub fn damping_ratio(&self) -> f32 {
        self.joint.check();
        self.damping_ratio
    }

    pub fn set_damping_ratio(&mut self, world: &mut PhysicsWorld, ratio: f32) {
        self.joint.check();
        self.damping_ratio = ratio.max(0.0);
        self.apply(world);
    }

    fn apply(&self, world: &mut PhysicsWorld) {
        if let Some(joint) = world.generic_joint_mut(self.joint.id) {
            configure_distance(joint, self.length, self.frequency, self.damping_ratio);
        }
    }
}

joint_binding_accessors!(DistanceJoint);

// ---------------------------------------------------------------------------
// RevoluteJoint
// ---------------------------------------------------------------------------

/// Pins a sprite to an axis body at the axis' center; the sprite rotates
/// around it.
#[derive(Component, Debug)]
pub struct RevoluteJoint {
    joint: JointBinding,
    reference_angle: Real,
    motor_enabled: bool,
    motor_speed: Real,
    max_motor_torque: Real,
    limit_enabled: bool,
    lower_angle: Real,
    upper_angle: Real,
}

impl RevoluteJoint {
    /// Pin `sprite` to `axis` at the center of `axis`.
    pub fn new(
        world: &mut PhysicsWorld,
        entity: Entity,
        axis: &BodyBinding,
        sprite: &BodyBinding,
    ) -> Result<Self, BindingError> {
        let ha = participant(world, sprite)?;
        let hb = participant(world, axis)?;
        let (local_a, local_b, reference_angle) = {
            let a = &world.rigid_body_set[ha];
            let b = &world.rigid_body_set[hb];
            let pivot = to_point(from_vector(b.translation()));
            (
                a.position().inverse_transform_point(&pivot),
                b.position().inverse_transform_point(&pivot),
                b.rotation().angle() - a.rotation().angle(),
            )
        };
        let id = world.insert_impulse_joint(
            ha,
            hb,
            revolute_joint(local_a, local_b),
            entity,
            JointKind::Revolute,
        );
        Ok(Self {
            joint: JointBinding::new(entity, id, JointKind::Revolute, ha, hb, world.scale()),
            reference_angle,
            motor_enabled: false,
            motor_speed: 0.0,
            max_motor_torque: 0.0,
            limit_enabled: false,
            lower_angle: 0.0,
            upper_angle: 0.0,
        })
    }

    /// Current angle of the axis body relative to the sprite, in degrees,
    /// zero at creation.
    pub fn joint_angle(&self, world: &PhysicsWorld) -> f32 {
        self.joint.check();
        let bodies = world.rigid_bodies();
        match (bodies.get(self.joint.body_a), bodies.get(self.joint.body_b)) {
            (Some(a), Some(b)) => {
                to_degrees(b.rotation().angle() - a.rotation().angle() - self.reference_angle)
            }
            _ => 0.0,
        }
    }

    /// Relative angular speed in degrees per second.
    pub fn joint_speed(&self, world: &PhysicsWorld) -> f32 {
        self.joint.check();
        let bodies = world.rigid_bodies();
        match (bodies.get(self.joint.body_a), bodies.get(self.joint.body_b)) {
            (Some(a), Some(b)) => to_degrees(b.angvel() - a.angvel()),
            _ => 0.0,
        }
    }

    pub fn is_motor_enabled(&self) -> bool {
        self.joint.check();
        self.motor_enabled
    }

    pub fn enable_motor(&mut self, world: &mut PhysicsWorld, enabled: bool) {
        self.joint.check();
        self.motor_enabled = enabled;
        self.apply(world);
    }

    /// Motor target speed in degrees per second.
    pub fn motor_speed(&self) -> f32 {
        self.joint.check();
        to_degrees(self.motor_speed)
    }

    pub fn set_motor_speed(&mut self, world: &mut PhysicsWorld, degrees_per_second: f32) {
        self.joint.check();
        self.motor_speed = to_radians(degrees_per_second);
        self.apply(world);
    }

    /// Maximum motor torque in N*m.
    pub fn max_motor_torque(&self) -> f32 {
        self.joint.check();
        self.max_motor_torque
    }

    pub fn set_max_motor_torque(&mut self, world: &mut PhysicsWorld, torque: f32) {
        self.joint.check();
        self.max_motor_torque = torque.max(0.0);
        self.apply(world);
    }

    pub fn is_limit_enabled(&self) -> bool {
        self.joint.check();
        self.limit_enabled
    }

    pub fn enable_limit(&mut self, world: &mut PhysicsWorld, enabled: bool) {
        self.joint.check();
        self.limit_enabled = enabled;
        self.apply(world);
    }

    /// Lower limit in degrees.
    pub fn lower_angle(&self) -> f32 {
        self.joint.check();
        to_degrees(self.lower_angle)
    }

    /// Upper limit in degrees.
    pub fn upper_angle(&self) -> f32 {
        self.joint.check();
        to_degrees(self.upper_angle)
    }

    /// Set both limits in degrees. The pair is reordered if reversed.
    pub fn set_limits(&mut self, world: &mut PhysicsWorld, lower: f32, upper: f32) {
        self.joint.check();
        let (lower, upper) = (to_radians(lower.min(upper)), to_radians(lower.max(upper)));
        self.lower_angle = lower;
        self.upper_angle = upper;
        self.apply(world);
    }

    pub fn set_lower_angle(&mut self, world: &mut PhysicsWorld, degrees: f32) {
        let upper = self.upper_angle();
        self.set_limits(world, degrees, upper);
    }

    pub fn set_upper_angle(&mut self, world: &mut PhysicsWorld, degrees: f32) {
        let lower = self.lower_angle();
        self.set_limits(world, lower, degrees);
    }

    fn apply(&self, world: &mut PhysicsWorld) {
        if let Some(joint) = world.generic_joint_mut(self.joint.id) {
            configure_motor(
                joint,
                JointAxis::AngX,
                self.motor_enabled,
                self.motor_speed,
                self.max_motor_torque,
            );
            configure_limits(
                joint,
                JointAxis::AngX,
                self.limit_enabled,
                self.lower_angle + self.reference_angle,
                self.upper_angle + self.reference_angle,
            );
        }
    }
}

joint_binding_accessors!(RevoluteJoint);

// ---------------------------------------------------------------------------
// PulleyJoint
// ---------------------------------------------------------------------------

/// Two bodies hanging from fixed ground anchors on one rope:
/// `length_a + ratio * length_b` stays constant.
#[derive(Component, Debug)]
pub struct PulleyJoint {
    joint: JointBinding,
}

impl PulleyJoint {
    /// Hang `a` from `ground_a` and `b` from `ground_b` (pixels). The rope
    /// length is taken from the current positions.
    pub fn new(
        world: &mut PhysicsWorld,
        entity: Entity,
        a: &BodyBinding,
        b: &BodyBinding,
        ground_a: Vec2,
        ground_b: Vec2,
        ratio: f32,
    ) -> Result<Self, BindingError> {
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(BindingError::InvalidRatio(ratio));
        }
        let ha = participant(world, a)?;
        let hb = participant(world, b)?;
        let scale = world.scale();
        let pulley = PulleyConstraint::new(
            world.rigid_bodies(),
            ha,
            hb,
            to_vector(scale.vec_to_meters(ground_a)),
            to_vector(scale.vec_to_meters(ground_b)),
            ratio,
        )
        .ok_or(BindingError::UnknownBody)?;
        let id = world.insert_pulley(pulley, entity);
        Ok(Self {
            joint: JointBinding::new(entity, id, JointKind::Pulley, ha, hb, scale),
        })
    }

    fn constraint<'w>(&self, world: &'w PhysicsWorld) -> Option<&'w PulleyConstraint> {
        self.joint.check();
        world.pulley(self.joint.id)
    }

    pub fn ratio(&self, world: &PhysicsWorld) -> Option<f32> {
        self.constraint(world).map(|p| p.ratio)
    }

    /// Ground anchor of body A in pixels.
    pub fn ground_anchor_a(&self, world: &PhysicsWorld) -> Option<Vec2> {
        self.constraint(world)
            .map(|p| self.joint.scale.vec_to_pixels(from_vector(&p.ground_a)))
    }

    /// Ground anchor of body B in pixels.
    pub fn ground_anchor_b(&self, world: &PhysicsWorld) -> Option<Vec2> {
        self.constraint(world)
            .map(|p| self.joint.scale.vec_to_pixels(from_vector(&p.ground_b)))
    }

    /// Total rope `length_a + ratio * length_b` in pixels, fixed at creation.
    pub fn total_length(&self, world: &PhysicsWorld) -> Option<f32> {
        self.constraint(world).map(|p| self.joint.scale.to_pixels(p.constant()))
    }

    /// Current rope length on side A in pixels.
    pub fn length_a(&self, world: &PhysicsWorld) -> Option<f32> {
        let (a, _) = self.constraint(world)?.lengths(world.rigid_bodies())?;
        Some(self.joint.scale.to_pixels(a))
    }

    /// Current rope length on side B in pixels.
    pub fn length_b(&self, world: &PhysicsWorld) -> Option<f32> {
        let (_, b) = self.constraint(world)?.lengths(world.rigid_bodies())?;
        Some(self.joint.scale.to_pixels(b))
    }
}

joint_binding_accessors!(PulleyJoint);

// ---------------------------------------------------------------------------
// PrismaticJoint
// ---------------------------------------------------------------------------

/// Lets a sprite slide along a fixed world axis without rotating.
#[derive(Component, Debug)]
pub struct PrismaticJoint {
    joint: JointBinding,
    axis: Vector2<Real>,
    anchor: Vector2<Real>,
    motor_enabled: bool,
    motor_speed: Real,
    max_motor_force: Real,
    limit_enabled: bool,
    lower_translation: Real,
    upper_translation: Real,
}

impl PrismaticJoint {
    /// Constrain `sprite` to slide along `axis` through its current position.
    pub fn new(
        world: &mut PhysicsWorld,
        entity: Entity,
        sprite: &BodyBinding,
        axis: Vec2,
    ) -> Result<Self, BindingError> {
        let unit = unit_axis(axis)?;
        let hb = participant(world, sprite)?;
        let ground = world.ground_body();
        let (anchor, angle) = {
            let body = &world.rigid_body_set[hb];
            (*body.translation(), body.rotation().angle())
        };
        let id = world.insert_impulse_joint(
            ground,
            hb,
            prismatic_joint(unit, anchor.into(), angle),
            entity,
            JointKind::Prismatic,
        );
        Ok(Self {
            joint: JointBinding::new(entity, id, JointKind::Prismatic, ground, hb, world.scale()),
            axis: unit.into_inner(),
            anchor,
            motor_enabled: false,
            motor_speed: 0.0,
            max_motor_force: 0.0,
            limit_enabled: false,
            lower_translation: 0.0,
            upper_translation: 0.0,
        })
    }

    /// Unit sliding axis.
    pub fn axis(&self) -> Vec2 {
        self.joint.check();
        from_vector(&self.axis)
    }

    /// Displacement along the axis since creation, in pixels.
    pub fn joint_translation(&self, world: &PhysicsWorld) -> f32 {
        self.joint.check();
        world
            .rigid_bodies()
            .get(self.joint.body_b)
            .map_or(0.0, |b| {
                self.joint
                    .scale
                    .to_pixels((b.translation() - self.anchor).dot(&self.axis))
            })
    }

    /// Speed along the axis in pixels per second.
    pub fn joint_speed(&self, world: &PhysicsWorld) -> f32 {
        self.joint.check();
        world
            .rigid_bodies()
            .get(self.joint.body_b)
            .map_or(0.0, |b| self.joint.scale.to_pixels(b.linvel().dot(&self.axis)))
    }

    pub fn is_motor_enabled(&self) -> bool {
        self.joint.check();
        self.motor_enabled
    }

    pub fn enable_motor(&mut self, world: &mut PhysicsWorld, enabled: bool) {
        self.joint.check();
        self.motor_enabled = enabled;
        self.apply(world);
    }

    /// Motor target speed in pixels per second.
    pub fn motor_speed(&self) -> f32 {
        self.joint.check();
        self.joint.scale.to_pixels(self.motor_speed)
    }

    pub fn set_motor_speed(&mut self, world: &mut PhysicsWorld, pixels_per_second: f32) {
        self.joint.check();
        self.motor_speed = self.joint.scale.to_meters(pixels_per_second);
        self.apply(world);
    }

    /// Maximum motor force in N.
    pub fn max_motor_force(&self) -> f32 {
        self.joint.check();
        self.max_motor_force
    }

    pub fn set_max_motor_force(&mut self, world: &mut PhysicsWorld, force: f32) {
        self.joint.check();
        self.max_motor_force = force.max(0.0);
        self.apply(world);
    }

    pub fn is_limit_enabled(&self) -> bool {
        self.joint.check();
        self.limit_enabled
    }

    pub fn enable_limit(&mut self, world: &mut PhysicsWorld, enabled: bool) {
        self.joint.check();
        self.limit_enabled = enabled;
        self.apply(world);
    }

    /// Lower translation limit in pixels.
    pub fn lower_translation(&self) -> f32 {
        self.joint.check();
        self.joint.scale.to_pixels(self.lower_translation)
    }

    /// Upper translation limit in pixels.
    pub fn upper_translation(&self) -> f32 {
        self.joint.check();
        self.joint.scale.to_pixels(self.upper_translation)
    }

    /// Set both limits in pixels. The pair is reordered if reversed.
    pub fn set_limits(&mut self, world: &mut PhysicsWorld, lower: f32, upper: f32) {
        self.joint.check();
        self.lower_translation = self.joint.scale.to_meters(lower.min(upper));
        self.upper_translation = self.joint.scale.to_meters(lower.max(upper));
        self.apply(world);
    }

    pub fn set_lower_translation(&mut self, world: &mut PhysicsWorld, pixels: f32) {
        let upper = self.upper_translation();
        self.set_limits(world, pixels, upper);
    }

    pub fn set_upper_translation(&mut self, world: &mut PhysicsWorld, pixels: f32) {
        let lower = self.lower_translation();
        self.set_limits(world, lower, pixels);
    }

    fn apply(&self, world: &mut PhysicsWorld) {
        if let Some(joint) = world.generic_joint_mut(self.joint.id) {
            configure_motor(
                joint,
                JointAxis::LinX,
                self.motor_enabled,
                self.motor_speed,
                self.max_motor_force,
            );
            configure_limits(
                joint,
                JointAxis::LinX,
                self.limit_enabled,
                self.lower_translation,
                self.upper_translation,
            );
        }
    }
}

joint_binding_accessors!(PrismaticJoint);

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
