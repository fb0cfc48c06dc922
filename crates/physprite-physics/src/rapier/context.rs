//! [`PhysicsWorld`]: Bevy resource wrapping all rapier2d pipeline state.

use std::collections::HashMap;
use std::num::NonZeroUsize;

use bevy::prelude::{Commands, Entity, Resource, Vec2};
use nalgebra::Vector2;
use rapier2d::prelude::{
    CCDSolver, Collider, ColliderBuilder, ColliderHandle, ColliderSet, DefaultBroadPhase,
    GenericJoint, ImpulseJointHandle, ImpulseJointSet, IntegrationParameters, IslandManager,
    MultibodyJointSet, NarrowPhase, PhysicsPipeline, QueryPipeline, Real, RigidBody,
    RigidBodyBuilder, RigidBodyHandle, RigidBodySet,
};
use tracing::{debug, info, warn};

use physprite_core::{ConfigError, PhysicsConfig, WorldScale};

use super::bridge::{from_vector, to_vector};
use super::pulley::{PulleyConstraint, PulleyId};
use crate::components::JointKind;

// ---------------------------------------------------------------------------
// JointId
// ---------------------------------------------------------------------------

/// Identifier of a joint in a [`PhysicsWorld`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JointId {
    /// Joint solved by rapier.
    Impulse(ImpulseJointHandle),
    /// Pulley solved by the world before each step.
    Pulley(PulleyId),
}

/// Debug geometry of one joint, in pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct JointPolyline {
    pub kind: JointKind,
    pub points: Vec<Vec2>,
}

// ---------------------------------------------------------------------------
// PhysicsWorld
// ---------------------------------------------------------------------------

/// One simulation world plus its association tables.
///
/// `PhysicsPipeline::step()` needs mutable access to every set at once, so
/// they all live together. Bodies and joints created through bindings are
/// registered with the entity that owns them; the tables are the only way
/// back from a simulation object to its node.
#[derive(Resource)]
pub struct PhysicsWorld {
    // -- Rapier sets --
    pub(crate) rigid_body_set: RigidBodySet,
    pub(crate) collider_set: ColliderSet,
    pub(crate) impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,

    // -- Pipeline objects --
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,

    // -- Parameters --
    integration_parameters: IntegrationParameters,
    gravity: Vector2<Real>,
    scale: WorldScale,
    allow_sleep: bool,

    // -- Association tables --
    body_entities: HashMap<RigidBodyHandle, Entity>,
    joint_entities: HashMap<JointId, (Entity, JointKind)>,
    pulleys: HashMap<PulleyId, PulleyConstraint>,
    next_pulley: u32,
    ground: Option<RigidBodyHandle>,
}

impl PhysicsWorld {
    /// Build a world from a validated configuration.
    pub fn new(config: &PhysicsConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let scale = config.scale()?;

        let mut integration_parameters = IntegrationParameters::default();
        if let Some(dt) = config.timestep {
            integration_parameters.dt = dt;
        }
        integration_parameters.num_solver_iterations = NonZeroUsize::new(config.iterations)
            .ok_or(ConfigError::InvalidIterations(config.iterations))?;

        info!(
            gravity = ?config.gravity,
            iterations = config.iterations,
            pixels_per_meter = scale.pixels_per_meter(),
            "creating physics world"
        );

        Ok(Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            integration_parameters,
            gravity: Vector2::new(config.gravity[0], config.gravity[1]),
            scale,
            allow_sleep: config.allow_sleep,
            body_entities: HashMap::new(),
            joint_entities: HashMap::new(),
            pulleys: HashMap::new(),
            next_pulley: 0,
            ground: None,
        })
    }

    // -- Parameters --

    /// The pixel/meter factor fixed at creation.
    pub fn scale(&self) -> WorldScale {
        self.scale
    }

    /// Gravity in m/s^2.
    pub fn gravity(&self) -> Vec2 {
        from_vector(&self.gravity)
    }

    /// Change gravity. Sleeping bodies stay asleep until something wakes them.
    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = to_vector(gravity);
    }

    /// Solver iterations per step.
    pub fn iterations(&self) -> usize {
        self.integration_parameters.num_solver_iterations.get()
    }

    /// Change solver iterations. Zero is clamped to one.
    pub fn set_iterations(&mut self, iterations: usize) {
        self.integration_parameters.num_solver_iterations =
            NonZeroUsize::new(iterations).unwrap_or(NonZeroUsize::MIN);
    }

    /// Whether new bodies may fall asleep.
    pub fn allow_sleep(&self) -> bool {
        self.allow_sleep
    }

    /// Seconds advanced by the most recent step.
    pub fn last_dt(&self) -> f32 {
        self.integration_parameters.dt
    }

    // -- Stepping --

    /// Advance the simulation by `dt` seconds.
    ///
    /// Pulleys are corrected first, then rapier steps, then every force and
    /// torque accumulated since the previous step is cleared. Non-positive
    /// or non-finite `dt` is a no-op.
    pub fn step(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            warn!(dt, "ignoring physics step with non-positive dt");
            return;
        }
        self.integration_parameters.dt = dt;

        for pulley in self.pulleys.values() {
            pulley.solve(&mut self.rigid_body_set, dt);
        }

        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );

        let loaded: Vec<_> = self
            .rigid_body_set
            .iter()
            .filter(|(_, body)| body.user_force() != Vector2::zeros() || body.user_torque() != 0.0)
            .map(|(handle, _)| handle)
            .collect();
        for handle in loaded {
            let body = &mut self.rigid_body_set[handle];
            body.reset_forces(false);
            body.reset_torques(false);
        }
    }

    /// Advance by one frame at `fps` frames per second.
    pub fn step_fps(&mut self, fps: f32) {
        self.step(1.0 / fps);
    }

    // -- Bodies --

    /// Number of bodies, the ground body included once it exists.
    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }

    /// The node bound to `handle`, if any.
    pub fn entity_for_body(&self, handle: RigidBodyHandle) -> Option<Entity> {
        self.body_entities.get(&handle).copied()
    }

    /// Read-only access to every body.
    pub fn rigid_bodies(&self) -> &RigidBodySet {
        &self.rigid_body_set
    }

    /// Read-only access to every collider.
    pub fn colliders(&self) -> &ColliderSet {
        &self.collider_set
    }

    /// Insert a body with no node bound to it.
    pub fn insert_unbound_body(
        &mut self,
        body: impl Into<RigidBody>,
        collider: Option<Collider>,
    ) -> RigidBodyHandle {
        let handle = self.rigid_body_set.insert(body);
        if let Some(collider) = collider {
            self.collider_set
                .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        }
        handle
    }

    /// Shared static body used as the fixed side of single-body joints.
    ///
    /// Created on first use. No node is bound to it.
    pub fn ground_body(&mut self) -> RigidBodyHandle {
        if let Some(ground) = self.ground
            && self.rigid_body_set.contains(ground)
        {
            return ground;
        }
        let ground = self.rigid_body_set.insert(RigidBodyBuilder::fixed());
        debug!(?ground, "created ground body");
        self.ground = Some(ground);
        ground
    }

    pub(crate) fn insert_body(
        &mut self,
        body: RigidBodyBuilder,
        collider: ColliderBuilder,
        entity: Entity,
    ) -> (RigidBodyHandle, ColliderHandle) {
        let handle = self.rigid_body_set.insert(body.can_sleep(self.allow_sleep));
        let collider =
            self.collider_set
                .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        self.rigid_body_set[handle].recompute_mass_properties_from_colliders(&self.collider_set);
        self.body_entities.insert(handle, entity);
        (handle, collider)
    }

    /// Remove `handle` if, and only if, it is bound to `entity`, then detach
    /// the node. Returns whether anything was removed.
    pub(crate) fn release_body(
        &mut self,
        handle: RigidBodyHandle,
        entity: Entity,
        commands: &mut Commands<'_, '_>,
    ) -> bool {
        if !self.forget_body(handle, entity) {
            return false;
        }
        despawn(commands, entity);
        true
    }

    /// Like [`release_body`](Self::release_body) but leaves the node alone,
    /// for nodes that are already going away.
    pub(crate) fn forget_body(&mut self, handle: RigidBodyHandle, entity: Entity) -> bool {
        if self.body_entities.get(&handle) != Some(&entity) {
            return false;
        }
        self.remove_body(handle);
        debug!(?entity, "released body");
        true
    }

    /// Remove a body, its colliders, and every joint attached to it.
    fn remove_body(&mut self, handle: RigidBodyHandle) {
        self.body_entities.remove(&handle);
        self.rigid_body_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
        self.pulleys.retain(|_, pulley| !pulley.involves(handle));
        let impulse_joints = &self.impulse_joint_set;
        let pulleys = &self.pulleys;
        self.joint_entities.retain(|id, _| match id {
            JointId::Impulse(h) => impulse_joints.contains(*h),
            JointId::Pulley(p) => pulleys.contains_key(p),
        });
        if self.ground == Some(handle) {
            self.ground = None;
        }
    }

    // -- Joints --

    /// Number of joints, pulleys included.
    pub fn joint_count(&self) -> usize {
        self.impulse_joint_set.len() + self.pulleys.len()
    }

    /// The entity owning joint `id`, if any.
    pub fn entity_for_joint(&self, id: JointId) -> Option<Entity> {
        self.joint_entities.get(&id).map(|(entity, _)| *entity)
    }

    /// Whether joint `id` still exists.
    pub fn contains_joint(&self, id: JointId) -> bool {
        match id {
            JointId::Impulse(h) => self.impulse_joint_set.contains(h),
            JointId::Pulley(p) => self.pulleys.contains_key(&p),
        }
    }

    pub(crate) fn insert_impulse_joint(
        &mut self,
        body_a: RigidBodyHandle,
        body_b: RigidBodyHandle,
        joint: GenericJoint,
        entity: Entity,
        kind: JointKind,
    ) -> JointId {
        let handle = self.impulse_joint_set.insert(body_a, body_b, joint, true);
        let id = JointId::Impulse(handle);
        self.joint_entities.insert(id, (entity, kind));
        id
    }

    pub(crate) fn insert_pulley(&mut self, pulley: PulleyConstraint, entity: Entity) -> JointId {
        let pulley_id = PulleyId(self.next_pulley);
        self.next_pulley += 1;
        self.pulleys.insert(pulley_id, pulley);
        let id = JointId::Pulley(pulley_id);
        self.joint_entities.insert(id, (entity, JointKind::Pulley));
        id
    }

    pub(crate) fn generic_joint_mut(&mut self, id: JointId) -> Option<&mut GenericJoint> {
        match id {
            JointId::Impulse(h) => self.impulse_joint_set.get_mut(h, true).map(|j| &mut j.data),
            JointId::Pulley(_) => None,
        }
    }

    pub(crate) fn pulley(&self, id: JointId) -> Option<&PulleyConstraint> {
        match id {
            JointId::Pulley(p) => self.pulleys.get(&p),
            JointId::Impulse(_) => None,
        }
    }

    /// Remove joint `id` if, and only if, it is owned by `entity`, then
    /// despawn that entity. Returns whether anything was removed.
    pub(crate) fn release_joint(
        &mut self,
        id: JointId,
        entity: Entity,
        commands: &mut Commands<'_, '_>,
    ) -> bool {
        if !self.forget_joint(id, entity) {
            return false;
        }
        despawn(commands, entity);
        true
    }

    pub(crate) fn forget_joint(&mut self, id: JointId, entity: Entity) -> bool {
        if self.entity_for_joint(id) != Some(entity) {
            return false;
        }
        self.remove_joint(id);
        debug!(?entity, "released joint");
        true
    }

    fn remove_joint(&mut self, id: JointId) {
        self.joint_entities.remove(&id);
        match id {
            JointId::Impulse(h) => {
                self.impulse_joint_set.remove(h, true);
            }
            JointId::Pulley(p) => {
                if let Some(pulley) = self.pulleys.remove(&p) {
                    for body in [pulley.body_a, pulley.body_b] {
                        if let Some(body) = self.rigid_body_set.get_mut(body) {
                            body.wake_up(true);
                        }
                    }
                }
            }
        }
    }

    /// Line segments describing every joint, in pixels.
    ///
    /// Distance joints connect their anchors. Pulleys run body A, ground A,
    /// ground B, body B. Other joints run through their anchor, skipping
    /// the ground body.
    pub fn joint_segments(&self) -> Vec<JointPolyline> {
        let mut out = Vec::with_capacity(self.joint_count());
        for (handle, joint) in self.impulse_joint_set.iter() {
            let kind = self
                .joint_entities
                .get(&JointId::Impulse(handle))
                .map_or(JointKind::Revolute, |(_, kind)| *kind);
            let (Some(b1), Some(b2)) = (
                self.rigid_body_set.get(joint.body1),
                self.rigid_body_set.get(joint.body2),
            ) else {
                continue;
            };
            let anchor1 = b1.position() * joint.data.local_anchor1();
            let anchor2 = b2.position() * joint.data.local_anchor2();
            let c1 = from_vector(b1.translation());
            let c2 = from_vector(b2.translation());
            let a1 = Vec2::new(anchor1.x, anchor1.y);
            let a2 = Vec2::new(anchor2.x, anchor2.y);
            let points = if kind == JointKind::Distance {
                vec![a1, a2]
            } else if Some(joint.body1) == self.ground {
                vec![a1, c2]
            } else if Some(joint.body2) == self.ground {
                vec![c1, a2]
            } else {
                vec![c1, a1, c2]
            };
            out.push(self.polyline(kind, points));
        }
        let mut pulleys: Vec<_> = self.pulleys.iter().collect();
        pulleys.sort_by_key(|(id, _)| **id);
        for (_, pulley) in pulleys {
            let (Some(a), Some(b)) = (
                self.rigid_body_set.get(pulley.body_a),
                self.rigid_body_set.get(pulley.body_b),
            ) else {
                continue;
            };
            let points = vec![
                from_vector(a.translation()),
                from_vector(&pulley.ground_a),
                from_vector(&pulley.ground_b),
                from_vector(b.translation()),
            ];
            out.push(self.polyline(JointKind::Pulley, points));
        }
        out
    }

    fn polyline(&self, kind: JointKind, points: Vec<Vec2>) -> JointPolyline {
        JointPolyline {
            kind,
            points: points
                .into_iter()
                .map(|p| self.scale.vec_to_pixels(p))
                .collect(),
        }
    }

    // -- Contacts --

    /// Call `f(a, b)` for every touching pair whose bodies are both bound
    /// to nodes. Pairs involving unbound bodies are skipped.
    pub fn for_each_contact(&self, mut f: impl FnMut(Entity, Entity)) {
        for pair in self.narrow_phase.contact_pairs() {
            if !pair.has_any_active_contact {
                continue;
            }
            if let (Some(a), Some(b)) = (
                self.collider_entity(pair.collider1),
                self.collider_entity(pair.collider2),
            ) {
                f(a, b);
            }
        }
    }

    /// Every touching pair of nodes.
    pub fn contact_pairs(&self) -> Vec<(Entity, Entity)> {
        let mut pairs = Vec::new();
        self.for_each_contact(|a, b| pairs.push((a, b)));
        pairs
    }

    /// Nodes currently touching `body`.
    pub(crate) fn contacts_with(&self, body: RigidBodyHandle) -> Vec<Entity> {
        let Some(rb) = self.rigid_body_set.get(body) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for &collider in rb.colliders() {
            for pair in self.narrow_phase.contact_pairs_with(collider) {
                if !pair.has_any_active_contact {
                    continue;
                }
                let other = if pair.collider1 == collider {
                    pair.collider2
                } else {
                    pair.collider1
                };
                let other_body = self.collider_set.get(other).and_then(Collider::parent);
                if other_body == Some(body) {
                    continue;
                }
                if let Some(entity) = self.collider_entity(other)
                    && !out.contains(&entity)
                {
                    out.push(entity);
                }
            }
        }
        out
    }

    fn collider_entity(&self, collider: ColliderHandle) -> Option<Entity> {
        let body = self.collider_set.get(collider)?.parent()?;
        self.entity_for_body(body)
    }

    // -- Teardown --

    /// Destroy every joint. Joints owned by an entity despawn it as well.
    pub fn clear_joints(&mut self, commands: &mut Commands<'_, '_>) {
        for (id, (entity, _)) in std::mem::take(&mut self.joint_entities) {
            self.remove_joint(id);
            despawn(commands, entity);
        }
        let unbound: Vec<_> = self.impulse_joint_set.iter().map(|(h, _)| h).collect();
        for handle in unbound {
            self.impulse_joint_set.remove(handle, true);
        }
        self.pulleys.clear();
        debug!("cleared joints");
    }

    /// Destroy every body. Bound bodies detach their node from the scene.
    pub fn clear_bodies(&mut self, commands: &mut Commands<'_, '_>) {
        let handles: Vec<_> = self.rigid_body_set.iter().map(|(h, _)| h).collect();
        for handle in handles {
            if let Some(entity) = self.body_entities.get(&handle).copied() {
                self.release_body(handle, entity, commands);
            } else {
                self.remove_body(handle);
            }
        }
        let loose: Vec<_> = self.collider_set.iter().map(|(h, _)| h).collect();
        for handle in loose {
            self.collider_set.remove(
                handle,
                &mut self.island_manager,
                &mut self.rigid_body_set,
                false,
            );
        }
        self.ground = None;
        debug!("cleared bodies");
    }

    /// Destroy all joints, then all bodies. The world stays usable.
    pub fn clear(&mut self, commands: &mut Commands<'_, '_>) {
        let (bodies, joints) = (self.body_count(), self.joint_count());
        self.clear_joints(commands);
        self.clear_bodies(commands);
        info!(bodies, joints, "cleared physics world");
    }
}

pub(crate) fn despawn(commands: &mut Commands<'_, '_>, entity: Entity) {
    if let Ok(mut node) = commands.get_entity(entity) {
        node.try_despawn();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
