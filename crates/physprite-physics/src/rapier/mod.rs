//! Raw `rapier2d` physics backend.
//!
//! This module implements [`PhysicsBackend`](crate::backend::PhysicsBackend)
//! using the `rapier2d` crate directly. We own the
//! [`PhysicsPipeline`](rapier2d::pipeline::PhysicsPipeline), call `step()`
//! ourselves, and keep the body/joint association tables next to it.

pub mod backend;
pub mod body;
mod bridge;
pub mod context;
pub mod joint;
pub mod pulley;
pub mod systems;

pub use backend::RapierBackend;
pub use body::BodyBinding;
pub use context::{JointId, JointPolyline, PhysicsWorld};
pub use joint::{
    BoundJoint, DistanceJoint, JointBinding, PrismaticJoint, PulleyJoint, RevoluteJoint,
};
pub use pulley::PulleyId;
