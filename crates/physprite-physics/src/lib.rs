// physprite-physics: binds scene-graph nodes to 2D rigid bodies.
//
// A `PhysicsBackend` trait keeps the engine swappable; the rapier2d backend
// owns the simulation world, the body and joint bindings, and the two frame
// systems (step, then sync node transforms). The plugin delegates all setup
// to the chosen backend.

pub mod backend;
pub mod components;
pub mod plugin;
pub mod rapier;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        backend::PhysicsBackend,
        components::{BindingState, BodyKind, FixtureDef, JointKind, ShapeKind},
        plugin::PhySpritePhysicsPlugin,
        rapier::{
            BodyBinding, BoundJoint, DistanceJoint, JointBinding, JointId, JointPolyline,
            PhysicsWorld, PrismaticJoint, PulleyJoint, RapierBackend, RevoluteJoint,
        },
    };
    pub use physprite_core::{
        BindingError, ConfigError, PhySpriteError, PhySpriteSet, PhysicsConfig, WorldScale,
        to_degrees, to_radians,
    };
}

// Re-export the plugin at crate root for convenience.
pub use plugin::PhySpritePhysicsPlugin;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
