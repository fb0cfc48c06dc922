//! Typed vocabulary shared by bodies and joints.
//!
//! These replace magic numeric constants: body kind, fixture shape and joint
//! kind are closed enums, and every binding carries an explicit lifecycle
//! state.

// ---------------------------------------------------------------------------
// BodyKind
// ---------------------------------------------------------------------------

/// How the simulation treats a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BodyKind {
    /// Immovable (walls, floors, pivots).
    Static,
    /// Affected by gravity, forces and contacts.
    #[default]
    Dynamic,
    /// Moved by its velocity only, ignores forces.
    Kinematic,
}

// ---------------------------------------------------------------------------
// ShapeKind
// ---------------------------------------------------------------------------

/// Collision geometry attached to a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// Rectangle sized from the node's width and height.
    Box,
    /// Circle whose diameter is the node's width.
    Circle,
    /// Convex polygon from explicit vertices.
    Polygon,
}

// ---------------------------------------------------------------------------
// FixtureDef
// ---------------------------------------------------------------------------

/// Material and initial activity of a new body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixtureDef {
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    /// Whether the body starts awake (simulated right away).
    pub awake: bool,
}

impl FixtureDef {
    #[must_use]
    pub const fn new(density: f32, friction: f32, restitution: f32, awake: bool) -> Self {
        Self {
            density,
            friction,
            restitution,
            awake,
        }
    }

    /// Builder: start asleep.
    #[must_use]
    pub const fn asleep(mut self) -> Self {
        self.awake = false;
        self
    }
}

impl Default for FixtureDef {
    fn default() -> Self {
        Self::new(1.0, 0.5, 0.3, true)
    }
}

// ---------------------------------------------------------------------------
// JointKind
// ---------------------------------------------------------------------------

/// The four supported constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JointKind {
    Distance,
    Revolute,
    Pulley,
    Prismatic,
}

// ---------------------------------------------------------------------------
// BindingState
// ---------------------------------------------------------------------------

/// Lifecycle of a body or joint binding: `Created -> Active -> Destroyed`.
///
/// There is no transition out of `Destroyed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingState {
    /// Built but not yet registered with a world.
    Created,
    /// Registered; the simulation object exists.
    Active,
    /// Released. Only `destroy` may be called again (as a no-op).
    Destroyed,
}

impl BindingState {
    /// Move forward one state. `Destroyed` stays `Destroyed`.
    #[must_use]
    pub const fn advance(self) -> Self {
        match self {
            Self::Created => Self::Active,
            Self::Active | Self::Destroyed => Self::Destroyed,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn vocabulary_is_send_sync() {
        assert_send_sync::<BodyKind>();
        assert_send_sync::<ShapeKind>();
        assert_send_sync::<FixtureDef>();
        assert_send_sync::<JointKind>();
        assert_send_sync::<BindingState>();
    }

    #[test]
    fn fixture_defaults() {
        let f = FixtureDef::default();
        assert!((f.density - 1.0).abs() < f32::EPSILON);
        assert!((f.friction - 0.5).abs() < f32::EPSILON);
        assert!((f.restitution - 0.3).abs() < f32::EPSILON);
        assert!(f.awake);
        assert!(!f.asleep().awake);
    }

    #[test]
    fn body_kind_default_is_dynamic() {
        assert_eq!(BodyKind::default(), BodyKind::Dynamic);
        assert_ne!(BodyKind::Static, BodyKind::Kinematic);
    }

    #[test]
    fn binding_state_never_leaves_destroyed() {
        let s = BindingState::Created;
        let s = s.advance();
        assert_eq!(s, BindingState::Active);
        let s = s.advance();
        assert_eq!(s, BindingState::Destroyed);
        assert_eq!(s.advance(), BindingState::Destroyed);
    }
}
