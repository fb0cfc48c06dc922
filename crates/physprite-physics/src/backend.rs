//! Engine-agnostic physics backend trait.
//!
//! A physics engine implements [`PhysicsBackend`] and is passed to
//! [`PhySpritePhysicsPlugin::new`](super::PhySpritePhysicsPlugin::new).

use bevy::app::App;

/// Trait that concrete physics engines must implement.
///
/// The backend is responsible for:
/// - Inserting its world resource, built from
///   [`PhysicsConfig`](physprite_core::PhysicsConfig)
/// - Registering its step system in
///   [`PhySpriteSet::Step`](physprite_core::PhySpriteSet::Step) and its
///   transform sync in [`PhySpriteSet::Sync`](physprite_core::PhySpriteSet::Sync)
pub trait PhysicsBackend: Send + Sync + 'static {
    /// Called once during plugin build to insert engine-specific resources
    /// and register systems.
    fn build(&self, app: &mut App);

    /// Human-readable engine name (e.g., "rapier2d").
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Verify the trait is object-safe (can be used as `dyn PhysicsBackend`).
    #[test]
    fn trait_is_object_safe() {
        fn _accepts_boxed(_: Box<dyn PhysicsBackend>) {}
    }

    #[test]
    fn trait_is_send_sync() {
        fn _assert_send_sync<T: Send + Sync>() {}
        _assert_send_sync::<Box<dyn PhysicsBackend>>();
    }

    struct NullBackend;

    impl PhysicsBackend for NullBackend {
        fn build(&self, _app: &mut App) {}
        fn name(&self) -> &str {
            "null"
        }
    }

    #[test]
    fn null_backend_can_be_boxed() {
        let b: Box<dyn PhysicsBackend> = Box::new(NullBackend);
        assert_eq!(b.name(), "null");
    }
}
