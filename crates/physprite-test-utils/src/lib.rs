//! Shared test fixtures and utilities for PhySprite crates.
//!
//! Provides reusable helpers for building Bevy test apps with a physics
//! world, spawning bound nodes and joints, and running frames.

pub mod app;
pub mod spawn;

// ---------------------------------------------------------------------------
// Re-exports for convenience
// ---------------------------------------------------------------------------

pub use app::{minimal_test_app, physics_test_app, physics_test_app_with, run_frames};
pub use spawn::{spawn_box, spawn_circle, spawn_joint, with_bindings};
