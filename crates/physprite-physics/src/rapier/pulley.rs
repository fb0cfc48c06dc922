//! Pulley constraint.
//!
//! rapier2d has no pulley joint, so the world solves this one itself right
//! before every pipeline step:
//!
//! `length_a + ratio * length_b == constant`
//!
//! where each length runs from a fixed ground anchor to the center of its
//! body. The correction is a single velocity impulse along both rope
//! directions with Baumgarte feedback on the position error.

use nalgebra::Vector2;
use rapier2d::prelude::{Real, RigidBody, RigidBodyHandle, RigidBodySet};

/// Fraction of the position error fed back per step.
const BAUMGARTE: Real = 0.2;

/// Ropes shorter than this have no defined direction.
const MIN_LENGTH: Real = 1.0e-4;

/// Corrections below this impulse are skipped so resting bodies can sleep.
const MIN_IMPULSE: Real = 1.0e-6;

/// Stable identifier of a pulley within its world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PulleyId(pub(crate) u32);

#[derive(Debug, Clone)]
pub struct PulleyConstraint {
    pub(crate) body_a: RigidBodyHandle,
    pub(crate) body_b: RigidBodyHandle,
    pub(crate) ground_a: Vector2<Real>,
    pub(crate) ground_b: Vector2<Real>,
    pub(crate) ratio: Real,
    constant: Real,
}

impl PulleyConstraint {
    /// Build from the current body positions, which fix the total rope
    /// length. Returns `None` when either body is missing.
    pub(crate) fn new(
        bodies: &RigidBodySet,
        body_a: RigidBodyHandle,
        body_b: RigidBodyHandle,
        ground_a: Vector2<Real>,
        ground_b: Vector2<Real>,
        ratio: Real,
    ) -> Option<Self> {
        let a = bodies.get(body_a)?;
        let b = bodies.get(body_b)?;
        let length_a = (a.translation() - ground_a).norm();
        let length_b = (b.translation() - ground_b).norm();
        Some(Self {
            body_a,
            body_b,
            ground_a,
            ground_b,
            ratio,
            constant: length_a + ratio * length_b,
        })
    }

    /// Whether `handle` participates.
    pub(crate) fn involves(&self, handle: RigidBodyHandle) -> bool {
        self.body_a == handle || self.body_b == handle
    }

    /// Current rope lengths (meters), if both bodies still exist.
    pub(crate) fn lengths(&self, bodies: &RigidBodySet) -> Option<(Real, Real)> {
        let a = bodies.get(self.body_a)?;
        let b = bodies.get(self.body_b)?;
        Some((
            (a.translation() - self.ground_a).norm(),
            (b.translation() - self.ground_b).norm(),
        ))
    }

    /// Total rope length `length_a + ratio * length_b` fixed at creation.
    pub(crate) fn constant(&self) -> Real {
        self.constant
    }

    /// Apply one velocity correction for a step of `dt` seconds.
    pub(crate) fn solve(&self, bodies: &mut RigidBodySet, dt: Real) {
        let Some((pa, va, inv_ma)) = bodies.get(self.body_a).map(state) else {
            return;
        };
        let Some((pb, vb, inv_mb)) = bodies.get(self.body_b).map(state) else {
            return;
        };

        let (ua, la) = direction(pa - self.ground_a);
        let (ub, lb) = direction(pb - self.ground_b);

        let k = inv_ma + self.ratio * self.ratio * inv_mb;
        if k <= 0.0 {
            return;
        }
        let mass = 1.0 / k;

        let c = self.constant - la - self.ratio * lb;
        let cdot = -ua.dot(&va) - self.ratio * ub.dot(&vb);
        let lambda = -mass * (cdot + BAUMGARTE * c / dt);
        if lambda.abs() < MIN_IMPULSE {
            return;
        }

        if inv_ma > 0.0
            && let Some(a) = bodies.get_mut(self.body_a)
        {
            a.set_linvel(va - ua * (lambda * inv_ma), true);
        }
        if inv_mb > 0.0
            && let Some(b) = bodies.get_mut(self.body_b)
        {
            b.set_linvel(vb - ub * (self.ratio * lambda * inv_mb), true);
        }
    }
}

fn state(body: &RigidBody) -> (Vector2<Real>, Vector2<Real>, Real) {
    let mass = body.mass();
    let inv_mass = if body.is_dynamic() && mass > 0.0 {
        1.0 / mass
    } else {
        0.0
    };
    (*body.translation(), *body.linvel(), inv_mass)
}

fn direction(v: Vector2<Real>) -> (Vector2<Real>, Real) {
    let length = v.norm();
    if length > MIN_LENGTH {
        (v / length, length)
    } else {
        (Vector2::zeros(), length)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
