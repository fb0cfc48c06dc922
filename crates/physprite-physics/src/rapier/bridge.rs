//! Conversions between PhySprite types and rapier2d types.
//!
//! Node-facing values (`Vec2` in pixels, [`BodyKind`], [`FixtureDef`]) are
//! turned into rapier builders here, always through the world's
//! [`WorldScale`].

use bevy::math::Vec2;
use nalgebra::{Point2, Unit, UnitComplex, Vector2};
use rapier2d::prelude::{
    ColliderBuilder, GenericJoint, GenericJointBuilder, JointAxesMask, JointAxis, MotorModel,
    PrismaticJointBuilder, Real, RevoluteJointBuilder, RigidBodyType, SharedShape,
};

use physprite_core::{BindingError, WorldScale};

use crate::components::{BodyKind, FixtureDef, ShapeKind};

/// Segments used to approximate a circle outline.
const CIRCLE_OUTLINE_SEGMENTS: usize = 16;

/// Damping gain of velocity motors. The motor's max force/torque is what
/// actually bounds it.
pub(crate) const MOTOR_GAIN: Real = 1.0e4;

// ---------------------------------------------------------------------------
// Vectors
// ---------------------------------------------------------------------------

#[inline]
pub(crate) fn to_vector(v: Vec2) -> Vector2<Real> {
    Vector2::new(v.x, v.y)
}

#[inline]
pub(crate) fn to_point(v: Vec2) -> Point2<Real> {
    Point2::new(v.x, v.y)
}

#[inline]
pub(crate) fn from_vector(v: &Vector2<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

#[inline]
pub(crate) fn from_point(p: &Point2<Real>) -> Vec2 {
    Vec2::new(p.x, p.y)
}

/// Unit axis, or `InvalidAxis` for zero and non-finite input.
pub(crate) fn unit_axis(axis: Vec2) -> Result<Unit<Vector2<Real>>, BindingError> {
    if !axis.is_finite() || axis.length_squared() <= f32::EPSILON {
        return Err(BindingError::InvalidAxis);
    }
    Ok(Unit::new_normalize(to_vector(axis)))
}

// ---------------------------------------------------------------------------
// Body kinds
// ---------------------------------------------------------------------------

pub(crate) const fn body_type(kind: BodyKind) -> RigidBodyType {
    match kind {
        BodyKind::Static => RigidBodyType::Fixed,
        BodyKind::Dynamic => RigidBodyType::Dynamic,
        BodyKind::Kinematic => RigidBodyType::KinematicVelocityBased,
    }
}

pub(crate) const fn body_kind(body_type: RigidBodyType) -> BodyKind {
    match body_type {
        RigidBodyType::Fixed => BodyKind::Static,
        RigidBodyType::Dynamic => BodyKind::Dynamic,
        RigidBodyType::KinematicVelocityBased | RigidBodyType::KinematicPositionBased => {
            BodyKind::Kinematic
        }
    }
}

// ---------------------------------------------------------------------------
// Shapes
// ---------------------------------------------------------------------------

/// Geometry of a new body, in pixels relative to the node's center.
#[derive(Debug, Clone)]
pub(crate) enum ShapeDef<'a> {
    Box { size: Vec2 },
    Circle { radius: f32 },
    Polygon { vertices: &'a [Vec2] },
}

impl ShapeDef<'_> {
    pub(crate) const fn kind(&self) -> ShapeKind {
        match self {
            Self::Box { .. } => ShapeKind::Box,
            Self::Circle { .. } => ShapeKind::Circle,
            Self::Polygon { .. } => ShapeKind::Polygon,
        }
    }
}

fn check_size(width: f32, height: f32) -> Result<(), BindingError> {
    if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
        return Err(BindingError::InvalidSize { width, height });
    }
    Ok(())
}

fn all_collinear(vertices: &[Vec2]) -> bool {
    let origin = vertices[0];
    vertices.iter().all(|a| {
        vertices
            .iter()
            .all(|b| (*a - origin).perp_dot(*b - origin).abs() <= f32::EPSILON)
    })
}

/// Build a collider for `shape` with the fixture's material.
pub(crate) fn collider_builder(
    shape: &ShapeDef<'_>,
    fixture: &FixtureDef,
    scale: WorldScale,
) -> Result<ColliderBuilder, BindingError> {
    let builder = match shape {
        ShapeDef::Box { size } => {
            check_size(size.x, size.y)?;
            ColliderBuilder::cuboid(scale.to_meters(size.x / 2.0), scale.to_meters(size.y / 2.0))
        }
        ShapeDef::Circle { radius } => {
            check_size(*radius * 2.0, *radius * 2.0)?;
            ColliderBuilder::ball(scale.to_meters(*radius))
        }
        ShapeDef::Polygon { vertices } => {
            if vertices.len() < 3
                || vertices.iter().any(|v| !v.is_finite())
                || all_collinear(vertices)
            {
                return Err(BindingError::InvalidPolygon {
                    count: vertices.len(),
                });
            }
            let points: Vec<Point2<Real>> = vertices
                .iter()
                .map(|v| to_point(scale.vec_to_meters(*v)))
                .collect();
            ColliderBuilder::convex_hull(&points).ok_or(BindingError::InvalidPolygon {
                count: vertices.len(),
            })?
        }
    };
    Ok(builder
        .density(fixture.density)
        .friction(fixture.friction)
        .restitution(fixture.restitution))
}

/// Local outline of a collider shape in pixels, counter-clockwise.
pub(crate) fn shape_outline(shape: &SharedShape, scale: WorldScale) -> Vec<Vec2> {
    if let Some(ball) = shape.as_ball() {
        let r = scale.to_pixels(ball.radius);
        #[allow(clippy::cast_precision_loss)]
        return (0..CIRCLE_OUTLINE_SEGMENTS)
            .map(|i| {
                let a = std::f32::consts::TAU * i as f32 / CIRCLE_OUTLINE_SEGMENTS as f32;
                Vec2::new(a.cos(), a.sin()) * r
            })
            .collect();
    }
    if let Some(cuboid) = shape.as_cuboid() {
        let h = scale.vec_to_pixels(from_vector(&cuboid.half_extents));
        return vec![
            Vec2::new(-h.x, -h.y),
            Vec2::new(h.x, -h.y),
            Vec2::new(h.x, h.y),
            Vec2::new(-h.x, h.y),
        ];
    }
    if let Some(polygon) = shape.as_convex_polygon() {
        return polygon
            .points()
            .iter()
            .map(|p| scale.vec_to_pixels(from_point(p)))
            .collect();
    }
    Vec::new()
}

// ---------------------------------------------------------------------------
// Joints
// ---------------------------------------------------------------------------

// Bodies sharing a joint never collide with each other.

/// Distance joint between two body centers.
///
/// `frequency == 0` holds the length rigidly; otherwise the length is a
/// spring target with the given oscillation frequency (Hz) and damping ratio.
pub(crate) fn distance_joint(length: Real, frequency: Real, damping_ratio: Real) -> GenericJoint {
    let mut joint = GenericJointBuilder::new(JointAxesMask::empty())
        .coupled_axes(JointAxesMask::LIN_AXES)
        .contacts_enabled(false)
        .build();
    configure_distance(&mut joint, length, frequency, damping_ratio);
    joint
}

pub(crate) fn configure_distance(
    joint: &mut GenericJoint,
    length: Real,
    frequency: Real,
    damping_ratio: Real,
) {
    if frequency > 0.0 {
        let omega = std::f32::consts::TAU * frequency;
        let stiffness = omega * omega;
        let damping = 2.0 * damping_ratio * omega;
        joint.limit_axes.remove(JointAxesMask::LIN_X);
        joint.set_motor_model(JointAxis::LinX, MotorModel::AccelerationBased);
        joint.set_motor_position(JointAxis::LinX, length, stiffness, damping);
    } else {
        joint.motor_axes.remove(JointAxesMask::LIN_X);
        joint.set_limits(JointAxis::LinX, [length, length]);
    }
}

/// Revolute joint with anchors given in each body's local frame (meters).
pub(crate) fn revolute_joint(anchor_a: Point2<Real>, anchor_b: Point2<Real>) -> GenericJoint {
    RevoluteJointBuilder::new()
        .local_anchor1(anchor_a)
        .local_anchor2(anchor_b)
        .contacts_enabled(false)
        .build()
        .into()
}

/// Prismatic joint sliding along `axis` (ground frame). `body_angle` is the
/// body's current rotation, which the joint then holds.
pub(crate) fn prismatic_joint(
    axis: Unit<Vector2<Real>>,
    anchor_ground: Point2<Real>,
    body_angle: Real,
) -> GenericJoint {
    let local_axis = UnitComplex::new(-body_angle) * axis;
    PrismaticJointBuilder::new(axis)
        .local_axis2(local_axis)
        .local_anchor1(anchor_ground)
        .local_anchor2(Point2::origin())
        .contacts_enabled(false)
        .build()
        .into()
}

/// Velocity motor on `axis`, or a free axis when disabled.
pub(crate) fn configure_motor(
    joint: &mut GenericJoint,
    axis: JointAxis,
    enabled: bool,
    speed: Real,
    max_force: Real,
) {
    if enabled {
        joint.set_motor_model(axis, MotorModel::ForceBased);
        joint.set_motor_velocity(axis, speed, MOTOR_GAIN);
        joint.set_motor_max_force(axis, max_force);
    } else {
        joint.motor_axes.remove(JointAxesMask::from(axis));
    }
}

/// Limits on `axis`, or none at all when disabled.
pub(crate) fn configure_limits(
    joint: &mut GenericJoint,
    axis: JointAxis,
    enabled: bool,
    lower: Real,
    upper: Real,
) {
    if enabled {
        joint.set_limits(axis, [lower, upper]);
    } else {
        joint.limit_axes.remove(JointAxesMask::from(axis));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_kind_mapping_is_symmetric() {
        for kind in [BodyKind::Static, BodyKind::Dynamic, BodyKind::Kinematic] {
            assert_eq!(body_kind(body_type(kind)), kind);
        }
        assert_eq!(
            body_kind(RigidBodyType::KinematicPositionBased),
            BodyKind::Kinematic
        );
    }

    #[test]
    fn vector_conversion() {
        let v = Vec2::new(1.5, -3.0);
        assert_eq!(from_vector(&to_vector(v)), v);
        assert_eq!(from_point(&to_point(v)), v);
    }

    #[test]
    fn unit_axis_rejects_zero() {
        assert_eq!(unit_axis(Vec2::ZERO), Err(BindingError::InvalidAxis));
        assert_eq!(unit_axis(Vec2::NAN), Err(BindingError::InvalidAxis));
        let a = unit_axis(Vec2::new(3.0, 4.0)).unwrap();
        assert!((a.x - 0.6).abs() < 1e-6);
        assert!((a.y - 0.8).abs() < 1e-6);
    }

    #[test]
    fn box_collider_uses_scale() {
        let scale = WorldScale::new(32.0).unwrap();
        let fixture = FixtureDef::default();
        let collider = collider_builder(
            &ShapeDef::Box {
                size: Vec2::new(64.0, 32.0),
            },
            &fixture,
            scale,
        )
        .unwrap()
        .build();
        let cuboid = collider.shape().as_cuboid().unwrap();
        assert!((cuboid.half_extents.x - 1.0).abs() < 1e-6);
        assert!((cuboid.half_extents.y - 0.5).abs() < 1e-6);
        assert!((collider.friction() - 0.5).abs() < f32::EPSILON);
        assert!((collider.restitution() - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn circle_collider_uses_radius() {
        let scale = WorldScale::new(10.0).unwrap();
        let collider = collider_builder(
            &ShapeDef::Circle { radius: 5.0 },
            &FixtureDef::default(),
            scale,
        )
        .unwrap()
        .build();
        let ball = collider.shape().as_ball().unwrap();
        assert!((ball.radius - 0.5).abs() < 1e-6);
    }

    #[test]
    fn degenerate_shapes_rejected() {
        let scale = WorldScale::default();
        let fixture = FixtureDef::default();
        assert!(matches!(
            collider_builder(&ShapeDef::Box { size: Vec2::new(0.0, 4.0) }, &fixture, scale),
            Err(BindingError::InvalidSize { .. })
        ));
        assert!(matches!(
            collider_builder(&ShapeDef::Circle { radius: -1.0 }, &fixture, scale),
            Err(BindingError::InvalidSize { .. })
        ));
        let two = [Vec2::ZERO, Vec2::X];
        assert_eq!(
            collider_builder(&ShapeDef::Polygon { vertices: &two }, &fixture, scale).err(),
            Some(BindingError::InvalidPolygon { count: 2 })
        );
        let collinear = [Vec2::ZERO, Vec2::X, Vec2::X * 2.0];
        assert_eq!(
            collider_builder(
                &ShapeDef::Polygon {
                    vertices: &collinear
                },
                &fixture,
                scale
            )
            .err(),
            Some(BindingError::InvalidPolygon { count: 3 })
        );
    }

    #[test]
    fn box_outline_has_four_corners() {
        let scale = WorldScale::default();
        let shape = SharedShape::cuboid(1.0, 2.0);
        let outline = shape_outline(&shape, scale);
        assert_eq!(outline.len(), 4);
        assert_eq!(outline[2], Vec2::new(32.0, 64.0));
    }

    #[test]
    fn circle_outline_lies_on_radius() {
        let scale = WorldScale::default();
        let shape = SharedShape::ball(0.5);
        for p in shape_outline(&shape, scale) {
            assert!((p.length() - 16.0).abs() < 1e-3);
        }
    }

    #[test]
    fn rigid_distance_joint_pins_length() {
        let joint = distance_joint(2.0, 0.0, 0.0);
        let limits = joint.limits(JointAxis::LinX).unwrap();
        assert!((limits.min - 2.0).abs() < f32::EPSILON);
        assert!((limits.max - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn soft_distance_joint_uses_motor() {
        let joint = distance_joint(2.0, 1.0, 0.5);
        let motor = joint.motor(JointAxis::LinX).unwrap();
        assert!((motor.target_pos - 2.0).abs() < f32::EPSILON);
        assert!(motor.stiffness > 0.0);
        assert!(motor.damping > 0.0);
        assert!(joint.limits(JointAxis::LinX).is_none());
    }

    #[test]
    fn spring_back_to_rigid_drops_motor() {
        let mut joint = distance_joint(2.0, 1.0, 0.5);
        configure_distance(&mut joint, 3.0, 0.0, 0.0);
        assert!(joint.motor(JointAxis::LinX).is_none());
        assert!((joint.limits(JointAxis::LinX).unwrap().min - 3.0).abs() < f32::EPSILON);
    }

    #[test]
    fn disabled_limits_leave_axis_free() {
        let mut joint = revolute_joint(Point2::origin(), Point2::origin());
        configure_limits(&mut joint, JointAxis::AngX, true, -0.5, 0.5);
        assert!(joint.limits(JointAxis::AngX).is_some());
        configure_limits(&mut joint, JointAxis::AngX, false, -0.5, 0.5);
        assert!(joint.limits(JointAxis::AngX).is_none());
        assert!(!joint.limit_axes.contains(JointAxesMask::ANG_X));
    }

    #[test]
    fn disabled_motor_leaves_axis_free() {
        let axis = unit_axis(Vec2::X).unwrap();
        let mut joint = prismatic_joint(axis, Point2::origin(), 0.0);
        configure_motor(&mut joint, JointAxis::LinX, true, 1.0, 10.0);
        assert!(joint.motor(JointAxis::LinX).is_some());
        configure_motor(&mut joint, JointAxis::LinX, false, 1.0, 10.0);
        assert!(joint.motor(JointAxis::LinX).is_none());
    }
}
