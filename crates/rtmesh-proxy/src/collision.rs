//! Simplified collision geometry of the owning component, used only for debug drawing.

use glam::{Quat, Vec3};

/// How the physics body answers queries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CollisionTraceFlag {
    /// Project default.
    #[default]
    UseDefault,
    /// Simple shapes for simple queries, triangles for complex ones.
    UseSimpleAndComplex,
    /// Simple shapes answer complex queries too.
    UseSimpleAsComplex,
    /// The render triangles double as simple collision; there is nothing
    /// simplified to draw.
    UseComplexAsSimple,
}

/// One simple collision primitive in component space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CollisionShape {
    /// Oriented box.
    Box {
        /// Center.
        center: Vec3,
        /// Orientation.
        rotation: Quat,
        /// Half-size along each local axis.
        half_extents: Vec3,
    },
    /// Sphere.
    Sphere {
        /// Center.
        center: Vec3,
        /// Radius.
        radius: f32,
    },
    /// Capsule along its local Z axis.
    Capsule {
        /// Center.
        center: Vec3,
        /// Orientation.
        rotation: Quat,
        /// Radius of the caps and shaft.
        radius: f32,
        /// Half the length of the cylindrical shaft.
        half_length: f32,
    },
}

/// The physics body of the owning component.
pub trait BodySetup: Send + Sync {
    /// Trace mode of the body.
    fn collision_trace(&self) -> CollisionTraceFlag;

    /// Simple collision shapes.
    fn aggregate_geometry(&self) -> &[CollisionShape];
}

/// Plain-data body setup.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimpleBodySetup {
    /// Trace mode.
    pub trace: CollisionTraceFlag,
    /// Simple shapes.
    pub shapes: Vec<CollisionShape>,
}

impl BodySetup for SimpleBodySetup {
    fn collision_trace(&self) -> CollisionTraceFlag {
        self.trace
    }

    fn aggregate_geometry(&self) -> &[CollisionShape] {
        &self.shapes
    }
}
