//! Bounding volumes and their projected size on screen.

use glam::{Mat4, Vec3};

/// Combined axis-aligned box and bounding sphere sharing one origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxSphereBounds {
    /// Center of both the box and the sphere.
    pub origin: Vec3,
    /// Half-size of the box along each axis.
    pub box_extent: Vec3,
    /// Radius of the enclosing sphere.
    pub sphere_radius: f32,
}

impl Default for BoxSphereBounds {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            box_extent: Vec3::ZERO,
            sphere_radius: 0.0,
        }
    }
}

impl BoxSphereBounds {
    /// Create bounds from explicit parts.
    pub fn new(origin: Vec3, box_extent: Vec3, sphere_radius: f32) -> Self {
        Self {
            origin,
            box_extent,
            sphere_radius,
        }
    }

    /// Bounds of an axis-aligned box; the sphere circumscribes the box.
    pub fn from_box(min: Vec3, max: Vec3) -> Self {
        let box_extent = (max - min) * 0.5;
        Self {
            origin: (min + max) * 0.5,
            box_extent,
            sphere_radius: box_extent.length(),
        }
    }

    /// Minimum corner of the box.
    pub fn min(&self) -> Vec3 {
        self.origin - self.box_extent
    }

    /// Maximum corner of the box.
    pub fn max(&self) -> Vec3 {
        self.origin + self.box_extent
    }

    /// Transform local bounds into another space (typically local-to-world).
    ///
    /// The box stays axis-aligned and grows to enclose the rotated box; the
    /// sphere radius scales by the largest axis scale.
    pub fn transformed_by(&self, m: &Mat4) -> Self {
        let origin = m.transform_point3(self.origin);
        let x = m.x_axis.truncate().abs() * self.box_extent.x;
        let y = m.y_axis.truncate().abs() * self.box_extent.y;
        let z = m.z_axis.truncate().abs() * self.box_extent.z;
        let max_scale = m
            .x_axis
            .truncate()
            .length()
            .max(m.y_axis.truncate().length())
            .max(m.z_axis.truncate().length());
        Self {
            origin,
            box_extent: x + y + z,
            sphere_radius: self.sphere_radius * max_scale,
        }
    }
}

/// Squared screen-space radius of a sphere, as a fraction of the view.
///
/// Uses the larger of the horizontal and vertical projection scales. The
/// distance attenuation is weighted by the projection's `w`-from-`z` term, so
/// orthographic projections (where that term is zero) report the unattenuated
/// size. The distance is clamped to at least 1 to avoid blowing up when the
/// view sits inside the sphere.
pub fn compute_bounds_screen_radius_squared(
    origin: Vec3,
    sphere_radius: f32,
    view_origin: Vec3,
    projection: &Mat4,
) -> f32 {
    let screen_multiple = (0.5 * projection.x_axis.x).max(0.5 * projection.y_axis.y);
    let dist_sqr = origin.distance_squared(view_origin) * projection.z_axis.w.abs();
    let r = screen_multiple * sphere_radius;
    (r * r) / dist_sqr.max(1.0)
}
