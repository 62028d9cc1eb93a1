//! Debug overlay lines: simple collision wireframes and bounding volumes.
//!
//! Compiled only with the `debug-rendering` feature. Everything here reads
//! proxy state and appends lines; primary rendering never depends on it.

use glam::{Mat4, Quat, Vec3};
use rtmesh_lod::BoxSphereBounds;

use crate::collision::{BodySetup, CollisionShape, CollisionTraceFlag};

/// Segments per debug circle.
const CIRCLE_SEGMENTS: usize = 24;

/// Selection highlight colour.
pub const SELECTED_COLOR: [f32; 4] = [0.83, 0.36, 0.0, 1.0];
/// Bounding box colour.
pub const BOUNDS_BOX_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
/// Bounding sphere colour.
pub const BOUNDS_SPHERE_COLOR: [f32; 4] = [1.0, 1.0, 0.0, 1.0];

/// Box edges as corner index pairs.
const BOX_EDGES: [(usize, usize); 12] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 0),
    (4, 5),
    (5, 6),
    (6, 7),
    (7, 4),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

/// A single debug line segment with color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DebugLine {
    /// Start point in world space.
    pub start: [f32; 3],
    /// End point in world space.
    pub end: [f32; 3],
    /// RGBA color.
    pub color: [f32; 4],
}

/// Line segments gathered for one view this frame.
#[derive(Clone, Debug, Default)]
pub struct DebugLineBuffer {
    /// Accumulated segments.
    pub lines: Vec<DebugLine>,
}

impl DebugLineBuffer {
    /// Push a line segment.
    pub fn push_line(&mut self, start: Vec3, end: Vec3, color: [f32; 4]) {
        self.lines.push(DebugLine {
            start: start.to_array(),
            end: end.to_array(),
            color,
        });
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether no segments were pushed.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Clear all lines (call at start of each frame).
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

/// Tint a base colour for selection and hover state.
pub fn selection_color(base: [f32; 4], selected: bool, hovered: bool) -> [f32; 4] {
    if selected {
        SELECTED_COLOR
    } else if hovered {
        let lift = |c: f32| c + (1.0 - c) * 0.5;
        [lift(base[0]), lift(base[1]), lift(base[2]), base[3]]
    } else {
        base
    }
}

/// Draw the simple collision of `body` transformed by `local_to_world`.
///
/// Returns `false` without drawing when the body reuses its render triangles
/// as simple collision, since there is no simplified geometry to show.
pub fn draw_collision(
    lines: &mut DebugLineBuffer,
    body: &dyn BodySetup,
    local_to_world: &Mat4,
    color: [f32; 4],
) -> bool {
    if body.collision_trace() == CollisionTraceFlag::UseComplexAsSimple {
        return false;
    }

    for shape in body.aggregate_geometry() {
        match *shape {
            CollisionShape::Box {
                center,
                rotation,
                half_extents,
            } => {
                let m = *local_to_world * Mat4::from_rotation_translation(rotation, center);
                emit_box(lines, &m, half_extents, color);
            }
            CollisionShape::Sphere { center, radius } => {
                emit_sphere(lines, local_to_world, center, radius, color);
            }
            CollisionShape::Capsule {
                center,
                rotation,
                radius,
                half_length,
            } => {
                emit_capsule(lines, local_to_world, center, rotation, radius, half_length, color);
            }
        }
    }
    true
}

/// Draw a world-space bounding box and sphere.
pub fn draw_bounds(lines: &mut DebugLineBuffer, bounds: &BoxSphereBounds, selected: bool) {
    let box_color = if selected { SELECTED_COLOR } else { BOUNDS_BOX_COLOR };
    let m = Mat4::from_translation(bounds.origin);
    emit_box(lines, &m, bounds.box_extent, box_color);
    emit_sphere(
        lines,
        &Mat4::IDENTITY,
        bounds.origin,
        bounds.sphere_radius,
        BOUNDS_SPHERE_COLOR,
    );
}

fn emit_box(lines: &mut DebugLineBuffer, m: &Mat4, he: Vec3, color: [f32; 4]) {
    let corners = [
        Vec3::new(-he.x, -he.y, -he.z),
        Vec3::new(he.x, -he.y, -he.z),
        Vec3::new(he.x, he.y, -he.z),
        Vec3::new(-he.x, he.y, -he.z),
        Vec3::new(-he.x, -he.y, he.z),
        Vec3::new(he.x, -he.y, he.z),
        Vec3::new(he.x, he.y, he.z),
        Vec3::new(-he.x, he.y, he.z),
    ]
    .map(|c| m.transform_point3(c));

    for (a, b) in BOX_EDGES {
        lines.push_line(corners[a], corners[b], color);
    }
}

/// Arc from `start` to `end` radians in the plane spanned by `x` and `y`.
#[allow(clippy::too_many_arguments)]
fn emit_arc(
    lines: &mut DebugLineBuffer,
    m: &Mat4,
    center: Vec3,
    x: Vec3,
    y: Vec3,
    radius: f32,
    (start, end): (f32, f32),
    color: [f32; 4],
) {
    let point = |angle: f32| m.transform_point3(center + (x * angle.cos() + y * angle.sin()) * radius);
    let step = (end - start) / CIRCLE_SEGMENTS as f32;
    let mut prev = point(start);
    for i in 1..=CIRCLE_SEGMENTS {
        let next = point(start + step * i as f32);
        lines.push_line(prev, next, color);
        prev = next;
    }
}

fn emit_sphere(lines: &mut DebugLineBuffer, m: &Mat4, center: Vec3, radius: f32, color: [f32; 4]) {
    let full = (0.0, std::f32::consts::TAU);
    emit_arc(lines, m, center, Vec3::X, Vec3::Y, radius, full, color);
    emit_arc(lines, m, center, Vec3::X, Vec3::Z, radius, full, color);
    emit_arc(lines, m, center, Vec3::Y, Vec3::Z, radius, full, color);
}

fn emit_capsule(
    lines: &mut DebugLineBuffer,
    m: &Mat4,
    center: Vec3,
    rotation: Quat,
    radius: f32,
    half_length: f32,
    color: [f32; 4],
) {
    let x = rotation * Vec3::X;
    let y = rotation * Vec3::Y;
    let z = rotation * Vec3::Z;
    let top = center + z * half_length;
    let bottom = center - z * half_length;
    let full = (0.0, std::f32::consts::TAU);
    let half = (0.0, std::f32::consts::PI);

    emit_arc(lines, m, top, x, y, radius, full, color);
    emit_arc(lines, m, bottom, x, y, radius, full, color);
    emit_arc(lines, m, top, x, z, radius, half, color);
    emit_arc(lines, m, top, y, z, radius, half, color);
    emit_arc(lines, m, bottom, -x, -z, radius, half, color);
    emit_arc(lines, m, bottom, -y, -z, radius, half, color);

    for side in [x, -x, y, -y] {
        lines.push_line(
            m.transform_point3(top + side * radius),
            m.transform_point3(bottom + side * radius),
            color,
        );
    }
}
