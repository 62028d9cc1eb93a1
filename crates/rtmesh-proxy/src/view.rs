//! Host view and per-object state consumed by the proxy.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use rtmesh_lod::{BoxSphereBounds, LodView};
use static_assertions::const_assert_eq;

use crate::material::MaterialRef;
use crate::section::DepthPriorityGroup;

/// Lighting channel mask objects get unless configured otherwise.
pub const DEFAULT_LIGHTING_CHANNEL_MASK: u8 = 0b001;

/// Opaque handle to the host's per-object uniform buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct UniformBufferHandle(pub u64);

/// Engine show flags that affect this proxy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShowFlags {
    /// Wireframe view mode.
    pub wireframe: bool,
    /// Collision visualisation.
    pub collision: bool,
    /// Bounding volume visualisation.
    pub bounds: bool,
}

/// State shared by every view rendered in one pass.
#[derive(Clone, Debug, Default)]
pub struct ViewFamily {
    /// Active show flags.
    pub show_flags: ShowFlags,
    /// Host predicate: does the view mode need per-pixel debug visualisation
    /// (shader complexity, lighting only, LOD colouration)?
    pub rich_view: bool,
    /// Host wireframe material, tinted by the proxy when wireframe is on.
    pub wireframe_material: Option<MaterialRef>,
}

/// One view (camera) of a view family.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneView {
    /// Eye position in world space.
    pub view_origin: Vec3,
    /// Projection matrix.
    pub projection: Mat4,
    /// Per-view LOD distance scale.
    pub lod_distance_factor: f32,
}

impl SceneView {
    /// A view with a neutral LOD distance factor.
    pub fn new(view_origin: Vec3, projection: Mat4) -> Self {
        Self {
            view_origin,
            projection,
            lod_distance_factor: 1.0,
        }
    }

    /// The view as seen by LOD selection.
    pub fn lod_view(&self) -> LodView {
        LodView {
            view_origin: self.view_origin,
            projection: self.projection,
            lod_distance_factor: self.lod_distance_factor,
        }
    }
}

/// Host-side state of the primitive this proxy renders.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PrimitiveState {
    /// Local-to-world transform.
    pub local_to_world: Mat4,
    /// Bounds in local space.
    pub local_bounds: BoxSphereBounds,
    /// Selected in the editor.
    pub selected: bool,
    /// Hovered in the editor.
    pub hovered: bool,
    /// Visible at all.
    pub shown: bool,
    /// Casts shadows.
    pub cast_shadow: bool,
    /// Whether the host allows static draw lists for this primitive.
    pub static_path_available: bool,
    /// Collision is enabled on the owning component.
    pub collision_enabled: bool,
    /// Drawn in the main pass.
    pub render_in_main_pass: bool,
    /// Drawn into the custom depth buffer.
    pub render_custom_depth: bool,
    /// Depth priority group every batch is drawn in.
    pub depth_priority: DepthPriorityGroup,
    /// Lighting channels the primitive receives light from.
    pub lighting_channel_mask: u8,
    /// Uniform buffer batches bind for their instance transform.
    pub uniform_buffer: UniformBufferHandle,
}

impl Default for PrimitiveState {
    fn default() -> Self {
        Self {
            local_to_world: Mat4::IDENTITY,
            local_bounds: BoxSphereBounds::default(),
            selected: false,
            hovered: false,
            shown: true,
            cast_shadow: true,
            static_path_available: true,
            collision_enabled: true,
            render_in_main_pass: true,
            render_custom_depth: false,
            depth_priority: DepthPriorityGroup::World,
            lighting_channel_mask: DEFAULT_LIGHTING_CHANNEL_MASK,
            uniform_buffer: UniformBufferHandle::default(),
        }
    }
}

impl PrimitiveState {
    /// World-space bounds.
    pub fn bounds(&self) -> BoxSphereBounds {
        self.local_bounds.transformed_by(&self.local_to_world)
    }

    /// A mirroring transform flips triangle winding.
    pub fn is_local_to_world_determinant_negative(&self) -> bool {
        self.local_to_world.determinant() < 0.0
    }
}

/// GPU layout of the per-object uniform, 160 bytes, std140-compatible.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct PrimitiveUniform {
    /// Local-to-world, column major.
    pub local_to_world: [[f32; 4]; 4],
    /// World-to-local, column major.
    pub world_to_local: [[f32; 4]; 4],
    /// xyz = world bounds origin, w = sphere radius.
    pub bounds_origin_radius: [f32; 4],
    /// x = sign of the transform determinant, yzw = padding.
    pub determinant_sign: [f32; 4],
}

const_assert_eq!(std::mem::size_of::<PrimitiveUniform>(), 160);

impl From<&PrimitiveState> for PrimitiveUniform {
    fn from(state: &PrimitiveState) -> Self {
        let bounds = state.bounds();
        let sign = if state.is_local_to_world_determinant_negative() {
            -1.0
        } else {
            1.0
        };
        Self {
            local_to_world: state.local_to_world.to_cols_array_2d(),
            world_to_local: state.local_to_world.inverse().to_cols_array_2d(),
            bounds_origin_radius: bounds.origin.extend(bounds.sphere_radius).to_array(),
            determinant_sign: [sign, 0.0, 0.0, 0.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirrored_transform_has_negative_determinant() {
        let mut state = PrimitiveState::default();
        assert!(!state.is_local_to_world_determinant_negative());
        state.local_to_world = Mat4::from_scale(Vec3::new(-1.0, 1.0, 1.0));
        assert!(state.is_local_to_world_determinant_negative());
    }

    #[test]
    fn test_world_bounds_follow_transform() {
        let state = PrimitiveState {
            local_to_world: Mat4::from_translation(Vec3::new(0.0, 5.0, 0.0)),
            local_bounds: BoxSphereBounds::new(Vec3::ZERO, Vec3::ONE, 1.5),
            ..Default::default()
        };
        let b = state.bounds();
        assert_eq!(b.origin, Vec3::new(0.0, 5.0, 0.0));
        assert!((b.sphere_radius - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_uniform_packs_transform_and_sign() {
        let state = PrimitiveState {
            local_to_world: Mat4::from_scale(Vec3::new(2.0, 2.0, -2.0)),
            local_bounds: BoxSphereBounds::new(Vec3::ZERO, Vec3::ONE, 1.0),
            ..Default::default()
        };
        let u = PrimitiveUniform::from(&state);
        assert_eq!(u.local_to_world[0][0], 2.0);
        assert_eq!(u.world_to_local[2][2], -0.5);
        assert_eq!(u.determinant_sign[0], -1.0);
        assert_eq!(u.bounds_origin_radius[3], 2.0);
        assert_eq!(bytemuck::bytes_of(&u).len(), 160);
    }

    #[test]
    fn test_scene_view_lod_view() {
        let mut view = SceneView::new(Vec3::X, Mat4::IDENTITY);
        view.lod_distance_factor = 0.5;
        let lod = view.lod_view();
        assert_eq!(lod.view_origin, Vec3::X);
        assert_eq!(lod.lod_distance_factor, 0.5);
    }
}
