//! Headless host that drives a runtime mesh scene proxy through a few frames.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p rtmesh-demo -- --frames 12 --show-bounds`.

use std::f32::consts::FRAC_PI_3;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use glam::{Mat4, Quat, Vec3};
use rtmesh_config::{CliArgs, Config, default_config_dir};
use rtmesh_lod::{LodError, ScreenSizeThresholds};
use rtmesh_proxy::{
    BoxSphereBounds, CollisionShape, CollisionTraceFlag, IndexBufferHandle, LodData,
    MaterialId, MeshElementCollector, MeshSectionData, PrimitiveSceneProxy, PrimitiveState,
    ProxySettings, RuntimeMeshSceneProxy, SceneView, SectionData, SectionId, SectionMaterials,
    ShowFlags, SimpleBodySetup, StaticDrawList, SurfaceMaterial, UniformBufferHandle,
    VertexFactoryHandle, ViewFamily,
};
use tracing::{error, info};

/// Camera starts this far from the object and backs off every frame.
const START_DISTANCE: f32 = 2.0;
const DISTANCE_STEP: f32 = 1.75;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config_dir = args
        .config
        .clone()
        .or_else(|| default_config_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    rtmesh_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    let mesh = match build_mesh() {
        Ok(mesh) => mesh,
        Err(e) => {
            error!("invalid LOD table: {e}");
            return ExitCode::FAILURE;
        }
    };

    run(&config, mesh, args.frames);
    ExitCode::SUCCESS
}

/// Section 0: static, three LODs. Section 1: dynamic, one LOD.
fn build_mesh() -> Result<MeshSectionData, LodError> {
    let mut mesh = MeshSectionData::new(ScreenSizeThresholds::new(&[0.8, 0.4, 0.1])?);

    let lods = [(24, 36), (12, 18), (6, 6)]
        .into_iter()
        .enumerate()
        .map(|(i, (verts, indices))| {
            let handle = 100 + i as u64;
            LodData::new(VertexFactoryHandle(handle), IndexBufferHandle(handle), verts, indices)
        })
        .collect();
    mesh.insert_section(SectionId(0), SectionData::new(lods, true));

    let animated = LodData::new(VertexFactoryHandle(200), IndexBufferHandle(200), 64, 96);
    mesh.insert_section(SectionId(1), SectionData::new(vec![animated], false));

    Ok(mesh)
}

fn proxy_settings(config: &Config) -> ProxySettings {
    ProxySettings {
        min_lod: config.lod.min_lod,
        lod_factor_scale: config.lod.factor_scale,
        allow_debug_viewmodes: config.render.allow_debug_viewmodes,
        wireframe_color: config.render.wireframe_color,
        collision_color: config.render.collision_color,
    }
}

/// Cached static batches drawn in `view`; none when the family forces the dynamic path.
fn static_batch_count(
    proxy: &RuntimeMeshSceneProxy,
    list: &StaticDrawList,
    family: &ViewFamily,
    view: &SceneView,
) -> usize {
    if proxy.view_relevance(family).static_relevance {
        proxy.visible_static_batches(list, view).count()
    } else {
        0
    }
}

fn run(config: &Config, mesh: MeshSectionData, frames: u32) {
    let mut materials = SectionMaterials::new();
    materials.set(SectionId(0), Arc::new(SurfaceMaterial::opaque(MaterialId(1))));

    let body = SimpleBodySetup {
        trace: CollisionTraceFlag::UseDefault,
        shapes: vec![CollisionShape::Box {
            center: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            half_extents: Vec3::splat(0.5),
        }],
    };

    let primitive = PrimitiveState {
        local_bounds: BoxSphereBounds::from_box(Vec3::splat(-0.5), Vec3::splat(0.5)),
        static_path_available: config.render.static_path_available,
        uniform_buffer: UniformBufferHandle(1),
        ..Default::default()
    };

    let mut proxy = RuntimeMeshSceneProxy::new(
        Arc::new(mesh),
        materials,
        Some(Arc::new(body)),
        primitive,
        proxy_settings(config),
    );
    proxy.create_render_thread_resources();

    let family = ViewFamily {
        show_flags: ShowFlags {
            wireframe: config.debug.wireframe_mode,
            collision: config.debug.show_collision,
            bounds: config.debug.show_bounds,
        },
        ..Default::default()
    };

    info!(occludable = proxy.can_be_occluded(), "proxy ready");

    let mut static_list = StaticDrawList::new();
    proxy.draw_static_elements(&mut static_list);
    info!(entries = static_list.len(), "static draw list built");

    let projection = Mat4::perspective_rh(FRAC_PI_3, 16.0 / 9.0, 0.1, 1000.0);
    let mut collector = MeshElementCollector::new(1);

    for frame in 0..frames {
        let distance = START_DISTANCE * DISTANCE_STEP.powi(frame as i32);
        let mut view = SceneView::new(Vec3::new(0.0, 0.0, distance), projection);
        view.lod_distance_factor = config.lod.distance_factor;

        let relevance = proxy.view_relevance(&family);
        collector.clear();
        proxy.dynamic_mesh_elements(&[view], &family, 0b1, &mut collector);
        collector.sort(0);

        let static_batches = static_batch_count(&proxy, &static_list, &family, &view);
        let groups = collector.groups(0).count();
        info!(
            frame,
            distance,
            lod = proxy.lod(&view),
            static_relevance = relevance.static_relevance,
            dynamic_relevance = relevance.dynamic_relevance,
            shadow_relevance = relevance.shadow_relevance,
            static_batches,
            dynamic_batches = collector.batches(0).len(),
            material_groups = groups,
            debug_lines = collector.debug_lines(0).map_or(0, |lines| lines.len()),
            "frame built"
        );
    }

    info!(bytes = proxy.memory_footprint(), "proxy memory footprint");
}
