//! Lifecycle walkthrough
//!
//! Runs a few frames on the headless backend: creates objects, records descriptor
//! tables, drops handles mid-frame and shows them leaving the death list.
//!
//! ```text
//! RUST_LOG=debug cargo run -p lifecycle [settings.json]
//! ```

use std::sync::Arc;

use anyhow::Context;
use mll::{
    CommandListDesc, Descriptor, Device, DeviceDesc, DeviceSettings, HeadlessBackend,
    ResourceFormat, ResourceUsage, SwapchainDesc, TextureDesc,
};

const FRAMES: u32 = 6;
const DRAWS_PER_FRAME: u64 = 700;

fn load_settings() -> anyhow::Result<DeviceSettings> {
    let Some(path) = std::env::args().nth(1) else {
        return Ok(DeviceSettings::default());
    };
    let text = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {path}"))
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = load_settings()?;
    let backend = Arc::new(HeadlessBackend::new());
    let device = Device::new(&DeviceDesc::default().with_settings(settings), backend.clone())?;

    let swapchain = device.create_swapchain(
        &SwapchainDesc::default()
            .with_label("main")
            .with_size(1280, 720)
            .with_back_buffer_count(3),
    )?;
    let list = device.create_command_list(&CommandListDesc::default().with_label("main"))?;

    let mut scratch = None;
    for frame in 0..FRAMES {
        // a transient render target that lives for two frames
        if frame % 2 == 0 {
            scratch = Some(device.create_texture(
                &TextureDesc::default()
                    .with_label("scratch")
                    .with_size(1280, 720)
                    .with_format(ResourceFormat::R16G16B16A16Float)
                    .with_usage(ResourceUsage::RENDER_TARGET | ResourceUsage::SHADER_RESOURCE),
            )?);
        } else {
            drop(scratch.take());
        }

        list.begin()?;
        for draw in 0..DRAWS_PER_FRAME {
            let views: Vec<_> = (0..4).map(|i| Descriptor(draw * 4 + i)).collect();
            let samplers = [Descriptor(draw % 3), Descriptor(100)];
            list.allocate_resource_descriptors(&views)?;
            list.allocate_sampler_descriptors(&samplers)?;
            list.bind_descriptor_heaps()?;
        }
        list.end()?;
        swapchain.present(1)?;

        let destroyed = device.process_death_list(false);
        let stats = list
            .descriptor_stats()
            .context("graphics list without descriptor stacks")?;
        log::info!(
            "frame {frame}: back buffer {}, {} live, {} pending, {destroyed} destroyed, \
             resource heap {} slots in {} slab(s), sampler hits {}",
            swapchain.back_buffer_index(),
            device.live_object_count(),
            device.pending_kill_count(),
            stats.resource_capacity,
            stats.resource_slabs,
            stats.sampler_cache.hits,
        );
    }
    drop(scratch);

    device.for_each_live_object(|child| {
        log::info!("live: {} {} {:?}", child.object_type(), child.id(), child.name());
    });
    log::info!(
        "{} heap binds over {FRAMES} frames, {} native objects created",
        list.heap_bind_count(),
        backend.created_count()
    );

    drop(list);
    drop(swapchain);
    drop(device);
    log::info!(
        "shutdown: {} native objects still alive",
        backend.live_count()
    );
    Ok(())
}
