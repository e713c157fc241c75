mod headless;

use ash::vk;
use color_eyre::Result;
use graphics_pipeline::{GraphicsPipeline, PipelineConfig, ShaderDirectory};
use headless::instance::HeadlessInstance;

/// Builds one pipeline on the first suitable GPU and tears it down again.
///
/// Usage: `graphics-pipeline [VERT] [FRAG]`, shader names resolved in
/// `$SHADERS_DIR` (default `shaders-built`).
fn main() -> Result<()> {
    color_eyre::install()?;
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let vert_name = args.next().unwrap_or_else(|| "mesh.vert".to_owned());
    let frag_name = args.next().unwrap_or_else(|| "mesh.frag".to_owned());
    let shaders = ShaderDirectory::from_env();

    let instance = HeadlessInstance::new()?;
    let device = instance.create_device()?;
    log::debug!("Graphics queue family {}", device.graphics_queue_family);
    let render_pass = device.create_color_render_pass(vk::Format::R8G8B8A8_UNORM)?;

    let mut pipeline = GraphicsPipeline::new(
        device.logical.clone(),
        &vert_name,
        &frag_name,
        &shaders,
        PipelineConfig::new(render_pass.handle),
    )?;
    log::info!(
        "Pipeline {:?} with layout {:?} is ready",
        pipeline.handle(),
        pipeline.layout(),
    );
    pipeline.destroy();

    Ok(())
}
