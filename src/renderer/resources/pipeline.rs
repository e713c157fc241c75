use std::sync::Arc;
use ash::vk;
use crate::renderer::config::PipelineConfig;
use crate::renderer::device::{PipelineDevice, Scoped};
use crate::renderer::error::{PipelineError, PipelineResult};
use crate::renderer::resources::pipeline_state;
use crate::renderer::resources::shader::{ShaderKind, ShaderSource, ShaderStage};

/// A graphics pipeline together with the layout it was created with.
///
/// The pipeline and layout are released exactly once: by [`destroy`],
/// by dropping, or by whichever instance they were transferred into.
/// A `Default` instance owns nothing and destroying it does nothing.
///
/// [`destroy`]: GraphicsPipeline::destroy
pub struct GraphicsPipeline<D: PipelineDevice = ash::Device> {
    device: Option<Arc<D>>,
    vert_name: String,
    frag_name: String,
    config: PipelineConfig,
    pipeline: vk::Pipeline,
    pipeline_layout: vk::PipelineLayout,
}

impl<D: PipelineDevice> GraphicsPipeline<D> {
    /// Loads both shaders from `shaders` and creates the layout and pipeline.
    ///
    /// On error nothing stays allocated on the device.
    pub fn new<S: ShaderSource + ?Sized>(
        device: Arc<D>,
        vert_name: &str,
        frag_name: &str,
        shaders: &S,
        config: PipelineConfig,
    ) -> PipelineResult<Self> {
        let (pipeline, pipeline_layout) = Self::create_graphics_pipeline(
            &device,
            vert_name,
            frag_name,
            shaders,
            &config,
        )?;
        log::info!(
            "Created graphics pipeline {:?} (layout {:?}) from {:?} + {:?}",
            pipeline,
            pipeline_layout,
            vert_name,
            frag_name,
        );

        Ok(Self {
            device: Some(device),
            vert_name: vert_name.to_owned(),
            frag_name: frag_name.to_owned(),
            config,
            pipeline,
            pipeline_layout,
        })
    }

    pub fn handle(&self) -> vk::Pipeline {
        self.pipeline
    }

    pub fn layout(&self) -> vk::PipelineLayout {
        self.pipeline_layout
    }

    pub fn vert_name(&self) -> &str {
        &self.vert_name
    }

    pub fn frag_name(&self) -> &str {
        &self.frag_name
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn device(&self) -> Option<&Arc<D>> {
        self.device.as_ref()
    }

    /// Whether this instance still owns a pipeline.
    pub fn is_live(&self) -> bool {
        self.device.is_some() && self.pipeline != vk::Pipeline::null()
    }

    /// Destroys the pipeline, then its layout. Does nothing if this instance
    /// was never constructed, already destroyed, or transferred away.
    pub fn destroy(&mut self) {
        let Some(device) = self.device.take() else {
            return;
        };
        log::debug!(
            "Destroying graphics pipeline {:?} (layout {:?})",
            self.pipeline,
            self.pipeline_layout,
        );
        unsafe {
            if self.pipeline != vk::Pipeline::null() {
                device.destroy_pipeline(self.pipeline);
            }
            if self.pipeline_layout != vk::PipelineLayout::null() {
                device.destroy_pipeline_layout(self.pipeline_layout);
            }
        }
        self.pipeline = vk::Pipeline::null();
        self.pipeline_layout = vk::PipelineLayout::null();
    }

    /// Releases whatever `self` owns and takes over everything `source` owns,
    /// leaving `source` empty.
    pub fn transfer_from(&mut self, source: &mut Self) {
        self.destroy();
        *self = std::mem::take(source);
    }

    fn create_graphics_pipeline<S: ShaderSource + ?Sized>(
        device: &D,
        vert_name: &str,
        frag_name: &str,
        shaders: &S,
        config: &PipelineConfig,
    ) -> PipelineResult<(vk::Pipeline, vk::PipelineLayout)> {
        config.validate()?;

        // Both modules are destroyed when this function returns, on every path
        let vert_stage = ShaderStage::load(device, shaders, vert_name, ShaderKind::Vertex)?;
        let frag_stage = ShaderStage::load(device, shaders, frag_name, ShaderKind::Fragment)?;
        let shader_stages = [vert_stage.create_info(), frag_stage.create_info()];

        let states = &config.states;

        let vertex_bindings = [states.vertex_layout.binding_description()];
        let vertex_attributes = states.vertex_layout.attribute_descriptions();
        let vertex_input = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&vertex_bindings)
            .vertex_attribute_descriptions(&vertex_attributes);

        let input_assembly = states.input_assembly.create_info();
        let viewport_state = pipeline_state::viewport_state_info();
        let rasterization = states.rasterization.create_info();
        let multisample = states.multisample.create_info();

        let color_blend_attachments = [states.color_blend.attachment()];
        let color_blend = states.color_blend.create_info(&color_blend_attachments);

        // Use dynamic state for viewport and scissor configuration
        let dynamic_state = pipeline_state::dynamic_state_info();

        // No descriptor sets, no push constants
        let layout_info = vk::PipelineLayoutCreateInfo::default()
            .set_layouts(&[])
            .push_constant_ranges(&[]);
        let pipeline_layout = unsafe { device.create_pipeline_layout(&layout_info) }
            .map_err(|err| {
                log::warn!("Pipeline layout creation failed ({}), releasing shader modules", err);
                PipelineError::LayoutCreation(err)
            })?;
        let pipeline_layout = Scoped::new(device, pipeline_layout, D::destroy_pipeline_layout);

        let pipeline_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization)
            .multisample_state(&multisample)
            .color_blend_state(&color_blend)
            .dynamic_state(&dynamic_state)
            .layout(pipeline_layout.handle())
            .render_pass(config.render_pass)
            .subpass(config.subpass)
            .base_pipeline_handle(vk::Pipeline::null())
            .base_pipeline_index(-1);

        let pipeline = unsafe { device.create_graphics_pipeline(&pipeline_info) }
            .map_err(|err| {
                log::warn!(
                    "Graphics pipeline creation failed ({}), releasing layout and shader modules",
                    err,
                );
                PipelineError::PipelineCreation {
                    reason: format!("driver rejected the pipeline: {}", err),
                }
            })?;

        Ok((pipeline, pipeline_layout.into_inner()))
    }
}

impl<D: PipelineDevice> Default for GraphicsPipeline<D> {
    fn default() -> Self {
        Self {
            device: None,
            vert_name: String::new(),
            frag_name: String::new(),
            config: PipelineConfig::default(),
            pipeline: vk::Pipeline::null(),
            pipeline_layout: vk::PipelineLayout::null(),
        }
    }
}

impl<D: PipelineDevice> Drop for GraphicsPipeline<D> {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_instance_owns_nothing() {
        let mut pipeline = GraphicsPipeline::<ash::Device>::default();
        assert!(!pipeline.is_live());
        assert_eq!(pipeline.handle(), vk::Pipeline::null());
        assert_eq!(pipeline.layout(), vk::PipelineLayout::null());
        assert!(pipeline.device().is_none());

        pipeline.destroy();
        pipeline.destroy();
        assert!(!pipeline.is_live());
    }

    #[test]
    fn transfer_between_empty_instances_is_a_no_op() {
        let mut src = GraphicsPipeline::<ash::Device>::default();
        let mut dst = GraphicsPipeline::<ash::Device>::default();
        dst.transfer_from(&mut src);
        assert!(!dst.is_live());
        assert!(!src.is_live());
        assert!(dst.vert_name().is_empty());
    }
}
