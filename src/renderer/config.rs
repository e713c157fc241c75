use ash::vk;
use crate::renderer::error::{PipelineError, PipelineResult};
use crate::renderer::resources::pipeline_state::PipelineStates;

/// Contains what the pipeline is built against: the render pass its color
/// output must be compatible with, and the fixed-function state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineConfig {
    pub render_pass: vk::RenderPass,
    pub subpass: u32,
    pub states: PipelineStates,
}

impl PipelineConfig {
    pub fn new(render_pass: vk::RenderPass) -> Self {
        Self {
            render_pass,
            ..Default::default()
        }
    }

    pub fn with_subpass(mut self, subpass: u32) -> Self {
        self.subpass = subpass;
        self
    }

    pub fn with_states(mut self, states: PipelineStates) -> Self {
        self.states = states;
        self
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if self.render_pass == vk::RenderPass::null() {
            return Err(PipelineError::invalid_config("no render pass provided"));
        }
        self.states.validate()
    }
}
