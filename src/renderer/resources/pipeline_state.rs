use ash::vk;
use crate::renderer::error::{PipelineError, PipelineResult};
use crate::renderer::resources::vertex::VertexLayout;

/// Viewport and scissor are supplied per frame, so a resize never needs a
/// pipeline rebuild.
pub const DYNAMIC_STATES: &[vk::DynamicState] = &[
    vk::DynamicState::VIEWPORT,
    vk::DynamicState::SCISSOR,
];

pub fn dynamic_state_info() -> vk::PipelineDynamicStateCreateInfo<'static> {
    vk::PipelineDynamicStateCreateInfo::default()
        .dynamic_states(DYNAMIC_STATES)
}

/// Counts only; the rectangles come from `cmd_set_viewport`/`cmd_set_scissor`.
pub fn viewport_state_info() -> vk::PipelineViewportStateCreateInfo<'static> {
    vk::PipelineViewportStateCreateInfo::default()
        .viewport_count(1)
        .scissor_count(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputAssemblyState {
    pub topology: vk::PrimitiveTopology,
    pub primitive_restart: bool,
}

impl Default for InputAssemblyState {
    fn default() -> Self {
        Self {
            topology: vk::PrimitiveTopology::TRIANGLE_LIST,
            primitive_restart: false,
        }
    }
}

impl InputAssemblyState {
    pub fn create_info(&self) -> vk::PipelineInputAssemblyStateCreateInfo<'static> {
        vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(self.topology)
            .primitive_restart_enable(self.primitive_restart)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthBias {
    pub constant_factor: f32,
    pub clamp: f32,
    pub slope_factor: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterizationState {
    pub depth_clamp: bool,
    /// Discards all primitives before rasterization if true
    pub rasterizer_discard: bool,
    pub polygon_mode: vk::PolygonMode,
    pub cull_mode: vk::CullModeFlags,
    pub front_face: vk::FrontFace,
    pub depth_bias: Option<DepthBias>,
    pub line_width: f32,
}

impl Default for RasterizationState {
    fn default() -> Self {
        Self {
            depth_clamp: false,
            rasterizer_discard: false,
            polygon_mode: vk::PolygonMode::FILL,
            // Backface culling
            cull_mode: vk::CullModeFlags::BACK,
            front_face: vk::FrontFace::CLOCKWISE,
            depth_bias: None,
            line_width: 1.0,
        }
    }
}

impl RasterizationState {
    pub fn with_cull_mode(
        mut self,
        cull_mode: vk::CullModeFlags,
        front_face: vk::FrontFace,
    ) -> Self {
        self.cull_mode = cull_mode;
        self.front_face = front_face;
        self
    }

    pub fn with_polygon_mode(mut self, mode: vk::PolygonMode) -> Self {
        self.polygon_mode = mode;
        self
    }

    pub fn create_info(&self) -> vk::PipelineRasterizationStateCreateInfo<'static> {
        let bias = self.depth_bias.unwrap_or(DepthBias {
            constant_factor: 0.0,
            clamp: 0.0,
            slope_factor: 0.0,
        });
        vk::PipelineRasterizationStateCreateInfo::default()
            .depth_clamp_enable(self.depth_clamp)
            .rasterizer_discard_enable(self.rasterizer_discard)
            .polygon_mode(self.polygon_mode)
            .line_width(self.line_width)
            .cull_mode(self.cull_mode)
            .front_face(self.front_face)
            .depth_bias_enable(self.depth_bias.is_some())
            .depth_bias_constant_factor(bias.constant_factor)
            .depth_bias_clamp(bias.clamp)
            .depth_bias_slope_factor(bias.slope_factor)
    }

    fn validate(&self) -> PipelineResult<()> {
        if !self.line_width.is_finite() || self.line_width <= 0.0 {
            return Err(PipelineError::invalid_config(format!(
                "line width must be positive, got {}",
                self.line_width,
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MultisampleState {
    pub samples: vk::SampleCountFlags,
    pub sample_shading: bool,
    pub min_sample_shading: f32,
    pub alpha_to_coverage: bool,
    pub alpha_to_one: bool,
}

impl Default for MultisampleState {
    fn default() -> Self {
        Self {
            // 1 sample per pixel means no multisampling
            samples: vk::SampleCountFlags::TYPE_1,
            sample_shading: false,
            min_sample_shading: 1.0,
            alpha_to_coverage: false,
            alpha_to_one: false,
        }
    }
}

impl MultisampleState {
    /// No sample mask is ever attached.
    pub fn create_info(&self) -> vk::PipelineMultisampleStateCreateInfo<'static> {
        vk::PipelineMultisampleStateCreateInfo::default()
            .rasterization_samples(self.samples)
            .sample_shading_enable(self.sample_shading)
            .min_sample_shading(self.min_sample_shading)
            .alpha_to_coverage_enable(self.alpha_to_coverage)
            .alpha_to_one_enable(self.alpha_to_one)
    }

    fn validate(&self) -> PipelineResult<()> {
        if self.samples.as_raw().count_ones() != 1 {
            return Err(PipelineError::invalid_config(format!(
                "rasterization samples must be a single sample count, got {:?}",
                self.samples,
            )));
        }
        if !(0.0..=1.0).contains(&self.min_sample_shading) {
            return Err(PipelineError::invalid_config(format!(
                "min sample shading must be within [0, 1], got {}",
                self.min_sample_shading,
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendEquation {
    pub src_color: vk::BlendFactor,
    pub dst_color: vk::BlendFactor,
    pub color_op: vk::BlendOp,
    pub src_alpha: vk::BlendFactor,
    pub dst_alpha: vk::BlendFactor,
    pub alpha_op: vk::BlendOp,
}

impl BlendEquation {
    /// Straight overwrite; also what the attachment carries when blending is off.
    pub const REPLACE: Self = Self {
        src_color: vk::BlendFactor::ONE,
        dst_color: vk::BlendFactor::ZERO,
        color_op: vk::BlendOp::ADD,
        src_alpha: vk::BlendFactor::ONE,
        dst_alpha: vk::BlendFactor::ZERO,
        alpha_op: vk::BlendOp::ADD,
    };

    // Make sure the transparent object is rendered AFTER the opaque ones
    pub const ALPHA: Self = Self {
        src_color: vk::BlendFactor::SRC_ALPHA,
        dst_color: vk::BlendFactor::ONE_MINUS_SRC_ALPHA,
        color_op: vk::BlendOp::ADD,
        src_alpha: vk::BlendFactor::ONE,
        dst_alpha: vk::BlendFactor::ZERO,
        alpha_op: vk::BlendOp::ADD,
    };

    pub const ADDITIVE: Self = Self {
        src_color: vk::BlendFactor::ONE,
        dst_color: vk::BlendFactor::DST_ALPHA,
        color_op: vk::BlendOp::ADD,
        src_alpha: vk::BlendFactor::ONE,
        dst_alpha: vk::BlendFactor::ZERO,
        alpha_op: vk::BlendOp::ADD,
    };
}

/// Blend setup of the single color attachment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorBlendState {
    pub write_mask: vk::ColorComponentFlags,
    /// `None` disables blending.
    pub blend: Option<BlendEquation>,
    /// `None` disables the logic op.
    pub logic_op: Option<vk::LogicOp>,
    pub blend_constants: [f32; 4],
}

impl Default for ColorBlendState {
    fn default() -> Self {
        Self {
            write_mask: vk::ColorComponentFlags::RGBA,
            blend: None,
            logic_op: None,
            blend_constants: [0.0; 4],
        }
    }
}

impl ColorBlendState {
    pub fn with_blending(mut self, equation: BlendEquation) -> Self {
        self.blend = Some(equation);
        self
    }

    pub fn attachment(&self) -> vk::PipelineColorBlendAttachmentState {
        let eq = self.blend.unwrap_or(BlendEquation::REPLACE);
        vk::PipelineColorBlendAttachmentState::default()
            .color_write_mask(self.write_mask)
            .blend_enable(self.blend.is_some())
            .src_color_blend_factor(eq.src_color)
            .dst_color_blend_factor(eq.dst_color)
            .color_blend_op(eq.color_op)
            .src_alpha_blend_factor(eq.src_alpha)
            .dst_alpha_blend_factor(eq.dst_alpha)
            .alpha_blend_op(eq.alpha_op)
    }

    pub fn create_info<'a>(
        &self,
        attachments: &'a [vk::PipelineColorBlendAttachmentState],
    ) -> vk::PipelineColorBlendStateCreateInfo<'a> {
        vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(self.logic_op.is_some())
            .logic_op(self.logic_op.unwrap_or(vk::LogicOp::COPY))
            .attachments(attachments)
            .blend_constants(self.blend_constants)
    }

    fn validate(&self) -> PipelineResult<()> {
        if self.write_mask.is_empty() {
            return Err(PipelineError::invalid_config(
                "color write mask is empty, the attachment would never be written",
            ));
        }
        Ok(())
    }
}

/// Every fixed-function record the pipeline is built from.
/// `Default` is the opaque, single-sampled, back-face culled mesh setup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineStates {
    pub vertex_layout: VertexLayout,
    pub input_assembly: InputAssemblyState,
    pub rasterization: RasterizationState,
    pub multisample: MultisampleState,
    pub color_blend: ColorBlendState,
}

impl PipelineStates {
    pub fn with_vertex_layout(mut self, layout: VertexLayout) -> Self {
        self.vertex_layout = layout;
        self
    }

    pub fn with_input_assembly(mut self, state: InputAssemblyState) -> Self {
        self.input_assembly = state;
        self
    }

    pub fn with_rasterization(mut self, state: RasterizationState) -> Self {
        self.rasterization = state;
        self
    }

    pub fn with_multisample(mut self, state: MultisampleState) -> Self {
        self.multisample = state;
        self
    }

    pub fn with_color_blend(mut self, state: ColorBlendState) -> Self {
        self.color_blend = state;
        self
    }

    /// Cross-field checks run before any driver object is created.
    pub fn validate(&self) -> PipelineResult<()> {
        self.vertex_layout.validate()?;
        self.rasterization.validate()?;
        self.multisample.validate()?;
        self.color_blend.validate()?;
        Ok(())
    }
}
