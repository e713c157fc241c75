#![allow(dead_code)]
//! Recording stand-in for a Vulkan device.
//!
//! Hands out unique fake handles, tracks which objects are alive and keeps a
//! copy of the last graphics pipeline create info so tests can inspect what
//! the driver would have been given.

use std::collections::{HashMap, HashSet};
use std::ffi::CStr;
use std::sync::{Arc, Mutex, MutexGuard};
use ash::prelude::VkResult;
use ash::vk::{self, Handle};
use graphics_pipeline::PipelineDevice;

pub const SPIRV_MAGIC: u32 = 0x0723_0203;

/// Smallest byte string the pipeline accepts as SPIR-V: a bare header.
pub fn spirv_bytes() -> Vec<u8> {
    [SPIRV_MAGIC, 0x0001_0000, 0, 1, 0]
        .iter()
        .flat_map(|word| word.to_le_bytes())
        .collect()
}

/// In-memory source with `x.vert` and `x.frag`.
pub fn shader_pair() -> HashMap<String, Vec<u8>> {
    let mut shaders = HashMap::new();
    shaders.insert("x.vert".to_owned(), spirv_bytes());
    shaders.insert("x.frag".to_owned(), spirv_bytes());
    shaders
}

pub fn render_pass() -> vk::RenderPass {
    vk::RenderPass::from_raw(0xbeef)
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Object {
    ShaderModule(u64),
    PipelineLayout(u64),
    Pipeline(u64),
}

/// Plain copy of the interesting parts of a `VkGraphicsPipelineCreateInfo`.
#[derive(Debug, Clone)]
pub struct PipelineSnapshot {
    pub stages: Vec<(vk::ShaderStageFlags, u64, String)>,
    pub bindings: Vec<(u32, u32, vk::VertexInputRate)>,
    pub attributes: Vec<(u32, u32, vk::Format, u32)>,
    pub topology: vk::PrimitiveTopology,
    pub primitive_restart: vk::Bool32,
    pub viewport_count: u32,
    pub scissor_count: u32,
    pub static_viewports: bool,
    pub static_scissors: bool,
    pub dynamic_states: Vec<vk::DynamicState>,
    pub polygon_mode: vk::PolygonMode,
    pub cull_mode: vk::CullModeFlags,
    pub front_face: vk::FrontFace,
    pub depth_bias: vk::Bool32,
    pub line_width: f32,
    pub samples: vk::SampleCountFlags,
    pub alpha_to_coverage: vk::Bool32,
    pub blend_attachments: Vec<(vk::Bool32, vk::ColorComponentFlags)>,
    pub logic_op_enable: vk::Bool32,
    pub has_depth_stencil: bool,
    pub has_tessellation: bool,
    pub layout: vk::PipelineLayout,
    pub render_pass: vk::RenderPass,
    pub subpass: u32,
    pub base_pipeline_index: i32,
}

#[derive(Default)]
pub struct MockState {
    next_handle: u64,
    pub live: Vec<Object>,
    pub destroyed: Vec<Object>,
    pub calls: usize,
    pub shader_code_sizes: Vec<usize>,
    pub rejected_code_sizes: HashSet<usize>,
    pub fail_layout: bool,
    pub incompatible_render_passes: HashSet<u64>,
    pub last_pipeline: Option<PipelineSnapshot>,
}

impl MockState {
    fn next(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn release(&mut self, object: Object) {
        let index = self
            .live
            .iter()
            .position(|live| *live == object)
            .unwrap_or_else(|| panic!("{:?} destroyed but not alive", object));
        self.live.remove(index);
        self.destroyed.push(object);
    }

    pub fn live_shader_modules(&self) -> usize {
        self.live.iter().filter(|o| matches!(o, Object::ShaderModule(_))).count()
    }

    pub fn live_layouts(&self) -> usize {
        self.live.iter().filter(|o| matches!(o, Object::PipelineLayout(_))).count()
    }

    pub fn live_pipelines(&self) -> usize {
        self.live.iter().filter(|o| matches!(o, Object::Pipeline(_))).count()
    }
}

#[derive(Default)]
pub struct MockDevice {
    state: Mutex<MockState>,
}

impl MockDevice {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }
}

unsafe fn slice<'a, T>(ptr: *const T, len: u32) -> &'a [T] {
    if ptr.is_null() || len == 0 {
        &[]
    } else {
        unsafe { std::slice::from_raw_parts(ptr, len as usize) }
    }
}

unsafe fn snapshot(info: &vk::GraphicsPipelineCreateInfo<'_>) -> PipelineSnapshot {
    unsafe {
        let stages = slice(info.p_stages, info.stage_count)
            .iter()
            .map(|stage| {
                let name = CStr::from_ptr(stage.p_name).to_string_lossy().into_owned();
                (stage.stage, stage.module.as_raw(), name)
            })
            .collect();

        let vertex_input = &*info.p_vertex_input_state;
        let bindings = slice(
            vertex_input.p_vertex_binding_descriptions,
            vertex_input.vertex_binding_description_count,
        )
        .iter()
        .map(|b| (b.binding, b.stride, b.input_rate))
        .collect();
        let attributes = slice(
            vertex_input.p_vertex_attribute_descriptions,
            vertex_input.vertex_attribute_description_count,
        )
        .iter()
        .map(|a| (a.location, a.binding, a.format, a.offset))
        .collect();

        let input_assembly = &*info.p_input_assembly_state;
        let viewport = &*info.p_viewport_state;
        let dynamic = &*info.p_dynamic_state;
        let raster = &*info.p_rasterization_state;
        let multisample = &*info.p_multisample_state;
        let blend = &*info.p_color_blend_state;

        PipelineSnapshot {
            stages,
            bindings,
            attributes,
            topology: input_assembly.topology,
            primitive_restart: input_assembly.primitive_restart_enable,
            viewport_count: viewport.viewport_count,
            scissor_count: viewport.scissor_count,
            static_viewports: !viewport.p_viewports.is_null(),
            static_scissors: !viewport.p_scissors.is_null(),
            dynamic_states: slice(dynamic.p_dynamic_states, dynamic.dynamic_state_count).to_vec(),
            polygon_mode: raster.polygon_mode,
            cull_mode: raster.cull_mode,
            front_face: raster.front_face,
            depth_bias: raster.depth_bias_enable,
            line_width: raster.line_width,
            samples: multisample.rasterization_samples,
            alpha_to_coverage: multisample.alpha_to_coverage_enable,
            blend_attachments: slice(blend.p_attachments, blend.attachment_count)
                .iter()
                .map(|a| (a.blend_enable, a.color_write_mask))
                .collect(),
            logic_op_enable: blend.logic_op_enable,
            has_depth_stencil: !info.p_depth_stencil_state.is_null(),
            has_tessellation: !info.p_tessellation_state.is_null(),
            layout: info.layout,
            render_pass: info.render_pass,
            subpass: info.subpass,
            base_pipeline_index: info.base_pipeline_index,
        }
    }
}

impl PipelineDevice for MockDevice {
    unsafe fn create_shader_module(
        &self,
        info: &vk::ShaderModuleCreateInfo<'_>,
    ) -> VkResult<vk::ShaderModule> {
        let mut state = self.state();
        state.calls += 1;
        state.shader_code_sizes.push(info.code_size);

        let first_word = unsafe { slice(info.p_code, (info.code_size / 4) as u32) }
            .first()
            .copied();
        if info.code_size == 0
            || info.code_size % 4 != 0
            || first_word != Some(SPIRV_MAGIC)
            || state.rejected_code_sizes.contains(&info.code_size)
        {
            return Err(vk::Result::ERROR_INVALID_SHADER_NV);
        }

        let handle = state.next();
        state.live.push(Object::ShaderModule(handle));
        Ok(vk::ShaderModule::from_raw(handle))
    }

    unsafe fn destroy_shader_module(&self, module: vk::ShaderModule) {
        let mut state = self.state();
        state.calls += 1;
        state.release(Object::ShaderModule(module.as_raw()));
    }

    unsafe fn create_pipeline_layout(
        &self,
        info: &vk::PipelineLayoutCreateInfo<'_>,
    ) -> VkResult<vk::PipelineLayout> {
        let mut state = self.state();
        state.calls += 1;
        assert_eq!(info.set_layout_count, 0);
        assert_eq!(info.push_constant_range_count, 0);
        if state.fail_layout {
            return Err(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY);
        }

        let handle = state.next();
        state.live.push(Object::PipelineLayout(handle));
        Ok(vk::PipelineLayout::from_raw(handle))
    }

    unsafe fn destroy_pipeline_layout(&self, layout: vk::PipelineLayout) {
        let mut state = self.state();
        state.calls += 1;
        state.release(Object::PipelineLayout(layout.as_raw()));
    }

    unsafe fn create_graphics_pipeline(
        &self,
        info: &vk::GraphicsPipelineCreateInfo<'_>,
    ) -> VkResult<vk::Pipeline> {
        let snapshot = unsafe { snapshot(info) };
        let mut state = self.state();
        state.calls += 1;

        // Every stage and the layout must still be alive while the pipeline is created
        for (_, module, _) in &snapshot.stages {
            assert!(state.live.contains(&Object::ShaderModule(*module)));
        }
        assert!(state.live.contains(&Object::PipelineLayout(snapshot.layout.as_raw())));

        let rejected = state
            .incompatible_render_passes
            .contains(&snapshot.render_pass.as_raw());
        state.last_pipeline = Some(snapshot);
        if rejected {
            return Err(vk::Result::ERROR_INITIALIZATION_FAILED);
        }

        let handle = state.next();
        state.live.push(Object::Pipeline(handle));
        Ok(vk::Pipeline::from_raw(handle))
    }

    unsafe fn destroy_pipeline(&self, pipeline: vk::Pipeline) {
        let mut state = self.state();
        state.calls += 1;
        state.release(Object::Pipeline(pipeline.as_raw()));
    }
}
