use std::fmt::Debug;
use std::slice;
use ash::prelude::VkResult;
use ash::vk;

/// The driver entry points a graphics pipeline needs.
///
/// Implemented for `ash::Device`; anything else implementing it (a recording
/// device in tests, a wrapper that counts allocations) must behave like the
/// Vulkan calls of the same name.
///
/// # Safety
///
/// Callers uphold the Vulkan valid-usage rules of the matching `vkCreate*` /
/// `vkDestroy*` call: create infos point at live data for the duration of the
/// call, and destroyed handles were created by this device and are no longer
/// in use by the GPU.
pub trait PipelineDevice {
    unsafe fn create_shader_module(
        &self,
        info: &vk::ShaderModuleCreateInfo<'_>,
    ) -> VkResult<vk::ShaderModule>;

    unsafe fn destroy_shader_module(&self, module: vk::ShaderModule);

    unsafe fn create_pipeline_layout(
        &self,
        info: &vk::PipelineLayoutCreateInfo<'_>,
    ) -> VkResult<vk::PipelineLayout>;

    unsafe fn destroy_pipeline_layout(&self, layout: vk::PipelineLayout);

    /// Creates exactly one graphics pipeline without a pipeline cache.
    unsafe fn create_graphics_pipeline(
        &self,
        info: &vk::GraphicsPipelineCreateInfo<'_>,
    ) -> VkResult<vk::Pipeline>;

    unsafe fn destroy_pipeline(&self, pipeline: vk::Pipeline);
}

impl PipelineDevice for ash::Device {
    unsafe fn create_shader_module(
        &self,
        info: &vk::ShaderModuleCreateInfo<'_>,
    ) -> VkResult<vk::ShaderModule> {
        unsafe { ash::Device::create_shader_module(self, info, None) }
    }

    unsafe fn destroy_shader_module(&self, module: vk::ShaderModule) {
        unsafe { ash::Device::destroy_shader_module(self, module, None) }
    }

    unsafe fn create_pipeline_layout(
        &self,
        info: &vk::PipelineLayoutCreateInfo<'_>,
    ) -> VkResult<vk::PipelineLayout> {
        unsafe { ash::Device::create_pipeline_layout(self, info, None) }
    }

    unsafe fn destroy_pipeline_layout(&self, layout: vk::PipelineLayout) {
        unsafe { ash::Device::destroy_pipeline_layout(self, layout, None) }
    }

    unsafe fn create_graphics_pipeline(
        &self,
        info: &vk::GraphicsPipelineCreateInfo<'_>,
    ) -> VkResult<vk::Pipeline> {
        let result = unsafe {
            ash::Device::create_graphics_pipelines(
                self,
                vk::PipelineCache::null(),
                slice::from_ref(info),
                None,
            )
        };
        match result {
            Ok(pipelines) => pipelines
                .into_iter()
                .next()
                .ok_or(vk::Result::ERROR_UNKNOWN),
            Err((pipelines, err)) => {
                // A failed batch may still hand back non-null pipelines
                for pipeline in pipelines
                    .into_iter()
                    .filter(|pipeline| *pipeline != vk::Pipeline::null())
                {
                    unsafe { ash::Device::destroy_pipeline(self, pipeline, None) };
                }
                Err(err)
            }
        }
    }

    unsafe fn destroy_pipeline(&self, pipeline: vk::Pipeline) {
        unsafe { ash::Device::destroy_pipeline(self, pipeline, None) }
    }
}

/// A device object that is released when the guard goes out of scope,
/// unless ownership is taken with [`Scoped::into_inner`].
pub(crate) struct Scoped<'d, D: PipelineDevice, H: vk::Handle + Copy + Debug> {
    device: &'d D,
    handle: H,
    release: unsafe fn(&D, H),
}

impl<'d, D: PipelineDevice, H: vk::Handle + Copy + Debug> Scoped<'d, D, H> {
    pub(crate) fn new(device: &'d D, handle: H, release: unsafe fn(&D, H)) -> Self {
        Self { device, handle, release }
    }

    pub(crate) fn handle(&self) -> H {
        self.handle
    }

    pub(crate) fn into_inner(self) -> H {
        let handle = self.handle;
        std::mem::forget(self);
        handle
    }
}

impl<D: PipelineDevice, H: vk::Handle + Copy + Debug> Drop for Scoped<'_, D, H> {
    fn drop(&mut self) {
        log::debug!("Releasing {:?}", self.handle);
        unsafe {
            (self.release)(self.device, self.handle);
        }
    }
}
