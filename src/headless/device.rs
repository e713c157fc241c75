use std::sync::Arc;
use ash::vk;
use color_eyre::eyre::OptionExt;
use color_eyre::Result;

/// Logical device with one graphics queue family, nothing else
pub struct HeadlessDevice {
    pub logical: Arc<ash::Device>,
    pub graphics_queue_family: u32,
}

impl HeadlessDevice {
    pub fn new(instance: &ash::Instance) -> Result<Self> {
        let (physical, graphics_queue_family) = Self::select_physical_device(instance)?;

        let props = unsafe { instance.get_physical_device_properties(physical) };
        log::info!(
            "Using {:?} ({:?})",
            props.device_name_as_c_str().unwrap_or(c"<unnamed>"),
            props.device_type,
        );

        let queue_priorities = [1.0];
        let queue_create_infos = [
            vk::DeviceQueueCreateInfo::default()
                .queue_family_index(graphics_queue_family)
                .queue_priorities(&queue_priorities),
        ];
        let device_create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos);
        let logical = unsafe {
            instance.create_device(physical, &device_create_info, None)?
        };

        Ok(Self {
            logical: Arc::new(logical),
            graphics_queue_family,
        })
    }

    /// Render pass with a single color attachment in `format` and one subpass,
    /// the shape the mesh pipeline draws into.
    pub fn create_color_render_pass(&self, format: vk::Format) -> Result<RenderPass> {
        let color_attachments = [
            vk::AttachmentDescription::default()
                .format(format)
                .samples(vk::SampleCountFlags::TYPE_1)
                .load_op(vk::AttachmentLoadOp::CLEAR)
                .store_op(vk::AttachmentStoreOp::STORE)
                .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                .initial_layout(vk::ImageLayout::UNDEFINED)
                .final_layout(vk::ImageLayout::TRANSFER_SRC_OPTIMAL),
        ];
        let color_refs = [
            vk::AttachmentReference::default()
                .attachment(0)
                .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL),
        ];
        let subpasses = [
            vk::SubpassDescription::default()
                .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
                .color_attachments(&color_refs),
        ];
        let render_pass_info = vk::RenderPassCreateInfo::default()
            .attachments(&color_attachments)
            .subpasses(&subpasses);

        let handle = unsafe {
            self.logical.create_render_pass(&render_pass_info, None)?
        };

        Ok(RenderPass {
            handle,
            device: self.logical.clone(),
        })
    }

    fn select_physical_device(instance: &ash::Instance) -> Result<(vk::PhysicalDevice, u32)> {
        unsafe {
            instance
                .enumerate_physical_devices()?
                .into_iter()
                // Filter out devices that do not have a graphics queue
                .filter_map(|device| {
                    instance
                        .get_physical_device_queue_family_properties(device)
                        .iter()
                        .position(|q| q.queue_flags.contains(vk::QueueFlags::GRAPHICS))
                        .map(|index| (device, index as u32))
                })
                .min_by_key(|(device, _)| {
                    let props = instance.get_physical_device_properties(*device);
                    match props.device_type {
                        vk::PhysicalDeviceType::DISCRETE_GPU => 0,
                        vk::PhysicalDeviceType::INTEGRATED_GPU => 1,
                        vk::PhysicalDeviceType::VIRTUAL_GPU => 2,
                        vk::PhysicalDeviceType::CPU => 3,
                        vk::PhysicalDeviceType::OTHER => 4,
                        _ => 5,
                    }
                })
                .ok_or_eyre("No physical device with a graphics queue found")
        }
    }
}

impl Drop for HeadlessDevice {
    fn drop(&mut self) {
        unsafe {
            self.logical.destroy_device(None);
        }
    }
}

pub struct RenderPass {
    pub handle: vk::RenderPass,
    device: Arc<ash::Device>,
}

impl Drop for RenderPass {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_render_pass(self.handle, None);
        }
    }
}
