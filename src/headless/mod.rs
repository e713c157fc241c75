/// Just enough Vulkan to build a pipeline on a real driver: no window,
/// no swapchain, no queues beyond the one the device needs.

pub mod device;
pub mod instance;
