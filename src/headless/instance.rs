use std::ffi::{c_char, c_void, CStr};
use ash::vk;
use color_eyre::Result;
use crate::headless::device::HeadlessDevice;

/// Loads Vulkan and keeps the instance alive, without any window or surface
pub struct HeadlessInstance {
    _entry: ash::Entry,
    instance: ash::Instance,
    debug_utils: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
}

impl HeadlessInstance {
    const ENABLE_VALIDATION_LAYERS: bool = cfg!(debug_assertions);
    const VALIDATION_LAYER: &'static CStr = c"VK_LAYER_KHRONOS_validation";

    pub fn new() -> Result<Self> {
        let entry = unsafe { ash::Entry::load()? };

        let validation = Self::ENABLE_VALIDATION_LAYERS
            && Self::validation_layer_supported(&entry)?;
        if Self::ENABLE_VALIDATION_LAYERS && !validation {
            log::warn!("{:?} not available, running without validation", Self::VALIDATION_LAYER);
        }

        let instance = Self::create_instance(&entry, validation)?;

        let debug_utils = if validation {
            let loader = ash::ext::debug_utils::Instance::new(&entry, &instance);
            let messenger = unsafe {
                loader.create_debug_utils_messenger(&debug_utils_messenger_create_info(), None)?
            };
            Some((loader, messenger))
        } else {
            None
        };

        Ok(Self {
            _entry: entry,
            instance,
            debug_utils,
        })
    }

    pub fn create_device(&self) -> Result<HeadlessDevice> {
        HeadlessDevice::new(&self.instance)
    }

    fn create_instance(entry: &ash::Entry, validation: bool) -> Result<ash::Instance> {
        let application_info = vk::ApplicationInfo::default()
            .application_name(c"graphics-pipeline-probe")
            .api_version(vk::API_VERSION_1_0);
        let enabled_layer_names = if validation {
            vec![Self::VALIDATION_LAYER.as_ptr()]
        } else {
            Vec::new()
        };
        let mut enabled_extension_names: Vec<*const c_char> = Vec::new();
        if validation {
            enabled_extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
        }

        #[cfg(target_os = "macos")]
        enabled_extension_names.push(ash::khr::portability_enumeration::NAME.as_ptr());

        let instance_info = vk::InstanceCreateInfo::default()
            .application_info(&application_info)
            .enabled_layer_names(&enabled_layer_names)
            .enabled_extension_names(&enabled_extension_names);

        #[cfg(target_os = "macos")]
        let instance_info = instance_info
            .flags(vk::InstanceCreateFlags::ENUMERATE_PORTABILITY_KHR);

        Ok(unsafe {
            entry.create_instance(&instance_info, None)?
        })
    }

    fn validation_layer_supported(entry: &ash::Entry) -> Result<bool> {
        let layers = unsafe { entry.enumerate_instance_layer_properties()? };
        Ok(layers.iter().any(|props| {
            props
                .layer_name_as_c_str()
                .map_or(false, |name| name == Self::VALIDATION_LAYER)
        }))
    }
}

impl Drop for HeadlessInstance {
    fn drop(&mut self) {
        unsafe {
            if let Some((loader, messenger)) = self.debug_utils.take() {
                loader.destroy_debug_utils_messenger(messenger, None);
            }
            self.instance.destroy_instance(None);
        }
    }
}

fn debug_utils_messenger_create_info(
) -> vk::DebugUtilsMessengerCreateInfoEXT<'static> {
    let message_severity = vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
        | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
        | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR;
    let message_type = vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
        | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
        | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE;
    vk::DebugUtilsMessengerCreateInfoEXT::default()
        .message_severity(message_severity)
        .message_type(message_type)
        .pfn_user_callback(Some(debug_callback))
}

unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _p_user_data: *mut c_void,
) -> vk::Bool32 {
    let msg_type = match message_type {
        vk::DebugUtilsMessageTypeFlagsEXT::GENERAL => "[General]",
        vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE => "[Performance]",
        vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION => "[Validation]",
        _ => "[Unknown]",
    };
    let msg = unsafe {
        CStr::from_ptr((*p_callback_data).p_message)
    };
    match message_severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE => {
            log::trace!("[Verbose]{} {:?}", msg_type, msg);
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => {
            log::warn!("[Warning]{} {:?}", msg_type, msg);
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => {
            log::error!("[Error]{} {:?}", msg_type, msg);
        }
        _ => {
            log::info!("[Info]{} {:?}", msg_type, msg);
        }
    }

    vk::FALSE
}
