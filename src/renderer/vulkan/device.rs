// Vulkan Device - Core GPU interface
//
// Responsibilities:
// - Instance creation with extension/layer negotiation
// - Debug messenger routing validation output into the log
// - Physical device selection (first usable device)
// - Logical device + graphics queue creation

use crate::platform::NativeHandle;
use crate::renderer::error::{RendererError, Result, VkResultExt};
use crate::renderer::InitInfo;
use ash::extensions::{ext::DebugUtils, khr};
use ash::{vk, Entry};
use raw_window_handle::RawDisplayHandle;
use std::ffi::{CStr, CString};

pub const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";
/// Needed on macOS/MoltenVK to enumerate portability devices
pub const PORTABILITY_ENUMERATION: &CStr = c"VK_KHR_portability_enumeration";
/// Prerequisite of the portability extensions on Vulkan 1.0 paths
pub const GET_PHYSICAL_DEVICE_PROPERTIES_2: &CStr = c"VK_KHR_get_physical_device_properties2";
pub const PORTABILITY_SUBSET: &CStr = c"VK_KHR_portability_subset";

/// Instance extensions chosen for this platform
#[derive(Debug, PartialEq, Eq)]
pub struct InstanceExtensions {
    pub names: Vec<&'static CStr>,
    pub portability_enumeration: bool,
    pub debug_utils: bool,
}

/// Everything we keep about the chosen GPU
#[derive(Clone)]
pub struct PhysicalDeviceInfo {
    pub handle: vk::PhysicalDevice,
    pub graphics_family: u32,
    pub memory_properties: vk::PhysicalDeviceMemoryProperties,
    pub name: String,
}

/// Borrow extension names out of Vulkan property structs
pub fn extension_names(properties: &[vk::ExtensionProperties]) -> Vec<&CStr> {
    properties
        .iter()
        .map(|p| unsafe { CStr::from_ptr(p.extension_name.as_ptr()) })
        .collect()
}

fn layer_names(properties: &[vk::LayerProperties]) -> Vec<&CStr> {
    properties
        .iter()
        .map(|p| unsafe { CStr::from_ptr(p.layer_name.as_ptr()) })
        .collect()
}

/// Window-system extensions are mandatory; the rest are added only when present.
pub fn negotiate_instance_extensions(
    required: &[&'static CStr],
    available: &[&CStr],
    want_debug_utils: bool,
) -> InstanceExtensions {
    let mut names: Vec<&'static CStr> = Vec::with_capacity(required.len() + 3);
    for &name in required {
        if !names.contains(&name) {
            names.push(name);
        }
    }

    let mut add_if_available = |name: &'static CStr| {
        let present = available.contains(&name);
        if present && !names.contains(&name) {
            names.push(name);
        }
        present
    };

    let portability_enumeration = add_if_available(PORTABILITY_ENUMERATION);
    add_if_available(GET_PHYSICAL_DEVICE_PROPERTIES_2);
    let debug_utils = want_debug_utils && add_if_available(DebugUtils::name());

    InstanceExtensions {
        names,
        portability_enumeration,
        debug_utils,
    }
}

/// Validation is best effort: a missing layer is logged, never fatal.
pub fn negotiate_validation_layer(requested: bool, available: &[&CStr]) -> Option<&'static CStr> {
    if !requested {
        return None;
    }
    if available.contains(&VALIDATION_LAYER) {
        Some(VALIDATION_LAYER)
    } else {
        log::warn!("Vulkan validation layer not found; continuing without it");
        None
    }
}

/// Swapchain is mandatory; portability subset must be enabled when exposed.
pub fn negotiate_device_extensions(available: &[&CStr]) -> Vec<&'static CStr> {
    let mut names = vec![khr::Swapchain::name()];
    if available.contains(&PORTABILITY_SUBSET) {
        names.push(PORTABILITY_SUBSET);
    }
    names
}

/// First queue family with graphics support
pub fn graphics_family(families: &[vk::QueueFamilyProperties]) -> Option<u32> {
    families
        .iter()
        .position(|f| f.queue_flags.contains(vk::QueueFlags::GRAPHICS))
        .map(|i| i as u32)
}

pub fn load_entry() -> Result<Entry> {
    unsafe { Entry::load() }.map_err(|e| RendererError::LoaderUnavailable(e.to_string()))
}

/// Create the instance. Returns whether debug utils were enabled.
pub fn create_instance(
    entry: &Entry,
    info: &InitInfo,
    display: RawDisplayHandle,
) -> Result<(ash::Instance, bool)> {
    let app_name = CString::new(info.app_name.as_str()).unwrap_or_else(|_| CString::from(c"Game_EX"));
    let engine_name = c"triangle-engine";

    let app_info = vk::ApplicationInfo::builder()
        .application_name(&app_name)
        .application_version(vk::make_api_version(0, 1, 0, 0))
        .engine_name(engine_name)
        .engine_version(vk::make_api_version(0, 1, 0, 0))
        .api_version(vk::API_VERSION_1_0);

    // Window-system extensions (surface + platform surface)
    let required: Vec<&'static CStr> = ash_window::enumerate_required_extensions(display)
        .context("Failed to query window-system instance extensions")?
        .iter()
        .map(|&ptr| unsafe { CStr::from_ptr(ptr) })
        .collect();

    let available_extensions = entry
        .enumerate_instance_extension_properties(None)
        .context("Failed to enumerate instance extensions")?;
    let available_layers = entry
        .enumerate_instance_layer_properties()
        .context("Failed to enumerate instance layers")?;

    let layer = negotiate_validation_layer(info.enable_validation, &layer_names(&available_layers));
    let extensions = negotiate_instance_extensions(
        &required,
        &extension_names(&available_extensions),
        layer.is_some(),
    );

    for name in &extensions.names {
        log::debug!("Instance extension: {}", name.to_string_lossy());
    }
    if let Some(layer) = layer {
        log::info!("Enabling {}", layer.to_string_lossy());
    }

    let extension_ptrs: Vec<_> = extensions.names.iter().map(|n| n.as_ptr()).collect();
    let layer_ptrs: Vec<_> = layer.iter().map(|l| l.as_ptr()).collect();

    let flags = if extensions.portability_enumeration {
        vk::InstanceCreateFlags::ENUMERATE_PORTABILITY_KHR
    } else {
        vk::InstanceCreateFlags::empty()
    };

    let create_info = vk::InstanceCreateInfo::builder()
        .flags(flags)
        .application_info(&app_info)
        .enabled_extension_names(&extension_ptrs)
        .enabled_layer_names(&layer_ptrs);

    let instance = unsafe { entry.create_instance(&create_info, None) }
        .context("Failed to create Vulkan instance")?;

    Ok((instance, extensions.debug_utils))
}

/// Debug utils loader + messenger
pub struct DebugMessenger {
    loader: DebugUtils,
    messenger: vk::DebugUtilsMessengerEXT,
}

impl DebugMessenger {
    pub fn new(entry: &Entry, instance: &ash::Instance) -> Result<Self> {
        let loader = DebugUtils::new(entry, instance);

        let create_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
            .message_severity(
                vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
                    | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                    | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                    | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
            )
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(debug_callback));

        let messenger = unsafe { loader.create_debug_utils_messenger(&create_info, None) }
            .context("Failed to create debug messenger")?;

        Ok(Self { loader, messenger })
    }

    pub fn destroy(&self) {
        unsafe {
            self.loader
                .destroy_debug_utils_messenger(self.messenger, None);
        }
    }
}

/// Create the platform surface for the window
pub fn create_surface(
    entry: &Entry,
    instance: &ash::Instance,
    handle: NativeHandle,
) -> Result<vk::SurfaceKHR> {
    unsafe { ash_window::create_surface(entry, instance, handle.display, handle.window, None) }
        .context("Failed to create window surface")
}

/// Take the first enumerated GPU whose graphics queue can present to `surface`.
pub fn pick_physical_device(
    instance: &ash::Instance,
    surface_loader: &khr::Surface,
    surface: vk::SurfaceKHR,
) -> Result<PhysicalDeviceInfo> {
    let devices = unsafe { instance.enumerate_physical_devices() }
        .context("Failed to enumerate physical devices")?;

    if devices.is_empty() {
        return Err(RendererError::NoPhysicalDevice);
    }

    let mut saw_graphics = false;

    for device in devices {
        let families = unsafe { instance.get_physical_device_queue_family_properties(device) };
        let Some(family) = graphics_family(&families) else {
            continue;
        };
        saw_graphics = true;

        let can_present = unsafe {
            surface_loader.get_physical_device_surface_support(device, family, surface)
        }
        .context("Failed to query surface support")?;

        if !can_present {
            continue;
        }

        let properties = unsafe { instance.get_physical_device_properties(device) };
        let memory_properties = unsafe { instance.get_physical_device_memory_properties(device) };
        let name = unsafe { CStr::from_ptr(properties.device_name.as_ptr()) }
            .to_string_lossy()
            .into_owned();

        log::info!("Selected GPU: {}", name);
        log::info!(
            "API Version: {}.{}.{}",
            vk::api_version_major(properties.api_version),
            vk::api_version_minor(properties.api_version),
            vk::api_version_patch(properties.api_version)
        );

        return Ok(PhysicalDeviceInfo {
            handle: device,
            graphics_family: family,
            memory_properties,
            name,
        });
    }

    Err(if saw_graphics {
        RendererError::NoSuitableDevice
    } else {
        RendererError::NoGraphicsQueue
    })
}

pub fn create_logical_device(
    instance: &ash::Instance,
    physical: &PhysicalDeviceInfo,
) -> Result<(ash::Device, vk::Queue)> {
    let queue_priorities = [1.0];
    let queue_create_info = vk::DeviceQueueCreateInfo::builder()
        .queue_family_index(physical.graphics_family)
        .queue_priorities(&queue_priorities)
        .build();

    let available = unsafe { instance.enumerate_device_extension_properties(physical.handle) }
        .context("Failed to enumerate device extensions")?;
    let extensions = negotiate_device_extensions(&extension_names(&available));
    let extension_ptrs: Vec<_> = extensions.iter().map(|n| n.as_ptr()).collect();

    let features = vk::PhysicalDeviceFeatures::default();

    let create_info = vk::DeviceCreateInfo::builder()
        .queue_create_infos(std::slice::from_ref(&queue_create_info))
        .enabled_extension_names(&extension_ptrs)
        .enabled_features(&features);

    let device = unsafe { instance.create_device(physical.handle, &create_info, None) }
        .context("Failed to create logical device")?;

    let graphics_queue = unsafe { device.get_device_queue(physical.graphics_family, 0) };

    Ok((device, graphics_queue))
}

// Debug callback for validation layers
unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    _message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _p_user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() || (*p_callback_data).p_message.is_null() {
        return vk::FALSE;
    }
    let message = CStr::from_ptr((*p_callback_data).p_message);

    match message_severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => {
            log::error!("[Vulkan] {}", message.to_string_lossy());
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => {
            log::warn!("[Vulkan] {}", message.to_string_lossy());
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::INFO => {
            log::debug!("[Vulkan] {}", message.to_string_lossy());
        }
        _ => {
            log::trace!("[Vulkan] {}", message.to_string_lossy());
        }
    }

    vk::FALSE
}
