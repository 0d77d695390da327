// Swapchain - Window presentation
//
// Manages the chain of images we render to and present to the screen.
// Views are created in a separate step so initialization can report which of
// the two failed; destruction always goes views first, then the swapchain.

use crate::renderer::error::{RendererError, Result, VkResultExt};
use ash::extensions::khr;
use ash::vk;

/// Surface capabilities, formats and present modes for one GPU
pub struct SwapchainSupport {
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SwapchainSupport {
    pub fn query(
        surface_loader: &khr::Surface,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> Result<Self> {
        unsafe {
            Ok(Self {
                capabilities: surface_loader
                    .get_physical_device_surface_capabilities(physical_device, surface)
                    .context("Failed to query surface capabilities")?,
                formats: surface_loader
                    .get_physical_device_surface_formats(physical_device, surface)
                    .context("Failed to query surface formats")?,
                present_modes: surface_loader
                    .get_physical_device_surface_present_modes(physical_device, surface)
                    .context("Failed to query present modes")?,
            })
        }
    }
}

/// Prefer plain BGRA8 UNORM / sRGB-nonlinear, otherwise whatever comes first
pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    formats
        .iter()
        .find(|f| {
            f.format == vk::Format::B8G8R8A8_UNORM
                && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
        })
        .or_else(|| formats.first())
        .copied()
}

/// FIFO is always supported, so it is the fallback
pub fn choose_present_mode(
    available: &[vk::PresentModeKHR],
    preferred: vk::PresentModeKHR,
) -> vk::PresentModeKHR {
    if available.contains(&preferred) {
        preferred
    } else {
        vk::PresentModeKHR::FIFO
    }
}

/// The surface dictates the extent unless it reports the u32::MAX wildcard
pub fn choose_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    requested: vk::Extent2D,
) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        capabilities.current_extent
    } else {
        vk::Extent2D {
            width: requested.width.clamp(
                capabilities.min_image_extent.width,
                capabilities.max_image_extent.width,
            ),
            height: requested.height.clamp(
                capabilities.min_image_extent.height,
                capabilities.max_image_extent.height,
            ),
        }
    }
}

/// One more than the minimum, capped by the maximum (0 = unlimited)
pub fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let count = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        count.min(capabilities.max_image_count)
    } else {
        count
    }
}

pub struct Swapchain {
    pub handle: vk::SwapchainKHR,
    pub images: Vec<vk::Image>,
    pub image_views: Vec<vk::ImageView>,
    pub format: vk::Format,
    pub extent: vk::Extent2D,
}

impl Swapchain {
    /// Create the swapchain and fetch its images. `old` is retired by the
    /// driver but still has to be destroyed by the caller.
    pub fn new(
        loader: &khr::Swapchain,
        surface: vk::SurfaceKHR,
        support: &SwapchainSupport,
        preferred_present_mode: vk::PresentModeKHR,
        requested: vk::Extent2D,
        old: vk::SwapchainKHR,
    ) -> Result<Self> {
        let surface_format =
            choose_surface_format(&support.formats).ok_or(RendererError::NoSurfaceFormat)?;
        let present_mode = choose_present_mode(&support.present_modes, preferred_present_mode);
        let extent = choose_extent(&support.capabilities, requested);
        let image_count = choose_image_count(&support.capabilities);

        log::info!(
            "Creating swapchain: {}x{}, {:?}, {:?}, {} images requested",
            extent.width,
            extent.height,
            surface_format.format,
            present_mode,
            image_count
        );

        let create_info = vk::SwapchainCreateInfoKHR::builder()
            .surface(surface)
            .min_image_count(image_count)
            .image_format(surface_format.format)
            .image_color_space(surface_format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .pre_transform(support.capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true)
            .old_swapchain(old);

        let handle = unsafe { loader.create_swapchain(&create_info, None) }
            .context("Failed to create swapchain")?;

        let images = match unsafe { loader.get_swapchain_images(handle) } {
            Ok(images) => images,
            Err(e) => {
                unsafe { loader.destroy_swapchain(handle, None) };
                return Err(e).context("Failed to get swapchain images");
            }
        };

        log::debug!("Created swapchain with {} images", images.len());

        Ok(Self {
            handle,
            images,
            image_views: Vec::new(),
            format: surface_format.format,
            extent,
        })
    }

    /// One color view per swapchain image
    pub fn create_image_views(&mut self, device: &ash::Device) -> Result<()> {
        for &image in &self.images {
            let create_info = vk::ImageViewCreateInfo::builder()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(self.format)
                .components(vk::ComponentMapping {
                    r: vk::ComponentSwizzle::IDENTITY,
                    g: vk::ComponentSwizzle::IDENTITY,
                    b: vk::ComponentSwizzle::IDENTITY,
                    a: vk::ComponentSwizzle::IDENTITY,
                })
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                });

            // Views created so far stay in the list for `destroy`
            let view = unsafe { device.create_image_view(&create_info, None) }
                .context("Failed to create image view")?;
            self.image_views.push(view);
        }
        Ok(())
    }

    /// Acquire next image for rendering. `None` = swapchain out of date.
    pub fn acquire_next_image(
        &self,
        loader: &khr::Swapchain,
        semaphore: vk::Semaphore,
    ) -> Result<Option<(u32, bool)>> {
        let result = unsafe {
            loader.acquire_next_image(self.handle, u64::MAX, semaphore, vk::Fence::null())
        };

        match result {
            Ok((index, suboptimal)) => Ok(Some((index, suboptimal))),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(None),
            Err(e) => Err(e).context("Failed to acquire swapchain image"),
        }
    }

    /// Present rendered image to screen. Returns true when the swapchain
    /// should be recreated.
    pub fn present(
        &self,
        loader: &khr::Swapchain,
        queue: vk::Queue,
        image_index: u32,
        wait_semaphores: &[vk::Semaphore],
    ) -> Result<bool> {
        let swapchains = [self.handle];
        let image_indices = [image_index];

        let present_info = vk::PresentInfoKHR::builder()
            .wait_semaphores(wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        match unsafe { loader.queue_present(queue, &present_info) } {
            Ok(suboptimal) => Ok(suboptimal),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(true),
            Err(e) => Err(e).context("Failed to present"),
        }
    }

    /// Views go first; the handle may still be needed as `old_swapchain`.
    pub fn destroy_image_views(&mut self, device: &ash::Device) {
        for view in self.image_views.drain(..) {
            unsafe { device.destroy_image_view(view, None) };
        }
    }

    pub fn destroy(&mut self, device: &ash::Device, loader: &khr::Swapchain) {
        self.destroy_image_views(device);
        if self.handle != vk::SwapchainKHR::null() {
            unsafe { loader.destroy_swapchain(self.handle, None) };
            self.handle = vk::SwapchainKHR::null();
        }
        self.images.clear();
    }
}
