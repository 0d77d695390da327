// Synchronization primitives
//
// Fences, semaphores for GPU-CPU and GPU-GPU sync. One set, since only one
// frame is ever in flight.

use crate::renderer::error::{Result, VkResultExt};
use ash::vk;

/// Frame synchronization - one per frame in flight
pub struct FrameSync {
    pub image_available: vk::Semaphore,
    pub render_finished: vk::Semaphore,
    pub in_flight_fence: vk::Fence,
}

impl FrameSync {
    pub fn new(device: &ash::Device) -> Result<Self> {
        let semaphore_info = vk::SemaphoreCreateInfo::builder();
        // Start signaled so the first begin_frame does not block forever
        let fence_info = vk::FenceCreateInfo::builder().flags(vk::FenceCreateFlags::SIGNALED);

        let mut sync = Self {
            image_available: vk::Semaphore::null(),
            render_finished: vk::Semaphore::null(),
            in_flight_fence: vk::Fence::null(),
        };

        let created = (|| -> Result<()> {
            unsafe {
                sync.image_available = device
                    .create_semaphore(&semaphore_info, None)
                    .context("Failed to create image-available semaphore")?;
                sync.render_finished = device
                    .create_semaphore(&semaphore_info, None)
                    .context("Failed to create render-finished semaphore")?;
                sync.in_flight_fence = device
                    .create_fence(&fence_info, None)
                    .context("Failed to create in-flight fence")?;
            }
            Ok(())
        })();

        match created {
            Ok(()) => Ok(sync),
            Err(e) => {
                sync.destroy(device);
                Err(e)
            }
        }
    }

    /// Null handles are skipped
    pub fn destroy(&self, device: &ash::Device) {
        unsafe {
            if self.image_available != vk::Semaphore::null() {
                device.destroy_semaphore(self.image_available, None);
            }
            if self.render_finished != vk::Semaphore::null() {
                device.destroy_semaphore(self.render_finished, None);
            }
            if self.in_flight_fence != vk::Fence::null() {
                device.destroy_fence(self.in_flight_fence, None);
            }
        }
    }
}
