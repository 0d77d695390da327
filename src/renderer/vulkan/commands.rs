// Command pool, command buffers and frame recording
//
// Each swapchain image gets its own primary command buffer. They are reset
// individually at the start of a frame, so the pool allows per-buffer reset.

use crate::renderer::error::{Result, VkResultExt};
use ash::vk;

/// What a frame draws: at most one non-indexed draw
#[derive(Debug, Clone, Copy)]
pub struct DrawCall {
    pub pipeline: vk::Pipeline,
    pub vertex_buffer: vk::Buffer,
    pub vertex_count: u32,
}

/// Clear color: opaque black
const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

pub fn create_command_pool(device: &ash::Device, queue_family: u32) -> Result<vk::CommandPool> {
    let pool_info = vk::CommandPoolCreateInfo::builder()
        .queue_family_index(queue_family)
        .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

    unsafe { device.create_command_pool(&pool_info, None) }
        .context("Failed to create command pool")
}

pub fn allocate_command_buffers(
    device: &ash::Device,
    pool: vk::CommandPool,
    count: u32,
) -> Result<Vec<vk::CommandBuffer>> {
    let alloc_info = vk::CommandBufferAllocateInfo::builder()
        .command_pool(pool)
        .level(vk::CommandBufferLevel::PRIMARY)
        .command_buffer_count(count);

    unsafe { device.allocate_command_buffers(&alloc_info) }
        .context("Failed to allocate command buffers")
}

/// Record `record` into a throwaway command buffer, submit it and wait for
/// the queue to drain.
pub fn one_time_submit<F>(
    device: &ash::Device,
    pool: vk::CommandPool,
    queue: vk::Queue,
    record: F,
) -> Result<()>
where
    F: FnOnce(vk::CommandBuffer),
{
    let cmd = allocate_command_buffers(device, pool, 1)?[0];

    let submit = || -> Result<()> {
        let begin_info = vk::CommandBufferBeginInfo::builder()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

        unsafe {
            device
                .begin_command_buffer(cmd, &begin_info)
                .context("Failed to begin one-time command buffer")?;
            record(cmd);
            device
                .end_command_buffer(cmd)
                .context("Failed to end one-time command buffer")?;

            let command_buffers = [cmd];
            let submit_info = vk::SubmitInfo::builder().command_buffers(&command_buffers).build();
            device
                .queue_submit(queue, &[submit_info], vk::Fence::null())
                .context("Failed to submit one-time command buffer")?;
            device
                .queue_wait_idle(queue)
                .context("Failed to wait for one-time command buffer")
        }
    };

    let result = submit();
    unsafe { device.free_command_buffers(pool, &[cmd]) };
    result
}

/// Record the frame's render pass. With no draw the pass only clears.
pub fn record_frame(
    device: &ash::Device,
    cmd: vk::CommandBuffer,
    render_pass: vk::RenderPass,
    framebuffer: vk::Framebuffer,
    extent: vk::Extent2D,
    draw: Option<DrawCall>,
) -> Result<()> {
    let begin_info = vk::CommandBufferBeginInfo::builder()
        .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

    let clear_values = [vk::ClearValue {
        color: vk::ClearColorValue {
            float32: CLEAR_COLOR,
        },
    }];

    let render_area = vk::Rect2D {
        offset: vk::Offset2D { x: 0, y: 0 },
        extent,
    };

    let render_pass_info = vk::RenderPassBeginInfo::builder()
        .render_pass(render_pass)
        .framebuffer(framebuffer)
        .render_area(render_area)
        .clear_values(&clear_values);

    unsafe {
        device
            .begin_command_buffer(cmd, &begin_info)
            .context("Failed to begin command buffer")?;

        device.cmd_begin_render_pass(cmd, &render_pass_info, vk::SubpassContents::INLINE);

        if let Some(draw) = draw {
            device.cmd_bind_pipeline(cmd, vk::PipelineBindPoint::GRAPHICS, draw.pipeline);

            let viewport = vk::Viewport {
                x: 0.0,
                y: 0.0,
                width: extent.width as f32,
                height: extent.height as f32,
                min_depth: 0.0,
                max_depth: 1.0,
            };
            device.cmd_set_viewport(cmd, 0, &[viewport]);
            device.cmd_set_scissor(cmd, 0, &[render_area]);

            device.cmd_bind_vertex_buffers(cmd, 0, &[draw.vertex_buffer], &[0]);
            device.cmd_draw(cmd, draw.vertex_count, 1, 0, 0);
        }

        device.cmd_end_render_pass(cmd);

        device
            .end_command_buffer(cmd)
            .context("Failed to end command buffer")
    }
}
