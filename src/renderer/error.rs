//! Renderer error kinds.

use ash::vk;
use std::fmt;
use thiserror::Error;

/// Steps of the backend initialization sequence, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStep {
    Instance,
    Surface,
    PhysicalDevice,
    LogicalDevice,
    Swapchain,
    ImageViews,
    RenderPass,
    Framebuffers,
    CommandPool,
    CommandBuffers,
    SyncObjects,
}

impl fmt::Display for InitStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Instance => "create_instance",
            Self::Surface => "create_surface",
            Self::PhysicalDevice => "pick_physical_device",
            Self::LogicalDevice => "create_logical_device",
            Self::Swapchain => "create_swapchain",
            Self::ImageViews => "create_image_views",
            Self::RenderPass => "create_render_pass",
            Self::Framebuffers => "create_framebuffers",
            Self::CommandPool => "create_command_pool",
            Self::CommandBuffers => "create_command_buffers",
            Self::SyncObjects => "create_sync_objects",
        };
        f.write_str(name)
    }
}

/// Which resource table a handle belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Shader,
    Pipeline,
    Buffer,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Shader => "shader",
            Self::Pipeline => "pipeline",
            Self::Buffer => "vertex buffer",
        })
    }
}

#[derive(Debug, Error)]
pub enum RendererError {
    /// Vulkan API result + context
    #[error("Vulkan error: {result:?} (context: {context})")]
    Vulkan {
        context: &'static str,
        result: vk::Result,
    },

    #[error("Renderer initialization failed at {step}: {source}")]
    Init {
        step: InitStep,
        #[source]
        source: Box<RendererError>,
    },

    #[error("Failed to load the Vulkan library: {0}. Is Vulkan installed?")]
    LoaderUnavailable(String),

    #[error("No Vulkan-capable GPU found")]
    NoPhysicalDevice,

    #[error("Physical device has no graphics queue family")]
    NoGraphicsQueue,

    #[error("Graphics queue family cannot present to the window surface")]
    NoSuitableDevice,

    #[error("Failed to find a suitable memory type for {0:?}")]
    NoSuitableMemoryType(vk::MemoryPropertyFlags),

    #[error("Surface reports no formats")]
    NoSurfaceFormat,

    #[error("Surface format changed from {old:?} to {new:?}; the render pass is stale")]
    SurfaceFormatChanged { old: vk::Format, new: vk::Format },

    #[error("Window has no native handle: {0}")]
    WindowHandle(String),

    #[error("Renderer is not initialized")]
    NotInitialized,

    #[error("Renderer is already initialized")]
    AlreadyInitialized,

    #[error("{operation} called during {found:?} (expected {expected})")]
    FrameProtocol {
        operation: &'static str,
        expected: &'static str,
        found: crate::renderer::frame::FramePhase,
    },

    #[error("Shader bytecode is empty")]
    EmptyBytecode,

    #[error("Invalid shader bytecode: {0}")]
    InvalidBytecode(String),

    #[error("Expected a {expected:?} shader, got a {found:?} shader")]
    ShaderStageMismatch {
        expected: crate::renderer::ShaderStage,
        found: crate::renderer::ShaderStage,
    },

    #[error("Vertex buffer needs at least one vertex")]
    EmptyVertexData,

    #[error("Draw of {requested} vertices exceeds buffer of {available}")]
    VertexCountOutOfRange { requested: u32, available: u32 },

    #[error("Unknown or released {0} handle")]
    UnknownHandle(ResourceKind),

    #[error("{0} handle was issued by another renderer")]
    ForeignHandle(ResourceKind),
}

impl RendererError {
    /// Wrap a failure of one initialization step
    pub fn at(self, step: InitStep) -> Self {
        Self::Init {
            step,
            source: Box::new(self),
        }
    }
}

pub type Result<T> = std::result::Result<T, RendererError>;

/// Attach context to raw ash results
pub trait VkResultExt<T> {
    fn context(self, context: &'static str) -> Result<T>;
}

impl<T> VkResultExt<T> for std::result::Result<T, vk::Result> {
    fn context(self, context: &'static str) -> Result<T> {
        self.map_err(|result| RendererError::Vulkan { context, result })
    }
}
