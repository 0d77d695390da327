// Shader module loading
//
// Vulkan consumes SPIR-V: a stream of little-endian 32-bit words starting
// with the magic number. Bytes are checked and copied into aligned words
// before any Vulkan call.

use crate::renderer::error::{RendererError, Result, VkResultExt};
use crate::renderer::ShaderStage;
use ash::vk;
use std::io::Cursor;

pub const SPIRV_MAGIC: u32 = 0x0723_0203;

/// A compiled shader and the stage it was created for
pub struct ShaderModule {
    pub module: vk::ShaderModule,
    pub stage: ShaderStage,
}

/// Check SPIR-V bytes and return them as aligned words
pub fn validate_spirv(bytecode: &[u8]) -> Result<Vec<u32>> {
    if bytecode.is_empty() {
        return Err(RendererError::EmptyBytecode);
    }

    let words = ash::util::read_spv(&mut Cursor::new(bytecode))
        .map_err(|e| RendererError::InvalidBytecode(e.to_string()))?;

    match words.first() {
        Some(&SPIRV_MAGIC) => Ok(words),
        Some(&word) => Err(RendererError::InvalidBytecode(format!(
            "bad magic number {:#010x}",
            word
        ))),
        None => Err(RendererError::EmptyBytecode),
    }
}

pub fn create_shader_module(device: &ash::Device, words: &[u32]) -> Result<vk::ShaderModule> {
    let create_info = vk::ShaderModuleCreateInfo::builder().code(words);

    unsafe { device.create_shader_module(&create_info, None) }
        .context("Failed to create shader module")
}
