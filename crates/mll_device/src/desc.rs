//! Object descriptions and the enums they are built from.
//!
//! Descriptions are plain `Copy` values with chained `with_*` setters:
//!
//! ```rust,ignore
//! let desc = TextureDesc::default()
//!     .with_label("scene color")
//!     .with_size(1280, 720)
//!     .with_format(ResourceFormat::R16G16B16A16Float)
//!     .with_usage(ResourceUsage::RENDER_TARGET | ResourceUsage::SHADER_RESOURCE);
//! ```

use bitflags::bitflags;

use crate::settings::DeviceSettings;

/// Queue a command list records for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CommandQueueType {
    #[default]
    Graphics,
    Compute,
    /// Copy lists bind no descriptor heaps and own no descriptor pools.
    Copy,
}

impl CommandQueueType {
    #[must_use]
    pub fn uses_descriptor_heaps(self) -> bool {
        !matches!(self, Self::Copy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResourceFormat {
    #[default]
    Unknown,
    R32G32B32A32Float,
    R32G32B32A32Uint,
    R32G32B32A32Sint,
    R32G32B32Float,
    R32G32B32Uint,
    R32G32B32Sint,
    R32G32Float,
    R32G32Uint,
    R32G32Sint,
    R32Float,
    R32Uint,
    R32Sint,
    R16G16B16A16Float,
    R16G16B16A16Unorm,
    R16G16B16A16Uint,
    R16G16B16A16Snorm,
    R16G16B16A16Sint,
    R16G16Float,
    R16G16Unorm,
    R16G16Uint,
    R16G16Snorm,
    R16G16Sint,
    R16Float,
    R16Unorm,
    R16Uint,
    R16Snorm,
    R16Sint,
    R8G8B8A8Unorm,
    R8G8B8A8UnormSrgb,
    R8G8B8A8Uint,
    R8G8B8A8Snorm,
    R8G8B8A8Sint,
    R8G8Unorm,
    R8G8Uint,
    R8G8Snorm,
    R8G8Sint,
    R8Unorm,
    R8Uint,
    R8Snorm,
    R8Sint,
    B8G8R8A8Unorm,
    B8G8R8A8UnormSrgb,
    B8G8R8X8Unorm,
    B8G8R8X8UnormSrgb,
    R10G10B10A2Unorm,
    R10G10B10A2Uint,
    R11G11B10Float,
    D32Float,
    D24UnormS8Uint,
    D16Unorm,
    Bc1Unorm,
    Bc1UnormSrgb,
    Bc2Unorm,
    Bc2UnormSrgb,
    Bc3Unorm,
    Bc3UnormSrgb,
    Bc4Unorm,
    Bc4Snorm,
    Bc5Unorm,
    Bc5Snorm,
    Bc6hUfloat,
    Bc6hSfloat,
    Bc7Unorm,
    Bc7UnormSrgb,
}

impl ResourceFormat {
    #[inline]
    #[must_use]
    pub fn is_known(self) -> bool {
        self != Self::Unknown
    }

    #[must_use]
    pub fn is_depth(self) -> bool {
        matches!(self, Self::D32Float | Self::D24UnormS8Uint | Self::D16Unorm)
    }
}

/// Memory a resource lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResourceHeap {
    /// Device-local. The only heap a texture gets a native allocation on at creation.
    #[default]
    Default,
    Dynamic,
    Readback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResourceDimension {
    Buffer,
    Texture1D,
    #[default]
    Texture2D,
    Texture3D,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResourceState {
    #[default]
    Unknown,
    ConstantBuffer,
    VertexBuffer,
    IndexBuffer,
    ShaderResource,
    RenderTarget,
    DepthWrite,
    DepthRead,
    UnorderedAccess,
    IndirectArg,
    CopySrc,
    CopyDst,
    Present,
    AccelerationStructure,
    ShadingRate,
}

bitflags! {
    /// How a resource may be used.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ResourceUsage: u32 {
        const CONSTANT_BUFFER  = 1 << 0;
        const VERTEX_BUFFER    = 1 << 1;
        const INDEX_BUFFER     = 1 << 2;
        const SHADER_RESOURCE  = 1 << 3;
        const RENDER_TARGET    = 1 << 4;
        const DEPTH_STENCIL    = 1 << 5;
        const UNORDERED_ACCESS = 1 << 6;
        const INDIRECT_ARG     = 1 << 7;

        /// Usages that only make sense on buffers.
        const BUFFER_ONLY = Self::CONSTANT_BUFFER.bits()
            | Self::VERTEX_BUFFER.bits()
            | Self::INDEX_BUFFER.bits()
            | Self::INDIRECT_ARG.bits();
    }
}

// ---------------------------------------------------------------------------
// Descriptions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceDesc {
    pub settings: DeviceSettings,
}

impl DeviceDesc {
    #[must_use]
    pub fn with_debug_layer(mut self, enable: bool) -> Self {
        self.settings.enable_debug_layer = enable;
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: DeviceSettings) -> Self {
        self.settings = settings;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommandListDesc<'a> {
    pub label: Option<&'a str>,
    pub queue_type: CommandQueueType,
}

impl<'a> CommandListDesc<'a> {
    #[must_use]
    pub fn with_label(mut self, label: &'a str) -> Self {
        self.label = Some(label);
        self
    }

    #[must_use]
    pub fn with_queue_type(mut self, queue_type: CommandQueueType) -> Self {
        self.queue_type = queue_type;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDesc<'a> {
    pub label: Option<&'a str>,
    pub dimension: ResourceDimension,
    pub width: u32,
    pub height: u32,
    /// Only read for [`ResourceDimension::Texture3D`].
    pub depth: u32,
    pub array_size: u32,
    pub mip_levels: u32,
    pub format: ResourceFormat,
    pub sample_count: u32,
    pub heap: ResourceHeap,
    pub usage: ResourceUsage,
    pub initial_state: ResourceState,
}

impl Default for TextureDesc<'_> {
    fn default() -> Self {
        Self {
            label: None,
            dimension: ResourceDimension::Texture2D,
            width: 0,
            height: 0,
            depth: 1,
            array_size: 1,
            mip_levels: 1,
            format: ResourceFormat::Unknown,
            sample_count: 1,
            heap: ResourceHeap::Default,
            usage: ResourceUsage::empty(),
            initial_state: ResourceState::Unknown,
        }
    }
}

impl<'a> TextureDesc<'a> {
    #[must_use]
    pub fn with_label(mut self, label: &'a str) -> Self {
        self.label = Some(label);
        self
    }

    #[must_use]
    pub fn with_dimension(mut self, dimension: ResourceDimension) -> Self {
        self.dimension = dimension;
        self
    }

    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    #[must_use]
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    #[must_use]
    pub fn with_array_size(mut self, array_size: u32) -> Self {
        self.array_size = array_size;
        self
    }

    #[must_use]
    pub fn with_mip_levels(mut self, mip_levels: u32) -> Self {
        self.mip_levels = mip_levels;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: ResourceFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_sample_count(mut self, sample_count: u32) -> Self {
        self.sample_count = sample_count;
        self
    }

    #[must_use]
    pub fn with_heap(mut self, heap: ResourceHeap) -> Self {
        self.heap = heap;
        self
    }

    #[must_use]
    pub fn with_usage(mut self, usage: ResourceUsage) -> Self {
        self.usage = usage;
        self
    }

    #[must_use]
    pub fn with_initial_state(mut self, initial_state: ResourceState) -> Self {
        self.initial_state = initial_state;
        self
    }

    /// Depth for 3D textures, array size otherwise.
    #[must_use]
    pub fn depth_or_array_size(&self) -> u32 {
        match self.dimension {
            ResourceDimension::Texture3D => self.depth,
            _ => self.array_size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapchainDesc<'a> {
    pub label: Option<&'a str>,
    pub width: u32,
    pub height: u32,
    pub format: ResourceFormat,
    pub back_buffer_count: u32,
    /// Opaque native window token; `0` when presenting offscreen.
    pub window_handle: u64,
    pub fullscreen: bool,
}

impl Default for SwapchainDesc<'_> {
    fn default() -> Self {
        Self {
            label: None,
            width: 0,
            height: 0,
            format: ResourceFormat::R8G8B8A8Unorm,
            back_buffer_count: 2,
            window_handle: 0,
            fullscreen: false,
        }
    }
}

impl<'a> SwapchainDesc<'a> {
    #[must_use]
    pub fn with_label(mut self, label: &'a str) -> Self {
        self.label = Some(label);
        self
    }

    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: ResourceFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_back_buffer_count(mut self, back_buffer_count: u32) -> Self {
        self.back_buffer_count = back_buffer_count;
        self
    }

    #[must_use]
    pub fn with_window_handle(mut self, window_handle: u64) -> Self {
        self.window_handle = window_handle;
        self
    }

    #[must_use]
    pub fn with_fullscreen(mut self, fullscreen: bool) -> Self {
        self.fullscreen = fullscreen;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_only_covers_the_four_buffer_usages() {
        let usage = ResourceUsage::BUFFER_ONLY;
        assert!(usage.contains(ResourceUsage::CONSTANT_BUFFER | ResourceUsage::INDIRECT_ARG));
        assert!(!usage.intersects(ResourceUsage::RENDER_TARGET | ResourceUsage::SHADER_RESOURCE));
    }

    #[test]
    fn depth_or_array_size_follows_dimension() {
        let desc = TextureDesc::default().with_depth(8).with_array_size(6);
        assert_eq!(desc.depth_or_array_size(), 6);
        assert_eq!(
            desc.with_dimension(ResourceDimension::Texture3D)
                .depth_or_array_size(),
            8
        );
    }

    #[test]
    fn copy_queue_has_no_descriptor_heaps() {
        assert!(CommandQueueType::Graphics.uses_descriptor_heaps());
        assert!(CommandQueueType::Compute.uses_descriptor_heaps());
        assert!(!CommandQueueType::Copy.uses_descriptor_heaps());
    }
}
