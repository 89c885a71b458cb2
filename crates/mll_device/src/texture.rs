use std::fmt;
use std::sync::Arc;

use mll_core::{ManagedObject, MllError, Result};

use crate::desc::{ResourceDimension, ResourceFormat, ResourceHeap, ResourceUsage, TextureDesc};
use crate::native::{NativeBackend, NativeKind, NativeObject};

/// A texture resource.
///
/// Only textures on [`ResourceHeap::Default`] get a native allocation at creation;
/// dynamic and readback textures are described but not yet backed.
pub struct Texture {
    backend: Arc<dyn NativeBackend>,
    native: Option<NativeObject>,
    dimension: ResourceDimension,
    width: u32,
    height: u32,
    depth_or_array_size: u32,
    mip_levels: u32,
    format: ResourceFormat,
    heap: ResourceHeap,
    usage: ResourceUsage,
}

impl Texture {
    pub(crate) fn create(backend: &Arc<dyn NativeBackend>, desc: &TextureDesc<'_>) -> Result<Self> {
        validate(desc)?;

        let native = match desc.heap {
            ResourceHeap::Default => Some(backend.create_texture(desc)?),
            ResourceHeap::Dynamic | ResourceHeap::Readback => None,
        };

        Ok(Self {
            backend: Arc::clone(backend),
            native,
            dimension: desc.dimension,
            width: desc.width,
            height: desc.height,
            depth_or_array_size: desc.depth_or_array_size(),
            mip_levels: desc.mip_levels,
            format: desc.format,
            heap: desc.heap,
            usage: desc.usage,
        })
    }

    #[must_use]
    pub fn native(&self) -> Option<NativeObject> {
        self.native
    }

    #[must_use]
    pub fn dimension(&self) -> ResourceDimension {
        self.dimension
    }

    #[must_use]
    pub fn size(&self) -> (u32, u32, u32) {
        (self.width, self.height, self.depth_or_array_size)
    }

    #[must_use]
    pub fn mip_levels(&self) -> u32 {
        self.mip_levels
    }

    #[must_use]
    pub fn format(&self) -> ResourceFormat {
        self.format
    }

    #[must_use]
    pub fn heap(&self) -> ResourceHeap {
        self.heap
    }

    #[must_use]
    pub fn usage(&self) -> ResourceUsage {
        self.usage
    }
}

fn validate(desc: &TextureDesc<'_>) -> Result<()> {
    if desc.usage.intersects(ResourceUsage::BUFFER_ONLY) {
        return Err(MllError::invalid_args(format!(
            "texture usage {:?} includes buffer-only flags",
            desc.usage
        )));
    }
    if desc.dimension == ResourceDimension::Buffer {
        return Err(MllError::invalid_args("textures cannot have buffer dimension"));
    }
    if desc.width == 0 || desc.height == 0 || desc.depth_or_array_size() == 0 {
        return Err(MllError::invalid_args(format!(
            "texture extent {}x{}x{} must be non-zero",
            desc.width,
            desc.height,
            desc.depth_or_array_size()
        )));
    }
    if desc.mip_levels == 0 || desc.sample_count == 0 {
        return Err(MllError::invalid_args(
            "mip_levels and sample_count must be at least 1",
        ));
    }
    if !desc.format.is_known() {
        return Err(MllError::invalid_args("texture format must be known"));
    }
    Ok(())
}

impl ManagedObject for Texture {
    fn object_type(&self) -> &'static str {
        "Texture"
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        if let Some(native) = self.native.take() {
            self.backend.destroy(NativeKind::Texture, native);
        }
    }
}

impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Texture")
            .field("native", &self.native)
            .field("dimension", &self.dimension)
            .field("size", &self.size())
            .field("format", &self.format)
            .field("heap", &self.heap)
            .field("usage", &self.usage)
            .finish_non_exhaustive()
    }
}
