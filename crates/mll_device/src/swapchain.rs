use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use mll_core::{ManagedObject, MllError, Result};

use crate::desc::{ResourceFormat, SwapchainDesc};
use crate::native::{NativeBackend, NativeKind, NativeObject};

/// Largest sync interval a present accepts.
pub const MAX_SYNC_INTERVAL: u32 = 4;

pub struct Swapchain {
    backend: Arc<dyn NativeBackend>,
    native: NativeObject,
    width: u32,
    height: u32,
    format: ResourceFormat,
    back_buffer_count: u32,
    back_buffer_index: AtomicU32,
}

impl Swapchain {
    pub(crate) fn create(backend: &Arc<dyn NativeBackend>, desc: &SwapchainDesc<'_>) -> Result<Self> {
        if desc.width == 0 || desc.height == 0 {
            return Err(MllError::invalid_args(format!(
                "swapchain size {}x{} must be non-zero",
                desc.width, desc.height
            )));
        }
        if desc.back_buffer_count < 2 {
            return Err(MllError::invalid_args(format!(
                "swapchain needs at least 2 back buffers, got {}",
                desc.back_buffer_count
            )));
        }
        if !desc.format.is_known() || desc.format.is_depth() {
            return Err(MllError::invalid_args(format!(
                "{:?} is not a presentable format",
                desc.format
            )));
        }

        let (native, first_index) = backend.create_swapchain(desc)?;
        Ok(Self {
            backend: Arc::clone(backend),
            native,
            width: desc.width,
            height: desc.height,
            format: desc.format,
            back_buffer_count: desc.back_buffer_count,
            back_buffer_index: AtomicU32::new(first_index % desc.back_buffer_count),
        })
    }

    /// Presents the current back buffer and advances to the next one.
    pub fn present(&self, sync_interval: u32) -> Result<()> {
        if sync_interval > MAX_SYNC_INTERVAL {
            return Err(MllError::invalid_args(format!(
                "sync interval {sync_interval} exceeds {MAX_SYNC_INTERVAL}"
            )));
        }
        self.backend.present(self.native, sync_interval)?;

        let count = self.back_buffer_count;
        // fetch_update only fails when the closure returns None
        let _ = self
            .back_buffer_index
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |i| Some((i + 1) % count));
        Ok(())
    }

    #[must_use]
    pub fn back_buffer_index(&self) -> u32 {
        self.back_buffer_index.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn back_buffer_count(&self) -> u32 {
        self.back_buffer_count
    }

    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[must_use]
    pub fn format(&self) -> ResourceFormat {
        self.format
    }

    #[must_use]
    pub fn native(&self) -> NativeObject {
        self.native
    }
}

impl ManagedObject for Swapchain {
    fn object_type(&self) -> &'static str {
        "Swapchain"
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        self.backend.destroy(NativeKind::Swapchain, self.native);
    }
}

impl fmt::Debug for Swapchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Swapchain")
            .field("native", &self.native)
            .field("size", &self.size())
            .field("format", &self.format)
            .field("back_buffer_index", &self.back_buffer_index())
            .field("back_buffer_count", &self.back_buffer_count)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessBackend;
    use mll_core::ResultCode;

    fn backend() -> Arc<dyn NativeBackend> {
        Arc::new(HeadlessBackend::new())
    }

    #[test]
    fn present_cycles_back_buffers() {
        let desc = SwapchainDesc::default()
            .with_size(800, 600)
            .with_back_buffer_count(3);
        let swapchain = Swapchain::create(&backend(), &desc).unwrap();

        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(swapchain.back_buffer_index());
            swapchain.present(1).unwrap();
        }
        assert_eq!(seen, [0, 1, 2, 0]);
    }

    #[test]
    fn single_back_buffer_is_rejected() {
        let desc = SwapchainDesc::default()
            .with_size(800, 600)
            .with_back_buffer_count(1);
        let err = Swapchain::create(&backend(), &desc).unwrap_err();
        assert_eq!(err.code(), ResultCode::InvalidArgs);
    }

    #[test]
    fn unknown_format_is_rejected() {
        let desc = SwapchainDesc::default()
            .with_size(800, 600)
            .with_format(ResourceFormat::Unknown);
        assert!(Swapchain::create(&backend(), &desc).is_err());
    }

    #[test]
    fn oversized_sync_interval_leaves_index_alone() {
        let desc = SwapchainDesc::default().with_size(64, 64);
        let swapchain = Swapchain::create(&backend(), &desc).unwrap();
        assert!(swapchain.present(MAX_SYNC_INTERVAL + 1).is_err());
        assert_eq!(swapchain.back_buffer_index(), 0);
    }
}
