//! Native backend seam
//!
//! Everything below the object model: creating and destroying the driver objects that
//! back command lists, textures and swapchains, handing out descriptor heaps, binding
//! heaps and presenting. A [`Device`](crate::Device) owns one `Arc<dyn NativeBackend>`
//! and every object it creates keeps a clone, so native destruction can run whenever
//! the registry finally drops the object.

use std::fmt;
use std::sync::Arc;

use mll_alloc::{DescriptorHeap, HeapProvider};
use mll_core::Result;

use crate::desc::{CommandListDesc, SwapchainDesc, TextureDesc};

/// Opaque token for a driver object.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NativeObject(pub u64);

impl fmt::Debug for NativeObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeObject({:#x})", self.0)
    }
}

/// Which kind of driver object a token refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeKind {
    CommandList,
    Texture,
    Swapchain,
}

pub trait NativeBackend: Send + Sync {
    /// Short backend name for diagnostics.
    fn name(&self) -> &str;

    fn supports_raytracing(&self) -> bool;

    /// Source of the shader-visible descriptor heaps used by command lists.
    fn heap_provider(&self) -> Arc<dyn HeapProvider>;

    /// Errors are returned to the caller unchanged.
    fn create_command_list(&self, desc: &CommandListDesc<'_>) -> Result<NativeObject>;

    /// Called only for validated descriptions on the default heap.
    fn create_texture(&self, desc: &TextureDesc<'_>) -> Result<NativeObject>;

    /// Returns the swapchain and its initial back-buffer index.
    fn create_swapchain(&self, desc: &SwapchainDesc<'_>) -> Result<(NativeObject, u32)>;

    /// Makes `heaps` the descriptor heaps visible to subsequent commands of `list`.
    fn bind_descriptor_heaps(&self, list: NativeObject, heaps: &[&dyn DescriptorHeap]);

    fn present(&self, swapchain: NativeObject, sync_interval: u32) -> Result<()>;

    /// Releases a driver object. Called exactly once per created object.
    fn destroy(&self, kind: NativeKind, object: NativeObject);
}
