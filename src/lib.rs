//! # MLL
//!
//! Resource lifetimes and descriptor allocation for a thin graphics abstraction layer.
//!
//! - [`core`]: errors, object ids, FNV-1a hashing, handles and the lifecycle registry
//! - [`alloc`]: slab, growable and content-addressed descriptor pools
//! - [`device`]: devices, command lists, textures and swapchains over a native backend
//!
//! The most used types are re-exported at the crate root.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use mll::{Device, DeviceDesc, HeadlessBackend, TextureDesc, ResourceFormat};
//!
//! let device = Device::new(&DeviceDesc::default(), Arc::new(HeadlessBackend::new()))?;
//! let texture = device.create_texture(
//!     &TextureDesc::default()
//!         .with_size(512, 512)
//!         .with_format(ResourceFormat::R8G8B8A8Unorm),
//! )?;
//!
//! drop(texture);                       // retired, still alive
//! for _ in 0..3 {
//!     device.process_death_list(false); // destroyed on the third cycle
//! }
//! ```

pub use mll_alloc as alloc;
pub use mll_core as core;
pub use mll_device as device;

pub use mll_core::{
    Handle, HandleDirectory, LifecycleRegistry, ManagedObject, MllError, ObjectId,
    PENDING_KILL_CYCLES, PendingKillInfo, RegistryChild, Result, ResultCode, WeakHandle,
    fnv1a32, fnv1a64,
};

pub use mll_alloc::{
    Allocation, CacheStats, CollisionPolicy, ContentAddressedPool, Descriptor, DescriptorHeap,
    GrowablePool, HeapKind, HeapProvider, HostHeapProvider, PoolSettings, Region, SlabAllocator,
    SlabGrowth, SlabId,
};

pub use mll_device::{
    CommandList, CommandListDesc, CommandQueueType, DescriptorStackStats, Device, DeviceDesc,
    DeviceSettings, HeadlessBackend, NativeBackend, NativeKind, NativeObject, ResourceDimension,
    ResourceFormat, ResourceHeap, ResourceState, ResourceUsage, Swapchain, SwapchainDesc, Texture,
    TextureDesc,
};
