//! Descriptor allocation for MLL.
//!
//! Three layers, each built on the one below:
//!
//! - [`SlabAllocator`]: bump allocation over one fixed-capacity heap
//! - [`GrowablePool`]: a slab chain that grows on demand and collapses on reset
//! - [`ContentAddressedPool`]: a [`GrowablePool`] that reuses identical copies by hash
//!
//! Heaps come from a [`HeapProvider`]. [`host::HostHeapProvider`] keeps them in memory.

pub mod backend;
pub mod content;
pub mod growable;
pub mod host;
pub mod settings;
pub mod slab;

pub use backend::{Descriptor, DescriptorHeap, HeapKind, HeapProvider};
pub use content::{CacheStats, ContentAddressedPool};
pub use growable::{Allocation, GrowablePool, SlabGrowth};
pub use host::{HOST_DESCRIPTOR_STRIDE, HostHeap, HostHeapProvider};
pub use settings::{
    CollisionPolicy, DEFAULT_RESOURCE_HEAP_CAPACITY, DEFAULT_SAMPLER_HEAP_CAPACITY, PoolSettings,
};
pub use slab::{Region, SlabAllocator, SlabId};
