//! Slab allocator
//!
//! One fixed-capacity descriptor heap carved by a bump pointer.
//!
//! ```text
//! Uninitialized ──initialize(capacity)──▶ Ready ──allocate(n)…──▶ Ready
//!                                           ▲                       │
//!                                           └──────── reset() ──────┘
//! ```
//!
//! The uninitialized state has no value: a `SlabAllocator` only exists once its
//! backing heap has been created.

use std::fmt;
use std::sync::Arc;

use mll_core::{MllError, Result};

use crate::backend::{Descriptor, DescriptorHeap, HeapKind, HeapProvider};

/// Identity of a slab within the pool that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlabId(pub(crate) u32);

impl SlabId {
    /// For slabs used on their own, outside a pool.
    #[inline]
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    #[must_use]
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// A run of slots handed out by a slab.
///
/// Valid until the owning pool is reset or dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    pub slab: SlabId,
    pub offset: u32,
    pub count: u32,
    /// Shader-visible address of the first slot.
    pub gpu_address: u64,
}

impl Region {
    /// One past the last slot.
    #[inline]
    #[must_use]
    pub fn end(&self) -> u32 {
        self.offset + self.count
    }

    /// Whether two regions share at least one slot.
    #[must_use]
    pub fn overlaps(&self, other: &Region) -> bool {
        self.slab == other.slab && self.offset < other.end() && other.offset < self.end()
    }
}

/// Bump allocator over one descriptor heap.
pub struct SlabAllocator {
    id: SlabId,
    heap: Box<dyn DescriptorHeap>,
    capacity: u32,
    position: u32,
}

impl SlabAllocator {
    /// Creates the backing heap once and returns a ready slab.
    pub fn initialize(
        provider: &dyn HeapProvider,
        kind: HeapKind,
        id: SlabId,
        capacity: u32,
    ) -> Result<Self> {
        if capacity == 0 {
            return Err(MllError::invalid_args("slab capacity must be non-zero"));
        }
        let heap = provider.create_heap(kind, capacity)?;
        Ok(Self {
            id,
            heap,
            capacity,
            position: 0,
        })
    }

    /// Carves `count` slots. On failure nothing changes.
    pub fn allocate(&mut self, count: u32) -> Result<Region> {
        let end = self
            .position
            .checked_add(count)
            .filter(|&end| end <= self.capacity)
            .ok_or_else(|| {
                MllError::out_of_memory(
                    u64::from(count),
                    format!(
                        "{} slab {} at {}/{}",
                        self.heap.kind().label(),
                        self.id.0,
                        self.position,
                        self.capacity
                    ),
                )
            })?;

        let offset = self.position;
        self.position = end;
        Ok(Region {
            slab: self.id,
            offset,
            count,
            gpu_address: self.heap.gpu_start() + u64::from(offset) * u64::from(self.heap.stride()),
        })
    }

    /// Copies descriptors into a region previously returned by this slab.
    pub(crate) fn write(&mut self, region: &Region, source: &[Descriptor]) {
        debug_assert_eq!(region.slab, self.id);
        debug_assert!(region.end() <= self.position);
        self.heap.write(region.offset, source);
    }

    /// Rewinds to the start without releasing the heap.
    #[inline]
    pub fn reset(&mut self) {
        self.position = 0;
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> SlabId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    #[inline]
    #[must_use]
    pub fn position(&self) -> u32 {
        self.position
    }

    #[inline]
    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.capacity - self.position
    }

    #[must_use]
    pub fn heap(&self) -> &dyn DescriptorHeap {
        self.heap.as_ref()
    }
}

/// Creates slabs of one heap kind with pool-unique ids.
pub(crate) struct SlabFactory {
    provider: Arc<dyn HeapProvider>,
    kind: HeapKind,
    next_id: u32,
}

impl SlabFactory {
    pub(crate) fn new(provider: Arc<dyn HeapProvider>, kind: HeapKind) -> Self {
        Self {
            provider,
            kind,
            next_id: 0,
        }
    }

    pub(crate) fn kind(&self) -> HeapKind {
        self.kind
    }

    pub(crate) fn create(&mut self, capacity: u32) -> Result<SlabAllocator> {
        let id = SlabId(self.next_id);
        let slab = SlabAllocator::initialize(self.provider.as_ref(), self.kind, id, capacity)?;
        self.next_id += 1;
        log::debug!(
            "created {} slab {} with {capacity} slots",
            self.kind.label(),
            id.0
        );
        Ok(slab)
    }
}

impl fmt::Debug for SlabAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlabAllocator")
            .field("id", &self.id)
            .field("kind", &self.heap.kind())
            .field("capacity", &self.capacity)
            .field("position", &self.position)
            .finish()
    }
}
