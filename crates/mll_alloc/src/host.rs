//! In-memory heap backend
//!
//! Heaps are plain `Vec<Descriptor>`s with synthetic, non-overlapping GPU address
//! ranges. Used by the headless device and by tests.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use mll_core::{MllError, Result};

use crate::backend::{Descriptor, DescriptorHeap, HeapKind, HeapProvider};

/// Slot size reported by host heaps.
pub const HOST_DESCRIPTOR_STRIDE: u32 = 32;

const HOST_ADDRESS_BASE: u64 = 0x1_0000_0000;

pub struct HostHeap {
    kind: HeapKind,
    gpu_start: u64,
    slots: Vec<Descriptor>,
}

impl DescriptorHeap for HostHeap {
    fn kind(&self) -> HeapKind {
        self.kind
    }

    fn capacity(&self) -> u32 {
        self.slots.len() as u32
    }

    fn gpu_start(&self) -> u64 {
        self.gpu_start
    }

    fn stride(&self) -> u32 {
        HOST_DESCRIPTOR_STRIDE
    }

    fn write(&mut self, offset: u32, descriptors: &[Descriptor]) {
        let start = offset as usize;
        self.slots[start..start + descriptors.len()].copy_from_slice(descriptors);
    }

    fn host_view(&self) -> Option<&[Descriptor]> {
        Some(&self.slots)
    }
}

/// [`HeapProvider`] backed by host memory.
#[derive(Debug, Default)]
pub struct HostHeapProvider {
    /// Largest heap this provider agrees to create; `None` means unlimited.
    max_capacity: Option<u32>,
    next_address: AtomicU64,
    created: AtomicU32,
}

impl HostHeapProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider that fails with `OutOfMemory` for heaps larger than `max_capacity`.
    #[must_use]
    pub fn with_max_capacity(max_capacity: u32) -> Self {
        Self {
            max_capacity: Some(max_capacity),
            ..Self::default()
        }
    }

    /// Number of heaps created so far.
    #[must_use]
    pub fn heaps_created(&self) -> u32 {
        self.created.load(Ordering::Relaxed)
    }
}

impl HeapProvider for HostHeapProvider {
    fn create_heap(&self, kind: HeapKind, capacity: u32) -> Result<Box<dyn DescriptorHeap>> {
        if capacity == 0 {
            return Err(MllError::invalid_args("descriptor heap capacity must be non-zero"));
        }
        if self.max_capacity.is_some_and(|max| capacity > max) {
            return Err(MllError::out_of_memory(
                u64::from(capacity),
                format!("host {} heap", kind.label()),
            ));
        }

        let span = u64::from(capacity) * u64::from(HOST_DESCRIPTOR_STRIDE);
        let gpu_start = HOST_ADDRESS_BASE + self.next_address.fetch_add(span, Ordering::Relaxed);
        self.created.fetch_add(1, Ordering::Relaxed);

        Ok(Box::new(HostHeap {
            kind,
            gpu_start,
            slots: vec![Descriptor::default(); capacity as usize],
        }))
    }
}
