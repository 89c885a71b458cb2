//! Heap backend seam
//!
//! The pools in this crate never talk to a driver directly. They ask a [`HeapProvider`]
//! for fixed-capacity [`DescriptorHeap`]s and use the heap's `write` as the copy
//! primitive. A native binding implements these two traits over its own heap objects;
//! [`crate::host`] provides an in-memory implementation.

use std::fmt;

use bytemuck::{Pod, Zeroable};
use mll_core::Result;
use serde::{Deserialize, Serialize};

/// CPU-side descriptor: an opaque 64-bit handle to a staged view or sampler.
///
/// Descriptors are plain data, so a run of them can be hashed as bytes.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(transparent)]
pub struct Descriptor(pub u64);

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Descriptor({:#x})", self.0)
    }
}

/// What a heap holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeapKind {
    /// Constant buffer / shader resource / unordered access views.
    Resource,
    Sampler,
}

impl HeapKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Resource => "resource",
            Self::Sampler => "sampler",
        }
    }
}

/// One fixed-capacity, shader-visible descriptor heap.
pub trait DescriptorHeap: Send {
    fn kind(&self) -> HeapKind;

    fn capacity(&self) -> u32;

    /// Shader-visible address of slot 0.
    fn gpu_start(&self) -> u64;

    /// Byte distance between two consecutive slots.
    fn stride(&self) -> u32;

    /// Copies `descriptors` into the slots starting at `offset`.
    ///
    /// Callers guarantee `offset + descriptors.len() <= capacity`.
    fn write(&mut self, offset: u32, descriptors: &[Descriptor]);

    /// Host-readable view of the slots, when the backend keeps one.
    fn host_view(&self) -> Option<&[Descriptor]> {
        None
    }
}

/// Creates descriptor heaps on demand.
pub trait HeapProvider: Send + Sync {
    fn create_heap(&self, kind: HeapKind, capacity: u32) -> Result<Box<dyn DescriptorHeap>>;
}
