//! Growable descriptor pool
//!
//! A chain of [`SlabAllocator`]s with one *current* slab. Allocations bump the current
//! slab; when it runs out a new slab is appended and becomes current. At the frame
//! boundary [`GrowablePool::reset`] folds an overgrown chain into a single slab big
//! enough for last frame's peak, so steady-state frames never grow.
//!
//! ```text
//!  frame N:   [slab 0: 2048 ████████] → [slab 1: 2048 ███░░] → (current)
//!  reset():   [slab 2: 4096 ░░░░░░░░░░░░░░░░] (current, dirty)
//! ```
//!
//! # Growth
//!
//! [`SlabGrowth::Accumulate`] (the default) sizes new slabs after the current one and
//! carries the peak across frames as described above. [`SlabGrowth::Nominal`] appends
//! slabs of the initial capacity and starts each frame over with one such slab.
//!
//! # Dirty flag
//!
//! Whenever the identity of the current slab changes (growth, or a reset) the pool is
//! marked dirty. A consumer that binds the current heap (a command recorder) re-binds
//! and then calls [`GrowablePool::clear_dirty`]. The pool never clears the flag itself.
//!
//! # Thread Safety
//!
//! Single owner. All mutation goes through `&mut self`.

use std::sync::Arc;

use smallvec::SmallVec;

use mll_core::{MllError, Result};

use crate::backend::{Descriptor, DescriptorHeap, HeapKind, HeapProvider};
use crate::slab::{Region, SlabAllocator, SlabFactory, SlabId};

/// Result of an allocation from a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    pub region: Region,
    /// Dirty flag of the pool right after the allocation.
    pub dirty: bool,
}

/// How a [`GrowablePool`] sizes new slabs and what [`GrowablePool::reset`] keeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SlabGrowth {
    /// New slabs match the current one; reset folds the chain into one slab.
    #[default]
    Accumulate,
    /// New slabs have the initial capacity; reset drops back to one such slab.
    Nominal,
}

/// Bump pool that grows by appending slabs.
pub struct GrowablePool {
    factory: SlabFactory,
    growth: SlabGrowth,
    nominal_capacity: u32,
    slabs: SmallVec<[SlabAllocator; 4]>,
    current: usize,
    dirty: bool,
}

impl GrowablePool {
    /// Creates a pool with one slab of `initial_capacity` slots.
    ///
    /// The pool starts dirty: nothing has bound its heap yet.
    pub fn new(
        provider: Arc<dyn HeapProvider>,
        kind: HeapKind,
        initial_capacity: u32,
    ) -> Result<Self> {
        Self::with_growth(provider, kind, initial_capacity, SlabGrowth::Accumulate)
    }

    pub fn with_growth(
        provider: Arc<dyn HeapProvider>,
        kind: HeapKind,
        initial_capacity: u32,
        growth: SlabGrowth,
    ) -> Result<Self> {
        let mut factory = SlabFactory::new(provider, kind);
        let first = factory.create(initial_capacity)?;
        let mut slabs = SmallVec::new();
        slabs.push(first);
        Ok(Self {
            factory,
            growth,
            nominal_capacity: initial_capacity,
            slabs,
            current: 0,
            dirty: true,
        })
    }

    /// Carves `count` slots, appending a slab if the current one is exhausted.
    ///
    /// A new slab has `max(current capacity, count)` slots under
    /// [`SlabGrowth::Accumulate`] and `max(initial capacity, count)` under
    /// [`SlabGrowth::Nominal`], so an oversized request still succeeds.
    pub fn allocate(&mut self, count: u32) -> Result<Region> {
        if let Ok(region) = self.slabs[self.current].allocate(count) {
            return Ok(region);
        }

        let base = match self.growth {
            SlabGrowth::Accumulate => self.slabs[self.current].capacity(),
            SlabGrowth::Nominal => self.nominal_capacity,
        };
        let capacity = base.max(count);
        let slab = self.factory.create(capacity)?;
        log::debug!(
            "{} pool grew to {} slabs (request of {count})",
            self.factory.kind().label(),
            self.slabs.len() + 1
        );
        self.slabs.push(slab);
        self.current = self.slabs.len() - 1;
        self.dirty = true;

        self.slabs[self.current].allocate(count)
    }

    /// Allocates `source.len()` slots and copies `source` into them.
    pub fn allocate_and_copy(&mut self, source: &[Descriptor]) -> Result<Allocation> {
        if source.is_empty() {
            return Err(MllError::invalid_args("no descriptors to copy"));
        }
        let count = u32::try_from(source.len())
            .map_err(|_| MllError::out_of_memory(source.len() as u64, "descriptor copy"))?;

        let region = self.allocate(count)?;
        self.slabs[self.current].write(&region, source);
        Ok(Allocation {
            region,
            dirty: self.dirty,
        })
    }

    /// Returns all capacity to the start of a single slab.
    ///
    /// A chain is replaced by one slab: the sum of the chain under
    /// [`SlabGrowth::Accumulate`], the initial capacity under [`SlabGrowth::Nominal`].
    /// If creating that slab fails the pool is left untouched.
    pub fn reset(&mut self) -> Result<()> {
        if self.slabs.len() > 1 {
            let capacity = match self.growth {
                SlabGrowth::Accumulate => self
                    .slabs
                    .iter()
                    .map(SlabAllocator::capacity)
                    .fold(0, u32::saturating_add),
                SlabGrowth::Nominal => self.nominal_capacity,
            };
            let merged = self.factory.create(capacity)?;
            log::info!(
                "{} pool replacing {} slabs with one of {capacity} slots",
                self.factory.kind().label(),
                self.slabs.len()
            );
            self.slabs.clear();
            self.slabs.push(merged);
        }

        self.current = 0;
        self.slabs[0].reset();
        self.dirty = true;
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[inline]
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    #[inline]
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    #[must_use]
    pub fn kind(&self) -> HeapKind {
        self.factory.kind()
    }

    #[must_use]
    pub fn growth(&self) -> SlabGrowth {
        self.growth
    }

    #[must_use]
    pub fn current_slab(&self) -> SlabId {
        self.slabs[self.current].id()
    }

    /// The heap a consumer must bind.
    #[must_use]
    pub fn current_heap(&self) -> &dyn DescriptorHeap {
        self.slabs[self.current].heap()
    }

    #[must_use]
    pub fn slab_count(&self) -> usize {
        self.slabs.len()
    }

    #[must_use]
    pub fn slabs(&self) -> &[SlabAllocator] {
        &self.slabs
    }

    /// Position of a slab in the chain, if it is still part of it.
    #[must_use]
    pub fn slab_index(&self, id: SlabId) -> Option<usize> {
        self.slabs.iter().position(|s| s.id() == id)
    }

    #[must_use]
    pub fn total_capacity(&self) -> u64 {
        self.slabs.iter().map(|s| u64::from(s.capacity())).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostHeapProvider;

    fn pool(capacity: u32) -> GrowablePool {
        GrowablePool::new(Arc::new(HostHeapProvider::new()), HeapKind::Resource, capacity).unwrap()
    }

    #[test]
    fn allocations_within_capacity_stay_on_one_slab() {
        let mut pool = pool(16);
        pool.clear_dirty();
        let a = pool.allocate(8).unwrap();
        let b = pool.allocate(8).unwrap();
        assert_eq!(a.slab, b.slab);
        assert_eq!(pool.slab_count(), 1);
        assert!(!pool.is_dirty());
    }

    #[test]
    fn overflow_appends_exactly_one_slab_and_marks_dirty() {
        let mut pool = pool(16);
        pool.clear_dirty();
        let first = pool.current_slab();
        pool.allocate(12).unwrap();

        let region = pool.allocate(8).unwrap();
        assert_eq!(pool.slab_count(), 2);
        assert_ne!(pool.current_slab(), first);
        assert_eq!(region.slab, pool.current_slab());
        assert_eq!(region.offset, 0);
        assert!(pool.is_dirty());
    }

    #[test]
    fn oversized_request_gets_a_slab_of_its_own_size() {
        let mut pool = pool(16);
        let region = pool.allocate(100).unwrap();
        assert_eq!(pool.slab_count(), 2);
        assert_eq!(pool.slabs()[1].capacity(), 100);
        assert_eq!(region.count, 100);
    }

    #[test]
    fn dirty_flag_survives_until_cleared() {
        let mut pool = pool(4);
        pool.clear_dirty();
        pool.allocate(4).unwrap();
        pool.allocate(4).unwrap();
        assert!(pool.is_dirty());
        pool.allocate(1).unwrap();
        assert!(pool.is_dirty());
        pool.clear_dirty();
        assert!(!pool.is_dirty());
    }

    #[test]
    fn reset_collapses_chain_into_sum_of_capacities() {
        let mut pool = pool(16);
        pool.allocate(16).unwrap();
        pool.allocate(16).unwrap();
        pool.allocate(40).unwrap();
        assert_eq!(pool.slab_count(), 3);

        pool.reset().unwrap();
        assert_eq!(pool.slab_count(), 1);
        assert_eq!(pool.slabs()[0].capacity(), 16 + 16 + 40);
        assert_eq!(pool.slabs()[0].position(), 0);
        assert!(pool.is_dirty());

        pool.clear_dirty();
        pool.allocate(72).unwrap();
        assert_eq!(pool.slab_count(), 1);
        assert!(!pool.is_dirty());
    }

    #[test]
    fn reset_of_single_slab_keeps_it() {
        let mut pool = pool(16);
        let id = pool.current_slab();
        pool.allocate(10).unwrap();
        pool.reset().unwrap();
        assert_eq!(pool.current_slab(), id);
        assert_eq!(pool.slabs()[0].position(), 0);
    }

    #[test]
    fn nominal_growth_appends_initial_sized_slabs() {
        let mut pool = GrowablePool::with_growth(
            Arc::new(HostHeapProvider::new()),
            HeapKind::Sampler,
            8,
            SlabGrowth::Nominal,
        )
        .unwrap();
        pool.allocate(30).unwrap();
        pool.allocate(6).unwrap();
        assert_eq!(pool.slab_count(), 3);
        assert_eq!(pool.slabs()[1].capacity(), 30);
        assert_eq!(pool.slabs()[2].capacity(), 8);

        pool.reset().unwrap();
        assert_eq!(pool.slab_count(), 1);
        assert_eq!(pool.slabs()[0].capacity(), 8);
        assert_eq!(pool.slab_index(pool.current_slab()), Some(0));
    }

    #[test]
    fn failed_growth_surfaces_out_of_memory() {
        let provider = Arc::new(HostHeapProvider::with_max_capacity(16));
        let mut pool = GrowablePool::new(provider, HeapKind::Resource, 16).unwrap();
        pool.allocate(10).unwrap();
        let err = pool.allocate(32).unwrap_err();
        assert!(err.is_out_of_memory());
        assert_eq!(pool.slab_count(), 1);
        assert_eq!(pool.slabs()[0].position(), 10);
    }

    #[test]
    fn copy_lands_in_the_heap() {
        let mut pool = pool(8);
        let source = [Descriptor(1), Descriptor(2), Descriptor(3)];
        pool.allocate(2).unwrap();
        let alloc = pool.allocate_and_copy(&source).unwrap();
        assert_eq!(alloc.region.offset, 2);

        let view = pool.current_heap().host_view().unwrap();
        assert_eq!(&view[2..5], &source);
    }

    #[test]
    fn empty_copy_is_invalid() {
        let mut pool = pool(8);
        let err = pool.allocate_and_copy(&[]).unwrap_err();
        assert_eq!(err.code(), mll_core::ResultCode::InvalidArgs);
    }
}
