//! Content-addressed descriptor pool
//!
//! Used for samplers: a draw usually binds one of a handful of sampler tables, so
//! instead of copying the same table again for every draw the pool keys each copy by
//! the FNV-1a hash of its source descriptors and hands back the existing region.
//!
//! # Lookup
//!
//! 1. Hash the source descriptors as bytes (`fnv1a32`).
//! 2. Hit: return the cached region and make its slab current.
//! 3. Miss: copy into the internal [`GrowablePool`] (nominal growth) and add
//!    `hash → region` to the hash's bucket.
//!
//! With [`CollisionPolicy::Verify`] each bucket entry keeps its source descriptors and a
//! hit requires equal content. Tables that collide on the hash get their own copies and
//! share the bucket, so each of them keeps hitting its own region. With
//! [`CollisionPolicy::TrustHash`] a bucket holds one entry and colliding tables alias it.
//!
//! # Reset
//!
//! [`ContentAddressedPool::reset`] drops the cache and the slab chain and starts over
//! with one slab of nominal capacity. Growth is not carried across frames.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use mll_core::{MllError, Result, fnv1a32};

use crate::backend::{Descriptor, DescriptorHeap, HeapKind, HeapProvider};
use crate::growable::{Allocation, GrowablePool, SlabGrowth};
use crate::settings::{CollisionPolicy, PoolSettings};
use crate::slab::{Region, SlabAllocator, SlabId};

struct CacheEntry {
    region: Region,
    /// Source descriptors, kept only under [`CollisionPolicy::Verify`].
    content: Option<Box<[Descriptor]>>,
}

impl CacheEntry {
    fn matches(&self, source: &[Descriptor]) -> bool {
        self.content
            .as_deref()
            .is_none_or(|content| content == source)
    }
}

/// Hit/miss counters since the last reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
    pub collisions: u32,
}

/// Bump pool with hash-keyed reuse of identical copies.
pub struct ContentAddressedPool {
    chain: GrowablePool,
    settings: PoolSettings,
    /// Slab the consumer must have bound; `None` until the first copy after a reset.
    current: Option<usize>,
    dirty: bool,
    cache: FxHashMap<u32, SmallVec<[CacheEntry; 1]>>,
    stats: CacheStats,
}

impl ContentAddressedPool {
    pub fn new(provider: Arc<dyn HeapProvider>, kind: HeapKind, settings: PoolSettings) -> Result<Self> {
        let chain =
            GrowablePool::with_growth(provider, kind, settings.slab_capacity, SlabGrowth::Nominal)?;
        Ok(Self {
            chain,
            settings,
            current: None,
            dirty: false,
            cache: FxHashMap::default(),
            stats: CacheStats::default(),
        })
    }

    /// Returns a region holding a copy of `source`, reusing an earlier copy when one
    /// with the same content exists.
    pub fn allocate_and_copy(&mut self, source: &[Descriptor]) -> Result<Allocation> {
        if source.is_empty() {
            return Err(MllError::invalid_args("no descriptors to copy"));
        }

        let hash = fnv1a32(bytemuck::cast_slice(source));
        let (hit, collided) = match self.cache.get(&hash) {
            Some(bucket) => (bucket.iter().find(|e| e.matches(source)).map(|e| e.region), true),
            None => (None, false),
        };
        if let Some(region) = hit {
            self.stats.hits += 1;
            self.select(region.slab);
            return Ok(Allocation {
                region,
                dirty: self.dirty,
            });
        }
        if collided {
            self.stats.collisions += 1;
            log::warn!(
                "{} cache collision on hash {hash:#010x}; allocating a separate copy",
                self.chain.kind().label()
            );
        }

        self.stats.misses += 1;
        let region = self.chain.allocate_and_copy(source)?.region;
        self.select(region.slab);

        let content = match self.settings.collision_policy {
            CollisionPolicy::Verify => Some(source.into()),
            CollisionPolicy::TrustHash => None,
        };
        self.cache
            .entry(hash)
            .or_default()
            .push(CacheEntry { region, content });

        Ok(Allocation {
            region,
            dirty: self.dirty,
        })
    }

    fn select(&mut self, slab: SlabId) {
        let index = self.chain.slab_index(slab);
        debug_assert!(index.is_some(), "cached region outside the active slab chain");
        if index.is_some() && index != self.current {
            self.current = index;
            self.dirty = true;
        }
    }

    /// Drops the cache and the slab chain and starts over with one slab of nominal
    /// capacity.
    ///
    /// If creating the fresh slab fails the pool is left untouched.
    pub fn reset(&mut self) -> Result<()> {
        self.chain.reset()?;
        self.cache.clear();
        self.stats = CacheStats::default();
        self.current = None;
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
        self.chain.kind()
    }

    #[must_use]
    pub fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    #[must_use]
    pub fn current_slab(&self) -> Option<SlabId> {
        self.current.map(|i| self.chain.slabs()[i].id())
    }

    /// The heap a consumer must bind, once anything has been copied since the last reset.
    #[must_use]
    pub fn current_heap(&self) -> Option<&dyn DescriptorHeap> {
        self.current.map(|i| self.chain.slabs()[i].heap())
    }

    #[must_use]
    pub fn slab_count(&self) -> usize {
        self.chain.slab_count()
    }

    #[must_use]
    pub fn slabs(&self) -> &[SlabAllocator] {
        self.chain.slabs()
    }

    #[must_use]
    pub fn cached_entries(&self) -> usize {
        self.cache.values().map(SmallVec::len).sum()
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}
