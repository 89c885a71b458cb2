//! Headless backend
//!
//! A [`NativeBackend`] with no GPU behind it. Native objects are numbered tokens,
//! descriptor heaps come from a [`HostHeapProvider`]. The backend counts what it
//! creates, destroys, binds and presents, and can be told to refuse the next creation
//! of a given kind.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use mll_alloc::{DescriptorHeap, HeapProvider, HostHeapProvider};
use mll_core::{MllError, Result};

use crate::desc::{CommandListDesc, SwapchainDesc, TextureDesc};
use crate::native::{NativeBackend, NativeKind, NativeObject};

#[derive(Debug, Default)]
pub struct HeadlessBackend {
    heaps: Arc<HostHeapProvider>,
    raytracing: bool,
    next_token: AtomicU64,
    live: Mutex<BTreeMap<NativeObject, NativeKind>>,
    refusals: Mutex<Vec<NativeKind>>,
    created: AtomicU64,
    destroyed: AtomicU64,
    heap_binds: AtomicU64,
    presents: AtomicU64,
}

impl HeadlessBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_raytracing(mut self, supported: bool) -> Self {
        self.raytracing = supported;
        self
    }

    /// Descriptor heaps larger than `max_capacity` fail with `OutOfMemory`.
    #[must_use]
    pub fn with_max_heap_capacity(mut self, max_capacity: u32) -> Self {
        self.heaps = Arc::new(HostHeapProvider::with_max_capacity(max_capacity));
        self
    }

    /// The next creation of `kind` fails with `InvalidOperation`.
    pub fn refuse_next(&self, kind: NativeKind) {
        self.refusals.lock().push(kind);
    }

    #[must_use]
    pub fn created_count(&self) -> u64 {
        self.created.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn destroyed_count(&self) -> u64 {
        self.destroyed.load(Ordering::Relaxed)
    }

    /// Native objects created and not yet destroyed.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.lock().len()
    }

    #[must_use]
    pub fn live_count_of(&self, kind: NativeKind) -> usize {
        self.live.lock().values().filter(|&&k| k == kind).count()
    }

    #[must_use]
    pub fn heap_bind_count(&self) -> u64 {
        self.heap_binds.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn present_count(&self) -> u64 {
        self.presents.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn heaps_created(&self) -> u32 {
        self.heaps.heaps_created()
    }

    fn create(&self, kind: NativeKind) -> Result<NativeObject> {
        {
            let mut refusals = self.refusals.lock();
            if let Some(pos) = refusals.iter().position(|&k| k == kind) {
                refusals.remove(pos);
                return Err(MllError::invalid_operation(format!(
                    "headless backend refused to create {kind:?}"
                )));
            }
        }

        let object = NativeObject(self.next_token.fetch_add(1, Ordering::Relaxed) + 1);
        self.live.lock().insert(object, kind);
        self.created.fetch_add(1, Ordering::Relaxed);
        Ok(object)
    }
}

impl NativeBackend for HeadlessBackend {
    fn name(&self) -> &str {
        "headless"
    }

    fn supports_raytracing(&self) -> bool {
        self.raytracing
    }

    fn heap_provider(&self) -> Arc<dyn HeapProvider> {
        self.heaps.clone()
    }

    fn create_command_list(&self, _desc: &CommandListDesc<'_>) -> Result<NativeObject> {
        self.create(NativeKind::CommandList)
    }

    fn create_texture(&self, _desc: &TextureDesc<'_>) -> Result<NativeObject> {
        self.create(NativeKind::Texture)
    }

    fn create_swapchain(&self, _desc: &SwapchainDesc<'_>) -> Result<(NativeObject, u32)> {
        self.create(NativeKind::Swapchain).map(|object| (object, 0))
    }

    fn bind_descriptor_heaps(&self, list: NativeObject, heaps: &[&dyn DescriptorHeap]) {
        debug_assert_eq!(self.live.lock().get(&list), Some(&NativeKind::CommandList));
        log::trace!("bind {} descriptor heap(s) on {list:?}", heaps.len());
        self.heap_binds.fetch_add(1, Ordering::Relaxed);
    }

    fn present(&self, swapchain: NativeObject, _sync_interval: u32) -> Result<()> {
        if self.live.lock().get(&swapchain) != Some(&NativeKind::Swapchain) {
            return Err(MllError::invalid_operation(format!(
                "{swapchain:?} is not a live swapchain"
            )));
        }
        self.presents.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn destroy(&self, kind: NativeKind, object: NativeObject) {
        match self.live.lock().remove(&object) {
            Some(recorded) => {
                debug_assert_eq!(recorded, kind);
                self.destroyed.fetch_add(1, Ordering::Relaxed);
            }
            None => log::warn!("destroy of unknown native {kind:?} {object:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refusal_applies_to_one_creation_of_that_kind() {
        let backend = HeadlessBackend::new();
        backend.refuse_next(NativeKind::Texture);

        assert!(backend.create_command_list(&CommandListDesc::default()).is_ok());
        let err = backend.create_texture(&TextureDesc::default()).unwrap_err();
        assert_eq!(err.code(), mll_core::ResultCode::InvalidOperation);
        assert!(backend.create_texture(&TextureDesc::default()).is_ok());
        assert_eq!(backend.created_count(), 2);
    }

    #[test]
    fn destroy_is_counted_once() {
        let backend = HeadlessBackend::new();
        let object = backend.create_texture(&TextureDesc::default()).unwrap();
        assert_eq!(backend.live_count_of(NativeKind::Texture), 1);

        backend.destroy(NativeKind::Texture, object);
        backend.destroy(NativeKind::Texture, object);
        assert_eq!(backend.destroyed_count(), 1);
        assert_eq!(backend.live_count(), 0);
    }

    #[test]
    fn present_requires_a_live_swapchain() {
        let backend = HeadlessBackend::new();
        let (swapchain, index) = backend
            .create_swapchain(&SwapchainDesc::default())
            .unwrap();
        assert_eq!(index, 0);
        backend.present(swapchain, 1).unwrap();
        backend.destroy(NativeKind::Swapchain, swapchain);
        assert!(backend.present(swapchain, 1).is_err());
        assert_eq!(backend.present_count(), 1);
    }
}
