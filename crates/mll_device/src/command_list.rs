//! Command List
//!
//! A command list records work for one queue. Graphics and compute lists own two
//! descriptor stacks:
//!
//! - a resource stack ([`GrowablePool`]) for per-draw view tables
//! - a sampler stack ([`ContentAddressedPool`]) that reuses identical sampler tables
//!
//! ```text
//! begin() ── reset both stacks
//!   ├─ allocate_*_descriptors(...)   copy tables, may switch the current heap
//!   ├─ bind_descriptor_heaps()       re-binds only if either stack is dirty
//!   └─ ...
//! end()
//! ```
//!
//! Copy lists bind no heaps and own no stacks.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use mll_alloc::{
    Allocation, CacheStats, ContentAddressedPool, Descriptor, DescriptorHeap, GrowablePool,
    HeapKind,
};
use mll_core::{ManagedObject, MllError, Result};

use crate::desc::{CommandListDesc, CommandQueueType};
use crate::native::{NativeBackend, NativeKind, NativeObject};
use crate::settings::DeviceSettings;

struct DescriptorStacks {
    resources: GrowablePool,
    samplers: ContentAddressedPool,
}

struct Recorder {
    recording: bool,
    stacks: Option<DescriptorStacks>,
    heap_binds: u32,
}

/// Snapshot of a command list's descriptor stacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorStackStats {
    pub resource_slabs: usize,
    pub resource_capacity: u64,
    pub resource_dirty: bool,
    pub sampler_slabs: usize,
    pub sampler_dirty: bool,
    pub sampler_cache: CacheStats,
}

pub struct CommandList {
    backend: Arc<dyn NativeBackend>,
    native: NativeObject,
    queue_type: CommandQueueType,
    recorder: Mutex<Recorder>,
}

impl CommandList {
    pub(crate) fn create(
        backend: &Arc<dyn NativeBackend>,
        settings: &DeviceSettings,
        desc: &CommandListDesc<'_>,
    ) -> Result<Self> {
        let stacks = if desc.queue_type.uses_descriptor_heaps() {
            let provider = backend.heap_provider();
            Some(DescriptorStacks {
                resources: GrowablePool::new(
                    Arc::clone(&provider),
                    HeapKind::Resource,
                    settings.resource_pool().slab_capacity,
                )?,
                samplers: ContentAddressedPool::new(
                    provider,
                    HeapKind::Sampler,
                    settings.sampler_pool(),
                )?,
            })
        } else {
            None
        };

        let native = backend.create_command_list(desc)?;
        Ok(Self {
            backend: Arc::clone(backend),
            native,
            queue_type: desc.queue_type,
            recorder: Mutex::new(Recorder {
                recording: false,
                stacks,
                heap_binds: 0,
            }),
        })
    }

    #[must_use]
    pub fn queue_type(&self) -> CommandQueueType {
        self.queue_type
    }

    #[must_use]
    pub fn native(&self) -> NativeObject {
        self.native
    }

    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.recorder.lock().recording
    }

    /// Opens the list for recording and rewinds both descriptor stacks.
    pub fn begin(&self) -> Result<()> {
        let mut recorder = self.recorder.lock();
        if recorder.recording {
            return Err(MllError::invalid_operation("command list is already recording"));
        }
        if let Some(stacks) = recorder.stacks.as_mut() {
            stacks.resources.reset()?;
            stacks.samplers.reset()?;
        }
        recorder.recording = true;
        Ok(())
    }

    pub fn end(&self) -> Result<()> {
        let mut recorder = self.recorder.lock();
        if !recorder.recording {
            return Err(MllError::invalid_operation("end() without begin()"));
        }
        recorder.recording = false;
        Ok(())
    }

    /// Binds the current resource and sampler heaps if either stack changed heaps since
    /// the last bind. Returns whether a bind was issued.
    pub fn bind_descriptor_heaps(&self) -> Result<bool> {
        let mut recorder = self.recorder.lock();
        let recorder = &mut *recorder;
        let stacks = Self::recording_stacks(recorder.recording, recorder.stacks.as_mut())?;

        if !stacks.resources.is_dirty() && !stacks.samplers.is_dirty() {
            return Ok(false);
        }

        let mut heaps: Vec<&dyn DescriptorHeap> = vec![stacks.resources.current_heap()];
        heaps.extend(stacks.samplers.current_heap());
        self.backend.bind_descriptor_heaps(self.native, &heaps);

        stacks.resources.clear_dirty();
        stacks.samplers.clear_dirty();
        recorder.heap_binds += 1;
        Ok(true)
    }

    /// Copies a view table into the resource stack.
    pub fn allocate_resource_descriptors(&self, source: &[Descriptor]) -> Result<Allocation> {
        let mut recorder = self.recorder.lock();
        let recorder = &mut *recorder;
        Self::recording_stacks(recorder.recording, recorder.stacks.as_mut())?
            .resources
            .allocate_and_copy(source)
    }

    /// Copies a sampler table into the sampler stack, reusing an identical earlier copy.
    pub fn allocate_sampler_descriptors(&self, source: &[Descriptor]) -> Result<Allocation> {
        let mut recorder = self.recorder.lock();
        let recorder = &mut *recorder;
        Self::recording_stacks(recorder.recording, recorder.stacks.as_mut())?
            .samplers
            .allocate_and_copy(source)
    }

    fn recording_stacks(
        recording: bool,
        stacks: Option<&mut DescriptorStacks>,
    ) -> Result<&mut DescriptorStacks> {
        let stacks = stacks.ok_or_else(|| {
            MllError::invalid_operation("copy command lists have no descriptor heaps")
        })?;
        if !recording {
            return Err(MllError::invalid_operation(
                "descriptor allocation outside begin()/end()",
            ));
        }
        Ok(stacks)
    }

    /// Heap binds issued since creation.
    #[must_use]
    pub fn heap_bind_count(&self) -> u32 {
        self.recorder.lock().heap_binds
    }

    /// `None` for copy lists.
    #[must_use]
    pub fn descriptor_stats(&self) -> Option<DescriptorStackStats> {
        let recorder = self.recorder.lock();
        recorder.stacks.as_ref().map(|s| DescriptorStackStats {
            resource_slabs: s.resources.slab_count(),
            resource_capacity: s.resources.total_capacity(),
            resource_dirty: s.resources.is_dirty(),
            sampler_slabs: s.samplers.slab_count(),
            sampler_dirty: s.samplers.is_dirty(),
            sampler_cache: s.samplers.stats(),
        })
    }
}

impl ManagedObject for CommandList {
    fn object_type(&self) -> &'static str {
        "CommandList"
    }
}

impl Drop for CommandList {
    fn drop(&mut self) {
        self.backend.destroy(NativeKind::CommandList, self.native);
    }
}

impl fmt::Debug for CommandList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandList")
            .field("native", &self.native)
            .field("queue_type", &self.queue_type)
            .field("recording", &self.is_recording())
            .finish_non_exhaustive()
    }
}
