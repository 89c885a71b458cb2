//! Lifecycle Registry
//!
//! Owns the children created by a parent object (typically a device) and reclaims them
//! with a grace period.
//!
//! # Object states
//!
//! ```text
//!   create()            last Handle dropped          grace elapsed / forced
//! ───────────▶  Live  ─────────────────────▶  PendingKill(n)  ─────────────────▶  Destroyed
//! ```
//!
//! - `Live` objects are visible to [`LifecycleRegistry::for_each_live`].
//! - `PendingKill` objects sit in a FIFO kill queue. Each call to
//!   [`LifecycleRegistry::run_maintenance`] is one cycle; an entry expires
//!   [`PENDING_KILL_CYCLES`] cycles after it was queued.
//! - `Destroyed` means the registry dropped its reference to the payload.
//!
//! The grace period gives work that captured the object outside the handle system a few
//! cycles to finish. It is a soft guarantee; callers with strict lifetime needs must fence
//! on their own.
//!
//! # Thread Safety
//!
//! The live set and the kill queue live behind one `parking_lot::Mutex`. Payloads are
//! dropped after the lock is released, so a payload that owns handles to siblings can
//! retire them from its own `Drop` without deadlocking.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::errors::Result;
use crate::handle::{Handle, Managed, ManagedObject, RegistryChild, RetireSink};
use crate::id::{HandleDirectory, ObjectId};

/// Maintenance cycles a retired object waits before it is destroyed.
pub const PENDING_KILL_CYCLES: u32 = 3;

struct PendingKill {
    object: Arc<dyn RegistryChild>,
    expires_at: u64,
}

#[derive(Default)]
struct RegistryState {
    live: BTreeMap<ObjectId, Arc<dyn RegistryChild>>,
    kill_queue: VecDeque<PendingKill>,
    /// Completed maintenance cycles.
    cycle: u64,
}

struct RegistryShared {
    label: String,
    state: Mutex<RegistryState>,
}

impl RetireSink for RegistryShared {
    fn retire(&self, id: ObjectId) {
        let mut state = self.state.lock();
        let Some(object) = state.live.remove(&id) else {
            let queued = state.kill_queue.iter().any(|p| p.object.id() == id);
            drop(state);
            if queued {
                panic!("[{}] object {id} retired twice", self.label);
            }
            panic!("[{}] retire of unknown object {id}", self.label);
        };

        log::trace!(
            "[{}] retiring {} {id} ({:?})",
            self.label,
            object.object_type(),
            object.name()
        );
        let expires_at = state.cycle + u64::from(PENDING_KILL_CYCLES);
        state.kill_queue.push_back(PendingKill { object, expires_at });
    }
}

/// Snapshot of one kill-queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingKillInfo {
    pub id: ObjectId,
    /// Maintenance cycles left before destruction.
    pub remaining_grace: u32,
}

/// Owner-scoped object registry with deferred reclamation.
pub struct LifecycleRegistry {
    directory: Arc<HandleDirectory>,
    shared: Arc<RegistryShared>,
}

impl LifecycleRegistry {
    /// Creates a registry drawing ids from the process-wide directory.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self::with_directory(label, HandleDirectory::shared())
    }

    /// Creates a registry drawing ids from `directory`.
    #[must_use]
    pub fn with_directory(label: impl Into<String>, directory: Arc<HandleDirectory>) -> Self {
        Self {
            directory,
            shared: Arc::new(RegistryShared {
                label: label.into(),
                state: Mutex::new(RegistryState::default()),
            }),
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.shared.label
    }

    #[must_use]
    pub fn directory(&self) -> &Arc<HandleDirectory> {
        &self.directory
    }

    /// Constructs a payload with `factory` and registers it as live.
    ///
    /// The id is issued only after the factory succeeds; factory errors are returned
    /// unchanged.
    pub fn create<T, F>(&self, name: Option<&str>, factory: F) -> Result<Handle<T>>
    where
        T: ManagedObject,
        F: FnOnce() -> Result<T>,
    {
        let payload = factory()?;
        let id = self.directory.issue();
        let object = Arc::new(Managed::new(id, name.map(str::to_owned), payload));

        let erased: Arc<dyn RegistryChild> = Arc::clone(&object) as Arc<dyn RegistryChild>;
        self.shared.state.lock().live.insert(id, erased);

        log::trace!(
            "[{}] created {} {id} ({name:?})",
            self.shared.label,
            object.object_type()
        );

        let sink: Weak<dyn RetireSink> = Arc::downgrade(&self.shared) as Weak<dyn RetireSink>;
        Ok(Handle::new(object, sink))
    }

    /// Moves a live object to the kill queue.
    ///
    /// Normally driven by the last [`Handle`] being dropped; calling it directly while
    /// handles are still alive will make their eventual drop panic.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not live (unknown, or already retired).
    pub fn retire(&self, id: ObjectId) {
        self.shared.retire(id);
    }

    /// Runs one maintenance cycle and returns the number of destroyed objects.
    ///
    /// Non-forced: the kill queue is walked oldest-first and stops at the first entry
    /// whose grace has not elapsed. Forced: everything queued is destroyed, including
    /// objects retired while destroying others.
    pub fn run_maintenance(&self, force: bool) -> usize {
        let mut destroyed = 0;
        loop {
            let expired = self.collect_expired(force);
            if expired.is_empty() {
                break;
            }
            destroyed += expired.len();
            for object in expired {
                log::debug!(
                    "[{}] destroying {} {} ({:?})",
                    self.shared.label,
                    object.object_type(),
                    object.id(),
                    object.name()
                );
                drop(object);
            }
            if !force {
                break;
            }
        }
        destroyed
    }

    fn collect_expired(&self, force: bool) -> Vec<Arc<dyn RegistryChild>> {
        let mut state = self.shared.state.lock();
        if force {
            return state.kill_queue.drain(..).map(|p| p.object).collect();
        }

        state.cycle += 1;
        let cycle = state.cycle;
        let mut expired = Vec::new();
        while state
            .kill_queue
            .front()
            .is_some_and(|head| head.expires_at <= cycle)
        {
            if let Some(entry) = state.kill_queue.pop_front() {
                expired.push(entry.object);
            }
        }
        expired
    }

    /// Number of live objects.
    #[must_use]
    pub fn count_live(&self) -> usize {
        self.shared.state.lock().live.len()
    }

    /// Visits every live object in id order and returns how many were visited.
    ///
    /// The registry lock is held for the duration of the walk; the visitor must not
    /// create or drop handles of this registry.
    pub fn for_each_live<F>(&self, mut visitor: F) -> usize
    where
        F: FnMut(&dyn RegistryChild),
    {
        let state = self.shared.state.lock();
        for object in state.live.values() {
            visitor(object.as_ref());
        }
        state.live.len()
    }

    #[must_use]
    pub fn is_live(&self, id: ObjectId) -> bool {
        self.shared.state.lock().live.contains_key(&id)
    }

    #[must_use]
    pub fn pending_kill_count(&self) -> usize {
        self.shared.state.lock().kill_queue.len()
    }

    /// Kill-queue contents, oldest first.
    #[must_use]
    pub fn pending_kills(&self) -> Vec<PendingKillInfo> {
        let state = self.shared.state.lock();
        state
            .kill_queue
            .iter()
            .map(|p| PendingKillInfo {
                id: p.object.id(),
                remaining_grace: p.expires_at.saturating_sub(state.cycle) as u32,
            })
            .collect()
    }
}

impl Drop for LifecycleRegistry {
    fn drop(&mut self) {
        let live = self.count_live();
        if live > 0 {
            log::warn!(
                "[{}] dropped with {live} live object(s); they are destroyed with their last handle",
                self.shared.label
            );
        }
        self.run_maintenance(true);
    }
}

impl fmt::Debug for LifecycleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("LifecycleRegistry")
            .field("label", &self.shared.label)
            .field("live", &state.live.len())
            .field("pending_kill", &state.kill_queue.len())
            .field("cycle", &state.cycle)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::MllError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Tracked {
        drops: Arc<AtomicUsize>,
    }

    impl ManagedObject for Tracked {
        fn object_type(&self) -> &'static str {
            "Tracked"
        }
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.drops.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn registry() -> LifecycleRegistry {
        LifecycleRegistry::with_directory("test", Arc::new(HandleDirectory::new()))
    }

    fn tracked(registry: &LifecycleRegistry, drops: &Arc<AtomicUsize>) -> Handle<Tracked> {
        let drops = Arc::clone(drops);
        registry.create(None, || Ok(Tracked { drops })).unwrap()
    }

    #[test]
    fn factory_error_is_propagated_and_consumes_no_id() {
        let registry = registry();
        let result: Result<Handle<Tracked>> =
            registry.create(None, || Err(MllError::invalid_args("bad desc")));
        assert_eq!(result.unwrap_err(), MllError::invalid_args("bad desc"));
        assert_eq!(registry.directory().issued(), 0);
        assert_eq!(registry.count_live(), 0);
    }

    #[test]
    fn drop_moves_object_to_kill_queue_with_full_grace() {
        let registry = registry();
        let drops = Arc::new(AtomicUsize::new(0));
        let handle = tracked(&registry, &drops);
        let id = handle.id();

        drop(handle);
        assert_eq!(registry.count_live(), 0);
        assert_eq!(
            registry.pending_kills(),
            vec![PendingKillInfo {
                id,
                remaining_grace: PENDING_KILL_CYCLES
            }]
        );
        assert_eq!(drops.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn grace_elapses_after_three_cycles() {
        let registry = registry();
        let drops = Arc::new(AtomicUsize::new(0));
        drop(tracked(&registry, &drops));

        assert_eq!(registry.run_maintenance(false), 0);
        assert_eq!(registry.pending_kills()[0].remaining_grace, 2);
        assert_eq!(registry.run_maintenance(false), 0);
        assert_eq!(drops.load(Ordering::SeqCst), 0);
        assert_eq!(registry.run_maintenance(false), 1);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
        assert_eq!(registry.pending_kill_count(), 0);
    }

    #[test]
    fn objects_retired_together_die_together() {
        let registry = registry();
        let drops = Arc::new(AtomicUsize::new(0));
        let a = tracked(&registry, &drops);
        let b = tracked(&registry, &drops);
        drop(a);
        drop(b);

        for _ in 0..PENDING_KILL_CYCLES {
            registry.run_maintenance(false);
        }
        assert_eq!(drops.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn younger_entries_wait_behind_older_ones() {
        let registry = registry();
        let drops = Arc::new(AtomicUsize::new(0));
        let a = tracked(&registry, &drops);
        let b = tracked(&registry, &drops);

        drop(a);
        registry.run_maintenance(false);
        drop(b);

        let kills = registry.pending_kills();
        assert_eq!(kills[0].remaining_grace, 2);
        assert_eq!(kills[1].remaining_grace, 3);

        registry.run_maintenance(false);
        registry.run_maintenance(false);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
        registry.run_maintenance(false);
        assert_eq!(drops.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn forced_maintenance_flushes_everything() {
        let registry = registry();
        let drops = Arc::new(AtomicUsize::new(0));
        drop(tracked(&registry, &drops));
        registry.run_maintenance(false);
        drop(tracked(&registry, &drops));

        assert_eq!(registry.run_maintenance(true), 2);
        assert_eq!(drops.load(Ordering::SeqCst), 2);
        assert_eq!(registry.pending_kill_count(), 0);
    }

    #[test]
    fn for_each_live_skips_retired_objects() {
        let registry = registry();
        let drops = Arc::new(AtomicUsize::new(0));
        let a = registry
            .create(Some("a"), || {
                Ok(Tracked {
                    drops: Arc::clone(&drops),
                })
            })
            .unwrap();
        let b = tracked(&registry, &drops);
        let b_id = b.id();
        drop(b);

        let mut seen = Vec::new();
        let count = registry.for_each_live(|obj| seen.push((obj.id(), obj.name().map(str::to_owned))));
        assert_eq!(count, 1);
        assert_eq!(seen, vec![(a.id(), Some("a".to_owned()))]);
        assert!(!registry.is_live(b_id));
    }

    #[test]
    #[should_panic(expected = "retired twice")]
    fn double_retire_is_fatal() {
        let registry = registry();
        let drops = Arc::new(AtomicUsize::new(0));
        let handle = tracked(&registry, &drops);
        let id = handle.id();
        drop(handle);
        registry.retire(id);
    }

    #[test]
    fn payload_dropping_sibling_handles_does_not_deadlock() {
        struct Parent {
            _child: Handle<Tracked>,
        }
        impl ManagedObject for Parent {
            fn object_type(&self) -> &'static str {
                "Parent"
            }
        }

        let registry = registry();
        let drops = Arc::new(AtomicUsize::new(0));
        let child = tracked(&registry, &drops);
        let parent = registry.create(None, || Ok(Parent { _child: child })).unwrap();
        drop(parent);

        assert_eq!(registry.run_maintenance(true), 2);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
        assert_eq!(registry.count_live(), 0);
    }
}
