//! Lifecycle Tests
//!
//! Tests for:
//! - HandleDirectory: strictly increasing ids, shared across registries
//! - LifecycleRegistry: live set, kill queue, grace countdown, forced flush
//! - Handle / WeakHandle: retire-once semantics, weak expiry at retirement

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use mll::{
    HandleDirectory, LifecycleRegistry, ManagedObject, MllError, PENDING_KILL_CYCLES, ResultCode,
};

struct Counted {
    drops: Arc<AtomicUsize>,
}

impl ManagedObject for Counted {
    fn object_type(&self) -> &'static str {
        "Counted"
    }
}

impl Drop for Counted {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn registry() -> (LifecycleRegistry, Arc<AtomicUsize>) {
    init_logging();
    let registry = LifecycleRegistry::with_directory("test", Arc::new(HandleDirectory::new()));
    (registry, Arc::new(AtomicUsize::new(0)))
}

fn counted(drops: &Arc<AtomicUsize>) -> impl FnOnce() -> mll::Result<Counted> {
    let drops = Arc::clone(drops);
    move || Ok(Counted { drops })
}

// ============================================================================
// Identifiers
// ============================================================================

#[test]
fn ids_strictly_increase_across_registries_sharing_a_directory() {
    let directory = Arc::new(HandleDirectory::new());
    let a = LifecycleRegistry::with_directory("a", Arc::clone(&directory));
    let b = LifecycleRegistry::with_directory("b", Arc::clone(&directory));
    let drops = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for i in 0..10 {
        let registry = if i % 2 == 0 { &a } else { &b };
        handles.push(registry.create(None, counted(&drops)).unwrap());
    }
    for pair in handles.windows(2) {
        assert!(pair[0].id() < pair[1].id());
    }
    assert_eq!(directory.issued(), 10);
}

#[test]
fn concurrent_creation_never_repeats_ids() {
    let registry = Arc::new(LifecycleRegistry::with_directory(
        "threads",
        Arc::new(HandleDirectory::new()),
    ));
    let drops = Arc::new(AtomicUsize::new(0));

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let drops = Arc::clone(&drops);
            thread::spawn(move || {
                (0..100)
                    .map(|_| registry.create(None, counted(&drops)).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut ids: Vec<_> = workers
        .into_iter()
        .flat_map(|w| w.join().unwrap())
        .map(|h| h.id())
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 400);
    assert_eq!(registry.count_live(), 0);
    assert_eq!(registry.pending_kill_count(), 400);
}

// ============================================================================
// Registry
// ============================================================================

#[test]
fn create_two_drop_one_then_three_cycles() {
    let (registry, drops) = registry();
    let a = registry.create(Some("A"), counted(&drops)).unwrap();
    let b = registry.create(Some("B"), counted(&drops)).unwrap();
    assert_eq!(registry.count_live(), 2);

    let b_id = b.id();
    drop(b);
    assert_eq!(registry.count_live(), 1);
    let pending = registry.pending_kills();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, b_id);
    assert_eq!(pending[0].remaining_grace, PENDING_KILL_CYCLES);

    for _ in 0..3 {
        registry.run_maintenance(false);
    }
    assert_eq!(registry.pending_kill_count(), 0);
    assert_eq!(registry.count_live(), 1);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
    assert!(registry.is_live(a.id()));
}

#[test]
fn object_survives_two_cycles_and_dies_on_the_third() {
    let (registry, drops) = registry();
    drop(registry.create(None, counted(&drops)).unwrap());

    assert_eq!(registry.run_maintenance(false), 0);
    assert_eq!(registry.run_maintenance(false), 0);
    assert_eq!(drops.load(Ordering::SeqCst), 0);
    assert_eq!(registry.pending_kills()[0].remaining_grace, 1);
    assert_eq!(registry.run_maintenance(false), 1);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[test]
fn forced_maintenance_destroys_immediately() {
    let (registry, drops) = registry();
    for _ in 0..5 {
        drop(registry.create(None, counted(&drops)).unwrap());
    }
    assert_eq!(registry.run_maintenance(true), 5);
    assert_eq!(drops.load(Ordering::SeqCst), 5);
    assert_eq!(registry.pending_kill_count(), 0);
}

#[test]
fn queue_is_walked_oldest_first() {
    let (registry, drops) = registry();
    let old = registry.create(None, counted(&drops)).unwrap();
    let young = registry.create(None, counted(&drops)).unwrap();

    drop(old);
    registry.run_maintenance(false);
    drop(young);

    registry.run_maintenance(false);
    assert_eq!(registry.run_maintenance(false), 1);
    assert_eq!(registry.pending_kill_count(), 1);
    assert_eq!(registry.run_maintenance(false), 1);
    assert_eq!(drops.load(Ordering::SeqCst), 2);
}

#[test]
fn for_each_live_skips_retired_objects() {
    let (registry, drops) = registry();
    let keep = registry.create(Some("keep"), counted(&drops)).unwrap();
    drop(registry.create(Some("gone"), counted(&drops)).unwrap());

    let mut names = Vec::new();
    let count = registry.for_each_live(|child| {
        names.push(child.name().map(str::to_owned));
        assert_eq!(child.object_type(), "Counted");
    });
    assert_eq!(count, 1);
    assert_eq!(names, [Some("keep".to_owned())]);
    drop(keep);
}

#[test]
fn factory_error_is_returned_verbatim() {
    let (registry, _) = registry();
    let result = registry.create::<Counted, _>(None, || {
        Err(MllError::invalid_args("bad description"))
    });
    assert_eq!(ResultCode::of(&result), ResultCode::InvalidArgs);
    assert_eq!(
        result.unwrap_err(),
        MllError::InvalidArgs("bad description".to_owned())
    );
    assert_eq!(registry.count_live(), 0);
    assert_eq!(registry.directory().issued(), 0);
}

#[test]
fn dropping_the_registry_flushes_pending_objects() {
    let (registry, drops) = registry();
    drop(registry.create(None, counted(&drops)).unwrap());
    drop(registry);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Handles
// ============================================================================

#[test]
fn clones_share_one_retirement() {
    let (registry, drops) = registry();
    let handle = registry.create(None, counted(&drops)).unwrap();
    let copies: Vec<_> = (0..8).map(|_| handle.clone()).collect();
    assert_eq!(handle.owner_count(), 9);
    assert!(copies.iter().all(|c| *c == handle));

    drop(copies);
    assert_eq!(registry.pending_kill_count(), 0);
    drop(handle);
    assert_eq!(registry.pending_kill_count(), 1);
}

#[test]
fn weak_handle_expires_at_retirement_not_destruction() {
    let (registry, drops) = registry();
    let handle = registry.create(None, counted(&drops)).unwrap();
    let weak = handle.downgrade();
    assert!(weak.is_valid());
    assert_eq!(weak.upgrade().map(|h| h.id()), Some(handle.id()));

    let id = handle.id();
    drop(handle);
    assert!(!weak.is_valid());
    assert!(weak.upgrade().is_none());
    assert_eq!(weak.id(), id);
    assert_eq!(drops.load(Ordering::SeqCst), 0);
}

#[test]
fn handle_outliving_its_registry_still_frees_the_payload() {
    let (registry, drops) = registry();
    let handle = registry.create(None, counted(&drops)).unwrap();
    drop(registry);
    assert_eq!(drops.load(Ordering::SeqCst), 0);
    drop(handle);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}
