//! Object Handle System
//!
//! Provides reference-counted handles to registry-managed objects.
//!
//! # Design Principles
//! - A [`Handle`] keeps its object *owned*; cloning it is an atomic increment
//! - When the last `Handle` of an object is dropped, the owning registry is told to
//!   retire the object, exactly once
//! - A [`WeakHandle`] observes an object without owning it, suitable for caches
//! - Handles compare, order and hash by [`ObjectId`], never by address
//!
//! Physical destruction is not tied to the handle: a retired object sits in the
//! registry's kill queue for a grace period before its payload is dropped.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::{Arc, Weak};

use crate::id::ObjectId;

/// Payload stored behind a handle.
///
/// Implementors are the backend-specific objects (command lists, textures...).
/// Dropping the payload is the physical destruction of the object.
pub trait ManagedObject: Send + Sync + 'static {
    /// Short type label used in diagnostics, e.g. `"Texture"`.
    fn object_type(&self) -> &'static str;
}

/// Type-erased metadata view of a registry child.
///
/// This is what live-object visitors receive.
pub trait RegistryChild: Send + Sync {
    fn id(&self) -> ObjectId;
    fn name(&self) -> Option<&str>;
    fn object_type(&self) -> &'static str;
}

/// Capability handed to every handle at construction: "my owner is gone, retire me".
pub trait RetireSink: Send + Sync {
    fn retire(&self, id: ObjectId);
}

/// A registry-managed object: identity, optional name and the payload.
pub struct Managed<T> {
    id: ObjectId,
    name: Option<String>,
    payload: T,
}

impl<T: ManagedObject> Managed<T> {
    pub(crate) fn new(id: ObjectId, name: Option<String>, payload: T) -> Self {
        Self { id, name, payload }
    }

    #[inline]
    pub fn payload(&self) -> &T {
        &self.payload
    }
}

impl<T: ManagedObject> RegistryChild for Managed<T> {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn object_type(&self) -> &'static str {
        self.payload.object_type()
    }
}

/// Shared ownership token. Its drop is the retire trigger.
struct Owner<T: ManagedObject> {
    object: Arc<Managed<T>>,
    sink: Weak<dyn RetireSink>,
}

impl<T: ManagedObject> Drop for Owner<T> {
    fn drop(&mut self) {
        // A dead sink means the registry is gone; the object dies with this owner.
        if let Some(sink) = self.sink.upgrade() {
            sink.retire(self.object.id);
        }
    }
}

/// Owning handle to a registry-managed object.
///
/// Dereferences to the payload. Holding at least one `Handle` keeps the object live.
pub struct Handle<T: ManagedObject> {
    owner: Arc<Owner<T>>,
}

impl<T: ManagedObject> Handle<T> {
    pub(crate) fn new(object: Arc<Managed<T>>, sink: Weak<dyn RetireSink>) -> Self {
        Self {
            owner: Arc::new(Owner { object, sink }),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> ObjectId {
        self.owner.object.id
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.owner.object.name.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn object_type(&self) -> &'static str {
        self.owner.object.payload.object_type()
    }

    /// Number of owning handles to this object.
    #[inline]
    #[must_use]
    pub fn owner_count(&self) -> usize {
        Arc::strong_count(&self.owner)
    }

    /// Creates a non-owning handle.
    #[must_use]
    pub fn downgrade(&self) -> WeakHandle<T> {
        WeakHandle {
            id: self.id(),
            owner: Arc::downgrade(&self.owner),
        }
    }
}

impl<T: ManagedObject> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self {
            owner: Arc::clone(&self.owner),
        }
    }
}

impl<T: ManagedObject> Deref for Handle<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.owner.object.payload
    }
}

impl<T: ManagedObject> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl<T: ManagedObject> Eq for Handle<T> {}

impl<T: ManagedObject> PartialOrd for Handle<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: ManagedObject> Ord for Handle<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id().cmp(&other.id())
    }
}

impl<T: ManagedObject> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl<T: ManagedObject> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("id", &self.id())
            .field("type", &self.object_type())
            .field("name", &self.name())
            .finish()
    }
}

/// Non-owning handle.
///
/// Becomes invalid as soon as the last [`Handle`] is dropped, i.e. once the object has
/// been retired. The id stays readable after that.
pub struct WeakHandle<T: ManagedObject> {
    id: ObjectId,
    owner: Weak<Owner<T>>,
}

impl<T: ManagedObject> WeakHandle<T> {
    #[inline]
    #[must_use]
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Whether the object is still owned by at least one [`Handle`].
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.owner.strong_count() > 0
    }

    /// Attempts to obtain an owning handle. `None` once the object has been retired.
    #[must_use]
    pub fn upgrade(&self) -> Option<Handle<T>> {
        self.owner.upgrade().map(|owner| Handle { owner })
    }
}

impl<T: ManagedObject> Clone for WeakHandle<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            owner: Weak::clone(&self.owner),
        }
    }
}

impl<T: ManagedObject> PartialEq for WeakHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T: ManagedObject> Eq for WeakHandle<T> {}

impl<T: ManagedObject> Hash for WeakHandle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T: ManagedObject> From<&Handle<T>> for WeakHandle<T> {
    fn from(handle: &Handle<T>) -> Self {
        handle.downgrade()
    }
}

impl<T: ManagedObject> fmt::Debug for WeakHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakHandle")
            .field("id", &self.id)
            .field("valid", &self.is_valid())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct Blob(u32);

    impl ManagedObject for Blob {
        fn object_type(&self) -> &'static str {
            "Blob"
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        retired: Mutex<Vec<ObjectId>>,
    }

    impl RetireSink for RecordingSink {
        fn retire(&self, id: ObjectId) {
            self.retired.lock().push(id);
        }
    }

    fn make(sink: &Arc<RecordingSink>, id: u64, value: u32) -> Handle<Blob> {
        let weak_sink: Weak<dyn RetireSink> = Arc::<RecordingSink>::downgrade(sink);
        let object = Arc::new(Managed::new(ObjectId::from_raw(id), None, Blob(value)));
        Handle::new(object, weak_sink)
    }

    #[test]
    fn last_drop_retires_exactly_once() {
        let sink = Arc::new(RecordingSink::default());
        let handle = make(&sink, 7, 1);
        let copy = handle.clone();
        assert_eq!(handle.owner_count(), 2);

        drop(handle);
        assert!(sink.retired.lock().is_empty());

        drop(copy);
        assert_eq!(*sink.retired.lock(), vec![ObjectId::from_raw(7)]);
    }

    #[test]
    fn equality_uses_identity() {
        let sink = Arc::new(RecordingSink::default());
        let a = make(&sink, 1, 5);
        let b = make(&sink, 2, 5);
        assert_ne!(a, b);
        assert!(a < b);
        assert_eq!(a, a.clone());
        assert_eq!(a.0, 5);
    }

    #[test]
    fn weak_handle_dies_with_last_owner() {
        let sink = Arc::new(RecordingSink::default());
        let strong = make(&sink, 3, 9);
        let weak = strong.downgrade();

        assert!(weak.is_valid());
        let upgraded = weak.upgrade().map(|h| h.0);
        assert_eq!(upgraded, Some(9));

        drop(strong);
        assert!(!weak.is_valid());
        assert!(weak.upgrade().is_none());
        assert_eq!(weak.id(), ObjectId::from_raw(3));
        assert_eq!(sink.retired.lock().len(), 1);
    }

    #[test]
    fn dead_sink_is_ignored() {
        let sink = Arc::new(RecordingSink::default());
        let handle = make(&sink, 4, 0);
        drop(sink);
        drop(handle);
    }
}
