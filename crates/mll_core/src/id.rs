//! Object identifiers
//!
//! Every object created through a [`LifecycleRegistry`](crate::registry::LifecycleRegistry)
//! receives an [`ObjectId`] from a [`HandleDirectory`]. Identifiers are issued by a single
//! atomic counter and are never reused while the directory lives.
//!
//! Registries receive their directory explicitly. Registries that should share one id
//! space (the normal case inside a process) clone the same `Arc<HandleDirectory>`, or use
//! [`HandleDirectory::shared`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

/// Opaque, process-unique identifier of a registry-managed object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(u64);

impl ObjectId {
    #[cfg(test)]
    pub(crate) const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value.
    #[inline]
    #[must_use]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

static SHARED_DIRECTORY: LazyLock<Arc<HandleDirectory>> =
    LazyLock::new(|| Arc::new(HandleDirectory::new()));

/// Monotonic identifier source.
#[derive(Debug, Default)]
pub struct HandleDirectory {
    next: AtomicU64,
}

impl HandleDirectory {
    /// Creates an independent id space starting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(0),
        }
    }

    /// The process-wide directory used when no explicit one is supplied.
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::clone(&SHARED_DIRECTORY)
    }

    /// Issues the next identifier.
    #[inline]
    pub fn issue(&self) -> ObjectId {
        ObjectId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Number of identifiers issued so far.
    #[must_use]
    pub fn issued(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}
