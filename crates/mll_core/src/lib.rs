//! Core building blocks shared by every MLL crate:
//!
//! - [`errors`]: the closed error domain and its boundary [`ResultCode`]
//! - [`id`]: process-unique [`ObjectId`]s issued by a [`HandleDirectory`]
//! - [`hash`]: FNV-1a hashing for content-addressed caches
//! - [`handle`]: owning and weak handles with retire-on-last-drop
//! - [`registry`]: the [`LifecycleRegistry`] with grace-period reclamation

pub mod errors;
pub mod handle;
pub mod hash;
pub mod id;
pub mod registry;

pub use errors::{MllError, Result, ResultCode};
pub use handle::{Handle, Managed, ManagedObject, RegistryChild, RetireSink, WeakHandle};
pub use hash::{fnv1a32, fnv1a32_with, fnv1a64, fnv1a64_with};
pub use id::{HandleDirectory, ObjectId};
pub use registry::{LifecycleRegistry, PENDING_KILL_CYCLES, PendingKillInfo};
