//! Device Settings
//!
//! Configuration applied when a [`Device`](crate::Device) is created.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use mll_device::{DeviceDesc, DeviceSettings, CollisionPolicy};
//!
//! // Defaults: no debug layer, 2048-slot resource and sampler heaps, verified sampler cache
//! let settings = DeviceSettings::default();
//!
//! // Larger resource slabs, hash-only sampler cache
//! let settings = DeviceSettings {
//!     resource_heap_capacity: 8192,
//!     sampler_collision_policy: CollisionPolicy::TrustHash,
//!     ..Default::default()
//! };
//!
//! let device = Device::new(&DeviceDesc::default().with_settings(settings), backend)?;
//! ```
//!
//! Settings are `serde`-serializable; missing fields take their defaults, so a config
//! file only needs to name what it changes.

use serde::{Deserialize, Serialize};

use mll_alloc::{
    CollisionPolicy, DEFAULT_RESOURCE_HEAP_CAPACITY, DEFAULT_SAMPLER_HEAP_CAPACITY, PoolSettings,
};
use mll_core::{MllError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSettings {
    /// Ask the backend for its validation layer.
    pub enable_debug_layer: bool,

    /// Slot count of the first resource slab of every command list.
    ///
    /// Command lists grow past this on demand and keep the grown size across frames.
    pub resource_heap_capacity: u32,

    /// Slot count of every sampler slab.
    pub sampler_heap_capacity: u32,

    /// How the sampler cache treats two tables with the same hash.
    pub sampler_collision_policy: CollisionPolicy,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            enable_debug_layer: false,
            resource_heap_capacity: DEFAULT_RESOURCE_HEAP_CAPACITY,
            sampler_heap_capacity: DEFAULT_SAMPLER_HEAP_CAPACITY,
            sampler_collision_policy: CollisionPolicy::default(),
        }
    }
}

impl DeviceSettings {
    /// Rejects capacities the pools cannot be built with.
    pub fn validate(&self) -> Result<()> {
        if self.resource_heap_capacity == 0 {
            return Err(MllError::invalid_args("resource_heap_capacity must be non-zero"));
        }
        if self.sampler_heap_capacity == 0 {
            return Err(MllError::invalid_args("sampler_heap_capacity must be non-zero"));
        }
        Ok(())
    }

    #[must_use]
    pub fn resource_pool(&self) -> PoolSettings {
        PoolSettings::default().with_slab_capacity(self.resource_heap_capacity)
    }

    #[must_use]
    pub fn sampler_pool(&self) -> PoolSettings {
        PoolSettings::default()
            .with_slab_capacity(self.sampler_heap_capacity)
            .with_collision_policy(self.sampler_collision_policy)
    }
}
