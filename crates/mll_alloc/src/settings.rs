//! Pool configuration

use serde::{Deserialize, Serialize};

/// Default slot count for a freshly created resource slab.
pub const DEFAULT_RESOURCE_HEAP_CAPACITY: u32 = 2048;

/// Slot count of every sampler slab.
pub const DEFAULT_SAMPLER_HEAP_CAPACITY: u32 = 2048;

/// How a content-addressed pool treats two inputs with the same hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Keep the source descriptors next to the hash and compare them on every hit.
    /// A mismatch is treated as a miss.
    #[default]
    Verify,
    /// A matching hash is a hit. Cheaper, but two different inputs that collide will
    /// alias the same region.
    TrustHash,
}

/// Settings shared by the growable and content-addressed pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    /// Capacity of the first slab, and of every slab started by a content-addressed reset.
    pub slab_capacity: u32,
    /// Only consulted by content-addressed pools.
    pub collision_policy: CollisionPolicy,
}

impl PoolSettings {
    #[must_use]
    pub fn with_slab_capacity(mut self, slab_capacity: u32) -> Self {
        self.slab_capacity = slab_capacity;
        self
    }

    #[must_use]
    pub fn with_collision_policy(mut self, collision_policy: CollisionPolicy) -> Self {
        self.collision_policy = collision_policy;
        self
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            slab_capacity: DEFAULT_RESOURCE_HEAP_CAPACITY,
            collision_policy: CollisionPolicy::Verify,
        }
    }
}
