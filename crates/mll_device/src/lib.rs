//! Device-level objects for MLL.
//!
//! A [`Device`] creates [`CommandList`]s, [`Texture`]s and [`Swapchain`]s over a
//! [`NativeBackend`] and manages their lifetimes through its registry.
//! [`HeadlessBackend`] runs the whole stack without a GPU.

pub mod command_list;
pub mod desc;
pub mod device;
pub mod headless;
pub mod native;
pub mod settings;
pub mod swapchain;
pub mod texture;

pub use command_list::{CommandList, DescriptorStackStats};
pub use desc::{
    CommandListDesc, CommandQueueType, DeviceDesc, ResourceDimension, ResourceFormat,
    ResourceHeap, ResourceState, ResourceUsage, SwapchainDesc, TextureDesc,
};
pub use device::Device;
pub use headless::HeadlessBackend;
pub use native::{NativeBackend, NativeKind, NativeObject};
pub use settings::DeviceSettings;
pub use swapchain::{MAX_SYNC_INTERVAL, Swapchain};
pub use texture::Texture;

pub use mll_alloc::CollisionPolicy;
