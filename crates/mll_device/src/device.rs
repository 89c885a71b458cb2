//! Device
//!
//! The parent of every command list, texture and swapchain. A device owns a
//! [`LifecycleRegistry`]: objects are created through it, retire when their last
//! [`Handle`] is dropped, and are destroyed by [`Device::process_death_list`] once their
//! grace period has elapsed. Call it once per frame.
//!
//! ```rust,ignore
//! let device = Device::new(&DeviceDesc::default(), Arc::new(HeadlessBackend::new()))?;
//! let list = device.create_command_list(&CommandListDesc::default())?;
//!
//! loop {
//!     list.begin()?;
//!     // record ...
//!     list.end()?;
//!     device.process_death_list(false);
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use mll_core::{Handle, HandleDirectory, LifecycleRegistry, RegistryChild, Result};

use crate::command_list::CommandList;
use crate::desc::{CommandListDesc, DeviceDesc, SwapchainDesc, TextureDesc};
use crate::native::NativeBackend;
use crate::settings::DeviceSettings;
use crate::swapchain::Swapchain;
use crate::texture::Texture;

pub struct Device {
    settings: DeviceSettings,
    backend: Arc<dyn NativeBackend>,
    registry: LifecycleRegistry,
}

impl Device {
    pub fn new(desc: &DeviceDesc, backend: Arc<dyn NativeBackend>) -> Result<Self> {
        Self::with_directory(desc, backend, HandleDirectory::shared())
    }

    /// Creates a device whose objects draw ids from `directory`.
    pub fn with_directory(
        desc: &DeviceDesc,
        backend: Arc<dyn NativeBackend>,
        directory: Arc<HandleDirectory>,
    ) -> Result<Self> {
        desc.settings.validate()?;

        let label = format!("device:{}", backend.name());
        log::info!(
            "creating {label} (debug layer: {}, raytracing: {})",
            desc.settings.enable_debug_layer,
            backend.supports_raytracing()
        );

        Ok(Self {
            settings: desc.settings,
            backend,
            registry: LifecycleRegistry::with_directory(label, directory),
        })
    }

    #[must_use]
    pub fn settings(&self) -> &DeviceSettings {
        &self.settings
    }

    #[must_use]
    pub fn backend(&self) -> &Arc<dyn NativeBackend> {
        &self.backend
    }

    #[must_use]
    pub fn raytracing_supported(&self) -> bool {
        self.backend.supports_raytracing()
    }

    pub fn create_command_list(&self, desc: &CommandListDesc<'_>) -> Result<Handle<CommandList>> {
        self.registry.create(desc.label, || {
            CommandList::create(&self.backend, &self.settings, desc)
        })
    }

    pub fn create_texture(&self, desc: &TextureDesc<'_>) -> Result<Handle<Texture>> {
        self.registry
            .create(desc.label, || Texture::create(&self.backend, desc))
    }

    pub fn create_swapchain(&self, desc: &SwapchainDesc<'_>) -> Result<Handle<Swapchain>> {
        self.registry
            .create(desc.label, || Swapchain::create(&self.backend, desc))
    }

    /// Advances the kill queue by one cycle, or destroys everything in it when `force`
    /// is set. Returns the number of destroyed objects.
    pub fn process_death_list(&self, force: bool) -> usize {
        self.registry.run_maintenance(force)
    }

    /// Visits every live object and returns how many there were.
    ///
    /// The visitor runs under the registry lock and must not create or drop handles.
    pub fn for_each_live_object<F>(&self, visitor: F) -> usize
    where
        F: FnMut(&dyn RegistryChild),
    {
        self.registry.for_each_live(visitor)
    }

    #[must_use]
    pub fn live_object_count(&self) -> usize {
        self.registry.count_live()
    }

    #[must_use]
    pub fn pending_kill_count(&self) -> usize {
        self.registry.pending_kill_count()
    }

    #[must_use]
    pub fn registry(&self) -> &LifecycleRegistry {
        &self.registry
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        self.registry.for_each_live(|child| {
            log::debug!(
                "live at device drop: {} {} ({:?})",
                child.object_type(),
                child.id(),
                child.name()
            );
        });
        let destroyed = self.registry.run_maintenance(true);
        log::debug!("device drop flushed {destroyed} pending object(s)");
    }
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("backend", &self.backend.name())
            .field("settings", &self.settings)
            .field("registry", &self.registry)
            .finish()
    }
}
