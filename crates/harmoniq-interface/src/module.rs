use std::fmt;

use crate::context::InterfaceInstance;

/// Capability requested for every interface module.
pub const INTERFACE_CAPABILITY: &str = "interface";

/// A running interface implementation.
pub trait InterfaceModule: Send {
    /// Stops the interface. Called once, outside the registry lock.
    fn close(self: Box<Self>) {}
}

/// Loaded module owned by exactly one interface instance.
pub struct ModuleHandle {
    name: String,
    module: Box<dyn InterfaceModule>,
}

impl ModuleHandle {
    pub fn new(name: impl Into<String>, module: Box<dyn InterfaceModule>) -> Self {
        Self {
            name: name.into(),
            module,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn close(self) {
        self.module.close();
    }
}

impl fmt::Debug for ModuleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleHandle")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Parameters of a single module lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleRequest<'a> {
    pub capability: &'a str,
    /// Comma separated shortcut list. `None` selects the best module.
    pub name_hint: Option<&'a str>,
    /// Do not fall back to other modules once the shortcut list is exhausted.
    pub strict: bool,
}

/// Resolves a capability request to a loaded module.
pub trait CapabilityLoader: Send + Sync {
    fn load_module(
        &self,
        owner: &InterfaceInstance,
        request: &ModuleRequest<'_>,
    ) -> Option<ModuleHandle>;

    fn unload_module(&self, owner: &InterfaceInstance, module: ModuleHandle);
}
