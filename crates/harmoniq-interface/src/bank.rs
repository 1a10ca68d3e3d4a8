//! In-process catalogue of interface modules.
//!
//! Modules register a descriptor with a score and an activation closure. A
//! lookup walks the requested shortcut list (`rc,telnet,none`), where `any`
//! expands to every module of the capability ordered by score and `none`
//! stops the search.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::context::InterfaceInstance;
use crate::module::{CapabilityLoader, InterfaceModule, ModuleHandle, ModuleRequest};

type ActivateFn = dyn Fn(&InterfaceInstance) -> anyhow::Result<Box<dyn InterfaceModule>> + Send + Sync;

pub struct ModuleDescriptor {
    name: String,
    shortcuts: Vec<String>,
    capability: String,
    score: i32,
    activate: Box<ActivateFn>,
}

impl ModuleDescriptor {
    pub fn new<F>(name: impl Into<String>, capability: impl Into<String>, score: i32, activate: F) -> Self
    where
        F: Fn(&InterfaceInstance) -> anyhow::Result<Box<dyn InterfaceModule>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            shortcuts: Vec::new(),
            capability: capability.into(),
            score,
            activate: Box::new(activate),
        }
    }

    pub fn with_shortcut(mut self, shortcut: impl Into<String>) -> Self {
        self.shortcuts.push(shortcut.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capability(&self) -> &str {
        &self.capability
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    fn matches(&self, shortcut: &str) -> bool {
        self.name.eq_ignore_ascii_case(shortcut)
            || self
                .shortcuts
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(shortcut))
    }
}

impl fmt::Debug for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("name", &self.name)
            .field("shortcuts", &self.shortcuts)
            .field("capability", &self.capability)
            .field("score", &self.score)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct ModuleBank {
    modules: RwLock<Vec<Arc<ModuleDescriptor>>>,
}

impl ModuleBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, descriptor: ModuleDescriptor) {
        debug!(
            module = %descriptor.name,
            capability = %descriptor.capability,
            score = descriptor.score,
            "module registered"
        );
        self.modules.write().push(Arc::new(descriptor));
    }

    /// Modules providing `capability`, best score first. Ties keep
    /// registration order.
    pub fn modules(&self, capability: &str) -> Vec<Arc<ModuleDescriptor>> {
        let mut modules: Vec<_> = self
            .modules
            .read()
            .iter()
            .filter(|module| module.capability == capability)
            .cloned()
            .collect();
        modules.sort_by(|a, b| b.score.cmp(&a.score));
        modules
    }

    fn activate(&self, module: &ModuleDescriptor, owner: &InterfaceInstance) -> Option<ModuleHandle> {
        match (module.activate)(owner) {
            Ok(instance) => Some(ModuleHandle::new(module.name.clone(), instance)),
            Err(err) => {
                debug!(
                    interface = %owner.id(),
                    module = %module.name,
                    error = %format!("{err:#}"),
                    "module activation failed"
                );
                None
            }
        }
    }

    fn activate_any(
        &self,
        candidates: &[Arc<ModuleDescriptor>],
        owner: &InterfaceInstance,
    ) -> Option<ModuleHandle> {
        candidates
            .iter()
            .filter(|module| module.score > 0)
            .find_map(|module| self.activate(module, owner))
    }
}

impl CapabilityLoader for ModuleBank {
    fn load_module(
        &self,
        owner: &InterfaceInstance,
        request: &ModuleRequest<'_>,
    ) -> Option<ModuleHandle> {
        // Snapshot so activation code may register further modules.
        let candidates = self.modules(request.capability);
        let Some(hint) = request.name_hint.map(str::trim).filter(|hint| !hint.is_empty()) else {
            return self.activate_any(&candidates, owner);
        };

        for shortcut in hint.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if shortcut.eq_ignore_ascii_case("any") {
                return self.activate_any(&candidates, owner);
            }
            if shortcut.eq_ignore_ascii_case("none") {
                return None;
            }
            let found = candidates
                .iter()
                .filter(|module| module.matches(shortcut))
                .find_map(|module| self.activate(module, owner));
            if found.is_some() {
                return found;
            }
        }

        if request.strict {
            None
        } else {
            self.activate_any(&candidates, owner)
        }
    }

    fn unload_module(&self, owner: &InterfaceInstance, module: ModuleHandle) {
        debug!(interface = %owner.id(), module = module.name(), "unloading module");
        module.close();
    }
}
