//! Per-context registry of running interfaces.
//!
//! Every interface started on a context is linked at the head of a singly
//! linked ownership chain. One mutex guards insertion, detachment and the
//! lazy construction of the shared playlist. Teardown detaches the whole
//! chain under the lock and unloads the modules after releasing it.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use harmoniq_playlist::{Playlist, PlaylistError};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::chain::{parse_chain, ConfigChain};
use crate::choices::{add_interface_choices, Environment, ADD_INTERFACE_TEXT, ADD_INTERFACE_VARIABLE};
use crate::module::{CapabilityLoader, ModuleHandle, ModuleRequest, INTERFACE_CAPABILITY};
use crate::settings::InterfaceSettings;
use crate::variable::{CommandVariable, VariableFlags};
use crate::InterfaceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InterfaceId(pub u64);

impl InterfaceId {
    fn next(counter: &AtomicU64) -> Self {
        InterfaceId(counter.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

impl fmt::Display for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "intf#{}", self.0)
    }
}

/// Identity of an [`InterfaceContext`], unique within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

impl ContextId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ContextId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

type Link = Option<Box<InterfaceInstance>>;

/// One running interface, owned by the context's registry.
pub struct InterfaceInstance {
    id: InterfaceId,
    chain: String,
    config: ConfigChain,
    add_interface: Arc<CommandVariable>,
    module: Option<ModuleHandle>,
    next: Link,
}

impl InterfaceInstance {
    pub fn id(&self) -> InterfaceId {
        self.id
    }

    /// Chain string the interface was started from.
    pub fn chain(&self) -> &str {
        &self.chain
    }

    pub fn config(&self) -> &ConfigChain {
        &self.config
    }

    pub fn add_interface(&self) -> &Arc<CommandVariable> {
        &self.add_interface
    }

    pub fn module_name(&self) -> Option<&str> {
        self.module.as_ref().map(ModuleHandle::name)
    }
}

impl fmt::Debug for InterfaceInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterfaceInstance")
            .field("id", &self.id)
            .field("chain", &self.chain)
            .field("config", &self.config)
            .field("module", &self.module_name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
impl InterfaceInstance {
    pub(crate) fn detached(id: u64, chain: &str) -> Self {
        Self {
            id: InterfaceId(id),
            chain: chain.to_string(),
            config: ConfigChain::default(),
            add_interface: Arc::new(CommandVariable::new(
                ContextId::next(),
                ADD_INTERFACE_VARIABLE,
                ADD_INTERFACE_TEXT,
                VariableFlags::default(),
                Vec::new(),
            )),
            module: None,
            next: None,
        }
    }
}

/// Builds the playlist shared by all interfaces of a context.
pub trait PlaylistFactory: Send + Sync {
    fn create_playlist(&self, owner: &str) -> Result<Playlist, PlaylistError>;
}

impl<F> PlaylistFactory for F
where
    F: Fn(&str) -> Result<Playlist, PlaylistError> + Send + Sync,
{
    fn create_playlist(&self, owner: &str) -> Result<Playlist, PlaylistError> {
        self(owner)
    }
}

/// Starts every context with an empty playlist.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyPlaylist;

impl PlaylistFactory for EmptyPlaylist {
    fn create_playlist(&self, owner: &str) -> Result<Playlist, PlaylistError> {
        Ok(Playlist::new(owner))
    }
}

type EnvironmentProbe = dyn Fn() -> Environment + Send + Sync;

pub struct InterfaceContextBuilder {
    name: String,
    loader: Arc<dyn CapabilityLoader>,
    playlist_factory: Box<dyn PlaylistFactory>,
    environment: Box<EnvironmentProbe>,
}

impl InterfaceContextBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn playlist_factory(mut self, factory: impl PlaylistFactory + 'static) -> Self {
        self.playlist_factory = Box::new(factory);
        self
    }

    /// Replaces terminal detection, which runs once per created interface.
    pub fn environment<F>(mut self, probe: F) -> Self
    where
        F: Fn() -> Environment + Send + Sync + 'static,
    {
        self.environment = Box::new(probe);
        self
    }

    pub fn build(self) -> InterfaceContext {
        InterfaceContext {
            id: ContextId::next(),
            name: self.name,
            loader: self.loader,
            playlist_factory: self.playlist_factory,
            environment: self.environment,
            next_id: AtomicU64::new(0),
            registry: Mutex::new(Registry { head: None }),
            playlist: OnceCell::new(),
        }
    }
}

struct Registry {
    /// Most recently created interface first.
    head: Link,
}

impl Registry {
    fn iter(&self) -> impl Iterator<Item = &InterfaceInstance> {
        std::iter::successors(self.head.as_deref(), |instance| instance.next.as_deref())
    }
}

pub struct InterfaceContext {
    id: ContextId,
    name: String,
    loader: Arc<dyn CapabilityLoader>,
    playlist_factory: Box<dyn PlaylistFactory>,
    environment: Box<EnvironmentProbe>,
    next_id: AtomicU64,
    registry: Mutex<Registry>,
    playlist: OnceCell<Playlist>,
}

impl InterfaceContext {
    pub fn new(loader: Arc<dyn CapabilityLoader>) -> Self {
        Self::builder(loader).build()
    }

    pub fn builder(loader: Arc<dyn CapabilityLoader>) -> InterfaceContextBuilder {
        InterfaceContextBuilder {
            name: "main".to_string(),
            loader,
            playlist_factory: Box::new(EmptyPlaylist),
            environment: Box::new(Environment::detect),
        }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Starts the interface described by `chain` and links it into the
    /// registry. On error nothing is linked.
    pub fn create(&self, chain: &str) -> Result<InterfaceId, InterfaceError> {
        let environment = (self.environment)();
        let choices = add_interface_choices(&environment)?;
        let add_interface = Arc::new(CommandVariable::new(
            self.id,
            ADD_INTERFACE_VARIABLE,
            ADD_INTERFACE_TEXT,
            VariableFlags {
                has_choices: true,
                is_command: true,
            },
            choices,
        ));
        add_interface.add_callback(add_interface_callback);

        let (name, config) = match parse_chain(chain) {
            Ok(parsed) => (parsed.name, parsed.config),
            Err(err) => {
                warn!(context = %self.name, chain, %err, "invalid interface chain");
                (None, ConfigChain::default())
            }
        };

        let mut instance = Box::new(InterfaceInstance {
            id: InterfaceId::next(&self.next_id),
            chain: try_copy(chain)?,
            config,
            add_interface,
            module: None,
            next: None,
        });

        let request = ModuleRequest {
            capability: INTERFACE_CAPABILITY,
            name_hint: name.as_deref(),
            strict: true,
        };
        let Some(module) = self.loader.load_module(&instance, &request) else {
            error!(context = %self.name, chain, "no suitable interface module");
            return Err(InterfaceError::NoSuitableModule);
        };

        let id = instance.id;
        info!(context = %self.name, interface = %id, module = module.name(), "interface started");
        instance.module = Some(module);

        let mut registry = self.registry.lock();
        instance.next = registry.head.take();
        registry.head = Some(instance);
        Ok(id)
    }

    /// Shared playlist, built on first use.
    ///
    /// Aborts the process when the playlist cannot be created.
    pub fn playlist(&self) -> &Playlist {
        let _registry = self.registry.lock();
        self.playlist
            .get_or_init(|| match self.playlist_factory.create_playlist(&self.name) {
                Ok(playlist) => {
                    debug!(context = %self.name, items = playlist.len(), "playlist created");
                    playlist
                }
                Err(err) => {
                    error!(context = %self.name, %err, "failed to create playlist");
                    std::process::abort()
                }
            })
    }

    /// Stops and frees every registered interface, most recent first.
    /// Returns how many were destroyed.
    pub fn destroy_all(&self) -> usize {
        let mut link = self.registry.lock().head.take();

        let mut destroyed = 0;
        while let Some(mut instance) = link {
            link = instance.next.take();
            if let Some(module) = instance.module.take() {
                self.loader.unload_module(&instance, module);
            }
            debug!(context = %self.name, interface = %instance.id, "interface destroyed");
            destroyed += 1;
        }

        if destroyed > 0 {
            info!(context = %self.name, destroyed, "interfaces stopped");
        }
        destroyed
    }

    /// Starts the primary interface followed by the extra and control ones.
    ///
    /// Only a primary failure is reported; secondary interfaces that fail to
    /// start are logged and skipped.
    pub fn start_interfaces(
        &self,
        settings: &InterfaceSettings,
    ) -> Result<Vec<InterfaceId>, InterfaceError> {
        let chains = settings.chains();
        let Some((primary, secondary)) = chains.split_first() else {
            return Ok(Vec::new());
        };

        let mut started = vec![self.create(primary)?];
        for chain in secondary {
            match self.create(chain) {
                Ok(id) => started.push(id),
                Err(err) => warn!(context = %self.name, chain, %err, "skipping interface"),
            }
        }
        Ok(started)
    }

    pub fn len(&self) -> usize {
        self.registry.lock().iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.lock().head.is_none()
    }

    /// Registered interfaces, most recent first.
    pub fn interface_ids(&self) -> Vec<InterfaceId> {
        self.registry.lock().iter().map(InterfaceInstance::id).collect()
    }

    pub fn module_name(&self, id: InterfaceId) -> Option<String> {
        self.registry
            .lock()
            .iter()
            .find(|instance| instance.id == id)
            .and_then(|instance| instance.module_name().map(str::to_string))
    }

    /// The "add interface" command variable of interface `id`.
    pub fn add_interface_variable(&self, id: InterfaceId) -> Option<Arc<CommandVariable>> {
        self.registry
            .lock()
            .iter()
            .find(|instance| instance.id == id)
            .map(|instance| Arc::clone(&instance.add_interface))
    }
}

impl fmt::Debug for InterfaceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterfaceContext")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("interfaces", &self.interface_ids())
            .field("playlist", &self.playlist.get().is_some())
            .finish_non_exhaustive()
    }
}

impl Drop for InterfaceContext {
    fn drop(&mut self) {
        self.destroy_all();
    }
}

/// Copies `text` through a fallible reservation.
fn try_copy(text: &str) -> Result<String, InterfaceError> {
    let mut copy = String::new();
    copy.try_reserve_exact(text.len())
        .map_err(|_| InterfaceError::OutOfMemory)?;
    copy.push_str(text);
    Ok(copy)
}

fn add_interface_callback(context: &InterfaceContext, chain: &str) -> Result<(), InterfaceError> {
    context.create(chain).map(drop).map_err(|err| {
        error!(context = %context.name, chain, %err, "interface \"{chain}\" initialization failed");
        err
    })
}
