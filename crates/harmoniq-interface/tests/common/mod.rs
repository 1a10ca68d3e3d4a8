#![allow(dead_code)]

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use harmoniq_interface::{
    CapabilityLoader, Environment, InterfaceContext, InterfaceId, InterfaceInstance,
    InterfaceModule, ModuleHandle, ModuleRequest,
};
use harmoniq_playlist::Playlist;
use parking_lot::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderEvent {
    Loaded(InterfaceId, String),
    Unloaded(InterfaceId, String),
}

struct MockModule;

impl InterfaceModule for MockModule {}

/// Loader that knows a fixed set of module names and records every call.
/// Chains without a name load `default`.
pub struct MockLoader {
    known: Vec<&'static str>,
    events: Mutex<Vec<LoaderEvent>>,
}

impl MockLoader {
    pub fn new(known: &[&'static str]) -> Arc<Self> {
        Arc::new(Self {
            known: known.to_vec(),
            events: Mutex::new(Vec::new()),
        })
    }

    pub fn events(&self) -> Vec<LoaderEvent> {
        self.events.lock().clone()
    }

    pub fn unloaded(&self) -> Vec<InterfaceId> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                LoaderEvent::Unloaded(id, _) => Some(*id),
                LoaderEvent::Loaded(..) => None,
            })
            .collect()
    }

    pub fn loaded(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|event| matches!(event, LoaderEvent::Loaded(..)))
            .count()
    }
}

impl CapabilityLoader for MockLoader {
    fn load_module(
        &self,
        owner: &InterfaceInstance,
        request: &ModuleRequest<'_>,
    ) -> Option<ModuleHandle> {
        let name = request.name_hint.unwrap_or("default");
        if !self.known.contains(&name) {
            return None;
        }
        self.events
            .lock()
            .push(LoaderEvent::Loaded(owner.id(), name.to_string()));
        Some(ModuleHandle::new(name, Box::new(MockModule)))
    }

    fn unload_module(&self, owner: &InterfaceInstance, module: ModuleHandle) {
        self.events
            .lock()
            .push(LoaderEvent::Unloaded(owner.id(), module.name().to_string()));
        module.close();
    }
}

pub fn context(loader: &Arc<MockLoader>) -> InterfaceContext {
    InterfaceContext::builder(loader.clone())
        .name("test")
        .environment(|| Environment {
            stdin_is_terminal: false,
        })
        .build()
}

/// Counts playlist constructions.
pub fn counting_factory(
    counter: &Arc<AtomicUsize>,
) -> impl Fn(&str) -> Result<Playlist, harmoniq_playlist::PlaylistError> + Send + Sync + 'static {
    let counter = Arc::clone(counter);
    move |owner: &str| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Playlist::new(owner))
    }
}

#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs `f` with a subscriber that writes plain text into a buffer.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    let logs = String::from_utf8_lossy(&buffer.0.lock()).into_owned();
    (result, logs)
}
