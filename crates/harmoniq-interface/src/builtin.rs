//! Interface modules shipped with the crate.

use anyhow::{bail, Result};
use tracing::{debug, info};

use crate::bank::{ModuleBank, ModuleDescriptor};
use crate::context::{InterfaceId, InterfaceInstance};
use crate::module::{InterfaceModule, INTERFACE_CAPABILITY};

/// Registers `dummy` and `logger` on `bank`.
pub fn register_builtin(bank: &ModuleBank) {
    bank.register(ModuleDescriptor::new("dummy", INTERFACE_CAPABILITY, 1, open_dummy));
    // Score 0: only started when asked for by name.
    bank.register(
        ModuleDescriptor::new("logger", INTERFACE_CAPABILITY, 0, open_logger).with_shortcut("log"),
    );
}

struct DummyInterface {
    id: InterfaceId,
}

fn open_dummy(owner: &InterfaceInstance) -> Result<Box<dyn InterfaceModule>> {
    debug!(interface = %owner.id(), "dummy interface opened");
    Ok(Box::new(DummyInterface { id: owner.id() }))
}

impl InterfaceModule for DummyInterface {
    fn close(self: Box<Self>) {
        debug!(interface = %self.id, "dummy interface closed");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogLevel {
    Info,
    Debug,
}

struct LoggerInterface {
    id: InterfaceId,
    level: LogLevel,
}

impl LoggerInterface {
    fn log(&self, message: &str) {
        match self.level {
            LogLevel::Info => info!(interface = %self.id, "{message}"),
            LogLevel::Debug => debug!(interface = %self.id, "{message}"),
        }
    }
}

fn open_logger(owner: &InterfaceInstance) -> Result<Box<dyn InterfaceModule>> {
    let level = match owner.config().get("level").unwrap_or("info") {
        "info" => LogLevel::Info,
        "debug" => LogLevel::Debug,
        other => bail!("unsupported logger level `{other}`"),
    };
    let logger = LoggerInterface {
        id: owner.id(),
        level,
    };
    logger.log("logger interface started");
    Ok(Box::new(logger))
}

impl InterfaceModule for LoggerInterface {
    fn close(self: Box<Self>) {
        self.log("logger interface stopped");
    }
}
