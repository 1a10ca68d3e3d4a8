//! Interface management for Harmoniq Studio.
//!
//! An [`InterfaceContext`] owns every user interface started on it, a shared
//! [`Playlist`](harmoniq_playlist::Playlist) created on first access and the
//! module loader used to resolve interface chains. Each interface exposes an
//! `intf-add` command variable that starts further interfaces when written.

mod bank;
mod builtin;
pub mod chain;
mod choices;
mod context;
mod error;
mod module;
pub mod settings;
mod variable;

pub use bank::{ModuleBank, ModuleDescriptor};
pub use builtin::register_builtin;
pub use chain::{parse_chain, ChainError, ConfigChain, ConfigOption, ParsedChain};
pub use choices::{
    add_interface_choices, Environment, ADD_INTERFACE_TEXT, ADD_INTERFACE_VARIABLE, CONSOLE_CHOICE,
};
pub use context::{
    ContextId, EmptyPlaylist, InterfaceContext, InterfaceContextBuilder, InterfaceId,
    InterfaceInstance, PlaylistFactory,
};
pub use error::InterfaceError;
pub use module::{
    CapabilityLoader, InterfaceModule, ModuleHandle, ModuleRequest, INTERFACE_CAPABILITY,
};
pub use settings::{InterfaceSettings, SettingsError};
pub use variable::{Choice, CommandVariable, VariableFlags};
