use thiserror::Error;

/// Recoverable failures reported when starting an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InterfaceError {
    /// A fallible reservation for the interface state failed: the choice
    /// list or the copy of the chain string. Nothing was created. Other
    /// allocations abort the process on exhaustion like any Rust allocation.
    #[error("out of memory while allocating interface")]
    OutOfMemory,
    /// No loadable module matched the requested chain.
    #[error("no suitable interface module")]
    NoSuitableModule,
    /// A command variable was written through a context that does not own it.
    #[error("command variable belongs to another context")]
    ForeignContext,
}
