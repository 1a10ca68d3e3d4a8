use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::context::{ContextId, InterfaceContext};
use crate::InterfaceError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VariableFlags {
    /// The variable publishes a list of suggested values.
    pub has_choices: bool,
    /// Writing the variable performs an action.
    pub is_command: bool,
}

/// Suggested value with a human readable label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

type Callback = dyn Fn(&InterfaceContext, &str) -> Result<(), InterfaceError> + Send + Sync;

/// Observable string variable attached to an interface.
///
/// Callbacks run synchronously on the writing thread, in registration
/// order, without any variable lock held. Only the context that created the
/// variable may write it.
pub struct CommandVariable {
    context: ContextId,
    name: String,
    text: String,
    flags: VariableFlags,
    choices: Vec<Choice>,
    value: Mutex<String>,
    callbacks: Mutex<Vec<Arc<Callback>>>,
}

impl CommandVariable {
    pub fn new(
        context: ContextId,
        name: impl Into<String>,
        text: impl Into<String>,
        flags: VariableFlags,
        choices: Vec<Choice>,
    ) -> Self {
        Self {
            context,
            name: name.into(),
            text: text.into(),
            flags,
            choices,
            value: Mutex::new(String::new()),
            callbacks: Mutex::new(Vec::new()),
        }
    }

    /// Context that owns the variable.
    pub fn context(&self) -> ContextId {
        self.context
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn flags(&self) -> VariableFlags {
        self.flags
    }

    pub fn choices(&self) -> &[Choice] {
        &self.choices
    }

    pub fn has_choice(&self, value: &str) -> bool {
        self.choices.iter().any(|choice| choice.value == value)
    }

    /// Last value written to the variable.
    pub fn value(&self) -> String {
        self.value.lock().clone()
    }

    pub fn add_callback<F>(&self, callback: F)
    where
        F: Fn(&InterfaceContext, &str) -> Result<(), InterfaceError> + Send + Sync + 'static,
    {
        self.callbacks.lock().push(Arc::new(callback));
    }

    /// Stores `value` and triggers the callbacks. The first failing callback
    /// stops the dispatch and its error is returned to the writer.
    ///
    /// Writes through any context other than the owner are rejected and
    /// leave the variable untouched.
    pub fn set(&self, context: &InterfaceContext, value: &str) -> Result<(), InterfaceError> {
        if context.id() != self.context {
            return Err(InterfaceError::ForeignContext);
        }
        *self.value.lock() = value.to_string();
        let callbacks = self.callbacks.lock().clone();
        for callback in callbacks {
            callback(context, value)?;
        }
        Ok(())
    }
}

impl fmt::Debug for CommandVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandVariable")
            .field("context", &self.context)
            .field("name", &self.name)
            .field("text", &self.text)
            .field("flags", &self.flags)
            .field("choices", &self.choices)
            .field("callbacks", &self.callbacks.lock().len())
            .finish()
    }
}
