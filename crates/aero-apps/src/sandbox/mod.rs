//! Capability-scoped execution environment for application modules.
//!
//! A module never sees ambient globals: it receives one [`SandboxEnv`] with
//! a document view, a scoped console, and an exports slot, and nothing else.

mod console;
mod surface;

pub use console::{BufferSink, ConsoleSink, ScopedConsole, TracingSink};
pub use surface::{DocumentSurface, HostSurface, MemorySurface, NodeId};

use std::cell::RefCell;
use std::rc::Rc;

use crate::app::AppDefinition;

/// Shared exports slot; one per registered module name.
pub(crate) type ExportSlot = Rc<RefCell<Option<Box<dyn AppDefinition>>>>;

/// Everything a module execution may touch.
pub struct SandboxEnv {
    name: String,
    pub document: DocumentSurface,
    pub console: ScopedConsole,
    exports: ExportSlot,
}

impl SandboxEnv {
    pub(crate) fn new(
        name: impl Into<String>,
        document: DocumentSurface,
        console: ScopedConsole,
        exports: ExportSlot,
    ) -> Self {
        Self {
            name: name.into(),
            document,
            console,
            exports,
        }
    }

    /// Module name this environment was built for.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Publish the module's application surface.
    pub fn set_exports(&mut self, app: Box<dyn AppDefinition>) {
        *self.exports.borrow_mut() = Some(app);
    }
}
