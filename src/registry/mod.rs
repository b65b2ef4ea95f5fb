//! Page module registry
//!
//! Assigns named handler and output modules to pages and keeps them in
//! execution order.
//!
//! ## Key Components
//!
//! - [`Registry`] - Generic registry, instantiated as [`HandlerRegistry`] and [`OutputRegistry`]
//! - [`PageTable`] - Resolved page to ordered-module mapping
//! - [`Insertion`] - A request to place one module, optionally next to a marker
//! - [`ReplayQueue`] - Retry and broadcast queues, replayed exactly once
//! - [`RegistrationError`] - Non-fatal notices for rejected or dropped modules
//!
//! ## Example
//!
//! ```rust
//! use modset::registry::{HandlerRegistry, Insertion};
//!
//! let mut handlers = HandlerRegistry::new();
//! handlers.set_active_source("imap");
//! handlers.add(Insertion::new("mail", "folders", true).before("search"));
//!
//! handlers.set_active_source("core");
//! handlers.add(Insertion::new("mail", "list", true));
//! handlers.add(Insertion::new("mail", "search", true));
//! handlers.try_queued_modules();
//!
//! let order: Vec<_> = handlers.get_for_page("mail").iter().map(|e| e.name.as_str()).collect();
//! assert_eq!(order, ["list", "folders", "search"]);
//! ```

mod entry;
mod error;
mod kind;
mod modules;
mod queue;
mod table;

pub use entry::{Anchor, BroadcastDirective, Entry, Insertion, PendingInsertion, Placement};
pub use error::RegistrationError;
pub use kind::{Handler, ModuleKind, ModuleType, Output};
pub use modules::{DEFAULT_INTERNAL_PREFIX, HandlerRegistry, OutputRegistry, Registry};
pub use queue::{BroadcastQueue, ReplayQueue, RetryQueue};
pub use table::{PageModules, PageTable};
