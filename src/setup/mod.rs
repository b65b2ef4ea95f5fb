//! Module set registration
//!
//! A module set is a self-contained feature unit that registers its handler
//! and output modules under one source label. [`Setup`] owns both
//! registries for the duration of startup and exposes the calls module sets
//! make; [`Setup::finish`] replays the deferred work and freezes the result
//! into [`PageAssignments`].
//!
//! ```rust
//! use modset::registry::Insertion;
//! use modset::setup::{Setup, module_set};
//!
//! let core = module_set("core", |setup: &mut Setup| {
//!     setup.add_handler(Insertion::new("mail", "list", true));
//!     setup.add_handler(Insertion::new("mail", "search", true));
//! });
//! let imap = module_set("imap", |setup: &mut Setup| {
//!     setup.add_handler(Insertion::new("mail", "folders", true).before("search"));
//! });
//!
//! let mut setup = Setup::new();
//! setup.register(&imap);
//! setup.register(&core);
//! let assignments = setup.finish();
//!
//! let order: Vec<_> = assignments.handlers.get_for_page("mail").iter().map(|e| e.name.as_str()).collect();
//! assert_eq!(order, ["list", "folders", "search"]);
//! ```

mod manifest;

pub use manifest::{AddStep, BroadcastStep, DeleteStep, ModuleSetManifest, ReplaceStep, Step};

use tracing::info;

use crate::dispatch::PageAssignments;
use crate::registry::{
    Anchor, DEFAULT_INTERNAL_PREFIX, HandlerRegistry, Insertion, ModuleType, OutputRegistry,
    PageTable, RegistrationError,
};

/// A feature unit that registers modules under its own source label
pub trait ModuleSet {
    fn source(&self) -> &str;

    fn register(&self, setup: &mut Setup);
}

/// Module set defined by a closure
pub struct FnModuleSet<F> {
    source: String,
    register: F,
}

/// Build a [`ModuleSet`] from a label and a registration closure
pub fn module_set<F>(source: impl Into<String>, register: F) -> FnModuleSet<F>
where
    F: Fn(&mut Setup),
{
    FnModuleSet {
        source: source.into(),
        register,
    }
}

impl<F: Fn(&mut Setup)> ModuleSet for FnModuleSet<F> {
    fn source(&self) -> &str {
        &self.source
    }

    fn register(&self, setup: &mut Setup) {
        (self.register)(setup)
    }
}

/// Both registries during startup
#[derive(Debug, Default)]
pub struct Setup {
    handlers: HandlerRegistry,
    outputs: OutputRegistry,
}

impl Setup {
    pub fn new() -> Self {
        Self::with_internal_prefix(DEFAULT_INTERNAL_PREFIX)
    }

    pub fn with_internal_prefix(prefix: &str) -> Self {
        Self {
            handlers: HandlerRegistry::with_internal_prefix(prefix),
            outputs: OutputRegistry::with_internal_prefix(prefix),
        }
    }

    /// Run one module set's registration pass under its source label
    pub fn register(&mut self, set: &dyn ModuleSet) {
        let source = set.source().to_string();
        info!(%source, "Registering module set");
        self.handler_source(&source);
        self.output_source(&source);
        set.register(self);
    }

    pub fn register_all<'a, I>(&mut self, sets: I)
    where
        I: IntoIterator<Item = &'a dyn ModuleSet>,
    {
        for set in sets {
            self.register(set);
        }
    }

    pub fn handler_source(&mut self, source: &str) {
        self.handlers.set_active_source(source);
    }

    pub fn output_source(&mut self, source: &str) {
        self.outputs.set_active_source(source);
    }

    pub fn add_handler(&mut self, insertion: Insertion) {
        self.handlers.add(insertion);
    }

    pub fn add_output(&mut self, insertion: Insertion) {
        self.outputs.add(insertion);
    }

    pub fn add_module(&mut self, kind: ModuleType, insertion: Insertion) {
        match kind {
            ModuleType::Handler => self.handlers.add(insertion),
            ModuleType::Output => self.outputs.add(insertion),
        }
    }

    /// Queue a module for every page that is not internal
    pub fn add_module_to_all_pages(
        &mut self,
        kind: ModuleType,
        name: &str,
        requires_login: bool,
        source: Option<&str>,
        anchor: Option<Anchor>,
    ) {
        let source = source.map(str::to_string);
        match kind {
            ModuleType::Handler => {
                self.handlers
                    .queue_for_all_pages(name, requires_login, anchor, source)
            }
            ModuleType::Output => {
                self.outputs
                    .queue_for_all_pages(name, requires_login, anchor, source)
            }
        }
    }

    /// Swap a registered module, on one page or all of them
    pub fn replace_module(
        &mut self,
        kind: ModuleType,
        target: &str,
        replacement: &str,
        page: Option<&str>,
    ) {
        match kind {
            ModuleType::Handler => self.handlers.replace(target, replacement, page),
            ModuleType::Output => self.outputs.replace(target, replacement, page),
        }
    }

    pub fn delete_module(&mut self, kind: ModuleType, page: &str, name: &str) {
        match kind {
            ModuleType::Handler => self.handlers.delete(page, name),
            ModuleType::Output => self.outputs.delete(page, name),
        }
    }

    /// Seed a registry from a previously dumped table
    pub fn load(&mut self, kind: ModuleType, table: PageTable) {
        match kind {
            ModuleType::Handler => self.handlers.load(table),
            ModuleType::Output => self.outputs.load(table),
        }
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    pub fn handlers_mut(&mut self) -> &mut HandlerRegistry {
        &mut self.handlers
    }

    pub fn outputs(&self) -> &OutputRegistry {
        &self.outputs
    }

    pub fn outputs_mut(&mut self) -> &mut OutputRegistry {
        &mut self.outputs
    }

    pub fn notices(&self) -> impl Iterator<Item = &RegistrationError> {
        self.handlers.notices().iter().chain(self.outputs.notices())
    }

    /// Replay retry queues, then broadcast queues, and freeze both tables
    pub fn finish(mut self) -> PageAssignments {
        self.handlers.try_queued_modules();
        self.outputs.try_queued_modules();
        self.handlers.process_all_page_queue();
        self.outputs.process_all_page_queue();

        info!(
            handlers = ?self.handlers.metrics(),
            outputs = ?self.outputs.metrics(),
            "Module registration finished"
        );

        PageAssignments {
            handlers: self.handlers.freeze(),
            outputs: self.outputs.freeze(),
        }
    }
}

/// Register every module set in order and freeze the result
pub fn build<'a, I>(sets: I, internal_prefix: &str) -> PageAssignments
where
    I: IntoIterator<Item = &'a dyn ModuleSet>,
{
    let mut setup = Setup::with_internal_prefix(internal_prefix);
    setup.register_all(sets);
    setup.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Entry;

    fn names(table: &PageTable, page: &str) -> Vec<String> {
        table
            .get_for_page(page)
            .iter()
            .map(|entry| entry.name.clone())
            .collect()
    }

    #[test]
    fn test_register_sets_both_sources() {
        let set = module_set("imap", |setup: &mut Setup| {
            setup.add_handler(Insertion::new("mail", "load_folders", true));
            setup.add_output(Insertion::new("mail", "folder_list", true));
        });

        let mut setup = Setup::new();
        setup.register(&set);

        assert_eq!(setup.handlers().active_source(), "imap");
        assert_eq!(setup.outputs().active_source(), "imap");
        assert_eq!(setup.handlers().get_for_page("mail")[0].source, "imap");
        assert_eq!(setup.outputs().get_for_page("mail")[0].source, "imap");
    }

    #[test]
    fn test_registries_are_independent() {
        let mut setup = Setup::new();
        setup.handler_source("core");
        setup.add_handler(Insertion::new("mail", "list", false));
        setup.add_output(Insertion::new("mail", "header", false).after("list"));

        assert_eq!(setup.outputs().pending().count(), 1);
        let assignments = setup.finish();

        assert_eq!(names(&assignments.handlers, "mail"), vec!["list"]);
        assert!(assignments.outputs.get_for_page("mail").is_empty());
    }

    #[test]
    fn test_retry_runs_before_broadcast() {
        let core = module_set("core", |setup: &mut Setup| {
            setup.add_module_to_all_pages(
                ModuleType::Output,
                "footer",
                false,
                None,
                Some(Anchor::after("content")),
            );
            setup.add_output(Insertion::new("home", "content", false));
        });
        let late = module_set("late", |setup: &mut Setup| {
            setup.add_output(Insertion::new("settings", "form", false).after("content"));
            setup.add_output(Insertion::new("settings", "content", false));
        });

        let assignments = build([&core as &dyn ModuleSet, &late], "ajax_");

        assert_eq!(names(&assignments.outputs, "home"), vec!["content", "footer"]);
        assert_eq!(
            names(&assignments.outputs, "settings"),
            vec!["content", "footer", "form"]
        );
        assert_eq!(assignments.outputs.get_for_page("home")[1].source, "core");
    }

    #[test]
    fn test_replace_and_delete_by_kind() {
        let mut setup = Setup::new();
        setup.handler_source("core");
        setup.output_source("core");
        setup.add_handler(Insertion::new("mail", "login", false));
        setup.add_output(Insertion::new("mail", "login", false));

        setup.handler_source("oauth");
        setup.replace_module(ModuleType::Handler, "login", "oauth_login", None);
        setup.delete_module(ModuleType::Output, "mail", "login");

        let assignments = setup.finish();
        assert_eq!(
            assignments.handlers.get_for_page("mail"),
            &[Entry::new("oauth_login", "oauth", false)]
        );
        assert!(assignments.outputs.get_for_page("mail").is_empty());
    }

    #[test]
    fn test_load_seeds_registry() {
        let mut seeded = Setup::new();
        seeded.handler_source("core");
        seeded.add_handler(Insertion::new("mail", "list", false));
        let table = seeded.finish().handlers;

        let mut setup = Setup::new();
        setup.load(ModuleType::Handler, table);
        setup.handler_source("imap");
        setup.add_handler(Insertion::new("mail", "folders", true).before("list"));

        let assignments = setup.finish();
        assert_eq!(names(&assignments.handlers, "mail"), vec!["folders", "list"]);
    }

    #[test]
    fn test_notices_cover_both_registries() {
        let mut setup = Setup::new();
        setup.add_handler(Insertion::new("mail", "a", false));
        setup.add_handler(Insertion::new("mail", "a", false));
        setup.add_output(Insertion::new("mail", "b", false));
        setup.add_output(Insertion::new("mail", "b", false));

        assert_eq!(setup.notices().count(), 2);
    }
}
