use std::marker::PhantomData;
use tracing::{debug, info, warn};

use super::entry::{Anchor, BroadcastDirective, Entry, Insertion, PendingInsertion};
use super::error::RegistrationError;
use super::kind::{Handler, ModuleKind, ModuleType, Output};
use super::queue::{BroadcastQueue, RetryQueue};
use super::table::{PageModules, PageTable};
use crate::observability::{Metrics, MetricsSnapshot};

/// Page ids with this prefix are internal endpoints skipped by broadcasts
pub const DEFAULT_INTERNAL_PREFIX: &str = "ajax_";

/// Registry of handler modules
pub type HandlerRegistry = Registry<Handler>;

/// Registry of output modules
pub type OutputRegistry = Registry<Output>;

/// Page-to-module assignments for one kind of module
///
/// Built by a strictly sequential series of registration calls. Once every
/// module set has registered, [`Registry::try_queued_modules`] and
/// [`Registry::process_all_page_queue`] run once each, and
/// [`Registry::freeze`] hands back the read-only [`PageTable`].
///
/// None of the operations fail: rejected or dropped modules are logged and
/// kept as [`RegistrationError`] notices.
#[derive(Debug)]
pub struct Registry<K: ModuleKind> {
    table: PageTable,
    active_source: String,
    internal_prefix: String,
    retry: RetryQueue,
    broadcast: BroadcastQueue,
    notices: Vec<RegistrationError>,
    metrics: Metrics,
    _kind: PhantomData<K>,
}

enum Swap {
    Absent,
    Taken,
    Done,
}

impl<K: ModuleKind> Registry<K> {
    pub fn new() -> Self {
        Self::with_internal_prefix(DEFAULT_INTERNAL_PREFIX)
    }

    pub fn with_internal_prefix(prefix: impl Into<String>) -> Self {
        Self {
            table: PageTable::new(),
            active_source: String::new(),
            internal_prefix: prefix.into(),
            retry: RetryQueue::new(),
            broadcast: BroadcastQueue::new(),
            notices: Vec::new(),
            metrics: Metrics::new(),
            _kind: PhantomData,
        }
    }

    pub fn kind(&self) -> ModuleType {
        K::KIND
    }

    /// Label of the module set currently registering
    pub fn set_active_source(&mut self, source: impl Into<String>) {
        self.active_source = source.into();
        debug!(kind = %K::KIND, source = %self.active_source, "Active source set");
    }

    pub fn active_source(&self) -> &str {
        &self.active_source
    }

    /// Whether `page` is internal and excluded from broadcasts
    pub fn is_internal_page(&self, page: &str) -> bool {
        page.starts_with(&self.internal_prefix)
    }

    /// Place a module on a page
    ///
    /// The page is created if it does not exist yet. A name already present
    /// on the page is rejected. Without an anchor the module is appended;
    /// with one it is inserted next to the marker, or deferred to the retry
    /// queue when the marker is missing and `queue_on_failure` is set.
    pub fn add(&mut self, insertion: Insertion) {
        let Insertion {
            page,
            name,
            requires_login,
            anchor,
            queue_on_failure,
            source,
        } = insertion;

        let source = source.unwrap_or_else(|| self.active_source.clone());
        let modules = self.table.page_or_create(&page);

        if modules.contains(&name) {
            self.reject(page, name);
            return;
        }

        let Some(anchor) = anchor else {
            modules.push(Entry::new(name.clone(), source, requires_login));
            self.inserted(&page, &name, None);
            return;
        };

        match modules.resolve_marker(&anchor.marker, anchor.placement) {
            Some(index) => {
                modules.insert(index, Entry::new(name.clone(), source, requires_login));
                self.inserted(&page, &name, Some(&anchor));
            }
            None => {
                let pending = PendingInsertion {
                    page,
                    name,
                    requires_login,
                    anchor,
                    source,
                };
                if queue_on_failure {
                    self.defer(pending);
                } else {
                    self.drop_insertion(pending);
                }
            }
        }
    }

    pub fn insert_before(
        &mut self,
        page: impl Into<String>,
        name: impl Into<String>,
        requires_login: bool,
        marker: impl Into<String>,
    ) {
        self.add(Insertion::new(page, name, requires_login).before(marker));
    }

    pub fn insert_after(
        &mut self,
        page: impl Into<String>,
        name: impl Into<String>,
        requires_login: bool,
        marker: impl Into<String>,
    ) {
        self.add(Insertion::new(page, name, requires_login).after(marker));
    }

    /// Swap `target` for `replacement` on one page, or on every page holding it
    ///
    /// The entry keeps its position and `requires_login`; its source becomes
    /// the active source of whoever performs the replacement.
    pub fn replace(&mut self, target: &str, replacement: &str, page: Option<&str>) {
        let source = self.active_source.clone();
        let mut outcomes = Vec::new();

        match page {
            Some(page) => {
                if let Some(modules) = self.table.page_mut(page) {
                    outcomes.push((page.to_string(), swap(modules, target, replacement, &source)));
                }
            }
            None => {
                for (page, modules) in self.table.pages_mut() {
                    outcomes.push((page.to_string(), swap(modules, target, replacement, &source)));
                }
            }
        }

        for (page, outcome) in outcomes {
            match outcome {
                Swap::Absent => {}
                Swap::Done => {
                    debug!(
                        kind = %K::KIND,
                        %page,
                        replaced = target,
                        replacement,
                        %source,
                        "Module replaced"
                    );
                    self.metrics.module_replaced();
                }
                Swap::Taken => {
                    let notice = RegistrationError::ReplacementTaken {
                        kind: K::KIND,
                        page,
                        target: target.to_string(),
                        replacement: replacement.to_string(),
                    };
                    warn!(kind = %K::KIND, "{notice}");
                    self.notices.push(notice);
                }
            }
        }
    }

    /// Remove a module from a page; unknown pages and names are ignored
    pub fn delete(&mut self, page: &str, name: &str) {
        let removed = self
            .table
            .page_mut(page)
            .and_then(|modules| modules.remove(name));

        if removed.is_some() {
            debug!(kind = %K::KIND, page, module = name, "Module deleted");
            self.metrics.module_deleted();
        }
    }

    /// Ordered modules of `page`, empty when the page is unknown
    pub fn get_for_page(&self, page: &str) -> &[Entry] {
        self.table.get_for_page(page)
    }

    pub fn dump(&self) -> &PageTable {
        &self.table
    }

    /// Replace the whole table with a previously dumped one
    ///
    /// Duplicate names within a page keep their first occurrence.
    pub fn load(&mut self, table: PageTable) {
        self.table = table
            .iter()
            .map(|(page, modules)| {
                let deduped: PageModules = modules.entries().iter().cloned().collect();
                (page.to_string(), deduped)
            })
            .collect();
        info!(kind = %K::KIND, pages = self.table.len(), "Module table loaded");
    }

    /// Queue a module for every non-internal page
    ///
    /// Nothing changes until [`Registry::process_all_page_queue`] runs. The
    /// source is resolved now, so the replay attributes the module to the
    /// module set that queued it.
    pub fn queue_for_all_pages(
        &mut self,
        name: impl Into<String>,
        requires_login: bool,
        anchor: Option<Anchor>,
        source: Option<String>,
    ) {
        let directive = BroadcastDirective {
            name: name.into(),
            requires_login,
            anchor,
            source: source.unwrap_or_else(|| self.active_source.clone()),
        };

        if let Err(directive) = self.broadcast.push(directive) {
            warn!(
                kind = %K::KIND,
                module = %directive.name,
                "All-pages queue already processed, module ignored"
            );
            self.metrics.module_dropped();
        }
    }

    /// Apply every queued broadcast to the pages known right now
    pub fn process_all_page_queue(&mut self) {
        let directives = self.broadcast.drain();
        if directives.is_empty() {
            return;
        }

        let pages: Vec<String> = self
            .table
            .pages()
            .filter(|page| !self.is_internal_page(page))
            .map(str::to_string)
            .collect();

        info!(
            kind = %K::KIND,
            directives = directives.len(),
            pages = pages.len(),
            "Processing all-pages queue"
        );

        for directive in &directives {
            for page in &pages {
                self.add(directive.for_page(page));
            }
        }
    }

    /// Retry deferred insertions once, in the order they were queued
    ///
    /// A marker still missing now drops the module for good. Deferred
    /// insertions that anchor on each other only resolve when queued in
    /// dependency order.
    pub fn try_queued_modules(&mut self) {
        let pending = self.retry.drain();
        if pending.is_empty() {
            return;
        }

        info!(kind = %K::KIND, pending = pending.len(), "Retrying queued modules");

        for insertion in pending {
            self.add(
                Insertion::new(insertion.page, insertion.name, insertion.requires_login)
                    .anchored(Some(insertion.anchor))
                    .source(insertion.source)
                    .queue_on_failure(false),
            );
        }
    }

    /// Insertions still waiting for a marker
    pub fn pending(&self) -> impl Iterator<Item = &PendingInsertion> {
        self.retry.iter()
    }

    /// Every rejection, deferral and drop recorded so far
    pub fn notices(&self) -> &[RegistrationError] {
        &self.notices
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Finish registration and return the read-only table
    ///
    /// Queues not replayed yet are replayed first (retry, then broadcast),
    /// so nothing queued is lost silently.
    pub fn freeze(mut self) -> PageTable {
        if !self.retry.is_replayed() {
            self.try_queued_modules();
        }
        if !self.broadcast.is_replayed() {
            self.process_all_page_queue();
        }

        let dropped = self.notices.iter().filter(|n| n.is_terminal()).count();
        info!(
            kind = %K::KIND,
            pages = self.table.len(),
            dropped,
            "Module table frozen"
        );
        self.table
    }

    fn inserted(&self, page: &str, name: &str, anchor: Option<&Anchor>) {
        match anchor {
            Some(anchor) => debug!(
                kind = %K::KIND,
                page,
                module = name,
                marker = %anchor.marker,
                placement = %anchor.placement,
                "Module inserted"
            ),
            None => debug!(kind = %K::KIND, page, module = name, "Module added"),
        }
        self.metrics.module_inserted();
    }

    fn reject(&mut self, page: String, module: String) {
        let notice = RegistrationError::Duplicate {
            kind: K::KIND,
            page,
            module,
        };
        warn!(kind = %K::KIND, "{notice}");
        self.metrics.module_rejected();
        self.notices.push(notice);
    }

    fn defer(&mut self, pending: PendingInsertion) {
        let notice = RegistrationError::Deferred {
            kind: K::KIND,
            page: pending.page.clone(),
            module: pending.name.clone(),
            marker: pending.anchor.marker.clone(),
        };

        match self.retry.push(pending) {
            Ok(()) => {
                debug!(kind = %K::KIND, "{notice}");
                self.metrics.module_deferred();
                self.notices.push(notice);
            }
            Err(pending) => {
                warn!(
                    kind = %K::KIND,
                    page = %pending.page,
                    module = %pending.name,
                    "Retry queue already processed, not deferring"
                );
                self.drop_insertion(pending);
            }
        }
    }

    fn drop_insertion(&mut self, pending: PendingInsertion) {
        let notice = RegistrationError::Unresolved {
            kind: K::KIND,
            page: pending.page,
            module: pending.name,
            marker: pending.anchor.marker,
            placement: pending.anchor.placement,
        };
        warn!(kind = %K::KIND, source = %pending.source, "{notice}");
        self.metrics.module_dropped();
        self.notices.push(notice);
    }
}

impl<K: ModuleKind> Default for Registry<K> {
    fn default() -> Self {
        Self::new()
    }
}

fn swap(modules: &mut PageModules, target: &str, replacement: &str, source: &str) -> Swap {
    if !modules.contains(target) {
        return Swap::Absent;
    }
    if target != replacement && modules.contains(replacement) {
        return Swap::Taken;
    }
    modules.rename(target, replacement, source);
    Swap::Done
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(registry: &HandlerRegistry, page: &str) -> Vec<String> {
        registry
            .get_for_page(page)
            .iter()
            .map(|entry| entry.name.clone())
            .collect()
    }

    fn registry_with(page: &str, modules: &[&str]) -> HandlerRegistry {
        let mut registry = HandlerRegistry::new();
        registry.set_active_source("core");
        for module in modules {
            registry.add(Insertion::new(page, *module, false));
        }
        registry
    }

    #[test]
    fn test_add_appends() {
        let mut registry = registry_with("mail", &["a", "b"]);
        registry.add(Insertion::new("mail", "c", true));

        let entries = registry.get_for_page("mail");
        assert_eq!(entries.last().unwrap(), &Entry::new("c", "core", true));
        assert_eq!(entries.iter().filter(|e| e.name == "c").count(), 1);
    }

    #[test]
    fn test_add_creates_page() {
        let mut registry = HandlerRegistry::new();
        assert!(!registry.dump().contains_page("home"));
        registry.add(Insertion::new("home", "login", false));
        assert!(registry.dump().contains_page("home"));
    }

    #[test]
    fn test_duplicate_is_rejected() {
        let mut registry = registry_with("mail", &["a"]);
        registry.set_active_source("imap");
        registry.add(Insertion::new("mail", "a", true));

        assert_eq!(registry.get_for_page("mail"), &[Entry::new("a", "core", false)]);
        assert!(matches!(
            registry.notices(),
            [RegistrationError::Duplicate { module, .. }] if module == "a"
        ));
        assert_eq!(registry.metrics().rejected, 1);
    }

    #[test]
    fn test_insert_after_marker() {
        let mut registry = registry_with("mail", &["A", "B"]);
        registry.insert_after("mail", "C", false, "A");
        assert_eq!(names(&registry, "mail"), vec!["A", "C", "B"]);
    }

    #[test]
    fn test_insert_before_marker() {
        let mut registry = registry_with("mail", &["A", "B"]);
        registry.insert_before("mail", "C", false, "A");
        assert_eq!(names(&registry, "mail"), vec!["C", "A", "B"]);
    }

    #[test]
    fn test_explicit_source_wins() {
        let mut registry = registry_with("mail", &[]);
        registry.add(Insertion::new("mail", "a", false).source("imap"));
        assert_eq!(registry.get_for_page("mail")[0].source, "imap");
    }

    #[test]
    fn test_missing_marker_is_deferred() {
        let mut registry = registry_with("mail", &["list"]);
        registry.insert_before("mail", "folders", false, "search");

        assert_eq!(names(&registry, "mail"), vec!["list"]);
        assert_eq!(registry.pending().count(), 1);
        assert_eq!(registry.metrics().deferred, 1);

        registry.add(Insertion::new("mail", "search", false));
        registry.try_queued_modules();

        assert_eq!(names(&registry, "mail"), vec!["list", "folders", "search"]);
        assert_eq!(registry.pending().count(), 0);
    }

    #[test]
    fn test_missing_marker_without_queue_is_dropped() {
        let mut registry = registry_with("mail", &["list"]);
        registry.add(
            Insertion::new("mail", "folders", false)
                .after("search")
                .queue_on_failure(false),
        );

        assert_eq!(names(&registry, "mail"), vec!["list"]);
        assert_eq!(registry.pending().count(), 0);
        assert!(registry.notices()[0].is_terminal());
        assert_eq!(registry.metrics().dropped, 1);
    }

    #[test]
    fn test_retry_failure_is_terminal() {
        let mut registry = registry_with("mail", &["list"]);
        registry.insert_after("mail", "folders", false, "never");
        registry.try_queued_modules();

        assert_eq!(names(&registry, "mail"), vec!["list"]);
        assert_eq!(registry.pending().count(), 0);
        assert!(matches!(
            registry.notices().last(),
            Some(RegistrationError::Unresolved { module, .. }) if module == "folders"
        ));

        // a second replay has nothing left to do
        registry.try_queued_modules();
        assert_eq!(registry.metrics().dropped, 1);
    }

    #[test]
    fn test_defer_after_replay_drops() {
        let mut registry = registry_with("mail", &["list"]);
        registry.try_queued_modules();
        registry.insert_after("mail", "late", false, "missing");

        assert_eq!(registry.pending().count(), 0);
        assert_eq!(registry.metrics().dropped, 1);
        assert_eq!(registry.metrics().deferred, 0);
    }

    #[test]
    fn test_retry_order_sensitivity() {
        let mut registry = registry_with("mail", &["list"]);
        // "b" anchors on "a", but "b" is queued first
        registry.insert_after("mail", "b", false, "a");
        registry.insert_after("mail", "a", false, "search");
        registry.add(Insertion::new("mail", "search", false));
        registry.try_queued_modules();

        assert_eq!(names(&registry, "mail"), vec!["list", "search", "a"]);
    }

    #[test]
    fn test_retry_keeps_stored_source() {
        let mut registry = HandlerRegistry::new();
        registry.set_active_source("imap");
        registry.insert_before("mail", "folders", true, "search");
        registry.set_active_source("core");
        registry.add(Insertion::new("mail", "search", false));
        registry.try_queued_modules();

        let folders = &registry.get_for_page("mail")[0];
        assert_eq!(folders, &Entry::new("folders", "imap", true));
    }

    #[test]
    fn test_broadcast_skips_internal_pages() {
        let mut registry = registry_with("mail", &["content"]);
        registry.add(Insertion::new("ajax_list", "content", false));
        registry.add(Insertion::new("home", "content", false));

        registry.queue_for_all_pages("footer", false, Some(Anchor::after("content")), None);
        assert!(registry.get_for_page("mail").iter().all(|e| e.name != "footer"));

        registry.process_all_page_queue();

        assert_eq!(names(&registry, "mail"), vec!["content", "footer"]);
        assert_eq!(names(&registry, "home"), vec!["content", "footer"]);
        assert_eq!(names(&registry, "ajax_list"), vec!["content"]);
    }

    #[test]
    fn test_broadcast_collision_skips_one_page() {
        let mut registry = registry_with("mail", &["header"]);
        registry.add(Insertion::new("home", "content", false));

        registry.queue_for_all_pages("header", true, None, Some("themes".to_string()));
        registry.process_all_page_queue();

        assert_eq!(registry.get_for_page("mail"), &[Entry::new("header", "core", false)]);
        assert_eq!(
            registry.get_for_page("home").last().unwrap(),
            &Entry::new("header", "themes", true)
        );
    }

    #[test]
    fn test_broadcast_source_resolved_at_queue_time() {
        let mut registry = registry_with("mail", &[]);
        registry.set_active_source("themes");
        registry.queue_for_all_pages("theme_css", false, None, None);
        registry.set_active_source("imap");
        registry.process_all_page_queue();

        assert_eq!(registry.get_for_page("mail")[0].source, "themes");
    }

    #[test]
    fn test_broadcast_sees_pages_created_later() {
        let mut registry = HandlerRegistry::new();
        registry.queue_for_all_pages("footer", false, None, Some("core".to_string()));
        registry.add(Insertion::new("settings", "form", false));
        registry.process_all_page_queue();

        assert_eq!(names(&registry, "settings"), vec!["form", "footer"]);
    }

    #[test]
    fn test_custom_internal_prefix() {
        let mut registry = OutputRegistry::with_internal_prefix("api_");
        registry.add(Insertion::new("api_status", "json", false));
        registry.add(Insertion::new("ajax_list", "rows", false));
        registry.queue_for_all_pages("footer", false, None, None);
        registry.process_all_page_queue();

        assert!(registry.is_internal_page("api_status"));
        assert_eq!(registry.get_for_page("api_status").len(), 1);
        assert_eq!(registry.get_for_page("ajax_list").len(), 2);
    }

    #[test]
    fn test_replace_in_place() {
        let mut registry = HandlerRegistry::new();
        registry.set_active_source("core");
        registry.add(Insertion::new("mail", "A", false));
        registry.add(Insertion::new("mail", "old", true));
        registry.add(Insertion::new("mail", "B", false));

        registry.set_active_source("themes");
        registry.replace("old", "new", Some("mail"));

        assert_eq!(names(&registry, "mail"), vec!["A", "new", "B"]);
        assert_eq!(registry.get_for_page("mail")[1], Entry::new("new", "themes", true));
    }

    #[test]
    fn test_replace_all_pages() {
        let mut registry = registry_with("mail", &["old", "x"]);
        registry.add(Insertion::new("home", "old", false));
        registry.add(Insertion::new("settings", "x", false));

        registry.replace("old", "new", None);

        assert_eq!(names(&registry, "mail"), vec!["new", "x"]);
        assert_eq!(names(&registry, "home"), vec!["new"]);
        assert_eq!(names(&registry, "settings"), vec!["x"]);
        assert_eq!(registry.metrics().replaced, 2);
    }

    #[test]
    fn test_replace_missing_is_noop() {
        let mut registry = registry_with("mail", &["a"]);
        registry.replace("zzz", "new", Some("mail"));
        registry.replace("a", "new", Some("unknown"));

        assert_eq!(names(&registry, "mail"), vec!["a"]);
        assert!(registry.notices().is_empty());
        assert!(!registry.dump().contains_page("unknown"));
    }

    #[test]
    fn test_replace_into_taken_name_is_skipped() {
        let mut registry = registry_with("mail", &["a", "b"]);
        registry.replace("a", "b", Some("mail"));

        assert_eq!(names(&registry, "mail"), vec!["a", "b"]);
        assert!(matches!(
            registry.notices(),
            [RegistrationError::ReplacementTaken { .. }]
        ));
    }

    #[test]
    fn test_delete() {
        let mut registry = registry_with("mail", &["a", "b", "c"]);
        registry.delete("mail", "b");
        registry.delete("mail", "zzz");
        registry.delete("nowhere", "a");

        assert_eq!(names(&registry, "mail"), vec!["a", "c"]);
        assert_eq!(registry.metrics().deleted, 1);
    }

    #[test]
    fn test_load_dedupes() {
        let table: PageTable = serde_json::from_str(
            r#"{"mail": [
                {"name": "a", "source": "core", "requires_login": false},
                {"name": "a", "source": "imap", "requires_login": true}
            ]}"#,
        )
        .unwrap();

        let mut registry = HandlerRegistry::new();
        registry.load(table);
        assert_eq!(registry.get_for_page("mail"), &[Entry::new("a", "core", false)]);
    }

    #[test]
    fn test_freeze_replays_pending_work() {
        let mut registry = registry_with("mail", &["list"]);
        registry.insert_after("mail", "folders", false, "search");
        registry.queue_for_all_pages("footer", false, None, None);
        registry.add(Insertion::new("mail", "search", false));

        let table = registry.freeze();
        let order: Vec<&str> = table.get_for_page("mail").iter().map(|e| e.name.as_str()).collect();
        assert_eq!(order, vec!["list", "search", "folders", "footer"]);
    }
}
