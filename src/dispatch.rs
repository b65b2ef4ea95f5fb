//! Read-only module assignments and per-request dispatch plans

use serde::{Deserialize, Serialize};

use crate::registry::{Entry, PageTable};

/// Frozen handler and output tables
///
/// Produced once at startup and shared behind an `Arc`; nothing mutates it
/// afterwards, so concurrent readers need no locking. Reconfiguring means
/// building a new value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PageAssignments {
    pub handlers: PageTable,
    pub outputs: PageTable,
}

impl PageAssignments {
    /// Whether either table has the page
    pub fn knows_page(&self, page: &str) -> bool {
        self.handlers.contains_page(page) || self.outputs.contains_page(page)
    }

    pub fn plan(&self, page: &str, authenticated: bool) -> DispatchPlan {
        DispatchPlan::new(self, page, authenticated)
    }
}

/// Modules a single request runs, in execution order
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DispatchPlan {
    pub page: String,
    pub authenticated: bool,
    pub handlers: Vec<Entry>,
    pub outputs: Vec<Entry>,
}

impl DispatchPlan {
    /// Login-only modules are left out for anonymous requests
    pub fn new(assignments: &PageAssignments, page: &str, authenticated: bool) -> Self {
        let select = |table: &PageTable| -> Vec<Entry> {
            table
                .get_for_page(page)
                .iter()
                .filter(|entry| entry.runs_for(authenticated))
                .cloned()
                .collect()
        };

        Self {
            page: page.to_string(),
            authenticated,
            handlers: select(&assignments.handlers),
            outputs: select(&assignments.outputs),
        }
    }

    /// Handler names followed by output names
    pub fn sequence(&self) -> impl Iterator<Item = &str> {
        self.handlers
            .iter()
            .chain(&self.outputs)
            .map(|entry| entry.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty() && self.outputs.is_empty()
    }
}
