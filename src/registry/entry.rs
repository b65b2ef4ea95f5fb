use serde::{Deserialize, Serialize};
use std::fmt;

/// One module assigned to a page
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Entry {
    pub name: String,
    /// Module set that registered (or last replaced) this module
    pub source: String,
    pub requires_login: bool,
}

impl Entry {
    pub fn new(name: impl Into<String>, source: impl Into<String>, requires_login: bool) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            requires_login,
        }
    }

    /// Whether this module runs for a request with the given login state
    pub fn runs_for(&self, authenticated: bool) -> bool {
        !self.requires_login || authenticated
    }
}

/// Side of the marker a module is inserted on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    Before,
    #[default]
    After,
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Placement::Before => f.write_str("before"),
            Placement::After => f.write_str("after"),
        }
    }
}

/// Relative position: an existing module name plus a side
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Anchor {
    pub marker: String,
    #[serde(default)]
    pub placement: Placement,
}

impl Anchor {
    pub fn before(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            placement: Placement::Before,
        }
    }

    pub fn after(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            placement: Placement::After,
        }
    }
}

/// A request to place one module on one page
///
/// ```rust
/// use modset::registry::Insertion;
///
/// let insertion = Insertion::new("mail", "folders", true)
///     .before("search")
///     .source("imap");
/// assert!(insertion.queue_on_failure);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion {
    pub page: String,
    pub name: String,
    pub requires_login: bool,
    pub anchor: Option<Anchor>,
    /// Defer to the retry queue when the marker is missing
    pub queue_on_failure: bool,
    /// Falls back to the registry's active source when unset
    pub source: Option<String>,
}

impl Insertion {
    pub fn new(page: impl Into<String>, name: impl Into<String>, requires_login: bool) -> Self {
        Self {
            page: page.into(),
            name: name.into(),
            requires_login,
            anchor: None,
            queue_on_failure: true,
            source: None,
        }
    }

    pub fn before(self, marker: impl Into<String>) -> Self {
        self.anchored(Some(Anchor::before(marker)))
    }

    pub fn after(self, marker: impl Into<String>) -> Self {
        self.anchored(Some(Anchor::after(marker)))
    }

    pub fn anchored(mut self, anchor: Option<Anchor>) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn queue_on_failure(mut self, queue: bool) -> Self {
        self.queue_on_failure = queue;
        self
    }
}

/// Insertion whose marker was not yet registered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingInsertion {
    pub page: String,
    pub name: String,
    pub requires_login: bool,
    pub anchor: Anchor,
    pub source: String,
}

impl PendingInsertion {
    pub fn entry(&self) -> Entry {
        Entry::new(self.name.clone(), self.source.clone(), self.requires_login)
    }
}

/// A module queued for every non-internal page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastDirective {
    pub name: String,
    pub requires_login: bool,
    pub anchor: Option<Anchor>,
    /// Resolved when the directive is queued, not at replay
    pub source: String,
}

impl BroadcastDirective {
    pub fn for_page(&self, page: &str) -> Insertion {
        Insertion::new(page, self.name.clone(), self.requires_login)
            .anchored(self.anchor.clone())
            .source(self.source.clone())
    }
}
