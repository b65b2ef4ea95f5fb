use serde::{Deserialize, Serialize};

use super::{ModuleSet, Setup};
use crate::registry::{Anchor, Insertion, ModuleType, Placement};

/// Module set described in TOML instead of code
///
/// ```toml
/// source = "imap_folders"
///
/// [[steps]]
/// op = "add"
/// kind = "handler"
/// page = "folders"
/// name = "load_imap_folders"
/// requires_login = true
/// marker = "load_user_data"
///
/// [[steps]]
/// op = "all_pages"
/// kind = "output"
/// name = "folders_link"
/// marker = "settings_menu_start"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ModuleSetManifest {
    pub source: String,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// One registration call, applied in listed order
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Add(AddStep),
    AllPages(BroadcastStep),
    Replace(ReplaceStep),
    Delete(DeleteStep),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AddStep {
    pub kind: ModuleType,
    pub page: String,
    pub name: String,
    #[serde(default)]
    pub requires_login: bool,
    pub marker: Option<String>,
    #[serde(default)]
    pub placement: Placement,
    #[serde(default = "default_queue")]
    pub queue: bool,
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BroadcastStep {
    pub kind: ModuleType,
    pub name: String,
    #[serde(default)]
    pub requires_login: bool,
    pub marker: Option<String>,
    #[serde(default)]
    pub placement: Placement,
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ReplaceStep {
    pub kind: ModuleType,
    pub target: String,
    pub replacement: String,
    /// Every page holding `target` when unset
    pub page: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DeleteStep {
    pub kind: ModuleType,
    pub page: String,
    pub name: String,
}

fn default_queue() -> bool {
    true
}

fn anchor(marker: Option<&str>, placement: Placement) -> Option<Anchor> {
    marker.map(|marker| Anchor {
        marker: marker.to_string(),
        placement,
    })
}

impl Step {
    pub fn kind(&self) -> ModuleType {
        match self {
            Step::Add(step) => step.kind,
            Step::AllPages(step) => step.kind,
            Step::Replace(step) => step.kind,
            Step::Delete(step) => step.kind,
        }
    }

    /// Module name this step introduces or removes
    pub fn module(&self) -> &str {
        match self {
            Step::Add(step) => &step.name,
            Step::AllPages(step) => &step.name,
            Step::Replace(step) => &step.replacement,
            Step::Delete(step) => &step.name,
        }
    }

    pub fn apply(&self, setup: &mut Setup) {
        match self {
            Step::Add(step) => {
                let mut insertion =
                    Insertion::new(step.page.clone(), step.name.clone(), step.requires_login)
                        .anchored(anchor(step.marker.as_deref(), step.placement))
                        .queue_on_failure(step.queue);
                if let Some(source) = &step.source {
                    insertion = insertion.source(source.clone());
                }
                setup.add_module(step.kind, insertion);
            }
            Step::AllPages(step) => setup.add_module_to_all_pages(
                step.kind,
                &step.name,
                step.requires_login,
                step.source.as_deref(),
                anchor(step.marker.as_deref(), step.placement),
            ),
            Step::Replace(step) => setup.replace_module(
                step.kind,
                &step.target,
                &step.replacement,
                step.page.as_deref(),
            ),
            Step::Delete(step) => setup.delete_module(step.kind, &step.page, &step.name),
        }
    }
}

impl ModuleSetManifest {
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

impl ModuleSet for ModuleSetManifest {
    fn source(&self) -> &str {
        &self.source
    }

    fn register(&self, setup: &mut Setup) {
        for step in &self.steps {
            step.apply(setup);
        }
    }
}
