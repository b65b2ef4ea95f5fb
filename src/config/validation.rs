use super::models::Config;
use crate::setup::{ModuleSetManifest, Step};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("internal_page_prefix must not be empty")]
    EmptyInternalPrefix,

    #[error("Module set #{index} has an empty source label")]
    EmptySource { index: usize },

    #[error("Module set '{module_set}' is declared more than once")]
    DuplicateSource { module_set: String },

    #[error("Module set '{module_set}' step #{step} has an empty {field}")]
    EmptyField {
        module_set: String,
        step: usize,
        field: &'static str,
    },

    #[error("Module set '{module_set}' step #{step}: module '{module}' is anchored on itself")]
    SelfAnchored {
        module_set: String,
        step: usize,
        module: String,
    },

    #[error("Module set '{module_set}' step #{step}: replacement of '{module}' has the same name")]
    IdentityReplace {
        module_set: String,
        step: usize,
        module: String,
    },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    if config.registry.internal_page_prefix.is_empty() {
        return Err(ValidationError::EmptyInternalPrefix);
    }
    validate_module_sets(&config.module_sets)
}

/// Check every module set, including ones loaded from separate files
pub fn validate_module_sets(sets: &[ModuleSetManifest]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();

    for (index, set) in sets.iter().enumerate() {
        if set.source.trim().is_empty() {
            return Err(ValidationError::EmptySource { index });
        }
        if !seen.insert(set.source.as_str()) {
            return Err(ValidationError::DuplicateSource {
                module_set: set.source.clone(),
            });
        }
        for (step_index, step) in set.steps.iter().enumerate() {
            validate_step(&set.source, step_index, step)?;
        }
    }

    Ok(())
}

fn validate_step(source: &str, step: usize, op: &Step) -> Result<(), ValidationError> {
    let empty = |field: &'static str| ValidationError::EmptyField {
        module_set: source.to_string(),
        step,
        field,
    };

    let (page, name, marker) = match op {
        Step::Add(add) => (Some(&add.page), &add.name, add.marker.as_ref()),
        Step::AllPages(all) => (None, &all.name, all.marker.as_ref()),
        Step::Replace(replace) => {
            if replace.target.is_empty() {
                return Err(empty("target"));
            }
            if replace.replacement.is_empty() {
                return Err(empty("replacement"));
            }
            if replace.target == replace.replacement {
                return Err(ValidationError::IdentityReplace {
                    module_set: source.to_string(),
                    step,
                    module: replace.target.clone(),
                });
            }
            (replace.page.as_ref(), &replace.replacement, None)
        }
        Step::Delete(delete) => (Some(&delete.page), &delete.name, None),
    };

    if page.is_some_and(|page| page.is_empty()) {
        return Err(empty("page"));
    }
    if name.is_empty() {
        return Err(empty("name"));
    }
    match marker {
        Some(marker) if marker.is_empty() => Err(empty("marker")),
        Some(marker) if marker == name => Err(ValidationError::SelfAnchored {
            module_set: source.to_string(),
            step,
            module: name.clone(),
        }),
        _ => Ok(()),
    }
}
