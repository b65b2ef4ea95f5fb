use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Marker trait distinguishing the two registry instances
///
/// The kinds carry no behavior; they only keep handler and output
/// registrations from being mixed up at compile time.
pub trait ModuleKind: fmt::Debug + Default + Send + Sync + 'static {
    const KIND: ModuleType;
}

/// Request-processing modules
#[derive(Debug, Default, Clone, Copy)]
pub struct Handler;

/// Rendering modules, dispatched after handlers
#[derive(Debug, Default, Clone, Copy)]
pub struct Output;

impl ModuleKind for Handler {
    const KIND: ModuleType = ModuleType::Handler;
}

impl ModuleKind for Output {
    const KIND: ModuleType = ModuleType::Output;
}

/// Runtime selector for one of the two registries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleType {
    Handler,
    Output,
}

impl ModuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleType::Handler => "handler",
            ModuleType::Output => "output",
        }
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "handler" => Ok(ModuleType::Handler),
            "output" => Ok(ModuleType::Output),
            other => Err(format!("unknown module type: {other}")),
        }
    }
}
