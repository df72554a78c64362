//! Agent registry: maps plan names to builtin implementations.

use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::agents::{AgentInstance, Collaborators, PosterAgent, WriterAgent};
use crate::LaunchError;

/// A registry entry: plan name plus the opaque implementation handle from
/// `agents_map.json` (e.g. `builtin:poster`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentDescriptor {
    pub name: String,
    pub handle: String,
}

#[derive(Debug, Default)]
pub struct AgentRegistry {
    entries: HashMap<String, String>,
}

impl AgentRegistry {
    /// Load `agents_map.json`. A missing file yields an empty registry — it
    /// only matters once the plan references an agent, and then the step is
    /// marked unavailable rather than the mission aborted.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LaunchError> {
        let path = path.as_ref();
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "agent registry file missing, starting empty");
                return Ok(Self::default());
            }
            Err(err) => return Err(LaunchError::PlanIo(err)),
        };

        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|err| LaunchError::RegistryMalformed(err.to_string()))?;
        let Value::Object(map) = value else {
            return Err(LaunchError::RegistryMalformed(
                "expected a flat name -> handle object".to_string(),
            ));
        };

        let mut entries = HashMap::new();
        for (name, handle) in map {
            match handle {
                Value::String(handle) => {
                    entries.insert(name, handle);
                }
                other => {
                    return Err(LaunchError::RegistryMalformed(format!(
                        "handle for '{name}' must be a string, found {other}"
                    )))
                }
            }
        }
        debug!(agents = entries.len(), "agent registry loaded");
        Ok(Self { entries })
    }

    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Look up the descriptor for a plan name.
    pub fn resolve(&self, name: &str) -> Option<AgentDescriptor> {
        self.entries.get(name).map(|handle| AgentDescriptor {
            name: name.to_string(),
            handle: handle.clone(),
        })
    }
}

/// Construct the builtin implementation behind a descriptor, injecting the
/// collaborators its constructor declares. `None` means the handle names no
/// builtin, which the runner treats like an unknown agent.
pub fn instantiate(
    descriptor: &AgentDescriptor,
    collaborators: &Collaborators,
) -> Option<AgentInstance> {
    match descriptor.handle.as_str() {
        "builtin:writer" => Some(AgentInstance::Blocking(Box::new(WriterAgent::new(
            descriptor.name.clone(),
            collaborators.memory.clone(),
        )))),
        "builtin:poster" => Some(AgentInstance::Async(Box::new(PosterAgent::new(
            descriptor.name.clone(),
            collaborators.memory.clone(),
            collaborators.supervisor.clone(),
            collaborators.gateway.clone(),
            collaborators.brain.clone(),
        )))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_finds_known_names_only() {
        let registry =
            AgentRegistry::from_entries([("WriterAgent", "builtin:writer")]);
        let descriptor = registry.resolve("WriterAgent").unwrap();
        assert_eq!(descriptor.handle, "builtin:writer");
        assert!(registry.resolve("GhostAgent").is_none());
    }

    #[test]
    fn missing_registry_file_is_empty_not_fatal() {
        let registry = AgentRegistry::load("/nonexistent/agents_map.json").unwrap();
        assert!(registry.resolve("WriterAgent").is_none());
    }

    #[test]
    fn malformed_registry_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agents_map.json");
        std::fs::write(&path, b"[\"not\", \"a\", \"map\"]").unwrap();
        assert!(matches!(
            AgentRegistry::load(&path),
            Err(LaunchError::RegistryMalformed(_))
        ));
    }
}
