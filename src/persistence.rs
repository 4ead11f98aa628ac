//! Scene persistence sinks.
//!
//! After each layout batch the orchestrator hands the serialized scene to a
//! [`ScenePersistence`]. The host editor stores it remotely; the crate ships
//! an in-memory sink for tests and a file sink for the CLI.

use std::path::PathBuf;

use tracing::debug;

use crate::error::CarteError;

pub trait ScenePersistence {
    fn save(&mut self, scene: &str) -> Result<(), CarteError>;
}

/// Keeps every saved scene in memory.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    saves: Vec<String>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_count(&self) -> usize {
        self.saves.len()
    }

    pub fn last(&self) -> Option<&str> {
        self.saves.last().map(String::as_str)
    }
}

impl ScenePersistence for MemoryPersistence {
    fn save(&mut self, scene: &str) -> Result<(), CarteError> {
        self.saves.push(scene.to_string());
        Ok(())
    }
}

/// Writes the scene to a file, replacing its previous contents.
#[derive(Debug, Clone)]
pub struct FilePersistence {
    path: PathBuf,
}

impl FilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FilePersistence { path: path.into() }
    }
}

impl ScenePersistence for FilePersistence {
    fn save(&mut self, scene: &str) -> Result<(), CarteError> {
        std::fs::write(&self.path, scene)?;
        debug!(path = %self.path.display(), bytes = scene.len(), "scene saved");
        Ok(())
    }
}
