//! Shared setup for operation tests.

use fs_err as fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

use crate::helpers::memory::MemoryBackend;
use crate::ops::workspace::Workspace;
use crate::EngineConfig;

/// A skills directory holding `alpha/SKILL.md = "v1"`, a repo directory and
/// a shared in-memory backend.
pub(crate) struct Fixture {
    pub temp: TempDir,
    pub ws: Workspace,
    pub backend: Arc<MemoryBackend>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_backend(MemoryBackend::new())
    }

    pub fn with_backend(backend: MemoryBackend) -> Self {
        let temp = TempDir::new().unwrap();
        let skills = temp.path().join("skills");
        fs::create_dir_all(skills.join("alpha")).unwrap();
        fs::write(skills.join("alpha/SKILL.md"), "v1").unwrap();
        let config = EngineConfig::new(&skills, temp.path().join("repo"));
        let backend = Arc::new(backend);
        let ws = Workspace::with_backend(config, Box::new(backend.clone()));
        Self { temp, ws, backend }
    }

    /// Another workspace over the same directories and backend.
    pub fn reconfigure(&self, f: impl FnOnce(EngineConfig) -> EngineConfig) -> Workspace {
        let config = f(self.ws.config().clone());
        Workspace::with_backend(config, Box::new(self.backend.clone()))
    }

    pub fn tree(&self, name: &str) -> PathBuf {
        self.ws.layout().tree_dir(name)
    }

    /// Write a file in a live tree, creating directories.
    pub fn write(&self, tree: &str, rel: &str, contents: &str) {
        let path = self.tree(tree).join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    pub fn read(&self, tree: &str, rel: &str) -> String {
        fs::read_to_string(self.tree(tree).join(rel)).unwrap()
    }

    /// Create a tree with a `SKILL.md`.
    pub fn add_tree(&self, name: &str, contents: &str) {
        self.write(name, "SKILL.md", contents);
    }
}
