use directories::ProjectDirs;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Named byte slots that a ledger is written to.
pub trait SaveSlotStore {
    /// Returns false when the write did not land.
    fn write_slot(&mut self, name: &str, bytes: &[u8]) -> bool;
    fn read_slot(&self, name: &str) -> Option<Vec<u8>>;
}

/// One `<name>.sav` file per slot under a directory.
#[derive(Debug, Clone)]
pub struct FileSlotStore {
    dir: PathBuf,
}

impl FileSlotStore {
    /// Uses the platform data directory, e.g. `~/.local/share/atlas-run`.
    pub fn new() -> io::Result<Self> {
        let project_dirs = ProjectDirs::from("", "", "atlas-run").ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "Could not determine data directory")
        })?;
        Self::at(project_dirs.data_dir())
    }

    pub fn at(dir: impl AsRef<Path>) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn slot_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.sav"))
    }
}

impl SaveSlotStore for FileSlotStore {
    fn write_slot(&mut self, name: &str, bytes: &[u8]) -> bool {
        let path = self.slot_path(name);
        let tmp = path.with_extension("sav.tmp");
        let result = fs::write(&tmp, bytes).and_then(|()| fs::rename(&tmp, &path));
        if let Err(err) = result {
            warn!(path = %path.display(), %err, "slot write failed");
            return false;
        }
        true
    }

    fn read_slot(&self, name: &str) -> Option<Vec<u8>> {
        let path = self.slot_path(name);
        match fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => {
                warn!(path = %path.display(), %err, "slot read failed");
                None
            }
        }
    }
}

/// In-memory slots for tests and headless runs.
#[derive(Debug, Clone, Default)]
pub struct MemorySlotStore {
    slots: HashMap<String, Vec<u8>>,
    fail_writes: bool,
}

impl MemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write report failure.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn slot_mut(&mut self, name: &str) -> Option<&mut Vec<u8>> {
        self.slots.get_mut(name)
    }
}

impl SaveSlotStore for MemorySlotStore {
    fn write_slot(&mut self, name: &str, bytes: &[u8]) -> bool {
        if self.fail_writes {
            return false;
        }
        self.slots.insert(name.to_string(), bytes.to_vec());
        true
    }

    fn read_slot(&self, name: &str) -> Option<Vec<u8>> {
        self.slots.get(name).cloned()
    }
}
