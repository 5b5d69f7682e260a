//! Preset files on disk.
//!
//! One JSON snapshot per file, named `<preset>.<plugin name lowercase>`,
//! in a single directory. Saves go through a temporary file in the same
//! directory followed by a rename, so a reader sees either the old file or
//! the complete new one.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{StateError, StateResult};
use crate::snapshot::StateSnapshot;

/// A directory of preset files sharing one extension.
#[derive(Debug, Clone)]
pub struct PresetDirectory {
    root: Option<PathBuf>,
    extension: String,
}

impl PresetDirectory {
    /// `root` is `None` when no presets directory could be resolved.
    pub fn new(root: Option<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root,
            extension: extension.into(),
        }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// File path for a preset name.
    pub fn path_for(&self, name: &str) -> StateResult<PathBuf> {
        validate_name(name)?;
        let root = self.root.as_ref().ok_or(StateError::NoPresetDirectory)?;
        Ok(root.join(format!("{}.{}", name, self.extension)))
    }

    /// Atomically write `snapshot` as preset `name`, creating the
    /// directory if needed.
    pub fn write(&self, name: &str, snapshot: &StateSnapshot) -> StateResult<PathBuf> {
        let target = self.path_for(name)?;
        let json = snapshot.to_json()?;
        let dir = target.parent().ok_or(StateError::NoPresetDirectory)?;
        fs::create_dir_all(dir)?;

        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(json.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(&target).map_err(|e| StateError::Io(e.error))?;

        log::debug!("Wrote preset {:?} to {}", name, target.display());
        Ok(target)
    }

    /// Read preset `name`.
    pub fn read(&self, name: &str) -> StateResult<StateSnapshot> {
        let path = self.path_for(name)?;
        if !path.is_file() {
            return Err(StateError::PresetNotFound(path));
        }
        let json = fs::read_to_string(&path)?;
        StateSnapshot::from_json(&json)
    }

    /// Sorted names of every preset in the directory.
    ///
    /// A directory that doesn't exist yet holds no presets.
    pub fn list(&self) -> StateResult<Vec<String>> {
        let root = self.root.as_ref().ok_or(StateError::NoPresetDirectory)?;
        let entries = match fs::read_dir(root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names: Vec<String> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| path.extension().is_some_and(|ext| ext == self.extension.as_str()))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        names.sort();
        Ok(names)
    }
}

/// Reject names that are empty or would escape the directory.
pub fn validate_name(name: &str) -> StateResult<()> {
    let bad = name.trim().is_empty()
        || name.contains(['/', '\\'])
        || name == "."
        || name == ".."
        || name.contains('\0');
    if bad {
        Err(StateError::InvalidPresetName(name.to_string()))
    } else {
        Ok(())
    }
}
