use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::codemods::is_plain_name;
use crate::{ACTIVE_CODEMOD_FILE, CODEMODS_DIR, MAIN_FILE};

/// A single value persisted in one text file.
#[derive(Debug, Clone)]
pub struct MarkerFile {
    path: PathBuf,
}

impl MarkerFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Trimmed content, or `None` when the file is missing, unreadable or blank.
    pub fn get(&self) -> Option<String> {
        let value = fs::read_to_string(&self.path).ok()?;
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_string())
    }

    /// Overwrite the file with `value` as-is.
    pub fn set(&self, value: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&self.path, value)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}

/// The codemod `codegen run` targets when given no argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveCodemod {
    pub name: String,
    pub path: PathBuf,
}

fn marker(codegen_dir: &Path) -> MarkerFile {
    MarkerFile::new(codegen_dir.join(CODEMODS_DIR).join(ACTIVE_CODEMOD_FILE))
}

/// Read the active codemod. A marker naming a missing codemod is stale and reads as `None`.
pub fn get_active(codegen_dir: &Path) -> Option<ActiveCodemod> {
    let name = marker(codegen_dir).get()?;
    if !is_plain_name(&name) {
        log::debug!("Ignoring active codemod marker with path components '{name}'");
        return None;
    }
    let path = codegen_dir.join(CODEMODS_DIR).join(&name).join(MAIN_FILE);
    if !path.is_file() {
        log::debug!("Ignoring stale active codemod marker '{name}'");
        return None;
    }
    Some(ActiveCodemod { name, path })
}

pub fn set_active(codegen_dir: &Path, name: &str) -> Result<()> {
    marker(codegen_dir).set(name)
}

/// Raw marker content without the staleness check.
pub fn active_name(codegen_dir: &Path) -> Option<String> {
    marker(codegen_dir).get()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn scaffold(codegen_dir: &Path, name: &str) -> PathBuf {
        let dir = codegen_dir.join(CODEMODS_DIR).join(name);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(MAIN_FILE);
        fs::write(&path, "print(1)\n").unwrap();
        path
    }

    #[test]
    fn test_no_marker() {
        let dir = TempDir::new().unwrap();
        assert_eq!(get_active(dir.path()), None);
    }

    #[test]
    fn test_set_then_get() {
        let dir = TempDir::new().unwrap();
        let path = scaffold(dir.path(), "my_mod");
        set_active(dir.path(), "my_mod").unwrap();

        let active = get_active(dir.path()).unwrap();
        assert_eq!(active.name, "my_mod");
        assert_eq!(active.path, path);
        assert_eq!(get_active(dir.path()), Some(active));
    }

    #[test]
    fn test_stale_marker_reads_as_none() {
        let dir = TempDir::new().unwrap();
        set_active(dir.path(), "gone").unwrap();
        assert_eq!(get_active(dir.path()), None);
        assert_eq!(active_name(dir.path()).as_deref(), Some("gone"));
    }

    #[test]
    fn test_whitespace_trimmed_on_read_only() {
        let dir = TempDir::new().unwrap();
        scaffold(dir.path(), "padded");
        set_active(dir.path(), "padded\n").unwrap();

        let raw =
            fs::read_to_string(dir.path().join(CODEMODS_DIR).join(ACTIVE_CODEMOD_FILE)).unwrap();
        assert_eq!(raw, "padded\n");
        assert_eq!(get_active(dir.path()).unwrap().name, "padded");
    }

    #[test]
    fn test_marker_cannot_point_outside_codemods() {
        let dir = TempDir::new().unwrap();
        let outside = dir.path().join("outside");
        fs::create_dir_all(&outside).unwrap();
        fs::write(outside.join(MAIN_FILE), "print(1)\n").unwrap();
        fs::create_dir_all(dir.path().join(CODEMODS_DIR)).unwrap();

        set_active(dir.path(), "../outside").unwrap();
        assert_eq!(get_active(dir.path()), None);

        scaffold(dir.path(), "a/b");
        set_active(dir.path(), "a/b").unwrap();
        assert_eq!(get_active(dir.path()), None);
    }

    #[test]
    fn test_blank_marker() {
        let dir = TempDir::new().unwrap();
        set_active(dir.path(), "  ").unwrap();
        assert_eq!(get_active(dir.path()), None);
    }
}
