use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::{CODEGEN_DIR, CODEMODS_DIR, DOCS_DIR, EXAMPLES_DIR};

/// Directories making up an initialized `.codegen` folder.
#[derive(Debug, Clone)]
pub struct WorkspaceLayout {
    pub codegen_dir: PathBuf,
    pub codemods_dir: PathBuf,
    pub docs_dir: PathBuf,
    pub examples_dir: PathBuf,
}

impl WorkspaceLayout {
    pub fn new(root: &Path) -> Self {
        let codegen_dir = root.join(CODEGEN_DIR);
        Self {
            codemods_dir: codegen_dir.join(CODEMODS_DIR),
            docs_dir: codegen_dir.join(DOCS_DIR),
            examples_dir: codegen_dir.join(EXAMPLES_DIR),
            codegen_dir,
        }
    }

    pub fn exists(&self) -> bool {
        self.codegen_dir.is_dir()
    }

    /// Create every folder and keep generated content out of git.
    pub fn create(&self) -> Result<()> {
        for dir in [
            &self.codegen_dir,
            &self.codemods_dir,
            &self.docs_dir,
            &self.examples_dir,
        ] {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }

        let gitignore = self.codegen_dir.join(".gitignore");
        add_to_gitignore(&gitignore, DOCS_DIR)?;
        add_to_gitignore(&gitignore, EXAMPLES_DIR)?;
        Ok(())
    }

    /// Replace the contents of the docs folder with `docs` (relative path → text).
    pub fn write_docs<'a>(
        &self,
        docs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<usize> {
        reset_dir(&self.docs_dir)?;
        let mut count = 0;
        for (rel, contents) in docs {
            write_inside(&self.docs_dir, rel, contents)?;
            count += 1;
        }
        Ok(count)
    }

    /// Replace the contents of the examples folder with `<name>.py` files.
    pub fn write_examples(
        &self,
        examples: impl IntoIterator<Item = (String, String)>,
    ) -> Result<usize> {
        reset_dir(&self.examples_dir)?;
        let mut count = 0;
        for (name, contents) in examples {
            write_inside(&self.examples_dir, &format!("{name}.py"), &contents)?;
            count += 1;
        }
        Ok(count)
    }
}

fn add_to_gitignore(gitignore: &Path, line: &str) -> Result<()> {
    let updated = match fs::read_to_string(gitignore) {
        Ok(existing) if existing.lines().any(|l| l.trim() == line) => return Ok(()),
        Ok(existing) if existing.is_empty() || existing.ends_with('\n') => {
            format!("{existing}{line}\n")
        }
        Ok(existing) => format!("{existing}\n{line}\n"),
        Err(_) => format!("{line}\n"),
    };
    fs::write(gitignore, updated)
        .with_context(|| format!("Failed to write {}", gitignore.display()))
}

fn reset_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir).with_context(|| format!("Failed to clear {}", dir.display()))?;
    }
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))
}

/// Write `rel` under `base`, refusing paths that escape it.
fn write_inside(base: &Path, rel: &str, contents: &str) -> Result<()> {
    let rel = Path::new(rel);
    if rel.is_absolute()
        || rel
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir))
    {
        anyhow::bail!("Refusing to write outside {}: {}", base.display(), rel.display());
    }
    let path = base.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, contents).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_layout_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let layout = WorkspaceLayout::new(dir.path());
        assert!(!layout.exists());

        layout.create().unwrap();
        layout.create().unwrap();

        assert!(layout.codemods_dir.is_dir());
        assert!(layout.docs_dir.is_dir());
        assert!(layout.examples_dir.is_dir());
        let gitignore = fs::read_to_string(layout.codegen_dir.join(".gitignore")).unwrap();
        assert_eq!(gitignore, "docs\nexamples\n");
    }

    #[test]
    fn test_gitignore_keeps_existing_lines() {
        let dir = TempDir::new().unwrap();
        let layout = WorkspaceLayout::new(dir.path());
        fs::create_dir_all(&layout.codegen_dir).unwrap();
        fs::write(layout.codegen_dir.join(".gitignore"), "*.log").unwrap();

        layout.create().unwrap();
        let gitignore = fs::read_to_string(layout.codegen_dir.join(".gitignore")).unwrap();
        assert_eq!(gitignore, "*.log\ndocs\nexamples\n");
    }

    #[test]
    fn test_write_docs_replaces_previous_content() {
        let dir = TempDir::new().unwrap();
        let layout = WorkspaceLayout::new(dir.path());
        layout.create().unwrap();
        fs::write(layout.docs_dir.join("stale.md"), "old").unwrap();

        let count = layout
            .write_docs([("intro.md", "hello"), ("api/files.md", "files")])
            .unwrap();
        assert_eq!(count, 2);
        assert!(!layout.docs_dir.join("stale.md").exists());
        assert_eq!(
            fs::read_to_string(layout.docs_dir.join("api/files.md")).unwrap(),
            "files"
        );
        assert!(layout.write_docs([("../escape.md", "x")]).is_err());
    }

    #[test]
    fn test_write_examples() {
        let dir = TempDir::new().unwrap();
        let layout = WorkspaceLayout::new(dir.path());
        layout.create().unwrap();

        layout
            .write_examples([("rename_fn".to_string(), "print(1)".to_string())])
            .unwrap();
        assert_eq!(
            fs::read_to_string(layout.examples_dir.join("rename_fn.py")).unwrap(),
            "print(1)"
        );
    }
}
