use ignore::WalkBuilder;
use log::debug;
use std::path::Path;
use thiserror::Error;

use crate::function_finder::{self, DecoratedFunction, ExtractError};

/// Directory names that are never descended into.
pub const SKIP_DIRS: &[&str] = &[
    "__pycache__",
    "node_modules",
    ".git",
    ".hg",
    ".svn",
    ".tox",
    ".venv",
    "venv",
    "env",
    "build",
    "dist",
    "site-packages",
    ".pytest_cache",
    ".mypy_cache",
    ".ruff_cache",
    ".coverage",
    "htmlcov",
    ".codegen-sh",
];

/// Cheap substring every candidate file must contain before it is parsed.
const MARKER: &[u8] = b"@codegen";

/// Why a candidate file contributed nothing to a scan.
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("not a python file")]
    NotPython,

    #[error("no @codegen marker")]
    NoMarker,

    #[error("not valid utf-8")]
    NotUtf8,

    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Find all decorated functions under `root`.
///
/// Features:
/// - `root` may be a single file or a directory (walked recursively)
/// - Skips any directory named in [`SKIP_DIRS`]
/// - Does not consult ignore files; only the deny list excludes paths
/// - Files that fail to parse are left out without an error
/// - Results follow walk order
pub fn scan(root: &Path) -> Vec<DecoratedFunction> {
    let mut functions = Vec::new();
    walk_python_files(root, |path| match scan_file(path) {
        Ok(found) => functions.extend(found),
        Err(reason) => debug!("Skipping {}: {reason}", path.display()),
    });
    functions
}

/// Extract decorated functions from one file, reporting why it was skipped.
pub fn scan_file(path: &Path) -> Result<Vec<DecoratedFunction>, SkipReason> {
    if !is_python_file(path) {
        return Err(SkipReason::NotPython);
    }

    // Unreadable files are treated the same as files without the marker.
    let bytes = std::fs::read(path).map_err(|_| SkipReason::NoMarker)?;
    if !contains_marker(&bytes) {
        return Err(SkipReason::NoMarker);
    }

    let content = String::from_utf8(bytes).map_err(|_| SkipReason::NotUtf8)?;
    let mut functions = function_finder::extract(&content)?;
    for func in &mut functions {
        func.filepath = Some(path.to_path_buf());
    }
    Ok(functions)
}

/// Walk `root` and call `processor` for every `.py` file outside skipped directories.
pub fn walk_python_files<F>(root: &Path, mut processor: F)
where
    F: FnMut(&Path),
{
    if root.is_file() {
        if is_python_file(root) {
            processor(root);
        }
        return;
    }

    let mut builder = WalkBuilder::new(root);
    builder.standard_filters(false).filter_entry(|entry| {
        // The root itself is never filtered, only what lies beneath it
        if entry.depth() == 0 {
            return true;
        }
        if entry.file_type().is_some_and(|ft| ft.is_dir()) {
            if let Some(name) = entry.file_name().to_str() {
                return !SKIP_DIRS.contains(&name);
            }
        }
        true
    });

    for result in builder.build() {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                debug!("Walk error under {}: {err}", root.display());
                continue;
            }
        };
        let path = entry.path();
        if entry.file_type().is_some_and(|ft| ft.is_file()) && is_python_file(path) {
            processor(path);
        }
    }
}

fn is_python_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "py")
}

fn contains_marker(bytes: &[u8]) -> bool {
    bytes.windows(MARKER.len()).any(|window| window == MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const GOOD: &str = r#"
@codegen.function("good")
def run(codebase):
    pass
"#;

    const TWO: &str = r#"
@codegen.function("one")
def one(codebase):
    pass

@codegen.webhook("two")
def two(codebase):
    pass
"#;

    const BROKEN: &str = "@codegen.function(\"broken\")\ndef run(:\n";

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn names(functions: &[DecoratedFunction]) -> Vec<String> {
        let mut names: Vec<_> = functions.iter().map(|f| f.name.clone()).collect();
        names.sort();
        names
    }

    #[test]
    fn test_scan_counts_only_parsable_files() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a/good.py", GOOD);
        write(dir.path(), "b/two.py", TWO);
        write(dir.path(), "c/broken.py", BROKEN);
        write(dir.path(), "c/also_broken.py", "@codegen.function(LABEL)\ndef f(): pass\n");
        write(dir.path(), "d/plain.py", "def run():\n    pass\n");

        let functions = scan(dir.path());
        assert_eq!(names(&functions), vec!["good", "one", "two"]);
        for func in &functions {
            assert!(func.filepath.as_ref().unwrap().starts_with(dir.path()));
        }
    }

    #[test]
    fn test_scan_skips_denylisted_directories() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "node_modules/pkg/mod.py", GOOD);
        write(dir.path(), "src/.venv/lib/mod.py", GOOD);
        write(dir.path(), "build/gen.py", GOOD);
        write(dir.path(), "x/__pycache__/mod.py", GOOD);

        assert!(scan(dir.path()).is_empty());
    }

    #[test]
    fn test_scan_ignores_other_extensions() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "notes.txt", GOOD);
        write(dir.path(), "script.pyi", GOOD);

        assert!(scan(dir.path()).is_empty());
    }

    #[test]
    fn test_scan_single_file() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "one.py", TWO);
        write(dir.path(), "other.py", GOOD);

        let file = dir.path().join("one.py");
        let functions = scan(&file);
        assert_eq!(names(&functions), vec!["one", "two"]);
        assert_eq!(functions[0].filepath.as_deref(), Some(file.as_path()));
    }

    #[test]
    fn test_scan_file_reports_skip_reasons() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "plain.py", "x = 1\n");
        write(dir.path(), "broken.py", BROKEN);
        write(dir.path(), "README.md", GOOD);

        assert!(matches!(
            scan_file(&dir.path().join("plain.py")),
            Err(SkipReason::NoMarker)
        ));
        assert!(matches!(
            scan_file(&dir.path().join("broken.py")),
            Err(SkipReason::Extract(ExtractError::Parse(_)))
        ));
        assert!(matches!(
            scan_file(&dir.path().join("README.md")),
            Err(SkipReason::NotPython)
        ));
    }

    #[test]
    fn test_denylist_applies_below_scan_root_only() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "build/app/mod.py", GOOD);
        write(dir.path(), "build/app/dist/gen.py", TWO);

        assert!(scan(dir.path()).is_empty());

        let functions = scan(&dir.path().join("build"));
        assert_eq!(names(&functions), vec!["good"]);
        assert_eq!(
            functions[0].filepath.as_deref(),
            Some(dir.path().join("build/app/mod.py").as_path())
        );
    }
}
