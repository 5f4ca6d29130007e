use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

use crate::active;
use crate::file_walker;
use crate::function_finder::DecoratedFunction;
use crate::{CODEMODS_DIR, CONFIG_JSON, CONFIG_TOML, MAIN_FILE};

/// Metadata stored next to a codemod once it is registered remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodemodConfig {
    pub name: String,
    pub codemod_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: String,
    pub created_by: String,
}

impl CodemodConfig {
    /// Read `config.json`, falling back to `config.toml`. Malformed files read as `None`.
    pub fn load(codemod_dir: &Path) -> Option<Self> {
        let json = codemod_dir.join(CONFIG_JSON);
        if json.is_file() {
            let contents = fs::read_to_string(&json).ok()?;
            return serde_json::from_str(&contents)
                .inspect_err(|e| log::debug!("Ignoring malformed {}: {e}", json.display()))
                .ok();
        }

        let toml_path = codemod_dir.join(CONFIG_TOML);
        if toml_path.is_file() {
            let contents = fs::read_to_string(&toml_path).ok()?;
            return toml::from_str(&contents)
                .inspect_err(|e| log::debug!("Ignoring malformed {}: {e}", toml_path.display()))
                .ok();
        }

        None
    }

    pub fn write(&self, codemod_dir: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        let path = codemod_dir.join(CONFIG_JSON);
        fs::write(&path, contents).with_context(|| format!("Failed to write {}", path.display()))
    }
}

/// A codemod stored under `.codegen/codemods/<name>/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Codemod {
    pub name: String,
    /// The codemod's main file.
    pub path: PathBuf,
    pub config: Option<CodemodConfig>,
}

impl Codemod {
    /// True when the active marker names this codemod.
    pub fn is_active(&self) -> bool {
        let Some(codegen_dir) = self.codegen_dir() else {
            return false;
        };
        active::active_name(codegen_dir).as_deref() == Some(self.name.as_str())
    }

    /// Path relative to `base`, or the full path when it lies elsewhere.
    pub fn relative_path(&self, base: &Path) -> PathBuf {
        self.path
            .strip_prefix(base)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| self.path.clone())
    }

    /// Current main-file contents with surrounding whitespace removed.
    pub fn current_source(&self) -> Result<String> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        Ok(text.trim().to_string())
    }

    // <codegen>/codemods/<name>/run.py
    fn codegen_dir(&self) -> Option<&Path> {
        self.path.parent()?.parent()?.parent()
    }
}

/// What `run`, `deploy` and `run-on-pr` send to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub name: String,
    pub source: String,
    pub lint_mode: bool,
    pub lint_user_whitelist: Vec<String>,
    pub filepath: Option<PathBuf>,
}

impl Target {
    pub fn from_codemod(codemod: &Codemod) -> Result<Self> {
        Ok(Self {
            name: codemod.name.clone(),
            source: codemod.current_source()?,
            lint_mode: false,
            lint_user_whitelist: Vec::new(),
            filepath: Some(codemod.path.clone()),
        })
    }
}

impl From<DecoratedFunction> for Target {
    fn from(func: DecoratedFunction) -> Self {
        Self {
            name: func.name,
            source: func.source,
            lint_mode: func.lint_mode,
            lint_user_whitelist: func.lint_user_whitelist,
            filepath: func.filepath,
        }
    }
}

/// Outcome of resolving a label to a single codemod or function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Codemod(Codemod),
    Function(DecoratedFunction),
}

impl Resolved {
    pub fn name(&self) -> &str {
        match self {
            Resolved::Codemod(c) => &c.name,
            Resolved::Function(f) => &f.name,
        }
    }

    pub fn into_target(self) -> Result<Target> {
        match self {
            Resolved::Codemod(c) => Target::from_codemod(&c),
            Resolved::Function(f) => Ok(f.into()),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("No codemod or function found with label '{label}'")]
    NotFound { label: String },

    #[error(
        "Multiple functions found with label '{label}':\n{}\nPass the file path instead to pick one.",
        format_paths(.paths)
    )]
    Ambiguous { label: String, paths: Vec<PathBuf> },
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Lowercase, with spaces and hyphens turned into underscores.
pub fn get_valid_name(name: &str) -> String {
    name.to_lowercase().replace([' ', '-'], "_")
}

/// True when `name` is a single directory name, so joining it stays inside `codemods/`.
pub fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    !name.contains(['/', '\\'])
        && matches!(components.next(), Some(Component::Normal(_)))
        && components.next().is_none()
}

/// Filesystem view over `.codegen/codemods`.
#[derive(Debug, Clone)]
pub struct CodemodManager {
    codegen_dir: PathBuf,
}

impl CodemodManager {
    pub fn new(codegen_dir: impl Into<PathBuf>) -> Self {
        Self {
            codegen_dir: codegen_dir.into(),
        }
    }

    pub fn codegen_dir(&self) -> &Path {
        &self.codegen_dir
    }

    pub fn codemods_dir(&self) -> PathBuf {
        self.codegen_dir.join(CODEMODS_DIR)
    }

    /// All codemod directories that contain a main file, sorted by name.
    pub fn list(&self) -> Result<Vec<Codemod>> {
        let dir = self.codemods_dir();
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut codemods = Vec::new();
        for entry in
            fs::read_dir(&dir).with_context(|| format!("Failed to read {}", dir.display()))?
        {
            let entry = entry?;
            let codemod_dir = entry.path();
            let main_file = codemod_dir.join(MAIN_FILE);
            if !codemod_dir.is_dir() || !main_file.is_file() {
                continue;
            }
            codemods.push(Codemod {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: main_file,
                config: CodemodConfig::load(&codemod_dir),
            });
        }
        codemods.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(codemods)
    }

    pub fn get(&self, name: &str) -> Option<Codemod> {
        let name = get_valid_name(name);
        if !is_plain_name(&name) {
            return None;
        }
        let codemod_dir = self.codemods_dir().join(&name);
        let main_file = codemod_dir.join(MAIN_FILE);
        if !main_file.is_file() {
            return None;
        }
        Some(Codemod {
            name,
            path: main_file,
            config: CodemodConfig::load(&codemod_dir),
        })
    }

    /// Decorated functions under `start_path`, or the current directory.
    pub fn get_decorated(&self, start_path: Option<&Path>) -> Result<Vec<DecoratedFunction>> {
        let start = match start_path {
            Some(path) => path.to_path_buf(),
            None => std::env::current_dir()?,
        };
        Ok(file_walker::scan(&start))
    }

    /// Scaffold a codemod directory, write its main file and make it active.
    pub fn create(
        &self,
        name: &str,
        source: &str,
        config: Option<CodemodConfig>,
    ) -> Result<Codemod> {
        let name = get_valid_name(name);
        if !is_plain_name(&name) {
            bail!("Invalid codemod name '{name}': must not contain path separators or '..'");
        }
        let codemods_dir = self.codemods_dir();
        let codemod_dir = codemods_dir.join(&name);
        fs::create_dir_all(&codemods_dir)
            .with_context(|| format!("Failed to create {}", codemods_dir.display()))?;

        if codemod_dir.exists() {
            bail!(
                "Codemod '{}' already exists at {}",
                name,
                codemod_dir.display()
            );
        }
        fs::create_dir(&codemod_dir)
            .with_context(|| format!("Failed to create {}", codemod_dir.display()))?;

        let main_file = codemod_dir.join(MAIN_FILE);
        fs::write(&main_file, source)
            .with_context(|| format!("Failed to write {}", main_file.display()))?;
        if let Some(config) = &config {
            config.write(&codemod_dir)?;
        }

        active::set_active(&self.codegen_dir, &name)?;

        Ok(Codemod {
            name,
            path: main_file,
            config,
        })
    }

    /// Resolve a label: stored codemods first (exact name), then decorated
    /// functions under `search_root`. Several decorated matches are an error.
    pub fn resolve(&self, label: &str, search_root: &Path) -> Result<Resolved> {
        if let Some(codemod) = self.list()?.into_iter().find(|c| c.name == label) {
            return Ok(Resolved::Codemod(codemod));
        }

        let functions = self.get_decorated(Some(search_root))?;
        Ok(resolve_function(label, functions, search_root)?)
    }
}

/// Pick the single decorated function named `label`.
pub fn resolve_function(
    label: &str,
    functions: Vec<DecoratedFunction>,
    base: &Path,
) -> Result<Resolved, ResolveError> {
    let mut matches: Vec<_> = functions.into_iter().filter(|f| f.name == label).collect();
    match matches.len() {
        0 => Err(ResolveError::NotFound {
            label: label.to_string(),
        }),
        1 => Ok(Resolved::Function(matches.remove(0))),
        _ => Err(ResolveError::Ambiguous {
            label: label.to_string(),
            paths: matches
                .iter()
                .filter_map(|f| f.filepath.as_deref())
                .map(|p| p.strip_prefix(base).unwrap_or(p).to_path_buf())
                .collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn dup(label: &str) -> String {
        format!("@codegen.function(\"{label}\")\ndef run(codebase):\n    pass\n")
    }

    #[test]
    fn test_valid_name() {
        assert_eq!(get_valid_name("My Cool-Mod"), "my_cool_mod");
        assert_eq!(get_valid_name("already_ok"), "already_ok");
    }

    #[test]
    fn test_names_cannot_leave_codemods_dir() {
        let dir = TempDir::new().unwrap();
        let manager = CodemodManager::new(dir.path());
        write(dir.path(), "escape/run.py", "print(1)\n");
        write(dir.path(), "codemods/a/b/run.py", "print(1)\n");

        assert!(manager.get("../escape").is_none());
        assert!(manager.get("a/b").is_none());
        assert!(manager.create("../escape2", "", None).is_err());
        assert!(manager.create("a/c", "", None).is_err());
        assert!(!dir.path().join("escape2").exists());

        assert!(is_plain_name("fix_imports"));
        assert!(!is_plain_name(".."));
        assert!(!is_plain_name("."));
        assert!(!is_plain_name(""));
        assert!(!is_plain_name("a\\b"));
    }

    #[test]
    fn test_create_then_get() {
        let dir = TempDir::new().unwrap();
        let manager = CodemodManager::new(dir.path().join(".codegen"));

        let created = manager.create("Fix Imports", "print(1)\n", None).unwrap();
        assert_eq!(created.name, "fix_imports");

        let found = manager.get("fix-imports").unwrap();
        assert_eq!(found.path, created.path);
        assert!(found.path.ends_with("codemods/fix_imports/run.py"));
        assert!(found.is_active());
        assert_eq!(found.current_source().unwrap(), "print(1)");
    }

    #[test]
    fn test_create_existing_fails() {
        let dir = TempDir::new().unwrap();
        let manager = CodemodManager::new(dir.path());
        manager.create("a", "", None).unwrap();
        assert!(manager.create("a", "", None).is_err());
    }

    #[test]
    fn test_create_moves_active_marker() {
        let dir = TempDir::new().unwrap();
        let manager = CodemodManager::new(dir.path());
        let first = manager.create("first", "", None).unwrap();
        let second = manager.create("second", "", None).unwrap();

        let listed = manager.list().unwrap();
        assert_eq!(listed.len(), 2);
        assert!(!listed[0].is_active());
        assert!(listed[1].is_active());
        assert_eq!(listed[0], first);
        assert_eq!(listed[1], second);
    }

    #[test]
    fn test_list_reads_sidecar_configs() {
        let dir = TempDir::new().unwrap();
        let codemods = dir.path().join(CODEMODS_DIR);
        write(&codemods, "json_mod/run.py", "");
        write(
            &codemods,
            "json_mod/config.json",
            r#"{"name": "json_mod", "codemod_id": 7, "created_at": "2024-01-01", "created_by": "me"}"#,
        );
        write(&codemods, "toml_mod/run.py", "");
        write(
            &codemods,
            "toml_mod/config.toml",
            "name = \"toml_mod\"\ncodemod_id = 9\ndescription = \"d\"\ncreated_at = \"x\"\ncreated_by = \"y\"\n",
        );
        write(&codemods, "broken_mod/run.py", "");
        write(&codemods, "broken_mod/config.json", "{not json");
        write(&codemods, "no_main/readme.txt", "");

        let manager = CodemodManager::new(dir.path());
        let listed = manager.list().unwrap();
        let names: Vec<_> = listed.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["broken_mod", "json_mod", "toml_mod"]);
        assert_eq!(listed[0].config, None);
        assert_eq!(listed[1].config.as_ref().unwrap().codemod_id, 7);
        assert_eq!(
            listed[2].config.as_ref().unwrap().description.as_deref(),
            Some("d")
        );
    }

    #[test]
    fn test_list_without_codemods_dir() {
        let dir = TempDir::new().unwrap();
        assert!(CodemodManager::new(dir.path()).list().unwrap().is_empty());
        assert!(CodemodManager::new(dir.path()).get("x").is_none());
    }

    #[test]
    fn test_resolve_prefers_stored_codemod() {
        let dir = TempDir::new().unwrap();
        let manager = CodemodManager::new(dir.path().join(".codegen"));
        manager.create("shared", "x = 1", None).unwrap();
        write(dir.path(), "src/shared.py", &dup("shared"));

        let resolved = manager.resolve("shared", dir.path()).unwrap();
        assert!(matches!(resolved, Resolved::Codemod(_)));
        let target = resolved.into_target().unwrap();
        assert_eq!(target.source, "x = 1");
        assert!(!target.lint_mode);
    }

    #[test]
    fn test_resolve_decorated_function() {
        let dir = TempDir::new().unwrap();
        let manager = CodemodManager::new(dir.path().join(".codegen"));
        write(dir.path(), "src/one.py", &dup("only"));

        let resolved = manager.resolve("only", dir.path()).unwrap();
        assert_eq!(resolved.name(), "only");
        assert_eq!(resolved.into_target().unwrap().source, "pass");
    }

    #[test]
    fn test_resolve_ambiguous_lists_every_path() {
        let dir = TempDir::new().unwrap();
        let manager = CodemodManager::new(dir.path().join(".codegen"));
        write(dir.path(), "a/foo.py", &dup("dup"));
        write(dir.path(), "b/foo.py", &dup("dup"));

        let err = manager.resolve("dup", dir.path()).unwrap_err();
        let err = err.downcast::<ResolveError>().unwrap();
        let ResolveError::Ambiguous { label, mut paths } = err.clone() else {
            panic!("expected ambiguity, got {err:?}");
        };
        paths.sort();
        assert_eq!(label, "dup");
        assert_eq!(
            paths,
            vec![PathBuf::from("a/foo.py"), PathBuf::from("b/foo.py")]
        );
        let message = err.to_string();
        assert!(message.contains("a/foo.py"));
        assert!(message.contains("b/foo.py"));
    }

    #[test]
    fn test_resolve_not_found() {
        let dir = TempDir::new().unwrap();
        let manager = CodemodManager::new(dir.path().join(".codegen"));
        let err = manager.resolve("missing", dir.path()).unwrap_err();
        assert_eq!(
            err.downcast::<ResolveError>().unwrap(),
            ResolveError::NotFound {
                label: "missing".into()
            }
        );
    }
}
