use anyhow::{Context, Result, bail};
use clap::Args;
use codegen_api::schemas::CodemodRunType;
use codegen_core::{Resolved, Target, get_active, git, scan_file};
use codegen_ui::{Spinner, Style, StyledText, icons};
use std::collections::BTreeMap;
use std::path::Path;

use crate::render;
use crate::session::Session;

#[derive(Args, Debug)]
#[command(about = "Run a codemod or decorated function against this repository")]
pub struct RunArgs {
    /// Path to a python file or the label of a codemod or decorated function.
    /// Defaults to the active codemod.
    pub target: Option<String>,

    /// Print the link to the run in the web app
    #[arg(long)]
    pub web: bool,

    /// Apply the resulting diff to the local checkout
    #[arg(long)]
    pub apply_local: bool,
}

pub fn execute(args: RunArgs) -> Result<()> {
    let session = Session::load()?;
    session.requires_auth()?;
    session.requires_init()?;

    let target = resolve_target(&session, args.target.as_deref())?;
    let repo_full_name = session.repo_full_name()?;
    let api = session.api()?;

    let spinner = Spinner::builder(format!("Running {}...", target.name)).start();
    let output = api.run(
        &repo_full_name,
        &target.name,
        Some(&target.source),
        CodemodRunType::Diff,
        BTreeMap::new(),
    );
    let output = match output {
        Ok(output) => output,
        Err(e) => {
            spinner.error(format!("Failed to run {}", target.name));
            return Err(e.into());
        }
    };
    spinner.finish();

    if !output.success {
        bail!(
            "Run failed: {}",
            output.error.as_deref().unwrap_or("no error message returned")
        );
    }

    println!(
        "{} Ran {}",
        icons::success(),
        target.name.with_style(Style::Cyan)
    );
    render::pretty_print_output(&output, args.web);

    if args.apply_local {
        match output.observation.as_deref().filter(|d| !d.trim().is_empty()) {
            Some(diff) => {
                git::apply_patch(session.root(), diff)?;
                println!("{} Applied changes locally", icons::success());
            }
            None => println!("Nothing to apply"),
        }
    }
    Ok(())
}

fn resolve_target(session: &Session, target: Option<&str>) -> Result<Target> {
    let Some(target) = target else {
        let active = get_active(session.codegen_dir()).context(
            "No codemod specified and no active codemod. Pass a label or run `codegen create <name>`.",
        )?;
        let codemod = session
            .manager()
            .get(&active.name)
            .with_context(|| format!("Active codemod '{}' not found", active.name))?;
        return Target::from_codemod(&codemod);
    };

    let path = session.root().join(target);
    if path.is_file() {
        return target_from_file(&path);
    }

    session.manager().resolve(target, session.root())?.into_target()
}

/// A file with exactly one decorated function runs that function; a file
/// with none runs as a whole, named after its codemod directory or stem.
fn target_from_file(path: &Path) -> Result<Target> {
    let mut functions = scan_file(path)
        .or_else(|reason| match reason {
            codegen_core::SkipReason::NoMarker => Ok(Vec::new()),
            other => Err(other),
        })
        .with_context(|| format!("Failed to read {}", path.display()))?;

    match functions.len() {
        0 => {
            let source = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let name = codemod_name_for(path);
            Ok(Target {
                name,
                source: source.trim().to_string(),
                lint_mode: false,
                lint_user_whitelist: Vec::new(),
                filepath: Some(path.to_path_buf()),
            })
        }
        1 => Ok(Resolved::Function(functions.remove(0)).into_target()?),
        _ => {
            let labels: Vec<_> = functions.iter().map(|f| f.name.as_str()).collect();
            bail!(
                "{} contains several decorated functions ({}). Pass a label instead.",
                path.display(),
                labels.join(", ")
            )
        }
    }
}

fn codemod_name_for(path: &Path) -> String {
    let is_main = path.file_name().is_some_and(|n| n == codegen_core::MAIN_FILE);
    let named = if is_main {
        path.parent().and_then(Path::file_name)
    } else {
        path.file_stem()
    };
    named
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "codemod".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_codemod_name_for() {
        assert_eq!(
            codemod_name_for(Path::new(".codegen/codemods/rename/run.py")),
            "rename"
        );
        assert_eq!(codemod_name_for(Path::new("scripts/cleanup.py")), "cleanup");
    }

    #[test]
    fn test_target_from_file() {
        let dir = TempDir::new().unwrap();
        let single = dir.path().join("single.py");
        std::fs::write(
            &single,
            "import codegen\n\n@codegen.function(\"fix\")\ndef run(codebase):\n    pass\n",
        )
        .unwrap();
        let target = target_from_file(&single).unwrap();
        assert_eq!(target.name, "fix");
        assert_eq!(target.source, "pass");

        let plain = dir.path().join("plain.py");
        std::fs::write(&plain, "print('hi')\n").unwrap();
        let target = target_from_file(&plain).unwrap();
        assert_eq!(target.name, "plain");
        assert_eq!(target.source, "print('hi')");

        let double = dir.path().join("double.py");
        std::fs::write(
            &double,
            "@codegen.function(\"a\")\ndef a(c):\n    pass\n\n@codegen.function(\"b\")\ndef b(c):\n    pass\n",
        )
        .unwrap();
        let err = target_from_file(&double).unwrap_err().to_string();
        assert!(err.contains("(a, b)"));
    }
}
