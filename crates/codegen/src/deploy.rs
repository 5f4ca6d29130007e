use anyhow::Result;
use clap::Args;
use codegen_api::schemas::DeployInput;
use codegen_core::{Target, scan};
use codegen_ui::{Colorize, Spinner, Style, StyledText, icons};
use std::path::PathBuf;

use crate::session::Session;

#[derive(Args, Debug)]
#[command(about = "Deploy decorated functions to the backend")]
pub struct DeployArgs {
    /// File or directory to scan for decorated functions (default: current directory)
    #[arg(long, conflicts_with = "label")]
    pub path: Option<PathBuf>,

    /// Deploy the single codemod or function with this label
    #[arg(long)]
    pub label: Option<String>,

    /// Message describing this deployment
    #[arg(short = 'm', long)]
    pub message: Option<String>,
}

pub fn execute(args: DeployArgs) -> Result<()> {
    let session = Session::load()?;
    session.requires_auth()?;

    let targets = match &args.label {
        Some(label) => {
            let resolved = session.manager().resolve(label, session.root())?;
            vec![resolved.into_target()?]
        }
        None => {
            let root = match &args.path {
                Some(path) => session.root().join(path),
                None => session.root().to_path_buf(),
            };
            let targets: Vec<Target> = scan(&root).into_iter().map(Target::from).collect();
            if targets.is_empty() {
                println!(
                    "{} No @codegen.function decorators found in {}",
                    icons::warning(),
                    root.display()
                );
                return Ok(());
            }
            targets
        }
    };

    let repo_full_name = session.repo_full_name()?;
    let api = session.api()?;

    for target in targets {
        let spinner = Spinner::builder(format!("Deploying {}...", target.name)).start();
        let response = api.deploy(DeployInput {
            codemod_name: target.name.clone(),
            codemod_source: target.source,
            repo_full_name: repo_full_name.clone(),
            lint_mode: target.lint_mode,
            lint_user_whitelist: target.lint_user_whitelist,
            message: args.message.clone(),
        });
        let response = match response {
            Ok(response) => response,
            Err(e) => {
                spinner.error(format!("Failed to deploy {}", target.name));
                return Err(e.into());
            }
        };
        spinner.finish();

        let verb = if response.new { "Deployed" } else { "Updated" };
        println!(
            "{} {verb} {} (codemod {}, version {})",
            icons::success(),
            target.name.with_style(Style::Cyan).bold(),
            response.codemod_id,
            response.version_id
        );
        println!("   {} {}", "View:".with_style(Style::Dim), response.url.underline());
    }
    Ok(())
}
