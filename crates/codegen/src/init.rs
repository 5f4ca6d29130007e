use anyhow::{Result, bail};
use clap::Args;
use codegen_core::{WorkspaceLayout, git};
use codegen_ui::{Colorize, Spinner, Style, StyledText, icons};
use std::path::Path;

use crate::session::Session;
use crate::templates;

#[derive(Args, Debug)]
#[command(about = "Initialize or update the .codegen folder")]
pub struct InitArgs {
    /// Organization that owns the repository
    #[arg(long)]
    pub organization_name: Option<String>,

    /// Name of the repository
    #[arg(long)]
    pub repo_name: Option<String>,

    /// Download docs and examples for this repository (default)
    #[arg(long, overrides_with = "no_fetch_docs")]
    pub fetch_docs: bool,

    /// Skip downloading docs and examples
    #[arg(long, overrides_with = "fetch_docs")]
    pub no_fetch_docs: bool,
}

pub fn execute(args: InitArgs) -> Result<()> {
    let mut session = Session::load()?;

    if !git::is_inside_work_tree(session.root()) {
        bail!(
            "Not in a git repository. Run this command from within a git repository:\n  git init\n  git remote add origin <your-repo-url>\n  codegen init"
        );
    }

    let layout = WorkspaceLayout::new(session.root());
    let is_update = layout.exists();

    let config = session.config_mut();
    if let Some(org) = args.organization_name {
        config.organization_name = org;
    }
    if let Some(repo) = args.repo_name {
        config.repo_name = repo;
    }
    if config.organization_name.is_empty() || config.repo_name.is_empty() {
        match git::origin_url(session.root()).and_then(|url| git::parse_org_and_repo(&url)) {
            Ok((org, repo)) => {
                let config = session.config_mut();
                if config.organization_name.is_empty() {
                    config.organization_name = org;
                }
                if config.repo_name.is_empty() {
                    config.repo_name = repo;
                }
            }
            Err(e) => {
                log::debug!("Could not read org/repo from origin: {e:#}");
                bail!(
                    "Could not determine the repository from the 'origin' remote. Pass --organization-name and --repo-name."
                );
            }
        }
    }

    let action = if is_update { "Updating" } else { "Initializing" };
    layout.create()?;
    session.write_config()?;

    if args.fetch_docs || !args.no_fetch_docs {
        fetch_docs(&mut session, &layout, action)?;
    }

    println!("{} {action} complete", icons::success());
    println!(
        "   {} {}",
        "Organization:".with_style(Style::Dim),
        session.config().organization_name
    );
    println!(
        "   {} {}",
        "Repository:  ".with_style(Style::Dim),
        session.config().repo_name
    );
    println!();
    println!("Folders:");
    println!("   Location:  {}", display_rel(&layout.codegen_dir, session.root()));
    println!("   Docs:      {}", display_rel(&layout.docs_dir, session.root()));
    println!("   Examples:  {}", display_rel(&layout.examples_dir, session.root()));

    println!("\n{}\n", "What's next?".bold());
    println!("1. Create a function:");
    println!(
        "   {}",
        "codegen create my-function -d \"describe what you want to do\"".with_style(Style::Cyan)
    );
    println!("2. Run it:");
    println!(
        "   {}",
        "codegen run my-function --apply-local".with_style(Style::Cyan)
    );
    Ok(())
}

fn fetch_docs(session: &mut Session, layout: &WorkspaceLayout, action: &str) -> Result<()> {
    let api = session.api()?;
    let repo_full_name = session.repo_full_name()?;

    let spinner = Spinner::builder(format!("{action} folders...")).start();
    spinner.set_message("Fetching docs and examples...");
    let response = match api.get_docs(&repo_full_name) {
        Ok(response) => response,
        Err(e) => {
            spinner.error("Failed to fetch docs");
            return Err(e.into());
        }
    };

    spinner.set_message("Populating docs...");
    let docs = layout.write_docs(response.docs.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;

    spinner.set_message("Populating example codemods...");
    let examples = layout.write_examples(response.examples.iter().enumerate().map(|(i, example)| {
        (
            templates::example_file_name(example, i),
            templates::format_example(example),
        )
    }))?;
    spinner.finish();
    log::debug!("Wrote {docs} docs and {examples} examples");

    session.config_mut().programming_language = Some(response.language);
    session.write_config()
}

fn display_rel(path: &Path, root: &Path) -> String {
    format!("./{}", path.strip_prefix(root).unwrap_or(path).display())
}
