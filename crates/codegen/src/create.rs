use anyhow::{Result, bail};
use clap::Args;
use codegen_core::{CodemodConfig, get_valid_name, is_plain_name};
use codegen_ui::{Colorize, Spinner, Style, StyledText, icons};

use crate::session::Session;
use crate::templates;

#[derive(Args, Debug)]
#[command(about = "Create a new codemod in .codegen/codemods")]
pub struct CreateArgs {
    /// Name of the codemod; normalized to snake_case
    pub name: String,

    /// Describe what the codemod should do to get generated starter code
    #[arg(short = 'd', long)]
    pub description: Option<String>,
}

pub fn execute(args: CreateArgs) -> Result<()> {
    let session = Session::load()?;
    session.requires_init()?;

    let name = get_valid_name(&args.name);
    if !is_plain_name(&name) {
        bail!("Invalid codemod name '{name}': must not contain path separators or '..'");
    }
    let manager = session.manager();
    let codemod_dir = manager.codemods_dir().join(&name);
    if codemod_dir.exists() {
        bail!(
            "Codemod '{}' already exists at {}",
            name,
            codemod_dir.display()
        );
    }

    let author = session
        .profile()
        .map(|p| p.name)
        .unwrap_or_else(|| "N/A".to_string());

    let (source, config) = match &args.description {
        Some(description) => {
            let api = session.api()?;
            let repo_full_name = session.repo_full_name().ok();

            let spinner = Spinner::builder("Generating codemod...").start();
            let response = match api.create(&name, Some(description), repo_full_name.as_deref()) {
                Ok(response) => response,
                Err(e) => {
                    spinner.error("Failed to generate codemod");
                    return Err(e.into());
                }
            };
            spinner.finish();

            let language = session
                .config()
                .programming_language
                .as_deref()
                .unwrap_or("python");
            let config = CodemodConfig {
                name: name.clone(),
                codemod_id: response.codemod_id,
                description: Some(description.clone()),
                created_at: chrono::Utc::now().to_rfc3339(),
                created_by: author,
            };
            (templates::convert_to_cli(&response.code, language), Some(config))
        }
        None => {
            let date = chrono::Local::now().format("%Y-%m-%d").to_string();
            (
                templates::codemod_template(templates::DEFAULT_DESCRIPTION, &author, &date),
                None,
            )
        }
    };

    let codemod = manager.create(&name, &source, config)?;
    let location = codemod_dir.strip_prefix(session.root()).unwrap_or(&codemod_dir);
    let main_file = codemod.relative_path(session.root());

    println!(
        "{} Created new codemod: {}",
        icons::success(),
        codemod.name.with_style(Style::Cyan).bold()
    );
    println!("{}", "─".repeat(40));
    println!("Location:  {}", location.display());
    println!("Main file: {}", main_file.display());
    if let Some(config) = &codemod.config {
        println!("Codemod ID: {}", config.codemod_id);
    }
    println!("\nNext steps:");
    println!("1. Edit {} to implement your codemod", main_file.display());
    println!("2. Run it with: {}", "codegen run".with_style(Style::Cyan));
    println!("{}", "─".repeat(40));
    Ok(())
}
