use anyhow::{Context, Result};
use clap::Args;
use codegen_ui::{Colorize, Spinner, Style, StyledText, icons};

use crate::session::Session;

#[derive(Args, Debug)]
#[command(about = "Run a deployed codemod or webhook against a pull request")]
pub struct RunOnPrArgs {
    /// Label of the codemod or decorated function
    pub label: String,

    /// GitHub pull request number
    pub pr: u64,
}

pub fn execute(args: RunOnPrArgs) -> Result<()> {
    let session = Session::load()?;
    session.requires_auth()?;
    session.requires_init()?;

    let resolved = session.manager().resolve(&args.label, session.root())?;
    let name = resolved.name().to_string();
    let repo_full_name = session.repo_full_name()?;
    let api = session.api()?;

    let spinner = Spinner::builder(format!("Looking up PR #{}...", args.pr)).start();
    let result = api
        .lookup(&name, &repo_full_name)
        .with_context(|| {
            format!("'{name}' is not deployed. Run `codegen deploy --label {name}` first.")
        })
        .and_then(|_| Ok(api.lookup_pr(&repo_full_name, args.pr)?))
        .and_then(|pr| {
            spinner.set_message(format!("Running '{name}' on PR #{}...", args.pr));
            let language = session.config().programming_language.as_deref();
            let response = api.run_on_pr(&name, &repo_full_name, args.pr, language)?;
            Ok((pr, response))
        });
    let (pr, response) = match result {
        Ok(result) => result,
        Err(e) => {
            spinner.error(format!("Failed to run '{name}' on PR #{}", args.pr));
            return Err(e);
        }
    };
    spinner.finish();

    println!(
        "{} Ran {} on PR #{}: {}",
        icons::success(),
        name.with_style(Style::Cyan).bold(),
        pr.github_pr_number,
        pr.title
    );
    println!(
        "   {} {}",
        "View results:".with_style(Style::Dim),
        response.web_url.underline()
    );
    Ok(())
}
