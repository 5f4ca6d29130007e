use anyhow::Result;
use clap::Args;
use codegen_api::UserProfile;
use codegen_ui::{Spinner, Style, StyledText};

use crate::session::Session;

#[derive(Args, Debug)]
#[command(about = "Show the logged-in user and repository")]
pub struct ProfileArgs {
    /// Also confirm the token with the backend
    #[arg(long)]
    pub verify: bool,
}

pub fn execute(args: ProfileArgs) -> Result<()> {
    let session = Session::load()?;
    let token = session.requires_auth()?;
    session.requires_init()?;

    let profile = UserProfile::from_token(token)?;
    let repo = session
        .config()
        .repo_full_name()
        .unwrap_or_else(|| "N/A".to_string());

    println!("{}", "Current Profile".with_style(Style::Blue).bold());
    println!("  {} {}", "Name: ".with_style(Style::Cyan), profile.name);
    println!("  {} {}", "Email:".with_style(Style::Cyan), profile.email);
    println!("  {} {}", "Repo: ".with_style(Style::Cyan), repo);

    if args.verify {
        let spinner = Spinner::builder("Verifying token").start();
        let identity = session.api()?.identify();
        spinner.finish();
        let identity = identity?;
        println!(
            "  {} {} ({})",
            "GitHub:".with_style(Style::Cyan),
            identity.user.github_username,
            identity.auth_context.status
        );
        println!(
            "  {} {}",
            "Token expires:".with_style(Style::Cyan),
            identity.auth_context.expires_at
        );
    }
    Ok(())
}
