use anyhow::{Result, bail};
use clap::Args;
use codegen_ui::{Style, StyledText, icons};
use inquire::{Password, PasswordDisplayMode};

const TOKEN_ENV: &str = "CODEGEN_USER_ACCESS_TOKEN";

#[derive(Args, Debug)]
#[command(about = "Store an authentication token")]
pub struct LoginArgs {
    /// Token to store; otherwise read from CODEGEN_USER_ACCESS_TOKEN or the browser
    #[arg(long)]
    pub token: Option<String>,
}

pub fn execute(args: LoginArgs) -> Result<()> {
    if codegen_api::get_current_token().is_some() {
        bail!("Already logged in. Run `codegen logout` first to switch accounts.");
    }

    let token = match args.token.or_else(token_from_env) {
        Some(token) => token,
        None => prompt_for_token()?,
    };
    if token.trim().is_empty() {
        bail!("Token must be provided via --token, {TOKEN_ENV} or the browser prompt");
    }

    let stored = codegen_api::save_token(&token)?;
    let path = codegen_api::auth::get_auth_file_path()?;
    println!(
        "{} Stored token to: {}",
        icons::success(),
        path.display().to_string().with_style(Style::Cyan)
    );
    if let Some(email) = &stored.email {
        println!("  Logged in as: {email}");
    }
    println!("  Token expires in: {}", stored.time_until_expiry());
    Ok(())
}

fn token_from_env() -> Option<String> {
    std::env::var(TOKEN_ENV)
        .ok()
        .filter(|token| !token.trim().is_empty())
}

fn prompt_for_token() -> Result<String> {
    let url = format!("{}/cli-token", codegen_api::get_web_base_url());
    println!("Opening {url} to get your authentication token...");
    if let Err(e) = open::that(&url) {
        eprintln!("Failed to open browser: {e}");
        eprintln!("Please manually open: {url}");
    }

    let token = Password::new("Paste your authentication token:")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()?;
    Ok(token)
}
