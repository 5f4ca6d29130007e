use anyhow::Result;
use clap::Args;
use codegen_ui::icons;

#[derive(Args, Debug)]
#[command(about = "Remove the stored authentication token")]
pub struct LogoutArgs {}

pub fn execute(_args: LogoutArgs) -> Result<()> {
    codegen_api::clear_token()?;
    println!("{} Logged out successfully", icons::success());
    Ok(())
}
