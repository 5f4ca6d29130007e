use anyhow::Result;
use clap::Args;
use codegen_ui::Spinner;

use crate::session::Session;

#[derive(Args, Debug)]
#[command(about = "Ask the codegen expert a question")]
pub struct ExpertArgs {
    /// The question to ask
    pub query: String,
}

pub fn execute(args: ExpertArgs) -> Result<()> {
    let session = Session::load()?;
    session.requires_auth()?;
    session.requires_init()?;

    let api = session.api()?;
    let spinner = Spinner::builder("Asking expert...").start();
    match api.ask_expert(&args.query) {
        Ok(response) => {
            spinner.success("Response received");
            println!("{}", response.response);
            Ok(())
        }
        Err(e) => {
            spinner.error("Expert request failed");
            Err(e.into())
        }
    }
}
