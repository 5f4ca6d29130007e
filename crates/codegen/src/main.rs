#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use colored::Colorize;
use env_logger::Env;

mod create;
mod deploy;
mod expert;
mod init;
mod list;
mod login;
mod logout;
mod profile;
mod render;
mod run;
mod run_on_pr;
mod session;
mod templates;

#[derive(Parser)]
#[command(name = "codegen")]
#[command(about = "Write, run and deploy codemods", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true, hide = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store an authentication token
    Login(login::LoginArgs),

    /// Remove the stored authentication token
    Logout(logout::LogoutArgs),

    /// Show the logged-in user and repository
    Profile(profile::ProfileArgs),

    /// Initialize or update the .codegen folder
    Init(init::InitArgs),

    /// Create a new codemod
    Create(create::CreateArgs),

    /// List stored codemods and decorated functions
    #[command(alias = "ls")]
    List(list::ListArgs),

    /// Run a codemod against this repository
    Run(run::RunArgs),

    /// Deploy decorated functions
    Deploy(deploy::DeployArgs),

    /// Run a deployed codemod against a pull request
    RunOnPr(run_on_pr::RunOnPrArgs),

    /// Ask the codegen expert a question
    Expert(expert::ExpertArgs),
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {e}", "Error:".red());
        for cause in e.chain().skip(1) {
            eprintln!("  {cause}");
        }
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // --debug picks the default level; RUST_LOG still wins
    let env = if cli.debug {
        Env::default().default_filter_or("debug")
    } else {
        Env::default().default_filter_or("error")
    };
    env_logger::Builder::from_env(env).init();

    match cli.command {
        Commands::Login(args) => login::execute(args),
        Commands::Logout(args) => logout::execute(args),
        Commands::Profile(args) => profile::execute(args),
        Commands::Init(args) => init::execute(args),
        Commands::Create(args) => create::execute(args),
        Commands::List(args) => list::execute(args),
        Commands::Run(args) => run::execute(args),
        Commands::Deploy(args) => deploy::execute(args),
        Commands::RunOnPr(args) => run_on_pr::execute(args),
        Commands::Expert(args) => expert::execute(args),
    }
}
