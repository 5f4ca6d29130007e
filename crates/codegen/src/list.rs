use anyhow::Result;
use clap::Args;
use codegen_core::{Codemod, DecoratedFunction};
use codegen_ui::{Colorize, Style, StyledText};
use comfy_table::Table;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use std::path::Path;

use crate::session::Session;

#[derive(Args, Debug)]
#[command(about = "List stored codemods and decorated functions")]
pub struct ListArgs {
    /// Only show decorated functions found under the current directory
    #[arg(long)]
    pub decorated: bool,

    /// Only show stored codemods
    #[arg(long)]
    pub stored: bool,
}

pub fn execute(args: ListArgs) -> Result<()> {
    let session = Session::load()?;
    session.requires_auth()?;
    session.requires_init()?;

    let show_all = !args.decorated && !args.stored;
    let manager = session.manager();

    if show_all || args.stored {
        let codemods = manager.list()?;
        if !codemods.is_empty() {
            println!("{}", "Stored Codemods".with_style(Style::Blue).bold());
            println!("{}", codemods_table(&codemods, session.root()));
            println!("\nRun a stored codemod with:");
            println!("  {}", "codegen run <name>".with_style(Style::Cyan));
        } else {
            println!("{}", "No stored codemods found.".with_style(Style::Yellow));
            println!("\nCreate one with:");
            println!("  {}", "codegen create <name>".with_style(Style::Cyan));
        }
    }

    if show_all {
        println!();
    }

    if show_all || args.decorated {
        let functions = manager.get_decorated(Some(session.root()))?;
        if !functions.is_empty() {
            println!("{}", "Decorated Functions".with_style(Style::Blue).bold());
            println!("{}", functions_table(&functions, session.root()));
            println!("\nRun a decorated function with:");
            println!("  {}", "codegen run <label>".with_style(Style::Cyan));
        } else {
            println!(
                "{}",
                "No decorated functions found in current directory.".with_style(Style::Yellow)
            );
            println!("\nAdd a function with the @codegen.function decorator:");
            println!("  {}", "@codegen.function('label')".with_style(Style::Cyan));
        }
    }

    Ok(())
}

fn codemods_table(codemods: &[Codemod], root: &Path) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(comfy_table::ContentArrangement::Dynamic);
    table.set_header(vec!["Name", "Active", "Path"]);
    for codemod in codemods {
        table.add_row(vec![
            codemod.name.clone(),
            if codemod.is_active() { "*" } else { "" }.to_string(),
            codemod.relative_path(root).display().to_string(),
        ]);
    }
    table
}

fn functions_table(functions: &[DecoratedFunction], root: &Path) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(comfy_table::ContentArrangement::Dynamic);
    table.set_header(vec!["Name", "Type", "Path"]);
    for func in functions {
        let path = match &func.filepath {
            Some(path) => path.strip_prefix(root).unwrap_or(path).display().to_string(),
            None => "<unknown>".to_string(),
        };
        table.add_row(vec![func.name.clone(), func.kind().to_string(), path]);
    }
    table
}
