use codegen_api::schemas::RunCodemodOutput;
use codegen_ui::{Colorize, Style, StyledText};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DiffLine {
    FileHeader,
    Hunk,
    Added,
    Removed,
    Context,
}

impl DiffLine {
    fn classify(line: &str) -> Self {
        if line.starts_with("+++")
            || line.starts_with("---")
            || line.starts_with("diff --git")
            || line.starts_with("index ")
        {
            DiffLine::FileHeader
        } else if line.starts_with("@@") {
            DiffLine::Hunk
        } else if line.starts_with('+') {
            DiffLine::Added
        } else if line.starts_with('-') {
            DiffLine::Removed
        } else {
            DiffLine::Context
        }
    }
}

/// Color a unified diff line by line.
pub fn format_diff(diff: &str) -> String {
    diff.lines()
        .map(|line| match DiffLine::classify(line) {
            DiffLine::FileHeader => line.bold().to_string(),
            DiffLine::Hunk => line.with_style(Style::Cyan).to_string(),
            DiffLine::Added => line.with_style(Style::Green).to_string(),
            DiffLine::Removed => line.with_style(Style::Red).to_string(),
            DiffLine::Context => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Print logs, the diff and (with `web`) the link of a finished run.
pub fn pretty_print_output(output: &RunCodemodOutput, web: bool) {
    if web {
        if let Some(link) = &output.web_link {
            println!("  {} {}", "Web link:".with_style(Style::Dim), link.underline());
        }
    }

    if let Some(logs) = output.logs.as_deref().filter(|l| !l.trim().is_empty()) {
        println!("\n{}", "Logs".with_style(Style::Blue).bold());
        for line in logs.lines() {
            println!("  {}", line.with_style(Style::Dim));
        }
    }

    match output.observation.as_deref().filter(|d| !d.trim().is_empty()) {
        Some(diff) => {
            println!("\n{}", "Diff".with_style(Style::Blue).bold());
            println!("{}", format_diff(diff));
        }
        None => println!("\n{}", "No changes".with_style(Style::Dim)),
    }
}
