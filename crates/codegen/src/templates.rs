use codegen_api::schemas::SerializedExample;

pub const DEFAULT_DESCRIPTION: &str = "A codemod to transform your code";

/// Starter `run.py` for `codegen create` without a description.
pub fn codemod_template(description: &str, author: &str, date: &str) -> String {
    format!(
        r#""""
{description}

Created by: {author}
Date: {date}
"""
from typing import Any

def run(codebase: Any) -> None:
    """
    Your codemod logic goes here.

    Args:
        codebase: The codebase object containing files and symbols
    """
    # Example: Print all Python files
    for file in codebase.files:
        if file.path.endswith(".py"):
            print(f"Found Python file: {{file.path}}")

    # Example: Modify files
    # file = codebase.get_file("example.py")
    # file.edit("New content")
"#
    )
}

/// Wrap backend-generated code with the type hints editors need locally.
pub fn convert_to_cli(source: &str, language: &str) -> String {
    let codebase_type = if language.eq_ignore_ascii_case("python") {
        "PyCodebaseType"
    } else {
        "TSCodebaseType"
    };
    format!(
        r#"
# Type hints for injected variables
from app.codemod.compilation.models.context import CodemodContext
from app.codemod.compilation.models.pr_options import PROptions
from graph_sitter import {codebase_type}

codebase: {codebase_type}
pr_options: PROptions
context: CodemodContext

# Write your code here:
{source}
"#
    )
}

fn format_section(title: &str, content: Option<&str>) -> Option<String> {
    let content = content.filter(|c| !c.is_empty())?;
    let body = content.lines().collect::<Vec<_>>().join("\n    ");
    Some(format!("{title}:\n    {body}"))
}

/// Render one example as a python file with a descriptive docstring header.
pub fn format_example(example: &SerializedExample) -> String {
    let name = example.name.as_deref().unwrap_or("Untitled");
    let sections: Vec<String> = [
        Some(format!("{name}-({})", example.language)),
        format_section("Description", example.description.as_deref()),
        format_section("Docstring", Some(example.docstring.as_str())),
    ]
    .into_iter()
    .flatten()
    .collect();

    format!(
        "\"\"\"{}\"\"\"\n\n{}",
        sections.join("\n"),
        convert_to_cli(&example.source, &example.language)
    )
}

/// File stem for an example; unnamed examples get a positional name.
pub fn example_file_name(example: &SerializedExample, index: usize) -> String {
    match example.name.as_deref() {
        Some(name) if !name.trim().is_empty() => codegen_core::get_valid_name(name.trim()),
        _ => format!("example_{index}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example(
        name: Option<&str>,
        description: Option<&str>,
        docstring: &str,
    ) -> SerializedExample {
        SerializedExample {
            name: name.map(str::to_string),
            description: description.map(str::to_string),
            source: "print(codebase)".to_string(),
            language: "PYTHON".to_string(),
            docstring: docstring.to_string(),
        }
    }

    #[test]
    fn test_codemod_template() {
        let source = codemod_template("Rename things", "Dev One", "2024-01-02");
        assert!(
            source.starts_with("\"\"\"\nRename things\n\nCreated by: Dev One\nDate: 2024-01-02\n")
        );
        assert!(source.contains("print(f\"Found Python file: {file.path}\")"));
        assert!(source.contains("def run(codebase: Any) -> None:"));
    }

    #[test]
    fn test_convert_to_cli_picks_codebase_type() {
        assert!(convert_to_cli("x = 1", "python").contains("codebase: PyCodebaseType"));
        assert!(convert_to_cli("x = 1", "TYPESCRIPT").contains("codebase: TSCodebaseType"));
        assert!(convert_to_cli("x = 1", "python").ends_with("# Write your code here:\nx = 1\n"));
    }

    #[test]
    fn test_format_example() {
        let text = format_example(&example(
            Some("rename_fn"),
            Some("Renames a function\nacross files"),
            "",
        ));
        assert!(text.starts_with(
            "\"\"\"rename_fn-(PYTHON)\nDescription:\n    Renames a function\n    across files\"\"\"\n\n"
        ));
        assert!(text.contains("print(codebase)"));

        let untitled = format_example(&example(None, None, "Docs here"));
        assert!(untitled.starts_with("\"\"\"Untitled-(PYTHON)\nDocstring:\n    Docs here\"\"\""));
    }

    #[test]
    fn test_example_file_name() {
        assert_eq!(example_file_name(&example(Some("Rename Fn"), None, ""), 0), "rename_fn");
        assert_eq!(example_file_name(&example(None, None, ""), 3), "example_3");
    }
}
