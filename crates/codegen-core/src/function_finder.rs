//! Discovery of `@codegen.*` decorated functions in Python source.
//!
//! The module is parsed once with ruff's parser, then every function
//! definition is checked for a decorator of the shape
//! `codegen.<attr>[.<attr>...](<label>, ...)`. Matching functions yield a
//! [`DecoratedFunction`] carrying the label and the dedented body text.

use std::path::PathBuf;

use ruff_python_ast::visitor::{self, Visitor};
use ruff_python_ast::{Decorator, Expr, ExprCall, Keyword, Stmt, StmtFunctionDef};
use ruff_text_size::Ranged;
use thiserror::Error;

/// Identifier every recognized decorator chain must be rooted at.
pub const MARKER_NAMESPACE: &str = "codegen";

/// Attribute name that turns a function into a pull-request check.
pub const WEBHOOK_ATTR: &str = "webhook";

/// Keyword argument listing users to notify for webhooks.
const USERS_KEYWORD: &str = "users";

/// A function annotated with a `codegen` decorator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoratedFunction {
    /// Label passed as the decorator's first argument.
    pub name: String,
    /// Body statements only, dedented. No `def` line, no decorators.
    pub source: String,
    /// Registered as a reactive pull-request check instead of a transform.
    pub lint_mode: bool,
    /// Usernames without the leading `@`. Empty unless `lint_mode`.
    pub lint_user_whitelist: Vec<String>,
    /// File the function was found in, `None` for in-memory content.
    pub filepath: Option<PathBuf>,
}

impl DecoratedFunction {
    pub fn kind(&self) -> &'static str {
        if self.lint_mode {
            "Webhook"
        } else {
            "Function"
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to parse source: {0}")]
    Parse(String),

    #[error("decorator on `{function}` must take a string literal as its first argument")]
    NonLiteralLabel { function: String },

    #[error("`users` on `{function}` must be a list of string literals")]
    InvalidWhitelist { function: String },
}

/// Extract every decorated function from a Python module.
///
/// Returned functions have no `filepath`; the scanner fills it in.
pub fn extract(content: &str) -> Result<Vec<DecoratedFunction>, ExtractError> {
    let parsed = ruff_python_parser::parse_module(content)
        .map_err(|err| ExtractError::Parse(err.to_string()))?;

    let mut finder = FunctionFinder {
        source: content,
        functions: Vec::new(),
        error: None,
    };
    finder.visit_body(&parsed.syntax().body);

    match finder.error {
        Some(err) => Err(err),
        None => Ok(finder.functions),
    }
}

struct FunctionFinder<'s> {
    source: &'s str,
    functions: Vec<DecoratedFunction>,
    error: Option<ExtractError>,
}

impl<'a> Visitor<'a> for FunctionFinder<'_> {
    fn visit_stmt(&mut self, stmt: &'a Stmt) {
        if self.error.is_some() {
            return;
        }
        if let Stmt::FunctionDef(func) = stmt {
            if let Err(err) = self.check_function(func) {
                self.error = Some(err);
                return;
            }
        }
        visitor::walk_stmt(self, stmt);
    }
}

impl FunctionFinder<'_> {
    fn check_function(&mut self, func: &StmtFunctionDef) -> Result<(), ExtractError> {
        for decorator in &func.decorator_list {
            let Some(call) = marker_call(decorator) else {
                continue;
            };

            let function = func.name.as_str().to_string();
            let name = match &call.arguments.args[0] {
                Expr::StringLiteral(lit) => lit.value.to_str().to_string(),
                _ => return Err(ExtractError::NonLiteralLabel { function }),
            };

            let lint_mode = attribute_chain(&call.func)
                .iter()
                .any(|attr| *attr == WEBHOOK_ATTR);
            let lint_user_whitelist = if lint_mode {
                users_whitelist(&call.arguments.keywords, &function)?
            } else {
                Vec::new()
            };

            self.functions.push(DecoratedFunction {
                name,
                source: self.body_source(func),
                lint_mode,
                lint_user_whitelist,
                filepath: None,
            });
        }
        Ok(())
    }

    fn body_source(&self, func: &StmtFunctionDef) -> String {
        let body = func
            .body
            .iter()
            .map(|stmt| &self.source[stmt.range()])
            .collect::<Vec<_>>()
            .join("\n");
        textwrap::dedent(&body)
    }
}

/// Returns the call when a decorator matches `codegen.<attr>...(<arg>, ...)`.
fn marker_call(decorator: &Decorator) -> Option<&ExprCall> {
    let Expr::Call(call) = &decorator.expression else {
        return None;
    };
    if call.arguments.args.is_empty() {
        return None;
    }
    let Expr::Attribute(attr) = call.func.as_ref() else {
        return None;
    };
    has_marker_root(&attr.value).then_some(call)
}

fn has_marker_root(expr: &Expr) -> bool {
    match expr {
        Expr::Name(name) => name.id.as_str() == MARKER_NAMESPACE,
        Expr::Attribute(attr) => has_marker_root(&attr.value),
        _ => false,
    }
}

/// Attribute names from the outermost access inwards.
fn attribute_chain(expr: &Expr) -> Vec<&str> {
    let mut attrs = Vec::new();
    let mut current = expr;
    while let Expr::Attribute(attr) = current {
        attrs.push(attr.attr.as_str());
        current = &attr.value;
    }
    attrs
}

fn users_whitelist(keywords: &[Keyword], function: &str) -> Result<Vec<String>, ExtractError> {
    let Some(keyword) = keywords
        .iter()
        .find(|kw| kw.arg.as_ref().is_some_and(|arg| arg.as_str() == USERS_KEYWORD))
    else {
        return Ok(Vec::new());
    };

    let invalid = || ExtractError::InvalidWhitelist {
        function: function.to_string(),
    };
    let Expr::List(list) = &keyword.value else {
        return Err(invalid());
    };
    list.elts
        .iter()
        .map(|elt| match elt {
            Expr::StringLiteral(lit) => {
                let user = lit.value.to_str();
                Ok(user.trim_start_matches('@').to_string())
            }
            _ => Err(invalid()),
        })
        .collect()
}
