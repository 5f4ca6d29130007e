//! # codegen-ui
//!
//! Terminal output helpers shared by the codegen commands.
//!
//! ```rust,no_run
//! use codegen_ui::{Spinner, Style, StyledText};
//!
//! let spinner = Spinner::builder("Deploying...").start();
//! // ... do work ...
//! spinner.success(format!("Deployed {}", "rename".with_style(Style::Cyan)));
//! ```

mod spinner;
mod style;

pub use spinner::{Spinner, SpinnerBuilder};
pub use style::{Style, StyledText, icons};

pub use colored::Colorize;
