//! Local side of the codegen CLI: finding decorated functions in a source
//! tree, the `.codegen/codemods` registry and the active-codemod marker.

pub mod active;
pub mod codemods;
pub mod config;
pub mod file_walker;
pub mod function_finder;
pub mod git;
pub mod workspace;

pub use active::{ActiveCodemod, MarkerFile, get_active, set_active};
pub use codemods::{
    Codemod, CodemodConfig, CodemodManager, ResolveError, Resolved, Target, get_valid_name,
    is_plain_name, resolve_function,
};
pub use config::Config;
pub use file_walker::{SkipReason, scan, scan_file};
pub use function_finder::{DecoratedFunction, ExtractError, extract};
pub use workspace::WorkspaceLayout;

/// Per-repository folder holding codemods, docs and config.
pub const CODEGEN_DIR: &str = ".codegen";
pub const CODEMODS_DIR: &str = "codemods";
pub const DOCS_DIR: &str = "docs";
pub const EXAMPLES_DIR: &str = "examples";

/// Main file of every stored codemod.
pub const MAIN_FILE: &str = "run.py";
pub const ACTIVE_CODEMOD_FILE: &str = "active_codemod.txt";
pub const CONFIG_JSON: &str = "config.json";
pub const CONFIG_TOML: &str = "config.toml";
