//! Hermetic sandbox for driving the `codegen` binary in tests.
//!
//! - Private `HOME`/`XDG_CONFIG_HOME`, so the token file never touches the real one
//! - Private `.gitconfig` with a fixed identity
//! - `CODEGEN_API_URL` points at a closed local port, so a stray request fails fast
//!
//! Everything lives under an `assert_fs::TempDir` and is cleaned up on drop.
//!
//! ## Quick example
//! ```no_run
//! use codegen_test_utils::sandbox::Sandbox;
//!
//! let mut sb = Sandbox::new();
//! sb.git_init("https://github.com/acme/widgets.git")
//!     .write("app/main.py", "@codegen.function(\"fix\")\ndef run(codebase):\n    pass\n");
//! sb.login();
//!
//! let out = sb.codegen(["list", "--decorated"]);
//! assert!(out.success);
//! ```

use assert_fs::TempDir;
use assert_fs::fixture::PathChild;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use duct::Expression;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Unreachable API base; connection is refused immediately.
pub const DEAD_API_URL: &str = "http://127.0.0.1:9";

/// Result of a command that may fail.
#[derive(Debug, Clone)]
pub struct CmdOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CmdOutput {
    /// stdout followed by stderr.
    pub fn combined(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }
}

pub struct Sandbox {
    _root: TempDir,
    pub home: PathBuf,
    pub gitconfig: PathBuf,
    default_cwd: PathBuf,
    extra_env: HashMap<String, String>,
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Sandbox {
    pub fn new() -> Self {
        let root = TempDir::new().expect("create sandbox TempDir");
        let home = root.child("home").to_path_buf();
        let gitconfig = home.join(".gitconfig");
        let default_cwd = root.child("repo").to_path_buf();

        fs::create_dir_all(&home).expect("create home dir");
        fs::create_dir_all(&default_cwd).expect("create repo dir");

        let s = Self {
            _root: root,
            home,
            gitconfig,
            default_cwd,
            extra_env: HashMap::new(),
        };
        s.write_gitconfig();
        s
    }

    /// Directory commands run in, `<root>/repo`.
    pub fn default_cwd(&self) -> &Path {
        &self.default_cwd
    }

    /// Add an environment variable to every command.
    pub fn env<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) -> &mut Self {
        self.extra_env.insert(key.into(), value.into());
        self
    }

    /// Write/overwrite a file relative to the default working directory.
    pub fn write<P: AsRef<Path>, S: AsRef<[u8]>>(&mut self, rel: P, contents: S) -> &mut Self {
        let p = self.default_cwd.join(rel);
        if let Some(parent) = p.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        fs::write(p, contents).expect("write file");
        self
    }

    pub fn read<P: AsRef<Path>>(&self, rel: P) -> String {
        fs::read_to_string(self.default_cwd.join(rel)).expect("read file")
    }

    pub fn exists<P: AsRef<Path>>(&self, rel: P) -> bool {
        self.default_cwd.join(rel).exists()
    }

    /// `git init` the working directory and point `origin` at `remote`.
    pub fn git_init(&mut self, remote: &str) -> &mut Self {
        self.cmd("git", ["init", "-q", "-b", "main"])
            .stdout_null()
            .stderr_null()
            .run()
            .expect("git init failed");
        self.cmd("git", ["remote", "add", "origin", remote])
            .run()
            .expect("git remote add failed");
        self
    }

    /// Store a never-expiring token for a fake user.
    pub fn login(&self) -> CmdOutput {
        let token = fake_token(
            r#"{"exp":4102444800,"email":"dev@example.com","user_metadata":{"full_name":"Dev One","preferred_username":"dev1"}}"#,
        );
        let out = self.codegen(["login", "--token", &token]);
        assert!(out.success, "login failed: {}", out.combined());
        out
    }

    /// Build a `duct::Expression` pre-wired with the sandbox env and default cwd.
    pub fn cmd<S: AsRef<OsStr>, I: IntoIterator>(&self, program: S, args: I) -> Expression
    where
        I::Item: AsRef<OsStr>,
    {
        let program_str = program.as_ref().to_string_lossy();
        let args: Vec<_> = args
            .into_iter()
            .map(|arg| arg.as_ref().to_string_lossy().to_string())
            .collect();
        let expr = duct::cmd(program_str.as_ref(), args).dir(&self.default_cwd);
        self.inject_env(expr)
    }

    /// Run the `codegen` binary and capture its output whatever the exit status.
    pub fn codegen<I>(&self, args: I) -> CmdOutput
    where
        I: IntoIterator,
        I::Item: AsRef<OsStr>,
    {
        let output = self
            .cargo_bin("codegen", args)
            .stdout_capture()
            .stderr_capture()
            .unchecked()
            .run()
            .expect("spawn codegen");
        CmdOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }

    fn cargo_bin<I>(&self, program: &str, args: I) -> Expression
    where
        I: IntoIterator,
        I::Item: AsRef<OsStr>,
    {
        let cargo_bin_path = assert_cmd::cargo::cargo_bin(program)
            .to_string_lossy()
            .to_string();
        self.cmd(cargo_bin_path, args)
    }

    fn write_gitconfig(&self) {
        let mut f = File::create(&self.gitconfig).expect("create gitconfig file");
        writeln!(
            f,
            r#"[user]
    name = Sandbox
    email = test@example.com
[init]
    defaultBranch = main
[protocol]
    allow = never
"#
        )
        .expect("write gitconfig");
    }

    pub fn inject_env(&self, expr: Expression) -> Expression {
        let mut env_map: HashMap<String, String> = HashMap::new();
        if let Ok(path) = std::env::var("PATH") {
            env_map.insert("PATH".into(), path);
        }
        env_map.insert("HOME".into(), self.home.to_string_lossy().into_owned());
        env_map.insert(
            "XDG_CONFIG_HOME".into(),
            self.home.to_string_lossy().into_owned(),
        );
        env_map.insert(
            "GIT_CONFIG_GLOBAL".into(),
            self.gitconfig.to_string_lossy().into_owned(),
        );
        env_map.insert(
            "GIT_CONFIG_SYSTEM".into(),
            if cfg!(windows) { "NUL" } else { "/dev/null" }.into(),
        );
        env_map.insert("CODEGEN_API_URL".into(), DEAD_API_URL.into());
        env_map.insert("NO_COLOR".into(), "1".into());
        for (k, v) in &self.extra_env {
            env_map.insert(k.clone(), v.clone());
        }

        expr.full_env(&env_map)
    }
}

/// An unsigned JWT carrying `payload` as its claims.
pub fn fake_token(payload: &str) -> String {
    format!(
        "{}.{}.c2lnbmF0dXJl",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(payload)
    )
}
