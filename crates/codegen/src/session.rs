use anyhow::{Context, Result, bail};
use codegen_api::{RestApi, UserProfile};
use codegen_core::{CODEGEN_DIR, CodemodManager, Config, git};
use std::path::{Path, PathBuf};

/// Everything a command needs about where it runs and who runs it.
pub struct Session {
    root: PathBuf,
    codegen_dir: PathBuf,
    config: Config,
    token: Option<String>,
}

impl Session {
    pub fn load() -> Result<Self> {
        let root = std::env::current_dir().context("Failed to get current directory")?;
        let codegen_dir = root.join(CODEGEN_DIR);
        let config = Config::load(&codegen_dir)?;
        Ok(Self {
            root,
            codegen_dir,
            config,
            token: codegen_api::get_current_token(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn codegen_dir(&self) -> &Path {
        &self.codegen_dir
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn write_config(&self) -> Result<()> {
        self.config.write(&self.codegen_dir)
    }

    pub fn manager(&self) -> CodemodManager {
        CodemodManager::new(&self.codegen_dir)
    }

    pub fn requires_auth(&self) -> Result<&str> {
        match &self.token {
            Some(token) => Ok(token),
            None => bail!("Not logged in. Run `codegen login` first."),
        }
    }

    pub fn requires_init(&self) -> Result<()> {
        if !self.codegen_dir.is_dir() {
            bail!(
                "Codegen is not initialized in {}. Run `codegen init` first.",
                self.root.display()
            );
        }
        Ok(())
    }

    pub fn api(&self) -> Result<RestApi> {
        Ok(RestApi::new(self.requires_auth()?)?)
    }

    /// Profile decoded from the stored token, if logged in.
    pub fn profile(&self) -> Option<UserProfile> {
        let token = self.token.as_deref()?;
        UserProfile::from_token(token).ok()
    }

    /// `org/repo` from the config, falling back to the `origin` remote.
    pub fn repo_full_name(&self) -> Result<String> {
        if let Some(name) = self.config.repo_full_name() {
            return Ok(name);
        }
        let url = git::origin_url(&self.root).context(
            "Repository name is not configured. Run `codegen init` or pass --organization-name and --repo-name.",
        )?;
        let (org, repo) = git::parse_org_and_repo(&url)?;
        Ok(format!("{org}/{repo}"))
    }
}
