pub mod auth;
pub mod client;
pub mod schemas;

pub use auth::{
    StoredToken, TokenClaims, TokenError, UserProfile, clear_token, get_current_token, save_token,
};
pub use client::{ApiError, RestApi};

use std::fmt;

/// Backend workspace selected by the `ENV` variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Production,
    Staging,
    Develop,
}

impl Environment {
    pub fn from_env() -> Self {
        match std::env::var("ENV") {
            Ok(value) => value.parse().unwrap_or_else(|_| {
                log::debug!("Unknown ENV '{value}', using production");
                Self::Production
            }),
            Err(_) => Self::Production,
        }
    }

    /// Prefix of the hosted endpoint names for this environment.
    pub fn workspace(&self) -> &'static str {
        match self {
            Environment::Production => "codegen-sh",
            Environment::Staging => "codegen-sh-staging",
            Environment::Develop => "codegen-sh-develop",
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "staging" => Ok(Environment::Staging),
            "develop" | "dev" => Ok(Environment::Develop),
            other => Err(format!("invalid environment: {other}")),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Environment::Production => "production",
            Environment::Staging => "staging",
            Environment::Develop => "develop",
        };
        f.write_str(name)
    }
}

/// One hosted CLI endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Run,
    Docs,
    AskExpert,
    Identify,
    Create,
    Deploy,
    Lookup,
    RunOnPr,
    PrLookup,
}

impl Endpoint {
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Run => "run",
            Endpoint::Docs => "docs",
            Endpoint::AskExpert => "ask-expert",
            Endpoint::Identify => "identify",
            Endpoint::Create => "create",
            Endpoint::Deploy => "deploy",
            Endpoint::Lookup => "lookup",
            Endpoint::RunOnPr => "run-on-pr",
            Endpoint::PrLookup => "pr-lookup",
        }
    }

    pub fn url(&self) -> String {
        endpoint_url(
            self.name(),
            std::env::var("CODEGEN_API_URL").ok().as_deref(),
            Environment::from_env(),
        )
    }
}

fn endpoint_url(name: &str, base_override: Option<&str>, env: Environment) -> String {
    match base_override {
        Some(base) => format!("{}/cli-{}", base.trim_end_matches('/'), name),
        None => format!("https://{}--cli-{}.modal.run", env.workspace(), name),
    }
}

/// Base URL of the web app, used for login and for run links.
pub fn get_web_base_url() -> String {
    if let Ok(url) = std::env::var("CODEGEN_APP_URL") {
        return url.trim_end_matches('/').to_string();
    }
    "https://codegen.sh".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_urls() {
        assert_eq!(
            endpoint_url("run", None, Environment::Production),
            "https://codegen-sh--cli-run.modal.run"
        );
        assert_eq!(
            endpoint_url(Endpoint::AskExpert.name(), None, Environment::Staging),
            "https://codegen-sh-staging--cli-ask-expert.modal.run"
        );
        assert_eq!(
            endpoint_url("pr-lookup", Some("http://localhost:8000/"), Environment::Develop),
            "http://localhost:8000/cli-pr-lookup"
        );
    }

    #[test]
    fn test_parse_environment() {
        assert_eq!("STAGING".parse(), Ok(Environment::Staging));
        assert_eq!("dev".parse(), Ok(Environment::Develop));
        assert!("local".parse::<Environment>().is_err());
        assert_eq!(Environment::Develop.to_string(), "develop");
    }
}
