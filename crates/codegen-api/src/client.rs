use reqwest::Method;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

use crate::Endpoint;
use crate::schemas::*;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid or expired authentication token. Run `codegen login` to log in again.")]
    InvalidToken,

    #[error("{0}")]
    Server(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Authenticated client for the hosted CLI endpoints.
pub struct RestApi {
    client: Client,
    token: String,
}

impl RestApi {
    pub fn new(token: impl Into<String>) -> Result<Self, ApiError> {
        // runs and docs generation can take minutes server-side
        let client = Client::builder()
            .timeout(Duration::from_secs(600))
            .build()?;
        Ok(Self {
            client,
            token: token.into(),
        })
    }

    fn request<I, O>(
        &self,
        method: Method,
        endpoint: Endpoint,
        body: Option<&I>,
    ) -> Result<O, ApiError>
    where
        I: Serialize,
        O: DeserializeOwned,
    {
        let url = endpoint.url();
        log::debug!("{method} {url}");

        let mut request = self.client.request(method, &url).bearer_auth(&self.token);
        if let Some(body) = body {
            if log::log_enabled!(log::Level::Debug) {
                if let Ok(pretty) = serde_json::to_string_pretty(body) {
                    log::debug!("{pretty}");
                }
            }
            request = request.json(body);
        }

        let response = request.send()?;
        let status = response.status();
        let text = response.text()?;
        decode_response(status, &text)
    }

    pub fn run(
        &self,
        repo_full_name: &str,
        codemod_name: &str,
        codemod_source: Option<&str>,
        run_type: CodemodRunType,
        template_context: BTreeMap<String, String>,
    ) -> Result<RunCodemodOutput, ApiError> {
        let body = Input::new(RunCodemodInput {
            repo_full_name: repo_full_name.to_string(),
            codemod_id: None,
            codemod_name: Some(codemod_name.to_string()),
            codemod_source: codemod_source.map(str::to_string),
            codemod_run_type: run_type,
            template_context,
        });
        self.request(Method::POST, Endpoint::Run, Some(&body))
    }

    pub fn get_docs(&self, repo_full_name: &str) -> Result<DocsResponse, ApiError> {
        let body = DocsInput {
            docs_input: BaseDocsInput {
                repo_full_name: repo_full_name.to_string(),
            },
        };
        self.request(Method::GET, Endpoint::Docs, Some(&body))
    }

    pub fn ask_expert(&self, query: &str) -> Result<AskExpertResponse, ApiError> {
        let body = Input::new(AskExpertInput {
            query: query.to_string(),
        });
        self.request(Method::GET, Endpoint::AskExpert, Some(&body))
    }

    /// Ask the backend for starter code for a new codemod.
    pub fn create(
        &self,
        name: &str,
        query: Option<&str>,
        repo_full_name: Option<&str>,
    ) -> Result<CreateResponse, ApiError> {
        let body = Input::new(CreateInput {
            name: name.to_string(),
            query: query.map(str::to_string),
            repo_full_name: repo_full_name.map(str::to_string),
        });
        self.request(Method::GET, Endpoint::Create, Some(&body))
    }

    pub fn identify(&self) -> Result<IdentifyResponse, ApiError> {
        self.request::<(), _>(Method::POST, Endpoint::Identify, None)
    }

    pub fn deploy(&self, input: DeployInput) -> Result<DeployResponse, ApiError> {
        self.request(Method::POST, Endpoint::Deploy, Some(&Input::new(input)))
    }

    pub fn lookup(
        &self,
        codemod_name: &str,
        repo_full_name: &str,
    ) -> Result<LookupOutput, ApiError> {
        let body = Input::new(LookupInput {
            codemod_name: codemod_name.to_string(),
            repo_full_name: repo_full_name.to_string(),
        });
        self.request(Method::GET, Endpoint::Lookup, Some(&body))
    }

    pub fn run_on_pr(
        &self,
        codemod_name: &str,
        repo_full_name: &str,
        github_pr_number: u64,
        language: Option<&str>,
    ) -> Result<RunOnPrResponse, ApiError> {
        let body = Input::new(RunOnPrInput {
            codemod_name: codemod_name.to_string(),
            repo_full_name: repo_full_name.to_string(),
            github_pr_number,
            language: language.map(str::to_string),
        });
        self.request(Method::POST, Endpoint::RunOnPr, Some(&body))
    }

    pub fn lookup_pr(
        &self,
        repo_full_name: &str,
        github_pr_number: u64,
    ) -> Result<PullRequest, ApiError> {
        let body = Input::new(PrLookupInput {
            repo_full_name: repo_full_name.to_string(),
            github_pr_number,
        });
        let response: PrLookupResponse =
            self.request(Method::GET, Endpoint::PrLookup, Some(&body))?;
        Ok(response.pr)
    }
}

/// Map a status code and body onto the decoded output or an [`ApiError`].
fn decode_response<O: DeserializeOwned>(status: StatusCode, body: &str) -> Result<O, ApiError> {
    match status {
        StatusCode::OK => serde_json::from_str(body)
            .map_err(|e| ApiError::Server(format!("Invalid response format: {e}"))),
        StatusCode::UNAUTHORIZED => Err(ApiError::InvalidToken),
        StatusCode::INTERNAL_SERVER_ERROR => Err(ApiError::Server(
            "The server encountered an error while processing your request".to_string(),
        )),
        _ => {
            let detail = match serde_json::from_str::<serde_json::Value>(body) {
                Ok(serde_json::Value::Object(mut map)) => match map.remove("detail") {
                    Some(serde_json::Value::String(detail)) => detail,
                    Some(detail) => detail.to_string(),
                    None => serde_json::Value::Object(map).to_string(),
                },
                Ok(other) => other.to_string(),
                Err(_) => body.to_string(),
            };
            Err(ApiError::Server(format!(
                "Error ({}): {}",
                status.as_u16(),
                detail
            )))
        }
    }
}
