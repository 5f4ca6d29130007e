//! Request and response bodies for the hosted CLI endpoints.
//!
//! Every request body wraps its fields in an `input` object, except docs,
//! which uses `docs_input`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Input<T> {
    pub input: T,
}

impl<T> Input<T> {
    pub fn new(input: T) -> Self {
        Self { input }
    }
}

// run

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CodemodRunType {
    #[default]
    Diff,
    Pr,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunCodemodInput {
    pub repo_full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codemod_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codemod_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codemod_source: Option<String>,
    pub codemod_run_type: CodemodRunType,
    pub template_context: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct RunCodemodOutput {
    #[serde(default)]
    pub success: bool,
    pub web_link: Option<String>,
    pub logs: Option<String>,
    /// Unified diff produced by the run.
    pub observation: Option<String>,
    pub error: Option<String>,
}

// expert

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AskExpertInput {
    pub query: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AskExpertResponse {
    pub response: String,
    pub success: bool,
}

// docs

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocsInput {
    pub docs_input: BaseDocsInput,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BaseDocsInput {
    pub repo_full_name: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SerializedExample {
    pub name: Option<String>,
    pub description: Option<String>,
    pub source: String,
    pub language: String,
    #[serde(default)]
    pub docstring: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DocsResponse {
    pub docs: BTreeMap<String, String>,
    pub examples: Vec<SerializedExample>,
    pub language: String,
}

// create

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateInput {
    pub name: String,
    pub query: Option<String>,
    pub repo_full_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CreateResponse {
    pub success: bool,
    pub response: String,
    pub code: String,
    pub codemod_id: i64,
    pub context: Option<String>,
}

// identify

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AuthContext {
    pub token_id: i64,
    pub expires_at: String,
    pub status: String,
    pub user_id: i64,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct IdentifiedUser {
    pub id: i64,
    pub email: String,
    pub github_username: String,
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct IdentifyResponse {
    pub auth_context: AuthContext,
    pub user: IdentifiedUser,
}

// deploy

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeployInput {
    pub codemod_name: String,
    pub codemod_source: String,
    pub repo_full_name: String,
    pub lint_mode: bool,
    pub lint_user_whitelist: Vec<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DeployResponse {
    pub success: bool,
    pub new: bool,
    pub codemod_id: i64,
    pub version_id: i64,
    pub url: String,
}

// lookup

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LookupInput {
    pub codemod_name: String,
    pub repo_full_name: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LookupOutput {
    pub codemod_id: i64,
    pub version_id: i64,
}

// run on pr

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunOnPrInput {
    pub codemod_name: String,
    pub repo_full_name: String,
    pub github_pr_number: u64,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RunOnPrResponse {
    pub codemod_id: i64,
    pub codemod_run_id: i64,
    pub web_url: String,
}

// pr lookup

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PrLookupInput {
    pub repo_full_name: String,
    pub github_pr_number: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PullRequest {
    pub url: String,
    pub title: String,
    pub body: String,
    pub github_pr_number: u64,
    pub codegen_pr_id: i64,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PrLookupResponse {
    pub pr: PullRequest,
}
