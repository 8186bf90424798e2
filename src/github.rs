//! Minimal GitHub REST client for repository provisioning.

use std::time::Duration;

use anyhow::Context;
use serde::Serialize;

use crate::error::ExitError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoStatus {
    Created,
    AlreadyExists,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStatus {
    Triggered,
    /// The API refused; the push-triggered run still happens.
    Skipped(u16),
}

#[derive(Debug, Serialize)]
struct CreateRepo<'a> {
    name: &'a str,
    description: &'a str,
    private: bool,
    auto_init: bool,
}

#[derive(Debug, Serialize)]
struct Dispatch<'a> {
    #[serde(rename = "ref")]
    git_ref: &'a str,
}

pub struct GitHub {
    agent: ureq::Agent,
    api_base: String,
    token: String,
}

impl GitHub {
    pub fn new(api_base: &str, token: &str) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(30)))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn post(&self, url: &str) -> ureq::RequestBuilder<ureq::typestate::WithBody> {
        self.agent
            .post(url)
            .header("Authorization", &format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", concat!("replybot/", env!("CARGO_PKG_VERSION")))
    }

    /// `POST /user/repos`. 422 means the name is taken by an existing repo.
    pub fn create_repo(
        &self,
        name: &str,
        description: &str,
        private: bool,
    ) -> anyhow::Result<RepoStatus> {
        let url = format!("{}/user/repos", self.api_base);
        let mut response = self
            .post(&url)
            .send_json(&CreateRepo {
                name,
                description,
                private,
                auto_init: false,
            })
            .context("calling GitHub create repository")?;
        let status = response.status().as_u16();
        let body = response.body_mut().read_to_string().unwrap_or_default();
        repo_status(status, &body)
    }

    /// `POST /repos/{owner}/{repo}/actions/workflows/{workflow}/dispatches`.
    pub fn dispatch_workflow(
        &self,
        owner: &str,
        repo: &str,
        workflow: &str,
        git_ref: &str,
    ) -> anyhow::Result<DispatchStatus> {
        let url = format!(
            "{}/repos/{owner}/{repo}/actions/workflows/{workflow}/dispatches",
            self.api_base
        );
        let response = self
            .post(&url)
            .send_json(&Dispatch { git_ref })
            .context("calling GitHub workflow dispatch")?;
        Ok(dispatch_status(response.status().as_u16()))
    }
}

fn repo_status(status: u16, body: &str) -> anyhow::Result<RepoStatus> {
    match status {
        201 => Ok(RepoStatus::Created),
        422 => Ok(RepoStatus::AlreadyExists),
        _ => Err(ExitError::Api {
            service: "GitHub",
            status,
            message: api_message(body),
        }
        .into()),
    }
}

const fn dispatch_status(status: u16) -> DispatchStatus {
    match status {
        204 => DispatchStatus::Triggered,
        other => DispatchStatus::Skipped(other),
    }
}

/// The `message` field of a GitHub error body, or the raw body.
fn api_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

/// Browser URL of a repository.
pub fn repo_url(owner: &str, repo: &str) -> String {
    format!("https://github.com/{owner}/{repo}")
}
