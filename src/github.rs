//! GitHub contents API client for the feed repository.
//!
//! The feed document and uploaded images live in a GitHub repository and
//! are written through the contents API: read the existing file to learn
//! its `sha` revision marker, then PUT the full base64-encoded content with
//! that marker (or without one, creating the file).

use base64::{engine::general_purpose, Engine as _};
use log::{debug, info};

use crate::config::Config;
use crate::errors::WorkflowError;

const API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = "promobot";

/// Repository prefix under which uploaded images are stored.
pub const ASSET_PREFIX: &str = "cache-image";

pub struct GithubClient {
    token: String,
    repository: String,
    http: reqwest::Client,
}

impl GithubClient {
    pub fn new(config: &Config) -> Self {
        Self {
            token: config.git_token.clone(),
            repository: config.github_repository.clone(),
            http: reqwest::Client::new(),
        }
    }

    fn contents_url(&self, path: &str) -> String {
        format!("{API_BASE}/repos/{}/contents/{path}", self.repository)
    }

    /// Revision marker of an existing file, or `None` when it does not
    /// exist yet.
    async fn fetch_sha(&self, path: &str) -> Option<String> {
        let response = self
            .http
            .get(self.contents_url(path))
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/vnd.github.v3+json")
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            return None;
        }
        let body: serde_json::Value = response.json().await.ok()?;
        body["sha"].as_str().map(str::to_string)
    }

    /// Write a file, creating or updating it as needed. Returns the API
    /// response body.
    async fn put_file(
        &self,
        path: &str,
        content: &[u8],
        message: &str,
    ) -> Result<serde_json::Value, WorkflowError> {
        let sha = self.fetch_sha(path).await;
        debug!("Writing {path} (existing sha: {sha:?})");

        let mut body = serde_json::json!({
            "message": message,
            "content": general_purpose::STANDARD.encode(content),
        });
        if let Some(sha) = sha {
            body["sha"] = serde_json::Value::String(sha);
        }

        let response = self
            .http
            .put(self.contents_url(path))
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/vnd.github.v3+json")
            .header("User-Agent", USER_AGENT)
            .json(&body)
            .send()
            .await
            .map_err(|e| WorkflowError::PublishPartialFailure(e.to_string()))?;

        let status = response.status();
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| WorkflowError::PublishPartialFailure(e.to_string()))?;
        if status.as_u16() == 200 || status.as_u16() == 201 {
            Ok(body)
        } else {
            Err(WorkflowError::PublishPartialFailure(format!(
                "GitHub write of {path} returned {status}: {body}"
            )))
        }
    }

    /// Push the full feed document to the repository.
    pub async fn update_feed_file(&self, path: &str, xml: &str) -> Result<(), WorkflowError> {
        self.put_file(path, xml.as_bytes(), "Update RSS feed").await?;
        info!("RSS feed updated on GitHub");
        Ok(())
    }

    /// Upload an image under the asset prefix and return its public
    /// download URL.
    pub async fn upload_asset(
        &self,
        bytes: &[u8],
        file_name: &str,
    ) -> Result<String, WorkflowError> {
        let path = format!("{ASSET_PREFIX}/{file_name}");
        let body = self
            .put_file(&path, bytes, &format!("Add {file_name}"))
            .await?;
        let download_url = body["content"]["download_url"].as_str().ok_or_else(|| {
            WorkflowError::PublishPartialFailure(format!(
                "upload of {file_name} returned no download URL"
            ))
        })?;
        info!("File {file_name} uploaded to GitHub");
        Ok(download_url.to_string())
    }
}
