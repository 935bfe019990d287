//! Client for the remote command execution API.
//!
//! The remote host exposes a single endpoint, `POST /exec`, that runs a shell
//! command and returns its output. File operations are layered on top of it
//! as generated commands.
//!
//! Writes never embed raw content in shell syntax: the payload travels
//! base64-encoded and is decoded on the host, and every path is single-quote
//! escaped. Content of any shape therefore round-trips unchanged and cannot
//! terminate or extend the generated command.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::config::ExecConfig;
use crate::error::{Error, MAX_ERROR_BODY_CHARS, Result, truncate_chars};

/// Default deadline for a remote command.
pub const DEFAULT_EXEC_TIMEOUT: Duration = Duration::from_secs(300);

/// Directory listed when no path is given.
pub const DEFAULT_LIST_PATH: &str = "/config";

/// Output of one remote command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecOutput {
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
    /// `None` when the process had no exit code (killed by a signal).
    pub returncode: Option<i32>,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.returncode == Some(0)
    }

    /// Decode an exec API reply. A body without a `returncode` field is not
    /// command output, so it is relayed as an invalid response.
    pub fn from_body(body: &str) -> Result<Self> {
        let invalid =
            || Error::InvalidResponse(truncate_chars(body, MAX_ERROR_BODY_CHARS).to_string());
        let value: serde_json::Value = serde_json::from_str(body).map_err(|_| invalid())?;
        if value.get("returncode").is_none() {
            return Err(invalid());
        }
        serde_json::from_value(value).map_err(|_| invalid())
    }

    /// Error text for a failed command.
    pub fn failure_message(&self) -> String {
        if self.stderr.trim().is_empty() {
            "Unknown error".to_string()
        } else {
            self.stderr.clone()
        }
    }
}

#[derive(Serialize)]
struct ExecRequest<'a> {
    cmd: &'a str,
}

pub struct ExecClient {
    http: Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl ExecClient {
    pub fn new(config: &ExecConfig) -> Self {
        Self {
            http: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Run `cmd` on the remote host, waiting at most `timeout`.
    pub async fn exec(&self, cmd: &str, timeout: Duration) -> Result<ExecOutput> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(Error::NotConfigured("Exec API key"))?;

        let secs = timeout.as_secs();
        tracing::debug!(timeout_secs = secs, "exec: {}", preview(cmd));

        let response = self
            .http
            .post(format!("{}/exec", self.base_url))
            .header("X-API-Key", api_key.expose_secret())
            .timeout(timeout)
            .json(&ExecRequest { cmd })
            .send()
            .await
            .map_err(|e| Error::from_request(e, secs))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::http(status.as_u16(), &body));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::from_request(e, secs))?;
        ExecOutput::from_body(&body)
    }

    pub async fn read_file(&self, path: &str) -> Result<ExecOutput> {
        self.exec(&read_command(path), DEFAULT_EXEC_TIMEOUT).await
    }

    pub async fn write_file(&self, path: &str, content: &str) -> Result<ExecOutput> {
        self.exec(&write_command(path, content), DEFAULT_EXEC_TIMEOUT)
            .await
    }

    pub async fn list_directory(&self, path: &str) -> Result<ExecOutput> {
        self.exec(&list_command(path), DEFAULT_EXEC_TIMEOUT).await
    }
}

/// Quote `s` as a single POSIX shell word.
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

pub fn read_command(path: &str) -> String {
    format!("cat -- {}", shell_quote(path))
}

pub fn list_command(path: &str) -> String {
    format!("ls -la -- {}", shell_quote(path))
}

pub fn write_command(path: &str, content: &str) -> String {
    format!(
        "printf '%s' '{}' | base64 -d > {}",
        BASE64.encode(content.as_bytes()),
        shell_quote(path)
    )
}

fn preview(cmd: &str) -> &str {
    truncate_chars(cmd, 120)
}
