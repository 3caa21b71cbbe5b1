//! Google Drive access: folder lookup, PDF listing, download, rename.
//!
//! All remote access goes through the [`Drive`] trait so the processor can
//! be tested against an in-memory implementation. [`GoogleDrive`] is the
//! real one, speaking the Drive REST API v3 over reqwest with a previously
//! issued OAuth token.
//!
//! ## Authentication
//!
//! This crate never runs the interactive OAuth consent flow. It expects a
//! token file (see [`StoredToken`]) produced by an earlier consent, refreshes
//! the access token with the stored refresh token when it has expired, and
//! persists the refreshed token back to the same file. A missing or
//! unparseable token file is a fatal [`ScanSortError::AuthFailed`].

use crate::config::RenameConfig;
use crate::error::ScanSortError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// A file as returned by the Drive listing API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveFile {
    pub id: String,
    pub name: String,
}

/// Remote storage operations the processor needs.
#[async_trait]
pub trait Drive: Send + Sync {
    /// Look up a folder by display name. `Ok(None)` means no such folder.
    async fn find_folder(&self, name: &str) -> Result<Option<String>, ScanSortError>;

    /// List the PDF files directly inside a folder.
    async fn list_pdfs(&self, folder_id: &str) -> Result<Vec<DriveFile>, ScanSortError>;

    /// Download a file's content to a local path.
    async fn download_to(&self, file_id: &str, dest: &Path) -> Result<(), ScanSortError>;

    /// Change a file's display name.
    async fn rename(&self, file_id: &str, new_name: &str) -> Result<(), ScanSortError>;
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// OAuth token material persisted between runs.
///
/// The layout matches what a one-time consent-flow helper writes: the
/// short-lived access token plus everything needed to mint a new one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    pub refresh_token: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    /// Unix timestamp (seconds) at which `access_token` expires.
    #[serde(default)]
    pub expires_at: u64,
}

impl StoredToken {
    /// Whether the access token is expired (or close enough to be useless
    /// for a multi-minute run). A 60 second margin covers clock skew and
    /// the time between connecting and the last request of the run.
    pub fn is_expired(&self, now: SystemTime) -> bool {
        let now_secs = now
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        now_secs + 60 >= self.expires_at
    }
}

#[derive(Deserialize)]
struct RefreshResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct ListResponse {
    files: Vec<DriveFile>,
    next_page_token: Option<String>,
}

/// Escape a string literal for a Drive `q=` query expression.
fn escape_query(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

const DRIVE_API: &str = "https://www.googleapis.com/drive/v3";
const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

/// [`Drive`] implementation over the Drive REST API v3.
pub struct GoogleDrive {
    http: reqwest::Client,
    access_token: String,
}

impl GoogleDrive {
    /// Load the stored token, refresh it if expired, and return a connected
    /// client. The refreshed token is written back to the token file so the
    /// next run starts from a fresh one.
    pub async fn connect(config: &RenameConfig) -> Result<Self, ScanSortError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ScanSortError::Internal(format!("HTTP client: {}", e)))?;

        let mut token = load_token(&config.token_file)?;

        if token.is_expired(SystemTime::now()) {
            info!("Drive access token expired, refreshing");
            refresh_token(&http, &mut token).await?;
            persist_token(&config.token_file, &token);
        }

        Ok(Self {
            http,
            access_token: token.access_token,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        context: &'static str,
    ) -> Result<T, ScanSortError> {
        let response = self
            .http
            .get(url)
            .query(query)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| drive_api_error(context, e))?;

        let response = check_status(context, response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ScanSortError::DriveApi {
                context: context.to_string(),
                reason: format!("invalid response body: {}", e),
            })
    }
}

#[async_trait]
impl Drive for GoogleDrive {
    async fn find_folder(&self, name: &str) -> Result<Option<String>, ScanSortError> {
        let q = format!(
            "name = '{}' and mimeType = '{}' and trashed = false",
            escape_query(name),
            FOLDER_MIME
        );
        let list: ListResponse = self
            .get_json(
                &format!("{DRIVE_API}/files"),
                &[("q", q.as_str()), ("fields", "files(id, name)"), ("pageSize", "10")],
                "folder lookup",
            )
            .await?;

        Ok(list.files.into_iter().next().map(|f| f.id))
    }

    async fn list_pdfs(&self, folder_id: &str) -> Result<Vec<DriveFile>, ScanSortError> {
        let q = format!(
            "'{}' in parents and mimeType = 'application/pdf' and trashed = false",
            escape_query(folder_id)
        );

        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![
                ("q", q.as_str()),
                ("fields", "nextPageToken, files(id, name)"),
                ("pageSize", "100"),
                ("orderBy", "name"),
            ];
            if let Some(ref token) = page_token {
                query.push(("pageToken", token.as_str()));
            }

            let list: ListResponse = self
                .get_json(&format!("{DRIVE_API}/files"), &query, "file listing")
                .await?;

            files.extend(list.files);
            match list.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!("Folder contains {} PDF files", files.len());
        Ok(files)
    }

    async fn download_to(&self, file_id: &str, dest: &Path) -> Result<(), ScanSortError> {
        let url = format!("{DRIVE_API}/files/{file_id}");
        let response = self
            .http
            .get(&url)
            .query(&[("alt", "media")])
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| drive_api_error("file download", e))?;

        let response = check_status("file download", response).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| drive_api_error("file download", e))?;

        tokio::fs::write(dest, &bytes)
            .await
            .map_err(|e| ScanSortError::Internal(format!("write downloaded PDF: {}", e)))?;

        debug!("Downloaded {} bytes to {}", bytes.len(), dest.display());
        Ok(())
    }

    async fn rename(&self, file_id: &str, new_name: &str) -> Result<(), ScanSortError> {
        let url = format!("{DRIVE_API}/files/{file_id}");
        let response = self
            .http
            .patch(&url)
            .bearer_auth(&self.access_token)
            .json(&serde_json::json!({ "name": new_name }))
            .send()
            .await
            .map_err(|e| drive_api_error("file rename", e))?;

        check_status("file rename", response).await?;
        Ok(())
    }
}

fn load_token(path: &PathBuf) -> Result<StoredToken, ScanSortError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ScanSortError::AuthFailed {
        reason: format!(
            "cannot read token file {}: {}. Run the OAuth consent flow once to create it",
            path.display(),
            e
        ),
    })?;

    serde_json::from_str(&raw).map_err(|e| ScanSortError::AuthFailed {
        reason: format!("token file {} is not valid: {}", path.display(), e),
    })
}

/// Exchange the refresh token for a new access token.
async fn refresh_token(
    http: &reqwest::Client,
    token: &mut StoredToken,
) -> Result<(), ScanSortError> {
    let params = [
        ("client_id", token.client_id.as_str()),
        ("client_secret", token.client_secret.as_str()),
        ("refresh_token", token.refresh_token.as_str()),
        ("grant_type", "refresh_token"),
    ];

    let response = http
        .post(&token.token_uri)
        .form(&params)
        .send()
        .await
        .map_err(|e| ScanSortError::AuthFailed {
            reason: format!("token refresh request failed: {}", e),
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ScanSortError::AuthFailed {
            reason: format!("token refresh rejected: HTTP {}: {}", status, body.trim()),
        });
    }

    let refreshed: RefreshResponse =
        response.json().await.map_err(|e| ScanSortError::AuthFailed {
            reason: format!("token refresh response invalid: {}", e),
        })?;

    let now_secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    token.access_token = refreshed.access_token;
    token.expires_at = now_secs + refreshed.expires_in;
    Ok(())
}

/// Best-effort write-back of a refreshed token. Failing to persist only
/// costs a refresh on the next run, so it is a warning rather than an error.
fn persist_token(path: &PathBuf, token: &StoredToken) {
    match serde_json::to_string_pretty(token) {
        Ok(json) => {
            if let Err(e) = std::fs::write(path, json) {
                warn!("Could not persist refreshed token to {}: {}", path.display(), e);
            }
        }
        Err(e) => warn!("Could not serialise refreshed token: {}", e),
    }
}

fn drive_api_error(context: &'static str, e: reqwest::Error) -> ScanSortError {
    ScanSortError::DriveApi {
        context: context.to_string(),
        reason: e.to_string(),
    }
}

async fn check_status(
    context: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ScanSortError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ScanSortError::DriveApi {
        context: context.to_string(),
        reason: format!("HTTP {}: {}", status, body.trim()),
    })
}
