//! Clients for the remote collaborators: the auth API and the profile API.
//!
//! Both are external services; the catalog never depends on them. Every
//! failure here degrades to a transient message — local state stays
//! authoritative and no operation is blocked by the network.

use anyhow::{Result, anyhow};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use crate::constants::constants;

/// Success body of `POST /api/login`. The `is_admin` capability is granted
/// by the server and nowhere else; a body without it is a regular user.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
  pub username: String,
  #[serde(default)]
  pub is_admin: bool,
}

/// Body of `GET`/`PUT /api/profile`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
  pub username: String,
  pub display_name: String,
  pub avatar_url: String,
  pub bio: String,
}

/// Failure bodies carry a human-readable `message`.
#[derive(Debug, Deserialize, Default)]
struct ApiMessage {
  #[serde(default)]
  message: String,
}

pub struct ApiClient {
  base: String,
  http: Client,
}

impl ApiClient {
  pub fn new(base: String) -> Self {
    Self { base, http: Client::new() }
  }

  /// Extract the server's `message` from a failure response, with a
  /// fallback when the body isn't the expected shape.
  async fn failure_message(response: reqwest::Response, fallback: &str) -> String {
    let body: ApiMessage = response.json().await.unwrap_or_default();
    if body.message.is_empty() { fallback.to_string() } else { body.message }
  }

  pub async fn login(&self, username: &str, password: &str) -> Result<AuthSession> {
    let response = self
      .http
      .post(format!("{}/api/login", self.base))
      .json(&json!({ "username": username, "password": password }))
      .send()
      .await
      .map_err(|e| {
        debug!(err = %e, "api: login request failed");
        anyhow!("Connection error. Please check your server.")
      })?;

    if response.status().is_success() {
      let session: AuthSession = response.json().await.map_err(|_| anyhow!("Unexpected response from server"))?;
      info!(username = %session.username, is_admin = session.is_admin, "api: login ok");
      Ok(session)
    } else {
      Err(anyhow!(Self::failure_message(response, "Invalid credentials").await))
    }
  }

  pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<()> {
    let response = self
      .http
      .post(format!("{}/api/register", self.base))
      .json(&json!({ "username": username, "email": email, "password": password }))
      .send()
      .await
      .map_err(|e| {
        debug!(err = %e, "api: register request failed");
        anyhow!("Connection error. Please check your server.")
      })?;

    if response.status().is_success() {
      info!(username, "api: register ok");
      Ok(())
    } else {
      Err(anyhow!(Self::failure_message(response, "Registration failed").await))
    }
  }

  /// Best-effort profile fetch. The caller already shows local values and
  /// only overlays whatever this returns.
  pub async fn fetch_profile(&self, username: &str) -> Result<Profile> {
    let response = self
      .http
      .get(format!("{}/api/profile", self.base))
      .query(&[("username", username)])
      .send()
      .await?
      .error_for_status()?;
    Ok(response.json().await?)
  }

  /// Push the profile to the server under a short deadline. Timeouts and
  /// non-2xx responses are equivalent failures — the caller falls back to
  /// "saved locally".
  pub async fn push_profile(&self, profile: &Profile) -> Result<()> {
    self
      .http
      .put(format!("{}/api/profile", self.base))
      .timeout(Duration::from_millis(constants().profile_sync_timeout_ms))
      .json(profile)
      .send()
      .await?
      .error_for_status()?;
    debug!(username = %profile.username, "api: profile pushed");
    Ok(())
  }
}
