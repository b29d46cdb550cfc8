//! HTTP client for the trading platform behind the access grants.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{COOKIE, ORIGIN, REFERER, SET_COOKIE};
use tracing::debug;

use super::access_grant::{AccessGrantClient, AccessGrantError};
use super::session::{AccessSession, SessionAuthenticator, SessionError};
use crate::config::AccessGrantSettings;

/// Signs in with the service account and posts grants for one script.
pub struct HttpPlatformClient {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    script_id: String,
}

impl HttpPlatformClient {
    pub fn from_settings(settings: &AccessGrantSettings) -> Result<Self, AccessGrantError> {
        let (Some(username), Some(password), Some(script_id)) = (
            settings.username.clone(),
            settings.password.clone(),
            settings.script_id.clone(),
        ) else {
            return Err(AccessGrantError::NotConfigured);
        };

        // The sign-in answers with a redirect that carries the cookies.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .redirect(reqwest::redirect::Policy::none())
            .user_agent("Mozilla/5.0")
            .build()
            .map_err(|e| AccessGrantError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            username,
            password,
            script_id,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn referer(&self) -> String {
        format!("{}/", self.base_url)
    }
}

#[async_trait]
impl SessionAuthenticator for HttpPlatformClient {
    async fn sign_in(&self) -> Result<String, SessionError> {
        let response = self
            .client
            .post(self.url("accounts/signin/"))
            .header(ORIGIN, self.base_url.as_str())
            .header(REFERER, self.referer())
            .form(&[
                ("username", self.username.as_str()),
                ("password", self.password.as_str()),
                ("remember", "on"),
            ])
            .send()
            .await
            .map_err(|e| SessionError::SignIn(format!("request failed: {}", e)))?;

        let status = response.status();
        let cookies: Vec<&str> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect();
        debug!(%status, cookies = cookies.len(), "sign-in response");

        if cookies.is_empty() {
            return Err(SessionError::SignIn(format!("no cookies in response ({})", status)));
        }
        Ok(cookies.join(", "))
    }
}

#[async_trait]
impl AccessGrantClient for HttpPlatformClient {
    async fn grant(&self, session: &AccessSession, username: &str) -> Result<(), AccessGrantError> {
        let response = self
            .client
            .post(self.url("pine_perm/add/"))
            .header(COOKIE, session.cookies.as_str())
            .header("x-csrf-token", session.csrf_token.as_str())
            .header(REFERER, self.referer())
            .json(&serde_json::json!({
                "username": username,
                "script_id": self.script_id,
            }))
            .send()
            .await
            .map_err(|e| AccessGrantError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<empty response>".to_string());
        Err(AccessGrantError::Rejected {
            status: status.as_u16(),
            body: body.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incomplete_settings_are_not_configured() {
        let settings = AccessGrantSettings {
            username: Some("ops".to_string()),
            ..AccessGrantSettings::default()
        };
        assert!(matches!(
            HttpPlatformClient::from_settings(&settings),
            Err(AccessGrantError::NotConfigured)
        ));
    }

    #[test]
    fn test_urls_ignore_trailing_slash() {
        let settings = AccessGrantSettings {
            base_url: "https://platform.example/".to_string(),
            username: Some("ops".to_string()),
            password: Some("pw".to_string()),
            script_id: Some("PUB;1".to_string()),
            ..AccessGrantSettings::default()
        };
        let client = HttpPlatformClient::from_settings(&settings).unwrap();
        assert_eq!(client.url("pine_perm/add/"), "https://platform.example/pine_perm/add/");
        assert_eq!(client.referer(), "https://platform.example/");
    }
}
