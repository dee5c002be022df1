//! HTTP calls against the Rspamd controller.

use crate::rspamd::error::{RspamdError, RspamdResult};
use crate::rspamd::types::{LearnClass, LearnOutcome, RspamdConfig};
use std::time::Duration;

/// Client bound to one controller endpoint.
#[derive(Clone, Debug)]
pub struct RspamdClient {
    http: reqwest::Client,
    base: String,
    password: Option<String>,
}

#[derive(serde::Deserialize)]
struct LearnResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

impl RspamdClient {
    pub fn new(config: &RspamdConfig) -> RspamdResult<Self> {
        if config.url.is_empty() {
            return Err(RspamdError::invalid_config("Controller URL must not be empty"));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RspamdError::invalid_config(format!("HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base: config.url.trim_end_matches('/').to_string(),
            password: config.password.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    /// Submit one message for learning.
    pub async fn learn(&self, message: Vec<u8>, class: LearnClass) -> RspamdResult<LearnOutcome> {
        let url = format!("{}/{}", self.base, class.endpoint());
        log::debug!("[rspamd] POST {} ({} bytes)", url, message.len());

        let mut req = self
            .http
            .post(&url)
            .header("Content-Type", "message/rfc822")
            .body(message);
        if let Some(password) = &self.password {
            req = req.header("Password", password);
        }
        let resp = req.send().await?;
        let status = resp.status();

        // 208: the controller has already learned this exact message.
        if status.as_u16() == 208 {
            return Ok(LearnOutcome::AlreadyKnown);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RspamdError::api(truncate(&body, 200)).with_status(status.as_u16()));
        }

        let body: LearnResponse = resp.json().await?;
        if body.success {
            Ok(LearnOutcome::Trained)
        } else {
            let reason = body.error.unwrap_or_else(|| "unknown error".to_string());
            if reason.contains("already learned") {
                Ok(LearnOutcome::AlreadyKnown)
            } else {
                Err(RspamdError::api(reason))
            }
        }
    }

    /// Fetch controller statistics.
    pub async fn stat(&self) -> RspamdResult<serde_json::Value> {
        let url = format!("{}/stat", self.base);
        log::debug!("[rspamd] GET {}", url);
        let mut req = self.http.get(&url);
        if let Some(password) = &self.password {
            req = req.header("Password", password);
        }
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RspamdError::api(truncate(&body, 200)).with_status(status.as_u16()));
        }
        Ok(resp.json().await?)
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        text.to_string()
    } else {
        let mut end = max;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &text[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_trimmed() {
        let client = RspamdClient::new(&RspamdConfig {
            url: "http://localhost:11334/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(client.base_url(), "http://localhost:11334");
    }

    #[test]
    fn test_empty_url_rejected() {
        let err = RspamdClient::new(&RspamdConfig {
            url: String::new(),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err.kind, crate::rspamd::error::RspamdErrorKind::InvalidConfig);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 200), "short");
        let long = "é".repeat(150);
        let cut = truncate(&long, 101);
        assert!(cut.ends_with('…'));
    }
}
