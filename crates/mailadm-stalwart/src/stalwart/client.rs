//! Authenticated HTTP client for the management API, plus the
//! remote/offline settings-source abstraction.

use crate::stalwart::error::{StalwartError, StalwartResult};
use crate::stalwart::types::{StalwartConfig, TrainClass};
use reqwest::RequestBuilder;
use std::collections::BTreeMap;
use std::time::Duration;

/// How requests authenticate to the server.
#[derive(Clone)]
enum Auth {
    Bearer(String),
    Basic(String, Option<String>),
    None,
}

/// HTTP client bound to one management endpoint.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
    api_prefix: String,
    auth: Auth,
}

#[derive(serde::Deserialize)]
struct KeysResponse {
    #[serde(default)]
    data: BTreeMap<String, String>,
}

impl ApiClient {
    pub fn new(config: &StalwartConfig) -> StalwartResult<Self> {
        let base = normalize_server_url(&config.server)?;
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs));
        if !config.verify_tls {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder
            .build()
            .map_err(|e| StalwartError::invalid_config(format!("HTTP client: {}", e)))?;

        let auth = if let Some(token) = &config.token {
            Auth::Bearer(token.clone())
        } else if let Some(username) = &config.username {
            Auth::Basic(username.clone(), config.password.clone())
        } else {
            Auth::None
        };

        let mut api_prefix = config.api_prefix.trim_matches('/').to_string();
        if !api_prefix.is_empty() {
            api_prefix.insert(0, '/');
        }

        Ok(Self {
            http,
            base,
            api_prefix,
            auth,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}{}/{}",
            self.base,
            self.api_prefix,
            path.trim_start_matches('/')
        )
    }

    fn with_auth(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Auth::Bearer(token) => req.bearer_auth(token),
            Auth::Basic(user, pass) => req.basic_auth(user, pass.as_deref()),
            Auth::None => req,
        }
    }

    // ─── Settings operations ─────────────────────────────────────────

    /// Fetch all settings under the given key prefixes.
    pub async fn fetch_settings(
        &self,
        prefixes: &[&str],
    ) -> StalwartResult<BTreeMap<String, String>> {
        let url = self.url("settings/keys");
        let prefix_list = prefixes
            .iter()
            .map(|p| p.trim_end_matches('.'))
            .collect::<Vec<_>>()
            .join(",");
        log::debug!("[stalwart] GET {} prefixes={}", url, prefix_list);

        let mut req = self.with_auth(self.http.get(&url)).header("Accept", "application/json");
        if !prefix_list.is_empty() {
            req = req.query(&[("prefixes", prefix_list.as_str())]);
        }
        let resp = req.send().await?;
        let resp = Self::check_status(resp).await?;
        let payload: KeysResponse = resp.json().await?;
        Ok(payload.data)
    }

    /// Delete every setting under `prefix`.
    pub async fn clear_prefix(&self, prefix: &str) -> StalwartResult<()> {
        let url = self.url(&format!("settings/{}", prefix));
        log::debug!("[stalwart] DELETE {}", url);
        let resp = self.with_auth(self.http.delete(&url)).send().await?;
        Self::check_status(resp).await?;
        Ok(())
    }

    /// Submit a batch of settings operations.
    pub async fn apply_settings(&self, operations: &[serde_json::Value]) -> StalwartResult<()> {
        let url = self.url("settings");
        log::debug!("[stalwart] POST {} ({} operations)", url, operations.len());
        let resp = self
            .with_auth(self.http.post(&url))
            .json(operations)
            .send()
            .await?;
        Self::check_status(resp).await?;
        Ok(())
    }

    // ─── Bayes training ──────────────────────────────────────────────

    /// Submit one message for Bayes training, globally or per account.
    pub async fn train(
        &self,
        message: Vec<u8>,
        class: TrainClass,
        account: Option<&str>,
    ) -> StalwartResult<()> {
        let url = self.url(&train_path(class, account));
        log::debug!("[stalwart] POST {} ({} bytes)", url, message.len());
        let resp = self
            .with_auth(self.http.post(&url))
            .header("Content-Type", "message/rfc822")
            .body(message)
            .send()
            .await?;
        Self::check_status(resp).await?;
        Ok(())
    }

    /// Turn a non-success response into an `Api` error carrying the
    /// server's detail text.
    async fn check_status(resp: reqwest::Response) -> StalwartResult<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        let detail = extract_error_detail(&body)
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
        Err(StalwartError::api(status.as_u16(), detail))
    }
}

/// Relative endpoint for a training request.
pub fn train_path(class: TrainClass, account: Option<&str>) -> String {
    match account {
        Some(account) => format!("spam-filter/train/{}/{}", class.as_str(), account),
        None => format!("spam-filter/train/{}", class.as_str()),
    }
}

/// Pull the most specific error text out of an API error body. Stalwart
/// responses have used `detail`, `error.message`, and `message` across
/// versions.
pub fn extract_error_detail(body: &str) -> Option<String> {
    if body.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for candidate in [
            value.get("detail"),
            value.get("error").and_then(|e| e.get("message")),
            value.get("message"),
        ]
        .into_iter()
        .flatten()
        {
            if let Some(text) = candidate.as_str() {
                return Some(text.to_string());
            }
        }
    }
    Some(body.to_string())
}

/// Promote a bare host to `https://` and validate the URL shape.
pub fn normalize_server_url(server: &str) -> StalwartResult<String> {
    let server = server.trim();
    if server.is_empty() {
        return Err(StalwartError::invalid_config("Server URL must not be empty"));
    }
    let with_scheme = if server.contains("://") {
        server.to_string()
    } else {
        format!("https://{}", server)
    };
    let parsed = url::Url::parse(&with_scheme)
        .map_err(|e| StalwartError::invalid_config(format!("Invalid server URL: {}", e)))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(StalwartError::invalid_config(format!(
            "Invalid server URL: {}",
            server
        )));
    }
    Ok(with_scheme.trim_end_matches('/').to_string())
}

// ─── Settings sources ────────────────────────────────────────────────

/// Where settings come from: a live server or an offline snapshot.
pub enum SettingsSource {
    Remote(ApiClient),
    Offline(BTreeMap<String, String>),
}

impl SettingsSource {
    pub async fn fetch(&self, prefixes: &[&str]) -> StalwartResult<BTreeMap<String, String>> {
        match self {
            SettingsSource::Remote(client) => client.fetch_settings(prefixes).await,
            SettingsSource::Offline(settings) => {
                let mut results = BTreeMap::new();
                for prefix in prefixes {
                    let prefix = prefix.trim_end_matches('.');
                    let prefix_dot = format!("{}.", prefix);
                    for (key, value) in settings {
                        if key == prefix || key.starts_with(&prefix_dot) {
                            results.insert(key.clone(), value.clone());
                        }
                    }
                }
                Ok(results)
            }
        }
    }

    pub fn source_label(&self) -> String {
        match self {
            SettingsSource::Remote(client) => client.base_url().to_string(),
            SettingsSource::Offline(_) => "offline".to_string(),
        }
    }

    /// The live client, or an `Offline` error for write operations.
    pub fn remote(&self) -> StalwartResult<&ApiClient> {
        match self {
            SettingsSource::Remote(client) => Ok(client),
            SettingsSource::Offline(_) => Err(StalwartError::offline(
                "This operation requires a live server connection",
            )),
        }
    }
}
