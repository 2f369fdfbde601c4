use std::sync::Arc;
use std::time::Duration;

use mealkeep::NetworkError;
use reqwest::Method;

/// Used when no base URL is configured at build or run time.
pub const DEFAULT_BASE_URL: &str = "https://api.mealkeep.app";

const MAX_ATTEMPTS: u32 = 3;

/// HTTP statuses worth a retry; everything else is a definitive answer.
const RETRYABLE_STATUSES: [u16; 7] = [408, 425, 429, 500, 502, 503, 504];

/// Content transfers can carry photos and long listings.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Health probes answer fast or not at all.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(8);

/// Resolve the base URL once at configuration time: an explicit
/// override wins, then the build-time setting, then the hard-coded
/// default. Blank values (empty after trimming) fall through.
pub fn resolve_base_url(override_url: Option<&str>) -> String {
    for candidate in [override_url, option_env!("MEALKEEP_API_URL")] {
        if let Some(candidate) = candidate {
            let trimmed = candidate.trim();
            if !trimmed.is_empty() {
                return trimmed.trim_end_matches('/').to_owned();
            }
        }
    }
    DEFAULT_BASE_URL.to_owned()
}

/// External secret collaborator. Values are read per request, never
/// logged, and never written to disk by this crate.
pub trait SecretStore: Send + Sync {
    fn api_key(&self) -> Option<String>;
    fn bearer_token(&self) -> Option<String>;
}

/// Fixed secrets, for the CLI and for tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSecrets {
    pub api_key: Option<String>,
    pub bearer_token: Option<String>,
}

impl SecretStore for StaticSecrets {
    fn api_key(&self) -> Option<String> {
        self.api_key.clone()
    }

    fn bearer_token(&self) -> Option<String> {
        self.bearer_token.clone()
    }
}

#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub base_url: String,
    pub device_id: String,
}

/// Typed request/response transport to the remote object store.
///
/// Owns the retry/backoff policy and header injection; it never writes
/// to any store. Callers get either a successful response or a typed
/// [`NetworkError`] after retries are exhausted.
pub struct RemoteClient {
    http: reqwest::Client,
    base_url: String,
    device_id: String,
    secrets: Arc<dyn SecretStore>,
}

impl RemoteClient {
    pub fn new(config: RemoteConfig, secrets: Arc<dyn SecretStore>) -> Result<Self, NetworkError> {
        reqwest::Url::parse(&config.base_url)
            .map_err(|_| NetworkError::InvalidUrl(config.base_url.clone()))?;

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| NetworkError::Unknown(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            device_id: config.device_id,
            secrets,
        })
    }

    /// Perform a request with default headers, caller overrides, and
    /// the retry policy applied. Success means a 2xx response.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
        extra_headers: &[(String, String)],
    ) -> Result<reqwest::Response, NetworkError> {
        let url = self.url(path);
        let headers = self.merged_headers(extra_headers);
        let encoded_body = body
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|e| NetworkError::InvalidInput(e.to_string()))?;

        let mut attempt = 0u32;
        loop {
            attempt += 1;

            let mut request = self.http.request(method.clone(), url.as_str());
            for (name, value) in &headers {
                request = request.header(name.as_str(), value.as_str());
            }
            if let Some(encoded) = &encoded_body {
                request = request.body(encoded.clone());
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }
                    if status.is_informational() || status.is_redirection() {
                        return Err(NetworkError::InvalidResponse);
                    }
                    let code = status.as_u16();
                    if RETRYABLE_STATUSES.contains(&code) && attempt < MAX_ATTEMPTS {
                        tracing::warn!(path, status = code, attempt, "retrying request");
                        tokio::time::sleep(backoff_delay(attempt)).await;
                        continue;
                    }
                    return Err(NetworkError::Http(code));
                }
                Err(error) => {
                    if is_transient(&error) && attempt < MAX_ATTEMPTS {
                        tracing::warn!(
                            path,
                            attempt,
                            error = %error,
                            "retrying request after transport error"
                        );
                        tokio::time::sleep(backoff_delay(attempt)).await;
                        continue;
                    }
                    return Err(classify_transport(error));
                }
            }
        }
    }

    pub async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, NetworkError> {
        let response = self.request(Method::GET, path, None, &[]).await?;
        response
            .json()
            .await
            .map_err(|e| NetworkError::Decoding(e.to_string()))
    }

    pub async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, NetworkError> {
        let response = self.request(method, path, Some(body), &[]).await?;
        response
            .json()
            .await
            .map_err(|e| NetworkError::Decoding(e.to_string()))
    }

    /// Cheap liveness probe with its own short timeout. Any failure is
    /// reported as "not healthy" rather than an error.
    pub async fn health_check(&self) -> bool {
        let url = self.url("health");
        match self
            .http
            .get(url.as_str())
            .timeout(HEALTH_TIMEOUT)
            .header("X-Device-ID", &self.device_id)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Base headers plus secrets, with caller-supplied entries
    /// replacing defaults of the same name.
    fn merged_headers(&self, extra: &[(String, String)]) -> Vec<(String, String)> {
        let mut headers: Vec<(String, String)> = vec![
            ("Content-Type".to_owned(), "application/json".to_owned()),
            ("Accept".to_owned(), "application/json".to_owned()),
            ("X-Device-ID".to_owned(), self.device_id.clone()),
        ];

        if let Some(key) = self.secrets.api_key() {
            let key = key.trim();
            if !key.is_empty() {
                headers.push(("X-App-API-Key".to_owned(), key.to_owned()));
            }
        }
        if let Some(token) = self.secrets.bearer_token() {
            headers.push(("Authorization".to_owned(), format!("Bearer {token}")));
        }

        for (name, value) in extra {
            headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
            headers.push((name.clone(), value.clone()));
        }

        headers
    }
}

/// Delay before attempt n+1: 0.6s doubling per attempt, capped at 2.4s.
/// Deterministic on purpose so the retry schedule is testable.
fn backoff_delay(attempt: u32) -> Duration {
    let ms = 600u64.saturating_mul(1u64 << (attempt.saturating_sub(1)));
    Duration::from_millis(ms.min(2_400))
}

fn is_transient(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect()
}

fn classify_transport(error: reqwest::Error) -> NetworkError {
    if error.is_decode() {
        NetworkError::Decoding(error.to_string())
    } else if error.is_builder() {
        NetworkError::InvalidUrl(error.to_string())
    } else {
        NetworkError::Unknown(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(server_uri: &str, secrets: StaticSecrets) -> RemoteClient {
        RemoteClient::new(
            RemoteConfig {
                base_url: server_uri.to_owned(),
                device_id: "device-1".to_owned(),
            },
            Arc::new(secrets),
        )
        .unwrap()
    }

    #[test]
    fn backoff_schedule_is_deterministic() {
        assert_eq!(backoff_delay(1), Duration::from_millis(600));
        assert_eq!(backoff_delay(2), Duration::from_millis(1_200));
        assert_eq!(backoff_delay(3), Duration::from_millis(2_400));
        // Capped even for attempts the policy never reaches.
        assert_eq!(backoff_delay(10), Duration::from_millis(2_400));
    }

    #[test]
    fn base_url_resolution_trims_and_falls_back() {
        assert_eq!(
            resolve_base_url(Some("  https://staging.mealkeep.app/  ")),
            "https://staging.mealkeep.app"
        );
        assert_eq!(resolve_base_url(Some("   ")), DEFAULT_BASE_URL);
        assert_eq!(resolve_base_url(None), DEFAULT_BASE_URL);
    }

    #[test]
    fn invalid_base_url_is_rejected_up_front() {
        let result = RemoteClient::new(
            RemoteConfig {
                base_url: "not a url".to_owned(),
                device_id: "device-1".to_owned(),
            },
            Arc::new(StaticSecrets::default()),
        );
        assert!(matches!(result, Err(NetworkError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn default_headers_are_injected() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/recipes"))
            .and(wiremock::matchers::header("Accept", "application/json"))
            .and(wiremock::matchers::header("X-Device-ID", "device-1"))
            .and(wiremock::matchers::header("X-App-API-Key", "key-123"))
            .and(wiremock::matchers::header(
                "Authorization",
                "Bearer token-abc",
            ))
            .respond_with(wiremock::ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = client_for(
            &server.uri(),
            StaticSecrets {
                api_key: Some("  key-123  ".to_owned()),
                bearer_token: Some("token-abc".to_owned()),
            },
        );

        client
            .request(Method::GET, "recipes", None, &[])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn blank_api_key_is_omitted() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/recipes"))
            .respond_with(wiremock::ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = client_for(
            &server.uri(),
            StaticSecrets {
                api_key: Some("   ".to_owned()),
                bearer_token: None,
            },
        );
        client
            .request(Method::GET, "recipes", None, &[])
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].headers.get("X-App-API-Key").is_none());
        assert!(requests[0].headers.get("Authorization").is_none());
    }

    #[tokio::test]
    async fn caller_headers_override_defaults() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/export"))
            .and(wiremock::matchers::header("Accept", "text/csv"))
            .respond_with(wiremock::ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = client_for(&server.uri(), StaticSecrets::default());
        client
            .request(
                Method::GET,
                "export",
                None,
                &[("accept".to_owned(), "text/csv".to_owned())],
            )
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let accepts: Vec<_> = requests[0].headers.get_all("Accept").iter().collect();
        assert_eq!(accepts.len(), 1);
    }

    #[tokio::test]
    async fn health_check_true_on_200() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/health"))
            .respond_with(wiremock::ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = client_for(&server.uri(), StaticSecrets::default());
        assert!(client.health_check().await);
    }

    #[tokio::test]
    async fn health_check_false_on_error_status() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/health"))
            .respond_with(wiremock::ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = client_for(&server.uri(), StaticSecrets::default());
        assert!(!client.health_check().await);
    }

    #[tokio::test]
    async fn health_check_false_when_unreachable() {
        // Nothing listens here; the probe swallows the connect error.
        let client = client_for("http://127.0.0.1:9", StaticSecrets::default());
        assert!(!client.health_check().await);
    }
}
