/*!
 * HTTP transport used by the provider adapters.
 *
 * Adapters build a provider-native `HttpRequest` and hand it to an
 * `HttpTransport`. Status handling and retries happen above this layer, so a
 * transport only fails when no response could be obtained at all.
 */

use async_trait::async_trait;
use log::warn;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::time::Duration;

use crate::errors::ProviderError;

/// A JSON request to a provider endpoint
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method, upper case
    pub method: String,
    /// Fully qualified URL, query included
    pub url: String,
    /// Extra headers; `Content-Type: application/json` is implied
    pub headers: Vec<(String, String)>,
    /// JSON body
    pub body: serde_json::Value,
    /// Per-request timeout
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    /// Create a POST request with a JSON body
    pub fn post(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: "POST".to_string(),
            url: url.into(),
            headers: Vec::new(),
            body,
            timeout: None,
        }
    }

    /// Add a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Value of a header, matched case-insensitively
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Raw response from a provider endpoint
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Body as text
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ProviderError> {
        serde_json::from_str(&self.body).map_err(|e| ProviderError::ParseError(e.to_string()))
    }
}

/// Fetch-like primitive the adapters send requests through
#[async_trait]
pub trait HttpTransport: Send + Sync + Debug {
    /// Send the request and return whatever status the server answered with
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ProviderError>;
}

/// `reqwest`-based transport
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport with a default timeout for requests that set none
    pub fn new(default_timeout: Duration) -> Self {
        let built = Client::builder()
            .timeout(default_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .build();

        Self {
            client: client_or_default(built),
        }
    }
}

/// Fall back to a default client when the configured one cannot be built
fn client_or_default(built: reqwest::Result<Client>) -> Client {
    match built {
        Ok(client) => client,
        Err(e) => {
            warn!(
                "Failed to build HTTP client, using defaults without the configured timeouts: {}",
                e
            );
            Client::default()
        }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ProviderError> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|e| ProviderError::RequestFailed(format!("Invalid HTTP method {}: {}", request.method, e)))?;

        let mut builder = self
            .client
            .request(method, &request.url)
            .header("Content-Type", "application/json")
            .json(&request.body);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(HttpResponse { status, body })
    }
}
