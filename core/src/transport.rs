//! HTTP plumbing underneath the remote data client.
//!
//! [`Transport`] is the seam between cache logic and the network: the
//! production [`HttpTransport`] speaks JSON over `reqwest` with a cookie jar
//! holding the session marker, tests plug in scripted fakes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::CookieStore;
use reqwest::cookie::Jar;
use reqwest::header::ACCEPT;
use reqwest::header::CONTENT_TYPE;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::config::ClientConfig;
use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Patch,
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
        }
    }
}

/// A request relative to the API base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path below the base URL, always starting with `/`.
    pub path: String,
    pub query: Vec<(&'static str, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post<B: Serialize>(path: impl Into<String>, body: &B) -> Result<Self, ClientError> {
        Self::with_body(Method::Post, path.into(), body)
    }

    /// POST without a body.
    pub fn post_empty(path: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            ..Self::get(path)
        }
    }

    pub fn patch<B: Serialize>(path: impl Into<String>, body: &B) -> Result<Self, ClientError> {
        Self::with_body(Method::Patch, path.into(), body)
    }

    pub fn with_query(mut self, query: Vec<(&'static str, String)>) -> Self {
        self.query = query;
        self
    }

    fn with_body<B: Serialize>(method: Method, path: String, body: &B) -> Result<Self, ClientError> {
        let body = serde_json::to_value(body)
            .map_err(|e| ClientError::InvalidRequest(format!("cannot encode body: {e}")))?;
        Ok(Self {
            method,
            path,
            query: Vec::new(),
            body: Some(body),
        })
    }
}

/// Status and decoded JSON body of an HTTP exchange. Non-JSON bodies of
/// error responses decode to `Value::Null`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Value,
}

impl RawResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, ClientError>;

    /// Whether a session marker cookie is currently held. Only its presence
    /// matters; validity is the backend's call.
    fn has_session_marker(&self) -> bool;
}

/// `reqwest`-backed transport with an in-memory cookie jar.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    jar: Arc<Jar>,
    cookie_name: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let base_url = Url::parse(&config.api_url)
            .map_err(|e| ClientError::InvalidRequest(format!("bad api_url {}: {e}", config.api_url)))?;

        let jar = Arc::new(Jar::default());
        if let Some(token) = config.session_token.as_deref() {
            jar.add_cookie_str(&format!("{}={token}; Path=/", config.session_cookie), &base_url);
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .default_headers(headers)
            .timeout(config.request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url,
            jar,
            cookie_name: config.session_cookie.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint_url(&self, path: &str) -> Result<Url, ClientError> {
        let joined = format!("{}{path}", self.base_url.as_str().trim_end_matches('/'));
        Url::parse(&joined).map_err(|e| ClientError::InvalidRequest(format!("bad path {path}: {e}")))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, ClientError> {
        let url = self.endpoint_url(&request.path)?;
        tracing::debug!(method = %request.method, %url, "sending request");

        let mut builder = self.client.request(request.method.into(), url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            match serde_json::from_slice::<Value>(&bytes) {
                Ok(value) => value,
                Err(err) if (200..300).contains(&status) => {
                    return Err(ClientError::Parse(format!(
                        "{} {}: {err}",
                        request.method, request.path
                    )));
                }
                Err(_) => Value::Null,
            }
        };

        Ok(RawResponse { status, body })
    }

    fn has_session_marker(&self) -> bool {
        let Some(header) = self.jar.cookies(&self.base_url) else {
            return false;
        };
        let Ok(cookies) = header.to_str() else {
            return false;
        };
        cookies.split(';').any(|pair| {
            pair.trim()
                .split_once('=')
                .is_some_and(|(name, value)| name == self.cookie_name && !value.is_empty())
        })
    }
}
