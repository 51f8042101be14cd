//! Graph request envelope
//!
//! [`RequestClient`] executes one HTTP call per request against a fixed base
//! address and classifies the response in a single step:
//!
//! - 2xx: [`ResponseOutcome::Payload`], decoded as JSON when asked and possible
//! - 4xx with `itemNotFound` (or a bare 404): [`ResponseOutcome::NotFound`]
//! - any other 4xx: [`ResponseOutcome::Error`] carrying the remote code
//! - 5xx and network/TLS/timeout failures: [`ResponseOutcome::TransportFailure`]
//!
//! There are no retries; every call is a single attempt.

use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, LOCATION};
use reqwest::{redirect, Client, Method, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use spk_core::error::TransportCause;
use spk_core::{ByteStream, SpkError, SpkResult};
use std::collections::BTreeMap;
use tracing::{debug, trace, warn};

use crate::config::GraphClientConfig;

const ITEM_NOT_FOUND: &str = "itemNotFound";
const UNEXPECTED_STATUS: &str = "unexpectedStatus";

/// Authentication applied to every request; the variants are exclusive
#[derive(Debug, Clone, Default)]
pub enum Credentials {
    #[default]
    None,
    Bearer(SecretString),
    Basic {
        username: String,
        password: SecretString,
    },
}

impl Credentials {
    pub fn bearer(token: impl Into<String>) -> Self {
        Credentials::Bearer(SecretString::new(token.into()))
    }

    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials::Basic {
            username: username.into(),
            password: SecretString::new(password.into()),
        }
    }
}

/// Request body; form fields and raw bytes can never be combined
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    None,
    Form(BTreeMap<String, String>),
    Raw(Bytes),
    Json(Value),
}

/// One HTTP call, described before it is executed
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub method: Method,
    /// Relative to the client's base address, or absolute
    pub url: String,
    pub query: BTreeMap<String, String>,
    pub body: RequestBody,
    /// Merged over the defaults; these always win
    pub headers: HeaderMap,
    pub decode_json: bool,
}

impl RequestSpec {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: BTreeMap::new(),
            body: RequestBody::None,
            headers: HeaderMap::new(),
            decode_json: true,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT, url)
    }

    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(Method::PATCH, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.insert(key.into(), value.to_string());
        self
    }

    pub fn form<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.body = RequestBody::Form(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn raw_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = RequestBody::Raw(body.into());
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Keep the 2xx body as bytes instead of decoding it
    pub fn raw_response(mut self) -> Self {
        self.decode_json = false;
        self
    }
}

/// Successful response body
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Raw(Bytes),
    Empty,
}

/// Classified result of a single request
#[derive(Debug)]
pub enum ResponseOutcome {
    Payload {
        status: u16,
        location: Option<String>,
        payload: Payload,
    },
    NotFound,
    Error {
        status: u16,
        code: String,
        message: String,
    },
    TransportFailure {
        status: Option<u16>,
        cause: TransportCause,
    },
}

impl ResponseOutcome {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResponseOutcome::NotFound)
    }

    pub fn error_code(&self) -> Option<&str> {
        match self {
            ResponseOutcome::Error { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Not-found becomes `None`; remote errors and transport failures become errors
    pub fn into_payload(self) -> SpkResult<Option<Payload>> {
        match self {
            ResponseOutcome::Payload { payload, .. } => Ok(Some(payload)),
            ResponseOutcome::NotFound => Ok(None),
            ResponseOutcome::Error {
                status,
                code,
                message,
            } => Err(SpkError::Remote {
                status,
                code,
                message,
            }),
            ResponseOutcome::TransportFailure { status, cause } => Err(SpkError::Transport {
                status,
                source: cause,
            }),
        }
    }

    /// Like [`into_payload`](Self::into_payload), but the body must be JSON
    pub fn into_json(self, context: &str) -> SpkResult<Option<Value>> {
        match self.into_payload()? {
            None => Ok(None),
            Some(Payload::Json(value)) => Ok(Some(value)),
            Some(_) => Err(SpkError::MalformedResponse(format!(
                "{context}: expected a JSON body"
            ))),
        }
    }

    /// JSON body where absence is an error
    pub fn require_json(self, context: &str) -> SpkResult<Value> {
        self.into_json(context)?
            .ok_or_else(|| SpkError::NotFound(context.to_string()))
    }
}

/// Executes [`RequestSpec`]s against one base address with fixed credentials
#[derive(Debug, Clone)]
pub struct RequestClient {
    http: Client,
    base_url: String,
    credentials: Credentials,
}

impl RequestClient {
    pub fn new(config: &GraphClientConfig, credentials: Credentials) -> SpkResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(!config.verify_tls)
            .redirect(redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| SpkError::Config(format!("Failed to set up HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Continuation links arrive absolute and are used untouched
    pub fn absolute_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else if url.starts_with('/') {
            format!("{}{}", self.base_url, url)
        } else {
            format!("{}/{}", self.base_url, url)
        }
    }

    pub async fn request(&self, spec: RequestSpec) -> ResponseOutcome {
        let decode_json = spec.decode_json;
        match self.send(spec).await {
            Ok((url, response)) => finish(&url, response, decode_json).await,
            Err(outcome) => outcome,
        }
    }

    /// Streams a 2xx body instead of buffering it.
    ///
    /// Error statuses are classified like [`request`](Self::request); not-found
    /// becomes `None`.
    pub async fn request_stream(&self, spec: RequestSpec) -> SpkResult<Option<ByteStream>> {
        let (url, response) = match self.send(spec.raw_response()).await {
            Ok(sent) => sent,
            Err(outcome) => return outcome.into_payload().map(|_| None),
        };

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return match finish(&url, response, false).await.into_payload()? {
                None => Ok(None),
                Some(_) => Err(SpkError::MalformedResponse(format!("{url}: unexpected body for {status}"))),
            };
        }

        trace!(url = %url, status = status.as_u16(), "streaming graph response");
        let stream = response
            .bytes_stream()
            .map_err(|e| SpkError::Transport {
                status: e.status().map(|s| s.as_u16()),
                source: Box::new(e),
            })
            .boxed();
        Ok(Some(stream))
    }

    async fn send(&self, spec: RequestSpec) -> Result<(String, Response), ResponseOutcome> {
        let url = self.absolute_url(&spec.url);
        debug!(method = %spec.method, url = %url, "graph request");

        let mut builder = self
            .http
            .request(spec.method.clone(), &url)
            .headers(self.merged_headers(&spec.headers));

        if let Credentials::Basic { username, password } = &self.credentials {
            if !spec.headers.contains_key(AUTHORIZATION) {
                builder = builder.basic_auth(username, Some(password.expose_secret()));
            }
        }

        if !spec.query.is_empty() {
            builder = builder.query(&spec.query);
        }

        builder = match spec.body {
            RequestBody::None => builder,
            RequestBody::Form(fields) => builder.form(&fields),
            RequestBody::Raw(bytes) => builder.body(bytes),
            RequestBody::Json(value) => builder.json(&value),
        };

        match builder.send().await {
            Ok(response) => Ok((url, response)),
            Err(e) => {
                warn!(url = %url, error = %e, "graph request failed");
                Err(ResponseOutcome::TransportFailure {
                    status: e.status().map(|s| s.as_u16()),
                    cause: Box::new(e),
                })
            }
        }
    }

    fn merged_headers(&self, extra: &HeaderMap) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Credentials::Bearer(token) = &self.credentials {
            match HeaderValue::from_str(&format!("Bearer {}", token.expose_secret())) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => warn!("bearer token contains characters not allowed in a header"),
            }
        }

        for (name, value) in extra {
            headers.insert(name.clone(), value.clone());
        }
        headers
    }
}

async fn finish(url: &str, response: Response, decode_json: bool) -> ResponseOutcome {
    let status = response.status();
    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let body = match response.bytes().await {
        Ok(body) => body,
        Err(e) => {
            warn!(url = %url, error = %e, "failed to read graph response body");
            return ResponseOutcome::TransportFailure {
                status: Some(status.as_u16()),
                cause: Box::new(e),
            };
        }
    };

    let outcome = classify(status, location, body, decode_json);
    trace!(url = %url, status = status.as_u16(), outcome = ?outcome_kind(&outcome), "graph response");
    outcome
}

fn outcome_kind(outcome: &ResponseOutcome) -> &'static str {
    match outcome {
        ResponseOutcome::Payload { .. } => "payload",
        ResponseOutcome::NotFound => "not_found",
        ResponseOutcome::Error { .. } => "error",
        ResponseOutcome::TransportFailure { .. } => "transport_failure",
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

fn classify(
    status: StatusCode,
    location: Option<String>,
    body: Bytes,
    decode_json: bool,
) -> ResponseOutcome {
    if status.is_server_error() {
        let detail = String::from_utf8_lossy(&body).trim().to_string();
        let cause = if detail.is_empty() {
            format!("server responded {status}")
        } else {
            format!("server responded {status}: {detail}")
        };
        return ResponseOutcome::TransportFailure {
            status: Some(status.as_u16()),
            cause: cause.into(),
        };
    }

    if status.is_client_error() {
        return classify_client_error(status, &body);
    }

    let payload = if body.is_empty() {
        Payload::Empty
    } else if decode_json {
        match serde_json::from_slice(&body) {
            Ok(value) => Payload::Json(value),
            Err(_) => Payload::Raw(body),
        }
    } else {
        Payload::Raw(body)
    };

    ResponseOutcome::Payload {
        status: status.as_u16(),
        location,
        payload,
    }
}

fn classify_client_error(status: StatusCode, body: &[u8]) -> ResponseOutcome {
    match serde_json::from_slice::<ErrorEnvelope>(body) {
        Ok(envelope) if envelope.error.code == ITEM_NOT_FOUND => ResponseOutcome::NotFound,
        Ok(envelope) => ResponseOutcome::Error {
            status: status.as_u16(),
            code: envelope.error.code,
            message: envelope.error.message,
        },
        Err(_) if status == StatusCode::NOT_FOUND => ResponseOutcome::NotFound,
        Err(_) => ResponseOutcome::Error {
            status: status.as_u16(),
            code: UNEXPECTED_STATUS.into(),
            message: String::from_utf8_lossy(body).into_owned(),
        },
    }
}
