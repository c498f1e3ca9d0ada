use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::errors::Error;
use crate::types::{Envelope, ErrorBody, PaginatedEnvelope};

/// Paths that never trigger a refresh, so a 401 on them cannot loop.
pub const BOOTSTRAP_PATHS: [&str; 4] = [
    "/auth/login",
    "/auth/logout",
    "/auth/refresh",
    "/auth/session-check",
];

pub const REFRESH_PATH: &str = "/auth/refresh";

const ANTI_FORGERY_HEADER: &str = "x-requested-with";
const ANTI_FORGERY_VALUE: &str = "XMLHttpRequest";

#[derive(Clone, Debug, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Form(Vec<(String, String)>),
}

/// Immutable description of one logical request. Retrying yields a new descriptor with a bumped
/// attempt count, so the retry marker never outlives the request it belongs to.
#[derive(Clone, Debug)]
pub struct ApiRequest {
    method: Method,
    path: String,
    body: RequestBody,
    headers: HeaderMap,
    retries: u8,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: RequestBody::Empty,
            headers: HeaderMap::new(),
            retries: 0,
        }
    }

    pub fn with_json(mut self, value: serde_json::Value) -> Self {
        self.body = RequestBody::Json(value);
        self
    }

    pub fn with_form<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.body = RequestBody::Form(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn retries(&self) -> u8 {
        self.retries
    }

    pub fn has_been_retried(&self) -> bool {
        self.retries > 0
    }

    /// The same logical request, marked as retried once more.
    pub fn retried(&self) -> Self {
        Self {
            retries: self.retries.saturating_add(1),
            ..self.clone()
        }
    }

    pub fn is_bootstrap(&self) -> bool {
        let path = self.normalised_path();
        BOOTSTRAP_PATHS.iter().any(|p| path.contains(p))
    }

    fn normalised_path(&self) -> String {
        format!("/{}", self.path.trim_start_matches('/'))
    }

    /// Resolves the path under `base` and renders headers and body for the wire.
    pub(crate) fn prepare(&self, base: &Url, token: Option<&str>) -> Result<PreparedRequest, Error> {
        let url = base
            .join(self.path.trim_start_matches('/'))
            .map_err(|e| Error::Request(format!("cannot join '{}' onto base: {}", self.path, e)))?;

        let mut headers = self.headers.clone();
        let body = match &self.body {
            RequestBody::Empty => None,
            RequestBody::Json(value) => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                Some(serde_json::to_vec(value)?)
            }
            RequestBody::Form(pairs) => {
                headers.insert(
                    CONTENT_TYPE,
                    HeaderValue::from_static("application/x-www-form-urlencoded"),
                );
                if is_mutating(&self.method) {
                    headers.insert(
                        HeaderName::from_static(ANTI_FORGERY_HEADER),
                        HeaderValue::from_static(ANTI_FORGERY_VALUE),
                    );
                }
                Some(encode_form(pairs).into_bytes())
            }
        };

        if let Some(token) = token {
            headers.insert(AUTHORIZATION, bearer(token)?);
        }

        Ok(PreparedRequest {
            method: self.method.clone(),
            url,
            headers,
            body,
        })
    }
}

/// A request fully rendered for the transport.
#[derive(Clone, Debug)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl PreparedRequest {
    pub fn authorization(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
    }
}

#[derive(Clone, Debug)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    pub fn envelope<T: DeserializeOwned>(&self) -> Result<Envelope<T>, Error> {
        self.json()
    }

    /// Unwraps the `data` member of the response envelope.
    pub fn data<T: DeserializeOwned>(&self) -> Result<T, Error> {
        self.envelope::<T>()?.data.ok_or(Error::MissingData)
    }

    pub fn page<T: DeserializeOwned>(&self) -> Result<PaginatedEnvelope<T>, Error> {
        self.json()
    }

    /// Error body, if the response carries a parseable one.
    pub fn error_body(&self) -> Option<ErrorBody> {
        if self.body.is_empty() {
            return None;
        }
        serde_json::from_slice(&self.body).ok()
    }
}

fn is_mutating(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

fn encode_form(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

pub(crate) fn bearer(token: &str) -> Result<HeaderValue, Error> {
    let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|_| Error::Request("access token is not a valid header value".into()))?;
    value.set_sensitive(true);
    Ok(value)
}
