//! Transport client, the single point of outbound HTTP communication.
//!
//! Every call goes through [`ApiClient::request`], which applies the base
//! address, the timeout and the `X-Frontend-Request` marker, and classifies
//! failures into [`TransportError`] exactly once. No retries happen here.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::multipart::Form;
use reqwest::{Client, Method, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::errors::TransportError;

pub mod endpoints;

pub const MARKER_HEADER: &str = "x-frontend-request";
const MARKER_VALUE: &str = "true";

/// Request payload accepted by [`ApiClient::request`].
pub enum RequestBody {
    Json(Value),
    Multipart(Form),
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl ApiClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(MARKER_HEADER),
            HeaderValue::from_static(MARKER_VALUE),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| TransportError::InvalidRequest(format!("HTTP client setup: {e}")))?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// Client for the analysis backend described by `config`.
    pub fn from_config(config: &Config) -> Result<Self, TransportError> {
        Self::new(config.api_url.clone(), config.request_timeout)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolves a fixed `path` under the base address. A leading `/` is
    /// ignored. Paths holding caller data go through [`Self::endpoint_segments`].
    pub fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| TransportError::InvalidRequest(format!("bad path '{path}': {e}")))
    }

    /// Appends `segments` to the base address with a trailing slash. Each
    /// segment is percent-encoded, so `/`, `?` and `#` inside one stay data.
    pub fn endpoint_segments(&self, segments: &[&str]) -> Result<Url, TransportError> {
        if let Some(bad) = segments
            .iter()
            .find(|s| s.is_empty() || **s == "." || **s == "..")
        {
            return Err(TransportError::InvalidRequest(format!(
                "bad path segment '{bad}'"
            )));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                TransportError::InvalidRequest(format!("{} cannot be a base", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments)
            .push("");
        Ok(url)
    }

    /// Issues one request. 404 and 5xx responses, and requests that never got
    /// a response, come back as errors; any other status is returned as-is.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
        headers: Option<HeaderMap>,
    ) -> Result<Response, TransportError> {
        self.request_url(method, self.endpoint(path)?, body, headers).await
    }

    /// [`Self::request`] for an already resolved address.
    pub async fn request_url(
        &self,
        method: Method,
        url: Url,
        body: Option<RequestBody>,
        headers: Option<HeaderMap>,
    ) -> Result<Response, TransportError> {
        debug!("{} {}", method, url);

        let mut builder = self.client.request(method.clone(), url.clone());
        if let Some(headers) = headers {
            builder = builder.headers(headers);
        }
        builder = match body {
            Some(RequestBody::Json(value)) => builder.json(&value),
            Some(RequestBody::Multipart(form)) => builder.multipart(form),
            None => builder,
        };

        let response = builder.send().await.map_err(|e| {
            warn!(
                "{} {} got no response (timeout: {}, connect: {}): {}",
                method,
                url,
                e.is_timeout(),
                e.is_connect(),
                e
            );
            TransportError::BackendUnreachable
        })?;

        match classify_status(response.status()) {
            Some(err) => {
                warn!("{} {} returned {}", method, url, response.status());
                Err(err)
            }
            None => Ok(response),
        }
    }

    /// GET `path` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        self.get_json_url(self.endpoint(path)?).await
    }

    pub async fn get_json_url<T: DeserializeOwned>(&self, url: Url) -> Result<T, TransportError> {
        let response = self.request_url(Method::GET, url, None, None).await?;
        decode_json(require_success(response).await?).await
    }

    /// POST a multipart form to `path` and decode the JSON body.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
    ) -> Result<T, TransportError> {
        let response = self
            .request(Method::POST, path, Some(RequestBody::Multipart(form)), None)
            .await?;
        decode_json(require_success(response).await?).await
    }

    /// GET `path` and return the raw body.
    pub async fn get_bytes(&self, path: &str) -> Result<bytes::Bytes, TransportError> {
        let response = self.request(Method::GET, path, None, None).await?;
        require_success(response)
            .await?
            .bytes()
            .await
            .map_err(body_error)
    }
}

/// Maps the statuses this layer owns to their error. `None` means the
/// response is handed to the caller untouched.
pub fn classify_status(status: StatusCode) -> Option<TransportError> {
    if status == StatusCode::NOT_FOUND {
        Some(TransportError::EndpointNotFound)
    } else if status.is_server_error() {
        Some(TransportError::ServerError {
            status: status.as_u16(),
        })
    } else {
        None
    }
}

/// Turns a passed-through non-2xx response into `Unclassified`, keeping its body.
async fn require_success(response: Response) -> Result<Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(TransportError::Unclassified {
        status: status.as_u16(),
        body,
    })
}

/// A body that stops arriving counts as no response, same as a stalled send.
fn body_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() || e.is_connect() {
        warn!("Response body never completed: {e}");
        TransportError::BackendUnreachable
    } else {
        TransportError::Decode(e.to_string())
    }
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, TransportError> {
    let bytes = response.bytes().await.map_err(body_error)?;
    serde_json::from_slice(&bytes).map_err(|e| TransportError::Decode(e.to_string()))
}
