use std::time::Duration;

use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use updater_core::MetadataReply;

/// Transport options applied to every outbound request. The session
/// treats the stored value as read-only and clones it per request.
///
/// No configured timeout means no timeout: a stage can then hang for as
/// long as the remote side keeps the connection open.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub headers: Vec<(String, String)>,
    pub connect_timeout: Option<Duration>,
    pub timeout: Option<Duration>,
    /// Extra fields merged into the metadata request payload.
    pub data: Map<String, Value>,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("request failed: {0}")]
    Network(String),
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("response body is not a valid metadata document: {0}")]
    InvalidBody(String),
}

impl TransportError {
    /// True when the transport itself succeeded but the body could not
    /// be read as the expected structured document.
    pub fn is_invalid_body(&self) -> bool {
        matches!(self, Self::InvalidBody(_))
    }
}

/// Wire shape of the metadata response. Both fields are optional here;
/// the state machine decides what an absent field means.
#[derive(Debug, Deserialize)]
struct RawMetadata {
    last: Option<String>,
    source: Option<String>,
}

#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// POST the metadata request, with the local version as `current`.
    async fn fetch_metadata(
        &self,
        endpoint: &str,
        options: &RequestOptions,
        current: &str,
    ) -> Result<MetadataReply, TransportError>;

    /// GET the update package as raw bytes.
    async fn download_package(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<Vec<u8>, TransportError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ReqwestTransport;

impl ReqwestTransport {
    fn build_client(&self, options: &RequestOptions) -> Result<reqwest::Client, TransportError> {
        let mut builder = reqwest::Client::builder();
        if let Some(connect_timeout) = options.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        builder
            .build()
            .map_err(|err| TransportError::Network(err.to_string()))
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn fetch_metadata(
        &self,
        endpoint: &str,
        options: &RequestOptions,
        current: &str,
    ) -> Result<MetadataReply, TransportError> {
        let parsed = reqwest::Url::parse(endpoint)
            .map_err(|err| TransportError::InvalidUrl(err.to_string()))?;
        let client = self.build_client(options)?;

        // Copy-and-extend the configured payload; the stored options are
        // never mutated.
        let mut payload = options.data.clone();
        payload.insert("current".to_string(), Value::String(current.to_string()));

        let mut request = client.post(parsed).json(&payload);
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::HttpStatus(status.as_u16()));
        }

        let body = response.bytes().await.map_err(map_reqwest_error)?;
        let raw: RawMetadata = serde_json::from_slice(&body)
            .map_err(|err| TransportError::InvalidBody(err.to_string()))?;
        Ok(MetadataReply {
            last: raw.last,
            source: raw.source,
        })
    }

    async fn download_package(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<Vec<u8>, TransportError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| TransportError::InvalidUrl(err.to_string()))?;
        let client = self.build_client(options)?;

        let mut request = client.get(parsed);
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::HttpStatus(status.as_u16()));
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    TransportError::Network(err.to_string())
}
