//! JSON-over-HTTP implementation of [`RemoteEnvironment`]

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use stampede_config::HttpConfig;
use stampede_core::{
    DispatchError, ExecuteRequest, PlanEnvironmentResult, PollError, PollResponse,
    RemoteEnvironment, ResultId,
};
use tracing::{debug, info};
use url::Url;

use crate::errors::HttpError;

const EXECUTIONS_PATH: &str = "executions";

/// Body returned by `POST /executions`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchResponse {
    pub result_id: ResultId,
}

/// Reaches execution hosts over HTTP.
///
/// Hosts are given either as full `http(s)://` URLs, optionally with a path
/// prefix, or as bare `host:port` which is treated as `http://host:port`.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: Client,
}

impl HttpRemote {
    pub fn new() -> Result<Self, HttpError> {
        Self::from_config(&HttpConfig::default())
    }

    pub fn from_config(config: &HttpConfig) -> Result<Self, HttpError> {
        debug!(
            "Creating HTTP remote with timeout: {}s",
            config.timeout.as_secs()
        );
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connection_timeout)
            .user_agent(&config.user_agent)
            .pool_max_idle_per_host(config.max_idle_per_host)
            .build()?;

        Ok(Self { client })
    }

    /// `{host}/executions`
    pub fn executions_url(host: &str) -> Result<Url, HttpError> {
        Self::endpoint(host, &[EXECUTIONS_PATH])
    }

    /// `{host}/executions/{id}`
    pub fn execution_url(host: &str, result_id: &ResultId) -> Result<Url, HttpError> {
        Self::endpoint(host, &[EXECUTIONS_PATH, result_id.as_str()])
    }

    fn endpoint(host: &str, segments: &[&str]) -> Result<Url, HttpError> {
        let host = host.trim();
        let base = if host.contains("://") {
            host.to_string()
        } else {
            format!("http://{}", host)
        };

        let mut url = Url::parse(&base).map_err(|e| HttpError::InvalidUrl(format!("{}: {}", host, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(HttpError::InvalidUrl(format!(
                "{}: only http and https are supported",
                host
            )));
        }

        url.path_segments_mut()
            .map_err(|_| HttpError::InvalidUrl(host.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub async fn submit(&self, host: &str, request: &ExecuteRequest) -> Result<ResultId, HttpError> {
        let url = Self::executions_url(host)?;
        debug!("POST {}", url);

        let response = self.client.post(url).json(request).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(unexpected(status, &body));
        }

        let accepted: DispatchResponse = serde_json::from_slice(&body)?;
        info!(host, result_id = %accepted.result_id, "Execution accepted");
        Ok(accepted.result_id)
    }

    pub async fn fetch(&self, host: &str, result_id: &ResultId) -> Result<PollResponse, HttpError> {
        let url = Self::execution_url(host, result_id)?;
        debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        match status {
            StatusCode::ACCEPTED => Ok(PollResponse::Pending),
            StatusCode::OK => {
                let result: PlanEnvironmentResult = serde_json::from_slice(&body)?;
                Ok(PollResponse::Completed(result))
            }
            other => Err(unexpected(other, &body)),
        }
    }
}

fn unexpected(status: StatusCode, body: &[u8]) -> HttpError {
    HttpError::UnexpectedStatus {
        status: status.as_u16(),
        body: String::from_utf8_lossy(body).into_owned(),
    }
}

#[async_trait]
impl RemoteEnvironment for HttpRemote {
    async fn dispatch(&self, host: &str, request: &ExecuteRequest) -> Result<ResultId, DispatchError> {
        self.submit(host, request)
            .await
            .map_err(|e| DispatchError::new(host, e.to_string()))
    }

    async fn poll(&self, host: &str, result_id: &ResultId) -> Result<PollResponse, PollError> {
        self.fetch(host, result_id)
            .await
            .map_err(|e| PollError::new(host, e.to_string()))
    }
}
