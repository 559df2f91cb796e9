//! HTTP HA API Client
//!
//! JSON client for the platform's HA settings endpoints.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::HaApi;
use crate::config::WolfHaConfig;
use crate::error::{Error, Result};
use crate::model::{GeneratedKey, Instance, ReplicationConfig, ReplicationSchedule};

const API_TOKEN_HEADER: &str = "X-AUTH-YW-API-TOKEN";
const HA_PREFIX: &str = "/api/v1/settings/ha";

#[derive(Debug, Serialize)]
struct CreateConfigRequest<'a> {
    cluster_key: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateInstanceRequest<'a> {
    address: &'a str,
    is_leader: bool,
    is_local: bool,
}

#[derive(Debug, Serialize)]
struct StartScheduleRequest {
    frequency_milliseconds: u64,
}

/// Error body returned by the platform
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: Option<serde_json::Value>,
}

/// HA API client over HTTP
#[derive(Debug, Clone)]
pub struct HttpHaApi {
    client: reqwest::Client,
    endpoint: String,
    api_token: Option<String>,
}

impl HttpHaApi {
    /// Create a client from the tool configuration
    pub fn new(config: &WolfHaConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint().to_string(),
            api_token: config.api.api_token.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.endpoint, HA_PREFIX, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        tracing::debug!("{} {}", method, url);

        let builder = self.client.request(method, url);
        match &self.api_token {
            Some(token) => builder.header(API_TOKEN_HEADER, token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = check_status(builder.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn send_optional<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<Option<T>> {
        let response = builder.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = check_status(response).await?;
        let body = response.text().await?;
        if body.trim().is_empty() || body.trim() == "null" {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&body)?))
    }
}

/// Turn a non-2xx response into an API error
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(Error::Api {
        status: status.as_u16(),
        message: error_message(status, &body),
    })
}

fn error_message(status: StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|r| r.error)
        .map(|e| match e {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        });

    match from_json {
        Some(msg) => msg,
        None if !body.trim().is_empty() => body.trim().to_string(),
        None => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    }
}

#[async_trait]
impl HaApi for HttpHaApi {
    async fn generate_key(&self) -> Result<String> {
        let key: GeneratedKey = self.send(self.request(Method::GET, "/generate_key")).await?;
        Ok(key.cluster_key)
    }

    async fn get_config(&self) -> Result<Option<ReplicationConfig>> {
        self.send_optional(self.request(Method::GET, "/config")).await
    }

    async fn get_schedule(&self, config_id: Uuid) -> Result<Option<ReplicationSchedule>> {
        let path = format!("/config/{}/replication_schedule", config_id);
        self.send_optional(self.request(Method::GET, &path)).await
    }

    async fn create_config(&self, cluster_key: &str) -> Result<ReplicationConfig> {
        let builder = self
            .request(Method::POST, "/config")
            .json(&CreateConfigRequest { cluster_key });
        self.send(builder).await
    }

    async fn create_instance(
        &self,
        config_id: Uuid,
        address: &str,
        is_leader: bool,
        is_local: bool,
    ) -> Result<Instance> {
        let path = format!("/config/{}/instance", config_id);
        let builder = self.request(Method::POST, &path).json(&CreateInstanceRequest {
            address,
            is_leader,
            is_local,
        });
        self.send(builder).await
    }

    async fn enable_replication(&self, config_id: Uuid, frequency_ms: u64) -> Result<()> {
        let path = format!("/config/{}/replication_schedule/start", config_id);
        let builder = self.request(Method::PUT, &path).json(&StartScheduleRequest {
            frequency_milliseconds: frequency_ms,
        });
        check_status(builder.send().await?).await?;
        Ok(())
    }

    async fn disable_replication(&self, config_id: Uuid) -> Result<()> {
        let path = format!("/config/{}/replication_schedule/stop", config_id);
        check_status(self.request(Method::PUT, &path).send().await?).await?;
        Ok(())
    }
}
