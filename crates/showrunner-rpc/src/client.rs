//! Client for the remote generation backend.

use async_trait::async_trait;
use reqwest::RequestBuilder;
use tracing::{debug, instrument};
use uuid::Uuid;

use showrunner_core::services::{
    CompileResponse, PlanRequest, PlanResponse, Planner, SceneWriter, ScriptCompiler,
    ServiceError, WriteRequest,
};

use crate::config::RpcConfig;

/// HTTP client for the generation backend. Implements the planner, scene
/// writer, and script compiler contracts over one connection pool.
#[derive(Debug, Clone)]
pub struct BackendClient {
    config: RpcConfig,
    client: reqwest::Client,
}

impl BackendClient {
    /// Creates a client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Transport`] if the TLS backend cannot be
    /// initialized.
    pub fn new(config: RpcConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|error| ServiceError::Transport(error.to_string()))?;
        Ok(Self { config, client })
    }

    /// The backend configuration.
    #[must_use]
    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let url = format!("{}{path}", self.config.base_url);
        let mut request = self.client.post(url);
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }
        request
    }

    /// Checks that the backend is up.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Transport`] if the backend is unreachable,
    /// or [`ServiceError::Backend`] on a non-success status.
    #[instrument(skip(self), fields(base_url = %self.config.base_url))]
    pub async fn health_check(&self) -> Result<(), ServiceError> {
        let url = format!("{}/health", self.config.base_url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|error| ServiceError::Transport(error.to_string()))?;
        check_status(response).await?;
        Ok(())
    }
}

/// Maps a non-success response to [`ServiceError::Backend`], carrying the
/// status and whatever body the backend sent.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ServiceError::Backend(format!("{status}: {body}")))
}

#[async_trait]
impl Planner for BackendClient {
    #[instrument(skip(self, request), fields(project_id = %request.project_id, episode = request.episode_number))]
    async fn plan(&self, request: &PlanRequest) -> Result<PlanResponse, ServiceError> {
        let response = self
            .post(&format!("/v1/projects/{}/plan", request.project_id))
            .json(request)
            .send()
            .await
            .map_err(|error| ServiceError::Transport(error.to_string()))?;
        let response = check_status(response).await?;
        let plan: PlanResponse = response
            .json()
            .await
            .map_err(|error| ServiceError::Backend(format!("malformed plan response: {error}")))?;
        debug!(scenes_planned = plan.scenes_planned, jobs = plan.job_ids.len(), "outline planned");
        Ok(plan)
    }
}

#[async_trait]
impl SceneWriter for BackendClient {
    #[instrument(skip(self, request), fields(project_id = %request.project_id))]
    async fn write_scene(&self, request: &WriteRequest) -> Result<(), ServiceError> {
        let response = self
            .post(&format!("/v1/projects/{}/scenes/write", request.project_id))
            .json(request)
            .send()
            .await
            .map_err(|error| ServiceError::Transport(error.to_string()))?;
        // The body is an acknowledgement; only the status matters.
        check_status(response).await?;
        debug!("scene write accepted");
        Ok(())
    }
}

#[async_trait]
impl ScriptCompiler for BackendClient {
    #[instrument(skip(self))]
    async fn compile(
        &self,
        project_id: Uuid,
        episode_number: i32,
    ) -> Result<CompileResponse, ServiceError> {
        let response = self
            .post(&format!(
                "/v1/projects/{project_id}/episodes/{episode_number}/compile"
            ))
            .send()
            .await
            .map_err(|error| ServiceError::Transport(error.to_string()))?;
        let response = check_status(response).await?;
        response.json().await.map_err(|error| {
            ServiceError::Backend(format!("malformed compile response: {error}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_config_builder_sets_auth_and_timeout() {
        let config = RpcConfig::new("http://localhost:9090")
            .with_api_key("secret")
            .with_timeout(Duration::from_secs(5));

        assert_eq!(config.base_url, "http://localhost:9090");
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_a_transport_error() {
        // Port 9 (discard) is never listening in test environments.
        let config =
            RpcConfig::new("http://127.0.0.1:9").with_timeout(Duration::from_millis(200));
        let client = BackendClient::new(config).unwrap();

        let error = client.health_check().await.unwrap_err();

        assert!(matches!(error, ServiceError::Transport(_)));
    }
}
