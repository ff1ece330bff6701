use std::time::Duration;

use async_trait::async_trait;
use intelligence_core::models::{
    AiInsight, DeploymentPatch, InferenceRequest, InferenceResult, Model, ModelDeployment,
    ModelPatch, NewDeployment, NewModel, SystemMetrics, TrainingJob, TrainingRequest,
};
use intelligence_core::{ApiErrorKind, IntelligenceApi, IntelligenceConfig};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::ClientError;
use crate::types::Health;

#[derive(Debug, Default, Clone)]
pub struct ClientOptions {
    pub api_key: Option<String>,
    pub timeout: Option<Duration>,
}

/// HTTP client for the intelligence REST API.
#[derive(Debug, Clone)]
pub struct IntelligenceClient {
    base_url: String,
    opts: ClientOptions,
    http: reqwest::Client,
}

impl IntelligenceClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            base_url,
            opts: ClientOptions::default(),
            http: reqwest::Client::new(),
        }
    }

    pub fn from_config(cfg: &IntelligenceConfig) -> Result<Self, ClientError> {
        let mut client = Self::new(cfg.api_base_url.clone()).with_timeout(cfg.request_timeout())?;
        if let Some(key) = cfg.api_key.as_deref() {
            client = client.with_api_key(key);
        }
        Ok(client)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.opts.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, ClientError> {
        self.http = reqwest::Client::builder().timeout(timeout).build()?;
        self.opts.timeout = Some(timeout);
        Ok(self)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn headers(&self) -> Result<HeaderMap, ClientError> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = self.opts.api_key.as_deref() {
            let v = format!("Bearer {api_key}");
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&v).map_err(|e| {
                    ClientError::new(ApiErrorKind::Serialization, None, e.to_string())
                })?,
            );
        }
        Ok(headers)
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    pub(crate) async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&impl Serialize>,
    ) -> Result<Response, ClientError> {
        let mut req = self.http.request(method, self.url(path));
        if let Some(b) = body {
            req = req.json(b);
        }
        req = req.headers(self.headers()?);
        Ok(req.send().await?)
    }

    pub(crate) async fn map_error(&self, resp: Response) -> ClientError {
        let status = resp.status();
        let code = status.as_u16();
        let text = resp.text().await.unwrap_or_default();
        ClientError::new(
            ApiErrorKind::from_status(code),
            Some(code),
            if text.is_empty() {
                status.to_string()
            } else {
                text
            },
        )
    }

    #[tracing::instrument(level = "debug", skip_all, fields(method = %method, path = %path))]
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&impl Serialize>,
    ) -> Result<T, ClientError> {
        let resp = self.send(method, path, body).await?;
        if resp.status().is_success() {
            if resp.status().as_u16() == 204 {
                // Empty body: only types that accept `null` decode.
                return Ok(serde_json::from_value(Value::Null)?);
            }
            return Ok(resp.json::<T>().await?);
        }
        Err(self.map_error(resp).await)
    }

    /// Like `request_json` but discards any response body.
    pub async fn request_empty(
        &self,
        method: Method,
        path: &str,
        body: Option<&impl Serialize>,
    ) -> Result<(), ClientError> {
        let resp = self.send(method, path, body).await?;
        if resp.status().is_success() {
            return Ok(());
        }
        Err(self.map_error(resp).await)
    }

    pub async fn health(&self) -> Result<Health, ClientError> {
        self.request_json(Method::GET, "/api/v1/health", None::<&()>)
            .await
    }

    pub fn models(&self) -> crate::apis::ModelsApi {
        crate::apis::ModelsApi::new(self.clone())
    }

    pub fn training(&self) -> crate::apis::TrainingApi {
        crate::apis::TrainingApi::new(self.clone())
    }

    pub fn inference(&self) -> crate::apis::InferenceApi {
        crate::apis::InferenceApi::new(self.clone())
    }

    pub fn deployments(&self) -> crate::apis::DeploymentsApi {
        crate::apis::DeploymentsApi::new(self.clone())
    }

    pub fn insights(&self) -> crate::apis::InsightsApi {
        crate::apis::InsightsApi::new(self.clone())
    }

    pub fn metrics(&self) -> crate::apis::MetricsApi {
        crate::apis::MetricsApi::new(self.clone())
    }
}

#[async_trait]
impl IntelligenceApi for IntelligenceClient {
    async fn list_models(&self) -> intelligence_core::Result<Vec<Model>> {
        Ok(self.models().list().await?)
    }

    async fn create_model(&self, model: &NewModel) -> intelligence_core::Result<Model> {
        Ok(self.models().create(model).await?)
    }

    async fn update_model(&self, id: &str, patch: &ModelPatch) -> intelligence_core::Result<Model> {
        Ok(self.models().update(id, patch).await?)
    }

    async fn delete_model(&self, id: &str) -> intelligence_core::Result<()> {
        Ok(self.models().delete(id).await?)
    }

    async fn list_training_jobs(&self) -> intelligence_core::Result<Vec<TrainingJob>> {
        Ok(self.training().list_jobs().await?)
    }

    async fn start_training(
        &self,
        request: &TrainingRequest,
    ) -> intelligence_core::Result<TrainingJob> {
        Ok(self.training().start(request).await?)
    }

    async fn stop_training(&self, job_id: &str) -> intelligence_core::Result<TrainingJob> {
        Ok(self.training().stop(job_id).await?)
    }

    async fn run_inference(
        &self,
        request: &InferenceRequest,
    ) -> intelligence_core::Result<InferenceResult> {
        Ok(self.inference().run(request).await?)
    }

    async fn cancel_inference(&self, request_id: &str) -> intelligence_core::Result<()> {
        Ok(self.inference().cancel(request_id).await?)
    }

    async fn list_deployments(&self) -> intelligence_core::Result<Vec<ModelDeployment>> {
        Ok(self.deployments().list().await?)
    }

    async fn create_deployment(
        &self,
        deployment: &NewDeployment,
    ) -> intelligence_core::Result<ModelDeployment> {
        Ok(self.deployments().create(deployment).await?)
    }

    async fn update_deployment(
        &self,
        id: &str,
        patch: &DeploymentPatch,
    ) -> intelligence_core::Result<ModelDeployment> {
        Ok(self.deployments().update(id, patch).await?)
    }

    async fn scale_deployment(
        &self,
        id: &str,
        replicas: u32,
    ) -> intelligence_core::Result<ModelDeployment> {
        Ok(self.deployments().scale(id, replicas).await?)
    }

    async fn delete_deployment(&self, id: &str) -> intelligence_core::Result<()> {
        Ok(self.deployments().delete(id).await?)
    }

    async fn list_insights(&self) -> intelligence_core::Result<Vec<AiInsight>> {
        Ok(self.insights().list().await?)
    }

    async fn generate_insights(
        &self,
        model_id: Option<&str>,
    ) -> intelligence_core::Result<Vec<AiInsight>> {
        Ok(self.insights().generate(model_id).await?)
    }

    async fn dismiss_insight(&self, id: &str) -> intelligence_core::Result<AiInsight> {
        Ok(self.insights().dismiss(id).await?)
    }

    async fn system_metrics(&self) -> intelligence_core::Result<SystemMetrics> {
        Ok(self.metrics().system().await?)
    }
}
