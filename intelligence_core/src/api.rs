use async_trait::async_trait;

use crate::models::{
    AiInsight, DeploymentPatch, InferenceRequest, InferenceResult, Model,
    ModelDeployment, ModelPatch, NewDeployment, NewModel, SystemMetrics, TrainingJob,
    TrainingRequest,
};
use crate::Result;

/// Remote backend boundary.
///
/// Every call returns the server-canonical entity; callers treat the response
/// as authoritative over anything they constructed locally.
#[async_trait]
pub trait IntelligenceApi: Send + Sync {
    async fn list_models(&self) -> Result<Vec<Model>>;
    async fn create_model(&self, model: &NewModel) -> Result<Model>;
    async fn update_model(&self, id: &str, patch: &ModelPatch) -> Result<Model>;
    async fn delete_model(&self, id: &str) -> Result<()>;

    async fn list_training_jobs(&self) -> Result<Vec<TrainingJob>>;
    async fn start_training(&self, request: &TrainingRequest) -> Result<TrainingJob>;
    async fn stop_training(&self, job_id: &str) -> Result<TrainingJob>;

    async fn run_inference(&self, request: &InferenceRequest) -> Result<InferenceResult>;
    /// Ask the server to abandon a request. Best-effort; the server may ignore it.
    async fn cancel_inference(&self, request_id: &str) -> Result<()>;

    async fn list_deployments(&self) -> Result<Vec<ModelDeployment>>;
    async fn create_deployment(&self, deployment: &NewDeployment) -> Result<ModelDeployment>;
    async fn update_deployment(&self, id: &str, patch: &DeploymentPatch)
        -> Result<ModelDeployment>;
    async fn scale_deployment(&self, id: &str, replicas: u32) -> Result<ModelDeployment>;
    async fn delete_deployment(&self, id: &str) -> Result<()>;

    async fn list_insights(&self) -> Result<Vec<AiInsight>>;
    async fn generate_insights(&self, model_id: Option<&str>) -> Result<Vec<AiInsight>>;
    async fn dismiss_insight(&self, id: &str) -> Result<AiInsight>;

    async fn system_metrics(&self) -> Result<SystemMetrics>;
}
