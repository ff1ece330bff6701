use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Notify, RwLock};

use crate::api::IntelligenceApi;
use crate::error::ApiErrorKind;
use crate::models::{
    new_entity_id, AiInsight, DeploymentPatch, DeploymentStatus, InferenceRequest,
    InferenceResult, InsightSeverity, Model, ModelDeployment, ModelPatch, NewDeployment, NewModel,
    SystemMetrics, TrainingJob, TrainingProgress, TrainingRequest, TrainingStatus,
};
use crate::{Error, Result};

#[derive(Default)]
struct Inner {
    models: BTreeMap<String, Model>,
    jobs: BTreeMap<String, TrainingJob>,
    deployments: BTreeMap<String, ModelDeployment>,
    insights: BTreeMap<String, AiInsight>,
    metrics: SystemMetrics,
    failing: HashSet<&'static str>,
    held: HashMap<&'static str, Arc<Notify>>,
}

/// In-memory backend for local development and unit tests.
///
/// Semantics:
/// - ids are generated server-side (uuid v4), timestamps are `Utc::now()`
/// - inference echoes the input as output with a fixed latency
/// - `fail_operation` makes the named operation return a server error until cleared
/// - `hold_operation` parks the named operation until the returned gate is notified
#[derive(Clone, Default)]
pub struct MemoryIntelligenceApi {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryIntelligenceApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force `operation` (trait method name, e.g. `"create_model"`) to fail.
    pub async fn fail_operation(&self, operation: &'static str) {
        self.inner.write().await.failing.insert(operation);
    }

    pub async fn clear_failures(&self) {
        self.inner.write().await.failing.clear();
    }

    /// Park every call to `operation` until the returned gate is notified once per call.
    pub async fn hold_operation(&self, operation: &'static str) -> Arc<Notify> {
        self.inner
            .write()
            .await
            .held
            .entry(operation)
            .or_default()
            .clone()
    }

    pub async fn set_system_metrics(&self, metrics: SystemMetrics) {
        self.inner.write().await.metrics = metrics;
    }

    pub async fn insert_insight(&self, insight: AiInsight) {
        self.inner
            .write()
            .await
            .insights
            .insert(insight.id.clone(), insight);
    }

    async fn check(&self, operation: &'static str) -> Result<()> {
        let gate = self.inner.read().await.held.get(operation).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.inner.read().await.failing.contains(operation) {
            return Err(Error::api(
                ApiErrorKind::Server,
                Some(503),
                format!("{operation} unavailable"),
            ));
        }
        Ok(())
    }
}

fn not_found(what: &str, id: &str) -> Error {
    Error::api(ApiErrorKind::NotFound, Some(404), format!("{what} {id} not found"))
}

#[async_trait]
impl IntelligenceApi for MemoryIntelligenceApi {
    async fn list_models(&self) -> Result<Vec<Model>> {
        self.check("list_models").await?;
        Ok(self.inner.read().await.models.values().cloned().collect())
    }

    async fn create_model(&self, model: &NewModel) -> Result<Model> {
        self.check("create_model").await?;
        if model.name.trim().is_empty() {
            return Err(Error::api(
                ApiErrorKind::Validation,
                Some(422),
                "model name is required",
            ));
        }
        let now = Utc::now();
        let created = Model {
            id: new_entity_id(),
            name: model.name.clone(),
            model_type: model.model_type,
            algorithm: model.algorithm.clone(),
            hyperparameters: model.hyperparameters.clone(),
            features: model.features.clone(),
            validation_split: model.validation_split,
            description: model.description.clone(),
            version: 1,
            created_at: now,
            updated_at: now,
        };
        self.inner
            .write()
            .await
            .models
            .insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn update_model(&self, id: &str, patch: &ModelPatch) -> Result<Model> {
        self.check("update_model").await?;
        let mut inner = self.inner.write().await;
        let model = inner.models.get_mut(id).ok_or_else(|| not_found("model", id))?;
        model.apply(patch);
        model.version += 1;
        model.updated_at = Utc::now();
        Ok(model.clone())
    }

    async fn delete_model(&self, id: &str) -> Result<()> {
        self.check("delete_model").await?;
        self.inner
            .write()
            .await
            .models
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found("model", id))
    }

    async fn list_training_jobs(&self) -> Result<Vec<TrainingJob>> {
        self.check("list_training_jobs").await?;
        Ok(self.inner.read().await.jobs.values().cloned().collect())
    }

    async fn start_training(&self, request: &TrainingRequest) -> Result<TrainingJob> {
        self.check("start_training").await?;
        let mut inner = self.inner.write().await;
        if !inner.models.contains_key(&request.model_id) {
            return Err(not_found("model", &request.model_id));
        }
        let job = TrainingJob {
            id: new_entity_id(),
            model_id: request.model_id.clone(),
            status: TrainingStatus::Queued,
            progress: TrainingProgress {
                total_epochs: request.epochs.unwrap_or(10),
                ..TrainingProgress::default()
            },
            logs: vec![],
            artifacts: vec![],
            resource_usage: Default::default(),
            started_at: Utc::now(),
            completed_at: None,
        };
        inner.jobs.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    async fn stop_training(&self, job_id: &str) -> Result<TrainingJob> {
        self.check("stop_training").await?;
        let mut inner = self.inner.write().await;
        let job = inner
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| not_found("training job", job_id))?;
        if !job.status.is_terminal() {
            job.status = TrainingStatus::Stopped;
            job.completed_at = Some(Utc::now());
        }
        Ok(job.clone())
    }

    async fn run_inference(&self, request: &InferenceRequest) -> Result<InferenceResult> {
        self.check("run_inference").await?;
        if !self.inner.read().await.models.contains_key(&request.model_id) {
            return Err(not_found("model", &request.model_id));
        }
        Ok(InferenceResult {
            id: new_entity_id(),
            request_id: request.id.clone(),
            model_id: request.model_id.clone(),
            output: request.input.clone(),
            confidence: Some(1.0),
            latency_ms: 5.0,
            error: None,
            created_at: Utc::now(),
        })
    }

    async fn cancel_inference(&self, _request_id: &str) -> Result<()> {
        self.check("cancel_inference").await
    }

    async fn list_deployments(&self) -> Result<Vec<ModelDeployment>> {
        self.check("list_deployments").await?;
        Ok(self.inner.read().await.deployments.values().cloned().collect())
    }

    async fn create_deployment(&self, deployment: &NewDeployment) -> Result<ModelDeployment> {
        self.check("create_deployment").await?;
        let mut inner = self.inner.write().await;
        if !inner.models.contains_key(&deployment.model_id) {
            return Err(not_found("model", &deployment.model_id));
        }
        let now = Utc::now();
        let id = new_entity_id();
        let created = ModelDeployment {
            endpoint: Some(format!("/serve/{id}")),
            id,
            model_id: deployment.model_id.clone(),
            environment: deployment.environment,
            status: DeploymentStatus::Deploying,
            replicas: deployment.replicas,
            autoscaling: deployment.autoscaling.clone(),
            health_check: deployment.health_check.clone(),
            created_at: now,
            updated_at: now,
        };
        inner
            .deployments
            .insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn update_deployment(
        &self,
        id: &str,
        patch: &DeploymentPatch,
    ) -> Result<ModelDeployment> {
        self.check("update_deployment").await?;
        let mut inner = self.inner.write().await;
        let deployment = inner
            .deployments
            .get_mut(id)
            .ok_or_else(|| not_found("deployment", id))?;
        deployment.apply(patch);
        deployment.updated_at = Utc::now();
        Ok(deployment.clone())
    }

    async fn scale_deployment(&self, id: &str, replicas: u32) -> Result<ModelDeployment> {
        self.check("scale_deployment").await?;
        let mut inner = self.inner.write().await;
        let deployment = inner
            .deployments
            .get_mut(id)
            .ok_or_else(|| not_found("deployment", id))?;
        deployment.replicas = replicas;
        deployment.updated_at = Utc::now();
        Ok(deployment.clone())
    }

    async fn delete_deployment(&self, id: &str) -> Result<()> {
        self.check("delete_deployment").await?;
        self.inner
            .write()
            .await
            .deployments
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found("deployment", id))
    }

    async fn list_insights(&self) -> Result<Vec<AiInsight>> {
        self.check("list_insights").await?;
        Ok(self.inner.read().await.insights.values().cloned().collect())
    }

    async fn generate_insights(&self, model_id: Option<&str>) -> Result<Vec<AiInsight>> {
        self.check("generate_insights").await?;
        let mut inner = self.inner.write().await;
        let targets: Vec<Model> = inner
            .models
            .values()
            .filter(|m| model_id.map_or(true, |id| m.id == id))
            .cloned()
            .collect();
        let mut out = Vec::with_capacity(targets.len());
        for model in targets {
            let insight = AiInsight {
                id: new_entity_id(),
                category: "performance".to_string(),
                severity: InsightSeverity::Info,
                title: format!("Review {}", model.name),
                description: format!(
                    "{} has {} features and no recent evaluation",
                    model.name,
                    model.features.len()
                ),
                confidence: 0.5,
                recommendations: vec!["Schedule an evaluation run".to_string()],
                dismissed: false,
                created_at: Utc::now(),
            };
            inner.insights.insert(insight.id.clone(), insight.clone());
            out.push(insight);
        }
        Ok(out)
    }

    async fn dismiss_insight(&self, id: &str) -> Result<AiInsight> {
        self.check("dismiss_insight").await?;
        let mut inner = self.inner.write().await;
        let insight = inner
            .insights
            .get_mut(id)
            .ok_or_else(|| not_found("insight", id))?;
        insight.dismissed = true;
        Ok(insight.clone())
    }

    async fn system_metrics(&self) -> Result<SystemMetrics> {
        self.check("system_metrics").await?;
        let mut metrics = self.inner.read().await.metrics.clone();
        metrics.collected_at.get_or_insert_with(Utc::now);
        Ok(metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeploymentDraft, DeploymentEnvironment, ModelDraft, ModelType};

    #[tokio::test]
    async fn create_then_deploy_then_scale() {
        let api = MemoryIntelligenceApi::new();
        let model = api
            .create_model(&ModelDraft::new("fraud", ModelType::Anomaly).into())
            .await
            .unwrap();
        assert_eq!(model.algorithm, "isolation_forest");

        let dep = api
            .create_deployment(
                &DeploymentDraft::new(model.id.clone(), DeploymentEnvironment::Production).into(),
            )
            .await
            .unwrap();
        assert_eq!(dep.status, DeploymentStatus::Deploying);
        let scaled = api.scale_deployment(&dep.id, 4).await.unwrap();
        assert_eq!(scaled.replicas, 4);
    }

    #[tokio::test]
    async fn failing_operation_returns_server_error() {
        let api = MemoryIntelligenceApi::new();
        api.fail_operation("list_models").await;
        let err = api.list_models().await.unwrap_err();
        assert!(matches!(
            err,
            Error::Api {
                kind: ApiErrorKind::Server,
                ..
            }
        ));
        api.clear_failures().await;
        assert!(api.list_models().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn training_requires_known_model() {
        let api = MemoryIntelligenceApi::new();
        let err = api
            .start_training(&TrainingRequest::new("nope"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Api {
                kind: ApiErrorKind::NotFound,
                ..
            }
        ));
    }
}
