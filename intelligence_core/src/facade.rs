//! Async commands that talk to the backend and fold results into the store.
//!
//! Every command follows the same protocol: call the API, and on success
//! dispatch the server's entity and notify; on failure record the error,
//! notify with a retry affordance and return the error with the entity
//! collections untouched.

use std::sync::Arc;

use chrono::Utc;

use crate::api::IntelligenceApi;
use crate::models::{
    new_entity_id, AiInsight, DeploymentDraft, DeploymentPatch, EntityId, InferenceDraft,
    InferenceRequest, InferenceRequestPatch, InferenceResult, InferenceStatus, Model,
    ModelDeployment, ModelDraft, ModelPatch, NewDeployment, NewModel, SystemMetrics, TrainingJob,
    TrainingRequest,
};
use crate::notify::{Notification, Notifier};
use crate::store::{Action, IntelligenceStore};
use crate::{Error, Result};

/// One loader that failed during `initialize`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub collection: &'static str,
    pub message: String,
}

/// Outcome of `initialize`. Partial failure is not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitReport {
    pub loaded: Vec<&'static str>,
    pub failures: Vec<LoadFailure>,
}

impl InitReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    fn record<T>(&mut self, collection: &'static str, res: Result<T>) -> Option<T> {
        match res {
            Ok(v) => {
                self.loaded.push(collection);
                Some(v)
            }
            Err(e) => {
                tracing::warn!(collection, error = %e, "initial load failed");
                self.failures.push(LoadFailure {
                    collection,
                    message: e.user_message(),
                });
                None
            }
        }
    }
}

#[derive(Clone)]
pub struct IntelligenceService {
    api: Arc<dyn IntelligenceApi>,
    store: IntelligenceStore,
    notifier: Arc<dyn Notifier>,
}

impl IntelligenceService {
    pub fn new(
        api: Arc<dyn IntelligenceApi>,
        store: IntelligenceStore,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            api,
            store,
            notifier,
        }
    }

    pub fn store(&self) -> &IntelligenceStore {
        &self.store
    }

    // -- lifecycle ---------------------------------------------------------

    /// Load every collection concurrently. Each success is applied even when
    /// siblings fail.
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn initialize(&self) -> InitReport {
        self.store.dispatch(Action::SetLoading(true));

        let (models, jobs, deployments, insights, metrics) = tokio::join!(
            self.api.list_models(),
            self.api.list_training_jobs(),
            self.api.list_deployments(),
            self.api.list_insights(),
            self.api.system_metrics(),
        );

        let mut report = InitReport::default();
        if let Some(v) = report.record("models", models) {
            self.store.dispatch(Action::SetModels(v));
        }
        if let Some(v) = report.record("training_jobs", jobs) {
            self.store.dispatch(Action::SetTrainingJobs(v));
        }
        if let Some(v) = report.record("deployments", deployments) {
            self.store.dispatch(Action::SetDeployments(v));
        }
        if let Some(v) = report.record("insights", insights) {
            self.store.dispatch(Action::SetInsights(v));
        }
        if let Some(v) = report.record("system_metrics", metrics) {
            self.store.dispatch(Action::SetSystemMetrics(v));
        }

        if report.is_complete() {
            self.clear_error();
        } else {
            let names: Vec<&str> = report.failures.iter().map(|f| f.collection).collect();
            let message = format!("Could not load: {}", names.join(", "));
            self.store.dispatch(Action::SetError(Some(message.clone())));
            self.notifier
                .notify(Notification::warning("Partial data loaded", message));
        }

        self.store.dispatch(Action::SetLoading(false));
        report
    }

    // -- models ------------------------------------------------------------

    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn create_model(&self, draft: ModelDraft) -> Result<Model> {
        const CMD: &str = "create_model";
        if draft.name.trim().is_empty() {
            let err = Error::InvalidInput("model name is required".to_string());
            return self.fail(CMD, "Model creation failed", err);
        }
        let payload = NewModel::from(draft);
        match self.api.create_model(&payload).await {
            Ok(model) => {
                self.store.dispatch(Action::AddModel(model.clone()));
                self.succeed("Model created", format!("{} is ready for training", model.name));
                Ok(model)
            }
            Err(e) => self.fail(CMD, "Model creation failed", e),
        }
    }

    #[tracing::instrument(level = "debug", skip_all, fields(id = %id))]
    pub async fn update_model(&self, id: &str, patch: ModelPatch) -> Result<Model> {
        match self.api.update_model(id, &patch).await {
            Ok(model) => {
                self.store.dispatch(Action::UpdateModel {
                    id: model.id.clone(),
                    patch: model.clone().into(),
                });
                self.succeed("Model updated", model.name.clone());
                Ok(model)
            }
            Err(e) => self.fail("update_model", "Model update failed", e),
        }
    }

    #[tracing::instrument(level = "debug", skip_all, fields(id = %id))]
    pub async fn delete_model(&self, id: &str) -> Result<()> {
        match self.api.delete_model(id).await {
            Ok(()) => {
                self.store.dispatch(Action::RemoveModel(id.to_string()));
                self.succeed("Model deleted", id.to_string());
                Ok(())
            }
            Err(e) => self.fail("delete_model", "Model deletion failed", e),
        }
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn refresh_models(&self) -> Result<Vec<Model>> {
        match self.api.list_models().await {
            Ok(models) => {
                self.store.dispatch(Action::SetModels(models.clone()));
                self.clear_error();
                Ok(models)
            }
            Err(e) => self.fail("refresh_models", "Could not load models", e),
        }
    }

    // -- training ----------------------------------------------------------

    #[tracing::instrument(level = "debug", skip_all, fields(model_id = %request.model_id))]
    pub async fn start_training(&self, request: TrainingRequest) -> Result<TrainingJob> {
        let request = request.with_defaults();
        match self.api.start_training(&request).await {
            Ok(job) => {
                self.store.dispatch(Action::AddTrainingJob(job.clone()));
                self.succeed(
                    "Training started",
                    format!("Job {} queued for model {}", job.id, job.model_id),
                );
                Ok(job)
            }
            Err(e) => self.fail("start_training", "Training failed to start", e),
        }
    }

    #[tracing::instrument(level = "debug", skip_all, fields(job_id = %job_id))]
    pub async fn stop_training(&self, job_id: &str) -> Result<TrainingJob> {
        match self.api.stop_training(job_id).await {
            Ok(job) => {
                self.store.dispatch(Action::UpdateTrainingJob {
                    id: job.id.clone(),
                    patch: job.clone().into(),
                });
                self.succeed("Training stopped", format!("Job {}", job.id));
                Ok(job)
            }
            Err(e) => self.fail("stop_training", "Could not stop training", e),
        }
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn refresh_training_jobs(&self) -> Result<Vec<TrainingJob>> {
        match self.api.list_training_jobs().await {
            Ok(jobs) => {
                self.store.dispatch(Action::SetTrainingJobs(jobs.clone()));
                self.clear_error();
                Ok(jobs)
            }
            Err(e) => self.fail("refresh_training_jobs", "Could not load training jobs", e),
        }
    }

    // -- inference ---------------------------------------------------------

    /// Register the request locally, run it remotely and record the result.
    ///
    /// The request stays in the active set until its own result lands or the
    /// call fails.
    #[tracing::instrument(level = "debug", skip_all, fields(model_id = %draft.model_id))]
    pub async fn run_inference(&self, draft: InferenceDraft) -> Result<InferenceResult> {
        let request = InferenceRequest {
            id: new_entity_id(),
            model_id: draft.model_id,
            input: draft.input,
            status: InferenceStatus::Processing,
            created_at: Utc::now(),
        };
        self.store
            .dispatch(Action::AddInferenceRequest(request.clone()));

        match self.api.run_inference(&request).await {
            Ok(mut result) => {
                // The local id is authoritative for correlating the result.
                result.request_id = request.id.clone();
                self.store
                    .dispatch(Action::AddInferenceResult(result.clone()));
                self.clear_error();
                tracing::debug!(latency_ms = result.latency_ms, "inference finished");
                Ok(result)
            }
            Err(e) => {
                self.store.dispatch(Action::UpdateInferenceRequest {
                    id: request.id,
                    patch: InferenceRequestPatch {
                        status: Some(InferenceStatus::Failed),
                    },
                });
                self.fail("run_inference", "Inference failed", e)
            }
        }
    }

    /// Mark the request cancelled right away, then tell the server.
    ///
    /// A server-side failure is logged and otherwise ignored. Cancelling a
    /// request that already finished changes nothing.
    #[tracing::instrument(level = "debug", skip_all, fields(request_id = %request_id))]
    pub async fn cancel_inference(&self, request_id: &str) -> Result<()> {
        let status = self
            .store
            .snapshot()
            .inference_requests
            .get(request_id)
            .map(|r| r.status);
        let Some(status) = status else {
            let err = Error::NotFound(format!("inference request {request_id}"));
            return self.fail("cancel_inference", "Could not cancel inference", err);
        };
        if status.is_terminal() {
            tracing::debug!(?status, "inference already finished, nothing to cancel");
            return Ok(());
        }
        self.store.dispatch(Action::UpdateInferenceRequest {
            id: request_id.to_string(),
            patch: InferenceRequestPatch {
                status: Some(InferenceStatus::Cancelled),
            },
        });
        if let Err(e) = self.api.cancel_inference(request_id).await {
            tracing::warn!(error = %e, "server-side inference cancel failed");
        }
        self.notifier
            .notify(Notification::info("Inference cancelled", request_id.to_string()));
        Ok(())
    }

    // -- deployments -------------------------------------------------------

    #[tracing::instrument(level = "debug", skip_all, fields(model_id = %draft.model_id))]
    pub async fn deploy_model(&self, draft: DeploymentDraft) -> Result<ModelDeployment> {
        let payload = NewDeployment::from(draft);
        match self.api.create_deployment(&payload).await {
            Ok(deployment) => {
                self.store
                    .dispatch(Action::AddDeployment(deployment.clone()));
                self.succeed(
                    "Deployment started",
                    format!(
                        "Model {} deploying with {} replica(s)",
                        deployment.model_id, deployment.replicas
                    ),
                );
                Ok(deployment)
            }
            Err(e) => self.fail("deploy_model", "Deployment failed", e),
        }
    }

    #[tracing::instrument(level = "debug", skip_all, fields(id = %id))]
    pub async fn update_deployment(
        &self,
        id: &str,
        patch: DeploymentPatch,
    ) -> Result<ModelDeployment> {
        match self.api.update_deployment(id, &patch).await {
            Ok(deployment) => {
                self.apply_deployment(&deployment);
                self.succeed("Deployment updated", deployment.id.clone());
                Ok(deployment)
            }
            Err(e) => self.fail("update_deployment", "Deployment update failed", e),
        }
    }

    #[tracing::instrument(level = "debug", skip_all, fields(id = %id, replicas = replicas))]
    pub async fn scale_deployment(&self, id: &str, replicas: u32) -> Result<ModelDeployment> {
        const CMD: &str = "scale_deployment";
        if replicas == 0 {
            let err = Error::InvalidInput("replicas must be at least 1".to_string());
            return self.fail(CMD, "Scaling failed", err);
        }
        match self.api.scale_deployment(id, replicas).await {
            Ok(deployment) => {
                self.apply_deployment(&deployment);
                self.succeed(
                    "Deployment scaled",
                    format!("{} now runs {} replica(s)", deployment.id, deployment.replicas),
                );
                Ok(deployment)
            }
            Err(e) => self.fail(CMD, "Scaling failed", e),
        }
    }

    #[tracing::instrument(level = "debug", skip_all, fields(id = %id))]
    pub async fn undeploy(&self, id: &str) -> Result<()> {
        match self.api.delete_deployment(id).await {
            Ok(()) => {
                self.store.dispatch(Action::RemoveDeployment(id.to_string()));
                self.succeed("Deployment removed", id.to_string());
                Ok(())
            }
            Err(e) => self.fail("undeploy", "Could not remove deployment", e),
        }
    }

    // -- insights ----------------------------------------------------------

    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn refresh_insights(&self) -> Result<Vec<AiInsight>> {
        match self.api.list_insights().await {
            Ok(insights) => {
                self.store.dispatch(Action::SetInsights(insights.clone()));
                self.clear_error();
                Ok(insights)
            }
            Err(e) => self.fail("refresh_insights", "Could not load insights", e),
        }
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn generate_insights(&self, model_id: Option<&str>) -> Result<Vec<AiInsight>> {
        match self.api.generate_insights(model_id).await {
            Ok(insights) => {
                for insight in &insights {
                    self.store.dispatch(Action::AddInsight(insight.clone()));
                }
                self.succeed(
                    "Insights generated",
                    format!("{} new insight(s)", insights.len()),
                );
                Ok(insights)
            }
            Err(e) => self.fail("generate_insights", "Insight generation failed", e),
        }
    }

    #[tracing::instrument(level = "debug", skip_all, fields(id = %id))]
    pub async fn dismiss_insight(&self, id: &str) -> Result<AiInsight> {
        match self.api.dismiss_insight(id).await {
            Ok(insight) => {
                self.store.dispatch(Action::UpdateInsight {
                    id: insight.id.clone(),
                    patch: insight.clone().into(),
                });
                self.clear_error();
                Ok(insight)
            }
            Err(e) => self.fail("dismiss_insight", "Could not dismiss insight", e),
        }
    }

    // -- metrics -----------------------------------------------------------

    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn refresh_system_metrics(&self) -> Result<SystemMetrics> {
        match self.api.system_metrics().await {
            Ok(metrics) => {
                self.store
                    .dispatch(Action::SetSystemMetrics(metrics.clone()));
                self.clear_error();
                Ok(metrics)
            }
            Err(e) => self.fail("refresh_system_metrics", "Could not load metrics", e),
        }
    }

    // -- helpers -----------------------------------------------------------

    fn apply_deployment(&self, deployment: &ModelDeployment) {
        let id: EntityId = deployment.id.clone();
        self.store.dispatch(Action::UpdateDeployment {
            id,
            patch: deployment.clone().into(),
        });
    }

    fn succeed(&self, title: &str, message: impl Into<String>) {
        self.clear_error();
        self.notifier.notify(Notification::success(title, message));
    }

    fn clear_error(&self) {
        if self.store.snapshot().error.is_some() {
            self.store.dispatch(Action::SetError(None));
        }
    }

    fn fail<T>(&self, command: &'static str, title: &str, err: Error) -> Result<T> {
        let message = err.user_message();
        tracing::warn!(command, error = %err, "command failed");
        self.store.dispatch(Action::SetError(Some(message.clone())));
        self.notifier
            .notify(Notification::error_with_retry(title, message, command));
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryIntelligenceApi;
    use crate::models::{DeploymentEnvironment, ModelType, TrainingStatus};
    use crate::notify::{BroadcastNotifier, NotificationAction, NotificationLevel};
    use serde_json::json;

    fn service() -> (IntelligenceService, MemoryIntelligenceApi, BroadcastNotifier) {
        let api = MemoryIntelligenceApi::new();
        let notifier = BroadcastNotifier::default();
        let svc = IntelligenceService::new(
            Arc::new(api.clone()),
            IntelligenceStore::default(),
            Arc::new(notifier.clone()),
        );
        (svc, api, notifier)
    }

    async fn model(svc: &IntelligenceService) -> Model {
        svc.create_model(ModelDraft::new("churn", ModelType::Classification))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_model_applies_defaults_and_notifies() {
        let (svc, _api, notifier) = service();
        let mut rx = notifier.subscribe();
        let m = model(&svc).await;
        assert_eq!(m.algorithm, "random_forest");
        let state = svc.store().snapshot();
        assert_eq!(state.metrics.total_models, 1);
        assert!(state.models.contains_key(&m.id));
        assert_eq!(rx.try_recv().unwrap().level, NotificationLevel::Success);
    }

    #[tokio::test]
    async fn failed_command_sets_error_and_leaves_entities() {
        let (svc, api, notifier) = service();
        let m = model(&svc).await;
        let before = svc.store().snapshot();
        let mut rx = notifier.subscribe();

        api.fail_operation("start_training").await;
        let err = svc
            .start_training(TrainingRequest::new(m.id.clone()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Api { .. }));

        let after = svc.store().snapshot();
        assert_eq!(after.training_jobs, before.training_jobs);
        assert_eq!(after.models, before.models);
        assert_eq!(after.error.as_deref(), Some("start_training unavailable"));
        let n = rx.try_recv().unwrap();
        assert_eq!(n.level, NotificationLevel::Error);
        assert_eq!(
            n.action,
            Some(NotificationAction::Retry {
                command: "start_training".to_string()
            })
        );

        // The next success clears the error.
        api.clear_failures().await;
        svc.start_training(TrainingRequest::new(m.id)).await.unwrap();
        assert!(svc.store().snapshot().error.is_none());
    }

    #[tokio::test]
    async fn empty_model_name_is_rejected_locally() {
        let (svc, _api, _n) = service();
        let err = svc
            .create_model(ModelDraft::new("  ", ModelType::Regression))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(svc.store().snapshot().metrics.total_models, 0);
    }

    #[tokio::test]
    async fn training_lifecycle_tracks_active_set() {
        let (svc, _api, _n) = service();
        let m = model(&svc).await;
        let job = svc.start_training(TrainingRequest::new(m.id)).await.unwrap();
        assert_eq!(job.progress.total_epochs, 10);
        assert_eq!(svc.store().snapshot().metrics.active_training_jobs, 1);

        let stopped = svc.stop_training(&job.id).await.unwrap();
        assert_eq!(stopped.status, TrainingStatus::Stopped);
        let state = svc.store().snapshot();
        assert_eq!(state.metrics.active_training_jobs, 0);
        assert_eq!(state.metrics.total_training_jobs, 1);
    }

    #[tokio::test]
    async fn server_entities_replace_stale_local_fields() {
        let (svc, _api, _n) = service();
        let mut draft = ModelDraft::new("churn", ModelType::Classification);
        draft.description = Some("old".to_string());
        let m = svc.create_model(draft).await.unwrap();
        assert_eq!(
            svc.store().snapshot().models[&m.id].description.as_deref(),
            Some("old")
        );

        let cleared = ModelPatch {
            description: Some(None),
            ..ModelPatch::default()
        };
        let updated = svc.update_model(&m.id, cleared).await.unwrap();
        assert_eq!(updated.description, None);
        assert_eq!(svc.store().snapshot().models[&m.id], updated);

        let dep = svc
            .deploy_model(DeploymentDraft::new(m.id.clone(), DeploymentEnvironment::Staging))
            .await
            .unwrap();
        assert!(dep.endpoint.is_some());
        let no_endpoint = DeploymentPatch {
            endpoint: Some(None),
            ..DeploymentPatch::default()
        };
        let updated = svc.update_deployment(&dep.id, no_endpoint).await.unwrap();
        assert_eq!(updated.endpoint, None);
        assert_eq!(svc.store().snapshot().deployments[&dep.id], updated);

        // Logs streamed in locally are superseded by the server's job.
        let job = svc.start_training(TrainingRequest::new(m.id)).await.unwrap();
        let progress = crate::events::PushEvent::parse(
            &json!({
                "type": "training_progress",
                "payload": {
                    "jobId": job.id,
                    "status": "training",
                    "logs": [{ "timestamp": "2026-01-01T00:00:00Z", "level": "info", "message": "epoch 1" }]
                }
            })
            .to_string(),
        )
        .unwrap();
        svc.store().dispatch(progress.into_action());
        assert_eq!(svc.store().snapshot().training_jobs[&job.id].logs.len(), 1);

        let stopped = svc.stop_training(&job.id).await.unwrap();
        assert_eq!(svc.store().snapshot().training_jobs[&job.id], stopped);
    }

    #[tokio::test]
    async fn run_inference_records_result_and_completes_request() {
        let (svc, _api, _n) = service();
        let m = model(&svc).await;
        let result = svc
            .run_inference(InferenceDraft {
                model_id: m.id,
                input: json!({"x": 1}),
            })
            .await
            .unwrap();
        let state = svc.store().snapshot();
        assert_eq!(state.inference_requests[&result.request_id].status, InferenceStatus::Completed);
        assert!(state.active_inferences.is_empty());
        assert_eq!(state.metrics.average_inference_latency_ms, 5.0);
    }

    #[tokio::test]
    async fn failed_inference_marks_request_failed() {
        let (svc, api, _n) = service();
        let m = model(&svc).await;
        api.fail_operation("run_inference").await;
        svc.run_inference(InferenceDraft {
            model_id: m.id,
            input: json!(null),
        })
        .await
        .unwrap_err();
        let state = svc.store().snapshot();
        assert!(state.active_inferences.is_empty());
        assert_eq!(state.metrics.total_inferences, 1);
        let req = state.inference_requests.values().next().unwrap();
        assert_eq!(req.status, InferenceStatus::Failed);
        assert!(state.inference_results.is_empty());
    }

    #[tokio::test]
    async fn foreign_push_result_does_not_resolve_pending_inference() {
        let (svc, api, _n) = service();
        let m = model(&svc).await;
        let gate = api.hold_operation("run_inference").await;

        let pending = tokio::spawn({
            let svc = svc.clone();
            let model_id = m.id.clone();
            async move {
                svc.run_inference(InferenceDraft {
                    model_id,
                    input: json!({"q": "hello"}),
                })
                .await
            }
        });

        // Wait for the local request to be registered.
        let mut rx = svc.store().subscribe();
        while rx.borrow_and_update().active_inferences.is_empty() {
            rx.changed().await.unwrap();
        }
        let own_id = svc
            .store()
            .snapshot()
            .active_inferences
            .iter()
            .next()
            .cloned()
            .unwrap();

        let foreign = crate::events::PushEvent::parse(
            &json!({
                "type": "inference_result",
                "payload": {
                    "id": "res-other",
                    "requestId": "someone-else",
                    "modelId": m.id,
                    "output": {},
                    "latencyMs": 30.0,
                    "createdAt": "2026-01-01T00:00:00Z"
                }
            })
            .to_string(),
        )
        .unwrap();
        svc.store().dispatch(foreign.into_action());

        let state = svc.store().snapshot();
        assert!(state.inference_results.contains_key("res-other"));
        assert!(state.active_inferences.contains(&own_id));

        gate.notify_one();
        let own = pending.await.unwrap().unwrap();
        assert_eq!(own.request_id, own_id);
        let state = svc.store().snapshot();
        assert!(!state.active_inferences.contains(&own_id));
        assert_eq!(state.metrics.total_inference_results, 2);
    }

    #[tokio::test]
    async fn cancel_is_immediate_even_when_server_refuses() {
        let (svc, api, _n) = service();
        let m = model(&svc).await;
        let gate = api.hold_operation("run_inference").await;
        api.fail_operation("cancel_inference").await;

        let pending = tokio::spawn({
            let svc = svc.clone();
            async move {
                svc.run_inference(InferenceDraft {
                    model_id: m.id,
                    input: json!(1),
                })
                .await
            }
        });
        let mut rx = svc.store().subscribe();
        while rx.borrow_and_update().active_inferences.is_empty() {
            rx.changed().await.unwrap();
        }
        let id = svc
            .store()
            .snapshot()
            .active_inferences
            .iter()
            .next()
            .cloned()
            .unwrap();

        svc.cancel_inference(&id).await.unwrap();
        let state = svc.store().snapshot();
        assert_eq!(state.inference_requests[&id].status, InferenceStatus::Cancelled);
        assert!(state.active_inferences.is_empty());
        assert!(state.error.is_none());

        // A late result is recorded but does not revive the request.
        gate.notify_one();
        pending.await.unwrap().unwrap();
        let state = svc.store().snapshot();
        assert_eq!(state.inference_requests[&id].status, InferenceStatus::Cancelled);
        assert_eq!(state.metrics.total_inference_results, 1);
    }

    #[tokio::test]
    async fn cancel_unknown_request_is_not_found() {
        let (svc, _api, notifier) = service();
        let mut rx = notifier.subscribe();
        assert!(matches!(
            svc.cancel_inference("ghost").await,
            Err(Error::NotFound(_))
        ));
        assert!(svc.store().snapshot().error.is_some());
        let n = rx.try_recv().unwrap();
        assert_eq!(n.level, NotificationLevel::Error);
        assert_eq!(
            n.action,
            Some(NotificationAction::Retry {
                command: "cancel_inference".to_string()
            })
        );
    }

    #[tokio::test]
    async fn cancel_after_completion_keeps_completed() {
        let (svc, api, notifier) = service();
        let m = model(&svc).await;
        let result = svc
            .run_inference(InferenceDraft {
                model_id: m.id,
                input: json!({"x": 2}),
            })
            .await
            .unwrap();
        let before = svc.store().snapshot();
        assert_eq!(
            before.result_for_request(&result.request_id).map(|r| &r.id),
            Some(&result.id)
        );

        // A server call would fail; a finished request must never reach it.
        api.fail_operation("cancel_inference").await;
        let mut rx = notifier.subscribe();
        svc.cancel_inference(&result.request_id).await.unwrap();

        let after = svc.store().snapshot();
        assert_eq!(
            after.inference_requests[&result.request_id].status,
            InferenceStatus::Completed
        );
        assert_eq!(after.metrics, before.metrics);
        assert!(after.error.is_none());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn deployment_commands_round_through_store() {
        let (svc, _api, _n) = service();
        let m = model(&svc).await;
        let dep = svc
            .deploy_model(DeploymentDraft::new(m.id, DeploymentEnvironment::Staging))
            .await
            .unwrap();
        assert_eq!(svc.store().snapshot().metrics.total_replicas, 1);

        svc.scale_deployment(&dep.id, 3).await.unwrap();
        assert_eq!(svc.store().snapshot().deployments[&dep.id].replicas, 3);
        assert!(matches!(
            svc.scale_deployment(&dep.id, 0).await,
            Err(Error::InvalidInput(_))
        ));
        assert_eq!(svc.store().snapshot().deployments[&dep.id].replicas, 3);

        svc.undeploy(&dep.id).await.unwrap();
        assert_eq!(svc.store().snapshot().metrics.total_deployments, 0);
    }

    #[tokio::test]
    async fn refresh_insights_picks_up_backend_insights() {
        let (svc, api, _n) = service();
        api.insert_insight(AiInsight {
            id: "i-drift".to_string(),
            category: "drift".to_string(),
            severity: crate::models::InsightSeverity::High,
            title: "Feature drift".to_string(),
            description: "income distribution shifted".to_string(),
            confidence: 0.8,
            recommendations: vec![],
            dismissed: false,
            created_at: Utc::now(),
        })
        .await;
        let insights = svc.refresh_insights().await.unwrap();
        assert_eq!(insights.len(), 1);
        let state = svc.store().snapshot();
        assert_eq!(state.insights["i-drift"].category, "drift");
        assert_eq!(state.metrics.active_insights, 1);
    }

    #[tokio::test]
    async fn insights_generate_then_dismiss() {
        let (svc, _api, _n) = service();
        let m = model(&svc).await;
        let insights = svc.generate_insights(Some(&m.id)).await.unwrap();
        assert_eq!(insights.len(), 1);
        assert_eq!(svc.store().snapshot().metrics.active_insights, 1);
        svc.dismiss_insight(&insights[0].id).await.unwrap();
        assert_eq!(svc.store().snapshot().metrics.active_insights, 0);
    }

    #[tokio::test]
    async fn initialize_applies_successes_and_reports_failures() {
        let (svc, api, notifier) = service();
        model(&svc).await;
        let mut rx = notifier.subscribe();
        api.fail_operation("list_deployments").await;
        api.fail_operation("list_insights").await;

        let report = svc.initialize().await;
        assert!(!report.is_complete());
        assert_eq!(
            report
                .failures
                .iter()
                .map(|f| f.collection)
                .collect::<Vec<_>>(),
            vec!["deployments", "insights"]
        );
        assert_eq!(report.loaded, vec!["models", "training_jobs", "system_metrics"]);

        let state = svc.store().snapshot();
        assert!(!state.loading);
        assert_eq!(state.metrics.total_models, 1);
        assert!(state.system_metrics.is_some());
        assert!(state.error.as_deref().unwrap().contains("deployments"));

        let warnings: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .filter(|n| n.level == NotificationLevel::Warning)
            .collect();
        assert_eq!(warnings.len(), 1);
    }
}
