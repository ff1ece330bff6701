use serde::{Deserialize, Serialize};

use crate::models::{
    AiInsight, DeploymentPatch, EntityId, InferenceRequest, InferenceRequestPatch,
    InferenceResult, InsightPatch, Model, ModelDeployment, ModelPatch, SystemMetrics, TrainingJob,
    TrainingJobPatch, TrainingLog,
};

/// The complete mutation vocabulary of the store.
///
/// User commands and push events both funnel through these variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "type", content = "payload")]
pub enum Action {
    SetModels(Vec<Model>),
    AddModel(Model),
    UpdateModel { id: EntityId, patch: ModelPatch },
    RemoveModel(EntityId),

    SetTrainingJobs(Vec<TrainingJob>),
    AddTrainingJob(TrainingJob),
    UpdateTrainingJob { id: EntityId, patch: TrainingJobPatch },
    AppendTrainingLogs { id: EntityId, logs: Vec<TrainingLog> },
    RemoveTrainingJob(EntityId),

    SetInferenceRequests(Vec<InferenceRequest>),
    AddInferenceRequest(InferenceRequest),
    UpdateInferenceRequest {
        id: EntityId,
        patch: InferenceRequestPatch,
    },
    RemoveInferenceRequest(EntityId),

    SetInferenceResults(Vec<InferenceResult>),
    AddInferenceResult(InferenceResult),
    RemoveInferenceResult(EntityId),

    SetDeployments(Vec<ModelDeployment>),
    AddDeployment(ModelDeployment),
    UpdateDeployment { id: EntityId, patch: DeploymentPatch },
    RemoveDeployment(EntityId),

    SetInsights(Vec<AiInsight>),
    AddInsight(AiInsight),
    UpdateInsight { id: EntityId, patch: InsightPatch },
    DismissInsight(EntityId),
    RemoveInsight(EntityId),

    SetSystemMetrics(SystemMetrics),
    SetConnected(bool),
    SetLoading(bool),
    SetError(Option<String>),
}

impl Action {
    /// Stable tag, used for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Action::SetModels(_) => "SET_MODELS",
            Action::AddModel(_) => "ADD_MODEL",
            Action::UpdateModel { .. } => "UPDATE_MODEL",
            Action::RemoveModel(_) => "REMOVE_MODEL",
            Action::SetTrainingJobs(_) => "SET_TRAINING_JOBS",
            Action::AddTrainingJob(_) => "ADD_TRAINING_JOB",
            Action::UpdateTrainingJob { .. } => "UPDATE_TRAINING_JOB",
            Action::AppendTrainingLogs { .. } => "APPEND_TRAINING_LOGS",
            Action::RemoveTrainingJob(_) => "REMOVE_TRAINING_JOB",
            Action::SetInferenceRequests(_) => "SET_INFERENCE_REQUESTS",
            Action::AddInferenceRequest(_) => "ADD_INFERENCE_REQUEST",
            Action::UpdateInferenceRequest { .. } => "UPDATE_INFERENCE_REQUEST",
            Action::RemoveInferenceRequest(_) => "REMOVE_INFERENCE_REQUEST",
            Action::SetInferenceResults(_) => "SET_INFERENCE_RESULTS",
            Action::AddInferenceResult(_) => "ADD_INFERENCE_RESULT",
            Action::RemoveInferenceResult(_) => "REMOVE_INFERENCE_RESULT",
            Action::SetDeployments(_) => "SET_DEPLOYMENTS",
            Action::AddDeployment(_) => "ADD_DEPLOYMENT",
            Action::UpdateDeployment { .. } => "UPDATE_DEPLOYMENT",
            Action::RemoveDeployment(_) => "REMOVE_DEPLOYMENT",
            Action::SetInsights(_) => "SET_INSIGHTS",
            Action::AddInsight(_) => "ADD_INSIGHT",
            Action::UpdateInsight { .. } => "UPDATE_INSIGHT",
            Action::DismissInsight(_) => "DISMISS_INSIGHT",
            Action::RemoveInsight(_) => "REMOVE_INSIGHT",
            Action::SetSystemMetrics(_) => "SET_SYSTEM_METRICS",
            Action::SetConnected(_) => "SET_CONNECTED",
            Action::SetLoading(_) => "SET_LOADING",
            Action::SetError(_) => "SET_ERROR",
        }
    }
}
