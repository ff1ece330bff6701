use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::metrics::DerivedMetrics;
use crate::models::{
    AiInsight, EntityId, InferenceRequest, InferenceResult, Model, ModelDeployment, SystemMetrics,
    TrainingJob,
};

/// Normalized snapshot of every entity the client knows about.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntelligenceState {
    pub models: BTreeMap<EntityId, Model>,
    pub training_jobs: BTreeMap<EntityId, TrainingJob>,
    /// Ids of training jobs in a non-terminal status.
    pub active_training_jobs: BTreeSet<EntityId>,
    pub inference_requests: BTreeMap<EntityId, InferenceRequest>,
    pub inference_results: BTreeMap<EntityId, InferenceResult>,
    /// Ids of inference requests in a non-terminal status.
    pub active_inferences: BTreeSet<EntityId>,
    pub deployments: BTreeMap<EntityId, ModelDeployment>,
    pub insights: BTreeMap<EntityId, AiInsight>,
    pub system_metrics: Option<SystemMetrics>,
    pub metrics: DerivedMetrics,
    pub connected: bool,
    pub loading: bool,
    pub error: Option<String>,
}

impl IntelligenceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insights that have not been dismissed, most severe first.
    pub fn active_insights(&self) -> Vec<&AiInsight> {
        let mut out: Vec<&AiInsight> = self.insights.values().filter(|i| !i.dismissed).collect();
        out.sort_by(|a, b| b.severity.cmp(&a.severity).then(a.id.cmp(&b.id)));
        out
    }

    pub fn result_for_request(&self, request_id: &str) -> Option<&InferenceResult> {
        self.inference_results
            .values()
            .find(|r| r.request_id == request_id)
    }

    /// Training-job ids whose status is non-terminal, recomputed from the table.
    pub fn expected_active_training_jobs(&self) -> BTreeSet<EntityId> {
        self.training_jobs
            .values()
            .filter(|j| j.is_active())
            .map(|j| j.id.clone())
            .collect()
    }

    /// Inference-request ids whose status is non-terminal, recomputed from the table.
    pub fn expected_active_inferences(&self) -> BTreeSet<EntityId> {
        self.inference_requests
            .values()
            .filter(|r| r.is_active())
            .map(|r| r.id.clone())
            .collect()
    }
}
