use serde::{Deserialize, Serialize};

use super::state::IntelligenceState;
use crate::models::{InsightSeverity, TrainingStatus};

/// Aggregate counters derived from the store contents.
///
/// Never edited directly; the reducer recomputes it after every action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedMetrics {
    pub total_models: usize,
    pub total_training_jobs: usize,
    pub active_training_jobs: usize,
    pub completed_training_jobs: usize,
    pub failed_training_jobs: usize,
    pub total_inferences: usize,
    pub active_inferences: usize,
    pub total_inference_results: usize,
    pub average_inference_latency_ms: f64,
    pub total_deployments: usize,
    pub active_deployments: usize,
    pub total_replicas: u64,
    pub active_insights: usize,
    pub critical_insights: usize,
}

impl DerivedMetrics {
    pub fn compute(state: &IntelligenceState) -> Self {
        let jobs_with = |status: TrainingStatus| {
            state
                .training_jobs
                .values()
                .filter(|j| j.status == status)
                .count()
        };

        let latencies: Vec<f64> = state
            .inference_results
            .values()
            .map(|r| r.latency_ms)
            .filter(|l| l.is_finite())
            .collect();
        let average_inference_latency_ms = if latencies.is_empty() {
            0.0
        } else {
            latencies.iter().sum::<f64>() / latencies.len() as f64
        };

        let active_insights = state.insights.values().filter(|i| !i.dismissed);

        Self {
            total_models: state.models.len(),
            total_training_jobs: state.training_jobs.len(),
            active_training_jobs: state.active_training_jobs.len(),
            completed_training_jobs: jobs_with(TrainingStatus::Completed),
            failed_training_jobs: jobs_with(TrainingStatus::Failed),
            total_inferences: state.inference_requests.len(),
            active_inferences: state.active_inferences.len(),
            total_inference_results: state.inference_results.len(),
            average_inference_latency_ms,
            total_deployments: state.deployments.len(),
            active_deployments: state.deployments.values().filter(|d| d.is_active()).count(),
            total_replicas: state
                .deployments
                .values()
                .filter(|d| d.is_active())
                .map(|d| u64::from(d.replicas))
                .sum(),
            active_insights: active_insights.clone().count(),
            critical_insights: active_insights
                .filter(|i| i.severity == InsightSeverity::Critical)
                .count(),
        }
    }
}
