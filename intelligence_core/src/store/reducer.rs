//! Pure state transitions for the entity store.
//!
//! `reduce` never mutates its input and cannot fail: unknown ids on
//! update/remove are no-ops, so every action is total over the key space.

use std::collections::{BTreeMap, BTreeSet};

use super::actions::Action;
use super::metrics::DerivedMetrics;
use super::state::IntelligenceState;
use crate::models::{EntityId, InferenceRequestPatch, InferenceStatus, InsightPatch};

/// Apply `action` to a copy of `state` and return the new snapshot.
pub fn reduce(state: &IntelligenceState, action: &Action) -> IntelligenceState {
    let mut next = state.clone();
    apply(&mut next, action);
    next
}

fn apply(s: &mut IntelligenceState, action: &Action) {
    match action {
        Action::SetModels(models) => {
            s.models = keyed(models, |m| &m.id);
        }
        Action::AddModel(model) => {
            s.models.insert(model.id.clone(), model.clone());
        }
        Action::UpdateModel { id, patch } => {
            if let Some(model) = s.models.get_mut(id) {
                model.apply(patch);
            }
        }
        Action::RemoveModel(id) => {
            s.models.remove(id);
        }

        Action::SetTrainingJobs(jobs) => {
            s.training_jobs = keyed(jobs, |j| &j.id);
            s.active_training_jobs = s.expected_active_training_jobs();
        }
        Action::AddTrainingJob(job) => {
            s.training_jobs.insert(job.id.clone(), job.clone());
            sync_membership(&mut s.active_training_jobs, &job.id, Some(job.is_active()));
        }
        Action::UpdateTrainingJob { id, patch } => {
            let active = s.training_jobs.get_mut(id).map(|job| {
                job.apply(patch);
                job.is_active()
            });
            sync_membership(&mut s.active_training_jobs, id, active);
        }
        Action::AppendTrainingLogs { id, logs } => {
            if let Some(job) = s.training_jobs.get_mut(id) {
                job.logs.extend(logs.iter().cloned());
            }
        }
        Action::RemoveTrainingJob(id) => {
            s.training_jobs.remove(id);
            s.active_training_jobs.remove(id);
        }

        Action::SetInferenceRequests(requests) => {
            s.inference_requests = keyed(requests, |r| &r.id);
            s.active_inferences = s.expected_active_inferences();
        }
        Action::AddInferenceRequest(request) => {
            s.inference_requests
                .insert(request.id.clone(), request.clone());
            sync_membership(
                &mut s.active_inferences,
                &request.id,
                Some(request.is_active()),
            );
        }
        Action::UpdateInferenceRequest { id, patch } => {
            update_inference_request(s, id, patch);
        }
        Action::RemoveInferenceRequest(id) => {
            s.inference_requests.remove(id);
            s.active_inferences.remove(id);
        }

        Action::SetInferenceResults(results) => {
            s.inference_results = keyed(results, |r| &r.id);
        }
        Action::AddInferenceResult(result) => {
            s.inference_results
                .insert(result.id.clone(), result.clone());
            // A late result never resurrects a cancelled or failed request.
            let still_active = s
                .inference_requests
                .get(&result.request_id)
                .is_some_and(|r| r.is_active());
            if still_active {
                let status = if result.error.is_some() {
                    InferenceStatus::Failed
                } else {
                    InferenceStatus::Completed
                };
                update_inference_request(
                    s,
                    &result.request_id,
                    &InferenceRequestPatch {
                        status: Some(status),
                    },
                );
            }
        }
        Action::RemoveInferenceResult(id) => {
            s.inference_results.remove(id);
        }

        Action::SetDeployments(deployments) => {
            s.deployments = keyed(deployments, |d| &d.id);
        }
        Action::AddDeployment(deployment) => {
            s.deployments
                .insert(deployment.id.clone(), deployment.clone());
        }
        Action::UpdateDeployment { id, patch } => {
            if let Some(deployment) = s.deployments.get_mut(id) {
                deployment.apply(patch);
            }
        }
        Action::RemoveDeployment(id) => {
            s.deployments.remove(id);
        }

        Action::SetInsights(insights) => {
            s.insights = keyed(insights, |i| &i.id);
        }
        Action::AddInsight(insight) => {
            s.insights.insert(insight.id.clone(), insight.clone());
        }
        Action::UpdateInsight { id, patch } => {
            if let Some(insight) = s.insights.get_mut(id) {
                insight.apply(patch);
            }
        }
        Action::DismissInsight(id) => {
            if let Some(insight) = s.insights.get_mut(id) {
                insight.apply(&InsightPatch {
                    dismissed: Some(true),
                    ..InsightPatch::default()
                });
            }
        }
        Action::RemoveInsight(id) => {
            s.insights.remove(id);
        }

        Action::SetSystemMetrics(metrics) => {
            s.system_metrics = Some(metrics.clone());
        }
        Action::SetConnected(connected) => {
            s.connected = *connected;
        }
        Action::SetLoading(loading) => {
            s.loading = *loading;
        }
        Action::SetError(error) => {
            s.error = error.clone();
        }
    }

    s.metrics = DerivedMetrics::compute(s);
}

fn update_inference_request(s: &mut IntelligenceState, id: &str, patch: &InferenceRequestPatch) {
    let active = s.inference_requests.get_mut(id).map(|request| {
        request.apply(patch);
        request.is_active()
    });
    sync_membership(&mut s.active_inferences, id, active);
}

/// Bring `id`'s membership in an active subset in line with its entity.
///
/// `active` is `None` when the entity is absent, which always means "not a member".
fn sync_membership(set: &mut BTreeSet<EntityId>, id: &str, active: Option<bool>) {
    if active == Some(true) {
        if !set.contains(id) {
            set.insert(id.to_string());
        }
    } else {
        set.remove(id);
    }
}

fn keyed<T: Clone>(items: &[T], id: impl Fn(&T) -> &EntityId) -> BTreeMap<EntityId, T> {
    items
        .iter()
        .map(|item| (id(item).clone(), item.clone()))
        .collect()
}
