use chrono::{TimeZone, Utc};
use intelligence_core::models::{
    InferenceRequest, InferenceRequestPatch, InferenceResult, InferenceStatus, TrainingJob,
    TrainingJobPatch, TrainingStatus,
};
use intelligence_core::store::{reduce, Action, IntelligenceState};
use proptest::prelude::*;
use proptest::test_runner::Config;
use serde_json::Value;

const IDS: [&str; 4] = ["a", "b", "c", "d"];

fn id() -> impl Strategy<Value = String> {
    prop::sample::select(IDS.to_vec()).prop_map(str::to_string)
}

fn training_status() -> impl Strategy<Value = TrainingStatus> {
    prop::sample::select(vec![
        TrainingStatus::Queued,
        TrainingStatus::Preparing,
        TrainingStatus::Training,
        TrainingStatus::Validating,
        TrainingStatus::Completed,
        TrainingStatus::Failed,
        TrainingStatus::Stopped,
    ])
}

fn inference_status() -> impl Strategy<Value = InferenceStatus> {
    prop::sample::select(vec![
        InferenceStatus::Pending,
        InferenceStatus::Processing,
        InferenceStatus::Completed,
        InferenceStatus::Failed,
        InferenceStatus::Cancelled,
    ])
}

fn job(id: String, status: TrainingStatus) -> TrainingJob {
    TrainingJob {
        model_id: "m".to_string(),
        status,
        progress: Default::default(),
        logs: vec![],
        artifacts: vec![],
        resource_usage: Default::default(),
        started_at: Utc.timestamp_opt(0, 0).unwrap(),
        completed_at: None,
        id,
    }
}

fn request(id: String, status: InferenceStatus) -> InferenceRequest {
    InferenceRequest {
        model_id: "m".to_string(),
        input: Value::Null,
        status,
        created_at: Utc.timestamp_opt(0, 0).unwrap(),
        id,
    }
}

fn result(request_id: String, failed: bool) -> InferenceResult {
    InferenceResult {
        id: format!("res-{request_id}"),
        model_id: "m".to_string(),
        output: Value::Null,
        confidence: None,
        latency_ms: 10.0,
        error: failed.then(|| "boom".to_string()),
        created_at: Utc.timestamp_opt(0, 0).unwrap(),
        request_id,
    }
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        (id(), training_status()).prop_map(|(i, s)| Action::AddTrainingJob(job(i, s))),
        (id(), training_status()).prop_map(|(i, s)| Action::UpdateTrainingJob {
            id: i,
            patch: TrainingJobPatch {
                status: Some(s),
                ..TrainingJobPatch::default()
            },
        }),
        id().prop_map(Action::RemoveTrainingJob),
        prop::collection::vec((id(), training_status()), 0..4).prop_map(|v| {
            Action::SetTrainingJobs(v.into_iter().map(|(i, s)| job(i, s)).collect())
        }),
        (id(), inference_status()).prop_map(|(i, s)| Action::AddInferenceRequest(request(i, s))),
        (id(), inference_status()).prop_map(|(i, s)| Action::UpdateInferenceRequest {
            id: i,
            patch: InferenceRequestPatch { status: Some(s) },
        }),
        id().prop_map(Action::RemoveInferenceRequest),
        (id(), any::<bool>()).prop_map(|(i, f)| Action::AddInferenceResult(result(i, f))),
        prop::collection::vec((id(), inference_status()), 0..4).prop_map(|v| {
            Action::SetInferenceRequests(v.into_iter().map(|(i, s)| request(i, s)).collect())
        }),
        any::<bool>().prop_map(Action::SetConnected),
    ]
}

proptest! {
    #![proptest_config(Config::with_cases(256))]

    #[test]
    fn active_subsets_track_non_terminal_status(actions in prop::collection::vec(action(), 1..40)) {
        let mut state = IntelligenceState::new();
        for a in &actions {
            state = reduce(&state, a);
            prop_assert_eq!(&state.active_training_jobs, &state.expected_active_training_jobs());
            prop_assert_eq!(&state.active_inferences, &state.expected_active_inferences());
            prop_assert_eq!(state.metrics.total_training_jobs, state.training_jobs.len());
        }
    }

    #[test]
    fn empty_patches_leave_state_unchanged(
        actions in prop::collection::vec(action(), 0..20),
        target in id(),
    ) {
        let mut state = IntelligenceState::new();
        for a in &actions {
            state = reduce(&state, a);
        }
        let empties = [
            Action::UpdateTrainingJob { id: target.clone(), patch: TrainingJobPatch::default() },
            Action::UpdateInferenceRequest { id: target.clone(), patch: InferenceRequestPatch::default() },
            Action::UpdateModel { id: target.clone(), patch: Default::default() },
            Action::UpdateDeployment { id: target.clone(), patch: Default::default() },
            Action::UpdateInsight { id: target, patch: Default::default() },
        ];
        for a in &empties {
            prop_assert_eq!(&reduce(&state, a), &state);
        }
    }

    #[test]
    fn reduce_is_pure(
        actions in prop::collection::vec(action(), 0..20),
        next in action(),
    ) {
        let mut state = IntelligenceState::new();
        for a in &actions {
            state = reduce(&state, a);
        }
        let before = state.clone();
        let first = reduce(&state, &next);
        let second = reduce(&state, &next);
        prop_assert_eq!(&state, &before);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn removing_unknown_ids_is_a_no_op(actions in prop::collection::vec(action(), 0..20)) {
        let mut state = IntelligenceState::new();
        for a in &actions {
            state = reduce(&state, a);
        }
        for a in [
            Action::RemoveTrainingJob("zz".to_string()),
            Action::RemoveInferenceRequest("zz".to_string()),
            Action::RemoveModel("zz".to_string()),
            Action::RemoveDeployment("zz".to_string()),
            Action::RemoveInsight("zz".to_string()),
        ] {
            prop_assert_eq!(&reduce(&state, &a), &state);
        }
    }
}
