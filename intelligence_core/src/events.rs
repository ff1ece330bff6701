//! Decoding of server push events into store actions.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{
    AiInsight, DeploymentPatch, DeploymentStatus, EntityId, InferenceResult, ResourceUsage,
    SystemMetrics, TrainingArtifact, TrainingJobPatch, TrainingLog, TrainingProgress,
    TrainingStatus,
};
use crate::store::Action;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingProgressEvent {
    pub job_id: EntityId,
    #[serde(default)]
    pub status: Option<TrainingStatus>,
    #[serde(default)]
    pub progress: Option<TrainingProgress>,
    #[serde(default)]
    pub logs: Vec<TrainingLog>,
    #[serde(default)]
    pub resource_usage: Option<ResourceUsage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingCompletedEvent {
    pub job_id: EntityId,
    #[serde(default)]
    pub status: Option<TrainingStatus>,
    #[serde(default)]
    pub progress: Option<TrainingProgress>,
    #[serde(default)]
    pub artifacts: Option<Vec<TrainingArtifact>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentStatusEvent {
    pub deployment_id: EntityId,
    pub status: DeploymentStatus,
    #[serde(default)]
    pub replicas: Option<u32>,
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// A server-originated message on the real-time channel.
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    TrainingProgress(TrainingProgressEvent),
    TrainingCompleted(TrainingCompletedEvent),
    InferenceResult(InferenceResult),
    NewInsight(AiInsight),
    SystemMetrics(SystemMetrics),
    DeploymentStatus(DeploymentStatusEvent),
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, alias = "data")]
    payload: Value,
}

impl PushEvent {
    /// Decode a raw text frame.
    ///
    /// Unknown `type` tags and malformed frames yield `None`; they are never errors.
    pub fn parse(text: &str) -> Option<Self> {
        let envelope: Envelope = match serde_json::from_str(text) {
            Ok(e) => e,
            Err(err) => {
                tracing::debug!(error = %err, "ignoring malformed push frame");
                return None;
            }
        };

        match envelope.kind.as_str() {
            "training_progress" => decode(&envelope, PushEvent::TrainingProgress),
            "training_completed" => decode(&envelope, PushEvent::TrainingCompleted),
            "inference_result" => decode(&envelope, PushEvent::InferenceResult),
            "new_insight" => decode(&envelope, PushEvent::NewInsight),
            "system_metrics" => decode(&envelope, PushEvent::SystemMetrics),
            "deployment_status" => decode(&envelope, PushEvent::DeploymentStatus),
            other => {
                tracing::debug!(kind = other, "ignoring unknown push event");
                None
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PushEvent::TrainingProgress(_) => "training_progress",
            PushEvent::TrainingCompleted(_) => "training_completed",
            PushEvent::InferenceResult(_) => "inference_result",
            PushEvent::NewInsight(_) => "new_insight",
            PushEvent::SystemMetrics(_) => "system_metrics",
            PushEvent::DeploymentStatus(_) => "deployment_status",
        }
    }

    /// The store action this event maps onto.
    pub fn into_action(self) -> Action {
        match self {
            PushEvent::TrainingProgress(ev) => Action::UpdateTrainingJob {
                id: ev.job_id,
                patch: TrainingJobPatch {
                    status: ev.status,
                    progress: ev.progress,
                    new_logs: ev.logs,
                    resource_usage: ev.resource_usage,
                    ..TrainingJobPatch::default()
                },
            },
            PushEvent::TrainingCompleted(ev) => Action::UpdateTrainingJob {
                id: ev.job_id,
                patch: TrainingJobPatch {
                    status: Some(ev.status.unwrap_or(TrainingStatus::Completed)),
                    progress: ev.progress,
                    artifacts: ev.artifacts,
                    completed_at: Some(Some(ev.completed_at.unwrap_or_else(Utc::now))),
                    ..TrainingJobPatch::default()
                },
            },
            PushEvent::InferenceResult(result) => Action::AddInferenceResult(result),
            PushEvent::NewInsight(insight) => Action::AddInsight(insight),
            PushEvent::SystemMetrics(metrics) => Action::SetSystemMetrics(metrics),
            PushEvent::DeploymentStatus(ev) => Action::UpdateDeployment {
                id: ev.deployment_id,
                patch: DeploymentPatch {
                    status: Some(ev.status),
                    replicas: ev.replicas,
                    endpoint: ev.endpoint.map(Some),
                    ..DeploymentPatch::default()
                },
            },
        }
    }
}

fn decode<T: DeserializeOwned>(envelope: &Envelope, wrap: fn(T) -> PushEvent) -> Option<PushEvent> {
    match serde_json::from_value::<T>(envelope.payload.clone()) {
        Ok(v) => Some(wrap(v)),
        Err(err) => {
            tracing::debug!(kind = %envelope.kind, error = %err, "ignoring push event with bad payload");
            None
        }
    }
}

/// Presence messages sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum OutboundMessage {
    Join { room: String },
    Leave { room: String },
}

impl OutboundMessage {
    pub fn to_text(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn training_progress_maps_to_update() {
        let text = json!({
            "type": "training_progress",
            "payload": {
                "jobId": "j1",
                "status": "training",
                "progress": { "epoch": 3, "totalEpochs": 10, "trainLoss": 0.4 },
                "logs": [{ "timestamp": "2026-01-01T00:00:00Z", "level": "info", "message": "epoch 3" }]
            }
        })
        .to_string();
        let ev = PushEvent::parse(&text).unwrap();
        assert_eq!(ev.kind(), "training_progress");
        let Action::UpdateTrainingJob { id, patch } = ev.into_action() else {
            panic!("expected UpdateTrainingJob");
        };
        assert_eq!(id, "j1");
        assert_eq!(patch.status, Some(TrainingStatus::Training));
        assert_eq!(patch.progress.unwrap().train_loss, Some(0.4));
        assert_eq!(patch.new_logs.len(), 1);
    }

    #[test]
    fn training_completed_defaults_to_completed() {
        let text = r#"{"type":"training_completed","data":{"jobId":"j9"}}"#;
        let Action::UpdateTrainingJob { patch, .. } = PushEvent::parse(text).unwrap().into_action()
        else {
            panic!("expected UpdateTrainingJob");
        };
        assert_eq!(patch.status, Some(TrainingStatus::Completed));
        assert!(matches!(patch.completed_at, Some(Some(_))));
    }

    #[test]
    fn inference_result_maps_to_add() {
        let text = json!({
            "type": "inference_result",
            "payload": {
                "id": "res1",
                "requestId": "r1",
                "modelId": "m1",
                "output": { "label": "spam" },
                "latencyMs": 12.5,
                "createdAt": "2026-01-01T00:00:00Z"
            }
        })
        .to_string();
        match PushEvent::parse(&text).unwrap().into_action() {
            Action::AddInferenceResult(r) => {
                assert_eq!(r.request_id, "r1");
                assert_eq!(r.latency_ms, 12.5);
            }
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn unknown_and_malformed_frames_are_ignored() {
        assert!(PushEvent::parse(r#"{"type":"presence","payload":{}}"#).is_none());
        assert!(PushEvent::parse("not json").is_none());
        assert!(PushEvent::parse(r#"{"payload":{}}"#).is_none());
        assert!(PushEvent::parse(r#"{"type":"new_insight","payload":{"id":1}}"#).is_none());
    }

    #[test]
    fn outbound_join_is_tagged() {
        let text = OutboundMessage::Join {
            room: "team-1".to_string(),
        }
        .to_text()
        .unwrap();
        assert_eq!(text, r#"{"type":"join","room":"team-1"}"#);
    }
}
