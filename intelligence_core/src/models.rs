use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type EntityId = String;

/// Client-side id for locally constructed entities (inference requests).
pub fn new_entity_id() -> EntityId {
    uuid::Uuid::new_v4().to_string()
}

/// A present field, `null` included, decodes as `Some(..)`. Lets a patch tell
/// "clear this" (`Some(None)`) apart from "leave unchanged" (`None`).
fn double_option<'de, D, T>(d: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(d).map(Some)
}

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    Classification,
    Regression,
    Clustering,
    Nlp,
    Vision,
    Anomaly,
}

impl ModelType {
    /// Algorithm used when a draft does not name one.
    pub fn default_algorithm(self) -> &'static str {
        match self {
            ModelType::Classification => "random_forest",
            ModelType::Regression => "gradient_boosting",
            ModelType::Clustering => "kmeans",
            ModelType::Nlp => "transformer",
            ModelType::Vision => "cnn",
            ModelType::Anomaly => "isolation_forest",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub id: EntityId,
    pub name: String,
    #[serde(rename = "type")]
    pub model_type: ModelType,
    pub algorithm: String,
    #[serde(default)]
    pub hyperparameters: BTreeMap<String, Value>,
    #[serde(default)]
    pub features: Vec<String>,
    pub validation_split: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const DEFAULT_VALIDATION_SPLIT: f64 = 0.2;

/// Caller-supplied data for `create_model`; omitted fields get defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDraft {
    pub name: String,
    #[serde(rename = "type")]
    pub model_type: ModelType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hyperparameters: Option<BTreeMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_split: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ModelDraft {
    pub fn new(name: impl Into<String>, model_type: ModelType) -> Self {
        Self {
            name: name.into(),
            model_type,
            algorithm: None,
            hyperparameters: None,
            features: None,
            validation_split: None,
            description: None,
        }
    }
}

/// Fully resolved create payload sent to the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewModel {
    pub name: String,
    #[serde(rename = "type")]
    pub model_type: ModelType,
    pub algorithm: String,
    pub hyperparameters: BTreeMap<String, Value>,
    pub features: Vec<String>,
    pub validation_split: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<ModelDraft> for NewModel {
    fn from(d: ModelDraft) -> Self {
        Self {
            algorithm: d
                .algorithm
                .filter(|a| !a.trim().is_empty())
                .unwrap_or_else(|| d.model_type.default_algorithm().to_string()),
            name: d.name,
            model_type: d.model_type,
            hyperparameters: d.hyperparameters.unwrap_or_default(),
            features: d.features.unwrap_or_default(),
            validation_split: d.validation_split.unwrap_or(DEFAULT_VALIDATION_SPLIT),
            description: d.description,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub model_type: Option<ModelType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hyperparameters: Option<BTreeMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_split: Option<f64>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    pub fn apply(&mut self, p: &ModelPatch) {
        if let Some(v) = &p.name {
            self.name = v.clone();
        }
        if let Some(v) = p.model_type {
            self.model_type = v;
        }
        if let Some(v) = &p.algorithm {
            self.algorithm = v.clone();
        }
        if let Some(v) = &p.hyperparameters {
            self.hyperparameters = v.clone();
        }
        if let Some(v) = &p.features {
            self.features = v.clone();
        }
        if let Some(v) = p.validation_split {
            self.validation_split = v;
        }
        if let Some(v) = &p.description {
            self.description = v.clone();
        }
        if let Some(v) = p.version {
            self.version = v;
        }
        if let Some(v) = p.updated_at {
            self.updated_at = v;
        }
    }
}

impl From<Model> for ModelPatch {
    fn from(m: Model) -> Self {
        Self {
            name: Some(m.name),
            model_type: Some(m.model_type),
            algorithm: Some(m.algorithm),
            hyperparameters: Some(m.hyperparameters),
            features: Some(m.features),
            validation_split: Some(m.validation_split),
            description: Some(m.description),
            version: Some(m.version),
            updated_at: Some(m.updated_at),
        }
    }
}

// ---------------------------------------------------------------------------
// Training
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingStatus {
    Queued,
    Preparing,
    Training,
    Validating,
    Completed,
    Failed,
    Stopped,
}

impl TrainingStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TrainingStatus::Completed | TrainingStatus::Failed | TrainingStatus::Stopped
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrainingProgress {
    pub epoch: u32,
    pub total_epochs: u32,
    pub step: u64,
    pub total_steps: u64,
    pub train_loss: Option<f64>,
    pub validation_loss: Option<f64>,
    pub eta_seconds: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingLog {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingArtifact {
    pub name: String,
    pub kind: String,
    pub url: String,
    #[serde(default)]
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceUsage {
    pub cpu_percent: f64,
    pub memory_mb: f64,
    pub gpu_percent: Option<f64>,
    pub gpu_memory_mb: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingJob {
    pub id: EntityId,
    pub model_id: EntityId,
    pub status: TrainingStatus,
    #[serde(default)]
    pub progress: TrainingProgress,
    #[serde(default)]
    pub logs: Vec<TrainingLog>,
    #[serde(default)]
    pub artifacts: Vec<TrainingArtifact>,
    #[serde(default)]
    pub resource_usage: ResourceUsage,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl TrainingJob {
    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }
}

/// Parameters for `start_training`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingRequest {
    pub model_id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epochs: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_id: Option<String>,
}

impl TrainingRequest {
    pub fn new(model_id: impl Into<EntityId>) -> Self {
        Self {
            model_id: model_id.into(),
            epochs: None,
            batch_size: None,
            learning_rate: None,
            dataset_id: None,
        }
    }

    /// Fill omitted hyperparameters with defaults.
    pub fn with_defaults(mut self) -> Self {
        self.epochs.get_or_insert(10);
        self.batch_size.get_or_insert(32);
        self.learning_rate.get_or_insert(0.001);
        self
    }
}

/// Partial update of a training job. `new_logs` is appended to the log list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingJobPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TrainingStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<TrainingProgress>,
    /// Replaces the whole log list. Applied before `new_logs`.
    #[serde(skip)]
    pub replace_logs: Option<Vec<TrainingLog>>,
    #[serde(default, alias = "logs", skip_serializing_if = "Vec::is_empty")]
    pub new_logs: Vec<TrainingLog>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<Vec<TrainingArtifact>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_usage: Option<ResourceUsage>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_at: Option<Option<DateTime<Utc>>>,
}

impl TrainingJob {
    pub fn apply(&mut self, p: &TrainingJobPatch) {
        if let Some(v) = p.status {
            self.status = v;
        }
        if let Some(v) = &p.progress {
            self.progress = v.clone();
        }
        if let Some(v) = &p.replace_logs {
            self.logs = v.clone();
        }
        self.logs.extend(p.new_logs.iter().cloned());
        if let Some(v) = &p.artifacts {
            self.artifacts = v.clone();
        }
        if let Some(v) = &p.resource_usage {
            self.resource_usage = v.clone();
        }
        if let Some(v) = p.completed_at {
            self.completed_at = v;
        }
    }
}

impl From<TrainingJob> for TrainingJobPatch {
    /// Full patch from a server-confirmed job. Every field, logs included,
    /// is overwritten with the server's value.
    fn from(j: TrainingJob) -> Self {
        Self {
            status: Some(j.status),
            progress: Some(j.progress),
            replace_logs: Some(j.logs),
            new_logs: Vec::new(),
            artifacts: Some(j.artifacts),
            resource_usage: Some(j.resource_usage),
            completed_at: Some(j.completed_at),
        }
    }
}

// ---------------------------------------------------------------------------
// Inference
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InferenceStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl InferenceStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            InferenceStatus::Completed | InferenceStatus::Failed | InferenceStatus::Cancelled
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceRequest {
    pub id: EntityId,
    pub model_id: EntityId,
    #[serde(default)]
    pub input: Value,
    pub status: InferenceStatus,
    pub created_at: DateTime<Utc>,
}

impl InferenceRequest {
    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceDraft {
    pub model_id: EntityId,
    pub input: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceRequestPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<InferenceStatus>,
}

impl InferenceRequest {
    pub fn apply(&mut self, p: &InferenceRequestPatch) {
        if let Some(v) = p.status {
            self.status = v;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceResult {
    pub id: EntityId,
    pub request_id: EntityId,
    pub model_id: EntityId,
    #[serde(default)]
    pub output: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub latency_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Deployments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentEnvironment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
    Deploying,
    Active,
    Inactive,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoscalingPolicy {
    pub enabled: bool,
    pub min_replicas: u32,
    pub max_replicas: u32,
    pub target_cpu_percent: f64,
}

impl Default for AutoscalingPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            min_replicas: 1,
            max_replicas: 3,
            target_cpu_percent: 70.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckPolicy {
    pub path: String,
    pub interval_seconds: u32,
    pub timeout_seconds: u32,
    pub failure_threshold: u32,
}

impl Default for HealthCheckPolicy {
    fn default() -> Self {
        Self {
            path: "/health".to_string(),
            interval_seconds: 30,
            timeout_seconds: 5,
            failure_threshold: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDeployment {
    pub id: EntityId,
    pub model_id: EntityId,
    pub environment: DeploymentEnvironment,
    pub status: DeploymentStatus,
    pub replicas: u32,
    #[serde(default)]
    pub autoscaling: AutoscalingPolicy,
    #[serde(default)]
    pub health_check: HealthCheckPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentDraft {
    pub model_id: EntityId,
    pub environment: DeploymentEnvironment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoscaling: Option<AutoscalingPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check: Option<HealthCheckPolicy>,
}

impl DeploymentDraft {
    pub fn new(model_id: impl Into<EntityId>, environment: DeploymentEnvironment) -> Self {
        Self {
            model_id: model_id.into(),
            environment,
            replicas: None,
            autoscaling: None,
            health_check: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDeployment {
    pub model_id: EntityId,
    pub environment: DeploymentEnvironment,
    pub replicas: u32,
    pub autoscaling: AutoscalingPolicy,
    pub health_check: HealthCheckPolicy,
}

impl From<DeploymentDraft> for NewDeployment {
    fn from(d: DeploymentDraft) -> Self {
        Self {
            model_id: d.model_id,
            environment: d.environment,
            replicas: d.replicas.unwrap_or(1).max(1),
            autoscaling: d.autoscaling.unwrap_or_default(),
            health_check: d.health_check.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<DeploymentEnvironment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DeploymentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoscaling: Option<AutoscalingPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check: Option<HealthCheckPolicy>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub endpoint: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ModelDeployment {
    pub fn is_active(&self) -> bool {
        matches!(
            self.status,
            DeploymentStatus::Active | DeploymentStatus::Deploying
        )
    }

    pub fn apply(&mut self, p: &DeploymentPatch) {
        if let Some(v) = p.environment {
            self.environment = v;
        }
        if let Some(v) = p.status {
            self.status = v;
        }
        if let Some(v) = p.replicas {
            self.replicas = v;
        }
        if let Some(v) = &p.autoscaling {
            self.autoscaling = v.clone();
        }
        if let Some(v) = &p.health_check {
            self.health_check = v.clone();
        }
        if let Some(v) = &p.endpoint {
            self.endpoint = v.clone();
        }
        if let Some(v) = p.updated_at {
            self.updated_at = v;
        }
    }
}

impl From<ModelDeployment> for DeploymentPatch {
    fn from(d: ModelDeployment) -> Self {
        Self {
            environment: Some(d.environment),
            status: Some(d.status),
            replicas: Some(d.replicas),
            autoscaling: Some(d.autoscaling),
            health_check: Some(d.health_check),
            endpoint: Some(d.endpoint),
            updated_at: Some(d.updated_at),
        }
    }
}

// ---------------------------------------------------------------------------
// Insights
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightSeverity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiInsight {
    pub id: EntityId,
    #[serde(alias = "type")]
    pub category: String,
    pub severity: InsightSeverity,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub confidence: f64,
    #[serde(default)]
    pub recommendations: Vec<String>,
    /// Soft delete: dismissed insights stay in the store but leave active views.
    #[serde(default)]
    pub dismissed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<InsightSeverity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dismissed: Option<bool>,
}

impl AiInsight {
    pub fn apply(&mut self, p: &InsightPatch) {
        if let Some(v) = p.severity {
            self.severity = v;
        }
        if let Some(v) = p.confidence {
            self.confidence = v;
        }
        if let Some(v) = &p.recommendations {
            self.recommendations = v.clone();
        }
        if let Some(v) = p.dismissed {
            self.dismissed = v;
        }
    }
}

impl From<AiInsight> for InsightPatch {
    fn from(i: AiInsight) -> Self {
        Self {
            severity: Some(i.severity),
            confidence: Some(i.confidence),
            recommendations: Some(i.recommendations),
            dismissed: Some(i.dismissed),
        }
    }
}

// ---------------------------------------------------------------------------
// System metrics (server aggregate)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SystemMetrics {
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub gpu_usage: Option<f64>,
    pub requests_per_minute: f64,
    pub error_rate: f64,
    pub collected_at: Option<DateTime<Utc>>,
}
