use intelligence_core::models::{TrainingJob, TrainingRequest};
use reqwest::Method;

use crate::{ClientError, IntelligenceClient};

#[derive(Debug, Clone)]
pub struct TrainingApi {
    client: IntelligenceClient,
}

impl TrainingApi {
    pub(crate) fn new(client: IntelligenceClient) -> Self {
        Self { client }
    }

    pub async fn list_jobs(&self) -> Result<Vec<TrainingJob>, ClientError> {
        self.client
            .request_json(Method::GET, "/api/v1/training/jobs", None::<&()>)
            .await
    }

    pub async fn start(&self, request: &TrainingRequest) -> Result<TrainingJob, ClientError> {
        self.client
            .request_json(Method::POST, "/api/v1/training/jobs", Some(request))
            .await
    }

    pub async fn stop(&self, job_id: &str) -> Result<TrainingJob, ClientError> {
        let path = super::segment_path(&["api", "v1", "training", "jobs", job_id, "stop"])?;
        self.client
            .request_json(Method::POST, &path, None::<&()>)
            .await
    }
}
