use intelligence_core::models::AiInsight;
use reqwest::Method;

use crate::types::GenerateInsightsBody;
use crate::{ClientError, IntelligenceClient};

#[derive(Debug, Clone)]
pub struct InsightsApi {
    client: IntelligenceClient,
}

impl InsightsApi {
    pub(crate) fn new(client: IntelligenceClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<AiInsight>, ClientError> {
        self.client
            .request_json(Method::GET, "/api/v1/insights", None::<&()>)
            .await
    }

    /// Ask the server to analyze one model, or every model when `model_id` is `None`.
    pub async fn generate(&self, model_id: Option<&str>) -> Result<Vec<AiInsight>, ClientError> {
        let body = GenerateInsightsBody {
            model_id: model_id.map(str::to_string),
        };
        self.client
            .request_json(Method::POST, "/api/v1/insights/generate", Some(&body))
            .await
    }

    pub async fn dismiss(&self, id: &str) -> Result<AiInsight, ClientError> {
        let path = super::segment_path(&["api", "v1", "insights", id, "dismiss"])?;
        self.client
            .request_json(Method::POST, &path, None::<&()>)
            .await
    }
}
