use intelligence_core::models::SystemMetrics;
use reqwest::Method;

use crate::{ClientError, IntelligenceClient};

#[derive(Debug, Clone)]
pub struct MetricsApi {
    client: IntelligenceClient,
}

impl MetricsApi {
    pub(crate) fn new(client: IntelligenceClient) -> Self {
        Self { client }
    }

    pub async fn system(&self) -> Result<SystemMetrics, ClientError> {
        self.client
            .request_json(Method::GET, "/api/v1/metrics/system", None::<&()>)
            .await
    }
}
