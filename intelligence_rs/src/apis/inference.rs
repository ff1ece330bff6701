use intelligence_core::models::{InferenceRequest, InferenceResult};
use reqwest::Method;

use crate::{ClientError, IntelligenceClient};

#[derive(Debug, Clone)]
pub struct InferenceApi {
    client: IntelligenceClient,
}

impl InferenceApi {
    pub(crate) fn new(client: IntelligenceClient) -> Self {
        Self { client }
    }

    /// Submit a request and wait for its result. The request id is sent so
    /// the server can correlate pushed results with it.
    pub async fn run(&self, request: &InferenceRequest) -> Result<InferenceResult, ClientError> {
        self.client
            .request_json(Method::POST, "/api/v1/inference", Some(request))
            .await
    }

    pub async fn cancel(&self, request_id: &str) -> Result<(), ClientError> {
        let path = super::segment_path(&["api", "v1", "inference", request_id, "cancel"])?;
        self.client
            .request_empty(Method::POST, &path, None::<&()>)
            .await
    }
}
