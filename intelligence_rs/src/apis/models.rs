use intelligence_core::models::{Model, ModelPatch, NewModel};
use reqwest::Method;

use crate::{ClientError, IntelligenceClient};

#[derive(Debug, Clone)]
pub struct ModelsApi {
    client: IntelligenceClient,
}

impl ModelsApi {
    pub(crate) fn new(client: IntelligenceClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Model>, ClientError> {
        self.client
            .request_json(Method::GET, "/api/v1/models", None::<&()>)
            .await
    }

    pub async fn create(&self, model: &NewModel) -> Result<Model, ClientError> {
        self.client
            .request_json(Method::POST, "/api/v1/models", Some(model))
            .await
    }

    pub async fn update(&self, id: &str, patch: &ModelPatch) -> Result<Model, ClientError> {
        let path = super::segment_path(&["api", "v1", "models", id])?;
        self.client
            .request_json(Method::PATCH, &path, Some(patch))
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ClientError> {
        let path = super::segment_path(&["api", "v1", "models", id])?;
        self.client
            .request_empty(Method::DELETE, &path, None::<&()>)
            .await
    }
}
