use intelligence_core::models::{DeploymentPatch, ModelDeployment, NewDeployment};
use reqwest::Method;

use crate::types::ScaleBody;
use crate::{ClientError, IntelligenceClient};

#[derive(Debug, Clone)]
pub struct DeploymentsApi {
    client: IntelligenceClient,
}

impl DeploymentsApi {
    pub(crate) fn new(client: IntelligenceClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<ModelDeployment>, ClientError> {
        self.client
            .request_json(Method::GET, "/api/v1/deployments", None::<&()>)
            .await
    }

    pub async fn create(&self, deployment: &NewDeployment) -> Result<ModelDeployment, ClientError> {
        self.client
            .request_json(Method::POST, "/api/v1/deployments", Some(deployment))
            .await
    }

    pub async fn update(
        &self,
        id: &str,
        patch: &DeploymentPatch,
    ) -> Result<ModelDeployment, ClientError> {
        let path = super::segment_path(&["api", "v1", "deployments", id])?;
        self.client
            .request_json(Method::PATCH, &path, Some(patch))
            .await
    }

    pub async fn scale(&self, id: &str, replicas: u32) -> Result<ModelDeployment, ClientError> {
        let path = super::segment_path(&["api", "v1", "deployments", id, "scale"])?;
        self.client
            .request_json(Method::POST, &path, Some(&ScaleBody { replicas }))
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ClientError> {
        let path = super::segment_path(&["api", "v1", "deployments", id])?;
        self.client
            .request_empty(Method::DELETE, &path, None::<&()>)
            .await
    }
}
