use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    pub status: String,
    #[serde(default, alias = "uptime_ms")]
    pub uptime_ms: i64,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ScaleBody {
    pub replicas: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateInsightsBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
}
