use intelligence_core::ApiErrorKind;
use reqwest::Url;

use crate::ClientError;

mod deployments;
mod inference;
mod insights;
mod metrics;
mod models;
mod training;

pub use deployments::DeploymentsApi;
pub use inference::InferenceApi;
pub use insights::InsightsApi;
pub use metrics::MetricsApi;
pub use models::ModelsApi;
pub use training::TrainingApi;

/// Join `segments` into an absolute request path, percent-encoding each one
/// so an id containing `/`, `?` or `#` stays a single segment.
pub(crate) fn segment_path(segments: &[&str]) -> Result<String, ClientError> {
    let invalid = |msg: String| ClientError::new(ApiErrorKind::Transport, None, msg);
    let mut url = Url::parse("http://localhost/").map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|()| invalid("url cannot carry a path".to_string()))?
        .clear()
        .extend(segments);
    Ok(url.path().to_string())
}
