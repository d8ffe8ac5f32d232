use dbq_core::api::ApiError;
use dbq_core::models::{MetadataRefresh, MetadataSnapshot};

use crate::api_client::{path_segment, ApiClient};

pub async fn get_metadata(
    client: &ApiClient,
    connection_id: &str,
) -> Result<MetadataSnapshot, ApiError> {
    client
        .get(&format!("/connections/{}/metadata", path_segment(connection_id)))
        .await
}

/// Asks the backend to re-extract metadata; read it back with [`get_metadata`].
pub async fn refresh_metadata(
    client: &ApiClient,
    connection_id: &str,
) -> Result<MetadataRefresh, ApiError> {
    client
        .post_empty(&format!(
            "/connections/{}/metadata/refresh",
            path_segment(connection_id)
        ))
        .await
}
