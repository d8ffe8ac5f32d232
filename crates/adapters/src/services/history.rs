use dbq_core::api::ApiError;
use dbq_core::models::{HistoryCreate, HistoryList};

use crate::api_client::{path_segment, ApiClient};

fn history_path(connection_id: &str) -> String {
    format!("/connections/{}/history", path_segment(connection_id))
}

pub async fn list_history(client: &ApiClient, connection_id: &str) -> Result<HistoryList, ApiError> {
    client.get(&history_path(connection_id)).await
}

pub async fn add_history(
    client: &ApiClient,
    connection_id: &str,
    payload: &HistoryCreate,
) -> Result<(), ApiError> {
    client
        .post_discarding(&history_path(connection_id), payload)
        .await
}

pub async fn clear_history(client: &ApiClient, connection_id: &str) -> Result<(), ApiError> {
    client.delete(&history_path(connection_id)).await
}
