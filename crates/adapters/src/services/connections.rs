use dbq_core::api::ApiError;
use dbq_core::models::{
    Connection, ConnectionCreate, ConnectionList, ConnectionTestResult, ConnectionUpdate,
};

use crate::api_client::{path_segment, ApiClient};

pub async fn list_connections(client: &ApiClient) -> Result<ConnectionList, ApiError> {
    client.get("/connections").await
}

pub async fn create_connection(
    client: &ApiClient,
    payload: &ConnectionCreate,
) -> Result<Connection, ApiError> {
    client.post("/connections", payload).await
}

pub async fn update_connection(
    client: &ApiClient,
    connection_id: &str,
    payload: &ConnectionUpdate,
) -> Result<Connection, ApiError> {
    client
        .put(&format!("/connections/{}", path_segment(connection_id)), payload)
        .await
}

pub async fn delete_connection(client: &ApiClient, connection_id: &str) -> Result<(), ApiError> {
    client
        .delete(&format!("/connections/{}", path_segment(connection_id)))
        .await
}

pub async fn test_connection(
    client: &ApiClient,
    connection_id: &str,
) -> Result<ConnectionTestResult, ApiError> {
    client
        .post_empty(&format!("/connections/{}/test", path_segment(connection_id)))
        .await
}
