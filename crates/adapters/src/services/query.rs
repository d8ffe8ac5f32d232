use dbq_core::api::ApiError;
use dbq_core::models::{QueryRequest, QueryResult};

use crate::api_client::{path_segment, ApiClient};

pub async fn execute_query(
    client: &ApiClient,
    connection_id: &str,
    payload: &QueryRequest,
) -> Result<QueryResult, ApiError> {
    client
        .post(
            &format!("/connections/{}/query", path_segment(connection_id)),
            payload,
        )
        .await
}
