use dbq_core::api::ApiError;
use dbq_core::models::{SqlGenerationRequest, SqlGenerationResponse};

use crate::api_client::{path_segment, ApiClient};

pub async fn generate_sql(
    client: &ApiClient,
    connection_id: &str,
    payload: &SqlGenerationRequest,
) -> Result<SqlGenerationResponse, ApiError> {
    client
        .post(
            &format!("/connections/{}/generate-sql", path_segment(connection_id)),
            payload,
        )
        .await
}
