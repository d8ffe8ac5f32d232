use dbq_core::api::ApiError;
use dbq_core::models::{ExportRequest, ExportResponse};

use crate::api_client::ApiClient;

pub async fn export_query(
    client: &ApiClient,
    payload: &ExportRequest,
) -> Result<ExportResponse, ApiError> {
    client.post("/exports", payload).await
}
