//! One function per REST endpoint, grouped by resource. Each only shapes the
//! request and names the response type; errors pass through unchanged.

pub mod connections;
pub mod exports;
pub mod generate_sql;
pub mod history;
pub mod metadata;
pub mod query;

use async_trait::async_trait;
use dbq_core::api::{ApiError, DbQueryApi};
use dbq_core::models::{
    Connection, ConnectionCreate, ConnectionList, ConnectionTestResult, ConnectionUpdate,
    ExportRequest, ExportResponse, HistoryCreate, HistoryList, MetadataRefresh, MetadataSnapshot,
    QueryRequest, QueryResult, SqlGenerationRequest, SqlGenerationResponse,
};

use crate::api_client::ApiClient;

#[async_trait]
impl DbQueryApi for ApiClient {
    async fn list_connections(&self) -> Result<ConnectionList, ApiError> {
        connections::list_connections(self).await
    }

    async fn create_connection(&self, payload: &ConnectionCreate) -> Result<Connection, ApiError> {
        connections::create_connection(self, payload).await
    }

    async fn update_connection(
        &self,
        connection_id: &str,
        payload: &ConnectionUpdate,
    ) -> Result<Connection, ApiError> {
        connections::update_connection(self, connection_id, payload).await
    }

    async fn delete_connection(&self, connection_id: &str) -> Result<(), ApiError> {
        connections::delete_connection(self, connection_id).await
    }

    async fn test_connection(
        &self,
        connection_id: &str,
    ) -> Result<ConnectionTestResult, ApiError> {
        connections::test_connection(self, connection_id).await
    }

    async fn get_metadata(&self, connection_id: &str) -> Result<MetadataSnapshot, ApiError> {
        metadata::get_metadata(self, connection_id).await
    }

    async fn refresh_metadata(&self, connection_id: &str) -> Result<MetadataRefresh, ApiError> {
        metadata::refresh_metadata(self, connection_id).await
    }

    async fn execute_query(
        &self,
        connection_id: &str,
        payload: &QueryRequest,
    ) -> Result<QueryResult, ApiError> {
        query::execute_query(self, connection_id, payload).await
    }

    async fn generate_sql(
        &self,
        connection_id: &str,
        payload: &SqlGenerationRequest,
    ) -> Result<SqlGenerationResponse, ApiError> {
        generate_sql::generate_sql(self, connection_id, payload).await
    }

    async fn export_query(&self, payload: &ExportRequest) -> Result<ExportResponse, ApiError> {
        exports::export_query(self, payload).await
    }

    async fn list_history(&self, connection_id: &str) -> Result<HistoryList, ApiError> {
        history::list_history(self, connection_id).await
    }

    async fn add_history(
        &self,
        connection_id: &str,
        payload: &HistoryCreate,
    ) -> Result<(), ApiError> {
        history::add_history(self, connection_id, payload).await
    }

    async fn clear_history(&self, connection_id: &str) -> Result<(), ApiError> {
        history::clear_history(self, connection_id).await
    }
}
