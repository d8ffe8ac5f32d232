use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    Connection, ConnectionCreate, ConnectionList, ConnectionTestResult, ConnectionUpdate,
    ExportRequest, ExportResponse, HistoryCreate, HistoryList, MetadataRefresh, MetadataSnapshot,
    QueryRequest, QueryResult, SqlGenerationRequest, SqlGenerationResponse,
};

/// Message used when a failed response carries no readable error body.
pub const GENERIC_FAILURE_MESSAGE: &str = "Request failed";

/// Failure of a single API call. `Display` is the text shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("{0}")]
    Transport(String),
    #[error("{0}")]
    Decode(String),
}

impl ApiError {
    #[must_use]
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(_) | Self::Decode(_) => None,
        }
    }
}

/// The query tool REST API, one method per endpoint.
#[async_trait]
pub trait DbQueryApi: Send + Sync {
    async fn list_connections(&self) -> Result<ConnectionList, ApiError>;
    async fn create_connection(&self, payload: &ConnectionCreate) -> Result<Connection, ApiError>;
    async fn update_connection(
        &self,
        connection_id: &str,
        payload: &ConnectionUpdate,
    ) -> Result<Connection, ApiError>;
    async fn delete_connection(&self, connection_id: &str) -> Result<(), ApiError>;
    async fn test_connection(&self, connection_id: &str)
        -> Result<ConnectionTestResult, ApiError>;

    async fn get_metadata(&self, connection_id: &str) -> Result<MetadataSnapshot, ApiError>;
    async fn refresh_metadata(&self, connection_id: &str) -> Result<MetadataRefresh, ApiError>;

    async fn execute_query(
        &self,
        connection_id: &str,
        payload: &QueryRequest,
    ) -> Result<QueryResult, ApiError>;
    async fn generate_sql(
        &self,
        connection_id: &str,
        payload: &SqlGenerationRequest,
    ) -> Result<SqlGenerationResponse, ApiError>;
    async fn export_query(&self, payload: &ExportRequest) -> Result<ExportResponse, ApiError>;

    async fn list_history(&self, connection_id: &str) -> Result<HistoryList, ApiError>;
    async fn add_history(&self, connection_id: &str, payload: &HistoryCreate)
        -> Result<(), ApiError>;
    async fn clear_history(&self, connection_id: &str) -> Result<(), ApiError>;
}
