use thiserror::Error;
use tracing::{debug, warn};

use crate::api::{ApiError, DbQueryApi};
use crate::models::{
    Connection, ConnectionCreate, ConnectionTestStatus, ConnectionUpdate, DbType, TestStatus,
};
use crate::notice::Notices;

const CREATED: &str = "Connection created";
const UPDATED: &str = "Connection updated";
const DELETED: &str = "Connection deleted";
const TEST_PASSED: &str = "Connection test passed";
const TEST_FAILED: &str = "Connection test failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    DbType,
    ConnectionUrl,
}

impl FormField {
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Name => Self::DbType,
            Self::DbType => Self::ConnectionUrl,
            Self::ConnectionUrl => Self::Name,
        }
    }

    #[must_use]
    pub fn previous(self) -> Self {
        match self {
            Self::Name => Self::ConnectionUrl,
            Self::DbType => Self::Name,
            Self::ConnectionUrl => Self::DbType,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::DbType => "Database type",
            Self::ConnectionUrl => "Connection URL",
        }
    }
}

/// Values of the create form and of the edit modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionForm {
    pub name: String,
    pub db_type: Option<DbType>,
    pub connection_url: String,
    pub active_field: FormField,
}

impl Default for ConnectionForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            db_type: None,
            connection_url: String::new(),
            active_field: FormField::Name,
        }
    }
}

impl ConnectionForm {
    /// Text of the active field; `None` for the database type selector.
    pub fn active_text_mut(&mut self) -> Option<&mut String> {
        match self.active_field {
            FormField::Name => Some(&mut self.name),
            FormField::ConnectionUrl => Some(&mut self.connection_url),
            FormField::DbType => None,
        }
    }

    pub fn cycle_db_type(&mut self) {
        self.db_type = Some(self.db_type.map_or(DbType::Postgres, DbType::next));
    }

    fn create_payload(&self) -> Result<ConnectionCreate, ConnectionsError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ConnectionsError::Validation("Enter a name"));
        }
        let db_type = self
            .db_type
            .ok_or(ConnectionsError::Validation("Select a database type"))?;
        let connection_url = self.connection_url.trim();
        if connection_url.is_empty() {
            return Err(ConnectionsError::Validation("Enter a connection URL"));
        }

        Ok(ConnectionCreate {
            name: name.to_string(),
            db_type,
            connection_url: connection_url.to_string(),
        })
    }

    /// A blank URL means "keep the stored one" and is left out.
    fn update_payload(&self) -> Result<ConnectionUpdate, ConnectionsError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ConnectionsError::Validation("Enter a name"));
        }
        let db_type = self
            .db_type
            .ok_or(ConnectionsError::Validation("Select a database type"))?;
        let connection_url = self.connection_url.trim();

        Ok(ConnectionUpdate {
            name: Some(name.to_string()),
            db_type: Some(db_type),
            connection_url: (!connection_url.is_empty()).then(|| connection_url.to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditModal {
    pub connection_id: String,
    pub form: ConnectionForm,
}

#[derive(Debug, Error)]
pub enum ConnectionsError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("no connection is being edited")]
    NotEditing,
    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionsState {
    pub connections: Vec<Connection>,
    pub create_form: ConnectionForm,
    pub edit: Option<EditModal>,
    pub submitting: bool,
}

/// Connection management: list, create, edit, test and delete.
#[derive(Debug)]
pub struct ConnectionsPage<A: DbQueryApi> {
    api: A,
    state: ConnectionsState,
    notices: Notices,
}

impl<A: DbQueryApi> ConnectionsPage<A> {
    #[must_use]
    pub fn new(api: A) -> Self {
        Self {
            api,
            state: ConnectionsState::default(),
            notices: Notices::default(),
        }
    }

    #[must_use]
    pub fn api(&self) -> &A {
        &self.api
    }

    #[must_use]
    pub fn state(&self) -> &ConnectionsState {
        &self.state
    }

    pub fn create_form_mut(&mut self) -> &mut ConnectionForm {
        &mut self.state.create_form
    }

    pub fn edit_form_mut(&mut self) -> Option<&mut ConnectionForm> {
        self.state.edit.as_mut().map(|edit| &mut edit.form)
    }

    #[must_use]
    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    pub fn notices_mut(&mut self) -> &mut Notices {
        &mut self.notices
    }

    /// Replaces the local list with the server's.
    pub async fn load(&mut self) -> Result<(), ConnectionsError> {
        match self.api.list_connections().await {
            Ok(list) => {
                debug!(count = list.items.len(), "loaded connections");
                self.state.connections = list.items;
                Ok(())
            }
            Err(error) => Err(self.report(error)),
        }
    }

    pub async fn create(&mut self) -> Result<(), ConnectionsError> {
        let payload = match self.state.create_form.create_payload() {
            Ok(payload) => payload,
            Err(error) => {
                self.notices.warning(error.to_string());
                return Err(error);
            }
        };

        self.state.submitting = true;
        let outcome = self.api.create_connection(&payload).await;
        self.state.submitting = false;

        match outcome {
            Ok(created) => {
                debug!(connection_id = %created.id, "created connection");
                self.notices.success(CREATED);
                self.state.create_form = ConnectionForm::default();
                self.load().await
            }
            Err(error) => Err(self.report(error)),
        }
    }

    /// Tests one connection and patches only that record's status.
    pub async fn test(&mut self, connection_id: &str) -> Result<(), ConnectionsError> {
        let response = match self.api.test_connection(connection_id).await {
            Ok(response) => response,
            Err(error) => return Err(self.report(error)),
        };

        let passed = response.status == ConnectionTestStatus::Success;
        let next_status = if passed {
            TestStatus::Success
        } else {
            TestStatus::Failed
        };
        if let Some(connection) = self
            .state
            .connections
            .iter_mut()
            .find(|connection| connection.id == connection_id)
        {
            connection.last_test_status = next_status;
        }

        if passed {
            self.notices.success(TEST_PASSED);
        } else {
            match response.message {
                Some(message) => self.notices.error(format!("{TEST_FAILED}: {message}")),
                None => self.notices.error(TEST_FAILED),
            }
        }
        Ok(())
    }

    /// Opens the edit modal with the URL field left blank.
    pub fn open_edit(&mut self, connection_id: &str) -> bool {
        let Some(connection) = self
            .state
            .connections
            .iter()
            .find(|connection| connection.id == connection_id)
        else {
            return false;
        };

        self.state.edit = Some(EditModal {
            connection_id: connection.id.clone(),
            form: ConnectionForm {
                name: connection.name.clone(),
                db_type: Some(connection.db_type),
                connection_url: String::new(),
                active_field: FormField::Name,
            },
        });
        true
    }

    pub fn close_edit(&mut self) {
        self.state.edit = None;
    }

    pub async fn submit_edit(&mut self) -> Result<(), ConnectionsError> {
        let Some(edit) = &self.state.edit else {
            return Err(ConnectionsError::NotEditing);
        };
        let connection_id = edit.connection_id.clone();
        let payload = match edit.form.update_payload() {
            Ok(payload) => payload,
            Err(error) => {
                self.notices.warning(error.to_string());
                return Err(error);
            }
        };

        self.state.submitting = true;
        let outcome = self.api.update_connection(&connection_id, &payload).await;
        self.state.submitting = false;

        match outcome {
            Ok(_) => {
                self.notices.success(UPDATED);
                self.state.edit = None;
                self.load().await
            }
            Err(error) => Err(self.report(error)),
        }
    }

    pub async fn delete(&mut self, connection_id: &str) -> Result<(), ConnectionsError> {
        match self.api.delete_connection(connection_id).await {
            Ok(()) => {
                self.notices.success(DELETED);
                self.load().await
            }
            Err(error) => Err(self.report(error)),
        }
    }

    fn report(&mut self, error: ApiError) -> ConnectionsError {
        warn!(%error, "connections request failed");
        self.notices.error(error.to_string());
        ConnectionsError::Api(error)
    }
}
