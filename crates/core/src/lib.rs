//! Data model and page controllers of the dbq client.
//!
//! Controllers talk to the backend only through [`api::DbQueryApi`]; the HTTP
//! implementation lives in `dbq-adapters`.

pub mod api;
pub mod config;
pub mod connections_page;
pub mod models;
pub mod notice;
pub mod workspace;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
