//! HTTP implementation of [`dbq_core::api::DbQueryApi`].

pub mod api_client;
pub mod services;

pub use api_client::ApiClient;
