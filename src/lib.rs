//! RESTGuardian: any relational database as a REST resource tree.
//!
//! Databases, tables, record keys and records are discovered from the catalog at
//! runtime; no table-specific code is involved.

pub mod backend;
pub mod catalog;
pub mod codec;
pub mod error;
pub mod handlers;
pub mod record;
pub mod response;
pub mod routes;
pub mod service;
pub mod settings;
pub mod sql;
pub mod state;

pub use backend::{Backend, BackendError, PgBackend, PgBackendOptions, Row};
pub use catalog::{ColumnDescriptor, ColumnType, MetadataStore, SchemaRef, TableRef, TableShape};
pub use codec::PathToken;
pub use error::{AppError, ConfigError};
pub use record::{RecordKey, RecordValue};
pub use response::{listing, single};
pub use routes::{app, common_routes, common_routes_with_ready, record_routes};
pub use service::RecordService;
pub use settings::Settings;
pub use state::AppState;
