//! HTTP API for the custody backend.
//!
//! Two JSON endpoints:
//! - `POST /api/login`: secret phrase in, account address out
//! - `POST /api/withdraw`: claim a locked balance and forward it
//!
//! Failures are `{"message": ...}` bodies with a status chosen by the
//! wallet error's category.

pub mod error;
pub mod handlers;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use server::RpcServer;
