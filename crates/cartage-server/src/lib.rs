//! HTTP surface for Cartage.
//!
//! Two endpoints mirror the two pipeline stages: `POST /` submits a batch to
//! a freshly created scheduler instance, `POST /:url` pulls a single archive
//! immediately. `GET /version` identifies the service.
//!
//! Caller authentication and CORS live in the dispatcher in front of this
//! service; the only credential handled here is the shared secret the
//! scheduler presents to the pull endpoint.

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

pub use config::ServiceConfig;
pub use error::{ApiError, ServerError, ServerResult};
pub use router::build_router;
pub use server::CartageServer;
pub use state::AppState;
