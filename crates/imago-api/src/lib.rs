//! Imago API
//!
//! HTTP surface for the image storage and transformation service. Exposed as
//! a library so integration tests can build the router against test storage.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod telemetry;

pub use routes::build_router;
pub use state::AppState;
