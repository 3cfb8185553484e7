//! In-memory stand-in for the calibration-lab REST backend. Serves the same
//! paths and `{status, message, data}` envelopes the admin screens call.

pub mod api;
pub mod config;
pub mod store;

pub use api::{build_router, ApiContext};
pub use store::Store;
