//! Shared infrastructure for the studio quote site and its maintenance tools.

pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;
pub mod supabase;

pub use axum;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tracing;
