//! Operator HTTP surface: health, metrics, job submission, DLQ inspection

mod error;
pub mod models;
mod server;
pub mod services;
pub mod state;
mod validation;

pub use error::ApiError;
pub use server::{router, run};
pub use state::AppState;
