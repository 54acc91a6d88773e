pub mod api;
pub mod catalog;
pub mod classify;
pub mod config;
pub mod credentials;
pub mod observability;
pub mod proto;
pub mod provider;
pub mod queue;
pub mod secrets;
pub mod sync;
pub mod worker;
